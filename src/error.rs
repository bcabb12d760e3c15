//! Error types for the rainfall core

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RainmapError {
    #[error("no valid station samples remain after filtering")]
    NoValidSamples,

    #[error("interpolation requires at least one sample")]
    EmptySampleSet,

    #[error("invalid bounding box ({min_x}, {min_y}, {max_x}, {max_y})")]
    InvalidBoundingBox {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[error("invalid grid resolution {width}x{height}")]
    InvalidResolution { width: usize, height: usize },

    #[error("unsupported statistic '{0}', expected one of max, mean, median")]
    UnsupportedStatistic(String),

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, RainmapError>;
