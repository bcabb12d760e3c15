//! Rainfall gridding core.
//!
//! Sparse station measurements are interpolated with inverse distance
//! weighting onto a regular grid, masked by a boundary polygon and reduced
//! to one statistic per region:
//!
//! ```text
//! filter -> rasterize (idw) -> apply_boundary -> aggregate
//! ```
//!
//! Nothing here reads files or touches the network; callers hand in parsed
//! records and `geo` geometries in one consistent coordinate system.

pub mod error;
pub mod filter;
pub mod idw;
pub mod masking;
pub mod pipeline;
pub mod raster;
pub mod types;
pub mod zonal;

pub use error::{RainmapError, Result};
pub use filter::filter;
pub use idw::{estimate, IdwInterpolator, IdwParams};
pub use masking::{apply_boundary, cells_in_region, BoundaryIndex};
pub use pipeline::{run, RunConfig, RunOutput};
pub use raster::rasterize;
pub use types::{
    BoundingBox, Grid, RawField, RawStation, RegionPolygon, RegionStatistic, SampleSet,
    StatisticKind, StationObservation,
};
pub use zonal::{aggregate, aggregate_named};
