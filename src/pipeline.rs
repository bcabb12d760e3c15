use crate::error::Result;
use crate::filter::filter;
use crate::idw::IdwParams;
use crate::masking::apply_boundary;
use crate::raster::rasterize;
use crate::types::{BoundingBox, Grid, RawStation, RegionPolygon, RegionStatistic, StatisticKind};
use crate::zonal::aggregate;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_RESOLUTION: usize = 1000;

/// Immutable parameters for one interpolation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Station identifiers to leave out (exact match).
    pub excluded_ids: Vec<String>,
    /// Grid extent; the boundary's bounding rectangle when unset.
    pub bbox: Option<BoundingBox>,
    pub width: usize,
    pub height: usize,
    pub idw: IdwParams,
    pub statistic: StatisticKind,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            excluded_ids: Vec::new(),
            bbox: None,
            width: DEFAULT_RESOLUTION,
            height: DEFAULT_RESOLUTION,
            idw: IdwParams::default(),
            statistic: StatisticKind::Max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub grid: Grid,
    pub statistics: Vec<RegionStatistic>,
    pub sample_count: usize,
}

/// Filter, interpolate, mask and aggregate in one pass.
pub fn run(
    records: &[RawStation],
    boundary: &MultiPolygon<f64>,
    regions: &[RegionPolygon],
    config: &RunConfig,
) -> Result<RunOutput> {
    let samples = filter(records, &config.excluded_ids)?;

    let bbox = match config.bbox {
        Some(bbox) => bbox,
        None => BoundingBox::from_geometry(boundary)?,
    };

    let mut grid = rasterize(&samples, bbox, config.width, config.height, &config.idw)?;
    apply_boundary(&mut grid, boundary);
    let statistics = aggregate(&grid, regions, config.statistic);

    info!(
        "Run complete: {} samples, {} valid cells, {} regions",
        samples.len(),
        grid.valid_cell_count(),
        statistics.len()
    );

    Ok(RunOutput {
        grid,
        statistics,
        sample_count: samples.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RainmapError;
    use geo::polygon;

    fn triangle() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn test_bbox_defaults_to_boundary_extent() {
        let records = vec![RawStation::new("a", 0.5, 0.5, 1.0)];
        let config = RunConfig {
            width: 3,
            height: 3,
            ..RunConfig::default()
        };
        let out = run(&records, &triangle(), &[], &config).unwrap();
        assert_eq!(out.grid.bbox(), &BoundingBox::new(0.0, 0.0, 2.0, 2.0).unwrap());
        // Centres above the diagonal x + y = 2 are masked.
        assert_eq!(out.grid.get(2, 2), None);
        assert_eq!(out.grid.get(1, 1), Some(1.0));
        assert_eq!(out.grid.valid_cell_count(), 6);
    }

    #[test]
    fn test_all_excluded_fails_without_grid() {
        let records = vec![RawStation::new("a", 0.5, 0.5, 1.0)];
        let config = RunConfig {
            excluded_ids: vec!["a".to_string()],
            width: 3,
            height: 3,
            ..RunConfig::default()
        };
        assert_eq!(
            run(&records, &triangle(), &[], &config).unwrap_err(),
            RainmapError::NoValidSamples
        );
    }

    #[test]
    fn test_config_from_toml() {
        let config: RunConfig = toml::from_str(
            r#"
            excluded_ids = ["X1"]
            width = 200
            statistic = "median"
            bbox = [-53.5, -25.5, -44.0, -19.5]

            [idw]
            power = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.excluded_ids, vec!["X1"]);
        assert_eq!(config.width, 200);
        assert_eq!(config.height, DEFAULT_RESOLUTION);
        assert_eq!(config.statistic, StatisticKind::Median);
        assert_eq!(config.idw.power, 3.0);
        assert_eq!(config.idw.distance_floor, crate::idw::DEFAULT_DISTANCE_FLOOR);
        assert_eq!(config.bbox.unwrap().min_x(), -53.5);
    }

    #[test]
    fn test_config_rejects_unknown_statistic() {
        let parsed: std::result::Result<RunConfig, _> = toml::from_str(r#"statistic = "sum""#);
        assert!(parsed.is_err());
    }
}
