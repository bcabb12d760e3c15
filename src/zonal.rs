//! Zonal statistics: one summary value of the grid per region polygon.

use crate::error::Result;
use crate::masking::{cells_in_index, BoundaryIndex};
use crate::types::{Grid, RegionPolygon, RegionStatistic, StatisticKind};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, info};

/// Reduce the valid cells inside each region to one statistic.
///
/// Regions without any valid cell get `value: None`. Output order matches
/// `regions`.
pub fn aggregate(
    grid: &Grid,
    regions: &[RegionPolygon],
    kind: StatisticKind,
) -> Vec<RegionStatistic> {
    info!("Computing {} over {} regions...", kind, regions.len());

    let stats: Vec<RegionStatistic> = regions
        .par_iter()
        .map(|region| {
            let index = BoundaryIndex::new(&region.geometry);
            let mut values: Vec<f64> = cells_in_index(grid, &index)
                .into_iter()
                .filter_map(|(i, j)| grid.get(i, j))
                .collect();

            if values.is_empty() {
                debug!("Region '{}' has no valid cells", region.id);
            }

            RegionStatistic {
                region_id: region.id.clone(),
                kind,
                value: reduce(&mut values, kind),
                cells: values.len(),
            }
        })
        .collect();

    let empty = stats.iter().filter(|s| s.value.is_none()).count();
    info!("{} regions summarised, {} without data", stats.len() - empty, empty);
    stats
}

/// Like [`aggregate`], with the statistic given by name.
pub fn aggregate_named(
    grid: &Grid,
    regions: &[RegionPolygon],
    kind: &str,
) -> Result<Vec<RegionStatistic>> {
    let kind: StatisticKind = kind.parse()?;
    Ok(aggregate(grid, regions, kind))
}

/// Statistic of `values`; `None` when empty. May reorder `values`.
pub fn reduce(values: &mut [f64], kind: StatisticKind) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let value = match kind {
        StatisticKind::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        StatisticKind::Mean => values.iter().sum::<f64>() / values.len() as f64,
        StatisticKind::Median => median(values),
    };
    Some(value)
}

// Even counts take the mean of the two middle values.
fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
