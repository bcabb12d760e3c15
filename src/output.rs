use anyhow::{Context, Result};
use csv::Writer;
use rainmap::{Grid, RegionStatistic};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct GridRow {
    x: f64,
    y: f64,
    value: Option<f64>,
}

#[derive(Serialize)]
struct StatRow<'a> {
    region: &'a str,
    statistic: &'a str,
    value: Option<f64>,
    cells: usize,
}

fn create_writer(path: &Path) -> Result<Writer<fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))
}

/// One `x,y,value` row per cell, north row first; no-data cells have an empty value.
pub fn write_grid_csv(grid: &Grid, path: &Path) -> Result<()> {
    let mut wtr = create_writer(path)?;
    for j in (0..grid.height()).rev() {
        let y = grid.cell_y(j);
        for i in 0..grid.width() {
            wtr.serialize(GridRow {
                x: grid.cell_x(i),
                y,
                value: grid.get(i, j),
            })?;
        }
    }
    wtr.flush()?;
    info!("Wrote {}x{} grid to {:?}", grid.width(), grid.height(), path);
    Ok(())
}

pub fn write_stats_csv(stats: &[RegionStatistic], path: &Path) -> Result<()> {
    let mut wtr = create_writer(path)?;
    for stat in stats {
        wtr.serialize(StatRow {
            region: &stat.region_id,
            statistic: stat.kind.as_str(),
            value: stat.value,
            cells: stat.cells,
        })?;
    }
    wtr.flush()?;
    info!("Wrote {} region statistics to {:?}", stats.len(), path);
    Ok(())
}
