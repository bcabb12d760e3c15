use crate::error::Result;
use crate::idw::{IdwInterpolator, IdwParams};
use crate::types::{BoundingBox, Grid, StationObservation};
use rayon::prelude::*;
use tracing::info;

/// Evaluate IDW at every cell centre of a `width x height` lattice over `bbox`.
///
/// All inputs are validated before any cell is computed. Rows are filled in
/// parallel; each row only writes its own slice, so the output does not
/// depend on scheduling.
pub fn rasterize(
    samples: &[StationObservation],
    bbox: BoundingBox,
    width: usize,
    height: usize,
    params: &IdwParams,
) -> Result<Grid> {
    let mut grid = Grid::new(bbox, width, height)?;
    let interpolator = IdwInterpolator::new(samples, *params)?;

    info!(
        "Interpolating {} samples onto {}x{} grid...",
        samples.len(),
        width,
        height
    );

    let xs: Vec<f64> = (0..width).map(|i| grid.cell_x(i)).collect();
    let ys: Vec<f64> = (0..height).map(|j| grid.cell_y(j)).collect();

    grid.values_mut()
        .par_chunks_mut(width)
        .zip(ys.par_iter())
        .for_each(|(row, &y)| {
            for (cell, &x) in row.iter_mut().zip(xs.iter()) {
                *cell = interpolator.estimate(x, y);
            }
        });

    Ok(grid)
}
