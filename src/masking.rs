use crate::types::Grid;
use geo::bounding_rect::BoundingRect;
use geo::intersects::Intersects;
use geo::{Coord, MultiPolygon, Polygon, Rect};
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

// One part of a (possibly multi-part) polygon, indexed by its envelope.
struct PolygonPart {
    polygon: Polygon<f64>,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for PolygonPart {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Point-in-polygon index over a boundary or region geometry.
///
/// A point on an edge counts as inside; points inside a hole do not.
pub struct BoundaryIndex {
    tree: RTree<PolygonPart>,
    extent: Option<Rect<f64>>,
}

impl BoundaryIndex {
    pub fn new(geometry: &MultiPolygon<f64>) -> Self {
        let parts: Vec<PolygonPart> = geometry
            .0
            .iter()
            .filter_map(|p| {
                let rect = p.bounding_rect()?;
                Some(PolygonPart {
                    polygon: p.clone(),
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(parts),
            extent: geometry.bounding_rect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Bounding rectangle of all parts, `None` when the geometry is empty.
    pub fn extent(&self) -> Option<Rect<f64>> {
        self.extent
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let coord = Coord { x, y };
        self.tree
            .locate_in_envelope_intersecting(&AABB::from_point([x, y]))
            .any(|part| part.polygon.intersects(&coord))
    }
}

/// Set every cell whose centre lies outside `boundary` to no-data.
///
/// Returns the number of cells masked.
pub fn apply_boundary(grid: &mut Grid, boundary: &MultiPolygon<f64>) -> usize {
    let index = BoundaryIndex::new(boundary);
    apply_boundary_index(grid, &index)
}

pub fn apply_boundary_index(grid: &mut Grid, index: &BoundaryIndex) -> usize {
    let width = grid.width();
    let nodata = grid.nodata();
    let xs: Vec<f64> = (0..width).map(|i| grid.cell_x(i)).collect();
    let ys: Vec<f64> = (0..grid.height()).map(|j| grid.cell_y(j)).collect();

    let masked: usize = grid
        .values_mut()
        .par_chunks_mut(width)
        .zip(ys.par_iter())
        .map(|(row, &y)| {
            let mut count = 0;
            for (cell, &x) in row.iter_mut().zip(xs.iter()) {
                if !index.contains_point(x, y) {
                    *cell = nodata;
                    count += 1;
                }
            }
            count
        })
        .sum();

    info!("Boundary mask removed {} of {} cells", masked, grid.values().len());
    masked
}

/// Indices `(i, j)` of cells whose centre lies inside `region`, row-major.
///
/// A region that misses the grid entirely yields an empty vector.
pub fn cells_in_region(grid: &Grid, region: &MultiPolygon<f64>) -> Vec<(usize, usize)> {
    cells_in_index(grid, &BoundaryIndex::new(region))
}

pub fn cells_in_index(grid: &Grid, index: &BoundaryIndex) -> Vec<(usize, usize)> {
    let Some(rect) = index.extent() else {
        return Vec::new();
    };
    let (min, max) = (rect.min(), rect.max());
    if !grid.bbox().intersects_rect(min.x, min.y, max.x, max.y) {
        return Vec::new();
    }
    let (Some((i0, i1)), Some((j0, j1))) =
        (grid.column_span(min.x, max.x), grid.row_span(min.y, max.y))
    else {
        return Vec::new();
    };

    let mut cells = Vec::new();
    for j in j0..=j1 {
        let y = grid.cell_y(j);
        for i in i0..=i1 {
            if index.contains_point(grid.cell_x(i), y) {
                cells.push((i, j));
            }
        }
    }
    cells
}
