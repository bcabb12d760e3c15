use crate::error::{RainmapError, Result};
use geo::bounding_rect::BoundingRect;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// A numeric field as it arrives from the measurement API: a JSON number,
/// a string holding one, or some other JSON value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
    /// Booleans, objects, arrays: never numeric.
    Other(serde_json::Value),
}

impl RawField {
    /// Finite numeric value, or `None` for blank, non-numeric or non-finite input.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            RawField::Number(n) => *n,
            RawField::Text(s) => s.trim().parse::<f64>().ok()?,
            RawField::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawField {
    fn from(value: f64) -> Self {
        RawField::Number(value)
    }
}

/// Unvalidated station record. Every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStation {
    #[serde(alias = "id")]
    pub prefix: Option<String>,
    pub latitude: Option<RawField>,
    pub longitude: Option<RawField>,
    pub value: Option<RawField>,
}

impl RawStation {
    pub fn new(id: &str, latitude: f64, longitude: f64, value: f64) -> Self {
        Self {
            prefix: Some(id.to_string()),
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationObservation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

impl StationObservation {
    /// Planar x coordinate (longitude).
    #[inline]
    pub fn x(&self) -> f64 {
        self.longitude
    }

    /// Planar y coordinate (latitude).
    #[inline]
    pub fn y(&self) -> f64 {
        self.latitude
    }
}

/// Filtered, non-empty set of observations for one run.
#[derive(Debug, Clone)]
pub struct SampleSet(Vec<StationObservation>);

impl SampleSet {
    pub fn new(samples: Vec<StationObservation>) -> Result<Self> {
        if samples.is_empty() {
            return Err(RainmapError::EmptySampleSet);
        }
        Ok(Self(samples))
    }

    pub fn into_inner(self) -> Vec<StationObservation> {
        self.0
    }
}

impl Deref for SampleSet {
    type Target = [StationObservation];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
        if !finite || min_x >= max_x || min_y >= max_y {
            return Err(RainmapError::InvalidBoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Total bounds of a geometry, the way the boundary layer's extent
    /// frames the interpolation domain.
    pub fn from_geometry(geometry: &MultiPolygon<f64>) -> Result<Self> {
        let rect = geometry
            .bounding_rect()
            .ok_or(RainmapError::InvalidBoundingBox {
                min_x: f64::NAN,
                min_y: f64::NAN,
                max_x: f64::NAN,
                max_y: f64::NAN,
            })?;
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }

    pub fn intersects_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> bool {
        min_x <= self.max_x && max_x >= self.min_x && min_y <= self.max_y && max_y >= self.min_y
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = RainmapError;

    fn try_from(v: [f64; 4]) -> Result<Self> {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

/// Regular lattice of cell values. Row `j = 0` sits on `min_y`, column
/// `i = 0` on `min_x`; storage is row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    bbox: BoundingBox,
    width: usize,
    height: usize,
    nodata: f64,
    values: Vec<f64>,
}

impl Grid {
    pub fn new(bbox: BoundingBox, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RainmapError::InvalidResolution { width, height });
        }
        let len = width
            .checked_mul(height)
            .ok_or(RainmapError::InvalidResolution { width, height })?;
        Ok(Self {
            bbox,
            width,
            height,
            nodata: f64::NAN,
            values: vec![f64::NAN; len],
        })
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    pub fn is_nodata(&self, value: f64) -> bool {
        if self.nodata.is_nan() {
            value.is_nan()
        } else {
            value == self.nodata
        }
    }

    pub fn contains_cell(&self, i: usize, j: usize) -> bool {
        i < self.width && j < self.height
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        assert!(
            self.contains_cell(i, j),
            "cell ({}, {}) outside {}x{} grid",
            i,
            j,
            self.width,
            self.height
        );
        j * self.width + i
    }

    /// Raw cell value, sentinel included. Panics outside the grid.
    pub fn raw(&self, i: usize, j: usize) -> f64 {
        self.values[self.offset(i, j)]
    }

    /// Cell value, `None` for no-data or an index outside the grid.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if !self.contains_cell(i, j) {
            return None;
        }
        let v = self.raw(i, j);
        (!self.is_nodata(v)).then_some(v)
    }

    /// Panics outside the grid.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let offset = self.offset(i, j);
        self.values[offset] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn cell_x(&self, i: usize) -> f64 {
        axis_coord(self.bbox.min_x, self.bbox.max_x, self.width, i)
    }

    pub fn cell_y(&self, j: usize) -> f64 {
        axis_coord(self.bbox.min_y, self.bbox.max_y, self.height, j)
    }

    /// Cell centre coordinate of `(i, j)`.
    pub fn cell_center(&self, i: usize, j: usize) -> (f64, f64) {
        (self.cell_x(i), self.cell_y(j))
    }

    /// Inclusive index window of columns whose centre lies in `[lo, hi]`.
    pub(crate) fn column_span(&self, lo: f64, hi: f64) -> Option<(usize, usize)> {
        axis_span(self.bbox.min_x, self.bbox.max_x, self.width, lo, hi)
    }

    /// Inclusive index window of rows whose centre lies in `[lo, hi]`.
    pub(crate) fn row_span(&self, lo: f64, hi: f64) -> Option<(usize, usize)> {
        axis_span(self.bbox.min_y, self.bbox.max_y, self.height, lo, hi)
    }

    pub fn valid_cell_count(&self) -> usize {
        self.values.iter().filter(|v| !self.is_nodata(**v)).count()
    }
}

fn axis_coord(min: f64, max: f64, n: usize, k: usize) -> f64 {
    if n == 1 {
        return min + (max - min) / 2.0;
    }
    if k == n - 1 {
        return max;
    }
    min + (max - min) * (k as f64) / ((n - 1) as f64)
}

fn axis_span(min: f64, max: f64, n: usize, lo: f64, hi: f64) -> Option<(usize, usize)> {
    if hi < min || lo > max {
        return None;
    }
    if n == 1 {
        let mid = axis_coord(min, max, 1, 0);
        return (lo <= mid && mid <= hi).then_some((0, 0));
    }
    let step = (max - min) / ((n - 1) as f64);
    // Widen by one cell on each side; callers re-test every centre exactly.
    let first = ((lo - min) / step).floor() as i64 - 1;
    let last = ((hi - min) / step).ceil() as i64 + 1;
    let first = first.clamp(0, n as i64 - 1) as usize;
    let last = last.clamp(0, n as i64 - 1) as usize;
    (first <= last).then_some((first, last))
}

#[derive(Debug, Clone)]
pub struct RegionPolygon {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
}

impl RegionPolygon {
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            geometry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatisticKind {
    Max,
    Mean,
    Median,
}

impl StatisticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticKind::Max => "max",
            StatisticKind::Mean => "mean",
            StatisticKind::Median => "median",
        }
    }
}

impl FromStr for StatisticKind {
    type Err = RainmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "max" => Ok(StatisticKind::Max),
            "mean" => Ok(StatisticKind::Mean),
            "median" => Ok(StatisticKind::Median),
            other => Err(RainmapError::UnsupportedStatistic(other.to_string())),
        }
    }
}

impl TryFrom<String> for StatisticKind {
    type Error = RainmapError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<StatisticKind> for String {
    fn from(kind: StatisticKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStatistic {
    pub region_id: String,
    pub kind: StatisticKind,
    /// `None` when no valid cell falls inside the region.
    pub value: Option<f64>,
    pub cells: usize,
}
