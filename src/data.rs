use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use rainmap::{RawField, RawStation, RegionPolygon};
use serde::Deserialize;
use shapefile::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Measurement API response: `{"json": [{"prefix", "latitude", "longitude", "value"}, ...]}`.
/// A bare array of records is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum StationPayload {
    Wrapped { json: Vec<RawStation> },
    Bare(Vec<RawStation>),
}

#[derive(Deserialize)]
struct CsvStation {
    #[serde(alias = "id")]
    prefix: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    value: Option<String>,
}

impl From<CsvStation> for RawStation {
    fn from(row: CsvStation) -> Self {
        RawStation {
            prefix: row.prefix,
            latitude: row.latitude.map(RawField::Text),
            longitude: row.longitude.map(RawField::Text),
            value: row.value.map(RawField::Text),
        }
    }
}

// Optional id plus geometry of one polygon feature.
type Feature = (Option<String>, MultiPolygon<f64>);

fn extension(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| anyhow!("Input file has no extension: {:?}", path))
}

pub fn load_stations(path: &Path) -> Result<Vec<RawStation>> {
    let stations = match extension(path)?.as_str() {
        "json" => load_stations_json(path)?,
        "csv" => load_stations_csv(path)?,
        other => return Err(anyhow!("Unsupported station format: {}", other)),
    };
    info!("Loaded {} station records from {:?}", stations.len(), path);
    Ok(stations)
}

fn load_stations_json(path: &Path) -> Result<Vec<RawStation>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open station file: {:?}", path))?;
    let payload: StationPayload = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse station JSON: {:?}", path))?;
    Ok(match payload {
        StationPayload::Wrapped { json } => json,
        StationPayload::Bare(records) => records,
    })
}

fn load_stations_csv(path: &Path) -> Result<Vec<RawStation>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open station file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut stations = Vec::new();
    for result in rdr.deserialize::<CsvStation>() {
        let row = result.with_context(|| format!("Malformed station row in {:?}", path))?;
        stations.push(row.into());
    }
    Ok(stations)
}

/// Load the boundary layer as a single multi-part polygon.
pub fn load_boundary(path: &Path) -> Result<MultiPolygon<f64>> {
    let parts: Vec<_> = load_features(path, None)?
        .into_iter()
        .flat_map(|(_, mp)| mp.0)
        .collect();
    if parts.is_empty() {
        return Err(anyhow!("Boundary file contains no polygons: {:?}", path));
    }
    info!("Loaded boundary with {} polygon parts", parts.len());
    Ok(MultiPolygon::new(parts))
}

/// Load region polygons keyed by `id_field`.
pub fn load_regions(path: &Path, id_field: &str) -> Result<Vec<RegionPolygon>> {
    let regions: Vec<RegionPolygon> = load_features(path, Some(id_field))?
        .into_iter()
        .map(|(id, geometry)| RegionPolygon::new(id.unwrap_or_default(), geometry))
        .collect();
    info!("Loaded {} regions from {:?}", regions.len(), path);
    Ok(regions)
}

fn load_features(path: &Path, id_field: Option<&str>) -> Result<Vec<Feature>> {
    match extension(path)?.as_str() {
        "shp" => load_shapefile(path, id_field),
        "json" | "geojson" => load_geojson(path, id_field),
        other => Err(anyhow!("Unsupported geometry format: {}", other)),
    }
}

fn load_shapefile(path: &Path, id_field: Option<&str>) -> Result<Vec<Feature>> {
    use shapefile::dbase::FieldValue;

    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut features = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let id = match id_field {
            Some(field) => {
                let value = record
                    .get(field)
                    .ok_or_else(|| anyhow!("Id field '{}' not found in Shapefile", field))?;
                match value {
                    FieldValue::Character(Some(s)) => Some(s.trim().to_string()),
                    FieldValue::Numeric(Some(n)) => Some(n.to_string()),
                    FieldValue::Character(None) | FieldValue::Numeric(None) => {
                        warn!("Skipping feature with null '{}'", field);
                        continue;
                    }
                    _ => return Err(anyhow!("Shapefile id field must be text or numeric")),
                }
            }
            None => None,
        };

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon
                .try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => continue, // Skip non-polygon shapes
        };

        features.push((id, geometry));
    }

    Ok(features)
}

fn load_geojson(path: &Path, id_field: Option<&str>) -> Result<Vec<Feature>> {
    use geojson::GeoJson;

    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut features = Vec::new();

    for feature in collection.features {
        let id = match id_field {
            Some(field) => {
                let value = feature.properties.as_ref().and_then(|props| props.get(field));
                match value {
                    Some(serde_json::Value::String(s)) => Some(s.clone()),
                    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                    _ => {
                        warn!("Skipping feature without '{}'", field);
                        continue;
                    }
                }
            }
            None => None,
        };

        let Some(geom) = feature.geometry else {
            continue;
        };
        let geometry: geo::Geometry<f64> = geom
            .value
            .try_into()
            .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;

        let geometry = match geometry {
            geo::Geometry::MultiPolygon(mp) => mp,
            geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            _ => continue, // Skip points/lines
        };

        features.push((id, geometry));
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_api_json_with_nulls_and_strings() {
        let file = write_temp(
            ".json",
            r#"{"json": [
                {"prefix": "A", "latitude": "-23.5", "longitude": "-46.6", "value": 12.4},
                {"prefix": "B", "latitude": null, "longitude": "-46.0", "value": 3},
                {"prefix": "C", "latitude": -22.1, "longitude": -47.0}
            ]}"#,
        );
        let stations = load_stations(file.path()).unwrap();
        assert_eq!(stations.len(), 3);
        assert_eq!(stations[0].latitude.as_ref().and_then(|f| f.as_finite()), Some(-23.5));
        assert!(stations[1].latitude.is_none());
        assert!(stations[2].value.is_none());
    }

    #[test]
    fn test_api_json_with_non_numeric_value_still_loads() {
        let file = write_temp(
            ".json",
            r#"{"json": [
                {"prefix": "A", "latitude": -23.5, "longitude": -46.6, "value": true},
                {"prefix": "B", "latitude": -23.0, "longitude": -46.0, "value": {}}
            ]}"#,
        );
        let stations = load_stations(file.path()).unwrap();
        assert_eq!(stations.len(), 2);
        assert!(stations
            .iter()
            .all(|s| s.value.as_ref().and_then(|f| f.as_finite()).is_none()));
    }

    #[test]
    fn test_csv_stations() {
        let file = write_temp(".csv", "id,latitude,longitude,value\nS1, -23.0 ,-46.0,5.5\nS2,,-46.1,1\n");
        let stations = load_stations(file.path()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].prefix.as_deref(), Some("S1"));
        assert_eq!(stations[0].latitude.as_ref().and_then(|f| f.as_finite()), Some(-23.0));
        assert!(stations[1].latitude.as_ref().and_then(|f| f.as_finite()).is_none());
    }

    #[test]
    fn test_unsupported_station_format() {
        let file = write_temp(".txt", "");
        assert!(load_stations(file.path()).is_err());
    }

    #[test]
    fn test_geojson_regions_and_boundary() {
        let file = write_temp(
            ".geojson",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"NAME": "north"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,1],[2,1],[2,2],[0,2],[0,1]]]}},
                {"type": "Feature", "properties": {"NAME": 7},
                 "geometry": {"type": "MultiPolygon", "coordinates": [[[[0,0],[2,0],[2,1],[0,1],[0,0]]]]}},
                {"type": "Feature", "properties": {"NAME": "station"},
                 "geometry": {"type": "Point", "coordinates": [1, 1]}}
            ]}"#,
        );
        let regions = load_regions(file.path(), "NAME").unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].id, "north");
        assert_eq!(regions[1].id, "7");

        let boundary = load_boundary(file.path()).unwrap();
        assert_eq!(boundary.0.len(), 2);
    }
}
