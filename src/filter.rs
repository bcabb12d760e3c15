//! Station record validation and exclusion

use crate::error::{RainmapError, Result};
use crate::types::{RawStation, SampleSet, StationObservation};
use std::collections::HashSet;
use tracing::{debug, info};

/// Validate raw records and drop excluded stations.
///
/// A record is dropped when latitude, longitude or value is missing,
/// non-numeric or non-finite, when the value is negative, or when its
/// identifier exactly matches one of `excluded_ids`.
pub fn filter<S: AsRef<str>>(records: &[RawStation], excluded_ids: &[S]) -> Result<SampleSet> {
    let excluded: HashSet<&str> = excluded_ids.iter().map(|s| s.as_ref()).collect();

    let mut invalid = 0usize;
    let mut skipped = 0usize;
    let mut samples = Vec::with_capacity(records.len());

    for record in records {
        let id = record.prefix.clone().unwrap_or_default();

        let Some((latitude, longitude, value)) = parse(record) else {
            debug!("Dropping station '{}': missing or invalid field", id);
            invalid += 1;
            continue;
        };

        if excluded.contains(id.as_str()) {
            skipped += 1;
            continue;
        }

        samples.push(StationObservation {
            id,
            latitude,
            longitude,
            value,
        });
    }

    info!(
        "Kept {} of {} stations ({} invalid, {} excluded)",
        samples.len(),
        records.len(),
        invalid,
        skipped
    );

    if samples.is_empty() {
        return Err(RainmapError::NoValidSamples);
    }
    SampleSet::new(samples)
}

/// `(latitude, longitude, value)` when all three are finite and the value
/// is non-negative.
fn parse(record: &RawStation) -> Option<(f64, f64, f64)> {
    let latitude = record.latitude.as_ref()?.as_finite()?;
    let longitude = record.longitude.as_ref()?.as_finite()?;
    let value = record.value.as_ref()?.as_finite()?;
    (value >= 0.0).then_some((latitude, longitude, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawField;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_drops_missing_and_non_finite() {
        let records = vec![
            RawStation::new("A", -23.5, -46.6, 12.0),
            RawStation {
                prefix: Some("B".into()),
                latitude: None,
                longitude: Some(RawField::Number(-46.0)),
                value: Some(RawField::Number(1.0)),
            },
            RawStation::new("C", f64::NAN, -46.0, 3.0),
            RawStation {
                prefix: Some("D".into()),
                latitude: Some(RawField::Text("-22.9".into())),
                longitude: Some(RawField::Text("-47.1".into())),
                value: Some(RawField::Text("abc".into())),
            },
            RawStation::new("E", -22.0, -47.0, f64::INFINITY),
        ];

        let samples = filter(&records, &NONE).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "A");
    }

    #[test]
    fn test_non_numeric_json_value_is_dropped() {
        let records = vec![
            RawStation::new("ok", 0.0, 0.0, 1.0),
            RawStation {
                prefix: Some("flag".into()),
                latitude: Some(RawField::Number(1.0)),
                longitude: Some(RawField::Number(1.0)),
                value: Some(RawField::Other(serde_json::Value::Bool(true))),
            },
        ];
        let samples = filter(&records, &NONE).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "ok");
    }

    #[test]
    fn test_zero_value_is_kept_and_negative_dropped() {
        let records = vec![
            RawStation::new("dry", 0.0, 0.0, 0.0),
            RawStation::new("bad", 1.0, 1.0, -0.5),
        ];
        let samples = filter(&records, &NONE).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 0.0);
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let records = vec![RawStation {
            prefix: Some("S1".into()),
            latitude: Some(RawField::Text("-23.5".into())),
            longitude: Some(RawField::Text("-46.6".into())),
            value: Some(RawField::Text("4.2".into())),
        }];
        let samples = filter(&records, &NONE).unwrap();
        assert_eq!(samples[0].latitude, -23.5);
        assert_eq!(samples[0].longitude, -46.6);
        assert_eq!(samples[0].value, 4.2);
    }

    #[test]
    fn test_exclusion_is_exact_match() {
        let records = vec![
            RawStation::new("SP-01", 0.0, 0.0, 1.0),
            RawStation::new("SP-010", 1.0, 0.0, 2.0),
            RawStation::new("SP-01", 0.5, 0.5, 3.0),
        ];
        let samples = filter(&records, &["SP-01"]).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].id, "SP-010");
    }

    #[test]
    fn test_duplicate_ids_are_independent_samples() {
        let records = vec![
            RawStation::new("X", 0.0, 0.0, 1.0),
            RawStation::new("X", 1.0, 1.0, 2.0),
        ];
        assert_eq!(filter(&records, &NONE).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_result_is_no_valid_samples() {
        let records = vec![RawStation::new("only", 0.0, 0.0, 5.0)];
        assert_eq!(
            filter(&records, &["only"]).unwrap_err(),
            RainmapError::NoValidSamples
        );
        assert_eq!(
            filter(&[], &NONE).unwrap_err(),
            RainmapError::NoValidSamples
        );
    }
}
