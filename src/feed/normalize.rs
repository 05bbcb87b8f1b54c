// src/feed/normalize.rs

//! Turns a parsed product into per-location, per-day forecast records.

use chrono::{DateTime, FixedOffset};

use crate::feed::parser::{Area, ForecastPeriod, ProductDocument};
use crate::identity::{IdentityKey, secondary_id};
use crate::models::{ForecastRecord, RejectedPeriod};

/// Area type carrying per-place forecasts. Regions, districts and
/// metropolitan areas only hold synoptic text.
pub const LOCATION_AREA_TYPE: &str = "location";

/// Timestamp layout of the feed's `start-time-local` attribute.
pub const FEED_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

pub const MIN_TEMP_ELEMENT: &str = "air_temperature_minimum";
pub const MAX_TEMP_ELEMENT: &str = "air_temperature_maximum";
pub const PRECIS_TEXT: &str = "precis";
pub const PRECIPITATION_TEXT: &str = "probability_of_precipitation";

/// Outcome for a single forecast period.
pub type NormalizedPeriod = Result<ForecastRecord, RejectedPeriod>;

/// Converts product documents into records for one state.
#[derive(Debug, Clone)]
pub struct RecordNormalizer<'a> {
    key: &'a IdentityKey,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(key: &'a IdentityKey) -> Self {
        Self { key }
    }

    /// One outcome per forecast period under every location area, in document order.
    pub fn normalize(&self, doc: &ProductDocument, state: &str) -> Vec<NormalizedPeriod> {
        doc.areas
            .iter()
            .filter(|area| area.area_type == LOCATION_AREA_TYPE)
            .flat_map(|area| {
                area.periods
                    .iter()
                    .map(move |period| self.normalize_period(area, period, state))
            })
            .collect()
    }

    fn normalize_period(&self, area: &Area, period: &ForecastPeriod, state: &str) -> NormalizedPeriod {
        let start = parse_feed_time(&period.start_time_local).map_err(|e| RejectedPeriod {
            location: area.description.clone(),
            state: state.to_string(),
            start_time_local: period.start_time_local.clone(),
            reason: e.to_string(),
        })?;

        let location = area.description.clone();
        let date = start.date_naive();

        let mut record = ForecastRecord {
            id: self.key.primary_id(&location, date, state),
            secondary_id: secondary_id(&location, date),
            location,
            state: state.to_string(),
            date,
            min_temp: None,
            max_temp: None,
            precis: None,
            precipitation_probability: None,
        };

        // Later entries of the same type overwrite earlier ones.
        for element in &period.elements {
            match element.kind.as_str() {
                MIN_TEMP_ELEMENT => record.min_temp = non_empty(&element.value),
                MAX_TEMP_ELEMENT => record.max_temp = non_empty(&element.value),
                _ => {}
            }
        }

        for text in &period.texts {
            match text.kind.as_str() {
                PRECIS_TEXT => record.precis = non_empty(&text.value),
                PRECIPITATION_TEXT => {
                    let value = text.value.as_str();
                    record.precipitation_probability =
                        non_empty(value.strip_suffix('%').unwrap_or(value));
                }
                _ => {}
            }
        }

        Ok(record)
    }
}

/// Parse a feed timestamp such as `2023-06-01T00:00:00+10:00`, keeping its offset.
pub fn parse_feed_time(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(raw, FEED_TIME_FORMAT)
}

/// The value as given, or `None` when it is empty.
fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::feed::parser::{Element, SAMPLE_PRODUCT, Text, parse_product};

    fn key() -> IdentityKey {
        IdentityKey::new("test-secret").unwrap()
    }

    fn period(start: &str, elements: Vec<Element>, texts: Vec<Text>) -> ForecastPeriod {
        ForecastPeriod {
            start_time_local: start.to_string(),
            elements,
            texts,
            ..ForecastPeriod::default()
        }
    }

    fn element(kind: &str, value: &str) -> Element {
        Element {
            kind: kind.to_string(),
            units: "Celsius".to_string(),
            value: value.to_string(),
        }
    }

    fn text(kind: &str, value: &str) -> Text {
        Text {
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }

    fn area(area_type: &str, description: &str, periods: Vec<ForecastPeriod>) -> Area {
        Area {
            description: description.to_string(),
            area_type: area_type.to_string(),
            periods,
            ..Area::default()
        }
    }

    #[test]
    fn test_sample_product_normalizes_location_periods() {
        let key = key();
        let doc = parse_product(SAMPLE_PRODUCT.as_bytes());
        let out = RecordNormalizer::new(&key).normalize(&doc, "nsw");

        assert_eq!(out.len(), 2);
        let first = out[0].as_ref().unwrap();
        assert_eq!(first.location, "Sydney");
        assert_eq!(first.state, "nsw");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(first.secondary_id, "2023-06-01-sydney");
        assert_eq!(first.id, key.primary_id("Sydney", first.date, "nsw"));
        assert_eq!(first.min_temp.as_deref(), Some("10"));
        assert_eq!(first.max_temp.as_deref(), Some("20"));
        assert_eq!(first.precis.as_deref(), Some("Sunny"));
        assert_eq!(first.precipitation_probability.as_deref(), Some("20"));

        let second = out[1].as_ref().unwrap();
        assert_eq!(second.max_temp, None);
        assert_eq!(second.precipitation_probability, None);
    }

    #[test]
    fn test_non_location_areas_produce_nothing() {
        let key = key();
        let periods = vec![period(
            "2023-06-01T00:00:00+10:00",
            vec![element(MIN_TEMP_ELEMENT, "10")],
            vec![],
        )];
        let doc = ProductDocument {
            areas: vec![
                area("region", "New South Wales", periods.clone()),
                area("metropolitan", "Sydney Metro", periods.clone()),
                area("public-district", "Hunter", periods),
            ],
            ..ProductDocument::default()
        };

        assert!(RecordNormalizer::new(&key).normalize(&doc, "nsw").is_empty());
    }

    #[test]
    fn test_unparseable_start_time_is_isolated() {
        let key = key();
        let doc = ProductDocument {
            areas: vec![area(
                "location",
                "Dubbo",
                vec![
                    period("2023-06-01 00:00", vec![element(MIN_TEMP_ELEMENT, "2")], vec![]),
                    period("2023-06-02T00:00:00+10:00", vec![element(MIN_TEMP_ELEMENT, "3")], vec![]),
                ],
            )],
            ..ProductDocument::default()
        };

        let out = RecordNormalizer::new(&key).normalize(&doc, "nsw");
        assert_eq!(out.len(), 2);

        let rejected = out[0].as_ref().unwrap_err();
        assert_eq!(rejected.location, "Dubbo");
        assert_eq!(rejected.state, "nsw");
        assert_eq!(rejected.start_time_local, "2023-06-01 00:00");

        assert_eq!(out[1].as_ref().unwrap().min_temp.as_deref(), Some("3"));
    }

    #[test]
    fn test_date_uses_local_offset() {
        let key = key();
        // 01:00 local on the 1st is still the 31st in UTC; the local date wins.
        let doc = ProductDocument {
            areas: vec![area(
                "location",
                "Canberra",
                vec![period("2023-06-01T01:00:00+10:00", vec![], vec![])],
            )],
            ..ProductDocument::default()
        };

        let out = RecordNormalizer::new(&key).normalize(&doc, "act");
        let record = out[0].as_ref().unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    }

    #[test]
    fn test_last_duplicate_wins_and_empty_fields_stay_absent() {
        let key = key();
        let doc = ProductDocument {
            areas: vec![area(
                "location",
                "Albury",
                vec![period(
                    "2023-06-01T00:00:00+10:00",
                    vec![
                        element(MAX_TEMP_ELEMENT, "14"),
                        element(MAX_TEMP_ELEMENT, "15"),
                    ],
                    vec![text(PRECIS_TEXT, ""), text(PRECIPITATION_TEXT, "5%")],
                )],
            )],
            ..ProductDocument::default()
        };

        let out = RecordNormalizer::new(&key).normalize(&doc, "nsw");
        let record = out[0].as_ref().unwrap();
        assert_eq!(record.max_temp.as_deref(), Some("15"));
        assert_eq!(record.min_temp, None);
        assert_eq!(record.precis, None);
        assert_eq!(record.precipitation_probability.as_deref(), Some("5"));
    }

    #[test]
    fn test_values_copied_verbatim() {
        let key = key();
        let doc = ProductDocument {
            areas: vec![area(
                "location",
                "Orange",
                vec![period(
                    "2023-06-01T00:00:00+10:00",
                    vec![element(MIN_TEMP_ELEMENT, "-2.5"), element(MAX_TEMP_ELEMENT, " 9")],
                    vec![text(PRECIS_TEXT, "Frost, then sunny. "), text(PRECIPITATION_TEXT, "0%")],
                )],
            )],
            ..ProductDocument::default()
        };

        let out = RecordNormalizer::new(&key).normalize(&doc, "nsw");
        let record = out[0].as_ref().unwrap();
        assert_eq!(record.min_temp.as_deref(), Some("-2.5"));
        assert_eq!(record.max_temp.as_deref(), Some(" 9"));
        assert_eq!(record.precis.as_deref(), Some("Frost, then sunny. "));
        assert_eq!(record.precipitation_probability.as_deref(), Some("0"));
    }

    #[test]
    fn test_same_feed_twice_yields_same_ids() {
        let key = key();
        let doc = parse_product(SAMPLE_PRODUCT.as_bytes());
        let ids = |doc: &ProductDocument| -> Vec<String> {
            RecordNormalizer::new(&key)
                .normalize(doc, "nsw")
                .into_iter()
                .filter_map(Result::ok)
                .map(|r| r.id)
                .collect()
        };

        assert_eq!(ids(&doc), ids(&parse_product(SAMPLE_PRODUCT.as_bytes())));
    }
}
