//! Forecast record data structure.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{AppError, Result};

/// ISO calendar date format used for the `date` attribute and ID composition.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// String attributes of a persisted record, keyed by attribute name.
pub type Attributes = BTreeMap<String, String>;

/// Attribute names of the persisted representation.
pub mod attr {
    pub const ID: &str = "id";
    pub const SECONDARY_ID: &str = "secondaryID";
    pub const LOCATION: &str = "location";
    pub const STATE: &str = "state";
    pub const DATE: &str = "date";
    pub const MIN_TEMP: &str = "minTemp";
    pub const MAX_TEMP: &str = "maxTemp";
    pub const PRECIS: &str = "precis";
    pub const PRECIPITATION: &str = "precipitation";
}

/// One location's forecast for one calendar day.
///
/// Serializes to the public JSON view: the secondary ID stays internal and
/// absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    /// Upsert key derived from location, date and state
    pub id: String,

    /// Lookup key derived from location and date only
    #[serde(skip)]
    pub secondary_id: String,

    /// Area description as given by the feed
    pub location: String,

    /// Feed/region code, e.g. `nsw`
    pub state: String,

    /// Local calendar date of the forecast period
    pub date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precis: Option<String>,

    /// Percentage with the `%` suffix removed
    #[serde(rename = "precipitation", skip_serializing_if = "Option::is_none")]
    pub precipitation_probability: Option<String>,
}

impl ForecastRecord {
    /// The date rendered as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Attributes written to the store. Empty optional fields are left out.
    pub fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert(attr::ID.to_string(), self.id.clone());
        attrs.insert(attr::SECONDARY_ID.to_string(), self.secondary_id.clone());
        attrs.insert(attr::LOCATION.to_string(), self.location.clone());
        attrs.insert(attr::STATE.to_string(), self.state.clone());
        attrs.insert(attr::DATE.to_string(), self.date_string());

        let optional = [
            (attr::MIN_TEMP, &self.min_temp),
            (attr::MAX_TEMP, &self.max_temp),
            (attr::PRECIS, &self.precis),
            (attr::PRECIPITATION, &self.precipitation_probability),
        ];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                attrs.insert(name.to_string(), value.to_string());
            }
        }

        attrs
    }

    /// Rebuild a record from stored attributes.
    pub fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let required = |name: &str| {
            attrs
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::decode(format!("missing attribute '{name}'")))
        };
        let optional = |name: &str| attrs.get(name).filter(|v| !v.is_empty()).cloned();

        let raw_date = required(attr::DATE)?;
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
            .map_err(|e| AppError::decode(format!("invalid date '{raw_date}': {e}")))?;

        Ok(Self {
            id: required(attr::ID)?,
            secondary_id: required(attr::SECONDARY_ID)?,
            location: required(attr::LOCATION)?,
            state: required(attr::STATE)?,
            date,
            min_temp: optional(attr::MIN_TEMP),
            max_temp: optional(attr::MAX_TEMP),
            precis: optional(attr::PRECIS),
            precipitation_probability: optional(attr::PRECIPITATION),
        })
    }
}

/// A forecast period whose start time could not be parsed.
///
/// Kept apart from [`ForecastRecord`] so it can never be persisted or returned
/// from a query; only counted and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPeriod {
    pub location: String,
    pub state: String,
    pub start_time_local: String,
    pub reason: String,
}

#[cfg(test)]
pub(crate) fn sample_record(location: &str, state: &str, date: &str) -> ForecastRecord {
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap();
    ForecastRecord {
        id: format!("{location}-{date}-{state}"),
        secondary_id: crate::identity::secondary_id(location, date),
        location: location.to_string(),
        state: state.to_string(),
        date,
        min_temp: Some("10".to_string()),
        max_temp: Some("20".to_string()),
        precis: Some("Sunny".to_string()),
        precipitation_probability: Some("20".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_omit_empty_optionals() {
        let mut record = sample_record("Sydney", "nsw", "2023-06-01");
        record.min_temp = None;
        record.precis = Some(String::new());

        let attrs = record.attributes();
        assert_eq!(attrs.get("date").map(String::as_str), Some("2023-06-01"));
        assert_eq!(
            attrs.get("secondaryID").map(String::as_str),
            Some("2023-06-01-sydney")
        );
        assert!(!attrs.contains_key("minTemp"));
        assert!(!attrs.contains_key("precis"));
        assert_eq!(attrs.get("maxTemp").map(String::as_str), Some("20"));
        assert!(attrs.values().all(|v| !v.is_empty()));
    }

    #[test]
    fn test_from_attributes_restores_record() {
        let record = sample_record("Coffs Harbour", "nsw", "2023-06-02");
        let restored = ForecastRecord::from_attributes(&record.attributes()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_from_attributes_rejects_missing_id() {
        let mut attrs = sample_record("Sydney", "nsw", "2023-06-01").attributes();
        attrs.remove("id");
        let err = ForecastRecord::from_attributes(&attrs).unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn test_json_view_hides_secondary_id() {
        let mut record = sample_record("Sydney", "nsw", "2023-06-01");
        record.precis = None;
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["date"], "2023-06-01");
        assert_eq!(json["minTemp"], "10");
        assert_eq!(json["precipitation"], "20");
        assert!(json.get("secondaryId").is_none());
        assert!(json.get("secondaryID").is_none());
        assert!(json.get("precis").is_none());
    }
}
