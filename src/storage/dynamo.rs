//! AWS DynamoDB storage implementation.
//!
//! Records live in one table with `id` as the partition key. Lookups use
//! filtered scans over string attributes, so no secondary index is required.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{Attributes, DATE_FORMAT, ForecastRecord, StoreConfig, attr};
use crate::storage::ForecastStore;

type Item = HashMap<String, AttributeValue>;

/// DynamoDB-backed forecast storage.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    /// Create a new DynamoDB storage instance.
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Create DynamoDB storage from the shared AWS configuration.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        Ok(Self::new(Client::new(&shared), &config.table))
    }

    /// Filtered scan following pagination to the end of the table.
    async fn scan_filtered(
        &self,
        filter: &str,
        attribute: &str,
        value: String,
    ) -> Result<Vec<ForecastRecord>> {
        let mut records = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table)
                .filter_expression(filter)
                .expression_attribute_names("#k", attribute)
                .expression_attribute_values(":v", AttributeValue::S(value.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| AppError::store(DisplayErrorContext(e)))?;

            for item in output.items() {
                records.push(ForecastRecord::from_attributes(&to_attributes(item))?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        log::debug!(
            "Scan {} on {} returned {} item(s)",
            filter,
            self.table,
            records.len()
        );
        Ok(records)
    }
}

/// Keep the string attributes of an item.
fn to_attributes(item: &Item) -> Attributes {
    item.iter()
        .filter_map(|(name, value)| match value {
            AttributeValue::S(s) => Some((name.clone(), s.clone())),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl ForecastStore for DynamoStore {
    async fn upsert(&self, record: &ForecastRecord) -> Result<()> {
        let item: Item = record
            .attributes()
            .into_iter()
            .map(|(name, value)| (name, AttributeValue::S(value)))
            .collect();

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| AppError::store(DisplayErrorContext(e)))?;

        Ok(())
    }

    async fn scan_by_secondary_id(&self, secondary_id: &str) -> Result<Vec<ForecastRecord>> {
        self.scan_filtered("#k = :v", attr::SECONDARY_ID, secondary_id.to_string())
            .await
    }

    async fn scan_older_than(&self, date: NaiveDate) -> Result<Vec<ForecastRecord>> {
        // ISO dates order lexically, so a string comparison is a date comparison.
        self.scan_filtered("#k < :v", attr::DATE, date.format(DATE_FORMAT).to_string())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_record;

    #[test]
    fn test_to_attributes_keeps_strings_only() {
        let mut item: Item = sample_record("Sydney", "nsw", "2023-06-01")
            .attributes()
            .into_iter()
            .map(|(k, v)| (k, AttributeValue::S(v)))
            .collect();
        item.insert("ttl".to_string(), AttributeValue::N("1685577600".to_string()));

        let attrs = to_attributes(&item);
        assert!(!attrs.contains_key("ttl"));
        let record = ForecastRecord::from_attributes(&attrs).unwrap();
        assert_eq!(record, sample_record("Sydney", "nsw", "2023-06-01"));
    }
}
