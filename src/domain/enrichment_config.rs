use std::collections::BTreeMap;

use serde::Serialize;

use super::{ConfigurationError, FieldMapping, OutputKey};

pub const API_KEY: &str = "api-key";
pub const TABLE: &str = "table";
pub const VIEW: &str = "view";
pub const SOURCE_FIELD: &str = "source-field";
pub const FIELD_MAPPINGS: &str = "field-mappings";

pub const CONFIG_KEYS: [&str; 5] = [API_KEY, TABLE, VIEW, SOURCE_FIELD, FIELD_MAPPINGS];

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentConfig {
    pub api_key: String,
    pub table_id: String,
    pub view_id: String,
    pub source_field_id: String,
    pub field_mapping: FieldMapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoredConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub table: Option<String>,
    pub view: Option<String>,
    pub source_field: Option<String>,
    pub field_mappings: Option<FieldMapping>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub invalid: BTreeMap<String, String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl StoredConfig {
    pub fn api_key_set(&self) -> bool {
        present(&self.api_key).is_some()
    }

    pub fn missing(&self) -> Vec<String> {
        let mut missing: Vec<String> = [
            (API_KEY, &self.api_key),
            (TABLE, &self.table),
            (VIEW, &self.view),
            (SOURCE_FIELD, &self.source_field),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(key, _)| key.to_string())
        .collect();

        let unmapped = match &self.field_mappings {
            Some(mapping) => mapping.missing_keys(),
            None => OutputKey::ALL.to_vec(),
        };
        missing.extend(
            unmapped
                .into_iter()
                .map(|key| format!("{}.{}", FIELD_MAPPINGS, key.as_str())),
        );

        missing
    }

    pub fn resolve(&self) -> Result<EnrichmentConfig, ConfigurationError> {
        if let Some((key, reason)) = self.invalid.iter().next() {
            return Err(ConfigurationError::InvalidValue {
                key: key.clone(),
                reason: reason.clone(),
            });
        }

        let missing = self.missing();
        if !missing.is_empty() {
            return Err(ConfigurationError::Missing(missing));
        }

        let value = |v: &Option<String>| present(v).unwrap_or_default().to_string();

        Ok(EnrichmentConfig {
            api_key: value(&self.api_key),
            table_id: value(&self.table),
            view_id: value(&self.view),
            source_field_id: value(&self.source_field),
            field_mapping: self.field_mappings.clone().unwrap_or_default(),
        })
    }
}
