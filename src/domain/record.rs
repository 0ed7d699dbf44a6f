use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub id: String,
    pub source_value: String,
}

impl SourceRecord {
    pub fn new(id: impl Into<String>, source_value: impl Into<String>) -> Self {
        SourceRecord {
            id: id.into(),
            source_value: source_value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentResult {
    #[serde(rename = "id")]
    pub record_id: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub record_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub enriched: usize,
    pub not_found: usize,
    pub failed: Vec<RecordFailure>,
}

impl RunSummary {
    pub fn message(&self) -> String {
        let mut message = format!(
            "Found matches and enriched {} out of {} total records.",
            self.enriched, self.total
        );
        if !self.failed.is_empty() {
            message.push_str(&format!(" {} records failed.", self.failed.len()));
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewPreview {
    pub table_name: String,
    pub view_name: String,
    pub record_count: usize,
}

impl ViewPreview {
    pub fn message(&self) -> String {
        format!(
            "Enrich {} Records in the {} table",
            self.record_count, self.table_name
        )
    }
}
