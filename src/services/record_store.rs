use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{EnrichmentResult, SourceRecord, StoreError, ViewPreview};

/// Backing store holding the records to enrich.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Field ids of a table, or `None` when the table does not exist.
    async fn table_fields(&self, table_id: &str) -> Result<Option<HashSet<String>>, StoreError>;

    /// Table and view names with the number of records in the view.
    /// `None` when the view does not exist in the table.
    async fn view_preview(
        &self,
        table_id: &str,
        view_id: &str,
    ) -> Result<Option<ViewPreview>, StoreError>;

    /// Records of a view in view order, carrying only the source field.
    /// `None` when the view does not exist in the table.
    async fn load_source_records(
        &self,
        table_id: &str,
        view_id: &str,
        source_field_id: &str,
    ) -> Result<Option<Vec<SourceRecord>>, StoreError>;

    /// Writes one batch as a single call.
    async fn update_records(
        &self,
        table_id: &str,
        updates: &[EnrichmentResult],
    ) -> Result<(), StoreError>;
}
