use crate::domain::{EnrichmentResult, WriteError};

use super::RecordStore;

// The store's write API takes at most 50 records per call.
pub const MAX_RECORDS_PER_UPDATE: usize = 50;

/// Writes `updates` in windows of [`MAX_RECORDS_PER_UPDATE`], awaiting each
/// before sending the next. Stops at the first rejected window; windows
/// already written stay written.
pub async fn persist(
    store: &dyn RecordStore,
    table_id: &str,
    updates: &[EnrichmentResult],
) -> Result<usize, WriteError> {
    let total = updates.len();
    let mut written = 0;

    for batch in updates.chunks(MAX_RECORDS_PER_UPDATE) {
        if let Err(source) = store.update_records(table_id, batch).await {
            log::error!(
                "Batch write failed after {} of {} updates: {}",
                written,
                total,
                source
            );
            return Err(WriteError {
                written,
                total,
                source,
            });
        }
        written += batch.len();
        log::info!("Wrote {} of {} updates", written, total);
    }

    Ok(written)
}

#[cfg(test)]
pub(crate) mod memory_store {
    use std::{
        collections::{BTreeMap, HashMap, HashSet},
        sync::Mutex,
    };

    use async_trait::async_trait;

    use crate::{
        domain::{EnrichmentResult, SourceRecord, StoreError, ViewPreview},
        services::RecordStore,
    };

    pub struct MemoryStore {
        pub table_id: String,
        pub view_id: String,
        pub table_name: String,
        pub view_name: String,
        pub fields: HashSet<String>,
        pub records: Mutex<Vec<(String, BTreeMap<String, String>)>>,
        pub batch_sizes: Mutex<Vec<usize>>,
        pub reject_call: Option<usize>,
    }

    impl MemoryStore {
        pub fn new(fields: &[&str]) -> Self {
            MemoryStore {
                table_id: "tbl1".to_string(),
                view_id: "viw1".to_string(),
                table_name: "Leads".to_string(),
                view_name: "To enrich".to_string(),
                fields: fields.iter().map(|f| f.to_string()).collect(),
                records: Mutex::new(vec![]),
                batch_sizes: Mutex::new(vec![]),
                reject_call: None,
            }
        }

        pub fn add_record(&self, id: &str, source_field: &str, source_value: &str) {
            let fields = [(source_field.to_string(), source_value.to_string())]
                .into_iter()
                .collect();
            self.records.lock().unwrap().push((id.to_string(), fields));
        }

        pub fn batch_sizes(&self) -> Vec<usize> {
            self.batch_sizes.lock().unwrap().clone()
        }

        pub fn field(&self, record_id: &str, field_id: &str) -> Option<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| id == record_id)
                .and_then(|(_, fields)| fields.get(field_id).cloned())
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn table_fields(
            &self,
            table_id: &str,
        ) -> Result<Option<HashSet<String>>, StoreError> {
            Ok((table_id == self.table_id).then(|| self.fields.clone()))
        }

        async fn view_preview(
            &self,
            table_id: &str,
            view_id: &str,
        ) -> Result<Option<ViewPreview>, StoreError> {
            if table_id != self.table_id || view_id != self.view_id {
                return Ok(None);
            }
            Ok(Some(ViewPreview {
                table_name: self.table_name.clone(),
                view_name: self.view_name.clone(),
                record_count: self.records.lock().unwrap().len(),
            }))
        }

        async fn load_source_records(
            &self,
            table_id: &str,
            view_id: &str,
            source_field_id: &str,
        ) -> Result<Option<Vec<SourceRecord>>, StoreError> {
            if table_id != self.table_id || view_id != self.view_id {
                return Ok(None);
            }
            let records = self
                .records
                .lock()
                .unwrap()
                .iter()
                .map(|(id, fields)| {
                    SourceRecord::new(
                        id.clone(),
                        fields.get(source_field_id).cloned().unwrap_or_default(),
                    )
                })
                .collect();
            Ok(Some(records))
        }

        async fn update_records(
            &self,
            _table_id: &str,
            updates: &[EnrichmentResult],
        ) -> Result<(), StoreError> {
            let call = {
                let mut sizes = self.batch_sizes.lock().unwrap();
                sizes.push(updates.len());
                sizes.len()
            };
            if self.reject_call == Some(call) {
                return Err(StoreError::Rejected {
                    expected: updates.len(),
                    affected: 0,
                });
            }

            let mut records = self.records.lock().unwrap();
            let index: HashMap<String, usize> = records
                .iter()
                .enumerate()
                .map(|(i, (id, _))| (id.clone(), i))
                .collect();
            for update in updates {
                let i = index.get(&update.record_id).copied().unwrap_or_else(|| {
                    records.push((update.record_id.clone(), BTreeMap::new()));
                    records.len() - 1
                });
                records[i].1.extend(update.fields.clone());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{memory_store::MemoryStore, persist};
    use crate::domain::{EnrichmentResult, StoreError};

    fn updates(n: usize) -> Vec<EnrichmentResult> {
        (0..n)
            .map(|i| EnrichmentResult {
                record_id: format!("r{}", i),
                fields: BTreeMap::from([("fldA".to_string(), format!("name {}", i))]),
            })
            .collect()
    }

    #[tokio::test]
    async fn splits_into_windows_of_fifty() {
        let store = MemoryStore::new(&["fldA"]);

        let written = persist(&store, "tbl1", &updates(120)).await.unwrap();

        assert_eq!(written, 120);
        assert_eq!(store.batch_sizes(), vec![50, 50, 20]);
        assert_eq!(store.field("r119", "fldA").as_deref(), Some("name 119"));
    }

    #[tokio::test]
    async fn nothing_to_write_means_no_calls() {
        let store = MemoryStore::new(&["fldA"]);

        assert_eq!(persist(&store, "tbl1", &[]).await.unwrap(), 0);
        assert!(store.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn rejected_window_stops_the_rest() {
        let mut store = MemoryStore::new(&["fldA"]);
        store.reject_call = Some(2);

        let err = persist(&store, "tbl1", &updates(120)).await.unwrap_err();

        assert_eq!(err.written, 50);
        assert_eq!(err.total, 120);
        assert!(matches!(err.source, StoreError::Rejected { expected: 50, .. }));
        assert_eq!(store.batch_sizes(), vec![50, 50]);
        assert_eq!(store.field("r49", "fldA").as_deref(), Some("name 49"));
        assert_eq!(store.field("r50", "fldA"), None);
    }
}
