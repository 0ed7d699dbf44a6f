use crate::domain::{
    ConfigurationError, EnrichmentConfig, EnrichmentError, RunSummary, ViewPreview,
};

use super::{enrich, persist, CancelToken, EnrichmentProvider, Pacer, RecordStore};

pub async fn run_enrichment(
    config: &EnrichmentConfig,
    provider: &dyn EnrichmentProvider,
    store: &dyn RecordStore,
    pacer: &dyn Pacer,
    cancel: &CancelToken,
) -> Result<RunSummary, EnrichmentError> {
    let table_fields = store
        .table_fields(&config.table_id)
        .await?
        .ok_or_else(|| ConfigurationError::TableNotFound(config.table_id.clone()))?;

    if !table_fields.contains(&config.source_field_id) {
        return Err(ConfigurationError::UnknownField(config.source_field_id.clone()).into());
    }
    config
        .field_mapping
        .validate(&config.source_field_id, &table_fields)?;

    let records = store
        .load_source_records(&config.table_id, &config.view_id, &config.source_field_id)
        .await?
        .ok_or_else(|| ConfigurationError::ViewNotFound(config.view_id.clone()))?;

    log::info!(
        "Starting enrichment of {} records from view {} in table {}",
        records.len(),
        config.view_id,
        config.table_id
    );

    // Nothing is written before every lookup is done.
    let fetched = enrich(&records, provider, &config.field_mapping, pacer, cancel).await?;
    persist(store, &config.table_id, &fetched.results).await?;

    let summary = RunSummary {
        total: records.len(),
        enriched: fetched.results.len(),
        not_found: fetched.not_found,
        failed: fetched.failed,
    };
    log::info!("{}", summary.message());

    Ok(summary)
}

pub async fn preview_enrichment(
    config: &EnrichmentConfig,
    store: &dyn RecordStore,
) -> Result<ViewPreview, EnrichmentError> {
    if store.table_fields(&config.table_id).await?.is_none() {
        return Err(ConfigurationError::TableNotFound(config.table_id.clone()).into());
    }

    let preview = store
        .view_preview(&config.table_id, &config.view_id)
        .await?
        .ok_or_else(|| ConfigurationError::ViewNotFound(config.view_id.clone()))?;

    Ok(preview)
}
