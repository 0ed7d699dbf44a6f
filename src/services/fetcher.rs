use crate::domain::{
    EnrichmentError, EnrichmentResult, FieldMapping, LookupError, RecordFailure, SourceRecord,
};

use super::{CancelToken, EnrichmentProvider, LookupOutcome, Pacer};

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub results: Vec<EnrichmentResult>,
    pub not_found: usize,
    pub failed: Vec<RecordFailure>,
}

pub async fn enrich(
    records: &[SourceRecord],
    provider: &dyn EnrichmentProvider,
    field_mapping: &FieldMapping,
    pacer: &dyn Pacer,
    cancel: &CancelToken,
) -> Result<FetchOutcome, EnrichmentError> {
    let mut outcome = FetchOutcome::default();

    for (processed, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            log::info!("Enrichment cancelled after {} records", processed);
            return Err(EnrichmentError::Cancelled {
                processed,
                total: records.len(),
            });
        }

        let lookup_outcome = match provider.lookup(&record.source_value).await {
            Ok(Some(provider_match)) => {
                outcome
                    .results
                    .push(field_mapping.apply(&record.id, &provider_match));
                LookupOutcome::Matched
            }
            Ok(None) => {
                log::debug!("No match for record {}", record.id);
                outcome.not_found += 1;
                LookupOutcome::Missed
            }
            Err(LookupError::Auth) => {
                log::error!("Provider rejected the API key at record {}", record.id);
                return Err(EnrichmentError::Auth);
            }
            Err(e) => {
                log::warn!("Lookup failed for record {}: {}", record.id, e);
                let rate_limited = matches!(e, LookupError::RateLimited);
                outcome.failed.push(RecordFailure {
                    record_id: record.id.clone(),
                    reason: e.to_string(),
                });
                match rate_limited {
                    true => LookupOutcome::RateLimited,
                    false => LookupOutcome::Failed,
                }
            }
        };

        pacer.pause(lookup_outcome).await;
    }

    Ok(outcome)
}
