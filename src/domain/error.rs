use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("field {0} is mapped to more than one output")]
    DuplicateField(String),

    #[error("field {0} does not exist in the table")]
    UnknownField(String),

    #[error("field {0} is the source field and cannot receive output")]
    OverwritesSource(String),

    #[error("table {0} does not exist")]
    TableNotFound(String),

    #[error("view {0} does not exist")]
    ViewNotFound(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Invalid API Key provided. Please check your key and try again.")]
    Auth,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider responded with HTTP {0}")]
    Status(u16),

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("write rejected: {affected} of {expected} records updated")]
    Rejected { expected: usize, affected: u64 },
}

#[derive(Debug, Error)]
#[error("wrote {written} of {total} updates before failure: {source}")]
pub struct WriteError {
    pub written: usize,
    pub total: usize,
    #[source]
    pub source: StoreError,
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid API Key provided. Please check your key and try again.")]
    Auth,

    #[error("enrichment cancelled after {processed} of {total} records")]
    Cancelled { processed: usize, total: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
