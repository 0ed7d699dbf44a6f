use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{LookupError, OutputKey, ProviderMatch};

pub const DEFAULT_BASE_URL: &str = "https://api.versium.com/v2";
const API_KEY_HEADER: &str = "X-Versium-Api-Key";
const INVALID_KEY_MESSAGE: &str = "Invalid api key provided.";

/// One lookup per source value. `Ok(None)` is a miss.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn lookup(&self, source_value: &str) -> Result<Option<ProviderMatch>, LookupError>;
}

pub struct VersiumClient {
    client: Client,
    api_key: String,
    url: String,
}

#[derive(Serialize)]
struct LookupQuery<'a> {
    li_url: &'a str,
}

#[derive(Deserialize, Default)]
struct ApiResponse {
    #[serde(default)]
    versium: Option<VersiumBody>,
}

#[derive(Deserialize, Default)]
struct VersiumBody {
    #[serde(default)]
    results: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

impl VersiumBody {
    fn rejects_api_key(&self) -> bool {
        self.errors
            .iter()
            .flatten()
            .any(|e| e.as_str() == Some(INVALID_KEY_MESSAGE))
    }
}

impl VersiumClient {
    pub fn new(client: Client, base_url: &str, api_key: String) -> Self {
        VersiumClient {
            client,
            api_key,
            url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn validate_api_key(&self) -> Result<bool, LookupError> {
        let res = self
            .client
            .get(format!("{}/contact", self.url))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        match check_api_key_response(status, &body) {
            Err(LookupError::Auth) => Ok(false),
            Err(e) => Err(e),
            Ok(()) => Ok(true),
        }
    }
}

#[async_trait]
impl EnrichmentProvider for VersiumClient {
    async fn lookup(&self, source_value: &str) -> Result<Option<ProviderMatch>, LookupError> {
        let res = self
            .client
            .get(format!("{}/c2b", self.url))
            .query(&LookupQuery {
                li_url: source_value,
            })
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        parse_lookup_response(status, &body)
    }
}

fn check_api_key_response(status: StatusCode, body: &str) -> Result<(), LookupError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(LookupError::Auth);
    }

    let json = parse_body(status, body)?;
    if json.versium.unwrap_or_default().rejects_api_key() {
        return Err(LookupError::Auth);
    }

    Ok(())
}

// A gateway error page is not JSON; report its status instead.
fn parse_body(status: StatusCode, body: &str) -> Result<ApiResponse, LookupError> {
    match serde_json::from_str(body) {
        Ok(json) => Ok(json),
        Err(_) if !status.is_success() => Err(LookupError::Status(status.as_u16())),
        Err(e) => Err(LookupError::Parse(e)),
    }
}

pub(crate) fn parse_lookup_response(
    status: StatusCode,
    body: &str,
) -> Result<Option<ProviderMatch>, LookupError> {
    match status {
        StatusCode::UNAUTHORIZED => return Err(LookupError::Auth),
        StatusCode::TOO_MANY_REQUESTS => return Err(LookupError::RateLimited),
        _ => {}
    }

    let versium = parse_body(status, body)?.versium.unwrap_or_default();

    if versium.rejects_api_key() {
        return Err(LookupError::Auth);
    }

    // Only the first candidate is used, whatever the provider's ranking.
    match versium.results.and_then(|r| r.into_iter().next()) {
        Some(result) => Ok(Some(extract_match(&result))),
        None if status.is_success() => Ok(None),
        None => Err(LookupError::Status(status.as_u16())),
    }
}

fn extract_match(result: &Map<String, Value>) -> ProviderMatch {
    let values = OutputKey::ALL
        .into_iter()
        .map(|key| {
            let value = match result.get(key.attribute()) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            (key, value)
        })
        .collect();

    ProviderMatch { values }
}
