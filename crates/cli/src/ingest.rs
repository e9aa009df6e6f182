//! Ingest endpoint client.
//!
//! Submits a media URL to `POST /api/ingest` and extracts the `job_id`
//! the service assigns to the new job.

use sanity_core::{JobId, Result, SanityError};
use serde::Serialize;
use tracing::debug;

/// Request body for `POST /api/ingest`.
#[derive(Serialize)]
struct IngestRequestBody<'a> {
    #[serde(rename = "mediaUrl")]
    media_url: &'a str,
}

/// Append a `t=<unix_secs>` cache buster so every run submits a URL the
/// service has not seen before.
pub fn fresh_media_url(base: &str, unix_secs: i64) -> Result<String> {
    let mut url = url::Url::parse(base)
        .map_err(|e| SanityError::InvalidConfig(format!("media url {base}: {e}")))?;
    url.query_pairs_mut().append_pair("t", &unix_secs.to_string());
    Ok(url.into())
}

/// Pull a non-empty string `job_id` out of an ingest response body.
pub fn extract_job_id(body: &serde_json::Value) -> Option<JobId> {
    body.get("job_id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(JobId::new)
}

/// Client for the ingest endpoint.
pub struct IngestClient {
    url: String,
    http: reqwest::Client,
}

impl IngestClient {
    pub fn new(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit `media_url` for ingestion.
    ///
    /// The body is parsed as JSON whatever the status code; a body without
    /// `job_id` yields [`SanityError::IngestRejected`] carrying the full body.
    pub async fn submit(&self, media_url: &str) -> Result<JobId> {
        let resp = self
            .http
            .post(&self.url)
            .json(&IngestRequestBody { media_url })
            .send()
            .await?;

        let status = resp.status();
        println!("- HTTP status: {}", status.as_u16());
        debug!(url = %self.url, %status, "ingest responded");

        let body: serde_json::Value = resp.json().await?;
        extract_job_id(&body).ok_or_else(|| SanityError::IngestRejected(body.to_string()))
    }
}
