//! Job status polling against the store's REST interface.

use std::time::Duration;

use async_trait::async_trait;
use sanity_core::{JobId, JobStatus, Result, SanityConfig, SanityError};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;

/// Anything that can report the current status of a job.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &JobId) -> Result<JobStatus>;
}

/// One row of `select=status`. The column is nullable.
#[derive(Debug, Deserialize)]
struct StatusRow {
    status: Option<String>,
}

/// Status of the first row. No row, or a null status, is `Unknown`.
fn first_status(rows: Vec<StatusRow>) -> JobStatus {
    rows.into_iter()
        .next()
        .and_then(|row| row.status)
        .map(|status| JobStatus::parse(&status))
        .unwrap_or(JobStatus::Unknown)
}

/// Reads `status` straight from the store table using service-level credentials.
pub struct RestStatusStore {
    store_url: String,
    table: String,
    service_key: String,
    http: reqwest::Client,
}

impl RestStatusStore {
    pub fn new(
        store_url: &str,
        table: impl Into<String>,
        service_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            store_url: store_url.trim_end_matches('/').to_string(),
            table: table.into(),
            service_key: service_key.into(),
            http,
        }
    }

    pub fn from_config(config: &SanityConfig, http: reqwest::Client) -> Self {
        Self::new(
            &config.store_url,
            config.status_table.clone(),
            config.service_key.clone(),
            http,
        )
    }
}

#[async_trait]
impl StatusSource for RestStatusStore {
    async fn fetch_status(&self, job_id: &JobId) -> Result<JobStatus> {
        let url = format!("{}/rest/v1/{}", self.store_url, self.table);
        let id_filter = format!("eq.{job_id}");
        let resp = self
            .http
            .get(&url)
            .query(&[("id", id_filter.as_str()), ("select", "status")])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(%url, %status, "status store responded");

        let rows: Vec<StatusRow> = serde_json::from_str(&body)
            .map_err(|e| SanityError::Decode(format!("status store returned {status}: {e}: {body}")))?;

        Ok(first_status(rows))
    }
}

/// Fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &SanityConfig) -> Self {
        Self {
            attempts: config.poll_attempts,
            interval: config.poll_interval,
        }
    }

    pub fn budget(&self) -> Duration {
        self.interval * self.attempts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Terminal {
        status: JobStatus,
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        attempts: u32,
        last_status: Option<JobStatus>,
    },
}

pub struct Poller<S> {
    source: S,
    policy: PollPolicy,
}

impl<S: StatusSource> Poller<S> {
    pub fn new(source: S, policy: PollPolicy) -> Self {
        Self { source, policy }
    }

    /// Poll until a terminal status or until the attempt budget is spent.
    ///
    /// Errors from the source are not retried and end polling immediately.
    pub async fn run(&self, job_id: &JobId) -> Result<PollOutcome> {
        let start = Instant::now();
        let mut last_status = None;

        for attempt in 1..=self.policy.attempts {
            let elapsed = start.elapsed();
            let status = self.source.fetch_status(job_id).await?;
            println!("- status at T+{}s: {}", elapsed.as_secs(), status);
            debug!(%job_id, attempt, %status, "polled job status");

            if status.is_terminal() {
                return Ok(PollOutcome::Terminal {
                    status,
                    attempts: attempt,
                    elapsed: start.elapsed(),
                });
            }
            last_status = Some(status);

            tokio::time::sleep(self.policy.interval).await;
        }

        Ok(PollOutcome::TimedOut {
            attempts: self.policy.attempts,
            last_status,
        })
    }
}
