//! Background kick of the worker endpoint.
//!
//! The worker call is purely observational: its result is printed when it
//! arrives and never feeds back into the poll outcome. The task is spawned
//! once and only ever joined for a bounded grace period.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What the worker endpoint did with our kick.
#[derive(Debug, Clone)]
pub enum WorkerReport {
    Responded {
        status: u16,
        body: String,
        elapsed: Duration,
    },
    Failed {
        error: String,
        elapsed: Duration,
    },
}

impl WorkerReport {
    pub fn elapsed(&self) -> Duration {
        match self {
            WorkerReport::Responded { elapsed, .. } | WorkerReport::Failed { elapsed, .. } => {
                *elapsed
            }
        }
    }
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerReport::Responded {
                status,
                body,
                elapsed,
            } => write!(
                f,
                "  [WORKER RESPONSE] status: {} | body: {} (took {:.1}s)",
                status,
                body,
                elapsed.as_secs_f64()
            ),
            WorkerReport::Failed { error, elapsed } => write!(
                f,
                "  [WORKER REQUEST FAILED OR TIMED OUT]: {} (took {:.1}s)",
                error,
                elapsed.as_secs_f64()
            ),
        }
    }
}

/// Issues `POST /api/worker` with a static bearer token.
pub struct WorkerKicker {
    url: String,
    token: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl WorkerKicker {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
        http: reqwest::Client,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout,
            http,
        }
    }

    /// Send the kick and wait for its outcome. Never fails; errors become
    /// [`WorkerReport::Failed`].
    pub async fn kick(&self) -> WorkerReport {
        let start = Instant::now();
        let result = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(resp) => {
                let status = resp.status().as_u16();
                match resp.text().await {
                    Ok(body) => WorkerReport::Responded {
                        status,
                        body,
                        elapsed: start.elapsed(),
                    },
                    Err(e) => WorkerReport::Failed {
                        error: e.to_string(),
                        elapsed: start.elapsed(),
                    },
                }
            }
            Err(e) => WorkerReport::Failed {
                error: e.to_string(),
                elapsed: start.elapsed(),
            },
        }
    }

    /// Run the kick on its own task. The report is printed as soon as it
    /// arrives, interleaving with whatever the main flow is printing.
    pub fn spawn(self) -> WorkerKick {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                report = self.kick() => {
                    println!("\n{report}");
                    debug!(url = %self.url, elapsed_ms = report.elapsed().as_millis() as u64, "worker kick finished");
                    Some(report)
                }
                _ = signal.notified() => {
                    debug!(url = %self.url, "worker kick abandoned");
                    None
                }
            }
        });

        WorkerKick { handle, shutdown }
    }
}

/// Handle to an in-flight worker kick.
pub struct WorkerKick {
    handle: JoinHandle<Option<WorkerReport>>,
    shutdown: Arc<Notify>,
}

impl WorkerKick {
    /// Wait at most `grace` for the report, then abandon the request.
    ///
    /// Returns `None` if the kick was still in flight when the grace period
    /// ran out.
    pub async fn settle(self, grace: Duration) -> Option<WorkerReport> {
        let WorkerKick {
            mut handle,
            shutdown,
        } = self;

        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(error = %e, "worker kick task panicked");
                None
            }
            Err(_) => {
                shutdown.notify_one();
                debug!(grace_ms = grace.as_millis() as u64, "worker kick still running, detaching");
                None
            }
        }
    }

    /// Abandon the request without waiting.
    pub fn cancel(self) {
        self.shutdown.notify_one();
    }
}
