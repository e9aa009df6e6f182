//! End-to-end sanity run: ingest, kick the worker, poll until terminal.

use sanity_core::{JobId, JobStatus, Result, SanityConfig, SanityError};
use tracing::{info, warn};

use crate::ingest::{fresh_media_url, IngestClient};
use crate::poller::{PollOutcome, PollPolicy, Poller, RestStatusStore};
use crate::worker::{WorkerKicker, WorkerReport};

/// How a run ended. Transport and decode failures are not outcomes; they
/// surface as errors from [`Runner::run`].
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The job reached `processed`, `needs_review` or `failed`.
    Terminal {
        job_id: JobId,
        status: JobStatus,
        report_url: String,
        /// `None` if the worker had not answered within the grace period.
        worker: Option<WorkerReport>,
    },
    /// The poll budget ran out with the job still in flight.
    TimedOut { job_id: JobId, last_status: Option<JobStatus> },
    /// The ingest response carried no `job_id`.
    IngestFailed { body: String },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Terminal { .. } => 0,
            RunOutcome::TimedOut { .. } | RunOutcome::IngestFailed { .. } => 1,
        }
    }
}

pub struct Runner {
    config: SanityConfig,
    http: reqwest::Client,
}

impl Runner {
    pub fn new(config: SanityConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sanity-test/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        println!("--- VERCEL PROD SANITY TEST START ---");
        let media_url = fresh_media_url(&self.config.media_url, chrono::Utc::now().timestamp())?;

        // [1] ingest
        let ingest = IngestClient::new(self.config.ingest_url(), self.http.clone());
        println!("\n[1] Ingest request");
        println!("- URL called: {}", ingest.url());
        let job_id = match ingest.submit(&media_url).await {
            Ok(id) => id,
            Err(SanityError::IngestRejected(body)) => {
                println!("- FAILED TO INGEST: {body}");
                return Ok(RunOutcome::IngestFailed { body });
            }
            Err(e) => return Err(e),
        };
        println!("- returned job_id (UUID): {job_id}");
        info!(%job_id, %media_url, "job ingested");

        // [2] worker kick
        println!("\n[2] Immediate worker kick");
        println!("- POST /api/worker");
        let kick = WorkerKicker::new(
            self.config.worker_url(),
            self.config.worker_token.clone(),
            self.config.worker_timeout,
            self.http.clone(),
        )
        .spawn();

        // [3] poll
        println!("\n[3] Poll job status (Supabase)");
        let policy = PollPolicy::from_config(&self.config);
        let poller = Poller::new(
            RestStatusStore::from_config(&self.config, self.http.clone()),
            policy,
        );
        let outcome = match poller.run(&job_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                kick.cancel();
                return Err(e);
            }
        };

        match outcome {
            PollOutcome::Terminal {
                status,
                attempts,
                elapsed,
            } => {
                let report_url = self.config.report_url(&job_id);
                println!("\n- final terminal state: {status}");
                println!("- Public Report URL: {report_url}");
                info!(
                    %job_id,
                    %status,
                    attempts,
                    elapsed_secs = elapsed.as_secs(),
                    "job reached terminal state"
                );

                let worker = kick.settle(self.config.terminal_grace).await;
                Ok(RunOutcome::Terminal {
                    job_id,
                    status,
                    report_url,
                    worker,
                })
            }
            PollOutcome::TimedOut {
                attempts,
                last_status,
            } => {
                println!("\n[!] Timeout polling DB after {}s", policy.budget().as_secs());
                warn!(%job_id, attempts, "job never reached a terminal state");
                kick.cancel();
                Ok(RunOutcome::TimedOut {
                    job_id,
                    last_status,
                })
            }
        }
    }
}
