use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-issued identifier of an ingestion job (UUID-shaped, but treated as opaque).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a job as observed through the store's `status` column.
///
/// Only the three terminal values and the synthetic `unknown` (no row yet)
/// are distinguished; every other pipeline state is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Processed,
    NeedsReview,
    Failed,
    /// No row returned for the job id.
    Unknown,
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "processed" => JobStatus::Processed,
            "needs_review" => JobStatus::NeedsReview,
            "failed" => JobStatus::Failed,
            "unknown" => JobStatus::Unknown,
            other => JobStatus::Other(other.to_string()),
        }
    }

    /// Polling stops once one of these is reached.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Processed | JobStatus::NeedsReview | JobStatus::Failed
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Processed => "processed",
            JobStatus::NeedsReview => "needs_review",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
            JobStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
