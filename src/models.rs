use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upload,
    Download,
}

/// One file to move between the local tree and the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferItem {
    pub local_path: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransferStatus {
    Completed { bytes: u64 },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub item: TransferItem,
    #[serde(flatten)]
    pub status: TransferStatus,
}

impl TransferOutcome {
    pub fn completed(item: TransferItem, bytes: u64) -> Self {
        Self {
            item,
            status: TransferStatus::Completed { bytes },
        }
    }

    pub fn failed(item: TransferItem, reason: impl ToString) -> Self {
        Self {
            item,
            status: TransferStatus::Failed {
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, TransferStatus::Completed { .. })
    }
}

/// Result of one pipeline run.
///
/// Outcomes appear in completion order, which is not the listing order.
/// `aborted` is set when the run stopped before transferring anything,
/// e.g. because the access check or the listing failed.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub direction: Direction,
    pub remote_dir: String,
    pub outcomes: Vec<TransferOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl TransferReport {
    pub fn new(direction: Direction, remote_dir: impl Into<String>) -> Self {
        Self {
            direction,
            remote_dir: remote_dir.into(),
            outcomes: Vec::new(),
            aborted: None,
        }
    }

    pub fn aborted(direction: Direction, remote_dir: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            aborted: Some(reason.to_string()),
            ..Self::new(direction, remote_dir)
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                TransferStatus::Completed { bytes } => bytes,
                TransferStatus::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failed().next().is_none()
    }
}
