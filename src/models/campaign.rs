use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ModelSummary;
use crate::error::AppError;

/// Why a batch was not accepted by the email provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Zero-based index of the failing batch
    pub batch_index: usize,
    /// HTTP status, when the provider answered at all
    pub status: Option<u16>,
    pub reason: String,
}

impl BatchFailure {
    /// Keeps the provider's status when the batch was rejected rather than lost in transit
    pub fn from_error(batch_index: usize, err: &AppError) -> Self {
        let status = match err {
            AppError::EmailProviderRejected { status, .. } => Some(*status),
            _ => None,
        };
        Self {
            batch_index,
            status,
            reason: err.to_string(),
        }
    }
}

/// Result of sending all batches of one campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub batches_total: usize,
    pub batches_sent: usize,
    /// Recipients whose batch was accepted
    pub recipients_accepted: usize,
    /// Recipients never submitted: no email address, or behind a failed batch
    pub recipients_skipped: usize,
    pub failure: Option<BatchFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// No model had a usable metric; nothing was sent
    NoCandidateModel,
    /// Every batch was accepted
    Completed,
    /// Some batches were accepted before one failed
    Partial,
    /// The first batch failed
    Failed,
}

impl CampaignStatus {
    pub fn from_dispatch(outcome: &DispatchOutcome) -> Self {
        match (&outcome.failure, outcome.batches_sent) {
            (None, _) => CampaignStatus::Completed,
            (Some(_), 0) => CampaignStatus::Failed,
            (Some(_), _) => CampaignStatus::Partial,
        }
    }
}

/// Structured summary of one campaign run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub run_id: Uuid,
    pub template_id: String,
    pub status: CampaignStatus,
    pub model: Option<ModelSummary>,
    pub dispatch: Option<DispatchOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
