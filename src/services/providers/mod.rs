/// External collaborators of the campaign pipeline
///
/// Each collaborator sits behind a trait so the pipeline can be driven by the
/// file-backed store, the HTTP scoring service and SendGrid in production, and
/// by fakes in tests.
use crate::{
    error::AppResult,
    models::{EvaluationRecord, MailMessage, ProviderResponse, ScoredRow, ScoringRows},
};

pub mod metric_store;
pub mod scoring;
pub mod sendgrid;

pub use metric_store::FsMetricStore;
pub use scoring::HttpScorer;
pub use sendgrid::SendGridProvider;

/// Read-only access to model evaluation records and model blobs
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetricStore: Send + Sync {
    /// Returns up to `max` evaluation records under `prefix`, most recent first
    ///
    /// An empty or unreachable store yields an empty list rather than an error.
    async fn latest_evaluations(&self, prefix: &str, max: usize)
        -> AppResult<Vec<EvaluationRecord>>;

    /// Reads the serialized model stored at `model_key`
    async fn read_model(&self, model_key: &str) -> AppResult<Vec<u8>>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Batch inference over (customer, product) pairs
#[async_trait::async_trait]
pub trait Scorer: Send + Sync {
    /// Scores every row with the given serialized model in a single call
    ///
    /// Implementations must return exactly one scored row per input row.
    async fn score(&self, model: &[u8], rows: ScoringRows<'_>) -> AppResult<Vec<ScoredRow>>;

    fn name(&self) -> &'static str;
}

/// Transactional email delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmailProvider: Send + Sync {
    /// Submits one message
    ///
    /// A provider that answers with a non-2xx status should raise
    /// `AppError::EmailProviderRejected` so the status survives into the
    /// batch failure; a non-2xx `ProviderResponse` is treated the same way.
    async fn send(&self, message: &MailMessage) -> AppResult<ProviderResponse>;

    fn name(&self) -> &'static str;
}
