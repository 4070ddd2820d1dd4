use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod campaign;
pub mod mail;
pub mod recipient;
pub mod recommendation;

pub use campaign::{BatchFailure, CampaignReport, CampaignStatus, DispatchOutcome};
pub use mail::{EmailAddress, MailMessage, Personalization, ProviderResponse, TemplateData};
pub use recipient::{Recipient, Sku};
pub use recommendation::{
    RecipientRecommendations, RecommendationEntry, ScoredRow, ScoringRow, ScoringRows,
};

/// Metric used to rank trained models against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    Auc,
    Accuracy,
    F1Score,
    RSquared,
    Rmse,
    MeanAbsoluteError,
    LogLoss,
}

impl RankingMetric {
    /// Preference order used when no metric is configured
    pub const AUTO_ORDER: [RankingMetric; 7] = [
        RankingMetric::Auc,
        RankingMetric::Accuracy,
        RankingMetric::F1Score,
        RankingMetric::RSquared,
        RankingMetric::Rmse,
        RankingMetric::MeanAbsoluteError,
        RankingMetric::LogLoss,
    ];

    /// Whether larger values of this metric mean a better model
    pub fn higher_is_better(self) -> bool {
        matches!(
            self,
            RankingMetric::Auc
                | RankingMetric::Accuracy
                | RankingMetric::F1Score
                | RankingMetric::RSquared
        )
    }

    /// Maps a raw metric value onto a scale where higher always wins
    pub fn ranking_score(self, value: f64) -> f64 {
        if self.higher_is_better() {
            value
        } else {
            -value
        }
    }
}

impl Display for RankingMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RankingMetric::Auc => "auc",
            RankingMetric::Accuracy => "accuracy",
            RankingMetric::F1Score => "f1_score",
            RankingMetric::RSquared => "r_squared",
            RankingMetric::Rmse => "rmse",
            RankingMetric::MeanAbsoluteError => "mean_absolute_error",
            RankingMetric::LogLoss => "log_loss",
        };
        write!(f, "{}", name)
    }
}

/// Evaluation metrics recorded for a trained model.
///
/// Which fields are present depends on the model type: classifiers report
/// accuracy/AUC/F1/log-loss, regressors report R²/RMSE/MAE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetrics {
    pub accuracy: Option<f64>,
    pub auc: Option<f64>,
    pub f1_score: Option<f64>,
    pub r_squared: Option<f64>,
    pub rmse: Option<f64>,
    pub mean_absolute_error: Option<f64>,
    pub log_loss: Option<f64>,
}

impl ModelMetrics {
    pub fn get(&self, metric: RankingMetric) -> Option<f64> {
        match metric {
            RankingMetric::Auc => self.auc,
            RankingMetric::Accuracy => self.accuracy,
            RankingMetric::F1Score => self.f1_score,
            RankingMetric::RSquared => self.r_squared,
            RankingMetric::Rmse => self.rmse,
            RankingMetric::MeanAbsoluteError => self.mean_absolute_error,
            RankingMetric::LogLoss => self.log_loss,
        }
    }
}

/// One evaluation run of a trained model, as stored in the metric store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub model_name: String,
    /// Store key of the serialized model blob
    pub model_key: String,
    pub trained_at: DateTime<Utc>,
    #[serde(default)]
    pub metrics: ModelMetrics,
}

/// The model picked by the selector, together with the metric it won on
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    record: EvaluationRecord,
    metric: RankingMetric,
    metric_value: f64,
}

impl RankedCandidate {
    pub(crate) fn new(record: EvaluationRecord, metric: RankingMetric, metric_value: f64) -> Self {
        Self {
            record,
            metric,
            metric_value,
        }
    }

    pub fn record(&self) -> &EvaluationRecord {
        &self.record
    }

    pub fn model_key(&self) -> &str {
        &self.record.model_key
    }

    pub fn metric(&self) -> RankingMetric {
        self.metric
    }

    /// Raw value of the winning metric
    pub fn metric_value(&self) -> f64 {
        self.metric_value
    }

    /// Direction-normalized score; higher is better
    pub fn score(&self) -> f64 {
        self.metric.ranking_score(self.metric_value)
    }
}

/// Serializable summary of the selected model, used in reports and templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    pub key: String,
    pub metric: RankingMetric,
    pub score: f64,
    pub trained_at: DateTime<Utc>,
}

impl From<&RankedCandidate> for ModelSummary {
    fn from(candidate: &RankedCandidate) -> Self {
        Self {
            name: candidate.record.model_name.clone(),
            key: candidate.record.model_key.clone(),
            metric: candidate.metric,
            score: candidate.metric_value,
            trained_at: candidate.record.trained_at,
        }
    }
}
