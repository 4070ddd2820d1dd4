use std::cmp::Ordering;

use crate::models::{EvaluationRecord, RankedCandidate, RankingMetric};

/// How candidate models are ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Rank on the first metric from `RankingMetric::AUTO_ORDER` that any record
    /// reports; records without that metric are ignored
    #[default]
    Auto,
    /// Rank only on this metric; records without it are ignored
    Metric(RankingMetric),
}

impl From<Option<RankingMetric>> for SelectionPolicy {
    fn from(metric: Option<RankingMetric>) -> Self {
        metric.map_or(SelectionPolicy::Auto, SelectionPolicy::Metric)
    }
}

/// Picks the single best model out of a set of evaluation records
pub struct ModelSelector {
    policy: SelectionPolicy,
}

impl ModelSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    /// The metric every record is ranked on, if any record reports it usably
    ///
    /// Scores from different metrics are never compared with each other.
    fn resolve_metric(&self, records: &[EvaluationRecord]) -> Option<RankingMetric> {
        match self.policy {
            SelectionPolicy::Metric(metric) => Some(metric),
            SelectionPolicy::Auto => RankingMetric::AUTO_ORDER
                .into_iter()
                .find(|metric| records.iter().any(|r| usable_value(r, *metric).is_some())),
        }
    }

    /// Returns the winning candidate, or `None` when no record has a usable metric
    ///
    /// Highest direction-normalized score wins; ties go to the most recently
    /// trained model, then to the lexicographically smallest model key.
    pub fn select(&self, records: &[EvaluationRecord]) -> Option<RankedCandidate> {
        let winner = self.resolve_metric(records).and_then(|metric| {
            records
                .iter()
                .filter_map(|record| usable_value(record, metric).map(|value| (record, value)))
                .max_by(|(a, a_value), (b, b_value)| {
                    metric
                        .ranking_score(*a_value)
                        .partial_cmp(&metric.ranking_score(*b_value))
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.trained_at.cmp(&b.trained_at))
                        .then_with(|| b.model_key.cmp(&a.model_key))
                })
                .map(|(record, value)| (record, metric, value))
        });

        match winner {
            Some((record, metric, value)) => {
                tracing::info!(
                    model = %record.model_name,
                    model_key = %record.model_key,
                    metric = %metric,
                    value,
                    considered = records.len(),
                    "Selected model"
                );
                Some(RankedCandidate::new(record.clone(), metric, value))
            }
            None => {
                tracing::info!(
                    considered = records.len(),
                    "No evaluation record has a usable metric"
                );
                None
            }
        }
    }
}

fn usable_value(record: &EvaluationRecord, metric: RankingMetric) -> Option<f64> {
    record.metrics.get(metric).filter(|v| v.is_finite())
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(SelectionPolicy::Auto)
    }
}
