use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    models::{Recipient, RecipientRecommendations, RecommendationEntry, ScoredRow, ScoringRows, Sku},
    services::providers::Scorer,
};

/// Builds the cross-product of recipients with an email address and products
pub fn scoring_rows<'a>(recipients: &'a [Recipient], skus: &'a [Sku]) -> ScoringRows<'a> {
    ScoringRows::new(recipients, skus)
}

/// Groups scored rows by email (case-insensitive) and keeps the `top_n` best per group.
///
/// Sorting is stable, so equal scores keep their input order. NaN scores sort last.
pub fn top_n_per_group(rows: Vec<ScoredRow>, top_n: usize) -> RecipientRecommendations {
    let mut groups: HashMap<String, Vec<RecommendationEntry>> = HashMap::new();

    for row in rows {
        groups
            .entry(row.email.trim().to_lowercase())
            .or_default()
            .push(RecommendationEntry {
                sku: row.sku,
                score: row.score,
            });
    }

    let mut recommendations = RecipientRecommendations::new();
    for (email, mut entries) in groups {
        entries.sort_by(|a, b| descending(a.score, b.score));
        entries.truncate(top_n);
        recommendations.insert(&email, entries);
    }

    recommendations
}

fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Scores every recipient against every product with the selected model
pub struct RecommendationGenerator {
    scorer: Arc<dyn Scorer>,
}

impl RecommendationGenerator {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    /// Produces up to `top_n` recommendations per recipient.
    ///
    /// All rows go to the scorer in a single call. Recipients without an email
    /// address are not scored and are absent from the result.
    pub async fn generate(
        &self,
        model: &[u8],
        recipients: &[Recipient],
        skus: &[Sku],
        top_n: usize,
    ) -> AppResult<RecipientRecommendations> {
        if top_n == 0 {
            return Err(AppError::InvalidInput(
                "Top-N must be greater than zero".to_string(),
            ));
        }

        let rows = scoring_rows(recipients, skus);
        let expected = rows.len();
        let skipped = recipients.len() - rows.recipient_count();
        if skipped > 0 {
            tracing::warn!(skipped, "Recipients without an email address are not scored");
        }
        if expected == 0 {
            tracing::info!("Nothing to score");
            return Ok(RecipientRecommendations::new());
        }

        let scored = self.scorer.score(model, rows).await?;
        if scored.len() != expected {
            return Err(AppError::Scoring(format!(
                "Scorer '{}' returned {} rows for {} inputs",
                self.scorer.name(),
                scored.len(),
                expected
            )));
        }

        let recommendations = top_n_per_group(scored, top_n);

        tracing::info!(
            rows = expected,
            recipients = recommendations.len(),
            top_n,
            "Recommendations generated"
        );

        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scores each row as `sku / 100` and records what it was asked to score
    #[derive(Default)]
    struct FakeScorer {
        calls: Mutex<Vec<usize>>,
        drop_last: bool,
    }

    #[async_trait::async_trait]
    impl Scorer for FakeScorer {
        async fn score(&self, _model: &[u8], rows: ScoringRows<'_>) -> AppResult<Vec<ScoredRow>> {
            self.calls.lock().unwrap().push(rows.len());
            let mut scored: Vec<ScoredRow> = rows
                .map(|row| ScoredRow {
                    customer_id: row.customer_id,
                    email: row.email,
                    sku: row.sku,
                    score: row.sku.0 as f32 / 100.0,
                })
                .collect();
            if self.drop_last {
                scored.pop();
            }
            Ok(scored)
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn scored(email: &str, sku: u32, score: f32) -> ScoredRow {
        ScoredRow {
            customer_id: 1,
            email: email.to_string(),
            sku: Sku(sku),
            score,
        }
    }

    #[test]
    fn test_top_n_sorted_descending_and_truncated() {
        let rows = vec![
            scored("a@example.com", 1, 0.1),
            scored("a@example.com", 2, 0.9),
            scored("a@example.com", 3, 0.5),
            scored("a@example.com", 4, 0.7),
        ];

        let recs = top_n_per_group(rows, 2);
        let entries = recs.get("a@example.com");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sku, Sku(2));
        assert_eq!(entries[1].sku, Sku(4));
    }

    #[test]
    fn test_top_n_shorter_group_kept_whole() {
        let rows = vec![scored("a@example.com", 1, 0.3), scored("b@example.com", 2, 0.4)];

        let recs = top_n_per_group(rows, 5);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs.get("a@example.com").len(), 1);
        assert_eq!(recs.get("b@example.com").len(), 1);
    }

    #[test]
    fn test_top_n_groups_case_insensitively() {
        let rows = vec![
            scored("Ada@Example.com", 1, 0.3),
            scored("ada@example.com", 2, 0.4),
        ];

        let recs = top_n_per_group(rows, 3);
        assert_eq!(recs.len(), 1);
        let skus: Vec<Sku> = recs.get("ADA@EXAMPLE.COM").iter().map(|e| e.sku).collect();
        assert_eq!(skus, vec![Sku(2), Sku(1)]);
    }

    #[test]
    fn test_top_n_ties_keep_input_order() {
        let rows = vec![
            scored("a@example.com", 3, 0.5),
            scored("a@example.com", 1, 0.5),
            scored("a@example.com", 2, 0.5),
        ];

        let recs = top_n_per_group(rows, 3);
        let skus: Vec<Sku> = recs.get("a@example.com").iter().map(|e| e.sku).collect();
        assert_eq!(skus, vec![Sku(3), Sku(1), Sku(2)]);
    }

    #[test]
    fn test_top_n_output_is_subsequence_of_sorted_group() {
        let scores = [0.2, 0.8, f32::NAN, 0.4, 0.6, 0.1];
        let rows: Vec<ScoredRow> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| scored("a@example.com", i as u32, *s))
            .collect();

        for n in 1..=scores.len() + 1 {
            let recs = top_n_per_group(rows.clone(), n);
            let entries = recs.get("a@example.com");
            assert_eq!(entries.len(), n.min(scores.len()));
            assert!(entries
                .windows(2)
                .all(|w| w[1].score.is_nan() || w[0].score >= w[1].score));
            for entry in entries {
                assert!(rows.iter().any(|r| r.sku == entry.sku));
            }
        }
    }

    #[tokio::test]
    async fn test_generate_scores_in_one_call() {
        let scorer = Arc::new(FakeScorer::default());
        let generator = RecommendationGenerator::new(scorer.clone());
        let recipients = vec![
            Recipient::new(1, "a@example.com"),
            Recipient::new(2, "b@example.com"),
        ];
        let skus = vec![Sku(10), Sku(30), Sku(20)];

        let recs = generator.generate(b"model", &recipients, &skus, 2).await.unwrap();

        assert_eq!(*scorer.calls.lock().unwrap(), vec![6]);
        let skus: Vec<Sku> = recs.get("b@example.com").iter().map(|e| e.sku).collect();
        assert_eq!(skus, vec![Sku(30), Sku(20)]);
    }

    #[tokio::test]
    async fn test_generate_skips_recipients_without_email() {
        let scorer = Arc::new(FakeScorer::default());
        let generator = RecommendationGenerator::new(scorer.clone());
        let recipients = vec![Recipient::new(1, "a@example.com"), Recipient::new(2, "  ")];
        let skus = vec![Sku(10)];

        let recs = generator.generate(b"model", &recipients, &skus, 3).await.unwrap();

        assert_eq!(*scorer.calls.lock().unwrap(), vec![1]);
        assert_eq!(recs.len(), 1);
        assert!(recs.contains("a@example.com"));
    }

    #[tokio::test]
    async fn test_generate_nothing_to_score_skips_scorer() {
        let scorer = Arc::new(FakeScorer::default());
        let generator = RecommendationGenerator::new(scorer.clone());
        let recipients = vec![Recipient::new(1, "a@example.com")];

        let recs = generator.generate(b"model", &recipients, &[], 3).await.unwrap();

        assert!(recs.is_empty());
        assert!(scorer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_rejects_zero_top_n() {
        let generator = RecommendationGenerator::new(Arc::new(FakeScorer::default()));
        let result = generator.generate(b"model", &[], &[], 0).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generate_rejects_cardinality_mismatch() {
        let scorer = Arc::new(FakeScorer {
            drop_last: true,
            ..Default::default()
        });
        let generator = RecommendationGenerator::new(scorer);
        let recipients = vec![Recipient::new(1, "a@example.com")];
        let skus = vec![Sku(1), Sku(2)];

        let result = generator.generate(b"model", &recipients, &skus, 3).await;
        assert!(matches!(result, Err(AppError::Scoring(_))));
    }
}
