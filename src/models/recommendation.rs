use serde::{ser::Serializer, Deserialize, Serialize};
use std::collections::HashMap;

use super::{Recipient, Sku};

/// One (customer, product) pair submitted for scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRow {
    pub customer_id: u64,
    pub email: String,
    pub sku: Sku,
}

/// A scoring row with the model's predicted affinity attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    pub customer_id: u64,
    pub email: String,
    pub sku: Sku,
    pub score: f32,
}

/// Lazy cross-product of recipients and SKUs.
///
/// Rows are produced recipient-major. Nothing is materialized until the
/// iterator is driven, including when it is serialized as a JSON array.
#[derive(Debug, Clone)]
pub struct ScoringRows<'a> {
    recipients: Vec<&'a Recipient>,
    skus: &'a [Sku],
    next: usize,
}

impl<'a> ScoringRows<'a> {
    /// Builds the cross-product, skipping recipients without an email address
    pub fn new(recipients: &'a [Recipient], skus: &'a [Sku]) -> Self {
        Self {
            recipients: recipients.iter().filter(|r| r.has_email()).collect(),
            skus,
            next: 0,
        }
    }

    /// Number of recipients that contribute rows
    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    fn total(&self) -> usize {
        self.recipients.len() * self.skus.len()
    }
}

impl Iterator for ScoringRows<'_> {
    type Item = ScoringRow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }
        let recipient = self.recipients[self.next / self.skus.len()];
        let sku = self.skus[self.next % self.skus.len()];
        self.next += 1;

        Some(ScoringRow {
            customer_id: recipient.customer_id,
            email: recipient.email.clone(),
            sku,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScoringRows<'_> {}

impl Serialize for ScoringRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.clone())
    }
}

/// A recommended product and its score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub sku: Sku,
    pub score: f32,
}

/// Top-N recommendations per recipient, keyed case-insensitively by email
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipientRecommendations {
    entries: HashMap<String, Vec<RecommendationEntry>>,
}

impl RecipientRecommendations {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn insert(&mut self, email: &str, recommendations: Vec<RecommendationEntry>) {
        self.entries.insert(Self::key(email), recommendations);
    }

    /// Recommendations for an email; empty when the recipient was never scored
    pub fn get(&self, email: &str) -> &[RecommendationEntry] {
        self.entries
            .get(&Self::key(email))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, email: &str) -> bool {
        self.entries.contains_key(&Self::key(email))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
