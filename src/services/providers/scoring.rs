/// HTTP scoring service client
///
/// Posts the serialized model together with every scoring row in one request
/// to `{scoring_url}/score`. Rows are written into the JSON body directly from
/// the lazy cross-product, so no intermediate row list is built; the encoded
/// body itself is held in memory until the request is sent.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{ScoredRow, ScoringRows},
    services::providers::Scorer,
};

#[derive(Serialize)]
struct ScoreRequest<'a> {
    /// Base64 of the model blob
    model: String,
    rows: ScoringRows<'a>,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    rows: Vec<ScoredRow>,
}

#[derive(Clone)]
pub struct HttpScorer {
    http_client: HttpClient,
    api_url: String,
}

/// Encodes the request body for one scoring call
fn encode_request(model: &[u8], rows: ScoringRows<'_>) -> AppResult<Vec<u8>> {
    let request = ScoreRequest {
        model: STANDARD.encode(model),
        rows,
    };
    Ok(serde_json::to_vec(&request)?)
}

impl HttpScorer {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/score", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl Scorer for HttpScorer {
    async fn score(&self, model: &[u8], rows: ScoringRows<'_>) -> AppResult<Vec<ScoredRow>> {
        let row_count = rows.len();
        let body = encode_request(model, rows)?;

        let response = self
            .http_client
            .post(self.endpoint())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Scoring service returned status {}: {}",
                status, body
            )));
        }

        let scored: ScoreResponse = response.json().await?;

        tracing::info!(
            rows = row_count,
            scored = scored.rows.len(),
            scorer = self.name(),
            "Batch scoring completed"
        );

        Ok(scored.rows)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
