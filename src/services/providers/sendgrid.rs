/// SendGrid v3 Mail Send provider
///
/// Converts a provider-neutral `MailMessage` into SendGrid's dynamic template
/// payload and posts it to `/v3/mail/send`. SendGrid answers `202 Accepted`
/// when the message is queued; any other status is raised as
/// `EmailProviderRejected` carrying the status and body for diagnostics.
use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{EmailAddress, MailMessage, ProviderResponse, TemplateData},
    services::providers::EmailProvider,
};

#[derive(Debug, Serialize)]
struct SendGridMail<'a> {
    personalizations: Vec<SendGridPersonalization<'a>>,
    from: &'a EmailAddress,
    template_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mail_settings: Option<MailSettings>,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization<'a> {
    to: [&'a EmailAddress; 1],
    dynamic_template_data: &'a TemplateData,
}

#[derive(Debug, Serialize)]
struct MailSettings {
    sandbox_mode: Toggle,
}

#[derive(Debug, Serialize)]
struct Toggle {
    enable: bool,
}

impl<'a> From<&'a MailMessage> for SendGridMail<'a> {
    fn from(message: &'a MailMessage) -> Self {
        Self {
            personalizations: message
                .personalizations
                .iter()
                .map(|p| SendGridPersonalization {
                    to: [&p.to],
                    dynamic_template_data: &p.data,
                })
                .collect(),
            from: &message.from,
            template_id: &message.template_id,
            mail_settings: message.sandbox_mode.then_some(MailSettings {
                sandbox_mode: Toggle { enable: true },
            }),
        }
    }
}

/// Accepts 2xx answers and turns everything else into a rejection
fn into_provider_response(status: u16, body: String) -> AppResult<ProviderResponse> {
    let response = ProviderResponse { status, body };
    if response.is_accepted() {
        Ok(response)
    } else {
        Err(AppError::EmailProviderRejected {
            status: response.status,
            body: response.body,
        })
    }
}

#[derive(Clone)]
pub struct SendGridProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl SendGridProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, message: &MailMessage) -> AppResult<ProviderResponse> {
        let url = format!("{}/v3/mail/send", self.api_url.trim_end_matches('/'));
        let payload = SendGridMail::from(message);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(
            status,
            personalizations = message.personalizations.len(),
            provider = self.name(),
            "Mail send answered"
        );

        into_provider_response(status, body)
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelSummary, Personalization, RankingMetric, RecommendationEntry, Sku};
    use serde_json::json;

    fn message(sandbox_mode: bool) -> MailMessage {
        MailMessage {
            from: EmailAddress::new("shop@example.com", Some("Shop".to_string())),
            template_id: "d-123".to_string(),
            personalizations: vec![Personalization {
                to: EmailAddress::new("ada@example.com", Some("Ada".to_string())),
                data: TemplateData {
                    name: "Ada".to_string(),
                    segment: Some("vip".to_string()),
                    model: ModelSummary {
                        name: "ffm".to_string(),
                        key: "models/ffm.zip".to_string(),
                        metric: RankingMetric::Auc,
                        score: 0.9,
                        trained_at: "2024-05-01T00:00:00Z".parse().unwrap(),
                    },
                    recommendations: vec![RecommendationEntry {
                        sku: Sku(11),
                        score: 0.5,
                    }],
                },
            }],
            sandbox_mode,
        }
    }

    #[test]
    fn test_payload_matches_sendgrid_shape() {
        let message = message(false);
        let payload = serde_json::to_value(SendGridMail::from(&message)).unwrap();

        assert_eq!(payload["template_id"], "d-123");
        assert_eq!(payload["from"], json!({ "email": "shop@example.com", "name": "Shop" }));
        assert!(payload.get("mail_settings").is_none());

        let personalization = &payload["personalizations"][0];
        assert_eq!(
            personalization["to"],
            json!([{ "email": "ada@example.com", "name": "Ada" }])
        );
        let data = &personalization["dynamic_template_data"];
        assert_eq!(data["name"], "Ada");
        assert_eq!(data["segment"], "vip");
        assert_eq!(data["model"]["key"], "models/ffm.zip");
        assert_eq!(data["model"]["metric"], "auc");
        assert_eq!(data["recommendations"], json!([{ "sku": 11, "score": 0.5 }]));
    }

    #[test]
    fn test_non_2xx_answer_is_raised_as_rejection() {
        let accepted = into_provider_response(202, String::new()).unwrap();
        assert_eq!(accepted.status, 202);

        let result = into_provider_response(401, "bad api key".to_string());
        match result {
            Err(AppError::EmailProviderRejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad api key");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_sandbox_mode_sets_mail_settings() {
        let message = message(true);
        let payload = serde_json::to_value(SendGridMail::from(&message)).unwrap();
        assert_eq!(
            payload["mail_settings"],
            json!({ "sandbox_mode": { "enable": true } })
        );
    }
}
