use serde::{Deserialize, Serialize};

use super::{ModelSummary, RecommendationEntry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }
}

/// Substitution data rendered into the dynamic template for one recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateData {
    pub name: String,
    pub segment: Option<String>,
    pub model: ModelSummary,
    pub recommendations: Vec<RecommendationEntry>,
}

/// Per-recipient block of one outgoing message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personalization {
    pub to: EmailAddress,
    pub data: TemplateData,
}

/// One outgoing templated message covering a batch of recipients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: EmailAddress,
    pub template_id: String,
    pub personalizations: Vec<Personalization>,
    pub sandbox_mode: bool,
}

/// Raw answer from the email provider for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    /// Accepted means any 2xx; SendGrid answers 202 for queued mail
    pub fn is_accepted(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
