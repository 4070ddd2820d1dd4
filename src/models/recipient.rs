use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A customer targeted by a campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(rename = "id")]
    pub customer_id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub segment: Option<String>,
}

impl Recipient {
    pub fn new(customer_id: u64, email: impl Into<String>) -> Self {
        Self {
            customer_id,
            email: email.into(),
            first_name: None,
            last_name: None,
            segment: None,
        }
    }

    /// True when the recipient has an address worth scoring and mailing
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }

    /// Name shown in the greeting; falls back to the email address
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            self.email.trim().to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Product identifier (SKU)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(pub u32);

impl Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
