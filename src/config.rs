use std::path::PathBuf;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::RankingMetric,
};

/// SendGrid accepts at most this many personalizations per request
pub const MAX_BATCH_SIZE: usize = 1000;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SendGrid API key
    pub sendgrid_api_key: String,

    /// SendGrid API base URL
    #[serde(default = "default_sendgrid_api_url")]
    pub sendgrid_api_url: String,

    /// Sender address used on every campaign email
    pub from_email: String,

    /// Optional sender display name
    #[serde(default)]
    pub from_name: Option<String>,

    /// Ask SendGrid to validate messages without delivering them
    #[serde(default)]
    pub sandbox_mode: bool,

    /// Root directory of the file-backed metric/model store
    #[serde(default = "default_metric_store_root")]
    pub metric_store_root: PathBuf,

    /// Key prefix under which evaluation records live
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,

    /// How many recent evaluation records to consider
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,

    /// Metric to rank candidates on; automatic when unset
    #[serde(default)]
    pub ranking_metric: Option<RankingMetric>,

    /// Base URL of the scoring service
    #[serde(default = "default_scoring_url")]
    pub scoring_url: String,

    #[serde(default = "default_recipients_path")]
    pub recipients_path: PathBuf,

    #[serde(default = "default_skus_path")]
    pub skus_path: PathBuf,

    /// Recommendations kept per recipient
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Recipients per outgoing message
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_sendgrid_api_url() -> String {
    "https://api.sendgrid.com".to_string()
}

fn default_metric_store_root() -> PathBuf {
    PathBuf::from("./store")
}

fn default_metric_prefix() -> String {
    "metrics".to_string()
}

fn default_candidate_count() -> usize {
    5
}

fn default_scoring_url() -> String {
    "http://localhost:8500".to_string()
}

fn default_recipients_path() -> PathBuf {
    PathBuf::from("data/recipients.csv")
}

fn default_skus_path() -> PathBuf {
    PathBuf::from("data/skus.csv")
}

fn default_top_n() -> usize {
    3
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.top_n == 0 {
            return Err(AppError::InvalidInput("TOP_N must be at least 1".to_string()));
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(AppError::InvalidInput(format!(
                "BATCH_SIZE must be between 1 and {}",
                MAX_BATCH_SIZE
            )));
        }
        if self.from_email.trim().is_empty() {
            return Err(AppError::InvalidInput("FROM_EMAIL cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut vars = vec![
            ("SENDGRID_API_KEY".to_string(), "SG.test".to_string()),
            ("FROM_EMAIL".to_string(), "shop@example.com".to_string()),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        vars
    }

    #[test]
    fn test_defaults_applied() {
        let config: Config = envy::from_iter(vars(&[])).unwrap();

        assert_eq!(config.sendgrid_api_url, "https://api.sendgrid.com");
        assert_eq!(config.metric_prefix, "metrics");
        assert_eq!(config.candidate_count, 5);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.batch_size, MAX_BATCH_SIZE);
        assert_eq!(config.ranking_metric, None);
        assert!(!config.sandbox_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ranking_metric_parsed() {
        let config: Config = envy::from_iter(vars(&[("RANKING_METRIC", "rmse")])).unwrap();
        assert_eq!(config.ranking_metric, Some(RankingMetric::Rmse));
    }

    #[test]
    fn test_missing_api_key_fails() {
        let result = envy::from_iter::<_, Config>(vec![(
            "FROM_EMAIL".to_string(),
            "shop@example.com".to_string(),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let config: Config = envy::from_iter(vars(&[("BATCH_SIZE", "1001")])).unwrap();
        assert!(matches!(config.validate(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_zero_top_n() {
        let config: Config = envy::from_iter(vars(&[("TOP_N", "0")])).unwrap();
        assert!(matches!(config.validate(), Err(AppError::InvalidInput(_))));
    }
}
