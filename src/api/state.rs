use std::sync::Arc;

use crate::{
    config::Config,
    services::{
        campaign::{Campaign, CampaignSettings},
        providers::{FsMetricStore, HttpScorer, SendGridProvider},
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub campaign: Arc<Campaign>,
}

impl AppState {
    pub fn new(campaign: Campaign) -> Self {
        Self {
            campaign: Arc::new(campaign),
        }
    }

    /// Wires the production collaborators from configuration
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(FsMetricStore::new(config.metric_store_root.clone()));
        let scorer = Arc::new(HttpScorer::new(config.scoring_url.clone()));
        let email = Arc::new(SendGridProvider::new(
            config.sendgrid_api_key.clone(),
            config.sendgrid_api_url.clone(),
        ));

        Self::new(Campaign::new(
            CampaignSettings::from(config),
            store,
            scorer,
            email,
        ))
    }
}
