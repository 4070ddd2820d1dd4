use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{CampaignReport, CampaignStatus, EmailAddress, ModelSummary, Recipient},
    services::{
        catalog::Catalog,
        dispatcher::BatchDispatcher,
        model_selector::{ModelSelector, SelectionPolicy},
        providers::{EmailProvider, MetricStore, Scorer},
        recommendations::RecommendationGenerator,
    },
};

/// Tunables for one campaign pipeline
#[derive(Debug, Clone)]
pub struct CampaignSettings {
    pub metric_prefix: String,
    pub candidate_count: usize,
    pub selection: SelectionPolicy,
    pub recipients_path: PathBuf,
    pub skus_path: PathBuf,
    pub top_n: usize,
    pub batch_size: usize,
    pub from: EmailAddress,
    pub sandbox_mode: bool,
}

impl From<&Config> for CampaignSettings {
    fn from(config: &Config) -> Self {
        Self {
            metric_prefix: config.metric_prefix.clone(),
            candidate_count: config.candidate_count,
            selection: SelectionPolicy::from(config.ranking_metric),
            recipients_path: config.recipients_path.clone(),
            skus_path: config.skus_path.clone(),
            top_n: config.top_n,
            batch_size: config.batch_size,
            from: EmailAddress::new(config.from_email.clone(), config.from_name.clone()),
            sandbox_mode: config.sandbox_mode,
        }
    }
}

/// The recommendation email campaign: select a model, score, and mail in batches
pub struct Campaign {
    settings: CampaignSettings,
    store: Arc<dyn MetricStore>,
    scorer: Arc<dyn Scorer>,
    email: Arc<dyn EmailProvider>,
}

impl Campaign {
    pub fn new(
        settings: CampaignSettings,
        store: Arc<dyn MetricStore>,
        scorer: Arc<dyn Scorer>,
        email: Arc<dyn EmailProvider>,
    ) -> Self {
        Self {
            settings,
            store,
            scorer,
            email,
        }
    }

    /// Runs the campaign for a template under a fresh run id
    pub async fn run(&self, template_id: &str) -> AppResult<CampaignReport> {
        self.run_with_id(Uuid::new_v4(), template_id).await
    }

    /// Runs the campaign and reports what happened.
    ///
    /// Having no usable model is a quiet outcome, not an error. Zero recipients
    /// is an error, as is any failure loading data, the model, or scores.
    #[tracing::instrument(name = "campaign", skip(self), fields(run_id = %run_id))]
    pub async fn run_with_id(&self, run_id: Uuid, template_id: &str) -> AppResult<CampaignReport> {
        if template_id.trim().is_empty() {
            return Err(AppError::TemplateIdRequired);
        }
        let started_at = Utc::now();

        let records = self
            .store
            .latest_evaluations(&self.settings.metric_prefix, self.settings.candidate_count)
            .await?;

        let selector = ModelSelector::new(self.settings.selection);
        let Some(candidate) = selector.select(&records) else {
            tracing::info!(records = records.len(), "No candidate model; nothing to send");
            return Ok(CampaignReport {
                run_id,
                template_id: template_id.to_string(),
                status: CampaignStatus::NoCandidateModel,
                model: None,
                dispatch: None,
                started_at,
                finished_at: Utc::now(),
            });
        };

        let catalog = self.load_catalog().await?;
        if !catalog.recipients.iter().any(Recipient::has_email) {
            return Err(AppError::NoRecipients);
        }

        let model = self.store.read_model(candidate.model_key()).await?;
        let recommendations = RecommendationGenerator::new(self.scorer.clone())
            .generate(
                &model,
                &catalog.recipients,
                &catalog.skus,
                self.settings.top_n,
            )
            .await?;

        let dispatcher = BatchDispatcher::new(
            self.email.clone(),
            self.settings.from.clone(),
            self.settings.batch_size,
        )
        .with_sandbox_mode(self.settings.sandbox_mode);
        let outcome = dispatcher
            .dispatch(&catalog.recipients, &candidate, template_id, &recommendations)
            .await?;

        let status = CampaignStatus::from_dispatch(&outcome);
        tracing::info!(
            status = ?status,
            accepted = outcome.recipients_accepted,
            "Campaign finished"
        );

        Ok(CampaignReport {
            run_id,
            template_id: template_id.to_string(),
            status,
            model: Some(ModelSummary::from(&candidate)),
            dispatch: Some(outcome),
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Runs the campaign, logging any error as critical instead of returning it
    pub async fn run_logged(&self, template_id: &str) -> Option<CampaignReport> {
        match self.run(template_id).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(
                    critical = true,
                    template_id = %template_id,
                    error = %e,
                    "Campaign run failed"
                );
                None
            }
        }
    }

    async fn load_catalog(&self) -> AppResult<Catalog> {
        let recipients_path = self.settings.recipients_path.clone();
        let skus_path = self.settings.skus_path.clone();

        tokio::task::spawn_blocking(move || Catalog::load(&recipients_path, &skus_path))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
