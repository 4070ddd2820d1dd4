use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        BatchFailure, DispatchOutcome, EmailAddress, MailMessage, ModelSummary, Personalization,
        RankedCandidate, Recipient, RecipientRecommendations, TemplateData,
    },
    services::providers::EmailProvider,
};

/// Splits items into consecutive batches of at most `batch_size`; only the last may be shorter
pub fn partition<T>(items: &[T], batch_size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(batch_size.max(1))
}

/// Builds one outgoing message for a batch, one personalization per recipient
pub fn build_message(
    batch: &[&Recipient],
    from: &EmailAddress,
    template_id: &str,
    candidate: &RankedCandidate,
    recommendations: &RecipientRecommendations,
    sandbox_mode: bool,
) -> MailMessage {
    let model = ModelSummary::from(candidate);

    let personalizations = batch
        .iter()
        .map(|recipient| {
            let name = recipient.display_name();
            Personalization {
                to: EmailAddress::new(recipient.email.trim(), Some(name.clone())),
                data: TemplateData {
                    name,
                    segment: recipient.segment.clone(),
                    model: model.clone(),
                    recommendations: recommendations.get(&recipient.email).to_vec(),
                },
            }
        })
        .collect();

    MailMessage {
        from: from.clone(),
        template_id: template_id.to_string(),
        personalizations,
        sandbox_mode,
    }
}

/// Sends campaign emails in fixed-size batches, strictly in order
pub struct BatchDispatcher {
    provider: Arc<dyn EmailProvider>,
    from: EmailAddress,
    batch_size: usize,
    sandbox_mode: bool,
}

impl BatchDispatcher {
    pub fn new(provider: Arc<dyn EmailProvider>, from: EmailAddress, batch_size: usize) -> Self {
        Self {
            provider,
            from,
            batch_size,
            sandbox_mode: false,
        }
    }

    pub fn with_sandbox_mode(mut self, enabled: bool) -> Self {
        self.sandbox_mode = enabled;
        self
    }

    /// Sends one message per batch and stops at the first batch that is not accepted.
    ///
    /// Batches already accepted stay sent; batches after a failure are never
    /// attempted. Recipients without an email address are skipped up front.
    pub async fn dispatch(
        &self,
        recipients: &[Recipient],
        candidate: &RankedCandidate,
        template_id: &str,
        recommendations: &RecipientRecommendations,
    ) -> AppResult<DispatchOutcome> {
        if template_id.trim().is_empty() {
            return Err(AppError::TemplateIdRequired);
        }
        if self.batch_size == 0 {
            return Err(AppError::InvalidInput(
                "Batch size must be greater than zero".to_string(),
            ));
        }

        let addressable: Vec<&Recipient> = recipients.iter().filter(|r| r.has_email()).collect();
        let without_email = recipients.len() - addressable.len();
        if without_email > 0 {
            tracing::warn!(skipped = without_email, "Recipients without an email address are not mailed");
        }

        let mut outcome = DispatchOutcome {
            batches_total: addressable.len().div_ceil(self.batch_size),
            ..Default::default()
        };

        for (batch_index, batch) in partition(&addressable, self.batch_size).enumerate() {
            let message = build_message(
                batch,
                &self.from,
                template_id,
                candidate,
                recommendations,
                self.sandbox_mode,
            );

            let sent = self.provider.send(&message).await.and_then(|response| {
                if response.is_accepted() {
                    Ok(response)
                } else {
                    Err(AppError::EmailProviderRejected {
                        status: response.status,
                        body: response.body,
                    })
                }
            });

            let failure = match sent {
                Ok(response) => {
                    outcome.batches_sent += 1;
                    outcome.recipients_accepted += batch.len();
                    tracing::info!(
                        batch = batch_index,
                        recipients = batch.len(),
                        status = response.status,
                        provider = self.provider.name(),
                        "Batch accepted"
                    );
                    continue;
                }
                Err(e) => BatchFailure::from_error(batch_index, &e),
            };

            tracing::error!(
                batch = batch_index,
                status = ?failure.status,
                reason = %failure.reason,
                remaining_batches = outcome.batches_total - batch_index - 1,
                provider = self.provider.name(),
                "Batch send failed; halting remaining batches"
            );
            outcome.failure = Some(failure);
            break;
        }

        outcome.recipients_skipped = recipients.len() - outcome.recipients_accepted;

        tracing::info!(
            batches_sent = outcome.batches_sent,
            batches_total = outcome.batches_total,
            accepted = outcome.recipients_accepted,
            skipped = outcome.recipients_skipped,
            "Dispatch finished"
        );

        Ok(outcome)
    }
}
