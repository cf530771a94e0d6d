//! Transactional emails: mockup proposal, follow-up reminder and completion notice.

use super::templates::{
    completion_html, completion_text, follow_up_html, follow_up_text, proposal_html, proposal_text,
    MockupLink, ProposalContext, COMPLETION_SUBJECT, FOLLOW_UP_SUBJECT, PROPOSAL_SUBJECT,
};
use super::tracking::{add_tracking_params, generate_tracking_id, EmailAnalytics, TrackingRecord, TrackingStore};
use crate::config::EmailSettings;
use crate::domain::Workflow;
use crate::{PipelineError, Result};
use chrono::Utc;
use platforms::{EmailClient, OutgoingEmail, SendReceipt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Everything needed to send the proposal email
#[derive(Debug, Clone)]
pub struct MockupEmailRequest {
    pub workflow_id: String,
    pub client_email: String,
    pub client_name: String,
    pub business_name: String,
    pub metier: String,
    pub ville: String,
    pub mockups: Vec<MockupLink>,
}

impl MockupEmailRequest {
    /// Request built from the ready mockups of a workflow
    pub fn from_workflow(workflow: &Workflow) -> Self {
        let client = &workflow.client;
        let client_name = client
            .extra_str("contactName")
            .or_else(|| client.extra_str("clientName"))
            .unwrap_or(&client.business_name)
            .to_string();

        Self {
            workflow_id: workflow.id.clone(),
            client_email: client.email.clone(),
            client_name,
            business_name: client.business_name.clone(),
            metier: client.business_type.clone(),
            ville: client.ville.clone(),
            mockups: workflow
                .ready_mockups()
                .map(|m| MockupLink::from_template(&m.template_name, &m.netlify_url, m.preview_image.as_deref()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSendResult {
    pub success: bool,
    pub tracking_id: String,
    pub message_id: Option<String>,
    pub follow_up_scheduled: bool,
}

/// Sends the pipeline's emails and keeps their tracking records
#[derive(Clone)]
pub struct EmailNotifier {
    client: Option<EmailClient>,
    settings: EmailSettings,
    tracking: TrackingStore,
}

impl EmailNotifier {
    /// Notifier for the configured provider; without an API key every send fails with a
    /// configuration error while tracking keeps working
    pub fn new(settings: EmailSettings, tracking: TrackingStore) -> Result<Self> {
        let client = if settings.is_configured() {
            let mut client = EmailClient::new(
                settings.provider,
                settings.api_key.clone(),
                Duration::from_secs(settings.timeout_secs),
            )?;
            if let Some(base) = &settings.api_base {
                client = client.with_api_base(base.clone());
            }
            Some(client)
        } else {
            warn!("Email provider not configured, emails will not be sent");
            None
        };

        Ok(Self {
            client,
            settings,
            tracking,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn tracking(&self) -> &TrackingStore {
        &self.tracking
    }

    fn client(&self) -> Result<&EmailClient> {
        self.client
            .as_ref()
            .ok_or_else(|| PipelineError::Config("EMAIL_API_KEY manquant: envoi d'email impossible".to_string()))
    }

    fn outgoing(&self, to: &str, subject: &str, html: String, text: String) -> OutgoingEmail {
        OutgoingEmail {
            from_email: self.settings.from_email.clone(),
            from_name: self.settings.from_name.clone(),
            to: to.to_string(),
            reply_to: Some(self.settings.reply_to.clone()).filter(|r| !r.is_empty()),
            subject: subject.to_string(),
            html,
            text,
        }
    }

    /// Send the proposal email with tracked links, then schedule the reminder
    pub async fn send_mockups_email(&self, request: &MockupEmailRequest) -> Result<EmailSendResult> {
        if request.mockups.is_empty() {
            return Err(PipelineError::Validation("Aucune maquette à envoyer".to_string()));
        }
        if request.client_email.trim().is_empty() {
            return Err(PipelineError::Validation("Email du client manquant".to_string()));
        }
        let client = self.client()?;

        let tracking_id = generate_tracking_id();
        let ctx = ProposalContext {
            client_name: &request.client_name,
            business_name: &request.business_name,
            metier: &request.metier,
            ville: &request.ville,
            workflow_id: &request.workflow_id,
            mockups: &request.mockups,
            tracking_id: &tracking_id,
            tracking_domain: &self.settings.tracking_domain,
        };

        let email = self.outgoing(
            &request.client_email,
            PROPOSAL_SUBJECT,
            proposal_html(&ctx),
            proposal_text(&ctx),
        );

        let receipt = client.send(&email).await.map_err(|e| {
            error!(workflow_id = %request.workflow_id, error = %e, "Proposal email failed");
            e
        })?;

        info!(
            workflow_id = %request.workflow_id,
            tracking_id = %tracking_id,
            provider = receipt.provider.as_str(),
            mockups = request.mockups.len(),
            "Proposal email sent"
        );

        self.tracking
            .insert(TrackingRecord {
                tracking_id: tracking_id.clone(),
                workflow_id: request.workflow_id.clone(),
                client_email: request.client_email.clone(),
                client_name: request.client_name.clone(),
                business_name: request.business_name.clone(),
                message_id: receipt.message_id.clone(),
                sent_at: Utc::now(),
                opened_at: None,
                clicked_at: None,
                open_count: 0,
                click_count: 0,
                follow_up_sent_at: None,
            })
            .await?;

        let follow_up_scheduled = self.schedule_follow_up(&tracking_id);

        Ok(EmailSendResult {
            success: true,
            tracking_id,
            message_id: receipt.message_id,
            follow_up_scheduled,
        })
    }

    fn schedule_follow_up(&self, tracking_id: &str) -> bool {
        let delay = self.settings.follow_up_delay_secs;
        if delay == 0 {
            return false;
        }

        debug!(tracking_id = %tracking_id, delay_secs = delay, "Follow-up scheduled");
        let notifier = self.clone();
        let tracking_id = tracking_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay)).await;
            if let Err(e) = notifier.send_follow_up(&tracking_id).await {
                warn!(tracking_id = %tracking_id, error = %e, "Follow-up email failed");
            }
        });
        true
    }

    /// Send the reminder unless the client already opened or clicked
    ///
    /// Returns `Ok(false)` when the reminder was skipped.
    pub async fn send_follow_up(&self, tracking_id: &str) -> Result<bool> {
        let record = self
            .tracking
            .get(tracking_id)
            .ok_or_else(|| PipelineError::NotFound(format!("Tracking inconnu: {}", tracking_id)))?;

        if record.engaged() || record.follow_up_sent_at.is_some() {
            debug!(tracking_id = %tracking_id, "Client engaged, follow-up skipped");
            return Ok(false);
        }

        let link = add_tracking_params(
            &format!("{}/mockups/{}", self.settings.tracking_domain, record.workflow_id),
            tracking_id,
            "followup",
        );
        let email = self.outgoing(
            &record.client_email,
            FOLLOW_UP_SUBJECT,
            follow_up_html(&record.client_name, &record.business_name, &link),
            follow_up_text(&record.client_name, &record.business_name, &link),
        );
        self.client()?.send(&email).await?;
        self.tracking.record_follow_up(tracking_id).await?;

        info!(tracking_id = %tracking_id, workflow_id = %record.workflow_id, "Follow-up email sent");
        Ok(true)
    }

    /// Tell the client the production site is live
    pub async fn send_completion_email(
        &self,
        to: &str,
        client_name: &str,
        production_url: &str,
        cms_url: Option<&str>,
    ) -> Result<SendReceipt> {
        let email = self.outgoing(
            to,
            COMPLETION_SUBJECT,
            completion_html(client_name, production_url, cms_url),
            completion_text(client_name, production_url, cms_url),
        );
        let receipt = self.client()?.send(&email).await?;
        info!(to = %to, url = %production_url, "Completion email sent");
        Ok(receipt)
    }

    pub async fn track_open(&self, tracking_id: &str) -> Result<bool> {
        self.tracking.record_open(tracking_id).await
    }

    pub async fn track_click(&self, tracking_id: &str) -> Result<bool> {
        self.tracking.record_click(tracking_id).await
    }

    pub fn analytics(&self, workflow_id: Option<&str>) -> EmailAnalytics {
        self.tracking.analytics(workflow_id)
    }
}
