//! Workflow events fanned out over a broadcast channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Event kinds emitted while a workflow runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "workflow.initialized")]
    WorkflowInitialized,
    #[serde(rename = "mockups.generation.started")]
    MockupsGenerationStarted,
    #[serde(rename = "mockups.generation.completed")]
    MockupsGenerationCompleted,
    #[serde(rename = "email.sending")]
    EmailSending,
    #[serde(rename = "email.sent")]
    EmailSent,
    #[serde(rename = "client.selection.made")]
    ClientSelectionMade,
    #[serde(rename = "sanity.setup.completed")]
    SanitySetupCompleted,
    #[serde(rename = "enrichment.completed")]
    EnrichmentFinished,
    #[serde(rename = "workflow.completed")]
    WorkflowCompleted,
    #[serde(rename = "completion.email.sent")]
    CompletionEmailSent,
    #[serde(rename = "workflow.error")]
    WorkflowError,
    #[serde(rename = "enrichment_started")]
    EnrichmentStarted,
    #[serde(rename = "content_generation_started")]
    ContentGenerationStarted,
    #[serde(rename = "content_mapping_started")]
    ContentMappingStarted,
    #[serde(rename = "astro_conversion_started")]
    AstroConversionStarted,
    #[serde(rename = "sanity_content_migration_started")]
    SanityContentMigrationStarted,
    #[serde(rename = "enrichment_completed")]
    EnrichmentCompleted,
    #[serde(rename = "enrichment_failed")]
    EnrichmentFailed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WorkflowInitialized => "workflow.initialized",
            EventKind::MockupsGenerationStarted => "mockups.generation.started",
            EventKind::MockupsGenerationCompleted => "mockups.generation.completed",
            EventKind::EmailSending => "email.sending",
            EventKind::EmailSent => "email.sent",
            EventKind::ClientSelectionMade => "client.selection.made",
            EventKind::SanitySetupCompleted => "sanity.setup.completed",
            EventKind::EnrichmentFinished => "enrichment.completed",
            EventKind::WorkflowCompleted => "workflow.completed",
            EventKind::CompletionEmailSent => "completion.email.sent",
            EventKind::WorkflowError => "workflow.error",
            EventKind::EnrichmentStarted => "enrichment_started",
            EventKind::ContentGenerationStarted => "content_generation_started",
            EventKind::ContentMappingStarted => "content_mapping_started",
            EventKind::AstroConversionStarted => "astro_conversion_started",
            EventKind::SanityContentMigrationStarted => "sanity_content_migration_started",
            EventKind::EnrichmentCompleted => "enrichment_completed",
            EventKind::EnrichmentFailed => "enrichment_failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEvent {
    pub id: Uuid,
    pub workflow_id: String,
    pub kind: EventKind,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

/// Broadcast hub for [`WorkflowEvent`]s.
///
/// Emitting never fails: with no subscriber the event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn emit(&self, workflow_id: &str, kind: EventKind, data: Value) {
        let event = WorkflowEvent {
            id: Uuid::new_v4(),
            workflow_id: workflow_id.to_string(),
            kind,
            data,
            timestamp: Utc::now(),
        };
        tracing::debug!(workflow_id, event = kind.as_str(), "Workflow event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.emit("workflow-1", EventKind::WorkflowInitialized, json!({"businessName": "Dupont"}));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.workflow_id, "workflow-1");
        assert_eq!(event.kind, EventKind::WorkflowInitialized);
        assert_eq!(serde_json::to_value(event.kind).unwrap(), "workflow.initialized");
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit("workflow-1", EventKind::WorkflowError, json!({}));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in [EventKind::EnrichmentFinished, EventKind::EnrichmentCompleted, EventKind::SanityContentMigrationStarted] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }
}
