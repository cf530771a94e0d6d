//! Workflow record and its status machine.

use super::form::ClientFormData;
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow status.
///
/// The happy path is linear:
/// `form_received → preparing → mockups_ready → sending → sent → chosen → enriching → deploying → deployed`.
/// `error` can be entered from any non-terminal status and left again only by a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    FormReceived,
    Preparing,
    MockupsReady,
    Sending,
    Sent,
    Chosen,
    Enriching,
    Deploying,
    Deployed,
    Error,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 10] = [
        WorkflowStatus::FormReceived,
        WorkflowStatus::Preparing,
        WorkflowStatus::MockupsReady,
        WorkflowStatus::Sending,
        WorkflowStatus::Sent,
        WorkflowStatus::Chosen,
        WorkflowStatus::Enriching,
        WorkflowStatus::Deploying,
        WorkflowStatus::Deployed,
        WorkflowStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::FormReceived => "form_received",
            WorkflowStatus::Preparing => "preparing",
            WorkflowStatus::MockupsReady => "mockups_ready",
            WorkflowStatus::Sending => "sending",
            WorkflowStatus::Sent => "sent",
            WorkflowStatus::Chosen => "chosen",
            WorkflowStatus::Enriching => "enriching",
            WorkflowStatus::Deploying => "deploying",
            WorkflowStatus::Deployed => "deployed",
            WorkflowStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Deployed)
    }

    /// A template was chosen and production started or finished
    pub fn is_past_selection(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Chosen | WorkflowStatus::Enriching | WorkflowStatus::Deploying | WorkflowStatus::Deployed
        )
    }

    /// Whether the orchestrator may move a workflow from `self` to `next`.
    ///
    /// Besides the linear path:
    /// - a failed proposal email rolls `sending` back to `mockups_ready`
    /// - the client may pick a template as soon as the mockups exist
    /// - `error` only leaves through a retry, to `preparing`, `mockups_ready` or `chosen`
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;

        if self.is_terminal() {
            return false;
        }
        if next == Error {
            return true;
        }

        matches!(
            (self, next),
            (FormReceived, Preparing)
                | (Preparing, MockupsReady)
                | (MockupsReady, Sending)
                | (MockupsReady, Chosen)
                | (Sending, Sent)
                | (Sending, MockupsReady)
                | (Sending, Chosen)
                | (Sent, Chosen)
                | (Chosen, Enriching)
                | (Enriching, Deploying)
                | (Deploying, Deployed)
                | (Error, Preparing)
                | (Error, MockupsReady)
                | (Error, Chosen)
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        WorkflowStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| PipelineError::Validation(format!("Unknown workflow status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockupStatus {
    Ready,
    Error,
}

/// One deployed mockup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mockup {
    pub template_name: String,
    pub netlify_url: String,
    pub preview_image: Option<String>,
    pub deployment_id: Option<String>,
    pub site_id: Option<String>,
    pub build_status: MockupStatus,
    pub build_time_ms: u64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Mockup {
    pub fn is_ready(&self) -> bool {
        self.build_status == MockupStatus::Ready
    }
}

/// Progress of the CMS provisioning attached to a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanityStage {
    SanitySetupStarted,
    SanityReadyForAstro,
    SanitySetupFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanityIntegrationState {
    pub stage: SanityStage,
    pub project_id: Option<String>,
    pub studio_url: Option<String>,
    pub template: Option<String>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// End-to-end record of one client's site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub client: ClientFormData,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub mockups: Vec<Mockup>,
    pub selected_template: Option<String>,
    pub sanity_project_id: Option<String>,
    #[serde(default)]
    pub sanity_integration: Option<SanityIntegrationState>,
    pub deployment_id: Option<String>,
    pub final_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Workflow {
    /// New workflow in `form_received` with id `workflow-{unix_ms}`.
    pub fn new(client: ClientFormData) -> Self {
        let now = Utc::now();
        Self {
            id: format!("workflow-{}", now.timestamp_millis()),
            client,
            status: WorkflowStatus::FormReceived,
            mockups: Vec::new(),
            selected_template: None,
            sanity_project_id: None,
            sanity_integration: None,
            deployment_id: None,
            final_url: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Move to `status`, enforcing [`WorkflowStatus::can_transition_to`].
    pub fn transition(&mut self, status: WorkflowStatus) -> Result<()> {
        if self.status == status {
            return Ok(());
        }
        if !self.status.can_transition_to(status) {
            return Err(PipelineError::InvalidStateTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        self.updated_at = Utc::now();
        if status == WorkflowStatus::Deployed {
            self.completed_at.get_or_insert(self.updated_at);
        }
        Ok(())
    }

    /// Apply a partial update. Status changes go through [`transition`](Self::transition).
    pub fn apply(&mut self, update: WorkflowUpdate) -> Result<()> {
        if let Some(status) = update.status {
            self.transition(status)?;
        }
        if let Some(mockups) = update.mockups {
            self.mockups = mockups;
        }
        if let Some(template) = update.selected_template {
            self.selected_template = Some(template);
        }
        if let Some(project_id) = update.sanity_project_id {
            self.sanity_project_id = Some(project_id);
        }
        if let Some(state) = update.sanity_integration {
            self.sanity_integration = Some(state);
        }
        if let Some(deployment_id) = update.deployment_id {
            self.deployment_id = Some(deployment_id);
        }
        if let Some(url) = update.final_url {
            self.final_url = Some(url);
        }
        if let Some(error) = update.error {
            self.error = error;
        }
        if let Some(at) = update.completed_at {
            self.completed_at = Some(at);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `https://{projectId}.sanity.studio` once a CMS exists.
    pub fn cms_url(&self) -> Option<String> {
        self.sanity_project_id
            .as_ref()
            .map(|id| format!("https://{}.sanity.studio", id))
    }

    pub fn ready_mockups(&self) -> impl Iterator<Item = &Mockup> {
        self.mockups.iter().filter(|m| m.is_ready())
    }
}

/// Partial workflow update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct WorkflowUpdate {
    pub status: Option<WorkflowStatus>,
    pub mockups: Option<Vec<Mockup>>,
    pub selected_template: Option<String>,
    pub sanity_project_id: Option<String>,
    pub sanity_integration: Option<SanityIntegrationState>,
    pub deployment_id: Option<String>,
    pub final_url: Option<String>,
    /// `Some(None)` clears the stored error.
    pub error: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowUpdate {
    pub fn status(status: WorkflowStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(WorkflowStatus::Error),
            error: Some(Some(error.into())),
            ..Default::default()
        }
    }
}

/// Public view of a workflow returned by status queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub success: bool,
    pub workflow_id: String,
    pub status: WorkflowStatus,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub mockups: Vec<MockupSummary>,
    pub selected_template: Option<String>,
    pub sanity_project_id: Option<String>,
    pub production_url: Option<String>,
    pub cms_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockupSummary {
    pub template_name: String,
    pub netlify_url: String,
}

impl From<&Workflow> for WorkflowResult {
    fn from(workflow: &Workflow) -> Self {
        Self {
            success: true,
            workflow_id: workflow.id.clone(),
            status: workflow.status,
            mockups: workflow
                .mockups
                .iter()
                .map(|m| MockupSummary {
                    template_name: m.template_name.clone(),
                    netlify_url: m.netlify_url.clone(),
                })
                .collect(),
            selected_template: workflow.selected_template.clone(),
            sanity_project_id: workflow.sanity_project_id.clone(),
            production_url: workflow.final_url.clone(),
            cms_url: workflow.cms_url(),
            error: workflow.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_linear_path_is_allowed() {
        use WorkflowStatus::*;
        let path = [
            FormReceived, Preparing, MockupsReady, Sending, Sent, Chosen, Enriching, Deploying, Deployed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_terminal_state_rejects_everything() {
        for next in WorkflowStatus::ALL {
            assert!(!WorkflowStatus::Deployed.can_transition_to(next));
        }
    }

    #[test]
    fn test_error_reachable_and_retry_targets() {
        use WorkflowStatus::*;
        for status in WorkflowStatus::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(Error));
        }
        assert!(Error.can_transition_to(Preparing));
        assert!(Error.can_transition_to(MockupsReady));
        assert!(Error.can_transition_to(Chosen));
        assert!(!Error.can_transition_to(Deployed));
        assert!(!Error.can_transition_to(Enriching));
    }

    #[test]
    fn test_skipping_stages_rejected() {
        let mut workflow = Workflow::new(ClientFormData::default());
        let err = workflow.transition(WorkflowStatus::Deploying).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidStateTransition { .. }));
        assert_eq!(workflow.status, WorkflowStatus::FormReceived);
    }

    #[test]
    fn test_deployed_sets_completed_at() {
        let mut workflow = Workflow::new(ClientFormData::default());
        workflow.status = WorkflowStatus::Deploying;
        workflow.transition(WorkflowStatus::Deployed).unwrap();
        assert!(workflow.completed_at.is_some());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in WorkflowStatus::ALL {
            assert_eq!(status.as_str().parse::<WorkflowStatus>().unwrap(), status);
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
    }

    #[test]
    fn test_workflow_id_format() {
        let workflow = Workflow::new(ClientFormData::default());
        assert!(workflow.id.starts_with("workflow-"));
        assert!(workflow.id["workflow-".len()..].parse::<i64>().is_ok());
    }

    fn any_status() -> impl Strategy<Value = WorkflowStatus> {
        (0..WorkflowStatus::ALL.len()).prop_map(|i| WorkflowStatus::ALL[i])
    }

    proptest! {
        #[test]
        fn transitions_follow_the_machine(attempts in proptest::collection::vec(any_status(), 0..40)) {
            let mut workflow = Workflow::new(ClientFormData::default());
            for next in attempts {
                let before = workflow.status;
                let outcome = workflow.transition(next);
                if before == next {
                    prop_assert!(outcome.is_ok());
                } else if before.can_transition_to(next) {
                    prop_assert!(outcome.is_ok());
                    prop_assert_eq!(workflow.status, next);
                } else {
                    prop_assert!(outcome.is_err());
                    prop_assert_eq!(workflow.status, before);
                }
                if before == WorkflowStatus::Deployed {
                    prop_assert_eq!(workflow.status, WorkflowStatus::Deployed);
                }
                // production only moves forward or fails
                if before.is_past_selection() && workflow.status != WorkflowStatus::Error {
                    prop_assert!(workflow.status >= before);
                }
            }
        }
    }
}
