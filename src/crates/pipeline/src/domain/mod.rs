//! Core workflow types shared by every stage.

pub mod events;
pub mod form;
pub mod workflow;

pub use events::{EventBus, EventKind, WorkflowEvent};
pub use form::{BrandColors, ClientFormData};
pub use workflow::{
    Mockup, MockupStatus, MockupSummary, SanityIntegrationState, SanityStage, Workflow, WorkflowResult,
    WorkflowStatus, WorkflowUpdate,
};
