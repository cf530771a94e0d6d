//! Sanity CMS provisioning
//!
//! - [`setup`]: project, token, schemas, initial documents and webhooks
//! - [`migration`]: form data turned into settings, services, testimonials, projects,
//!   pages, navigation and SEO documents
//! - [`integration`]: the workflow step tying both together after template selection

pub mod integration;
pub mod migration;
pub mod seed;
pub mod setup;

pub use integration::{
    AstroHandoff, CleanupReport, ContentUpdates, IntegrationStatus, SanityIntegrationResult, UpdateReport,
    WorkflowSanityIntegration,
};
pub use migration::{ContentCounts, MigratedData, MigrationOptions, SanityDataMigration};
pub use setup::{
    ProjectBrief, ProjectStatus, ProjectSummary, SanityCredentials, SanityProjectSetup, SanitySetup, SiteColors,
};
