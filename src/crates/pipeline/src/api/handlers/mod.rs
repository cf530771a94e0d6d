//! API request handlers, one module per resource

pub mod deployment;
pub mod domain;
pub mod emails;
pub mod enrichment;
pub mod health;
pub mod monitoring;
pub mod sanity;
pub mod workflows;

pub use deployment::{
    delete_deployment, deploy_site, deployment_analytics, deployment_status, purge_deployment_cache,
};
pub use domain::{check_domain, configure_domain, remove_domain};
pub use emails::{email_analytics, send_mockups, track_click, track_open};
pub use enrichment::{enrichment_status, preview_enrichment, retry_enrichment, start_enrichment};
pub use health::health;
pub use monitoring::{run_monitoring, start_monitoring, stop_monitoring};
pub use sanity::{
    get_sanity_project, integrate_sanity, list_sanity_projects, sanity_integration_status,
    update_sanity_integration,
};
pub use workflows::{create_workflow, get_workflow, list_workflows, retry_workflow, select_template, workflow_events};
