//! Production hosting on Cloudflare
//!
//! - [`cloudflare`] - Pages project creation, direct upload and deployment analytics
//! - [`dns`] - custom domains, `*.awema.fr` subdomains and propagation checks
//! - [`monitor`] - post-deployment quality report and continuous health checks

pub mod cloudflare;
pub mod dns;
pub mod monitor;

pub use cloudflare::{
    CloudflareDeployer, DeploymentAnalytics, DeploymentRequest, DeploymentResult, SanityDeployConfig,
    SiteInfo,
};
pub use dns::{DnsManager, DnsResult, DomainOptions, PropagationStatus};
pub use monitor::{DeploymentMonitor, Grade, HealthStatus, MonitoringConfig, MonitoringReport};
