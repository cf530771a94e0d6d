//! Service container
//!
//! [`PipelineServices::build`] turns a [`PipelineConfig`] into the shared services the
//! API and the orchestrator use. Platforms without credentials are left out (Netlify,
//! Sanity and DeepSeek fall back to simulated or template behavior; Cloudflare
//! deployment and DNS are `None`).

use crate::astro::{AstroBuild, AstroConverter};
use crate::config::PipelineConfig;
use crate::deploy::{CloudflareDeployer, DeploymentMonitor, DnsManager};
use crate::domain::EventBus;
use crate::email::{EmailNotifier, TrackingStore};
use crate::enrich_migrate::EnrichAndMigrate;
use crate::enrichment::ContentEnricher;
use crate::mapper::ContentMapper;
use crate::mockups::{CommandBuilder, MockupGenerator};
use crate::orchestrator::{PipelineStages, WorkflowOrchestrator};
use crate::sanity::{SanityDataMigration, SanitySetup, WorkflowSanityIntegration};
use crate::store::{JsonWorkflowStore, WorkflowStore};
use crate::Result;
use llm::remote::DeepseekClient;
use llm::{ChatModel, RemoteLlmConfig};
use platforms::{DohResolver, NetlifyClient, NetlifyConfig, SanityClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use utils::JsonDir;

const EVENT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct PipelineServices {
    pub config: Arc<PipelineConfig>,
    pub store: Arc<dyn WorkflowStore>,
    pub events: EventBus,
    pub orchestrator: Arc<WorkflowOrchestrator>,
    pub mockups: Arc<MockupGenerator>,
    pub email: Arc<EmailNotifier>,
    pub sanity: Arc<WorkflowSanityIntegration>,
    pub enricher: Arc<ContentEnricher>,
    pub enrichment: Arc<EnrichAndMigrate>,
    pub deployer: Option<Arc<CloudflareDeployer>>,
    pub dns: Option<Arc<DnsManager>>,
    pub monitor: Arc<DeploymentMonitor>,
}

impl PipelineServices {
    pub async fn build(config: PipelineConfig) -> Result<Self> {
        for warning in config.validate() {
            warn!(warning = %warning, "Configuration");
        }

        let storage = &config.storage;
        tokio::fs::create_dir_all(&storage.temp_dir).await?;
        let store: Arc<dyn WorkflowStore> = Arc::new(JsonWorkflowStore::open(storage.workflows_dir()).await?);
        let events = EventBus::new(EVENT_CAPACITY);

        let netlify = if config.netlify.is_configured() {
            let netlify_config = NetlifyConfig::new(&config.netlify.api_token)
                .with_api_base(&config.netlify.api_base)
                .with_timeout(Duration::from_secs(config.netlify.timeout_secs));
            Some(NetlifyClient::new(netlify_config)?)
        } else {
            None
        };
        let mockups = Arc::new(
            MockupGenerator::new(
                netlify,
                Arc::new(CommandBuilder::new(Duration::from_secs(config.mockups.build_timeout_secs))),
                config.mockups.clone(),
                &storage.temp_dir,
            )
            .with_retry(config.retry.clone()),
        );

        if mockups
            .spawn_cleanup_sweep(config.mockups.ttl(), config.mockups.cleanup_interval())
            .is_some()
        {
            info!(
                ttl_hours = config.mockups.ttl_hours,
                every_mins = config.mockups.cleanup_interval_mins,
                "Mockup cleanup sweep scheduled"
            );
        }

        let tracking = TrackingStore::open(storage.email_tracking_dir()).await?;
        let email = Arc::new(EmailNotifier::new(config.email.clone(), tracking)?);

        let sanity_client = if config.sanity.is_configured() {
            Some(SanityClient::new(config.sanity.client_config())?)
        } else {
            warn!("SANITY_MANAGEMENT_TOKEN not set, CMS projects will be simulated");
            None
        };
        let setup = SanitySetup::new(
            sanity_client.clone(),
            JsonDir::open(storage.sanity_projects_dir()).await?,
            &config.sanity.central_webhook_url,
        );
        let migration = SanityDataMigration::new(sanity_client, JsonDir::open(storage.migrations_dir()).await?);
        let sanity = Arc::new(WorkflowSanityIntegration::new(
            store.clone(),
            Arc::new(setup),
            Arc::new(migration),
            &config.cloudflare.subdomain_root,
        ));

        let model: Option<Arc<dyn ChatModel>> = if config.deepseek.is_configured() {
            let llm_config = RemoteLlmConfig::new(
                &config.deepseek.api_key,
                &config.deepseek.base_url,
                &config.deepseek.model,
            )
            .with_timeout(Duration::from_secs(config.deepseek.timeout_secs));
            Some(Arc::new(DeepseekClient::new(llm_config)?))
        } else {
            warn!("DEEPSEEK_API_KEY not set, enrichment will use template content");
            None
        };
        let enricher = Arc::new(ContentEnricher::new(model, config.enrichment.clone()));
        let enrichment = Arc::new(
            EnrichAndMigrate::new(
                enricher.clone(),
                Arc::new(ContentMapper::new()),
                Arc::new(AstroConverter::new(config.astro_output_dir())),
                events.clone(),
            )
            .with_templates_dir(&config.mockups.templates_dir)
            .with_subdomain_root(&config.cloudflare.subdomain_root),
        );

        let (deployer, dns) = if config.cloudflare.is_configured() {
            let deployer = CloudflareDeployer::new(&config.cloudflare, config.retry.clone())?;
            let resolver = DohResolver::new(
                &config.monitoring.doh_base,
                Duration::from_secs(config.monitoring.request_timeout_secs),
            )?;
            let dns = DnsManager::new(deployer.client().clone(), resolver, &config.cloudflare);
            (Some(Arc::new(deployer)), Some(Arc::new(dns)))
        } else {
            warn!("Cloudflare credentials missing, production deployment disabled");
            (None, None)
        };
        let monitor = Arc::new(DeploymentMonitor::new(&config.monitoring)?);

        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            store.clone(),
            events.clone(),
            PipelineStages {
                mockups: mockups.clone(),
                email: email.clone(),
                sanity: sanity.clone(),
                enrichment: enrichment.clone(),
                astro_build: Arc::new(AstroBuild::new(config.astro.clone())),
                deployer: deployer.clone(),
            },
            &config.server.public_url,
        ));

        info!(
            data_dir = %storage.data_dir.display(),
            netlify = config.netlify.is_configured(),
            sanity = config.sanity.is_configured(),
            deepseek = config.deepseek.is_configured(),
            email = email.is_configured(),
            cloudflare = deployer.is_some(),
            "Pipeline services ready"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            events,
            orchestrator,
            mockups,
            email,
            sanity,
            enricher,
            enrichment,
            deployer,
            dns,
            monitor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(tmp: &TempDir) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.storage.data_dir = tmp.path().join("data");
        config.storage.temp_dir = tmp.path().join("tmp");
        config
    }

    #[tokio::test]
    async fn test_build_without_credentials() {
        let tmp = TempDir::new().unwrap();
        let services = PipelineServices::build(config(&tmp)).await.unwrap();

        assert!(services.deployer.is_none());
        assert!(services.dns.is_none());
        assert!(!services.email.is_configured());
        assert!(!services.enricher.has_model());
        assert!(tmp.path().join("data/workflows").is_dir());
    }

    #[tokio::test]
    async fn test_cloudflare_credentials_enable_deployment() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp);
        config.cloudflare.account_id = "acc".to_string();
        config.cloudflare.api_token = "token".to_string();

        let services = PipelineServices::build(config).await.unwrap();
        assert!(services.deployer.is_some());
        assert!(services.dns.is_some());
    }
}
