//! Typed configuration sections.

use platforms::EmailProvider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Base URL of this service, used in selection links and tracking pixels
    pub public_url: String,
    /// Allowed CORS origins; empty means any
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_url: "https://studio.awema.fr".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root of persisted JSON state
    pub data_dir: PathBuf,
    /// Scratch space for mockup builds and Astro projects
    pub temp_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            temp_dir: std::env::temp_dir().join("awema"),
        }
    }
}

impl StorageSettings {
    pub fn workflows_dir(&self) -> PathBuf {
        self.data_dir.join("workflows")
    }

    pub fn sanity_projects_dir(&self) -> PathBuf {
        self.data_dir.join("sanity-projects")
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.data_dir.join("migrations")
    }

    pub fn email_tracking_dir(&self) -> PathBuf {
        self.data_dir.join("email-tracking")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareSettings {
    pub account_id: String,
    pub api_token: String,
    pub zone_id: Option<String>,
    pub api_base: String,
    /// Parent domain for generated subdomains
    pub subdomain_root: String,
    pub timeout_secs: u64,
}

impl Default for CloudflareSettings {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            zone_id: None,
            api_base: platforms::cloudflare::DEFAULT_API_BASE.to_string(),
            subdomain_root: "awema.fr".to_string(),
            timeout_secs: 300,
        }
    }
}

impl CloudflareSettings {
    pub fn is_configured(&self) -> bool {
        !self.account_id.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    pub fn client_config(&self) -> platforms::CloudflareConfig {
        let mut config = platforms::CloudflareConfig::new(&self.account_id, &self.api_token)
            .with_api_base(&self.api_base)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(zone) = self.zone_id.as_deref().filter(|z| !z.is_empty()) {
            config = config.with_zone(zone);
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitySettings {
    pub management_token: String,
    pub organization_id: Option<String>,
    pub api_base: String,
    pub data_api_base: Option<String>,
    /// Central sync endpoint registered as a second webhook on every project
    pub central_webhook_url: String,
    pub timeout_secs: u64,
}

impl Default for SanitySettings {
    fn default() -> Self {
        Self {
            management_token: String::new(),
            organization_id: None,
            api_base: platforms::sanity::DEFAULT_API_BASE.to_string(),
            data_api_base: None,
            central_webhook_url: "https://api.awema.fr/webhooks/sanity-sync".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SanitySettings {
    pub fn is_configured(&self) -> bool {
        !self.management_token.trim().is_empty()
    }

    pub fn client_config(&self) -> platforms::SanityConfig {
        let mut config = platforms::SanityConfig::new(&self.management_token)
            .with_api_base(&self.api_base)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(org) = self.organization_id.as_deref().filter(|o| !o.is_empty()) {
            config = config.with_organization(org);
        }
        if let Some(base) = self.data_api_base.as_deref().filter(|b| !b.is_empty()) {
            config = config.with_data_api_base(base);
        }
        config
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepseekSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for DeepseekSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            timeout_secs: 60,
        }
    }
}

impl DeepseekSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetlifySettings {
    pub api_token: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for NetlifySettings {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_base: platforms::netlify::DEFAULT_API_BASE.to_string(),
            timeout_secs: 120,
        }
    }
}

impl NetlifySettings {
    pub fn is_configured(&self) -> bool {
        !self.api_token.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub provider: EmailProvider,
    pub api_key: String,
    /// Overrides the provider's default endpoint
    pub api_base: Option<String>,
    pub from_email: String,
    pub from_name: String,
    pub reply_to: String,
    /// Host serving the tracking pixel and click redirects
    pub tracking_domain: String,
    /// Delay before the reminder email
    pub follow_up_delay_secs: u64,
    pub timeout_secs: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            provider: EmailProvider::Brevo,
            api_key: String::new(),
            api_base: None,
            from_email: "noreply@awema.fr".to_string(),
            from_name: "AWEMA - Création de sites web".to_string(),
            reply_to: "contact@awema.fr".to_string(),
            tracking_domain: "https://studio.awema.fr".to_string(),
            follow_up_delay_secs: 2 * 24 * 60 * 60,
            timeout_secs: 30,
        }
    }
}

impl EmailSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockupSettings {
    /// Directory holding one sub-directory per static template
    pub templates_dir: PathBuf,
    pub max_mockups: usize,
    pub build_timeout_secs: u64,
    /// Netlify mockup sites older than this are deleted
    pub ttl_hours: u64,
    /// How often expired mockup sites are looked for; 0 disables the sweep
    pub cleanup_interval_mins: u64,
}

impl Default for MockupSettings {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            max_mockups: 3,
            build_timeout_secs: 300,
            ttl_hours: 72,
            cleanup_interval_mins: 60,
        }
    }
}

impl MockupSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_mins * 60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    /// Pause between two per-service LLM calls
    pub service_pause_ms: u64,
    pub preview_cache_secs: u64,
    pub min_words_per_page: usize,
    pub max_services: usize,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            service_pause_ms: 1000,
            preview_cache_secs: 600,
            min_words_per_page: 1000,
            max_services: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AstroSettings {
    /// Where `astro-project-{workflowId}` directories are written; defaults to the temp dir
    pub output_dir: Option<PathBuf>,
    pub npm_command: String,
    pub build_timeout_secs: u64,
    /// Skip `npm install`/`npm run build` and upload the project as-is
    pub skip_build: bool,
}

impl Default for AstroSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            npm_command: "npm".to_string(),
            build_timeout_secs: 600,
            skip_build: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSettings {
    pub interval_ms: u64,
    pub alert_threshold: u32,
    pub performance_threshold_ms: u64,
    pub seo_min_score: u32,
    /// DNS-over-HTTPS resolver root
    pub doh_base: String,
    pub request_timeout_secs: u64,
    /// Pause between the performance probe requests
    pub probe_pause_ms: u64,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            interval_ms: 300_000,
            alert_threshold: 3,
            performance_threshold_ms: 3000,
            seo_min_score: 70,
            doh_base: platforms::doh::DEFAULT_RESOLVER.to_string(),
            request_timeout_secs: 10,
            probe_pause_ms: 1000,
        }
    }
}
