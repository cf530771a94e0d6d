//! Pipeline configuration
//!
//! [`PipelineConfig`] is read from a YAML (or TOML) file, then the well-known
//! environment variables override individual fields. A missing file is not an error:
//! every section has defaults and the credentials usually come from the environment.

pub mod loader;
pub mod settings;

pub use loader::{expand_env_in_string, load_config_file, load_tree, overlay};
pub use settings::{
    AstroSettings, CloudflareSettings, DeepseekSettings, EmailSettings, EnrichmentSettings,
    MockupSettings, MonitoringSettings, NetlifySettings, SanitySettings, ServerSettings,
    StorageSettings,
};

use crate::retry::RetryConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use utils::env::{get_env_opt, get_env_parse_or};

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub cloudflare: CloudflareSettings,
    pub sanity: SanitySettings,
    pub deepseek: DeepseekSettings,
    pub netlify: NetlifySettings,
    pub email: EmailSettings,
    pub mockups: MockupSettings,
    pub enrichment: EnrichmentSettings,
    pub astro: AstroSettings,
    pub monitoring: MonitoringSettings,
    pub retry: RetryConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML or TOML file, without environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_config_file(path)
    }

    /// Load configuration from the default location, then apply the environment
    ///
    /// Searches for a file in:
    /// 1. `CONFIG_PATH` environment variable
    /// 2. `./config/awema.yaml`
    /// 3. `./awema.yaml`
    /// 4. `./config/awema.toml`
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match Self::find_config_file() {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                Self::from_file(&path)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Load an explicit file, then apply the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::from_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Some(path) = get_env_opt("CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        [
            PathBuf::from("config/awema.yaml"),
            PathBuf::from("awema.yaml"),
            PathBuf::from("config/awema.toml"),
        ]
        .into_iter()
        .find(|p| p.exists())
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) {
        if let Some(v) = get_env_opt("CLOUDFLARE_ACCOUNT_ID") {
            self.cloudflare.account_id = v;
        }
        if let Some(v) = get_env_opt("CLOUDFLARE_API_TOKEN") {
            self.cloudflare.api_token = v;
        }
        if let Some(v) = get_env_opt("CLOUDFLARE_ZONE_ID") {
            self.cloudflare.zone_id = Some(v);
        }
        if let Some(v) = get_env_opt("SANITY_MANAGEMENT_TOKEN") {
            self.sanity.management_token = v;
        }
        if let Some(v) = get_env_opt("SANITY_ORGANIZATION_ID") {
            self.sanity.organization_id = Some(v);
        }
        if let Some(v) = get_env_opt("DEEPSEEK_API_KEY") {
            self.deepseek.api_key = v;
        }
        if let Some(v) = get_env_opt("NETLIFY_API_TOKEN") {
            self.netlify.api_token = v;
        }
        if let Some(v) = get_env_opt("EMAIL_API_KEY") {
            self.email.api_key = v;
        }
        if let Some(v) = get_env_opt("EMAIL_PROVIDER") {
            match v.parse() {
                Ok(provider) => self.email.provider = provider,
                Err(e) => tracing::warn!(error = %e, "Ignoring EMAIL_PROVIDER"),
            }
        }
        if let Some(v) = get_env_opt("EMAIL_FROM") {
            self.email.from_email = v;
        }
        if let Some(v) = get_env_opt("AWEMA_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get_env_opt("AWEMA_PUBLIC_URL") {
            self.server.public_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get_env_opt("HOST") {
            self.server.host = v;
        }
        self.server.port = get_env_parse_or("PORT", self.server.port);
    }

    /// Report missing credentials; the pipeline still runs on its fallbacks
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.cloudflare.is_configured() {
            warnings.push(
                "Cloudflare non configuré (CLOUDFLARE_ACCOUNT_ID, CLOUDFLARE_API_TOKEN): déploiement indisponible"
                    .to_string(),
            );
        } else if self.cloudflare.zone_id.is_none() {
            warnings.push(
                "CLOUDFLARE_ZONE_ID absent: les sous-domaines ne seront pas créés".to_string(),
            );
        }
        if !self.sanity.is_configured() {
            warnings.push(
                "SANITY_MANAGEMENT_TOKEN absent: projets Sanity simulés".to_string(),
            );
        }
        if !self.deepseek.is_configured() {
            warnings.push(
                "DEEPSEEK_API_KEY absent: contenu généré depuis les modèles".to_string(),
            );
        }
        if !self.netlify.is_configured() {
            warnings.push("NETLIFY_API_TOKEN absent: maquettes indisponibles".to_string());
        }
        if !self.email.is_configured() {
            warnings.push("EMAIL_API_KEY absent: emails non envoyés".to_string());
        }
        if self.mockups.max_mockups == 0 {
            warnings.push("mockups.max_mockups vaut 0: aucune maquette générée".to_string());
        }

        warnings
    }

    /// Directory where Astro projects are written
    pub fn astro_output_dir(&self) -> PathBuf {
        self.astro
            .output_dir
            .clone()
            .unwrap_or_else(|| self.storage.temp_dir.clone())
    }
}
