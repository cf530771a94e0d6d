//! Astro project generation and build
//!
//! [`AstroConverter`] writes a complete static-site project (components, pages, data,
//! Sanity client and deployment files) from the enriched and mapped content.
//! [`AstroBuild`] runs npm on it and prepares `dist/` for Cloudflare Pages.

pub mod build;
pub mod converter;
pub mod templates;

pub use build::{AstroBuild, BuildOutput};
pub use converter::{estimate_build_time, AstroConversionRequest, AstroConverter, ConverterStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Settings handed to the deployment step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AstroBuildConfig {
    /// `{projectId, dataset, apiVersion, useCdn}`, empty without a CMS
    pub sanity_config: Value,
    pub environment_vars: BTreeMap<String, String>,
    pub cloudflare_config: Value,
    pub deployment_script: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceEstimate {
    /// Seconds
    pub estimated_build_time: u64,
    pub estimated_lighthouse_score: u32,
    pub optimizations: Vec<String>,
}

/// A generated project on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstroProject {
    #[serde(default)]
    pub workflow_id: String,
    /// Pages project name derived from the domain
    #[serde(default)]
    pub project_name: String,
    pub ready: bool,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub config_files: Vec<String>,
    #[serde(default)]
    pub deployment_ready: bool,
    pub project_path: PathBuf,
    #[serde(default)]
    pub build_config: AstroBuildConfig,
    #[serde(default)]
    pub performance: PerformanceEstimate,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AstroProject {
    /// Where `npm run build` writes the site
    pub fn dist_dir(&self) -> PathBuf {
        self.project_path.join("dist")
    }
}
