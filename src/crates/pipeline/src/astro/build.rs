//! npm build of a generated project.

use super::templates::{HEADERS_FILE, REDIRECTS_FILE};
use super::AstroProject;
use crate::config::AstroSettings;
use crate::mockups::builder::run_shell;
use crate::{PipelineError, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    /// Directory to upload
    pub output_dir: PathBuf,
    pub build_time_ms: u64,
    /// npm was not run; the project tree is uploaded as-is
    pub skipped: bool,
    pub log: String,
}

pub struct AstroBuild {
    settings: AstroSettings,
}

impl AstroBuild {
    pub fn new(settings: AstroSettings) -> Self {
        Self { settings }
    }

    /// Install dependencies, build, and drop the Pages `_headers` and `_redirects`
    /// files into the output
    pub async fn build(&self, project: &AstroProject) -> Result<BuildOutput> {
        let root = &project.project_path;
        if !root.join("package.json").is_file() {
            return Err(PipelineError::Build(format!(
                "package.json absent dans {}",
                root.display()
            )));
        }

        if self.settings.skip_build {
            warn!(path = %root.display(), "Astro build skipped, uploading sources");
            write_pages_files(root).await?;
            return Ok(BuildOutput {
                output_dir: root.clone(),
                build_time_ms: 0,
                skipped: true,
                log: String::new(),
            });
        }

        let started = Instant::now();
        let timeout = Duration::from_secs(self.settings.build_timeout_secs);
        let npm = &self.settings.npm_command;

        let install = run_shell(&format!("{} install --no-audit --no-fund", npm), root, timeout).await?;
        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(PipelineError::Timeout(format!(
                "build Astro (après {}s)",
                timeout.as_secs()
            )));
        }
        let build = run_shell(&format!("{} run build", npm), root, remaining).await?;

        let dist = project.dist_dir();
        if !dist.is_dir() {
            return Err(PipelineError::Build(format!(
                "dossier de sortie absent: {}",
                dist.display()
            )));
        }
        write_pages_files(&dist).await?;

        let build_time_ms = started.elapsed().as_millis() as u64;
        info!(
            workflow_id = %project.workflow_id,
            build_time_ms,
            output = %dist.display(),
            "Astro build finished"
        );
        Ok(BuildOutput {
            output_dir: dist,
            build_time_ms,
            skipped: false,
            log: format!("{}\n{}", install.stdout.trim(), build.stdout.trim()),
        })
    }
}

async fn write_pages_files(dir: &std::path::Path) -> Result<()> {
    tokio::fs::write(dir.join("_headers"), HEADERS_FILE).await?;
    tokio::fs::write(dir.join("_redirects"), REDIRECTS_FILE).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(root: PathBuf) -> AstroProject {
        serde_json::from_value(serde_json::json!({
            "workflowId": "workflow-1",
            "ready": true,
            "projectPath": root,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_package_json_is_build_error() {
        let dir = TempDir::new().unwrap();
        let err = AstroBuild::new(AstroSettings::default())
            .build(&project(dir.path().to_path_buf()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Build(_)));
    }

    #[tokio::test]
    async fn test_skip_build_writes_pages_files_at_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let settings = AstroSettings {
            skip_build: true,
            ..Default::default()
        };

        let output = AstroBuild::new(settings)
            .build(&project(dir.path().to_path_buf()))
            .await
            .unwrap();
        assert!(output.skipped);
        assert_eq!(output.output_dir, dir.path());
        let headers = std::fs::read_to_string(dir.path().join("_headers")).unwrap();
        assert!(headers.contains("X-Frame-Options: DENY"));
        assert!(dir.path().join("_redirects").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_with_stub_npm() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        // `true install` succeeds, `mkdir -p dist; true run build` creates the output
        let settings = AstroSettings {
            npm_command: "mkdir -p dist; true".to_string(),
            build_timeout_secs: 30,
            ..Default::default()
        };

        let output = AstroBuild::new(settings)
            .build(&project(dir.path().to_path_buf()))
            .await
            .unwrap();
        assert!(!output.skipped);
        assert_eq!(output.output_dir, dir.path().join("dist"));
        assert!(dir.path().join("dist/_redirects").is_file());
    }
}
