//! Template build step
//!
//! [`CommandBuilder`] runs the template's build command through `sh -c` under a
//! timeout. [`CopyBuilder`] skips the toolchain and copies the sources straight into the
//! output directory, which is what the generated fallback template needs.

use super::archive::copy_dir_all;
use super::template::MockupTemplate;
use crate::{PipelineError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

#[async_trait]
pub trait SiteBuilder: Send + Sync {
    /// Build the template in `dir` and return the output directory
    async fn build(&self, dir: &Path, template: &MockupTemplate) -> Result<PathBuf>;
}

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Run `command` with `sh -c` in `cwd`, failing on timeout or non-zero exit
pub async fn run_shell(command: &str, cwd: &Path, timeout: Duration) -> Result<CommandOutput> {
    let started = std::time::Instant::now();
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).current_dir(cwd).kill_on_drop(true);

    debug!(command = %command, cwd = %cwd.display(), "Running build command");

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            PipelineError::Timeout(format!("{} (après {}s)", command, timeout.as_secs()))
        })?
        .map_err(|e| PipelineError::Build(format!("{}: {}", command, e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        error!(
            command = %command,
            exit_code = output.status.code(),
            stderr = %stderr,
            "Build command failed"
        );
        return Err(PipelineError::Build(format!(
            "{} a échoué ({}): {}",
            command,
            output.status,
            stderr.trim()
        )));
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        elapsed: started.elapsed(),
    })
}

/// Runs `template.build_command`
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    timeout: Duration,
}

impl CommandBuilder {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl SiteBuilder for CommandBuilder {
    async fn build(&self, dir: &Path, template: &MockupTemplate) -> Result<PathBuf> {
        run_shell(template.build_command, dir, self.timeout).await?;

        let output = dir.join(template.output_directory);
        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(PipelineError::Build(format!(
                "Répertoire de sortie {} introuvable après build",
                template.output_directory
            )));
        }
        Ok(output)
    }
}

/// Copies the template sources as the build output
#[derive(Debug, Clone, Default)]
pub struct CopyBuilder;

#[async_trait]
impl SiteBuilder for CopyBuilder {
    async fn build(&self, dir: &Path, template: &MockupTemplate) -> Result<PathBuf> {
        let staging = dir.with_extension("out");
        let output = dir.join(template.output_directory);
        let (src, staged, out) = (dir.to_path_buf(), staging.clone(), output.clone());

        tokio::task::spawn_blocking(move || -> Result<()> {
            copy_dir_all(&src, &staged)?;
            let nested = staged.join(out.file_name().unwrap_or_default());
            if nested.exists() {
                std::fs::remove_dir_all(&nested)?;
            }
            if out.exists() {
                std::fs::remove_dir_all(&out)?;
            }
            std::fs::rename(&staged, &out)?;
            Ok(())
        })
        .await
        .map_err(|e| PipelineError::General(format!("copy task failed: {}", e)))??;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockups::template::find_template;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_shell_success_and_failure() {
        let tmp = TempDir::new().unwrap();
        let out = run_shell("echo bonjour", tmp.path(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "bonjour");

        let err = run_shell("exit 3", tmp.path(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Build(_)));
    }

    #[tokio::test]
    async fn test_run_shell_timeout() {
        let tmp = TempDir::new().unwrap();
        let err = run_shell("sleep 5", tmp.path(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_copy_builder_produces_output_dir() {
        let tmp = TempDir::new().unwrap();
        let site = tmp.path().join("site");
        std::fs::create_dir_all(&site).unwrap();
        std::fs::write(site.join("index.html"), "<h1>ok</h1>").unwrap();

        let template = find_template("classique").unwrap();
        let output = CopyBuilder.build(&site, template).await.unwrap();

        assert_eq!(output, site.join("dist"));
        assert!(output.join("index.html").exists());
        assert!(!output.join("dist").exists());
    }
}
