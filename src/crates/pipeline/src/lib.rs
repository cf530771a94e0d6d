//! Site generation pipeline for French artisans
//!
//! Chains third-party platforms into one workflow per client:
//!
//! 1. intake of the client form ([`domain`])
//! 2. three Lorem-ipsum mockups deployed on Netlify ([`mockups`])
//! 3. proposal email with open/click tracking ([`email`])
//! 4. client selection, then the production phase ([`orchestrator`]):
//!    Sanity provisioning ([`sanity`]), DeepSeek enrichment ([`enrichment`]), template
//!    mapping ([`mapper`]), Astro project generation ([`astro`]) and Cloudflare Pages
//!    deployment with DNS and monitoring ([`deploy`])
//!
//! The [`api`] module exposes all of it over HTTP with axum.

pub mod api;
pub mod astro;
pub mod catalog;
pub mod config;
pub mod deploy;
pub mod domain;
pub mod email;
pub mod enrich_migrate;
pub mod enrichment;
pub mod mapper;
pub mod mockups;
pub mod orchestrator;
pub mod patterns;
pub mod retry;
pub mod sanity;
pub mod services;
pub mod store;

use thiserror::Error;

/// Errors that can occur in the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Workflow, project or tracking record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid workflow status transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Missing or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Call to an external platform failed
    #[error(transparent)]
    Platform(#[from] platforms::PlatformError),

    /// LLM call failed
    #[error(transparent)]
    Llm(#[from] llm::LlmError),

    /// Helper crate error (JSON directory, env)
    #[error(transparent)]
    Utils(#[from] utils::UtilsError),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Zip archive creation failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// External build command failed
    #[error("Build failed: {0}")]
    Build(String),

    /// Operation exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// General error
    #[error("Pipeline error: {0}")]
    General(String),
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Archive(err.to_string())
    }
}

impl From<walkdir::Error> for PipelineError {
    fn from(err: walkdir::Error) -> Self {
        PipelineError::Io(err.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
