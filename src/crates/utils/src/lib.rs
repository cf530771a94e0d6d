//! Shared helpers for the awema pipeline.
//!
//! This crate groups the small pieces every other crate of the workspace leans on:
//!
//! ## Environment (`env`)
//!
//! Typed access to environment variables, blank values counting as unset:
//!
//! ```rust,ignore
//! use utils::env::{get_env_opt, get_env_parse_or};
//!
//! let token = get_env_opt("CLOUDFLARE_API_TOKEN");
//! let port = get_env_parse_or::<u16>("PORT", 8080);
//! ```
//!
//! ## Text (`text`)
//!
//! Slugs, French accent folding and word counting:
//!
//! ```rust,ignore
//! use utils::text::{slugify, count_words};
//!
//! assert_eq!(slugify("Plomberie Dupont & Fils", 30), "plomberie-dupont-fils");
//! assert_eq!(count_words("Bonjour  à tous"), 3);
//! ```
//!
//! ## JSON documents (`json_dir`)
//!
//! A directory of `{key}.json` documents with atomic writes:
//!
//! ```rust,ignore
//! use utils::json_dir::JsonDir;
//!
//! let dir = JsonDir::open("/var/lib/awema/sanity-projects").await?;
//! dir.write("p-123", &config).await?;
//! let all: Vec<ProjectConfig> = dir.list().await?;
//! ```

pub mod env;
pub mod error;
pub mod json_dir;
pub mod text;

// Re-export commonly used types
pub use env::{get_env_opt, get_env_parse_or, parse_env, require_env};
pub use error::{Result, UtilsError};
pub use json_dir::JsonDir;
pub use text::{capitalize, count_words, escape_html, fold_accents, slugify, to_base36};
