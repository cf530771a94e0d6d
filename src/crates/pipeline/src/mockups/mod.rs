//! Mockup generation
//!
//! Three quick Lorem-ipsum previews of the client's future site, each deployed as a
//! throwaway Netlify site so the client can pick a design.

pub mod archive;
pub mod builder;
pub mod generator;
pub mod template;

pub use builder::{run_shell, CommandBuilder, CommandOutput, CopyBuilder, SiteBuilder};
pub use generator::{MockupGenerationResult, MockupGenerator};
pub use template::{compatible_templates, select_templates, MockupTemplate, AVAILABLE_TEMPLATES};
