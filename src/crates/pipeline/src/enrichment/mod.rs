//! AI content enrichment
//!
//! DeepSeek writes the home, about and service pages; contact, legal and SEO data are
//! built from templates. Every LLM page falls back to template content on failure, so
//! enrichment never blocks a deployment.

pub mod content;
pub mod fallback;
pub mod generator;
pub mod prompts;
pub mod seo;

pub use content::{
    AboutContent, ContactContent, ContentPreview, EnrichedContent, EnrichedPages,
    EnrichmentRequest, HomeContent, LegalContent, PreviewRequest, SeoContent, ServicePage,
};
pub use generator::{
    estimate_services_count, estimate_word_count, extract_services, ContentEnricher, UsageStats,
};
pub use seo::local_keywords;
