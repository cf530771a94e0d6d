//! Enriched site content.
//!
//! Every struct is `#[serde(default)]` so that partial LLM answers still parse; the
//! generator checks [`HomeContent::is_usable`] and friends before accepting them.

use crate::domain::{ClientFormData, Workflow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Words targeted per generated page
pub const DEFAULT_TARGET_WORDS: usize = 1000;

/// Input of a full enrichment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    #[serde(default)]
    pub workflow_id: Option<String>,
    pub business_type: String,
    pub business_name: String,
    pub ville: String,
    #[serde(default)]
    pub code_postal: Option<String>,
    #[serde(default)]
    pub form: ClientFormData,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default = "default_target_words")]
    pub target_word_count: usize,
}

fn default_target_words() -> usize {
    DEFAULT_TARGET_WORDS
}

impl EnrichmentRequest {
    pub fn from_form(form: &ClientFormData) -> Self {
        let code_postal = Some(form.code_postal.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Self {
            workflow_id: None,
            business_type: form.business_type.trim().to_string(),
            business_name: form.business_name.trim().to_string(),
            ville: form.ville.trim().to_string(),
            code_postal,
            form: form.clone(),
            template: None,
            target_word_count: DEFAULT_TARGET_WORDS,
        }
    }

    pub fn from_workflow(workflow: &Workflow, template: Option<&str>) -> Self {
        let mut request = Self::from_form(&workflow.client);
        request.workflow_id = Some(workflow.id.clone());
        request.template = template
            .map(str::to_string)
            .or_else(|| workflow.selected_template.clone());
        request
    }

    /// Lowercased business type, for trade-specific rules
    pub fn business_key(&self) -> String {
        utils::fold_accents(self.business_type.trim()).to_lowercase()
    }

    /// Site base URL used in SEO data
    pub fn base_url(&self) -> String {
        format!("https://{}", self.form.custom_domain().unwrap_or("exemple.fr"))
    }
}

/// Input of a quick preview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewRequest {
    pub workflow_id: Option<String>,
    pub business_type: String,
    pub business_name: String,
    pub ville: String,
    pub form: ClientFormData,
}

impl PreviewRequest {
    pub fn from_form(form: &ClientFormData) -> Self {
        Self {
            workflow_id: None,
            business_type: form.business_type.trim().to_string(),
            business_name: form.business_name.trim().to_string(),
            ville: form.ville.trim().to_string(),
            form: form.clone(),
        }
    }

    pub(crate) fn cache_key(&self) -> String {
        format!(
            "preview-{}-{}-{}-{}",
            self.workflow_id.as_deref().unwrap_or("anonymous"),
            self.business_type,
            self.business_name,
            self.ville
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPreview {
    pub home_excerpt: String,
    pub services_count: usize,
    pub estimated_word_count: usize,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_primary: String,
    pub cta_secondary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceHighlight {
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomeAbout {
    pub story: String,
    pub mission: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhyUsItem {
    pub title: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessStep {
    pub step: u32,
    pub title: String,
    pub description: String,
}

impl ProcessStep {
    pub fn new(step: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            step,
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomeContent {
    pub hero: Hero,
    pub services: Vec<ServiceHighlight>,
    pub about: HomeAbout,
    pub why_us: Vec<WhyUsItem>,
    pub processus: Vec<ProcessStep>,
    pub word_count: usize,
}

impl HomeContent {
    pub fn is_usable(&self) -> bool {
        !self.hero.title.trim().is_empty() && !self.hero.description.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// One dedicated service page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePage {
    pub slug: String,
    pub title: String,
    pub meta_description: String,
    pub hero_content: String,
    pub detailed_description: String,
    pub benefits: Vec<String>,
    pub process: Vec<ProcessStep>,
    pub faq: Vec<Faq>,
    pub local_keywords: Vec<String>,
    pub word_count: usize,
}

impl ServicePage {
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && !self.detailed_description.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AboutContent {
    pub story: String,
    pub team: String,
    pub values: Vec<String>,
    pub certifications: Vec<String>,
    pub experience: String,
    pub local_history: String,
    pub word_count: usize,
}

impl AboutContent {
    pub fn is_usable(&self) -> bool {
        !self.story.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpeningHours {
    pub day: String,
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactContent {
    pub intro: String,
    pub zones: Vec<String>,
    /// Monday first
    pub hours: Vec<OpeningHours>,
    pub emergency_info: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegalContent {
    pub mentions_legales: String,
    pub politique_confidentialite: String,
    pub conditions_utilisation: String,
    pub cookies: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichedPages {
    pub home: HomeContent,
    pub services: Vec<ServicePage>,
    pub about: AboutContent,
    pub contact: ContactContent,
    pub legal: LegalContent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    pub url: String,
    pub lastmod: String,
    pub changefreq: String,
    pub priority: f32,
}

/// JSON-LD documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoSchemas {
    pub local_business: Value,
    pub organization: Value,
    pub breadcrumb_list: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoContent {
    /// Keyed by page (`home`, `about`, `contact`, then service slugs)
    pub meta_descriptions: BTreeMap<String, String>,
    pub schemas: SeoSchemas,
    pub local_business: Value,
    pub breadcrumbs: BTreeMap<String, Vec<Breadcrumb>>,
    pub sitemap: Vec<SitemapEntry>,
}

/// Complete copy for one site, produced once per workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedContent {
    pub pages: EnrichedPages,
    pub seo: SeoContent,
    pub total_word_count: usize,
    pub generated_at: DateTime<Utc>,
    /// Pages that were built from templates instead of the LLM
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_pages: Vec<String>,
}

impl EnrichedContent {
    pub fn service(&self, slug: &str) -> Option<&ServicePage> {
        self.pages.services.iter().find(|s| s.slug == slug)
    }

    pub fn used_fallback(&self) -> bool {
        !self.fallback_pages.is_empty()
    }
}

/// Words in every string of a JSON value, split on whitespace.
pub fn text_word_count(value: &Value) -> usize {
    match value {
        Value::String(s) => utils::count_words(s),
        Value::Array(items) => items.iter().map(text_word_count).sum(),
        Value::Object(map) => map.values().map(text_word_count).sum(),
        _ => 0,
    }
}

/// Word count of any serializable page
pub fn page_word_count<T: Serialize>(page: &T) -> usize {
    serde_json::to_value(page)
        .map(|v| text_word_count(&v))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_llm_answer_parses() {
        let home: HomeContent = serde_json::from_value(json!({
            "hero": { "title": "Plombier à Lyon", "description": "Dépannage rapide" },
            "processus": [{ "step": 1, "title": "Appel" }]
        }))
        .unwrap();
        assert!(home.is_usable());
        assert!(home.services.is_empty());
        assert_eq!(home.processus[0].step, 1);

        let simulated: HomeContent =
            serde_json::from_value(json!({ "title": "Contenu simulé", "simulation": true })).unwrap();
        assert!(!simulated.is_usable());
    }

    #[test]
    fn test_text_word_count_ignores_numbers_and_keys() {
        let value = json!({
            "title": "Plombier à Lyon",
            "step": 3,
            "faq": [{ "question": "Quel délai ?", "answer": "Sous 24h" }]
        });
        assert_eq!(text_word_count(&value), 3 + 3 + 2);
    }

    #[test]
    fn test_request_from_form() {
        let form: ClientFormData = serde_json::from_value(json!({
            "businessName": " Dupont Plomberie ",
            "businessType": "plombier",
            "ville": "Lyon",
            "codePostal": "",
            "domain": "dupont-plomberie.fr"
        }))
        .unwrap();
        let request = EnrichmentRequest::from_form(&form);
        assert_eq!(request.business_name, "Dupont Plomberie");
        assert_eq!(request.code_postal, None);
        assert_eq!(request.base_url(), "https://dupont-plomberie.fr");
        assert_eq!(request.target_word_count, DEFAULT_TARGET_WORDS);
    }
}
