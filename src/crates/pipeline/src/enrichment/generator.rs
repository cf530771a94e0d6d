//! DeepSeek-backed content generation.

use super::content::{
    page_word_count, AboutContent, ContentPreview, EnrichedContent, EnrichedPages,
    EnrichmentRequest, HomeContent, PreviewRequest, ServicePage,
};
use super::fallback;
use super::prompts::{
    about_prompt, home_prompt, preview_prompt, service_prompt, ABOUT_MAX_TOKENS,
    HOME_MAX_TOKENS, PREVIEW_MAX_TOKENS, SERVICE_MAX_TOKENS, SYSTEM_PROMPT, TEMPERATURE,
};
use super::seo::{preview_keywords, seo_content};
use crate::config::EnrichmentSettings;
use crate::domain::ClientFormData;
use crate::{PipelineError, Result};
use chrono::Utc;
use llm::{ChatModel, ChatRequest, Message, ResponseFormat};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Used when the form lists no service at all
pub const DEFAULT_SERVICES: [&str; 4] = ["Dépannage", "Installation", "Maintenance", "Réparation"];

const MIN_ESTIMATED_SERVICES: usize = 3;
const MAX_ESTIMATED_SERVICES: usize = 8;
const DEFAULT_ESTIMATED_SERVICES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub cache_size: usize,
    pub total_requests: usize,
    pub failed_requests: usize,
    pub fallback_pages: usize,
    /// Share of LLM calls that produced usable content
    pub success_rate: f64,
}

#[derive(Default)]
struct Counters {
    requests: AtomicUsize,
    failures: AtomicUsize,
    fallbacks: AtomicUsize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewAnswer {
    #[serde(default)]
    home_excerpt: String,
}

/// Generates the copy of a whole site.
///
/// Without a model every page comes from [`fallback`]; with one, home, about and each
/// service page are asked to the model and fall back individually.
pub struct ContentEnricher {
    model: Option<Arc<dyn ChatModel>>,
    settings: EnrichmentSettings,
    preview_cache: Mutex<HashMap<String, (Instant, ContentPreview)>>,
    counters: Counters,
}

impl ContentEnricher {
    pub fn new(model: Option<Arc<dyn ChatModel>>, settings: EnrichmentSettings) -> Self {
        if model.is_none() {
            warn!("DeepSeek not configured, enrichment will use template content");
        }
        Self {
            model,
            settings,
            preview_cache: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    /// Generate every page, SEO data and word counts for one site
    pub async fn enrich(&self, request: &EnrichmentRequest) -> Result<EnrichedContent> {
        if request.business_name.trim().is_empty() || request.business_type.trim().is_empty() {
            return Err(PipelineError::Validation(
                "businessName et businessType sont requis pour l'enrichissement".to_string(),
            ));
        }

        let started = Instant::now();
        info!(
            business = %request.business_name,
            business_type = %request.business_type,
            ville = %request.ville,
            llm = self.has_model(),
            "Generating enriched content"
        );

        let services = extract_services(&request.form, self.settings.max_services);
        let mut fallback_pages = Vec::new();

        let mut home = match self.ask::<HomeContent>(home_prompt(request), HOME_MAX_TOKENS).await {
            Some(home) if home.is_usable() => home,
            _ => {
                fallback_pages.push("home".to_string());
                fallback::home(request, &services)
            }
        };
        let minimum = self.settings.min_words_per_page;
        let subject = request.business_type.to_lowercase();
        home.word_count = top_up(&mut home, minimum, &fallback::long_form_paragraphs(request, &subject), |h| {
            &mut h.about.story
        });

        let mut service_pages = Vec::with_capacity(services.len());
        for (index, service) in services.iter().enumerate() {
            let page = match self
                .ask::<ServicePage>(service_prompt(service, request), SERVICE_MAX_TOKENS)
                .await
            {
                Some(page) if page.is_usable() => normalize_service_page(page, service, request),
                _ => {
                    fallback_pages.push(format!("service:{service}"));
                    fallback::service(service, request)
                }
            };
            let mut page = with_word_count(page);
            let paragraphs = fallback::long_form_paragraphs(request, &service.to_lowercase());
            page.word_count = top_up(&mut page, minimum, &paragraphs, |p| &mut p.detailed_description);
            service_pages.push(page);

            if self.has_model() && index + 1 < services.len() && self.settings.service_pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.settings.service_pause_ms)).await;
            }
        }

        let mut about = match self.ask::<AboutContent>(about_prompt(request), ABOUT_MAX_TOKENS).await {
            Some(about) if about.is_usable() => about,
            _ => {
                fallback_pages.push("about".to_string());
                fallback::about(request)
            }
        };
        about.word_count = top_up(&mut about, minimum, &fallback::long_form_paragraphs(request, &subject), |a| {
            &mut a.story
        });

        let mut contact = fallback::contact(request);
        contact.word_count = page_word_count(&contact);

        let legal = fallback::legal(request);
        let seo = seo_content(request, &service_pages);

        let total_word_count = home.word_count
            + about.word_count
            + contact.word_count
            + service_pages.iter().map(|s| s.word_count).sum::<usize>();

        self.counters
            .fallbacks
            .fetch_add(fallback_pages.len(), Ordering::Relaxed);

        info!(
            business = %request.business_name,
            total_word_count,
            services = service_pages.len(),
            fallback_pages = fallback_pages.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Enriched content generated"
        );

        Ok(EnrichedContent {
            pages: EnrichedPages {
                home,
                services: service_pages,
                about,
                contact,
                legal,
            },
            seo,
            total_word_count,
            generated_at: Utc::now(),
            fallback_pages,
        })
    }

    /// Short excerpt plus size estimates, cached per request
    pub async fn generate_preview(&self, request: &PreviewRequest) -> ContentPreview {
        let key = request.cache_key();
        let ttl = Duration::from_secs(self.settings.preview_cache_secs);
        {
            let mut cache = self.preview_cache.lock();
            let fresh = cache
                .get(&key)
                .filter(|(at, _)| at.elapsed() < ttl)
                .map(|(_, preview)| preview.clone());
            if let Some(preview) = fresh {
                return preview;
            }
            cache.remove(&key);
        }

        let excerpt = self
            .ask::<PreviewAnswer>(preview_prompt(request), PREVIEW_MAX_TOKENS)
            .await
            .map(|answer| answer.home_excerpt)
            .filter(|excerpt| !excerpt.trim().is_empty())
            .unwrap_or_else(|| fallback::preview_excerpt(request));

        let preview = ContentPreview {
            home_excerpt: excerpt,
            services_count: estimate_services_count(&request.form),
            estimated_word_count: estimate_word_count(&request.form),
            keywords: preview_keywords(request),
        };

        self.preview_cache
            .lock()
            .insert(key, (Instant::now(), preview.clone()));
        preview
    }

    /// Drop cached previews belonging to a workflow; returns how many were removed
    pub fn clear_cache(&self, workflow_id: &str) -> usize {
        let mut cache = self.preview_cache.lock();
        let before = cache.len();
        cache.retain(|key, _| !key.contains(workflow_id));
        let removed = before - cache.len();
        info!(workflow_id, removed, "Enrichment cache cleared");
        removed
    }

    pub fn usage_stats(&self) -> UsageStats {
        let total = self.counters.requests.load(Ordering::Relaxed);
        let failed = self.counters.failures.load(Ordering::Relaxed);
        UsageStats {
            cache_size: self.preview_cache.lock().len(),
            total_requests: total,
            failed_requests: failed,
            fallback_pages: self.counters.fallbacks.load(Ordering::Relaxed),
            success_rate: if total == 0 {
                0.0
            } else {
                (total - failed) as f64 / total as f64
            },
        }
    }

    /// Ask the model for a JSON document; `None` when there is no model or the call fails
    async fn ask<T: DeserializeOwned>(&self, prompt: String, max_tokens: usize) -> Option<T> {
        self.model.as_ref()?;
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        match self.request_json(prompt, max_tokens).await {
            Ok(value) => Some(value),
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, max_tokens, "DeepSeek call failed, using template content");
                None
            }
        }
    }

    async fn request_json<T: DeserializeOwned>(&self, prompt: String, max_tokens: usize) -> Result<T> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::Config("DeepSeek non configuré".to_string()))?;

        let request = ChatRequest::new(vec![Message::system(SYSTEM_PROMPT), Message::human(prompt)])
            .with_temperature(TEMPERATURE)
            .with_max_tokens(max_tokens)
            .with_response_format(ResponseFormat::JsonObject);

        let response = model.chat(request).await?;
        Ok(serde_json::from_str(json_payload(response.text()))?)
    }
}

/// Strip a Markdown code fence some models wrap around JSON.
fn json_payload(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn normalize_service_page(mut page: ServicePage, service: &str, request: &EnrichmentRequest) -> ServicePage {
    // the page URL follows the service name, whatever slug the model proposed
    page.slug = fallback::service_slug(service);
    if page.local_keywords.is_empty() {
        page.local_keywords = vec![format!("{service} {}", request.ville)];
    }
    page
}

/// Append paragraphs to the long-form field of `page` until it counts `minimum` words.
/// Returns the final word count.
fn top_up<T: Serialize>(
    page: &mut T,
    minimum: usize,
    paragraphs: &[String],
    field: impl Fn(&mut T) -> &mut String,
) -> usize {
    let mut words = page_word_count(&*page);
    let before = words;
    for paragraph in paragraphs.iter().cycle() {
        if words >= minimum {
            break;
        }
        let text = field(page);
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(paragraph);
        words += utils::count_words(paragraph);
    }
    if words > before {
        debug!(before, after = words, minimum, "Page topped up to its word target");
    }
    words
}

fn with_word_count(mut page: ServicePage) -> ServicePage {
    page.word_count = 0;
    page.word_count = page_word_count(&page);
    page
}

/// Service entries listed by the form: `service*` fields first, then `services`
fn service_entries(form: &ClientFormData) -> Vec<String> {
    let from_fields: Vec<String> = form
        .extra
        .iter()
        .filter(|(key, _)| key.starts_with("service"))
        .filter_map(|(_, value)| value.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if !from_fields.is_empty() {
        return from_fields;
    }

    form.services
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Services that get a dedicated page, at most `max`
pub fn extract_services(form: &ClientFormData, max: usize) -> Vec<String> {
    let mut services = service_entries(form);
    if services.is_empty() {
        services = DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect();
    }
    services.truncate(max);
    services
}

pub fn estimate_services_count(form: &ClientFormData) -> usize {
    let listed = service_entries(form).len();
    let count = if listed == 0 { DEFAULT_ESTIMATED_SERVICES } else { listed };
    count.clamp(MIN_ESTIMATED_SERVICES, MAX_ESTIMATED_SERVICES)
}

/// Home (1000) plus 800 per service plus about, contact and legal (1200)
pub fn estimate_word_count(form: &ClientFormData) -> usize {
    1000 + estimate_services_count(form) * 800 + 1200
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm::{ChatResponse, LlmError};
    use serde_json::json;

    /// Answers by page, recognised through the token budget
    struct ScriptedModel {
        fail: bool,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(&self, request: ChatRequest) -> llm::Result<ChatResponse> {
            if self.fail {
                return Err(LlmError::Api {
                    provider: "deepseek",
                    status: 503,
                    message: "overloaded".to_string(),
                });
            }
            let body = match request.config.max_tokens {
                Some(HOME_MAX_TOKENS) => json!({
                    "hero": {
                        "title": "Votre plombier de confiance à Lyon",
                        "subtitle": "Dupont Plomberie",
                        "description": "Dépannage et installation sanitaire dans tout le Grand Lyon",
                        "ctaPrimary": "Devis gratuit",
                        "ctaSecondary": "Appeler"
                    },
                    "whyUs": [{ "title": "Réactivité", "description": "Sous 2h", "icon": "clock" }]
                })
                .to_string(),
                Some(SERVICE_MAX_TOKENS) => format!(
                    "```json\n{}\n```",
                    json!({
                        "slug": "Recherche de fuite",
                        "title": "Recherche de fuite à Lyon",
                        "detailedDescription": "Détection non destructive des fuites"
                    })
                ),
                Some(ABOUT_MAX_TOKENS) => "not json at all".to_string(),
                _ => json!({ "homeExcerpt": "Dupont Plomberie, plombier à Lyon." }).to_string(),
            };
            Ok(ChatResponse {
                message: Message::assistant(body),
                usage: None,
                metadata: HashMap::new(),
            })
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn settings() -> EnrichmentSettings {
        EnrichmentSettings {
            service_pause_ms: 0,
            ..Default::default()
        }
    }

    fn form() -> ClientFormData {
        serde_json::from_value(json!({
            "businessName": "Dupont Plomberie",
            "businessType": "plombier",
            "ville": "Lyon",
            "email": "contact@dupont.fr",
            "telephone": "0600000000",
            "service1": "Recherche de fuite",
            "service2": "Débouchage"
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_services() {
        let services = extract_services(&form(), 8);
        assert_eq!(services, vec!["Recherche de fuite", "Débouchage"]);

        let listed = ClientFormData {
            services: vec!["Carrelage".to_string(), " ".to_string()],
            ..Default::default()
        };
        assert_eq!(extract_services(&listed, 8), vec!["Carrelage"]);

        let empty = ClientFormData::default();
        assert_eq!(extract_services(&empty, 8).len(), 4);
        assert_eq!(extract_services(&empty, 2), vec!["Dépannage", "Installation"]);
    }

    #[test]
    fn test_estimates() {
        assert_eq!(estimate_services_count(&ClientFormData::default()), 4);
        assert_eq!(estimate_services_count(&form()), 3);
        let many = ClientFormData {
            services: (0..12).map(|i| format!("S{i}")).collect(),
            ..Default::default()
        };
        assert_eq!(estimate_services_count(&many), 8);
        assert_eq!(estimate_word_count(&ClientFormData::default()), 1000 + 4 * 800 + 1200);
    }

    #[test]
    fn test_json_payload_strips_fence() {
        assert_eq!(json_payload("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(json_payload("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_enrich_without_model_uses_templates() {
        let enricher = ContentEnricher::new(None, settings());
        let request = EnrichmentRequest::from_form(&form());
        let content = enricher.enrich(&request).await.unwrap();

        assert_eq!(content.pages.services.len(), 2);
        assert_eq!(content.pages.contact.hours.len(), 7);
        assert!(content.pages.contact.emergency_info.contains("24h/7j"));
        assert!(content.fallback_pages.contains(&"home".to_string()));
        assert!(content.fallback_pages.contains(&"about".to_string()));
        let sum = content.pages.home.word_count
            + content.pages.about.word_count
            + content.pages.contact.word_count
            + content.pages.services.iter().map(|s| s.word_count).sum::<usize>();
        assert_eq!(content.total_word_count, sum);
        assert!(content.total_word_count >= 1000);
        assert!(content.pages.home.word_count >= 1000);
        assert!(content.pages.about.word_count >= 1000);
        assert!(content.pages.services.iter().all(|s| s.word_count >= 1000));
        assert_eq!(page_word_count(&content.pages.home), content.pages.home.word_count);
        assert!(content.pages.services[0].detailed_description.contains("recherche de fuite"));
        assert_eq!(enricher.usage_stats().total_requests, 0);
    }

    #[tokio::test]
    async fn test_enrich_mixes_llm_and_fallback() {
        let enricher = ContentEnricher::new(Some(Arc::new(ScriptedModel { fail: false })), settings());
        let request = EnrichmentRequest::from_form(&form());
        let content = enricher.enrich(&request).await.unwrap();

        assert_eq!(content.pages.home.hero.title, "Votre plombier de confiance à Lyon");
        assert_eq!(content.pages.services[0].slug, "recherche-de-fuite");
        assert_eq!(content.pages.services[0].local_keywords, vec!["Recherche de fuite Lyon"]);
        // the about answer is not JSON
        assert_eq!(content.fallback_pages, vec!["about".to_string()]);
        assert!(content.service("recherche-de-fuite").is_some());

        let stats = enricher.usage_stats();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.fallback_pages, 1);
    }

    #[tokio::test]
    async fn test_enrich_rejects_missing_business() {
        let enricher = ContentEnricher::new(None, settings());
        let request = EnrichmentRequest::from_form(&ClientFormData::default());
        assert!(matches!(
            enricher.enrich(&request).await,
            Err(PipelineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_failing_model_falls_back_everywhere() {
        let enricher = ContentEnricher::new(Some(Arc::new(ScriptedModel { fail: true })), settings());
        let request = EnrichmentRequest::from_form(&form());
        let content = enricher.enrich(&request).await.unwrap();
        assert_eq!(content.fallback_pages.len(), 4);
        assert!(content.pages.home.is_usable());
    }

    #[tokio::test]
    async fn test_preview_is_cached_and_cleared() {
        let enricher = ContentEnricher::new(Some(Arc::new(ScriptedModel { fail: false })), settings());
        let mut request = PreviewRequest::from_form(&form());
        request.workflow_id = Some("workflow-42".to_string());

        let first = enricher.generate_preview(&request).await;
        assert_eq!(first.home_excerpt, "Dupont Plomberie, plombier à Lyon.");
        assert_eq!(first.keywords.len(), 5);
        assert_eq!(first.estimated_word_count, 1000 + 3 * 800 + 1200);

        let second = enricher.generate_preview(&request).await;
        assert_eq!(first, second);
        assert_eq!(enricher.usage_stats().total_requests, 1);
        assert_eq!(enricher.usage_stats().cache_size, 1);

        assert_eq!(enricher.clear_cache("workflow-42"), 1);
        assert_eq!(enricher.usage_stats().cache_size, 0);
    }

    #[tokio::test]
    async fn test_preview_fallback_excerpt() {
        let enricher = ContentEnricher::new(None, settings());
        let preview = enricher.generate_preview(&PreviewRequest::from_form(&form())).await;
        assert!(preview.home_excerpt.starts_with("Dupont Plomberie, votre plombier professionnel à Lyon."));
    }
}
