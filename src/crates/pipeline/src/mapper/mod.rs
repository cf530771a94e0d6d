//! Content mapper
//!
//! Turns a Lorem-ipsum template into the client's page in six passes: parse, business
//! placeholders, enriched sections, branding, SEO, then cleanup with a report.

pub mod branding;
pub mod extract;
pub mod sections;

use crate::catalog::colors_for_business;
use crate::domain::ClientFormData;
use crate::enrichment::{EnrichedContent, SeoContent};
use crate::patterns;
use crate::sanity::{ProjectBrief, SiteColors};
use crate::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use regex::NoExpand;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};
use utils::escape_html;

const META_DESCRIPTION_TAG: &str = r#"(?i)<meta\s+name="description"[^>]*>"#;
const H1_TAG: &str = r"(?is)(<h1[^>]*>)([^<]*)(</h1>)";
const TITLE_TAG: &str = r"(?is)(<title[^>]*>)([^<]*)(</title>)";
const LEFTOVER_MUSTACHE: &str = r"\{\{[^}]+\}\}";
const LEFTOVER_BRACKET: &str = r"\[[A-Z][A-Z0-9_]*\]";
const LEFTOVER_LOREM: &str = r"(?i)(?:lorem ipsum|consectetur adipiscing|sed do eiusmod)[^.<]*\.?";
const WHITESPACE: &str = r"\s+";
const BETWEEN_TAGS: &str = r">\s+<";
const CSS_SEMICOLON: &str = r";\s+";

/// Identity and palette of the client site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    pub business_name: String,
    pub business_type: String,
    pub ville: String,
    pub code_postal: String,
    pub domain: String,
    pub colors: SiteColors,
}

impl BusinessInfo {
    /// Form colours over the trade defaults
    pub fn from_form(form: &ClientFormData, domain: impl Into<String>) -> Self {
        let defaults = colors_for_business(&form.business_type);
        Self {
            business_name: form.business_name.clone(),
            business_type: form.business_type.clone(),
            ville: form.ville.clone(),
            code_postal: form.code_postal.clone(),
            domain: domain.into(),
            colors: SiteColors {
                primary: form.primary_color().unwrap_or(defaults.primary).to_string(),
                secondary: form.secondary_color().unwrap_or(defaults.secondary).to_string(),
                accent: form.accent_color().unwrap_or(defaults.accent).to_string(),
            },
        }
    }

    pub fn from_brief(brief: &ProjectBrief) -> Self {
        Self {
            business_name: brief.business_name.clone(),
            business_type: brief.business_type.clone(),
            ville: brief.form.ville.clone(),
            code_postal: brief.form.code_postal.clone(),
            domain: brief.domain.clone(),
            colors: brief.colors.clone(),
        }
    }
}

pub struct MappingRequest<'a> {
    /// Cache key for [`ContentMapper::cached`]
    pub workflow_id: Option<&'a str>,
    pub template_html: &'a str,
    pub content: &'a EnrichedContent,
    pub form: &'a ClientFormData,
    pub business: BusinessInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedAssets {
    pub images: Vec<String>,
    pub fonts: Vec<String>,
    pub icons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub structured_data: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    pub success: bool,
    pub sections: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedContent {
    pub head: String,
    pub html: String,
    pub css: String,
    pub js: String,
    pub assets: MappedAssets,
    pub metadata: PageMetadata,
    pub placeholders_replaced: usize,
    pub mapping_report: MappingReport,
}

impl MappedContent {
    /// Standalone HTML document
    pub fn document(&self) -> String {
        let script = if self.js.is_empty() {
            String::new()
        } else {
            format!("<script>{}</script>", self.js)
        };
        format!(
            "<!DOCTYPE html><html lang=\"fr\"><head>{}<style>{}</style></head><body>{}{}</body></html>",
            self.head, self.css, self.html, script
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperStats {
    pub total_mappings: usize,
    pub cache_size: usize,
    pub avg_placeholders_replaced: f64,
}

#[derive(Default)]
pub struct ContentMapper {
    cache: DashMap<String, MappedContent>,
    totals: Mutex<(usize, usize)>,
}

impl ContentMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_content(&self, request: &MappingRequest<'_>) -> Result<MappedContent> {
        let started = Instant::now();
        let business = &request.business;
        info!(business = %business.business_name, "Mapping content onto template");

        // 1. parse
        let parsed = extract::parse_template(request.template_html)?;

        // 2. business data
        let (body, js, mut replaced) =
            sections::map_business_data(&parsed.body, &parsed.js, request.form, business)?;

        // 3. enriched sections
        let pages = &request.content.pages;
        let injection = sections::inject_enriched(&body, &pages.home, &pages.contact)?;
        replaced += injection.replaced;

        // 4. branding
        let (css, colors_replaced) = branding::apply_colors(&parsed.css, &business.colors)?;
        let css = format!("{}\n\n{}", css, branding::branding_css(&business.colors, &business.business_type));
        debug!(colors_replaced, "Branding applied");

        // 5. SEO
        let (head, html) = apply_seo(&parsed.head, &injection.html, &request.content.seo, business)?;

        // 6. cleanup and report
        let mapped = finalize(head, html, css, js, replaced, injection.sections)?;

        {
            let mut totals = self.totals.lock();
            totals.0 += 1;
            totals.1 += mapped.placeholders_replaced;
        }
        if let Some(id) = request.workflow_id {
            self.cache.insert(format!("mapping-{id}"), mapped.clone());
        }

        info!(
            business = %business.business_name,
            placeholders = mapped.placeholders_replaced,
            sections = mapped.mapping_report.sections.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Mapping complete"
        );
        Ok(mapped)
    }

    pub fn cached(&self, workflow_id: &str) -> Option<MappedContent> {
        self.cache
            .get(&format!("mapping-{workflow_id}"))
            .map(|entry| entry.value().clone())
    }

    /// Drop the cached mapping of a workflow
    pub fn cleanup(&self, workflow_id: &str) -> bool {
        let removed = self.cache.remove(&format!("mapping-{workflow_id}")).is_some();
        debug!(workflow_id, removed, "Mapping cache cleaned");
        removed
    }

    pub fn usage_stats(&self) -> MapperStats {
        let (total, placeholders) = *self.totals.lock();
        MapperStats {
            total_mappings: total,
            cache_size: self.cache.len(),
            avg_placeholders_replaced: if total == 0 {
                0.0
            } else {
                placeholders as f64 / total as f64
            },
        }
    }
}

fn is_placeholder_heading(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.contains("Lorem") || text.contains("Title")
}

/// Meta description, JSON-LD and heading rewrite
fn apply_seo(
    head: &str,
    html: &str,
    seo: &SeoContent,
    business: &BusinessInfo,
) -> Result<(String, String)> {
    let mut head = head.to_string();
    let heading = format!(
        "{} - {} à {}",
        business.business_name, business.business_type, business.ville
    );

    if let Some(description) = seo.meta_descriptions.get("home") {
        let tag = format!(r#"<meta name="description" content="{}">"#, escape_html(description));
        let re = patterns::regex(META_DESCRIPTION_TAG)?;
        if re.is_match(&head) {
            head = re.replace(&head, NoExpand(&tag)).into_owned();
        } else {
            head.push_str(&tag);
        }
    }

    let title_re = patterns::regex(TITLE_TAG)?;
    if let Some(current) = title_re.captures(&head).and_then(|c| c.get(2)) {
        if is_placeholder_heading(current.as_str()) {
            let title = escape_html(&heading);
            head = title_re
                .replace(&head, |caps: &regex::Captures| format!("{}{}{}", &caps[1], title, &caps[3]))
                .into_owned();
        }
    } else {
        head.push_str(&format!("<title>{}</title>", escape_html(&heading)));
    }

    if !seo.schemas.local_business.is_null() {
        let json = serde_json::to_string_pretty(&seo.schemas.local_business)?;
        head.push_str(&format!(
            "\n<script type=\"application/ld+json\">\n{}\n</script>\n",
            json.replace("</", "<\\/")
        ));
    }

    let h1 = escape_html(&heading);
    let html = patterns::regex(H1_TAG)?
        .replace_all(html, |caps: &regex::Captures| {
            if is_placeholder_heading(&caps[2]) {
                format!("{}{}{}", &caps[1], h1, &caps[3])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    Ok((head, html))
}

fn finalize(
    head: String,
    html: String,
    css: String,
    js: String,
    replaced: usize,
    sections: Vec<String>,
) -> Result<MappedContent> {
    let mut html = html;
    let mut cleaned = 0;
    for pattern in [LEFTOVER_MUSTACHE, LEFTOVER_BRACKET, LEFTOVER_LOREM] {
        let re = patterns::regex(pattern)?;
        cleaned += re.find_iter(&html).count();
        html = re.replace_all(&html, "").into_owned();
    }

    let whitespace = patterns::regex(WHITESPACE)?;
    let between = patterns::regex(BETWEEN_TAGS)?;
    let html = whitespace.replace_all(&html, " ");
    let html = between.replace_all(html.trim(), "><").into_owned();
    let css = whitespace.replace_all(&css, " ");
    let css = patterns::regex(CSS_SEMICOLON)?
        .replace_all(css.trim(), ";")
        .into_owned();

    let mut warnings = Vec::new();
    if cleaned > 0 {
        warnings.push(format!("{cleaned} placeholders non mappés nettoyés"));
    }

    let mut structured_data = extract::structured_data(&head)?;
    structured_data.extend(extract::structured_data(&html)?);

    Ok(MappedContent {
        assets: MappedAssets {
            images: extract::image_paths(&html)?,
            fonts: extract::font_paths(&css)?,
            icons: extract::icon_classes(&html)?,
        },
        metadata: PageMetadata {
            title: extract::title(&head)?,
            description: extract::meta_description(&head)?,
            keywords: extract::keywords(&head)?,
            structured_data,
        },
        placeholders_replaced: replaced + cleaned,
        mapping_report: MappingReport {
            success: true,
            sections,
            warnings,
            errors: Vec::new(),
        },
        head,
        html,
        css,
        js,
    })
}
