//! Project tree writer.

use super::templates::{self, render};
use super::{AstroBuildConfig, AstroProject, PerformanceEstimate};
use crate::domain::ClientFormData;
use crate::enrichment::EnrichedContent;
use crate::mapper::{branding, BusinessInfo, MappedContent};
use crate::sanity::SanityCredentials;
use crate::{PipelineError, Result};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

const COMPONENTS: [(&str, &str, &str); 8] = [
    ("Layout", "src/layouts/Layout.astro", templates::LAYOUT),
    ("Header", "src/components/Header.astro", templates::HEADER),
    ("Footer", "src/components/Footer.astro", templates::FOOTER),
    ("Hero", "src/components/Hero.astro", templates::HERO),
    ("Services", "src/components/Services.astro", templates::SERVICES),
    ("About", "src/components/About.astro", templates::ABOUT),
    ("Contact", "src/components/Contact.astro", templates::CONTACT),
    ("SEO", "src/components/SEO.astro", templates::SEO),
];

const STATIC_PAGES: [(&str, &str, &str); 4] = [
    ("index", "src/pages/index.astro", templates::INDEX_PAGE),
    ("a-propos", "src/pages/a-propos.astro", templates::ABOUT_PAGE),
    ("contact", "src/pages/contact.astro", templates::CONTACT_PAGE),
    ("mentions-legales", "src/pages/mentions-legales.astro", templates::LEGAL_PAGE),
];

const OPTIMIZATIONS: [&str; 7] = [
    "Images WebP avec lazy loading",
    "CSS critique inliné",
    "JavaScript minimal",
    "Fonts système",
    "Service Worker pour le cache",
    "Compression Brotli",
    "CDN Cloudflare",
];

/// Seconds: 15 base, 2 per component, 1 per page
pub fn estimate_build_time(components: usize, pages: usize) -> u64 {
    15 + 2 * components as u64 + pages as u64
}

pub struct AstroConversionRequest<'a> {
    pub workflow_id: &'a str,
    pub business: &'a BusinessInfo,
    pub form: &'a ClientFormData,
    pub content: &'a EnrichedContent,
    /// Template mapped by the content mapper; its CSS becomes the site stylesheet
    pub mapped: Option<&'a MappedContent>,
    pub sanity: Option<&'a SanityCredentials>,
}

impl AstroConversionRequest<'_> {
    fn site_url(&self) -> String {
        format!("https://{}", self.business.domain)
    }

    fn project_name(&self) -> String {
        let from_domain = utils::slugify(&self.business.domain, 58);
        if from_domain.is_empty() {
            utils::slugify(&self.business.business_name, 58)
        } else {
            from_domain
        }
    }

    fn environment_vars(&self) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert("PUBLIC_SITE_URL".to_string(), self.site_url());
        vars.insert("PUBLIC_BUSINESS_NAME".to_string(), self.business.business_name.clone());
        vars.insert("PUBLIC_BUSINESS_TYPE".to_string(), self.business.business_type.clone());
        vars.insert("PUBLIC_BUSINESS_CITY".to_string(), self.business.ville.clone());
        vars.insert("PUBLIC_PHONE".to_string(), self.form.telephone.clone());
        vars.insert("PUBLIC_EMAIL".to_string(), self.form.email.clone());
        if let Some(sanity) = self.sanity {
            vars.insert("PUBLIC_SANITY_PROJECT_ID".to_string(), sanity.project_id.clone());
            vars.insert("PUBLIC_SANITY_DATASET".to_string(), sanity.dataset.clone());
        }
        vars
    }

    fn page_titles(&self) -> Value {
        let b = self.business;
        let home = self
            .mapped
            .map(|m| m.metadata.title.trim())
            .filter(|t| !t.is_empty() && !t.to_lowercase().contains("lorem"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} - {} à {}", b.business_name, b.business_type, b.ville));
        json!({
            "home": home,
            "about": format!("À propos - {}", b.business_name),
            "contact": format!("Contact - {} à {}", b.business_name, b.ville),
            "legal": format!("Mentions légales - {}", b.business_name),
        })
    }
}

/// Writes files relative to the project root
struct ProjectWriter {
    root: PathBuf,
    written: usize,
}

impl ProjectWriter {
    async fn write(&mut self, relative: &str, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        self.written += 1;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&mut self, relative: &str, value: &T) -> Result<()> {
        let mut text = serde_json::to_string_pretty(value)?;
        text.push('\n');
        self.write(relative, text).await
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterStats {
    pub total_conversions: usize,
    pub active_projects: usize,
}

pub struct AstroConverter {
    output_dir: PathBuf,
    projects: DashMap<String, PathBuf>,
    conversions: AtomicUsize,
}

impl AstroConverter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            projects: DashMap::new(),
            conversions: AtomicUsize::new(0),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn project_dir(&self, workflow_id: &str) -> PathBuf {
        self.output_dir.join(format!("astro-project-{}", workflow_id))
    }

    /// Write the project tree, replacing any previous conversion of the same workflow
    pub async fn convert(&self, request: &AstroConversionRequest<'_>) -> Result<AstroProject> {
        if request.workflow_id.trim().is_empty() {
            return Err(PipelineError::Validation("workflowId requis".to_string()));
        }
        if request.business.domain.trim().is_empty() {
            return Err(PipelineError::Validation("domaine requis pour le projet Astro".to_string()));
        }

        let started = Instant::now();
        let root = self.project_dir(request.workflow_id);
        if tokio::fs::try_exists(&root).await? {
            debug!(path = %root.display(), "Replacing previous Astro project");
            tokio::fs::remove_dir_all(&root).await?;
        }
        tokio::fs::create_dir_all(&root).await?;

        let project_name = request.project_name();
        let mut writer = ProjectWriter {
            root: root.clone(),
            written: 0,
        };

        let config_files = self.write_config(&mut writer, request, &project_name).await?;
        self.write_data(&mut writer, request).await?;
        let components = self.write_components(&mut writer, request).await?;
        let pages = self.write_pages(&mut writer, request).await?;
        if let Some(sanity) = request.sanity {
            self.write_sanity(&mut writer, sanity).await?;
        }
        self.write_performance(&mut writer, request, &project_name).await?;
        let deployment_script = self.write_deployment(&mut writer, request, &project_name).await?;

        let sanity_config = request
            .sanity
            .map(|s| {
                json!({
                    "projectId": s.project_id,
                    "dataset": s.dataset,
                    "apiVersion": s.api_version,
                    "useCdn": true,
                })
            })
            .unwrap_or_else(|| json!({}));

        let project = AstroProject {
            workflow_id: request.workflow_id.to_string(),
            project_name: project_name.clone(),
            ready: true,
            performance: PerformanceEstimate {
                estimated_build_time: estimate_build_time(components.len(), pages.len()),
                estimated_lighthouse_score: 95,
                optimizations: OPTIMIZATIONS.iter().map(|s| s.to_string()).collect(),
            },
            components,
            pages,
            config_files,
            deployment_ready: true,
            project_path: root.clone(),
            build_config: AstroBuildConfig {
                sanity_config,
                environment_vars: request.environment_vars(),
                cloudflare_config: json!({
                    "name": project_name,
                    "compatibility_date": "2023-10-30",
                    "pages_build_output_dir": "dist",
                }),
                deployment_script,
            },
            created_at: Utc::now(),
        };

        self.projects.insert(request.workflow_id.to_string(), root.clone());
        self.conversions.fetch_add(1, Ordering::Relaxed);

        info!(
            workflow_id = %request.workflow_id,
            path = %root.display(),
            components = project.components.len(),
            pages = project.pages.len(),
            files = writer.written,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Astro project written"
        );
        Ok(project)
    }

    async fn write_config(
        &self,
        writer: &mut ProjectWriter,
        request: &AstroConversionRequest<'_>,
        project_name: &str,
    ) -> Result<Vec<String>> {
        let colors = &request.business.colors;
        let site_url = request.site_url();
        let studio_url = request
            .sanity
            .map(|s| s.studio_url.clone())
            .unwrap_or_else(|| "https://www.sanity.io/manage".to_string());

        writer.write_json("package.json", &templates::package_json(project_name)).await?;
        writer
            .write("astro.config.mjs", render(templates::ASTRO_CONFIG, &[("SITE_URL", &site_url)]))
            .await?;
        writer.write_json("tsconfig.json", &templates::tsconfig()).await?;

        let mut env = request
            .environment_vars()
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v.replace('"', "'")))
            .collect::<Vec<_>>()
            .join("\n");
        env.push_str("\n\n# Optionnel\n# SANITY_TOKEN=\n# ANALYTICS_ID=\n");
        writer.write(".env.example", env).await?;

        writer
            .write(
                "wrangler.toml",
                render(templates::WRANGLER_CONFIG, &[("PROJECT_NAME", project_name)]),
            )
            .await?;
        writer
            .write(
                "netlify.toml",
                render(templates::NETLIFY_CONFIG, &[("STUDIO_URL", &studio_url)]),
            )
            .await?;
        writer
            .write(
                "tailwind.config.mjs",
                render(
                    templates::TAILWIND_CONFIG,
                    &[
                        ("PRIMARY", &colors.primary),
                        ("SECONDARY", &colors.secondary),
                        ("ACCENT", &colors.accent),
                    ],
                ),
            )
            .await?;

        Ok([
            "package.json",
            "astro.config.mjs",
            "tsconfig.json",
            ".env.example",
            "wrangler.toml",
            "netlify.toml",
            "tailwind.config.mjs",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect())
    }

    /// Page copy as JSON modules plus the shared `site` module
    async fn write_data(&self, writer: &mut ProjectWriter, request: &AstroConversionRequest<'_>) -> Result<()> {
        let pages = &request.content.pages;
        let seo = &request.content.seo;

        let site = json!({
            "name": request.business.business_name,
            "businessType": request.business.business_type,
            "city": request.business.ville,
            "postalCode": request.business.code_postal,
            "phone": request.form.telephone,
            "email": request.form.email,
            "address": request.form.adresse,
            "url": request.site_url(),
            "services": pages
                .services
                .iter()
                .filter(|s| !s.slug.is_empty())
                .map(|s| json!({ "slug": s.slug, "title": s.title }))
                .collect::<Vec<_>>(),
        });
        let site_json = serde_json::to_string_pretty(&site)?;
        writer
            .write(
                "src/lib/site.ts",
                render(templates::SITE_MODULE, &[("SITE_JSON", &site_json)]),
            )
            .await?;

        writer.write_json("src/data/home.json", &pages.home).await?;
        writer.write_json("src/data/about.json", &pages.about).await?;
        writer.write_json("src/data/contact.json", &pages.contact).await?;
        writer.write_json("src/data/legal.json", &pages.legal).await?;
        writer
            .write_json(
                "src/data/seo.json",
                &json!({
                    "titles": request.page_titles(),
                    "metaDescriptions": seo.meta_descriptions,
                    "schemas": seo.schemas,
                    "breadcrumbs": seo.breadcrumbs,
                    "sitemap": seo.sitemap,
                }),
            )
            .await?;
        for service in &pages.services {
            if service.slug.is_empty() {
                warn!(title = %service.title, "Service without slug skipped");
                continue;
            }
            writer
                .write_json(&format!("src/data/services/{}.json", service.slug), service)
                .await?;
        }

        let mut site_css = request.mapped.map(|m| m.css.clone()).unwrap_or_default();
        if !site_css.is_empty() {
            site_css.push('\n');
        }
        site_css.push_str(&branding::branding_css(
            &request.business.colors,
            &request.business.business_type,
        ));
        writer.write("src/styles/site.css", site_css).await
    }

    async fn write_components(
        &self,
        writer: &mut ProjectWriter,
        request: &AstroConversionRequest<'_>,
    ) -> Result<Vec<String>> {
        let primary = request.business.colors.primary.as_str();
        let mut components = Vec::with_capacity(COMPONENTS.len());
        for (name, path, template) in COMPONENTS {
            writer.write(path, render(template, &[("PRIMARY", primary)])).await?;
            components.push(name.to_string());
        }
        Ok(components)
    }

    async fn write_pages(&self, writer: &mut ProjectWriter, request: &AstroConversionRequest<'_>) -> Result<Vec<String>> {
        let mut pages = Vec::new();
        for (name, path, template) in STATIC_PAGES {
            writer.write(path, template).await?;
            pages.push(name.to_string());
        }
        for service in request.content.pages.services.iter().filter(|s| !s.slug.is_empty()) {
            writer
                .write(
                    &format!("src/pages/services/{}.astro", service.slug),
                    render(templates::SERVICE_PAGE, &[("SLUG", &service.slug)]),
                )
                .await?;
            pages.push(format!("services/{}", service.slug));
        }
        Ok(pages)
    }

    async fn write_sanity(&self, writer: &mut ProjectWriter, sanity: &SanityCredentials) -> Result<()> {
        writer
            .write(
                "src/lib/sanity/client.ts",
                render(
                    templates::SANITY_CLIENT,
                    &[
                        ("PROJECT_ID", &sanity.project_id),
                        ("DATASET", &sanity.dataset),
                        ("API_VERSION", &sanity.api_version),
                    ],
                ),
            )
            .await?;
        writer.write("src/lib/sanity/types.ts", templates::SANITY_TYPES).await?;
        writer.write("src/lib/sanity/queries.ts", templates::SANITY_QUERIES).await
    }

    async fn write_performance(
        &self,
        writer: &mut ProjectWriter,
        request: &AstroConversionRequest<'_>,
        project_name: &str,
    ) -> Result<()> {
        let colors = &request.business.colors;
        writer
            .write(
                "public/sw.js",
                render(templates::SERVICE_WORKER, &[("PROJECT_NAME", project_name)]),
            )
            .await?;
        writer
            .write(
                "src/styles/critical.css",
                render(
                    templates::CRITICAL_CSS,
                    &[
                        ("PRIMARY", &colors.primary),
                        ("SECONDARY", &colors.secondary),
                        ("ACCENT", &colors.accent),
                    ],
                ),
            )
            .await?;
        let description = format!(
            "{} professionnel à {}",
            utils::capitalize(&request.business.business_type),
            request.business.ville
        );
        writer
            .write_json(
                "public/manifest.json",
                &templates::manifest(&request.business.business_name, &description, &colors.primary),
            )
            .await?;
        writer
            .write("src/lib/image-optimizer.ts", templates::IMAGE_OPTIMIZER)
            .await
    }

    /// `deploy.sh` and the CI workflow; returns the script
    async fn write_deployment(
        &self,
        writer: &mut ProjectWriter,
        request: &AstroConversionRequest<'_>,
        project_name: &str,
    ) -> Result<String> {
        let script = render(
            templates::DEPLOY_SCRIPT,
            &[
                ("BUSINESS_NAME", &request.business.business_name),
                ("PROJECT_NAME", project_name),
                ("SITE_URL", &request.site_url()),
            ],
        );
        writer.write("deploy.sh", &script).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(writer.root.join("deploy.sh"), std::fs::Permissions::from_mode(0o755))
                .await?;
        }
        writer
            .write(
                ".github/workflows/deploy.yml",
                render(templates::GITHUB_WORKFLOW, &[("PROJECT_NAME", project_name)]),
            )
            .await?;
        Ok(script)
    }

    /// Remove the project directory of a workflow; `false` if there was none
    pub async fn cleanup(&self, workflow_id: &str) -> Result<bool> {
        self.projects.remove(workflow_id);
        let root = self.project_dir(workflow_id);
        if !tokio::fs::try_exists(&root).await? {
            return Ok(false);
        }
        tokio::fs::remove_dir_all(&root).await?;
        info!(workflow_id = %workflow_id, "Astro project removed");
        Ok(true)
    }

    pub fn usage_stats(&self) -> ConverterStats {
        ConverterStats {
            total_conversions: self.conversions.load(Ordering::Relaxed),
            active_projects: self.projects.len(),
        }
    }
}
