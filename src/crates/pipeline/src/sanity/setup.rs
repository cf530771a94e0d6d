//! Sanity project provisioning.
//!
//! One project per client: management API project and robot token, schema set for the
//! trade, initial documents and sync webhooks. When the management API is unavailable
//! the project is simulated with a local id and a test token, so the rest of the
//! pipeline can still run; simulated projects never receive data writes.

use super::seed::{project_schemas, DEFAULT_HOURS};
use crate::catalog::colors_for_business;
use crate::domain::{ClientFormData, Workflow};
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use platforms::SanityClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use utils::text::slugify;
use utils::JsonDir;

pub const DATASET: &str = "production";
pub const API_VERSION: &str = "2023-01-01";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

/// Client data needed to provision a CMS project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBrief {
    pub client_id: String,
    pub business_name: String,
    pub business_type: String,
    pub selected_template: String,
    pub form: ClientFormData,
    pub domain: String,
    pub logo_url: Option<String>,
    pub colors: SiteColors,
}

impl ProjectBrief {
    /// Brief for a workflow; without a custom domain the site lives under `subdomain_root`
    pub fn from_workflow(workflow: &Workflow, template: &str, subdomain_root: &str) -> Self {
        let form = &workflow.client;
        let defaults = colors_for_business(&form.business_type);
        let domain = form
            .custom_domain()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.{}", slugify(&form.business_name, 50), subdomain_root));

        Self {
            client_id: workflow.id.clone(),
            business_name: form.business_name.clone(),
            business_type: form.business_type.clone(),
            selected_template: template.to_string(),
            form: form.clone(),
            domain,
            logo_url: form.logo_url.clone(),
            colors: SiteColors {
                primary: form.primary_color().unwrap_or(defaults.primary).to_string(),
                secondary: form.secondary_color().unwrap_or(defaults.secondary).to_string(),
                accent: form.accent_color().unwrap_or(defaults.accent).to_string(),
            },
        }
    }

    pub fn city(&self) -> &str {
        let city = self.form.ville.trim();
        if city.is_empty() {
            "votre région"
        } else {
            city
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanityCredentials {
    pub project_id: String,
    pub dataset: String,
    pub token: String,
    pub api_version: String,
    pub studio_url: String,
    pub cdn_url: String,
    /// Project and token were generated locally
    #[serde(default)]
    pub simulated: bool,
}

impl SanityCredentials {
    pub fn new(project_id: impl Into<String>, token: impl Into<String>, simulated: bool) -> Self {
        let project_id = project_id.into();
        Self {
            dataset: DATASET.to_string(),
            token: token.into(),
            api_version: API_VERSION.to_string(),
            studio_url: format!("https://{}.sanity.studio", project_id),
            cdn_url: format!(
                "https://{}.api.sanity.io/v2021-10-21/data/query/{}",
                project_id, DATASET
            ),
            project_id,
            simulated,
        }
    }
}

/// Persisted record of a provisioned project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanityProjectSetup {
    pub brief: ProjectBrief,
    pub credentials: SanityCredentials,
    pub schemas: Vec<String>,
    pub initial_data: Value,
    pub webhooks: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    pub exists: bool,
    pub configured: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_id: String,
    pub business_name: String,
    pub business_type: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

pub struct SanitySetup {
    client: Option<SanityClient>,
    projects: JsonDir,
    central_webhook_url: String,
    retry: RetryConfig,
}

impl SanitySetup {
    pub fn new(client: Option<SanityClient>, projects: JsonDir, central_webhook_url: impl Into<String>) -> Self {
        if client.is_none() {
            warn!("Sanity management token missing, projects will be simulated");
        }
        Self {
            client,
            projects,
            central_webhook_url: central_webhook_url.into(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> Option<&SanityClient> {
        self.client.as_ref()
    }

    /// Provision a complete project and persist its record
    pub async fn setup_project(&self, brief: &ProjectBrief) -> Result<SanityProjectSetup> {
        info!(client_id = %brief.client_id, business = %brief.business_name, "Setting up Sanity project");

        let credentials = self.create_credentials(brief).await;
        let schemas = project_schemas(&brief.business_type);
        debug!(project_id = %credentials.project_id, schemas = ?schemas, "Schemas selected");

        let initial_data = initial_data(brief);
        self.import_form_data(&credentials, brief, &initial_data).await;

        let webhooks = self.setup_webhooks(&credentials, brief).await;

        let setup = SanityProjectSetup {
            brief: brief.clone(),
            credentials,
            schemas,
            initial_data,
            webhooks,
            created_at: Utc::now(),
            status: "active".to_string(),
            last_sync: None,
        };

        self.projects
            .write(&setup.credentials.project_id, &setup)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to persist Sanity project");
                PipelineError::General(format!(
                    "Échec configuration Sanity pour {}: {}",
                    brief.business_name, e
                ))
            })?;

        info!(
            project_id = %setup.credentials.project_id,
            simulated = setup.credentials.simulated,
            webhooks = setup.webhooks.len(),
            "Sanity project ready"
        );
        Ok(setup)
    }

    async fn create_credentials(&self, brief: &ProjectBrief) -> SanityCredentials {
        let Some(client) = &self.client else {
            return simulated_credentials(&fallback_project_id());
        };

        let display_name = format!("{} - {}", brief.business_name, brief.business_type);
        let metadata = json!({
            "businessType": brief.business_type,
            "template": brief.selected_template,
            "domain": brief.domain,
            "createdBy": "awema-auto-setup",
            "clientId": brief.client_id,
        });

        let created = retry_with_backoff(&self.retry, "sanity_create_project", || {
            let (name, meta) = (display_name.as_str(), metadata.clone());
            async move { Ok(client.create_project(name, meta).await?) }
        })
        .await;

        let project_id = match created {
            Ok(project) => project.id,
            Err(e) => {
                let id = fallback_project_id();
                warn!(error = %e, fallback_id = %id, "Sanity project creation failed, using fallback id");
                return simulated_credentials(&id);
            }
        };

        let label = format!("awema-auto-token-{}", Utc::now().timestamp_millis());
        match client.create_token(&project_id, &label, "editor").await {
            Ok(token) => SanityCredentials::new(project_id, token.key, false),
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "Sanity token creation failed, using test token");
                let token = fallback_token(&project_id);
                SanityCredentials::new(project_id, token, true)
            }
        }
    }

    async fn import_form_data(&self, credentials: &SanityCredentials, brief: &ProjectBrief, data: &Value) {
        let Some(client) = self.client.as_ref().filter(|_| !credentials.simulated) else {
            debug!(project_id = %credentials.project_id, "Simulated project, form import skipped");
            return;
        };

        let mut documents = vec![
            with_id(data["settings"].clone(), "siteSettings"),
            with_id(data["contact"].clone(), "contactInfo"),
            with_id(data["seo"].clone(), "seoDefaults"),
        ];
        if let Some(pages) = data["pages"].as_array() {
            for page in pages {
                let id = format!("page-{}", page["slug"].as_str().unwrap_or("page"));
                documents.push(with_id(page.clone(), &id));
            }
        }

        let mutations = documents
            .into_iter()
            .map(|doc| json!({ "createOrReplace": doc }))
            .collect();
        if let Err(e) = client
            .mutate(&credentials.project_id, &credentials.dataset, &credentials.token, mutations)
            .await
        {
            warn!(project_id = %credentials.project_id, business = %brief.business_name, error = %e, "Form data import failed");
        }
    }

    async fn setup_webhooks(&self, credentials: &SanityCredentials, brief: &ProjectBrief) -> Vec<String> {
        let Some(client) = self.client.as_ref().filter(|_| !credentials.simulated) else {
            return Vec::new();
        };

        let urls = [
            format!("https://{}/api/webhooks/sanity", brief.domain),
            format!("{}/{}", self.central_webhook_url.trim_end_matches('/'), brief.client_id),
        ];

        let mut hooks = Vec::new();
        for url in &urls {
            match client.create_webhook(&credentials.project_id, url).await {
                Ok(id) => hooks.push(id),
                Err(e) => warn!(url = %url, error = %e, "Webhook creation failed"),
            }
        }
        hooks
    }

    pub async fn load_project(&self, project_id: &str) -> Result<Option<SanityProjectSetup>> {
        Ok(self.projects.read(project_id).await?)
    }

    /// Record a content sync on the project
    pub async fn touch_project(&self, project_id: &str) -> Result<()> {
        if let Some(mut setup) = self.load_project(project_id).await? {
            setup.last_sync = Some(Utc::now());
            self.projects.write(project_id, &setup).await?;
        }
        Ok(())
    }

    pub async fn remove_project(&self, project_id: &str) -> Result<bool> {
        Ok(self.projects.remove(project_id).await?)
    }

    pub async fn project_status(&self, project_id: &str) -> ProjectStatus {
        match self.load_project(project_id).await {
            Ok(Some(setup)) => ProjectStatus {
                exists: true,
                configured: true,
                last_sync: setup.last_sync,
                errors: Vec::new(),
            },
            Ok(None) => ProjectStatus {
                exists: false,
                configured: false,
                last_sync: None,
                errors: vec![format!("Projet {} inconnu", project_id)],
            },
            Err(e) => ProjectStatus {
                exists: false,
                configured: false,
                last_sync: None,
                errors: vec![e.to_string()],
            },
        }
    }

    /// Every persisted project, newest first
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        let mut projects: Vec<ProjectSummary> = self
            .projects
            .list::<SanityProjectSetup>()
            .await?
            .into_iter()
            .map(|setup| ProjectSummary {
                project_id: setup.credentials.project_id,
                business_name: setup.brief.business_name,
                business_type: setup.brief.business_type,
                domain: setup.brief.domain,
                created_at: setup.created_at,
                status: setup.status,
            })
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.projects.root().to_path_buf()
    }
}

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

fn fallback_project_id() -> String {
    format!("awema-{}-{}", Utc::now().timestamp_millis(), random_suffix(6))
}

fn fallback_token(project_id: &str) -> String {
    format!("sk_test_{}_{}", project_id, random_suffix(13))
}

fn simulated_credentials(project_id: &str) -> SanityCredentials {
    SanityCredentials::new(project_id, fallback_token(project_id), true)
}

fn with_id(mut doc: Value, id: &str) -> Value {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("_id".to_string(), Value::String(id.to_string()));
    }
    doc
}

/// Services with prices taken from the form when the client gave them
fn form_services(form: &ClientFormData, business_type: &str) -> Vec<Value> {
    let price = |key: &str, default: &str| form.extra_str(key).unwrap_or(default).to_string();
    let entries: Vec<(&str, String, bool)> = match crate::catalog::normalize_business_type(business_type).as_str() {
        "plombier" => vec![
            ("Dépannage urgence 24h/7j", price("prixDepannage", "80€"), true),
            ("Installation chauffe-eau", price("prixChauffeEau", "150€"), true),
            ("Débouchage canalisations", price("prixDebouchage", "90€"), false),
        ],
        "electricien" => vec![
            ("Installation électrique", price("prixInstallation", "120€"), true),
            ("Domotique connectée", price("prixDomotique", "200€"), true),
            ("Mise aux normes", price("prixNormes", "180€"), false),
        ],
        "menuisier" => vec![
            ("Aménagement sur-mesure", price("prixSurMesure", "Sur devis"), true),
            ("Rénovation menuiseries", price("prixRenovation", "Sur devis"), true),
            ("Installation parquet", price("prixParquet", "45€/m²"), false),
        ],
        _ => vec![
            ("Service principal", "Sur devis".to_string(), true),
            ("Devis gratuit", "Gratuit".to_string(), true),
        ],
    };
    entries
        .into_iter()
        .map(|(name, price, featured)| json!({ "name": name, "price": price, "featured": featured }))
        .collect()
}

/// Settings, services, contact, SEO and page documents built from the form
pub fn initial_data(brief: &ProjectBrief) -> Value {
    let form = &brief.form;
    let business_type = brief.business_type.as_str();
    let city = brief.city();

    let contact = json!({
        "_type": "contactInfo",
        "phone": form.telephone,
        "email": form.email,
        "address": form.adresse,
        "city": form.ville,
        "postalCode": form.code_postal,
        "hours": form.horaires.as_deref().filter(|h| !h.trim().is_empty()).unwrap_or(DEFAULT_HOURS),
        "emergencyPhone": form.extra_str("urgence").or_else(|| form.extra_str("phone24h")).unwrap_or_default(),
        "siret": form.siret.as_deref().unwrap_or_default(),
        "rcs": form.extra_str("rcs").unwrap_or_default(),
    });

    let seo = json!({
        "_type": "seoConfig",
        "title": format!("{} - {} à {}", brief.business_name, business_type, city),
        "description": format!(
            "{} professionnel à {}. Devis gratuit, intervention rapide. Contactez {} pour tous vos travaux de {}.",
            business_type, city, brief.business_name, business_type.to_lowercase()
        ),
        "keywords": [
            business_type.to_lowercase(),
            city.to_lowercase(),
            "professionnel",
            "devis gratuit",
            "intervention rapide",
        ],
        "ogImage": brief.logo_url.as_deref().unwrap_or_default(),
        "structured": {
            "@type": "LocalBusiness",
            "name": brief.business_name,
            "description": format!("{} professionnel à {}", business_type, city),
        },
    });

    json!({
        "settings": {
            "_type": "settings",
            "businessName": brief.business_name,
            "businessType": business_type,
            "domain": brief.domain,
            "colors": brief.colors,
            "logo": brief.logo_url,
            "createdAt": Utc::now().to_rfc3339(),
        },
        "services": form_services(form, business_type),
        "contact": contact,
        "seo": seo,
        "pages": [
            {
                "_type": "page",
                "slug": "accueil",
                "title": format!("Accueil - {}", brief.business_name),
                "template": "home",
                "sections": ["hero", "services", "about", "testimonials", "contact"],
            },
            {
                "_type": "page",
                "slug": "services",
                "title": format!("Nos services de {}", business_type),
                "template": "services",
                "sections": ["services-list", "pricing", "guarantees"],
            },
            {
                "_type": "page",
                "slug": "contact",
                "title": "Nous contacter",
                "template": "contact",
                "sections": ["contact-form", "map", "hours"],
            },
        ],
    })
}
