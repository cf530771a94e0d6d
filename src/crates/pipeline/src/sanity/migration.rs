//! Form data to Sanity documents.
//!
//! Every document is built locally first and then written with `createOrReplace`. A
//! failed write is logged and the built structure is still returned, so the Astro stage
//! can run from it.

use super::seed::{
    categorize_service, has_emergency_mode, local_keywords, sample_projects, sample_testimonials, tagline,
};
use super::setup::{ProjectBrief, SanityCredentials};
use crate::catalog::{default_services, features_for_business};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use platforms::SanityClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use utils::text::slugify;
use utils::JsonDir;

const MAX_SERVICES: usize = 6;
const MIN_CUSTOM_SERVICES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MigrationOptions {
    pub include_test_data: bool,
    pub generate_sample_content: bool,
    pub create_initial_pages: bool,
    pub setup_navigation: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            include_test_data: true,
            generate_sample_content: true,
            create_initial_pages: true,
            setup_navigation: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigratedData {
    pub settings: Value,
    pub services: Vec<Value>,
    pub testimonials: Vec<Value>,
    pub projects: Vec<Value>,
    pub pages: Vec<Value>,
    pub navigation: Option<Value>,
    pub seo_config: Value,
}

impl MigratedData {
    pub fn counts(&self) -> ContentCounts {
        ContentCounts {
            services_count: self.services.len(),
            testimonials_count: self.testimonials.len(),
            projects_count: self.projects.len(),
            pages_count: self.pages.len(),
        }
    }

    /// Every document with an `_id`, ready for a mutate call
    fn documents(&self) -> Vec<Value> {
        let mut docs = vec![self.settings.clone(), self.seo_config.clone()];
        docs.extend(self.services.iter().cloned());
        docs.extend(self.testimonials.iter().cloned());
        docs.extend(self.projects.iter().cloned());
        docs.extend(self.pages.iter().cloned());
        docs.extend(self.navigation.iter().cloned());
        docs
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCounts {
    pub services_count: usize,
    pub testimonials_count: usize,
    pub projects_count: usize,
    pub pages_count: usize,
}

/// Persisted under `migrations/{projectId}-migration.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    pub project_id: String,
    pub client_id: String,
    pub business_name: String,
    pub business_type: String,
    pub domain: String,
    pub migrated_at: DateTime<Utc>,
    pub counts: ContentCounts,
    pub navigation_configured: bool,
    pub documents_written: usize,
    pub write_errors: Vec<String>,
    pub status: String,
}

pub struct SanityDataMigration {
    client: Option<SanityClient>,
    summaries: JsonDir,
}

impl SanityDataMigration {
    pub fn new(client: Option<SanityClient>, summaries: JsonDir) -> Self {
        Self { client, summaries }
    }

    pub async fn migrate(
        &self,
        credentials: &SanityCredentials,
        brief: &ProjectBrief,
        options: MigrationOptions,
    ) -> Result<MigratedData> {
        info!(project_id = %credentials.project_id, business = %brief.business_name, "Migrating form data to Sanity");

        let data = build_documents(brief, options);
        debug!(
            services = data.services.len(),
            testimonials = data.testimonials.len(),
            projects = data.projects.len(),
            pages = data.pages.len(),
            "Documents prepared"
        );

        let (documents_written, write_errors) = self.write(credentials, data.documents()).await;

        let summary = MigrationSummary {
            project_id: credentials.project_id.clone(),
            client_id: brief.client_id.clone(),
            business_name: brief.business_name.clone(),
            business_type: brief.business_type.clone(),
            domain: brief.domain.clone(),
            migrated_at: Utc::now(),
            counts: data.counts(),
            navigation_configured: data.navigation.is_some(),
            documents_written,
            write_errors,
            status: "completed".to_string(),
        };
        self.summaries
            .write(&summary_key(&credentials.project_id), &summary)
            .await?;

        info!(
            project_id = %credentials.project_id,
            documents_written = documents_written,
            "Migration completed"
        );
        Ok(data)
    }

    /// Write documents with `createOrReplace`; returns the written count and the errors
    pub async fn write(&self, credentials: &SanityCredentials, documents: Vec<Value>) -> (usize, Vec<String>) {
        let client = match &self.client {
            Some(client) if !credentials.simulated => client,
            _ => {
                debug!(project_id = %credentials.project_id, "No Sanity API access, documents kept local");
                return (0, Vec::new());
            }
        };

        let count = documents.len();
        let mutations = documents
            .into_iter()
            .map(|doc| json!({ "createOrReplace": doc }))
            .collect();

        match client
            .mutate(&credentials.project_id, &credentials.dataset, &credentials.token, mutations)
            .await
        {
            Ok(_) => (count, Vec::new()),
            Err(e) => {
                warn!(project_id = %credentials.project_id, error = %e, "Sanity write failed, structure kept");
                (0, vec![e.to_string()])
            }
        }
    }

    pub async fn load_summary(&self, project_id: &str) -> Result<Option<MigrationSummary>> {
        Ok(self.summaries.read(&summary_key(project_id)).await?)
    }
}

fn summary_key(project_id: &str) -> String {
    format!("{}-migration", project_id)
}

/// Build every document for a project
pub fn build_documents(brief: &ProjectBrief, options: MigrationOptions) -> MigratedData {
    let sample = options.generate_sample_content;
    MigratedData {
        settings: settings_document(brief),
        services: services(brief),
        testimonials: if sample { testimonials(brief) } else { Vec::new() },
        projects: if sample { projects(brief) } else { Vec::new() },
        pages: if options.create_initial_pages { pages(brief) } else { Vec::new() },
        navigation: options.setup_navigation.then(navigation),
        seo_config: seo_config(brief),
    }
}

fn settings_document(brief: &ProjectBrief) -> Value {
    let form = &brief.form;
    let city = brief.city();
    let description = form
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "{} est votre {} de confiance à {}. Nous proposons des services de qualité avec des tarifs transparents et des délais respectés. Devis gratuit et intervention rapide pour tous vos travaux de {}.",
                brief.business_name,
                brief.business_type.to_lowercase(),
                city,
                brief.business_type.to_lowercase()
            )
        });
    let hour = |key: &str, default: &str| form.extra_str(key).unwrap_or(default).to_string();
    let now = Utc::now().to_rfc3339();

    json!({
        "_type": "settings",
        "_id": "siteSettings",
        "businessInfo": {
            "businessName": brief.business_name,
            "legalName": form.extra_str("raisonSociale").unwrap_or(&brief.business_name),
            "businessType": brief.business_type,
            "tagline": form.slogan.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(tagline(&brief.business_type)),
            "description": description,
        },
        "contact": {
            "phone": form.telephone,
            "mobile": form.extra_str("mobile").unwrap_or_default(),
            "emergencyPhone": form.extra_str("urgence").or_else(|| form.extra_str("phone24h")).unwrap_or_default(),
            "email": form.email,
            "contactEmail": form.extra_str("emailContact").unwrap_or(&form.email),
            "website": format!("https://{}", brief.domain),
        },
        "address": {
            "street": form.adresse,
            "city": form.ville,
            "postalCode": form.code_postal,
            "region": form.extra_str("region").unwrap_or_default(),
            "country": "France",
        },
        "hours": {
            "monday": hour("horairesLundi", "8h00-18h00"),
            "tuesday": hour("horairesMardi", "8h00-18h00"),
            "wednesday": hour("horairesMercredi", "8h00-18h00"),
            "thursday": hour("horairesJeudi", "8h00-18h00"),
            "friday": hour("horairesVendredi", "8h00-18h00"),
            "saturday": hour("horairesSamedi", "8h00-12h00"),
            "sunday": hour("horairesDimanche", "Fermé"),
            "emergency": if form.extra_str("urgence").is_some() { "24h/7j sur appel" } else { "Non disponible" },
        },
        "legal": {
            "siret": form.siret.as_deref().unwrap_or_default(),
            "rcs": form.extra_str("rcs").unwrap_or_default(),
            "vatNumber": form.extra_str("tva").unwrap_or_default(),
        },
        "branding": { "colors": brief.colors },
        "socialMedia": {
            "facebook": form.extra_str("facebook").unwrap_or_default(),
            "instagram": form.extra_str("instagram").unwrap_or_default(),
            "linkedin": form.extra_str("linkedin").unwrap_or_default(),
            "youtube": form.extra_str("youtube").unwrap_or_default(),
        },
        "seo": {
            "siteTitle": format!("{} - {} à {}", brief.business_name, brief.business_type, city),
            "siteDescription": format!(
                "{} professionnel à {}. Devis gratuit, intervention rapide. Contactez {} pour tous vos travaux.",
                brief.business_type, city, brief.business_name
            ),
        },
        "features": {
            "onlineBooking": true,
            "quoteCalculator": true,
            "testimonials": true,
            "projectGallery": true,
            "blog": false,
            "multiLanguage": false,
            "emergencyMode": has_emergency_mode(&brief.business_type),
            "catalog": features_for_business(&brief.business_type),
        },
        "createdAt": now,
        "updatedAt": now,
    })
}

/// Custom services from the form, topped up from the catalog when fewer than three
fn services(brief: &ProjectBrief) -> Vec<Value> {
    let form = &brief.form;
    let business = brief.business_type.to_lowercase();
    let now = Utc::now().to_rfc3339();
    let areas = vec![form.ville.clone()];

    let mut services: Vec<Value> = form
        .services
        .iter()
        .filter(|name| !name.trim().is_empty())
        .take(MAX_SERVICES)
        .enumerate()
        .map(|(i, name)| {
            let slug = slugify(name, 60);
            json!({
                "_type": "service",
                "_id": format!("service-{}", slug),
                "name": name,
                "slug": { "current": slug },
                "shortDescription": format!("Service de {}", name),
                "fullDescription": [{
                    "_type": "block",
                    "children": [{
                        "_type": "span",
                        "text": format!("Service professionnel de {} avec garantie et matériaux fournis.", business),
                    }],
                }],
                "businessType": brief.business_type,
                "category": categorize_service(name, &business),
                "pricing": { "type": "quote", "unit": "euro", "displayText": "Sur devis" },
                "areas": areas,
                "featured": i < 3,
                "order": i + 1,
                "status": "active",
                "createdAt": now,
            })
        })
        .collect();

    if services.len() < MIN_CUSTOM_SERVICES {
        for (i, base) in default_services(&brief.business_type).iter().enumerate() {
            if services.len() >= MAX_SERVICES {
                break;
            }
            let slug = slugify(base.name, 60);
            let display = match (base.pricing.as_str(), base.amount) {
                ("fixed", Some(amount)) => format!("{}€", amount),
                ("starting", Some(amount)) => format!("À partir de {}€", amount),
                ("free", _) => "Gratuit".to_string(),
                _ => "Sur devis".to_string(),
            };
            services.push(json!({
                "_type": "service",
                "_id": format!("base-service-{}", slug),
                "name": base.name,
                "slug": { "current": slug },
                "shortDescription": base.description,
                "category": base.category,
                "pricing": {
                    "type": base.pricing,
                    "amount": base.amount,
                    "unit": "euro",
                    "displayText": display,
                },
                "urgency": { "available": base.urgency },
                "businessType": brief.business_type,
                "areas": areas,
                "featured": base.featured,
                "order": i + 1,
                "status": "active",
                "createdAt": now,
            }));
        }
    }

    services
}

fn testimonials(brief: &ProjectBrief) -> Vec<Value> {
    let now = Utc::now();
    sample_testimonials(&brief.business_type, brief.city())
        .into_iter()
        .enumerate()
        .map(|(i, mut t)| {
            if let Some(obj) = t.as_object_mut() {
                obj.insert("_type".into(), json!("testimonial"));
                obj.insert("_id".into(), json!(format!("testimonial-{}", i + 1)));
                obj.insert("businessType".into(), json!([brief.business_type]));
                obj.insert("verified".into(), json!(true));
                obj.insert("source".into(), json!("generated"));
                obj.insert("status".into(), json!("published"));
                obj.insert(
                    "createdAt".into(),
                    json!((now - Duration::weeks(i as i64)).to_rfc3339()),
                );
                obj.insert("publishedAt".into(), json!(now.to_rfc3339()));
            }
            t
        })
        .collect()
}

fn projects(brief: &ProjectBrief) -> Vec<Value> {
    let now = Utc::now();
    sample_projects(&brief.business_type, brief.city())
        .into_iter()
        .enumerate()
        .map(|(i, mut p)| {
            if let Some(obj) = p.as_object_mut() {
                obj.insert("_type".into(), json!("project"));
                obj.insert("_id".into(), json!(format!("project-{}", i + 1)));
                obj.insert("businessType".into(), json!(brief.business_type));
                obj.insert("status".into(), json!("published"));
                obj.insert("featured".into(), json!(i == 0));
                obj.insert(
                    "createdAt".into(),
                    json!((now - Duration::days(30 * (i as i64 + 1))).to_rfc3339()),
                );
                obj.insert("publishedAt".into(), json!(now.to_rfc3339()));
            }
            p
        })
        .collect()
}

fn pages(brief: &ProjectBrief) -> Vec<Value> {
    let name = &brief.business_name;
    let trade = &brief.business_type;
    let lower = trade.to_lowercase();
    let now = Utc::now().to_rfc3339();

    let pages = [
        (
            "page-home",
            format!("Accueil - {}", name),
            "/",
            "home",
            format!("{} - {} professionnel", name, trade),
            format!("{} professionnel. Devis gratuit, intervention rapide. Contactez-nous !", trade),
            vec!["hero", "services", "about", "testimonials", "contact"],
        ),
        (
            "page-services",
            format!("Nos services de {}", trade),
            "/services",
            "services",
            format!("Services de {} - {}", trade, name),
            format!("Découvrez tous nos services de {}. Devis gratuit et intervention rapide.", lower),
            vec!["services-list", "pricing", "guarantees"],
        ),
        (
            "page-about",
            "À propos".to_string(),
            "/a-propos",
            "about",
            format!("À propos - {}", name),
            format!("Découvrez {}, {} professionnel avec de nombreuses années d'expérience.", name, trade),
            vec!["about-story", "team", "certifications"],
        ),
        (
            "page-contact",
            "Contact".to_string(),
            "/contact",
            "contact",
            format!("Contact - {}", name),
            format!("Contactez {} pour tous vos besoins en {}. Devis gratuit.", name, lower),
            vec!["contact-form", "map", "hours"],
        ),
    ];

    pages
        .into_iter()
        .map(|(id, title, slug, template, seo_title, seo_description, sections)| {
            json!({
                "_type": "page",
                "_id": id,
                "title": title,
                "slug": { "current": slug },
                "template": template,
                "seo": { "title": seo_title, "description": seo_description },
                "sections": sections,
                "status": "published",
                "createdAt": now,
                "updatedAt": now,
            })
        })
        .collect()
}

fn navigation() -> Value {
    let item = |title: &str, slug: &str, order: u32| json!({ "title": title, "slug": { "current": slug }, "order": order });
    let link = |title: &str, url: &str| json!({ "title": title, "url": url });

    json!({
        "_type": "navigation",
        "_id": "mainNavigation",
        "items": [
            item("Accueil", "/", 1),
            item("Services", "/services", 2),
            item("Réalisations", "/realisations", 3),
            item("À propos", "/a-propos", 4),
            item("Contact", "/contact", 5),
        ],
        "footer": {
            "sections": [
                {
                    "title": "Services",
                    "links": [link("Tous nos services", "/services"), link("Urgences 24h/7j", "/urgences"), link("Devis gratuit", "/devis")],
                },
                {
                    "title": "Entreprise",
                    "links": [link("À propos", "/a-propos"), link("Nos réalisations", "/realisations"), link("Avis clients", "/avis")],
                },
                {
                    "title": "Contact",
                    "links": [link("Nous contacter", "/contact"), link("Zones d'intervention", "/zones"), link("Horaires", "/horaires")],
                },
            ],
        },
    })
}

fn seo_config(brief: &ProjectBrief) -> Value {
    let form = &brief.form;
    let city = form.ville.trim();
    let business = brief.business_type.to_lowercase();

    json!({
        "_type": "seoConfig",
        "_id": "globalSEO",
        "sitemap": { "enabled": true, "changefreq": "weekly", "priority": 0.8 },
        "robots": {
            "index": true,
            "follow": true,
            "sitemap": format!("https://{}/sitemap.xml", brief.domain),
        },
        "schema": {
            "organization": {
                "@type": "LocalBusiness",
                "name": brief.business_name,
                "description": format!("{} professionnel à {}", business, city),
                "address": {
                    "@type": "PostalAddress",
                    "streetAddress": form.adresse,
                    "addressLocality": city,
                    "postalCode": form.code_postal,
                    "addressCountry": "FR",
                },
                "telephone": form.telephone,
                "url": format!("https://{}", brief.domain),
            },
        },
        "localSEO": {
            "businessName": brief.business_name,
            "businessType": business,
            "city": city,
            "region": form.extra_str("region").unwrap_or_default(),
            "serviceAreas": [city],
            "keywords": local_keywords(&business, city),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientFormData, Workflow};
    use tempfile::TempDir;

    fn brief(services: &[&str]) -> ProjectBrief {
        let form: ClientFormData = serde_json::from_value(json!({
            "businessName": "Plomberie Dupont",
            "businessType": "plombier",
            "email": "dupont@example.fr",
            "telephone": "0600000000",
            "ville": "Lyon",
            "services": services,
        }))
        .unwrap();
        let workflow = Workflow::new(form).with_id("workflow-9");
        ProjectBrief::from_workflow(&workflow, "classique", "awema.fr")
    }

    #[test]
    fn test_services_topped_up_from_catalog() {
        let data = build_documents(&brief(&["Recherche de fuite"]), MigrationOptions::default());
        assert!(data.services.len() > 1);
        assert!(data.services.len() <= MAX_SERVICES);
        assert_eq!(data.services[0]["name"], "Recherche de fuite");
        assert_eq!(data.services[0]["featured"], true);
        assert!(data.services.iter().all(|s| s["_id"].is_string()));
    }

    #[test]
    fn test_enough_custom_services_are_kept_alone() {
        let data = build_documents(&brief(&["A", "B", "C", "D"]), MigrationOptions::default());
        assert_eq!(data.services.len(), 4);
        assert_eq!(data.services[3]["featured"], false);
    }

    #[test]
    fn test_options_disable_sections() {
        let options = MigrationOptions {
            generate_sample_content: false,
            create_initial_pages: false,
            setup_navigation: false,
            ..Default::default()
        };
        let data = build_documents(&brief(&[]), options);
        assert!(data.testimonials.is_empty());
        assert!(data.projects.is_empty());
        assert!(data.pages.is_empty());
        assert!(data.navigation.is_none());

        let full = build_documents(&brief(&[]), MigrationOptions::default());
        assert_eq!(full.pages.len(), 4);
        assert_eq!(full.testimonials.len(), 2);
        assert_eq!(full.counts().projects_count, 1);
    }

    #[tokio::test]
    async fn test_migration_summary_saved_without_api() {
        let tmp = TempDir::new().unwrap();
        let migration = SanityDataMigration::new(None, JsonDir::open(tmp.path()).await.unwrap());
        let creds = SanityCredentials::new("proj-1", "tok", true);

        let data = migration
            .migrate(&creds, &brief(&[]), MigrationOptions::default())
            .await
            .unwrap();
        assert_eq!(data.settings["_id"], "siteSettings");

        let summary = migration.load_summary("proj-1").await.unwrap().unwrap();
        assert_eq!(summary.documents_written, 0);
        assert_eq!(summary.counts.pages_count, 4);
        assert!(tmp.path().join("proj-1-migration.json").exists());
    }
}
