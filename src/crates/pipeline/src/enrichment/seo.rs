//! Meta descriptions, JSON-LD, breadcrumbs and sitemap entries.

use super::content::{
    Breadcrumb, EnrichmentRequest, PreviewRequest, SeoContent, SeoSchemas, ServicePage,
    SitemapEntry,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const HOME_PRIORITY: f32 = 1.0;
pub const SERVICES_INDEX_PRIORITY: f32 = 0.8;
pub const SERVICE_PAGE_PRIORITY: f32 = 0.9;
pub const OTHER_PRIORITY: f32 = 0.7;

/// Five local search phrases for the trade and city
pub fn local_keywords(business_type: &str, ville: &str) -> Vec<String> {
    vec![
        format!("{business_type} {ville}"),
        format!("{business_type} professionnel {ville}"),
        format!("entreprise {business_type} {ville}"),
        format!("artisan {business_type} {ville}"),
        format!("dépannage {business_type} {ville}"),
    ]
}

pub fn preview_keywords(request: &PreviewRequest) -> Vec<String> {
    local_keywords(&request.business_type, &request.ville)
}

pub fn local_business_schema(request: &EnrichmentRequest) -> Value {
    let form = &request.form;
    let mut address = json!({
        "@type": "PostalAddress",
        "addressLocality": request.ville,
        "addressCountry": "FR"
    });
    if let Some(cp) = &request.code_postal {
        address["postalCode"] = json!(cp);
    }
    if !form.adresse.trim().is_empty() {
        address["streetAddress"] = json!(form.adresse.trim());
    }

    let mut schema = json!({
        "@context": "https://schema.org",
        "@type": "LocalBusiness",
        "name": request.business_name,
        "description": format!("{} professionnel à {}", request.business_type, request.ville),
        "address": address,
        "telephone": form.telephone,
        "email": form.email,
        "url": request.base_url()
    });
    if let Some(logo) = form.logo_url.as_deref() {
        schema["logo"] = json!(logo);
    }
    schema
}

pub fn organization_schema(request: &EnrichmentRequest) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": request.business_name,
        "description": format!("{} à {}", request.business_type, request.ville),
        "url": request.base_url()
    })
}

pub fn breadcrumb_schema(base_url: &str) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": [{
            "@type": "ListItem",
            "position": 1,
            "name": "Accueil",
            "item": base_url
        }]
    })
}

fn crumb(name: &str, url: String) -> Breadcrumb {
    Breadcrumb {
        name: name.to_string(),
        url,
    }
}

fn sitemap_entry(url: String, changefreq: &str, priority: f32, lastmod: &str) -> SitemapEntry {
    SitemapEntry {
        url,
        lastmod: lastmod.to_string(),
        changefreq: changefreq.to_string(),
        priority,
    }
}

/// SEO block for the whole site, including one entry per service page.
pub fn seo_content(request: &EnrichmentRequest, services: &[ServicePage]) -> SeoContent {
    let base_url = request.base_url();
    let name = &request.business_name;
    let metier = &request.business_type;
    let ville = &request.ville;
    let lastmod = Utc::now().to_rfc3339();

    let mut meta_descriptions = BTreeMap::new();
    meta_descriptions.insert(
        "home".to_string(),
        format!("{name} - {metier} professionnel à {ville}. Devis gratuit, intervention rapide. ✓ Qualité ✓ Garantie ✓ {ville}"),
    );
    meta_descriptions.insert(
        "about".to_string(),
        format!("Découvrez {name}, votre {metier} de confiance à {ville}. Expertise locale et savoir-faire artisanal depuis plusieurs années."),
    );
    meta_descriptions.insert(
        "contact".to_string(),
        format!("Contactez {name} à {ville}. {metier} professionnel, devis gratuit, intervention rapide dans tout le secteur."),
    );

    let home = crumb("Accueil", base_url.clone());
    let mut breadcrumbs = BTreeMap::new();
    breadcrumbs.insert("home".to_string(), vec![home.clone()]);
    breadcrumbs.insert(
        "about".to_string(),
        vec![home.clone(), crumb("À propos", format!("{base_url}/a-propos"))],
    );
    breadcrumbs.insert(
        "contact".to_string(),
        vec![home.clone(), crumb("Contact", format!("{base_url}/contact"))],
    );

    let mut sitemap = vec![
        sitemap_entry(base_url.clone(), "weekly", HOME_PRIORITY, &lastmod),
        sitemap_entry(format!("{base_url}/services"), "weekly", SERVICES_INDEX_PRIORITY, &lastmod),
    ];

    for service in services {
        if !service.meta_description.is_empty() {
            meta_descriptions.insert(service.slug.clone(), service.meta_description.clone());
        }
        let url = format!("{base_url}/services/{}", service.slug);
        breadcrumbs.insert(
            service.slug.clone(),
            vec![
                home.clone(),
                crumb("Services", format!("{base_url}/services")),
                crumb(&service.title, url.clone()),
            ],
        );
        sitemap.push(sitemap_entry(url, "monthly", SERVICE_PAGE_PRIORITY, &lastmod));
    }

    sitemap.push(sitemap_entry(format!("{base_url}/a-propos"), "monthly", OTHER_PRIORITY, &lastmod));
    sitemap.push(sitemap_entry(format!("{base_url}/contact"), "monthly", OTHER_PRIORITY, &lastmod));

    let local_business = local_business_schema(request);

    SeoContent {
        meta_descriptions,
        schemas: SeoSchemas {
            local_business: local_business.clone(),
            organization: organization_schema(request),
            breadcrumb_list: breadcrumb_schema(&base_url),
        },
        local_business,
        breadcrumbs,
        sitemap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientFormData;
    use crate::enrichment::fallback;

    #[test]
    fn test_local_keywords() {
        let keywords = local_keywords("plombier", "Lyon");
        assert_eq!(keywords.len(), 5);
        assert_eq!(keywords[0], "plombier Lyon");
        assert_eq!(keywords[4], "dépannage plombier Lyon");
    }

    #[test]
    fn test_sitemap_priorities() {
        let form = ClientFormData {
            business_name: "Dupont".to_string(),
            business_type: "plombier".to_string(),
            ville: "Lyon".to_string(),
            code_postal: "69001".to_string(),
            ..Default::default()
        };
        let request = EnrichmentRequest::from_form(&form);
        let services = vec![
            fallback::service("Dépannage", &request),
            fallback::service("Installation", &request),
        ];
        let seo = seo_content(&request, &services);

        let priority = |suffix: &str| {
            seo.sitemap
                .iter()
                .find(|e| e.url == format!("https://exemple.fr{suffix}"))
                .map(|e| e.priority)
        };
        assert_eq!(priority(""), Some(1.0));
        assert_eq!(priority("/services"), Some(0.8));
        assert_eq!(priority("/services/depannage"), Some(0.9));
        assert_eq!(priority("/services/installation"), Some(0.9));
        assert_eq!(priority("/a-propos"), Some(0.7));
        assert_eq!(priority("/contact"), Some(0.7));
        assert_eq!(seo.sitemap.len(), 6);

        assert_eq!(seo.local_business["address"]["postalCode"], "69001");
        assert_eq!(seo.breadcrumbs["depannage"].len(), 3);
        assert!(seo.meta_descriptions.contains_key("installation"));
    }
}
