//! Custom domain and awema.fr subdomain endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::deployment::troubleshooting;
use crate::api::{
    error::{ApiError, ApiResult},
    middleware::require,
    response,
    routes::AppState,
};
use crate::deploy::{DnsManager, DnsResult, DomainOptions};
use crate::services::PipelineServices;

const DOMAIN_TROUBLESHOOTING: [&str; 4] = [
    "Vérifier que le domaine existe et est accessible",
    "Contrôler les permissions sur la zone DNS",
    "Valider la configuration des serveurs de noms",
    "Consulter les logs Cloudflare pour plus de détails",
];

const SUBDOMAIN_INSTRUCTIONS: [&str; 4] = [
    "Le sous-domaine a été créé automatiquement",
    "Le site sera accessible dans les 5 minutes suivantes",
    "Un certificat SSL sera automatiquement provisionné",
    "Aucune action supplémentaire n'est requise",
];

const CUSTOM_INSTRUCTIONS: [&str; 4] = [
    "Configurer les serveurs DNS de votre domaine vers Cloudflare",
    "Ou ajouter les enregistrements DNS fournis chez votre registrar",
    "La propagation peut prendre jusqu'à 48h",
    "Le certificat SSL sera automatiquement provisionné",
];

fn dns(services: &PipelineServices) -> ApiResult<Arc<DnsManager>> {
    services.dns.clone().ok_or_else(|| ApiError::Misconfigured {
        message: "Configuration Cloudflare manquante".to_string(),
        troubleshooting: troubleshooting(&DOMAIN_TROUBLESHOOTING),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    #[default]
    Custom,
    Subdomain,
}

/// Unset flags take the per-kind default
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainOptionsInput {
    pub use_apex_domain: Option<bool>,
    #[serde(alias = "redirectWWW")]
    pub redirect_www: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainRequest {
    pub project_name: Option<String>,
    pub domain: Option<String>,
    #[serde(rename = "type")]
    pub kind: DomainKind,
    pub business_name: Option<String>,
    pub options: DomainOptionsInput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainQuery {
    pub domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoveDomainRequest {
    pub project_name: Option<String>,
    pub domain: Option<String>,
    pub zone_id: Option<String>,
}

/// Body of a successful domain configuration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConfigured {
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: DomainKind,
    pub configuration: Value,
    pub status: Value,
    pub urls: Value,
    pub instructions: Vec<String>,
    pub next_steps: Vec<String>,
    pub verification_url: String,
    pub created_at: chrono::DateTime<Utc>,
}

impl DomainConfigured {
    fn new(result: DnsResult, kind: DomainKind, project_name: &str) -> Self {
        let instructions = match kind {
            DomainKind::Subdomain => &SUBDOMAIN_INSTRUCTIONS,
            DomainKind::Custom => &CUSTOM_INSTRUCTIONS,
        };
        let first_step = match kind {
            DomainKind::Custom => "Vérifier la propagation DNS dans quelques minutes",
            DomainKind::Subdomain => "Tester l'accès au site",
        };
        Self {
            configuration: json!({
                "zoneId": result.zone_id,
                "records": result.records,
                "ssl": result.ssl,
                "cacheRules": result.cache_rules,
            }),
            status: json!({
                "dns": "configuring",
                "ssl": "pending",
                "propagation": format!("{} minutes estimées", result.propagation_time.div_ceil(60)),
            }),
            urls: json!({
                "primary": result.verification_url,
                "cloudflarePages": format!("https://{}.pages.dev", project_name),
                "dashboard": format!("https://dash.cloudflare.com/pages/projects/{}", project_name),
            }),
            instructions: troubleshooting(instructions),
            next_steps: vec![
                first_step.to_string(),
                "Configurer les redirections si nécessaire".to_string(),
                "Activer les analytics web Cloudflare".to_string(),
                "Optimiser les règles de cache".to_string(),
            ],
            domain: result.domain,
            kind,
            verification_url: result.verification_url,
            created_at: result.created_at,
        }
    }
}

/// POST /api/deployment/domain
pub async fn configure_domain(
    State(app_state): State<AppState>,
    Json(req): Json<DomainRequest>,
) -> ApiResult<impl IntoResponse> {
    let project_name = require(req.project_name.as_deref(), "Nom du projet requis")?;

    let result = match req.kind {
        DomainKind::Custom => {
            let domain = require(req.domain.as_deref(), "Domaine requis pour un domaine personnalisé")?;
            let options = DomainOptions {
                use_apex_domain: req.options.use_apex_domain.unwrap_or(false),
                redirect_www: req.options.redirect_www.unwrap_or(true),
            };
            dns(&app_state.services)?
                .setup_custom_domain(domain, project_name, &options)
                .await
        }
        DomainKind::Subdomain => {
            let business_name = require(
                req.business_name.as_deref(),
                "Nom de l'entreprise requis pour un sous-domaine",
            )?;
            dns(&app_state.services)?
                .create_subdomain(business_name, project_name)
                .await
        }
    };

    let result = result.map_err(|e| match e {
        crate::PipelineError::Validation(message) => ApiError::BadRequest(message),
        other => ApiError::Upstream {
            message: other.to_string(),
            troubleshooting: troubleshooting(&DOMAIN_TROUBLESHOOTING),
        },
    })?;

    tracing::info!(domain = %result.domain, project = %project_name, "Domain configured");
    Ok(response::ok(DomainConfigured::new(result, req.kind, project_name)))
}

/// DNS propagation and reachability of a domain; lists the configured domains
/// when no domain is given
///
/// GET /api/deployment/domain
pub async fn check_domain(
    State(app_state): State<AppState>,
    Query(query): Query<DomainQuery>,
) -> ApiResult<axum::response::Response> {
    let services = &app_state.services;
    let dns = dns(services)?;

    let Some(domain) = query.domain.filter(|d| !d.trim().is_empty()) else {
        let domains = dns.list_configured_domains().await?;
        return Ok(response::ok(json!({ "domains": domains })).into_response());
    };

    let propagation = dns.check_dns_propagation(&domain).await;
    let health = services.monitor.health_check(&format!("https://{}", domain)).await;

    Ok(response::ok(json!({
        "domain": domain,
        "dns": propagation,
        "health": health,
        "checkedAt": Utc::now(),
    }))
    .into_response())
}

/// DELETE /api/deployment/domain
pub async fn remove_domain(
    State(app_state): State<AppState>,
    Json(req): Json<RemoveDomainRequest>,
) -> ApiResult<impl IntoResponse> {
    const MESSAGE: &str = "Nom du projet et domaine requis";
    let project_name = require(req.project_name.as_deref(), MESSAGE)?;
    let domain = require(req.domain.as_deref(), MESSAGE)?;

    let removal = dns(&app_state.services)?
        .remove_domain(project_name, domain, req.zone_id.as_deref())
        .await?;

    Ok(response::ok(json!({
        "message": format!("Domaine {} supprimé avec succès", domain),
        "recordsDeleted": removal.records_deleted,
        "timestamp": Utc::now(),
    })))
}
