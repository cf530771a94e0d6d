//! Cloudflare Pages deployment endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{
    error::{ApiError, ApiResult},
    middleware::{require, require_query},
    response,
    routes::AppState,
};
use crate::astro::{AstroBuild, AstroProject};
use crate::deploy::{CloudflareDeployer, DeploymentRequest, SanityDeployConfig, SiteInfo};
use crate::services::PipelineServices;

const DEPLOY_TROUBLESHOOTING: [&str; 4] = [
    "Vérifier les identifiants Cloudflare (CLOUDFLARE_ACCOUNT_ID, CLOUDFLARE_API_TOKEN)",
    "Contrôler que le token a les permissions Pages et DNS",
    "Vérifier que le build Astro produit un dossier dist",
    "Consulter les logs Cloudflare pour plus de détails",
];

const MISSING_CONFIG_TROUBLESHOOTING: [&str; 3] = [
    "Définir CLOUDFLARE_ACCOUNT_ID et CLOUDFLARE_API_TOKEN",
    "Définir CLOUDFLARE_ZONE_ID pour les sous-domaines awema.fr",
    "Redémarrer le serveur après modification de la configuration",
];

pub(crate) fn troubleshooting(steps: &[&str]) -> Vec<String> {
    steps.iter().map(|s| s.to_string()).collect()
}

/// The deployer, or 500 with setup instructions when Cloudflare is not configured
pub(crate) fn deployer(services: &PipelineServices) -> ApiResult<Arc<CloudflareDeployer>> {
    services.deployer.clone().ok_or_else(|| ApiError::Misconfigured {
        message: "Configuration Cloudflare manquante".to_string(),
        troubleshooting: troubleshooting(&MISSING_CONFIG_TROUBLESHOOTING),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployRequest {
    pub workflow: Option<SiteInfo>,
    pub astro_project: Option<AstroProject>,
    pub sanity_config: Option<SanityDeployConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectQuery {
    pub project_name: Option<String>,
    pub deployment_id: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectNameRequest {
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectList<T> {
    projects: Vec<T>,
    total: usize,
}

/// Build the generated Astro project and publish it
///
/// POST /api/deployment/cloudflare
pub async fn deploy_site(
    State(app_state): State<AppState>,
    Json(req): Json<DeployRequest>,
) -> ApiResult<impl IntoResponse> {
    let services = &app_state.services;
    let (site, project) = match (req.workflow, req.astro_project) {
        (Some(site), Some(project)) => (site, project),
        _ => {
            return Err(ApiError::BadRequest(
                "Données workflow et projet Astro requises".to_string(),
            ))
        }
    };
    require(Some(site.business_name.as_str()), "Nom de l'entreprise requis")?;
    if !project.ready {
        return Err(ApiError::ValidationError(
            "Projet Astro non prêt pour le déploiement".to_string(),
        ));
    }
    let deployer = deployer(services)?;

    tracing::info!(business = %site.business_name, path = %project.project_path.display(), "Deploying site");
    let build = AstroBuild::new(services.config.astro.clone())
        .build(&project)
        .await
        .map_err(|e| ApiError::Upstream {
            message: format!("Build Astro échoué: {}", e),
            troubleshooting: troubleshooting(&DEPLOY_TROUBLESHOOTING),
        })?;

    let request = DeploymentRequest {
        site,
        output_dir: build.output_dir,
        sanity: req.sanity_config,
    };
    let result = deployer.deploy(&request).await.map_err(|e| ApiError::Upstream {
        message: e.to_string(),
        troubleshooting: troubleshooting(&DEPLOY_TROUBLESHOOTING),
    })?;

    Ok(response::outcome(result.success, result))
}

/// Deployment or project status; lists the projects when no name is given
///
/// GET /api/deployment/cloudflare
pub async fn deployment_status(
    State(app_state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<axum::response::Response> {
    let deployer = deployer(&app_state.services)?;

    let Some(project_name) = query.project_name.filter(|p| !p.trim().is_empty()) else {
        let projects = deployer.list_projects().await?;
        let total = projects.len();
        return Ok(response::ok(ProjectList { projects, total }).into_response());
    };

    match query.deployment_id.filter(|d| !d.trim().is_empty()) {
        Some(deployment_id) => {
            let deployment = deployer.deployment_status(&project_name, &deployment_id).await?;
            Ok(response::ok(deployment).into_response())
        }
        None => {
            let project = deployer.project(&project_name).await?;
            Ok(response::ok(project).into_response())
        }
    }
}

/// DELETE /api/deployment/cloudflare
pub async fn delete_deployment(
    State(app_state): State<AppState>,
    Json(req): Json<ProjectNameRequest>,
) -> ApiResult<impl IntoResponse> {
    let project_name = require(req.project_name.as_deref(), "Nom du projet requis")?;
    let deployer = deployer(&app_state.services)?;

    deployer.delete_project(project_name).await?;
    Ok(response::ok(json!({
        "projectName": project_name,
        "message": format!("Projet {} supprimé avec succès", project_name),
    })))
}

/// GET /api/deployment/analytics
pub async fn deployment_analytics(
    State(app_state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<impl IntoResponse> {
    let project_name = require_query(&query.project_name, "Nom du projet requis")?;
    let period = query.period.unwrap_or_else(|| "24h".to_string());
    let deployer = deployer(&app_state.services)?;

    let analytics = deployer.deployment_analytics(&project_name, &period).await?;
    Ok(response::ok(analytics))
}

/// Drop the Pages build cache so the next deployment rebuilds from scratch
///
/// POST /api/deployment/cache
pub async fn purge_deployment_cache(
    State(app_state): State<AppState>,
    Json(req): Json<ProjectNameRequest>,
) -> ApiResult<impl IntoResponse> {
    let project_name = require(req.project_name.as_deref(), "Nom du projet requis")?;
    let deployer = deployer(&app_state.services)?;

    deployer.purge_cache(project_name).await?;
    Ok(response::ok(json!({
        "projectName": project_name,
        "message": format!("Cache de build du projet {} vidé", project_name),
    })))
}
