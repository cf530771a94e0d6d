//! Post-deployment checks of a live site and continuous health monitoring.
//!
//! A report combines five probes: health, performance, security headers, mobile
//! readiness and a basic SEO audit. Probes never fail; a request error is folded into
//! the probe's result with an `F` grade.

use crate::config::MonitoringSettings;
use crate::patterns;
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const MONITOR_UA: &str = "AWEMA-Monitor/1.0";
const SEO_UA: &str = "AWEMA-SEO-Bot/1.0";
const MOBILE_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X) AppleWebKit/605.1.15";

const HEALTH_HEADERS: [&str; 4] = [
    "strict-transport-security",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
];

const SSL_HEADERS: [&str; 5] = [
    "strict-transport-security",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
];

const TITLE_TAG: &str = r"(?i)<title[^>]*>([^<]+)</title>";
const TITLE_OPEN: &str = r"(?i)<title>";
const META_DESCRIPTION: &str = r#"(?i)<meta[^>]*name=["']description["'][^>]*content=["']([^"']+)"#;
const META_DESCRIPTION_ANY: &str = r#"(?i)<meta[^>]*name=["']description"#;
const H1_OPEN: &str = r"(?i)<h1";
const H1_TAG: &str = r"(?i)<h1[^>]*>[^<]+</h1>";
const JS_ERRORS: &str = r"(?i)error|uncaught|exception";
const IMG_TAG: &str = r"(?i)<img[^>]*>?";
const CANONICAL: &str = r#"(?i)<link[^>]*rel=["']canonical"#;
const OPEN_GRAPH: &str = r#"(?i)<meta[^>]*property=["']og:"#;
const ROBOTS: &str = r#"(?i)<meta[^>]*name=["']robots"#;
const STRUCTURED_DATA: &str = r"(?i)application/ld\+json";
const VIEWPORT: &str = r#"(?i)<meta[^>]*name=["']viewport["'][^>]*>"#;
const RESPONSIVE: &str = r"(?i)@media|responsive";
const MOBILE_WORDS: &str = r"(?i)mobile|phone|tablet";
const TOUCH: &str = r"(?i)touch-action|tap-highlight";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Points used by the quality score
    pub fn score(self) -> u32 {
        match self {
            Grade::APlus => 100,
            Grade::A => 95,
            Grade::B => 80,
            Grade::C => 65,
            Grade::D => 50,
            Grade::F => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckItem {
    pub name: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    pub details: String,
}

impl HealthCheckItem {
    fn new(name: impl Into<String>, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            status_code: None,
            response_time: None,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub checks: Vec<HealthCheckItem>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Milliseconds, body included
    pub response_time: u64,
    pub cached: bool,
    pub status: u16,
    pub content_length: usize,
    pub cf_ray: Option<String>,
    pub cf_cache_status: Option<String>,
    pub server: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub first_load_time: u64,
    pub cached_load_time: u64,
    /// Percentage gained by the cached requests, one decimal
    pub improvement_ratio: f64,
    pub content_size: usize,
    /// `working` when Cloudflare reported a cache status
    pub cache_status: String,
    /// `cloudflare` or `none`
    pub cdn_detected: String,
    pub measurements: Vec<Measurement>,
    pub recommendations: Vec<String>,
    pub grade: Grade,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslReport {
    pub enabled: bool,
    /// `valid` or `error`
    pub status: String,
    pub hsts: Option<String>,
    pub security_headers: Vec<SecurityHeader>,
    pub grade: Grade,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileChecks {
    pub viewport: bool,
    pub responsive: bool,
    pub mobile_optimized: bool,
    pub touch_friendly: bool,
}

impl MobileChecks {
    pub fn from_html(html: &str) -> Self {
        Self {
            viewport: is_match(VIEWPORT, html),
            responsive: is_match(RESPONSIVE, html),
            mobile_optimized: is_match(MOBILE_WORDS, html),
            touch_friendly: is_match(TOUCH, html),
        }
    }

    pub fn score(&self) -> u32 {
        [self.viewport, self.responsive, self.mobile_optimized, self.touch_friendly]
            .iter()
            .filter(|c| **c)
            .count() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileReport {
    pub responsive: bool,
    pub checks: MobileChecks,
    pub score: u32,
    pub max_score: u32,
    pub grade: Grade,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoChecks {
    pub title: Option<String>,
    pub title_length: usize,
    pub description: Option<String>,
    pub description_length: usize,
    pub h1_count: usize,
    pub images: usize,
    pub images_without_alt: usize,
    pub has_robots: bool,
    pub has_canonical: bool,
    pub has_open_graph: bool,
    pub has_structured_data: bool,
}

impl SeoChecks {
    pub fn from_html(html: &str) -> Self {
        let title = capture(TITLE_TAG, html);
        let description = capture(META_DESCRIPTION, html);
        let images = find_all(IMG_TAG, html);

        Self {
            title_length: title.as_deref().map(|t| t.chars().count()).unwrap_or(0),
            title,
            description_length: description.as_deref().map(|d| d.chars().count()).unwrap_or(0),
            description,
            h1_count: find_all(H1_TAG, html).len(),
            images: images.len(),
            images_without_alt: images
                .iter()
                .filter(|tag| !tag.to_ascii_lowercase().contains("alt"))
                .count(),
            has_robots: is_match(ROBOTS, html),
            has_canonical: is_match(CANONICAL, html),
            has_open_graph: is_match(OPEN_GRAPH, html),
            has_structured_data: is_match(STRUCTURED_DATA, html),
        }
    }

    fn title_optimal(&self) -> bool {
        (30..=60).contains(&self.title_length)
    }

    fn description_optimal(&self) -> bool {
        (120..=160).contains(&self.description_length)
    }

    /// Share of images carrying an alt attribute, in percent
    pub fn alt_ratio(&self) -> f64 {
        if self.images == 0 {
            100.0
        } else {
            (self.images - self.images_without_alt) as f64 / self.images as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    pub score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub grade: Grade,
    pub checks: SeoChecks,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SeoReport {
    pub fn from_html(html: &str) -> Self {
        let checks = SeoChecks::from_html(html);
        let mut score = 0;
        let mut recommendations = Vec::new();

        if checks.title_optimal() {
            score += 2;
        } else if checks.title.is_some() {
            score += 1;
            recommendations.push(format!(
                "Optimiser la longueur du titre ({} caractères)",
                checks.title_length
            ));
        } else {
            recommendations.push("Ajouter un titre de page".to_string());
        }

        if checks.description_optimal() {
            score += 2;
        } else if checks.description.is_some() {
            score += 1;
            recommendations.push(format!(
                "Optimiser la meta description ({} caractères)",
                checks.description_length
            ));
        } else {
            recommendations.push("Ajouter une meta description".to_string());
        }

        match checks.h1_count {
            1 => score += 2,
            0 => recommendations.push("Ajouter un H1".to_string()),
            n => {
                score += 1;
                recommendations.push(format!("Utiliser un seul H1 ({} trouvés)", n));
            }
        }

        if checks.alt_ratio() >= 90.0 {
            score += 1;
        }
        if checks.images_without_alt > 0 {
            recommendations.push(format!(
                "Ajouter des attributs alt aux images ({} manquants)",
                checks.images_without_alt
            ));
        }
        if checks.has_canonical {
            score += 1;
        } else {
            recommendations.push("Ajouter une URL canonique".to_string());
        }
        if checks.has_open_graph {
            score += 1;
        } else {
            recommendations.push("Ajouter les balises Open Graph".to_string());
        }
        if checks.has_structured_data {
            score += 1;
        }

        Self {
            score,
            max_score: 10,
            percentage: (score as f64 / 10.0 * 100.0).round() as u32,
            grade: seo_grade(score),
            checks,
            recommendations,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            score: 0,
            max_score: 10,
            percentage: 0,
            grade: Grade::F,
            checks: SeoChecks::default(),
            recommendations: vec!["Impossible d'effectuer l'audit SEO".to_string()],
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringChecks {
    pub health: HealthCheckResult,
    pub performance: PerformanceMetrics,
    pub ssl: SslReport,
    pub mobile: MobileReport,
    pub seo: SeoReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringReport {
    pub deployment_id: String,
    pub url: String,
    pub monitoring: MonitoringChecks,
    pub status: HealthStatus,
    /// 0 to 100
    pub score: u32,
    pub recommendations: Vec<String>,
    pub monitoring_setup: bool,
    pub execution_time: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoringConfig {
    pub continuous_monitoring: bool,
    /// Milliseconds
    pub check_interval: u64,
    /// Consecutive unhealthy checks before alerting
    pub alert_threshold: u32,
    /// Milliseconds
    pub performance_threshold: u64,
    pub seo_min_score: u32,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self::from(&MonitoringSettings::default())
    }
}

impl From<&MonitoringSettings> for MonitoringConfig {
    fn from(settings: &MonitoringSettings) -> Self {
        Self {
            continuous_monitoring: true,
            check_interval: settings.interval_ms,
            alert_threshold: settings.alert_threshold,
            performance_threshold: settings.performance_threshold_ms,
            seo_min_score: settings.seo_min_score,
        }
    }
}

/// Grade from the mean of the cold and cached load times
pub fn performance_grade(first_load_ms: u64, cached_ms: u64) -> Grade {
    let avg = (first_load_ms + cached_ms) as f64 / 2.0;
    match avg {
        a if a < 500.0 => Grade::APlus,
        a if a < 1000.0 => Grade::A,
        a if a < 2000.0 => Grade::B,
        a if a < 3000.0 => Grade::C,
        a if a < 5000.0 => Grade::D,
        _ => Grade::F,
    }
}

pub fn ssl_grade(header_count: usize) -> Grade {
    match header_count {
        n if n >= 4 => Grade::APlus,
        3 => Grade::A,
        2 => Grade::B,
        _ => Grade::C,
    }
}

pub fn mobile_grade(score: u32) -> Grade {
    match score {
        s if s >= 3 => Grade::A,
        2 => Grade::B,
        1 => Grade::C,
        _ => Grade::D,
    }
}

pub fn seo_grade(score: u32) -> Grade {
    match score {
        s if s >= 8 => Grade::A,
        6 | 7 => Grade::B,
        4 | 5 => Grade::C,
        2 | 3 => Grade::D,
        _ => Grade::F,
    }
}

pub fn overall_status(health: HealthStatus, performance: Grade, ssl: Grade) -> HealthStatus {
    if health == HealthStatus::Unhealthy {
        HealthStatus::Unhealthy
    } else if ssl == Grade::F || performance == Grade::F || health == HealthStatus::Degraded {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Weighted 0-100 score: health 40%, performance 30%, SSL 20%, SEO 10%
pub fn quality_score(health: HealthStatus, performance: Grade, ssl: Grade, seo_percentage: u32) -> u32 {
    let health = match health {
        HealthStatus::Healthy => 100.0,
        HealthStatus::Degraded => 70.0,
        HealthStatus::Unhealthy => 0.0,
    };
    (health * 0.4
        + performance.score() as f64 * 0.3
        + ssl.score() as f64 * 0.2
        + seo_percentage as f64 * 0.1)
        .round() as u32
}

fn report_recommendations(checks: &MonitoringChecks) -> Vec<String> {
    let mut out = Vec::new();
    if checks.health.status != HealthStatus::Healthy {
        out.push("Résoudre les problèmes de santé du site".to_string());
    }
    out.extend(checks.performance.recommendations.iter().cloned());
    out.extend(checks.ssl.recommendations.iter().cloned());
    out.extend(checks.seo.recommendations.iter().take(3).cloned());
    out.truncate(8);
    out
}

fn is_match(pattern: &'static str, text: &str) -> bool {
    patterns::regex(pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

fn capture(pattern: &'static str, text: &str) -> Option<String> {
    let re = patterns::regex(pattern).ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

fn find_all(pattern: &'static str, text: &str) -> Vec<String> {
    patterns::regex(pattern)
        .map(|re| re.find_iter(text).map(|m| m.as_str().to_string()).collect())
        .unwrap_or_default()
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// HTTP side of the monitor. Cheap to clone into background tasks.
#[derive(Clone)]
struct Probe {
    client: Client,
    no_redirect: Client,
    pause: Duration,
}

impl Probe {
    fn new(settings: &MonitoringSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let build = |policy: Policy| {
            Client::builder()
                .timeout(timeout)
                .user_agent(MONITOR_UA)
                .redirect(policy)
                .build()
                .map_err(|e| PipelineError::Platform(e.into()))
        };
        Ok(Self {
            client: build(Policy::default())?,
            no_redirect: build(Policy::none())?,
            pause: Duration::from_millis(settings.probe_pause_ms),
        })
    }

    async fn health(&self, url: &str) -> HealthCheckResult {
        let mut checks = Vec::new();
        let mut status = HealthStatus::Healthy;

        let started = Instant::now();
        match self.client.head(url).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                let code = response.status().as_u16();
                checks.push(HealthCheckItem {
                    name: "HTTP Response".to_string(),
                    status: if ok { CheckStatus::Pass } else { CheckStatus::Fail },
                    status_code: Some(code),
                    response_time: Some(started.elapsed().as_millis() as u64),
                    details: if ok {
                        "Site accessible".to_string()
                    } else {
                        format!("Erreur HTTP {}", code)
                    },
                });
                if !ok {
                    status = HealthStatus::Unhealthy;
                }

                for name in HEALTH_HEADERS {
                    let present = response.headers().contains_key(name);
                    checks.push(HealthCheckItem::new(
                        format!("Security Header: {}", name),
                        if present { CheckStatus::Pass } else { CheckStatus::Warning },
                        if present { "Configuré" } else { "Manquant" },
                    ));
                }

                match self.fetch_text(url, None).await {
                    Ok((_, html)) => checks.extend(content_checks(&html)),
                    Err(e) => {
                        checks.push(HealthCheckItem::new(
                            "Content Check",
                            CheckStatus::Fail,
                            format!("Impossible de récupérer le contenu: {}", e),
                        ));
                        if status == HealthStatus::Healthy {
                            status = HealthStatus::Degraded;
                        }
                    }
                }

                let www = url.replacen("https://", "https://www.", 1);
                if let Ok(response) = self.no_redirect.head(&www).send().await {
                    checks.push(if response.status().is_redirection() {
                        HealthCheckItem::new("WWW Redirect", CheckStatus::Pass, "Redirection www configurée")
                    } else {
                        HealthCheckItem::new("WWW Redirect", CheckStatus::Info, "Pas de redirection www")
                    });
                }
            }
            Err(e) => {
                checks.push(HealthCheckItem::new(
                    "HTTP Response",
                    CheckStatus::Fail,
                    format!("Impossible d'accéder au site: {}", e),
                ));
                status = HealthStatus::Unhealthy;
            }
        }

        HealthCheckResult {
            status,
            checks,
            checked_at: Utc::now(),
        }
    }

    /// GET returning the headers and body. Non-2xx statuses are errors.
    async fn fetch_text(&self, url: &str, user_agent: Option<&str>) -> Result<(HeaderMap, String)> {
        let mut request = self.client.get(url);
        if let Some(ua) = user_agent {
            request = request.header(reqwest::header::USER_AGENT, ua);
        }
        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::Platform(e.into()))?;
        if !response.status().is_success() {
            return Err(PipelineError::General(format!("HTTP {}", response.status().as_u16())));
        }
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Platform(e.into()))?;
        Ok((headers, body))
    }

    async fn measure(&self, url: &str, cached: bool) -> Result<Measurement> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::CACHE_CONTROL,
                if cached { "max-age=0" } else { "no-cache" },
            )
            .send()
            .await
            .map_err(|e| PipelineError::Platform(e.into()))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Platform(e.into()))?;
        Ok(Measurement {
            response_time: started.elapsed().as_millis() as u64,
            cached,
            status,
            content_length: body.len(),
            cf_ray: header(&headers, "cf-ray"),
            cf_cache_status: header(&headers, "cf-cache-status"),
            server: header(&headers, "server"),
        })
    }

    async fn performance(&self, url: &str, threshold_ms: u64) -> PerformanceMetrics {
        let mut measurements = Vec::with_capacity(3);
        for i in 0..3 {
            match self.measure(url, i > 0).await {
                Ok(m) => measurements.push(m),
                Err(e) => return failed_performance(e.to_string()),
            }
            if i < 2 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }
        performance_from(measurements, threshold_ms)
    }

    async fn ssl(&self, url: &str) -> SslReport {
        match self.client.head(url).send().await {
            Ok(response) => {
                let mut security_headers = Vec::new();
                let mut recommendations = Vec::new();
                for name in SSL_HEADERS {
                    match header(response.headers(), name) {
                        Some(value) => security_headers.push(SecurityHeader {
                            name: name.to_string(),
                            value,
                        }),
                        None => recommendations.push(format!("Ajouter le header {}", name)),
                    }
                }
                SslReport {
                    enabled: url.starts_with("https://"),
                    status: "valid".to_string(),
                    hsts: header(response.headers(), "strict-transport-security"),
                    grade: ssl_grade(security_headers.len()),
                    security_headers,
                    recommendations,
                    error: None,
                }
            }
            Err(e) => SslReport {
                enabled: false,
                status: "error".to_string(),
                hsts: None,
                security_headers: Vec::new(),
                grade: Grade::F,
                recommendations: vec!["Configurer SSL/TLS".to_string()],
                error: Some(e.to_string()),
            },
        }
    }

    async fn mobile(&self, url: &str) -> MobileReport {
        match self.fetch_text(url, Some(MOBILE_UA)).await {
            Ok((_, html)) => mobile_report(&html),
            Err(e) => MobileReport {
                responsive: false,
                checks: MobileChecks::default(),
                score: 0,
                max_score: 4,
                grade: Grade::F,
                recommendations: vec!["Impossible de tester la responsivité".to_string()],
                error: Some(e.to_string()),
            },
        }
    }

    async fn seo(&self, url: &str) -> SeoReport {
        match self.fetch_text(url, Some(SEO_UA)).await {
            Ok((_, html)) => SeoReport::from_html(&html),
            Err(e) => SeoReport::failed(e.to_string()),
        }
    }
}

fn content_checks(html: &str) -> Vec<HealthCheckItem> {
    let presence = |name: &str, found: bool, missing: CheckStatus, yes: &str, no: &str| {
        HealthCheckItem::new(
            name,
            if found { CheckStatus::Pass } else { missing },
            if found { yes } else { no },
        )
    };
    let mut checks = vec![
        presence(
            "Page Title",
            is_match(TITLE_OPEN, html),
            CheckStatus::Fail,
            "Présent",
            "Manquant",
        ),
        presence(
            "Meta Description",
            is_match(META_DESCRIPTION_ANY, html),
            CheckStatus::Warning,
            "Présente",
            "Manquante",
        ),
        presence(
            "H1 Tag",
            is_match(H1_OPEN, html),
            CheckStatus::Warning,
            "Présent",
            "Manquant",
        ),
    ];
    if is_match(JS_ERRORS, html) {
        checks.push(HealthCheckItem::new(
            "JavaScript Errors",
            CheckStatus::Warning,
            "Erreurs potentielles détectées dans le HTML",
        ));
    }
    checks
}

fn mobile_report(html: &str) -> MobileReport {
    let checks = MobileChecks::from_html(html);
    let score = checks.score();
    let mut recommendations = Vec::new();
    if !checks.viewport {
        recommendations.push("Ajouter une balise viewport".to_string());
    }
    if !checks.responsive {
        recommendations.push("Ajouter du CSS responsive".to_string());
    }
    if !checks.touch_friendly {
        recommendations.push("Optimiser pour le touch".to_string());
    }
    MobileReport {
        responsive: score >= 2,
        grade: mobile_grade(score),
        checks,
        score,
        max_score: 4,
        recommendations,
        error: None,
    }
}

fn failed_performance(error: String) -> PerformanceMetrics {
    PerformanceMetrics {
        first_load_time: 0,
        cached_load_time: 0,
        improvement_ratio: 0.0,
        content_size: 0,
        cache_status: "not_detected".to_string(),
        cdn_detected: "none".to_string(),
        measurements: Vec::new(),
        recommendations: vec!["Impossible de mesurer les performances".to_string()],
        grade: Grade::F,
        error: Some(error),
    }
}

fn performance_from(measurements: Vec<Measurement>, threshold_ms: u64) -> PerformanceMetrics {
    let first = measurements.first().map(|m| m.response_time).unwrap_or(0);
    let cached: Vec<u64> = measurements.iter().skip(1).map(|m| m.response_time).collect();
    let cached_avg = if cached.is_empty() {
        first
    } else {
        cached.iter().sum::<u64>() / cached.len() as u64
    };
    let content_size = measurements.first().map(|m| m.content_length).unwrap_or(0);

    let improvement_ratio = if first > 0 {
        ((first as f64 - cached_avg as f64) / first as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let mut recommendations = Vec::new();
    if first > threshold_ms {
        recommendations.push("Optimiser les temps de réponse (>3s)".to_string());
    }
    if first > 1000 && cached_avg > 500 {
        recommendations.push("Améliorer la configuration du cache".to_string());
    }
    if content_size > 1024 * 1024 {
        recommendations.push("Réduire la taille de la page (>1MB)".to_string());
    }

    PerformanceMetrics {
        first_load_time: first,
        cached_load_time: cached_avg,
        improvement_ratio,
        content_size,
        cache_status: if measurements.iter().any(|m| m.cf_cache_status.is_some()) {
            "working".to_string()
        } else {
            "not_detected".to_string()
        },
        cdn_detected: if measurements.iter().any(|m| m.cf_ray.is_some()) {
            "cloudflare".to_string()
        } else {
            "none".to_string()
        },
        grade: performance_grade(first, cached_avg),
        measurements,
        recommendations,
        error: None,
    }
}

pub struct DeploymentMonitor {
    probe: Probe,
    defaults: MonitoringConfig,
    monitors: Arc<DashMap<String, JoinHandle<()>>>,
}

impl DeploymentMonitor {
    pub fn new(settings: &MonitoringSettings) -> Result<Self> {
        Ok(Self {
            probe: Probe::new(settings)?,
            defaults: MonitoringConfig::from(settings),
            monitors: Arc::new(DashMap::new()),
        })
    }

    pub fn default_config(&self) -> &MonitoringConfig {
        &self.defaults
    }

    /// Availability checks only, without the performance and content probes
    pub async fn health_check(&self, url: &str) -> HealthCheckResult {
        self.probe.health(url).await
    }

    /// Run every probe against `url` and optionally start continuous monitoring
    pub async fn monitor(
        &self,
        deployment_id: &str,
        url: &str,
        config: Option<MonitoringConfig>,
    ) -> Result<MonitoringReport> {
        if url.trim().is_empty() {
            return Err(PipelineError::Validation("url requise".to_string()));
        }
        let config = config.unwrap_or_else(|| self.defaults.clone());
        let started = Instant::now();
        info!(deployment_id = %deployment_id, url = %url, "Monitoring deployment");

        let health = self.probe.health(url).await;
        let performance = self.probe.performance(url, config.performance_threshold).await;
        let ssl = self.probe.ssl(url).await;
        let mobile = self.probe.mobile(url).await;
        let seo = self.probe.seo(url).await;

        if seo.percentage < config.seo_min_score {
            debug!(url = %url, seo = seo.percentage, min = config.seo_min_score, "SEO below target");
        }

        if config.continuous_monitoring {
            self.start_continuous_monitoring(deployment_id, url, &config);
        }

        let checks = MonitoringChecks {
            health,
            performance,
            ssl,
            mobile,
            seo,
        };
        let status = overall_status(checks.health.status, checks.performance.grade, checks.ssl.grade);
        let score = quality_score(
            checks.health.status,
            checks.performance.grade,
            checks.ssl.grade,
            checks.seo.percentage,
        );
        let recommendations = report_recommendations(&checks);

        info!(deployment_id = %deployment_id, score, status = ?status, "Monitoring finished");
        Ok(MonitoringReport {
            deployment_id: deployment_id.to_string(),
            url: url.to_string(),
            monitoring: checks,
            status,
            score,
            recommendations,
            monitoring_setup: config.continuous_monitoring,
            execution_time: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        })
    }

    /// Periodic health check of `url`, replacing any monitor already running for
    /// the deployment. Alerts after `alert_threshold` consecutive unhealthy checks.
    pub fn start_continuous_monitoring(&self, deployment_id: &str, url: &str, config: &MonitoringConfig) {
        let probe = self.probe.clone();
        let url = url.to_string();
        let id = deployment_id.to_string();
        let period = Duration::from_millis(config.check_interval.max(1));
        let threshold = config.alert_threshold.max(1);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            let mut failures = 0u32;
            loop {
                interval.tick().await;
                let health = probe.health(&url).await;
                if health.status == HealthStatus::Unhealthy {
                    failures += 1;
                    warn!(deployment_id = %id, url = %url, failures, "Site unhealthy");
                    if failures == threshold {
                        error!(
                            deployment_id = %id,
                            url = %url,
                            failures,
                            "Monitoring alert: site down"
                        );
                    }
                } else {
                    if failures >= threshold {
                        info!(deployment_id = %id, url = %url, "Site recovered");
                    }
                    failures = 0;
                }
            }
        });

        if let Some(previous) = self.monitors.insert(deployment_id.to_string(), handle) {
            previous.abort();
        }
        info!(deployment_id = %deployment_id, interval_ms = config.check_interval, "Continuous monitoring started");
    }

    /// Returns whether a monitor was running
    pub fn stop_monitoring(&self, deployment_id: &str) -> bool {
        match self.monitors.remove(deployment_id) {
            Some((_, handle)) => {
                handle.abort();
                info!(deployment_id = %deployment_id, "Monitoring stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all_monitoring(&self) {
        let ids = self.active_monitors();
        for id in ids {
            self.stop_monitoring(&id);
        }
    }

    pub fn active_monitors(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.monitors.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

impl Drop for DeploymentMonitor {
    fn drop(&mut self) {
        for entry in self.monitors.iter() {
            entry.value().abort();
        }
    }
}
