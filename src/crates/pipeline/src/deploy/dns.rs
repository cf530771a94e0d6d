//! Custom domains and `*.awema.fr` subdomains for Pages projects.

use crate::config::CloudflareSettings;
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use platforms::cloudflare::{DnsRecord, NewDnsRecord, PageRule};
use platforms::{CloudflareClient, DnsAnswer, DohResolver};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// A records written for apex domains
pub const DEFAULT_APEX_IPS: [&str; 2] = ["192.0.2.1", "192.0.2.2"];

const HSTS_MAX_AGE: u64 = 31_536_000;
const ASSET_CACHE_TTL: u64 = 31_536_000;
const HTML_CACHE_TTL: u64 = 300;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainOptions {
    /// Point a bare `example.fr` at Pages with A records
    pub use_apex_domain: bool,
    /// Add `www.` as a CNAME to the domain
    pub redirect_www: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslSummary {
    /// `strict`, or `flexible` when the zone settings could not be changed
    pub ssl: String,
    pub hsts: bool,
    pub http2: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<String>,
}

impl SslSummary {
    fn strict() -> Self {
        Self {
            ssl: "strict".to_string(),
            hsts: true,
            http2: true,
            min_tls_version: Some("1.2".to_string()),
        }
    }

    fn flexible() -> Self {
        Self {
            ssl: "flexible".to_string(),
            hsts: false,
            http2: false,
            min_tls_version: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRulesSummary {
    pub rules: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_cache: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_cache: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

impl CacheRulesSummary {
    fn none() -> Self {
        Self {
            rules: 0,
            asset_cache: None,
            html_cache: None,
            compression: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsResult {
    pub success: bool,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    pub zone_id: String,
    pub records: Vec<DnsRecord>,
    pub ssl: SslSummary,
    pub cache_rules: CacheRulesSummary,
    /// Seconds until the records are expected to resolve everywhere
    pub propagation_time: u32,
    pub verification_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationStatus {
    pub domain: String,
    /// `resolved`, `pending` or `error`
    pub status: String,
    pub records: Vec<DnsAnswer>,
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl PropagationStatus {
    pub fn is_resolved(&self) -> bool {
        self.status == "resolved"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfiguredDomain {
    pub project_name: String,
    pub domain: String,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRemoval {
    pub domain: String,
    pub project_name: String,
    pub records_deleted: usize,
}

/// Worst-case propagation in seconds for the record types written
pub fn propagation_estimate(records: &[DnsRecord]) -> u32 {
    if records.iter().any(|r| r.record_type == "A") {
        1800
    } else if records.iter().any(|r| r.record_type == "CNAME") {
        300
    } else {
        600
    }
}

/// Registrable zone of a host: its last two labels
pub fn zone_name(domain: &str) -> String {
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    labels[labels.len().saturating_sub(2)..].join(".")
}

fn is_apex(domain: &str) -> bool {
    domain.trim_end_matches('.').split('.').count() == 2
}

pub struct DnsManager {
    client: CloudflareClient,
    resolver: DohResolver,
    subdomain_root: String,
    apex_ips: Vec<String>,
}

impl DnsManager {
    pub fn new(client: CloudflareClient, resolver: DohResolver, settings: &CloudflareSettings) -> Self {
        Self {
            client,
            resolver,
            subdomain_root: settings.subdomain_root.clone(),
            apex_ips: DEFAULT_APEX_IPS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_apex_ips(mut self, ips: Vec<String>) -> Self {
        self.apex_ips = ips;
        self
    }

    /// Zone of the configured subdomain root
    pub fn subdomain_zone(&self) -> Option<&str> {
        self.client.config().zone_id.as_deref()
    }

    /// Attach a client-owned domain to a Pages project and harden its zone
    pub async fn setup_custom_domain(
        &self,
        domain: &str,
        project_name: &str,
        options: &DomainOptions,
    ) -> Result<DnsResult> {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        if domain.is_empty() || !domain.contains('.') {
            return Err(PipelineError::Validation(format!("Domaine invalide: {}", domain)));
        }
        info!(domain = %domain, project = %project_name, "Configuring custom domain");

        let zone = self
            .client
            .find_zone(&zone_name(&domain))
            .await?
            .ok_or_else(|| {
                PipelineError::NotFound(format!("Zone DNS non trouvée pour le domaine {}", domain))
            })?;

        self.client.add_project_domain(project_name, &domain).await?;

        let target = format!("{}.pages.dev", project_name);
        let mut records = Vec::new();
        if options.use_apex_domain && is_apex(&domain) {
            for ip in &self.apex_ips {
                let record = NewDnsRecord::a(&domain, ip).proxied(true);
                records.push(self.client.create_dns_record(&zone.id, &record).await?);
            }
        } else {
            let record = NewDnsRecord::cname(&domain, &target).proxied(true);
            records.push(self.client.create_dns_record(&zone.id, &record).await?);
        }

        if options.redirect_www {
            let www = NewDnsRecord::cname(format!("www.{}", domain), &domain).proxied(true);
            match self.client.create_dns_record(&zone.id, &www).await {
                Ok(record) => records.push(record),
                Err(e) => warn!(domain = %domain, error = %e, "www record not created"),
            }
        }

        let ssl = self.configure_ssl(&zone.id).await;
        let cache_rules = self.configure_cache(&zone.id, &domain).await;

        Ok(DnsResult {
            success: true,
            propagation_time: propagation_estimate(&records),
            verification_url: format!("https://{}", domain),
            domain,
            subdomain: None,
            zone_id: zone.id,
            records,
            ssl,
            cache_rules,
            created_at: Utc::now(),
        })
    }

    /// `{slug}.awema.fr` pointing at the project
    pub async fn create_subdomain(&self, business_name: &str, project_name: &str) -> Result<DnsResult> {
        let zone_id = self.subdomain_zone().map(str::to_string).ok_or_else(|| {
            PipelineError::Config("Zone ID AWEMA requis pour créer des sous-domaines".to_string())
        })?;

        let slug = utils::slugify(business_name, 50);
        if slug.is_empty() {
            return Err(PipelineError::Validation(format!(
                "Nom d'entreprise inutilisable pour un sous-domaine: {}",
                business_name
            )));
        }
        let domain = format!("{}.{}", slug, self.subdomain_root);
        info!(domain = %domain, project = %project_name, "Creating subdomain");

        let record = NewDnsRecord::cname(&domain, format!("{}.pages.dev", project_name)).proxied(true);
        let created = self.client.create_dns_record(&zone_id, &record).await?;
        self.client.add_project_domain(project_name, &domain).await?;

        let ssl = self.configure_ssl(&zone_id).await;
        let cache_rules = self.configure_cache(&zone_id, &domain).await;

        Ok(DnsResult {
            success: true,
            verification_url: format!("https://{}", domain),
            domain,
            subdomain: Some(slug),
            zone_id,
            records: vec![created],
            ssl,
            cache_rules,
            propagation_time: 300,
            created_at: Utc::now(),
        })
    }

    async fn configure_ssl(&self, zone_id: &str) -> SslSummary {
        if let Err(e) = self.client.patch_zone_setting(zone_id, "ssl", json!("strict")).await {
            warn!(zone_id = %zone_id, error = %e, "SSL mode not changed");
            return SslSummary::flexible();
        }

        let hsts = json!({
            "strict_transport_security": {
                "enabled": true,
                "max_age": HSTS_MAX_AGE,
                "include_subdomains": true,
                "preload": true,
            }
        });
        if let Err(e) = self.client.patch_zone_setting(zone_id, "security_header", hsts).await {
            warn!(zone_id = %zone_id, error = %e, "HSTS not enabled");
        }
        if let Err(e) = self
            .client
            .patch_zone_setting(zone_id, "h2_prioritization", json!("on"))
            .await
        {
            debug!(zone_id = %zone_id, error = %e, "HTTP/2 prioritization not enabled");
        }
        SslSummary::strict()
    }

    async fn configure_cache(&self, zone_id: &str, domain: &str) -> CacheRulesSummary {
        let assets = PageRule::for_url(
            format!("{}/assets/*", domain),
            vec![
                json!({ "id": "cache_level", "value": "cache_everything" }),
                json!({ "id": "edge_cache_ttl", "value": ASSET_CACHE_TTL }),
            ],
            2,
        );
        let html = PageRule::for_url(
            format!("{}/*", domain),
            vec![
                json!({ "id": "cache_level", "value": "cache_everything" }),
                json!({ "id": "edge_cache_ttl", "value": HTML_CACHE_TTL }),
            ],
            1,
        );

        for rule in [&assets, &html] {
            if let Err(e) = self.client.create_page_rule(zone_id, rule).await {
                warn!(zone_id = %zone_id, error = %e, "Cache rules not created");
                return CacheRulesSummary::none();
            }
        }
        CacheRulesSummary {
            rules: 2,
            asset_cache: Some("1 an".to_string()),
            html_cache: Some("5 minutes".to_string()),
            compression: Some("brotli".to_string()),
        }
    }

    /// A-record lookup through DNS over HTTPS. Never fails; errors are reported in
    /// the status.
    pub async fn check_dns_propagation(&self, domain: &str) -> PropagationStatus {
        match self.resolver.resolve(domain, "A").await {
            Ok(response) => PropagationStatus {
                domain: domain.to_string(),
                status: if response.status == 0 && !response.answer.is_empty() {
                    "resolved".to_string()
                } else {
                    "pending".to_string()
                },
                ttl: response.answer.first().map(|a| a.ttl),
                records: response.answer,
                error: None,
                checked_at: Utc::now(),
            },
            Err(e) => PropagationStatus {
                domain: domain.to_string(),
                status: "error".to_string(),
                records: Vec::new(),
                ttl: None,
                error: Some(e.to_string()),
                checked_at: Utc::now(),
            },
        }
    }

    async fn resolve_zone(&self, domain: &str, zone_id: Option<&str>) -> Result<String> {
        if let Some(zone_id) = zone_id {
            return Ok(zone_id.to_string());
        }
        if domain.ends_with(&format!(".{}", self.subdomain_root)) {
            if let Some(zone_id) = self.subdomain_zone() {
                return Ok(zone_id.to_string());
            }
        }
        self.client
            .find_zone(&zone_name(domain))
            .await?
            .map(|z| z.id)
            .ok_or_else(|| PipelineError::NotFound(format!("Zone DNS non trouvée pour le domaine {}", domain)))
    }

    /// Detach the domain from the project and delete its records
    pub async fn remove_domain(
        &self,
        project_name: &str,
        domain: &str,
        zone_id: Option<&str>,
    ) -> Result<DomainRemoval> {
        info!(domain = %domain, project = %project_name, "Removing domain");
        if let Err(e) = self.client.remove_project_domain(project_name, domain).await {
            if !e.is_not_found() {
                return Err(e.into());
            }
            debug!(domain = %domain, "Domain was not attached to the project");
        }

        let zone_id = self.resolve_zone(domain, zone_id).await?;
        let records = self.client.list_dns_records(&zone_id, Some(domain)).await?;
        for record in &records {
            self.client.delete_dns_record(&zone_id, &record.id).await?;
        }

        Ok(DomainRemoval {
            domain: domain.to_string(),
            project_name: project_name.to_string(),
            records_deleted: records.len(),
        })
    }

    pub async fn dns_records(&self, zone_id: &str, name: Option<&str>) -> Result<Vec<DnsRecord>> {
        Ok(self.client.list_dns_records(zone_id, name).await?)
    }

    pub async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        Ok(self.client.delete_dns_record(zone_id, record_id).await?)
    }

    /// Domains of every Pages project on the account
    pub async fn list_configured_domains(&self) -> Result<Vec<ConfiguredDomain>> {
        let projects = self.client.list_projects().await?;
        let lookups = projects.iter().map(|project| async move {
            match self.client.list_project_domains(&project.name).await {
                Ok(domains) => domains
                    .into_iter()
                    .map(|d| ConfiguredDomain {
                        project_name: project.name.clone(),
                        domain: d.name,
                        status: d.status,
                        created_at: d.created_on,
                    })
                    .collect::<Vec<_>>(),
                Err(e) => {
                    debug!(project = %project.name, error = %e, "Falling back to project domain list");
                    project
                        .domains
                        .iter()
                        .map(|d| ConfiguredDomain {
                            project_name: project.name.clone(),
                            domain: d.clone(),
                            status: None,
                            created_at: project.created_on.clone(),
                        })
                        .collect()
                }
            }
        });
        Ok(join_all(lookups).await.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "success": true, "errors": [], "result": result }))
    }

    fn record(id: &str, kind: &str, name: &str) -> serde_json::Value {
        json!({ "id": id, "type": kind, "name": name, "content": "x", "ttl": 1, "proxied": true })
    }

    fn manager(server: &MockServer, zone: Option<&str>) -> DnsManager {
        let settings = CloudflareSettings {
            account_id: "acc".to_string(),
            api_token: "token".to_string(),
            zone_id: zone.map(str::to_string),
            api_base: server.uri(),
            ..Default::default()
        };
        let client = CloudflareClient::new(settings.client_config()).unwrap();
        let resolver = DohResolver::new(server.uri(), Duration::from_secs(5)).unwrap();
        DnsManager::new(client, resolver, &settings)
    }

    #[test]
    fn test_zone_name_and_apex() {
        assert_eq!(zone_name("www.plomberie-dupont.fr"), "plomberie-dupont.fr");
        assert_eq!(zone_name("dupont.fr."), "dupont.fr");
        assert!(is_apex("dupont.fr"));
        assert!(!is_apex("www.dupont.fr"));
    }

    #[test]
    fn test_propagation_estimate() {
        let a: DnsRecord = serde_json::from_value(record("1", "A", "dupont.fr")).unwrap();
        let cname: DnsRecord = serde_json::from_value(record("2", "CNAME", "www.dupont.fr")).unwrap();
        let txt: DnsRecord = serde_json::from_value(record("3", "TXT", "dupont.fr")).unwrap();
        assert_eq!(propagation_estimate(&[cname.clone(), a]), 1800);
        assert_eq!(propagation_estimate(&[cname]), 300);
        assert_eq!(propagation_estimate(&[txt]), 600);
    }

    #[tokio::test]
    async fn test_setup_custom_domain_missing_zone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ok(json!([])))
            .mount(&server)
            .await;

        let err = manager(&server, None)
            .setup_custom_domain("www.dupont.fr", "dupont-123456", &DomainOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Zone DNS non trouvée pour le domaine www.dupont.fr"));
    }

    #[tokio::test]
    async fn test_setup_apex_domain_with_www() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .and(query_param("name", "dupont.fr"))
            .respond_with(ok(json!([{ "id": "z1", "name": "dupont.fr" }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/dupont-123456/domains"))
            .respond_with(ok(json!({ "name": "dupont.fr", "status": "pending" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zones/z1/dns_records"))
            .respond_with(ok(record("r", "A", "dupont.fr")))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ok(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zones/z1/pagerules"))
            .respond_with(ok(json!({ "id": "rule" })))
            .expect(2)
            .mount(&server)
            .await;

        let result = manager(&server, None)
            .setup_custom_domain(
                "Dupont.fr",
                "dupont-123456",
                &DomainOptions {
                    use_apex_domain: true,
                    redirect_www: true,
                },
            )
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.domain, "dupont.fr");
        assert_eq!(result.zone_id, "z1");
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.propagation_time, 1800);
        assert_eq!(result.ssl.ssl, "strict");
        assert_eq!(result.cache_rules.rules, 2);
        assert_eq!(result.verification_url, "https://dupont.fr");
    }

    #[tokio::test]
    async fn test_ssl_failure_degrades_to_flexible() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ok(json!([{ "id": "z1", "name": "dupont.fr" }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/p/domains"))
            .respond_with(ok(json!({ "name": "www.dupont.fr" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zones/z1/dns_records"))
            .respond_with(ok(record("r", "CNAME", "www.dupont.fr")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false, "errors": [{ "code": 9109, "message": "forbidden" }], "result": null
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zones/z1/pagerules"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = manager(&server, None)
            .setup_custom_domain("www.dupont.fr", "p", &DomainOptions::default())
            .await
            .unwrap();
        assert_eq!(result.ssl.ssl, "flexible");
        assert_eq!(result.cache_rules, CacheRulesSummary::none());
        assert_eq!(result.propagation_time, 300);
    }

    #[tokio::test]
    async fn test_create_subdomain_requires_zone() {
        let server = MockServer::start().await;
        let err = manager(&server, None)
            .create_subdomain("Dupont", "dupont-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn test_create_subdomain() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/zones/awema/dns_records"))
            .respond_with(ok(record("r1", "CNAME", "boulangerie-leroy.awema.fr")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/accounts/acc/pages/projects/leroy-1/domains"))
            .respond_with(ok(json!({ "name": "boulangerie-leroy.awema.fr" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ok(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/zones/awema/pagerules"))
            .respond_with(ok(json!({})))
            .mount(&server)
            .await;

        let result = manager(&server, Some("awema"))
            .create_subdomain("Boulangerie Leroy", "leroy-1")
            .await
            .unwrap();
        assert_eq!(result.domain, "boulangerie-leroy.awema.fr");
        assert_eq!(result.subdomain.as_deref(), Some("boulangerie-leroy"));
        assert_eq!(result.propagation_time, 300);
    }

    #[tokio::test]
    async fn test_check_dns_propagation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/resolve"))
            .and(query_param("name", "dupont.fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Status": 0,
                "Answer": [{ "name": "dupont.fr.", "type": 1, "TTL": 300, "data": "192.0.2.1" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/resolve"))
            .and(query_param("name", "new.fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Status": 3 })))
            .mount(&server)
            .await;

        let dns = manager(&server, None);
        let resolved = dns.check_dns_propagation("dupont.fr").await;
        assert!(resolved.is_resolved());
        assert_eq!(resolved.ttl, Some(300));

        let pending = dns.check_dns_propagation("new.fr").await;
        assert_eq!(pending.status, "pending");

        let error = dns.check_dns_propagation("other.fr").await;
        assert_eq!(error.status, "error");
        assert!(error.error.is_some());
    }

    #[tokio::test]
    async fn test_remove_domain_deletes_records() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/accounts/acc/pages/projects/p/domains/dupont.fr"))
            .respond_with(ok(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/zones/z9/dns_records"))
            .respond_with(ok(json!([record("a1", "A", "dupont.fr"), record("a2", "A", "dupont.fr")])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(wiremock::matchers::path_regex(r"^/zones/z9/dns_records/a[12]$"))
            .respond_with(ok(json!({ "id": "a" })))
            .expect(2)
            .mount(&server)
            .await;

        let removal = manager(&server, None)
            .remove_domain("p", "dupont.fr", Some("z9"))
            .await
            .unwrap();
        assert_eq!(removal.records_deleted, 2);
    }

    #[tokio::test]
    async fn test_list_configured_domains() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/acc/pages/projects"))
            .respond_with(ok(json!([
                { "name": "a", "domains": ["a.pages.dev"] },
                { "name": "b", "domains": ["b.pages.dev", "b.fr"], "created_on": "2024-01-01" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/accounts/acc/pages/projects/a/domains"))
            .respond_with(ok(json!([{ "name": "a.awema.fr", "status": "active" }])))
            .mount(&server)
            .await;

        let mut domains = manager(&server, None).list_configured_domains().await.unwrap();
        domains.sort_by(|x, y| x.domain.cmp(&y.domain));
        let names: Vec<&str> = domains.iter().map(|d| d.domain.as_str()).collect();
        assert_eq!(names, vec!["a.awema.fr", "b.fr", "b.pages.dev"]);
        assert_eq!(domains[0].status.as_deref(), Some("active"));
    }
}
