//! Cloudflare zones: lookup, DNS records, zone settings and page rules.

use super::CloudflareClient;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub name_servers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub created_on: Option<String>,
}

fn default_ttl() -> u32 {
    1
}

/// Body of `POST /zones/{id}/dns_records`. TTL 1 means automatic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDnsRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
}

impl NewDnsRecord {
    pub fn a(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            record_type: "A".to_string(),
            name: name.into(),
            content: ip.into(),
            ttl: 1,
            proxied: None,
        }
    }

    pub fn cname(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            record_type: "CNAME".to_string(),
            name: name.into(),
            content: target.into(),
            ttl: 1,
            proxied: None,
        }
    }

    pub fn proxied(mut self, proxied: bool) -> Self {
        self.proxied = Some(proxied);
        self
    }
}

/// A page rule: URL pattern plus actions, as sent to `/pagerules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRule {
    pub targets: Vec<Value>,
    pub actions: Vec<Value>,
    pub priority: u32,
    pub status: String,
}

impl PageRule {
    /// Rule matching `pattern` with the given `{id, value}` actions.
    pub fn for_url(pattern: impl Into<String>, actions: Vec<Value>, priority: u32) -> Self {
        Self {
            targets: vec![json!({
                "target": "url",
                "constraint": { "operator": "matches", "value": pattern.into() }
            })],
            actions,
            priority,
            status: "active".to_string(),
        }
    }
}

impl CloudflareClient {
    /// First zone named exactly `name`, if any.
    pub async fn find_zone(&self, name: &str) -> Result<Option<Zone>> {
        let zones: Vec<Zone> = self
            .send(self.client.get(self.url("/zones")).query(&[("name", name)]))
            .await?;
        Ok(zones.into_iter().next())
    }

    pub async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.send(self.client.get(self.url("/zones"))).await
    }

    pub async fn create_dns_record(&self, zone_id: &str, record: &NewDnsRecord) -> Result<DnsRecord> {
        self.send(
            self.client
                .post(self.url(&format!("/zones/{}/dns_records", zone_id)))
                .json(record),
        )
        .await
    }

    /// Records in a zone, optionally filtered by exact name.
    pub async fn list_dns_records(&self, zone_id: &str, name: Option<&str>) -> Result<Vec<DnsRecord>> {
        let mut request = self.client.get(self.url(&format!("/zones/{}/dns_records", zone_id)));
        if let Some(name) = name {
            request = request.query(&[("name", name)]);
        }
        self.send(request).await
    }

    pub async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.send_unit(
            self.client
                .delete(self.url(&format!("/zones/{}/dns_records/{}", zone_id, record_id))),
        )
        .await
    }

    /// `PATCH /zones/{id}/settings/{setting}` with `{"value": value}`.
    pub async fn patch_zone_setting(&self, zone_id: &str, setting: &str, value: Value) -> Result<Value> {
        self.send(
            self.client
                .patch(self.url(&format!("/zones/{}/settings/{}", zone_id, setting)))
                .json(&json!({ "value": value })),
        )
        .await
    }

    pub async fn create_page_rule(&self, zone_id: &str, rule: &PageRule) -> Result<Value> {
        self.send(
            self.client
                .post(self.url(&format!("/zones/{}/pagerules", zone_id)))
                .json(rule),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_serialization() {
        let record = NewDnsRecord::cname("www.dupont.fr", "dupont.fr");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "CNAME");
        assert_eq!(json["ttl"], 1);
        assert!(json.get("proxied").is_none());

        let json = serde_json::to_value(NewDnsRecord::a("dupont.fr", "192.0.2.1").proxied(true)).unwrap();
        assert_eq!(json["proxied"], true);
    }

    #[test]
    fn test_page_rule_target() {
        let rule = PageRule::for_url(
            "dupont.fr/*.html",
            vec![json!({"id": "browser_cache_ttl", "value": 300})],
            2,
        );
        assert_eq!(rule.targets[0]["constraint"]["value"], "dupont.fr/*.html");
        assert_eq!(rule.status, "active");
    }
}
