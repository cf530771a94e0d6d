//! DNS-over-HTTPS lookups for propagation checks.

use crate::error::Result;
use crate::http::{build_client, check_status, normalize_base, parse_json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Google public resolver JSON API.
pub const DEFAULT_RESOLVER: &str = "https://dns.google";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsAnswer {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: u16,
    #[serde(rename = "TTL", default)]
    pub ttl: u32,
    pub data: String,
}

/// `/resolve` response. `Status == 0` is NOERROR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DohResponse {
    #[serde(rename = "Status")]
    pub status: u32,
    #[serde(rename = "Answer", default)]
    pub answer: Vec<DnsAnswer>,
}

impl DohResponse {
    pub fn is_resolved(&self) -> bool {
        self.status == 0 && !self.answer.is_empty()
    }
}

#[derive(Clone)]
pub struct DohResolver {
    base: String,
    client: Client,
}

impl DohResolver {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base: normalize_base(base),
            client: build_client(timeout)?,
        })
    }

    pub async fn resolve(&self, name: &str, record_type: &str) -> Result<DohResponse> {
        let response = self
            .client
            .get(format!("{}/resolve", self.base))
            .header("Accept", "application/dns-json")
            .query(&[("name", name), ("type", record_type)])
            .send()
            .await?;
        let response = check_status("dns", response).await?;
        parse_json("dns", response).await
    }
}
