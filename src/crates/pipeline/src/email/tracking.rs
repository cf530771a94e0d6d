//! Email open/click tracking.
//!
//! One [`TrackingRecord`] per sent proposal, persisted under `email-tracking/`. Only the
//! first open and the first click are timestamped; later hits bump the counters.

use crate::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utils::JsonDir;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    pub tracking_id: String,
    pub workflow_id: String,
    pub client_email: String,
    pub client_name: String,
    pub business_name: String,
    pub message_id: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub open_count: u32,
    #[serde(default)]
    pub click_count: u32,
    pub follow_up_sent_at: Option<DateTime<Utc>>,
}

impl TrackingRecord {
    pub fn engaged(&self) -> bool {
        self.opened_at.is_some() || self.clicked_at.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAnalytics {
    pub sent: usize,
    pub opened: usize,
    pub clicked: usize,
    pub follow_ups: usize,
    /// Percentage of sent emails that were opened
    pub open_rate: f64,
    /// Percentage of sent emails that were clicked
    pub click_rate: f64,
}

/// 16 random bytes, hex encoded
pub fn generate_tracking_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Append UTM and `tid` parameters to `url`
pub fn add_tracking_params(url: &str, tracking_id: &str, source: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}utm_source=email&utm_medium=mockup-proposal&utm_campaign={tid}&utm_content={}&tid={tid}",
        url,
        separator,
        source,
        tid = tracking_id
    )
}

#[derive(Clone)]
pub struct TrackingStore {
    records: Arc<DashMap<String, TrackingRecord>>,
    dir: Option<JsonDir>,
}

impl TrackingStore {
    /// Store persisted under `root`; existing records are loaded
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let dir = JsonDir::open(root).await?;
        let records = DashMap::new();
        for record in dir.list::<TrackingRecord>().await? {
            records.insert(record.tracking_id.clone(), record);
        }
        debug!(records = records.len(), "Email tracking store opened");
        Ok(Self {
            records: Arc::new(records),
            dir: Some(dir),
        })
    }

    /// Memory-only store
    pub fn in_memory() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            dir: None,
        }
    }

    pub fn get(&self, tracking_id: &str) -> Option<TrackingRecord> {
        self.records.get(tracking_id).map(|r| r.clone())
    }

    pub async fn insert(&self, record: TrackingRecord) -> Result<()> {
        self.persist(&record).await?;
        self.records.insert(record.tracking_id.clone(), record);
        Ok(())
    }

    /// Record an open; returns false for unknown ids
    pub async fn record_open(&self, tracking_id: &str) -> Result<bool> {
        self.modify(tracking_id, |r| {
            r.open_count += 1;
            if r.opened_at.is_none() {
                r.opened_at = Some(Utc::now());
                info!(tracking_id = %r.tracking_id, workflow_id = %r.workflow_id, "Email opened");
            }
        })
        .await
    }

    /// Record a click; a click implies an open
    pub async fn record_click(&self, tracking_id: &str) -> Result<bool> {
        self.modify(tracking_id, |r| {
            r.click_count += 1;
            let now = Utc::now();
            if r.clicked_at.is_none() {
                r.clicked_at = Some(now);
                info!(tracking_id = %r.tracking_id, workflow_id = %r.workflow_id, "Email clicked");
            }
            r.opened_at.get_or_insert(now);
        })
        .await
    }

    pub async fn record_follow_up(&self, tracking_id: &str) -> Result<bool> {
        self.modify(tracking_id, |r| {
            r.follow_up_sent_at = Some(Utc::now());
        })
        .await
    }

    async fn modify<F>(&self, tracking_id: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut TrackingRecord),
    {
        let updated = match self.records.get_mut(tracking_id) {
            Some(mut record) => {
                f(&mut record);
                record.clone()
            }
            None => {
                warn!(tracking_id = %tracking_id, "Unknown tracking id");
                return Ok(false);
            }
        };
        self.persist(&updated).await?;
        Ok(true)
    }

    async fn persist(&self, record: &TrackingRecord) -> Result<()> {
        if let Some(dir) = &self.dir {
            dir.write(&record.tracking_id, record).await?;
        }
        Ok(())
    }

    /// Aggregate counts, optionally restricted to one workflow
    pub fn analytics(&self, workflow_id: Option<&str>) -> EmailAnalytics {
        let mut stats = EmailAnalytics::default();
        for entry in self.records.iter() {
            let record = entry.value();
            if workflow_id.is_some_and(|id| id != record.workflow_id) {
                continue;
            }
            stats.sent += 1;
            if record.opened_at.is_some() {
                stats.opened += 1;
            }
            if record.clicked_at.is_some() {
                stats.clicked += 1;
            }
            if record.follow_up_sent_at.is_some() {
                stats.follow_ups += 1;
            }
        }
        if stats.sent > 0 {
            stats.open_rate = percentage(stats.opened, stats.sent);
            stats.click_rate = percentage(stats.clicked, stats.sent);
        }
        stats
    }

    pub fn records_for_workflow(&self, workflow_id: &str) -> Vec<TrackingRecord> {
        self.records
            .iter()
            .filter(|e| e.value().workflow_id == workflow_id)
            .map(|e| e.value().clone())
            .collect()
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    ((part as f64 / total as f64) * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(tid: &str, workflow: &str) -> TrackingRecord {
        TrackingRecord {
            tracking_id: tid.to_string(),
            workflow_id: workflow.to_string(),
            client_email: "client@example.fr".to_string(),
            client_name: "Jean".to_string(),
            business_name: "Dupont".to_string(),
            message_id: None,
            sent_at: Utc::now(),
            opened_at: None,
            clicked_at: None,
            open_count: 0,
            click_count: 0,
            follow_up_sent_at: None,
        }
    }

    #[test]
    fn test_tracking_id_shape() {
        let a = generate_tracking_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, generate_tracking_id());
    }

    #[test]
    fn test_add_tracking_params_separator() {
        let url = add_tracking_params("https://m.netlify.app", "abc", "mockup-classique");
        assert_eq!(
            url,
            "https://m.netlify.app?utm_source=email&utm_medium=mockup-proposal&utm_campaign=abc&utm_content=mockup-classique&tid=abc"
        );
        let compare = add_tracking_params("/compare-mockups?client=w1", "abc", "compare-all");
        assert!(compare.starts_with("/compare-mockups?client=w1&utm_source=email"));
    }

    #[tokio::test]
    async fn test_first_open_is_kept() {
        let store = TrackingStore::in_memory();
        store.insert(record("t1", "w1")).await.unwrap();

        assert!(store.record_open("t1").await.unwrap());
        let first = store.get("t1").unwrap().opened_at;
        assert!(store.record_open("t1").await.unwrap());

        let rec = store.get("t1").unwrap();
        assert_eq!(rec.opened_at, first);
        assert_eq!(rec.open_count, 2);
        assert!(!store.record_open("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_analytics_and_persistence() {
        let tmp = TempDir::new().unwrap();
        let store = TrackingStore::open(tmp.path()).await.unwrap();
        store.insert(record("t1", "w1")).await.unwrap();
        store.insert(record("t2", "w1")).await.unwrap();
        store.insert(record("t3", "w2")).await.unwrap();
        store.record_click("t1").await.unwrap();

        let all = store.analytics(None);
        assert_eq!(all.sent, 3);
        assert_eq!(all.opened, 1);
        assert_eq!(all.clicked, 1);
        assert_eq!(all.open_rate, 33.3);

        let reopened = TrackingStore::open(tmp.path()).await.unwrap();
        let w1 = reopened.analytics(Some("w1"));
        assert_eq!(w1.sent, 2);
        assert_eq!(w1.click_rate, 50.0);
    }
}
