//! Workflow persistence
//!
//! [`JsonWorkflowStore`] keeps every workflow in a [`DashMap`] index and writes each
//! change through to `workflows/{id}.json`, so state survives a restart. Mutations are
//! serialized by a write lock; reads never wait on disk.

use crate::domain::{Workflow, WorkflowStatus, WorkflowUpdate};
use crate::{PipelineError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use utils::JsonDir;

/// Storage seam used by the orchestrator and the API
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Insert a new workflow; a taken id moves to the next free one.
    /// The returned workflow carries the id actually stored.
    async fn create(&self, workflow: Workflow) -> Result<Workflow>;

    async fn get(&self, id: &str) -> Result<Option<Workflow>>;

    /// Transition the status, enforcing the status machine
    async fn update_status(&self, id: &str, status: WorkflowStatus) -> Result<Workflow>;

    /// Apply a partial update
    async fn update(&self, id: &str, update: WorkflowUpdate) -> Result<Workflow>;

    /// All workflows, newest first
    async fn list(&self) -> Result<Vec<Workflow>>;

    async fn count_by_status(&self) -> Result<BTreeMap<WorkflowStatus, usize>>;
}

/// JSON-file backed store with an in-memory index
#[derive(Clone)]
pub struct JsonWorkflowStore {
    index: Arc<DashMap<String, Workflow>>,
    dir: JsonDir,
    write_lock: Arc<Mutex<()>>,
}

impl JsonWorkflowStore {
    /// Open the store and load every persisted workflow
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let dir = JsonDir::open(root).await?;
        let index = DashMap::new();

        for key in dir.keys().await? {
            match dir.read::<Workflow>(&key).await {
                Ok(Some(workflow)) => {
                    index.insert(workflow.id.clone(), workflow);
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable workflow file"),
            }
        }

        info!(root = %dir.root().display(), workflows = index.len(), "Workflow store opened");

        Ok(Self {
            index: Arc::new(index),
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// `workflow-{ms}` ids step to the next free millisecond; any other id gets a `-n` suffix.
    /// Callers hold the write lock.
    fn next_free_id(&self, taken: &str) -> String {
        if let Some(ms) = taken
            .strip_prefix("workflow-")
            .and_then(|n| n.parse::<i64>().ok())
        {
            let mut next = ms + 1;
            while self.index.contains_key(&format!("workflow-{}", next)) {
                next += 1;
            }
            return format!("workflow-{}", next);
        }
        let mut n = 2;
        while self.index.contains_key(&format!("{}-{}", taken, n)) {
            n += 1;
        }
        format!("{}-{}", taken, n)
    }

    async fn mutate<F>(&self, id: &str, f: F) -> Result<Workflow>
    where
        F: FnOnce(&mut Workflow) -> Result<()>,
    {
        let _guard = self.write_lock.lock().await;

        let mut workflow = self
            .index
            .get(id)
            .map(|w| w.clone())
            .ok_or_else(|| PipelineError::NotFound(format!("Workflow non trouvé: {}", id)))?;

        f(&mut workflow)?;

        self.dir.write(&workflow.id, &workflow).await?;
        self.index.insert(workflow.id.clone(), workflow.clone());

        debug!(workflow_id = %id, status = %workflow.status, "Workflow updated");
        Ok(workflow)
    }
}

#[async_trait]
impl WorkflowStore for JsonWorkflowStore {
    async fn create(&self, mut workflow: Workflow) -> Result<Workflow> {
        let _guard = self.write_lock.lock().await;

        if self.index.contains_key(&workflow.id) {
            let free = self.next_free_id(&workflow.id);
            debug!(taken = %workflow.id, workflow_id = %free, "Workflow id taken, moved");
            workflow.id = free;
        }

        self.dir.write(&workflow.id, &workflow).await?;
        self.index.insert(workflow.id.clone(), workflow.clone());

        info!(workflow_id = %workflow.id, business = %workflow.client.business_name, "Workflow created");
        Ok(workflow)
    }

    async fn get(&self, id: &str) -> Result<Option<Workflow>> {
        Ok(self.index.get(id).map(|w| w.clone()))
    }

    async fn update_status(&self, id: &str, status: WorkflowStatus) -> Result<Workflow> {
        self.mutate(id, |w| w.transition(status)).await
    }

    async fn update(&self, id: &str, update: WorkflowUpdate) -> Result<Workflow> {
        self.mutate(id, |w| w.apply(update)).await
    }

    async fn list(&self) -> Result<Vec<Workflow>> {
        let mut all: Vec<Workflow> = self.index.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn count_by_status(&self) -> Result<BTreeMap<WorkflowStatus, usize>> {
        let mut counts = BTreeMap::new();
        for entry in self.index.iter() {
            *counts.entry(entry.value().status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClientFormData;
    use tempfile::TempDir;

    fn client(name: &str) -> ClientFormData {
        ClientFormData {
            business_name: name.to_string(),
            business_type: "plombier".to_string(),
            email: "contact@example.fr".to_string(),
            telephone: "0601020304".to_string(),
            ville: "Lyon".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_get_and_reload() {
        let tmp = TempDir::new().unwrap();
        let store = JsonWorkflowStore::open(tmp.path()).await.unwrap();

        let wf = Workflow::new(client("Dupont")).with_id("workflow-1");
        store.create(wf).await.unwrap();
        store
            .update_status("workflow-1", WorkflowStatus::Preparing)
            .await
            .unwrap();

        let reopened = JsonWorkflowStore::open(tmp.path()).await.unwrap();
        let loaded = reopened.get("workflow-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, WorkflowStatus::Preparing);
        assert_eq!(loaded.client.business_name, "Dupont");
    }

    #[tokio::test]
    async fn test_taken_id_and_missing() {
        let tmp = TempDir::new().unwrap();
        let store = JsonWorkflowStore::open(tmp.path()).await.unwrap();

        store
            .create(Workflow::new(client("A")).with_id("workflow-a"))
            .await
            .unwrap();
        let second = store
            .create(Workflow::new(client("A")).with_id("workflow-a"))
            .await
            .unwrap();
        assert_eq!(second.id, "workflow-a-2");
        assert_eq!(store.len(), 2);
        assert!(matches!(
            store.update_status("nope", WorkflowStatus::Preparing).await,
            Err(PipelineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_transition_is_not_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = JsonWorkflowStore::open(tmp.path()).await.unwrap();
        store
            .create(Workflow::new(client("B")).with_id("workflow-b"))
            .await
            .unwrap();

        let err = store
            .update_status("workflow-b", WorkflowStatus::Deployed)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidStateTransition { .. }));

        let wf = store.get("workflow-b").await.unwrap().unwrap();
        assert_eq!(wf.status, WorkflowStatus::FormReceived);
    }

    #[tokio::test]
    async fn test_count_by_status() {
        let tmp = TempDir::new().unwrap();
        let store = JsonWorkflowStore::open(tmp.path()).await.unwrap();
        for i in 0..3 {
            store
                .create(Workflow::new(client("C")).with_id(format!("workflow-{}", i)))
                .await
                .unwrap();
        }
        store
            .update("workflow-0", WorkflowUpdate::failed("boom"))
            .await
            .unwrap();

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts.get(&WorkflowStatus::FormReceived), Some(&2));
        assert_eq!(counts.get(&WorkflowStatus::Error), Some(&1));
        assert_eq!(store.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_same_millisecond_ids_all_stored() {
        let tmp = TempDir::new().unwrap();
        let store = JsonWorkflowStore::open(tmp.path()).await.unwrap();

        let mut ids = std::collections::HashSet::new();
        for _ in 0..20 {
            let wf = store
                .create(Workflow::new(client("D")).with_id("workflow-1700000000000"))
                .await
                .unwrap();
            ids.insert(wf.id);
        }
        assert_eq!(ids.len(), 20);
        assert!(ids.contains("workflow-1700000000019"));

        let reopened = JsonWorkflowStore::open(tmp.path()).await.unwrap();
        assert_eq!(reopened.len(), 20);
    }
}
