//! A directory of JSON documents keyed by file stem.
//!
//! Writes go to a sibling temporary file first and are renamed into place, so a reader
//! never observes a half written document.

use crate::error::{Result, UtilsError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Handle on a directory holding `{key}.json` files.
#[derive(Debug, Clone)]
pub struct JsonDir {
    root: PathBuf,
}

impl JsonDir {
    /// Open (and create if needed) a JSON document directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document stored under `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }

    /// Serialize `value` as pretty JSON under `key`, replacing any previous document.
    pub async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{}.json.tmp", key));
        let body = serde_json::to_vec_pretty(value).map_err(|source| UtilsError::Document {
            path: path.clone(),
            source,
        })?;

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(path = %path.display(), "Wrote JSON document");
        Ok(path)
    }

    /// Read the document stored under `key`, `None` if it does not exist.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| UtilsError::Document { path, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the document stored under `key`. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List the keys of every stored document, sorted.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            if let Some(stem) = name.strip_suffix(".json") {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Load every document. Files that fail to parse are skipped with a warning.
    pub async fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for key in self.keys().await? {
            match self.read::<T>(&key).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping unreadable JSON document");
                }
            }
        }
        Ok(items)
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(UtilsError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let dir = JsonDir::open(tmp.path().join("docs")).await.unwrap();

        let doc = Doc { name: "plombier".to_string(), count: 3 };
        dir.write("p-1", &doc).await.unwrap();

        let loaded: Option<Doc> = dir.read("p-1").await.unwrap();
        assert_eq!(loaded, Some(doc));
        assert!(dir.read::<Doc>("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_files() {
        let tmp = TempDir::new().unwrap();
        let dir = JsonDir::open(tmp.path()).await.unwrap();

        dir.write("a", &Doc { name: "a".into(), count: 1 }).await.unwrap();
        dir.write("b", &Doc { name: "b".into(), count: 2 }).await.unwrap();
        tokio::fs::write(tmp.path().join("broken.json"), b"{ nope").await.unwrap();

        let docs: Vec<Doc> = dir.list().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(dir.keys().await.unwrap(), vec!["a", "b", "broken"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let tmp = TempDir::new().unwrap();
        let dir = JsonDir::open(tmp.path()).await.unwrap();
        dir.write("gone", &Doc { name: "x".into(), count: 0 }).await.unwrap();

        assert!(dir.remove("gone").await.unwrap());
        assert!(!dir.remove("gone").await.unwrap());
    }

    #[test]
    fn test_rejects_path_traversal() {
        assert!(matches!(validate_key("../etc/passwd"), Err(UtilsError::InvalidKey(_))));
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("workflow-1700000000000").is_ok());
    }
}
