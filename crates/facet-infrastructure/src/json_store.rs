//! Typed JSON file persistence.
//!
//! `JsonStore` is the single storage primitive behind the file-backed
//! repositories: one record per file, loaded whole and saved whole.
//! Loads fail open: a missing file, an empty file, or unparseable content
//! all yield the default value, never an error. Saves create the parent
//! directory on demand.

use facet_core::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// A JSON file holding one serialized record.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, treating every load failure as "empty".
    ///
    /// A parse failure is logged and discarded; the caller always gets a
    /// usable value.
    pub async fn load_or_default<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return T::default(),
        };

        if content.trim().is_empty() {
            return T::default();
        }

        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    "Discarding unparseable record at {:?}: {}",
                    self.path,
                    err
                );
                T::default()
            }
        }
    }

    /// Serializes and writes the record, creating the parent directory if
    /// it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an `Io` error when the directory or file cannot be written,
    /// or a `Serialization` error when the value cannot be encoded.
    pub async fn save<T>(&self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStore::new(temp_dir.path().join("missing.json"));

        let value: Vec<String> = store.load_or_default().await;
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corrupt.json");
        tokio::fs::write(&path, "{not valid json").await.unwrap();

        let store = JsonStore::new(path);
        let value: Vec<String> = store.load_or_default().await;
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("record.json");
        let store = JsonStore::new(path);

        store.save(&vec!["a".to_string()]).await.unwrap();

        let value: Vec<String> = store.load_or_default().await;
        assert_eq!(value, vec!["a".to_string()]);
    }
}
