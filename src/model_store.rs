//! Model Store - filesystem persistence for trained artifacts
//!
//! Each artifact is one JSON document `<key>.json` inside the store directory.
//! Writes go to a temporary sibling and are renamed into place, so readers never
//! observe a partially written artifact.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Open a store rooted at `root`, creating the directory if absent
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create model directory: {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let path = self.path_for(key);
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read artifact: {:?}", path))?;
        let artifact = serde_json::from_slice(&bytes)
            .with_context(|| format!("Corrupt artifact: {:?}", path))?;
        tracing::debug!("Loaded artifact {:?} ({} bytes)", path, bytes.len());
        Ok(artifact)
    }

    pub fn save<T: Serialize>(&self, key: &str, artifact: &T) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create model directory: {:?}", self.root))?;

        let path = self.path_for(key);
        let tmp_path = self.root.join(format!(".{}.json.tmp", key));

        let bytes = serde_json::to_vec(artifact)
            .with_context(|| format!("Failed to serialize artifact '{}'", key))?;
        fs::write(&tmp_path, &bytes)
            .with_context(|| format!("Failed to write artifact: {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to move artifact into place: {:?}", path))?;

        tracing::info!("Saved artifact {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }
}
