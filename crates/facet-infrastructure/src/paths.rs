//! Unified path management for facet's persisted records.
//!
//! All durable state lives under the platform config directory:
//!
//! ```text
//! ~/.config/facet/
//! ├── config.json          # endpoint configuration
//! ├── conversations.json   # ordered conversation record
//! └── personas.json        # persona record
//! ```

use facet_core::{FacetError, Result};
use std::path::{Path, PathBuf};

/// Resolves the locations of facet's persisted records.
#[derive(Debug, Clone)]
pub struct FacetPaths {
    base: PathBuf,
}

impl FacetPaths {
    /// Creates path resolution rooted at the platform config directory,
    /// or at `base_dir` when given (for testing).
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the platform config directory cannot
    /// be determined.
    pub fn new(base_dir: Option<&Path>) -> Result<Self> {
        let base = match base_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .map(|dir| dir.join("facet"))
                .ok_or_else(|| FacetError::config("Cannot find config directory"))?,
        };
        Ok(Self { base })
    }

    /// The directory all records live in.
    pub fn config_dir(&self) -> &Path {
        &self.base
    }

    /// Path of the conversations record.
    pub fn conversations_file(&self) -> PathBuf {
        self.base.join("conversations.json")
    }

    /// Path of the personas record.
    pub fn personas_file(&self) -> PathBuf {
        self.base.join("personas.json")
    }

    /// Path of the endpoint configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }
}
