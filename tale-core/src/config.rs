//! Library root configuration.
//!
//! All components receive a [`LibraryConfig`] instead of resolving the
//! application data directory on their own, so tests can point the whole
//! library at a temporary directory.

use crate::paths::{ensure_dir_exists, names};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the application data directory.
pub const DATA_DIR_ENV: &str = "TALE_DATA_DIR";

/// Folder created under the platform data directory.
const APP_FOLDER: &str = "tale";

/// Which root a story lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoryLocation {
    /// Read-mostly library of playable stories.
    Collections,
    /// Drafts under active authoring.
    Workspace,
}

impl StoryLocation {
    /// Parse a user-supplied location name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "collections" | "collection" | "library" => Some(StoryLocation::Collections),
            "workspace" | "drafts" => Some(StoryLocation::Workspace),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoryLocation::Collections => "collections",
            StoryLocation::Workspace => "workspace",
        }
    }
}

/// Resolved root directories of a story library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub app_data_dir: PathBuf,
    pub collections_dir: PathBuf,
    pub workspace_dir: PathBuf,
}

impl LibraryConfig {
    /// Derive the library layout under `app_data_dir` without touching disk.
    pub fn new(app_data_dir: impl Into<PathBuf>) -> Self {
        let app_data_dir = app_data_dir.into();
        Self {
            collections_dir: app_data_dir.join(names::COLLECTIONS_DIR),
            workspace_dir: app_data_dir.join(names::WORKSPACE_DIR),
            app_data_dir,
        }
    }

    /// Derive the layout and create the root directories.
    pub async fn init(app_data_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let config = Self::new(app_data_dir);
        ensure_dir_exists(&config.app_data_dir).await?;
        ensure_dir_exists(&config.collections_dir).await?;
        ensure_dir_exists(&config.workspace_dir).await?;
        tracing::debug!(root = %config.app_data_dir.display(), "library initialized");
        Ok(config)
    }

    /// Initialize from `TALE_DATA_DIR`, falling back to the platform data directory.
    ///
    /// - Linux: ~/.local/share/tale
    /// - macOS: ~/Library/Application Support/tale
    /// - Windows: %APPDATA%\tale
    pub async fn from_env() -> io::Result<Self> {
        Self::init(Self::default_app_data_dir()?).await
    }

    fn default_app_data_dir() -> io::Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }

        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join(APP_FOLDER))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "could not determine user data directory",
                )
            })
    }

    /// Root directory for stories at `location`.
    pub fn dir_for(&self, location: StoryLocation) -> &Path {
        match location {
            StoryLocation::Collections => &self.collections_dir,
            StoryLocation::Workspace => &self.workspace_dir,
        }
    }

    /// Location of the app-wide playback state document.
    pub fn consistent_data_path(&self) -> PathBuf {
        self.app_data_dir.join(names::CONSISTENT_DATA)
    }
}
