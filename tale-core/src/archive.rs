//! Story export, import and relocation.
//!
//! Compression is an injected [`ArchiveBackend`] so the story bookkeeping can
//! be exercised without producing real archives (see
//! [`crate::testing::MockArchiver`]). [`ZipArchiver`] is the default backend.

use crate::config::{LibraryConfig, StoryLocation};
use crate::progress::{ProgressError, ProgressTracker};
use crate::story::{resolve_story_info, StoryError, StoryInfo};
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Errors from archive operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive task failed: {0}")]
    JoinFailed(#[from] tokio::task::JoinError),

    #[error("{} does not contain a story: {source}", .path.display())]
    InvalidArchive {
        path: PathBuf,
        #[source]
        source: StoryError,
    },

    #[error("Story error: {0}")]
    Story(#[from] StoryError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),
}

/// Packs a directory into an archive file and back.
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Pack the contents of `source_dir` into `destination`.
    async fn compress(
        &self,
        source_dir: &Path,
        destination: &Path,
    ) -> Result<PathBuf, ArchiveError>;

    /// Unpack `archive` into `destination_dir`, creating it if needed.
    async fn decompress(
        &self,
        archive: &Path,
        destination_dir: &Path,
    ) -> Result<PathBuf, ArchiveError>;
}

/// Deflate-compressed zip archives.
///
/// Entries are stored relative to the story directory with `/` separators.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
    }

    fn add_dir(zip: &mut ZipWriter<File>, dir: &Path, prefix: &str) -> Result<(), ArchiveError> {
        let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let entry_name = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let path = entry.path();

            if path.is_dir() {
                zip.add_directory(entry_name.as_str(), Self::options())?;
                Self::add_dir(zip, &path, &entry_name)?;
            } else {
                zip.start_file(entry_name.as_str(), Self::options())?;
                io::copy(&mut File::open(&path)?, zip)?;
            }
        }
        Ok(())
    }

    fn compress_blocking(source_dir: &Path, destination: &Path) -> Result<(), ArchiveError> {
        let mut zip = ZipWriter::new(File::create(destination)?);
        Self::add_dir(&mut zip, source_dir, "")?;
        zip.finish()?;
        Ok(())
    }

    fn decompress_blocking(archive: &Path, destination_dir: &Path) -> Result<(), ArchiveError> {
        let mut archive = ZipArchive::new(File::open(archive)?)?;
        std::fs::create_dir_all(destination_dir)?;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            // Entries escaping the destination are skipped.
            let Some(relative) = file.enclosed_name() else {
                tracing::warn!(entry = file.name(), "skipping unsafe archive entry");
                continue;
            };
            let output = destination_dir.join(relative);

            if file.is_dir() {
                std::fs::create_dir_all(&output)?;
            } else {
                if let Some(parent) = output.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                io::copy(&mut file, &mut File::create(&output)?)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveBackend for ZipArchiver {
    async fn compress(
        &self,
        source_dir: &Path,
        destination: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        let source_dir = source_dir.to_path_buf();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            Self::compress_blocking(&source_dir, &destination).map(|()| destination)
        })
        .await?
    }

    async fn decompress(
        &self,
        archive: &Path,
        destination_dir: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        let archive = archive.to_path_buf();
        let destination_dir = destination_dir.to_path_buf();
        tokio::task::spawn_blocking(move || {
            Self::decompress_blocking(&archive, &destination_dir).map(|()| destination_dir)
        })
        .await?
    }
}

/// Moves stories in and out of the library.
pub struct StorySaveManager<A: ArchiveBackend> {
    config: LibraryConfig,
    backend: A,
}

impl StorySaveManager<ZipArchiver> {
    pub fn with_zip(config: LibraryConfig) -> Self {
        Self::new(config, ZipArchiver)
    }
}

impl<A: ArchiveBackend> StorySaveManager<A> {
    pub fn new(config: LibraryConfig, backend: A) -> Self {
        Self { config, backend }
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    /// Pack `story` into the archive file `destination`.
    pub async fn export_story(
        &self,
        story: &StoryInfo,
        destination: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        let archive = self.backend.compress(&story.base_dir, destination).await?;
        tracing::info!(story = %story.title, archive = %archive.display(), "exported story");
        Ok(archive)
    }

    /// Unpack `archive` into a fresh directory at `location`.
    ///
    /// The unpacked tree must contain a readable story document. If unpacking
    /// or validation fails, the partly written directory is removed again.
    pub async fn import_story(
        &self,
        archive: &Path,
        location: StoryLocation,
    ) -> Result<StoryInfo, ArchiveError> {
        let destination = self
            .config
            .dir_for(location)
            .join(Uuid::new_v4().to_string());
        let unpacked = match self.backend.decompress(archive, &destination).await {
            Ok(unpacked) => unpacked,
            Err(e) => {
                Self::discard_import(&destination).await;
                return Err(e);
            }
        };

        match resolve_story_info(&unpacked).await {
            Ok(story) => {
                tracing::info!(
                    story = %story.title,
                    location = location.name(),
                    "imported story"
                );
                Ok(story)
            }
            Err(source) => {
                Self::discard_import(&unpacked).await;
                Err(ArchiveError::InvalidArchive {
                    path: archive.to_path_buf(),
                    source,
                })
            }
        }
    }

    async fn discard_import(dir: &Path) {
        match fs::remove_dir_all(dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "failed to clean up import");
            }
        }
    }

    /// Move `story` to `location`, keeping its directory name.
    ///
    /// Returns the new story directory; a story already there is left alone.
    /// Playback progress recorded under the old directory follows the story.
    pub async fn move_story(
        &self,
        story: &StoryInfo,
        location: StoryLocation,
    ) -> Result<PathBuf, ArchiveError> {
        let root = self.config.dir_for(location);
        if story.base_dir.parent() == Some(root) {
            return Ok(story.base_dir.clone());
        }

        let dir_name = story.base_dir.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "story has no directory name")
        })?;
        let destination = root.join(dir_name);
        if fs::try_exists(&destination).await? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", destination.display()),
            )
            .into());
        }

        fs::rename(&story.base_dir, &destination).await?;
        ProgressTracker::new(&self.config)
            .relocate_story(&story.base_dir, &destination)
            .await?;
        tracing::info!(
            story = %story.title,
            to = location.name(),
            "moved story"
        );
        Ok(destination)
    }
}
