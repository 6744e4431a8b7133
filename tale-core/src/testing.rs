//! Testing utilities for story libraries.
//!
//! This module provides tools for integration testing:
//! - `MockArchiver` to exercise import/export without producing archives
//! - `TestLibrary` for a throwaway library rooted in a temporary directory

use crate::archive::{ArchiveBackend, ArchiveError};
use crate::collection::StoryCreator;
use crate::config::{LibraryConfig, StoryLocation};
use crate::paths::names;
use crate::scene::{scene_path_for_name, write_stored_scene, StoredScene};
use crate::story::{write_stored_story_info, StoredStoryInfo};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use tokio::fs;

/// Title given to stories made by [`TestLibrary::create_sample_story`].
pub const SAMPLE_STORY_TITLE: &str = "Sample Story";

/// An archive backend that copies directory trees instead of packing them.
///
/// The "archive" it produces is a plain directory, so `decompress` only
/// accepts output of `compress`. Every call is recorded.
#[derive(Debug, Default)]
pub struct MockArchiver {
    fail: bool,
    compress_calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    decompress_calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl MockArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(source, destination)` of every `compress` call so far.
    pub fn compress_calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.compress_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// `(archive, destination)` of every `decompress` call so far.
    pub fn decompress_calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.decompress_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(calls: &Mutex<Vec<(PathBuf, PathBuf)>>, from: &Path, to: &Path) {
        if let Ok(mut calls) = calls.lock() {
            calls.push((from.to_path_buf(), to.to_path_buf()));
        }
    }

    fn check(&self) -> Result<(), ArchiveError> {
        if self.fail {
            return Err(io::Error::other("mock archiver failure").into());
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveBackend for MockArchiver {
    async fn compress(
        &self,
        source_dir: &Path,
        destination: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        Self::record(&self.compress_calls, source_dir, destination);
        self.check()?;
        copy_tree(source_dir, destination).await?;
        Ok(destination.to_path_buf())
    }

    async fn decompress(
        &self,
        archive: &Path,
        destination_dir: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        Self::record(&self.decompress_calls, archive, destination_dir);
        self.check()?;
        copy_tree(archive, destination_dir).await?;
        Ok(destination_dir.to_path_buf())
    }
}

/// Recursively copy the directory `from` to `to`.
pub async fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst).await?;
        let mut entries = fs::read_dir(&src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = dst.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), target).await?;
            }
        }
    }
    Ok(())
}

/// A story library in a temporary directory, removed on drop.
pub struct TestLibrary {
    _temp: TempDir,
    pub config: LibraryConfig,
}

impl TestLibrary {
    /// Create and initialize an empty library.
    pub async fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let config = LibraryConfig::init(temp.path().join("tale"))
            .await
            .expect("failed to initialize library");
        Self {
            _temp: temp,
            config,
        }
    }

    /// Create an empty story directory with `scenes/` and `resources/`.
    pub async fn story_dir(&self, location: StoryLocation, name: &str) -> PathBuf {
        let dir = self.config.dir_for(location).join(name);
        for sub in [names::SCENES_DIR, names::RESOURCES_DIR] {
            fs::create_dir_all(dir.join(sub))
                .await
                .expect("failed to create story dir");
        }
        dir
    }

    /// Create a templated workspace story titled [`SAMPLE_STORY_TITLE`].
    pub async fn create_sample_story(&self) -> PathBuf {
        let mut creator = StoryCreator::new(self.config.clone())
            .await
            .expect("failed to open workspace");
        creator
            .create_new_story(SAMPLE_STORY_TITLE, "", "")
            .await
            .expect("failed to create sample story")
    }

    /// Write a raw story document into a new story directory.
    pub async fn write_story(
        &self,
        location: StoryLocation,
        name: &str,
        stored: &StoredStoryInfo,
    ) -> PathBuf {
        let dir = self.story_dir(location, name).await;
        write_stored_story_info(stored, &dir)
            .await
            .expect("failed to write story");
        dir
    }

    /// Write a raw scene document called `scene_name` into `story_dir`.
    pub async fn write_scene(
        &self,
        story_dir: &Path,
        scene_name: &str,
        stored: &StoredScene,
    ) -> PathBuf {
        let path = scene_path_for_name(story_dir, scene_name);
        write_stored_scene(stored, &path)
            .await
            .expect("failed to write scene");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_archiver_round_trip() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;
        let archiver = MockArchiver::new();

        let packed = lib.config.app_data_dir.join("packed");
        archiver.compress(&story, &packed).await.unwrap();
        let unpacked = lib.config.app_data_dir.join("unpacked");
        archiver.decompress(&packed, &unpacked).await.unwrap();

        assert!(unpacked.join("gsg.json").is_file());
        assert!(unpacked.join("scenes").join("First Scene.json").is_file());
        assert_eq!(archiver.compress_calls(), vec![(story, packed.clone())]);
        assert_eq!(archiver.decompress_calls(), vec![(packed, unpacked)]);
    }

    #[tokio::test]
    async fn test_failing_archiver() {
        let lib = TestLibrary::new().await;
        let archiver = MockArchiver::failing();
        let result = archiver
            .compress(&lib.config.workspace_dir, &lib.config.app_data_dir.join("x"))
            .await;
        assert!(matches!(result, Err(ArchiveError::Io(_))));
        assert_eq!(archiver.compress_calls().len(), 1);
    }
}
