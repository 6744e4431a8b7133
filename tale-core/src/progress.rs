//! Playback progress persisted across sessions (`consistent.json`).
//!
//! Tracks the story the user last opened and, per story, the last scene they
//! reached. A missing or malformed document is silently replaced with an empty
//! one; only failures to write it back are reported.

use crate::config::LibraryConfig;
use crate::story::{resolve_story_info, StoryError, StoryInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from progress tracking.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Story error: {0}")]
    Story(#[from] StoryError),
}

/// The last scene reached in one story.
///
/// `scene` may be `null` in the document; such entries carry no progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScene {
    pub story_path: PathBuf,
    pub scene: Option<PathBuf>,
}

impl SavedScene {
    pub fn new(story_path: impl Into<PathBuf>, scene: impl Into<PathBuf>) -> Self {
        Self {
            story_path: story_path.into(),
            scene: Some(scene.into()),
        }
    }
}

/// App-wide playback state.
///
/// Both fields must be present in the document (they may be `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistentData {
    #[serde(deserialize_with = "Option::deserialize")]
    pub last_opened_story_path: Option<PathBuf>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub saved_scenes: Option<Vec<SavedScene>>,
}

/// Reads and writes the playback state document.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    path: PathBuf,
}

impl ProgressTracker {
    /// Tracker for the library described by `config`.
    pub fn new(config: &LibraryConfig) -> Self {
        Self::at(config.consistent_data_path())
    }

    /// Tracker backed by the document at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the document with an empty state.
    pub async fn initialize_consistent_data(&self) -> Result<ConsistentData, ProgressError> {
        let empty = ConsistentData::default();
        self.update_consistent_data(&empty).await?;
        Ok(empty)
    }

    /// Read the document, failing on any read or parse error.
    pub async fn resolve_consistent_data(&self) -> Result<ConsistentData, ProgressError> {
        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the document, resetting it to empty if it is missing or invalid.
    pub async fn safe_resolve_consistent_data(&self) -> Result<ConsistentData, ProgressError> {
        match self.resolve_consistent_data().await {
            Ok(data) => Ok(data),
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "resetting playback state"
                );
                self.initialize_consistent_data().await
            }
        }
    }

    pub async fn update_consistent_data(&self, data: &ConsistentData) -> Result<(), ProgressError> {
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Record `story_dir` as the last opened story (`None` clears it).
    pub async fn update_last_played(&self, story_dir: Option<&Path>) -> Result<(), ProgressError> {
        let mut data = self.safe_resolve_consistent_data().await?;
        data.last_opened_story_path = story_dir.map(Path::to_path_buf);
        self.update_consistent_data(&data).await
    }

    /// Record the scene reached in a story, replacing any earlier entry.
    pub async fn update_user_story_progress(
        &self,
        scene_to_save: SavedScene,
    ) -> Result<(), ProgressError> {
        let mut data = self.safe_resolve_consistent_data().await?;
        let saved = data.saved_scenes.get_or_insert_with(Vec::new);

        match saved
            .iter_mut()
            .find(|entry| entry.story_path == scene_to_save.story_path)
        {
            Some(entry) => entry.scene = scene_to_save.scene,
            None => saved.push(scene_to_save),
        }

        self.update_consistent_data(&data).await
    }

    /// Scene the user last reached in `story`.
    ///
    /// Entries without a scene are skipped, and a saved scene equal to the
    /// entry point counts as no progress.
    pub async fn story_progress(
        &self,
        story: &StoryInfo,
    ) -> Result<Option<PathBuf>, ProgressError> {
        let data = self.safe_resolve_consistent_data().await?;
        let scene = data
            .saved_scenes
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| entry.story_path == story.base_dir)
            .find_map(|entry| entry.scene);

        Ok(scene.filter(|scene| *scene != story.entry_point))
    }

    /// Point every record of the story at `from` to its new directory `to`.
    ///
    /// Saved scenes inside the story are rebased onto `to`.
    pub async fn relocate_story(&self, from: &Path, to: &Path) -> Result<(), ProgressError> {
        let mut data = self.safe_resolve_consistent_data().await?;
        let mut changed = false;

        if data.last_opened_story_path.as_deref() == Some(from) {
            data.last_opened_story_path = Some(to.to_path_buf());
            changed = true;
        }
        for entry in data.saved_scenes.iter_mut().flatten() {
            if entry.story_path.as_path() != from {
                continue;
            }
            let rebased = entry
                .scene
                .as_deref()
                .and_then(|scene| scene.strip_prefix(from).ok())
                .map(|relative| to.join(relative));
            entry.story_path = to.to_path_buf();
            if rebased.is_some() {
                entry.scene = rebased;
            }
            changed = true;
        }

        if changed {
            tracing::debug!(from = %from.display(), to = %to.display(), "relocated progress");
            self.update_consistent_data(&data).await?;
        }
        Ok(())
    }

    pub async fn story_has_progress(&self, story: &StoryInfo) -> Result<bool, ProgressError> {
        Ok(self.story_progress(story).await?.is_some())
    }

    /// Whether the last opened story still exists.
    ///
    /// A stale entry is cleared.
    pub async fn continuable(&self) -> Result<bool, ProgressError> {
        let data = self.safe_resolve_consistent_data().await?;
        let exists = match &data.last_opened_story_path {
            Some(path) => fs::try_exists(path).await?,
            None => false,
        };

        if !exists && data.last_opened_story_path.is_some() {
            self.update_last_played(None).await?;
        }
        Ok(exists)
    }

    /// Title of the story that can be continued, if any.
    pub async fn continuable_story_name(&self) -> Result<Option<String>, ProgressError> {
        if !self.continuable().await? {
            return Ok(None);
        }
        let data = self.safe_resolve_consistent_data().await?;
        match data.last_opened_story_path {
            Some(path) => Ok(Some(resolve_story_info(&path).await?.title)),
            None => Ok(None),
        }
    }

    /// Directory of the story that can be continued, if any.
    pub async fn continuable_story(&self) -> Result<Option<PathBuf>, ProgressError> {
        if !self.continuable().await? {
            return Ok(None);
        }
        Ok(self
            .safe_resolve_consistent_data()
            .await?
            .last_opened_story_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestLibrary;

    #[tokio::test]
    async fn test_missing_document_self_heals() {
        let lib = TestLibrary::new().await;
        let tracker = ProgressTracker::new(&lib.config);

        let data = tracker.safe_resolve_consistent_data().await.unwrap();
        assert_eq!(data, ConsistentData::default());
        assert!(tracker.path().exists());
    }

    #[tokio::test]
    async fn test_document_missing_fields_is_reset() {
        let lib = TestLibrary::new().await;
        let tracker = ProgressTracker::new(&lib.config);
        std::fs::write(tracker.path(), r#"{"lastOpenedStoryPath": "/x"}"#).unwrap();

        assert!(tracker.resolve_consistent_data().await.is_err());
        let data = tracker.safe_resolve_consistent_data().await.unwrap();
        assert_eq!(data, ConsistentData::default());
    }

    #[tokio::test]
    async fn test_document_shape() {
        let lib = TestLibrary::new().await;
        let tracker = ProgressTracker::new(&lib.config);
        tracker
            .update_user_story_progress(SavedScene::new("/s", "/s/scenes/A.json"))
            .await
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(tracker.path()).unwrap()).unwrap();
        assert!(json["lastOpenedStoryPath"].is_null());
        assert_eq!(json["savedScenes"][0]["storyPath"], "/s");
        assert_eq!(json["savedScenes"][0]["scene"], "/s/scenes/A.json");
    }

    #[tokio::test]
    async fn test_progress_updates_in_place() {
        let lib = TestLibrary::new().await;
        let tracker = ProgressTracker::new(&lib.config);

        for scene in ["A", "B"] {
            tracker
                .update_user_story_progress(SavedScene::new(
                    "/one",
                    format!("/one/scenes/{scene}.json"),
                ))
                .await
                .unwrap();
        }
        tracker
            .update_user_story_progress(SavedScene::new("/two", "/two/scenes/A.json"))
            .await
            .unwrap();

        let saved = tracker
            .resolve_consistent_data()
            .await
            .unwrap()
            .saved_scenes
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].scene, Some(PathBuf::from("/one/scenes/B.json")));
    }

    #[tokio::test]
    async fn test_progress_at_entry_point_is_none() {
        let lib = TestLibrary::new().await;
        let story_dir = lib.create_sample_story().await;
        let story = resolve_story_info(&story_dir).await.unwrap();
        let tracker = ProgressTracker::new(&lib.config);

        assert_eq!(tracker.story_progress(&story).await.unwrap(), None);

        tracker
            .update_user_story_progress(SavedScene::new(&story.base_dir, &story.entry_point))
            .await
            .unwrap();
        assert_eq!(tracker.story_progress(&story).await.unwrap(), None);
        assert!(!tracker.story_has_progress(&story).await.unwrap());

        let second = story.base_dir.join("scenes").join("Second Scene.json");
        tracker
            .update_user_story_progress(SavedScene::new(&story.base_dir, &second))
            .await
            .unwrap();
        assert_eq!(tracker.story_progress(&story).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_null_scene_entry_keeps_other_progress() {
        let lib = TestLibrary::new().await;
        let story_dir = lib.create_sample_story().await;
        let story = resolve_story_info(&story_dir).await.unwrap();
        let tracker = ProgressTracker::new(&lib.config);
        let second = story.base_dir.join("scenes").join("Second Scene.json");

        let document = serde_json::json!({
            "lastOpenedStoryPath": story.base_dir,
            "savedScenes": [
                { "storyPath": "/elsewhere", "scene": null },
                { "storyPath": story.base_dir, "scene": second },
            ],
        });
        std::fs::write(tracker.path(), document.to_string()).unwrap();

        let data = tracker.safe_resolve_consistent_data().await.unwrap();
        assert_eq!(data.saved_scenes.as_ref().map(Vec::len), Some(2));
        assert_eq!(data.last_opened_story_path.as_deref(), Some(story.base_dir.as_path()));
        assert_eq!(tracker.story_progress(&story).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_null_scene_counts_as_no_progress() {
        let lib = TestLibrary::new().await;
        let story_dir = lib.create_sample_story().await;
        let story = resolve_story_info(&story_dir).await.unwrap();
        let tracker = ProgressTracker::new(&lib.config);

        tracker
            .update_user_story_progress(SavedScene {
                story_path: story.base_dir.clone(),
                scene: None,
            })
            .await
            .unwrap();
        assert_eq!(tracker.story_progress(&story).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_relocate_story_rebases_records() {
        let lib = TestLibrary::new().await;
        let tracker = ProgressTracker::new(&lib.config);
        let from = PathBuf::from("/lib/workspace/abc");
        let to = PathBuf::from("/lib/collections/abc");

        tracker.update_last_played(Some(from.as_path())).await.unwrap();
        tracker
            .update_user_story_progress(SavedScene::new(&from, from.join("scenes/B.json")))
            .await
            .unwrap();
        tracker
            .update_user_story_progress(SavedScene::new("/other", "/other/scenes/A.json"))
            .await
            .unwrap();

        tracker.relocate_story(&from, &to).await.unwrap();

        let data = tracker.resolve_consistent_data().await.unwrap();
        assert_eq!(data.last_opened_story_path, Some(to.clone()));
        let saved = data.saved_scenes.unwrap();
        assert_eq!(saved[0], SavedScene::new(&to, to.join("scenes/B.json")));
        assert_eq!(saved[1], SavedScene::new("/other", "/other/scenes/A.json"));
    }

    #[tokio::test]
    async fn test_continuable_clears_stale_story() {
        let lib = TestLibrary::new().await;
        let tracker = ProgressTracker::new(&lib.config);
        let story_dir = lib.create_sample_story().await;

        assert!(!tracker.continuable().await.unwrap());

        tracker
            .update_last_played(Some(story_dir.as_path()))
            .await
            .unwrap();
        assert!(tracker.continuable().await.unwrap());
        assert_eq!(
            tracker.continuable_story_name().await.unwrap().as_deref(),
            Some("Sample Story")
        );

        std::fs::remove_dir_all(&story_dir).unwrap();
        assert!(!tracker.continuable().await.unwrap());
        let data = tracker.resolve_consistent_data().await.unwrap();
        assert!(data.last_opened_story_path.is_none());
    }
}
