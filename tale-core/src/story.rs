//! Story metadata documents (`gsg.json`).
//!
//! A story directory holds one metadata document, a `scenes/` folder of scene
//! documents and a `resources/` folder of media. The metadata document stores
//! `thumbnail` and `entry_point` relative to the story directory; the loaded
//! [`StoryInfo`] carries them as absolute paths.

use crate::config::{LibraryConfig, StoryLocation};
use crate::paths::{
    filtered_read_dir, names, path_str, relativize, resolve_stored, sanitize_path, DirEntryInfo,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from story document operations.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A story directory that could not be loaded during a scan.
#[derive(Debug, Error)]
#[error("skipped story at {}: {source}", .path.display())]
pub struct SkippedStory {
    pub path: PathBuf,
    #[source]
    pub source: StoryError,
}

/// Story metadata exactly as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredStoryInfo {
    pub title: String,
    pub description: String,
    pub author: String,
    pub creation_date: DateTime<Utc>,
    /// Relative to the story directory, `/`-separated.
    pub thumbnail: String,
    /// Relative to the story directory, `/`-separated.
    pub entry_point: String,
    /// Always empty on disk.
    #[serde(default)]
    pub base_dir: String,
}

/// Story metadata with every reference resolved to an absolute path.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryInfo {
    pub title: String,
    pub description: String,
    pub author: String,
    pub creation_date: DateTime<Utc>,
    pub thumbnail: PathBuf,
    /// Scene document playback starts at.
    pub entry_point: PathBuf,
    /// Story directory; never persisted.
    pub base_dir: PathBuf,
}

impl StoryInfo {
    /// Resolve a stored document found in `base_dir`.
    pub fn from_stored(stored: StoredStoryInfo, base_dir: &Path) -> Self {
        let base_dir = PathBuf::from(sanitize_path(&path_str(base_dir)));
        Self {
            title: stored.title,
            description: stored.description,
            author: stored.author,
            creation_date: stored.creation_date,
            thumbnail: resolve_stored(&base_dir, &stored.thumbnail),
            entry_point: resolve_stored(&base_dir, &stored.entry_point),
            base_dir,
        }
    }

    /// Stored form relative to `base_dir`, with `base_dir` blanked.
    pub fn to_stored(&self, base_dir: &Path) -> StoredStoryInfo {
        StoredStoryInfo {
            title: self.title.clone(),
            description: self.description.clone(),
            author: self.author.clone(),
            creation_date: self.creation_date,
            thumbnail: relativize(&self.thumbnail, base_dir),
            entry_point: relativize(&self.entry_point, base_dir),
            base_dir: String::new(),
        }
    }

    /// Path of the metadata document.
    pub fn document_path(&self) -> PathBuf {
        self.base_dir.join(names::STORY_DOCUMENT)
    }

    pub fn scenes_dir(&self) -> PathBuf {
        self.base_dir.join(names::SCENES_DIR)
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.base_dir.join(names::RESOURCES_DIR)
    }
}

/// Story metadata plus directory statistics for the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraStoryInfo {
    pub story: StoryInfo,
    pub resources_count: usize,
    pub scenes_count: usize,
}

/// Load the metadata document of the story in `base_dir`.
pub async fn resolve_story_info(base_dir: impl AsRef<Path>) -> Result<StoryInfo, StoryError> {
    let base_dir = base_dir.as_ref();
    let content = fs::read_to_string(base_dir.join(names::STORY_DOCUMENT)).await?;
    let stored: StoredStoryInfo = serde_json::from_str(&content)?;
    tracing::debug!(story = %base_dir.display(), title = %stored.title, "loaded story info");
    Ok(StoryInfo::from_stored(stored, base_dir))
}

/// Write `info` back into `base_dir` in its stored form.
pub async fn write_story_info_to_disk(
    info: &StoryInfo,
    base_dir: impl AsRef<Path>,
) -> Result<(), StoryError> {
    let base_dir = base_dir.as_ref();
    write_stored_story_info(&info.to_stored(base_dir), base_dir).await
}

/// Write an already-stored document into `base_dir`.
pub async fn write_stored_story_info(
    stored: &StoredStoryInfo,
    base_dir: impl AsRef<Path>,
) -> Result<(), StoryError> {
    let base_dir = base_dir.as_ref();
    let content = serde_json::to_string_pretty(stored)?;
    fs::write(base_dir.join(names::STORY_DOCUMENT), content).await?;
    tracing::debug!(story = %base_dir.display(), "wrote story info");
    Ok(())
}

/// Lazily load every story directory under `root`.
///
/// Each item is either a loaded story or the reason its directory was skipped.
pub async fn scan_stories(
    root: impl AsRef<Path>,
) -> Result<impl Stream<Item = Result<StoryInfo, SkippedStory>>, StoryError> {
    let entries = filtered_read_dir(root).await?;
    Ok(stream::iter(entries).then(|entry| async move {
        resolve_story_info(&entry.path)
            .await
            .map_err(|source| SkippedStory {
                path: entry.path,
                source,
            })
    }))
}

/// Load every readable story at `location`.
///
/// Listing is best-effort: directories that fail to load are logged and
/// skipped so one corrupt story never hides the rest.
pub async fn resolve_stories_from_fs(
    config: &LibraryConfig,
    location: StoryLocation,
) -> Result<Vec<StoryInfo>, StoryError> {
    let scan = scan_stories(config.dir_for(location)).await?;
    let stories = scan
        .filter_map(|result| async move {
            match result {
                Ok(story) => Some(story),
                Err(skipped) => {
                    tracing::warn!(
                        path = %skipped.path.display(),
                        error = %skipped.source,
                        "skipping unreadable story"
                    );
                    None
                }
            }
        })
        .collect::<Vec<_>>()
        .await;

    tracing::debug!(location = location.name(), count = stories.len(), "resolved stories");
    Ok(stories)
}

/// Load a story together with its resource and scene counts.
pub async fn resolve_extra_story_info(
    base_dir: impl AsRef<Path>,
) -> Result<ExtraStoryInfo, StoryError> {
    let base_dir = base_dir.as_ref();
    let story = resolve_story_info(base_dir).await?;
    let resources_count = filtered_read_dir(base_dir.join(names::RESOURCES_DIR))
        .await?
        .len();
    let scenes_count = filtered_read_dir(base_dir.join(names::SCENES_DIR))
        .await?
        .len();

    Ok(ExtraStoryInfo {
        story,
        resources_count,
        scenes_count,
    })
}

/// Media files available to the story in `base_dir`.
pub async fn resolve_available_story_resources(
    base_dir: impl AsRef<Path>,
) -> Result<Vec<DirEntryInfo>, StoryError> {
    Ok(filtered_read_dir(base_dir.as_ref().join(names::RESOURCES_DIR)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestLibrary;
    use chrono::TimeZone;

    fn sample_stored() -> StoredStoryInfo {
        StoredStoryInfo {
            title: "The Lighthouse".to_string(),
            description: "A keeper and a storm.".to_string(),
            author: "M. Keeper".to_string(),
            creation_date: Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap(),
            thumbnail: "resources/thumb.jpg".to_string(),
            entry_point: "scenes/First Scene.json".to_string(),
            base_dir: String::new(),
        }
    }

    #[test]
    fn test_from_stored_resolves_absolute_paths() {
        let base = Path::new("/library/workspace/abc");
        let story = StoryInfo::from_stored(sample_stored(), base);

        assert_eq!(story.base_dir, PathBuf::from("/library/workspace/abc"));
        assert_eq!(
            story.entry_point,
            PathBuf::from("/library/workspace/abc/scenes/First Scene.json")
        );
        assert_eq!(
            story.thumbnail,
            PathBuf::from("/library/workspace/abc/resources/thumb.jpg")
        );
    }

    #[test]
    fn test_to_stored_round_trips() {
        let base = Path::new("/library/workspace/abc");
        let stored = sample_stored();
        let story = StoryInfo::from_stored(stored.clone(), base);
        assert_eq!(story.to_stored(base), stored);
    }

    #[test]
    fn test_stored_json_shape() {
        let json = serde_json::to_value(sample_stored()).unwrap();
        assert_eq!(json["base_dir"], "");
        assert_eq!(json["entry_point"], "scenes/First Scene.json");
        assert!(json["creation_date"]
            .as_str()
            .unwrap()
            .starts_with("2023-05-01T12:00:00"));
    }

    #[test]
    fn test_accepts_javascript_date_strings() {
        let json = r#"{
            "title": "t", "description": "d", "author": "a",
            "creation_date": "2023-04-18T09:31:22.512Z",
            "thumbnail": "resources/thumb.jpg",
            "entry_point": "scenes/First Scene.json",
            "base_dir": ""
        }"#;
        let stored: StoredStoryInfo = serde_json::from_str(json).expect("should parse");
        assert_eq!(stored.creation_date.timestamp(), 1681810282);
    }

    #[tokio::test]
    async fn test_write_then_resolve() {
        let lib = TestLibrary::new().await;
        let base = lib.story_dir(StoryLocation::Workspace, "story-1").await;
        let story = StoryInfo::from_stored(sample_stored(), &base);

        write_story_info_to_disk(&story, &story.base_dir)
            .await
            .expect("write should succeed");

        let raw = std::fs::read_to_string(base.join(names::STORY_DOCUMENT)).unwrap();
        let on_disk: StoredStoryInfo = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk.base_dir, "");
        assert_eq!(on_disk.thumbnail, "resources/thumb.jpg");

        let loaded = resolve_story_info(&base).await.expect("resolve");
        assert_eq!(loaded, story);
    }

    #[tokio::test]
    async fn test_listing_skips_malformed_story() {
        let lib = TestLibrary::new().await;
        for name in ["a", "b", "c"] {
            let dir = lib.story_dir(StoryLocation::Collections, name).await;
            write_stored_story_info(&sample_stored(), &dir).await.unwrap();
        }
        let broken = lib.story_dir(StoryLocation::Collections, "broken").await;
        std::fs::write(broken.join(names::STORY_DOCUMENT), "{ not json").unwrap();

        let stories = resolve_stories_from_fs(&lib.config, StoryLocation::Collections)
            .await
            .expect("listing should not fail");
        assert_eq!(stories.len(), 3);
    }

    #[tokio::test]
    async fn test_scan_reports_skipped_entries() {
        let lib = TestLibrary::new().await;
        let good = lib.story_dir(StoryLocation::Workspace, "good").await;
        write_stored_story_info(&sample_stored(), &good).await.unwrap();
        lib.story_dir(StoryLocation::Workspace, "empty").await;

        let results: Vec<_> = scan_stories(&lib.config.workspace_dir)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results.len(), 2);
        let skipped: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].path.ends_with("empty"));
    }

    #[tokio::test]
    async fn test_extra_story_info_counts() {
        let lib = TestLibrary::new().await;
        let base = lib.create_sample_story().await;
        std::fs::write(base.join("resources").join("rain.png"), b"png").unwrap();

        let extra = resolve_extra_story_info(&base).await.expect("extra info");
        assert_eq!(extra.scenes_count, 2);
        assert_eq!(extra.resources_count, 2);

        let resources = resolve_available_story_resources(&base).await.unwrap();
        let names: Vec<_> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["rain.png", "thumb.jpg"]);
    }
}
