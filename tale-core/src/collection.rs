//! Story listings and story lifecycle.

use crate::config::{LibraryConfig, StoryLocation};
use crate::paths::names;
use crate::playback::{PlaybackError, StoryPlayback};
use crate::progress::{ProgressError, ProgressTracker};
use crate::scene::{scene_path_for_name, write_stored_scene, SceneError};
use crate::story::{resolve_stories_from_fs, write_stored_story_info, StoryError, StoryInfo};
use crate::templates::{
    first_template_scene, second_template_scene, template_story_info, PLACEHOLDER_THUMBNAIL,
};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Errors from collection operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Story error: {0}")]
    Story(#[from] StoryError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
}

/// The stories under one library root.
#[derive(Debug, Clone)]
pub struct StoryCollection {
    config: LibraryConfig,
    location: StoryLocation,
    stories: Vec<StoryInfo>,
}

impl StoryCollection {
    pub async fn open(
        config: LibraryConfig,
        location: StoryLocation,
    ) -> Result<Self, CollectionError> {
        let mut collection = Self {
            config,
            location,
            stories: Vec::new(),
        };
        collection.refresh().await?;
        Ok(collection)
    }

    /// Re-scan the root directory.
    pub async fn refresh(&mut self) -> Result<(), CollectionError> {
        self.stories = resolve_stories_from_fs(&self.config, self.location).await?;
        Ok(())
    }

    pub fn stories(&self) -> &[StoryInfo] {
        &self.stories
    }

    pub fn location(&self) -> StoryLocation {
        self.location
    }

    /// Mark `story` as last played and start it from the beginning.
    pub async fn playback_story(
        &self,
        story: &StoryInfo,
        tracker: &ProgressTracker,
    ) -> Result<StoryPlayback, CollectionError> {
        tracker
            .update_last_played(Some(story.base_dir.as_path()))
            .await?;
        Ok(StoryPlayback::begin(story.clone(), tracker.clone()).await?)
    }
}

/// Creates and deletes stories in the workspace.
#[derive(Debug, Clone)]
pub struct StoryCreator {
    config: LibraryConfig,
    stories: Vec<StoryInfo>,
}

impl StoryCreator {
    pub async fn new(config: LibraryConfig) -> Result<Self, CollectionError> {
        let mut creator = Self {
            config,
            stories: Vec::new(),
        };
        creator.refresh().await?;
        Ok(creator)
    }

    pub async fn refresh(&mut self) -> Result<(), CollectionError> {
        self.stories = resolve_stories_from_fs(&self.config, StoryLocation::Workspace).await?;
        Ok(())
    }

    /// Workspace stories as of the last refresh.
    pub fn stories(&self) -> &[StoryInfo] {
        &self.stories
    }

    /// Create a story seeded with the two template scenes.
    ///
    /// Returns the new story directory. A failure part-way leaves whatever
    /// was already created in place.
    pub async fn create_new_story(
        &mut self,
        title: &str,
        description: &str,
        author: &str,
    ) -> Result<PathBuf, CollectionError> {
        let base_dir = self.config.workspace_dir.join(Uuid::new_v4().to_string());
        fs::create_dir_all(base_dir.join(names::SCENES_DIR)).await?;
        fs::create_dir_all(base_dir.join(names::RESOURCES_DIR)).await?;

        write_stored_story_info(&template_story_info(title, description, author), &base_dir)
            .await?;
        fs::write(
            base_dir.join(names::RESOURCES_DIR).join(names::THUMBNAIL),
            PLACEHOLDER_THUMBNAIL,
        )
        .await?;
        write_stored_scene(
            &first_template_scene(),
            scene_path_for_name(&base_dir, names::FIRST_SCENE),
        )
        .await?;
        write_stored_scene(
            &second_template_scene(),
            scene_path_for_name(&base_dir, names::SECOND_SCENE),
        )
        .await?;

        tracing::info!(story = %base_dir.display(), title, "created story");
        self.refresh().await?;
        Ok(base_dir)
    }

    /// Remove the whole directory of `story`.
    pub async fn delete_story(&mut self, story: &StoryInfo) -> Result<(), CollectionError> {
        fs::remove_dir_all(&story.base_dir).await?;
        tracing::info!(story = %story.base_dir.display(), title = %story.title, "deleted story");
        self.refresh().await
    }
}
