//! Story playback: following navigation edges scene by scene.
//!
//! Playback never mutates story documents. Every step is recorded with the
//! [`ProgressTracker`] so a story can be resumed later; reaching the end resets
//! the saved scene to the entry point, which the tracker reports as no progress.

use crate::progress::{ProgressError, ProgressTracker, SavedScene};
use crate::scene::{
    resolve_scene_info, scene_name_from_path, Choice, Destination, Navigation, Scene, SceneError,
};
use crate::story::StoryInfo;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors during playback.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    #[error("the story has ended")]
    StoryEnded,

    #[error("no choice {index} (scene has {len})")]
    NoSuchChoice { index: usize, len: usize },

    #[error("scene uses {actual} navigation")]
    WrongNavigation { actual: &'static str },
}

/// Result of following one edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStep {
    /// A new scene is showing.
    Scene { path: PathBuf },
    /// The story reached its end.
    Ended,
}

#[derive(Debug, Clone)]
struct CurrentScene {
    path: PathBuf,
    scene: Scene,
}

/// Playback state for one story.
#[derive(Debug, Clone)]
pub struct StoryPlayback {
    story: StoryInfo,
    tracker: ProgressTracker,
    current: Option<CurrentScene>,
}

impl StoryPlayback {
    /// Start `story` at its entry point.
    pub async fn begin(story: StoryInfo, tracker: ProgressTracker) -> Result<Self, PlaybackError> {
        let entry_point = story.entry_point.clone();
        Self::start_at(story, tracker, entry_point).await
    }

    /// Start `story` at its saved progress, or at its entry point if there is none.
    pub async fn resume(story: StoryInfo, tracker: ProgressTracker) -> Result<Self, PlaybackError> {
        let start = match tracker.story_progress(&story).await? {
            Some(scene) => scene,
            None => story.entry_point.clone(),
        };
        Self::start_at(story, tracker, start).await
    }

    async fn start_at(
        story: StoryInfo,
        tracker: ProgressTracker,
        scene_path: PathBuf,
    ) -> Result<Self, PlaybackError> {
        tracing::info!(story = %story.title, scene = %scene_path.display(), "starting playback");
        let mut playback = Self {
            story,
            tracker,
            current: None,
        };
        playback.show(scene_path).await?;
        Ok(playback)
    }

    async fn show(&mut self, scene_path: PathBuf) -> Result<(), PlaybackError> {
        let scene = resolve_scene_info(&scene_path).await?;
        self.record(scene_path.clone()).await?;
        self.current = Some(CurrentScene {
            path: scene_path,
            scene,
        });
        Ok(())
    }

    async fn record(&self, scene: PathBuf) -> Result<(), PlaybackError> {
        self.tracker
            .update_user_story_progress(SavedScene::new(&self.story.base_dir, scene))
            .await?;
        Ok(())
    }

    /// Follow `destination` from wherever playback is.
    pub async fn navigate(
        &mut self,
        destination: &Destination,
    ) -> Result<PlaybackStep, PlaybackError> {
        match destination {
            Destination::End => {
                tracing::info!(story = %self.story.title, "story ended");
                self.record(self.story.entry_point.clone()).await?;
                self.current = None;
                Ok(PlaybackStep::Ended)
            }
            Destination::Scene(path) => {
                tracing::debug!(scene = %path.display(), "navigating");
                self.show(path.clone()).await?;
                Ok(PlaybackStep::Scene { path: path.clone() })
            }
        }
    }

    /// Follow the single-choice edge of the current scene.
    pub async fn advance(&mut self) -> Result<PlaybackStep, PlaybackError> {
        let destination = match &self.current_or_ended()?.navigation {
            Navigation::Single(destination) => destination.clone(),
            Navigation::Multiple(_) => {
                return Err(PlaybackError::WrongNavigation {
                    actual: "multiple choice",
                })
            }
        };
        self.navigate(&destination).await
    }

    /// Follow choice `index` of the current multiple-choice scene.
    pub async fn choose(&mut self, index: usize) -> Result<PlaybackStep, PlaybackError> {
        let destination = match &self.current_or_ended()?.navigation {
            Navigation::Multiple(choices) => choices
                .get(index)
                .map(|choice| choice.destination.clone())
                .ok_or(PlaybackError::NoSuchChoice {
                    index,
                    len: choices.len(),
                })?,
            Navigation::Single(_) => {
                return Err(PlaybackError::WrongNavigation {
                    actual: "single choice",
                })
            }
        };
        self.navigate(&destination).await
    }

    fn current_or_ended(&self) -> Result<&Scene, PlaybackError> {
        self.current_scene().ok_or(PlaybackError::StoryEnded)
    }

    /// Choices offered by the current scene; empty for single-choice scenes.
    pub fn choices(&self) -> &[Choice] {
        match self.current.as_ref().map(|c| &c.scene.navigation) {
            Some(Navigation::Multiple(choices)) => choices,
            _ => &[],
        }
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_ref().map(|c| &c.scene)
    }

    pub fn current_scene_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|c| c.path.as_path())
    }

    pub fn current_scene_name(&self) -> Option<String> {
        self.current_scene_path().map(scene_name_from_path)
    }

    pub fn is_ended(&self) -> bool {
        self.current.is_none()
    }

    pub fn story(&self) -> &StoryInfo {
        &self.story
    }
}
