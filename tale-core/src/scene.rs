//! Scene documents and the navigation graph between them.
//!
//! Scene documents keep nullable field pairs for the text, background and
//! navigation of a scene. Loading collapses each pair into a tagged union
//! ([`SceneText`], [`SceneBackground`], [`Navigation`]) so a loaded [`Scene`]
//! can never have both or neither alternative active. Saving writes exactly
//! one side of each pair and nulls the other.
//!
//! Destinations are stored relative to the story directory or as the
//! [`END_SENTINEL`]; loaded destinations are absolute or [`Destination::End`].

use crate::paths::{
    filtered_read_dir, get_obj_from_path, join_path, names, path_str, relativize,
    resolve_stored, sanitize_path, sanitize_path_with, END_SENTINEL, STORED_SEPARATOR,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use thiserror::Error;
use tokio::fs;

/// Background colour used when a document has neither colour nor media.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#000000";

/// Errors from scene document operations.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Stored form
// ============================================================================

/// A multiple-choice entry as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChoice {
    pub action: String,
    pub destination: String,
}

/// Navigation of a scene as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSceneActions {
    pub multiple_choice: Option<Vec<StoredChoice>>,
    pub single_choice: Option<String>,
}

/// A scene document exactly as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredScene {
    pub center_text: Option<String>,
    pub narration_text: Option<String>,
    pub background_color: Option<String>,
    pub media: Option<String>,
    #[serde(default)]
    pub scene_actions: StoredSceneActions,
}

// ============================================================================
// Resolved form
// ============================================================================

/// Where a navigation edge leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// The story ends.
    End,
    /// Absolute path of another scene document.
    Scene(PathBuf),
}

impl Destination {
    /// Resolve a stored destination against the story directory.
    pub fn from_stored(stored: &str, base_dir: &Path) -> Self {
        if stored == END_SENTINEL {
            Destination::End
        } else {
            Destination::Scene(resolve_stored(base_dir, stored))
        }
    }

    /// Stored form relative to the story directory.
    pub fn to_stored(&self, base_dir: &Path) -> String {
        match self {
            Destination::End => END_SENTINEL.to_string(),
            Destination::Scene(path) => relativize(path, base_dir),
        }
    }

    /// Destination for a user-facing scene name, or the end sentinel.
    pub fn from_scene_name(name: &str, base_dir: &Path) -> Self {
        if name == END_SENTINEL {
            Destination::End
        } else {
            Destination::Scene(scene_path_for_name(base_dir, name))
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Destination::End)
    }

    /// Name of the destination scene, `None` for the end.
    pub fn scene_name(&self) -> Option<String> {
        match self {
            Destination::End => None,
            Destination::Scene(path) => Some(scene_name_from_path(path)),
        }
    }
}

/// One option of a multiple-choice scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub action: String,
    pub destination: Destination,
}

impl Choice {
    pub fn new(action: impl Into<String>, destination: Destination) -> Self {
        Self {
            action: action.into(),
            destination,
        }
    }
}

/// The text shown by a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneText {
    /// Centered "attention" text.
    Attention(String),
    /// Narration text.
    Narration(String),
}

impl SceneText {
    pub fn content(&self) -> &str {
        match self {
            SceneText::Attention(text) | SceneText::Narration(text) => text,
        }
    }
}

/// What is drawn behind a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneBackground {
    /// Hex colour code.
    Color(String),
    /// Absolute path of a resource file.
    Media(PathBuf),
}

/// How a scene leads onwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Single(Destination),
    Multiple(Vec<Choice>),
}

/// A loaded scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub text: SceneText,
    pub background: SceneBackground,
    pub navigation: Navigation,
}

impl Scene {
    /// Resolve a stored scene of the story in `base_dir`.
    ///
    /// Attention text, media and multiple choice win when both sides of a
    /// pair are present.
    pub fn from_stored(stored: StoredScene, base_dir: &Path) -> Self {
        let text = match (stored.center_text, stored.narration_text) {
            (Some(center), _) => SceneText::Attention(center),
            (None, Some(narration)) => SceneText::Narration(narration),
            (None, None) => SceneText::Narration(String::new()),
        };

        let background = match (stored.media, stored.background_color) {
            (Some(media), _) => SceneBackground::Media(resolve_stored(base_dir, &media)),
            (None, Some(color)) => SceneBackground::Color(color),
            (None, None) => SceneBackground::Color(DEFAULT_BACKGROUND_COLOR.to_string()),
        };

        let actions = stored.scene_actions;
        let navigation = match (actions.multiple_choice, actions.single_choice) {
            (Some(choices), _) => Navigation::Multiple(
                choices
                    .into_iter()
                    .map(|c| Choice::new(c.action, Destination::from_stored(&c.destination, base_dir)))
                    .collect(),
            ),
            (None, Some(single)) => Navigation::Single(Destination::from_stored(&single, base_dir)),
            (None, None) => Navigation::Single(Destination::End),
        };

        Self {
            text,
            background,
            navigation,
        }
    }

    /// Stored form with exactly one side of each pair populated.
    pub fn to_stored(&self, base_dir: &Path) -> StoredScene {
        let (center_text, narration_text) = match &self.text {
            SceneText::Attention(text) => (Some(text.clone()), None),
            SceneText::Narration(text) => (None, Some(text.clone())),
        };

        let (background_color, media) = match &self.background {
            SceneBackground::Color(color) => (Some(color.clone()), None),
            SceneBackground::Media(path) => (None, Some(relativize(path, base_dir))),
        };

        let scene_actions = match &self.navigation {
            Navigation::Single(destination) => StoredSceneActions {
                multiple_choice: None,
                single_choice: Some(destination.to_stored(base_dir)),
            },
            Navigation::Multiple(choices) => StoredSceneActions {
                multiple_choice: Some(
                    choices
                        .iter()
                        .map(|c| StoredChoice {
                            action: c.action.clone(),
                            destination: c.destination.to_stored(base_dir),
                        })
                        .collect(),
                ),
                single_choice: None,
            },
        };

        StoredScene {
            center_text,
            narration_text,
            background_color,
            media,
            scene_actions,
        }
    }

    /// Every outgoing edge in order.
    pub fn destinations(&self) -> Vec<&Destination> {
        match &self.navigation {
            Navigation::Single(destination) => vec![destination],
            Navigation::Multiple(choices) => choices.iter().map(|c| &c.destination).collect(),
        }
    }
}

/// A scene together with where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraSceneInfo {
    pub scene: Scene,
    pub scene_name: String,
    pub scene_path: PathBuf,
}

// ============================================================================
// Paths
// ============================================================================

/// Story directory owning the scene document at `scene_path`.
///
/// Drops the file name and its `scenes` parent folder.
pub fn resolve_base_dir_from_scene_path(scene_path: &Path) -> PathBuf {
    let sanitized = sanitize_path(&path_str(scene_path));
    let mut segments: Vec<&str> = sanitized.split(MAIN_SEPARATOR).collect();
    segments.pop();
    segments.pop();
    PathBuf::from(segments.join(&MAIN_SEPARATOR.to_string()))
}

/// Stored path of the scene called `scene_name` (`scenes/<name>.json`).
pub fn scene_name_to_relative_path(scene_name: &str) -> String {
    let file_name = format!("{scene_name}{}", names::SCENE_SUFFIX);
    sanitize_path_with(&join_path(&[names::SCENES_DIR, file_name.as_str()]), STORED_SEPARATOR)
}

/// Absolute path of the scene called `scene_name` in the story at `base_dir`.
pub fn scene_path_for_name(base_dir: &Path, scene_name: &str) -> PathBuf {
    resolve_stored(base_dir, &scene_name_to_relative_path(scene_name))
}

/// User-facing name of a scene document (file name without `.json`).
pub fn scene_name_from_path(scene_path: &Path) -> String {
    let file_name = get_obj_from_path(&path_str(scene_path));
    match file_name.strip_suffix(names::SCENE_SUFFIX) {
        Some(name) => name.to_string(),
        None => file_name,
    }
}

// ============================================================================
// Disk
// ============================================================================

/// Load the scene document at `scene_path`.
pub async fn resolve_scene_info(scene_path: impl AsRef<Path>) -> Result<Scene, SceneError> {
    let scene_path = scene_path.as_ref();
    let content = fs::read_to_string(scene_path).await?;
    let stored: StoredScene = serde_json::from_str(&content)?;
    let base_dir = resolve_base_dir_from_scene_path(scene_path);
    tracing::debug!(scene = %scene_path.display(), "loaded scene");
    Ok(Scene::from_stored(stored, &base_dir))
}

/// Write `scene` to `scene_path`, relativizing against its story directory.
pub async fn write_scene(scene: &Scene, scene_path: impl AsRef<Path>) -> Result<(), SceneError> {
    let scene_path = scene_path.as_ref();
    let base_dir = resolve_base_dir_from_scene_path(scene_path);
    write_stored_scene(&scene.to_stored(&base_dir), scene_path).await
}

/// Write an already-stored scene document.
pub async fn write_stored_scene(
    stored: &StoredScene,
    scene_path: impl AsRef<Path>,
) -> Result<(), SceneError> {
    let scene_path = scene_path.as_ref();
    let content = serde_json::to_string_pretty(stored)?;
    fs::write(scene_path, content).await?;
    tracing::debug!(scene = %scene_path.display(), "wrote scene");
    Ok(())
}

/// Load every readable scene of the story in `base_dir`, sorted by name.
///
/// Scenes that fail to load are logged and skipped.
pub async fn resolve_scenes_from_fs(
    base_dir: impl AsRef<Path>,
) -> Result<Vec<ExtraSceneInfo>, SceneError> {
    let entries = filtered_read_dir(base_dir.as_ref().join(names::SCENES_DIR)).await?;
    let mut scenes = Vec::with_capacity(entries.len());

    for entry in entries {
        match resolve_scene_info(&entry.path).await {
            Ok(scene) => scenes.push(ExtraSceneInfo {
                scene,
                scene_name: scene_name_from_path(&entry.path),
                scene_path: entry.path,
            }),
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "skipping unreadable scene");
            }
        }
    }

    Ok(scenes)
}
