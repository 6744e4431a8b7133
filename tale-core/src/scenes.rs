//! Scene list management for one story.
//!
//! Every structural change (create, rename, remove) is followed by a full
//! re-scan of the `scenes/` folder rather than patching the cached list.

use crate::paths::{names, resolve_new_path_from_new_name, sanitize_file_name};
use crate::scene::{
    resolve_scenes_from_fs, scene_path_for_name, write_scene, write_stored_scene, ExtraSceneInfo,
    SceneError,
};
use crate::templates::SceneTemplate;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from scene management operations.
#[derive(Debug, Error)]
pub enum ScenesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("invalid scene name: '{0}'")]
    InvalidSceneName(String),

    #[error("scene index {index} out of range (story has {len} scenes)")]
    SceneIndexOutOfRange { index: usize, len: usize },

    #[error("failed to rename scene {} to {}: {source}", .from.display(), .to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {} scene(s)", .failed.len())]
    PartialWrite { failed: Vec<PathBuf> },
}

/// The scenes of one story.
#[derive(Debug, Clone)]
pub struct ScenesManager {
    base_dir: PathBuf,
    scenes: Vec<ExtraSceneInfo>,
}

impl ScenesManager {
    /// Load the scene list of the story in `base_dir`.
    pub async fn load(base_dir: impl Into<PathBuf>) -> Result<Self, ScenesError> {
        let mut manager = Self {
            base_dir: base_dir.into(),
            scenes: Vec::new(),
        };
        manager.load_scenes_from_fs().await?;
        Ok(manager)
    }

    /// Replace the cached list with what is on disk.
    pub async fn load_scenes_from_fs(&mut self) -> Result<(), ScenesError> {
        self.scenes = resolve_scenes_from_fs(&self.base_dir).await?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn scenes(&self) -> &[ExtraSceneInfo] {
        &self.scenes
    }

    /// Mutable access for batch edits saved with [`ScenesManager::save_scenes_to_fs`].
    pub fn scenes_mut(&mut self) -> &mut [ExtraSceneInfo] {
        &mut self.scenes
    }

    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.scene_name.as_str()).collect()
    }

    /// Whether a scene called `name` is already in the list.
    ///
    /// Creation does not check this; callers should.
    pub fn scene_exists(&self, name: &str) -> bool {
        self.scenes.iter().any(|s| s.scene_name == name)
    }

    fn validate_name(name: &str) -> Result<(), ScenesError> {
        if name.trim().is_empty() || sanitize_file_name(name) != name || name.starts_with('.') {
            return Err(ScenesError::InvalidSceneName(name.to_string()));
        }
        Ok(())
    }

    fn scene_at(&self, index: usize) -> Result<&ExtraSceneInfo, ScenesError> {
        self.scenes
            .get(index)
            .ok_or(ScenesError::SceneIndexOutOfRange {
                index,
                len: self.scenes.len(),
            })
    }

    /// Create a scene called `scene_name` from `template`.
    pub async fn create_scene(
        &mut self,
        scene_name: &str,
        template: SceneTemplate,
    ) -> Result<PathBuf, ScenesError> {
        Self::validate_name(scene_name)?;
        fs::create_dir_all(self.base_dir.join(names::SCENES_DIR)).await?;

        let scene_path = scene_path_for_name(&self.base_dir, scene_name);
        write_stored_scene(&template.stored_scene(), &scene_path).await?;
        tracing::info!(
            scene = %scene_path.display(),
            template = template.name(),
            "created scene"
        );

        self.load_scenes_from_fs().await?;
        Ok(scene_path)
    }

    /// Rename the scene at `scene_index` to `new_name`.
    ///
    /// Only the file moves; references from other scenes are left as they are.
    /// An existing scene with the new name is never replaced.
    pub async fn rename_scene(
        &mut self,
        scene_index: usize,
        new_name: &str,
    ) -> Result<PathBuf, ScenesError> {
        Self::validate_name(new_name)?;
        let old_path = self.scene_at(scene_index)?.scene_path.clone();
        let new_path = resolve_new_path_from_new_name(&old_path, new_name);

        if new_path != old_path && fs::try_exists(&new_path).await? {
            return Err(ScenesError::RenameFailed {
                from: old_path,
                to: new_path,
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "a scene with that name already exists",
                ),
            });
        }

        fs::rename(&old_path, &new_path)
            .await
            .map_err(|source| ScenesError::RenameFailed {
                from: old_path.clone(),
                to: new_path.clone(),
                source,
            })?;
        tracing::info!(from = %old_path.display(), to = %new_path.display(), "renamed scene");

        self.load_scenes_from_fs().await?;
        Ok(new_path)
    }

    /// Delete the scene at `scene_index`.
    pub async fn remove_scene(&mut self, scene_index: usize) -> Result<(), ScenesError> {
        let path = self.scene_at(scene_index)?.scene_path.clone();
        fs::remove_file(&path).await?;
        tracing::info!(scene = %path.display(), "removed scene");

        self.load_scenes_from_fs().await
    }

    /// Write every cached scene back to disk.
    ///
    /// Writes run concurrently with no ordering between them. Scenes that
    /// were written stay written if others fail; the failures are reported
    /// together in [`ScenesError::PartialWrite`].
    pub async fn save_scenes_to_fs(&self) -> Result<(), ScenesError> {
        let writes = self.scenes.iter().map(|info| async move {
            let path = if info.scene_path.is_absolute() {
                info.scene_path.clone()
            } else {
                self.base_dir.join(&info.scene_path)
            };
            let result = write_scene(&info.scene, &path).await;
            (path, result)
        });

        let failed: Vec<PathBuf> = join_all(writes)
            .await
            .into_iter()
            .filter_map(|(path, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(scene = %path.display(), error = %e, "failed to save scene");
                    Some(path)
                }
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ScenesError::PartialWrite { failed })
        }
    }
}
