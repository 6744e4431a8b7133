//! Branching-narrative story library.
//!
//! This crate provides:
//! - Story and scene documents with relative on-disk paths and absolute in-memory paths
//! - A scene editor and scene list management for authoring
//! - Story playback that follows navigation edges and remembers progress
//! - Story creation, deletion, relocation and zip import/export
//!
//! # Quick Start
//!
//! ```ignore
//! use tale_core::{LibraryConfig, ProgressTracker, StoryCreator, StoryPlayback};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LibraryConfig::from_env().await?;
//!
//!     let mut creator = StoryCreator::new(config.clone()).await?;
//!     let dir = creator.create_new_story("The Lighthouse", "", "").await?;
//!
//!     let story = tale_core::story::resolve_story_info(&dir).await?;
//!     let mut playback = StoryPlayback::begin(story, ProgressTracker::new(&config)).await?;
//!     playback.advance().await?;
//!     println!("{:?}", playback.current_scene_name());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod collection;
pub mod config;
pub mod editor;
pub mod paths;
pub mod platform;
pub mod playback;
pub mod progress;
pub mod scene;
pub mod scenes;
pub mod story;
pub mod templates;
pub mod testing;

// Primary public API
pub use archive::{ArchiveBackend, ArchiveError, StorySaveManager, ZipArchiver};
pub use collection::{CollectionError, StoryCollection, StoryCreator};
pub use config::{LibraryConfig, StoryLocation};
pub use editor::{EditorError, SceneEditor, StoryInfoEditor};
pub use paths::END_SENTINEL;
pub use platform::Platform;
pub use playback::{PlaybackError, PlaybackStep, StoryPlayback};
pub use progress::{ProgressError, ProgressTracker, SavedScene};
pub use scene::{Choice, Destination, Navigation, Scene, SceneBackground, SceneText};
pub use scenes::{ScenesError, ScenesManager};
pub use story::{StoryError, StoryInfo};
pub use templates::SceneTemplate;
pub use testing::{MockArchiver, TestLibrary};
