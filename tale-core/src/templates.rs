//! Starter content for new stories and scenes.

use crate::paths::{names, END_SENTINEL};
use crate::scene::{scene_name_to_relative_path, StoredChoice, StoredScene, StoredSceneActions};
use crate::story::StoredStoryInfo;
use chrono::Utc;
use rand::Rng;

/// Placeholder thumbnail copied into every new story.
pub const PLACEHOLDER_THUMBNAIL: &[u8] = include_bytes!("../assets/thumb.jpg");

const DEFAULT_DESCRIPTION: &str = "An exciting generic story.";
const DEFAULT_AUTHOR: &str = "A mysterious someone";

const FIRST_SCENE_TEXT: &str = "This is the first scene of the story. It's a very exciting scene.";
const SECOND_SCENE_TEXT: &str =
    "Welcome to the second and the last scene! Open up the editor and start creating your own story!";
const BACK_TO_FIRST_ACTION: &str = "Go to the first scene";
const END_ACTION: &str = "End the story now";

/// Random `#rrggbb` colour.
pub fn random_color() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..=0xFF_FFFF);
    format!("#{value:06x}")
}

/// Metadata of a freshly created story.
///
/// Empty description and author fall back to friendly defaults.
pub fn template_story_info(title: &str, description: &str, author: &str) -> StoredStoryInfo {
    StoredStoryInfo {
        title: title.to_string(),
        description: if description.trim().is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description.to_string()
        },
        author: if author.trim().is_empty() {
            DEFAULT_AUTHOR.to_string()
        } else {
            author.to_string()
        },
        creation_date: Utc::now(),
        thumbnail: format!("{}/{}", names::RESOURCES_DIR, names::THUMBNAIL),
        entry_point: scene_name_to_relative_path(names::FIRST_SCENE),
        base_dir: String::new(),
    }
}

/// Entry scene of a new story: attention text leading to the second scene.
pub fn first_template_scene() -> StoredScene {
    StoredScene {
        center_text: Some(FIRST_SCENE_TEXT.to_string()),
        narration_text: None,
        background_color: Some(random_color()),
        media: None,
        scene_actions: StoredSceneActions {
            multiple_choice: None,
            single_choice: Some(scene_name_to_relative_path(names::SECOND_SCENE)),
        },
    }
}

/// Closing scene of a new story: go back, or end.
pub fn second_template_scene() -> StoredScene {
    StoredScene {
        center_text: None,
        narration_text: Some(SECOND_SCENE_TEXT.to_string()),
        background_color: Some(random_color()),
        media: None,
        scene_actions: StoredSceneActions {
            multiple_choice: Some(vec![
                StoredChoice {
                    action: BACK_TO_FIRST_ACTION.to_string(),
                    destination: scene_name_to_relative_path(names::FIRST_SCENE),
                },
                StoredChoice {
                    action: END_ACTION.to_string(),
                    destination: END_SENTINEL.to_string(),
                },
            ]),
            single_choice: None,
        },
    }
}

/// Starting points offered when adding a scene to a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneTemplate {
    Narration,
    Attention,
    Blank,
    /// The complete two-choice example scene.
    Example,
}

impl SceneTemplate {
    pub const ALL: [SceneTemplate; 4] = [
        SceneTemplate::Narration,
        SceneTemplate::Attention,
        SceneTemplate::Blank,
        SceneTemplate::Example,
    ];

    /// Template at a menu position; unknown positions give a blank scene.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(SceneTemplate::Blank)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "narration" => Some(SceneTemplate::Narration),
            "attention" => Some(SceneTemplate::Attention),
            "blank" => Some(SceneTemplate::Blank),
            "example" => Some(SceneTemplate::Example),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SceneTemplate::Narration => "narration",
            SceneTemplate::Attention => "attention",
            SceneTemplate::Blank => "blank",
            SceneTemplate::Example => "example",
        }
    }

    /// Stored document for this template with a random background colour.
    pub fn stored_scene(&self) -> StoredScene {
        let ending = StoredSceneActions {
            multiple_choice: None,
            single_choice: Some(END_SENTINEL.to_string()),
        };

        match self {
            SceneTemplate::Narration => StoredScene {
                narration_text: Some("Narration goes here.".to_string()),
                background_color: Some(random_color()),
                scene_actions: ending,
                ..StoredScene::default()
            },
            SceneTemplate::Attention => StoredScene {
                center_text: Some("Something important happens.".to_string()),
                background_color: Some(random_color()),
                scene_actions: ending,
                ..StoredScene::default()
            },
            SceneTemplate::Blank => StoredScene {
                background_color: Some(random_color()),
                ..StoredScene::default()
            },
            SceneTemplate::Example => second_template_scene(),
        }
    }
}
