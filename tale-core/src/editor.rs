//! Editors for a single scene and for story metadata.
//!
//! [`SceneEditor`] keeps both alternatives of every scene axis while an edit
//! session is open, so switching e.g. from narration to attention text and
//! back does not lose what was typed. Only the active alternative of each
//! axis is written when the scene is saved.

use crate::paths::{path_str, DirEntryInfo};
use crate::scene::{
    resolve_base_dir_from_scene_path, resolve_scene_info, resolve_scenes_from_fs,
    scene_name_from_path, scene_path_for_name, write_scene, Choice, Destination, Navigation,
    Scene, SceneBackground, SceneError, SceneText, DEFAULT_BACKGROUND_COLOR,
};
use crate::story::{
    resolve_available_story_resources, resolve_extra_story_info, write_story_info_to_disk,
    ExtraStoryInfo, StoryError, StoryInfo,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Label given to a freshly added navigation option.
pub const NEW_ACTION_LABEL: &str = "New action";

/// Errors from editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no resource named '{0}' in this story")]
    UnknownResource(String),

    #[error("no scene named '{0}' in this story")]
    UnknownScene(String),

    #[error("choice {index} does not exist (scene has {len} choices)")]
    ChoiceOutOfRange { index: usize, len: usize },

    #[error("media background selected but no media file chosen")]
    MissingMedia,

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Story error: {0}")]
    Story(#[from] StoryError),
}

/// Which text field of a scene is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextType {
    Attention,
    Narration,
}

/// Which navigation field of a scene is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    SingleChoice,
    MultipleChoice,
}

/// Which background field of a scene is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundType {
    Media,
    Color,
}

/// An open edit session over one scene document.
///
/// Nothing touches the disk until [`SceneEditor::save_scene_to_disk`].
#[derive(Debug, Clone)]
pub struct SceneEditor {
    scene_path: PathBuf,
    base_dir: PathBuf,
    resources: Vec<DirEntryInfo>,

    text_type: TextType,
    navigation_type: NavigationType,
    background_type: BackgroundType,

    center_text: String,
    narration_text: String,
    background_color: String,
    media: Option<PathBuf>,
    multiple_choice: Vec<Choice>,
    single_choice: Destination,
}

impl SceneEditor {
    /// Start editing `scene`, stored at `scene_path`.
    ///
    /// `resources` are the media files the background may be set to.
    pub fn new(
        scene: Scene,
        scene_path: impl Into<PathBuf>,
        resources: Vec<DirEntryInfo>,
    ) -> Self {
        let scene_path = scene_path.into();
        let base_dir = resolve_base_dir_from_scene_path(&scene_path);

        let mut editor = Self {
            scene_path,
            base_dir,
            resources,
            text_type: TextType::Narration,
            navigation_type: NavigationType::SingleChoice,
            background_type: BackgroundType::Color,
            center_text: String::new(),
            narration_text: String::new(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            media: None,
            multiple_choice: Vec::new(),
            single_choice: Destination::End,
        };

        match scene.text {
            SceneText::Attention(text) => {
                editor.text_type = TextType::Attention;
                editor.center_text = text;
            }
            SceneText::Narration(text) => {
                editor.text_type = TextType::Narration;
                editor.narration_text = text;
            }
        }

        match scene.background {
            SceneBackground::Media(path) => {
                editor.background_type = BackgroundType::Media;
                editor.media = Some(path);
            }
            SceneBackground::Color(color) => {
                editor.background_type = BackgroundType::Color;
                editor.background_color = color;
            }
        }

        match scene.navigation {
            Navigation::Multiple(choices) => {
                editor.navigation_type = NavigationType::MultipleChoice;
                editor.multiple_choice = choices;
            }
            Navigation::Single(destination) => {
                editor.navigation_type = NavigationType::SingleChoice;
                editor.single_choice = destination;
            }
        }

        editor
    }

    /// Load the scene at `scene_path` together with its story's resources.
    pub async fn open(scene_path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let scene_path = scene_path.as_ref();
        let scene = resolve_scene_info(scene_path).await?;
        let base_dir = resolve_base_dir_from_scene_path(scene_path);
        let resources = resolve_available_story_resources(&base_dir).await?;
        Ok(Self::new(scene, scene_path, resources))
    }

    pub fn scene_path(&self) -> &Path {
        &self.scene_path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn scene_name(&self) -> String {
        scene_name_from_path(&self.scene_path)
    }

    // ------------------------------------------------------------------------
    // Axis selection
    // ------------------------------------------------------------------------

    pub fn text_type(&self) -> TextType {
        self.text_type
    }

    pub fn set_text_type(&mut self, text_type: TextType) {
        self.text_type = text_type;
    }

    pub fn navigation_type(&self) -> NavigationType {
        self.navigation_type
    }

    pub fn set_navigation_type(&mut self, navigation_type: NavigationType) {
        self.navigation_type = navigation_type;
    }

    pub fn background_type(&self) -> BackgroundType {
        self.background_type
    }

    pub fn set_background_type(&mut self, background_type: BackgroundType) {
        self.background_type = background_type;
    }

    // ------------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------------

    pub fn center_text(&self) -> &str {
        &self.center_text
    }

    pub fn set_center_text(&mut self, text: impl Into<String>) {
        self.center_text = text.into();
    }

    pub fn narration_text(&self) -> &str {
        &self.narration_text
    }

    pub fn set_narration_text(&mut self, text: impl Into<String>) {
        self.narration_text = text.into();
    }

    // ------------------------------------------------------------------------
    // Background
    // ------------------------------------------------------------------------

    pub fn background_color(&self) -> &str {
        &self.background_color
    }

    pub fn set_background_color(&mut self, color_code: impl Into<String>) {
        self.background_color = color_code.into();
    }

    pub fn media(&self) -> Option<&Path> {
        self.media.as_deref()
    }

    /// Use the story resource named `file_name` as background media.
    pub fn set_background_media(&mut self, file_name: &str) -> Result<(), EditorError> {
        let resource = self
            .resources
            .iter()
            .find(|r| r.name == file_name)
            .ok_or_else(|| EditorError::UnknownResource(file_name.to_string()))?;
        self.media = Some(resource.path.clone());
        Ok(())
    }

    pub fn available_resources(&self) -> &[DirEntryInfo] {
        &self.resources
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn multiple_choice(&self) -> &[Choice] {
        &self.multiple_choice
    }

    pub fn single_choice(&self) -> &Destination {
        &self.single_choice
    }

    /// Append a placeholder option that ends the story.
    pub fn add_new_navigation_option(&mut self) {
        self.multiple_choice
            .push(Choice::new(NEW_ACTION_LABEL, Destination::End));
    }

    /// Remove the first option equal to `entry`. Returns whether one was removed.
    pub fn remove_navigation_option(&mut self, entry: &Choice) -> bool {
        match self.multiple_choice.iter().position(|c| c == entry) {
            Some(index) => {
                self.multiple_choice.remove(index);
                true
            }
            None => false,
        }
    }

    /// Relabel the option at `index`.
    pub fn set_choice_action(
        &mut self,
        index: usize,
        action: impl Into<String>,
    ) -> Result<(), EditorError> {
        let len = self.multiple_choice.len();
        let choice = self
            .multiple_choice
            .get_mut(index)
            .ok_or(EditorError::ChoiceOutOfRange { index, len })?;
        choice.action = action.into();
        Ok(())
    }

    /// Point the options, in order, at the named scenes (or `#END`).
    ///
    /// Options without a corresponding name keep their destination.
    pub fn set_mcq_destinations<S: AsRef<str>>(&mut self, destinations: &[S]) {
        for (choice, name) in self.multiple_choice.iter_mut().zip(destinations) {
            choice.destination = Destination::from_scene_name(name.as_ref(), &self.base_dir);
        }
    }

    /// Point the single-choice navigation at the named scene (or `#END`).
    pub fn set_scq_destination(&mut self, destination: &str) {
        self.single_choice = Destination::from_scene_name(destination, &self.base_dir);
    }

    // ------------------------------------------------------------------------
    // Saving
    // ------------------------------------------------------------------------

    /// The scene as it would be saved: only the active alternatives.
    pub fn to_scene(&self) -> Result<Scene, EditorError> {
        let text = match self.text_type {
            TextType::Attention => SceneText::Attention(self.center_text.clone()),
            TextType::Narration => SceneText::Narration(self.narration_text.clone()),
        };

        let background = match self.background_type {
            BackgroundType::Color => SceneBackground::Color(self.background_color.clone()),
            BackgroundType::Media => {
                SceneBackground::Media(self.media.clone().ok_or(EditorError::MissingMedia)?)
            }
        };

        let navigation = match self.navigation_type {
            NavigationType::SingleChoice => Navigation::Single(self.single_choice.clone()),
            NavigationType::MultipleChoice => Navigation::Multiple(self.multiple_choice.clone()),
        };

        Ok(Scene {
            text,
            background,
            navigation,
        })
    }

    /// Write the scene, dropping the inactive alternative of every axis.
    pub async fn save_scene_to_disk(&mut self) -> Result<Scene, EditorError> {
        let scene = self.to_scene()?;
        write_scene(&scene, &self.scene_path).await?;
        self.clear_inactive();
        tracing::info!(scene = %self.scene_path.display(), "saved scene");
        Ok(scene)
    }

    fn clear_inactive(&mut self) {
        match self.text_type {
            TextType::Attention => self.narration_text.clear(),
            TextType::Narration => self.center_text.clear(),
        }
        match self.background_type {
            BackgroundType::Media => self.background_color = DEFAULT_BACKGROUND_COLOR.to_string(),
            BackgroundType::Color => self.media = None,
        }
        match self.navigation_type {
            NavigationType::MultipleChoice => self.single_choice = Destination::End,
            NavigationType::SingleChoice => self.multiple_choice.clear(),
        }
    }
}

/// An open edit session over a story's metadata.
#[derive(Debug, Clone)]
pub struct StoryInfoEditor {
    info: ExtraStoryInfo,
    resources: Vec<DirEntryInfo>,
}

impl StoryInfoEditor {
    /// Load the story in `base_dir` for editing.
    pub async fn open(base_dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let base_dir = base_dir.as_ref();
        let info = resolve_extra_story_info(base_dir).await?;
        let resources = resolve_available_story_resources(base_dir).await?;
        Ok(Self { info, resources })
    }

    pub fn story(&self) -> &StoryInfo {
        &self.info.story
    }

    pub fn extra(&self) -> &ExtraStoryInfo {
        &self.info
    }

    pub fn base_dir(&self) -> &Path {
        &self.info.story.base_dir
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.info.story.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.info.story.description = description.into();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.info.story.author = author.into();
    }

    /// Names of every scene that could serve as entry point.
    pub async fn available_entry_point_names(&self) -> Result<Vec<String>, EditorError> {
        Ok(resolve_scenes_from_fs(self.base_dir())
            .await?
            .into_iter()
            .map(|scene| scene.scene_name)
            .collect())
    }

    /// Start playback at the scene called `entry_point_name`.
    pub async fn set_entry_point(&mut self, entry_point_name: &str) -> Result<(), EditorError> {
        let path = scene_path_for_name(self.base_dir(), entry_point_name);
        if !fs::try_exists(&path).await.map_err(SceneError::from)? {
            return Err(EditorError::UnknownScene(entry_point_name.to_string()));
        }
        self.info.story.entry_point = path;
        Ok(())
    }

    pub fn entry_point_name(&self) -> String {
        scene_name_from_path(&self.info.story.entry_point)
    }

    pub fn thumbnail(&self) -> &Path {
        &self.info.story.thumbnail
    }

    /// Use the story resource named `thumbnail_name` as thumbnail.
    pub fn set_story_thumbnail(&mut self, thumbnail_name: &str) -> Result<(), EditorError> {
        let resource = self
            .resources
            .iter()
            .find(|r| r.name == thumbnail_name)
            .ok_or_else(|| EditorError::UnknownResource(thumbnail_name.to_string()))?;
        self.info.story.thumbnail = resource.path.clone();
        Ok(())
    }

    pub fn available_resources(&self) -> &[DirEntryInfo] {
        &self.resources
    }

    /// Persist the edited metadata.
    pub async fn write_story_info_to_disk(&self) -> Result<(), EditorError> {
        write_story_info_to_disk(&self.info.story, self.base_dir()).await?;
        tracing::info!(story = %path_str(self.base_dir()), "saved story info");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::END_SENTINEL;
    use crate::scene::StoredScene;
    use crate::story::resolve_story_info;
    use crate::testing::TestLibrary;

    async fn read_stored(path: &Path) -> StoredScene {
        serde_json::from_str(&fs::read_to_string(path).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_derived_types_follow_loaded_scene() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;

        let first = SceneEditor::open(scene_path_for_name(&story, "First Scene"))
            .await
            .unwrap();
        assert_eq!(first.text_type(), TextType::Attention);
        assert_eq!(first.navigation_type(), NavigationType::SingleChoice);
        assert_eq!(first.background_type(), BackgroundType::Color);

        let second = SceneEditor::open(scene_path_for_name(&story, "Second Scene"))
            .await
            .unwrap();
        assert_eq!(second.text_type(), TextType::Narration);
        assert_eq!(second.navigation_type(), NavigationType::MultipleChoice);
        assert_eq!(second.multiple_choice().len(), 2);
    }

    #[tokio::test]
    async fn test_save_enforces_mutual_exclusion() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;
        let path = scene_path_for_name(&story, "First Scene");

        let mut editor = SceneEditor::open(&path).await.unwrap();
        // Populate every alternative, then pick one side of each axis.
        editor.set_center_text("Look up!");
        editor.set_narration_text("It was a dark night.");
        editor.set_background_media("thumb.jpg").unwrap();
        editor.set_background_color("#123456");
        editor.add_new_navigation_option();
        editor.set_scq_destination("Second Scene");

        editor.set_text_type(TextType::Narration);
        editor.set_background_type(BackgroundType::Media);
        editor.set_navigation_type(NavigationType::MultipleChoice);
        editor.save_scene_to_disk().await.unwrap();

        let stored = read_stored(&path).await;
        assert!(stored.center_text.is_none());
        assert_eq!(stored.narration_text.as_deref(), Some("It was a dark night."));
        assert!(stored.background_color.is_none());
        assert_eq!(stored.media.as_deref(), Some("resources/thumb.jpg"));
        assert!(stored.scene_actions.single_choice.is_none());
        assert_eq!(stored.scene_actions.multiple_choice.unwrap().len(), 1);

        // Re-opening reproduces the types that were active at save time.
        let reopened = SceneEditor::open(&path).await.unwrap();
        assert_eq!(reopened.text_type(), TextType::Narration);
        assert_eq!(reopened.background_type(), BackgroundType::Media);
        assert_eq!(reopened.navigation_type(), NavigationType::MultipleChoice);
    }

    #[tokio::test]
    async fn test_unmodified_save_preserves_document() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;
        let path = scene_path_for_name(&story, "Second Scene");
        let before = read_stored(&path).await;

        let mut editor = SceneEditor::open(&path).await.unwrap();
        editor.save_scene_to_disk().await.unwrap();

        assert_eq!(read_stored(&path).await, before);
    }

    #[tokio::test]
    async fn test_destinations_from_scene_names() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;
        let path = scene_path_for_name(&story, "Second Scene");

        let mut editor = SceneEditor::open(&path).await.unwrap();
        editor.set_mcq_destinations(&[END_SENTINEL, "Second Scene"]);
        editor.save_scene_to_disk().await.unwrap();

        let choices = read_stored(&path).await.scene_actions.multiple_choice.unwrap();
        assert_eq!(choices[0].destination, END_SENTINEL);
        assert_eq!(choices[1].destination, "scenes/Second Scene.json");
    }

    #[tokio::test]
    async fn test_remove_navigation_option_by_value() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;
        let mut editor = SceneEditor::open(scene_path_for_name(&story, "Second Scene"))
            .await
            .unwrap();

        let end_choice = editor.multiple_choice()[1].clone();
        assert!(editor.remove_navigation_option(&end_choice));
        assert_eq!(editor.multiple_choice().len(), 1);
        assert!(!editor.remove_navigation_option(&end_choice));
        assert_eq!(editor.multiple_choice().len(), 1);
    }

    #[tokio::test]
    async fn test_media_requires_known_resource() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;
        let mut editor = SceneEditor::open(scene_path_for_name(&story, "First Scene"))
            .await
            .unwrap();

        assert!(matches!(
            editor.set_background_media("missing.png"),
            Err(EditorError::UnknownResource(_))
        ));

        editor.set_background_type(BackgroundType::Media);
        assert!(matches!(editor.to_scene(), Err(EditorError::MissingMedia)));
    }

    #[tokio::test]
    async fn test_choice_relabel_out_of_range() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;
        let mut editor = SceneEditor::open(scene_path_for_name(&story, "Second Scene"))
            .await
            .unwrap();

        editor.set_choice_action(0, "Start over").unwrap();
        assert_eq!(editor.multiple_choice()[0].action, "Start over");
        assert!(matches!(
            editor.set_choice_action(5, "nope"),
            Err(EditorError::ChoiceOutOfRange { index: 5, len: 2 })
        ));
    }

    #[tokio::test]
    async fn test_story_info_editor_round_trip() {
        let lib = TestLibrary::new().await;
        let story = lib.create_sample_story().await;

        let mut editor = StoryInfoEditor::open(&story).await.unwrap();
        assert_eq!(editor.entry_point_name(), "First Scene");
        assert_eq!(
            editor.available_entry_point_names().await.unwrap(),
            vec!["First Scene".to_string(), "Second Scene".to_string()]
        );

        editor.set_title("Renamed");
        editor.set_entry_point("Second Scene").await.unwrap();
        assert!(matches!(
            editor.set_entry_point("Nowhere").await,
            Err(EditorError::UnknownScene(_))
        ));
        editor.set_story_thumbnail("thumb.jpg").unwrap();
        editor.write_story_info_to_disk().await.unwrap();

        let reloaded = resolve_story_info(&story).await.unwrap();
        assert_eq!(reloaded.title, "Renamed");
        assert_eq!(reloaded.entry_point, scene_path_for_name(&story, "Second Scene"));

        let raw = std::fs::read_to_string(story.join("gsg.json")).unwrap();
        assert!(raw.contains("\"entry_point\": \"scenes/Second Scene.json\""));
        assert!(raw.contains("\"base_dir\": \"\""));
    }
}
