//! Story data returned by the story model.

use serde::{Deserialize, Serialize};
use storygen_error::{StoryError, StoryErrorKind};
use tracing::{debug, instrument};

use crate::{extract_json, parse_json};

/// Number of scenes every story has.
pub const SCENE_COUNT: usize = 4;

/// Fixed label of each scene in the four-part structure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum SceneTitle {
    /// Scene 1: characters and setting
    #[serde(rename = "The Setup")]
    #[strum(serialize = "The Setup")]
    Setup,
    /// Scene 2: the event that starts the plot
    #[serde(rename = "The Inciting Incident")]
    #[strum(serialize = "The Inciting Incident")]
    IncitingIncident,
    /// Scene 3: the turning point
    #[serde(rename = "The Climax")]
    #[strum(serialize = "The Climax")]
    Climax,
    /// Scene 4: the conclusion
    #[serde(rename = "The Resolution")]
    #[strum(serialize = "The Resolution")]
    Resolution,
}

impl SceneTitle {
    /// Title required for a 1-based scene index.
    ///
    /// ```
    /// use storygen_story::SceneTitle;
    ///
    /// assert_eq!(SceneTitle::for_index(3), Some(SceneTitle::Climax));
    /// assert_eq!(SceneTitle::for_index(5), None);
    /// ```
    pub fn for_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Setup),
            2 => Some(Self::IncitingIncident),
            3 => Some(Self::Climax),
            4 => Some(Self::Resolution),
            _ => None,
        }
    }
}

/// A main character, described for the illustrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Character {
    /// Character name
    name: String,
    /// Detailed visual description
    description: String,
}

impl Character {
    /// Creates a character.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// One of the four scenes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Scene {
    /// 1-based position
    index: u8,
    /// Fixed label for the position
    title: SceneTitle,
    /// Action and setting, without character appearance
    description: String,
    /// Excerpt of the story text
    text: String,
}

impl Scene {
    /// Creates a scene.
    pub fn new(
        index: u8,
        title: SceneTitle,
        description: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            index,
            title,
            description: description.into(),
            text: text.into(),
        }
    }
}

/// Raw scene as the model wrote it, before the title is checked.
#[derive(Deserialize)]
struct RawScene {
    index: u8,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct RawStory {
    #[serde(default)]
    story: String,
    #[serde(default)]
    main_characters: Vec<Character>,
    #[serde(default)]
    scenes: Vec<RawScene>,
}

/// A complete four-scene story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Story {
    /// Full narrative text
    story: String,
    /// One or two main characters
    main_characters: Vec<Character>,
    /// Scenes ordered by index
    scenes: Vec<Scene>,
}

impl Story {
    /// Creates a story without validating it.
    pub fn new(story: impl Into<String>, main_characters: Vec<Character>, scenes: Vec<Scene>) -> Self {
        Self {
            story: story.into(),
            main_characters,
            scenes,
        }
    }

    /// Parse and validate the story model's raw output.
    ///
    /// Surrounding prose and code fences are stripped, scenes are sorted by
    /// index, then [`Story::validate`] runs.
    #[instrument(skip(raw), fields(raw_len = raw.len()))]
    pub fn from_llm_response(raw: &str) -> Result<Self, StoryError> {
        let json = extract_json(raw)?;
        let raw_story: RawStory = parse_json(&json)?;

        let mut scenes = raw_story
            .scenes
            .into_iter()
            .map(|scene| {
                let expected = SceneTitle::for_index(scene.index)
                    .ok_or_else(|| StoryError::new(StoryErrorKind::SceneIndex(scene.index)))?;
                if scene.title.trim() != expected.to_string() {
                    return Err(StoryError::new(StoryErrorKind::SceneTitle {
                        index: scene.index,
                        found: scene.title,
                        expected: expected.to_string(),
                    }));
                }
                Ok(Scene::new(scene.index, expected, scene.description, scene.text))
            })
            .collect::<Result<Vec<_>, _>>()?;
        scenes.sort_by_key(|scene| scene.index);

        let story = Self::new(raw_story.story, raw_story.main_characters, scenes);
        story.validate()?;

        debug!(
            scenes = story.scenes.len(),
            characters = story.main_characters.len(),
            "Story parsed"
        );
        Ok(story)
    }

    /// Check the four-scene structure and the character list.
    pub fn validate(&self) -> Result<(), StoryError> {
        if self.scenes.len() != SCENE_COUNT {
            return Err(StoryError::new(StoryErrorKind::SceneCount(self.scenes.len())));
        }

        let mut seen = [false; SCENE_COUNT];
        for scene in &self.scenes {
            let expected = SceneTitle::for_index(scene.index)
                .ok_or_else(|| StoryError::new(StoryErrorKind::SceneIndex(scene.index)))?;
            let slot = &mut seen[usize::from(scene.index) - 1];
            if *slot {
                return Err(StoryError::new(StoryErrorKind::SceneIndex(scene.index)));
            }
            *slot = true;

            if scene.title != expected {
                return Err(StoryError::new(StoryErrorKind::SceneTitle {
                    index: scene.index,
                    found: scene.title.to_string(),
                    expected: expected.to_string(),
                }));
            }
        }

        if !(1..=2).contains(&self.main_characters.len()) {
            return Err(StoryError::new(StoryErrorKind::CharacterCount(
                self.main_characters.len(),
            )));
        }

        if let Some(position) = self.main_characters.iter().position(|c| !c.is_complete()) {
            return Err(StoryError::new(StoryErrorKind::IncompleteCharacter(position)));
        }

        Ok(())
    }

    /// Scene texts prefixed with `[SCENE n]` markers, as the frontend
    /// expects them.
    ///
    /// ```
    /// use storygen_story::{Scene, SceneTitle, Story};
    ///
    /// let story = Story::new(
    ///     "",
    ///     vec![],
    ///     vec![
    ///         Scene::new(1, SceneTitle::Setup, "", "Once."),
    ///         Scene::new(2, SceneTitle::IncitingIncident, "", "Then."),
    ///     ],
    /// );
    /// assert_eq!(story.text_with_scene_markers(), "[SCENE 1]\nOnce.\n\n[SCENE 2]\nThen.");
    /// ```
    pub fn text_with_scene_markers(&self) -> String {
        self.scenes
            .iter()
            .map(|scene| format!("[SCENE {}]\n{}\n\n", scene.index, scene.text))
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// `"{name}: {description}"` for each fully described character.
    pub fn character_descriptions(&self) -> Vec<String> {
        self.main_characters
            .iter()
            .filter(|c| c.is_complete())
            .map(|c| format!("{}: {}", c.name, c.description))
            .collect()
    }
}
