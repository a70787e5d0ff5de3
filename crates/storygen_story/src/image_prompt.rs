//! Illustration prompts.
//!
//! Two style prefixes are applied: the image agent describes the scene with
//! [`SCENE_STYLE_PREFIX`], then the image tool adds [`TOOL_STYLE_PREFIX`]
//! in front of whatever prompt it receives.

/// Style prefix used when composing a scene prompt.
pub const SCENE_STYLE_PREFIX: &str =
    "Children's book cartoon illustration with bright vibrant colors, simple shapes, friendly characters.";

/// Style prefix the image tool puts in front of every prompt.
pub const TOOL_STYLE_PREFIX: &str = "Children's book illustration in cartoon style with bright vibrant colors, simple shapes, and friendly characters.";

/// Prompt for one scene's illustration.
///
/// ```
/// use storygen_story::scene_prompt;
///
/// let prompt = scene_prompt("A rainy street", &["Pip: a green frog".to_string()]);
/// assert!(prompt.ends_with("Scene: A rainy street. Characters: Pip: a green frog."));
/// ```
pub fn scene_prompt(scene_description: &str, character_descriptions: &[String]) -> String {
    format!(
        "{} Scene: {}. Characters: {}.",
        SCENE_STYLE_PREFIX,
        scene_description,
        character_descriptions.join(", ")
    )
}

/// Prompt actually sent to the image model.
pub fn full_prompt(prompt: &str) -> String {
    format!("{} {}", TOOL_STYLE_PREFIX, prompt).trim().to_string()
}
