//! Instruction template for the story model.

use storygen_core::{GenerateRequest, Message};
use storygen_rate_limit::StorySettings;

/// System instructions sent with every story request.
pub const STORY_INSTRUCTIONS: &str = r#"You are a creative assistant for a children's storybook app.
Your task is to generate a short, creative story based on user-provided keywords.
The story must follow a clear 4-scene structure and be formatted as a valid JSON object.

**Story Structure Requirements:**
1.  **Exactly 4 Scenes:** The story must be divided into four distinct parts:
    *   Scene 1: **The Setup** (Introduce the characters and setting)
    *   Scene 2: **The Inciting Incident** (The event that kicks off the main plot)
    *   Scene 3: **The Climax** (The peak of the action or turning point)
    *   Scene 4: **The Resolution** (The conclusion where the conflict is resolved)
2.  **Word Count:** The total story should be between 100 and 200 words.
3.  **Language:** Use simple, charming, and engaging language suitable for all audiences.
4.  **Keywords:** Naturally integrate the user's keywords into the story.

**JSON Output Format:**
You MUST respond with a single, valid JSON object. Do NOT include any text outside of the JSON structure.

**JSON Fields:**
*   `story`: (String) The complete, combined text of all four scenes.
*   `main_characters`: (Array of Objects) A list containing 1 or 2 main characters.
    *   `name`: (String) The character's name.
    *   `description`: (String) A VERY detailed and specific visual description. Focus on colors, textures, size, unique features, and clothing. This is used to generate images, so be precise (e.g., "a tiny robot made of polished chrome with bright blue LED eyes and a small, rusty antenna on its head").
*   `scenes`: (Array of Objects) A list of exactly 4 scene objects.
    *   `index`: (Integer) The scene number (1, 2, 3, or 4).
    *   `title`: (String) The title of the scene ("The Setup", "The Inciting Incident", "The Climax", "The Resolution").
    *   `description`: (String) A description of the scene's ACTION and SETTING only. **DO NOT** describe the characters' appearance here. Focus on what is happening and where (e.g., "A sleek, futuristic cityscape with flying cars and neon signs, with rain pouring down on the metallic streets.").
    *   `text`: (String) The portion of the story text that belongs to this scene.

---
**EXAMPLE**

**User Keywords:** "tiny robot", "lost kitten", "rainy city"

**Expected JSON Output:**
```json
{
  "story": "Unit 734, a tiny robot, rolled through the rainy city, its single blue eye scanning the wet streets. It wasn't looking for its charging station, but for a tiny, lost kitten it had heard crying. The kitten was huddled under a glowing noodle shop sign, shivering and scared. Unit 734 extended a metallic arm, offering a warm, dry space inside its chassis. The kitten hesitated, then crawled in, purring softly. Together, they rolled off into the night, a strange but happy pair, no longer lost or alone in the vast, rainy city.",
  "main_characters": [
    {
      "name": "Unit 734",
      "description": "A small, cube-shaped robot about the size of a toaster, made of gleaming silver metal. It moves on a single, large rubber wheel. Its face is a simple black screen with a single, expressive, bright blue circular LED for an eye. It has two multi-jointed, slender arms that can retract into its body."
    },
    {
      "name": "The Kitten",
      "description": "A very small, fluffy black kitten with large, emerald-green eyes. It has a tiny patch of white fur on its chest and a short, stubby tail. Its fur is matted and wet from the rain."
    }
  ],
  "scenes": [
    {
      "index": 1,
      "title": "The Setup",
      "description": "A wide-angle view of a futuristic city at night. Rain is falling heavily, creating reflections on the dark, metallic streets. Neon signs in various languages glow brightly on the sides of towering skyscrapers.",
      "text": "Unit 734, a tiny robot, rolled through the rainy city, its single blue eye scanning the wet streets."
    },
    {
      "index": 2,
      "title": "The Inciting Incident",
      "description": "A close-up on a narrow, cluttered alleyway. A small, shivering creature is huddled under the bright, colorful glow of a Japanese noodle shop sign. Steam rises from a nearby vent.",
      "text": "It wasn't looking for its charging station, but for a tiny, lost kitten it had heard crying. The kitten was huddled under a glowing noodle shop sign, shivering and scared."
    },
    {
      "index": 3,
      "title": "The Climax",
      "description": "A medium shot showing the robot stopped in front of the kitten. One of the robot's arms is extended gently towards the small animal. The robot's chassis is open, revealing a warm, softly lit interior compartment.",
      "text": "Unit 734 extended a metallic arm, offering a warm, dry space inside its chassis. The kitten hesitated, then crawled in, purring softly."
    },
    {
      "index": 4,
      "title": "The Resolution",
      "description": "The robot is rolling away down a less crowded street. The city lights are blurred in the background, creating a soft, peaceful bokeh effect. The rain has lightened to a drizzle.",
      "text": "Together, they rolled off into the night, a strange but happy pair, no longer lost or alone in the vast, rainy city."
    }
  ]
}
```
---

Now, generate a new story based on the user's keywords, following all instructions precisely.
"#;

/// Request asking the story model for a story about `keywords`.
///
/// ```
/// use storygen_rate_limit::StorySettings;
/// use storygen_story::story_request;
///
/// let request = story_request("dragon, library", &StorySettings::default());
/// assert_eq!(request.messages.len(), 2);
/// assert_eq!(request.messages[1].joined_text(), "Keywords: dragon, library");
/// ```
pub fn story_request(keywords: &str, settings: &StorySettings) -> GenerateRequest {
    GenerateRequest {
        messages: vec![
            Message::system(STORY_INSTRUCTIONS),
            Message::user(format!("Keywords: {}", keywords.trim())),
        ],
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        model: Some(settings.model.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Story;
    use storygen_core::Role;

    #[test]
    fn instructions_name_every_scene_label() {
        for label in ["The Setup", "The Inciting Incident", "The Climax", "The Resolution"] {
            assert!(STORY_INSTRUCTIONS.contains(label), "missing {label}");
        }
        assert!(STORY_INSTRUCTIONS.contains("between 100 and 200 words"));
    }

    #[test]
    fn worked_example_is_a_valid_story() {
        let story = Story::from_llm_response(STORY_INSTRUCTIONS).unwrap();
        assert_eq!(story.main_characters().len(), 2);
        assert_eq!(story.scenes()[0].text().split_whitespace().next(), Some("Unit"));
    }

    #[test]
    fn request_carries_settings() {
        let settings = StorySettings {
            model: "gemini-2.5-pro".to_string(),
            temperature: Some(0.4),
            max_tokens: Some(1024),
            ..StorySettings::default()
        };
        let request = story_request("  moon, owl ", &settings);

        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.messages[1].joined_text(), "Keywords: moon, owl");
        assert_eq!(request.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.max_tokens, Some(1024));
    }
}
