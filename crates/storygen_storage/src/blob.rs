//! Object naming for generated images.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum number of prompt characters kept in an object name.
const PROMPT_FRAGMENT_LEN: usize = 30;

/// Reduce a prompt to a short fragment that is safe inside an object name.
///
/// Takes the first 30 characters, keeps alphanumerics, spaces, `-` and `_`,
/// trims trailing whitespace, then replaces spaces with `_`.
///
/// ```
/// use storygen_storage::safe_prompt_fragment;
///
/// assert_eq!(safe_prompt_fragment("A robot's day!"), "A_robots_day");
/// ```
pub fn safe_prompt_fragment(prompt: &str) -> String {
    prompt
        .chars()
        .take(PROMPT_FRAGMENT_LEN)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .replace(' ', "_")
}

/// Object name for the `index`-th image of a prompt.
///
/// `generated_images/{YYYYMMDD_HHMMSS}_{fragment}_{index}_{uuid8}.png`
pub fn blob_name(prompt: &str, index: usize, now: DateTime<Utc>) -> String {
    let unique = Uuid::new_v4().simple().to_string();
    format!(
        "generated_images/{}_{}_{}_{}.png",
        now.format("%Y%m%d_%H%M%S"),
        safe_prompt_fragment(prompt),
        index,
        &unique[..8]
    )
}
