//! Pulling the story JSON out of free-form model output.
//!
//! Models asked for "only JSON" still wrap it in markdown fences or add a
//! sentence before it. Extraction looks for a fenced block first, then for
//! the first balanced object or array.

use serde::de::DeserializeOwned;
use storygen_error::{StoryError, StoryErrorKind};
use tracing::{debug, error};

/// Number of characters of the offending JSON kept in parse errors.
const PREVIEW_CHARS: usize = 100;

/// Extract a JSON document from a model response.
///
/// Order of preference:
/// 1. the body of a ```` ```json ```` fence
/// 2. the body of any other fence
/// 3. the first balanced `{...}` or `[...]`, whichever opens first
///
/// A fence without its closing marker yields everything after the opening
/// line, which is what a truncated response looks like.
///
/// # Errors
///
/// [`StoryErrorKind::NoJson`] when nothing JSON-shaped is present.
///
/// # Examples
///
/// ```
/// use storygen_story::extract_json;
///
/// let response = "Here is your story:\n```json\n{\"story\": \"Once...\"}\n```";
/// assert_eq!(extract_json(response).unwrap(), "{\"story\": \"Once...\"}");
/// ```
pub fn extract_json(response: &str) -> Result<String, StoryError> {
    if let Some(body) = fenced_body(response, "```json").or_else(|| fenced_body(response, "```")) {
        debug!(chars = body.len(), "Extracted JSON from code fence");
        return Ok(body);
    }

    let (first, second) = match (response.find('{'), response.find('[')) {
        (Some(brace), Some(bracket)) if bracket < brace => (('[', ']'), ('{', '}')),
        _ => (('{', '}'), ('[', ']')),
    };

    if let Some(json) =
        balanced(response, first.0, first.1).or_else(|| balanced(response, second.0, second.1))
    {
        return Ok(json.to_string());
    }

    error!(response_length = response.len(), "No JSON found in model response");
    Err(StoryError::new(StoryErrorKind::NoJson(response.len())))
}

/// Body of the first fence opened by `marker`, trimmed.
fn fenced_body(response: &str, marker: &str) -> Option<String> {
    let after_marker = &response[response.find(marker)? + marker.len()..];

    // A bare fence may carry a language tag on the rest of its line
    let body = if marker == "```" {
        after_marker
            .find('\n')
            .map_or(after_marker, |newline| &after_marker[newline + 1..])
    } else {
        after_marker
    };

    let body = body.find("```").map_or(body, |end| &body[..end]);
    Some(body.trim().to_string())
}

/// First `open ... close` span with matching depth, ignoring delimiters
/// inside string literals.
fn balanced(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in response[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&response[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Deserialize extracted JSON into `T`.
///
/// # Errors
///
/// [`StoryErrorKind::InvalidJson`] carrying the parser message and a short
/// preview of the input.
pub fn parse_json<T>(json: &str) -> Result<T, StoryError>
where
    T: DeserializeOwned,
{
    serde_json::from_str(json).map_err(|e| {
        let preview: String = json.chars().take(PREVIEW_CHARS).collect();
        error!(error = %e, json_preview = %preview, "Story JSON parsing failed");
        StoryError::new(StoryErrorKind::InvalidJson(format!("{} (JSON: {}...)", e, preview)))
    })
}
