//! Story generation command handler.

use storygen::{JsonLinesSink, StorygenConfig, StorygenResult, build_pipeline};

/// Handle the `generate` command.
///
/// Every message a websocket client would receive is printed to stdout as
/// one JSON line.
pub async fn run_generate(config: &StorygenConfig, keywords: &str, user_id: &str) -> StorygenResult<()> {
    let pipeline = build_pipeline(config)?;
    let mut sink = JsonLinesSink::new(std::io::stdout());

    tracing::info!(user_id, "Generating story");
    pipeline.run(user_id, keywords, &mut sink).await
}
