//! Image command handler.

use storygen::{AspectRatio, ImageOptions, StorygenConfig, StorygenResult, build_image_tool};

/// Handle the `image` command: run the image tool once and print its result.
pub async fn run_image(
    config: &StorygenConfig,
    prompt: &str,
    aspect_ratio: Option<AspectRatio>,
    count: Option<u32>,
    negative_prompt: Option<String>,
) -> StorygenResult<()> {
    let tool = build_image_tool(config)?;
    let options = ImageOptions {
        negative_prompt,
        aspect_ratio,
        number_of_images: count,
    };

    let result = tool.run(prompt, &options).await;
    if let Some(error) = result.error() {
        tracing::warn!(error, "Image tool reported a failure");
    }
    println!("{}", result.to_json());
    Ok(())
}
