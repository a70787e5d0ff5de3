//! Image tool behavior against mock models and storage.

mod test_utils;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;
use storygen_core::AspectRatio;
use storygen_error::ImagenErrorKind;
use storygen_story::{
    DEFAULT_NEGATIVE_PROMPT, EMPTY_PROMPT_ERROR, ImageOptions, ImageToolResult, ImagenTool,
    TOOL_STYLE_PREFIX,
};
use test_utils::{FailingStorage, MemoryStorage, MockImageGenerator, PNG_BYTES};

#[tokio::test]
async fn blank_prompt_is_rejected_without_calling_the_model() {
    let generator = Arc::new(MockImageGenerator::new_success());
    let tool = ImagenTool::new(generator.clone());

    let result = tool.run("   ", &ImageOptions::default()).await;

    assert_eq!(
        result,
        ImageToolResult::Rejected {
            error: EMPTY_PROMPT_ERROR.to_string()
        }
    );
    assert_eq!(generator.call_count(), 0);
    assert_eq!(
        result.to_json(),
        r#"{"error":"Prompt is required for image generation"}"#
    );
}

#[tokio::test]
async fn defaults_and_style_prefix_reach_the_model() {
    let generator = Arc::new(MockImageGenerator::new_success());
    let tool = ImagenTool::new(generator.clone());

    tool.run("a frog on a lily pad", &ImageOptions::default()).await;

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.prompt(),
        &format!("{TOOL_STYLE_PREFIX} a frog on a lily pad")
    );
    assert_eq!(request.negative_prompt().as_deref(), Some(DEFAULT_NEGATIVE_PROMPT));
    assert_eq!(*request.aspect_ratio(), AspectRatio::Wide);
    assert_eq!(*request.number_of_images(), 1);
}

#[tokio::test]
async fn options_override_defaults() {
    let generator = Arc::new(MockImageGenerator::new_success());
    let tool = ImagenTool::new(generator.clone());
    let options = ImageOptions {
        negative_prompt: Some("dark".to_string()),
        aspect_ratio: Some(AspectRatio::Square),
        number_of_images: Some(2),
    };

    let result = tool.run("owl", &options).await;

    let request = &generator.requests()[0];
    assert_eq!(request.negative_prompt().as_deref(), Some("dark"));
    assert_eq!(*request.aspect_ratio(), AspectRatio::Square);
    assert_eq!(result.images().len(), 2);
    assert_eq!(*result.images()[1].index(), 1);
}

#[tokio::test]
async fn without_storage_images_are_inline() {
    let tool = ImagenTool::new(Arc::new(MockImageGenerator::new_success()));

    let result = tool.run("owl", &ImageOptions::default()).await;

    match &result {
        ImageToolResult::Completed {
            success,
            images_generated,
            images_in_bucket,
            bucket_name,
            token_safe,
            images,
        } => {
            assert!(*success);
            assert_eq!(*images_generated, 1);
            assert_eq!(*images_in_bucket, 0);
            assert_eq!(*bucket_name, None);
            assert!(!*token_safe);
            assert_eq!(images[0].base64().as_deref(), Some(STANDARD.encode(PNG_BYTES).as_str()));
            assert_eq!(images[0].format().as_deref(), Some("png"));
            assert!(!images[0].is_stored());
            assert_eq!(*images[0].bucket_error(), None);
        }
        other => panic!("expected completed result, got {other:?}"),
    }
}

#[tokio::test]
async fn stored_images_are_returned_by_url() {
    let storage = Arc::new(MemoryStorage::public("https://storage.googleapis.com/story-bucket"));
    let tool = ImagenTool::new(Arc::new(MockImageGenerator::new_success()))
        .with_storage(storage.clone(), Some("story-bucket".to_string()));

    let result = tool.run("A happy kitten", &ImageOptions::default()).await;

    let names = storage.object_names();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("generated_images/"));
    assert!(names[0].contains("_Childrens_book_illustration_i_0_"));

    let entry = &result.images()[0];
    assert!(entry.is_stored());
    assert_eq!(
        entry.gcs_url().as_deref(),
        Some(format!("https://storage.googleapis.com/story-bucket/{}", names[0]).as_str())
    );
    assert_eq!(*entry.base64(), None);

    let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
    assert_eq!(json["bucket_name"], "story-bucket");
    assert_eq!(json["images_in_bucket"], 1);
    assert_eq!(json["token_safe"], true);
}

#[tokio::test]
async fn failed_upload_falls_back_to_base64() {
    let tool = ImagenTool::new(Arc::new(MockImageGenerator::new_success()))
        .with_storage(Arc::new(FailingStorage), Some("story-bucket".to_string()));

    let result = tool.run("owl", &ImageOptions::default()).await;

    let entry = &result.images()[0];
    assert!(!entry.is_stored());
    assert!(entry.base64().is_some());
    assert!(entry.bucket_error().as_deref().unwrap().contains("read-only"));
    assert!(matches!(result, ImageToolResult::Completed { token_safe: false, .. }));
}

#[tokio::test]
async fn storage_without_urls_counts_as_failed_upload() {
    let tool = ImagenTool::new(Arc::new(MockImageGenerator::new_success()))
        .with_storage(Arc::new(MemoryStorage::private()), None);

    let result = tool.run("owl", &ImageOptions::default()).await;

    let entry = &result.images()[0];
    assert!(!entry.is_stored());
    assert!(entry.bucket_error().as_deref().unwrap().contains("No public URL"));
}

#[tokio::test]
async fn empty_image_bytes_become_entry_errors() {
    let tool = ImagenTool::new(Arc::new(MockImageGenerator::new_images(vec![
        Vec::new(),
        PNG_BYTES.to_vec(),
    ])));

    let result = tool.run("owl", &ImageOptions::default()).await;

    let images = result.images();
    assert_eq!(images.len(), 2);
    assert!(images[0].error().as_deref().unwrap().starts_with("Failed to process image: "));
    assert!(images[1].base64().is_some());
}

#[tokio::test]
async fn model_errors_are_reported_not_raised() {
    let tool = ImagenTool::new(Arc::new(MockImageGenerator::new_error(
        ImagenErrorKind::HttpError {
            status_code: 400,
            message: "prompt blocked".to_string(),
        },
    )));

    let result = tool.run("owl", &ImageOptions::default()).await;

    let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
    assert_eq!(json["success"], false);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Image generation failed: "));
    assert!(error.contains("prompt blocked"));
}
