/// Generative AI collaborators
///
/// The Session controller talks to two external services through the traits
/// below: one writes captions, the other edits the photo from a text
/// instruction. `GeminiClient` implements both over HTTP; tests substitute
/// in-process fakes.

use async_trait::async_trait;

use crate::capture::CapturedImage;
use crate::error::Result;

pub mod gemini;

pub use gemini::GeminiClient;

/// Instruction sent alongside the photo when asking for a caption
pub const CAPTION_PROMPT: &str = "Analyze this image and write a short, nostalgic, witty, or \
sentimental caption suitable for writing on the bottom margin of a polaroid photo. It should be \
casual and feel like a memory. Maximum 8 words. Do not use quotes.";

/// Caption used when the service answers with no text
pub const FALLBACK_EMPTY_CAPTION: &str = "A moment frozen in time...";

/// Caption used when the service call fails outright
pub const FALLBACK_ERROR_CAPTION: &str = "Good times.";

#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Write a short caption for `image`.
    ///
    /// # Returns
    /// * `Ok(text)` - Caption text (possibly a fallback literal)
    /// * `Err(ServiceError | MissingApiKey)` - Transport or service failure
    async fn generate_caption(&self, image: &CapturedImage) -> Result<String>;
}

#[async_trait]
pub trait ImageEditService: Send + Sync {
    /// Transform `image` according to `prompt`.
    ///
    /// # Returns
    /// * `Ok(Some(image))` - The edited photo
    /// * `Ok(None)` - The service answered but produced no image
    /// * `Err(ServiceError | MissingApiKey)` - Transport or service failure
    async fn edit_image(&self, image: &CapturedImage, prompt: &str) -> Result<Option<CapturedImage>>;
}

/// Both collaborators behind one handle
pub trait AiCollaborator: CaptionService + ImageEditService {}

impl<T: CaptionService + ImageEditService> AiCollaborator for T {}

/// Caption that never fails: service errors become `FALLBACK_ERROR_CAPTION`
pub async fn caption_or_fallback(service: &dyn CaptionService, image: &CapturedImage) -> String {
    match service.generate_caption(image).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "caption request failed, using fallback");
            FALLBACK_ERROR_CAPTION.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapError;
    use image::{Rgb, RgbImage};

    struct Broken;

    #[async_trait]
    impl CaptionService for Broken {
        async fn generate_caption(&self, _image: &CapturedImage) -> Result<String> {
            Err(SnapError::ServiceError("503".into()))
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl CaptionService for Fixed {
        async fn generate_caption(&self, _image: &CapturedImage) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn photo() -> CapturedImage {
        CapturedImage::from_rgb_jpeg(&RgbImage::from_pixel(8, 8, Rgb([9, 9, 9])), 90).unwrap()
    }

    #[tokio::test]
    async fn test_caption_or_fallback() {
        assert_eq!(caption_or_fallback(&Broken, &photo()).await, "Good times.");
        assert_eq!(caption_or_fallback(&Fixed("Beach day"), &photo()).await, "Beach day");
    }

    #[test]
    fn test_prompt_wording() {
        assert!(CAPTION_PROMPT.contains("Maximum 8 words."));
        assert!(CAPTION_PROMPT.ends_with("Do not use quotes."));
        assert!(!CAPTION_PROMPT.contains("  "));
    }
}
