/// Develop animation
///
/// While a Session is Developing, the photo fades in from a dark, washed-out
/// latent image to the fully developed result. Frames are a pure function of
/// (photo, progress) so any renderer can sample them at its own rate.

use image::RgbImage;
use std::time::Duration;

use crate::color::{Adjustment, ColorTransform};

/// Quadratic ease-in-out over 0.0..=1.0
fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// How the undeveloped photo looks: dim, flat and brownish
const LATENT: [Adjustment; 3] = [
    Adjustment::Sepia(0.8),
    Adjustment::Brightness(0.35),
    Adjustment::Contrast(0.5),
];

/// Fraction of the develop delay that has elapsed (0.0..=1.0)
pub fn develop_progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

/// Color transform for a given raw progress value
pub fn develop_transform(progress: f32) -> ColorTransform {
    let latent = ColorTransform::from_adjustments(&LATENT);
    latent.lerp(&ColorTransform::identity(), ease_in_out(progress))
}

/// Render one frame of the develop animation.
///
/// # Arguments
/// * `photo` - The filtered photo as it will look when developed
/// * `progress` - 0.0 = just ejected, 1.0 = fully developed
///
/// # Returns
/// A new image; at progress 1.0 it equals `photo`
pub fn develop_frame(photo: &RgbImage, progress: f32) -> RgbImage {
    let mut frame = photo.clone();
    develop_transform(progress).apply(&mut frame);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn luma(px: &Rgb<u8>) -> u32 {
        px.0.iter().map(|&c| c as u32).sum()
    }

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_in_out(3.0), 1.0);
        assert!(ease_in_out(0.25) < 0.25);
        assert!(ease_in_out(0.75) > 0.75);
    }

    #[test]
    fn test_fully_developed_is_unchanged() {
        let photo = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 90]));
        assert_eq!(develop_frame(&photo, 1.0), photo);
        assert_eq!(develop_frame(&photo, 7.0), photo);
    }

    #[test]
    fn test_photo_brightens_as_it_develops() {
        let photo = RgbImage::from_pixel(4, 4, Rgb([240, 240, 240]));
        let early = develop_frame(&photo, 0.0);
        let mid = develop_frame(&photo, 0.5);
        let late = develop_frame(&photo, 0.9);
        let p = |img: &RgbImage| luma(img.get_pixel(0, 0));
        assert!(p(&early) < p(&mid));
        assert!(p(&mid) < p(&late));
    }

    #[test]
    fn test_frames_are_deterministic() {
        let photo = RgbImage::from_fn(6, 6, |x, _| Rgb([x as u8 * 40, 100, 200]));
        assert_eq!(develop_frame(&photo, 0.3), develop_frame(&photo, 0.3));
    }

    #[test]
    fn test_progress_from_elapsed() {
        let total = Duration::from_millis(5_000);
        assert_eq!(develop_progress(Duration::ZERO, total), 0.0);
        assert_eq!(develop_progress(Duration::from_millis(2_500), total), 0.5);
        assert_eq!(develop_progress(Duration::from_secs(60), total), 1.0);
        assert_eq!(develop_progress(Duration::ZERO, Duration::ZERO), 1.0);
    }
}
