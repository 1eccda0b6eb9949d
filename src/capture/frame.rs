/// Still capture from live frames and uploads
///
/// Live frames are center-cropped to the largest square and optionally
/// mirrored (front cameras show a mirror image, so the saved photo matches
/// what the user saw). Uploads are passed through untouched here; whether
/// they get squared before storage is a session policy.

use image::{imageops, DynamicImage, RgbImage};

use super::captured::CapturedImage;
use crate::error::{Result, SnapError};

/// Quality factor for every lossy encode
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Largest centered square inside a `width x height` raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareRegion {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl SquareRegion {
    /// Landscape sources lose equal amounts left and right,
    /// portrait sources lose equal amounts top and bottom.
    pub fn centered(width: u32, height: u32) -> Self {
        let size = width.min(height);
        Self {
            x: (width - size) / 2,
            y: (height - size) / 2,
            size,
        }
    }
}

/// Center-square crop, flipped horizontally when `mirror` is set
pub fn square_crop(frame: &RgbImage, mirror: bool) -> RgbImage {
    let region = SquareRegion::centered(frame.width(), frame.height());
    let mut crop = imageops::crop_imm(frame, region.x, region.y, region.size, region.size).to_image();
    if mirror {
        imageops::flip_horizontal_in_place(&mut crop);
    }
    crop
}

/// Center-square crop of an already decoded image
pub fn square_crop_dynamic(image: &DynamicImage) -> DynamicImage {
    let region = SquareRegion::centered(image.width(), image.height());
    image.crop_imm(region.x, region.y, region.size, region.size)
}

/// Capture a still from one live video frame.
///
/// # Arguments
/// * `frame` - The current video frame (any aspect)
/// * `mirror` - Flip the crop horizontally (front-facing cameras)
/// * `quality` - JPEG quality factor
///
/// # Returns
/// * `Ok(CapturedImage)` - Square JPEG with side `min(W, H)`
/// * `Err(SourceUnavailable)` - The frame is empty (no active video)
pub fn capture_from_live_source(frame: &RgbImage, mirror: bool, quality: u8) -> Result<CapturedImage> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(SnapError::SourceUnavailable("video frame has no pixels".into()));
    }
    let crop = square_crop(frame, mirror);
    tracing::debug!(
        src_w = frame.width(),
        src_h = frame.height(),
        size = crop.width(),
        mirror,
        "captured live frame"
    );
    CapturedImage::from_rgb_jpeg(&crop, quality)
}

/// Accept a user-supplied file verbatim.
///
/// The bytes are validated by decoding them once; a file that isn't a
/// recognized raster fails with `DecodeFailed`.
pub fn capture_from_file(bytes: impl Into<Vec<u8>>) -> Result<CapturedImage> {
    let image = CapturedImage::from_encoded(bytes)?;
    image.decode()?;
    tracing::debug!(
        format = ?image.format(),
        width = image.width(),
        height = image.height(),
        "accepted upload"
    );
    Ok(image)
}

/// Re-encode an upload as a centered square JPEG; square inputs pass through.
pub fn square_upload(image: &CapturedImage, quality: u8) -> Result<CapturedImage> {
    if image.is_square() {
        return Ok(image.clone());
    }
    let decoded = image.decode()?;
    let square = square_crop_dynamic(&decoded).to_rgb8();
    CapturedImage::from_rgb_jpeg(&square, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::captured::encode_png;
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    /// Left half red, right half blue
    fn split_frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| if x < width / 2 { RED } else { BLUE })
    }

    fn is_reddish(px: &Rgb<u8>) -> bool {
        px[0] > 180 && px[2] < 80
    }

    fn is_bluish(px: &Rgb<u8>) -> bool {
        px[2] > 180 && px[0] < 80
    }

    #[test]
    fn test_centered_region() {
        assert_eq!(SquareRegion::centered(1920, 1080), SquareRegion { x: 420, y: 0, size: 1080 });
        assert_eq!(SquareRegion::centered(1080, 1920), SquareRegion { x: 0, y: 420, size: 1080 });
        assert_eq!(SquareRegion::centered(64, 64), SquareRegion { x: 0, y: 0, size: 64 });
    }

    #[test]
    fn test_crop_is_centered() {
        // 8x4 frame: column index encoded in red channel
        let frame = RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8, y as u8, 0]));
        let crop = square_crop(&frame, false);
        assert_eq!(crop.dimensions(), (4, 4));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([2, 0, 0]));
        assert_eq!(crop.get_pixel(3, 3), &Rgb([5, 3, 0]));
    }

    #[test]
    fn test_mirror_flips_crop() {
        let frame = RgbImage::from_fn(8, 4, |x, y| Rgb([x as u8, y as u8, 0]));
        let plain = square_crop(&frame, false);
        let mirrored = square_crop(&frame, true);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(mirrored.get_pixel(x, y), plain.get_pixel(3 - x, y));
            }
        }
    }

    #[test]
    fn test_live_capture_portrait_is_square_and_mirrored() {
        let frame = split_frame(1080, 1920);
        let still = capture_from_live_source(&frame, true, DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!((still.width(), still.height()), (1080, 1080));

        let decoded = still.decode().unwrap().to_rgb8();
        assert!(is_bluish(decoded.get_pixel(200, 540)));
        assert!(is_reddish(decoded.get_pixel(880, 540)));

        let unmirrored = capture_from_live_source(&frame, false, DEFAULT_JPEG_QUALITY)
            .unwrap()
            .decode()
            .unwrap()
            .to_rgb8();
        assert!(is_reddish(unmirrored.get_pixel(200, 540)));
    }

    #[test]
    fn test_live_capture_landscape() {
        let still = capture_from_live_source(&split_frame(640, 480), false, 90).unwrap();
        assert_eq!((still.width(), still.height()), (480, 480));
    }

    #[test]
    fn test_empty_frame_is_source_unavailable() {
        let err = capture_from_live_source(&RgbImage::new(0, 0), false, 90).unwrap_err();
        assert!(matches!(err, SnapError::SourceUnavailable(_)));
    }

    #[test]
    fn test_upload_passes_through_verbatim() {
        let png = encode_png(&split_frame(30, 10)).unwrap();
        let upload = capture_from_file(png.clone()).unwrap();
        assert_eq!(upload.bytes(), png.as_slice());
        assert_eq!((upload.width(), upload.height()), (30, 10));
    }

    #[test]
    fn test_upload_rejects_non_images() {
        let err = capture_from_file(b"GIF89a-but-not-really".to_vec()).unwrap_err();
        assert!(matches!(err, SnapError::DecodeFailed(_)));
    }

    #[test]
    fn test_square_upload() {
        let png = encode_png(&split_frame(30, 10)).unwrap();
        let upload = capture_from_file(png).unwrap();
        let square = square_upload(&upload, 90).unwrap();
        assert_eq!((square.width(), square.height()), (10, 10));

        let already = CapturedImage::from_rgb_jpeg(&split_frame(12, 12), 90).unwrap();
        assert_eq!(square_upload(&already, 90).unwrap(), already);
    }
}
