/// Polaroid compositor
///
/// Renders a photo, its filter and caption into the fixed instant-film frame:
/// off-white paper, a near-black backing 2 units larger than the photo, the
/// center-square photo with its filter and a soft vignette, then the caption
/// in the wide bottom band.

use chrono::{DateTime, Utc};
use image::{imageops, DynamicImage, Rgb, RgbImage};

use super::download::DownloadArtifact;
use super::font;
use super::layout::PolaroidLayout;
use crate::capture::captured::encode_jpeg;
use crate::capture::frame::square_crop_dynamic;
use crate::capture::CapturedImage;
use crate::color::ColorTransform;
use crate::config::SnapConfig;
use crate::error::{Result, SnapError};
use crate::filters::{FilterKind, FilterSpec};

/// Frame paper (#f8f8f8)
pub const PAPER: Rgb<u8> = Rgb([0xf8, 0xf8, 0xf8]);
/// Backing behind the photo (#101010)
pub const BACKING: Rgb<u8> = Rgb([0x10, 0x10, 0x10]);

/// Vignette ramp, as fractions of the photo's half-diagonal
const VIGNETTE_START: f32 = 0.3;
const VIGNETTE_END: f32 = 0.8;
const VIGNETTE_MAX_ALPHA: f32 = 0.2;

/// Largest canvas side we will allocate
const MAX_CANVAS_SIDE: u32 = 16_384;

/// Render the polaroid for a decoded source image.
///
/// # Arguments
/// * `source` - Photo of any aspect; it is center-cropped to a square
/// * `caption` - Drawn in the bottom band when non-empty
/// * `filter` - Preset applied to the photo pixels
/// * `layout` - Frame geometry
///
/// # Returns
/// * `Ok(RgbImage)` - The finished frame, `layout.width x layout.height`
/// * `Err(ImageLoadFailed)` - The source has no pixels
/// * `Err(SurfaceUnavailable)` - The layout cannot be rendered
pub fn render_polaroid(
    source: &DynamicImage,
    caption: &str,
    filter: &FilterSpec,
    layout: &PolaroidLayout,
) -> Result<RgbImage> {
    let transform = (!filter.is_identity()).then(|| filter.color_transform());
    compose(source, caption, transform.as_ref(), layout)
}

/// Shared body of `render_polaroid`; `None` skips color work entirely
pub(crate) fn compose(
    source: &DynamicImage,
    caption: &str,
    transform: Option<&ColorTransform>,
    layout: &PolaroidLayout,
) -> Result<RgbImage> {
    if source.width() == 0 || source.height() == 0 {
        return Err(SnapError::ImageLoadFailed("source image has no pixels".into()));
    }
    check_surface(layout)?;

    let mut canvas = RgbImage::from_pixel(layout.width, layout.height, PAPER);

    // ========== Backing ==========
    let inset = layout.padding.saturating_sub(layout.border);
    let backing = layout.photo_size + 2 * layout.border;
    fill(&mut canvas, inset, inset, backing, backing, BACKING);

    // ========== Photo ==========
    let mut photo = fit_square(source, layout.photo_size);
    if let Some(transform) = transform {
        transform.apply(&mut photo);
    }
    apply_vignette(&mut photo);
    imageops::replace(&mut canvas, &photo, layout.padding as i64, layout.padding as i64);

    // ========== Caption ==========
    if !caption.is_empty() {
        font::draw_caption(
            &mut canvas,
            caption,
            layout.width as f32 / 2.0,
            layout.caption_center_y() as f32,
            layout.font_px,
            layout.caption_max_width() as f32,
        );
    }

    Ok(canvas)
}

/// Center-crop to a square and scale to `size`
pub fn fit_square(source: &DynamicImage, size: u32) -> RgbImage {
    let square = square_crop_dynamic(source).to_rgb8();
    if square.width() == size {
        square
    } else {
        imageops::resize(&square, size, size, imageops::FilterType::Triangle)
    }
}

/// Radial darkening: clear inside 30% of the half-diagonal, ramping to 20%
/// black at 80% and beyond.
pub fn apply_vignette(photo: &mut RgbImage) {
    let (w, h) = photo.dimensions();
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let half_diagonal = (cx * cx + cy * cy).sqrt();
    let inner = VIGNETTE_START * half_diagonal;
    let outer = VIGNETTE_END * half_diagonal;

    for (x, y, px) in photo.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let d = (dx * dx + dy * dy).sqrt();
        if d <= inner {
            continue;
        }
        let t = ((d - inner) / (outer - inner)).min(1.0);
        let keep = 1.0 - VIGNETTE_MAX_ALPHA * t;
        for c in px.0.iter_mut() {
            *c = (*c as f32 * keep).round() as u8;
        }
    }
}

fn check_surface(layout: &PolaroidLayout) -> Result<()> {
    let fits = layout.photo_size > 0
        && layout.width <= MAX_CANVAS_SIDE
        && layout.height <= MAX_CANVAS_SIDE
        && layout.padding + layout.photo_size + layout.border <= layout.width
        && layout.photo_bottom() + layout.border <= layout.height;
    if fits {
        Ok(())
    } else {
        Err(SnapError::SurfaceUnavailable(format!(
            "cannot lay out a {}x{} frame around a {}px photo",
            layout.width, layout.height, layout.photo_size
        )))
    }
}

fn fill(canvas: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x1 = (x + w).min(canvas.width());
    let y1 = (y + h).min(canvas.height());
    for py in y..y1 {
        for px in x..x1 {
            canvas.put_pixel(px, py, color);
        }
    }
}

/// Decode, render and encode in one pass. Blocking; call from a worker.
pub fn composite_jpeg(
    image: &CapturedImage,
    caption: &str,
    filter: &FilterSpec,
    layout: &PolaroidLayout,
    quality: u8,
) -> Result<Vec<u8>> {
    let source = image
        .decode()
        .map_err(|e| SnapError::ImageLoadFailed(e.to_string()))?;
    let frame = render_polaroid(&source, caption, filter, layout)?;
    encode_jpeg(&frame, quality)
}

/// Composite a polaroid file named after the current time
pub async fn create_downloadable_polaroid(
    image: &CapturedImage,
    caption: &str,
    filter: FilterKind,
    config: &SnapConfig,
) -> Result<DownloadArtifact> {
    create_polaroid_at(image, caption, filter, config, Utc::now()).await
}

/// Composite a polaroid file on the blocking pool.
///
/// # Arguments
/// * `taken_at` - Timestamp used for the file name
///
/// # Returns
/// * `Ok(DownloadArtifact)` - JPEG at the configured quality
/// * `Err(ImageLoadFailed | SurfaceUnavailable | EncodeFailed)` - Nothing was produced
pub async fn create_polaroid_at(
    image: &CapturedImage,
    caption: &str,
    filter: FilterKind,
    config: &SnapConfig,
    taken_at: DateTime<Utc>,
) -> Result<DownloadArtifact> {
    let layout = PolaroidLayout::for_width(config.polaroid_width)?;
    let quality = config.jpeg_quality;
    let image = image.clone();
    let caption = caption.to_string();

    let bytes = tokio::task::spawn_blocking(move || {
        composite_jpeg(&image, &caption, filter.spec(), &layout, quality)
    })
    .await
    .map_err(|e| SnapError::SurfaceUnavailable(format!("compositor task failed: {e}")))??;

    let artifact = DownloadArtifact::jpeg(bytes, taken_at);
    tracing::info!(
        file = %artifact.file_name,
        %filter,
        bytes = artifact.len(),
        "polaroid composited"
    );
    Ok(artifact)
}
