/// Polaroid frame geometry
///
/// The reference grid is 880x1070 (88x107mm film at 10px/mm): a 790px square
/// photo inset 45px from the top and sides, with the wide bottom band left for
/// the caption. Other widths scale every measure proportionally.

use crate::error::{Result, SnapError};

pub const REFERENCE_WIDTH: u32 = 880;
pub const REFERENCE_HEIGHT: u32 = 1070;
const REFERENCE_PADDING: u32 = 45;
const REFERENCE_BORDER: u32 = 2;
const REFERENCE_FONT_PX: u32 = 60;
const REFERENCE_CAPTION_NUDGE: u32 = 10;

/// Largest canvas we agree to allocate
const MAX_WIDTH: u32 = 8_192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolaroidLayout {
    pub width: u32,
    pub height: u32,
    /// Inset of the photo from the top and both sides
    pub padding: u32,
    /// Side of the square photo
    pub photo_size: u32,
    /// Dark backing visible around the photo
    pub border: u32,
    /// Nominal caption size
    pub font_px: u32,
    /// Caption sits this far below the middle of the bottom band
    pub caption_nudge: u32,
}

impl Default for PolaroidLayout {
    fn default() -> Self {
        Self {
            width: REFERENCE_WIDTH,
            height: REFERENCE_HEIGHT,
            padding: REFERENCE_PADDING,
            photo_size: REFERENCE_WIDTH - 2 * REFERENCE_PADDING,
            border: REFERENCE_BORDER,
            font_px: REFERENCE_FONT_PX,
            caption_nudge: REFERENCE_CAPTION_NUDGE,
        }
    }
}

impl PolaroidLayout {
    /// Scale the reference grid to `width`, rounding each measure to whole pixels.
    /// Fails with `SurfaceUnavailable` for widths no canvas can honor.
    pub fn for_width(width: u32) -> Result<Self> {
        if width < 10 || width > MAX_WIDTH {
            return Err(SnapError::SurfaceUnavailable(format!(
                "canvas width {width} outside 10..={MAX_WIDTH}"
            )));
        }
        if width == REFERENCE_WIDTH {
            return Ok(Self::default());
        }

        let scale = |reference: u32| (reference * width + REFERENCE_WIDTH / 2) / REFERENCE_WIDTH;
        let padding = scale(REFERENCE_PADDING);
        Ok(Self {
            width,
            height: scale(REFERENCE_HEIGHT),
            padding,
            photo_size: width - 2 * padding,
            border: scale(REFERENCE_BORDER).max(1),
            font_px: scale(REFERENCE_FONT_PX).max(1),
            caption_nudge: scale(REFERENCE_CAPTION_NUDGE),
        })
    }

    /// Top edge of the caption band
    pub fn photo_bottom(&self) -> u32 {
        self.padding + self.photo_size
    }

    /// Height of the band below the photo
    pub fn caption_band(&self) -> u32 {
        self.height - self.photo_bottom()
    }

    /// Vertical center of the caption text
    pub fn caption_center_y(&self) -> u32 {
        self.photo_bottom() + self.caption_band() / 2 + self.caption_nudge
    }

    /// Widest caption that stays inside the side margins
    pub fn caption_max_width(&self) -> u32 {
        self.photo_size
    }

    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_grid() {
        let layout = PolaroidLayout::for_width(880).unwrap();
        assert_eq!(layout, PolaroidLayout::default());
        assert_eq!(layout.photo_bottom(), 835);
        assert_eq!(layout.caption_band(), 235);
        assert_eq!(layout.caption_center_y(), 835 + 117 + 10);
    }

    #[test]
    fn test_aspect_is_preserved_when_scaling() {
        for width in [220, 440, 500, 1000, 1760, 4000] {
            let layout = PolaroidLayout::for_width(width).unwrap();
            assert!((layout.aspect() - 1.2159).abs() < 0.005, "width {width}");
            assert_eq!(layout.photo_size + 2 * layout.padding, width);
            assert!(layout.photo_bottom() < layout.height);
        }
    }

    #[test]
    fn test_proportions() {
        let layout = PolaroidLayout::default();
        let margin = layout.padding as f32 / layout.width as f32;
        let photo = layout.photo_size as f32 / layout.width as f32;
        let font = layout.font_px as f32 / layout.width as f32;
        assert!((margin - 0.051).abs() < 0.001);
        assert!((photo - 0.898).abs() < 0.001);
        assert!((font - 0.068).abs() < 0.001);
    }

    #[test]
    fn test_unusable_widths() {
        assert!(matches!(
            PolaroidLayout::for_width(0),
            Err(SnapError::SurfaceUnavailable(_))
        ));
        assert!(PolaroidLayout::for_width(100_000).is_err());
    }
}
