/// Color transform utilities
///
/// This module turns the filter adjustments into pixel math:
/// - saturate / hue-rotate / sepia / grayscale are 3x3 RGB matrices
/// - brightness / contrast are per-channel linear functions
///
/// Matrices follow the W3C Filter Effects definitions, so a preset renders
/// the same way a browser would draw its filter string.

use cgmath::{Matrix3, SquareMatrix, Vector3};
use image::{Rgb, RgbImage};

/// One adjustment of a filter preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// 0.0 = grayscale, 1.0 = unchanged, >1.0 = oversaturated
    Saturate(f32),
    /// Slope around mid-gray (1.0 = unchanged)
    Contrast(f32),
    /// Linear multiplier (1.0 = unchanged)
    Brightness(f32),
    /// Rotation around the luminance axis, in degrees
    HueRotate(f32),
    /// Mix toward sepia tone (0.0..=1.0)
    Sepia(f32),
    /// Mix toward luminance (0.0..=1.0)
    Grayscale(f32),
}

impl Adjustment {
    /// CSS filter function text for this adjustment
    pub fn css(&self) -> String {
        match self {
            Self::Saturate(v) => format!("saturate({v})"),
            Self::Contrast(v) => format!("contrast({v})"),
            Self::Brightness(v) => format!("brightness({v})"),
            Self::HueRotate(deg) => format!("hue-rotate({deg}deg)"),
            Self::Sepia(v) => format!("sepia({v})"),
            Self::Grayscale(v) => format!("grayscale({v})"),
        }
    }

    /// Affine transform for this single adjustment
    pub fn transform(&self) -> ColorTransform {
        match *self {
            Self::Saturate(s) => ColorTransform::linear(saturate_matrix(s)),
            Self::HueRotate(deg) => ColorTransform::linear(hue_rotate_matrix(deg)),
            Self::Sepia(a) => ColorTransform::linear(sepia_matrix(a)),
            Self::Grayscale(a) => ColorTransform::linear(grayscale_matrix(a)),
            Self::Brightness(b) => ColorTransform::linear(Matrix3::from_diagonal(Vector3::new(b, b, b))),
            Self::Contrast(c) => {
                let intercept = 0.5 - 0.5 * c;
                ColorTransform {
                    matrix: Matrix3::from_diagonal(Vector3::new(c, c, c)),
                    offset: Vector3::new(intercept, intercept, intercept),
                }
            }
        }
    }
}

/// `rgb' = matrix * rgb + offset` on normalized (0..1) channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    pub matrix: Matrix3<f32>,
    pub offset: Vector3<f32>,
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
            offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    fn linear(matrix: Matrix3<f32>) -> Self {
        Self {
            matrix,
            offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    /// Compose an ordered adjustment list into one transform.
    /// The first adjustment is applied first.
    pub fn from_adjustments(adjustments: &[Adjustment]) -> Self {
        adjustments
            .iter()
            .fold(Self::identity(), |acc, adj| acc.then(&adj.transform()))
    }

    /// `self` followed by `next`
    pub fn then(&self, next: &ColorTransform) -> Self {
        Self {
            matrix: next.matrix * self.matrix,
            offset: next.matrix * self.offset + next.offset,
        }
    }

    /// Linear blend between two transforms (`t = 0` → self, `t = 1` → other)
    pub fn lerp(&self, other: &ColorTransform, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            matrix: self.matrix * (1.0 - t) + other.matrix * t,
            offset: self.offset * (1.0 - t) + other.offset * t,
        }
    }

    pub fn is_identity(&self) -> bool {
        const EPSILON: f32 = 0.0001;
        let id = Matrix3::<f32>::identity();
        (0..3).all(|c| (0..3).all(|r| (self.matrix[c][r] - id[c][r]).abs() < EPSILON))
            && self.offset.x.abs() < EPSILON
            && self.offset.y.abs() < EPSILON
            && self.offset.z.abs() < EPSILON
    }

    /// Transform one 8-bit pixel (clamped)
    #[inline]
    pub fn apply_pixel(&self, px: Rgb<u8>) -> Rgb<u8> {
        let v = Vector3::new(
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        );
        let out = self.matrix * v + self.offset;
        Rgb([to_u8(out.x), to_u8(out.y), to_u8(out.z)])
    }

    /// Transform every pixel in place. Identity transforms leave the buffer untouched.
    pub fn apply(&self, image: &mut RgbImage) {
        if self.is_identity() {
            return;
        }
        for px in image.pixels_mut() {
            *px = self.apply_pixel(*px);
        }
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Build a matrix from row-major rows (cgmath stores columns)
fn from_rows(r: [[f32; 3]; 3]) -> Matrix3<f32> {
    Matrix3::from_cols(
        Vector3::new(r[0][0], r[1][0], r[2][0]),
        Vector3::new(r[0][1], r[1][1], r[2][1]),
        Vector3::new(r[0][2], r[1][2], r[2][2]),
    )
}

fn saturate_matrix(s: f32) -> Matrix3<f32> {
    from_rows([
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ])
}

fn hue_rotate_matrix(degrees: f32) -> Matrix3<f32> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    from_rows([
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ])
}

fn sepia_matrix(amount: f32) -> Matrix3<f32> {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    from_rows([
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ])
}

fn grayscale_matrix(amount: f32) -> Matrix3<f32> {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    from_rows([
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_detection() {
        assert!(ColorTransform::identity().is_identity());
        assert!(ColorTransform::from_adjustments(&[]).is_identity());
        assert!(Adjustment::Saturate(1.0).transform().is_identity());
        assert!(Adjustment::Contrast(1.0).transform().is_identity());
        assert!(Adjustment::HueRotate(0.0).transform().is_identity());
        assert!(!Adjustment::Brightness(1.1).transform().is_identity());
    }

    #[test]
    fn test_full_grayscale_equalizes_channels() {
        let gray = Adjustment::Grayscale(1.0).transform();
        let out = gray.apply_pixel(Rgb([200, 40, 90]));
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
    }

    #[test]
    fn test_contrast_pivots_on_mid_gray() {
        let contrast = Adjustment::Contrast(1.5).transform();
        let mid = contrast.apply_pixel(Rgb([128, 128, 128]));
        assert!((mid[0] as i32 - 128).abs() <= 1);
        let dark = contrast.apply_pixel(Rgb([64, 64, 64]));
        assert!(dark[0] < 64);
    }

    #[test]
    fn test_order_matters() {
        // brightness then contrast differs from contrast then brightness
        let a = ColorTransform::from_adjustments(&[
            Adjustment::Brightness(0.4),
            Adjustment::Contrast(3.0),
        ]);
        let b = ColorTransform::from_adjustments(&[
            Adjustment::Contrast(3.0),
            Adjustment::Brightness(0.4),
        ]);
        let px = Rgb([230, 230, 230]);

        // 3 * (0.4 * x) - 1.0 vs 0.4 * (3 * x - 1.0)
        assert_eq!(a.apply_pixel(px)[0], 21);
        assert_eq!(b.apply_pixel(px)[0], 174);
    }

    #[test]
    fn test_lerp_endpoints() {
        let sepia = Adjustment::Sepia(1.0).transform();
        let id = ColorTransform::identity();
        assert!(id.lerp(&sepia, 0.0).is_identity());
        assert_eq!(id.lerp(&sepia, 1.0), sepia);
    }

    #[test]
    fn test_apply_identity_is_noop() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        ColorTransform::identity().apply(&mut img);
        assert!(img.pixels().all(|p| *p == Rgb([10, 20, 30])));
    }

    #[test]
    fn test_css_text() {
        assert_eq!(Adjustment::HueRotate(-15.0).css(), "hue-rotate(-15deg)");
        assert_eq!(Adjustment::Sepia(0.6).css(), "sepia(0.6)");
    }
}
