/// Filter Registry
///
/// Ten fixed film presets. Each preset is defined once as a static and looked
/// up by indexing with its `FilterKind`, so lookup is O(1) and cannot fail.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::{Adjustment, ColorTransform};
use crate::error::SnapError;

/// Identifier of a filter preset. Serialized as its display name.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterKind {
    #[default]
    Normal,
    Vintage,
    #[serde(rename = "B&W")]
    BlackAndWhite,
    Cool,
    Warm,
    Faded,
    Dramatic,
    Velvia,
    Chrome,
    Instax,
}

impl FilterKind {
    /// All presets in display order
    pub const ALL: [FilterKind; 10] = [
        FilterKind::Normal,
        FilterKind::Vintage,
        FilterKind::BlackAndWhite,
        FilterKind::Cool,
        FilterKind::Warm,
        FilterKind::Faded,
        FilterKind::Dramatic,
        FilterKind::Velvia,
        FilterKind::Chrome,
        FilterKind::Instax,
    ];

    /// Display name ("B&W", "Vintage", ...)
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// The preset's parameters
    pub fn spec(self) -> &'static FilterSpec {
        &FILTERS[self as usize]
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = SnapError;

    /// Accepts display names case-insensitively ("b&w", "Warm")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FilterKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SnapError::InvalidInput(format!("unknown filter: {wanted}")))
    }
}

/// Immutable preset definition
#[derive(Debug, PartialEq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub name: &'static str,
    /// Display-style transform, in CSS filter syntax
    pub css_filter: &'static str,
    /// Ordered color adjustments; the first entry is applied first
    pub adjustments: &'static [Adjustment],
}

impl FilterSpec {
    /// All adjustments composed into one transform
    pub fn color_transform(&self) -> ColorTransform {
        ColorTransform::from_adjustments(self.adjustments)
    }

    /// True for presets that leave pixels unchanged
    pub fn is_identity(&self) -> bool {
        self.adjustments.is_empty() || self.color_transform().is_identity()
    }
}

use Adjustment::{Brightness, Contrast, Grayscale, HueRotate, Saturate, Sepia};

/// Indexed by `FilterKind as usize`; order must match the enum.
static FILTERS: [FilterSpec; 10] = [
    FilterSpec {
        kind: FilterKind::Normal,
        name: "Normal",
        css_filter: "none",
        adjustments: &[],
    },
    FilterSpec {
        kind: FilterKind::Vintage,
        name: "Vintage",
        css_filter: "sepia(0.6) contrast(1.1) brightness(0.9) saturate(0.8)",
        adjustments: &[Sepia(0.6), Contrast(1.1), Brightness(0.9), Saturate(0.8)],
    },
    FilterSpec {
        kind: FilterKind::BlackAndWhite,
        name: "B&W",
        css_filter: "grayscale(1) contrast(1.2) brightness(1.1)",
        adjustments: &[Grayscale(1.0), Contrast(1.2), Brightness(1.1)],
    },
    FilterSpec {
        kind: FilterKind::Cool,
        name: "Cool",
        css_filter: "hue-rotate(15deg) contrast(1.1) saturate(0.8)",
        adjustments: &[HueRotate(15.0), Contrast(1.1), Saturate(0.8)],
    },
    FilterSpec {
        kind: FilterKind::Warm,
        name: "Warm",
        css_filter: "sepia(0.3) hue-rotate(-15deg) saturate(1.2)",
        adjustments: &[Sepia(0.3), HueRotate(-15.0), Saturate(1.2)],
    },
    FilterSpec {
        kind: FilterKind::Faded,
        name: "Faded",
        css_filter: "brightness(1.1) saturate(0.6) contrast(0.9)",
        adjustments: &[Brightness(1.1), Saturate(0.6), Contrast(0.9)],
    },
    FilterSpec {
        kind: FilterKind::Dramatic,
        name: "Dramatic",
        css_filter: "contrast(1.3) saturate(1.2) brightness(0.9)",
        adjustments: &[Contrast(1.3), Saturate(1.2), Brightness(0.9)],
    },
    FilterSpec {
        kind: FilterKind::Velvia,
        name: "Velvia",
        css_filter: "saturate(1.5) contrast(1.15) brightness(0.95)",
        adjustments: &[Saturate(1.5), Contrast(1.15), Brightness(0.95)],
    },
    FilterSpec {
        kind: FilterKind::Chrome,
        name: "Chrome",
        css_filter: "contrast(1.15) saturate(0.85) hue-rotate(-5deg)",
        adjustments: &[Contrast(1.15), Saturate(0.85), HueRotate(-5.0)],
    },
    FilterSpec {
        kind: FilterKind::Instax,
        name: "Instax",
        css_filter: "brightness(1.08) contrast(0.95) saturate(1.1) sepia(0.15)",
        adjustments: &[Brightness(1.08), Contrast(0.95), Saturate(1.1), Sepia(0.15)],
    },
];
