/// Shared data structures for the Session and Gallery
///
/// These types flow between the controller, the gallery and any observer
/// listening for `SessionEvent`s.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::capture::CapturedImage;
use crate::error::{NoticeKind, SnapError};
use crate::filters::FilterKind;

/// Unique id of a saved polaroid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolaroidId(Uuid);

impl PolaroidId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PolaroidId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PolaroidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A finalized polaroid, owned by the gallery once saved
#[derive(Debug, Clone, PartialEq)]
pub struct PolaroidRecord {
    /// Unique id, assigned on save
    pub id: PolaroidId,
    /// The working photo at save time (square, unfiltered)
    pub image: CapturedImage,
    /// Caption, already cut to the configured length
    pub caption: String,
    /// Filter applied when the polaroid is rendered
    pub filter: FilterKind,
    /// When the record was saved
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of the in-progress photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No Session
    Idle,
    /// Freshly captured, waiting for the develop delay
    Developing,
    /// Filter, caption and edit controls are available
    Ready,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Developing => "developing",
            Phase::Ready => "ready",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a Session's photo came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOrigin {
    Camera,
    Upload,
}

/// User-facing message raised for a recoverable failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn from_error(error: &SnapError) -> Self {
        Self {
            kind: error.notice_kind(),
            message: error.to_string(),
        }
    }
}

/// Broadcast to observers whenever controller state changes
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { generation: u64, origin: CaptureOrigin },
    Developed { generation: u64 },
    FilterChanged { generation: u64, filter: FilterKind },
    CaptionChanged { generation: u64, caption: String },
    ImageEdited { generation: u64 },
    BusyChanged { generation: u64, busy: bool },
    Saved { generation: u64, id: PolaroidId },
    Discarded { generation: u64 },
    GalleryRemoved { id: PolaroidId },
    GalleryEvicted { id: PolaroidId },
    Notice(Notice),
}
