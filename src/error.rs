/// Error taxonomy for the whole pipeline
///
/// Every failure in this crate is recoverable: camera and decode errors fall
/// back to upload-only mode, AI errors leave the Session untouched, and
/// compositor errors abort only the current download/save.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SnapError>;

#[derive(Debug, Error)]
pub enum SnapError {
    // ========== Camera ==========
    /// The user (or OS) refused camera access
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    /// No camera matches the requested facing, or it failed to open
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A capture was requested but no frame could be read
    #[error("no active video source: {0}")]
    SourceUnavailable(String),

    // ========== Images ==========
    /// Uploaded bytes are not a recognized image format
    #[error("could not decode image: {0}")]
    DecodeFailed(String),

    /// The compositor could not load its source image
    #[error("could not load source image: {0}")]
    ImageLoadFailed(String),

    /// The rendering surface could not be created
    #[error("rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// Encoding the output raster failed
    #[error("could not encode image: {0}")]
    EncodeFailed(String),

    // ========== AI collaborator ==========
    /// Transport or service failure talking to the generative service
    #[error("AI service error: {0}")]
    ServiceError(String),

    /// The edit service answered but produced no image
    #[error("AI service returned no image")]
    NoResult,

    /// AI features need an API key
    #[error("no API key configured for AI features")]
    MissingApiKey,

    // ========== Session ==========
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation requires {expected} but session is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Another AI request is already in flight for this Session
    #[error("a caption or edit request is already in progress")]
    Busy,

    /// An asynchronous result arrived for a Session that no longer exists
    #[error("result belongs to session {ticket}, current is {current:?}")]
    StaleResult { ticket: u64, current: Option<u64> },

    // ========== Ambient ==========
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// User-facing category of a notice raised from an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Camera,
    Image,
    Render,
    Ai,
    Session,
}

impl SnapError {
    /// Nothing in this system is fatal to the process.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Classify the error for the notice shown to the user
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            Self::PermissionDenied(_) | Self::DeviceUnavailable(_) | Self::SourceUnavailable(_) => {
                NoticeKind::Camera
            }
            Self::DecodeFailed(_) | Self::ImageLoadFailed(_) => NoticeKind::Image,
            Self::SurfaceUnavailable(_) | Self::EncodeFailed(_) | Self::Io(_) => NoticeKind::Render,
            Self::ServiceError(_) | Self::NoResult | Self::MissingApiKey => NoticeKind::Ai,
            Self::InvalidInput(_)
            | Self::InvalidState { .. }
            | Self::Busy
            | Self::StaleResult { .. }
            | Self::Config(_) => NoticeKind::Session,
        }
    }

    /// Camera errors put the UI into upload-only mode
    pub fn falls_back_to_upload(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_) | Self::DeviceUnavailable(_) | Self::SourceUnavailable(_)
        )
    }
}
