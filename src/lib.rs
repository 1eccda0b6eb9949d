//! Instant-camera pipeline
//!
//! Capture a square photo from a camera or an upload, let it "develop",
//! pick a film filter, caption it (by hand or with a generative model),
//! optionally transform it with an AI edit, then composite the classic
//! instant-film frame for download or keep it in the in-memory gallery.
//!
//! The entry point is [`SessionController`]; the compositor and capture
//! functions are usable on their own.

pub mod ai;
pub mod capture;
pub mod color;
pub mod config;
pub mod error;
pub mod filters;
pub mod render;
pub mod state;

pub use ai::{AiCollaborator, CaptionService, GeminiClient, ImageEditService};
pub use capture::{CapturedImage, Facing, LiveCamera};
pub use config::{AiConfig, SnapConfig};
pub use error::{NoticeKind, Result, SnapError};
pub use filters::{FilterKind, FilterSpec};
pub use render::{create_downloadable_polaroid, render_polaroid, DownloadArtifact, PolaroidLayout};
pub use state::{GalleryStore, Phase, PolaroidId, PolaroidRecord, SessionController, SessionEvent};
