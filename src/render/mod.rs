/// Image compositor
///
/// This module handles:
/// - Frame geometry (`layout.rs`)
/// - The polaroid render, vignette and JPEG export (`compositor.rs`)
/// - Caption lettering (`font.rs`)
/// - Develop animation frames (`develop.rs`)
/// - Downloadable files (`download.rs`)

pub mod compositor;
pub mod develop;
pub mod download;
pub mod font;
pub mod layout;

pub use compositor::{create_downloadable_polaroid, create_polaroid_at, render_polaroid};
pub use develop::{develop_frame, develop_progress};
pub use download::DownloadArtifact;
pub use layout::PolaroidLayout;
