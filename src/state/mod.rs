/// State management module
///
/// This module handles all application state, including:
/// - Records, phases, notices and events (data.rs)
/// - The editable filter/caption draft (draft.rs)
/// - The in-memory gallery of saved polaroids (gallery.rs)
/// - The Session controller state machine (session.rs)

pub mod data;
pub mod draft;
pub mod gallery;
pub mod session;

pub use data::{CaptureOrigin, Notice, Phase, PolaroidId, PolaroidRecord, SessionEvent};
pub use draft::Draft;
pub use gallery::GalleryStore;
pub use session::{AiTask, CaptionTicket, EditTicket, SessionController};
