/// Polaroid Session controller
///
/// Owns the single in-progress photo and the gallery, and drives the
/// Idle → Developing → Ready → (Saved | Discarded) → Idle lifecycle.
///
/// AI requests are split in two halves so results can arrive from anywhere:
/// `begin_*` validates the request, marks the Session busy and hands back a
/// ticket carrying the Session generation; `apply_*` accepts the result only
/// if that generation is still current. A result for a discarded or saved
/// Session is rejected with `StaleResult` and never touches state.

use chrono::Utc;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use super::data::{CaptureOrigin, Notice, Phase, PolaroidId, PolaroidRecord, SessionEvent};
use super::draft::{clip_caption, Draft};
use super::gallery::GalleryStore;
use crate::ai::{AiCollaborator, CaptionService, ImageEditService};
use crate::capture::frame::{square_crop_dynamic, square_upload};
use crate::capture::{capture_from_file, CapturedImage, LiveCamera};
use crate::config::SnapConfig;
use crate::error::{Result, SnapError};
use crate::filters::FilterKind;
use crate::render::{create_downloadable_polaroid, create_polaroid_at, develop, DownloadArtifact};

const EVENT_CAPACITY: usize = 64;

/// Which AI request holds the busy flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTask {
    Caption,
    Edit,
}

/// Working state for one photo
#[derive(Debug)]
struct Session {
    generation: u64,
    image: CapturedImage,
    draft: Draft,
    phase: Phase,
    busy: Option<AiTask>,
}

/// Permission to run a caption request for a specific Session
#[derive(Debug, Clone)]
pub struct CaptionTicket {
    pub generation: u64,
    pub image: CapturedImage,
}

/// Permission to run an edit request for a specific Session
#[derive(Debug, Clone)]
pub struct EditTicket {
    pub generation: u64,
    pub image: CapturedImage,
    pub prompt: String,
}

pub struct SessionController {
    config: SnapConfig,
    ai: Arc<dyn AiCollaborator>,
    session: Option<Session>,
    gallery: GalleryStore,
    last_generation: u64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(config: SnapConfig, ai: Arc<dyn AiCollaborator>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let gallery = GalleryStore::with_capacity(config.gallery_capacity);
        Self {
            config,
            ai,
            session: None,
            gallery,
            last_generation: 0,
            events,
        }
    }

    // ========== Observation ==========

    /// Receive every state change from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    /// Generation of the active Session, if any
    pub fn generation(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.generation)
    }

    pub fn working_image(&self) -> Option<&CapturedImage> {
        self.session.as_ref().map(|s| &s.image)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.session.as_ref().map(|s| &s.draft)
    }

    pub fn busy(&self) -> Option<AiTask> {
        self.session.as_ref().and_then(|s| s.busy)
    }

    pub fn gallery(&self) -> &GalleryStore {
        &self.gallery
    }

    fn emit(&self, event: SessionEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn notify(&self, error: &SnapError) {
        self.emit(SessionEvent::Notice(Notice::from_error(error)));
    }

    // ========== Capture ==========

    /// Start a Session from an already captured still
    pub fn begin_capture(&mut self, image: CapturedImage, origin: CaptureOrigin) -> Result<u64> {
        if let Some(session) = &self.session {
            return Err(SnapError::InvalidState {
                expected: Phase::Idle.name(),
                actual: session.phase.name(),
            });
        }

        self.last_generation += 1;
        let generation = self.last_generation;
        tracing::info!(
            generation,
            ?origin,
            width = image.width(),
            height = image.height(),
            "session started, developing"
        );
        self.session = Some(Session {
            generation,
            image,
            draft: Draft::new(),
            phase: Phase::Developing,
            busy: None,
        });
        self.emit(SessionEvent::Started { generation, origin });
        Ok(generation)
    }

    /// Take a photo with the live camera and start a Session with it
    pub async fn capture_live(&mut self, camera: &mut LiveCamera) -> Result<u64> {
        if self.session.is_some() {
            return Err(SnapError::InvalidState {
                expected: Phase::Idle.name(),
                actual: self.phase().name(),
            });
        }
        match camera.capture().await {
            Ok(image) => self.begin_capture(image, CaptureOrigin::Camera),
            Err(e) => {
                self.notify(&e);
                Err(e)
            }
        }
    }

    /// Start a Session from uploaded file bytes, squaring the photo when
    /// the upload policy asks for it.
    pub fn begin_from_upload(&mut self, bytes: impl Into<Vec<u8>>) -> Result<u64> {
        let prepared = capture_from_file(bytes).and_then(|upload| {
            if self.config.square_uploads {
                square_upload(&upload, self.config.jpeg_quality)
            } else {
                Ok(upload)
            }
        });
        match prepared {
            Ok(image) => self.begin_capture(image, CaptureOrigin::Upload),
            Err(e) => {
                self.notify(&e);
                Err(e)
            }
        }
    }

    // ========== Developing ==========

    /// Future that completes after the configured develop delay
    pub fn develop_timer(&self) -> tokio::time::Sleep {
        tokio::time::sleep(self.config.develop_delay())
    }

    /// Developing → Ready for the Session with `generation`.
    /// Already-Ready Sessions are left alone.
    pub fn finish_developing(&mut self, generation: u64) -> Result<()> {
        let session = self.session_for(generation)?;
        if session.phase == Phase::Developing {
            session.phase = Phase::Ready;
            tracing::info!(generation, "session developed");
            self.emit(SessionEvent::Developed { generation });
        }
        Ok(())
    }

    /// Wait out the develop delay, then become Ready
    pub async fn develop(&mut self) -> Result<()> {
        let generation = self.active()?.generation;
        self.develop_timer().await;
        self.finish_developing(generation)
    }

    /// One frame of the develop animation for the working photo, with the
    /// selected filter, `elapsed` into the develop delay.
    pub fn develop_preview(&self, elapsed: Duration) -> Result<RgbImage> {
        let session = self.active()?;
        let progress = match session.phase {
            Phase::Ready => 1.0,
            _ => develop::develop_progress(elapsed, self.config.develop_delay()),
        };
        let mut photo = square_crop_dynamic(&session.image.decode()?).to_rgb8();
        let filter = session.draft.filter.spec();
        if !filter.is_identity() {
            filter.color_transform().apply(&mut photo);
        }
        Ok(develop::develop_frame(&photo, progress))
    }

    // ========== Draft ==========

    pub fn set_filter(&mut self, filter: FilterKind) -> Result<()> {
        let session = self.ready()?;
        session.draft.filter = filter;
        let generation = session.generation;
        tracing::debug!(generation, %filter, "filter selected");
        self.emit(SessionEvent::FilterChanged { generation, filter });
        Ok(())
    }

    /// Replace the caption draft (cut to the configured length)
    pub fn set_caption(&mut self, text: &str) -> Result<()> {
        let max_chars = self.config.caption_max_chars;
        let session = self.ready()?;
        session.draft.set_caption(text, max_chars);
        let event = SessionEvent::CaptionChanged {
            generation: session.generation,
            caption: session.draft.caption.clone(),
        };
        self.emit(event);
        Ok(())
    }

    // ========== AI requests ==========

    fn mark_busy(&mut self, task: AiTask) -> Result<(u64, CapturedImage)> {
        let session = self.ready()?;
        if session.busy.is_some() {
            return Err(SnapError::Busy);
        }
        session.busy = Some(task);
        let generation = session.generation;
        let image = session.image.clone();
        self.emit(SessionEvent::BusyChanged { generation, busy: true });
        Ok((generation, image))
    }

    /// Clear the busy flag for a finished request, rejecting stale results
    fn settle(&mut self, generation: u64, task: AiTask) -> Result<&mut Session> {
        let current = self.generation();
        let stale = SnapError::StaleResult {
            ticket: generation,
            current,
        };
        match self.session.as_mut() {
            Some(session) if session.generation == generation && session.busy == Some(task) => {
                session.busy = None;
                let _ = self.events.send(SessionEvent::BusyChanged { generation, busy: false });
                Ok(session)
            }
            _ => {
                tracing::debug!(generation, ?current, ?task, "dropping stale AI result");
                Err(stale)
            }
        }
    }

    /// Give up on the in-flight request for `generation` without a result.
    /// Returns false if that Session has nothing in flight.
    pub fn abandon(&mut self, generation: u64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.generation != generation {
            return false;
        }
        let Some(task) = session.busy.take() else {
            return false;
        };
        tracing::debug!(generation, ?task, "AI request abandoned");
        self.emit(SessionEvent::BusyChanged { generation, busy: false });
        true
    }

    pub fn begin_caption(&mut self) -> Result<CaptionTicket> {
        let (generation, image) = self.mark_busy(AiTask::Caption)?;
        tracing::debug!(generation, "caption requested");
        Ok(CaptionTicket { generation, image })
    }

    /// Accept a caption result.
    ///
    /// # Returns
    /// * `Ok(caption)` - The new caption draft
    /// * `Err(StaleResult)` - The ticket's Session is gone or the request was abandoned; nothing changed
    /// * `Err(e)` - The service failed; the caption is unchanged and a notice was raised
    pub fn apply_caption(&mut self, ticket: CaptionTicket, result: Result<String>) -> Result<String> {
        let max_chars = self.config.caption_max_chars;
        let session = self.settle(ticket.generation, AiTask::Caption)?;
        match result {
            Ok(text) => {
                let (caption, _) = clip_caption(text.trim(), max_chars);
                session.draft.caption = caption.clone();
                tracing::info!(generation = ticket.generation, %caption, "caption generated");
                self.emit(SessionEvent::CaptionChanged {
                    generation: ticket.generation,
                    caption: caption.clone(),
                });
                Ok(caption)
            }
            Err(e) => {
                tracing::warn!(generation = ticket.generation, error = %e, "caption failed");
                self.notify(&e);
                Err(e)
            }
        }
    }

    /// Ask the caption collaborator for a new caption
    pub async fn request_caption(&mut self) -> Result<String> {
        let ticket = self.begin_caption()?;
        let ai = Arc::clone(&self.ai);
        let mut in_flight = InFlight::new(self, ticket.generation);
        let result = ai.generate_caption(&ticket.image).await;
        in_flight.controller.apply_caption(ticket, result)
    }

    pub fn begin_edit(&mut self, prompt: &str) -> Result<EditTicket> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SnapError::InvalidInput("edit prompt must not be empty".into()));
        }
        let (generation, image) = self.mark_busy(AiTask::Edit)?;
        tracing::debug!(generation, prompt, "edit requested");
        Ok(EditTicket {
            generation,
            image,
            prompt: prompt.to_string(),
        })
    }

    /// Accept an edit result. On success the working photo is replaced and
    /// the selected filter carries over; `Ok(None)` becomes `NoResult`.
    pub fn apply_edit(&mut self, ticket: EditTicket, result: Result<Option<CapturedImage>>) -> Result<()> {
        let session = self.settle(ticket.generation, AiTask::Edit)?;
        match result {
            Ok(Some(image)) => {
                tracing::info!(
                    generation = ticket.generation,
                    width = image.width(),
                    height = image.height(),
                    "working image replaced by edit"
                );
                session.image = image;
                self.emit(SessionEvent::ImageEdited {
                    generation: ticket.generation,
                });
                Ok(())
            }
            Ok(None) => {
                let e = SnapError::NoResult;
                tracing::warn!(generation = ticket.generation, "edit produced no image");
                self.notify(&e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(generation = ticket.generation, error = %e, "edit failed");
                self.notify(&e);
                Err(e)
            }
        }
    }

    /// Ask the edit collaborator to transform the working photo
    pub async fn request_edit(&mut self, prompt: &str) -> Result<()> {
        let ticket = self.begin_edit(prompt)?;
        let ai = Arc::clone(&self.ai);
        let mut in_flight = InFlight::new(self, ticket.generation);
        let result = ai.edit_image(&ticket.image, &ticket.prompt).await;
        in_flight.controller.apply_edit(ticket, result)
    }

    // ========== Finishing ==========

    /// Store the polaroid in the gallery and return to Idle
    pub fn save(&mut self) -> Result<PolaroidId> {
        self.ready()?;
        let Some(session) = self.session.take() else {
            return Err(SnapError::InvalidState {
                expected: Phase::Ready.name(),
                actual: Phase::Idle.name(),
            });
        };

        let record = PolaroidRecord {
            id: PolaroidId::new(),
            image: session.image,
            caption: session.draft.caption,
            filter: session.draft.filter,
            created_at: Utc::now(),
        };
        let id = record.id;
        tracing::info!(generation = session.generation, %id, filter = %record.filter, "polaroid saved");

        let evicted = self.gallery.append(record);
        self.emit(SessionEvent::Saved {
            generation: session.generation,
            id,
        });
        if let Some(old) = evicted {
            tracing::info!(id = %old.id, "gallery full, evicted oldest");
            self.emit(SessionEvent::GalleryEvicted { id: old.id });
        }
        Ok(id)
    }

    /// Drop the working photo and return to Idle
    pub fn discard(&mut self) -> Result<()> {
        let session = self.session.take().ok_or(SnapError::InvalidState {
            expected: "developing or ready",
            actual: Phase::Idle.name(),
        })?;
        tracing::info!(generation = session.generation, "session discarded");
        self.emit(SessionEvent::Discarded {
            generation: session.generation,
        });
        Ok(())
    }

    /// Composite the working photo into a downloadable file
    pub async fn download(&self) -> Result<DownloadArtifact> {
        let session = self.active()?;
        if session.phase != Phase::Ready {
            return Err(SnapError::InvalidState {
                expected: Phase::Ready.name(),
                actual: session.phase.name(),
            });
        }
        let result = create_downloadable_polaroid(
            &session.image,
            &session.draft.caption,
            session.draft.filter,
            &self.config,
        )
        .await;
        if let Err(e) = &result {
            self.notify(e);
        }
        result
    }

    /// Composite a saved polaroid; the file is named after its save time
    pub async fn download_record(&self, id: PolaroidId) -> Result<DownloadArtifact> {
        let record = self
            .gallery
            .get(id)
            .ok_or_else(|| SnapError::InvalidInput(format!("no polaroid with id {id}")))?;
        let result = create_polaroid_at(
            &record.image,
            &record.caption,
            record.filter,
            &self.config,
            record.created_at,
        )
        .await;
        if let Err(e) = &result {
            self.notify(e);
        }
        result
    }

    /// Delete a saved polaroid. Returns false if no such id exists.
    pub fn remove_from_gallery(&mut self, id: PolaroidId) -> bool {
        let removed = self.gallery.remove(id).is_some();
        if removed {
            tracing::info!(%id, "polaroid deleted");
            self.emit(SessionEvent::GalleryRemoved { id });
        }
        removed
    }

    // ========== Helpers ==========

    fn active(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(SnapError::InvalidState {
            expected: "an active session",
            actual: Phase::Idle.name(),
        })
    }

    fn ready(&mut self) -> Result<&mut Session> {
        match self.session.as_mut() {
            Some(session) if session.phase == Phase::Ready => Ok(session),
            other => Err(SnapError::InvalidState {
                expected: Phase::Ready.name(),
                actual: other.map_or(Phase::Idle, |s| s.phase).name(),
            }),
        }
    }

    fn session_for(&mut self, generation: u64) -> Result<&mut Session> {
        let current = self.generation();
        match self.session.as_mut() {
            Some(session) if session.generation == generation => Ok(session),
            _ => Err(SnapError::StaleResult {
                ticket: generation,
                current,
            }),
        }
    }
}

/// Clears the busy flag if a `request_*` future is dropped before its
/// result is applied. After `apply_*` the flag is already clear and the
/// drop does nothing.
struct InFlight<'a> {
    controller: &'a mut SessionController,
    generation: u64,
}

impl<'a> InFlight<'a> {
    fn new(controller: &'a mut SessionController, generation: u64) -> Self {
        Self { controller, generation }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.controller.abandon(self.generation);
    }
}
