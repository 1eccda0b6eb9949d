/// Native webcam backend (feature `camera`)
///
/// nokhwa's `Camera` is not `Send`, so each acquired stream lives on its own
/// worker thread. The `VideoSource` handed to callers holds a request channel
/// and the thread handle. Releasing it closes the channel and joins the thread,
/// so the stream is stopped by the time `release` returns. Dropping it only
/// closes the channel.

use async_trait::async_trait;
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType},
    Camera, NokhwaError,
};
use std::sync::mpsc;
use std::thread::JoinHandle;
use tokio::sync::oneshot;

use super::device::{CameraDevice, Facing, VideoSource};
use crate::config::SnapConfig;
use crate::error::{Result, SnapError};

type FrameReply = oneshot::Sender<Result<RgbImage>>;

/// Opens system cameras by index
pub struct NativeCamera {
    front_index: u32,
    back_index: u32,
}

impl NativeCamera {
    pub fn new(config: &SnapConfig) -> Self {
        Self {
            front_index: config.camera_front_index,
            back_index: config.camera_back_index,
        }
    }

    fn index_for(&self, facing: Facing) -> u32 {
        match facing {
            Facing::Front => self.front_index,
            Facing::Back => self.back_index,
        }
    }
}

#[async_trait]
impl CameraDevice for NativeCamera {
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn VideoSource>> {
        let index = self.index_for(facing);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();
        let (request_tx, request_rx) = mpsc::channel::<FrameReply>();

        let worker = std::thread::Builder::new()
            .name(format!("camera-{index}"))
            .spawn(move || run_camera(index, ready_tx, request_rx))?;

        ready_rx
            .await
            .map_err(|_| SnapError::DeviceUnavailable("camera thread exited".into()))??;
        tracing::debug!(index, %facing, "camera thread ready");

        Ok(Box::new(NativeSource {
            index,
            requests: Some(request_tx),
            worker: Some(worker),
        }))
    }
}

/// Worker loop: open, report readiness, then serve frame requests until the
/// request channel closes.
fn run_camera(index: u32, ready: oneshot::Sender<Result<()>>, requests: mpsc::Receiver<FrameReply>) {
    let mut camera = match open_camera(index) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    while let Ok(reply) = requests.recv() {
        let _ = reply.send(read_rgb(&mut camera, index));
    }

    let _ = camera.stop_stream();
    tracing::debug!(index, "camera thread finished");
}

fn open_camera(index: u32) -> Result<Camera> {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
    let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(map_open_error)?;
    camera.open_stream().map_err(map_open_error)?;
    let res = camera.resolution();
    tracing::info!(index, width = res.width(), height = res.height(), "camera opened");
    Ok(camera)
}

/// Pull one frame and repack it into our `image` version's buffer type
fn read_rgb(camera: &mut Camera, index: u32) -> Result<RgbImage> {
    let decoded = camera
        .frame()
        .and_then(|buffer| buffer.decode_image::<RgbFormat>())
        .map_err(|e| SnapError::SourceUnavailable(format!("camera {index}: {e}")))?;
    let (width, height) = decoded.dimensions();
    RgbImage::from_raw(width, height, decoded.into_raw())
        .ok_or_else(|| SnapError::SourceUnavailable(format!("camera {index}: short frame buffer")))
}

fn map_open_error(e: NokhwaError) -> SnapError {
    let text = e.to_string();
    if text.to_ascii_lowercase().contains("permission") {
        SnapError::PermissionDenied(text)
    } else {
        SnapError::DeviceUnavailable(text)
    }
}

struct NativeSource {
    index: u32,
    requests: Option<mpsc::Sender<FrameReply>>,
    worker: Option<JoinHandle<()>>,
}

#[async_trait]
impl VideoSource for NativeSource {
    async fn read_frame(&mut self) -> Result<RgbImage> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| SnapError::SourceUnavailable("stream released".into()))?;
        let (tx, rx) = oneshot::channel();
        requests
            .send(tx)
            .map_err(|_| SnapError::SourceUnavailable("camera thread stopped".into()))?;
        rx.await
            .map_err(|_| SnapError::SourceUnavailable("camera thread stopped".into()))?
    }

    async fn release(&mut self) {
        // closing the channel ends the worker loop, which may still be inside
        // a frame read
        self.requests.take();
        let Some(worker) = self.worker.take() else {
            return;
        };
        let index = self.index;
        match tokio::task::spawn_blocking(move || worker.join()).await {
            Ok(Ok(())) => tracing::debug!(index, "camera released"),
            Ok(Err(_)) => tracing::warn!(index, "camera thread panicked"),
            Err(e) => tracing::warn!(index, error = %e, "camera join task failed"),
        }
    }
}
