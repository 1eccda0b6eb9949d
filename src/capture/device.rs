/// Camera device acquisition
///
/// A camera stream is an exclusively-owned handle. `LiveCamera` holds at most
/// one `VideoSource` at a time and waits for it to be released before
/// acquiring another, and when capture mode ends. Dropping a `LiveCamera`
/// still holding a stream starts the release without waiting for it.

use async_trait::async_trait;
use image::RgbImage;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::captured::CapturedImage;
use super::frame::capture_from_live_source;
use crate::config::SnapConfig;
use crate::error::{Result, SnapError};

/// Which camera to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// User-facing ("selfie") camera; captures are mirrored
    Front,
    /// Environment-facing camera
    Back,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    /// Front cameras preview as a mirror, so captures are flipped to match
    pub fn mirrors(self) -> bool {
        self == Facing::Front
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facing::Front => f.write_str("front"),
            Facing::Back => f.write_str("back"),
        }
    }
}

/// An open camera stream
#[async_trait]
pub trait VideoSource: Send {
    /// Read the most recent frame.
    /// Returns `SourceUnavailable` when the stream has stopped delivering.
    async fn read_frame(&mut self) -> Result<RgbImage>;

    /// Stop the stream and give the device back, returning once the device
    /// is closed. Must be idempotent.
    async fn release(&mut self);
}

/// Something that can open camera streams
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Open the camera for `facing`.
    ///
    /// # Returns
    /// * `Ok(source)` - A streaming source the caller now owns
    /// * `Err(PermissionDenied)` - Access was refused
    /// * `Err(DeviceUnavailable)` - No such camera, or it failed to open
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn VideoSource>>;
}

/// Capture-mode controller owning the active stream
pub struct LiveCamera {
    device: Arc<dyn CameraDevice>,
    source: Option<Box<dyn VideoSource>>,
    facing: Facing,
    flash_delay: Duration,
    capture_timeout: Duration,
    quality: u8,
}

impl LiveCamera {
    pub fn new(device: Arc<dyn CameraDevice>, config: &SnapConfig) -> Self {
        Self {
            device,
            source: None,
            facing: Facing::Front,
            flash_delay: config.flash_delay(),
            capture_timeout: config.capture_timeout(),
            quality: config.jpeg_quality,
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Enter capture mode with the given facing.
    /// Any stream already held is released first.
    pub async fn start(&mut self, facing: Facing) -> Result<()> {
        self.stop().await;
        self.facing = facing;
        match self.device.acquire(facing).await {
            Ok(source) => {
                tracing::info!(%facing, "camera stream acquired");
                self.source = Some(source);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%facing, error = %e, "camera unavailable, upload only");
                Err(e)
            }
        }
    }

    /// Flip between front and back cameras
    pub async fn switch_facing(&mut self) -> Result<Facing> {
        let next = self.facing.toggled();
        self.start(next).await?;
        Ok(next)
    }

    /// Leave capture mode, releasing the stream
    pub async fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release().await;
            tracing::debug!(facing = %self.facing, "camera stream released");
        }
    }

    /// Take a photo: flash pause, read one frame (bounded by the capture
    /// timeout), then crop/mirror/encode on the blocking pool.
    pub async fn capture(&mut self) -> Result<CapturedImage> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| SnapError::SourceUnavailable("camera is not started".into()))?;

        if !self.flash_delay.is_zero() {
            tokio::time::sleep(self.flash_delay).await;
        }

        let frame = tokio::time::timeout(self.capture_timeout, source.read_frame())
            .await
            .map_err(|_| {
                SnapError::SourceUnavailable(format!(
                    "no frame within {}ms",
                    self.capture_timeout.as_millis()
                ))
            })??;

        let mirror = self.facing.mirrors();
        let quality = self.quality;
        tokio::task::spawn_blocking(move || capture_from_live_source(&frame, mirror, quality))
            .await
            .map_err(|e| SnapError::SourceUnavailable(format!("capture task failed: {e}")))?
    }
}

impl Drop for LiveCamera {
    fn drop(&mut self) {
        if self.source.take().is_some() {
            tracing::debug!(facing = %self.facing, "camera dropped while streaming");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts open handles so tests can prove exclusivity
    #[derive(Default)]
    pub(crate) struct FakeDevice {
        pub open: Arc<AtomicUsize>,
        pub max_open: Arc<AtomicUsize>,
        pub acquired: Mutex<Vec<Facing>>,
        pub deny: bool,
        pub stall: bool,
        /// Release takes this long to close the device
        pub release_delay: Duration,
    }

    struct FakeSource {
        open: Arc<AtomicUsize>,
        released: bool,
        stall: bool,
        release_delay: Duration,
    }

    impl FakeSource {
        fn close(&mut self) {
            if !self.released {
                self.released = true;
                self.open.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn read_frame(&mut self) -> Result<RgbImage> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            // left half red, right half blue
            Ok(RgbImage::from_fn(64, 32, |x, _| {
                if x < 32 {
                    Rgb([255, 0, 0])
                } else {
                    Rgb([0, 0, 255])
                }
            }))
        }

        async fn release(&mut self) {
            if !self.released && !self.release_delay.is_zero() {
                tokio::time::sleep(self.release_delay).await;
            }
            self.close();
        }
    }

    impl Drop for FakeSource {
        fn drop(&mut self) {
            self.close();
        }
    }

    #[async_trait]
    impl CameraDevice for FakeDevice {
        async fn acquire(&self, facing: Facing) -> Result<Box<dyn VideoSource>> {
            if self.deny {
                return Err(SnapError::PermissionDenied("user said no".into()));
            }
            let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_open.fetch_max(now, Ordering::SeqCst);
            self.acquired.lock().unwrap().push(facing);
            Ok(Box::new(FakeSource {
                open: self.open.clone(),
                released: false,
                stall: self.stall,
                release_delay: self.release_delay,
            }))
        }
    }

    fn quick_config() -> SnapConfig {
        SnapConfig {
            flash_delay_ms: 0,
            capture_timeout_ms: 50,
            ..SnapConfig::default()
        }
    }

    #[tokio::test]
    async fn test_switch_releases_before_acquire() {
        let device = Arc::new(FakeDevice::default());
        let mut camera = LiveCamera::new(device.clone(), &quick_config());

        camera.start(Facing::Front).await.unwrap();
        assert_eq!(camera.switch_facing().await.unwrap(), Facing::Back);
        assert_eq!(camera.switch_facing().await.unwrap(), Facing::Front);

        assert_eq!(device.max_open.load(Ordering::SeqCst), 1);
        assert_eq!(device.open.load(Ordering::SeqCst), 1);
        assert_eq!(
            *device.acquired.lock().unwrap(),
            vec![Facing::Front, Facing::Back, Facing::Front]
        );

        drop(camera);
        assert_eq!(device.open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_release_finishes_before_next_acquire() {
        let device = Arc::new(FakeDevice {
            release_delay: Duration::from_millis(30),
            ..FakeDevice::default()
        });
        let mut camera = LiveCamera::new(device.clone(), &quick_config());

        camera.start(Facing::Front).await.unwrap();
        camera.switch_facing().await.unwrap();
        camera.start(Facing::Back).await.unwrap();
        assert_eq!(device.max_open.load(Ordering::SeqCst), 1);

        camera.stop().await;
        assert!(!camera.is_active());
        assert_eq!(device.open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_front_capture_is_mirrored_square() {
        let device = Arc::new(FakeDevice::default());
        let mut camera = LiveCamera::new(device, &quick_config());
        camera.start(Facing::Front).await.unwrap();

        let still = camera.capture().await.unwrap();
        assert_eq!((still.width(), still.height()), (32, 32));
        let px = still.decode().unwrap().to_rgb8();
        // centered crop of the split frame, flipped: blue on the left
        assert!(px.get_pixel(4, 16)[2] > 180);
        assert!(px.get_pixel(28, 16)[0] > 180);
    }

    #[tokio::test]
    async fn test_capture_without_stream() {
        let device = Arc::new(FakeDevice::default());
        let mut camera = LiveCamera::new(device, &quick_config());
        let err = camera.capture().await.unwrap_err();
        assert!(matches!(err, SnapError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_camera_inactive() {
        let device = Arc::new(FakeDevice {
            deny: true,
            ..FakeDevice::default()
        });
        let mut camera = LiveCamera::new(device, &quick_config());
        let err = camera.start(Facing::Back).await.unwrap_err();
        assert!(err.falls_back_to_upload());
        assert!(!camera.is_active());
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let device = Arc::new(FakeDevice {
            stall: true,
            ..FakeDevice::default()
        });
        let mut camera = LiveCamera::new(device, &quick_config());
        camera.start(Facing::Back).await.unwrap();
        let err = camera.capture().await.unwrap_err();
        assert!(matches!(err, SnapError::SourceUnavailable(_)));
    }
}
