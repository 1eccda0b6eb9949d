/// Capture pipeline
///
/// This module handles:
/// - Encoded still images (`captured.rs`)
/// - Square crop / mirror / encode of live frames and upload intake (`frame.rs`)
/// - Camera acquisition with exclusive stream ownership (`device.rs`)
/// - The native webcam backend behind the `camera` feature (`native.rs`)

pub mod captured;
pub mod device;
pub mod frame;
#[cfg(feature = "camera")]
pub mod native;

pub use captured::CapturedImage;
pub use device::{CameraDevice, Facing, LiveCamera, VideoSource};
pub use frame::{capture_from_file, capture_from_live_source, square_crop, SquareRegion};
