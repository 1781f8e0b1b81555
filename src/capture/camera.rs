//! Camera access: backend trait, stream handle and error classification

use std::future::Future;
use std::io;
use std::path::PathBuf;

use image::RgbaImage;

use crate::fl;

/// Which way the requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Front camera
    User,
    /// Rear camera
    #[default]
    Environment,
}

/// Constraints passed when requesting a camera.
///
/// `facing_mode` is a preference, not a requirement. No resolution is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing_mode: FacingMode,
    pub audio: bool,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            audio: false,
        }
    }
}

/// Why the camera could not be opened
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no suitable camera found")]
    NoDevice,
    #[error("camera is in use by another application")]
    Busy,
    #[error("{0}")]
    Other(String),
}

impl CameraError {
    /// Classify a platform error
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            io::ErrorKind::NotFound => CameraError::NoDevice,
            io::ErrorKind::ResourceBusy | io::ErrorKind::WouldBlock => CameraError::Busy,
            _ => CameraError::Other(err.to_string()),
        }
    }

    /// Localized status line for this error
    pub fn user_message(&self) -> String {
        match self {
            CameraError::PermissionDenied => fl!("camera-error-permission-denied"),
            CameraError::NoDevice => fl!("camera-error-no-device"),
            CameraError::Busy => fl!("camera-error-busy"),
            CameraError::Other(message) => fl!("camera-error-other", message = message.as_str()),
        }
    }
}

impl From<io::Error> for CameraError {
    fn from(err: io::Error) -> Self {
        CameraError::from_io(&err)
    }
}

/// A live video stream handed out by a [`Camera`]
pub trait VideoStream {
    /// Native resolution of the video
    fn video_size(&self) -> (u32, u32);

    /// Draw the current frame at native resolution
    fn grab_frame(&mut self) -> Result<RgbaImage, CameraError>;

    /// Stop every track of the stream
    fn stop(&mut self);

    /// Whether any track is still live
    fn is_live(&self) -> bool;
}

/// A camera backend
pub trait Camera {
    type Stream: VideoStream;

    /// Request a video stream matching `constraints`
    fn open(
        &mut self,
        constraints: &CameraConstraints,
    ) -> impl Future<Output = Result<Self::Stream, CameraError>>;
}

/// A camera that "films" an image file on disk.
///
/// Used by `dialsnap scan` and handy wherever a photo has already been taken.
#[derive(Debug, Clone)]
pub struct StillCamera {
    path: PathBuf,
    facing: FacingMode,
}

impl StillCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            facing: FacingMode::Environment,
        }
    }
}

impl Camera for StillCamera {
    type Stream = StillStream;

    async fn open(&mut self, constraints: &CameraConstraints) -> Result<StillStream, CameraError> {
        if constraints.facing_mode != self.facing {
            log::debug!(
                "Requested {:?} camera, only {:?} available",
                constraints.facing_mode,
                self.facing
            );
        }

        let bytes = tokio::fs::read(&self.path).await?;
        let frame = image::load_from_memory(&bytes)
            .map_err(|e| {
                CameraError::Other(format!("unreadable frame source {}: {}", self.path.display(), e))
            })?
            .to_rgba8();

        log::info!(
            "Still camera opened on {} ({}x{})",
            self.path.display(),
            frame.width(),
            frame.height()
        );
        Ok(StillStream::new(frame))
    }
}

/// Stream of a single still frame with one video track
#[derive(Debug, Clone)]
pub struct StillStream {
    frame: RgbaImage,
    live: bool,
}

impl StillStream {
    pub fn new(frame: RgbaImage) -> Self {
        Self { frame, live: true }
    }
}

impl VideoStream for StillStream {
    fn video_size(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn grab_frame(&mut self) -> Result<RgbaImage, CameraError> {
        if !self.live {
            return Err(CameraError::Other("video track has ended".to_string()));
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_classify_io_errors() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(CameraError::from_io(&denied), CameraError::PermissionDenied);

        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(CameraError::from_io(&missing), CameraError::NoDevice);

        let busy = io::Error::from(io::ErrorKind::ResourceBusy);
        assert_eq!(CameraError::from_io(&busy), CameraError::Busy);

        let other = io::Error::other("bus reset");
        assert_eq!(
            CameraError::from_io(&other),
            CameraError::Other("bus reset".to_string())
        );
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let messages = [
            CameraError::PermissionDenied.user_message(),
            CameraError::NoDevice.user_message(),
            CameraError::Busy.user_message(),
            CameraError::Other("oops".to_string()).user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(messages[3].ends_with("oops"));
    }

    #[test]
    fn test_stopped_stream_yields_no_frames() {
        let mut stream = StillStream::new(RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 255])));
        assert_eq!(stream.video_size(), (4, 3));
        assert!(stream.grab_frame().is_ok());

        stream.stop();
        stream.stop();
        assert!(!stream.is_live());
        assert!(stream.grab_frame().is_err());
    }

    #[tokio::test]
    async fn test_still_camera_opens_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbaImage::from_pixel(32, 16, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut camera = StillCamera::new(&path);
        let stream = camera.open(&CameraConstraints::default()).await.unwrap();
        assert_eq!(stream.video_size(), (32, 16));
        assert!(stream.is_live());
    }

    #[tokio::test]
    async fn test_still_camera_missing_file_is_no_device() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = StillCamera::new(dir.path().join("absent.png"));
        let err = camera.open(&CameraConstraints::default()).await.unwrap_err();
        assert_eq!(err, CameraError::NoDevice);
    }

    #[tokio::test]
    async fn test_still_camera_garbage_file_is_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, b"not an image").unwrap();

        let mut camera = StillCamera::new(&path);
        let err = camera.open(&CameraConstraints::default()).await.unwrap_err();
        assert!(matches!(err, CameraError::Other(_)));
    }
}
