//! Live camera streaming.
//!
//! `StreamController` is a two-state machine (`Idle`, `Streaming`). While
//! streaming, a fixed-period capture loop grabs a frame, encodes it as JPEG
//! and submits it in the background. Ticks never wait for earlier submissions,
//! so several requests may be in flight; each response is checked against the
//! session token it was captured under and dropped if that session has ended.

pub mod camera;
mod panel;
pub mod scheduler;

pub use camera::{open_camera, Camera, CameraConstraints, FacingMode, MediaStream};
pub use panel::{LivePanel, PanelPreview};
pub use scheduler::{IntervalHandle, Scheduler, ThreadScheduler};

use image::RgbImage;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::CaptureSettings;
use crate::detection::{DetectionResult, FrameSize};
use crate::error::ClientError;
use crate::notify::Notifier;

/// Posts one encoded frame and returns its detections.
pub trait FrameSubmitter: Send + Sync {
    fn submit(&self, jpeg: &[u8]) -> Result<Vec<DetectionResult>, ClientError>;
}

/// Receives detections for the frame they were computed on.
///
/// Called with the controller's session lock held; implementations must not
/// call back into the controller.
pub trait ResultView: Send + Sync {
    fn update(&self, results: &[DetectionResult], frame: FrameSize);
}

/// The on-screen preview of the camera feed.
pub trait Preview: Send {
    fn attach(&mut self, frame: Option<FrameSize>);
    fn detach(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
}

#[derive(Clone, Debug)]
pub struct StreamSettings {
    pub interval: Duration,
    pub jpeg_quality: u8,
    pub constraints: CameraConstraints,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            jpeg_quality: 95,
            constraints: CameraConstraints::default(),
        }
    }
}

impl From<&CaptureSettings> for StreamSettings {
    fn from(capture: &CaptureSettings) -> Self {
        Self {
            interval: capture.interval,
            jpeg_quality: capture.jpeg_quality,
            constraints: CameraConstraints {
                ideal: FrameSize::new(capture.ideal_width, capture.ideal_height),
                facing: FacingMode::parse(&capture.facing),
            },
        }
    }
}

/// Collaborators the controller drives.
pub struct StreamDeps {
    pub camera: Box<dyn Camera>,
    pub preview: Box<dyn Preview>,
    pub submitter: Arc<dyn FrameSubmitter>,
    pub view: Arc<dyn ResultView>,
    pub scheduler: Arc<dyn Scheduler>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct StreamController {
    shared: Arc<Shared>,
}

struct Shared {
    settings: StreamSettings,
    submitter: Arc<dyn FrameSubmitter>,
    view: Arc<dyn ResultView>,
    scheduler: Arc<dyn Scheduler>,
    notifier: Arc<dyn Notifier>,
    inner: Mutex<Inner>,
}

struct Inner {
    camera: Box<dyn Camera>,
    preview: Box<dyn Preview>,
    session: Option<Session>,
    next_token: u64,
}

struct Session {
    token: u64,
    stream: Box<dyn MediaStream>,
    interval: Box<dyn IntervalHandle>,
    /// Capture canvas size; known once the stream reports its resolution.
    capture_size: Option<FrameSize>,
}

impl StreamController {
    pub fn new(settings: StreamSettings, deps: StreamDeps) -> Self {
        let StreamDeps {
            camera,
            preview,
            submitter,
            view,
            scheduler,
            notifier,
        } = deps;
        Self {
            shared: Arc::new(Shared {
                settings,
                submitter,
                view,
                scheduler,
                notifier,
                inner: Mutex::new(Inner {
                    camera,
                    preview,
                    session: None,
                    next_token: 0,
                }),
            }),
        }
    }

    pub fn state(&self) -> StreamState {
        if self.shared.lock().session.is_some() {
            StreamState::Streaming
        } else {
            StreamState::Idle
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == StreamState::Streaming
    }

    /// Live tracks held by the current session; zero when idle.
    pub fn live_tracks(&self) -> usize {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|session| session.stream.live_tracks())
            .unwrap_or(0)
    }

    /// Acquires the camera and starts the capture loop. Already streaming is a
    /// no-op. A camera failure leaves the controller idle and raises a banner.
    pub fn start(&self) -> Result<(), ClientError> {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.session.is_some() {
            log::debug!("start ignored; already streaming");
            return Ok(());
        }

        let mut stream = match inner.camera.open(&shared.settings.constraints) {
            Ok(stream) => stream,
            Err(err) => {
                log::error!("camera access failed: {}", err);
                shared.notifier.error(&err.user_message());
                return Err(err);
            }
        };

        inner.next_token += 1;
        let token = inner.next_token;
        let weak = Arc::downgrade(shared);
        let task = Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                Shared::tick(&shared, token);
            }
        });
        let interval = match shared.scheduler.every(shared.settings.interval, task) {
            Ok(interval) => interval,
            Err(err) => {
                log::error!("failed to schedule capture loop: {}", err);
                stream.stop_tracks();
                shared.notifier.error(&err.user_message());
                return Err(err);
            }
        };

        let capture_size = stream.video_size();
        inner.preview.attach(capture_size);
        inner.session = Some(Session {
            token,
            stream,
            interval,
            capture_size,
        });
        log::info!(
            "streaming started (session {}, every {:?})",
            token,
            shared.settings.interval
        );
        Ok(())
    }

    /// Cancels the capture loop, stops every track and detaches the preview.
    /// Idle is a no-op. In-flight submissions finish but their results are
    /// discarded.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        let Some(mut session) = inner.session.take() else {
            return;
        };
        session.interval.cancel();
        session.stream.stop_tracks();
        inner.preview.detach();
        log::info!("streaming stopped (session {})", session.token);
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(shared: &Arc<Shared>, token: u64) {
        // Only the capture holds the session lock; encoding runs unlocked so
        // stop() and state() never wait on it. deliver() re-checks the token.
        let (frame, size) = {
            let mut inner = shared.lock();
            let Some(session) = inner.session.as_mut() else {
                return;
            };
            if session.token != token {
                return;
            }
            if session.capture_size.is_none() {
                session.capture_size = session.stream.video_size();
            }
            let Some(size) = session.capture_size else {
                log::debug!("frame skipped; stream metadata not loaded");
                return;
            };
            match session.stream.capture() {
                Ok(frame) => (frame, size),
                Err(err) => {
                    log::warn!("frame capture failed: {}", err);
                    return;
                }
            }
        };

        let jpeg = match encode_jpeg(&frame, size, shared.settings.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(err) => {
                log::warn!("{}", err);
                return;
            }
        };

        let worker = Arc::clone(shared);
        shared
            .scheduler
            .spawn(Box::new(move || worker.deliver(token, size, &jpeg)));
    }

    fn deliver(&self, token: u64, frame_size: FrameSize, jpeg: &[u8]) {
        let results = match self.submitter.submit(jpeg) {
            Ok(results) => results,
            Err(err) => {
                // Frame loss is acceptable; the loop keeps running.
                log::warn!("frame submission failed: {}", err);
                return;
            }
        };
        let inner = self.lock();
        let live = inner.session.as_ref().map(|session| session.token);
        if live != Some(token) {
            log::debug!(
                "discarding stale response for session {} ({} detections)",
                token,
                results.len()
            );
            return;
        }
        self.view.update(&results, frame_size);
    }
}

/// Paints `frame` onto a capture canvas of `size` and encodes it.
pub fn encode_jpeg(frame: &RgbImage, size: FrameSize, quality: u8) -> Result<Vec<u8>, ClientError> {
    let resized;
    let frame = if frame.dimensions() == (size.width, size.height) {
        frame
    } else {
        resized = image::imageops::resize(
            frame,
            size.width,
            size.height,
            image::imageops::FilterType::Triangle,
        );
        &resized
    };
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(frame)
        .map_err(|e| ClientError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_encoding_uses_capture_size() {
        let frame = RgbImage::from_pixel(32, 16, image::Rgb([200, 10, 10]));
        let jpeg = encode_jpeg(&frame, FrameSize::new(16, 8), 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn settings_follow_capture_config() {
        let cfg = crate::config::ClientConfig::default();
        let settings = StreamSettings::from(&cfg.capture);
        assert_eq!(settings.interval, Duration::from_millis(1000));
        assert_eq!(settings.jpeg_quality, 95);
        assert_eq!(settings.constraints.ideal, FrameSize::new(1280, 720));
        assert_eq!(settings.constraints.facing, FacingMode::Environment);
    }
}
