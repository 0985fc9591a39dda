//! Camera sources.
//!
//! A `Camera` hands out a `MediaStream` on request, the way a browser resolves
//! a media-device request. Two sources are provided:
//! - `stub://<name>`: synthetic frames at the requested resolution (testing)
//! - a directory of JPEG/PNG stills, replayed in name order
//!
//! Any other source, or a directory with no usable frames, is reported as an
//! unavailable camera.

use image::{GenericImageView, RgbImage};
use std::path::{Path, PathBuf};

use crate::detection::FrameSize;
use crate::error::ClientError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear camera.
    Environment,
    /// Front camera.
    User,
}

impl FacingMode {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => FacingMode::User,
            _ => FacingMode::Environment,
        }
    }
}

/// What the controller asks the camera for. Audio is never requested.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConstraints {
    pub ideal: FrameSize,
    pub facing: FacingMode,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            ideal: FrameSize::new(1280, 720),
            facing: FacingMode::Environment,
        }
    }
}

/// An acquired camera stream.
pub trait MediaStream: Send {
    /// Intrinsic resolution, once metadata is available.
    fn video_size(&self) -> Option<FrameSize>;
    /// Grabs the current frame.
    fn capture(&mut self) -> Result<RgbImage, ClientError>;
    /// Stops every track; the stream is unusable afterwards.
    fn stop_tracks(&mut self);
    fn live_tracks(&self) -> usize;
}

pub trait Camera: Send {
    fn open(&mut self, constraints: &CameraConstraints) -> Result<Box<dyn MediaStream>, ClientError>;
}

/// Resolves a camera source string.
pub fn open_camera(source: &str) -> Result<Box<dyn Camera>, ClientError> {
    if let Some(name) = source.strip_prefix("stub://") {
        return Ok(Box::new(SyntheticCamera::new(name)));
    }
    let path = Path::new(source);
    if path.is_dir() {
        return Ok(Box::new(DirectoryCamera::new(path)));
    }
    Err(ClientError::CameraUnavailable(format!(
        "no camera source at '{}'",
        source
    )))
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://)
// ----------------------------------------------------------------------------

pub struct SyntheticCamera {
    name: String,
}

impl SyntheticCamera {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Camera for SyntheticCamera {
    fn open(&mut self, constraints: &CameraConstraints) -> Result<Box<dyn MediaStream>, ClientError> {
        if constraints.ideal.is_empty() {
            return Err(ClientError::CameraUnavailable(
                "requested resolution is empty".to_string(),
            ));
        }
        log::info!(
            "camera stub://{} opened at {}x{} ({:?})",
            self.name,
            constraints.ideal.width,
            constraints.ideal.height,
            constraints.facing
        );
        Ok(Box::new(SyntheticStream {
            size: constraints.ideal,
            frame_count: 0,
            live: true,
        }))
    }
}

struct SyntheticStream {
    size: FrameSize,
    frame_count: u64,
    live: bool,
}

impl MediaStream for SyntheticStream {
    fn video_size(&self) -> Option<FrameSize> {
        Some(self.size)
    }

    fn capture(&mut self) -> Result<RgbImage, ClientError> {
        if !self.live {
            return Err(ClientError::CameraUnavailable("track ended".to_string()));
        }
        self.frame_count += 1;
        let shift = self.frame_count;
        Ok(RgbImage::from_fn(self.size.width, self.size.height, |x, y| {
            let v = ((x as u64 + y as u64 + shift) % 256) as u8;
            image::Rgb([v, v.wrapping_add(64), v.wrapping_add(128)])
        }))
    }

    fn stop_tracks(&mut self) {
        self.live = false;
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }
}

// ----------------------------------------------------------------------------
// Directory camera
// ----------------------------------------------------------------------------

pub struct DirectoryCamera {
    dir: PathBuf,
}

impl DirectoryCamera {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn frame_paths(&self) -> Result<Vec<PathBuf>, ClientError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            ClientError::CameraUnavailable(format!("read {}: {}", self.dir.display(), e))
        })?;
        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| is_still_image(path))
            .collect();
        frames.sort();
        Ok(frames)
    }
}

fn is_still_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
        .unwrap_or(false)
}

impl Camera for DirectoryCamera {
    fn open(&mut self, _constraints: &CameraConstraints) -> Result<Box<dyn MediaStream>, ClientError> {
        let frames = self.frame_paths()?;
        let Some(first) = frames.first() else {
            return Err(ClientError::CameraUnavailable(format!(
                "no JPEG/PNG frames in {}",
                self.dir.display()
            )));
        };
        let (width, height) = image::image_dimensions(first).map_err(|e| {
            ClientError::CameraUnavailable(format!("read {}: {}", first.display(), e))
        })?;
        log::info!(
            "camera {} opened with {} frames at {}x{}",
            self.dir.display(),
            frames.len(),
            width,
            height
        );
        Ok(Box::new(DirectoryStream {
            frames,
            next: 0,
            size: FrameSize::new(width, height),
            live: true,
        }))
    }
}

struct DirectoryStream {
    frames: Vec<PathBuf>,
    next: usize,
    size: FrameSize,
    live: bool,
}

impl MediaStream for DirectoryStream {
    fn video_size(&self) -> Option<FrameSize> {
        Some(self.size)
    }

    fn capture(&mut self) -> Result<RgbImage, ClientError> {
        if !self.live {
            return Err(ClientError::CameraUnavailable("track ended".to_string()));
        }
        let path = &self.frames[self.next % self.frames.len()];
        self.next = self.next.wrapping_add(1);
        let frame = image::open(path).map_err(|e| {
            ClientError::CameraUnavailable(format!("decode {}: {}", path.display(), e))
        })?;
        if frame.dimensions() == (self.size.width, self.size.height) {
            Ok(frame.into_rgb8())
        } else {
            Ok(frame
                .resize_exact(
                    self.size.width,
                    self.size.height,
                    image::imageops::FilterType::Triangle,
                )
                .into_rgb8())
        }
    }

    fn stop_tracks(&mut self) {
        self.live = false;
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }
}
