//! Trash Lens
//!
//! Client-side presentation layer for a trash-detection service. Media is
//! uploaded (or streamed from a camera) to an external backend; the returned
//! detections are rendered as result lists, summaries, charts and bounding-box
//! overlays.
//!
//! # Architecture
//!
//! Rendering is a pure transform from detections to a render tree, applied to
//! a `RenderTarget` by thin adapters. Drawing goes through the `CanvasSink`
//! trait so the same routine serves still images and live video. Side effects
//! (camera, timers, network, banners) are injected behind traits.
//!
//! # Module Structure
//!
//! - `detection`: Detection results, bounding boxes, confidence levels
//! - `render`: Render tree, result list, summary and chart builders
//! - `overlay`: Bounding-box overlay drawing and the recording canvas
//! - `raster`: Pixel canvas for compositing overlays onto images
//! - `upload`: Upload validation, submission and response handling
//! - `stream`: Camera lifecycle and the periodic capture loop
//! - `client`: HTTP client for the detection backend
//! - `notify`: Transient error/success banners
//! - `config`: Client configuration (file + environment)

pub mod client;
pub mod config;
pub mod detection;
pub mod error;
pub mod notify;
pub mod overlay;
pub mod raster;
pub mod render;
pub mod stream;
pub mod upload;

pub use client::BackendClient;
pub use config::ClientConfig;
pub use detection::{BoundingBox, ConfidenceLevel, DetectionResult, FrameSize};
pub use error::{ClientError, ErrorKind};
pub use notify::{BannerBoard, BannerKind, LogNotifier, Notifier};
pub use overlay::{
    Anchor, CanvasSink, OverlayDrawer, OverlayOutcome, OverlayStyle, OverlaySurface,
    RecordingCanvas,
};
pub use raster::RasterCanvas;
pub use render::{HtmlContainer, Node, RenderTarget, ResultRenderer};
pub use stream::{StreamController, StreamDeps, StreamSettings, StreamState};
pub use upload::{UploadFile, UploadFlow, UploadOutcome, UploadResponse, UploadView};
