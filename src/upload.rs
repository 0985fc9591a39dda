//! Upload flow: client-side validation, submission, and interpretation of the
//! server's answer.

use serde::Deserialize;
use std::io::Cursor;
use std::path::Path;

use crate::config::ClientConfig;
use crate::detection::{DetectionResult, FrameSize};
use crate::error::ClientError;
use crate::notify::Notifier;
use crate::overlay::{Anchor, OverlaySurface};
use crate::render::{Element, Node, RenderTarget, ResultRenderer};

/// MIME types accepted for upload.
pub const ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/jpg",
    "video/mp4",
    "video/avi",
    "video/quicktime",
];

pub const UPLOAD_FAILED_MESSAGE: &str = "Error processing file. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// A file picked for upload.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a local file; the MIME type comes from the extension.
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = content_type_for(path);
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        if !ALLOWED_TYPES.contains(&self.content_type.as_str()) {
            return None;
        }
        if self.content_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            Some(MediaKind::Video)
        }
    }

    /// Intrinsic resolution of an image upload, read from its header.
    pub fn natural_size(&self) -> Option<FrameSize> {
        if self.media_kind() != Some(MediaKind::Image) {
            return None;
        }
        let reader = image::ImageReader::new(Cursor::new(self.bytes.as_slice()))
            .with_guessed_format()
            .ok()?;
        let (width, height) = reader.into_dimensions().ok()?;
        Some(FrameSize::new(width, height))
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("mp4") => "video/mp4",
        Some("avi") => "video/avi",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Checks presence, size and MIME type. Nothing is sent when this fails.
pub fn validate(file: Option<&UploadFile>) -> Result<MediaKind, ClientError> {
    let file = match file {
        Some(file) if !file.bytes.is_empty() => file,
        _ => return Err(ClientError::EmptyFile),
    };
    file.media_kind()
        .ok_or_else(|| ClientError::UnsupportedMediaType(file.content_type.clone()))
}

/// What the server produced for an upload.
#[derive(Clone, Debug, PartialEq)]
pub enum UploadOutcome {
    ProcessedVideo {
        url: String,
        content_type: Option<String>,
    },
    Image {
        url: String,
    },
    Message(String),
}

impl UploadOutcome {
    /// Markup for the returned media, sized to the display width.
    /// Points media URLs at the backend so the markup also works in a page
    /// written to disk.
    pub fn resolved(self, cfg: &ClientConfig) -> Self {
        match self {
            UploadOutcome::ProcessedVideo { url, content_type } => UploadOutcome::ProcessedVideo {
                url: cfg.media_url(&url),
                content_type,
            },
            UploadOutcome::Image { url } => UploadOutcome::Image {
                url: cfg.media_url(&url),
            },
            message => message,
        }
    }

    pub fn media_node(&self, display_width: u32) -> Node {
        match self {
            UploadOutcome::ProcessedVideo { url, content_type } => Element::new("video")
                .class("img-fluid")
                .attr("controls", "")
                .attr("width", display_width.to_string())
                .child(
                    Element::new("source")
                        .attr("src", url.as_str())
                        .attr("type", content_type.as_deref().unwrap_or("video/mp4")),
                )
                .into(),
            UploadOutcome::Image { url } => Element::new("img")
                .class("img-fluid")
                .attr("src", url.as_str())
                .attr("width", display_width.to_string())
                .attr("alt", "Uploaded image")
                .into(),
            UploadOutcome::Message(message) => Element::new("div")
                .class("alert alert-info")
                .text(message.as_str())
                .into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UploadResponse {
    pub outcome: UploadOutcome,
    /// Status text the server attached, if any.
    pub message: Option<String>,
    pub detections: Vec<DetectionResult>,
}

#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    #[serde(default)]
    success: bool,
    processed_video_url: Option<String>,
    processed_video_type: Option<String>,
    image_url: Option<String>,
    message: Option<String>,
    error: Option<String>,
    #[serde(default)]
    detections: Option<Vec<DetectionResult>>,
}

/// Failure text carried by a JSON error body (`message` or `error`).
pub(crate) fn failure_text(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct FailureBody {
        message: Option<String>,
        error: Option<String>,
    }
    let parsed: FailureBody = serde_json::from_str(body).ok()?;
    parsed.message.or(parsed.error)
}

/// Interprets an upload response. Non-2xx statuses and 2xx bodies that are not
/// the expected JSON are errors.
pub fn interpret_upload(status: u16, body: &str) -> Result<UploadResponse, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::HttpStatus {
            status,
            message: failure_text(body),
        });
    }
    let parsed: UploadResponseBody = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("upload response: {}", e)))?;
    if !parsed.success {
        return Err(ClientError::Rejected(
            parsed
                .message
                .or(parsed.error)
                .unwrap_or_else(|| UPLOAD_FAILED_MESSAGE.to_string()),
        ));
    }
    let outcome = if let Some(url) = parsed.processed_video_url {
        UploadOutcome::ProcessedVideo {
            url,
            content_type: parsed.processed_video_type,
        }
    } else if let Some(url) = parsed.image_url {
        UploadOutcome::Image { url }
    } else if let Some(message) = parsed.message.clone() {
        UploadOutcome::Message(message)
    } else {
        return Err(ClientError::MalformedResponse(
            "upload response has no video url, image url or message".to_string(),
        ));
    };
    Ok(UploadResponse {
        outcome,
        message: parsed.message,
        detections: parsed.detections.unwrap_or_default(),
    })
}

/// Sends a validated file to the upload endpoint.
pub trait UploadTransport {
    fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ClientError>;
}

/// Where an upload's results are shown.
pub struct UploadView<'a> {
    pub results: &'a mut dyn RenderTarget,
    pub summary: Option<&'a mut dyn RenderTarget>,
    pub chart: Option<&'a mut dyn RenderTarget>,
    pub overlay: Option<OverlaySurface<'a>>,
    /// Width the uploaded image is displayed at.
    pub display_width: u32,
}

/// Submit handler of the upload page.
pub struct UploadFlow<'a> {
    transport: &'a dyn UploadTransport,
    renderer: &'a ResultRenderer,
    notifier: &'a dyn Notifier,
}

impl<'a> UploadFlow<'a> {
    pub fn new(
        transport: &'a dyn UploadTransport,
        renderer: &'a ResultRenderer,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            transport,
            renderer,
            notifier,
        }
    }

    /// Validates, shows the spinner, posts, and reports failures as banners.
    /// On failure the results region shows a fallback message.
    pub fn submit(
        &self,
        file: Option<&UploadFile>,
        results: &mut dyn RenderTarget,
    ) -> Result<UploadResponse, ClientError> {
        let file = match (validate(file), file) {
            (Ok(_), Some(file)) => file,
            (Ok(_), None) => return Err(ClientError::EmptyFile),
            (Err(err), _) => {
                log::warn!("upload rejected before submission: {}", err);
                self.notifier.error(&err.user_message());
                return Err(err);
            }
        };

        self.renderer.show_spinner(Some(&mut *results));
        log::info!(
            "uploading {} ({}, {} bytes)",
            file.name,
            file.content_type,
            file.bytes.len()
        );
        match self.transport.upload(file) {
            Ok(response) => {
                if let Some(message) = &response.message {
                    self.notifier.success(message);
                }
                Ok(response)
            }
            Err(err) => {
                log::error!("upload failed ({:?}): {}", err.kind(), err);
                self.notifier.error(&err.user_message());
                results.replace(
                    Element::new("p")
                        .class("text-danger text-center")
                        .text(UPLOAD_FAILED_MESSAGE)
                        .into(),
                );
                Err(err)
            }
        }
    }

    /// Renders list, summary, chart and the overlay for a successful upload.
    pub fn present(&self, file: &UploadFile, response: &UploadResponse, view: UploadView<'_>) {
        let UploadView {
            results,
            summary,
            chart,
            overlay,
            display_width,
        } = view;

        // Processed videos come back with boxes already burned in.
        let overlay = match (&response.outcome, overlay) {
            (UploadOutcome::ProcessedVideo { .. }, Some(mut surface)) => {
                surface.anchor = None;
                self.renderer.overlay().clear(surface);
                None
            }
            (_, Some(mut surface)) => {
                surface.anchor = file
                    .natural_size()
                    .map(|natural| Anchor::new(natural.fit_width(display_width), Some(natural)));
                Some(surface)
            }
            (_, None) => None,
        };

        self.renderer
            .show_results(&response.detections, Some(results), overlay);
        self.renderer.show_summary(&response.detections, summary);
        self.renderer.show_chart(&response.detections, chart);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_empty_and_unknown_types() {
        assert!(matches!(validate(None), Err(ClientError::EmptyFile)));
        let empty = UploadFile::new("a.jpg", "image/jpeg", Vec::new());
        assert!(matches!(validate(Some(&empty)), Err(ClientError::EmptyFile)));
        let text = UploadFile::new("a.txt", "text/plain", b"hi".to_vec());
        assert!(matches!(
            validate(Some(&text)),
            Err(ClientError::UnsupportedMediaType(t)) if t == "text/plain"
        ));
        let mov = UploadFile::new("clip.mov", "video/quicktime", b"moov".to_vec());
        assert_eq!(validate(Some(&mov)).unwrap(), MediaKind::Video);
    }

    #[test]
    fn extension_maps_to_mime() {
        assert_eq!(content_type_for(Path::new("x.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("x.mov")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("x.gif")), "application/octet-stream");
    }

    #[test]
    fn interprets_each_success_shape() {
        let video = interpret_upload(
            200,
            r#"{"success":true,"processed_video_url":"/v.mp4","processed_video_type":"video/mp4","detections":[]}"#,
        )
        .unwrap();
        assert_eq!(
            video.outcome,
            UploadOutcome::ProcessedVideo {
                url: "/v.mp4".into(),
                content_type: Some("video/mp4".into())
            }
        );

        let image = interpret_upload(
            200,
            r#"{"success":true,"message":"ok","image_url":"/u/1.jpg"}"#,
        )
        .unwrap();
        assert_eq!(image.outcome, UploadOutcome::Image { url: "/u/1.jpg".into() });
        assert_eq!(image.message.as_deref(), Some("ok"));
        assert!(image.detections.is_empty());

        let message = interpret_upload(200, r#"{"success":true,"message":"queued"}"#).unwrap();
        assert_eq!(message.outcome, UploadOutcome::Message("queued".into()));
    }

    #[test]
    fn media_node_follows_outcome() {
        let video = UploadOutcome::ProcessedVideo {
            url: "/v.mp4".into(),
            content_type: None,
        };
        let html = video.media_node(640).to_html();
        assert!(html.starts_with("<video"));
        assert!(html.contains("type=\"video/mp4\""));
        let image = UploadOutcome::Image { url: "/u/1.jpg".into() };
        assert!(image.media_node(640).to_html().contains("src=\"/u/1.jpg\""));
    }

    #[test]
    fn media_urls_resolve_against_the_backend() {
        let mut cfg = ClientConfig::default();
        cfg.set_server_url("http://trash.local:5000").unwrap();

        let image = UploadOutcome::Image { url: "/u/1.jpg".into() }.resolved(&cfg);
        assert_eq!(
            image,
            UploadOutcome::Image {
                url: "http://trash.local:5000/u/1.jpg".into()
            }
        );
        assert!(image
            .media_node(640)
            .to_html()
            .contains("src=\"http://trash.local:5000/u/1.jpg\""));

        let cdn = UploadOutcome::Image {
            url: "https://cdn.example.org/a.png".into(),
        };
        assert_eq!(cdn.clone().resolved(&cfg), cdn);

        let message = UploadOutcome::Message("queued".into());
        assert_eq!(message.clone().resolved(&cfg), message);
    }

    #[test]
    fn non_json_success_is_malformed() {
        let err = interpret_upload(200, "<html>login</html>").unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[test]
    fn error_statuses_keep_server_message() {
        let err = interpret_upload(
            415,
            r#"{"success":false,"message":"Unsupported file format: .gif"}"#,
        )
        .unwrap_err();
        match err {
            ClientError::HttpStatus { status, message } => {
                assert_eq!(status, 415);
                assert_eq!(message.as_deref(), Some("Unsupported file format: .gif"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let err = interpret_upload(200, r#"{"success":false,"error":"model offline"}"#).unwrap_err();
        assert!(matches!(err, ClientError::Rejected(m) if m == "model offline"));
    }
}
