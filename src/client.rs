//! HTTP client for the detection backend.
//!
//! Both endpoints take `multipart/form-data`: the upload endpoint a `file`
//! field, the frame endpoint a `frame` field holding a JPEG. Responses are JSON.
//! Transport failures and malformed bodies are logged distinctly.

use rand::RngCore;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::detection::DetectionResult;
use crate::error::ClientError;
use crate::stream::FrameSubmitter;
use crate::upload::{failure_text, interpret_upload, UploadFile, UploadResponse, UploadTransport};

pub const FRAME_FIELD: &str = "frame";
pub const FRAME_FILENAME: &str = "frame.jpg";
pub const FILE_FIELD: &str = "file";

#[derive(Clone)]
pub struct BackendClient {
    agent: ureq::Agent,
    upload_url: String,
    frame_url: String,
}

impl BackendClient {
    pub fn new(cfg: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(cfg.request_timeout)
            .build();
        Self {
            agent,
            upload_url: cfg.upload_url(),
            frame_url: cfg.frame_url(),
        }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn frame_url(&self) -> &str {
        &self.frame_url
    }

    /// Posts a file to the upload endpoint. Callers validate first.
    pub fn upload_file(&self, file: &UploadFile) -> Result<UploadResponse, ClientError> {
        let mut form = MultipartForm::new();
        form.add_file(FILE_FIELD, &file.name, &file.content_type, &file.bytes);
        let (status, body) = self.post(&self.upload_url, form)?;
        interpret_upload(status, &body).inspect_err(|err| log_failure("upload", err))
    }

    /// Posts one encoded frame to the frame endpoint.
    pub fn submit_jpeg(&self, jpeg: &[u8]) -> Result<Vec<DetectionResult>, ClientError> {
        let mut form = MultipartForm::new();
        form.add_file(FRAME_FIELD, FRAME_FILENAME, "image/jpeg", jpeg);
        let (status, body) = self.post(&self.frame_url, form)?;
        interpret_frame(status, &body).inspect_err(|err| log_failure("frame", err))
    }

    fn post(&self, url: &str, form: MultipartForm) -> Result<(u16, String), ClientError> {
        let (content_type, payload) = form.finish();
        let result = self
            .agent
            .post(url)
            .set("Content-Type", &content_type)
            .set("Accept", "application/json")
            .send_bytes(&payload);
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                log::error!("request to {} failed: {}", url, transport);
                return Err(ClientError::Transport(transport.to_string()));
            }
        };
        let status = response.status();
        let body = response.into_string().map_err(|e| {
            log::error!("reading response from {} failed: {}", url, e);
            ClientError::Transport(format!("read response body: {}", e))
        })?;
        Ok((status, body))
    }
}

fn log_failure(endpoint: &str, err: &ClientError) {
    match err {
        ClientError::MalformedResponse(detail) => {
            log::error!("{} endpoint returned a malformed response: {}", endpoint, detail)
        }
        ClientError::HttpStatus { status, .. } => {
            log::error!("{} endpoint returned HTTP {}", endpoint, status)
        }
        other => log::warn!("{} endpoint refused request: {}", endpoint, other),
    }
}

impl UploadTransport for BackendClient {
    fn upload(&self, file: &UploadFile) -> Result<UploadResponse, ClientError> {
        self.upload_file(file)
    }
}

impl FrameSubmitter for BackendClient {
    fn submit(&self, jpeg: &[u8]) -> Result<Vec<DetectionResult>, ClientError> {
        self.submit_jpeg(jpeg)
    }
}

#[derive(Debug, Deserialize)]
struct FrameResponseBody {
    #[serde(default)]
    success: bool,
    results: Option<Vec<DetectionResult>>,
    error: Option<String>,
}

/// Interprets a frame-endpoint response: `{success: true, results: [...]}`.
pub fn interpret_frame(status: u16, body: &str) -> Result<Vec<DetectionResult>, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::HttpStatus {
            status,
            message: failure_text(body),
        });
    }
    let parsed: FrameResponseBody = serde_json::from_str(body)
        .map_err(|e| ClientError::MalformedResponse(format!("frame response: {}", e)))?;
    match (parsed.success, parsed.results) {
        (true, Some(results)) => Ok(results),
        (true, None) => Err(ClientError::MalformedResponse(
            "frame response missing results".to_string(),
        )),
        (false, _) => Err(ClientError::Rejected(
            parsed
                .error
                .unwrap_or_else(|| "frame processing failed".to_string()),
        )),
    }
}

/// Builder for a `multipart/form-data` request body.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            boundary: format!("----trashlens{}", hex::encode(bytes)),
            body: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn add_file(&mut self, field: &str, filename: &str, content_type: &str, data: &[u8]) {
        let filename = filename.replace(['"', '\r', '\n'], "_");
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
    }

    /// Returns the `Content-Type` header value and the finished body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_body_frames_the_part() {
        let mut form = MultipartForm::new();
        let boundary = form.boundary().to_string();
        form.add_file("frame", "frame.jpg", "image/jpeg", b"\xFF\xD8\xFF\xD9");
        let (content_type, body) = form.finish();
        assert_eq!(content_type, format!("multipart/form-data; boundary={boundary}"));
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("name=\"frame\"; filename=\"frame.jpg\""));
        assert!(text.contains("Content-Type: image/jpeg\r\n\r\n"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn frame_response_shapes() {
        let results = interpret_frame(
            200,
            r#"{"success":true,"results":[{"trash_type":"Can","confidence":0.5}]}"#,
        )
        .unwrap();
        assert_eq!(results.len(), 1);

        let err = interpret_frame(500, r#"{"success":false,"error":"Detection model not available"}"#)
            .unwrap_err();
        assert!(matches!(err, ClientError::HttpStatus { status: 500, .. }));

        let err = interpret_frame(200, r#"{"success":false,"error":"No frame provided"}"#).unwrap_err();
        assert_eq!(err.user_message(), "No frame provided");

        let err = interpret_frame(200, "not json").unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }
}
