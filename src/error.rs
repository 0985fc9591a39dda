//! Client error taxonomy.
//!
//! Every failure in this crate degrades to a visible message. `ClientError::kind`
//! groups variants into the four classes the front-ends care about, and
//! `ClientError::user_message` yields the banner text shown to the user.

use thiserror::Error;

pub const MSG_EMPTY_FILE: &str = "Please select a file to upload.";
pub const MSG_UNSUPPORTED_TYPE: &str =
    "Please upload a valid image (JPEG, PNG) or video (MP4, AVI, MOV) file.";
pub const MSG_CAMERA_UNAVAILABLE: &str =
    "Unable to access camera. Please ensure you have granted camera permissions.";
pub const MSG_GENERIC_FAILURE: &str =
    "An error occurred while processing your request. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no file selected or file is empty")]
    EmptyFile,

    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server returned HTTP {status}")]
    HttpStatus { status: u16, message: Option<String> },

    #[error("malformed server response: {0}")]
    MalformedResponse(String),

    #[error("server rejected request: {0}")]
    Rejected(String),

    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("frame encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any request was sent.
    Validation,
    /// Network failure, non-2xx status, or a server-side refusal.
    Transport,
    /// 2xx status whose body was not the expected JSON.
    MalformedResponse,
    /// Camera permission denied or no capture device.
    Camera,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::EmptyFile | ClientError::UnsupportedMediaType(_) => ErrorKind::Validation,
            ClientError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ClientError::CameraUnavailable(_) => ErrorKind::Camera,
            ClientError::Transport(_)
            | ClientError::HttpStatus { .. }
            | ClientError::Rejected(_)
            | ClientError::Encode(_)
            | ClientError::Io(_) => ErrorKind::Transport,
        }
    }

    /// Text for the user-facing banner.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::EmptyFile => MSG_EMPTY_FILE.to_string(),
            ClientError::UnsupportedMediaType(_) => MSG_UNSUPPORTED_TYPE.to_string(),
            ClientError::CameraUnavailable(_) => MSG_CAMERA_UNAVAILABLE.to_string(),
            ClientError::Rejected(message) => message.clone(),
            ClientError::HttpStatus {
                message: Some(message),
                ..
            } => message.clone(),
            _ => MSG_GENERIC_FAILURE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_variants() {
        assert_eq!(ClientError::EmptyFile.kind(), ErrorKind::Validation);
        assert_eq!(
            ClientError::UnsupportedMediaType("text/plain".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ClientError::MalformedResponse("html".into()).kind(),
            ErrorKind::MalformedResponse
        );
        assert_eq!(
            ClientError::Transport("refused".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ClientError::CameraUnavailable("denied".into()).kind(),
            ErrorKind::Camera
        );
    }

    #[test]
    fn rejected_surfaces_server_text() {
        let err = ClientError::Rejected("Could not decode frame".into());
        assert_eq!(err.user_message(), "Could not decode frame");
        let err = ClientError::Transport("connection reset".into());
        assert_eq!(err.user_message(), MSG_GENERIC_FAILURE);
    }
}
