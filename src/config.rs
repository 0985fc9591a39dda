use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_UPLOAD_PATH: &str = "/upload";
const DEFAULT_FRAME_PATH: &str = "/process_frame";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 1000;
const DEFAULT_JPEG_QUALITY: u8 = 95;
const DEFAULT_IDEAL_WIDTH: u32 = 1280;
const DEFAULT_IDEAL_HEIGHT: u32 = 720;
const DEFAULT_FACING: &str = "environment";
const DEFAULT_CAMERA: &str = "stub://camera";
const DEFAULT_DISPLAY_WIDTH: u32 = 640;
const DEFAULT_BANNER_TTL_SECS: u64 = 5;

#[derive(Debug, Deserialize, Default)]
struct ClientConfigFile {
    server_url: Option<String>,
    upload_path: Option<String>,
    frame_path: Option<String>,
    request_timeout_secs: Option<u64>,
    capture: Option<CaptureConfigFile>,
    display: Option<DisplayConfigFile>,
    banner_ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    interval_ms: Option<u64>,
    jpeg_quality: Option<u8>,
    ideal_width: Option<u32>,
    ideal_height: Option<u32>,
    facing: Option<String>,
    camera: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    width: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub upload_path: String,
    pub frame_path: String,
    pub request_timeout: Duration,
    pub capture: CaptureSettings,
    pub display: DisplaySettings,
    pub banner_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub interval: Duration,
    pub jpeg_quality: u8,
    pub ideal_width: u32,
    pub ideal_height: u32,
    /// Preferred facing mode; `environment` is the rear camera.
    pub facing: String,
    /// Camera source: `stub://<name>` or a directory of still frames.
    pub camera: String,
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    /// Width the anchor image/video is shown at; height follows the aspect ratio.
    pub width: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        // Defaults always validate.
        Self::from_file(ClientConfigFile::default())
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TRASH_LENS_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ClientConfigFile) -> Self {
        let capture = file.capture.unwrap_or_default();
        Self {
            server_url: file
                .server_url
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            upload_path: file
                .upload_path
                .unwrap_or_else(|| DEFAULT_UPLOAD_PATH.to_string()),
            frame_path: file
                .frame_path
                .unwrap_or_else(|| DEFAULT_FRAME_PATH.to_string()),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            capture: CaptureSettings {
                interval: Duration::from_millis(
                    capture.interval_ms.unwrap_or(DEFAULT_CAPTURE_INTERVAL_MS),
                ),
                jpeg_quality: capture.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
                ideal_width: capture.ideal_width.unwrap_or(DEFAULT_IDEAL_WIDTH),
                ideal_height: capture.ideal_height.unwrap_or(DEFAULT_IDEAL_HEIGHT),
                facing: capture
                    .facing
                    .unwrap_or_else(|| DEFAULT_FACING.to_string()),
                camera: capture
                    .camera
                    .unwrap_or_else(|| DEFAULT_CAMERA.to_string()),
            },
            display: DisplaySettings {
                width: file
                    .display
                    .and_then(|display| display.width)
                    .unwrap_or(DEFAULT_DISPLAY_WIDTH),
            },
            banner_ttl: Duration::from_secs(
                file.banner_ttl_secs.unwrap_or(DEFAULT_BANNER_TTL_SECS),
            ),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("TRASH_LENS_SERVER_URL") {
            if !url.trim().is_empty() {
                self.server_url = url.trim().to_string();
            }
        }
        if let Ok(camera) = std::env::var("TRASH_LENS_CAMERA") {
            if !camera.trim().is_empty() {
                self.capture.camera = camera.trim().to_string();
            }
        }
        if let Ok(interval) = std::env::var("TRASH_LENS_CAPTURE_INTERVAL_MS") {
            let ms: u64 = interval.trim().parse().map_err(|_| {
                anyhow!("TRASH_LENS_CAPTURE_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.capture.interval = Duration::from_millis(ms);
        }
        if let Ok(quality) = std::env::var("TRASH_LENS_JPEG_QUALITY") {
            self.capture.jpeg_quality = quality
                .trim()
                .parse()
                .map_err(|_| anyhow!("TRASH_LENS_JPEG_QUALITY must be an integer in 1..=100"))?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        let url = url::Url::parse(&self.server_url)
            .map_err(|e| anyhow!("invalid server_url '{}': {}", self.server_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported server_url scheme '{}'; expected http or https",
                url.scheme()
            ));
        }
        self.server_url = self.server_url.trim_end_matches('/').to_string();
        for path in [&mut self.upload_path, &mut self.frame_path] {
            if !path.starts_with('/') {
                path.insert(0, '/');
            }
        }
        if self.capture.interval.is_zero() {
            return Err(anyhow!("capture interval must be greater than zero"));
        }
        if !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(anyhow!("jpeg_quality must be in 1..=100"));
        }
        if self.banner_ttl.is_zero() {
            return Err(anyhow!("banner_ttl must be greater than zero"));
        }
        if self.display.width == 0 {
            return Err(anyhow!("display width must be greater than zero"));
        }
        Ok(())
    }

    /// Points the client at another backend, e.g. from a command-line flag.
    pub fn set_server_url(&mut self, url: &str) -> Result<()> {
        self.server_url = url.trim().to_string();
        self.validate()
    }

    /// Resolves a media URL from a response, e.g. `/uploads/a.jpg`, against
    /// the backend. Absolute URLs are returned unchanged.
    pub fn media_url(&self, path: &str) -> String {
        url::Url::parse(&self.server_url)
            .and_then(|base| base.join(path))
            .map(String::from)
            .unwrap_or_else(|_| path.to_string())
    }

    pub fn upload_url(&self) -> String {
        format!("{}{}", self.server_url, self.upload_path)
    }

    pub fn frame_url(&self) -> String {
        format!("{}{}", self.server_url, self.frame_path)
    }
}

fn read_config_file(path: &Path) -> Result<ClientConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
