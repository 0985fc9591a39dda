//! trash_render - render a saved detection response without a backend
//!
//! Reads a JSON body as returned by the upload or frame endpoint and writes
//! the same results page `trash_upload` would. Pass the original image to get
//! a scaled overlay.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use trash_lens::client::interpret_frame;
use trash_lens::config::ClientConfig;
use trash_lens::render::ResultsPage;
use trash_lens::upload::interpret_upload;
use trash_lens::{
    Anchor, DetectionResult, OverlayDrawer, OverlaySurface, RasterCanvas, RecordingCanvas,
    ResultRenderer, UploadFile,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "trash_render", about = "Render a saved trash detection response")]
struct Args {
    /// Saved JSON response body
    response: PathBuf,

    /// The image the response was computed on
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Backend the response came from; media URLs in it are resolved here
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Width the image is displayed at
    #[arg(long, default_value_t = 640, value_name = "PX")]
    display_width: u32,

    /// Where to write the results page
    #[arg(long, default_value = "trash_lens_results.html", value_name = "PATH")]
    html_out: PathBuf,

    /// Write the image with boxes drawn on it (PNG); requires --image. Label
    /// backgrounds are painted but not their text; see --commands-out
    /// for the labels
    #[arg(long, value_name = "PATH", requires = "image")]
    overlay_out: Option<PathBuf>,

    /// Write the overlay drawing commands as JSON
    #[arg(long, value_name = "PATH")]
    commands_out: Option<PathBuf>,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn load_detections(body: &str) -> Result<(Vec<DetectionResult>, Option<trash_lens::UploadOutcome>)> {
    match interpret_upload(200, body) {
        Ok(response) => Ok((response.detections, Some(response.outcome))),
        Err(upload_err) => match interpret_frame(200, body) {
            Ok(results) => Ok((results, None)),
            Err(_) => Err(upload_err.into()),
        },
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let ui = ui::Ui::from_flag(
        &args.ui,
        std::io::stderr().is_terminal(),
        !std::io::stdout().is_terminal(),
    );

    let server = match &args.server {
        Some(url) => {
            let mut cfg = ClientConfig::default();
            cfg.set_server_url(url)?;
            Some(cfg)
        }
        None => None,
    };

    let (detections, outcome) = {
        let _stage = ui.stage("Read response");
        let body = std::fs::read_to_string(&args.response)
            .with_context(|| format!("failed to read {}", args.response.display()))?;
        load_detections(&body)?
    };
    let image = match &args.image {
        Some(path) => Some(
            UploadFile::from_path(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };
    let natural = image.as_ref().and_then(UploadFile::natural_size);

    let renderer = ResultRenderer::new(OverlayDrawer::default());
    let mut page = ResultsPage::new();
    let mut canvas = RecordingCanvas::new();
    {
        let _stage = ui.stage("Render results");
        let overlay = natural.map(|natural| {
            OverlaySurface::new(
                Anchor::new(natural.fit_width(args.display_width), Some(natural)),
                &mut canvas,
            )
        });
        renderer.show_results(&detections, Some(&mut page.results), overlay);
        renderer.show_summary(&detections, Some(&mut page.summary));
        renderer.show_chart(&detections, Some(&mut page.chart));
        page.media = outcome.map(|outcome| {
            let outcome = match &server {
                Some(cfg) => outcome.resolved(cfg),
                None => outcome,
            };
            outcome.media_node(args.display_width)
        });
        page = page.with_overlay(&canvas);
        std::fs::write(&args.html_out, page.to_document("Trash Detection Results"))
            .with_context(|| format!("failed to write {}", args.html_out.display()))?;
    }

    if let Some(path) = &args.commands_out {
        std::fs::write(path, canvas.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let (Some(path), Some(file), Some(natural)) = (&args.overlay_out, &image, natural) {
        let _stage = ui.stage("Composite overlay");
        let base = image::load_from_memory(&file.bytes)
            .with_context(|| format!("failed to decode {}", file.name))?;
        let mut raster = RasterCanvas::new();
        renderer
            .overlay()
            .draw(&detections, &Anchor::new(natural, Some(natural)), &mut raster);
        raster
            .composite_over(&base)
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    println!("{} detection(s) rendered to {}", detections.len(), args.html_out.display());
    Ok(())
}
