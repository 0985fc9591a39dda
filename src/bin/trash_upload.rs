//! trash_upload - upload an image or video for trash detection
//!
//! Validates the file locally, posts it to the backend, and writes the results
//! page (list, summary, chart and overlay commands). With `--overlay-out`, an
//! image upload is also written as a PNG with the boxes drawn on it.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;

use trash_lens::overlay::CanvasSink;
use trash_lens::render::ResultsPage;
use trash_lens::upload::MediaKind;
use trash_lens::{
    Anchor, BackendClient, BannerBoard, ClientConfig, OverlayDrawer, OverlaySurface, RasterCanvas,
    RecordingCanvas, ResultRenderer, UploadFile, UploadFlow, UploadView,
};

#[path = "../ui.rs"]
mod ui;

const PAGE_TITLE: &str = "Trash Detection Results";

#[derive(Parser, Debug)]
#[command(name = "trash_upload", about = "Upload media for trash detection")]
struct Args {
    /// Image (JPEG, PNG) or video (MP4, AVI, MOV) to upload
    file: PathBuf,

    /// Backend base URL (overrides config and TRASH_LENS_SERVER_URL)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Width the image is displayed at in the results page
    #[arg(long, value_name = "PX")]
    display_width: Option<u32>,

    /// Where to write the results page
    #[arg(long, default_value = "trash_lens_results.html", value_name = "PATH")]
    html_out: PathBuf,

    /// Write the uploaded image with boxes drawn on it (PNG). Label
    /// backgrounds are painted but not their text; see --commands-out
    /// for the labels
    #[arg(long, value_name = "PATH")]
    overlay_out: Option<PathBuf>,

    /// Write the overlay drawing commands as JSON
    #[arg(long, value_name = "PATH")]
    commands_out: Option<PathBuf>,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = ui::Ui::from_flag(
        &args.ui,
        std::io::stderr().is_terminal(),
        !std::io::stdout().is_terminal(),
    );

    let mut cfg = ClientConfig::load()?;
    if let Some(server) = &args.server {
        cfg.set_server_url(server)?;
    }
    let display_width = args.display_width.unwrap_or(cfg.display.width);

    let file = {
        let _stage = ui.stage("Read file");
        UploadFile::from_path(&args.file)
            .with_context(|| format!("failed to read {}", args.file.display()))?
    };

    let client = BackendClient::new(&cfg);
    let renderer = ResultRenderer::new(OverlayDrawer::default());
    let banners = BannerBoard::new(cfg.banner_ttl);
    let flow = UploadFlow::new(&client, &renderer, &banners);
    let mut page = ResultsPage::new();

    let stage = ui.stage(&format!("Upload to {}", client.upload_url()));
    let response = match flow.submit(Some(&file), &mut page.results) {
        Ok(response) => {
            drop(stage);
            response
        }
        Err(err) => {
            stage.fail(&err.to_string());
            page.banners = banners.render_at(Instant::now());
            std::fs::write(&args.html_out, page.to_document(PAGE_TITLE))?;
            return Err(anyhow!(err.user_message()));
        }
    };

    let mut canvas = RecordingCanvas::new();
    {
        let _stage = ui.stage("Render results");
        flow.present(
            &file,
            &response,
            UploadView {
                results: &mut page.results,
                summary: Some(&mut page.summary),
                chart: Some(&mut page.chart),
                overlay: Some(OverlaySurface {
                    anchor: None,
                    canvas: &mut canvas,
                    fallback: None,
                }),
                display_width,
            },
        );
        page.media = Some(response.outcome.clone().resolved(&cfg).media_node(display_width));
        page.banners = banners.render_at(Instant::now());
        page = page.with_overlay(&canvas);
        std::fs::write(&args.html_out, page.to_document(PAGE_TITLE))
            .with_context(|| format!("failed to write {}", args.html_out.display()))?;
    }

    if let Some(path) = &args.commands_out {
        std::fs::write(path, canvas.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(path) = &args.overlay_out {
        let _stage = ui.stage("Composite overlay");
        if file.media_kind() != Some(MediaKind::Image) {
            log::warn!("--overlay-out applies to image uploads only; skipped");
        } else {
            let base = image::load_from_memory(&file.bytes)
                .with_context(|| format!("failed to decode {}", file.name))?;
            let natural = trash_lens::FrameSize::new(base.width(), base.height());
            let mut raster = RasterCanvas::new();
            renderer.overlay().draw(
                &response.detections,
                &Anchor::new(natural, Some(natural)),
                &mut raster,
            );
            log::debug!("overlay raster is {:?}", raster.size());
            raster
                .composite_over(&base)
                .save(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    println!("{} detection(s)", response.detections.len());
    for detection in &response.detections {
        println!(
            "  {:<16} {:>7}%  {}",
            detection.trash_type,
            detection.percent(2),
            detection.level().name()
        );
    }
    println!("results page: {}", args.html_out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn overlay_help_notes_labels_are_not_rasterized() {
        let command = Args::command();
        let overlay = command
            .get_arguments()
            .find(|arg| arg.get_id() == "overlay_out")
            .expect("overlay_out argument");
        let help = overlay.get_help().map(|help| help.to_string()).unwrap_or_default();
        assert!(help.contains("not their text"), "{help}");
    }
}
