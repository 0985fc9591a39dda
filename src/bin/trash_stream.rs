//! trash_stream - live camera detection
//!
//! Opens a camera source, submits one frame per capture interval to the
//! backend, and keeps the live results page up to date until Ctrl-C or the
//! optional duration elapses. The camera is always released on exit.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use trash_lens::stream::{open_camera, LivePanel, PanelPreview, ThreadScheduler};
use trash_lens::{
    BackendClient, ClientConfig, LogNotifier, OverlayDrawer, ResultRenderer, StreamController,
    StreamDeps, StreamSettings,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "trash_stream", about = "Stream a camera to the trash detector")]
struct Args {
    /// Camera source: stub://<name> or a directory of JPEG/PNG frames
    #[arg(long, value_name = "SOURCE")]
    source: Option<String>,

    /// Backend base URL (overrides config and TRASH_LENS_SERVER_URL)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long, value_name = "SECS")]
    duration_secs: Option<u64>,

    /// Live results page, rewritten after every processed frame
    #[arg(long, default_value = "trash_lens_live.html", value_name = "PATH")]
    html_out: PathBuf,

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
    let source = args
        .source
        .clone()
        .unwrap_or_else(|| cfg.capture.camera.clone());

    let panel = Arc::new(
        LivePanel::new(ResultRenderer::new(OverlayDrawer::default()), cfg.display.width)
            .with_output(args.html_out.clone()),
    );
    let camera = open_camera(&source).map_err(|err| anyhow!("{}: {}", err.user_message(), err))?;
    let controller = StreamController::new(
        StreamSettings::from(&cfg.capture),
        StreamDeps {
            camera,
            preview: Box::new(PanelPreview(panel.clone())),
            submitter: Arc::new(BackendClient::new(&cfg)),
            view: panel.clone(),
            scheduler: Arc::new(ThreadScheduler),
            notifier: Arc::new(LogNotifier),
        },
    );

    {
        let stage = ui.stage(&format!("Open camera {}", source));
        if let Err(err) = controller.start() {
            stage.fail(&err.to_string());
            return Err(anyhow!(err.user_message()));
        }
    }
    log::info!(
        "streaming to {} every {:?}; live page at {}",
        cfg.frame_url(),
        cfg.capture.interval,
        args.html_out.display()
    );

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;

    match args.duration_secs {
        Some(secs) => match rx.recv_timeout(Duration::from_secs(secs)) {
            Ok(()) => log::info!("shutdown signal received"),
            Err(_) => log::info!("duration elapsed"),
        },
        None => {
            log::info!("trash_stream running; press Ctrl-C to stop");
            let _ = rx.recv();
            log::info!("shutdown signal received");
        }
    }

    {
        let _stage = ui.stage("Stop stream");
        controller.stop();
    }
    println!(
        "processed {} frame(s); live page: {}",
        panel.updates(),
        args.html_out.display()
    );
    Ok(())
}
