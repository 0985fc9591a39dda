use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Preview, ResultView};
use crate::detection::{DetectionResult, FrameSize};
use crate::overlay::{Anchor, CanvasCommand, OverlaySurface, RecordingCanvas};
use crate::render::{Element, HtmlContainer, RenderTarget, ResultRenderer, ResultsPage};

const PAGE_TITLE: &str = "Live Trash Detection";

/// The live page: result list, overlay canvas and stream visibility.
///
/// When an output path is set, the page is rewritten after every update.
pub struct LivePanel {
    renderer: ResultRenderer,
    display_width: u32,
    output: Option<PathBuf>,
    state: Mutex<PanelState>,
}

#[derive(Default)]
struct PanelState {
    results: HtmlContainer,
    canvas: RecordingCanvas,
    /// Intrinsic size of the attached stream, if any.
    attached: Option<FrameSize>,
    streaming: bool,
    updates: usize,
}

impl LivePanel {
    pub fn new(renderer: ResultRenderer, display_width: u32) -> Self {
        Self {
            renderer,
            display_width,
            output: None,
            state: Mutex::new(PanelState::default()),
        }
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output = Some(path);
        self
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn results_html(&self) -> String {
        self.lock().results.to_html()
    }

    pub fn results_text(&self) -> String {
        self.lock().results.text_content()
    }

    pub fn overlay_commands(&self) -> Vec<CanvasCommand> {
        self.lock().canvas.commands().to_vec()
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().streaming
    }

    pub fn updates(&self) -> usize {
        self.lock().updates
    }

    /// The full live page as a standalone HTML document.
    pub fn to_document(&self) -> String {
        let state = self.lock();
        Self::document(&state)
    }

    fn document(state: &PanelState) -> String {
        let (badge, container) = if state.streaming {
            ("badge bg-success", "stream-container")
        } else {
            ("badge bg-secondary", "stream-container d-none")
        };
        let status = Element::new("div")
            .class("stream-status")
            .attr("aria-live", "polite")
            .child(Element::new("span").class(badge).text(if state.streaming {
                "Streaming"
            } else {
                "Stopped"
            }));
        let page = ResultsPage {
            banners: vec![status.into()],
            media: Some(
                Element::new("video")
                    .class(container)
                    .attr("autoplay", "")
                    .attr("playsinline", "")
                    .into(),
            ),
            results: state.results.clone(),
            ..ResultsPage::default()
        };
        page.with_overlay(&state.canvas).to_document(PAGE_TITLE)
    }

    fn persist(&self, state: &PanelState) {
        let Some(path) = &self.output else {
            return;
        };
        if let Err(e) = std::fs::write(path, Self::document(state)) {
            log::warn!("failed to write live page {}: {}", path.display(), e);
        }
    }
}

impl ResultView for LivePanel {
    fn update(&self, results: &[DetectionResult], frame: FrameSize) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let natural = state.attached.unwrap_or(frame);
        let anchor = Anchor::new(natural.fit_width(self.display_width), Some(frame));
        self.renderer.show_live(
            results,
            Some(&mut state.results as &mut dyn RenderTarget),
            Some(OverlaySurface::new(anchor, &mut state.canvas)),
        );
        state.updates += 1;
        log::debug!("live panel updated with {} detections", results.len());
        self.persist(state);
    }
}

/// Shows or hides the stream container of a shared `LivePanel`.
pub struct PanelPreview(pub Arc<LivePanel>);

impl Preview for PanelPreview {
    fn attach(&mut self, frame: Option<FrameSize>) {
        let mut state = self.0.lock();
        state.attached = frame;
        state.streaming = true;
        self.0.persist(&state);
    }

    fn detach(&mut self) {
        let mut state = self.0.lock();
        state.attached = None;
        state.streaming = false;
        self.0.persist(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::OverlayDrawer;

    fn panel() -> LivePanel {
        LivePanel::new(ResultRenderer::new(OverlayDrawer::default()), 640)
    }

    #[test]
    fn update_renders_list_and_overlay() {
        let panel = panel();
        let results = vec![DetectionResult::new("Can", 0.55).with_bbox(128.0, 72.0, 64.0, 36.0)];
        panel.update(&results, FrameSize::new(1280, 720));
        assert!(panel.results_text().contains("Can"));
        assert!(panel.results_html().contains("bg-warning"));
        assert_eq!(panel.updates(), 1);
        let commands = panel.overlay_commands();
        assert!(matches!(
            commands.first(),
            Some(CanvasCommand::Resize { width: 640, height: 360 })
        ));
    }

    #[test]
    fn preview_toggles_stream_container() {
        let panel = Arc::new(panel());
        let mut preview = PanelPreview(panel.clone());
        preview.attach(Some(FrameSize::new(1280, 720)));
        assert!(panel.is_streaming());
        assert!(panel.to_document().contains("Streaming"));
        preview.detach();
        assert!(!panel.is_streaming());
        assert!(panel.to_document().contains("Stopped"));
    }

    #[test]
    fn empty_frame_shows_live_message() {
        let panel = panel();
        panel.update(&[], FrameSize::new(1280, 720));
        assert!(panel.results_text().contains("No trash detected in current frame."));
    }
}
