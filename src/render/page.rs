use super::{Element, HtmlContainer, Node, RenderTarget};
use crate::overlay::RecordingCanvas;

/// A standalone HTML page assembled from the rendered regions of a view.
#[derive(Clone, Debug, Default)]
pub struct ResultsPage {
    pub banners: Vec<Node>,
    /// The anchor media (image or processed video), if any.
    pub media: Option<Node>,
    pub results: HtmlContainer,
    pub summary: HtmlContainer,
    pub chart: HtmlContainer,
    /// Overlay drawing commands, replayed onto `#overlay-canvas` by the page.
    pub overlay: Option<String>,
}

impl ResultsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlay(mut self, canvas: &RecordingCanvas) -> Self {
        match canvas.to_json() {
            Ok(json) => self.overlay = Some(json),
            Err(e) => log::warn!("overlay commands not serializable: {}", e),
        }
        self
    }

    fn region(id: &str, container: &HtmlContainer) -> Node {
        Element::new("div")
            .attr("id", id)
            .children(container.nodes().iter().cloned())
            .into()
    }

    pub fn to_document(&self, title: &str) -> String {
        let mut body = HtmlContainer::new();
        body.append(
            Element::new("div")
                .attr("id", "alerts")
                .children(self.banners.iter().cloned())
                .into(),
        );
        if let Some(media) = &self.media {
            body.append(
                Element::new("div")
                    .class("media-container position-relative")
                    .child(media.clone())
                    .child(
                        Element::new("canvas")
                            .attr("id", "overlay-canvas")
                            .class("position-absolute top-0 start-0"),
                    )
                    .into(),
            );
        }
        body.append(Self::region("results", &self.results));
        body.append(Self::region("summary", &self.summary));
        body.append(Self::region("chart", &self.chart));
        let mut html = body.to_document(title);
        if let Some(commands) = &self.overlay {
            // Keep a literal `</script>` in the payload from closing the tag.
            html.push_str(&format!(
                "<script type=\"application/json\" id=\"overlay-commands\">{}</script>\n",
                commands.replace("</", "<\\/")
            ));
        }
        html
    }
}
