//! Detection result views: card list, compact live list, summary, pie chart.

use serde::Serialize;
use serde_json::json;

use super::{Element, Node, RenderTarget};
use crate::detection::DetectionResult;
use crate::overlay::{OverlayDrawer, OverlaySurface};

pub const EMPTY_RESULTS_MESSAGE: &str = "No trash detected in the image.";
pub const EMPTY_FRAME_MESSAGE: &str = "No trash detected in current frame.";
pub const EMPTY_SUMMARY_MESSAGE: &str = "No trash detected.";
pub const CHART_TITLE: &str = "Detected Trash Types";

/// Pie slice colours, assigned to types in first-seen order and cycled.
pub const CHART_PALETTE: [&str; 10] = [
    "#6a3db3", "#4dabf7", "#51cf66", "#fcc419", "#ff6b6b", "#cc5de8", "#22b8cf", "#20c997",
    "#fa5252", "#7950f2",
];

/// Turns detection results into render trees and applies them to targets.
#[derive(Clone, Debug, Default)]
pub struct ResultRenderer {
    overlay: OverlayDrawer,
}

impl ResultRenderer {
    pub fn new(overlay: OverlayDrawer) -> Self {
        Self { overlay }
    }

    pub fn overlay(&self) -> &OverlayDrawer {
        &self.overlay
    }

    /// Card list, one card per result in input order.
    pub fn list(results: &[DetectionResult]) -> Node {
        if results.is_empty() {
            return Element::new("p")
                .class("text-center")
                .text(EMPTY_RESULTS_MESSAGE)
                .into();
        }
        Element::new("div")
            .class("detection-results")
            .child(Element::new("h4").text("Detected Trash:"))
            .child(
                Element::new("div")
                    .class("results-list")
                    .children(results.iter().map(result_card)),
            )
            .into()
    }

    /// Compact list refreshed on every captured frame.
    pub fn live_list(results: &[DetectionResult]) -> Node {
        if results.is_empty() {
            return Element::new("p").text(EMPTY_FRAME_MESSAGE).into();
        }
        Element::new("div")
            .class("result-list")
            .children(results.iter().map(|result| {
                let pct = result.percent(2);
                Node::from(
                    Element::new("div")
                        .class("result-item")
                        .child(
                            Element::new("span")
                                .class("trash-type")
                                .text(result.trash_type.as_str()),
                        )
                        .child(
                            Element::new("div").class("progress").child(
                                progress_bar(&pct)
                                    .class(&result.level().bar_class())
                                    .text(format!("{pct}%")),
                            ),
                        ),
                )
            }))
            .into()
    }

    pub fn summary(results: &[DetectionResult]) -> Node {
        match Summary::from_results(results) {
            Some(summary) => summary.to_node(),
            None => Element::new("p").text(EMPTY_SUMMARY_MESSAGE).into(),
        }
    }

    pub fn chart(results: &[DetectionResult]) -> Option<PieChart> {
        PieChart::from_results(results)
    }

    /// "Processing..." placeholder shown while a request is in flight.
    pub fn spinner() -> Node {
        Element::new("div")
            .class("spinner-container")
            .child(Element::new("div").class("spinner"))
            .child(Element::new("p").class("mt-3").text("Processing..."))
            .into()
    }

    /// Replaces the container with the card list and repaints the overlay.
    ///
    /// Empty input renders the fixed message and clears the overlay. A missing
    /// container is logged and ignored.
    pub fn show_results(
        &self,
        results: &[DetectionResult],
        container: Option<&mut dyn RenderTarget>,
        overlay: Option<OverlaySurface<'_>>,
    ) {
        let Some(container) = container else {
            log::warn!("show_results called without a container; nothing rendered");
            return;
        };
        self.repaint(results, overlay);
        container.replace(Self::list(results));
    }

    /// Live-page variant of `show_results`.
    pub fn show_live(
        &self,
        results: &[DetectionResult],
        container: Option<&mut dyn RenderTarget>,
        overlay: Option<OverlaySurface<'_>>,
    ) {
        let Some(container) = container else {
            log::warn!("show_live called without a container; nothing rendered");
            return;
        };
        self.repaint(results, overlay);
        container.replace(Self::live_list(results));
    }

    pub fn show_summary(&self, results: &[DetectionResult], container: Option<&mut dyn RenderTarget>) {
        match container {
            Some(container) => container.replace(Self::summary(results)),
            None => log::warn!("show_summary called without a container"),
        }
    }

    /// Appends a chart canvas; does nothing for empty input.
    pub fn show_chart(&self, results: &[DetectionResult], container: Option<&mut dyn RenderTarget>) {
        let Some(container) = container else {
            return;
        };
        if let Some(chart) = Self::chart(results) {
            container.append(chart.to_node());
        }
    }

    pub fn show_spinner(&self, container: Option<&mut dyn RenderTarget>) {
        if let Some(container) = container {
            container.replace(Self::spinner());
        }
    }

    fn repaint(&self, results: &[DetectionResult], overlay: Option<OverlaySurface<'_>>) {
        let Some(surface) = overlay else {
            return;
        };
        if results.is_empty() {
            self.overlay.clear(surface);
        } else {
            self.overlay.draw_on(results, surface);
        }
    }
}

fn progress_bar(pct: &str) -> Element {
    Element::new("div")
        .class("progress-bar")
        .attr("role", "progressbar")
        .attr("style", format!("width: {pct}%;"))
        .attr("aria-valuenow", pct)
        .attr("aria-valuemin", "0")
        .attr("aria-valuemax", "100")
}

fn result_card(result: &DetectionResult) -> Node {
    let pct = result.percent(2);
    let level = result.level();

    let mut body = Element::new("div")
        .class("card-body")
        .child(
            Element::new("h5")
                .class("card-title")
                .text(result.trash_type.as_str()),
        )
        .child(
            Element::new("p")
                .class("card-text")
                .child(Element::new("span").class("confidence-label").text("Confidence:"))
                .text(" ")
                .child(
                    Element::new("span")
                        .class(&level.text_class())
                        .text(format!("{pct}%")),
                ),
        )
        .child(
            Element::new("div")
                .class("progress")
                .child(progress_bar(&pct).class(&level.bar_class())),
        );

    if let Some(bbox) = &result.bbox {
        body = body.child(
            Element::new("div").class("bbox-info mt-2").child(
                Element::new("small").class("text-muted").text(format!(
                    "Position: ({}, {})\u{a0} Size: {}\u{d7}{}",
                    bbox.x, bbox.y, bbox.width, bbox.height
                )),
            ),
        );
    }

    Element::new("div")
        .class("result-item card mb-3")
        .attr("aria-label", format!("{} {pct}%", result.trash_type))
        .child(body)
        .into()
}

/// Aggregates over one response.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub total: usize,
    /// Per-type counts in first-seen order.
    pub counts: Vec<(String, usize)>,
    /// Type of the single highest-confidence result, not the most frequent type.
    pub dominant_type: String,
    pub dominant_confidence: f64,
    pub mean_confidence: f64,
}

impl Summary {
    pub fn from_results(results: &[DetectionResult]) -> Option<Self> {
        let first = results.first()?;
        let mut dominant = first;
        let mut confidence_sum = 0.0;
        for result in results {
            if result.confidence > dominant.confidence {
                dominant = result;
            }
            confidence_sum += result.confidence;
        }
        Some(Self {
            total: results.len(),
            counts: count_by_type(results),
            dominant_type: dominant.trash_type.clone(),
            dominant_confidence: dominant.confidence,
            mean_confidence: confidence_sum / results.len() as f64,
        })
    }

    pub fn distinct_types(&self) -> usize {
        self.counts.len()
    }

    pub fn to_node(&self) -> Node {
        let stat = |label: &str, value: String| -> Node {
            Element::new("p")
                .child(Element::new("strong").text(label))
                .text(format!(" {value}"))
                .into()
        };
        Element::new("div")
            .class("summary-card")
            .child(Element::new("h4").text("Detection Summary"))
            .child(stat("Total items detected:", self.total.to_string()))
            .child(stat("Types of trash:", self.distinct_types().to_string()))
            .child(stat(
                "Dominant trash type:",
                format!(
                    "{} ({:.2}% confidence)",
                    self.dominant_type,
                    self.dominant_confidence * 100.0
                ),
            ))
            .child(stat(
                "Average confidence:",
                format!("{:.2}%", self.mean_confidence * 100.0),
            ))
            .child(
                Element::new("div")
                    .class("types-breakdown")
                    .child(Element::new("h5").text("Type Breakdown:"))
                    .child(Element::new("ul").children(self.counts.iter().map(
                        |(trash_type, count)| {
                            let plural = if *count > 1 { "s" } else { "" };
                            Node::from(
                                Element::new("li")
                                    .text(format!("{trash_type}: {count} item{plural}")),
                            )
                        },
                    ))),
            )
            .into()
    }
}

fn count_by_type(results: &[DetectionResult]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for result in results {
        match counts.iter_mut().find(|(t, _)| *t == result.trash_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((result.trash_type.clone(), 1)),
        }
    }
    counts
}

/// Pie chart of per-type counts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub labels: Vec<String>,
    pub data: Vec<usize>,
    pub colors: Vec<&'static str>,
}

impl PieChart {
    pub fn from_results(results: &[DetectionResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let counts = count_by_type(results);
        let colors = (0..counts.len())
            .map(|i| CHART_PALETTE[i % CHART_PALETTE.len()])
            .collect();
        let (labels, data): (Vec<String>, Vec<usize>) = counts.into_iter().unzip();
        Some(Self {
            title: CHART_TITLE.to_string(),
            labels,
            data,
            colors,
        })
    }

    /// Chart.js configuration object.
    pub fn to_chartjs(&self) -> serde_json::Value {
        json!({
            "type": "pie",
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "data": self.data,
                    "backgroundColor": self.colors,
                    "borderWidth": 1
                }]
            },
            "options": {
                "responsive": true,
                "plugins": {
                    "legend": { "position": "right" },
                    "title": {
                        "display": true,
                        "text": self.title,
                        "font": { "size": 16 }
                    }
                }
            }
        })
    }

    pub fn to_node(&self) -> Node {
        Element::new("canvas")
            .class("detection-chart")
            .attr("data-chart", self.to_chartjs().to_string())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_keep_first_seen_order() {
        let results = vec![
            DetectionResult::new("Can", 0.5),
            DetectionResult::new("Bottle", 0.6),
            DetectionResult::new("Can", 0.7),
        ];
        assert_eq!(
            count_by_type(&results),
            vec![("Can".to_string(), 2), ("Bottle".to_string(), 1)]
        );
    }

    #[test]
    fn spinner_reads_processing() {
        assert_eq!(ResultRenderer::spinner().text_content(), "Processing...");
    }
}
