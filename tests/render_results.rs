use trash_lens::render::results::{EMPTY_RESULTS_MESSAGE, EMPTY_SUMMARY_MESSAGE};
use trash_lens::render::{PieChart, Summary, CHART_PALETTE};
use trash_lens::{
    Anchor, CanvasSink, DetectionResult, FrameSize, HtmlContainer, OverlayDrawer, OverlaySurface,
    RecordingCanvas, RenderTarget, ResultRenderer,
};

fn renderer() -> ResultRenderer {
    ResultRenderer::new(OverlayDrawer::default())
}

#[test]
fn confidence_styling_boundaries() {
    let cases = [
        (1.0, "100.00%", "text-success"),
        (0.70, "70.00%", "text-success"),
        (0.6999, "69.99%", "text-warning"),
        (0.69999, "70.00%", "text-warning"),
        (0.40, "40.00%", "text-warning"),
        (0.3999, "39.99%", "text-danger"),
        (0.399999, "40.00%", "text-danger"),
        (0.0, "0.00%", "text-danger"),
    ];
    for (confidence, shown, class) in cases {
        let html = ResultRenderer::list(&[DetectionResult::new("Can", confidence)]).to_html();
        assert!(html.contains(shown), "{confidence} should show {shown}: {html}");
        assert!(html.contains(class), "{confidence} should render {class}: {html}");
    }
}

#[test]
fn cards_follow_input_order_with_bbox_text() {
    let results = vec![
        DetectionResult::new("Bottle", 0.92).with_bbox(10.0, 10.0, 50.0, 50.0),
        DetectionResult::new("Bag", 0.35),
    ];
    let mut container = HtmlContainer::new();
    renderer().show_results(&results, Some(&mut container), None);

    let cards = container.find_by_class("result-item");
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].attr_value("aria-label"), Some("Bottle 92.00%"));
    assert_eq!(cards[1].attr_value("aria-label"), Some("Bag 35.00%"));

    let text = container.text_content();
    assert!(text.contains("Position: (10, 10)"));
    assert!(text.contains("Size: 50\u{d7}50"));
    assert_eq!(container.find_by_class("bbox-info").len(), 1);
}

#[test]
fn empty_results_render_message_and_clear_overlay() {
    let mut container = HtmlContainer::new();
    container.replace(ResultRenderer::spinner());
    let mut canvas = RecordingCanvas::new();
    let anchor = Anchor::new(FrameSize::new(320, 240), Some(FrameSize::new(640, 480)));

    renderer().show_results(&[], Some(&mut container), Some(OverlaySurface::new(anchor, &mut canvas)));

    assert_eq!(container.text_content(), EMPTY_RESULTS_MESSAGE);
    assert!(canvas.stroked_rects().is_empty());
    assert_eq!(canvas.size(), FrameSize::new(320, 240));
}

#[test]
fn missing_container_is_a_no_op() {
    let mut canvas = RecordingCanvas::new();
    let anchor = Anchor::new(FrameSize::new(100, 100), None);
    renderer().show_results(
        &[DetectionResult::new("Can", 0.9).with_bbox(0.0, 0.0, 10.0, 10.0)],
        None,
        Some(OverlaySurface::new(anchor, &mut canvas)),
    );
    assert!(canvas.commands().is_empty());
}

#[test]
fn summary_dominant_type_is_highest_confidence_not_most_frequent() {
    let results = vec![
        DetectionResult::new("Can", 0.50),
        DetectionResult::new("Can", 0.55),
        DetectionResult::new("Can", 0.60),
        DetectionResult::new("Bottle", 0.95),
    ];
    let summary = Summary::from_results(&results).unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.distinct_types(), 2);
    assert_eq!(summary.dominant_type, "Bottle");
    assert!((summary.mean_confidence - 0.65).abs() < 1e-9);

    let text = summary.to_node().text_content();
    assert!(text.contains("Bottle (95.00% confidence)"));
    assert!(text.contains("Can: 3 items"));
    assert!(text.contains("Bottle: 1 item"));
    assert!(!text.contains("Bottle: 1 items"));
}

#[test]
fn summary_ties_go_to_first_result() {
    let results = vec![
        DetectionResult::new("Paper", 0.8),
        DetectionResult::new("Glass", 0.8),
    ];
    assert_eq!(Summary::from_results(&results).unwrap().dominant_type, "Paper");
}

#[test]
fn empty_summary_and_chart() {
    let mut summary = HtmlContainer::new();
    let mut chart = HtmlContainer::new();
    let r = renderer();
    r.show_summary(&[], Some(&mut summary));
    r.show_chart(&[], Some(&mut chart));
    assert_eq!(summary.text_content(), EMPTY_SUMMARY_MESSAGE);
    assert!(chart.is_empty());
    assert!(PieChart::from_results(&[]).is_none());
}

#[test]
fn chart_cycles_palette_in_first_seen_order() {
    let results: Vec<DetectionResult> = (0..12)
        .map(|i| DetectionResult::new(format!("Type{i}"), 0.5))
        .chain(std::iter::once(DetectionResult::new("Type0", 0.9)))
        .collect();
    let chart = PieChart::from_results(&results).unwrap();
    assert_eq!(chart.labels.len(), 12);
    assert_eq!(chart.labels[0], "Type0");
    assert_eq!(chart.data[0], 2);
    assert_eq!(chart.colors[0], CHART_PALETTE[0]);
    assert_eq!(chart.colors[10], CHART_PALETTE[0]);
    assert_eq!(chart.colors[11], CHART_PALETTE[1]);

    let config = chart.to_chartjs();
    assert_eq!(config["type"], "pie");
    assert_eq!(config["data"]["datasets"][0]["data"][0], 2);
}

#[test]
fn live_list_uses_bar_classes() {
    let mut container = HtmlContainer::new();
    renderer().show_live(
        &[DetectionResult::new("Can", 0.45), DetectionResult::new("Bag", 0.1)],
        Some(&mut container),
        None,
    );
    let bars = container.find_by_class("progress-bar");
    assert_eq!(bars.len(), 2);
    assert!(bars[0].has_class("bg-warning"));
    assert!(bars[1].has_class("bg-danger"));
    assert_eq!(container.find_by_class("trash-type").len(), 2);
}
