use image::{DynamicImage, Rgba, RgbaImage};

use trash_lens::overlay::{scale_box, CanvasCommand, Rect};
use trash_lens::{
    Anchor, BoundingBox, CanvasSink, DetectionResult, FrameSize, OverlayDrawer, OverlayOutcome,
    OverlaySurface, RasterCanvas, RecordingCanvas,
};

fn bottle() -> DetectionResult {
    DetectionResult::new("Bottle", 0.92).with_bbox(100.0, 50.0, 200.0, 100.0)
}

#[test]
fn boxes_scale_linearly_from_natural_to_displayed() {
    let mut canvas = RecordingCanvas::new();
    let anchor = Anchor::new(FrameSize::new(320, 240), Some(FrameSize::new(640, 480)));
    let outcome = OverlayDrawer::default().draw(&[bottle()], &anchor, &mut canvas);

    assert_eq!(outcome, OverlayOutcome::Drawn(1));
    assert_eq!(canvas.size(), FrameSize::new(320, 240));
    assert_eq!(
        canvas.stroked_rects(),
        vec![Rect {
            x: 50.0,
            y: 25.0,
            width: 100.0,
            height: 50.0
        }]
    );
    assert_eq!(canvas.texts(), vec!["Bottle 92.0%"]);
}

#[test]
fn anisotropic_scaling_uses_separate_axes() {
    let bbox = BoundingBox {
        x: 10.0,
        y: 10.0,
        width: 50.0,
        height: 50.0,
    };
    let rect = scale_box(&bbox, FrameSize::new(100, 200), FrameSize::new(200, 100));
    assert_eq!(
        rect,
        Rect {
            x: 20.0,
            y: 5.0,
            width: 100.0,
            height: 25.0
        }
    );
}

#[test]
fn canvas_is_resized_on_every_call() {
    let drawer = OverlayDrawer::default();
    let mut canvas = RecordingCanvas::new();
    let natural = Some(FrameSize::new(640, 480));

    drawer.draw(&[bottle()], &Anchor::new(FrameSize::new(640, 480), natural), &mut canvas);
    drawer.draw(&[bottle()], &Anchor::new(FrameSize::new(320, 240), natural), &mut canvas);

    assert_eq!(canvas.size(), FrameSize::new(320, 240));
    assert_eq!(
        canvas.commands().first(),
        Some(&CanvasCommand::Resize {
            width: 320,
            height: 240
        })
    );
    assert_eq!(canvas.stroked_rects().len(), 1);
}

#[test]
fn zero_sized_anchor_clears_without_drawing() {
    let mut canvas = RecordingCanvas::new();
    let anchor = Anchor::new(FrameSize::new(0, 0), Some(FrameSize::new(0, 0)));
    let outcome = OverlayDrawer::default().draw(&[bottle()], &anchor, &mut canvas);
    assert_eq!(outcome, OverlayOutcome::Skipped);
    assert!(canvas.stroked_rects().is_empty());
    assert!(canvas.commands().contains(&CanvasCommand::Clear));
}

#[test]
fn missing_intrinsic_size_draws_unscaled() {
    let mut canvas = RecordingCanvas::new();
    let anchor = Anchor::new(FrameSize::new(400, 300), None);
    OverlayDrawer::default().draw(&[bottle()], &anchor, &mut canvas);
    assert_eq!(
        canvas.stroked_rects(),
        vec![Rect {
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 100.0
        }]
    );
}

#[test]
fn results_without_bbox_are_listed_but_not_drawn() {
    let mut canvas = RecordingCanvas::new();
    let anchor = Anchor::new(FrameSize::new(100, 100), Some(FrameSize::new(100, 100)));
    let results = [
        DetectionResult::new("Bag", 0.5),
        DetectionResult::new("Can", 0.8).with_bbox(0.0, 20.0, 10.0, 10.0),
    ];
    let outcome = OverlayDrawer::default().draw(&results, &anchor, &mut canvas);
    assert_eq!(outcome, OverlayOutcome::Drawn(1));
    assert_eq!(canvas.texts(), vec!["Can 80.0%"]);
}

#[test]
fn label_sits_above_the_box() {
    let mut canvas = RecordingCanvas::new();
    let anchor = Anchor::new(FrameSize::new(640, 480), Some(FrameSize::new(640, 480)));
    OverlayDrawer::default().draw(&[bottle()], &anchor, &mut canvas);
    let label = canvas.commands().iter().find_map(|command| match command {
        CanvasCommand::FillRect { rect, .. } => Some(*rect),
        _ => None,
    });
    let label = label.expect("label background");
    assert_eq!(label.x, 100.0);
    assert_eq!(label.y, 50.0 - 18.0);
    assert_eq!(label.height, 18.0);
    assert!(label.width > 10.0);
}

#[test]
fn surface_without_anchor_is_cleared_to_fallback() {
    let mut canvas = RecordingCanvas::new();
    let surface = OverlaySurface {
        anchor: None,
        canvas: &mut canvas,
        fallback: Some(FrameSize::new(50, 40)),
    };
    let outcome = OverlayDrawer::default().draw_on(&[bottle()], surface);
    assert_eq!(outcome, OverlayOutcome::Cleared);
    assert_eq!(canvas.size(), FrameSize::new(50, 40));
    assert!(canvas.stroked_rects().is_empty());
}

#[test]
fn raster_overlay_composites_onto_image() {
    let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255])));
    let natural = FrameSize::new(64, 64);
    let mut raster = RasterCanvas::new();
    OverlayDrawer::default().draw(
        &[DetectionResult::new("Can", 0.9).with_bbox(20.0, 30.0, 20.0, 20.0)],
        &Anchor::new(natural, Some(natural)),
        &mut raster,
    );
    let out = raster.composite_over(&base);
    assert_eq!(out.dimensions(), (64, 64));
    assert_eq!(out.get_pixel(20, 40), &Rgba([0, 255, 0, 255]));
    assert_eq!(out.get_pixel(60, 60), &Rgba([255, 255, 255, 255]));
}
