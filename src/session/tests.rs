//! Scenario tests for the annotation session.

use super::*;
use crate::keybindings::KeyCode;
use crate::model::{FalsePositiveType, RectangleId};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn at(x: f64, y: f64) -> ScreenPoint {
    ScreenPoint::new(x, y)
}

fn key(code: KeyCode) -> EditorEvent {
    EditorEvent::Key(KeyChord::plain(code))
}

/// An 800x600 image in a 500x500 container: displayed at 500x375, 62.5px
/// from the top.
fn session() -> AnnotationSession {
    let mut session: AnnotationSession = AnnotationSession::default();
    session.apply(EditorEvent::Layout {
        container_offset: at(0.0, 0.0),
        container_width: 500.0,
        container_height: 500.0,
        natural_width: 800.0,
        natural_height: 600.0,
    });
    session
}

/// Draw a box from image (100, 100) to image (200, 200).
fn draw_box(session: &mut AnnotationSession) -> SessionResponse {
    if !session.drawing().draw_mode() {
        session.apply(key(KeyCode::D));
    }
    session.apply(EditorEvent::Click {
        position: at(100.0, 162.5),
    });
    session.apply(EditorEvent::Click {
        position: at(200.0, 262.5),
    })
}

#[test]
fn test_layout_fits_image() {
    let session = session();
    let bounds = session.image_bounds();
    assert!(approx_eq(bounds.width, 500.0));
    assert!(approx_eq(bounds.height, 375.0));
    assert!(approx_eq(bounds.x, 0.0));
    assert!(approx_eq(bounds.y, 62.5));
}

#[test]
fn test_two_clicks_commit_a_rectangle() {
    let mut session = session();
    let response = draw_box(&mut session);

    assert_eq!(response.click, Some(ClickOutcome::Committed(RectangleId(1))));
    assert!(response.rectangles_changed);
    assert_eq!(session.revision(), 1);

    let rect = &session.rectangles()[0];
    assert!(approx_eq(rect.xyxyn.x1, 0.2));
    assert!(approx_eq(rect.xyxyn.y1, 100.0 / 375.0));
    assert!(approx_eq(rect.xyxyn.x2, 0.4));
    assert!(approx_eq(rect.xyxyn.y2, 200.0 / 375.0));
    assert_eq!(session.drawing().selected(), Some(RectangleId(1)));
}

#[test]
fn test_preview_follows_pointer() {
    let mut session = session();
    session.apply(key(KeyCode::D));
    session.apply(EditorEvent::Click {
        position: at(100.0, 162.5),
    });
    let response = session.apply(EditorEvent::PointerMove {
        position: at(350.0, 162.5 + 150.0),
    });
    assert!(response.redraw);

    let preview = session.drawing_preview().unwrap();
    assert!(approx_eq(preview.x2, 0.7));
    assert!(approx_eq(preview.y2, 250.0 / 375.0));
}

#[test]
fn test_tiny_drawing_is_discarded_without_history() {
    let mut session = session();
    session.apply(key(KeyCode::D));
    session.apply(EditorEvent::Click {
        position: at(100.0, 162.5),
    });
    let response = session.apply(EditorEvent::Click {
        position: at(104.0, 166.5),
    });

    assert_eq!(response.click, Some(ClickOutcome::Discarded));
    assert!(!response.rectangles_changed);
    assert!(session.rectangles().is_empty());
    assert!(!session.drawing().can_undo());
}

#[test]
fn test_undo_shortcut_removes_rectangle() {
    let mut session = session();
    draw_box(&mut session);

    let response = session.apply(EditorEvent::Key(KeyChord::ctrl(KeyCode::Z)));
    assert!(response.rectangles_changed);
    assert!(session.rectangles().is_empty());

    // Nothing left to undo
    let response = session.apply(EditorEvent::Key(KeyChord::ctrl(KeyCode::Z)));
    assert!(!response.redraw);
}

#[test]
fn test_delete_removes_selection_then_everything() {
    let mut session = session();
    draw_box(&mut session);
    session.apply(EditorEvent::Click {
        position: at(300.0, 162.5),
    });
    session.apply(EditorEvent::Click {
        position: at(400.0, 262.5),
    });
    assert_eq!(session.rectangles().len(), 2);

    session.apply(key(KeyCode::Delete));
    assert_eq!(session.rectangles().len(), 1);
    assert_eq!(session.rectangles()[0].id, RectangleId(1));

    session.apply(key(KeyCode::Backspace));
    assert!(session.rectangles().is_empty());
}

#[test]
fn test_shortcuts_suppressed_in_text_input() {
    let mut session = session();
    session.apply(EditorEvent::SetTextInputFocus { focused: true });

    session.apply(key(KeyCode::D));
    assert!(!session.drawing().draw_mode());

    session.apply(EditorEvent::SetTextInputFocus { focused: false });
    session.apply(key(KeyCode::D));
    assert!(session.drawing().draw_mode());
}

#[test]
fn test_escape_stays_active_under_help_overlay() {
    let mut session = session();
    draw_box(&mut session);

    session.apply(key(KeyCode::H));
    assert!(session.is_help_open());

    session.apply(key(KeyCode::Delete));
    assert_eq!(session.rectangles().len(), 1);

    session.apply(key(KeyCode::Escape));
    assert!(!session.is_help_open());

    // Second escape clears the selection
    session.apply(key(KeyCode::Escape));
    assert_eq!(session.drawing().selected(), None);
}

#[test]
fn test_escape_cancels_drawing() {
    let mut session = session();
    session.apply(key(KeyCode::D));
    session.apply(EditorEvent::Click {
        position: at(100.0, 162.5),
    });
    assert!(session.drawing().is_drawing());

    session.apply(key(KeyCode::Escape));
    assert!(!session.drawing().is_drawing());
    assert!(session.drawing().draw_mode());
}

#[test]
fn test_submit_requires_labels_and_review() {
    let mut session = session();
    draw_box(&mut session);

    let response = session.apply(key(KeyCode::Enter));
    assert_eq!(
        response.submission,
        Some(Submission::Rejected(vec![
            ValidationError::IncompleteBoxes {
                remaining: 1,
                total: 1
            },
            ValidationError::MissingSecondaryReview,
        ]))
    );

    // Label 1 relabels the selected box
    let response = session.apply(key(KeyCode::Key1));
    assert!(response.rectangles_changed);
    assert_eq!(session.rectangles()[0].label, BoxLabel::smoke(SmokeType::Wildfire));
    assert_eq!(session.progress().percentage, 100);

    session.apply(EditorEvent::SetSecondaryReview {
        review: SecondaryReview::Completed {
            missed_smoke: false,
        },
    });
    let response = session.apply(key(KeyCode::Enter));
    let Some(Submission::Accepted(payload)) = response.submission else {
        panic!("expected accepted submission");
    };
    assert_eq!(payload.boxes.len(), 1);
    assert_eq!(payload.boxes[0].is_smoke, Some(true));
    assert_eq!(payload.has_missed_smoke, Some(false));
}

#[test]
fn test_active_label_applies_to_new_rectangles() {
    let mut session = session();
    session.select_label(2);
    draw_box(&mut session);
    assert_eq!(session.rectangles()[0].label, BoxLabel::smoke(SmokeType::Industrial));
    assert!(!session.select_label(7));
}

#[test]
fn test_import_predictions_skips_duplicates() {
    let mut session = session();
    let payload = SequenceAnnotation::from_json(
        r#"{"boxes":[{"xyxyn":[0.2,0.2,0.4,0.4],"is_smoke":true,"smoke_type":"wildfire"}]}"#,
    )
    .unwrap();
    session.load_payload(&payload).unwrap();

    session.apply(EditorEvent::SetPredictions {
        predictions: vec![
            Prediction::new(NormalizedBbox::new(0.21, 0.2, 0.4, 0.41)),
            Prediction::new(NormalizedBbox::new(0.6, 0.6, 0.8, 0.8)),
        ],
    });
    assert_eq!(session.importable_count(), 1);

    let response = session.apply(key(KeyCode::A));
    assert!(response.rectangles_changed);
    assert_eq!(session.rectangles().len(), 2);
    assert_eq!(session.rectangles()[1].label, BoxLabel::Unreviewed);
    assert_eq!(session.importable_count(), 0);

    // One import is one undo step
    session.apply(EditorEvent::Key(KeyChord::ctrl(KeyCode::Z)));
    assert_eq!(session.rectangles().len(), 1);
    assert!(!session.drawing().can_undo());
}

#[test]
fn test_wheel_zoom_then_pan_drag() {
    let mut session = session();
    let response = session.apply(EditorEvent::Wheel {
        position: at(250.0, 250.0),
        delta: -1.0,
    });
    assert!(response.redraw);
    assert!(approx_eq(session.transform().zoom_level, 1.2));

    session.apply(EditorEvent::PointerDown {
        position: at(250.0, 250.0),
    });
    let response = session.apply(EditorEvent::PointerMove {
        position: at(260.0, 255.0),
    });
    assert!(response.redraw);
    session.apply(EditorEvent::PointerUp);

    let pan = session.transform().pan_offset;
    assert!(approx_eq(pan.x, 10.0));
    assert!(approx_eq(pan.y, 5.0));

    // The click that ends a drag does not select or deselect
    let response = session.apply(EditorEvent::Click {
        position: at(260.0, 255.0),
    });
    assert_eq!(response.click, None);
}

#[test]
fn test_no_pan_while_drawing() {
    let mut session = session();
    session.apply(key(KeyCode::Equal));
    session.apply(key(KeyCode::D));

    session.apply(EditorEvent::PointerDown {
        position: at(250.0, 250.0),
    });
    session.apply(EditorEvent::PointerMove {
        position: at(270.0, 260.0),
    });
    assert!(approx_eq(session.transform().pan_offset.x, 0.0));
}

#[test]
fn test_reset_zoom_restores_identity() {
    let mut session = session();
    session.apply(key(KeyCode::Equal));
    session.apply(key(KeyCode::Plus));
    assert!(approx_eq(session.transform().zoom_level, 1.4));

    let response = session.apply(key(KeyCode::R));
    assert!(response.redraw);
    assert!(session.zoom().is_at_min_zoom());
    assert_eq!(session.transform().pan_offset, ScreenPoint::zero());
}

#[test]
fn test_screen_to_image_under_zoom_pan_and_offset() {
    let mut session: AnnotationSession = AnnotationSession::default();
    session.apply(EditorEvent::Layout {
        container_offset: at(40.0, 30.0),
        container_width: 500.0,
        container_height: 500.0,
        natural_width: 800.0,
        natural_height: 600.0,
    });

    // 1.2x around the image center, then pan by (10, 5)
    session.apply(key(KeyCode::Equal));
    session.apply(EditorEvent::PointerDown {
        position: at(300.0, 300.0),
    });
    session.apply(EditorEvent::PointerMove {
        position: at(310.0, 305.0),
    });
    session.apply(EditorEvent::PointerUp);
    assert!(approx_eq(session.transform().pan_offset.x, 10.0));

    // Image (100, 100) sits at container (100, 162.5); scaled about (250, 250)
    // to (70, 145), then shifted by the pan and the container offset.
    let image = session.screen_to_image(at(40.0 + 80.0, 30.0 + 150.0));
    assert!(approx_eq(image.x, 100.0));
    assert!(approx_eq(image.y, 100.0));
}

#[test]
fn test_container_resize_reclamps_pan() {
    let mut session = session();
    for _ in 0..5 {
        session.apply(key(KeyCode::Equal));
    }
    assert!(approx_eq(session.transform().zoom_level, 2.0));

    session.apply(EditorEvent::PointerDown {
        position: at(250.0, 250.0),
    });
    session.apply(EditorEvent::PointerMove {
        position: at(750.0, 250.0),
    });
    session.apply(EditorEvent::PointerUp);
    assert!(approx_eq(session.transform().pan_offset.x, 250.0));

    // Same image in a 200x200 container: displayed 200x150, max pan 100
    session.apply(EditorEvent::Layout {
        container_offset: at(0.0, 0.0),
        container_width: 200.0,
        container_height: 200.0,
        natural_width: 800.0,
        natural_height: 600.0,
    });
    assert!(approx_eq(session.transform().zoom_level, 2.0));
    assert!(approx_eq(session.transform().pan_offset.x, 100.0));
}

#[test]
fn test_key_between_drag_and_click_keeps_click() {
    let mut session = session();
    session.apply(key(KeyCode::Equal));
    session.apply(EditorEvent::PointerDown {
        position: at(250.0, 250.0),
    });
    session.apply(EditorEvent::PointerMove {
        position: at(260.0, 255.0),
    });
    session.apply(EditorEvent::PointerUp);

    session.apply(key(KeyCode::Escape));
    let response = session.apply(EditorEvent::Click {
        position: at(260.0, 255.0),
    });
    assert!(response.click.is_some());
}

#[test]
fn test_new_image_resets_view() {
    let mut session = session();
    session.apply(key(KeyCode::Equal));
    session.apply(EditorEvent::Layout {
        container_offset: at(0.0, 0.0),
        container_width: 500.0,
        container_height: 500.0,
        natural_width: 1000.0,
        natural_height: 800.0,
    });
    assert!(session.zoom().is_at_min_zoom());
}

#[test]
fn test_load_payload_rejects_invalid_boxes() {
    let mut session = session();
    draw_box(&mut session);
    let payload = SequenceAnnotation::from_json(
        r#"{"boxes":[{"xyxyn":[0.5,0.5,0.1,0.1],"is_smoke":false,"false_positive_types":["sky"]}]}"#,
    )
    .unwrap();

    assert!(session.load_payload(&payload).is_err());
    assert_eq!(session.rectangles().len(), 1);
}

#[test]
fn test_payload_round_trip_through_session() {
    let mut session = session();
    draw_box(&mut session);
    session.set_active_label(BoxLabel::false_positive([FalsePositiveType::Dust]));
    let payload = session.to_payload();

    let mut other: AnnotationSession = AnnotationSession::default();
    assert_eq!(other.load_payload(&payload).unwrap(), 1);
    assert_eq!(other.rectangles()[0].label, session.rectangles()[0].label);
    assert!(!other.drawing().can_undo());
}

#[test]
fn test_events_deserialize_from_json() {
    let events: Vec<EditorEvent> = serde_json::from_str(
        r#"[
            {"type":"key","key":"Z","ctrl":true},
            {"type":"click","position":{"x":1.0,"y":2.0}},
            {"type":"pointer_up"},
            {"type":"set_secondary_review","review":{"completed":{"missed_smoke":true}}}
        ]"#,
    )
    .unwrap();
    assert_eq!(events[0], EditorEvent::Key(KeyChord::ctrl(KeyCode::Z)));
    assert_eq!(events[1], EditorEvent::Click { position: at(1.0, 2.0) });
    assert_eq!(events[2], EditorEvent::PointerUp);
}
