//! End-to-end editing flows through the `Editor` facade.

use kurbo::{Point, Vec2};
use reportink_core::{
    Alignment, Distribution, Document, Editor, EditorConfig, EditorEvent, Element, ElementId, ElementKind, Geometry,
    HandleKind, Instant, Modifiers, MouseButton, PointerEvent, SizeMatch, SnapMode,
};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Element {
    Element::new(ElementKind::Rectangle, Geometry::new(x, y, w, h))
}

fn assert_origin(editor: &Editor, id: ElementId, x: f64, y: f64) {
    let origin = editor.element(id).expect("element present").geometry().origin();
    assert!((origin.x - x).abs() < 1e-9 && (origin.y - y).abs() < 1e-9, "origin was {origin:?}");
}

#[test]
fn test_add_move_undo_redo() {
    init_logging();
    let mut editor = Editor::new(Document::new());

    let e1 = editor.add_element(rect(50.0, 50.0, 100.0, 30.0)).unwrap();
    editor.begin_drag(Point::new(60.0, 60.0), e1).unwrap();
    editor.update_drag(Point::new(90.0, 90.0));
    assert!(editor.end_drag());
    assert_origin(&editor, e1, 80.0, 80.0);

    assert!(editor.undo());
    assert_origin(&editor, e1, 50.0, 50.0);
    assert!(editor.undo());
    assert!(editor.element(e1).is_none());
    assert!(!editor.can_undo());

    assert!(editor.redo());
    assert!(editor.redo());
    assert_origin(&editor, e1, 80.0, 80.0);
    assert!(!editor.can_redo());
}

#[test]
fn test_history_is_bounded() {
    init_logging();
    let mut editor = Editor::new(Document::new());
    for i in 0..51 {
        editor.add_element(rect(f64::from(i), 0.0, 20.0, 20.0)).unwrap();
    }
    assert_eq!(editor.history().undo_depth(), 50);

    while editor.undo() {}
    // The oldest add fell off the stack.
    assert_eq!(editor.store().len(), 1);
}

#[test]
fn test_new_command_clears_redo() {
    init_logging();
    let mut editor = Editor::new(Document::new());
    let a = editor.add_element(rect(10.0, 10.0, 20.0, 20.0)).unwrap();
    editor.set_name(a, "Header").unwrap();
    editor.undo();
    assert!(editor.can_redo());
    assert_eq!(editor.redo_description(), Some("Rename element"));

    editor.add_element(rect(50.0, 10.0, 20.0, 20.0)).unwrap();
    assert!(!editor.can_redo());
}

#[test]
fn test_box_selection_scenario() {
    init_logging();
    let mut editor = Editor::new(Document::new());
    let a = editor.add_element(rect(0.0, 0.0, 50.0, 50.0)).unwrap();
    let b = editor.add_element(rect(100.0, 100.0, 50.0, 50.0)).unwrap();
    editor.drain_events();

    assert!(editor.start_box_selection(Point::new(0.0, 0.0), Modifiers::NONE));
    editor.update_box_selection(Point::new(60.0, 60.0));
    assert_eq!(editor.selection(), &[a]);
    editor.update_box_selection(Point::new(160.0, 160.0));
    assert_eq!(editor.selection(), &[a, b]);
    editor.update_box_selection(Point::new(10.0, 10.0));
    assert_eq!(editor.selection(), &[a]);

    // Nothing is announced until the gesture ends.
    assert!(editor.drain_events().is_empty());
    assert!(editor.end_box_selection());
    assert_eq!(editor.drain_events(), vec![EditorEvent::SelectionChanged(vec![a])]);
}

#[test]
fn test_viewport_virtualization() {
    init_logging();
    let config = EditorConfig {
        viewport_buffer: 50.0,
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(Document::new(), config).unwrap();
    let near = editor.add_element(rect(10.0, 10.0, 20.0, 20.0)).unwrap();
    let far = editor.add_element(rect(180.0, 250.0, 20.0, 20.0)).unwrap();
    assert_eq!(editor.realized(), &[near, far]);
    editor.drain_events();

    let start = Instant::now();
    editor.set_viewport(Geometry::new(0.0, 0.0, 100.0, 100.0), start);
    assert_eq!(editor.realized(), &[near]);
    assert_eq!(
        editor.drain_events(),
        vec![EditorEvent::ElementsRealized {
            added: vec![],
            removed: vec![far],
            updated: vec![near],
        }]
    );

    // Scrolling again within the same frame is deferred.
    editor.set_viewport(Geometry::new(150.0, 200.0, 100.0, 100.0), start + Duration::from_millis(1));
    assert_eq!(editor.realized(), &[near]);
    assert!(!editor.tick(start + Duration::from_millis(5)));
    assert!(editor.tick(start + Duration::from_millis(16)));
    assert_eq!(editor.realized(), &[far]);
}

#[test]
fn test_pointer_drag_box_and_resize() {
    init_logging();
    let mut editor = Editor::new(Document::new());
    let id = editor.add_element(rect(50.0, 30.0, 40.0, 20.0)).unwrap();
    let screen = |editor: &Editor, x: f64, y: f64| editor.camera().world_to_screen(Point::new(x, y));

    // Press on the element selects and drags it.
    let down = screen(&editor, 60.0, 40.0);
    assert!(editor.handle_pointer(PointerEvent::Down {
        position: down,
        button: MouseButton::Left,
        modifiers: Modifiers::NONE,
    }));
    assert_eq!(editor.selection(), &[id]);
    let to = screen(&editor, 100.0, 40.0);
    assert!(editor.handle_pointer(PointerEvent::Move { position: to }));
    assert!(editor.handle_pointer(PointerEvent::Up {
        position: to,
        button: MouseButton::Left,
    }));
    assert_origin(&editor, id, 90.0, 30.0);
    assert_eq!(editor.undo_description(), Some("Move Rectangle"));

    // Press on the bottom-right handle resizes.
    let handle = screen(&editor, 130.0, 50.0);
    editor.handle_pointer(PointerEvent::Down {
        position: handle,
        button: MouseButton::Left,
        modifiers: Modifiers::NONE,
    });
    let to = screen(&editor, 140.0, 60.0);
    editor.handle_pointer(PointerEvent::Move { position: to });
    editor.handle_pointer(PointerEvent::Up {
        position: to,
        button: MouseButton::Left,
    });
    let geometry = editor.element(id).unwrap().geometry();
    assert!((geometry.width - 50.0).abs() < 1e-9);
    assert!((geometry.height - 30.0).abs() < 1e-9);
    assert_eq!(editor.undo_description(), Some("Resize Rectangle"));

    // A box drawn from empty page selects what it touches.
    editor.clear_selection();
    let empty = screen(&editor, 180.0, 150.0);
    editor.handle_pointer(PointerEvent::Down {
        position: empty,
        button: MouseButton::Left,
        modifiers: Modifiers::NONE,
    });
    assert!(editor.selection_box().is_some());
    let corner = screen(&editor, 80.0, 20.0);
    editor.handle_pointer(PointerEvent::Move { position: corner });
    editor.handle_pointer(PointerEvent::Up {
        position: corner,
        button: MouseButton::Left,
    });
    assert_eq!(editor.selection(), &[id]);
    assert!(editor.selection_box().is_none());
}

#[test]
fn test_element_snapping_during_drag() {
    init_logging();
    let config = EditorConfig {
        snap_mode: SnapMode::Elements,
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(Document::new(), config).unwrap();
    let target = editor.add_element(rect(100.0, 10.0, 40.0, 20.0)).unwrap();
    let moving = editor.add_element(rect(10.0, 60.0, 40.0, 20.0)).unwrap();

    editor.begin_drag(Point::new(20.0, 70.0), moving).unwrap();
    // Left edge lands 2 units from the target's left edge.
    editor.update_drag(Point::new(108.0, 70.0));
    assert_origin(&editor, moving, 100.0, 60.0);
    assert!(!editor.snap_guides().is_empty());

    editor.end_drag();
    assert!(editor.snap_guides().is_empty());
    assert_origin(&editor, target, 100.0, 10.0);
}

#[test]
fn test_document_survives_json() {
    init_logging();
    let mut editor = Editor::new(Document::new());
    let id = editor
        .add_element(rect(10.0, 10.0, 30.0, 30.0).with_property("font", "Arial"))
        .unwrap();
    editor.set_value(id, Some(serde_json::json!(42))).unwrap();

    let json = editor.document().to_json().unwrap();
    let restored = Document::from_json(&json).unwrap();
    assert_eq!(restored, editor.document());

    editor.load_document(restored);
    assert!(!editor.can_undo());
    assert!(editor.selection().is_empty());
    assert_eq!(editor.realized(), &[id]);
}

#[test]
fn test_mixed_operations_undo_redo_round_trip() {
    init_logging();
    let config = EditorConfig {
        snap_mode: SnapMode::None,
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(Document::new(), config).unwrap();
    let a = editor.add_element(rect(10.0, 10.0, 30.0, 20.0)).unwrap();
    let b = editor.add_element(rect(40.0, 50.0, 20.0, 20.0)).unwrap();
    let c = editor.add_element(rect(70.0, 120.0, 40.0, 30.0)).unwrap();
    let before: Vec<Element> = editor.elements().to_vec();
    let depth = editor.history().undo_depth();

    editor.set_selection(&[a, b, c]);
    assert!(editor.align_selected(Alignment::Left));
    assert!(editor.distribute_selected(Distribution::Vertical));
    assert!(editor.match_size_selected(SizeMatch::Both));
    assert!(editor.bring_to_front(&[a]).unwrap());
    editor.set_property(b, "font", serde_json::json!("Arial")).unwrap();

    let corner = editor.element(c).unwrap().geometry();
    editor
        .begin_resize(Point::new(corner.right(), corner.bottom()), c, HandleKind::BottomRight)
        .unwrap();
    editor.update_resize(Point::new(corner.right() + 10.0, corner.bottom() + 10.0));
    assert!(editor.end_resize());

    assert!(editor.nudge_selected(Vec2::new(1.0, 0.0), false));
    assert_eq!(editor.clone_elements(&[b]).unwrap().len(), 1);
    assert_eq!(editor.remove_elements(&[a]).unwrap(), 1);

    let operations = editor.history().undo_depth() - depth;
    assert_eq!(operations, 9);
    let after: Vec<Element> = editor.elements().to_vec();

    for _ in 0..operations {
        assert!(editor.undo());
    }
    assert_eq!(editor.elements(), before.as_slice());

    for _ in 0..operations {
        assert!(editor.redo());
    }
    assert_eq!(editor.elements(), after.as_slice());
}

#[test]
fn test_additive_box_never_removes() {
    init_logging();
    let mut editor = Editor::new(Document::new());
    let a = editor.add_element(rect(0.0, 0.0, 50.0, 50.0)).unwrap();
    let b = editor.add_element(rect(100.0, 100.0, 50.0, 50.0)).unwrap();
    editor.set_selection(&[b]);
    editor.drain_events();

    editor.start_box_selection(Point::new(-5.0, -5.0), Modifiers::ctrl());
    editor.update_box_selection(Point::new(20.0, 20.0));
    assert_eq!(editor.selection(), &[b, a]);
    editor.update_box_selection(Point::new(-4.0, 30.0));
    assert_eq!(editor.selection(), &[b, a]);

    editor.end_box_selection();
    assert_eq!(editor.drain_events(), vec![EditorEvent::SelectionChanged(vec![b, a])]);
}

#[test]
fn test_plain_box_shrunk_to_click_size_selects_nothing() {
    init_logging();
    let mut editor = Editor::new(Document::new());
    let a = editor.add_element(rect(0.0, 0.0, 50.0, 50.0)).unwrap();
    editor.drain_events();

    editor.start_box_selection(Point::new(55.0, 55.0), Modifiers::NONE);
    editor.update_box_selection(Point::new(10.0, 10.0));
    assert_eq!(editor.selection(), &[a]);
    editor.update_box_selection(Point::new(56.0, 56.0));
    assert!(editor.selection().is_empty());

    editor.end_box_selection();
    assert_eq!(editor.drain_events(), vec![EditorEvent::SelectionChanged(vec![])]);
}

#[test]
fn test_resize_against_page_edge_keeps_anchor() {
    init_logging();
    let config = EditorConfig {
        snap_mode: SnapMode::None,
        ..EditorConfig::default()
    };
    let mut editor = Editor::with_config(Document::new(), config).unwrap();
    let page = editor.document().display_size();
    let id = editor.add_element(rect(150.0, 250.0, 40.0, 30.0)).unwrap();

    editor
        .begin_resize(Point::new(190.0, 280.0), id, HandleKind::BottomRight)
        .unwrap();
    editor.update_resize(Point::new(400.0, 400.0));
    assert!(editor.end_resize());

    let geometry = editor.element(id).unwrap().geometry();
    assert_origin(&editor, id, 150.0, 250.0);
    assert!((geometry.right() - page.width).abs() < 1e-9);
    assert!((geometry.bottom() - page.height).abs() < 1e-9);
}
