use easel::components::selection::SelectionState;
use easel::io::{InputEvent, Session};
use easel::{Color, EditorApp, EditorSettings, Modifiers};
use egui::pos2;

fn editor(width: u32, height: u32) -> EditorApp {
    let mut settings = EditorSettings::default();
    settings.width = width;
    settings.height = height;
    settings.pencil_color = Color::BLACK;
    EditorApp::new(settings).unwrap()
}

/// Park the pointer at `(x, y)` for a frame so the next stroke starts there.
fn hover(app: &mut EditorApp, x: f32, y: f32) {
    app.pointer_moved(pos2(x, y));
    app.frame(16.0);
}

fn click_fill(app: &mut EditorApp, x: f32, y: f32) {
    hover(app, x, y);
    app.pointer_pressed(pos2(x, y));
    app.frame(16.0);
    app.pointer_released(pos2(x, y));
}

#[test]
fn fill_whole_buffer_then_refill_is_a_no_op() {
    let mut app = editor(10, 10);
    assert!(app.select_instrument("Fill"));
    click_fill(&mut app, 5.0, 5.0);

    let black = app
        .content()
        .as_image()
        .pixels()
        .filter(|p| p.0 == [0, 0, 0, 255])
        .count();
    assert_eq!(black, 100);

    let generation = app.content().generation();
    let written = app.content().total_written();
    click_fill(&mut app, 5.0, 5.0);
    assert_eq!(app.content().generation(), generation);
    assert_eq!(app.content().total_written(), written);
}

#[test]
fn selection_lift_move_and_bake() {
    let mut app = editor(100, 100);

    app.select_instrument("Pencil");
    hover(&mut app, 40.0, 40.0);
    app.pointer_pressed(pos2(40.0, 40.0));
    app.frame(16.0);
    app.pointer_released(pos2(40.0, 40.0));
    assert_eq!(app.content().get(40.0, 40.0), Some(Color::BLACK));

    app.select_instrument("Select");
    app.pointer_pressed(pos2(10.0, 10.0));
    app.pointer_moved(pos2(70.0, 70.0));
    app.frame(16.0);
    app.pointer_released(pos2(70.0, 70.0));

    let sel = app.instrument().selection().unwrap();
    assert_eq!(sel.state(), SelectionState::Committed);
    assert_eq!(app.content().get(40.0, 40.0), Some(Color::WHITE));

    app.frame(16.0);
    assert_eq!(app.overlay().get(40.0, 40.0), Some(Color::BLACK));
    assert_eq!(app.composite().get_pixel(40, 40).0, [0, 0, 0, 255]);

    // Grab the middle and move by (10, 5).
    app.pointer_pressed(pos2(40.0, 40.0));
    app.pointer_moved(pos2(50.0, 45.0));
    app.pointer_released(pos2(50.0, 45.0));
    let sel = app.instrument().selection().unwrap();
    assert_eq!(sel.corners(), Some((pos2(20.0, 15.0), pos2(80.0, 75.0))));

    // Switching instruments bakes the floating image.
    app.select_instrument("Marker");
    assert_eq!(app.content().get(50.0, 45.0), Some(Color::BLACK));
    assert_eq!(app.content().get(40.0, 40.0), Some(Color::WHITE));
}

#[test]
fn zoom_keeps_the_point_under_the_cursor() {
    let mut app = editor(800, 600);
    app.set_modifiers(Modifiers { ctrl: true, ..Default::default() });
    let mouse = pos2(123.0, 77.0);
    for delta in [-240.0, -120.0, 360.0, -5000.0, 5000.0] {
        let before = app.viewport().to_buffer(mouse);
        app.wheel(delta, mouse);
        let after = app.viewport().to_buffer(mouse);
        assert!((after - before).length() < 1e-3);
        let (lo, hi) = app.viewport().zoom_range();
        assert!(app.viewport().zoom() >= lo && app.viewport().zoom() <= hi);
    }
}

#[test]
fn recorded_session_replays_identically() {
    let events = vec![
        InputEvent::SelectInstrument("Pencil".into()),
        InputEvent::PointerMoved { x: 2.0, y: 2.0 },
        InputEvent::Frame { elapsed_ms: 16.0 },
        InputEvent::PointerPressed { x: 2.0, y: 2.0 },
        InputEvent::PointerMoved { x: 12.0, y: 2.0 },
        InputEvent::Frame { elapsed_ms: 16.0 },
        InputEvent::PointerReleased { x: 12.0, y: 2.0 },
        InputEvent::SelectInstrument("Fill".into()),
        InputEvent::PointerMoved { x: 5.0, y: 10.0 },
        InputEvent::Frame { elapsed_ms: 16.0 },
        InputEvent::PointerPressed { x: 5.0, y: 10.0 },
        InputEvent::Frame { elapsed_ms: 16.0 },
        InputEvent::PointerReleased { x: 5.0, y: 10.0 },
    ];
    let path = std::env::temp_dir().join(format!("easel-flow-{}.bin", std::process::id()));
    Session::new(events).save(&path).unwrap();
    let session = Session::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let mut first = editor(20, 20);
    let mut second = editor(20, 20);
    let a = session.replay(&mut first);
    let b = session.replay(&mut second);
    assert_eq!(a, b);
    assert_eq!(a.events, 13);
    assert_eq!(a.flushes, 2);
    assert_eq!(first.content().get(7.0, 2.0), Some(Color::BLACK));
    assert_eq!(first.content().get(19.0, 19.0), Some(Color::BLACK));
}

#[test]
fn degenerate_selection_is_logged_and_dropped() {
    let mut app = editor(50, 50);
    app.select_instrument("Select");
    easel::logger::capture_start();
    app.pointer_pressed(pos2(20.0, 20.0));
    app.pointer_released(pos2(20.0, 20.0));
    let lines = easel::logger::capture_take();
    assert!(lines.iter().any(|l| l.contains("[INFO] selection discarded")));
    let sel = app.instrument().selection().unwrap();
    assert_eq!(sel.state(), SelectionState::Empty);
}
