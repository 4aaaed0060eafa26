use approx::assert_relative_eq;
use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

use magic_cube::grid::lattice_position;
use magic_cube::{
    Axis, Config, Error, GestureMode, GesturePhase, InteractionSession, Layer, Twist,
};

/// Center of the right face of the middle cell of a rank-3 grid.
fn right_face_middle() -> Point3<f32> {
    Point3::new(1.5, 0.75, -0.75)
}

fn transforms(session: &InteractionSession) -> Vec<Matrix4<f32>> {
    session
        .grid()
        .cells()
        .iter()
        .map(|cell| *cell.transform())
        .collect()
}

fn screen(session: &InteractionSession, point: &Point3<f32>) -> Point2<f32> {
    session
        .world_to_screen(point)
        .expect("point should be in front of the camera")
}

/// Screen direction in which `point` moves when displaced along `motion`.
fn screen_direction(
    session: &InteractionSession,
    point: &Point3<f32>,
    motion: Vector3<f32>,
) -> Vector2<f32> {
    let moved = point + motion * 1e-2;
    (screen(session, &moved) - screen(session, point)).normalize()
}

/// Pixels of drag along a locked direction that accumulate `degrees`.
fn pixels_for(session: &InteractionSession, degrees: f32) -> f32 {
    let viewport = session.viewport();
    degrees * (viewport.x + viewport.y) / session.config().drag_gain
}

/// Presses on the right face of the middle cell and drags so that the
/// middle Y layer accumulates `degrees`.
fn drag_middle_layer(session: &mut InteractionSession, degrees: f32) {
    let anchor = right_face_middle();
    let press = screen(session, &anchor);
    // A positive turn about Y carries the +X face towards -Z.
    let direction = screen_direction(session, &anchor, -Vector3::z());
    let release = press + direction * pixels_for(session, degrees);

    session.pointer_down(press.x, press.y);
    session.pointer_move(release.x, release.y);
}

fn assert_only_middle_y_layer_turned(
    session: &InteractionSession,
    before: &[Matrix4<f32>],
    degrees: f32,
) {
    let rotation = session.grid().rotation(Axis::Y, degrees);
    let mut turned = 0;
    for (cell, before) in session.grid().cells().iter().zip(before) {
        let (layer, _, _) = lattice_position(3, cell.index());
        if layer == 1 {
            turned += 1;
            assert_relative_eq!(*cell.transform(), rotation * before, epsilon = 1e-6);
        } else {
            assert_eq!(cell.transform(), before, "cell {} moved", cell.index());
        }
    }
    assert_eq!(turned, 9);
}

#[test]
fn dragging_the_right_face_turns_the_middle_layer() {
    let mut session = InteractionSession::default();
    let before = transforms(&session);

    drag_middle_layer(&mut session, 95.0);
    let gesture = session.gesture();
    assert!(matches!(gesture.mode(), Some(GestureMode::Local { .. })));
    assert_eq!(gesture.axis(), Some(Axis::Y));
    assert_eq!(gesture.layer(), Some(Layer::Index(1)));
    assert_relative_eq!(gesture.angle(), 95.0, epsilon = 0.5);

    let twist = session.pointer_up();
    assert_eq!(
        twist,
        Some(Twist {
            axis: Axis::Y,
            layer: Layer::Index(1),
            quarter_turns: 1,
        })
    );
    assert_eq!(session.gesture().phase(), GesturePhase::Idle);
    assert_only_middle_y_layer_turned(&session, &before, 90.0);
}

#[test]
fn drag_directions_follow_the_camera() {
    let mut session = InteractionSession::default();
    session.orbit(-40.0, 10.0);
    let before = transforms(&session);

    drag_middle_layer(&mut session, 170.0);
    assert_eq!(session.gesture().axis(), Some(Axis::Y));
    assert_eq!(session.pointer_up().map(|t| t.quarter_turns), Some(2));
    assert_only_middle_y_layer_turned(&session, &before, 180.0);
}

#[test]
fn short_drags_snap_back() {
    let mut session = InteractionSession::default();
    let before = transforms(&session);

    drag_middle_layer(&mut session, 37.0);
    assert_eq!(session.pointer_up(), None);
    assert_eq!(transforms(&session), before);
}

#[test]
fn reverse_drags_turn_the_other_way() {
    let mut session = InteractionSession::default();
    let before = transforms(&session);

    drag_middle_layer(&mut session, -100.0);
    assert_eq!(session.pointer_up().map(|t| t.quarter_turns), Some(-1));
    assert_only_middle_y_layer_turned(&session, &before, -90.0);
}

#[test]
fn preview_moves_only_the_dragged_layer() {
    let mut session = InteractionSession::default();
    let before = transforms(&session);

    drag_middle_layer(&mut session, 30.0);
    let rotation = session.grid().rotation(Axis::Y, session.gesture().angle());
    for (instance, cell) in session.cell_instances().iter().zip(session.grid().cells()) {
        let (layer, _, _) = lattice_position(3, cell.index());
        if layer == 1 {
            assert_relative_eq!(instance.model, rotation * cell.transform());
        } else {
            assert_eq!(&instance.model, cell.transform());
        }
    }
    // Nothing is committed while dragging.
    assert_eq!(transforms(&session), before);
}

#[test]
fn dragging_beside_the_grid_turns_everything() {
    let mut session = InteractionSession::default();
    let before = transforms(&session);

    session.pointer_down(20.0, 20.0);
    assert_eq!(session.gesture().mode(), Some(&GestureMode::Global));
    session.pointer_move(20.0, 20.0 + pixels_for(&session, 200.0));
    assert_eq!(session.gesture().layer(), Some(Layer::All));

    let twist = session.pointer_up().expect("a whole-grid twist");
    assert_eq!(twist.layer, Layer::All);
    let rotation = session.grid().rotation(twist.axis, twist.degrees());
    for (cell, before) in session.grid().cells().iter().zip(&before) {
        assert_relative_eq!(*cell.transform(), rotation * before, epsilon = 1e-6);
    }
}

#[test]
fn canceled_gestures_commit_nothing() {
    let mut session = InteractionSession::default();
    let before = transforms(&session);

    drag_middle_layer(&mut session, 120.0);
    session.pointer_cancel();
    assert_eq!(session.gesture().phase(), GesturePhase::Idle);
    assert_eq!(session.pointer_up(), None);
    assert_eq!(transforms(&session), before);
}

#[test]
fn invalid_rank_keeps_the_grid() {
    let mut session = InteractionSession::default();
    drag_middle_layer(&mut session, 95.0);
    session.pointer_up();
    let before = transforms(&session);

    assert_eq!(session.set_grid_rank(7), Err(Error::InvalidRank { rank: 7 }));
    assert_eq!(session.set_grid_rank(1), Err(Error::InvalidRank { rank: 1 }));
    assert_eq!(session.grid().rank().get(), 3);
    assert_eq!(transforms(&session), before);
}

#[test]
fn changing_rank_rebuilds_a_solved_grid() {
    let mut session = InteractionSession::default();
    drag_middle_layer(&mut session, 60.0);

    session.set_grid_rank(5).unwrap();
    assert_eq!(session.grid().rank().get(), 5);
    assert_eq!(session.grid().cells().len(), 125);
    assert_eq!(session.gesture().phase(), GesturePhase::Idle);
    let fresh = InteractionSession::new(Config {
        rank: session.grid().rank(),
        ..Config::default()
    })
    .unwrap();
    assert_eq!(transforms(&session), transforms(&fresh));
}

#[test]
fn viewport_size_scales_the_drag_gain() {
    let mut small = InteractionSession::default();
    let mut large = InteractionSession::default();
    large.set_viewport(1600.0, 1200.0);

    drag_middle_layer(&mut small, 95.0);
    drag_middle_layer(&mut large, 95.0);
    assert_relative_eq!(
        small.gesture().angle(),
        large.gesture().angle(),
        epsilon = 0.5
    );
}
