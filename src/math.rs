use nalgebra::{Matrix4, Point3};

use crate::cube::Axis;

/// Sine and cosine of an angle in degrees.
///
/// Whole quarter turns are looked up instead of computed so that committed
/// twists map lattice positions onto each other without rounding drift.
pub fn sin_cos_degrees(degrees: f32) -> (f32, f32) {
    let turns = degrees / 90.0;
    if turns.fract() == 0.0 {
        match (turns as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        degrees.to_radians().sin_cos()
    }
}

/// Right-handed rotation about a world axis through the origin.
#[rustfmt::skip]
pub fn create_rotation(axis: Axis, degrees: f32) -> Matrix4<f32> {
    let (s, c) = sin_cos_degrees(degrees);
    match axis {
        Axis::X => Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   -s,  0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ),
        Axis::Y => Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
            -s,  0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ),
        Axis::Z => Matrix4::new(
            c,   -s,  0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ),
    }
}

/// Rotation about the line through `pivot` parallel to `axis`.
pub fn rotation_about(axis: Axis, pivot: &Point3<f32>, degrees: f32) -> Matrix4<f32> {
    let offset = pivot.coords;
    Matrix4::new_translation(&offset)
        * create_rotation(axis, degrees)
        * Matrix4::new_translation(&-offset)
}

/// Number of quarter turns nearest to `degrees`.
///
/// Exact half-way angles round away from zero, in the direction the drag was
/// moving.
pub fn snap_to_quarter_turns(degrees: f32) -> i32 {
    (degrees / 90.0).round() as i32
}
