//! Sub-cube data structures and geometry.
//!
//! This module defines the identity types shared by the whole crate (axes,
//! faces, face textures) and the [`Cell`], one unit cube of the puzzle
//! lattice together with its ray intersection test.

use std::fmt;

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::ray_casting::{HitRecord, Ray, Triangle};

/// World axis, used both as a rotation axis and as a face direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis in a vector.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit_vector(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
        }
    }
}

/// Direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Neg,
    Pos,
}

impl Sign {
    pub fn to_f32(self) -> f32 {
        match self {
            Sign::Neg => -1.0,
            Sign::Pos => 1.0,
        }
    }
}

/// One of the six faces of a cube, identified by its outward normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub axis: Axis,
    pub sign: Sign,
}

impl Face {
    pub const BACK: Face = Face::new(Axis::Z, Sign::Neg);
    pub const FRONT: Face = Face::new(Axis::Z, Sign::Pos);
    pub const LEFT: Face = Face::new(Axis::X, Sign::Neg);
    pub const RIGHT: Face = Face::new(Axis::X, Sign::Pos);
    pub const BOTTOM: Face = Face::new(Axis::Y, Sign::Neg);
    pub const TOP: Face = Face::new(Axis::Y, Sign::Pos);

    /// Faces in vertex-buffer order; see [`CUBE_VERTICES`].
    pub const ALL: [Face; 6] = [
        Face::BACK,
        Face::FRONT,
        Face::LEFT,
        Face::RIGHT,
        Face::BOTTOM,
        Face::TOP,
    ];

    pub const fn new(axis: Axis, sign: Sign) -> Self {
        Self { axis, sign }
    }

    /// Position of this face in [`Face::ALL`].
    pub fn index(self) -> usize {
        let offset = match self.sign {
            Sign::Neg => 0,
            Sign::Pos => 1,
        };
        match self.axis {
            Axis::Z => offset,
            Axis::X => 2 + offset,
            Axis::Y => 4 + offset,
        }
    }

    pub fn normal(self) -> Vector3<f32> {
        self.axis.unit_vector() * self.sign.to_f32()
    }

    /// Face whose normal is closest to `normal`.
    pub fn from_normal(normal: &Vector3<f32>) -> Self {
        let axis = Axis::ALL
            .into_iter()
            .max_by(|a, b| normal[a.index()].abs().total_cmp(&normal[b.index()].abs()))
            .unwrap_or(Axis::X);
        let sign = if normal[axis.index()] < 0.0 {
            Sign::Neg
        } else {
            Sign::Pos
        };
        Self { axis, sign }
    }

    /// Rotation axes a drag on this face can select.
    ///
    /// Turning about the face's own normal would spin the face in place, so
    /// only the two in-plane axes are offered.
    pub fn candidate_axes(self) -> &'static [Axis] {
        match self.axis {
            Axis::X => &[Axis::Y, Axis::Z],
            Axis::Y => &[Axis::X, Axis::Z],
            Axis::Z => &[Axis::X, Axis::Y],
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match (self.axis, self.sign) {
            (Axis::Z, Sign::Neg) => "back",
            (Axis::Z, Sign::Pos) => "front",
            (Axis::X, Sign::Neg) => "left",
            (Axis::X, Sign::Pos) => "right",
            (Axis::Y, Sign::Neg) => "bottom",
            (Axis::Y, Sign::Pos) => "top",
        };
        write!(f, "{name}")
    }
}

/// Texture drawn on one face of a cell.
///
/// Interior faces stay [`FaceTexture::Blank`]; each outer face of the puzzle
/// has its own color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaceTexture {
    #[default]
    Blank,
    White,
    Yellow,
    Red,
    Orange,
    Blue,
    Green,
}

impl FaceTexture {
    /// Color of the outer face of the puzzle that points along `face`.
    pub fn for_outer_face(face: Face) -> Self {
        match (face.axis, face.sign) {
            (Axis::Z, Sign::Pos) => FaceTexture::Green,
            (Axis::Z, Sign::Neg) => FaceTexture::Blue,
            (Axis::X, Sign::Neg) => FaceTexture::Orange,
            (Axis::X, Sign::Pos) => FaceTexture::Red,
            (Axis::Y, Sign::Pos) => FaceTexture::White,
            (Axis::Y, Sign::Neg) => FaceTexture::Yellow,
        }
    }
}

impl From<FaceTexture> for Vector4<f32> {
    fn from(texture: FaceTexture) -> Self {
        match texture {
            FaceTexture::Blank => Vector4::new(0.05, 0.05, 0.05, 1.0),
            FaceTexture::White => Vector4::new(1.0, 1.0, 1.0, 1.0),
            FaceTexture::Yellow => Vector4::new(1.0, 1.0, 0.0, 1.0),
            FaceTexture::Red => Vector4::new(1.0, 0.0, 0.0, 1.0),
            FaceTexture::Orange => Vector4::new(1.0, 0.5, 0.0, 1.0),
            FaceTexture::Blue => Vector4::new(0.1, 0.1, 1.0, 1.0),
            FaceTexture::Green => Vector4::new(0.0, 1.0, 0.0, 1.0),
        }
    }
}

/// 36 vertices for a unit cube centered on the origin (6 faces × 2 triangles).
///
/// Faces follow [`Face::ALL`]. Each face is `a b c` then `c d a`, wound
/// counter-clockwise when seen from outside so the first triangle's normal
/// points outward.
#[rustfmt::skip]
pub const CUBE_VERTICES: [[f32; 3]; 36] = [
    // Back face
    [-0.5, -0.5, -0.5],
    [-0.5,  0.5, -0.5],
    [ 0.5,  0.5, -0.5],
    [ 0.5,  0.5, -0.5],
    [ 0.5, -0.5, -0.5],
    [-0.5, -0.5, -0.5],
    // Front face
    [-0.5, -0.5,  0.5],
    [ 0.5, -0.5,  0.5],
    [ 0.5,  0.5,  0.5],
    [ 0.5,  0.5,  0.5],
    [-0.5,  0.5,  0.5],
    [-0.5, -0.5,  0.5],
    // Left face
    [-0.5, -0.5, -0.5],
    [-0.5, -0.5,  0.5],
    [-0.5,  0.5,  0.5],
    [-0.5,  0.5,  0.5],
    [-0.5,  0.5, -0.5],
    [-0.5, -0.5, -0.5],
    // Right face
    [ 0.5, -0.5,  0.5],
    [ 0.5, -0.5, -0.5],
    [ 0.5,  0.5, -0.5],
    [ 0.5,  0.5, -0.5],
    [ 0.5,  0.5,  0.5],
    [ 0.5, -0.5,  0.5],
    // Bottom face
    [-0.5, -0.5, -0.5],
    [ 0.5, -0.5, -0.5],
    [ 0.5, -0.5,  0.5],
    [ 0.5, -0.5,  0.5],
    [-0.5, -0.5,  0.5],
    [-0.5, -0.5, -0.5],
    // Top face
    [-0.5,  0.5, -0.5],
    [-0.5,  0.5,  0.5],
    [ 0.5,  0.5,  0.5],
    [ 0.5,  0.5,  0.5],
    [ 0.5,  0.5, -0.5],
    [-0.5,  0.5, -0.5],
];

/// The two local-space triangles covering `face` of the unit cube.
pub fn face_triangles(face: Face) -> [Triangle; 2] {
    let base = face.index() * 6;
    let vertex = |i: usize| Point3::from(CUBE_VERTICES[base + i]);
    [
        Triangle::new(vertex(0), vertex(1), vertex(2)),
        Triangle::new(vertex(3), vertex(4), vertex(5)),
    ]
}

/// One unit sub-cube of the puzzle lattice.
///
/// The face textures are fixed at construction; only the transform changes
/// as the puzzle is turned.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    index: usize,
    transform: Matrix4<f32>,
    face_textures: [FaceTexture; 6],
}

impl Cell {
    pub fn new(index: usize, transform: Matrix4<f32>, face_textures: [FaceTexture; 6]) -> Self {
        Self {
            index,
            transform,
            face_textures,
        }
    }

    /// Position of this cell in the grid's flattened lattice.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Model matrix: lattice translation, cell scale, and every committed turn.
    pub fn transform(&self) -> &Matrix4<f32> {
        &self.transform
    }

    /// Textures indexed like [`Face::ALL`].
    pub fn face_textures(&self) -> &[FaceTexture; 6] {
        &self.face_textures
    }

    pub fn face_texture(&self, face: Face) -> FaceTexture {
        self.face_textures[face.index()]
    }

    /// Current world-space center.
    pub fn center(&self) -> Point3<f32> {
        self.transform.transform_point(&Point3::origin())
    }

    /// Nearest intersection of `ray` with this cell inside `[t_min, t_max]`.
    ///
    /// Each face is tested as two triangles; the upper bound shrinks with
    /// every hit so farther faces cannot replace a nearer one.
    pub fn hit(
        &self,
        ray: &Ray,
        t_min: f32,
        mut t_max: f32,
        parallel_epsilon: f32,
    ) -> Option<HitRecord> {
        let mut record = None;

        for face in Face::ALL {
            let [first, second] = face_triangles(face);
            let first = first.transformed(&self.transform);
            let Some((t, normal)) = first.plane_intersection(ray, t_min, t_max, parallel_epsilon)
            else {
                continue;
            };
            let point = ray.at(t);
            if !first.inside(&point) && !second.transformed(&self.transform).inside(&point) {
                continue;
            }
            t_max = t;
            record = Some(HitRecord {
                t,
                point,
                normal,
                cell: self.index,
            });
        }

        record
    }

    /// Composes a world-space transform on the left of the current one.
    pub fn apply(&mut self, rotation: &Matrix4<f32>) {
        self.transform = rotation * self.transform;
    }
}
