//! The puzzle grid: `rank³` cells laid out on a lattice.
//!
//! The lattice spans `[0, length]` along X and Y and `[-length, 0]` along Z,
//! so rows grow away from the viewer. Cell `(layer, row, col)` rests at
//! `(col + ½, layer + ½, -(row + ½)) * cell_length`. The rest positions never
//! change; turns only accumulate in each cell's transform, and layer
//! membership is recomputed from the current transformed centers.

use std::fmt;

use log::{debug, info};
use nalgebra::{Matrix4, Point3, Vector3};

use crate::cube::{Axis, Cell, Face, FaceTexture};
use crate::error::Error;
use crate::math;
use crate::ray_casting::{AABB, HitRecord, Ray, ray_aabb_intersection};

/// Edge length of the puzzle in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(usize);

impl Rank {
    pub const MIN: usize = 2;
    pub const MAX: usize = 6;

    /// Every supported rank, smallest first.
    pub const ALL: [Rank; 5] = [Rank(2), Rank(3), Rank(4), Rank(5), Rank(6)];

    pub fn new(rank: usize) -> Result<Self, Error> {
        if (Self::MIN..=Self::MAX).contains(&rank) {
            Ok(Self(rank))
        } else {
            Err(Error::InvalidRank { rank })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Rank {
    fn default() -> Self {
        Self(3)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}×{0}×{0}", self.0)
    }
}

/// Which cells a rotation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// The whole grid.
    All,
    /// One slice, counted from the low end of the lattice along the axis.
    Index(usize),
}

/// A committed move: some number of quarter turns of a layer about an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Twist {
    pub axis: Axis,
    pub layer: Layer,
    pub quarter_turns: i32,
}

impl Twist {
    pub fn degrees(&self) -> f32 {
        self.quarter_turns as f32 * 90.0
    }
}

/// Maps `(layer, row, col)` to the flattened cell index.
pub fn lattice_index(rank: usize, layer: usize, row: usize, col: usize) -> usize {
    rank * (layer * rank + row) + col
}

/// Inverse of [`lattice_index`].
pub fn lattice_position(rank: usize, index: usize) -> (usize, usize, usize) {
    let col = index % rank;
    let row = (index / rank) % rank;
    let layer = index / (rank * rank);
    (layer, row, col)
}

/// Direction in which lattice coordinates grow along `axis`.
///
/// Rows run towards negative Z, so layer lookups along Z flip the sign.
fn lattice_sign(axis: Axis) -> f32 {
    match axis {
        Axis::X | Axis::Y => 1.0,
        Axis::Z => -1.0,
    }
}

/// The puzzle: every cell, plus the lattice they were built on.
#[derive(Debug, Clone)]
pub struct MagicCube {
    rank: Rank,
    length: f32,
    layer_epsilon: f32,
    cells: Vec<Cell>,
}

impl MagicCube {
    /// Builds a solved grid of `rank³` cells spanning `length`.
    ///
    /// Outer faces of boundary cells get their side's texture; everything
    /// else stays blank.
    pub fn new(rank: Rank, length: f32, layer_epsilon: f32) -> Self {
        let n = rank.get();
        let cell_length = length / n as f32;
        let last = n - 1;

        let mut cells = Vec::with_capacity(n * n * n);
        for layer in 0..n {
            for row in 0..n {
                for col in 0..n {
                    let center = Vector3::new(
                        col as f32 + 0.5,
                        layer as f32 + 0.5,
                        -(row as f32 + 0.5),
                    ) * cell_length;
                    let transform =
                        Matrix4::new_translation(&center) * Matrix4::new_scaling(cell_length);

                    let mut face_textures = [FaceTexture::Blank; 6];
                    let mut paint = |face: Face| {
                        face_textures[face.index()] = FaceTexture::for_outer_face(face);
                    };
                    if col == 0 {
                        paint(Face::LEFT);
                    }
                    if col == last {
                        paint(Face::RIGHT);
                    }
                    if layer == 0 {
                        paint(Face::BOTTOM);
                    }
                    if layer == last {
                        paint(Face::TOP);
                    }
                    if row == 0 {
                        paint(Face::FRONT);
                    }
                    if row == last {
                        paint(Face::BACK);
                    }

                    let index = lattice_index(n, layer, row, col);
                    cells.push(Cell::new(index, transform, face_textures));
                }
            }
        }

        info!("built {rank} grid with edge length {length}");
        Self {
            rank,
            length,
            layer_epsilon,
            cells,
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Total edge length of the assembled cube.
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn cell_length(&self) -> f32 {
        self.length / self.rank.get() as f32
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Geometric center of the whole grid.
    pub fn center(&self) -> Point3<f32> {
        let half = self.length * 0.5;
        Point3::new(half, half, -half)
    }

    /// The eight corners of the grid's bounding box.
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let l = self.length;
        std::array::from_fn(|i| {
            let pick = |bit: usize| if i & bit != 0 { l } else { 0.0 };
            Point3::new(pick(1), pick(2), -pick(4))
        })
    }

    /// Nearest cell struck by `ray` with `t` in `[t_min, t_max]`.
    ///
    /// Every query starts from the caller's `t_max`; the bound only tightens
    /// inside this call.
    pub fn pick(
        &self,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
        parallel_epsilon: f32,
    ) -> Option<HitRecord> {
        // Bounding box that contains the cell under any rotation.
        let bound_size = self.cell_length() * 3.0_f32.sqrt();

        let mut nearest: Option<HitRecord> = None;
        for cell in &self.cells {
            let bound = AABB::from_center_size(cell.center(), bound_size);
            let Some(entry) = ray_aabb_intersection(ray, &bound) else {
                continue;
            };
            let limit = nearest.map_or(t_max, |hit| hit.t);
            if entry > limit {
                continue;
            }
            // Ties keep the first cell found.
            match cell.hit(ray, t_min, limit, parallel_epsilon) {
                Some(hit) if nearest.is_none_or(|best| hit.t < best.t) => {
                    nearest = Some(hit);
                }
                _ => {}
            }
        }

        match &nearest {
            Some(hit) => debug!(
                "picked cell {} at {:?} (t = {}, face {})",
                hit.cell,
                hit.point,
                hit.t,
                Face::from_normal(&hit.normal),
            ),
            None => debug!("pick missed the grid"),
        }
        nearest
    }

    /// Layer whose slot contains `coordinate`, measured along the lattice.
    ///
    /// Slots are `cell_length` wide and centered on `(i + ½) * cell_length`;
    /// coordinates on a slot boundary or outside `[0, length]` have no layer.
    pub fn layer_of(&self, coordinate: f32) -> Option<usize> {
        let cell_length = self.cell_length();
        (0..self.rank.get()).find(|&i| {
            (coordinate - (i as f32 + 0.5) * cell_length).abs() < cell_length / 2.0
        })
    }

    /// [`MagicCube::layer_of`] for a world coordinate along `axis`.
    pub fn layer_along(&self, axis: Axis, coordinate: f32) -> Option<usize> {
        self.layer_of(lattice_sign(axis) * coordinate)
    }

    /// World coordinate along `axis` of the centers of cells in layer `index`.
    pub fn layer_center(&self, axis: Axis, index: usize) -> f32 {
        lattice_sign(axis) * (index as f32 + 0.5) * self.cell_length()
    }

    /// Fixed point of rotations about `axis`: the grid center with the
    /// `axis` component dropped.
    pub fn pivot(&self, axis: Axis) -> Point3<f32> {
        let mut pivot = self.center();
        pivot[axis.index()] = 0.0;
        pivot
    }

    /// Whether `cell` currently sits in `layer` along `axis`.
    pub fn qualifies(&self, cell: &Cell, axis: Axis, layer: Layer) -> bool {
        match layer {
            Layer::All => true,
            Layer::Index(index) => {
                let coordinate = cell.center()[axis.index()];
                (coordinate - self.layer_center(axis, index)).abs() < self.layer_epsilon
            }
        }
    }

    /// Rotation matrix a turn of `degrees` about `axis` applies to qualifying cells.
    pub fn rotation(&self, axis: Axis, degrees: f32) -> Matrix4<f32> {
        math::rotation_about(axis, &self.pivot(axis), degrees)
    }

    /// Turns the cells of `layer` by `degrees` about `axis`.
    ///
    /// Only multiples of 90° keep cells on the lattice; callers commit
    /// snapped angles.
    pub fn rotate(&mut self, axis: Axis, layer: Layer, degrees: f32) {
        let rotation = self.rotation(axis, degrees);
        let selected: Vec<usize> = self
            .cells
            .iter()
            .filter(|cell| self.qualifies(cell, axis, layer))
            .map(Cell::index)
            .collect();
        for &index in &selected {
            self.cells[index].apply(&rotation);
        }
        debug!(
            "rotated {} cells of {layer:?} about {axis} by {degrees}°",
            selected.len(),
        );
    }

    /// Commits `twist` to the grid.
    pub fn apply_twist(&mut self, twist: &Twist) {
        info!(
            "twist {:?} about {} by {} quarter turn(s)",
            twist.layer, twist.axis, twist.quarter_turns,
        );
        self.rotate(twist.axis, twist.layer, twist.degrees());
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_relative_eq, relative_eq};
    use nalgebra::Vector3;
    use proptest::prelude::*;

    use super::*;

    fn grid(rank: usize) -> MagicCube {
        MagicCube::new(Rank::new(rank).unwrap(), 1.5, 1e-5)
    }

    fn down_the_z_axis(x: f32, y: f32) -> Ray {
        Ray::new(Point3::new(x, y, 10.0), Vector3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn rank_bounds() {
        assert_eq!(Rank::new(1), Err(Error::InvalidRank { rank: 1 }));
        assert_eq!(Rank::new(7), Err(Error::InvalidRank { rank: 7 }));
        assert_eq!(Rank::new(0), Err(Error::InvalidRank { rank: 0 }));
        for rank in Rank::MIN..=Rank::MAX {
            assert_eq!(Rank::new(rank).unwrap().get(), rank);
        }
        assert_eq!(Rank::ALL.len(), Rank::MAX - Rank::MIN + 1);
    }

    #[test]
    fn lattice_index_round_trips() {
        for rank in Rank::MIN..=Rank::MAX {
            for index in 0..rank * rank * rank {
                let (layer, row, col) = lattice_position(rank, index);
                assert_eq!(lattice_index(rank, layer, row, col), index);
            }
        }
    }

    #[test]
    fn cells_rest_on_the_lattice() {
        let grid = grid(3);
        assert_eq!(grid.cells().len(), 27);
        for cell in grid.cells() {
            let (layer, row, col) = lattice_position(3, cell.index());
            let expected = Point3::new(
                (col as f32 + 0.5) * 0.5,
                (layer as f32 + 0.5) * 0.5,
                -(row as f32 + 0.5) * 0.5,
            );
            assert_relative_eq!(cell.center(), expected);
        }
    }

    #[test]
    fn only_outer_faces_are_colored() {
        let grid = grid(3);
        let core = grid.cell(lattice_index(3, 1, 1, 1)).unwrap();
        assert_eq!(core.face_textures(), &[FaceTexture::Blank; 6]);

        let corner = grid.cell(lattice_index(3, 2, 0, 2)).unwrap();
        assert_eq!(corner.face_texture(Face::TOP), FaceTexture::White);
        assert_eq!(corner.face_texture(Face::FRONT), FaceTexture::Green);
        assert_eq!(corner.face_texture(Face::RIGHT), FaceTexture::Red);
        assert_eq!(corner.face_texture(Face::LEFT), FaceTexture::Blank);
        assert_eq!(corner.face_texture(Face::BOTTOM), FaceTexture::Blank);
        assert_eq!(corner.face_texture(Face::BACK), FaceTexture::Blank);

        let colored: usize = grid
            .cells()
            .iter()
            .flat_map(|cell| cell.face_textures())
            .filter(|&&t| t != FaceTexture::Blank)
            .count();
        assert_eq!(colored, 6 * 9);
    }

    #[test]
    fn pick_returns_the_front_cell() {
        let grid = grid(3);
        let hit = grid.pick(&down_the_z_axis(0.25, 1.25), 1e-5, 100.0, 1e-5).unwrap();
        assert_eq!(hit.cell, lattice_index(3, 2, 0, 0));
        assert_relative_eq!(hit.t, 10.0);
        assert_relative_eq!(hit.point, Point3::new(0.25, 1.25, 0.0));
        assert_eq!(Face::from_normal(&hit.normal), Face::FRONT);
    }

    #[test]
    fn pick_misses_outside_the_grid() {
        let grid = grid(3);
        assert!(grid.pick(&down_the_z_axis(1.6, 0.5), 1e-5, 100.0, 1e-5).is_none());
        let away = Ray::new(Point3::new(0.5, 0.5, 10.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(grid.pick(&away, 1e-5, 100.0, 1e-5).is_none());
    }

    #[test]
    fn pick_misses_beside_a_cell_edge() {
        let grid = grid(3);
        // Each ray runs along the extension of a cell edge or face diagonal.
        assert!(grid.pick(&down_the_z_axis(1.65, 1.0), 1e-5, 100.0, 1e-5).is_none());
        assert!(grid.pick(&down_the_z_axis(1.6, 0.5), 1e-5, 100.0, 1e-5).is_none());
        assert!(grid.pick(&down_the_z_axis(-0.25, 0.25), 1e-5, 100.0, 1e-5).is_none());
    }

    #[test]
    fn pick_on_a_shared_edge_keeps_the_first_cell() {
        let grid = grid(3);
        // x = 0.5 is the boundary between the first two columns.
        let hit = grid.pick(&down_the_z_axis(0.5, 0.25), 1e-5, 100.0, 1e-5).unwrap();
        assert_eq!(hit.cell, lattice_index(3, 0, 0, 0));
        assert_relative_eq!(hit.t, 10.0);
        assert_eq!(Face::from_normal(&hit.normal), Face::FRONT);
    }

    #[test]
    fn pick_respects_t_max() {
        let grid = grid(3);
        assert!(grid.pick(&down_the_z_axis(0.25, 0.25), 1e-5, 9.0, 1e-5).is_none());
    }

    #[test]
    fn pick_from_the_side() {
        let grid = grid(4);
        let ray = Ray::new(Point3::new(5.0, 0.7, -0.2), Vector3::new(-1.0, 0.0, 0.0));
        let hit = grid.pick(&ray, 1e-5, 100.0, 1e-5).unwrap();
        assert_relative_eq!(hit.t, 3.5);
        assert_eq!(Face::from_normal(&hit.normal), Face::RIGHT);
        assert_eq!(hit.cell, lattice_index(4, 1, 0, 3));
    }

    #[test]
    fn layer_of_bins_the_coordinate() {
        let grid = grid(3);
        assert_eq!(grid.layer_of(0.25), Some(0));
        assert_eq!(grid.layer_of(0.75), Some(1));
        assert_eq!(grid.layer_of(1.49), Some(2));
        assert_eq!(grid.layer_of(1.6), None);
        assert_eq!(grid.layer_of(-0.1), None);
        assert_eq!(grid.layer_along(Axis::Z, -1.25), Some(2));
        assert_eq!(grid.layer_along(Axis::Z, 0.25), None);
    }

    #[test]
    fn pivot_drops_the_axis_component() {
        let grid = grid(3);
        assert_eq!(grid.pivot(Axis::X), Point3::new(0.0, 0.75, -0.75));
        assert_eq!(grid.pivot(Axis::Y), Point3::new(0.75, 0.0, -0.75));
        assert_eq!(grid.pivot(Axis::Z), Point3::new(0.75, 0.75, 0.0));
    }

    #[test]
    fn every_cell_qualifies_for_all() {
        let mut grid = grid(4);
        grid.rotate(Axis::X, Layer::Index(1), 90.0);
        for cell in grid.cells() {
            for axis in Axis::ALL {
                assert!(grid.qualifies(cell, axis, Layer::All));
            }
        }
    }

    #[test]
    fn rotating_a_layer_moves_exactly_that_layer() {
        let mut grid = grid(3);
        let before: Vec<Matrix4<f32>> = grid.cells().iter().map(|c| *c.transform()).collect();
        grid.rotate(Axis::Y, Layer::Index(2), 90.0);

        let rotation = grid.rotation(Axis::Y, 90.0);
        let mut moved = 0;
        for (cell, before) in grid.cells().iter().zip(&before) {
            let (layer, _, _) = lattice_position(3, cell.index());
            if layer == 2 {
                moved += 1;
                assert_relative_eq!(*cell.transform(), rotation * before);
            } else {
                assert_eq!(cell.transform(), before);
            }
        }
        assert_eq!(moved, 9);
    }

    #[test]
    fn z_layers_count_from_the_front() {
        let mut grid = grid(3);
        grid.rotate(Axis::Z, Layer::Index(0), 90.0);
        for cell in grid.cells() {
            let (_, row, _) = lattice_position(3, cell.index());
            assert_eq!(grid.qualifies(cell, Axis::Z, Layer::Index(0)), row == 0);
        }
    }

    #[test]
    fn whole_grid_rotation_keeps_the_box() {
        let mut grid = grid(2);
        grid.rotate(Axis::X, Layer::All, 90.0);
        for cell in grid.cells() {
            let c = cell.center();
            for axis in Axis::ALL {
                assert!(grid.layer_along(axis, c[axis.index()]).is_some());
            }
        }
    }

    #[test]
    fn four_quarter_turns_restore_the_layer() {
        let mut grid = grid(5);
        let before: Vec<Matrix4<f32>> = grid.cells().iter().map(|c| *c.transform()).collect();
        for _ in 0..4 {
            grid.rotate(Axis::Z, Layer::Index(3), 90.0);
        }
        for (cell, before) in grid.cells().iter().zip(&before) {
            assert_relative_eq!(*cell.transform(), *before, epsilon = 1e-5);
        }
    }

    fn axis_strategy() -> impl Strategy<Value = Axis> {
        prop_oneof![Just(Axis::X), Just(Axis::Y), Just(Axis::Z)]
    }

    proptest! {
        #[test]
        fn layer_centers_map_to_their_own_layer(rank in Rank::MIN..=Rank::MAX) {
            let grid = grid(rank);
            for axis in Axis::ALL {
                for i in 0..rank {
                    prop_assert_eq!(grid.layer_along(axis, grid.layer_center(axis, i)), Some(i));
                }
            }
        }

        #[test]
        fn layer_bins_are_disjoint(rank in Rank::MIN..=Rank::MAX, t in 0.0f32..1.0) {
            let grid = grid(rank);
            let coordinate = t * grid.length();
            let cell_length = grid.cell_length();
            let matches = (0..rank)
                .filter(|&i| (coordinate - (i as f32 + 0.5) * cell_length).abs() < cell_length / 2.0)
                .count();
            prop_assert!(matches <= 1);
            if let Some(i) = grid.layer_of(coordinate) {
                prop_assert!((coordinate - (i as f32 + 0.5) * cell_length).abs() < cell_length / 2.0);
            }
        }

        #[test]
        fn quarter_turns_stay_on_the_lattice(
            rank in Rank::MIN..=Rank::MAX,
            moves in prop::collection::vec((axis_strategy(), 0usize..6, -3i32..=3), 1..12),
        ) {
            let mut grid = grid(rank);
            for (axis, layer, turns) in moves {
                grid.rotate(axis, Layer::Index(layer % rank), turns as f32 * 90.0);
            }
            for cell in grid.cells() {
                let center = cell.center();
                for axis in Axis::ALL {
                    let layer = grid.layer_along(axis, center[axis.index()]);
                    prop_assert!(layer.is_some());
                    let expected = grid.layer_center(axis, layer.unwrap_or_default());
                    prop_assert!(relative_eq!(center[axis.index()], expected, epsilon = 1e-4));
                }
            }
        }
    }
}
