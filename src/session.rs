//! One puzzle view: the grid, the camera looking at it, and the gesture in
//! progress.
//!
//! [`InteractionSession`] is the boundary the window layer talks to. Pointer
//! coordinates are in pixels relative to the view's top-left corner, y down.

use log::{debug, warn};
use nalgebra::{Matrix4, Point2, Point3, Vector2};

use crate::camera::{Camera, CameraController, Projection};
use crate::config::Config;
use crate::cube::{Axis, FaceTexture};
use crate::error::Error;
use crate::gesture::{DragDirections, Gesture, GestureMode};
use crate::grid::{MagicCube, Rank, Twist};
use crate::ray_casting::Ray;

/// What the renderer needs to draw one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellInstance {
    pub face_textures: [FaceTexture; 6],
    pub model: Matrix4<f32>,
}

#[derive(Debug, Clone)]
pub struct InteractionSession {
    config: Config,
    grid: MagicCube,
    gesture: Gesture,
    camera_controller: CameraController,
    camera: Camera,
    projection: Projection,
    viewport: Vector2<f32>,
}

impl InteractionSession {
    /// Default view size until the window reports one.
    const INITIAL_VIEWPORT: Vector2<f32> = Vector2::new(800.0, 600.0);

    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate().inspect_err(|e| warn!("rejected configuration: {e}"))?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: Config) -> Self {
        let grid = MagicCube::new(config.rank, config.length, config.layer_tolerance());
        let camera_controller = CameraController::new(
            grid.center(),
            config.camera_distance,
            config.camera_yaw,
            config.camera_pitch,
        );
        let camera = camera_controller.camera();
        let viewport = Self::INITIAL_VIEWPORT;
        let projection = Projection {
            aspect: viewport.x / viewport.y,
            fovy: config.fovy,
            znear: config.znear,
            zfar: config.zfar,
        };
        Self {
            config,
            grid,
            gesture: Gesture::new(),
            camera_controller,
            camera,
            projection,
            viewport,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &MagicCube {
        &self.grid
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn viewport(&self) -> Vector2<f32> {
        self.viewport
    }

    /// Pick ray through the pixel `(x, y)`.
    pub fn ray_through(&self, x: f32, y: f32) -> Ray {
        let u = x / self.viewport.x;
        let v = 1.0 - y / self.viewport.y;
        self.camera.viewport_point_to_ray(&self.projection, u, v)
    }

    /// Pixel position of a world point, or `None` if it is behind the camera.
    pub fn world_to_screen(&self, point: &Point3<f32>) -> Option<Point2<f32>> {
        self.camera
            .world_to_viewport(&self.projection, point, self.viewport.x, self.viewport.y)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let ray = self.ray_through(x, y);
        let hit = self.grid.pick(
            &ray,
            self.config.t_min,
            self.config.t_max,
            self.config.parallel_epsilon,
        );
        let (mode, anchor) = match hit {
            Some(hit) => (GestureMode::local(hit), hit.point),
            None => (GestureMode::Global, self.nearest_corner()),
        };
        let directions = self.drag_directions(&anchor);
        self.gesture.press(Point2::new(x, y), mode, directions);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.gesture.drag(
            Point2::new(x, y),
            self.viewport,
            self.config.drag_gain,
            &self.grid,
        );
    }

    /// Ends the gesture and commits its snapped twist, which is returned.
    pub fn pointer_up(&mut self) -> Option<Twist> {
        let twist = self.gesture.release()?;
        self.grid.apply_twist(&twist);
        Some(twist)
    }

    /// Drops the gesture in progress without touching the grid.
    pub fn pointer_cancel(&mut self) {
        self.gesture.cancel();
    }

    /// Rebuilds a solved grid of the given rank.
    ///
    /// An unsupported rank is rejected and the current grid is kept.
    pub fn set_grid_rank(&mut self, rank: usize) -> Result<(), Error> {
        let rank = Rank::new(rank).inspect_err(|e| warn!("{e}"))?;
        self.config.rank = rank;
        self.reset();
        Ok(())
    }

    /// Restores a solved grid at the current rank.
    pub fn reset(&mut self) {
        self.gesture.cancel();
        self.grid = MagicCube::new(
            self.config.rank,
            self.config.length,
            self.config.layer_tolerance(),
        );
    }

    /// Updates the view size; degenerate sizes are ignored.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) {
            debug!("ignoring degenerate viewport {width}×{height}");
            return;
        }
        self.viewport = Vector2::new(width, height);
        self.projection.aspect = width / height;
    }

    pub fn set_drag_gain(&mut self, gain: f32) {
        if gain.is_finite() && gain > 0.0 {
            self.config.drag_gain = gain;
        } else {
            warn!("ignoring drag gain {gain}");
        }
    }

    /// Orbits the camera by a pointer delta in pixels.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        self.camera_controller.process_mouse_motion(delta_x, delta_y);
        self.camera_controller.update_camera(&mut self.camera);
    }

    /// Moves the camera towards (positive) or away from the grid.
    pub fn zoom(&mut self, delta: f32) {
        self.camera_controller.process_scroll(delta);
        self.camera_controller.update_camera(&mut self.camera);
    }

    /// Per-cell draw data, with the uncommitted drag rotation applied.
    pub fn cell_instances(&self) -> Vec<CellInstance> {
        let preview = self
            .gesture
            .preview()
            .map(|(axis, layer, degrees)| (axis, layer, self.grid.rotation(axis, degrees)));

        self.grid
            .cells()
            .iter()
            .map(|cell| {
                let model = match &preview {
                    Some((axis, layer, rotation)) if self.grid.qualifies(cell, *axis, *layer) => {
                        rotation * cell.transform()
                    }
                    _ => *cell.transform(),
                };
                CellInstance {
                    face_textures: *cell.face_textures(),
                    model,
                }
            })
            .collect()
    }

    /// Grid corner closest to the eye; anchors drags that miss the grid.
    fn nearest_corner(&self) -> Point3<f32> {
        let eye = self.camera.eye;
        self.grid
            .corners()
            .into_iter()
            .min_by(|a, b| (a - eye).norm_squared().total_cmp(&(b - eye).norm_squared()))
            .unwrap_or_else(|| self.grid.center())
    }

    /// Screen directions in which `anchor` moves under a small positive turn
    /// about each axis.
    fn drag_directions(&self, anchor: &Point3<f32>) -> DragDirections {
        let Some(origin) = self.world_to_screen(anchor) else {
            return DragDirections::new([Vector2::zeros(); 3]);
        };
        let step = self.grid.cell_length() * 1e-2;
        let directions = Axis::ALL.map(|axis| {
            let radius = anchor - self.grid.pivot(axis);
            let Some(tangent) = axis.unit_vector().cross(&radius).try_normalize(f32::EPSILON)
            else {
                return Vector2::zeros();
            };
            self.world_to_screen(&(anchor + tangent * step))
                .map_or_else(Vector2::zeros, |moved| moved - origin)
        });
        debug!(
            "drag directions at {anchor:?}: X {:?}, Y {:?}, Z {:?}",
            directions[0], directions[1], directions[2],
        );
        DragDirections::new(directions)
    }
}

impl Default for InteractionSession {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}
