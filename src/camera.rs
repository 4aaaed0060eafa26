use nalgebra::{Matrix4, Point2, Point3, Vector3, Vector4};

use crate::ray_casting::Ray;

const MOUSE_SENSITIVITY: f32 = 0.5;
const ZOOM_SENSITIVITY: f32 = 0.5;
const MIN_DISTANCE: f32 = 2.5;
const MAX_DISTANCE: f32 = 20.0;

/// Converts OpenGL clip space (z in [-1, 1]) to wgpu clip space (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn build_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.target, &self.up)
    }

    /// Ray from the eye through normalized viewport coordinates.
    ///
    /// `u` runs left to right and `v` bottom to top, both in `[0, 1]`. The
    /// point `(u, v)` is placed on the near plane and the ray leaves the eye
    /// towards it.
    pub fn viewport_point_to_ray(&self, projection: &Projection, u: f32, v: f32) -> Ray {
        let front = (self.target - self.eye).normalize();
        let right = front.cross(&self.up).normalize();
        let up = right.cross(&front);

        let height = 2.0 * projection.znear * (projection.fovy.to_radians() / 2.0).tan();
        let width = height * projection.aspect;
        let horizontal = right * width;
        let vertical = up * height;
        let lower_left_corner =
            self.eye + front * projection.znear - horizontal * 0.5 - vertical * 0.5;

        let point = lower_left_corner + horizontal * u + vertical * v;
        Ray::new(self.eye, (point - self.eye).normalize())
    }

    /// Pixel position of `point` in a `width × height` viewport, y down.
    ///
    /// Returns `None` for points behind the camera.
    pub fn world_to_viewport(
        &self,
        projection: &Projection,
        point: &Point3<f32>,
        width: f32,
        height: f32,
    ) -> Option<Point2<f32>> {
        let view_proj = projection.build_projection_matrix() * self.build_view_matrix();
        let clip = view_proj * Vector4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some(Point2::new(
            (ndc_x + 1.0) * 0.5 * width,
            (1.0 - ndc_y) * 0.5 * height,
        ))
    }
}

/// Orbits the camera around a fixed target.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub target: Point3<f32>,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraController {
    pub fn new(target: Point3<f32>, distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            target,
            distance: distance.clamp(MIN_DISTANCE, MAX_DISTANCE),
            yaw,
            pitch: pitch.clamp(-89.0, 89.0),
        }
    }

    pub fn update_camera(&self, camera: &mut Camera) {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();

        let x = self.distance * pitch_rad.cos() * yaw_rad.sin();
        let y = self.distance * pitch_rad.sin();
        let z = self.distance * pitch_rad.cos() * yaw_rad.cos();

        camera.eye = self.target + Vector3::new(x, y, z);
        camera.target = self.target;
        camera.up = Vector3::new(0.0, 1.0, 0.0);
    }

    pub fn camera(&self) -> Camera {
        let mut camera = Camera {
            eye: self.target,
            target: self.target,
            up: Vector3::y(),
        };
        self.update_camera(&mut camera);
        camera
    }

    pub fn process_mouse_motion(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw -= delta_x * MOUSE_SENSITIVITY;
        self.pitch += delta_y * MOUSE_SENSITIVITY;

        self.pitch = self.pitch.clamp(-89.0, 89.0);
    }

    pub fn process_scroll(&mut self, delta: f32) {
        self.distance -= delta * ZOOM_SENSITIVITY;
        self.distance = self.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn build_projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fovy.to_radians(), self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (OPENGL_TO_WGPU_MATRIX
            * projection.build_projection_matrix()
            * camera.build_view_matrix())
        .into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
