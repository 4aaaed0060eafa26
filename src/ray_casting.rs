//! Ray casting primitives for mouse-based cell selection.
//!
//! Picking works on the CPU: each cell's twelve triangles are moved into
//! world space with the cell's current transform and tested against a ray
//! built from the camera. An axis-aligned box around every cell rejects most
//! rays before any triangle is touched.

use nalgebra::{Matrix4, Point3, Vector3};

/// 3D ray for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin point in 3D space
    pub origin: Point3<f32>,
    /// Ray direction vector. Callers normalize it so that `t` is a distance.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }
}

/// Result of a successful pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Ray parameter of the nearest hit.
    pub t: f32,
    /// World-space hit location.
    pub point: Point3<f32>,
    /// Outward world-space unit normal of the struck face.
    pub normal: Vector3<f32>,
    /// Index of the struck cell in the grid.
    pub cell: usize,
}

/// Triangle with world-space vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub x: Point3<f32>,
    pub y: Point3<f32>,
    pub z: Point3<f32>,
}

impl Triangle {
    pub fn new(x: Point3<f32>, y: Point3<f32>, z: Point3<f32>) -> Self {
        Self { x, y, z }
    }

    /// Returns this triangle with every vertex moved by `model`.
    pub fn transformed(&self, model: &Matrix4<f32>) -> Self {
        Self {
            x: model.transform_point(&self.x),
            y: model.transform_point(&self.y),
            z: model.transform_point(&self.z),
        }
    }

    /// Unit normal following the winding `x -> y -> z`.
    pub fn normal(&self) -> Vector3<f32> {
        (self.y - self.x).cross(&(self.z - self.x)).normalize()
    }

    /// Intersects the ray with the triangle's supporting plane.
    ///
    /// Returns the ray parameter and the plane's unit normal, or `None` when
    /// the ray runs parallel to the plane or the crossing lies outside
    /// `[t_min, t_max]`.
    pub fn plane_intersection(
        &self,
        ray: &Ray,
        t_min: f32,
        t_max: f32,
        parallel_epsilon: f32,
    ) -> Option<(f32, Vector3<f32>)> {
        let normal = self.normal();
        let dn = ray.direction.dot(&normal);
        if dn.abs() < parallel_epsilon {
            return None;
        }
        let t = (self.x - ray.origin).dot(&normal) / dn;
        if t < t_min || t_max < t {
            return None;
        }
        Some((t, normal))
    }

    /// Same-side test for a point already known to lie in the triangle's plane.
    ///
    /// Each edge's cross product with the point is measured against the
    /// triangle's own normal. An interior point sees every edge turn the same
    /// way, so no two edges may disagree in sign. Points on an edge count as
    /// inside; points on an edge's extension fall outside the opposite edges.
    pub fn inside(&self, p: &Point3<f32>) -> bool {
        let n = (self.y - self.x).cross(&(self.z - self.x));
        let tolerance = n.norm_squared() * 1e-6;
        let side = |a: &Point3<f32>, b: &Point3<f32>| n.dot(&(b - a).cross(&(p - a)));

        let sides = [
            side(&self.x, &self.y),
            side(&self.y, &self.z),
            side(&self.z, &self.x),
        ];
        let has_neg = sides.iter().any(|&s| s < -tolerance);
        let has_pos = sides.iter().any(|&s| s > tolerance);
        !(has_neg && has_pos)
    }
}

/// Axis-aligned bounding box in 3D space
#[derive(Debug, Clone)]
pub struct AABB {
    /// Minimum corner of the 3D bounding box
    pub min: Point3<f32>,
    /// Maximum corner of the 3D bounding box
    pub max: Point3<f32>,
}

impl AABB {
    /// Create a 3D AABB centered at a point with given size
    pub fn from_center_size(center: Point3<f32>, size: f32) -> Self {
        let half = Vector3::repeat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// Test ray intersection with 3D axis-aligned bounding box using the slab method
///
/// Returns the distance at which the ray enters the box, zero when the origin
/// is already inside, or None if the ray misses it.
pub fn ray_aabb_intersection(ray: &Ray, aabb: &AABB) -> Option<f32> {
    let inv_dir = Vector3::new(
        1.0 / ray.direction.x,
        1.0 / ray.direction.y,
        1.0 / ray.direction.z,
    );

    let t1 = (aabb.min.x - ray.origin.x) * inv_dir.x;
    let t2 = (aabb.max.x - ray.origin.x) * inv_dir.x;
    let t3 = (aabb.min.y - ray.origin.y) * inv_dir.y;
    let t4 = (aabb.max.y - ray.origin.y) * inv_dir.y;
    let t5 = (aabb.min.z - ray.origin.z) * inv_dir.z;
    let t6 = (aabb.max.z - ray.origin.z) * inv_dir.z;

    // tmin = where the ray ENTERS the box (latest of all near intersections)
    // tmax = where the ray EXITS the box (earliest of all far intersections)
    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        None
    } else {
        Some(tmin.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn ray_at_walks_along_direction() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(ray.at(0.0), ray.origin);
        assert_eq!(ray.at(2.5), Point3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn inside_accepts_interior_and_edges() {
        let tri = unit_triangle();
        assert!(tri.inside(&Point3::new(0.25, 0.25, 0.0)));
        assert!(tri.inside(&Point3::new(0.5, 0.0, 0.0)));
        assert!(tri.inside(&Point3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn inside_rejects_exterior() {
        let tri = unit_triangle();
        assert!(!tri.inside(&Point3::new(0.75, 0.75, 0.0)));
        assert!(!tri.inside(&Point3::new(-0.1, 0.5, 0.0)));
        assert!(!tri.inside(&Point3::new(0.5, -0.01, 0.0)));
    }

    #[test]
    fn inside_rejects_points_on_an_edge_extension() {
        let tri = unit_triangle();
        assert!(!tri.inside(&Point3::new(3.0, 0.0, 0.0)));
        assert!(!tri.inside(&Point3::new(-2.0, 0.0, 0.0)));
        assert!(!tri.inside(&Point3::new(0.0, 1.5, 0.0)));
        assert!(!tri.inside(&Point3::new(1.5, -0.5, 0.0)));
    }

    #[test]
    fn inside_ignores_winding() {
        let tri = unit_triangle();
        let flipped = Triangle::new(tri.x, tri.z, tri.y);
        let p = Point3::new(0.2, 0.3, 0.0);
        assert_eq!(tri.inside(&p), flipped.inside(&p));
    }

    #[test]
    fn plane_intersection_solves_for_t() {
        let tri = unit_triangle();
        let ray = Ray::new(Point3::new(0.2, 0.2, 4.0), Vector3::new(0.0, 0.0, -1.0));
        let (t, normal) = tri.plane_intersection(&ray, 1e-5, 100.0, 1e-5).unwrap();
        assert_relative_eq!(t, 4.0);
        assert_relative_eq!(normal, Vector3::z());
    }

    #[test]
    fn plane_intersection_rejects_parallel_rays() {
        let tri = unit_triangle();
        let ray = Ray::new(Point3::new(0.2, 0.2, 1.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(tri.plane_intersection(&ray, 1e-5, 100.0, 1e-5).is_none());
    }

    #[test]
    fn plane_intersection_respects_bounds() {
        let tri = unit_triangle();
        let ray = Ray::new(Point3::new(0.2, 0.2, 4.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(tri.plane_intersection(&ray, 1e-5, 3.0, 1e-5).is_none());
        let behind = Ray::new(Point3::new(0.2, 0.2, 4.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(tri.plane_intersection(&behind, 1e-5, 100.0, 1e-5).is_none());
    }

    #[test]
    fn transformed_moves_every_vertex() {
        let tri = unit_triangle().transformed(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 2.0)));
        assert_eq!(tri.x, Point3::new(0.0, 0.0, 2.0));
        assert_eq!(tri.y, Point3::new(1.0, 0.0, 2.0));
        assert_eq!(tri.z, Point3::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn aabb_hit_and_miss() {
        let aabb = AABB::from_center_size(Point3::origin(), 2.0);
        let hit = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(ray_aabb_intersection(&hit, &aabb).unwrap(), 4.0);
        let miss = Ray::new(Point3::new(3.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ray_aabb_intersection(&miss, &aabb).is_none());
        let inside = Ray::new(Point3::origin(), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(ray_aabb_intersection(&inside, &aabb), Some(0.0));
    }
}
