//! Tunable constants of the puzzle view.
//!
//! The tolerances were chosen for a cube of edge length [`REFERENCE_LENGTH`];
//! the helpers below scale them when a different length is configured.

use crate::error::Error;
use crate::grid::Rank;

/// Edge length the default tolerances were tuned for.
pub const REFERENCE_LENGTH: f32 = 1.5;

/// Settings for one puzzle view.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Rank the grid is built with.
    pub rank: Rank,
    /// Total edge length of the assembled cube.
    pub length: f32,
    /// Degrees of rotation per `width + height` pixels of drag.
    pub drag_gain: f32,
    /// Lower bound of the pick ray parameter.
    pub t_min: f32,
    /// Upper bound of the pick ray parameter.
    pub t_max: f32,
    /// Rays whose direction is this close to parallel with a face are ignored.
    pub parallel_epsilon: f32,
    /// Tolerance when matching a cell center against a layer center.
    pub layer_epsilon: f32,
    /// Initial distance from the camera to the grid center.
    pub camera_distance: f32,
    /// Initial camera yaw in degrees, measured from +Z towards +X.
    pub camera_yaw: f32,
    /// Initial camera pitch in degrees above the horizon.
    pub camera_pitch: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rank: Rank::default(),
            length: REFERENCE_LENGTH,
            drag_gain: 540.0,
            t_min: 1e-5,
            t_max: 100.0,
            parallel_epsilon: 1e-5,
            layer_epsilon: 1e-5,
            camera_distance: 5.0,
            camera_yaw: 30.0,
            camera_pitch: 25.0,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

impl Config {
    /// Checks that the settings describe a usable grid and camera.
    pub fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("length", self.length),
            ("drag_gain", self.drag_gain),
            ("t_max", self.t_max),
            ("parallel_epsilon", self.parallel_epsilon),
            ("layer_epsilon", self.layer_epsilon),
            ("camera_distance", self.camera_distance),
            ("znear", self.znear),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")));
        }
        if !(0.0..self.t_max).contains(&self.t_min) {
            return Err(Error::InvalidConfig(format!(
                "t_min must lie in [0, {}), got {}",
                self.t_max, self.t_min,
            )));
        }
        if self.zfar <= self.znear {
            return Err(Error::InvalidConfig(format!(
                "zfar ({}) must exceed znear ({})",
                self.zfar, self.znear,
            )));
        }
        if !(1.0..179.0).contains(&self.fovy) {
            return Err(Error::InvalidConfig(format!("fovy out of range: {}", self.fovy)));
        }
        Ok(())
    }

    /// Layer matching tolerance scaled to the configured edge length.
    pub fn layer_tolerance(&self) -> f32 {
        self.layer_epsilon * self.length / REFERENCE_LENGTH
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_degenerate_values() {
        let cases = [
            Config { length: 0.0, ..Config::default() },
            Config { drag_gain: -1.0, ..Config::default() },
            Config { t_min: 200.0, ..Config::default() },
            Config { zfar: 0.05, ..Config::default() },
            Config { fovy: 180.0, ..Config::default() },
            Config { length: f32::NAN, ..Config::default() },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))), "{config:?}");
        }
    }

    #[test]
    fn tolerance_scales_with_length() {
        let config = Config { length: 3.0, ..Config::default() };
        assert_relative_eq!(config.layer_tolerance(), 2e-5);
    }
}
