//! Geometry and interaction core of an N×N×N puzzle cube.
//!
//! The grid is a lattice of unit cells that can be picked with a ray cast
//! from the camera and turned layer by layer with quarter-turn rotations. A
//! pointer gesture (press, drag, release) chooses the axis and layer and
//! commits a snapped [`Twist`]. [`InteractionSession`] ties the pieces
//! together for one view.

pub mod camera;
pub mod config;
pub mod cube;
pub mod error;
pub mod gesture;
pub mod grid;
pub mod math;
pub mod ray_casting;
pub mod session;

pub use config::Config;
pub use cube::{Axis, Face, FaceTexture, Sign};
pub use error::Error;
pub use gesture::{Gesture, GestureMode, GesturePhase};
pub use grid::{Layer, MagicCube, Rank, Twist};
pub use session::{CellInstance, InteractionSession};
