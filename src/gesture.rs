//! Press → drag → release interpretation of pointer input.
//!
//! A gesture starts when the pointer goes down. Whether it turns a single
//! layer or the whole grid depends on whether the press struck a cell. The
//! rotation axis is chosen from the first drag sample that moves along one of
//! the candidate axes and stays locked until release, which snaps the
//! accumulated angle to whole quarter turns.

use log::{debug, error, info, trace};
use nalgebra::{Point2, Vector2};

use crate::cube::{Axis, Face};
use crate::grid::{Layer, MagicCube, Twist};
use crate::math;
use crate::ray_casting::HitRecord;

/// What a gesture turns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureMode {
    /// The press missed the grid; the whole grid turns.
    Global,
    /// The press struck `face` of a cell; one layer turns.
    Local { hit: HitRecord, face: Face },
}

impl GestureMode {
    pub fn local(hit: HitRecord) -> Self {
        Self::Local {
            hit,
            face: Face::from_normal(&hit.normal),
        }
    }

    /// Axes a drag in this mode may lock onto.
    pub fn candidate_axes(&self) -> &'static [Axis] {
        match self {
            GestureMode::Global => &Axis::ALL,
            GestureMode::Local { face, .. } => face.candidate_axes(),
        }
    }
}

/// Screen-space unit vector per axis along which a drag turns positively
/// about that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragDirections([Vector2<f32>; 3]);

impl DragDirections {
    /// Normalizes each direction; zero vectors stay zero and never win a lock.
    pub fn new(directions: [Vector2<f32>; 3]) -> Self {
        Self(directions.map(|d| d.try_normalize(f32::EPSILON).unwrap_or_else(Vector2::zeros)))
    }

    pub fn get(&self, axis: Axis) -> Vector2<f32> {
        self.0[axis.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Pressed,
    Dragging,
    /// The drag could not be resolved to a layer; release commits nothing.
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisLock {
    axis: Axis,
    layer: Layer,
    angle: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct DragState {
    mode: GestureMode,
    directions: DragDirections,
    last_position: Point2<f32>,
    moved: bool,
    canceled: bool,
    lock: Option<AxisLock>,
}

/// Gesture state machine. Lives as long as the view; one gesture at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gesture {
    drag: Option<DragState>,
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GesturePhase {
        match &self.drag {
            None => GesturePhase::Idle,
            Some(drag) if drag.canceled => GesturePhase::Canceled,
            Some(drag) if drag.moved => GesturePhase::Dragging,
            Some(_) => GesturePhase::Pressed,
        }
    }

    pub fn mode(&self) -> Option<&GestureMode> {
        self.drag.as_ref().map(|drag| &drag.mode)
    }

    fn lock(&self) -> Option<&AxisLock> {
        self.drag
            .as_ref()
            .filter(|drag| !drag.canceled)
            .and_then(|drag| drag.lock.as_ref())
    }

    /// Locked rotation axis, once the drag has picked one.
    pub fn axis(&self) -> Option<Axis> {
        self.lock().map(|lock| lock.axis)
    }

    pub fn layer(&self) -> Option<Layer> {
        self.lock().map(|lock| lock.layer)
    }

    /// Accumulated, unsnapped angle in degrees.
    pub fn angle(&self) -> f32 {
        self.lock().map_or(0.0, |lock| lock.angle)
    }

    /// Uncommitted rotation to show while dragging.
    pub fn preview(&self) -> Option<(Axis, Layer, f32)> {
        self.lock().map(|lock| (lock.axis, lock.layer, lock.angle))
    }

    /// Starts a gesture, abandoning any gesture still in progress.
    pub fn press(&mut self, position: Point2<f32>, mode: GestureMode, directions: DragDirections) {
        if self.drag.is_some() {
            debug!("press while a gesture was active; discarding it");
        }
        match &mode {
            GestureMode::Global => debug!("press at {position:?} missed the grid; global gesture"),
            GestureMode::Local { hit, face } => {
                debug!("press at {position:?} struck cell {} on face {face}", hit.cell)
            }
        }
        self.drag = Some(DragState {
            mode,
            directions,
            last_position: position,
            moved: false,
            canceled: false,
            lock: None,
        });
    }

    /// Feeds one pointer sample.
    ///
    /// `viewport` is the view size in pixels; `gain` is degrees per
    /// `width + height` pixels of drag along the locked direction.
    pub fn drag(
        &mut self,
        position: Point2<f32>,
        viewport: Vector2<f32>,
        gain: f32,
        grid: &MagicCube,
    ) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let offset = position - drag.last_position;
        drag.last_position = position;
        drag.moved = true;
        if drag.canceled {
            return;
        }

        if drag.lock.is_none() {
            let Some(axis) = dominant_axis(drag.mode.candidate_axes(), &drag.directions, &offset)
            else {
                return;
            };
            let Some(layer) = resolve_layer(&drag.mode, axis, grid) else {
                error!("could not classify the struck layer along {axis}; canceling gesture");
                drag.canceled = true;
                return;
            };
            debug!("locked drag onto {axis} ({layer:?})");
            drag.lock = Some(AxisLock {
                axis,
                layer,
                angle: 0.0,
            });
        }
        let Some(lock) = drag.lock.as_mut() else {
            return;
        };

        let extent = viewport.x + viewport.y;
        if extent > 0.0 {
            lock.angle += gain * offset.dot(&drag.directions.get(lock.axis)) / extent;
        }
        trace!("drag angle about {} now {}°", lock.axis, lock.angle);
    }

    /// Ends the gesture and returns the twist to commit, if any.
    ///
    /// Angles that snap to zero quarter turns commit nothing.
    pub fn release(&mut self) -> Option<Twist> {
        let drag = self.drag.take()?;
        if drag.canceled {
            debug!("released a canceled gesture");
            return None;
        }
        let lock = drag.lock?;
        let quarter_turns = math::snap_to_quarter_turns(lock.angle);
        if quarter_turns == 0 {
            debug!("released at {}°; snapped back", lock.angle);
            return None;
        }
        info!(
            "released at {}° about {}; committing {quarter_turns} quarter turn(s)",
            lock.angle, lock.axis,
        );
        Some(Twist {
            axis: lock.axis,
            layer: lock.layer,
            quarter_turns,
        })
    }

    /// Abandons the gesture without committing anything.
    pub fn cancel(&mut self) {
        if self.drag.take().is_some() {
            debug!("gesture canceled");
        }
    }
}

/// Candidate axis the offset moves along the most; `None` for a
/// motionless sample.
fn dominant_axis(
    candidates: &[Axis],
    directions: &DragDirections,
    offset: &Vector2<f32>,
) -> Option<Axis> {
    candidates
        .iter()
        .map(|&axis| (axis, offset.dot(&directions.get(axis)).abs()))
        .filter(|&(_, magnitude)| magnitude > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(axis, _)| axis)
}

fn resolve_layer(mode: &GestureMode, axis: Axis, grid: &MagicCube) -> Option<Layer> {
    match mode {
        GestureMode::Global => Some(Layer::All),
        GestureMode::Local { hit, .. } => {
            let i = axis.index();
            // A hit on a cell edge falls on a layer boundary; the struck
            // cell's center settles it.
            grid.layer_along(axis, hit.point[i])
                .or_else(|| {
                    let center = grid.cell(hit.cell)?.center();
                    grid.layer_along(axis, center[i])
                })
                .map(Layer::Index)
        }
    }
}
