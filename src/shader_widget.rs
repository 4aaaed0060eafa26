//! Shader widget hosting the puzzle view.
//!
//! The widget owns an [`InteractionSession`] in its state and feeds it mouse
//! and keyboard events. Settings chosen in the control column (rank, drag
//! sensitivity, reset requests) arrive through the program and are applied to
//! the session on the next event.

use iced::widget::shader::{self, wgpu};
use iced::{Point, Rectangle, event, mouse};
use log::error;

use magic_cube::camera::{Camera, Projection};
use magic_cube::{CellInstance, InteractionSession, Rank};

use crate::Message;
use crate::renderer::Renderer;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub(crate) struct CubePrimitive {
    pub(crate) instances: Vec<CellInstance>,
    pub(crate) camera: Camera,
    pub(crate) projection: Projection,
}

impl shader::Primitive for CubePrimitive {
    fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        storage: &mut shader::Storage,
        _bounds: &Rectangle,
        viewport: &shader::Viewport,
    ) {
        if !storage.has::<Renderer>() {
            let renderer =
                pollster::block_on(Renderer::new(device, format, viewport.physical_size()));
            storage.store(renderer);
        }
        let renderer = storage.get_mut::<Renderer>().unwrap();
        renderer.resize(device, viewport.physical_size());
        renderer.update_instances(device, queue, &self.instances);
        renderer.update_camera(queue, &self.camera, &self.projection);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        storage: &shader::Storage,
        target: &wgpu::TextureView,
        clip_bounds: &Rectangle<u32>,
    ) {
        let renderer = storage.get::<Renderer>().unwrap();
        renderer.render(encoder, target, clip_bounds);
    }
}

/// Internal state managed by the shader widget
#[derive(Default)]
pub(crate) struct CubeShaderState {
    session: InteractionSession,
    /// Reset request last applied to the session
    generation: u64,
    twisting: bool,
    orbiting: bool,
    last_mouse_pos: Option<Point>,
}

/// The shader program; carries the settings from the control column.
pub(crate) struct CubeShaderProgram {
    rank: Rank,
    drag_gain: f32,
    generation: u64,
}

impl CubeShaderProgram {
    pub(crate) fn new(rank: Rank, drag_gain: f32, generation: u64) -> Self {
        Self {
            rank,
            drag_gain,
            generation,
        }
    }

    /// Brings the session in line with the control column.
    fn sync(&self, state: &mut CubeShaderState) {
        if state.session.grid().rank() != self.rank {
            if let Err(e) = state.session.set_grid_rank(self.rank.get()) {
                error!("could not rebuild grid: {e}");
            }
            state.twisting = false;
        }
        if state.generation != self.generation {
            state.generation = self.generation;
            state.session.reset();
            state.twisting = false;
        }
        if state.session.config().drag_gain != self.drag_gain {
            state.session.set_drag_gain(self.drag_gain);
        }
    }
}

impl shader::Program<Message> for CubeShaderProgram {
    type State = CubeShaderState;
    type Primitive = CubePrimitive;

    fn update(
        &self,
        state: &mut Self::State,
        event: shader::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
        _shell: &mut iced::advanced::Shell<'_, Message>,
    ) -> (event::Status, Option<Message>) {
        self.sync(state);
        state.session.set_viewport(bounds.width, bounds.height);

        match event {
            shader::Event::Mouse(mouse_event) => {
                self.handle_mouse_event(state, mouse_event, bounds, cursor)
            }
            shader::Event::Keyboard(keyboard_event) => {
                (Self::handle_keyboard_event(state, keyboard_event), None)
            }
            _ => (event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        _cursor: mouse::Cursor,
        _bounds: Rectangle,
    ) -> Self::Primitive {
        CubePrimitive {
            instances: state.session.cell_instances(),
            camera: state.session.camera().clone(),
            projection: *state.session.projection(),
        }
    }
}

impl CubeShaderProgram {
    /// Left button turns the puzzle, right button orbits, the wheel zooms.
    fn handle_mouse_event(
        &self,
        state: &mut CubeShaderState,
        mouse_event: mouse::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        match mouse_event {
            mouse::Event::CursorMoved { .. } => {
                // Gestures keep tracking the pointer outside the widget.
                let Some(position) = cursor
                    .position()
                    .map(|p| Point::new(p.x - bounds.x, p.y - bounds.y))
                else {
                    return (event::Status::Ignored, None);
                };
                if state.twisting {
                    state.session.pointer_move(position.x, position.y);
                }
                if state.orbiting {
                    if let Some(last_pos) = state.last_mouse_pos {
                        state
                            .session
                            .orbit(position.x - last_pos.x, position.y - last_pos.y);
                    }
                }
                state.last_mouse_pos = Some(position);
                if state.twisting || state.orbiting {
                    return (event::Status::Captured, None);
                }
            }
            mouse::Event::ButtonPressed(button) => {
                let Some(position) = cursor.position_in(bounds) else {
                    return (event::Status::Ignored, None);
                };
                match button {
                    mouse::Button::Left if !state.orbiting => {
                        state.session.pointer_down(position.x, position.y);
                        state.twisting = true;
                    }
                    mouse::Button::Right if !state.twisting => {
                        state.orbiting = true;
                    }
                    _ => return (event::Status::Ignored, None),
                }
                state.last_mouse_pos = Some(position);
                return (event::Status::Captured, None);
            }
            mouse::Event::ButtonReleased(mouse::Button::Left) if state.twisting => {
                state.twisting = false;
                let twist = state.session.pointer_up();
                return (event::Status::Captured, twist.map(Message::Twisted));
            }
            mouse::Event::ButtonReleased(mouse::Button::Right) if state.orbiting => {
                state.orbiting = false;
                return (event::Status::Captured, None);
            }
            mouse::Event::WheelScrolled { delta } => {
                if cursor.position_in(bounds).is_some() {
                    let scroll_delta = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
                    };
                    state.session.zoom(scroll_delta);
                    return (event::Status::Captured, None);
                }
            }
            _ => {}
        }

        (event::Status::Ignored, None)
    }

    /// Escape abandons the twist in progress.
    fn handle_keyboard_event(
        state: &mut CubeShaderState,
        keyboard_event: iced::keyboard::Event,
    ) -> event::Status {
        use iced::keyboard::Event;
        use iced::keyboard::{Key, key};
        match keyboard_event {
            Event::KeyPressed {
                key: Key::Named(key::Named::Escape),
                ..
            } if state.twisting => {
                state.session.pointer_cancel();
                state.twisting = false;
                event::Status::Captured
            }
            _ => event::Status::Ignored,
        }
    }
}
