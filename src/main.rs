//! Interactive N×N×N puzzle cube with an iced UI.
//!
//! Left-drag on the cube turns a layer, left-drag beside it turns the whole
//! puzzle, right-drag orbits the camera and the wheel zooms. Uses iced for UI
//! and wgpu for GPU rendering.

use iced::widget::{Button, Column, PickList, Row, Shader, Slider, text};
use iced::{Element, Length, Settings, Task};

use magic_cube::{Config, Rank, Twist};

mod renderer;
mod shader_widget;

use shader_widget::CubeShaderProgram;

/// Main application state - handles UI controls only
#[derive(Debug)]
pub(crate) struct CubeApp {
    rank: Rank,
    drag_gain: f32,
    /// Bumped to ask the view for a solved grid
    generation: u64,
    moves: usize,
}

/// Messages that the application can receive
#[derive(Debug, Clone)]
pub(crate) enum Message {
    Rank(Rank),
    DragGain(f32),
    Reset,
    Twisted(Twist),
}

impl CubeApp {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            rank: config.rank,
            drag_gain: config.drag_gain,
            generation: 0,
            moves: 0,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        "Magic Cube"
    }

    pub(crate) fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Rank(rank) => {
                if rank != self.rank {
                    self.rank = rank;
                    self.moves = 0;
                }
            }
            Message::DragGain(value) => {
                self.drag_gain = value;
            }
            Message::Reset => {
                self.generation += 1;
                self.moves = 0;
            }
            Message::Twisted(_) => {
                self.moves += 1;
            }
        }

        Task::none()
    }

    pub(crate) fn view(&self) -> Element<Message> {
        // Left pane with controls
        let controls = Column::new()
            .spacing(20)
            .push(
                Column::new()
                    .spacing(5)
                    .push(text("Grid"))
                    .push(PickList::new(&Rank::ALL[..], Some(self.rank), Message::Rank).width(250)),
            )
            .push(
                Column::new()
                    .spacing(5)
                    .push(text("Drag Sensitivity"))
                    .push(
                        Slider::new(90.0..=1440.0, self.drag_gain, Message::DragGain)
                            .step(10.0)
                            .width(250),
                    ),
            )
            .push(Button::new(text("Reset")).on_press(Message::Reset))
            .push(text(format!("Moves: {}", self.moves)));

        // Right pane with 3D viewport
        let viewport = Shader::new(CubeShaderProgram::new(
            self.rank,
            self.drag_gain,
            self.generation,
        ))
        .width(Length::Fill)
        .height(Length::Fill);

        // Main layout: left controls + right viewport
        Row::new()
            .spacing(10)
            .padding(10)
            .push(
                iced::widget::container(controls)
                    .width(Length::Shrink)
                    .height(Length::Fill),
            )
            .push(viewport)
            .into()
    }
}

fn main() -> iced::Result {
    env_logger::builder().format_timestamp(None).init();

    let app = CubeApp::new(&Config::default());
    iced::application(app.title(), CubeApp::update, CubeApp::view)
        .settings(Settings {
            antialiasing: true,
            ..Settings::default()
        })
        .run_with(move || (app, Task::none()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use magic_cube::{Axis, Layer};

    #[test]
    fn moves_reset_with_the_grid() {
        let mut app = CubeApp::new(&Config::default());
        let twist = Twist {
            axis: Axis::X,
            layer: Layer::Index(0),
            quarter_turns: 1,
        };
        let _ = app.update(Message::Twisted(twist));
        let _ = app.update(Message::Twisted(twist));
        assert_eq!(app.moves, 2);

        let _ = app.update(Message::Reset);
        assert_eq!(app.moves, 0);
        assert_eq!(app.generation, 1);

        let _ = app.update(Message::Twisted(twist));
        let _ = app.update(Message::Rank(Rank::new(4).unwrap()));
        assert_eq!(app.moves, 0);
        assert_eq!(app.rank.get(), 4);
    }
}
