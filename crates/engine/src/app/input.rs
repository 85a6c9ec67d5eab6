use winit::event::{ElementState, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::app::surface::Vec2;

/// Keys the game reacts to. Anything else maps to [`Key::Other`] so
/// states can still observe that a key was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Return,
    Escape,
    Other,
}

/// An input event delivered to the active state, already translated
/// out of windowing-library terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    KeyPressed(Key),
    PointerPressed(Vec2),
}

fn key_from_physical(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::ArrowUp) => Key::Up,
        PhysicalKey::Code(KeyCode::ArrowDown) => Key::Down,
        PhysicalKey::Code(KeyCode::ArrowLeft) => Key::Left,
        PhysicalKey::Code(KeyCode::ArrowRight) => Key::Right,
        PhysicalKey::Code(KeyCode::Enter) | PhysicalKey::Code(KeyCode::NumpadEnter) => Key::Return,
        PhysicalKey::Code(KeyCode::Escape) => Key::Escape,
        _ => Key::Other,
    }
}

/// Buffers window events between ticks. Key and button events are
/// edge-triggered: only the press edge is recorded, and each press is
/// delivered to exactly one tick.
#[derive(Default)]
pub struct InputCollector {
    pending: Vec<GameEvent>,
    cursor: Option<Vec2>,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) {
        if state == ElementState::Pressed && !repeat {
            self.pending.push(GameEvent::KeyPressed(key_from_physical(key)));
        }
    }

    pub fn handle_pointer_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left && state == ElementState::Pressed {
            if let Some(cursor) = self.cursor {
                self.pending.push(GameEvent::PointerPressed(cursor));
            }
        }
    }

    pub fn handle_cursor_moved(&mut self, x: f32, y: f32) {
        self.cursor = Some(Vec2 { x, y });
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// Take every event buffered since the previous tick.
    pub fn drain_for_tick(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Rescale the remembered cursor position after a window resize.
    pub fn rescale(&mut self, multiplier: f32) {
        if let Some(cursor) = &mut self.cursor {
            cursor.x *= multiplier;
            cursor.y *= multiplier;
        }
    }
}
