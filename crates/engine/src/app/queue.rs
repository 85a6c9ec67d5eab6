use std::rc::Rc;

use tracing::trace;

use crate::app::surface::{Frame, Rect, Surface, Vec2};

/// Canonical layer numbers. Anything may queue on any layer; these are
/// the values the shipped states use so cross-module draws interleave
/// predictably.
pub mod layer {
    pub const BACKGROUND: i32 = 1;
    pub const ANIMATED_TILES: i32 = 5;
    pub const BUTTONS: i32 = 10;
    pub const BUTTON_HIGHLIGHT: i32 = 11;
    pub const ACTORS: i32 = 20;
    pub const OVERLAY: i32 = 25;
    pub const TEXT: i32 = 30;
}

/// A single deferred draw. Either a surface blit or an arbitrary
/// closure that paints directly onto the frame.
pub enum DrawPayload {
    Blit {
        surface: Rc<Surface>,
        position: Vec2,
        source: Option<Rect>,
    },
    Call(Box<dyn FnOnce(&mut Frame<'_>)>),
}

struct QueuedDraw {
    layer: i32,
    sequence: u64,
    payload: DrawPayload,
}

/// Deferred render queue. Draws accumulate during update in any order
/// and are composited once per frame, lowest layer first. Draws on the
/// same layer keep their submission order.
#[derive(Default)]
pub struct RenderQueue {
    pending: Vec<QueuedDraw>,
    next_sequence: u64,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: i32, payload: DrawPayload) {
        self.pending.push(QueuedDraw {
            layer,
            sequence: self.next_sequence,
            payload,
        });
        self.next_sequence += 1;
    }

    pub fn blit(&mut self, layer: i32, surface: Rc<Surface>, position: Vec2) {
        self.push(
            layer,
            DrawPayload::Blit {
                surface,
                position,
                source: None,
            },
        );
    }

    pub fn blit_area(&mut self, layer: i32, surface: Rc<Surface>, position: Vec2, source: Rect) {
        self.push(
            layer,
            DrawPayload::Blit {
                surface,
                position,
                source: Some(source),
            },
        );
    }

    pub fn call(&mut self, layer: i32, draw: impl FnOnce(&mut Frame<'_>) + 'static) {
        self.push(layer, DrawPayload::Call(Box::new(draw)));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything queued without drawing. Used when a state exits
    /// mid-frame so stale draws never reach the next state's frame.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Composite and drain every queued draw onto `frame`, lowest layer
    /// first. The queue is empty afterwards.
    pub fn flush(&mut self, frame: &mut Frame<'_>) {
        let mut batch = std::mem::take(&mut self.pending);
        batch.sort_by_key(|draw| (draw.layer, draw.sequence));
        trace!(draw_count = batch.len(), "render_queue_flushed");
        for draw in batch {
            match draw.payload {
                DrawPayload::Blit {
                    surface,
                    position,
                    source,
                } => {
                    let x = position.x.round() as i32;
                    let y = position.y.round() as i32;
                    match source {
                        Some(area) => frame.blit_area(&surface, x, y, area),
                        None => frame.blit(&surface, x, y),
                    }
                }
                DrawPayload::Call(paint) => paint(frame),
            }
        }
    }
}
