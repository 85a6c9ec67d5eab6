use tracing::warn;

use crate::app::input::Key;
use crate::app::queue::{layer, RenderQueue};
use crate::app::surface::{Rect, Vec2};
use crate::app::text::{draw_text, text_height, text_width};

const BUTTON_FILL: [u8; 4] = [60, 60, 90, 255];
const BUTTON_LABEL: [u8; 4] = [255, 255, 255, 255];
const HIGHLIGHT: [u8; 4] = [255, 215, 0, 255];
const LABEL_SCALE: u32 = 2;

/// A clickable labelled rectangle producing an action value when
/// pressed. A label wider than the button is skipped at draw time and
/// warned about once, at construction.
pub struct Button<A: Copy> {
    pub label: String,
    pub rect: Rect,
    pub action: A,
    label_fits: bool,
}

impl<A: Copy> Button<A> {
    pub fn new(label: impl Into<String>, rect: Rect, action: A) -> Self {
        let label = label.into();
        let label_fits = text_width(&label, LABEL_SCALE) <= rect.w;
        if !label_fits {
            warn!(label, button_width = rect.w, "button_label_too_wide");
        }
        Self {
            label,
            rect,
            action,
            label_fits,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.rect.contains_point(point)
    }

    fn rescale(&mut self, multiplier: f32) {
        self.rect = Rect::new(
            (self.rect.x as f32 * multiplier).round() as i32,
            (self.rect.y as f32 * multiplier).round() as i32,
            ((self.rect.w as f32 * multiplier).round() as u32).max(1),
            ((self.rect.h as f32 * multiplier).round() as u32).max(1),
        );
        self.label_fits = text_width(&self.label, LABEL_SCALE) <= self.rect.w;
    }
}

/// A group of buttons sharing keyboard focus. Arrow keys move the
/// highlight by one vertically and by the full set size horizontally,
/// clamped at both ends, never wrapping. With no highlight yet, any
/// arrow key lands on the first button.
pub struct ButtonSet<A: Copy> {
    buttons: Vec<Button<A>>,
    highlighted: Option<usize>,
}

impl<A: Copy> ButtonSet<A> {
    pub fn new(buttons: Vec<Button<A>>) -> Self {
        Self {
            buttons,
            highlighted: None,
        }
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Keyboard dispatch. Arrows move the highlight; Return activates
    /// the highlighted button and yields its action.
    pub fn handle_key(&mut self, key: Key) -> Option<A> {
        if self.buttons.is_empty() {
            return None;
        }
        let count = self.buttons.len() as i32;
        let delta = match key {
            Key::Up => -1,
            Key::Down => 1,
            Key::Left => -count,
            Key::Right => count,
            Key::Return => {
                return self
                    .highlighted
                    .and_then(|index| self.buttons.get(index))
                    .map(|button| button.action);
            }
            _ => return None,
        };
        let current = match self.highlighted {
            Some(index) => index as i32,
            None => {
                self.highlighted = Some(0);
                return None;
            }
        };
        self.highlighted = Some((current + delta).clamp(0, count - 1) as usize);
        None
    }

    /// Pointer dispatch: returns the action of the button under the
    /// click, if any.
    pub fn handle_pointer(&mut self, point: Vec2) -> Option<A> {
        let hit = self
            .buttons
            .iter()
            .position(|button| button.contains(point))?;
        self.highlighted = Some(hit);
        Some(self.buttons[hit].action)
    }

    /// Move the highlight under the hovering cursor. A cursor over no
    /// button leaves the keyboard highlight alone.
    pub fn hover(&mut self, cursor: Option<Vec2>) {
        if let Some(point) = cursor {
            if let Some(hit) = self.buttons.iter().position(|button| button.contains(point)) {
                self.highlighted = Some(hit);
            }
        }
    }

    pub fn draw(&self, queue: &mut RenderQueue) {
        for (index, button) in self.buttons.iter().enumerate() {
            let rect = button.rect;
            queue.call(layer::BUTTONS, move |frame| {
                frame.fill_rect(rect, BUTTON_FILL);
            });
            if button.label_fits {
                let label = button.label.clone();
                let label_x =
                    rect.x + (rect.w.saturating_sub(text_width(&label, LABEL_SCALE))) as i32 / 2;
                let label_y =
                    rect.y + (rect.h.saturating_sub(text_height(LABEL_SCALE))) as i32 / 2;
                queue.call(layer::BUTTONS, move |frame| {
                    draw_text(frame, label_x, label_y, LABEL_SCALE, BUTTON_LABEL, &label);
                });
            }
            if self.highlighted == Some(index) {
                queue.call(layer::BUTTON_HIGHLIGHT, move |frame| {
                    frame.outline_rect(rect.inflated(2), HIGHLIGHT);
                });
            }
        }
    }

    pub fn rescale(&mut self, multiplier: f32) {
        for button in &mut self.buttons {
            button.rescale(multiplier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Action {
        Start,
        Options,
        Quit,
    }

    fn three_buttons() -> ButtonSet<Action> {
        ButtonSet::new(vec![
            Button::new("START", Rect::new(0, 0, 100, 20), Action::Start),
            Button::new("OPTIONS", Rect::new(0, 30, 100, 20), Action::Options),
            Button::new("QUIT", Rect::new(0, 60, 100, 20), Action::Quit),
        ])
    }

    #[test]
    fn first_arrow_press_highlights_first_button() {
        let mut set = three_buttons();
        assert_eq!(set.handle_key(Key::Down), None);
        assert_eq!(set.highlighted(), Some(0));
    }

    #[test]
    fn up_at_top_clamps_without_wrapping() {
        let mut set = three_buttons();
        set.handle_key(Key::Down);
        assert_eq!(set.highlighted(), Some(0));
        set.handle_key(Key::Up);
        assert_eq!(set.highlighted(), Some(0));
    }

    #[test]
    fn down_clamps_at_last_button() {
        let mut set = three_buttons();
        set.handle_key(Key::Down);
        for _ in 0..10 {
            set.handle_key(Key::Down);
        }
        assert_eq!(set.highlighted(), Some(2));
    }

    #[test]
    fn horizontal_arrows_jump_by_set_size() {
        let mut set = three_buttons();
        set.handle_key(Key::Down);
        set.handle_key(Key::Down);
        assert_eq!(set.highlighted(), Some(1));
        set.handle_key(Key::Right);
        assert_eq!(set.highlighted(), Some(2));
        set.handle_key(Key::Left);
        assert_eq!(set.highlighted(), Some(0));
    }

    #[test]
    fn return_activates_highlighted_button() {
        let mut set = three_buttons();
        assert_eq!(set.handle_key(Key::Return), None);
        set.handle_key(Key::Down);
        set.handle_key(Key::Down);
        assert_eq!(set.handle_key(Key::Return), Some(Action::Options));
    }

    #[test]
    fn pointer_click_hits_containing_button() {
        let mut set = three_buttons();
        let action = set.handle_pointer(Vec2 { x: 50.0, y: 65.0 });
        assert_eq!(action, Some(Action::Quit));
        assert_eq!(set.highlighted(), Some(2));
    }

    #[test]
    fn pointer_miss_returns_nothing() {
        let mut set = three_buttons();
        assert_eq!(set.handle_pointer(Vec2 { x: 500.0, y: 500.0 }), None);
        assert_eq!(set.highlighted(), None);
    }

    #[test]
    fn hover_off_buttons_keeps_highlight() {
        let mut set = three_buttons();
        set.hover(Some(Vec2 { x: 50.0, y: 35.0 }));
        assert_eq!(set.highlighted(), Some(1));
        set.hover(Some(Vec2 { x: 500.0, y: 500.0 }));
        assert_eq!(set.highlighted(), Some(1));
    }

    #[test]
    fn oversized_label_is_flagged() {
        let button = Button::new(
            "AN EXTREMELY LONG LABEL THAT CANNOT FIT",
            Rect::new(0, 0, 20, 10),
            Action::Start,
        );
        assert!(!button.label_fits);
    }
}
