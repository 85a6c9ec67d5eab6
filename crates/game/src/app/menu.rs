use engine::{
    draw_text, layer, text_width, Button, ButtonSet, GameEvent, GameState, Key, Rect, StateChange,
    StateContext, StateKind, Vec2, WindowRequest, WorldEntry,
};
use tracing::info;

const TITLE: &str = "THE GAME";
const TITLE_SCALE: u32 = 6;
const TITLE_COLOR: [u8; 4] = [255, 255, 255, 255];
const BACKDROP_COLOR: [u8; 4] = [0, 0, 0, 255];

pub const START_LEVEL: &str = "overworld";
pub const PLAYER_SPRITE: &str = "sprites/player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Start,
    Fullscreen,
    Exit,
}

/// Title screen: three stacked buttons driven by pointer or arrow
/// keys.
pub struct MenuState {
    buttons: ButtonSet<MenuAction>,
    fullscreen: bool,
    pending: Option<StateChange>,
}

impl MenuState {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            buttons: build_buttons(viewport),
            fullscreen: false,
            pending: None,
        }
    }

    fn apply(&mut self, ctx: &mut StateContext, action: MenuAction) {
        match action {
            MenuAction::Start => {
                let spawn = Vec2 {
                    x: ctx.viewport.0 as f32 / 2.0,
                    y: ctx.viewport.1 as f32 / 2.0,
                };
                self.pending = Some(StateChange::ToWorld(WorldEntry {
                    level: START_LEVEL.to_string(),
                    spawn,
                    player_sprite: PLAYER_SPRITE.to_string(),
                }));
            }
            MenuAction::Fullscreen => {
                self.fullscreen = !self.fullscreen;
                info!(fullscreen = self.fullscreen, "fullscreen_toggled");
                ctx.request_window(WindowRequest::SetFullscreen(self.fullscreen));
            }
            MenuAction::Exit => self.pending = Some(StateChange::Quit),
        }
    }
}

/// Buttons are an eighth of the viewport in each dimension, centered
/// horizontally, stacked from a fifth of the way down with half a
/// button of air between them.
fn build_buttons(viewport: (u32, u32)) -> ButtonSet<MenuAction> {
    let (width, height) = viewport;
    let button_w = (width / 8).max(1);
    let button_h = (height / 8).max(1);
    let x = (width / 2) as i32 - (button_w / 2) as i32;
    let first_y = (height / 5) as i32;
    let spacing = (button_h as f32 * 1.5) as i32;
    let entries = [
        ("START", MenuAction::Start),
        ("FULLSCREEN", MenuAction::Fullscreen),
        ("EXIT", MenuAction::Exit),
    ];
    ButtonSet::new(
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (label, action))| {
                Button::new(
                    label,
                    Rect::new(x, first_y + index as i32 * spacing, button_w, button_h),
                    action,
                )
            })
            .collect(),
    )
}

impl GameState for MenuState {
    fn kind(&self) -> StateKind {
        StateKind::Menu
    }

    fn on_event(&mut self, ctx: &mut StateContext, event: GameEvent) {
        let action = match event {
            GameEvent::KeyPressed(Key::Escape) => {
                self.pending = Some(StateChange::Quit);
                return;
            }
            GameEvent::KeyPressed(key) => self.buttons.handle_key(key),
            GameEvent::PointerPressed(point) => self.buttons.handle_pointer(point),
        };
        if let Some(action) = action {
            self.apply(ctx, action);
        }
    }

    fn update(&mut self, ctx: &mut StateContext, _elapsed_ms: f32) -> Option<StateChange> {
        self.buttons.hover(ctx.cursor);
        ctx.queue
            .call(layer::BACKGROUND, |frame| frame.fill(BACKDROP_COLOR));
        let title_x =
            (ctx.viewport.0 as i32 - text_width(TITLE, TITLE_SCALE) as i32) / 2;
        ctx.queue.call(layer::TEXT, move |frame| {
            draw_text(frame, title_x, 20, TITLE_SCALE, TITLE_COLOR, TITLE);
        });
        self.buttons.draw(&mut ctx.queue);
        self.pending.take()
    }

    fn scale(&mut self, ctx: &mut StateContext, _multiplier: f32) {
        self.buttons = build_buttons(ctx.viewport);
    }
}
