mod actor;
mod assets;
mod battle;
mod button;
mod input;
mod level;
mod loop_runner;
mod metrics;
mod queue;
mod screen;
mod scroll;
mod state;
mod surface;
mod text;

pub use actor::{
    Actor, ActorFrames, ActorGroup, ActorState, DeathRule, PathBehavior, ACTOR_WIDTH_FRACTION,
    ANIMATION_FRAME_MS, FRAME_TIME_BASELINE_MS,
};
pub use assets::AssetCache;
pub use battle::{
    compute_solid_tiles, compute_valid_tiles, find_path, BattleTiles, GridPos, PathOutcome,
    MAX_PATH_ITERATIONS,
};
pub use button::{Button, ButtonSet};
pub use input::{GameEvent, InputCollector, Key};
pub use level::{
    AnimationFrame, LevelError, LevelLayer, LevelMap, LevelObject, LevelSurface, LevelTile,
};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use queue::{layer, DrawPayload, RenderQueue};
pub use screen::{Screen, ScreenError};
pub use scroll::{scroll_offset, ScrollCarry};
pub use state::{
    BattleEntry, GameState, MachineStatus, StateChange, StateContext, StateError, StateFactory,
    StateKind, StateMachine, WindowRequest, WorldEntry,
};
pub use surface::{Frame, Rect, Surface, SurfaceError, Vec2};
pub use text::{
    draw_text, text_height, text_width, wrap_text, DialogueTable, TextBox, LINES_PER_PAGE,
    LINE_SPACING_PX,
};
