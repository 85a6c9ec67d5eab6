use thiserror::Error;
use tracing::info;

use crate::app::assets::AssetCache;
use crate::app::input::GameEvent;
use crate::app::queue::RenderQueue;
use crate::app::surface::Vec2;
use crate::app::text::DialogueTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Menu,
    World,
    Battle,
}

impl StateKind {
    pub fn name(&self) -> &'static str {
        match self {
            StateKind::Menu => "menu",
            StateKind::World => "world",
            StateKind::Battle => "battle",
        }
    }
}

/// Constructor arguments for entering the world state.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldEntry {
    pub level: String,
    pub spawn: Vec2,
    pub player_sprite: String,
}

/// Constructor arguments for entering a battle, including where the
/// world should resume afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleEntry {
    pub level: String,
    pub scroll_px: i32,
    pub enemy_sprite: String,
    pub return_to: WorldEntry,
}

/// A transition requested by the active state's update. The loop owns
/// the swap; states never replace themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    ToMenu,
    ToWorld(WorldEntry),
    ToBattle(BattleEntry),
    Quit,
}

impl StateChange {
    pub fn target_kind(&self) -> Option<StateKind> {
        match self {
            StateChange::ToMenu => Some(StateKind::Menu),
            StateChange::ToWorld(_) => Some(StateKind::World),
            StateChange::ToBattle(_) => Some(StateKind::Battle),
            StateChange::Quit => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StateError {
    /// A transition named a state the factory does not know. This is a
    /// configuration error and aborts the run.
    #[error("no state registered for transition target {0}")]
    UnknownTarget(&'static str),
    #[error("state construction failed: {0}")]
    Construction(String),
}

/// Changes a state wants made to the window, applied by the loop after
/// the state's update returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowRequest {
    SetFullscreen(bool),
}

/// Everything a state may touch during an update: the render queue,
/// viewport geometry, the asset cache, dialogue text and the latest
/// cursor position. Owned by the loop and lent to the active state,
/// never shared globally.
pub struct StateContext {
    pub queue: RenderQueue,
    pub viewport: (u32, u32),
    pub assets: AssetCache,
    pub dialogue: DialogueTable,
    pub cursor: Option<Vec2>,
    window_requests: Vec<WindowRequest>,
}

impl StateContext {
    pub fn new(viewport: (u32, u32), assets: AssetCache, dialogue: DialogueTable) -> Self {
        Self {
            queue: RenderQueue::new(),
            viewport,
            assets,
            dialogue,
            cursor: None,
            window_requests: Vec::new(),
        }
    }

    pub fn request_window(&mut self, request: WindowRequest) {
        self.window_requests.push(request);
    }

    pub fn drain_window_requests(&mut self) -> Vec<WindowRequest> {
        std::mem::take(&mut self.window_requests)
    }
}

/// One game state: menu, world exploration, or battle.
pub trait GameState {
    fn kind(&self) -> StateKind;

    /// Input dispatch: one pointer click or key press.
    fn on_event(&mut self, ctx: &mut StateContext, event: GameEvent);

    /// Per-tick logic and draw enqueueing. Returning a change asks the
    /// loop to swap states before the next tick.
    fn update(&mut self, ctx: &mut StateContext, elapsed_ms: f32) -> Option<StateChange>;

    /// Window resize by `multiplier` relative to the previous size.
    fn scale(&mut self, ctx: &mut StateContext, multiplier: f32);

    /// Called once as the state is replaced.
    fn exit(&mut self, _ctx: &mut StateContext) {}
}

/// Builds states from transition requests. The game crate supplies the
/// concrete factory; the machine stays ignorant of state internals.
pub trait StateFactory {
    fn create(
        &mut self,
        ctx: &mut StateContext,
        change: StateChange,
    ) -> Result<Box<dyn GameState>, StateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus {
    Running,
    Quit,
}

/// Owns the active state and performs transitions requested by its
/// update calls. The swap happens between ticks: the outgoing state's
/// exit hook runs, pending draws are discarded, then the replacement
/// is constructed.
pub struct StateMachine {
    active: Box<dyn GameState>,
    factory: Box<dyn StateFactory>,
}

impl StateMachine {
    pub fn new(initial: Box<dyn GameState>, factory: Box<dyn StateFactory>) -> Self {
        Self {
            active: initial,
            factory,
        }
    }

    pub fn active_kind(&self) -> StateKind {
        self.active.kind()
    }

    pub fn on_event(&mut self, ctx: &mut StateContext, event: GameEvent) {
        self.active.on_event(ctx, event);
    }

    pub fn scale(&mut self, ctx: &mut StateContext, multiplier: f32) {
        self.active.scale(ctx, multiplier);
    }

    pub fn update(
        &mut self,
        ctx: &mut StateContext,
        elapsed_ms: f32,
    ) -> Result<MachineStatus, StateError> {
        let Some(change) = self.active.update(ctx, elapsed_ms) else {
            return Ok(MachineStatus::Running);
        };
        if change == StateChange::Quit {
            return Ok(MachineStatus::Quit);
        }
        let from = self.active.kind().name();
        let to = change
            .target_kind()
            .map(|kind| kind.name())
            .unwrap_or("quit");
        self.active.exit(ctx);
        ctx.queue.clear();
        self.active = self.factory.create(ctx, change)?;
        info!(from, to, "state_switched");
        Ok(MachineStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn test_ctx() -> StateContext {
        StateContext::new(
            (320, 240),
            AssetCache::new("assets"),
            DialogueTable::default(),
        )
    }

    struct ScriptedState {
        kind: StateKind,
        emit: Option<StateChange>,
        exits: Rc<Cell<u32>>,
    }

    impl GameState for ScriptedState {
        fn kind(&self) -> StateKind {
            self.kind
        }

        fn on_event(&mut self, _ctx: &mut StateContext, _event: GameEvent) {}

        fn update(&mut self, ctx: &mut StateContext, _elapsed_ms: f32) -> Option<StateChange> {
            ctx.queue.call(1, |_| {});
            self.emit.take()
        }

        fn scale(&mut self, _ctx: &mut StateContext, _multiplier: f32) {}

        fn exit(&mut self, _ctx: &mut StateContext) {
            self.exits.set(self.exits.get() + 1);
        }
    }

    struct MenuOnlyFactory;

    impl StateFactory for MenuOnlyFactory {
        fn create(
            &mut self,
            _ctx: &mut StateContext,
            change: StateChange,
        ) -> Result<Box<dyn GameState>, StateError> {
            match change {
                StateChange::ToMenu => Ok(Box::new(ScriptedState {
                    kind: StateKind::Menu,
                    emit: None,
                    exits: Rc::new(Cell::new(0)),
                })),
                other => Err(StateError::UnknownTarget(
                    other.target_kind().map(|kind| kind.name()).unwrap_or("quit"),
                )),
            }
        }
    }

    fn machine_with(emit: Option<StateChange>, exits: Rc<Cell<u32>>) -> StateMachine {
        StateMachine::new(
            Box::new(ScriptedState {
                kind: StateKind::World,
                emit,
                exits,
            }),
            Box::new(MenuOnlyFactory),
        )
    }

    #[test]
    fn update_without_change_keeps_state() {
        let mut ctx = test_ctx();
        let mut machine = machine_with(None, Rc::new(Cell::new(0)));
        let status = machine.update(&mut ctx, 16.0).expect("update");
        assert_eq!(status, MachineStatus::Running);
        assert_eq!(machine.active_kind(), StateKind::World);
    }

    #[test]
    fn transition_runs_exit_and_clears_queue() {
        let mut ctx = test_ctx();
        let exits = Rc::new(Cell::new(0));
        let mut machine = machine_with(Some(StateChange::ToMenu), Rc::clone(&exits));
        machine.update(&mut ctx, 16.0).expect("update");
        assert_eq!(machine.active_kind(), StateKind::Menu);
        assert_eq!(exits.get(), 1);
        assert!(ctx.queue.is_empty());
    }

    #[test]
    fn unknown_target_is_fatal() {
        let mut ctx = test_ctx();
        let entry = WorldEntry {
            level: "overworld".into(),
            spawn: Vec2::default(),
            player_sprite: "hero.png".into(),
        };
        let mut machine = machine_with(
            Some(StateChange::ToWorld(entry)),
            Rc::new(Cell::new(0)),
        );
        let result = machine.update(&mut ctx, 16.0);
        assert!(matches!(result, Err(StateError::UnknownTarget(_))));
    }

    #[test]
    fn quit_request_stops_the_machine() {
        let mut ctx = test_ctx();
        let exits = Rc::new(Cell::new(0));
        let mut machine = machine_with(Some(StateChange::Quit), Rc::clone(&exits));
        let status = machine.update(&mut ctx, 16.0).expect("update");
        assert_eq!(status, MachineStatus::Quit);
        // Quit tears down the loop; no replacement state is built.
        assert_eq!(exits.get(), 0);
    }

    #[test]
    fn window_requests_drain_once() {
        let mut ctx = test_ctx();
        ctx.request_window(WindowRequest::SetFullscreen(true));
        assert_eq!(
            ctx.drain_window_requests(),
            vec![WindowRequest::SetFullscreen(true)]
        );
        assert!(ctx.drain_window_requests().is_empty());
    }
}
