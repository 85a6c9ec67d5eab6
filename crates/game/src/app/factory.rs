use std::path::PathBuf;

use engine::{GameState, StateChange, StateContext, StateError, StateFactory};

use crate::app::{BattleState, MenuState, WorldState};

/// Builds the concrete menu, world and battle states for the loop's
/// state machine. Holds the level directory so world and battle states
/// can load their maps.
pub struct GameFactory {
    levels_dir: PathBuf,
}

impl GameFactory {
    pub fn new(levels_dir: impl Into<PathBuf>) -> Self {
        Self {
            levels_dir: levels_dir.into(),
        }
    }
}

impl StateFactory for GameFactory {
    fn create(
        &mut self,
        ctx: &mut StateContext,
        change: StateChange,
    ) -> Result<Box<dyn GameState>, StateError> {
        match change {
            StateChange::ToMenu => Ok(Box::new(MenuState::new(ctx.viewport))),
            StateChange::ToWorld(entry) => {
                Ok(Box::new(WorldState::new(ctx, entry, &self.levels_dir)?))
            }
            StateChange::ToBattle(entry) => {
                Ok(Box::new(BattleState::new(ctx, entry, &self.levels_dir)?))
            }
            StateChange::Quit => Err(StateError::UnknownTarget("quit")),
        }
    }
}
