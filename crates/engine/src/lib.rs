use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;

pub use app::{
    compute_solid_tiles, compute_valid_tiles, draw_text, find_path, layer, run_app, scroll_offset,
    text_height, text_width, wrap_text, Actor, ActorFrames, ActorGroup, ActorState, AnimationFrame,
    AppError, AssetCache, BattleEntry, BattleTiles, Button, ButtonSet, DeathRule, DialogueTable,
    DrawPayload, Frame, GameEvent, GameState, GridPos, InputCollector, Key, LevelError, LevelLayer,
    LevelMap, LevelObject, LevelSurface, LevelTile, LoopConfig, LoopMetricsSnapshot, MachineStatus,
    PathBehavior, PathOutcome, Rect, RenderQueue, Screen, ScreenError, ScrollCarry, StateChange,
    StateContext, StateError, StateFactory, StateKind, StateMachine, Surface, SurfaceError,
    TextBox, Vec2, WindowRequest, WorldEntry, ACTOR_WIDTH_FRACTION, ANIMATION_FRAME_MS,
    FRAME_TIME_BASELINE_MS, LINES_PER_PAGE, LINE_SPACING_PX, MAX_PATH_ITERATIONS,
};

pub const ROOT_ENV_VAR: &str = "THEGAME_ROOT";

/// Filesystem layout of a game installation: art, level files and the
/// dialogue table all live under the resolved root.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub levels_dir: PathBuf,
    pub dialogue_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid game root: {path}\n\
A valid root must contain Cargo.toml and an assets/ directory."
    )]
    InvalidEnvRoot { path: PathBuf, env_var: &'static str },
    #[error(
        "Could not detect game root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/the-game\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = root.join("assets");
    let levels_dir = assets_dir.join("levels");
    let dialogue_path = assets_dir.join("dialogue.json");

    Ok(AppPaths {
        root,
        assets_dir,
        levels_dir,
        dialogue_path,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_game_root(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_game_root(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_game_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
