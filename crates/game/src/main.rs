mod app;
mod content;

use engine::{resolve_app_paths, run_app, AssetCache, LoopConfig, StateContext};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::{GameFactory, MenuState};

fn main() {
    init_tracing();
    info!("=== The Game Startup ===");

    if let Err(err) = run() {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        assets = %paths.assets_dir.display(),
        "paths_resolved"
    );

    let dialogue = content::load_dialogue(&paths.dialogue_path)?;
    let assets = AssetCache::new(&paths.assets_dir);

    let config = LoopConfig::default();
    let viewport = (config.window_width, config.window_height);
    let ctx = StateContext::new(viewport, assets, dialogue);
    let initial = Box::new(MenuState::new(viewport));
    let factory = Box::new(GameFactory::new(&paths.levels_dir));

    run_app(config, ctx, initial, factory)?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
