mod battle;
mod factory;
mod menu;
mod world;

pub use battle::BattleState;
pub use factory::GameFactory;
pub use menu::MenuState;
pub use world::WorldState;

use engine::{ActorFrames, AssetCache};

const MAX_ACTOR_FRAMES: usize = 4;

/// Animation frames for a sprite prefix. Numbered frames
/// (`prefix_0.png`, `prefix_1.png`, ...) are collected until the first
/// gap; a sprite with no numbered frames falls back to a single
/// `prefix.png` image.
pub(crate) fn load_actor_frames(assets: &mut AssetCache, prefix: &str) -> ActorFrames {
    let mut frames = Vec::new();
    for index in 0..MAX_ACTOR_FRAMES {
        let key = format!("{prefix}_{index}.png");
        let surface = assets.surface(&key);
        if !assets.is_loaded(&key) {
            break;
        }
        frames.push(surface);
    }
    if frames.is_empty() {
        ActorFrames::single(assets.surface(&format!("{prefix}.png")))
    } else {
        ActorFrames::from_surfaces(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_png(dir: &std::path::Path, name: &str) {
        let mut buffer = image::RgbaImage::new(4, 4);
        for pixel in buffer.pixels_mut() {
            *pixel = image::Rgba([10, 200, 10, 255]);
        }
        buffer.save(dir.join(name)).expect("save png");
    }

    #[test]
    fn numbered_frames_are_collected_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        save_png(dir.path(), "hero_0.png");
        save_png(dir.path(), "hero_1.png");
        save_png(dir.path(), "hero_2.png");
        let mut assets = AssetCache::new(dir.path());
        let frames = load_actor_frames(&mut assets, "hero");
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn gap_in_numbering_stops_collection() {
        let dir = tempfile::tempdir().expect("tempdir");
        save_png(dir.path(), "hero_0.png");
        save_png(dir.path(), "hero_2.png");
        let mut assets = AssetCache::new(dir.path());
        let frames = load_actor_frames(&mut assets, "hero");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn unnumbered_sprite_yields_single_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        save_png(dir.path(), "sign.png");
        let mut assets = AssetCache::new(dir.path());
        let frames = load_actor_frames(&mut assets, "sign");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn missing_sprite_still_produces_a_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut assets = AssetCache::new(dir.path());
        let frames = load_actor_frames(&mut assets, "ghost");
        assert_eq!(frames.len(), 1);
    }
}
