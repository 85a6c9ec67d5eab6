use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::warn;

use crate::app::surface::Surface;

/// Edge length of the placeholder returned for missing art.
const PLACEHOLDER_SIZE: u32 = 16;
const PLACEHOLDER_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Loads and caches image assets by their path relative to the asset
/// root. A key that fails to load yields a shared magenta placeholder
/// and a warning, logged once per key so a missing file does not spam
/// every frame.
pub struct AssetCache {
    root: PathBuf,
    loaded: HashMap<String, Rc<Surface>>,
    warned: HashSet<String>,
    placeholder: Rc<Surface>,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: HashMap::new(),
            warned: HashSet::new(),
            placeholder: Rc::new(Surface::filled(
                PLACEHOLDER_SIZE,
                PLACEHOLDER_SIZE,
                PLACEHOLDER_COLOR,
            )),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fetch a surface, loading it on first use. Never fails: missing
    /// or undecodable art comes back as the placeholder.
    pub fn surface(&mut self, key: &str) -> Rc<Surface> {
        if let Some(surface) = self.loaded.get(key) {
            return Rc::clone(surface);
        }
        let surface = match self.load_key(key) {
            Ok(surface) => Rc::new(surface),
            Err(reason) => {
                if self.warned.insert(key.to_string()) {
                    warn!(key, reason, "asset_load_failed");
                }
                Rc::clone(&self.placeholder)
            }
        };
        self.loaded.insert(key.to_string(), Rc::clone(&surface));
        surface
    }

    /// True when `key` resolved to real art rather than the placeholder.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.loaded
            .get(key)
            .map(|surface| !Rc::ptr_eq(surface, &self.placeholder))
            .unwrap_or(false)
    }

    /// Drop every cached surface. Subsequent fetches re-read from disk.
    pub fn clear(&mut self) {
        self.loaded.clear();
    }

    fn load_key(&self, key: &str) -> Result<Surface, String> {
        if key.is_empty() || key.contains("..") || Path::new(key).is_absolute() {
            return Err("key must be a relative path inside the asset root".into());
        }
        Surface::load_png(&self.root.join(key)).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_png(name: &str) -> (tempfile::TempDir, AssetCache) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut buffer = image::RgbaImage::new(3, 3);
        for pixel in buffer.pixels_mut() {
            *pixel = image::Rgba([0, 128, 0, 255]);
        }
        buffer.save(dir.path().join(name)).expect("save png");
        let cache = AssetCache::new(dir.path());
        (dir, cache)
    }

    #[test]
    fn loads_and_caches_existing_art() {
        let (_dir, mut cache) = cache_with_png("grass.png");
        let first = cache.surface("grass.png");
        let second = cache.surface("grass.png");
        assert!(Rc::ptr_eq(&first, &second));
        assert!(cache.is_loaded("grass.png"));
        assert_eq!(first.size(), (3, 3));
    }

    #[test]
    fn missing_art_yields_placeholder() {
        let (_dir, mut cache) = cache_with_png("grass.png");
        let surface = cache.surface("missing.png");
        assert_eq!(surface.pixel(0, 0), Some([255, 0, 255, 255]));
        assert!(!cache.is_loaded("missing.png"));
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let (_dir, mut cache) = cache_with_png("grass.png");
        let surface = cache.surface("../grass.png");
        assert_eq!(surface.pixel(0, 0), Some([255, 0, 255, 255]));
    }

    #[test]
    fn clear_forces_reload() {
        let (_dir, mut cache) = cache_with_png("grass.png");
        let first = cache.surface("grass.png");
        cache.clear();
        let second = cache.surface("grass.png");
        assert!(!Rc::ptr_eq(&first, &second));
    }
}
