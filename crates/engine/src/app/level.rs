use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::app::queue::RenderQueue;
use crate::app::surface::{Rect, Surface, Vec2};

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub tile_id: u32,
    pub duration_ms: u32,
}

/// A tile definition: its source art plus an optional animation cycle.
/// Animated tiles reference other tile ids for their frames.
#[derive(Clone)]
pub struct LevelTile {
    pub surface: Rc<Surface>,
    pub animation: Vec<AnimationFrame>,
}

/// A grid of tile ids, row-major, `0` meaning empty. Every layer in a
/// map has the same dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLayer {
    pub name: String,
    pub cells: Vec<u32>,
}

/// A named world-space rectangle carried by the map. Collision, doors
/// and battle triggers are all objects.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelObject {
    pub name: String,
    pub rect: Rect,
    pub solid: bool,
    pub active: bool,
    pub next_node: Option<String>,
    pub action: Option<String>,
}

/// Parsed map data, resolution-independent. Produced by a map loader;
/// [`LevelSurface::load`] rasterises it for a concrete viewport.
pub struct LevelMap {
    pub columns: u32,
    pub rows: u32,
    pub tiles: HashMap<u32, LevelTile>,
    pub layers: Vec<LevelLayer>,
    pub objects: Vec<LevelObject>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("map has zero columns or rows")]
    EmptyGrid,
    #[error("layer {name} has {got} cells, expected {expected}")]
    LayerSizeMismatch {
        name: String,
        got: usize,
        expected: usize,
    },
    #[error("layer {layer} references unknown tile id {tile_id}")]
    UnknownTile { layer: String, tile_id: u32 },
    #[error("tile {tile_id} animation references unknown tile id {frame_id}")]
    UnknownAnimationFrame { tile_id: u32, frame_id: u32 },
}

struct AnimatedCell {
    layer: usize,
    col: u32,
    row: u32,
    frames: Vec<AnimationFrame>,
    frame_index: usize,
    remaining_ms: f32,
}

/// The level rasterised into a single composite surface at a tile size
/// derived from the viewport width. Animated cells are re-blitted in
/// place as their timers elapse; static cells are painted once.
pub struct LevelSurface {
    composite: Rc<Surface>,
    tile_size: u32,
    columns: u32,
    rows: u32,
    scaled_tiles: HashMap<u32, Rc<Surface>>,
    layers: Vec<Vec<u32>>,
    animated: Vec<AnimatedCell>,
}

impl LevelSurface {
    /// Rasterise `map` for a viewport `viewport_width` pixels wide.
    /// Tiles are square; their edge is the viewport width divided by
    /// the column count, floored, never below one pixel.
    pub fn load(map: &LevelMap, viewport_width: u32) -> Result<Self, LevelError> {
        if map.columns == 0 || map.rows == 0 {
            return Err(LevelError::EmptyGrid);
        }
        let expected = map.columns as usize * map.rows as usize;
        for layer in &map.layers {
            if layer.cells.len() != expected {
                return Err(LevelError::LayerSizeMismatch {
                    name: layer.name.clone(),
                    got: layer.cells.len(),
                    expected,
                });
            }
            for &tile_id in &layer.cells {
                if tile_id != 0 && !map.tiles.contains_key(&tile_id) {
                    return Err(LevelError::UnknownTile {
                        layer: layer.name.clone(),
                        tile_id,
                    });
                }
            }
        }
        for (&tile_id, tile) in &map.tiles {
            for frame in &tile.animation {
                if !map.tiles.contains_key(&frame.tile_id) {
                    return Err(LevelError::UnknownAnimationFrame {
                        tile_id,
                        frame_id: frame.tile_id,
                    });
                }
            }
        }

        let tile_size = (viewport_width / map.columns).max(1);
        let mut scaled_tiles = HashMap::new();
        for (&tile_id, tile) in &map.tiles {
            scaled_tiles.insert(tile_id, Rc::new(tile.surface.scaled(tile_size, tile_size)));
        }

        let mut animated = Vec::new();
        for (layer_index, layer) in map.layers.iter().enumerate() {
            for (cell_index, &tile_id) in layer.cells.iter().enumerate() {
                if tile_id == 0 {
                    continue;
                }
                let frames = &map.tiles[&tile_id].animation;
                if frames.is_empty() {
                    continue;
                }
                animated.push(AnimatedCell {
                    layer: layer_index,
                    col: cell_index as u32 % map.columns,
                    row: cell_index as u32 / map.columns,
                    frames: frames.clone(),
                    frame_index: 0,
                    remaining_ms: frames[0].duration_ms as f32,
                });
            }
        }

        let mut level = Self {
            composite: Rc::new(Surface::filled(
                map.columns * tile_size,
                map.rows * tile_size,
                [0, 0, 0, 0],
            )),
            tile_size,
            columns: map.columns,
            rows: map.rows,
            scaled_tiles,
            layers: map.layers.iter().map(|layer| layer.cells.clone()).collect(),
            animated,
        };
        level.rasterise_all();
        debug!(
            columns = map.columns,
            rows = map.rows,
            tile_size,
            animated_cells = level.animated.len(),
            "level_rasterised"
        );
        Ok(level)
    }

    /// Re-rasterise for a new viewport width, keeping animation phase.
    pub fn reload(&mut self, map: &LevelMap, viewport_width: u32) -> Result<(), LevelError> {
        let phases: Vec<(usize, f32)> = self
            .animated
            .iter()
            .map(|cell| (cell.frame_index, cell.remaining_ms))
            .collect();
        let mut fresh = Self::load(map, viewport_width)?;
        for (cell, (frame_index, remaining_ms)) in fresh.animated.iter_mut().zip(phases) {
            if frame_index < cell.frames.len() {
                cell.frame_index = frame_index;
                cell.remaining_ms = remaining_ms;
            }
        }
        fresh.repaint_animated_cells();
        *self = fresh;
        Ok(())
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn width_px(&self) -> u32 {
        self.columns * self.tile_size
    }

    pub fn height_px(&self) -> u32 {
        self.rows * self.tile_size
    }

    /// Queue the whole level, shifted up by `scroll_px`.
    pub fn draw(&self, queue: &mut RenderQueue, layer: i32, scroll_px: i32) {
        queue.blit(
            layer,
            Rc::clone(&self.composite),
            Vec2 {
                x: 0.0,
                y: -scroll_px as f32,
            },
        );
    }

    /// Queue only `area` (a level-space rect), shifted by `scroll_px`.
    pub fn draw_area(&self, queue: &mut RenderQueue, layer: i32, area: Rect, scroll_px: i32) {
        queue.blit_area(
            layer,
            Rc::clone(&self.composite),
            Vec2 {
                x: area.x as f32,
                y: (area.y - scroll_px) as f32,
            },
            area,
        );
    }

    /// Advance animated cells by `elapsed_ms`. Timer remainders carry
    /// into the next frame so long frames skip ahead rather than
    /// stretching the cycle. Returns the level-space rects of the cells
    /// that changed, for partial redraw.
    pub fn animate(&mut self, elapsed_ms: f32) -> Vec<Rect> {
        let mut dirty = Vec::new();
        for (index, cell) in self.animated.iter_mut().enumerate() {
            cell.remaining_ms -= elapsed_ms;
            let mut changed = false;
            while cell.remaining_ms <= 0.0 {
                cell.frame_index = (cell.frame_index + 1) % cell.frames.len();
                cell.remaining_ms += cell.frames[cell.frame_index].duration_ms.max(1) as f32;
                changed = true;
            }
            if changed {
                dirty.push(index);
            }
        }
        let mut repainted = Vec::with_capacity(dirty.len());
        for index in dirty {
            let (col, row) = (self.animated[index].col, self.animated[index].row);
            self.repaint_cell(col, row);
            repainted.push(Rect::new(
                (col * self.tile_size) as i32,
                (row * self.tile_size) as i32,
                self.tile_size,
                self.tile_size,
            ));
        }
        repainted
    }

    fn rasterise_all(&mut self) {
        let composite = Rc::make_mut(&mut self.composite);
        for layer in &self.layers {
            for (cell_index, &tile_id) in layer.iter().enumerate() {
                if tile_id == 0 {
                    continue;
                }
                let col = cell_index as u32 % self.columns;
                let row = cell_index as u32 / self.columns;
                if let Some(tile) = self.scaled_tiles.get(&tile_id) {
                    composite.blit(
                        tile,
                        (col * self.tile_size) as i32,
                        (row * self.tile_size) as i32,
                    );
                }
            }
        }
    }

    fn repaint_animated_cells(&mut self) {
        let cells: Vec<(u32, u32)> = self
            .animated
            .iter()
            .map(|cell| (cell.col, cell.row))
            .collect();
        for (col, row) in cells {
            self.repaint_cell(col, row);
        }
    }

    /// Repaint one cell from scratch: clear it, then blit every layer's
    /// tile at that cell in layer order so overdraw from upper layers
    /// survives the animation swap.
    fn repaint_cell(&mut self, col: u32, row: u32) {
        let cell_index = (row * self.columns + col) as usize;
        let x = (col * self.tile_size) as i32;
        let y = (row * self.tile_size) as i32;
        let rect = Rect::new(x, y, self.tile_size, self.tile_size);

        let mut tile_ids = Vec::new();
        for (layer_index, layer) in self.layers.iter().enumerate() {
            let mut tile_id = layer[cell_index];
            if tile_id == 0 {
                continue;
            }
            if let Some(cell) = self
                .animated
                .iter()
                .find(|cell| cell.layer == layer_index && cell.col == col && cell.row == row)
            {
                tile_id = cell.frames[cell.frame_index].tile_id;
            }
            tile_ids.push(tile_id);
        }

        let composite = Rc::make_mut(&mut self.composite);
        composite.fill_rect(rect, [0, 0, 0, 0]);
        for tile_id in tile_ids {
            if let Some(tile) = self.scaled_tiles.get(&tile_id) {
                composite.blit(tile, x, y);
            }
        }
    }

    #[cfg(test)]
    fn composite_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.composite.pixel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::queue::layer;
    use crate::app::surface::Frame;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn tile(color: [u8; 4]) -> LevelTile {
        LevelTile {
            surface: Rc::new(Surface::filled(4, 4, color)),
            animation: Vec::new(),
        }
    }

    fn two_by_two_map() -> LevelMap {
        let mut tiles = HashMap::new();
        tiles.insert(1, tile(RED));
        tiles.insert(2, tile(GREEN));
        LevelMap {
            columns: 2,
            rows: 2,
            tiles,
            layers: vec![LevelLayer {
                name: "ground".into(),
                cells: vec![1, 2, 2, 1],
            }],
            objects: Vec::new(),
        }
    }

    fn animated_map() -> LevelMap {
        let mut tiles = HashMap::new();
        let mut water = tile(RED);
        water.animation = vec![
            AnimationFrame {
                tile_id: 1,
                duration_ms: 100,
            },
            AnimationFrame {
                tile_id: 2,
                duration_ms: 100,
            },
        ];
        tiles.insert(1, water);
        tiles.insert(2, tile(GREEN));
        LevelMap {
            columns: 1,
            rows: 1,
            tiles,
            layers: vec![LevelLayer {
                name: "ground".into(),
                cells: vec![1],
            }],
            objects: Vec::new(),
        }
    }

    #[test]
    fn tile_size_derives_from_viewport_width() {
        let level = LevelSurface::load(&two_by_two_map(), 320).expect("load");
        assert_eq!(level.tile_size(), 160);
        assert_eq!(level.width_px(), 320);
        assert_eq!(level.height_px(), 320);
    }

    #[test]
    fn tile_size_never_drops_below_one() {
        let level = LevelSurface::load(&two_by_two_map(), 1).expect("load");
        assert_eq!(level.tile_size(), 1);
    }

    #[test]
    fn load_rejects_mismatched_layer() {
        let mut map = two_by_two_map();
        map.layers[0].cells.pop();
        assert!(matches!(
            LevelSurface::load(&map, 320),
            Err(LevelError::LayerSizeMismatch { .. })
        ));
    }

    #[test]
    fn load_rejects_unknown_tile_reference() {
        let mut map = two_by_two_map();
        map.layers[0].cells[0] = 99;
        assert!(matches!(
            LevelSurface::load(&map, 320),
            Err(LevelError::UnknownTile { tile_id: 99, .. })
        ));
    }

    #[test]
    fn composite_places_tiles_on_the_grid() {
        let level = LevelSurface::load(&two_by_two_map(), 8).expect("load");
        assert_eq!(level.composite_pixel(0, 0), Some(RED));
        assert_eq!(level.composite_pixel(4, 0), Some(GREEN));
        assert_eq!(level.composite_pixel(0, 4), Some(GREEN));
        assert_eq!(level.composite_pixel(4, 4), Some(RED));
    }

    #[test]
    fn animate_swaps_frame_after_duration() {
        let mut level = LevelSurface::load(&animated_map(), 4).expect("load");
        assert_eq!(level.composite_pixel(0, 0), Some(RED));
        level.animate(100.0);
        assert_eq!(level.composite_pixel(0, 0), Some(GREEN));
        level.animate(100.0);
        assert_eq!(level.composite_pixel(0, 0), Some(RED));
    }

    #[test]
    fn animate_carries_timer_remainder() {
        let mut level = LevelSurface::load(&animated_map(), 4).expect("load");
        level.animate(150.0);
        assert_eq!(level.composite_pixel(0, 0), Some(GREEN));
        // 50ms of the second frame already consumed.
        level.animate(50.0);
        assert_eq!(level.composite_pixel(0, 0), Some(RED));
    }

    #[test]
    fn animate_skips_frames_on_long_gaps() {
        let mut level = LevelSurface::load(&animated_map(), 4).expect("load");
        level.animate(250.0);
        assert_eq!(level.composite_pixel(0, 0), Some(GREEN));
    }

    #[test]
    fn upper_layer_survives_animation_repaint() {
        let mut map = animated_map();
        let mut overlay = Surface::filled(4, 4, [0, 0, 0, 0]);
        overlay.fill_rect(Rect::new(0, 0, 2, 2), BLUE);
        map.tiles.insert(
            3,
            LevelTile {
                surface: Rc::new(overlay),
                animation: Vec::new(),
            },
        );
        map.layers.push(LevelLayer {
            name: "detail".into(),
            cells: vec![3],
        });
        let mut level = LevelSurface::load(&map, 4).expect("load");
        assert_eq!(level.composite_pixel(0, 0), Some(BLUE));
        level.animate(100.0);
        assert_eq!(level.composite_pixel(0, 0), Some(BLUE));
        assert_eq!(level.composite_pixel(3, 3), Some(GREEN));
    }

    #[test]
    fn draw_offsets_by_scroll() {
        let level = LevelSurface::load(&two_by_two_map(), 8).expect("load");
        let mut queue = RenderQueue::new();
        level.draw(&mut queue, layer::BACKGROUND, 4);
        let mut rgba = vec![0u8; 8 * 8 * 4];
        let mut frame = Frame::new(&mut rgba, 8, 8);
        queue.flush(&mut frame);
        // Row 4 of the level lands at frame row 0.
        assert_eq!(&rgba[0..4], &GREEN);
    }

    #[test]
    fn draw_area_repaints_only_the_requested_rect() {
        let level = LevelSurface::load(&two_by_two_map(), 8).expect("load");
        let mut queue = RenderQueue::new();
        level.draw_area(&mut queue, layer::BACKGROUND, Rect::new(0, 0, 4, 4), 0);
        let sentinel = [7u8, 7, 7, 255];
        let mut rgba = vec![0u8; 8 * 8 * 4];
        let mut frame = Frame::new(&mut rgba, 8, 8);
        frame.fill(sentinel);
        queue.flush(&mut frame);
        // Top-left cell repainted; the rest keeps its old pixels.
        assert_eq!(&rgba[0..4], &RED);
        let far = (6 * 8 + 6) * 4;
        assert_eq!(&rgba[far..far + 4], &sentinel);
    }

    #[test]
    fn animate_reports_repainted_cells() {
        let mut level = LevelSurface::load(&animated_map(), 4).expect("load");
        assert!(level.animate(50.0).is_empty());
        let repainted = level.animate(50.0);
        assert_eq!(repainted, vec![Rect::new(0, 0, 4, 4)]);
    }
}
