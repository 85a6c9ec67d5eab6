use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::app::level::LevelObject;
use crate::app::queue::{layer, RenderQueue};
use crate::app::surface::Rect;

/// Iteration cap on the greedy path walk. Keeps the search bounded
/// when the actor is boxed in.
pub const MAX_PATH_ITERATIONS: u32 = 100;

const MOVE_TILE_COLOR: [u8; 4] = [0, 0, 255, 220];
const SOLID_TILE_COLOR: [u8; 4] = [255, 0, 255, 220];
const SPELL_TILE_COLOR: [u8; 4] = [125, 255, 125, 220];
const SELECTED_TILE_COLOR: [u8; 4] = [255, 255, 255, 255];

/// A battle grid cell. Columns grow rightward, rows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub col: i32,
    pub row: i32,
}

impl GridPos {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn manhattan(&self, other: GridPos) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }

    pub fn cardinal_neighbors(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.col + 1, self.row),
            GridPos::new(self.col - 1, self.row),
            GridPos::new(self.col, self.row + 1),
            GridPos::new(self.col, self.row - 1),
        ]
    }

    /// Screen rect of this cell for a given tile edge length.
    pub fn to_rect(&self, tile_size: u32) -> Rect {
        Rect::new(
            self.col * tile_size as i32,
            self.row * tile_size as i32,
            tile_size,
            tile_size,
        )
    }

    /// Cell containing the given screen pixel.
    pub fn from_pixel(x: i32, y: i32, tile_size: u32) -> Self {
        let edge = tile_size.max(1) as i32;
        Self {
            col: x.div_euclid(edge),
            row: y.div_euclid(edge),
        }
    }
}

/// Every grid cell an obstacle object overlaps, inclusive on both
/// edges. Object rects are world-space; `scroll_px` shifts them into
/// the battle's screen-space grid.
pub fn compute_solid_tiles(
    objects: &[LevelObject],
    scroll_px: i32,
    tile_size: u32,
) -> HashSet<GridPos> {
    let edge = tile_size.max(1) as i32;
    let mut solid = HashSet::new();
    for object in objects {
        if !object.solid || object.rect.is_empty() {
            continue;
        }
        let top = object.rect.y - scroll_px;
        let first_col = object.rect.x.div_euclid(edge);
        let last_col = (object.rect.right() - 1).div_euclid(edge);
        let first_row = top.div_euclid(edge);
        let last_row = (top + object.rect.h as i32 - 1).div_euclid(edge);
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                solid.insert(GridPos::new(col, row));
            }
        }
    }
    solid
}

/// Tiles the player may act on this turn. Move tiles are the four
/// cardinal neighbors not blocked by a solid tile. Spell tiles are the
/// four cells at axis distance two, never filtered, since spells arc
/// over obstacles.
pub fn compute_valid_tiles(
    player: GridPos,
    solid: &HashSet<GridPos>,
) -> (Vec<GridPos>, Vec<GridPos>) {
    let move_tiles = player
        .cardinal_neighbors()
        .into_iter()
        .filter(|tile| !solid.contains(tile))
        .collect();
    let spell_tiles = vec![
        GridPos::new(player.col + 2, player.row),
        GridPos::new(player.col - 2, player.row),
        GridPos::new(player.col, player.row + 2),
        GridPos::new(player.col, player.row - 2),
    ];
    (move_tiles, spell_tiles)
}

/// Result of one path search. `visited` maps every cell the walk
/// touched to its path order, starting from 0 at the start cell.
#[derive(Debug)]
pub struct PathOutcome {
    pub next_move: Option<GridPos>,
    pub visited: HashMap<GridPos, u32>,
    pub iterations: u32,
}

fn step_toward(delta: i32) -> i32 {
    if delta < 0 {
        -1
    } else {
        1
    }
}

/// Greedy step-by-step walk from `start` toward `target`, one cell per
/// iteration, bounded by [`MAX_PATH_ITERATIONS`]. Each iteration tries
/// the axis with the larger remaining distance first, then the other
/// axis toward the target, then the other axis away; cells that are
/// obstacles or already on the path are skipped. The returned next
/// move is the visited cardinal neighbor of `start` furthest along the
/// discovered path, which follows where the path principally
/// progressed rather than replaying the first planned step.
///
/// This is a local, incomplete search. It can stall against concave
/// obstacles; a `None` next move means the actor stays put this turn.
pub fn find_path(start: GridPos, target: GridPos, obstacles: &HashSet<GridPos>) -> PathOutcome {
    let mut visited = HashMap::new();
    visited.insert(start, 0u32);
    let mut current = start;
    let mut order = 0u32;
    let mut iterations = 0u32;

    while iterations < MAX_PATH_ITERATIONS {
        iterations += 1;
        if current.manhattan(target) <= 1 {
            break;
        }
        let dc = target.col - current.col;
        let dr = target.row - current.row;
        let col_toward = GridPos::new(current.col + step_toward(dc), current.row);
        let row_toward = GridPos::new(current.col, current.row + step_toward(dr));
        let col_away = GridPos::new(current.col - step_toward(dc), current.row);
        let row_away = GridPos::new(current.col, current.row - step_toward(dr));
        let candidates = if dc.abs() >= dr.abs() {
            [col_toward, row_toward, row_away]
        } else {
            [row_toward, col_toward, col_away]
        };
        for candidate in candidates {
            if obstacles.contains(&candidate) || visited.contains_key(&candidate) {
                continue;
            }
            order += 1;
            visited.insert(candidate, order);
            current = candidate;
            break;
        }
        // All candidates blocked: no progress this iteration.
    }

    let next_move = start
        .cardinal_neighbors()
        .into_iter()
        .filter_map(|neighbor| visited.get(&neighbor).map(|&order| (neighbor, order)))
        .max_by_key(|&(_, order)| order)
        .map(|(neighbor, _)| neighbor);

    if next_move.is_none() {
        debug!(
            start_col = start.col,
            start_row = start.row,
            target_col = target.col,
            target_row = target.row,
            iterations,
            "path_not_found"
        );
    }

    PathOutcome {
        next_move,
        visited,
        iterations,
    }
}

/// The per-turn tile sets of an active battle, plus their overlay
/// rendering.
pub struct BattleTiles {
    pub solid: HashSet<GridPos>,
    pub move_tiles: Vec<GridPos>,
    pub spell_tiles: Vec<GridPos>,
    /// Battle round counter; round 0 is encounter setup.
    pub turn: u32,
    /// The tile picked this turn. `None` marks targeting as complete.
    pub selected_tile: Option<GridPos>,
    tile_size: u32,
}

impl BattleTiles {
    pub fn new(objects: &[LevelObject], scroll_px: i32, tile_size: u32) -> Self {
        Self {
            solid: compute_solid_tiles(objects, scroll_px, tile_size),
            move_tiles: Vec::new(),
            spell_tiles: Vec::new(),
            turn: 0,
            selected_tile: None,
            tile_size,
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Recompute the actionable tile sets around the player's cell.
    pub fn refresh(&mut self, player: GridPos) {
        let (move_tiles, spell_tiles) = compute_valid_tiles(player, &self.solid);
        self.move_tiles = move_tiles;
        self.spell_tiles = spell_tiles;
    }

    pub fn advance_turn(&mut self) {
        self.turn += 1;
    }

    pub fn clear_selection(&mut self) {
        self.move_tiles.clear();
        self.spell_tiles.clear();
        self.selected_tile = None;
    }

    pub fn is_move_tile(&self, tile: GridPos) -> bool {
        self.move_tiles.contains(&tile)
    }

    pub fn is_spell_tile(&self, tile: GridPos) -> bool {
        self.spell_tiles.contains(&tile)
    }

    /// Queue translucent overlays for the current tile sets.
    pub fn draw(&self, queue: &mut RenderQueue) {
        let tile_size = self.tile_size;
        let rects = |tiles: &[GridPos]| -> Vec<Rect> {
            tiles.iter().map(|tile| tile.to_rect(tile_size)).collect()
        };
        let solid: Vec<Rect> = self.solid.iter().map(|tile| tile.to_rect(tile_size)).collect();
        let moves = rects(&self.move_tiles);
        let spells = rects(&self.spell_tiles);
        let selected = self.selected_tile.map(|tile| tile.to_rect(tile_size));
        queue.call(layer::OVERLAY, move |frame| {
            for rect in &solid {
                frame.fill_rect_blended(*rect, SOLID_TILE_COLOR);
            }
            for rect in &moves {
                frame.fill_rect_blended(*rect, MOVE_TILE_COLOR);
            }
            for rect in &spells {
                frame.fill_rect_blended(*rect, SPELL_TILE_COLOR);
            }
            if let Some(rect) = selected {
                frame.outline_rect(rect, SELECTED_TILE_COLOR);
            }
        });
    }
}
