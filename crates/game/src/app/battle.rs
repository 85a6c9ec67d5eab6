use std::collections::HashSet;
use std::path::Path;

use engine::{
    draw_text, find_path, layer, Actor, ActorGroup, BattleEntry, BattleTiles, Button, ButtonSet,
    DeathRule, GameEvent, GameState, GridPos, Key, LevelMap, LevelSurface, Rect, StateChange,
    StateContext, StateError, StateKind, Vec2,
};
use tracing::{debug, info};

use crate::app::load_actor_frames;
use crate::content;

pub const PLAYER_START_HEALTH: i32 = 10;
pub const ENEMY_START_HEALTH: i32 = 3;
pub const SPELL_DAMAGE: i32 = 1;
pub const ENEMY_ATTACK_DAMAGE: i32 = 1;

const SPELL_SPRITE: &str = "sprites/spell";
const BACKDROP_COLOR: [u8; 4] = [0, 0, 0, 255];
const HUD_SCALE: u32 = 2;
const HUD_COLOR: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BattleAction {
    Move,
    Spell,
    EndTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Valid tiles shown, waiting for the player to pick one.
    TileSelection,
    /// A tile is picked; waiting for the action button that commits it.
    ActionConfirmation,
    /// Player-side movement and projectiles in flight.
    Resolving,
    /// Enemy-side movement in flight.
    EnemyResolving,
}

/// Turn-based battle on the level's tile grid. Turns alternate between
/// the player (target tile, then action button) and every enemy, until
/// one side runs out.
pub struct BattleState {
    entry: BattleEntry,
    map: LevelMap,
    level: LevelSurface,
    tiles: BattleTiles,
    player: Actor,
    enemies: ActorGroup,
    spells: ActorGroup,
    spell_target: Option<GridPos>,
    buttons: ButtonSet<BattleAction>,
    phase: Phase,
    pending: Option<StateChange>,
}

impl BattleState {
    pub fn new(
        ctx: &mut StateContext,
        entry: BattleEntry,
        levels_dir: &Path,
    ) -> Result<Self, StateError> {
        let path = levels_dir.join(format!("{}.xml", entry.level));
        let map = content::load_level(&path, &mut ctx.assets)
            .map_err(|err| StateError::Construction(err.to_string()))?;
        Self::from_map(ctx, entry, map)
    }

    pub(crate) fn from_map(
        ctx: &mut StateContext,
        entry: BattleEntry,
        map: LevelMap,
    ) -> Result<Self, StateError> {
        let level = LevelSurface::load(&map, ctx.viewport.0)
            .map_err(|err| StateError::Construction(err.to_string()))?;
        let tile_size = level.tile_size();
        let mut tiles = BattleTiles::new(&map.objects, entry.scroll_px, tile_size);

        // The world hands over a world-space spawn; the battle grid
        // lives in screen space, so drop the scroll the world applied.
        let mut spawn = entry.return_to.spawn;
        spawn.y -= entry.scroll_px as f32;
        let frames = load_actor_frames(&mut ctx.assets, &entry.return_to.player_sprite);
        let mut player = Actor::new(
            "player",
            frames,
            spawn,
            ctx.viewport,
            PLAYER_START_HEALTH,
            DeathRule::HealthDepleted,
        );
        let player_tile = tile_of(&player, tile_size);
        center_on_tile(&mut player, player_tile, tile_size);

        let mut enemies = ActorGroup::new();
        let enemy_tile = enemy_spawn_tile(player_tile, &tiles, &map);
        let enemy_frames = load_actor_frames(&mut ctx.assets, &entry.enemy_sprite);
        let mut enemy = Actor::new(
            "enemy",
            enemy_frames,
            Vec2::default(),
            ctx.viewport,
            ENEMY_START_HEALTH,
            DeathRule::HealthDepleted,
        );
        center_on_tile(&mut enemy, enemy_tile, tile_size);
        enemies.push(enemy);

        tiles.refresh(player_tile);
        tiles.advance_turn();

        info!(
            level = entry.level.as_str(),
            player_col = player_tile.col,
            player_row = player_tile.row,
            enemy_col = enemy_tile.col,
            enemy_row = enemy_tile.row,
            "battle_started"
        );

        Ok(Self {
            entry,
            map,
            level,
            tiles,
            player,
            enemies,
            spells: ActorGroup::new(),
            spell_target: None,
            buttons: build_buttons(ctx.viewport),
            phase: Phase::TileSelection,
            pending: None,
        })
    }

    fn tile_size(&self) -> u32 {
        self.tiles.tile_size()
    }

    fn player_tile(&self) -> GridPos {
        tile_of(&self.player, self.tile_size())
    }

    fn in_player_turn(&self) -> bool {
        matches!(self.phase, Phase::TileSelection | Phase::ActionConfirmation)
    }

    /// A click on a valid tile picks it; anywhere else drops the pick.
    fn pick_tile(&mut self, point: Vec2) {
        let tile =
            GridPos::from_pixel(point.x.round() as i32, point.y.round() as i32, self.tile_size());
        if self.tiles.is_move_tile(tile) || self.tiles.is_spell_tile(tile) {
            self.tiles.selected_tile = Some(tile);
            self.phase = Phase::ActionConfirmation;
        } else {
            self.tiles.selected_tile = None;
            self.phase = Phase::TileSelection;
        }
    }

    fn confirm(&mut self, ctx: &mut StateContext, action: BattleAction) {
        if action == BattleAction::EndTurn {
            self.end_targeting();
            return;
        }
        let Some(tile) = self.tiles.selected_tile else {
            return;
        };
        match action {
            BattleAction::Move if self.tiles.is_move_tile(tile) => {
                let destination = top_left_for_tile(self.player.size(), tile, self.tile_size());
                self.player.move_to(destination);
                self.end_targeting();
            }
            BattleAction::Spell if self.tiles.is_spell_tile(tile) => {
                let frames = load_actor_frames(&mut ctx.assets, SPELL_SPRITE);
                let mut spell = Actor::new(
                    "spell",
                    frames,
                    self.player.position(),
                    ctx.viewport,
                    1,
                    DeathRule::Arrived,
                );
                let destination = top_left_for_tile(spell.size(), tile, self.tile_size());
                spell.move_to(destination);
                self.spells.push(spell);
                self.spell_target = Some(tile);
                self.end_targeting();
            }
            _ => {
                // The button does not match the picked tile's kind.
                self.tiles.selected_tile = None;
                self.phase = Phase::TileSelection;
            }
        }
    }

    /// Clearing the selection marks targeting as complete.
    fn end_targeting(&mut self) {
        self.tiles.clear_selection();
        self.phase = Phase::Resolving;
    }

    /// One action per living enemy: attack when adjacent, otherwise
    /// take the pathfinder's next step. A blocked path means the enemy
    /// holds position this turn.
    fn run_enemy_turn(&mut self) {
        let tile_size = self.tile_size();
        let player_tile = self.player_tile();
        let enemy_tiles: Vec<GridPos> = self
            .enemies
            .iter()
            .map(|enemy| tile_of(enemy, tile_size))
            .collect();

        let mut damage = 0;
        let mut moves: Vec<(usize, GridPos)> = Vec::new();
        for (index, enemy_tile) in enemy_tiles.iter().enumerate() {
            if enemy_tile.manhattan(player_tile) <= 1 {
                damage += ENEMY_ATTACK_DAMAGE;
                continue;
            }
            let mut obstacles: HashSet<GridPos> = self.tiles.solid.clone();
            for (other_index, other_tile) in enemy_tiles.iter().enumerate() {
                if other_index != index {
                    obstacles.insert(*other_tile);
                }
            }
            let outcome = find_path(*enemy_tile, player_tile, &obstacles);
            if let Some(next) = outcome.next_move {
                moves.push((index, next));
            }
        }

        if damage > 0 {
            self.player.take_damage(damage);
            debug!(damage, player_health = self.player.health(), "player_hit");
        }
        for (index, tile) in moves {
            if let Some(enemy) = self.enemies.iter_mut().nth(index) {
                let destination = top_left_for_tile(enemy.size(), tile, tile_size);
                enemy.move_to(destination);
            }
        }
    }

    fn resolve_spell_hits(&mut self, landed: Vec<Actor>) {
        if landed.is_empty() {
            return;
        }
        let Some(target) = self.spell_target.take() else {
            return;
        };
        let tile_size = self.tile_size();
        for enemy in self.enemies.iter_mut() {
            if tile_of(enemy, tile_size) == target {
                enemy.take_damage(SPELL_DAMAGE);
                debug!(
                    col = target.col,
                    row = target.row,
                    enemy_health = enemy.health(),
                    "spell_hit"
                );
            }
        }
    }
}

fn tile_of(actor: &Actor, tile_size: u32) -> GridPos {
    let center = actor.center();
    GridPos::from_pixel(center.x.round() as i32, center.y.round() as i32, tile_size)
}

fn tile_center(tile: GridPos, tile_size: u32) -> Vec2 {
    Vec2 {
        x: (tile.col * tile_size as i32) as f32 + tile_size as f32 / 2.0,
        y: (tile.row * tile_size as i32) as f32 + tile_size as f32 / 2.0,
    }
}

fn top_left_for_tile(size: (u32, u32), tile: GridPos, tile_size: u32) -> Vec2 {
    let center = tile_center(tile, tile_size);
    Vec2 {
        x: center.x - size.0 as f32 / 2.0,
        y: center.y - size.1 as f32 / 2.0,
    }
}

fn center_on_tile(actor: &mut Actor, tile: GridPos, tile_size: u32) {
    actor.set_position(top_left_for_tile(actor.size(), tile, tile_size));
}

/// First open tile a few columns from the player, scanning outward so
/// the encounter never spawns inside a wall.
fn enemy_spawn_tile(player: GridPos, tiles: &BattleTiles, map: &LevelMap) -> GridPos {
    let candidates = [
        GridPos::new(player.col + 3, player.row),
        GridPos::new(player.col - 3, player.row),
        GridPos::new(player.col, player.row + 3),
        GridPos::new(player.col, player.row - 3),
    ];
    for candidate in candidates {
        if in_grid(candidate, map) && !tiles.solid.contains(&candidate) {
            return candidate;
        }
    }
    for row in 0..map.rows as i32 {
        for col in 0..map.columns as i32 {
            let candidate = GridPos::new(col, row);
            if candidate != player && !tiles.solid.contains(&candidate) {
                return candidate;
            }
        }
    }
    GridPos::new(player.col + 3, player.row)
}

fn in_grid(tile: GridPos, map: &LevelMap) -> bool {
    tile.col >= 0 && tile.row >= 0 && tile.col < map.columns as i32 && tile.row < map.rows as i32
}

/// Action buttons sit in a row along the bottom edge.
fn build_buttons(viewport: (u32, u32)) -> ButtonSet<BattleAction> {
    let (width, height) = viewport;
    let button_w = (width / 6).max(1);
    let button_h = (height / 10).max(1);
    let y = height as i32 - button_h as i32 - 8;
    let gap = (button_w / 4) as i32;
    let entries = [
        ("MOVE", BattleAction::Move),
        ("SPELL", BattleAction::Spell),
        ("END TURN", BattleAction::EndTurn),
    ];
    let total = entries.len() as i32 * button_w as i32 + (entries.len() as i32 - 1) * gap;
    let first_x = (width as i32 - total) / 2;
    ButtonSet::new(
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (label, action))| {
                let x = first_x + index as i32 * (button_w as i32 + gap);
                Button::new(label, Rect::new(x, y, button_w, button_h), action)
            })
            .collect(),
    )
}

impl GameState for BattleState {
    fn kind(&self) -> StateKind {
        StateKind::Battle
    }

    fn on_event(&mut self, ctx: &mut StateContext, event: GameEvent) {
        match event {
            GameEvent::KeyPressed(Key::Escape) => {
                self.pending = Some(StateChange::ToWorld(self.entry.return_to.clone()));
            }
            GameEvent::KeyPressed(key) => {
                if self.in_player_turn() {
                    if let Some(action) = self.buttons.handle_key(key) {
                        self.confirm(ctx, action);
                    }
                }
            }
            GameEvent::PointerPressed(point) => {
                if !self.in_player_turn() {
                    return;
                }
                if let Some(action) = self.buttons.handle_pointer(point) {
                    self.confirm(ctx, action);
                } else {
                    self.pick_tile(point);
                }
            }
        }
    }

    fn update(&mut self, ctx: &mut StateContext, elapsed_ms: f32) -> Option<StateChange> {
        self.player.update(elapsed_ms);
        self.player.animate(elapsed_ms);
        self.enemies.update(elapsed_ms);
        let landed = self.spells.update(elapsed_ms);
        self.resolve_spell_hits(landed);

        match self.phase {
            Phase::Resolving => {
                if !self.player.is_moving() && self.spells.is_empty() {
                    self.run_enemy_turn();
                    self.phase = Phase::EnemyResolving;
                }
            }
            Phase::EnemyResolving => {
                if self.enemies.iter().all(|enemy| !enemy.is_moving()) {
                    self.tiles.advance_turn();
                    self.tiles.refresh(self.player_tile());
                    self.phase = Phase::TileSelection;
                }
            }
            _ => {}
        }

        if self.enemies.is_empty() && self.pending.is_none() {
            info!(turns = self.tiles.turn, "battle_won");
            self.pending = Some(StateChange::ToWorld(self.entry.return_to.clone()));
        }
        if self.player.is_dead() && self.pending.is_none() {
            info!(turns = self.tiles.turn, "battle_lost");
            self.pending = Some(StateChange::ToMenu);
        }

        ctx.queue
            .call(layer::BACKGROUND, |frame| frame.fill(BACKDROP_COLOR));
        self.level
            .draw(&mut ctx.queue, layer::BACKGROUND, self.entry.scroll_px);
        if self.in_player_turn() {
            self.tiles.draw(&mut ctx.queue);
        }
        self.enemies.draw(&mut ctx.queue, layer::ACTORS, 0);
        self.spells.draw(&mut ctx.queue, layer::ACTORS, 0);
        self.player.draw(&mut ctx.queue, layer::ACTORS, 0);
        if self.in_player_turn() {
            self.buttons.hover(ctx.cursor);
            self.buttons.draw(&mut ctx.queue);
        }

        let hud = format!("HP:{} TURN:{}", self.player.health().max(0), self.tiles.turn);
        ctx.queue.call(layer::TEXT, move |frame| {
            draw_text(frame, 8, 8, HUD_SCALE, HUD_COLOR, &hud);
        });

        self.pending.take()
    }

    /// Resize mid-battle: rebuild the surface and tile grid at the new
    /// tile size and lay the action buttons out again. The turn counter
    /// and picked tile survive the rebuild.
    fn scale(&mut self, ctx: &mut StateContext, multiplier: f32) {
        if self.level.reload(&self.map, ctx.viewport.0).is_err() {
            return;
        }
        self.player.rescale(multiplier);
        self.enemies.rescale(multiplier);
        self.spells.rescale(multiplier);
        let turn = self.tiles.turn;
        let selected = self.tiles.selected_tile;
        self.tiles = BattleTiles::new(&self.map.objects, self.entry.scroll_px, self.level.tile_size());
        self.tiles.turn = turn;
        self.tiles.selected_tile = selected;
        if self.in_player_turn() {
            self.tiles.refresh(self.player_tile());
        }
        self.buttons = build_buttons(ctx.viewport);
    }

    fn exit(&mut self, _ctx: &mut StateContext) {
        info!(turns = self.tiles.turn, "battle_left");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::rc::Rc;

    use engine::{
        AssetCache, DialogueTable, LevelLayer, LevelTile, Surface, WorldEntry,
        FRAME_TIME_BASELINE_MS,
    };

    fn test_ctx() -> StateContext {
        StateContext::new(
            (320, 240),
            AssetCache::new("assets"),
            DialogueTable::default(),
        )
    }

    fn open_map() -> LevelMap {
        let mut tiles = HashMap::new();
        tiles.insert(
            1,
            LevelTile {
                surface: Rc::new(Surface::filled(4, 4, [90, 90, 90, 255])),
                animation: Vec::new(),
            },
        );
        LevelMap {
            columns: 10,
            rows: 10,
            tiles,
            layers: vec![LevelLayer {
                name: "ground".into(),
                cells: vec![1; 100],
            }],
            objects: Vec::new(),
        }
    }

    fn entry() -> BattleEntry {
        BattleEntry {
            level: "overworld".into(),
            scroll_px: 0,
            enemy_sprite: "sprites/enemy".into(),
            return_to: WorldEntry {
                level: "overworld".into(),
                spawn: Vec2 { x: 150.0, y: 120.0 },
                player_sprite: "sprites/player".into(),
            },
        }
    }

    fn battle() -> (StateContext, BattleState) {
        let mut ctx = test_ctx();
        let state = BattleState::from_map(&mut ctx, entry(), open_map()).expect("battle");
        (ctx, state)
    }

    fn settle(ctx: &mut StateContext, state: &mut BattleState) {
        for _ in 0..5000 {
            state.update(ctx, FRAME_TIME_BASELINE_MS);
            ctx.queue.clear();
            if state.phase == Phase::TileSelection {
                return;
            }
        }
        panic!("battle never settled back to tile selection");
    }

    #[test]
    fn player_starts_centered_on_a_tile() {
        let (_ctx, state) = battle();
        let tile_size = state.tile_size() as f32;
        let center = state.player.center();
        assert!((center.x % tile_size - tile_size / 2.0).abs() < 1.0);
        assert!((center.y % tile_size - tile_size / 2.0).abs() < 1.0);
    }

    #[test]
    fn scrolled_entry_keeps_player_inside_the_viewport() {
        let mut ctx = test_ctx();
        let mut scrolled = entry();
        scrolled.scroll_px = 200;
        scrolled.return_to.spawn = Vec2 { x: 150.0, y: 400.0 };
        let state = BattleState::from_map(&mut ctx, scrolled, open_map()).expect("battle");
        let rect = state.player.rect();
        assert!(rect.y >= 0);
        assert!(rect.bottom() <= 240);
        assert!(state
            .tiles
            .is_move_tile(GridPos::new(state.player_tile().col + 1, state.player_tile().row)));
    }

    #[test]
    fn enemy_spawns_on_an_open_tile_away_from_player() {
        let (_ctx, state) = battle();
        let enemy_tile = tile_of(state.enemies.iter().next().expect("enemy"), state.tile_size());
        assert!(enemy_tile.manhattan(state.player_tile()) >= 3);
    }

    #[test]
    fn first_turn_waits_on_a_tile_pick() {
        let (_ctx, state) = battle();
        assert_eq!(state.phase, Phase::TileSelection);
        assert_eq!(state.tiles.turn, 1);
        assert!(!state.tiles.move_tiles.is_empty());
        assert_eq!(state.tiles.selected_tile, None);
    }

    #[test]
    fn picking_a_move_tile_then_confirming_walks_player() {
        let (mut ctx, mut state) = battle();
        let start_tile = state.player_tile();
        let target = GridPos::new(start_tile.col + 1, start_tile.row);
        let click = tile_center(target, state.tile_size());
        state.on_event(&mut ctx, GameEvent::PointerPressed(click));
        assert_eq!(state.phase, Phase::ActionConfirmation);
        assert_eq!(state.tiles.selected_tile, Some(target));

        state.confirm(&mut ctx, BattleAction::Move);
        assert_eq!(state.phase, Phase::Resolving);
        assert_eq!(state.tiles.selected_tile, None);

        settle(&mut ctx, &mut state);
        assert_eq!(state.player_tile(), target);
        assert_eq!(state.tiles.turn, 2);
    }

    #[test]
    fn clicking_elsewhere_drops_the_picked_tile() {
        let (mut ctx, mut state) = battle();
        let start_tile = state.player_tile();
        let target = GridPos::new(start_tile.col, start_tile.row + 1);
        state.on_event(
            &mut ctx,
            GameEvent::PointerPressed(tile_center(target, state.tile_size())),
        );
        assert_eq!(state.phase, Phase::ActionConfirmation);

        let far = tile_center(GridPos::new(9, 0), state.tile_size());
        state.on_event(&mut ctx, GameEvent::PointerPressed(far));
        assert_eq!(state.phase, Phase::TileSelection);
        assert_eq!(state.tiles.selected_tile, None);
        assert!(!state.tiles.move_tiles.is_empty());
    }

    #[test]
    fn mismatched_button_returns_to_tile_selection() {
        let (mut ctx, mut state) = battle();
        let start_tile = state.player_tile();
        let move_target = GridPos::new(start_tile.col + 1, start_tile.row);
        state.on_event(
            &mut ctx,
            GameEvent::PointerPressed(tile_center(move_target, state.tile_size())),
        );
        assert!(!state.tiles.is_spell_tile(move_target));
        state.confirm(&mut ctx, BattleAction::Spell);
        assert_eq!(state.phase, Phase::TileSelection);
        assert_eq!(state.tiles.selected_tile, None);
    }

    #[test]
    fn enemy_closes_in_while_player_ends_turn() {
        let (mut ctx, mut state) = battle();
        let tile_size = state.tile_size();
        let before = tile_of(state.enemies.iter().next().expect("enemy"), tile_size)
            .manhattan(state.player_tile());

        state.confirm(&mut ctx, BattleAction::EndTurn);
        assert_eq!(state.phase, Phase::Resolving);
        settle(&mut ctx, &mut state);

        let after = tile_of(state.enemies.iter().next().expect("enemy"), tile_size)
            .manhattan(state.player_tile());
        assert!(after < before);
    }

    #[test]
    fn adjacent_enemy_attacks_instead_of_moving() {
        let (mut ctx, mut state) = battle();
        let player_tile = state.player_tile();
        let beside = GridPos::new(player_tile.col + 1, player_tile.row);
        let tile_size = state.tile_size();
        if let Some(enemy) = state.enemies.iter_mut().next() {
            center_on_tile(enemy, beside, tile_size);
        }

        state.confirm(&mut ctx, BattleAction::EndTurn);
        settle(&mut ctx, &mut state);
        assert_eq!(
            state.player.health(),
            PLAYER_START_HEALTH - ENEMY_ATTACK_DAMAGE
        );
    }

    fn wall(col: i32, row: i32, tile_size: u32) -> engine::LevelObject {
        engine::LevelObject {
            name: format!("wall_{col}_{row}"),
            rect: Rect::new(col * tile_size as i32, row * tile_size as i32, tile_size, tile_size),
            solid: true,
            active: false,
            next_node: None,
            action: None,
        }
    }

    #[test]
    fn three_spells_defeat_the_enemy_and_return_to_world() {
        // Pen the enemy on a spell tile two columns right of the player
        // so it cannot step off between casts.
        let mut ctx = test_ctx();
        let mut map = open_map();
        let tile_size = 320 / map.columns;
        map.objects = vec![
            wall(5, 3, tile_size),
            wall(7, 3, tile_size),
            wall(6, 2, tile_size),
            wall(6, 4, tile_size),
        ];
        let mut state = BattleState::from_map(&mut ctx, entry(), map).expect("battle");

        let player_tile = state.player_tile();
        assert_eq!(player_tile, GridPos::new(4, 3));
        let target = GridPos::new(6, 3);
        let tile_size = state.tile_size();
        if let Some(enemy) = state.enemies.iter_mut().next() {
            center_on_tile(enemy, target, tile_size);
        }

        let mut outcome = None;
        for _ in 0..ENEMY_START_HEALTH {
            assert!(state.tiles.is_spell_tile(target));
            let click = tile_center(target, tile_size);
            state.on_event(&mut ctx, GameEvent::PointerPressed(click));
            assert_eq!(state.tiles.selected_tile, Some(target));
            state.confirm(&mut ctx, BattleAction::Spell);
            for _ in 0..5000 {
                if let Some(change) = state.update(&mut ctx, FRAME_TIME_BASELINE_MS) {
                    outcome = Some(change);
                    break;
                }
                ctx.queue.clear();
                if state.phase == Phase::TileSelection {
                    break;
                }
            }
            if outcome.is_some() {
                break;
            }
        }

        match outcome {
            Some(StateChange::ToWorld(world)) => assert_eq!(world.level, "overworld"),
            other => panic!("expected return to world, got {other:?}"),
        }
    }

    #[test]
    fn escape_flees_back_to_world() {
        let (mut ctx, mut state) = battle();
        state.on_event(&mut ctx, GameEvent::KeyPressed(Key::Escape));
        match state.update(&mut ctx, 16.0) {
            Some(StateChange::ToWorld(world)) => {
                assert_eq!(world.spawn, entry().return_to.spawn);
            }
            other => panic!("expected flee to world, got {other:?}"),
        }
    }

    #[test]
    fn resize_rebuilds_buttons_and_keeps_the_turn() {
        let (mut ctx, mut state) = battle();
        let old_tile = state.tile_size();
        ctx.viewport = (640, 480);
        state.scale(&mut ctx, 2.0);
        assert_eq!(state.tile_size(), old_tile * 2);
        assert_eq!(state.buttons.len(), 3);
        assert_eq!(state.tiles.turn, 1);
        assert!(!state.tiles.move_tiles.is_empty());
    }
}
