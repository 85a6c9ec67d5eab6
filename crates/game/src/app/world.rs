use std::path::Path;

use engine::{
    layer, scroll_offset, Actor, ActorGroup, BattleEntry, DeathRule, GameEvent, GameState, Key,
    LevelMap, LevelSurface, PathBehavior, Rect, ScrollCarry, StateChange, StateContext,
    StateError, StateKind, TextBox, Vec2, WorldEntry,
};
use tracing::{debug, info};

use crate::app::load_actor_frames;
use crate::content;

pub const PLAYER_START_HEALTH: i32 = 10;
const NPC_HEALTH: i32 = 1;
const TEXT_SCALE: u32 = 3;
const TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const TEXT_MARGIN: u32 = 40;
const BACKDROP_COLOR: [u8; 4] = [0, 0, 0, 255];
const NODE_MARKER_COLOR: [u8; 4] = [240, 220, 80, 255];

/// What stepping onto an active level node does.
enum NodeTrigger {
    Battle,
    Dialogue(String),
    Teleport(String),
}

/// Exploration: the player walks a scrolling level, talks to nodes and
/// stumbles into battles.
pub struct WorldState {
    entry: WorldEntry,
    map: LevelMap,
    level: LevelSurface,
    player: Actor,
    npcs: ActorGroup,
    scroll: ScrollCarry,
    text_box: Option<TextBox>,
    standing_on: Option<String>,
    pending: Option<StateChange>,
    last_scroll: Option<i32>,
    prev_actor_rects: Vec<Rect>,
}

impl WorldState {
    pub fn new(
        ctx: &mut StateContext,
        entry: WorldEntry,
        levels_dir: &Path,
    ) -> Result<Self, StateError> {
        let path = levels_dir.join(format!("{}.xml", entry.level));
        let map = content::load_level(&path, &mut ctx.assets)
            .map_err(|err| StateError::Construction(err.to_string()))?;
        Self::from_map(ctx, entry, map)
    }

    pub(crate) fn from_map(
        ctx: &mut StateContext,
        entry: WorldEntry,
        map: LevelMap,
    ) -> Result<Self, StateError> {
        let level = LevelSurface::load(&map, ctx.viewport.0)
            .map_err(|err| StateError::Construction(err.to_string()))?;
        let frames = load_actor_frames(&mut ctx.assets, &entry.player_sprite);
        let player = Actor::new(
            "player",
            frames,
            entry.spawn,
            ctx.viewport,
            PLAYER_START_HEALTH,
            DeathRule::HealthDepleted,
        );
        let npcs = spawn_npcs(ctx, &map);
        info!(
            level = entry.level.as_str(),
            npc_count = npcs.len(),
            "world_entered"
        );
        Ok(Self {
            entry,
            map,
            level,
            player,
            npcs,
            scroll: ScrollCarry::new(),
            text_box: None,
            standing_on: None,
            pending: None,
            last_scroll: None,
            prev_actor_rects: Vec::new(),
        })
    }

    fn advance_text(&mut self) {
        if let Some(text_box) = &mut self.text_box {
            if !text_box.advance() {
                self.text_box = None;
                // The closed box leaves stale pixels behind.
                self.last_scroll = None;
            }
        }
    }

    fn order_move(&mut self, point: Vec2) {
        let (width, height) = self.player.size();
        let destination = Vec2 {
            x: point.x - width as f32 / 2.0,
            y: point.y + self.scroll.applied_px() as f32 - height as f32 / 2.0,
        };
        self.player.move_to(destination);
    }

    /// The active node under the player's center, if it differs from
    /// the one already triggered.
    fn fresh_node(&self) -> Option<(String, NodeTrigger)> {
        let center = self.player.center();
        let node = self
            .map
            .objects
            .iter()
            .find(|object| object.active && object.rect.contains_point(center))?;
        if self.standing_on.as_deref() == Some(node.name.as_str()) {
            return None;
        }
        let trigger = match node.action.as_deref() {
            Some("battle") => NodeTrigger::Battle,
            _ => match &node.next_node {
                Some(target) => NodeTrigger::Teleport(target.clone()),
                None => NodeTrigger::Dialogue(node.name.clone()),
            },
        };
        Some((node.name.clone(), trigger))
    }

    /// Active nodes show up as small dots so the player can find them.
    fn draw_node_markers(&self, ctx: &mut StateContext, scroll_px: i32) {
        let radius = (self.level.tile_size() / 4).max(2) as i32;
        let centers: Vec<(i32, i32)> = self
            .map
            .objects
            .iter()
            .filter(|object| object.active)
            .map(|object| {
                (
                    object.rect.x + object.rect.w as i32 / 2,
                    object.rect.y + object.rect.h as i32 / 2 - scroll_px,
                )
            })
            .collect();
        if centers.is_empty() {
            return;
        }
        ctx.queue.call(layer::BUTTONS, move |frame| {
            for (x, y) in centers {
                frame.fill_circle(x, y, radius, NODE_MARKER_COLOR);
            }
        });
    }

    fn fire_trigger(&mut self, ctx: &mut StateContext, trigger: NodeTrigger) {
        match trigger {
            NodeTrigger::Battle => {
                self.pending = Some(StateChange::ToBattle(BattleEntry {
                    level: self.entry.level.clone(),
                    scroll_px: self.scroll.applied_px(),
                    enemy_sprite: "sprites/enemy".to_string(),
                    return_to: WorldEntry {
                        level: self.entry.level.clone(),
                        spawn: self.player.position(),
                        player_sprite: self.entry.player_sprite.clone(),
                    },
                }));
            }
            NodeTrigger::Dialogue(key) => {
                if let Some(line) = ctx.dialogue.line_or_warn(&key) {
                    let max_width = ctx.viewport.0.saturating_sub(TEXT_MARGIN * 2);
                    self.text_box = Some(TextBox::new(
                        line,
                        Vec2 {
                            x: TEXT_MARGIN as f32,
                            y: ctx.viewport.1 as f32 * 0.7,
                        },
                        max_width,
                        TEXT_SCALE,
                        TEXT_COLOR,
                    ));
                }
            }
            NodeTrigger::Teleport(target) => {
                if let Some(node) = self.map.objects.iter().find(|object| object.name == target)
                {
                    let destination = Vec2 {
                        x: node.rect.x as f32,
                        y: node.rect.y as f32,
                    };
                    debug!(target = target.as_str(), "player_teleported");
                    self.player.stop();
                    self.player.set_position(destination);
                }
            }
        }
    }
}

fn spawn_npcs(ctx: &mut StateContext, map: &LevelMap) -> ActorGroup {
    let mut npcs = ActorGroup::new();
    for object in &map.objects {
        if !object.name.starts_with("npc") {
            continue;
        }
        let sprite = object.action.as_deref().unwrap_or("sprites/npc");
        let frames = load_actor_frames(&mut ctx.assets, sprite);
        let position = Vec2 {
            x: object.rect.x as f32,
            y: object.rect.y as f32,
        };
        let mut npc = Actor::new(
            object.name.clone(),
            frames,
            position,
            ctx.viewport,
            NPC_HEALTH,
            DeathRule::HealthDepleted,
        );
        if let Some(target_name) = &object.next_node {
            if let Some(target) = map.objects.iter().find(|other| &other.name == target_name) {
                npc = npc.with_path(PathBehavior::Waypoints {
                    points: vec![
                        Vec2 {
                            x: target.rect.x as f32,
                            y: target.rect.y as f32,
                        },
                        position,
                    ],
                    next: 0,
                });
            }
        }
        npcs.push(npc);
    }
    npcs
}

impl GameState for WorldState {
    fn kind(&self) -> StateKind {
        StateKind::World
    }

    fn on_event(&mut self, _ctx: &mut StateContext, event: GameEvent) {
        match event {
            GameEvent::KeyPressed(Key::Escape) => self.pending = Some(StateChange::ToMenu),
            GameEvent::KeyPressed(Key::Return) => self.advance_text(),
            GameEvent::PointerPressed(point) => {
                if self.text_box.is_some() {
                    self.advance_text();
                } else {
                    self.order_move(point);
                }
            }
            GameEvent::KeyPressed(_) => {}
        }
    }

    fn update(&mut self, ctx: &mut StateContext, elapsed_ms: f32) -> Option<StateChange> {
        self.player.update(elapsed_ms);
        self.player.animate(elapsed_ms);
        self.npcs.update(elapsed_ms);

        let target = scroll_offset(
            self.player.center().y,
            self.level.height_px() as f32,
            ctx.viewport.1 as f32,
        );
        self.scroll.advance(target);
        let scroll_px = self.scroll.applied_px();

        let animated = self.level.animate(elapsed_ms);
        let mut actor_rects = Vec::with_capacity(self.npcs.len() + 1);
        actor_rects.push(self.player.rect());
        for npc in self.npcs.iter() {
            actor_rects.push(npc.rect());
        }

        if self.last_scroll == Some(scroll_px) {
            // Scroll held still: repaint only where something moved.
            for rect in self
                .prev_actor_rects
                .iter()
                .chain(actor_rects.iter())
                .chain(animated.iter())
            {
                self.level
                    .draw_area(&mut ctx.queue, layer::BACKGROUND, rect.inflated(1), scroll_px);
            }
        } else {
            ctx.queue
                .call(layer::BACKGROUND, |frame| frame.fill(BACKDROP_COLOR));
            self.level.draw(&mut ctx.queue, layer::BACKGROUND, scroll_px);
        }
        self.last_scroll = Some(scroll_px);
        self.prev_actor_rects = actor_rects;

        self.draw_node_markers(ctx, scroll_px);
        self.npcs.draw(&mut ctx.queue, layer::ACTORS, scroll_px);
        self.player.draw(&mut ctx.queue, layer::ACTORS, scroll_px);

        if self.text_box.is_none() {
            match self.fresh_node() {
                Some((name, trigger)) => {
                    self.standing_on = Some(name);
                    self.fire_trigger(ctx, trigger);
                }
                None => {
                    let center = self.player.center();
                    let still_inside = self.standing_on.as_deref().is_some_and(|name| {
                        self.map
                            .objects
                            .iter()
                            .any(|object| object.name == name && object.rect.contains_point(center))
                    });
                    if !still_inside {
                        self.standing_on = None;
                    }
                }
            }
        }

        if let Some(text_box) = &self.text_box {
            text_box.draw(&mut ctx.queue, layer::TEXT);
        }

        self.pending.take()
    }

    fn scale(&mut self, ctx: &mut StateContext, multiplier: f32) {
        if self.level.reload(&self.map, ctx.viewport.0).is_ok() {
            self.player.rescale(multiplier);
            self.npcs.rescale(multiplier);
            if let Some(text_box) = &mut self.text_box {
                text_box.rescale(multiplier);
            }
            self.scroll.reset();
            self.last_scroll = None;
        }
    }

    fn exit(&mut self, _ctx: &mut StateContext) {
        info!(level = self.entry.level.as_str(), "world_left");
    }
}
