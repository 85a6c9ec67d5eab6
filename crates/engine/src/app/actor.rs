use std::rc::Rc;

use crate::app::queue::RenderQueue;
use crate::app::surface::{Rect, Surface, Vec2};

/// Reference frame duration the movement model was tuned against.
/// Elapsed wall time is expressed in multiples of this when stepping.
pub const FRAME_TIME_BASELINE_MS: f32 = 16.67;

/// Milliseconds each animation frame is held.
pub const ANIMATION_FRAME_MS: f32 = 100.0;

/// Fraction of the viewport width an actor occupies.
pub const ACTOR_WIDTH_FRACTION: f32 = 0.04;

/// When an actor counts as dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathRule {
    /// Dead once health reaches zero.
    HealthDepleted,
    /// Dead on reaching its movement destination (projectiles).
    Arrived,
}

/// How an actor picks its next destination when it has none.
#[derive(Debug, Clone, PartialEq)]
pub enum PathBehavior {
    /// Moves only when told to.
    Stationary,
    /// Walks the waypoint list in order; loops back to the start.
    Waypoints { points: Vec<Vec2>, next: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Still,
    MovingLeft,
    MovingRight,
}

/// Animation frames for both facings. Left-facing frames are mirrored
/// from the supplied art once, up front.
pub struct ActorFrames {
    right: Vec<Rc<Surface>>,
    left: Vec<Rc<Surface>>,
}

impl ActorFrames {
    pub fn from_surfaces(frames: Vec<Rc<Surface>>) -> Self {
        let left = frames
            .iter()
            .map(|frame| Rc::new(frame.flipped_horizontal()))
            .collect();
        Self {
            right: frames,
            left,
        }
    }

    pub fn single(surface: Rc<Surface>) -> Self {
        Self::from_surfaces(vec![surface])
    }

    pub fn len(&self) -> usize {
        self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.right.is_empty()
    }

    fn frame(&self, state: ActorState, index: usize) -> &Rc<Surface> {
        let set = match state {
            ActorState::MovingLeft => &self.left,
            _ => &self.right,
        };
        &set[index % set.len().max(1)]
    }
}

/// A moving, animated game object: the player, NPCs, enemies and
/// projectiles are all actors with different death rules and paths.
pub struct Actor {
    pub name: String,
    position: Vec2,
    width: u32,
    height: u32,
    frames: ActorFrames,
    rendered: Vec<Option<Rc<Surface>>>,
    state: ActorState,
    frame_index: usize,
    frame_timer_ms: f32,
    max_speed: f32,
    velocity: Vec2,
    steps_remaining: f32,
    destination: Option<Vec2>,
    arrived: bool,
    health: i32,
    death_rule: DeathRule,
    path: PathBehavior,
}

impl Actor {
    /// `viewport` sizes the actor and its speed: width is a fixed
    /// fraction of the viewport width, max speed a fixed fraction of
    /// its height, so actors feel the same at any resolution.
    pub fn new(
        name: impl Into<String>,
        frames: ActorFrames,
        position: Vec2,
        viewport: (u32, u32),
        health: i32,
        death_rule: DeathRule,
    ) -> Self {
        let width = ((viewport.0 as f32 * ACTOR_WIDTH_FRACTION).round() as u32).max(1);
        let (art_w, art_h) = frames.right.first().map(|f| f.size()).unwrap_or((1, 1));
        let height = ((width as f32 * art_h as f32 / art_w.max(1) as f32).round() as u32).max(1);
        let rendered = vec![None; frames.len().max(1) * 2];
        Self {
            name: name.into(),
            position,
            width,
            height,
            frames,
            rendered,
            state: ActorState::Still,
            frame_index: 0,
            frame_timer_ms: ANIMATION_FRAME_MS,
            max_speed: viewport.1 as f32 / 240.0,
            velocity: Vec2::default(),
            steps_remaining: 0.0,
            destination: None,
            arrived: false,
            health,
            death_rule,
            path: PathBehavior::Stationary,
        }
    }

    pub fn with_path(mut self, path: PathBehavior) -> Self {
        self.path = path;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
            self.width,
            self.height,
        )
    }

    /// Bounding rect in the actor's own coordinate space.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x.floor() as i32,
            self.position.y.floor() as i32,
            self.width + 1,
            self.height + 1,
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.position.x + self.width as f32 / 2.0,
            y: self.position.y + self.height as f32 / 2.0,
        }
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.destination.is_some()
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.health -= amount;
    }

    pub fn is_dead(&self) -> bool {
        match self.death_rule {
            DeathRule::HealthDepleted => self.health <= 0,
            DeathRule::Arrived => self.arrived,
        }
    }

    /// Start moving toward `destination` at max speed. The move is
    /// resolved in baseline-frame steps so travel time is independent
    /// of the actual frame rate.
    pub fn move_to(&mut self, destination: Vec2) {
        let delta = Vec2 {
            x: destination.x - self.position.x,
            y: destination.y - self.position.y,
        };
        let distance = (delta.x * delta.x + delta.y * delta.y).sqrt();
        let steps = (distance / self.max_speed).max(1.0);
        self.velocity = Vec2 {
            x: delta.x / steps,
            y: delta.y / steps,
        };
        self.steps_remaining = steps;
        self.destination = Some(destination);
        self.arrived = false;
        self.state = if delta.x < 0.0 {
            ActorState::MovingLeft
        } else {
            ActorState::MovingRight
        };
    }

    pub fn stop(&mut self) {
        self.destination = None;
        self.steps_remaining = 0.0;
        self.velocity = Vec2::default();
        self.state = ActorState::Still;
    }

    /// Advance movement by `elapsed_ms` of wall time. Snaps to the
    /// destination on the final step. When idle with a waypoint path,
    /// heads for the next waypoint.
    pub fn update(&mut self, elapsed_ms: f32) {
        if let Some(destination) = self.destination {
            let ticks = elapsed_ms / FRAME_TIME_BASELINE_MS;
            let advance = ticks.min(self.steps_remaining);
            self.position.x += self.velocity.x * advance;
            self.position.y += self.velocity.y * advance;
            self.steps_remaining -= ticks;
            if self.steps_remaining <= 0.0 {
                self.position = destination;
                self.destination = None;
                self.velocity = Vec2::default();
                self.arrived = true;
                self.state = ActorState::Still;
            }
        } else if let PathBehavior::Waypoints { points, next } = &mut self.path {
            if !points.is_empty() {
                let target = points[*next % points.len()];
                *next = (*next + 1) % points.len();
                self.move_to(target);
            }
        }
    }

    /// Advance the animation clock. Remainders carry across calls.
    pub fn animate(&mut self, elapsed_ms: f32) {
        if self.frames.len() <= 1 {
            return;
        }
        self.frame_timer_ms -= elapsed_ms;
        while self.frame_timer_ms <= 0.0 {
            self.frame_index = (self.frame_index + 1) % self.frames.len();
            self.frame_timer_ms += ANIMATION_FRAME_MS;
        }
    }

    /// Queue the current frame, shifted up by `scroll_px`.
    pub fn draw(&mut self, queue: &mut RenderQueue, layer: i32, scroll_px: i32) {
        let facing_offset = match self.state {
            ActorState::MovingLeft => self.frames.len().max(1),
            _ => 0,
        };
        let slot = facing_offset + self.frame_index % self.frames.len().max(1);
        if self.rendered[slot].is_none() {
            let frame = self.frames.frame(self.state, self.frame_index);
            self.rendered[slot] = Some(Rc::new(frame.scaled(self.width, self.height)));
        }
        if let Some(surface) = &self.rendered[slot] {
            queue.blit(
                layer,
                Rc::clone(surface),
                Vec2 {
                    x: self.position.x,
                    y: self.position.y - scroll_px as f32,
                },
            );
        }
    }

    /// Rescale for a window size change by `multiplier`.
    pub fn rescale(&mut self, multiplier: f32) {
        self.position.x *= multiplier;
        self.position.y *= multiplier;
        self.width = ((self.width as f32 * multiplier).round() as u32).max(1);
        self.height = ((self.height as f32 * multiplier).round() as u32).max(1);
        self.max_speed *= multiplier;
        self.velocity.x *= multiplier;
        self.velocity.y *= multiplier;
        if let Some(destination) = &mut self.destination {
            destination.x *= multiplier;
            destination.y *= multiplier;
        }
        if let PathBehavior::Waypoints { points, .. } = &mut self.path {
            for point in points {
                point.x *= multiplier;
                point.y *= multiplier;
            }
        }
        for slot in &mut self.rendered {
            *slot = None;
        }
    }
}

/// A batch of actors updated and drawn together. Dead actors are
/// dropped during update.
#[derive(Default)]
pub struct ActorGroup {
    actors: Vec<Actor>,
}

impl ActorGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, actor: Actor) {
        self.actors.push(actor);
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.iter_mut()
    }

    pub fn find(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|actor| actor.name == name)
    }

    /// Update movement and animation, then drop the dead. Returns the
    /// actors removed this pass so callers can react to kills.
    pub fn update(&mut self, elapsed_ms: f32) -> Vec<Actor> {
        for actor in &mut self.actors {
            actor.update(elapsed_ms);
            actor.animate(elapsed_ms);
        }
        let mut removed = Vec::new();
        let mut index = 0;
        while index < self.actors.len() {
            if self.actors[index].is_dead() {
                removed.push(self.actors.remove(index));
            } else {
                index += 1;
            }
        }
        removed
    }

    pub fn draw(&mut self, queue: &mut RenderQueue, layer: i32, scroll_px: i32) {
        for actor in &mut self.actors {
            actor.draw(queue, layer, scroll_px);
        }
    }

    pub fn rescale(&mut self, multiplier: f32) {
        for actor in &mut self.actors {
            actor.rescale(multiplier);
        }
    }
}
