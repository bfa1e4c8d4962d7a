//! The authoritative entity store and per-tick world update.

use crate::mailbox::InputChannel;
use log::{debug, info};
use rand::Rng;
use shared::grid::CollisionGrid;
use shared::{sim, Entity, EntityView, PLAYER_RADIUS, WORLD_HEIGHT, WORLD_WIDTH};
use std::collections::BTreeMap;

/// Server-side world: one entity per connection plus their input slots.
///
/// Entities are kept in a `BTreeMap` so every iteration (including the
/// pairwise collision pass inside the simulation step) follows stable,
/// ascending id order.
pub struct World {
    entities: BTreeMap<u32, Entity>,
    inputs: InputChannel,
    grid: Option<CollisionGrid>,
}

impl World {
    pub fn new(grid: Option<CollisionGrid>) -> Self {
        Self {
            entities: BTreeMap::new(),
            inputs: InputChannel::new(),
            grid,
        }
    }

    /// Spawns an entity for a new connection and returns its wire view.
    ///
    /// With a tile map the spawn is drawn from walkable cells; without one
    /// it is uniform inside the world bounds, inset by the player radius.
    pub fn add_player<R: Rng>(&mut self, id: u32, rng: &mut R) -> EntityView {
        let (x, y) = match &self.grid {
            Some(grid) => grid.find_walkable_spawn(rng),
            None => (
                rng.gen_range(PLAYER_RADIUS..WORLD_WIDTH - PLAYER_RADIUS),
                rng.gen_range(PLAYER_RADIUS..WORLD_HEIGHT - PLAYER_RADIUS),
            ),
        };

        let entity = Entity::new(id, x, y, random_color(rng));
        let view = entity.view();
        self.entities.insert(id, entity);
        info!("player {} spawned at ({:.1}, {:.1})", id, x, y);
        view
    }

    /// Removes a disconnected player and its input slot. Returns false if
    /// the id was already gone.
    pub fn remove_player(&mut self, id: u32) -> bool {
        self.inputs.remove(id);
        if self.entities.remove(&id).is_some() {
            info!("player {} removed", id);
            true
        } else {
            false
        }
    }

    /// Records the latest movement intent for a connection. Intents for
    /// unknown ids (not yet registered or already disconnected) are
    /// silently dropped.
    pub fn set_input(&mut self, id: u32, dx: f32, dy: f32) {
        if !self.entities.contains_key(&id) {
            debug!("input for unknown player {}, ignoring", id);
            return;
        }
        self.inputs.set(id, dx, dy);
    }

    /// Runs one fixed-dt simulation tick: latches every entity's current
    /// intent, then advances the shared simulation step.
    pub fn tick(&mut self, dt: f32) {
        for (id, entity) in self.entities.iter_mut() {
            let (dx, dy) = self.inputs.get(*id);
            entity.dx = dx;
            entity.dy = dy;
        }

        sim::step(&mut self.entities, self.grid.as_ref(), dt);
    }

    /// Wire-ready view of every entity, in ascending id order.
    pub fn snapshot(&self) -> Vec<EntityView> {
        self.entities.values().map(Entity::view).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entities.contains_key(&id)
    }
}

fn random_color<R: Rng>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..0x1000000u32))
}
