//! Client-side render state: prediction for the controlled entity,
//! reconciliation against snapshots, and smoothing for everyone else.

use log::debug;
use shared::{EntityView, Packet, PLAYER_SPEED};
use std::collections::{HashMap, HashSet};

/// Per-frame fraction remote entities move toward their authoritative
/// position. Exponential decay: never overshoots, never quite catches up
/// between snapshots.
pub const SMOOTHING: f32 = 0.2;

/// Fraction of the predicted-vs-authoritative offset corrected per
/// snapshot when the offset is below [`SNAP_THRESHOLD`].
pub const SOFT_CORRECTION: f32 = 0.1;

/// Offset (world units) at or above which the local entity snaps straight
/// to the authoritative position instead of blending.
pub const SNAP_THRESHOLD: f32 = 32.0;

/// Render-side state for one known entity id.
#[derive(Debug, Clone)]
pub struct RenderEntity {
    /// Displayed position: predicted for the local entity, smoothed for
    /// remote ones.
    pub x: f32,
    pub y: f32,
    /// Last authoritative position received from the server.
    pub server_x: f32,
    pub server_y: f32,
    pub color: String,
    pub is_local: bool,
}

/// All render state plus the locally sampled movement intent.
#[derive(Debug, Default)]
pub struct ClientWorld {
    local_id: Option<u32>,
    entities: HashMap<u32, RenderEntity>,
    intent: (f32, f32),
}

impl ClientWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_id(&self) -> Option<u32> {
        self.local_id
    }

    /// Locally sampled direction, already normalized by the input layer.
    pub fn set_intent(&mut self, dx: f32, dy: f32) {
        self.intent = (dx, dy);
    }

    /// Applies one server-sent packet to the render state.
    pub fn apply_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Roster { client_id, entities } => {
                self.local_id = Some(client_id);
                for view in &entities {
                    self.ensure_entity(view);
                }
            }
            Packet::Join { entity } => self.ensure_entity(&entity),
            Packet::Leave { id } => {
                self.entities.remove(&id);
            }
            Packet::Snapshot { entities } => self.apply_snapshot(entities),
            Packet::Input { .. } => debug!("server sent a client-bound Input packet, ignoring"),
        }
    }

    fn apply_snapshot(&mut self, views: Vec<EntityView>) {
        let mut seen: HashSet<u32> = HashSet::with_capacity(views.len());

        for view in &views {
            seen.insert(view.id);
            self.ensure_entity(view);

            let Some(entity) = self.entities.get_mut(&view.id) else {
                continue;
            };
            entity.server_x = view.x;
            entity.server_y = view.y;

            if entity.is_local {
                reconcile(entity);
            }
        }

        // An id absent from the snapshot is gone, whether or not a Leave
        // notice also arrived. Idempotent with the explicit notice.
        self.entities.retain(|id, _| seen.contains(id));
    }

    fn ensure_entity(&mut self, view: &EntityView) {
        let is_local = self.local_id == Some(view.id);
        self.entities
            .entry(view.id)
            .and_modify(|e| e.color = view.color.clone())
            .or_insert_with(|| RenderEntity {
                x: view.x,
                y: view.y,
                server_x: view.x,
                server_y: view.y,
                color: view.color.clone(),
                is_local,
            });
    }

    /// Advances the render state by one frame: the local entity integrates
    /// the current intent (prediction), remote entities decay toward their
    /// authoritative targets (smoothing).
    pub fn advance(&mut self, dt: f32) {
        let (dx, dy) = self.intent;
        for entity in self.entities.values_mut() {
            if entity.is_local {
                entity.x += dx * PLAYER_SPEED * dt;
                entity.y += dy * PLAYER_SPEED * dt;
            } else {
                entity.x += (entity.server_x - entity.x) * SMOOTHING;
                entity.y += (entity.server_y - entity.y) * SMOOTHING;
            }
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = (&u32, &RenderEntity)> {
        self.entities.iter()
    }

    pub fn get(&self, id: u32) -> Option<&RenderEntity> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Corrects the predicted position against the authoritative one: small
/// drift is blended away (hides network jitter), a large divergence snaps
/// (hides nothing - the misprediction is already visible).
fn reconcile(entity: &mut RenderEntity) {
    let ox = entity.server_x - entity.x;
    let oy = entity.server_y - entity.y;
    let offset = (ox * ox + oy * oy).sqrt();

    if offset >= SNAP_THRESHOLD {
        entity.x = entity.server_x;
        entity.y = entity.server_y;
    } else {
        entity.x += ox * SOFT_CORRECTION;
        entity.y += oy * SOFT_CORRECTION;
    }
}
