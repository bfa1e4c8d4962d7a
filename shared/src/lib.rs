//! Types shared between the server and the client.
//!
//! The wire protocol ([`Packet`]), the world constants, the collision grid
//! ([`grid::CollisionGrid`]) and the authoritative simulation step
//! ([`sim::step`]) all live here so that the server simulation and the
//! client-side prediction use the exact same movement model.

use serde::{Deserialize, Serialize};

pub mod grid;
pub mod sim;

/// World width in world units when running without a tile map.
pub const WORLD_WIDTH: f32 = 800.0;
/// World height in world units when running without a tile map.
pub const WORLD_HEIGHT: f32 = 600.0;
/// Movement speed in world units per second, identical on both sides.
pub const PLAYER_SPEED: f32 = 300.0;
/// Collision radius, shared by every player.
pub const PLAYER_RADIUS: f32 = 10.0;
/// Edge length of one grid cell in world units. Must match on server and
/// client or collision and rendering diverge.
pub const TILE_SIZE: f32 = 32.0;
/// Upper bound on a single wire frame. Anything larger is a protocol
/// violation and the connection is dropped.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Messages exchanged between client and server.
///
/// Every frame on the wire is a 4-byte little-endian length prefix followed
/// by the bincode encoding of one `Packet`. The transport (TCP) delivers
/// frames ordered and reliably per connection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    /// Full current state, sent once to a client right after it connects.
    /// `client_id` tells the receiver which entity is its own.
    Roster {
        client_id: u32,
        entities: Vec<EntityView>,
    },
    /// A new entity appeared. Sent to everyone except the new client.
    Join { entity: EntityView },
    /// An entity was removed.
    Leave { id: u32 },
    /// Latest movement intent from a client. Components are expected to be
    /// finite with magnitude <= 1; the server sanitizes regardless.
    Input { dx: f32, dy: f32 },
    /// Periodic authoritative state, broadcast at the fixed tick rate.
    Snapshot { entities: Vec<EntityView> },
}

/// The wire-visible slice of an entity: position and display color only.
/// Server-side tunables (speed, intent) are never serialized.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EntityView {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub color: String,
}

/// Full server-side state of one connected player.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Connection identifier, stable for the connection lifetime.
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Latest movement intent, each component in [-1, 1], magnitude <= 1.
    pub dx: f32,
    pub dy: f32,
    /// World units per second. Fixed at creation, never client-controlled.
    pub speed: f32,
    /// Display attribute assigned at creation.
    pub color: String,
}

impl Entity {
    pub fn new(id: u32, x: f32, y: f32, color: String) -> Self {
        Self {
            id,
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            speed: PLAYER_SPEED,
            color,
        }
    }

    /// Projects the entity onto its wire representation.
    pub fn view(&self) -> EntityView {
        EntityView {
            id: self.id,
            x: self.x,
            y: self.y,
            color: self.color.clone(),
        }
    }
}

/// Sanitizes a raw movement intent.
///
/// Non-finite components are coerced to 0 (never an error: malformed input
/// must not take down the tick loop) and intents outside the unit disc are
/// rescaled onto it, so clients cannot buy extra speed with large vectors.
pub fn sanitize_intent(dx: f32, dy: f32) -> (f32, f32) {
    let dx = if dx.is_finite() { dx } else { 0.0 };
    let dy = if dy.is_finite() { dy } else { 0.0 };

    let mag_sq = dx * dx + dy * dy;
    if mag_sq > 1.0 {
        let mag = mag_sq.sqrt();
        (dx / mag, dy / mag)
    } else {
        (dx, dy)
    }
}
