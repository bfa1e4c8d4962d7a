//! # Authoritative Game Server Library
//!
//! The server owns the canonical world state. It integrates player intents
//! into positions at a fixed tick rate, resolves collisions against other
//! players and the static tile map, and broadcasts snapshots that clients
//! smooth and reconcile against.
//!
//! ## Architecture
//!
//! All world mutation happens on a single game loop task. Connection
//! handlers never touch the world directly; they forward decoded packets
//! as [`network::ServerCommand`] values over one mpsc channel, and the
//! game loop drains that channel between ticks. This serializes every
//! join, input and disconnect against the simulation without any
//! finer-grained locking.
//!
//! Outbound traffic is fire-and-forget: each connection owns an unbounded
//! packet channel drained by its own writer task, so a slow or dead peer
//! can never stall the tick or the broadcast to other connections.
//!
//! ## Modules
//!
//! - [`game`] — the entity store and per-tick world update.
//! - [`mailbox`] — the single-slot, last-write-wins input channel.
//! - [`network`] — TCP listener, framing, and per-connection tasks.

pub mod game;
pub mod mailbox;
pub mod network;
