//! # Game Client Library
//!
//! Client-side half of the position sync protocol: it renders a locally
//! smoothed approximation of the server's authoritative world while making
//! the controlled player feel instantaneous.
//!
//! ## How latency is hidden
//!
//! - **Prediction** — the controlled entity integrates the sampled input
//!   direction immediately, using the same speed model as the server,
//!   instead of waiting a round trip for the authoritative position.
//! - **Reconciliation** — every snapshot is compared against the predicted
//!   position. Small drift is blended away gradually; a large divergence
//!   (a dropped input, or a collision the client did not simulate) snaps
//!   straight to the authoritative value.
//! - **Smoothing** — remote entities move a fixed fraction toward their
//!   latest authoritative position every frame, decaying exponentially
//!   toward the truth without overshooting.
//!
//! ## Concurrency
//!
//! Everything runs on the single macroquad frame loop: the nonblocking
//! socket is polled, input is sampled, prediction and smoothing advance,
//! and the frame is drawn, strictly in that order, once per frame. There
//! is no concurrent mutation of render state anywhere.
//!
//! ## Modules
//!
//! - [`game`] — render state, prediction, reconciliation, smoothing.
//! - [`input`] — key sampling and edge-triggered intent sending.
//! - [`network`] — nonblocking TCP connection with frame reassembly.
//! - [`rendering`] — draws the world; no game logic lives here.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
