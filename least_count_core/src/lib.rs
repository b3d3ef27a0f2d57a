//! # Least Count core
//!
//! Authoritative game logic for a Least Count card table: the card and pile
//! model, seating, the turn state machine, per-player projections and the
//! client/server message types. Nothing here knows about sockets or tasks,
//! so the server and client crates can both build on it.

mod card;
mod error;
mod logic;
mod message;
mod registry;
mod state;
mod view;

#[cfg(test)]
mod testing;

pub use card::*;

pub use error::*;

pub use message::*;

pub use state::*;

pub use view::*;
