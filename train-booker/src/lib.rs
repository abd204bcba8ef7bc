//! Train seat reservation client.
//!
//! Searches scheduled departures across two carriers, reserves seats,
//! and — when the requested seat class is sold out — keeps retrying at
//! a fixed interval until the reservation succeeds or the user stops
//! it. Also lists and cancels existing reservations and remembers
//! frequently used routes.

pub mod domain;
pub mod favorites;
pub mod gateway;
pub mod manage;
pub mod reserve;
pub mod search;
pub mod stations;
