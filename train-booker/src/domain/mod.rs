//! Domain types for the booking client.
//!
//! These are the normalized types the orchestration layer works with.
//! Carrier-specific wire-format variance is resolved at the gateway
//! boundary, so nothing in this module (or above it) branches on which
//! carrier a value originally came from.

mod attempt;
mod offer;
mod query;
mod reservation;

pub use attempt::{ChainId, ReservationAttempt};
pub use offer::{SearchResults, SeatStatus, TrainOffer};
pub use query::{Carrier, InvalidCarrier, InvalidSeatClass, QueryError, SearchQuery, SeatClass};
pub use reservation::{
    CancelRequest, CarrierFetch, ExistingReservation, ReservationLists, ReservationRecord,
    ReserveOutcome,
};
