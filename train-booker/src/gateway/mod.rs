//! Booking-provider gateway.
//!
//! A stateless request/response mapper over the provider's HTTP API.
//! The gateway translates transport failures into typed errors and
//! normalizes the carriers' wire dialects into domain types; it never
//! retries anything on its own.

mod client;
mod convert;
mod error;
pub mod mock;
mod types;

pub use client::{BookingClient, GatewayConfig};
pub use convert::{ConversionError, parse_wire_time};
pub use error::GatewayError;

use crate::domain::{
    CancelRequest, ReservationAttempt, ReservationLists, ReserveOutcome, SearchQuery,
    SearchResults,
};

/// The four booking-provider operations.
///
/// Abstracted so the orchestration layer can run against a scripted
/// gateway in tests.
pub trait BookingApi {
    /// Search scheduled departures. All query fields must already be
    /// validated; the gateway does not re-check station membership.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, GatewayError>;

    /// Issue one reservation attempt.
    ///
    /// May create a real reservation on the provider, so callers must
    /// invoke it at most once per attempt and never re-invoke it just
    /// to probe availability.
    async fn reserve(&self, attempt: &ReservationAttempt)
    -> Result<ReserveOutcome, GatewayError>;

    /// Fetch both carriers' existing-reservation lists. Each carrier's
    /// failure is independent of the other's data.
    async fn reservations(&self) -> Result<ReservationLists, GatewayError>;

    /// Cancel (or refund, when ticketed) an existing reservation.
    /// Returns the provider's confirmation message.
    async fn cancel(&self, request: &CancelRequest) -> Result<String, GatewayError>;
}
