//! Existing-reservation management: list, refresh, cancel.

use crate::domain::{CancelRequest, ReservationLists};
use crate::gateway::{BookingApi, GatewayError};

/// Errors from the cancel flow.
#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    /// The reservation row carried no cancellation key; resolved
    /// locally, without a gateway call.
    #[error("no cancellation key on this reservation")]
    MissingKey,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Fetches and refreshes the user's reservation lists and routes
/// cancels through the gateway.
///
/// The local copy of the lists is never patched in place: any cancel
/// triggers a full refetch, so the view cannot drift from provider
/// state.
pub struct ReservationsManager<G> {
    gateway: G,
    lists: Option<ReservationLists>,
}

impl<G: BookingApi> ReservationsManager<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            lists: None,
        }
    }

    /// The most recently fetched lists, if any.
    pub fn lists(&self) -> Option<&ReservationLists> {
        self.lists.as_ref()
    }

    /// Fetch both carriers' lists.
    ///
    /// One carrier failing does not block the other's rows; per-carrier
    /// outcomes are kept separately inside the result.
    pub async fn refresh(&mut self) -> Result<&ReservationLists, GatewayError> {
        let lists = self.gateway.reservations().await?;
        Ok(self.lists.insert(lists))
    }

    /// Cancel a reservation and refetch the lists.
    ///
    /// Callers must have obtained the user's explicit confirmation
    /// before invoking this; cancellation is not reversible here.
    pub async fn cancel(&mut self, request: CancelRequest) -> Result<String, CancelError> {
        if !request.has_key() {
            return Err(CancelError::MissingKey);
        }

        let message = self.gateway.cancel(&request).await?;
        tracing::debug!(carrier = %request.carrier, "reservation cancelled, refetching lists");

        // Always resync with the provider rather than editing the
        // local copy.
        self.refresh().await?;
        Ok(message)
    }
}
