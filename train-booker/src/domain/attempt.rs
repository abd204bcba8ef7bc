//! Reservation attempt bookkeeping.

use std::fmt;

use super::offer::TrainOffer;
use super::query::{SearchQuery, SeatClass};

/// Identity of one attempt chain.
///
/// Every user-initiated reservation starts a new chain; all automatic
/// retries of that reservation share its id. A timer fire carries the
/// chain id it was armed for, so a fire that outlives its chain (the
/// user cancelled, or started a different reservation) can be told
/// apart from a live one and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(u64);

impl ChainId {
    pub fn new(id: u64) -> Self {
        ChainId(id)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain#{}", self.0)
    }
}

/// One reservation attempt against the provider.
///
/// `attempt_number` counts retries within a single chain; a fresh
/// user-initiated reservation always starts at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationAttempt {
    pub chain: ChainId,
    pub query: SearchQuery,
    pub offer: TrainOffer,
    pub seat_class: SeatClass,
    pub is_retry: bool,
    pub attempt_number: u32,
}

impl ReservationAttempt {
    /// First attempt of a new chain.
    pub fn first(chain: ChainId, query: SearchQuery, offer: TrainOffer, seat_class: SeatClass) -> Self {
        ReservationAttempt {
            chain,
            query,
            offer,
            seat_class,
            is_retry: false,
            attempt_number: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_display() {
        assert_eq!(ChainId::new(3).to_string(), "chain#3");
    }

    #[test]
    fn chain_ids_compare_by_value() {
        assert_eq!(ChainId::new(1), ChainId::new(1));
        assert_ne!(ChainId::new(1), ChainId::new(2));
    }
}
