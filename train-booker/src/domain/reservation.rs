//! Confirmed reservations and the existing-reservation list.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::query::Carrier;

/// A confirmed reservation as returned by the provider.
///
/// Opaque beyond display: the provider's own summary line plus the
/// payment deadline, when one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRecord {
    /// Provider's human-readable summary of the booking.
    pub summary: String,
    /// Deadline by which the reservation must be paid, if any.
    pub payment_deadline: Option<NaiveDateTime>,
}

/// Outcome of one reservation attempt. Exactly one is produced per
/// attempt.
///
/// `NeedsRetry` is not an error: it means the desired seat class is
/// sold out right now but may free up, and the attempt chain should
/// continue after the retry delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    Confirmed(ReservationRecord),
    NeedsRetry,
    Failed(String),
}

/// One row in the user's existing-reservation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingReservation {
    pub carrier: Carrier,
    /// Provider-issued cancellation key (PNR).
    pub key: String,
    /// Provider's human-readable summary of the booking.
    pub summary: String,
    /// Whether the reservation has been paid/ticketed.
    pub is_ticket: bool,
    /// Whether this is a waiting-list entry rather than a held seat.
    pub is_waiting: bool,
    pub departure_date: Option<NaiveDate>,
    pub departure_time: Option<NaiveTime>,
    /// Total price in won, when reported.
    pub price: Option<i64>,
}

/// Outcome of fetching one carrier's reservation list.
///
/// Each carrier's fetch fails independently; an error for one carrier
/// never suppresses the other carrier's rows.
pub type CarrierFetch = Result<Vec<ExistingReservation>, String>;

/// Both carriers' reservation lists, fetched wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationLists {
    pub srt: CarrierFetch,
    pub ktx: CarrierFetch,
}

impl ReservationLists {
    /// The fetch outcome for one carrier.
    pub fn for_carrier(&self, carrier: Carrier) -> &CarrierFetch {
        match carrier {
            Carrier::Srt => &self.srt,
            Carrier::Ktx => &self.ktx,
        }
    }

    /// True when both carriers fetched successfully and hold no rows.
    pub fn is_empty(&self) -> bool {
        matches!(&self.srt, Ok(rows) if rows.is_empty())
            && matches!(&self.ktx, Ok(rows) if rows.is_empty())
    }
}

/// A request to cancel (or refund) an existing reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    /// Cancellation key of the target reservation.
    pub key: String,
    pub carrier: Carrier,
    /// Ticketed reservations are refunded rather than cancelled.
    pub is_ticket: bool,
}

impl CancelRequest {
    /// Whether the request carries a usable cancellation key.
    pub fn has_key(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_request_key_guard() {
        let req = CancelRequest {
            key: "000012345".to_string(),
            carrier: Carrier::Srt,
            is_ticket: false,
        };
        assert!(req.has_key());

        let blank = CancelRequest {
            key: "  ".to_string(),
            carrier: Carrier::Ktx,
            is_ticket: true,
        };
        assert!(!blank.has_key());
    }

    #[test]
    fn lists_empty_only_when_both_ok_and_empty() {
        let empty = ReservationLists {
            srt: Ok(vec![]),
            ktx: Ok(vec![]),
        };
        assert!(empty.is_empty());

        let failed = ReservationLists {
            srt: Err("login failed".to_string()),
            ktx: Ok(vec![]),
        };
        assert!(!failed.is_empty());
    }
}
