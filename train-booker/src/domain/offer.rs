//! Train offers returned by a search.

use chrono::NaiveTime;

use super::query::{Carrier, SeatClass};

/// Availability of one seat class on an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatStatus {
    pub available: bool,
    /// Human-readable state as reported by the provider
    /// (e.g. "예약가능", "매진").
    pub label: String,
}

/// One schedule/seat-availability row from a search.
///
/// Produced fresh by each search and never mutated, only superseded by
/// the next result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOffer {
    /// Provider's train number; identifies the offer within a result set.
    pub train_number: String,
    /// Carrier-facing label for the service (e.g. "SRT", "KTX-산천").
    pub train_name: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub departure_station: String,
    pub arrival_station: String,
    pub general: SeatStatus,
    pub special: SeatStatus,
}

impl TrainOffer {
    /// Availability of the given seat class.
    pub fn seat(&self, class: SeatClass) -> &SeatStatus {
        match class {
            SeatClass::General => &self.general,
            SeatClass::Special => &self.special,
        }
    }

    /// Whether any seat class is currently open.
    pub fn any_seat_available(&self) -> bool {
        self.general.available || self.special.available
    }

    /// Seat class to preselect: general when open, otherwise special
    /// when open, otherwise general (the sold-out case, where the user
    /// is heading for an auto-retry).
    pub fn default_seat_class(&self) -> SeatClass {
        if self.general.available {
            SeatClass::General
        } else if self.special.available {
            SeatClass::Special
        } else {
            SeatClass::General
        }
    }
}

/// A complete search result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub carrier: Carrier,
    pub departure: String,
    pub arrival: String,
    pub offers: Vec<TrainOffer>,
}

impl SearchResults {
    /// Find an offer by train number.
    pub fn offer(&self, train_number: &str) -> Option<&TrainOffer> {
        self.offers.iter().find(|o| o.train_number == train_number)
    }
}
