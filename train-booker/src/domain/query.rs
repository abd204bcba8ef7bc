//! Search query types and validation.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::stations::{KTX_STATIONS, SRT_STATIONS};

/// Error returned when parsing an unknown carrier name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown carrier \"{0}\" (expected SRT or KTX)")]
pub struct InvalidCarrier(pub String);

/// One of the two train operators.
///
/// The carriers use different station sets and different wire-field
/// names for the same concepts; the latter is normalized away in the
/// gateway, so this enum is mostly a routing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Carrier {
    Srt,
    Ktx,
}

impl Carrier {
    /// Parse a carrier name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, InvalidCarrier> {
        match s.to_ascii_uppercase().as_str() {
            "SRT" => Ok(Carrier::Srt),
            "KTX" => Ok(Carrier::Ktx),
            _ => Err(InvalidCarrier(s.to_string())),
        }
    }

    /// The carrier name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Srt => "SRT",
            Carrier::Ktx => "KTX",
        }
    }

    /// Stations served by this carrier.
    pub fn stations(&self) -> &'static [&'static str] {
        match self {
            Carrier::Srt => SRT_STATIONS,
            Carrier::Ktx => KTX_STATIONS,
        }
    }

    /// Whether `name` is a station in this carrier's catalog.
    pub fn serves(&self, name: &str) -> bool {
        self.stations().contains(&name)
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown seat class name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown seat class \"{0}\" (expected general or special)")]
pub struct InvalidSeatClass(pub String);

/// Seat class requested for a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatClass {
    General,
    Special,
}

impl SeatClass {
    /// Parse a seat class name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, InvalidSeatClass> {
        match s.to_ascii_uppercase().as_str() {
            "GENERAL" => Ok(SeatClass::General),
            "SPECIAL" => Ok(SeatClass::Special),
            _ => Err(InvalidSeatClass(s.to_string())),
        }
    }

    /// The seat class as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::General => "GENERAL",
            SeatClass::Special => "SPECIAL",
        }
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A station is not in the selected carrier's catalog.
    #[error("{carrier} does not serve \"{station}\"")]
    UnknownStation { carrier: Carrier, station: String },

    /// Passenger count must be at least one.
    #[error("at least one passenger required")]
    NoPassengers,
}

/// A departure search as submitted by the user.
///
/// Immutable once issued; a new search submission builds a new query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub carrier: Carrier,
    pub departure: String,
    pub arrival: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub passengers: u32,
}

impl SearchQuery {
    /// Validate the query before it reaches the gateway.
    ///
    /// The gateway itself assumes a valid query (station membership is a
    /// form-level concern), so this must be called upstream of it.
    pub fn validate(&self) -> Result<(), QueryError> {
        for station in [&self.departure, &self.arrival] {
            if !self.carrier.serves(station) {
                return Err(QueryError::UnknownStation {
                    carrier: self.carrier,
                    station: station.clone(),
                });
            }
        }
        if self.passengers == 0 {
            return Err(QueryError::NoPassengers);
        }
        Ok(())
    }

    /// The query fields as the provider expects them, used both for the
    /// search query string and the reserve form body.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("type", self.carrier.as_str().to_string()),
            ("dep", self.departure.clone()),
            ("arr", self.arrival.clone()),
            ("date", self.date.format("%Y-%m-%d").to_string()),
            ("time", self.time.format("%H:%M").to_string()),
            ("adults", self.passengers.to_string()),
        ]
    }
}
