//! Conversion from provider wire types to domain types.
//!
//! This is where the two carriers' field-name dialects disappear: every
//! value that has an SRT spelling and a KTX spelling is collapsed into
//! one normalized field here, so the layers above never branch on
//! carrier identity.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::{
    Carrier, CarrierFetch, ExistingReservation, ReservationLists, ReservationRecord,
    ReserveOutcome, SearchResults, SeatStatus, TrainOffer,
};

use super::types::{
    WireExistingReservation, WireReservation, WireReservationLists, WireReserveResponse,
    WireSearchResponse, WireTrain,
};

/// Seat-state label used when the provider reports availability without
/// a state string.
const SEAT_OPEN: &str = "예약가능";
const SEAT_SOLD_OUT: &str = "매진";

/// Payment-date sentinel meaning "no deadline".
const NO_PAYMENT_DEADLINE: &str = "00000000";

/// Error during wire to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Failed to parse a time string
    #[error("invalid time: {0}")]
    InvalidTime(String),
}

/// Parse the provider's compact `HHMMSS` time (also accepts `HH:MM` and
/// `HH:MM:SS`).
pub fn parse_wire_time(s: &str) -> Result<NaiveTime, ConversionError> {
    NaiveTime::parse_from_str(s, "%H%M%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| ConversionError::InvalidTime(s.to_string()))
}

/// Parse the provider's compact `YYYYMMDD` date. Unparsable values are
/// treated as absent; existing-reservation rows stay useful without a
/// schedule date.
fn parse_wire_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Convert a search response to a normalized result set.
///
/// An empty `trains` list is a successful search with zero offers, not
/// an error. Individual rows that fail to convert are skipped rather
/// than failing the whole result set.
pub fn convert_search_response(
    carrier: Carrier,
    wire: WireSearchResponse,
) -> SearchResults {
    let mut offers = Vec::with_capacity(wire.trains.len());
    for train in wire.trains {
        match convert_train(train) {
            Ok(offer) => offers.push(offer),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unconvertible train row");
            }
        }
    }
    SearchResults {
        carrier,
        departure: wire.dep,
        arrival: wire.arr,
        offers,
    }
}

/// Convert one train row to an offer, resolving carrier dialects.
pub fn convert_train(wire: WireTrain) -> Result<TrainOffer, ConversionError> {
    let train_number = wire
        .train_number
        .or(wire.train_no)
        .ok_or(ConversionError::MissingField("train_number"))?;

    let train_name = wire
        .train_name
        .or(wire.train_type_name)
        .unwrap_or_default();

    let dep_time = wire
        .dep_time
        .ok_or(ConversionError::MissingField("dep_time"))?;
    let arr_time = wire
        .arr_time
        .ok_or(ConversionError::MissingField("arr_time"))?;

    let departure_station = wire
        .dep_station_name
        .or(wire.dep_name)
        .ok_or(ConversionError::MissingField("dep_station_name"))?;
    let arrival_station = wire
        .arr_station_name
        .or(wire.arr_name)
        .ok_or(ConversionError::MissingField("arr_station_name"))?;

    let general_available = wire
        .general_seat_available
        .or(wire.has_general_seat)
        .unwrap_or(false);
    let special_available = wire
        .special_seat_available
        .or(wire.has_special_seat)
        .unwrap_or(false);

    Ok(TrainOffer {
        train_number,
        train_name,
        departure_time: parse_wire_time(&dep_time)?,
        arrival_time: parse_wire_time(&arr_time)?,
        departure_station,
        arrival_station,
        general: seat_status(general_available, wire.general_seat_state),
        special: seat_status(special_available, wire.special_seat_state),
    })
}

fn seat_status(available: bool, label: Option<String>) -> SeatStatus {
    let fallback = if available { SEAT_OPEN } else { SEAT_SOLD_OUT };
    SeatStatus {
        available,
        label: label.unwrap_or_else(|| fallback.to_string()),
    }
}

/// Convert a reserve response body to an attempt outcome.
///
/// A 2xx body is exactly one of: a retry signal, a confirmed
/// reservation, or a provider failure message.
pub fn convert_reserve_response(wire: WireReserveResponse) -> ReserveOutcome {
    if wire.retry.unwrap_or(false) {
        return ReserveOutcome::NeedsRetry;
    }
    if let Some(reservation) = wire.reservation {
        return ReserveOutcome::Confirmed(convert_reservation(reservation));
    }
    ReserveOutcome::Failed(
        wire.error_message
            .unwrap_or_else(|| "the reservation could not be completed".to_string()),
    )
}

/// Convert a confirmed reservation payload.
pub fn convert_reservation(wire: WireReservation) -> ReservationRecord {
    ReservationRecord {
        summary: wire.dump.unwrap_or_default(),
        payment_deadline: payment_deadline(wire.payment_date, wire.payment_time),
    }
}

fn payment_deadline(date: Option<String>, time: Option<String>) -> Option<NaiveDateTime> {
    let date = date?;
    if date == NO_PAYMENT_DEADLINE {
        return None;
    }
    let date = parse_wire_date(&date)?;
    let time = time
        .as_deref()
        .and_then(|t| parse_wire_time(t).ok())
        .unwrap_or_else(|| NaiveTime::MIN);
    Some(date.and_time(time))
}

/// Convert the reservation-list response, keeping the carriers'
/// outcomes independent.
pub fn convert_reservation_lists(wire: WireReservationLists) -> ReservationLists {
    ReservationLists {
        srt: convert_carrier_rows(Carrier::Srt, wire.srt_reservations, wire.srt_error),
        ktx: convert_carrier_rows(Carrier::Ktx, wire.ktx_reservations, wire.ktx_error),
    }
}

fn convert_carrier_rows(
    carrier: Carrier,
    rows: Vec<WireExistingReservation>,
    error: Option<String>,
) -> CarrierFetch {
    if let Some(message) = error {
        return Err(message);
    }
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match convert_existing(carrier, row) {
            Ok(reservation) => out.push(reservation),
            Err(e) => {
                tracing::warn!(%carrier, error = %e, "skipping unconvertible reservation row");
            }
        }
    }
    Ok(out)
}

/// Convert one existing-reservation row, resolving the key dialects.
pub fn convert_existing(
    carrier: Carrier,
    wire: WireExistingReservation,
) -> Result<ExistingReservation, ConversionError> {
    let key = wire
        .pnr_no
        .or(wire.reservation_number)
        .or(wire.rsv_id)
        .ok_or(ConversionError::MissingField("pnr_no"))?;

    Ok(ExistingReservation {
        carrier,
        key,
        summary: wire.dump.unwrap_or_default(),
        is_ticket: wire.is_ticket.unwrap_or(false),
        is_waiting: wire.is_waiting.unwrap_or(false),
        departure_date: wire.dep_date.as_deref().and_then(parse_wire_date),
        departure_time: wire.dep_time.as_deref().and_then(|t| parse_wire_time(t).ok()),
        price: wire.total_cost.or(wire.price),
    })
}
