//! Wire types for the booking provider's JSON responses.
//!
//! The provider exposes two carriers behind one API but leaks each
//! carrier's native field names: SRT rows carry `train_number` /
//! `dep_station_name` / `general_seat_available`, KTX rows carry
//! `train_no` / `dep_name` / `has_general_seat`, and so on. These
//! structs accept either spelling; `convert` collapses them into one
//! normalized shape.

use serde::Deserialize;

/// Response body of `GET /api/search`.
#[derive(Debug, Deserialize)]
pub struct WireSearchResponse {
    #[serde(default)]
    pub trains: Vec<WireTrain>,
    pub dep: String,
    pub arr: String,
}

/// One train row from a search, in either carrier's dialect.
#[derive(Debug, Default, Deserialize)]
pub struct WireTrain {
    // SRT spelling / KTX spelling
    pub train_number: Option<String>,
    pub train_no: Option<String>,

    pub train_name: Option<String>,
    pub train_type_name: Option<String>,

    pub dep_time: Option<String>,
    pub arr_time: Option<String>,

    pub dep_station_name: Option<String>,
    pub dep_name: Option<String>,
    pub arr_station_name: Option<String>,
    pub arr_name: Option<String>,

    pub general_seat_available: Option<bool>,
    pub has_general_seat: Option<bool>,
    pub special_seat_available: Option<bool>,
    pub has_special_seat: Option<bool>,

    pub general_seat_state: Option<String>,
    pub special_seat_state: Option<String>,
}

/// Response body of `POST /api/reserve` and `POST /api/auto-retry`.
#[derive(Debug, Default, Deserialize)]
pub struct WireReserveResponse {
    pub retry: Option<bool>,
    pub reservation: Option<WireReservation>,
    pub error_message: Option<String>,
}

/// A confirmed reservation payload.
#[derive(Debug, Default, Deserialize)]
pub struct WireReservation {
    pub dump: Option<String>,
    /// `YYYYMMDD`, or `00000000` when no payment deadline applies.
    pub payment_date: Option<String>,
    /// `HHMMSS`.
    pub payment_time: Option<String>,
}

/// Response body of `GET /api/reservations`.
#[derive(Debug, Default, Deserialize)]
pub struct WireReservationLists {
    #[serde(default)]
    pub srt_reservations: Vec<WireExistingReservation>,
    #[serde(default)]
    pub ktx_reservations: Vec<WireExistingReservation>,
    pub srt_error: Option<String>,
    pub ktx_error: Option<String>,
}

/// One existing-reservation row, in either carrier's dialect.
#[derive(Debug, Default, Deserialize)]
pub struct WireExistingReservation {
    pub dump: Option<String>,

    // Cancellation key: SRT `reservation_number`, KTX `pnr_no` or `rsv_id`.
    pub reservation_number: Option<String>,
    pub pnr_no: Option<String>,
    pub rsv_id: Option<String>,

    pub is_ticket: Option<bool>,
    pub is_waiting: Option<bool>,

    /// `YYYYMMDD`.
    pub dep_date: Option<String>,
    /// `HHMMSS`.
    pub dep_time: Option<String>,

    pub total_cost: Option<i64>,
    pub price: Option<i64>,
}

/// Response body of `POST /api/cancel`.
#[derive(Debug, Default, Deserialize)]
pub struct WireCancelResponse {
    pub message: Option<String>,
    pub error_message: Option<String>,
}

/// Error envelope carried by non-2xx responses.
///
/// The search endpoint uses `error`; the form endpoints use
/// `error_message`.
#[derive(Debug, Default, Deserialize)]
pub struct WireErrorBody {
    pub error: Option<String>,
    pub error_message: Option<String>,
}

impl WireErrorBody {
    /// The provider's message, whichever field it arrived in.
    pub fn message(self) -> Option<String> {
        self.error.or(self.error_message)
    }
}
