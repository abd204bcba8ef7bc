//! HTTP client for the booking provider.

use std::time::Duration;

use reqwest::Response;

use crate::domain::{
    CancelRequest, Carrier, ReservationAttempt, ReservationLists, ReserveOutcome, SearchQuery,
    SearchResults,
};

use super::BookingApi;
use super::convert::{
    convert_reservation_lists, convert_reserve_response, convert_search_response,
};
use super::error::GatewayError;
use super::types::{
    WireCancelResponse, WireErrorBody, WireReservationLists, WireReserveResponse,
    WireSearchResponse,
};

/// Default base URL for the booking provider.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Configuration for the booking client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the provider API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// HTTP gateway to the booking provider.
#[derive(Debug, Clone)]
pub struct BookingClient {
    http: reqwest::Client,
    base_url: String,
}

impl BookingClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into an error, surfacing the provider's
    /// own message when the body carries one.
    async fn error_from_response(response: Response) -> GatewayError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<WireErrorBody>(&body).ok())
            .and_then(WireErrorBody::message)
            .unwrap_or_default();
        GatewayError::Api { status, message }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, GatewayError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Fetch the server's VAPID public key for push registration.
    ///
    /// Push registration sits outside the reservation flow; callers
    /// treat it as fire-and-forget.
    pub async fn vapid_public_key(&self) -> Result<String, GatewayError> {
        let response = self.http.get(self.url("/api/vapid_public_key")).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(response.text().await?)
    }

    /// Register a push subscription with the server. Fire-and-forget:
    /// the response body is ignored.
    pub async fn subscribe(&self, subscription: &serde_json::Value) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.url("/api/subscribe"))
            .json(subscription)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }
}

/// Endpoint for a reservation attempt: retries go through the
/// provider's dedicated auto-retry route, first attempts through the
/// plain reserve route.
fn reserve_path(is_retry: bool) -> &'static str {
    if is_retry { "/api/auto-retry" } else { "/api/reserve" }
}

/// Form body for a reservation attempt: the original query fields plus
/// the selected train and seat class.
fn reserve_form(attempt: &ReservationAttempt) -> Vec<(&'static str, String)> {
    let mut form = attempt.query.to_params();
    form.push(("train_number", attempt.offer.train_number.clone()));
    form.push(("seat_type", attempt.seat_class.as_str().to_string()));
    form
}

/// Form body for a cancel request.
fn cancel_form(request: &CancelRequest) -> Vec<(&'static str, String)> {
    vec![
        ("pnr_no", request.key.clone()),
        ("train_type", request.carrier.as_str().to_string()),
        ("is_ticket", request.is_ticket.to_string()),
    ]
}

impl BookingApi for BookingClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, GatewayError> {
        tracing::debug!(carrier = %query.carrier, dep = %query.departure, arr = %query.arrival, "search");

        let response = self
            .http
            .get(self.url("/api/search"))
            .query(&query.to_params())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let wire: WireSearchResponse = Self::decode(response).await?;
        Ok(convert_search_response(query.carrier, wire))
    }

    async fn reserve(
        &self,
        attempt: &ReservationAttempt,
    ) -> Result<ReserveOutcome, GatewayError> {
        tracing::debug!(
            chain = %attempt.chain,
            attempt = attempt.attempt_number,
            retry = attempt.is_retry,
            train = %attempt.offer.train_number,
            "reserve"
        );

        let response = self
            .http
            .post(self.url(reserve_path(attempt.is_retry)))
            .form(&reserve_form(attempt))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let wire: WireReserveResponse = Self::decode(response).await?;
        Ok(convert_reserve_response(wire))
    }

    async fn reservations(&self) -> Result<ReservationLists, GatewayError> {
        let response = self.http.get(self.url("/api/reservations")).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let wire: WireReservationLists = Self::decode(response).await?;
        Ok(convert_reservation_lists(wire))
    }

    async fn cancel(&self, request: &CancelRequest) -> Result<String, GatewayError> {
        if !request.has_key() {
            return Err(GatewayError::InvalidRequest(
                "a cancellation key is required".to_string(),
            ));
        }

        tracing::debug!(carrier = %request.carrier, ticket = request.is_ticket, "cancel");

        let response = self
            .http
            .post(self.url("/api/cancel"))
            .form(&cancel_form(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let wire: WireCancelResponse = Self::decode(response).await?;
        if let Some(message) = wire.error_message {
            return Err(GatewayError::Api {
                status: 200,
                message,
            });
        }
        Ok(wire.message.unwrap_or_default())
    }
}
