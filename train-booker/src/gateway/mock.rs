//! Scripted booking gateway for tests and offline development.
//!
//! Responses are queued up front and popped per call; every call is
//! recorded so tests can assert exactly how many network invocations a
//! flow produced and with what arguments.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::{
    CancelRequest, ReservationAttempt, ReservationLists, ReserveOutcome, SearchQuery,
    SearchResults,
};

use super::BookingApi;
use super::error::GatewayError;

#[derive(Default)]
struct Inner {
    search_responses: VecDeque<Result<SearchResults, GatewayError>>,
    reserve_responses: VecDeque<Result<ReserveOutcome, GatewayError>>,
    list_responses: VecDeque<Result<ReservationLists, GatewayError>>,
    cancel_responses: VecDeque<Result<String, GatewayError>>,

    search_calls: Vec<SearchQuery>,
    reserve_calls: Vec<ReservationAttempt>,
    list_calls: usize,
    cancel_calls: Vec<CancelRequest>,
}

/// A scripted [`BookingApi`] implementation.
///
/// Cloning shares the script and the call record.
#[derive(Clone, Default)]
pub struct MockBooking {
    inner: Arc<Mutex<Inner>>,
}

impl MockBooking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search(&self, response: Result<SearchResults, GatewayError>) {
        self.lock().search_responses.push_back(response);
    }

    pub fn push_reserve(&self, response: Result<ReserveOutcome, GatewayError>) {
        self.lock().reserve_responses.push_back(response);
    }

    pub fn push_reservations(&self, response: Result<ReservationLists, GatewayError>) {
        self.lock().list_responses.push_back(response);
    }

    pub fn push_cancel(&self, response: Result<String, GatewayError>) {
        self.lock().cancel_responses.push_back(response);
    }

    pub fn search_calls(&self) -> Vec<SearchQuery> {
        self.lock().search_calls.clone()
    }

    pub fn reserve_calls(&self) -> Vec<ReservationAttempt> {
        self.lock().reserve_calls.clone()
    }

    pub fn reserve_call_count(&self) -> usize {
        self.lock().reserve_calls.len()
    }

    pub fn list_call_count(&self) -> usize {
        self.lock().list_calls
    }

    pub fn cancel_calls(&self) -> Vec<CancelRequest> {
        self.lock().cancel_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock gateway lock poisoned")
    }

    fn unscripted(operation: &'static str) -> GatewayError {
        GatewayError::Api {
            status: 0,
            message: format!("mock gateway: no scripted {operation} response"),
        }
    }
}

impl BookingApi for MockBooking {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResults, GatewayError> {
        let mut inner = self.lock();
        inner.search_calls.push(query.clone());
        inner
            .search_responses
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("search")))
    }

    async fn reserve(
        &self,
        attempt: &ReservationAttempt,
    ) -> Result<ReserveOutcome, GatewayError> {
        let mut inner = self.lock();
        inner.reserve_calls.push(attempt.clone());
        inner
            .reserve_responses
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("reserve")))
    }

    async fn reservations(&self) -> Result<ReservationLists, GatewayError> {
        let mut inner = self.lock();
        inner.list_calls += 1;
        inner
            .list_responses
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("reservations")))
    }

    async fn cancel(&self, request: &CancelRequest) -> Result<String, GatewayError> {
        let mut inner = self.lock();
        inner.cancel_calls.push(request.clone());
        inner
            .cancel_responses
            .pop_front()
            .unwrap_or_else(|| Err(Self::unscripted("cancel")))
    }
}
