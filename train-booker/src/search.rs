//! Search flow: one in-flight departure search at a time.

use crate::domain::{SearchQuery, SearchResults};
use crate::gateway::{BookingApi, GatewayError};

/// State of the search flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    /// A search request is on the wire.
    InFlight,
    /// The most recent search succeeded. The query is kept alongside
    /// its results because a reservation needs both.
    Loaded {
        query: SearchQuery,
        results: SearchResults,
    },
    Failed(String),
}

/// Owns the one in-flight search request.
///
/// A submit while a search is already in flight is ignored; restarting
/// a search discards any prior result unconditionally.
pub struct SearchController<G> {
    gateway: G,
    state: SearchState,
}

impl<G: BookingApi> SearchController<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: SearchState::Idle,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// The query behind the current result set, if any.
    pub fn query(&self) -> Option<&SearchQuery> {
        match &self.state {
            SearchState::Loaded { query, .. } => Some(query),
            _ => None,
        }
    }

    /// The current result set, if any.
    pub fn results(&self) -> Option<&SearchResults> {
        match &self.state {
            SearchState::Loaded { results, .. } => Some(results),
            _ => None,
        }
    }

    /// Discard any prior result or error.
    pub fn clear(&mut self) {
        self.state = SearchState::Idle;
    }

    /// Submit a search.
    ///
    /// Validates the query locally first; an invalid query fails
    /// without a gateway call. Once the gateway call resolves the state
    /// is always `Loaded` or `Failed`, never `InFlight`.
    pub async fn submit(&mut self, query: SearchQuery) -> &SearchState {
        if matches!(self.state, SearchState::InFlight) {
            tracing::debug!("search already in flight, ignoring submit");
            return &self.state;
        }

        if let Err(e) = query.validate() {
            self.state = SearchState::Failed(e.to_string());
            return &self.state;
        }

        self.state = SearchState::InFlight;
        self.state = match self.gateway.search(&query).await {
            Ok(results) => SearchState::Loaded { query, results },
            Err(err) => SearchState::Failed(err.user_message()),
        };
        &self.state
    }

    #[cfg(test)]
    fn with_state(gateway: G, state: SearchState) -> Self {
        Self { gateway, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Carrier;
    use crate::gateway::mock::MockBooking;
    use chrono::{NaiveDate, NaiveTime};

    fn query() -> SearchQuery {
        SearchQuery {
            carrier: Carrier::Srt,
            departure: "수서".to_string(),
            arrival: "부산".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            passengers: 1,
        }
    }

    fn results() -> SearchResults {
        SearchResults {
            carrier: Carrier::Srt,
            departure: "수서".to_string(),
            arrival: "부산".to_string(),
            offers: vec![],
        }
    }

    #[tokio::test]
    async fn successful_search_loads_results() {
        let mock = MockBooking::new();
        mock.push_search(Ok(results()));

        let mut controller = SearchController::new(mock.clone());
        controller.submit(query()).await;

        assert!(matches!(controller.state(), SearchState::Loaded { .. }));
        assert_eq!(controller.query(), Some(&query()));
        assert_eq!(mock.search_calls().len(), 1);
    }

    #[tokio::test]
    async fn gateway_failure_surfaces_provider_message() {
        let mock = MockBooking::new();
        mock.push_search(Err(GatewayError::Api {
            status: 500,
            message: "서버에서 오류가 발생했습니다.".to_string(),
        }));

        let mut controller = SearchController::new(mock);
        controller.submit(query()).await;

        assert_eq!(
            controller.state(),
            &SearchState::Failed("서버에서 오류가 발생했습니다.".to_string())
        );
        assert!(controller.query().is_none());
    }

    #[tokio::test]
    async fn invalid_query_fails_without_gateway_call() {
        let mock = MockBooking::new();
        let mut controller = SearchController::new(mock.clone());

        let mut bad = query();
        bad.departure = "서울".to_string(); // KTX-only station
        controller.submit(bad).await;

        assert!(matches!(controller.state(), SearchState::Failed(_)));
        assert!(mock.search_calls().is_empty());
    }

    #[tokio::test]
    async fn submit_while_in_flight_is_ignored() {
        let mock = MockBooking::new();
        let mut controller =
            SearchController::with_state(mock.clone(), SearchState::InFlight);

        controller.submit(query()).await;

        assert_eq!(controller.state(), &SearchState::InFlight);
        assert!(mock.search_calls().is_empty());
    }

    #[tokio::test]
    async fn new_search_supersedes_old_result() {
        let mock = MockBooking::new();
        mock.push_search(Ok(results()));
        mock.push_search(Err(GatewayError::Api {
            status: 500,
            message: "down".to_string(),
        }));

        let mut controller = SearchController::new(mock);
        controller.submit(query()).await;
        assert!(controller.results().is_some());

        controller.submit(query()).await;
        // The old result set is gone, not merged.
        assert!(controller.results().is_none());
        assert!(matches!(controller.state(), SearchState::Failed(_)));
    }

    #[tokio::test]
    async fn clear_discards_result() {
        let mock = MockBooking::new();
        mock.push_search(Ok(results()));

        let mut controller = SearchController::new(mock);
        controller.submit(query()).await;
        controller.clear();

        assert_eq!(controller.state(), &SearchState::Idle);
    }
}
