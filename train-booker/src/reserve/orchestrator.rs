//! The reservation attempt-chain state machine.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{
    ChainId, ReservationAttempt, ReservationRecord, ReserveOutcome, SearchQuery, SeatClass,
    TrainOffer,
};
use crate::gateway::BookingApi;

use super::scheduler::RetryScheduler;

/// Fixed delay between reservation attempts.
///
/// Seat returns are unpredictable, so the chain retries at this fixed
/// cadence without an attempt cap; only confirmation, a terminal
/// failure, or the user stops it.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Shown when a reservation is started without a search result.
const NO_SEARCH_CONTEXT: &str = "search info invalid";

/// State of the reservation flow.
///
/// `Confirmed` and `Failed` are terminal for their chain; a new
/// `start_reservation` from any of `Idle`, `Confirmed`, or `Failed`
/// begins a fresh chain at attempt number zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveState {
    Idle,
    /// A reserve call is on the wire.
    Attempting,
    /// The last attempt hit a sold-out seat; the retry timer is armed.
    RetryArmed,
    Confirmed(ReservationRecord),
    Failed(String),
}

/// Drives an attempt chain against the gateway, coordinating with the
/// retry scheduler.
///
/// The orchestrator exclusively owns both the single live attempt and
/// the scheduler's timer slot; no other component arms or disarms that
/// timer.
pub struct ReservationOrchestrator<G> {
    gateway: G,
    scheduler: RetryScheduler,
    fired: mpsc::UnboundedReceiver<ChainId>,
    state: ReserveState,
    /// The live attempt; `Some` only while a chain is waiting to retry.
    live: Option<ReservationAttempt>,
    chains_started: u64,
    retry_delay: Duration,
}

impl<G: BookingApi> ReservationOrchestrator<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_retry_delay(gateway, RETRY_DELAY)
    }

    /// Create an orchestrator with a non-default retry delay.
    pub fn with_retry_delay(gateway: G, retry_delay: Duration) -> Self {
        let (scheduler, fired) = RetryScheduler::new();
        Self {
            gateway,
            scheduler,
            fired,
            state: ReserveState::Idle,
            live: None,
            chains_started: 0,
            retry_delay,
        }
    }

    pub fn state(&self) -> &ReserveState {
        &self.state
    }

    /// The attempt currently waiting on the retry timer, if any.
    pub fn live_attempt(&self) -> Option<&ReservationAttempt> {
        self.live.as_ref()
    }

    /// Whether a retry timer is pending.
    pub fn is_retry_pending(&self) -> bool {
        self.scheduler.is_armed()
    }

    /// Start a new attempt chain for a user-selected offer and seat
    /// class.
    ///
    /// `query` is the search the offer came from; starting without one
    /// fails immediately, with no gateway call. Starting a new chain
    /// always supersedes any pending retry of a previous chain.
    pub async fn start_reservation(
        &mut self,
        query: Option<SearchQuery>,
        offer: TrainOffer,
        seat_class: SeatClass,
    ) -> &ReserveState {
        // Whatever happens next, the previous chain's timer must not
        // fire into the new chain.
        self.scheduler.disarm();
        self.live = None;

        let Some(query) = query else {
            self.state = ReserveState::Failed(NO_SEARCH_CONTEXT.to_string());
            return &self.state;
        };

        self.chains_started += 1;
        let chain = ChainId::new(self.chains_started);
        debug!(%chain, train = %offer.train_number, seat = %seat_class, "starting attempt chain");

        let attempt = ReservationAttempt::first(chain, query, offer, seat_class);
        self.run_attempt(attempt).await;
        &self.state
    }

    /// Cancel a pending auto-retry and return to idle.
    ///
    /// Valid only while the retry timer is armed; in any other state
    /// this is a no-op.
    pub fn cancel_retry(&mut self) {
        if !matches!(self.state, ReserveState::RetryArmed) {
            return;
        }
        debug!("user cancelled pending retry");
        self.scheduler.disarm();
        self.live = None;
        self.state = ReserveState::Idle;
    }

    /// Handle a retry-timer fire.
    ///
    /// A fire whose chain no longer matches the live attempt is stale
    /// (the user cancelled, or started a different reservation, after
    /// the timer was armed) and is dropped without a gateway call.
    pub async fn on_timer_fired(&mut self, chain: ChainId) {
        let live = matches!(self.state, ReserveState::RetryArmed)
            && self.live.as_ref().is_some_and(|a| a.chain == chain);
        if !live {
            debug!(%chain, "dropping stale retry fire");
            return;
        }
        if let Some(attempt) = self.live.take() {
            self.run_attempt(attempt).await;
        }
    }

    /// Run the retry loop until the current chain settles.
    ///
    /// Returns immediately when no retry is pending. Within one chain,
    /// attempt n+1 is only issued after attempt n's outcome arrived and
    /// the delay elapsed.
    pub async fn run_to_completion(&mut self) -> &ReserveState {
        while matches!(self.state, ReserveState::RetryArmed) {
            let fired = self.fired.recv().await;
            match fired {
                Some(chain) => self.on_timer_fired(chain).await,
                // Channel closed cannot happen while we hold the
                // scheduler, but don't spin if it somehow does.
                None => break,
            }
        }
        &self.state
    }

    /// Issue one reserve call and settle the state from its outcome.
    async fn run_attempt(&mut self, mut attempt: ReservationAttempt) {
        self.state = ReserveState::Attempting;
        debug!(
            chain = %attempt.chain,
            attempt = attempt.attempt_number,
            retry = attempt.is_retry,
            "issuing reserve call"
        );

        match self.gateway.reserve(&attempt).await {
            Ok(ReserveOutcome::Confirmed(record)) => {
                debug!(chain = %attempt.chain, "reservation confirmed");
                self.scheduler.disarm();
                self.state = ReserveState::Confirmed(record);
            }
            Ok(ReserveOutcome::NeedsRetry) => {
                attempt.attempt_number += 1;
                attempt.is_retry = true;
                debug!(
                    chain = %attempt.chain,
                    next_attempt = attempt.attempt_number,
                    "sold out, arming retry"
                );
                self.scheduler.arm(self.retry_delay, attempt.chain);
                self.live = Some(attempt);
                self.state = ReserveState::RetryArmed;
            }
            Ok(ReserveOutcome::Failed(message)) => {
                debug!(chain = %attempt.chain, %message, "provider rejected reservation");
                self.scheduler.disarm();
                self.state = ReserveState::Failed(message);
            }
            Err(err) => {
                debug!(chain = %attempt.chain, error = %err, "reserve call failed");
                self.scheduler.disarm();
                self.state = ReserveState::Failed(err.user_message());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Carrier, SeatStatus};
    use crate::gateway::GatewayError;
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

    fn sold_out_offer() -> TrainOffer {
        TrainOffer {
            train_number: "0301".to_string(),
            train_name: "SRT".to_string(),
            departure_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            departure_station: "수서".to_string(),
            arrival_station: "부산".to_string(),
            general: SeatStatus {
                available: false,
                label: "매진".to_string(),
            },
            special: SeatStatus {
                available: false,
                label: "매진".to_string(),
            },
        }
    }

    fn record() -> ReservationRecord {
        ReservationRecord {
            summary: "[SRT] 수서 → 부산".to_string(),
            payment_deadline: None,
        }
    }

    #[tokio::test]
    async fn no_search_context_fails_without_gateway_call() {
        let mock = MockBooking::new();
        let mut orch = ReservationOrchestrator::new(mock.clone());

        let state = orch
            .start_reservation(None, sold_out_offer(), SeatClass::General)
            .await;

        assert_eq!(state, &ReserveState::Failed(NO_SEARCH_CONTEXT.to_string()));
        assert_eq!(mock.reserve_call_count(), 0);
    }

    #[tokio::test]
    async fn immediate_confirmation_settles_the_chain() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::Confirmed(record())));

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;

        assert_eq!(orch.state(), &ReserveState::Confirmed(record()));
        assert!(!orch.is_retry_pending());

        let calls = mock.reserve_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].attempt_number, 0);
        assert!(!calls[0].is_retry);
    }

    #[tokio::test(start_paused = true)]
    async fn sold_out_arms_exactly_one_timer() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;

        assert_eq!(orch.state(), &ReserveState::RetryArmed);
        assert!(orch.is_retry_pending());
        assert_eq!(orch.live_attempt().map(|a| a.attempt_number), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_then_confirmation() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));
        mock.push_reserve(Ok(ReserveOutcome::Confirmed(record())));

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;
        let state = orch.run_to_completion().await.clone();

        assert_eq!(state, ReserveState::Confirmed(record()));
        assert!(!orch.is_retry_pending());

        let calls = mock.reserve_calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].is_retry);
        assert_eq!(calls[0].attempt_number, 0);
        assert!(calls[1].is_retry);
        assert_eq!(calls[1].attempt_number, 1);
        // Both attempts belong to the same chain.
        assert_eq!(calls[0].chain, calls[1].chain);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_numbers_increase_strictly_across_retries() {
        let mock = MockBooking::new();
        for _ in 0..3 {
            mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));
        }
        mock.push_reserve(Ok(ReserveOutcome::Confirmed(record())));

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;
        orch.run_to_completion().await;

        let numbers: Vec<u32> = mock.reserve_calls().iter().map(|a| a.attempt_number).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn provider_failure_is_terminal() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::Failed(
            "선택한 열차를 찾을 수 없습니다.".to_string(),
        )));

        let mut orch = ReservationOrchestrator::new(mock);
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;

        assert_eq!(
            orch.state(),
            &ReserveState::Failed("선택한 열차를 찾을 수 없습니다.".to_string())
        );
        assert!(!orch.is_retry_pending());
    }

    #[tokio::test]
    async fn gateway_error_is_terminal_not_stuck_attempting() {
        let mock = MockBooking::new();
        mock.push_reserve(Err(GatewayError::Api {
            status: 500,
            message: String::new(),
        }));

        let mut orch = ReservationOrchestrator::new(mock);
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;

        assert!(matches!(orch.state(), ReserveState::Failed(_)));
        assert!(!orch.is_retry_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms_and_no_reserve_call_follows() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;
        assert_eq!(orch.state(), &ReserveState::RetryArmed);

        orch.cancel_retry();
        assert_eq!(orch.state(), &ReserveState::Idle);
        assert!(!orch.is_retry_pending());

        // Let the original delay elapse: the cancelled timer must not
        // produce another attempt.
        tokio::time::advance(RETRY_DELAY * 2).await;
        tokio::task::yield_now().await;
        assert_eq!(mock.reserve_call_count(), 1);
    }

    #[tokio::test]
    async fn cancel_outside_retry_armed_is_a_no_op() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::Confirmed(record())));

        let mut orch = ReservationOrchestrator::new(mock);
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;

        orch.cancel_retry();
        // Confirmed is terminal; cancel must not reset it.
        assert!(matches!(orch.state(), ReserveState::Confirmed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_fire_is_dropped() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;

        orch.on_timer_fired(ChainId::new(999)).await;

        assert_eq!(orch.state(), &ReserveState::RetryArmed);
        assert_eq!(mock.reserve_call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn new_chain_supersedes_pending_retry() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));
        mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::General)
            .await;
        let first_chain = orch.live_attempt().map(|a| a.chain);

        // User picks a different seat class before the retry fires.
        orch.start_reservation(Some(query()), sold_out_offer(), SeatClass::Special)
            .await;

        let calls = mock.reserve_calls();
        assert_eq!(calls.len(), 2);
        // The new chain starts over: fresh id, attempt number reset.
        assert_ne!(Some(calls[1].chain), first_chain);
        assert_eq!(calls[1].attempt_number, 0);
        assert!(!calls[1].is_retry);
        assert_eq!(calls[1].seat_class, SeatClass::Special);
        // Only the new chain's timer is armed.
        assert_eq!(orch.live_attempt().map(|a| a.chain), Some(calls[1].chain));
    }

    /// Sold-out offer, one retry, then success: the whole journey from
    /// a search result to a confirmed reservation.
    #[tokio::test(start_paused = true)]
    async fn end_to_end_sold_out_then_confirmed() {
        let mock = MockBooking::new();
        mock.push_reserve(Ok(ReserveOutcome::NeedsRetry));
        mock.push_reserve(Ok(ReserveOutcome::Confirmed(record())));

        let offer = sold_out_offer();
        assert!(!offer.seat(SeatClass::General).available);

        let mut orch = ReservationOrchestrator::new(mock.clone());
        orch.start_reservation(Some(query()), offer, SeatClass::General)
            .await;
        assert_eq!(orch.state(), &ReserveState::RetryArmed);

        let state = orch.run_to_completion().await;
        assert_eq!(state, &ReserveState::Confirmed(record()));
        assert!(!orch.is_retry_pending());
        assert_eq!(mock.reserve_calls()[1].attempt_number, 1);
    }
}
