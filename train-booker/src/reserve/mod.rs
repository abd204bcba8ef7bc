//! Reservation flow: the attempt-chain state machine and its retry
//! timer.
//!
//! A user-selected offer becomes a chain of reservation attempts. Sold
//! out is not terminal: the orchestrator re-attempts at a fixed delay,
//! without an attempt cap, until the provider confirms, fails
//! terminally, or the user cancels. The scheduler owns the single
//! timer slot that drives those re-attempts.

mod orchestrator;
mod scheduler;

pub use orchestrator::{RETRY_DELAY, ReservationOrchestrator, ReserveState};
pub use scheduler::RetryScheduler;
