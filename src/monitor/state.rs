//! Owned state of one deposit monitor.
//!
//! Pure and synchronous: the async driver in [`super`] feeds it fetch
//! results and clock readings, so every transition is testable without
//! timers.

use crate::datasource::DataSourceError;
use crate::domain::{DepositSnapshot, EventId, FundingOutcome, Satoshi};
use crate::engine::{classify, CountdownEvent, CountdownTimer};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorPhase {
    AwaitingFirstSnapshot,
    Polling,
    Terminal,
}

/// What applying one fetch result did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchApplied {
    /// Non-terminal snapshot applied; keep polling.
    Continue,
    /// Terminal outcome reached; stop polling.
    Terminal(FundingOutcome),
    /// First failure of this monitor. Surfaced to the caller.
    FirstFailure(DataSourceError),
    /// A later failure. The next scheduled poll is the retry.
    RetryLater(DataSourceError),
    /// Older than a response already applied; discarded.
    Stale,
    /// Arrived after the monitor became terminal; discarded.
    Ignored,
}

/// Read-only view published to observers after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorView {
    pub event_id: EventId,
    pub phase: MonitorPhase,
    pub outcome: FundingOutcome,
    pub activates_event: bool,
    pub refund_owed: bool,
    pub remaining_secs: Option<u64>,
    pub deadline: Option<DateTime<Utc>>,
    pub snapshot: Option<DepositSnapshot>,
    /// Set by the first failed fetch; cleared by the next successful one.
    pub error: Option<String>,
    pub consecutive_failures: u64,
    pub last_sequence: u64,
}

#[derive(Debug)]
pub struct MonitorState {
    event_id: EventId,
    sponsorship_threshold: Satoshi,
    phase: MonitorPhase,
    snapshot: Option<DepositSnapshot>,
    outcome: FundingOutcome,
    countdown: CountdownTimer,
    next_seq: u64,
    last_applied_seq: u64,
    total_failures: u64,
    consecutive_failures: u64,
    error: Option<String>,
}

impl MonitorState {
    pub fn new(event_id: EventId, sponsorship_threshold: Satoshi) -> Self {
        Self {
            event_id,
            sponsorship_threshold,
            phase: MonitorPhase::AwaitingFirstSnapshot,
            snapshot: None,
            outcome: FundingOutcome::Pending,
            countdown: CountdownTimer::new(),
            next_seq: 0,
            last_applied_seq: 0,
            total_failures: 0,
            consecutive_failures: 0,
            error: None,
        }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn outcome(&self) -> FundingOutcome {
        self.outcome
    }

    pub fn snapshot(&self) -> Option<&DepositSnapshot> {
        self.snapshot.as_ref()
    }

    /// Reserve a sequence number for a new fetch. `None` once terminal.
    pub fn begin_fetch(&mut self) -> Option<u64> {
        if self.phase == MonitorPhase::Terminal {
            return None;
        }
        self.next_seq += 1;
        Some(self.next_seq)
    }

    /// Apply the result of the fetch that was issued with `seq`.
    pub fn apply_fetch(
        &mut self,
        seq: u64,
        result: Result<DepositSnapshot, DataSourceError>,
        now: DateTime<Utc>,
    ) -> FetchApplied {
        if self.phase == MonitorPhase::Terminal {
            return FetchApplied::Ignored;
        }
        if seq <= self.last_applied_seq {
            return FetchApplied::Stale;
        }

        match result {
            Ok(snapshot) => {
                self.last_applied_seq = seq;
                self.consecutive_failures = 0;
                self.error = None;
                self.countdown.set_deadline(snapshot.initial_timeout_at);

                let mut outcome = classify(&snapshot, self.sponsorship_threshold);
                if !outcome.is_terminal() && self.countdown.has_passed(now) {
                    outcome = FundingOutcome::Expired;
                }
                self.snapshot = Some(snapshot);
                self.outcome = outcome;

                if outcome.is_terminal() {
                    self.phase = MonitorPhase::Terminal;
                    FetchApplied::Terminal(outcome)
                } else {
                    self.phase = MonitorPhase::Polling;
                    FetchApplied::Continue
                }
            }
            Err(err) => {
                self.total_failures += 1;
                self.consecutive_failures += 1;
                if self.total_failures == 1 {
                    self.error = Some(err.to_string());
                    FetchApplied::FirstFailure(err)
                } else {
                    FetchApplied::RetryLater(err)
                }
            }
        }
    }

    /// Advance the countdown. Yields nothing once terminal.
    pub fn tick_countdown(&mut self, now: DateTime<Utc>) -> Option<CountdownEvent> {
        if self.phase == MonitorPhase::Terminal {
            return None;
        }
        self.countdown.tick(now)
    }

    pub fn countdown_expired(&self) -> bool {
        self.countdown.is_expired()
    }

    pub fn view(&self, now: DateTime<Utc>) -> MonitorView {
        MonitorView {
            event_id: self.event_id.clone(),
            phase: self.phase,
            outcome: self.outcome,
            activates_event: self.outcome.activates_event(),
            refund_owed: self.outcome.refund_owed(),
            remaining_secs: self.countdown.remaining_secs(now),
            deadline: self.countdown.deadline(),
            snapshot: self.snapshot.clone(),
            error: self.error.clone(),
            consecutive_failures: self.consecutive_failures,
            last_sequence: self.last_applied_seq,
        }
    }
}
