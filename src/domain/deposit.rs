//! Deposit-status snapshot produced by the indexing service.

use crate::domain::Satoshi;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a deposit address as reported by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    /// Nothing seen on chain yet.
    Pending,
    /// Seen in the mempool or with too few confirmations.
    Unconfirmed,
    /// Confirmed; amounts are final.
    #[serde(alias = "RECEIVED")]
    Completed,
    /// Server already classified the payment as a non-refundable donation.
    Donation,
    /// Server already queued a refund.
    WaitForRefund,
    Expired,
    /// Held for manual review.
    Frozen,
}

impl std::fmt::Display for DepositStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DepositStatus::Pending => "PENDING",
            DepositStatus::Unconfirmed => "UNCONFIRMED",
            DepositStatus::Completed => "COMPLETED",
            DepositStatus::Donation => "DONATION",
            DepositStatus::WaitForRefund => "WAIT_FOR_REFUND",
            DepositStatus::Expired => "EXPIRED",
            DepositStatus::Frozen => "FROZEN",
        };
        write!(f, "{}", s)
    }
}

/// The latest deposit record for one event, returned on every poll.
///
/// `expected_amount_satoshi` is fixed by the server when the event is created
/// and is the only authoritative amount due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositSnapshot {
    pub deposit_address: String,
    pub expected_amount_satoshi: Satoshi,
    #[serde(default)]
    pub received_amount_satoshi: Satoshi,
    pub status: DepositStatus,
    pub initial_timeout_at: DateTime<Utc>,
}

impl DepositSnapshot {
    /// `received - expected`; positive when overpaid.
    pub fn difference(&self) -> i128 {
        self.received_amount_satoshi
            .signed_difference(self.expected_amount_satoshi)
    }
}
