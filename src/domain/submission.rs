//! Ledger entry for a funding request this service submitted.

use super::{EventId, Satoshi};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a submitted funding request and the total quoted at the time.
///
/// The quoted total is informational only. What is owed is always read
/// back from the deposit snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub event_id: EventId,
    pub duration_hours: u32,
    pub is_rewarded: bool,
    pub reward_satoshi: Satoshi,
    pub preheat_hours: Option<u32>,
    pub quoted_total_satoshi: Satoshi,
    pub created_at: DateTime<Utc>,
}
