//! Platform pricing parameters owned by the system-parameters service.

use crate::domain::{Percentage, Satoshi};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable pricing snapshot used for one computation.
///
/// The engine never mutates these; a fresh snapshot is fetched by
/// [`crate::orchestration::params::ParameterCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemParameters {
    /// Hours of event duration that are not billed to non-rewarded events.
    pub free_hours: u32,
    pub satoshi_per_duration_hour: Satoshi,
    pub min_reward_amount_satoshi: Satoshi,
    pub platform_fee_percentage: Percentage,
    pub satoshi_per_extra_winner: Satoshi,
    /// Sponsorship threshold: underpayments at or below this are donations.
    #[serde(alias = "sponsorship_threshold_satoshi")]
    pub dust_threshold_satoshi: Satoshi,
}

/// A parameter snapshot that cannot be priced against.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("platform fee percentage must be between 0 and 100, got {0}")]
    FeePercentageOutOfRange(Percentage),
}

impl SystemParameters {
    pub fn sponsorship_threshold(&self) -> Satoshi {
        self.dust_threshold_satoshi
    }

    /// Reject snapshots whose fees could not be charged.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let pct = self.platform_fee_percentage;
        if pct.is_negative() || pct > Percentage::from_whole(100) {
            return Err(ParameterError::FeePercentageOutOfRange(pct));
        }
        Ok(())
    }
}
