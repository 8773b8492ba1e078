//! Funding request submitted by an event creator, and its shape validation.

use crate::domain::Satoshi;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest allowed preheat period.
pub const PREHEAT_MIN_HOURS: u32 = 1;
/// Longest allowed preheat period; the preheat multiplier reaches 1.0 here.
pub const PREHEAT_MAX_HOURS: u32 = 720;

/// What a creator asks for before pricing.
///
/// Hours are signed so that negative input reaches validation instead of
/// failing deserialization with an opaque message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRequest {
    pub duration_hours: i64,
    pub is_rewarded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_satoshi: Option<Satoshi>,
    #[serde(default)]
    pub enable_preheat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preheat_hours: Option<i64>,
}

/// A malformed or out-of-range funding request.
///
/// Raised before any network call. Values are never clamped into range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("duration must be a positive whole number of hours, got {0}")]
    InvalidDuration(i64),
    #[error("a rewarded event requires a reward amount")]
    MissingReward,
    #[error("reward {reward} sats is below the minimum of {minimum} sats")]
    RewardBelowMinimum { reward: Satoshi, minimum: Satoshi },
    #[error("preheat is enabled but no preheat hours were given")]
    MissingPreheatHours,
    #[error("preheat hours must be between 1 and 720, got {0}")]
    PreheatOutOfRange(i64),
    #[error("fee is outside the payable satoshi range")]
    FeeOutOfRange,
}

impl FundingRequest {
    /// Check field shapes that do not depend on pricing parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.checked_duration()?;
        if self.is_rewarded && self.reward_satoshi.is_none() {
            return Err(ValidationError::MissingReward);
        }
        self.checked_preheat_hours()?;
        Ok(())
    }

    /// The duration, if it is a positive integer that fits in `u32`.
    pub fn duration(&self) -> Option<u32> {
        u32::try_from(self.duration_hours).ok().filter(|h| *h > 0)
    }

    fn checked_duration(&self) -> Result<u32, ValidationError> {
        self.duration()
            .ok_or(ValidationError::InvalidDuration(self.duration_hours))
    }

    /// Preheat hours when preheat is enabled; `None` when it is disabled.
    ///
    /// Hours supplied while preheat is disabled are ignored.
    pub fn checked_preheat_hours(&self) -> Result<Option<u32>, ValidationError> {
        if !self.enable_preheat {
            return Ok(None);
        }
        let hours = self
            .preheat_hours
            .ok_or(ValidationError::MissingPreheatHours)?;
        check_preheat_hours(hours).map(Some)
    }

    /// The reward that counts toward the total; zero for non-rewarded events.
    pub fn effective_reward(&self) -> Satoshi {
        if self.is_rewarded {
            self.reward_satoshi.unwrap_or(Satoshi::ZERO)
        } else {
            Satoshi::ZERO
        }
    }
}

/// Range-check preheat hours.
pub fn check_preheat_hours(hours: i64) -> Result<u32, ValidationError> {
    u32::try_from(hours)
        .ok()
        .filter(|h| (PREHEAT_MIN_HOURS..=PREHEAT_MAX_HOURS).contains(h))
        .ok_or(ValidationError::PreheatOutOfRange(hours))
}
