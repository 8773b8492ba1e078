//! Fee and threshold rules for pricing a funding request.
//!
//! All functions are pure. Intermediate arithmetic is exact decimal; the only
//! rounding step is the final conversion to whole satoshis, which rounds
//! halves away from zero. A fee that is negative or does not fit in a `u64`
//! is an error, never a clamped value.

use crate::domain::request::check_preheat_hours;
use crate::domain::{FundingRequest, Satoshi, SystemParameters, ValidationError, PREHEAT_MAX_HOURS};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// A fee that may not be computable yet.
///
/// `Unknown` means pricing parameters are not available. It is distinct from
/// `Computed(Satoshi::ZERO)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "satoshi", rename_all = "camelCase")]
pub enum FeeEstimate {
    Unknown,
    Computed(Satoshi),
}

impl FeeEstimate {
    pub fn computed(&self) -> Option<Satoshi> {
        match self {
            FeeEstimate::Unknown => None,
            FeeEstimate::Computed(sats) => Some(*sats),
        }
    }
}

/// Smallest reward a rewarded event of this duration may offer.
///
/// A missing or non-positive duration falls back to the configured floor.
pub fn minimum_reward(duration_hours: Option<u32>, params: &SystemParameters) -> Satoshi {
    match duration_hours.filter(|h| *h > 0) {
        None => params.min_reward_amount_satoshi,
        Some(hours) if hours <= params.free_hours => params.satoshi_per_duration_hour,
        Some(hours) => {
            let by_duration = Satoshi::new(
                u64::from(hours).saturating_mul(params.satoshi_per_duration_hour.as_u64()),
            );
            by_duration.max(params.min_reward_amount_satoshi)
        }
    }
}

/// Hours of duration that are charged for.
pub fn billable_hours(duration_hours: u32, params: &SystemParameters) -> u32 {
    if params.free_hours > 0 {
        duration_hours.saturating_sub(params.free_hours)
    } else {
        duration_hours
    }
}

/// Platform fee charged to non-rewarded events.
pub fn platform_fee(
    duration_hours: Option<u32>,
    params: Option<&SystemParameters>,
) -> Result<FeeEstimate, ValidationError> {
    let Some(params) = params else {
        return Ok(FeeEstimate::Unknown);
    };
    let Some(duration) = duration_hours.filter(|h| *h > 0) else {
        return Ok(FeeEstimate::Computed(Satoshi::ZERO));
    };

    let billable = billable_hours(duration, params);
    if billable == 0 {
        return Ok(FeeEstimate::Computed(Satoshi::ZERO));
    }

    let raw = Decimal::from(billable)
        .checked_mul(Decimal::from(params.satoshi_per_duration_hour.as_u64()))
        .and_then(|v| v.checked_mul(params.platform_fee_percentage.as_fraction()));
    round_to_satoshi(raw).map(FeeEstimate::Computed)
}

/// Sliding-scale multiplier for preheat: `0.2 + 0.8 * hours / 720`.
///
/// Exactly `1` at 720 hours.
pub fn preheat_multiplier(preheat_hours: u32) -> Result<Decimal, ValidationError> {
    let hours = check_preheat_hours(i64::from(preheat_hours))?;
    let base = Decimal::new(2, 1);
    let slope = Decimal::new(8, 1);
    Ok(base + slope * Decimal::from(hours) / Decimal::from(PREHEAT_MAX_HOURS))
}

/// Fee for an optional waiting period before an event opens.
pub fn preheat_fee(preheat_hours: u32, params: &SystemParameters) -> Result<Satoshi, ValidationError> {
    let multiplier = preheat_multiplier(preheat_hours)?;
    let raw = Decimal::from(preheat_hours)
        .checked_mul(Decimal::from(params.satoshi_per_duration_hour.as_u64()))
        .and_then(|v| v.checked_mul(params.platform_fee_percentage.as_fraction()))
        .and_then(|v| v.checked_mul(multiplier));
    round_to_satoshi(raw)
}

/// How many winners a reward can pay, or `None` if either operand is zero.
pub fn max_recipients(reward: Satoshi, params: &SystemParameters) -> Option<u64> {
    let per_winner = params.satoshi_per_extra_winner.as_u64();
    if reward.is_zero() || per_winner == 0 {
        return None;
    }
    Some(reward.as_u64() / per_winner)
}

/// Round to whole satoshis. `None` means the decimal arithmetic overflowed.
fn round_to_satoshi(value: Option<Decimal>) -> Result<Satoshi, ValidationError> {
    value
        .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|v| v.to_u64())
        .map(Satoshi::new)
        .ok_or(ValidationError::FeeOutOfRange)
}

/// Full price breakdown shown to a creator before they commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingQuote {
    pub minimum_reward_satoshi: Satoshi,
    pub reward_satoshi: Satoshi,
    /// Zero for rewarded events.
    pub platform_fee_satoshi: Satoshi,
    pub preheat_fee_satoshi: Satoshi,
    pub total_satoshi: Satoshi,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_recipients: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Quote {
    PricingUnavailable,
    Priced(FundingQuote),
}

/// Validate and price a funding request.
///
/// Shape errors are reported even while parameters are unavailable.
pub fn quote(
    request: &FundingRequest,
    params: Option<&SystemParameters>,
) -> Result<Quote, ValidationError> {
    request.validate()?;
    let Some(params) = params else {
        return Ok(Quote::PricingUnavailable);
    };

    let duration = request.duration();
    let minimum = minimum_reward(duration, params);
    let preheat = match request.checked_preheat_hours()? {
        Some(hours) => preheat_fee(hours, params)?,
        None => Satoshi::ZERO,
    };

    let quote = if request.is_rewarded {
        let reward = request.effective_reward();
        if reward < minimum {
            return Err(ValidationError::RewardBelowMinimum { reward, minimum });
        }
        FundingQuote {
            minimum_reward_satoshi: minimum,
            reward_satoshi: reward,
            platform_fee_satoshi: Satoshi::ZERO,
            preheat_fee_satoshi: preheat,
            total_satoshi: reward
                .checked_add(preheat)
                .ok_or(ValidationError::FeeOutOfRange)?,
            max_recipients: max_recipients(reward, params),
        }
    } else {
        let platform = platform_fee(duration, Some(params))?
            .computed()
            .unwrap_or(Satoshi::ZERO);
        FundingQuote {
            minimum_reward_satoshi: minimum,
            reward_satoshi: Satoshi::ZERO,
            platform_fee_satoshi: platform,
            preheat_fee_satoshi: preheat,
            total_satoshi: platform
                .checked_add(preheat)
                .ok_or(ValidationError::FeeOutOfRange)?,
            max_recipients: None,
        }
    };

    Ok(Quote::Priced(quote))
}
