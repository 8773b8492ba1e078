//! Pure computation engine(s) for deterministic funding logic.

pub mod classifier;
pub mod countdown;
pub mod fee_rules;

pub use classifier::classify;
pub use countdown::{Clock, CountdownEvent, CountdownTimer, ManualClock, SystemClock};
pub use fee_rules::{
    max_recipients, minimum_reward, platform_fee, preheat_fee, quote, FeeEstimate, FundingQuote,
    Quote,
};
