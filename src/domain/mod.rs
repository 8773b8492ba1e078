//! Domain types for event funding.
//!
//! This module provides:
//! - Integer satoshi amounts and event identifiers
//! - Exact fee percentages via a Decimal wrapper
//! - Funding requests with shape validation
//! - Pricing parameters, deposit snapshots and funding outcomes
//! - Submission ledger records

pub mod decimal;
pub mod deposit;
pub mod outcome;
pub mod params;
pub mod primitives;
pub mod request;
pub mod submission;

pub use decimal::Percentage;
pub use deposit::{DepositSnapshot, DepositStatus};
pub use outcome::FundingOutcome;
pub use params::{ParameterError, SystemParameters};
pub use primitives::{EventId, EventIdParseError, Satoshi};
pub use request::{FundingRequest, ValidationError, PREHEAT_MAX_HOURS, PREHEAT_MIN_HOURS};
pub use submission::Submission;
