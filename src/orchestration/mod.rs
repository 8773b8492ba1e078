//! Services that tie pricing, the event service, the ledger and deposit
//! monitors together.

pub mod funding;
pub mod params;

pub use funding::{FundingError, FundingService, SubmittedFunding};
pub use params::{ParameterCache, RefreshError};
