//! Classified result of a funding deposit.

use serde::{Deserialize, Serialize};

/// What a deposit snapshot means for the event.
///
/// Derived fresh from every snapshot and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundingOutcome {
    /// Paid exactly the expected amount.
    Exact,
    /// Paid more than expected by more than the sponsorship threshold.
    OverpaidRefundable,
    /// Paid more than expected, but the excess is too small to refund.
    OverpaidNoRefund,
    /// Paid too little, and the amount is too small to refund.
    UnderpaidDonation,
    /// Paid too little; the amount will be refunded.
    UnderpaidRefundable,
    /// Deadline passed without a usable payment.
    Expired,
    /// Not decided yet.
    Pending,
}

impl FundingOutcome {
    /// Every outcome except `Pending` ends monitoring.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FundingOutcome::Pending)
    }

    /// Whether the event goes live with this payment.
    pub fn activates_event(&self) -> bool {
        matches!(
            self,
            FundingOutcome::Exact
                | FundingOutcome::OverpaidRefundable
                | FundingOutcome::OverpaidNoRefund
        )
    }

    /// Whether some or all of the payment is returned to the sender.
    pub fn refund_owed(&self) -> bool {
        matches!(
            self,
            FundingOutcome::OverpaidRefundable | FundingOutcome::UnderpaidRefundable
        )
    }
}

impl std::fmt::Display for FundingOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FundingOutcome::Exact => "EXACT",
            FundingOutcome::OverpaidRefundable => "OVERPAID_REFUNDABLE",
            FundingOutcome::OverpaidNoRefund => "OVERPAID_NO_REFUND",
            FundingOutcome::UnderpaidDonation => "UNDERPAID_DONATION",
            FundingOutcome::UnderpaidRefundable => "UNDERPAID_REFUNDABLE",
            FundingOutcome::Expired => "EXPIRED",
            FundingOutcome::Pending => "PENDING",
        };
        write!(f, "{}", s)
    }
}
