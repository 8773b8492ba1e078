//! Maps a deposit snapshot to a funding outcome.

use crate::domain::{DepositSnapshot, DepositStatus, FundingOutcome, Satoshi};

/// Classify a deposit snapshot against the sponsorship threshold.
///
/// Pre-classified server statuses (`DONATION`, `WAIT_FOR_REFUND`) are trusted
/// as-is; amounts are only compared for `COMPLETED`. Amounts exactly at the
/// threshold are non-refundable.
pub fn classify(snapshot: &DepositSnapshot, sponsorship_threshold: Satoshi) -> FundingOutcome {
    match snapshot.status {
        DepositStatus::Expired => FundingOutcome::Expired,
        DepositStatus::Completed => classify_amounts(snapshot, sponsorship_threshold),
        DepositStatus::Donation => FundingOutcome::UnderpaidDonation,
        DepositStatus::WaitForRefund => FundingOutcome::UnderpaidRefundable,
        DepositStatus::Pending | DepositStatus::Unconfirmed | DepositStatus::Frozen => {
            FundingOutcome::Pending
        }
    }
}

fn classify_amounts(snapshot: &DepositSnapshot, threshold: Satoshi) -> FundingOutcome {
    let difference = snapshot.difference();
    if difference == 0 {
        FundingOutcome::Exact
    } else if difference > 0 {
        if difference > i128::from(threshold.as_u64()) {
            FundingOutcome::OverpaidRefundable
        } else {
            FundingOutcome::OverpaidNoRefund
        }
    } else if snapshot.received_amount_satoshi > threshold {
        FundingOutcome::UnderpaidRefundable
    } else {
        FundingOutcome::UnderpaidDonation
    }
}
