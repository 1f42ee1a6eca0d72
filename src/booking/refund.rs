use chrono::{DateTime, Duration, Utc};

use crate::entities::booking::BookingStatus;

/// Cancellations closer to departure than this earn no refund.
pub const CANCELLATION_CUTOFF_HOURS: i64 = 2;
/// Cancellations further out than this earn the higher refund rate.
pub const EARLY_CANCELLATION_HOURS: i64 = 24;

pub const EARLY_REFUND_PERCENT: i64 = 90;
pub const LATE_REFUND_PERCENT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundDecision {
    pub can_cancel: bool,
    pub refund_amount: i64,
}

/// Refund owed when cancelling a booking worth `total_amount` at `now`.
pub fn evaluate(
    now: DateTime<Utc>,
    departure: DateTime<Utc>,
    total_amount: i64,
    status: BookingStatus,
) -> RefundDecision {
    let until_departure = departure - now;
    let can_cancel = status == BookingStatus::Confirmed
        && until_departure > Duration::hours(CANCELLATION_CUTOFF_HOURS);

    if !can_cancel {
        return RefundDecision {
            can_cancel,
            refund_amount: 0,
        };
    }

    let percent = if until_departure > Duration::hours(EARLY_CANCELLATION_HOURS) {
        EARLY_REFUND_PERCENT
    } else {
        LATE_REFUND_PERCENT
    };

    RefundDecision {
        can_cancel,
        refund_amount: percent_of(total_amount.max(0), percent),
    }
}

/// `floor(amount * percent / 100)` for non-negative amounts, without overflow.
fn percent_of(amount: i64, percent: i64) -> i64 {
    amount / 100 * percent + amount % 100 * percent / 100
}
