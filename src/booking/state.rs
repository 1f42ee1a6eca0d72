use std::fmt;

use crate::entities::booking::BookingStatus;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Confirm,
    Cancel,
    Complete,
}

impl fmt::Display for BookingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingEvent::Confirm => "confirm",
            BookingEvent::Cancel => "cancel",
            BookingEvent::Complete => "complete",
        };
        f.write_str(name)
    }
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Seats of bookings in these states count against the ledger.
    pub fn holds_seats(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Next state for `event`, or `InvalidTransition` if the lifecycle forbids it.
    pub fn transition(self, event: BookingEvent) -> AppResult<BookingStatus> {
        use BookingStatus::*;

        match (self, event) {
            (Pending, BookingEvent::Confirm) => Ok(Confirmed),
            (Pending | Confirmed, BookingEvent::Cancel) => Ok(Cancelled),
            (Confirmed, BookingEvent::Complete) => Ok(Completed),
            (status, event) => Err(AppError::InvalidTransition(format!(
                "Cannot {} a {} booking",
                event,
                status.as_str()
            ))),
        }
    }
}
