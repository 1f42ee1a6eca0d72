//! Seat inventory and booking lifecycle.
//!
//! Every mutation of a bus's seat ledger goes through [`manager::BookingManager`],
//! which runs each operation in a single database transaction.

pub mod ledger;
pub mod manager;
pub mod refund;
pub mod seats;
pub mod state;

use uuid::Uuid;

use crate::entities::user::UserRole;

pub use manager::{BookingFilter, BookingManager, NewBooking};

/// Authenticated caller on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
