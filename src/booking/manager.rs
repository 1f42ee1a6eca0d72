use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, UpdateMany,
};
use uuid::Uuid;

use super::state::BookingEvent;
use super::{ledger, refund, seats, Principal};
use crate::entities::booking::{
    self, BookingStatus, Passenger, PassengerDetails, PaymentStatus,
};
use crate::entities::bus::{self, BusStatus};
use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::utils::booking_code;

const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub passengers: Vec<Passenger>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub bus_id: Option<Uuid>,
    pub travel_date: Option<NaiveDate>,
}

/// Coordinates booking state transitions with the bus seat ledger.
///
/// `now` is passed in by the caller so date and refund rules are evaluated
/// against a single instant per request.
pub struct BookingManager<'a> {
    db: &'a DatabaseConnection,
    max_seats_per_booking: usize,
}

impl<'a> BookingManager<'a> {
    pub fn new(db: &'a DatabaseConnection, max_seats_per_booking: usize) -> Self {
        Self {
            db,
            max_seats_per_booking,
        }
    }

    /// Create a pending booking and reserve its seats.
    ///
    /// The bus row is locked for the duration of the transaction so the seat
    /// conflict check and the ledger update see the same state.
    pub async fn create(
        &self,
        principal: &Principal,
        request: NewBooking,
        now: DateTime<Utc>,
    ) -> AppResult<booking::Model> {
        let passengers = seats::normalize_passengers(request.passengers, self.max_seats_per_booking)?;
        let seat_count = passengers.len() as i32;

        if request.travel_date < now.date_naive() {
            return Err(AppError::Validation(
                "Travel date cannot be in the past".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        user::Entity::find_by_id(principal.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let bus = bus::Entity::find_by_id(request.bus_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Bus not found".to_string()))?;

        if bus.status != BusStatus::Active {
            return Err(AppError::Validation(
                "Bus is not available for booking".to_string(),
            ));
        }

        if !bus.operating_days.includes(request.travel_date) {
            return Err(AppError::Validation(format!(
                "Bus does not operate on {}",
                request.travel_date.format("%A")
            )));
        }

        if seat_count > bus.available_seats {
            return Err(AppError::InsufficientCapacity(format!(
                "Only {} seats available",
                bus.available_seats
            )));
        }

        let total_amount = bus
            .fare
            .checked_mul(i64::from(seat_count))
            .ok_or_else(|| AppError::Validation("Booking total is out of range".to_string()))?;

        let details = PassengerDetails(passengers);
        let requested: Vec<&str> = details.seat_labels().collect();
        if !requested.is_empty() {
            let held = seats::held_seats(&txn, bus.id, request.travel_date).await?;
            let taken = seats::conflicting(&requested, &held);
            if !taken.is_empty() {
                tracing::warn!(
                    bus_id = %bus.id,
                    travel_date = %request.travel_date,
                    seats = ?taken,
                    "seat conflict"
                );
                return Err(AppError::SeatConflict(format!(
                    "Seat(s) already booked: {}",
                    taken.join(", ")
                )));
            }
        }

        ledger::reserve(&txn, bus.id, seat_count).await?;

        let now_tz = now.fixed_offset();
        let new_booking = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_code: Set(booking_code::generate()),
            bus_id: Set(bus.id),
            user_id: Set(principal.user_id),
            passenger_details: Set(details),
            seat_count: Set(seat_count),
            travel_date: Set(request.travel_date),
            total_amount: Set(total_amount),
            status: Set(BookingStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            refund_amount: Set(0),
            cancellation_reason: Set(None),
            cancelled_at: Set(None),
            created_at: Set(now_tz),
            updated_at: Set(now_tz),
        };

        let created = new_booking.insert(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            booking_id = %created.id,
            booking_code = %created.booking_code,
            bus_id = %created.bus_id,
            seats = created.seat_count,
            "booking created"
        );

        Ok(created)
    }

    /// Confirm a pending booking once payment is settled.
    pub async fn confirm(&self, booking_id: Uuid, now: DateTime<Utc>) -> AppResult<booking::Model> {
        let txn = self.db.begin().await?;
        let current = find_booking(&txn, booking_id).await?;
        let next = current.status.transition(BookingEvent::Confirm)?;

        compare_and_set(
            &txn,
            &current,
            booking::Entity::update_many()
                .col_expr(booking::Column::Status, Expr::value(next))
                .col_expr(booking::Column::PaymentStatus, Expr::value(PaymentStatus::Paid))
                .col_expr(booking::Column::UpdatedAt, Expr::value(now.fixed_offset())),
        )
        .await?;

        let updated = find_booking(&txn, booking_id).await?;
        txn.commit().await?;

        tracing::info!(booking_id = %booking_id, "booking confirmed");
        Ok(updated)
    }

    /// Cancel a booking, apply the refund policy and give its seats back.
    pub async fn cancel(
        &self,
        principal: &Principal,
        booking_id: Uuid,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<booking::Model> {
        let reason = normalize_reason(reason)?;

        let txn = self.db.begin().await?;
        let current = find_booking(&txn, booking_id).await?;
        ensure_access(principal, &current)?;

        let next = current.status.transition(BookingEvent::Cancel)?;

        let bus = bus::Entity::find_by_id(current.bus_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Bus not found".to_string()))?;

        let departure = bus.departure_on(current.travel_date);
        if departure <= now {
            return Err(AppError::InvalidTransition(
                "Cannot cancel a booking after departure".to_string(),
            ));
        }

        let decision = refund::evaluate(now, departure, current.total_amount, current.status);
        let payment_status = match (decision.refund_amount > 0, current.status) {
            (true, _) => PaymentStatus::Refunded,
            (false, BookingStatus::Confirmed) => PaymentStatus::Paid,
            // Never collected, so there is nothing to settle.
            (false, _) => current.payment_status,
        };

        let now_tz = now.fixed_offset();
        compare_and_set(
            &txn,
            &current,
            booking::Entity::update_many()
                .col_expr(booking::Column::Status, Expr::value(next))
                .col_expr(booking::Column::PaymentStatus, Expr::value(payment_status))
                .col_expr(booking::Column::RefundAmount, Expr::value(decision.refund_amount))
                .col_expr(booking::Column::CancellationReason, Expr::value(reason))
                .col_expr(booking::Column::CancelledAt, Expr::value(Some(now_tz)))
                .col_expr(booking::Column::UpdatedAt, Expr::value(now_tz)),
        )
        .await?;

        ledger::release(&txn, current.bus_id, current.seat_count).await?;

        let updated = find_booking(&txn, booking_id).await?;
        txn.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            refund = decision.refund_amount,
            seats = current.seat_count,
            "booking cancelled"
        );

        Ok(updated)
    }

    /// Mark a confirmed booking as travelled once its departure has passed.
    pub async fn complete(&self, booking_id: Uuid, now: DateTime<Utc>) -> AppResult<booking::Model> {
        let txn = self.db.begin().await?;
        let current = find_booking(&txn, booking_id).await?;
        let next = current.status.transition(BookingEvent::Complete)?;

        let bus = bus::Entity::find_by_id(current.bus_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Bus not found".to_string()))?;

        if bus.departure_on(current.travel_date) > now {
            return Err(AppError::InvalidTransition(
                "Cannot complete a booking before departure".to_string(),
            ));
        }

        compare_and_set(
            &txn,
            &current,
            booking::Entity::update_many()
                .col_expr(booking::Column::Status, Expr::value(next))
                .col_expr(booking::Column::UpdatedAt, Expr::value(now.fixed_offset())),
        )
        .await?;

        let updated = find_booking(&txn, booking_id).await?;
        txn.commit().await?;

        tracing::info!(booking_id = %booking_id, "booking completed");
        Ok(updated)
    }

    pub async fn get(&self, principal: &Principal, booking_id: Uuid) -> AppResult<booking::Model> {
        let found = booking::Entity::find_by_id(booking_id)
            .one(self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        ensure_access(principal, &found)?;
        Ok(found)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<booking::Model>> {
        let bookings = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(bookings)
    }

    pub async fn list(&self, filter: &BookingFilter) -> AppResult<Vec<booking::Model>> {
        let mut query = booking::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(booking::Column::Status.eq(status));
        }
        if let Some(bus_id) = filter.bus_id {
            query = query.filter(booking::Column::BusId.eq(bus_id));
        }
        if let Some(date) = filter.travel_date {
            query = query.filter(booking::Column::TravelDate.eq(date));
        }

        let bookings = query
            .order_by_desc(booking::Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(bookings)
    }
}

async fn find_booking(txn: &DatabaseTransaction, booking_id: Uuid) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Apply `update` only if the booking is still in the state it was read in.
async fn compare_and_set(
    txn: &DatabaseTransaction,
    current: &booking::Model,
    update: UpdateMany<booking::Entity>,
) -> AppResult<()> {
    let result = update
        .filter(booking::Column::Id.eq(current.id))
        .filter(booking::Column::Status.eq(current.status))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::InvalidTransition(
            "Booking was modified by another request".to_string(),
        ));
    }
    Ok(())
}

fn ensure_access(principal: &Principal, booking: &booking::Model) -> AppResult<()> {
    if principal.is_admin() || booking.user_id == principal.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only access your own bookings".to_string(),
        ))
    }
}

fn normalize_reason(reason: Option<String>) -> AppResult<Option<String>> {
    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    if reason.as_ref().is_some_and(|r| r.len() > MAX_REASON_LEN) {
        return Err(AppError::Validation(
            "Cancellation reason must be at most 500 characters".to_string(),
        ));
    }
    Ok(reason)
}
