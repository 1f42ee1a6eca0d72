//! Seat ledger updates on the `bus` row.
//!
//! Each function issues exactly one conditional `UPDATE`, so the check and the
//! write happen atomically in the database rather than as read-then-write.

use sea_orm::{
    sea_query::{Condition, Expr},
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use uuid::Uuid;

use crate::entities::bus;
use crate::error::{AppError, AppResult};

/// Take `count` seats from the bus, failing if fewer are available.
pub async fn reserve<C: ConnectionTrait>(conn: &C, bus_id: Uuid, count: i32) -> AppResult<()> {
    if count < 1 {
        return Err(AppError::Validation(
            "Must reserve at least 1 seat".to_string(),
        ));
    }

    let result = bus::Entity::update_many()
        .col_expr(
            bus::Column::AvailableSeats,
            Expr::col(bus::Column::AvailableSeats).sub(count),
        )
        .filter(bus::Column::Id.eq(bus_id))
        .filter(bus::Column::AvailableSeats.gte(count))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(%bus_id, count, "seat reservation rejected");
        return Err(AppError::InsufficientCapacity(format!(
            "Not enough seats available for {} passenger(s)",
            count
        )));
    }

    tracing::debug!(%bus_id, count, "seats reserved");
    Ok(())
}

/// Return `count` seats to the bus, never exceeding its capacity.
pub async fn release<C: ConnectionTrait>(conn: &C, bus_id: Uuid, count: i32) -> AppResult<()> {
    let count = count.max(0);

    // available_seats = min(available_seats + count, capacity)
    let clamped = Expr::case(
        Condition::all().add(
            Expr::col(bus::Column::AvailableSeats)
                .gt(Expr::col(bus::Column::Capacity).sub(count)),
        ),
        Expr::col(bus::Column::Capacity),
    )
    .finally(Expr::col(bus::Column::AvailableSeats).add(count));

    bus::Entity::update_many()
        .col_expr(bus::Column::AvailableSeats, clamped.into())
        .filter(bus::Column::Id.eq(bus_id))
        .exec(conn)
        .await?;

    tracing::debug!(%bus_id, count, "seats released");
    Ok(())
}

/// Change a bus's capacity, keeping the number of booked seats fixed.
///
/// Rejects capacities below the seats currently held by bookings.
pub async fn resize<C: ConnectionTrait>(
    conn: &C,
    bus: &bus::Model,
    new_capacity: i32,
) -> AppResult<()> {
    if new_capacity < 1 {
        return Err(AppError::Validation("Capacity must be positive".to_string()));
    }

    let booked = bus.booked_seats();
    if new_capacity < booked {
        return Err(AppError::Validation(format!(
            "Capacity cannot be lower than the {} seats already booked",
            booked
        )));
    }

    let delta = new_capacity - bus.capacity;
    let result = bus::Entity::update_many()
        .col_expr(bus::Column::Capacity, Expr::value(new_capacity))
        .col_expr(
            bus::Column::AvailableSeats,
            Expr::col(bus::Column::AvailableSeats).add(delta),
        )
        .filter(bus::Column::Id.eq(bus.id))
        .filter(bus::Column::Capacity.eq(bus.capacity))
        .filter(bus::Column::AvailableSeats.gte(-delta))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Seat availability changed, retry the update".to_string(),
        ));
    }

    Ok(())
}
