use std::collections::BTreeSet;

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus, Passenger};
use crate::error::{AppError, AppResult};

const MAX_NAME_LEN: usize = 100;
const MAX_SEAT_LABEL_LEN: usize = 8;

/// Validate passenger details and normalize names and seat labels.
///
/// Seat labels are trimmed and upper-cased so "a1" and "A1 " name the same seat.
pub fn normalize_passengers(
    passengers: Vec<Passenger>,
    max_seats: usize,
) -> AppResult<Vec<Passenger>> {
    if passengers.is_empty() {
        return Err(AppError::Validation(
            "At least one passenger is required".to_string(),
        ));
    }
    if passengers.len() > max_seats {
        return Err(AppError::Validation(format!(
            "At most {} seats can be booked at once",
            max_seats
        )));
    }

    let mut labels = BTreeSet::new();
    let mut normalized = Vec::with_capacity(passengers.len());

    for passenger in passengers {
        let name = passenger.name.trim().to_string();
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(AppError::Validation(
                "Passenger name must be between 1 and 100 characters".to_string(),
            ));
        }
        if !(1..=120).contains(&passenger.age) {
            return Err(AppError::Validation(
                "Passenger age must be between 1 and 120".to_string(),
            ));
        }

        let seat_number = match passenger.seat_number {
            Some(label) => {
                let label = label.trim().to_ascii_uppercase();
                if label.is_empty()
                    || label.len() > MAX_SEAT_LABEL_LEN
                    || !label.chars().all(|c| c.is_ascii_alphanumeric())
                {
                    return Err(AppError::Validation(format!(
                        "Invalid seat number '{}'",
                        label
                    )));
                }
                if !labels.insert(label.clone()) {
                    return Err(AppError::Validation(format!(
                        "Seat {} requested more than once",
                        label
                    )));
                }
                Some(label)
            }
            None => None,
        };

        normalized.push(Passenger {
            name,
            age: passenger.age,
            gender: passenger.gender,
            seat_number,
        });
    }

    Ok(normalized)
}

/// Seat labels held by pending or confirmed bookings of a bus on one day.
pub async fn held_seats<C: ConnectionTrait>(
    conn: &C,
    bus_id: Uuid,
    travel_date: NaiveDate,
) -> AppResult<BTreeSet<String>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::BusId.eq(bus_id))
        .filter(booking::Column::TravelDate.eq(travel_date))
        .filter(
            booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]),
        )
        .all(conn)
        .await?;

    Ok(bookings
        .iter()
        .flat_map(|b| b.passenger_details.seat_labels())
        .map(str::to_string)
        .collect())
}

/// Requested labels that are already held, in request order.
pub fn conflicting<'a>(requested: &[&'a str], held: &BTreeSet<String>) -> Vec<&'a str> {
    requested
        .iter()
        .copied()
        .filter(|label| held.contains(*label))
        .collect()
}
