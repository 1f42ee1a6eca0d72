use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::{BookingManager, NewBooking, Principal};
use crate::entities::booking::{self, Passenger};
use crate::entities::bus;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub bus_id: Uuid,
    pub travel_date: NaiveDate,
    pub passenger_details: Vec<Passenger>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BusSummary {
    pub id: Uuid,
    pub bus_number: String,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}

impl From<&bus::Model> for BusSummary {
    fn from(b: &bus::Model) -> Self {
        Self {
            id: b.id,
            bus_number: b.bus_number.clone(),
            name: b.name.clone(),
            source: b.source.clone(),
            destination: b.destination.clone(),
            departure_time: b.departure_time,
            arrival_time: b.arrival_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub bus: Option<BusSummary>,
}

/// Attach bus details to each booking with a single bus query.
pub async fn with_buses(
    db: &DatabaseConnection,
    bookings: Vec<booking::Model>,
) -> AppResult<Vec<BookingResponse>> {
    let mut bus_ids: Vec<Uuid> = bookings.iter().map(|b| b.bus_id).collect();
    bus_ids.sort_unstable();
    bus_ids.dedup();

    let buses: HashMap<Uuid, bus::Model> = if bus_ids.is_empty() {
        HashMap::new()
    } else {
        bus::Entity::find()
            .filter(bus::Column::Id.is_in(bus_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect()
    };

    Ok(bookings
        .into_iter()
        .map(|b| {
            let bus = buses.get(&b.bus_id).map(BusSummary::from);
            BookingResponse { booking: b, bus }
        })
        .collect())
}

pub async fn single_response(
    db: &DatabaseConnection,
    booking: booking::Model,
) -> AppResult<Json<BookingResponse>> {
    with_buses(db, vec![booking])
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::Internal("Booking response was empty".to_string()))
}

pub(crate) fn manager(state: &AppState) -> BookingManager<'_> {
    BookingManager::new(&state.db, state.config.max_seats_per_booking)
}

/// Create a booking
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    let request = NewBooking {
        bus_id: payload.bus_id,
        travel_date: payload.travel_date,
        passengers: payload.passenger_details,
    };

    let created = manager(&state)
        .create(&principal, request, Utc::now())
        .await?;
    single_response(&state.db, created).await
}

/// List the caller's bookings, newest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let bookings = manager(&state).list_for_user(principal.user_id).await?;
    Ok(Json(with_buses(&state.db, bookings).await?))
}

/// Get one of the caller's bookings
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let found = manager(&state).get(&principal, booking_id).await?;
    single_response(&state.db, found).await
}

/// Cancel a booking owned by the caller (admins may cancel any booking)
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(booking_id): Path<Uuid>,
    payload: Option<Json<CancelBookingRequest>>,
) -> AppResult<Json<BookingResponse>> {
    let reason = payload.and_then(|Json(p)| p.reason);

    let cancelled = manager(&state)
        .cancel(&principal, booking_id, reason, Utc::now())
        .await?;
    single_response(&state.db, cancelled).await
}
