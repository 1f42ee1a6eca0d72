use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::booking::ledger;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::bus::{self, BusStatus, OperatingDays, Weekday};
use crate::error::{AppError, AppResult};
use crate::AppState;

const MAX_CAPACITY: i32 = 100;

#[derive(Debug, Deserialize)]
pub struct BusSearchQuery {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBusRequest {
    pub bus_number: String,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub fare: i64,
    pub capacity: i32,
    pub operating_days: Vec<Weekday>,
    pub status: Option<BusStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBusRequest {
    pub name: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub departure_time: Option<NaiveTime>,
    pub arrival_time: Option<NaiveTime>,
    pub fare: Option<i64>,
    pub capacity: Option<i32>,
    pub operating_days: Option<Vec<Weekday>>,
    pub status: Option<BusStatus>,
}

fn normalize_bus_number(raw: &str) -> AppResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty()
        || code.len() > 32
        || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AppError::Validation(
            "Bus number may only contain letters, digits and hyphens".to_string(),
        ));
    }
    Ok(code)
}

fn required_text(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() || value.len() > 100 {
        return Err(AppError::Validation(format!(
            "{} must be between 1 and 100 characters",
            field
        )));
    }
    Ok(value.to_string())
}

fn validate_route(source: &str, destination: &str) -> AppResult<()> {
    if source.eq_ignore_ascii_case(destination) {
        return Err(AppError::Validation(
            "Source and destination must be different".to_string(),
        ));
    }
    Ok(())
}

fn operating_days(days: Vec<Weekday>) -> AppResult<OperatingDays> {
    let mut unique = Vec::with_capacity(days.len());
    for day in days {
        if !unique.contains(&day) {
            unique.push(day);
        }
    }
    if unique.is_empty() {
        return Err(AppError::Validation(
            "At least one operating day is required".to_string(),
        ));
    }
    Ok(OperatingDays(unique))
}

fn validate_fare(fare: i64) -> AppResult<()> {
    if fare < 0 {
        return Err(AppError::Validation("Fare cannot be negative".to_string()));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> AppResult<()> {
    if !(1..=MAX_CAPACITY).contains(&capacity) {
        return Err(AppError::Validation(format!(
            "Capacity must be between 1 and {}",
            MAX_CAPACITY
        )));
    }
    Ok(())
}

/// Search active buses by route and travel date
pub async fn search_buses(
    State(state): State<AppState>,
    Query(query): Query<BusSearchQuery>,
) -> AppResult<Json<Vec<bus::Model>>> {
    if let Some(date) = query.date {
        if date < Utc::now().date_naive() {
            return Err(AppError::Validation(
                "Travel date cannot be in the past".to_string(),
            ));
        }
    }

    let buses = bus::Entity::find()
        .filter(bus::Column::Status.eq(BusStatus::Active))
        .order_by_asc(bus::Column::DepartureTime)
        .all(&state.db)
        .await?;

    let matches_text = |wanted: &Option<String>, actual: &str| {
        wanted
            .as_deref()
            .map(str::trim)
            .is_none_or(|w| w.is_empty() || w.eq_ignore_ascii_case(actual))
    };

    let results = buses
        .into_iter()
        .filter(|b| matches_text(&query.source, &b.source))
        .filter(|b| matches_text(&query.destination, &b.destination))
        .filter(|b| query.date.is_none_or(|d| b.operating_days.includes(d)))
        .collect();

    Ok(Json(results))
}

/// Get bus details
pub async fn get_bus(
    State(state): State<AppState>,
    Path(bus_id): Path<Uuid>,
) -> AppResult<Json<bus::Model>> {
    let bus = bus::Entity::find_by_id(bus_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bus not found".to_string()))?;

    Ok(Json(bus))
}

/// Create a new bus (admin)
pub async fn create_bus(
    State(state): State<AppState>,
    Json(payload): Json<CreateBusRequest>,
) -> AppResult<Json<bus::Model>> {
    let bus_number = normalize_bus_number(&payload.bus_number)?;
    let name = required_text(&payload.name, "Name")?;
    let source = required_text(&payload.source, "Source")?;
    let destination = required_text(&payload.destination, "Destination")?;
    validate_route(&source, &destination)?;
    validate_fare(payload.fare)?;
    validate_capacity(payload.capacity)?;
    let days = operating_days(payload.operating_days)?;

    let existing = bus::Entity::find()
        .filter(bus::Column::BusNumber.eq(&bus_number))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Bus {} already exists",
            bus_number
        )));
    }

    let new_bus = bus::ActiveModel {
        id: Set(Uuid::new_v4()),
        bus_number: Set(bus_number),
        name: Set(name),
        source: Set(source),
        destination: Set(destination),
        departure_time: Set(payload.departure_time),
        arrival_time: Set(payload.arrival_time),
        fare: Set(payload.fare),
        capacity: Set(payload.capacity),
        available_seats: Set(payload.capacity),
        status: Set(payload.status.unwrap_or(BusStatus::Active)),
        operating_days: Set(days),
        created_at: Set(Utc::now().fixed_offset()),
    };

    let created = new_bus.insert(&state.db).await?;
    tracing::info!(bus_id = %created.id, bus_number = %created.bus_number, "bus created");
    Ok(Json(created))
}

/// Update a bus (admin)
///
/// Capacity changes keep the number of booked seats fixed and adjust
/// availability by the difference.
pub async fn update_bus(
    State(state): State<AppState>,
    Path(bus_id): Path<Uuid>,
    Json(payload): Json<UpdateBusRequest>,
) -> AppResult<Json<bus::Model>> {
    let txn = state.db.begin().await?;

    let current = bus::Entity::find_by_id(bus_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Bus not found".to_string()))?;

    let source = match &payload.source {
        Some(s) => required_text(s, "Source")?,
        None => current.source.clone(),
    };
    let destination = match &payload.destination {
        Some(d) => required_text(d, "Destination")?,
        None => current.destination.clone(),
    };
    validate_route(&source, &destination)?;

    let mut active: bus::ActiveModel = current.clone().into();

    if let Some(name) = &payload.name {
        active.name = Set(required_text(name, "Name")?);
    }
    if payload.source.is_some() {
        active.source = Set(source);
    }
    if payload.destination.is_some() {
        active.destination = Set(destination);
    }
    if let Some(time) = payload.departure_time {
        active.departure_time = Set(time);
    }
    if let Some(time) = payload.arrival_time {
        active.arrival_time = Set(time);
    }
    if let Some(fare) = payload.fare {
        validate_fare(fare)?;
        active.fare = Set(fare);
    }
    if let Some(days) = payload.operating_days {
        active.operating_days = Set(operating_days(days)?);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }

    if active.is_changed() {
        active.update(&txn).await?;
    }

    if let Some(capacity) = payload.capacity {
        validate_capacity(capacity)?;
        if capacity != current.capacity {
            ledger::resize(&txn, &current, capacity).await?;
        }
    }

    let updated = bus::Entity::find_by_id(bus_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Bus not found".to_string()))?;
    txn.commit().await?;

    tracing::info!(bus_id = %bus_id, "bus updated");
    Ok(Json(updated))
}

/// Delete a bus with no live bookings (admin)
///
/// Cancelled and completed bookings for the bus are removed with it. The bus
/// row stays locked until commit so no booking can be created in between.
pub async fn delete_bus(
    State(state): State<AppState>,
    Path(bus_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let txn = state.db.begin().await?;

    bus::Entity::find_by_id(bus_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Bus not found".to_string()))?;

    let live = booking::Entity::find()
        .filter(booking::Column::BusId.eq(bus_id))
        .filter(booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]))
        .count(&txn)
        .await?;

    if live > 0 {
        return Err(AppError::Conflict(format!(
            "Bus has {} pending or confirmed bookings; set its status to inactive instead",
            live
        )));
    }

    let history = booking::Entity::delete_many()
        .filter(booking::Column::BusId.eq(bus_id))
        .exec(&txn)
        .await?;
    bus::Entity::delete_by_id(bus_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        bus_id = %bus_id,
        bookings_removed = history.rows_affected,
        "bus deleted"
    );
    Ok(Json(serde_json::json!({ "message": "Bus deleted" })))
}
