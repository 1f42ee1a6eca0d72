use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{EntityTrait, QueryOrder};
use serde::Deserialize;
use uuid::Uuid;

use crate::booking::BookingFilter;
use crate::entities::booking::BookingStatus;
use crate::entities::user;
use crate::error::AppResult;
use crate::handlers::auth::UserInfo;
use crate::handlers::bookings::{manager, single_response, with_buses, BookingResponse};
use crate::AppState;

// ============ Booking Management ============

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<BookingStatus>,
    pub bus_id: Option<Uuid>,
    pub travel_date: Option<NaiveDate>,
}

/// List all bookings, optionally filtered (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let filter = BookingFilter {
        status: query.status,
        bus_id: query.bus_id,
        travel_date: query.travel_date,
    };

    let bookings = manager(&state).list(&filter).await?;
    Ok(Json(with_buses(&state.db, bookings).await?))
}

/// Confirm a pending booking after payment (admin)
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let confirmed = manager(&state).confirm(booking_id, Utc::now()).await?;
    single_response(&state.db, confirmed).await
}

/// Mark a confirmed booking as travelled (admin)
pub async fn complete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let completed = manager(&state).complete(booking_id, Utc::now()).await?;
    single_response(&state.db, completed).await
}

// ============ User Management ============

/// List all users (admin)
pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserInfo>>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}
