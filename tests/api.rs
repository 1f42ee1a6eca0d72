mod common;

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use bus_reservation_backend::entities::user::UserRole;
use bus_reservation_backend::routes::create_router;
use bus_reservation_backend::booking::Principal;
use bus_reservation_backend::utils::jwt::{Claims, TokenKeys};

use common::*;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let mut request = builder.body(body).unwrap();
    // Public routes are rate limited by peer address.
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn token_for(principal: &Principal) -> String {
    let claims = Claims::new(
        principal.user_id,
        "someone@test.local",
        principal.role,
        chrono::Utc::now(),
        chrono::Duration::hours(1),
    );
    TokenKeys::from_config(&test_config()).sign(&claims).unwrap()
}

fn bus_payload(bus_number: &str, capacity: i32) -> Value {
    json!({
        "bus_number": bus_number,
        "name": "Deccan Queen",
        "source": "Pune",
        "destination": "Mumbai",
        "departure_time": "09:00:00",
        "arrival_time": "13:00:00",
        "fare": 500,
        "capacity": capacity,
        "operating_days": ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"]
    })
}

#[tokio::test]
async fn register_login_and_profile() {
    let state = test_state().await;
    let app = create_router(state);

    let register = json!({
        "email": "Rider@Example.com",
        "password": "secret123",
        "name": "Rider"
    });
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(register.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "rider@example.com");
    assert_eq!(body["user"]["role"], "user");

    let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(register)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "rider@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Rider");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "rider@example.com", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthenticated");
}

#[tokio::test]
async fn booking_routes_require_a_token() {
    let app = create_router(test_state().await);

    let (status, body) = send(&app, "GET", "/api/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthenticated");

    let (status, _) = send(&app, "GET", "/api/bookings", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let state = test_state().await;
    let rider = create_user(&state.db, UserRole::User).await;
    let app = create_router(state);

    let (status, body) = send(
        &app,
        "GET",
        "/api/admin/bookings",
        Some(&token_for(&rider)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/buses",
        Some(&token_for(&rider)),
        Some(bus_payload("MH-12-1", 40)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn bus_inventory_lifecycle() {
    let state = test_state().await;
    let admin = create_user(&state.db, UserRole::Admin).await;
    let app = create_router(state);
    let admin_token = token_for(&admin);

    let (status, bus) = send(
        &app,
        "POST",
        "/api/admin/buses",
        Some(&admin_token),
        Some(bus_payload("mh-12-ab-1", 40)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bus["bus_number"], "MH-12-AB-1");
    assert_eq!(bus["available_seats"], 40);
    assert_eq!(bus["status"], "active");

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/buses",
        Some(&admin_token),
        Some(bus_payload("MH-12-AB-1", 40)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let (status, body) = send(
        &app,
        "POST",
        "/api/admin/buses",
        Some(&admin_token),
        Some(bus_payload("BAD NUMBER", 40)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationFailed");

    let (status, found) = send(
        &app,
        "GET",
        "/api/buses?source=pune&destination=MUMBAI",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let bus_id = bus["id"].as_str().unwrap();
    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/admin/buses/{}", bus_id),
        Some(&admin_token),
        Some(json!({ "capacity": 30, "status": "maintenance" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["capacity"], 30);
    assert_eq!(updated["available_seats"], 30);
    assert_eq!(updated["status"], "maintenance");

    let (_, found) = send(&app, "GET", "/api/buses?source=Pune", None, None).await;
    assert!(found.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/admin/buses/{}", bus_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/buses/{}", bus_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn booking_flow_over_http() {
    let state = test_state().await;
    let admin = create_user(&state.db, UserRole::Admin).await;
    let rider = create_user(&state.db, UserRole::User).await;
    let bus = create_bus(&state.db, 2).await;
    let app = create_router(state);
    let rider_token = token_for(&rider);
    let admin_token = token_for(&admin);

    let booking_request = json!({
        "bus_id": bus.id,
        "travel_date": travel_date(),
        "passenger_details": [
            { "name": "Asha", "age": 34, "gender": "female", "seat_number": "A1" },
            { "name": "Ravi", "age": 36, "gender": "male" }
        ]
    });
    let (status, created) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(&rider_token),
        Some(booking_request),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["payment_status"], "pending");
    assert_eq!(created["total_amount"], FARE * 2);
    assert_eq!(created["bus"]["bus_number"], bus.bus_number.as_str());

    let overbook = json!({
        "bus_id": bus.id,
        "travel_date": travel_date(),
        "passenger_details": [{ "name": "Late", "age": 20, "gender": "other" }]
    });
    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(&rider_token),
        Some(overbook),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InsufficientCapacity");

    let booking_id = created["id"].as_str().unwrap();
    let (status, confirmed) = send(
        &app,
        "POST",
        &format!("/api/admin/bookings/{}/confirm", booking_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");
    assert_eq!(confirmed["payment_status"], "paid");

    let (status, mine) = send(&app, "GET", "/api/bookings", Some(&rider_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("/api/bookings/{}/cancel", booking_id),
        Some(&rider_token),
        Some(json!({ "reason": "change of plans" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["payment_status"], "refunded");
    assert_eq!(cancelled["refund_amount"], FARE * 2 * 9 / 10);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/admin/bookings/{}/confirm", booking_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InvalidTransition");

    let (status, all) = send(
        &app,
        "GET",
        "/api/admin/bookings?status=cancelled",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn other_users_cannot_see_a_booking() {
    let state = test_state().await;
    let owner = create_user(&state.db, UserRole::User).await;
    let stranger = create_user(&state.db, UserRole::User).await;
    let bus = create_bus(&state.db, 5).await;
    let app = create_router(state);

    let (_, created) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(&token_for(&owner)),
        Some(json!({
            "bus_id": bus.id,
            "travel_date": travel_date(),
            "passenger_details": [{ "name": "Owner", "age": 40, "gender": "male" }]
        })),
    )
    .await;
    let path = format!("/api/bookings/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &path, Some(&token_for(&owner)), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &path, Some(&token_for(&stranger)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn bus_with_only_cancelled_bookings_can_be_deleted() {
    let state = test_state().await;
    let admin = create_user(&state.db, UserRole::Admin).await;
    let rider = create_user(&state.db, UserRole::User).await;
    let bus = create_bus(&state.db, 5).await;
    let app = create_router(state);
    let admin_token = token_for(&admin);
    let rider_token = token_for(&rider);
    let bus_path = format!("/api/admin/buses/{}", bus.id);

    let (_, created) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(&rider_token),
        Some(json!({
            "bus_id": bus.id,
            "travel_date": travel_date(),
            "passenger_details": [{ "name": "Meera", "age": 29, "gender": "female" }]
        })),
    )
    .await;

    let (status, body) = send(&app, "DELETE", &bus_path, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");

    let cancel_path = format!("/api/bookings/{}/cancel", created["id"].as_str().unwrap());
    let (status, _) = send(&app, "POST", &cancel_path, Some(&rider_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &bus_path, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/api/buses/{}", bus.id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = send(&app, "GET", "/api/bookings", Some(&rider_token), None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admins_list_users_without_password_hashes() {
    let state = test_state().await;
    let admin = create_user(&state.db, UserRole::Admin).await;
    let rider = create_user(&state.db, UserRole::User).await;
    let app = create_router(state);

    let (status, users) = send(
        &app,
        "GET",
        "/api/admin/users",
        Some(&token_for(&admin)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
    assert!(users.iter().any(|u| u["id"] == rider.user_id.to_string()));

    let (status, body) = send(
        &app,
        "GET",
        "/api/admin/users",
        Some(&token_for(&rider)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}
