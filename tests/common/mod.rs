#![allow(dead_code)]

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use sea_orm_migration::MigratorTrait;
use tokio::sync::OnceCell;
use uuid::Uuid;

use bus_reservation_backend::booking::{BookingManager, NewBooking, Principal};
use bus_reservation_backend::entities::booking::{Gender, Passenger};
use bus_reservation_backend::entities::bus::{self, BusStatus, OperatingDays, Weekday};
use bus_reservation_backend::entities::user::{self, UserRole};
use bus_reservation_backend::{AppState, Config};

pub const FARE: i64 = 750;

/// Fresh in-memory database with all migrations applied.
///
/// A single pooled connection keeps every query on the same SQLite database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

static POSTGRES_MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Multi-connection Postgres pool from `TEST_DATABASE_URL`, or `None` when unset.
///
/// Row locks and concurrent writers only behave for real here; the SQLite pool
/// above runs every transaction on one connection.
pub async fn postgres_db() -> Option<DatabaseConnection> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let mut options = ConnectOptions::new(url);
    options.max_connections(16).sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    POSTGRES_MIGRATED
        .get_or_init(|| async {
            migration::Migrator::up(&db, None).await.unwrap();
        })
        .await;
    Some(db)
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        admin_email: "admin@test.local".to_string(),
        admin_password: "admin-password".to_string(),
        max_seats_per_booking: 6,
    }
}

pub async fn test_state() -> AppState {
    AppState::new(setup_db().await, test_config())
}

pub fn manager(db: &DatabaseConnection) -> BookingManager<'_> {
    BookingManager::new(db, 6)
}

pub async fn create_user(db: &DatabaseConnection, role: UserRole) -> Principal {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(format!("{}@test.local", id)),
        password_hash: Set("not-a-real-hash".to_string()),
        name: Set("Test Rider".to_string()),
        phone: Set(None),
        role: Set(role),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .unwrap();

    Principal { user_id: id, role }
}

pub fn departure_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

pub async fn create_bus(db: &DatabaseConnection, capacity: i32) -> bus::Model {
    create_bus_with(db, capacity, BusStatus::Active, all_days()).await
}

pub async fn create_bus_with(
    db: &DatabaseConnection,
    capacity: i32,
    status: BusStatus,
    days: Vec<Weekday>,
) -> bus::Model {
    let id = Uuid::new_v4();
    bus::ActiveModel {
        id: Set(id),
        bus_number: Set(format!("TST-{}", &id.simple().to_string()[..8].to_uppercase())),
        name: Set("Test Express".to_string()),
        source: Set("Pune".to_string()),
        destination: Set("Mumbai".to_string()),
        departure_time: Set(departure_time()),
        arrival_time: Set(NaiveTime::from_hms_opt(13, 0, 0).unwrap()),
        fare: Set(FARE),
        capacity: Set(capacity),
        available_seats: Set(capacity),
        status: Set(status),
        operating_days: Set(OperatingDays(days)),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn reload_bus(db: &DatabaseConnection, id: Uuid) -> bus::Model {
    bus::Entity::find_by_id(id).one(db).await.unwrap().unwrap()
}

pub fn all_days() -> Vec<Weekday> {
    vec![
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ]
}

/// A travel date a few days out, so every policy window is reachable.
pub fn travel_date() -> NaiveDate {
    Utc::now().date_naive().checked_add_days(Days::new(3)).unwrap()
}

pub fn passengers(seats: &[Option<&str>]) -> Vec<Passenger> {
    seats
        .iter()
        .enumerate()
        .map(|(i, seat)| Passenger {
            name: format!("Passenger {}", i + 1),
            age: 30,
            gender: Gender::Other,
            seat_number: seat.map(str::to_string),
        })
        .collect()
}

pub fn request(bus_id: Uuid, seats: &[Option<&str>]) -> NewBooking {
    NewBooking {
        bus_id,
        travel_date: travel_date(),
        passengers: passengers(seats),
    }
}
