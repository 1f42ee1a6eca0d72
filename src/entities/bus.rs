use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BusStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
    #[sea_orm(string_value = "maintenance")]
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// Weekdays a bus runs on, stored as a JSON array of lowercase names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct OperatingDays(pub Vec<Weekday>);

impl OperatingDays {
    pub fn includes(&self, date: NaiveDate) -> bool {
        let day = Weekday::from(date.weekday());
        self.0.contains(&day)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bus")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub bus_number: String,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub departure_time: Time,
    pub arrival_time: Time,
    pub fare: i64,
    pub capacity: i32,
    pub available_seats: i32,
    pub status: BusStatus,
    #[sea_orm(column_type = "Json")]
    pub operating_days: OperatingDays,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn booked_seats(&self) -> i32 {
        self.capacity - self.available_seats
    }

    /// Departure instant for a trip on `travel_date`, in UTC.
    pub fn departure_on(&self, travel_date: NaiveDate) -> DateTime<Utc> {
        NaiveDateTime::new(travel_date, self.departure_time).and_utc()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
