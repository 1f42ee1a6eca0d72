use sea_orm_migration::{prelude::*, schema::*};

use super::m20261001_000001_create_users::User;
use super::m20261001_000002_create_buses::Bus;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(string_len(Booking::BookingCode, 16).not_null().unique_key())
                    .col(uuid(Booking::BusId).not_null())
                    .col(uuid(Booking::UserId).not_null())
                    .col(json(Booking::PassengerDetails).not_null())
                    .col(integer(Booking::SeatCount).not_null())
                    .col(date(Booking::TravelDate).not_null())
                    .col(big_integer(Booking::TotalAmount).not_null())
                    .col(string_len(Booking::Status, 16).not_null().default("pending"))
                    .col(string_len(Booking::PaymentStatus, 16).not_null().default("pending"))
                    .col(big_integer(Booking::RefundAmount).not_null().default(0))
                    .col(string_len_null(Booking::CancellationReason, 500))
                    .col(timestamp_with_time_zone_null(Booking::CancelledAt))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_bus")
                            .from(Booking::Table, Booking::BusId)
                            .to(Bus::Table, Bus::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Seat conflict checks scan by bus and calendar day.
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_bus_travel_date")
                    .table(Booking::Table)
                    .col(Booking::BusId)
                    .col(Booking::TravelDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_user")
                    .table(Booking::Table)
                    .col(Booking::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    BookingCode,
    BusId,
    UserId,
    PassengerDetails,
    SeatCount,
    TravelDate,
    TotalAmount,
    Status,
    PaymentStatus,
    RefundAmount,
    CancellationReason,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}
