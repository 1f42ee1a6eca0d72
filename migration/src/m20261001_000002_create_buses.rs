use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bus::Table)
                    .if_not_exists()
                    .col(uuid(Bus::Id).primary_key())
                    .col(string_len(Bus::BusNumber, 32).not_null().unique_key())
                    .col(string_len(Bus::Name, 100).not_null())
                    .col(string_len(Bus::Source, 100).not_null())
                    .col(string_len(Bus::Destination, 100).not_null())
                    .col(time(Bus::DepartureTime).not_null())
                    .col(time(Bus::ArrivalTime).not_null())
                    .col(big_integer(Bus::Fare).not_null())
                    .col(integer(Bus::Capacity).not_null())
                    .col(integer(Bus::AvailableSeats).not_null())
                    .col(string_len(Bus::Status, 16).not_null().default("active"))
                    .col(json(Bus::OperatingDays).not_null())
                    .col(
                        timestamp_with_time_zone(Bus::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Bus::AvailableSeats).gte(0))
                    .check(Expr::col(Bus::AvailableSeats).lte(Expr::col(Bus::Capacity)))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bus_route")
                    .table(Bus::Table)
                    .col(Bus::Source)
                    .col(Bus::Destination)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bus::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bus {
    Table,
    Id,
    BusNumber,
    Name,
    Source,
    Destination,
    DepartureTime,
    ArrivalTime,
    Fare,
    Capacity,
    AvailableSeats,
    Status,
    OperatingDays,
    CreatedAt,
}
