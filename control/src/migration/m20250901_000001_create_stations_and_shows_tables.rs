use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stations::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Stations::MosqueId).string().not_null())
                    .col(ColumnDef::new(Stations::Name).string().not_null())
                    .col(ColumnDef::new(Stations::Slug).string().not_null())
                    .col(
                        ColumnDef::new(Stations::MountPoint)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Stations::Format)
                            .string()
                            .not_null()
                            .default("mp3"),
                    )
                    .col(
                        ColumnDef::new(Stations::IsLive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Stations::CurrentTrackTitle).string().null())
                    .col(ColumnDef::new(Stations::CurrentTrackArtist).string().null())
                    .col(
                        ColumnDef::new(Stations::CurrentTrackStartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Stations::SourceUser).string().not_null())
                    .col(ColumnDef::new(Stations::SourcePassword).string().not_null())
                    .col(
                        ColumnDef::new(Stations::Listeners)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Stations::PeakListeners)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Stations::TotalListeners)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Stations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Stations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Shows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shows::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Shows::StationId).uuid().not_null())
                    .col(ColumnDef::new(Shows::MosqueId).string().not_null())
                    .col(ColumnDef::new(Shows::Title).string().not_null())
                    .col(ColumnDef::new(Shows::HostName).string().null())
                    .col(
                        ColumnDef::new(Shows::ScheduledStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shows::ScheduledEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Shows::IsLive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Shows::ActualStart)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Shows::ActualEnd)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Shows::RecordingEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Shows::RecordingId).uuid().null())
                    .col(
                        ColumnDef::new(Shows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Shows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shows_station_live")
                    .table(Shows::Table)
                    .col(Shows::StationId)
                    .col(Shows::IsLive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Stations {
    Table,
    Id,
    MosqueId,
    Name,
    Slug,
    MountPoint,
    Format,
    IsLive,
    CurrentTrackTitle,
    CurrentTrackArtist,
    CurrentTrackStartedAt,
    SourceUser,
    SourcePassword,
    Listeners,
    PeakListeners,
    TotalListeners,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Shows {
    Table,
    Id,
    StationId,
    MosqueId,
    Title,
    HostName,
    ScheduledStart,
    ScheduledEnd,
    IsLive,
    ActualStart,
    ActualEnd,
    RecordingEnabled,
    RecordingId,
    CreatedAt,
    UpdatedAt,
}
