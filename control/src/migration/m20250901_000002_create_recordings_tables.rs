use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Recordings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Recordings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Recordings::ShowId).uuid().not_null())
                    .col(ColumnDef::new(Recordings::StationId).uuid().not_null())
                    .col(ColumnDef::new(Recordings::MosqueId).string().not_null())
                    .col(ColumnDef::new(Recordings::Title).string().not_null())
                    .col(ColumnDef::new(Recordings::Description).string().null())
                    .col(ColumnDef::new(Recordings::HostName).string().null())
                    .col(
                        ColumnDef::new(Recordings::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Recordings::Visibility)
                            .string()
                            .not_null()
                            .default("public"),
                    )
                    .col(
                        ColumnDef::new(Recordings::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Recordings::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Recordings::TotalDurationSecs)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Recordings::Error).string().null())
                    .col(
                        ColumnDef::new(Recordings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Recordings::UpdatedAt)
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
                    .name("idx_recordings_mosque_status")
                    .table(Recordings::Table)
                    .col(Recordings::MosqueId)
                    .col(Recordings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recordings_show")
                    .table(Recordings::Table)
                    .col(Recordings::ShowId)
                    .to_owned(),
            )
            .await?;

        // One row per segment index, re-delivered chunks replace in place
        manager
            .create_table(
                Table::create()
                    .table(RecordingChunks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RecordingChunks::RecordingId).uuid().not_null())
                    .col(ColumnDef::new(RecordingChunks::Idx).integer().not_null())
                    .col(ColumnDef::new(RecordingChunks::Filename).string().not_null())
                    .col(ColumnDef::new(RecordingChunks::StoragePath).string().not_null())
                    .col(ColumnDef::new(RecordingChunks::PublicUrl).string().not_null())
                    .col(ColumnDef::new(RecordingChunks::Codec).string().not_null())
                    .col(ColumnDef::new(RecordingChunks::DurationSecs).double().null())
                    .col(ColumnDef::new(RecordingChunks::SizeBytes).big_integer().null())
                    .col(
                        ColumnDef::new(RecordingChunks::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(RecordingChunks::RecordingId)
                            .col(RecordingChunks::Idx),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecordingChunks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recordings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Recordings {
    Table,
    Id,
    ShowId,
    StationId,
    MosqueId,
    Title,
    Description,
    HostName,
    Status,
    Visibility,
    StartedAt,
    EndedAt,
    TotalDurationSecs,
    Error,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RecordingChunks {
    Table,
    RecordingId,
    Idx,
    Filename,
    StoragePath,
    PublicUrl,
    Codec,
    DurationSecs,
    SizeBytes,
    UploadedAt,
}
