use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use api::recorder::ChunkPayload;
use api::recording::{Chunk, Recording, RecordingStatus, Visibility};
use api::request::{PublicRecordingsQuery, RecordingsQuery};

use crate::entity::recording_chunks::{self, Entity as RecordingChunks};
use crate::entity::recordings::{self, Entity as Recordings};
use crate::entity::{shows, stations};
use crate::service::now;
use crate::service::shows::AD_HOC_TITLE;

/// Fields a recorder callback may overwrite
#[derive(Debug, Clone, Default)]
pub struct RecordingUpdate {
    pub status: RecordingStatus,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_duration_secs: Option<u64>,
    pub error: Option<String>,
}

pub struct RecordingsService;

impl RecordingsService {
    pub async fn create_pending(
        db: &DatabaseConnection,
        show: &shows::Model,
        station: &stations::Model,
    ) -> Result<recordings::Model> {
        let model = recordings::ActiveModel {
            id: Set(Uuid::new_v4()),
            show_id: Set(show.id),
            station_id: Set(station.id),
            mosque_id: Set(show.mosque_id.clone()),
            title: Set(show.title.clone()),
            description: Set(None),
            host_name: Set(show.host_name.clone()),
            status: Set(RecordingStatus::Pending.to_string()),
            visibility: Set(Visibility::Public.to_string()),
            started_at: Set(Some(now())),
            ended_at: Set(None),
            total_duration_secs: Set(None),
            error: Set(None),
            created_at: Set(now()),
            updated_at: Set(now()),
        };
        Ok(model.insert(db).await?)
    }

    pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<Option<recordings::Model>> {
        Ok(Recordings::find_by_id(id).one(db).await?)
    }

    pub async fn chunks(
        db: &DatabaseConnection,
        recording_id: Uuid,
    ) -> Result<Vec<recording_chunks::Model>> {
        let chunks = RecordingChunks::find()
            .filter(recording_chunks::Column::RecordingId.eq(recording_id))
            .order_by_asc(recording_chunks::Column::Idx)
            .all(db)
            .await?;
        Ok(chunks)
    }

    /// Recording with its chunks ordered by index
    pub async fn load(db: &DatabaseConnection, id: Uuid) -> Result<Option<Recording>> {
        match Self::get(db, id).await? {
            Some(model) => {
                let chunks = Self::chunks(db, model.id).await?;
                Ok(Some(to_api(model, chunks)))
            }
            None => Ok(None),
        }
    }

    /// Stores a chunk by index; a re-delivered index replaces the earlier row.
    pub async fn upsert_chunk(
        db: &DatabaseConnection,
        recording_id: Uuid,
        chunk: &ChunkPayload,
    ) -> Result<()> {
        let model = recording_chunks::ActiveModel {
            recording_id: Set(recording_id),
            idx: Set(chunk.index as i32),
            filename: Set(chunk.filename.clone()),
            storage_path: Set(chunk.storage_path.clone()),
            public_url: Set(chunk.public_url.clone()),
            codec: Set(chunk.codec.to_string()),
            duration_secs: Set(chunk.duration_secs),
            size_bytes: Set(chunk.size_bytes.map(|s| s as i64)),
            uploaded_at: Set(now()),
        };

        RecordingChunks::insert(model)
            .on_conflict(
                OnConflict::columns([
                    recording_chunks::Column::RecordingId,
                    recording_chunks::Column::Idx,
                ])
                .update_columns([
                    recording_chunks::Column::Filename,
                    recording_chunks::Column::StoragePath,
                    recording_chunks::Column::PublicUrl,
                    recording_chunks::Column::Codec,
                    recording_chunks::Column::DurationSecs,
                    recording_chunks::Column::SizeBytes,
                    recording_chunks::Column::UploadedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    pub async fn update(
        db: &DatabaseConnection,
        recording: recordings::Model,
        update: RecordingUpdate,
    ) -> Result<recordings::Model> {
        let mut active: recordings::ActiveModel = recording.into();
        active.status = Set(update.status.to_string());
        if let Some(ended_at) = update.ended_at {
            active.ended_at = Set(Some(ended_at.into()));
        }
        if let Some(total) = update.total_duration_secs {
            active.total_duration_secs = Set(Some(total as i64));
        }
        if let Some(error) = update.error {
            active.error = Set(Some(error));
        }
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    pub async fn mark_recording(
        db: &DatabaseConnection,
        recording: recordings::Model,
    ) -> Result<recordings::Model> {
        let mut active: recordings::ActiveModel = recording.into();
        active.status = Set(RecordingStatus::Recording.to_string());
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    pub async fn mark_failed(
        db: &DatabaseConnection,
        recording: recordings::Model,
        error: &str,
    ) -> Result<recordings::Model> {
        let mut active: recordings::ActiveModel = recording.into();
        active.status = Set(RecordingStatus::Failed.to_string());
        active.error = Set(Some(error.to_string()));
        active.updated_at = Set(now());
        Ok(active.update(db).await?)
    }

    /// Removes the recording and its chunks together
    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<bool> {
        let txn = db.begin().await?;
        RecordingChunks::delete_many()
            .filter(recording_chunks::Column::RecordingId.eq(id))
            .exec(&txn)
            .await?;
        let result = Recordings::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// Newest first
    pub async fn list(
        db: &DatabaseConnection,
        params: &RecordingsQuery,
    ) -> Result<(Vec<Recording>, u64)> {
        let mut query = Recordings::find();

        if let Some(mosque_id) = &params.mosque_id {
            query = query.filter(recordings::Column::MosqueId.eq(mosque_id.as_str()));
        }

        if let Some(status) = params.status {
            query = query.filter(recordings::Column::Status.eq(status.to_string()));
        }

        let total = query.clone().count(db).await?;
        let models = query
            .order_by_desc(recordings::Column::CreatedAt)
            .limit(params.limit())
            .all(db)
            .await?;

        Ok((Self::with_chunks(db, models).await?, total))
    }

    /// Ready public recordings, ad-hoc broadcasts excluded
    pub async fn list_public(
        db: &DatabaseConnection,
        params: &PublicRecordingsQuery,
    ) -> Result<(Vec<Recording>, u64)> {
        let mut query = Recordings::find()
            .filter(recordings::Column::Status.eq(RecordingStatus::Ready.to_string()))
            .filter(recordings::Column::Visibility.eq(Visibility::Public.to_string()))
            .filter(recordings::Column::Title.ne(AD_HOC_TITLE));

        if let Some(station_id) = &params.station_id {
            let station_id = Uuid::parse_str(station_id)?;
            query = query.filter(recordings::Column::StationId.eq(station_id));
        }

        if let Some(mosque_id) = &params.mosque_id {
            query = query.filter(recordings::Column::MosqueId.eq(mosque_id.as_str()));
        }

        let total = query.clone().count(db).await?;
        let models = query
            .order_by_desc(recordings::Column::CreatedAt)
            .offset(params.skip())
            .limit(params.limit())
            .all(db)
            .await?;

        Ok((Self::with_chunks(db, models).await?, total))
    }

    pub async fn find_ready_for_show(
        db: &DatabaseConnection,
        show_id: Uuid,
    ) -> Result<Option<Recording>> {
        let model = Recordings::find()
            .filter(recordings::Column::ShowId.eq(show_id))
            .filter(recordings::Column::Status.eq(RecordingStatus::Ready.to_string()))
            .order_by_desc(recordings::Column::CreatedAt)
            .one(db)
            .await?;

        match model {
            Some(model) => {
                let chunks = Self::chunks(db, model.id).await?;
                Ok(Some(to_api(model, chunks)))
            }
            None => Ok(None),
        }
    }

    async fn with_chunks(
        db: &DatabaseConnection,
        models: Vec<recordings::Model>,
    ) -> Result<Vec<Recording>> {
        let mut recordings = Vec::with_capacity(models.len());
        for model in models {
            let chunks = Self::chunks(db, model.id).await?;
            recordings.push(to_api(model, chunks));
        }
        Ok(recordings)
    }
}

pub fn to_api(model: recordings::Model, mut chunks: Vec<recording_chunks::Model>) -> Recording {
    chunks.sort_by_key(|c| c.idx);
    Recording {
        id: model.id.to_string(),
        show_id: model.show_id.to_string(),
        station_id: model.station_id.to_string(),
        mosque_id: model.mosque_id,
        title: model.title,
        description: model.description,
        host_name: model.host_name,
        status: model.status.parse().unwrap_or_default(),
        visibility: model.visibility.parse().unwrap_or_default(),
        chunks: chunks
            .into_iter()
            .map(|c| Chunk {
                index: c.idx.max(0) as u32,
                filename: c.filename,
                storage_path: c.storage_path,
                public_url: c.public_url,
                codec: c.codec.parse().unwrap_or_default(),
                duration_secs: c.duration_secs,
                size_bytes: c.size_bytes.map(|s| s.max(0) as u64),
                uploaded_at: c.uploaded_at.with_timezone(&Utc),
            })
            .collect(),
        started_at: model.started_at.map(|t| t.with_timezone(&Utc)),
        ended_at: model.ended_at.map(|t| t.with_timezone(&Utc)),
        total_duration_secs: model.total_duration_secs.map(|t| t.max(0) as u64),
        error: model.error,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
