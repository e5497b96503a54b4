use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use api::response::ErrorBody;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Forbidden(String),
    ResourceNotFound(String),
    DatabaseError(String),
    InternalServerError(anyhow::Error),
}

impl AppError {
    pub fn bad_request<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::BadRequest(t.to_string())
    }

    pub fn forbidden<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::Forbidden(t.to_string())
    }

    pub fn not_found<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::ResourceNotFound(t.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ResourceNotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("database error: {msg}"),
            ),
            AppError::InternalServerError(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        match err.downcast_ref::<sea_orm::DbErr>() {
            Some(db) => AppError::DatabaseError(db.to_string()),
            None => AppError::InternalServerError(err),
        }
    }
}
