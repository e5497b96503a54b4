use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;

use api::response::ErrorBody;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    RecordingNotFound(String),
    RecordingAlreadyExists(String),
    Throw(String),
    InternalServerError(anyhow::Error),
}

impl AppError {
    pub fn bad_request<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::BadRequest(t.to_string())
    }

    pub fn recording_not_found<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::RecordingNotFound(t.to_string())
    }

    pub fn recording_already_exists<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::RecordingAlreadyExists(t.to_string())
    }

    pub fn throw<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::Throw(t.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err),
            AppError::RecordingNotFound(err) => (StatusCode::NOT_FOUND, err),
            AppError::RecordingAlreadyExists(err) => (StatusCode::CONFLICT, err),
            AppError::Throw(err) => (StatusCode::INTERNAL_SERVER_ERROR, err),
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
        AppError::InternalServerError(err.into())
    }
}
