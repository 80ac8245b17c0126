use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use travel_core::{CoreError, ValidationErrors};
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    ValidationError(ValidationErrors),
    BadRequestError(String),
    NotFoundError(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "fields": errors }),
            ),
            AppError::BadRequestError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Internal(err) => {
                // Details stay in the log; clients only get the incident id to quote.
                let incident_id = Uuid::new_v4();
                tracing::error!(%incident_id, "Internal Server Error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error", "incidentId": incident_id }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => AppError::ValidationError(errors),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}
