use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use travel_core::{
    ClientTrip, CreateClientRequest, RegistrationOutcome, UnregistrationOutcome, ValidationErrors,
};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreatedClientResponse {
    pub id: i32,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self { message: message.into() })
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", post(create_client))
        .route("/clients/{id}/trips", get(list_client_trips))
        .route(
            "/clients/{id}/trips/{trip_id}",
            put(register_client_for_trip).delete(unregister_client_from_trip),
        )
}

fn path_error(rejection: PathRejection) -> AppError {
    AppError::BadRequestError(rejection.body_text())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/clients/{id}/trips
///
/// An empty result is a 404: the store does not tell an unknown client apart
/// from a client with no registrations.
async fn list_client_trips(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<ClientTrip>>, AppError> {
    let Path(client_id) = path.map_err(path_error)?;

    let trips = state.repo.list_client_trips(client_id).await?;
    if trips.is_empty() {
        return Err(AppError::NotFoundError(format!(
            "Client with id {client_id} does not exist or has no registered trips."
        )));
    }

    Ok(Json(trips))
}

/// POST /api/clients
async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        let mut errors = ValidationErrors::new();
        errors.add("body", rejection.body_text());
        AppError::ValidationError(errors)
    })?;

    let client = req.validate().map_err(AppError::ValidationError)?;
    tracing::debug!(?client, "Creating client");

    let id = state.repo.create_client(&client).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/clients/{id}/trips"))],
        Json(CreatedClientResponse { id }),
    ))
}

/// PUT /api/clients/{id}/trips/{trip_id}
async fn register_client_for_trip(
    State(state): State<AppState>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path((client_id, trip_id)) = path.map_err(path_error)?;

    match state.repo.register_client_for_trip(client_id, trip_id).await? {
        RegistrationOutcome::ClientNotFound => Err(AppError::NotFoundError(format!(
            "Client with id {client_id} does not exist."
        ))),
        RegistrationOutcome::TripNotFound => Err(AppError::NotFoundError(format!(
            "Trip with id {trip_id} does not exist."
        ))),
        RegistrationOutcome::CapacityReached => Err(AppError::BadRequestError(format!(
            "Trip {trip_id} has reached its maximum number of participants."
        ))),
        RegistrationOutcome::AlreadyRegistered => Err(AppError::BadRequestError(format!(
            "Client {client_id} is already registered for trip {trip_id}."
        ))),
        RegistrationOutcome::Registered => Ok(MessageResponse::new(format!(
            "Client {client_id} registered for trip {trip_id}."
        ))),
    }
}

/// DELETE /api/clients/{id}/trips/{trip_id}
async fn unregister_client_from_trip(
    State(state): State<AppState>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path((client_id, trip_id)) = path.map_err(path_error)?;

    match state.repo.unregister_client_from_trip(client_id, trip_id).await? {
        UnregistrationOutcome::RegistrationNotFound => Err(AppError::NotFoundError(format!(
            "Registration of client {client_id} for trip {trip_id} does not exist."
        ))),
        UnregistrationOutcome::Unregistered => Ok(MessageResponse::new(format!(
            "Registration of client {client_id} for trip {trip_id} removed."
        ))),
    }
}
