//! Dustbin handlers: list, get, create, edit, remove, fill-level ingestion.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    DustbinDto, DustbinListResponse, DustbinLocationRequest, DustbinResponse, FillLevelRequest,
    ReassignmentDto, RemoveDustbinsRequest, RemoveDustbinsResponse,
};
use crate::api::extract::ApiJson;
use crate::app_state::AppState;
use crate::domain::{DustbinId, FillReading};
use crate::error::{ErrorResponse, GatewayError};

/// `GET /dustbins` — List active bins.
///
/// # Errors
///
/// Returns [`GatewayError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/dustbins",
    tag = "Dustbins",
    summary = "List dustbins",
    description = "Returns every active bin in identifier order with relative-time labels.",
    responses(
        (status = 200, description = "Active fleet", body = DustbinListResponse),
    )
)]
pub async fn list_dustbins(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let bins = state.dustbin_service.list().await?;
    Ok(Json(DustbinListResponse {
        success: true,
        dustbins: DustbinDto::from_list(&bins, Utc::now()),
    }))
}

/// `GET /dustbins/{id}` — Get one bin.
///
/// # Errors
///
/// Returns [`GatewayError::DustbinNotFound`] for an unknown bin.
#[utoipa::path(
    get,
    path = "/api/v1/dustbins/{id}",
    tag = "Dustbins",
    summary = "Get a dustbin",
    params(("id" = String, Path, description = "Dustbin identifier, e.g. 001")),
    responses(
        (status = 200, description = "The bin", body = DustbinResponse),
        (status = 404, description = "No active bin with this id", body = ErrorResponse),
    )
)]
pub async fn get_dustbin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let bin = state.dustbin_service.get(&DustbinId::from_raw(id)).await?;
    Ok(Json(DustbinResponse {
        success: true,
        dustbin: DustbinDto::from_dustbin(&bin, Utc::now()),
        message: None,
    }))
}

/// `POST /dustbins` — Add a bin.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the location is blank.
#[utoipa::path(
    post,
    path = "/api/v1/dustbins",
    tag = "Dustbins",
    summary = "Add a dustbin",
    description = "Creates an empty bin with the next sequential identifier.",
    request_body = DustbinLocationRequest,
    responses(
        (status = 201, description = "Bin created", body = DustbinResponse),
        (status = 400, description = "Location missing or blank", body = ErrorResponse),
    )
)]
pub async fn create_dustbin(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DustbinLocationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let bin = state
        .dustbin_service
        .create(req.location.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DustbinResponse {
            success: true,
            dustbin: DustbinDto::from_dustbin(&bin, Utc::now()),
            message: Some("Dustbin added successfully".to_string()),
        }),
    ))
}

/// `PUT /dustbins/{id}` — Change a bin's location.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] or
/// [`GatewayError::DustbinNotFound`].
#[utoipa::path(
    put,
    path = "/api/v1/dustbins/{id}",
    tag = "Dustbins",
    summary = "Edit a dustbin",
    params(("id" = String, Path, description = "Dustbin identifier")),
    request_body = DustbinLocationRequest,
    responses(
        (status = 200, description = "Bin updated", body = DustbinResponse),
        (status = 400, description = "Location missing or blank", body = ErrorResponse),
        (status = 404, description = "No active bin with this id", body = ErrorResponse),
    )
)]
pub async fn update_dustbin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<DustbinLocationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let bin = state
        .dustbin_service
        .update_location(&DustbinId::from_raw(id), req.location.as_deref())
        .await?;
    Ok(Json(DustbinResponse {
        success: true,
        dustbin: DustbinDto::from_dustbin(&bin, Utc::now()),
        message: Some("Dustbin updated successfully".to_string()),
    }))
}

/// `DELETE /dustbins` — Retire bins and renumber the fleet.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when `dustbinIds` is missing
/// or empty.
#[utoipa::path(
    delete,
    path = "/api/v1/dustbins",
    tag = "Dustbins",
    summary = "Remove dustbins",
    description = "Soft-deletes the given bins and renumbers the remaining ones to a contiguous 001..N sequence in one transaction.",
    request_body = RemoveDustbinsRequest,
    responses(
        (status = 200, description = "Bins removed and fleet renumbered", body = RemoveDustbinsResponse),
        (status = 400, description = "dustbinIds missing or empty", body = ErrorResponse),
    )
)]
pub async fn remove_dustbins(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RemoveDustbinsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state.dustbin_service.remove(req.dustbin_ids).await?;
    let message = format!(
        "{} dustbin(s) removed, {} renumbered",
        outcome.removed.len(),
        outcome.reassigned.len()
    );
    Ok(Json(RemoveDustbinsResponse {
        success: true,
        removed: outcome.removed.iter().map(ToString::to_string).collect(),
        renumbered_dustbins: DustbinDto::from_list(&outcome.dustbins, Utc::now()),
        reassigned: outcome.reassigned.iter().map(ReassignmentDto::from).collect(),
        message,
    }))
}

/// `PUT /dustbins/{id}/fill-level` — Ingest a sensor reading.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for missing or out-of-range
/// levels and [`GatewayError::DustbinNotFound`] for an unknown bin.
#[utoipa::path(
    put,
    path = "/api/v1/dustbins/{id}/fill-level",
    tag = "Dustbins",
    summary = "Update fill levels",
    description = "Sensor callback. Requires all three fill percentages; the battery level is optional and kept when omitted. Crossing 80% overall raises a notification.",
    params(("id" = String, Path, description = "Dustbin identifier")),
    request_body = FillLevelRequest,
    responses(
        (status = 200, description = "Reading applied", body = DustbinResponse),
        (status = 400, description = "Missing or invalid levels", body = ErrorResponse),
        (status = 404, description = "No active bin with this id", body = ErrorResponse),
    )
)]
pub async fn update_fill_level(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<FillLevelRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let reading = FillReading::new(
        req.overall_fill_level,
        req.wet_waste_fill_level,
        req.dry_waste_fill_level,
        req.battery_level,
    )?;
    let bin = state
        .dustbin_service
        .record_reading(&DustbinId::from_raw(id), reading)
        .await?;
    Ok(Json(DustbinResponse {
        success: true,
        dustbin: DustbinDto::from_dustbin(&bin, Utc::now()),
        message: Some("Fill levels updated successfully".to_string()),
    }))
}

/// Dustbin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/dustbins",
            get(list_dustbins)
                .post(create_dustbin)
                .delete(remove_dustbins),
        )
        .route("/dustbins/{id}", get(get_dustbin).put(update_dustbin))
        .route("/dustbins/{id}/fill-level", put(update_fill_level))
}
