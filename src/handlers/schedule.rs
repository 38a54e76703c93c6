use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;

use crate::errors::{AppError, AppResult};
use crate::models::{Booking, BookingRequest};
use crate::state::AppState;

/// Manager routes need `Authorization: Bearer <MANAGER_TOKEN>`.
fn require_manager(headers: &HeaderMap, expected_token: &str) -> AppResult<()> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn read_body(payload: Result<Json<BookingRequest>, JsonRejection>) -> AppResult<BookingRequest> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    Ok(request)
}

// POST /schedule
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let request = read_body(payload)?;
    let booking = state.schedules.create(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /schedule
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Booking>>> {
    require_manager(&headers, &state.config.manager_token)?;
    Ok(Json(state.schedules.list().await?))
}

// GET /schedule/avaliable-days
pub async fn available_days(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.schedules.available_days().await?))
}

// GET /schedule/:id
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    require_manager(&headers, &state.config.manager_token)?;
    Ok(Json(state.schedules.get(&id).await?))
}

// PUT /schedule/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    require_manager(&headers, &state.config.manager_token)?;
    let request = read_body(payload)?;
    state.schedules.update(&id, request).await?;
    Ok(StatusCode::OK)
}

// DELETE /schedule/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    require_manager(&headers, &state.config.manager_token)?;
    state.schedules.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /schedule/car/:plate
pub async fn by_license_plate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(plate): Path<String>,
) -> AppResult<Json<Vec<Booking>>> {
    require_manager(&headers, &state.config.manager_token)?;
    Ok(Json(state.schedules.list_by_license_plate(&plate).await?))
}

// GET /schedule/cpf/:cpf
pub async fn by_cpf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(cpf): Path<String>,
) -> AppResult<Json<Vec<Booking>>> {
    require_manager(&headers, &state.config.manager_token)?;
    Ok(Json(state.schedules.list_by_cpf(&cpf).await?))
}

// GET /schedule/month/:month
pub async fn by_month(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(month): Path<String>,
) -> AppResult<Json<Vec<Booking>>> {
    require_manager(&headers, &state.config.manager_token)?;
    Ok(Json(state.schedules.list_by_month(&month).await?))
}

// GET /schedule/month/:month/week/:week
pub async fn by_week(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((month, week)): Path<(String, String)>,
) -> AppResult<Json<Vec<Booking>>> {
    require_manager(&headers, &state.config.manager_token)?;
    Ok(Json(state.schedules.list_by_week(&week, &month).await?))
}

// GET /schedule/month/:month/day/:day
pub async fn by_day(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((month, day)): Path<(String, String)>,
) -> AppResult<Json<Vec<Booking>>> {
    require_manager(&headers, &state.config.manager_token)?;
    Ok(Json(state.schedules.list_by_day(&day, &month).await?))
}
