use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{
    Coordinates, CropProfile, IrrigationPlanner, IrrigationSchedule, Notice, PlanOutcome,
    PlanReport, ReverseGeocoder, ScheduleRequest, ScheduleSummary, SoilProfile,
    schedule_to_csv_string,
};

#[derive(Clone)]
pub struct AppState {
    planner: Arc<IrrigationPlanner>,
    geocoder: Option<Arc<ReverseGeocoder>>,
}

impl AppState {
    pub fn new(planner: IrrigationPlanner) -> Self {
        Self {
            planner: Arc::new(planner),
            geocoder: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: ReverseGeocoder) -> Self {
        self.geocoder = Some(Arc::new(geocoder));
        self
    }

    fn planner(&self) -> Arc<IrrigationPlanner> {
        self.planner.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    LocationRequired,
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        ApiError::internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::LocationRequired => {
                let body = Json(ErrorBody {
                    error: "location_required",
                    message: "Select a location on the map to continue.".to_string(),
                });
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal(message) => {
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub schedule: IrrigationSchedule,
    pub summary: ScheduleSummary,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
struct LocationQuery {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationResponse {
    pub coordinates: Coordinates,
    pub place_name: Option<String>,
    pub notices: Vec<Notice>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/crops", get(list_crops))
        .route("/soils", get(list_soils))
        .route("/location", get(resolve_location))
        .route("/schedule", post(generate_schedule))
        .route("/schedule/csv", post(generate_schedule_csv))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "irrigation scheduler HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_crops(State(state): State<AppState>) -> Json<Vec<CropProfile>> {
    Json(state.planner.tables().crops().to_vec())
}

async fn list_soils(State(state): State<AppState>) -> Json<Vec<SoilProfile>> {
    Json(state.planner.tables().soils().to_vec())
}

async fn resolve_location(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<LocationResponse>, ApiError> {
    let coordinates =
        Coordinates::new(query.lat, query.lon).map_err(|err| ApiError::invalid(err.to_string()))?;
    let (place_name, notices) = match state.geocoder.clone() {
        Some(geocoder) => {
            let (name, notice) =
                tokio::task::spawn_blocking(move || geocoder.place_name(coordinates)).await?;
            (name, notice.into_iter().collect())
        }
        None => (None, Vec::new()),
    };
    Ok(Json(LocationResponse {
        coordinates,
        place_name,
        notices,
    }))
}

/// The weather fetch blocks, so planning runs on the blocking pool.
async fn run_plan(state: &AppState, request: ScheduleRequest) -> Result<PlanReport, ApiError> {
    let planner = state.planner();
    let outcome = tokio::task::spawn_blocking(move || planner.plan(&request)).await?;
    match outcome.map_err(|err| ApiError::invalid(err.to_string()))? {
        PlanOutcome::NeedsLocation => Err(ApiError::LocationRequired),
        PlanOutcome::Planned(report) => Ok(report),
    }
}

async fn generate_schedule(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let report = run_plan(&state, request).await?;
    let summary = report.schedule.summary();
    Ok(Json(ScheduleResponse {
        schedule: report.schedule,
        summary,
        notices: report.notices,
    }))
}

async fn generate_schedule_csv(
    State(state): State<AppState>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Response, ApiError> {
    let report = run_plan(&state, request).await?;
    let csv = schedule_to_csv_string(&report.schedule)
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"irrigation_schedule.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
