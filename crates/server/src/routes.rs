use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use controller::{Rotator, SlmController};
use shared::{
    error::{ApiError, ErrorCode, SlmError},
    protocol::{
        AngleResponse, JumpRequest, PositionResponse, RotatorVoltageRequest,
        RotatorVoltageResponse, SetAngleRequest, SetAngleResponse, SetSequenceRequest,
        SetSequenceResponse, TriggerConfigRequest, TriggerModeResponse, TriggerTypeResponse,
    },
};

pub struct AppState {
    pub controller: Arc<SlmController>,
    pub rotator: Arc<Rotator>,
}

/// The control surface. Each route maps 1:1 onto one controller operation.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/sequence", post(set_sequence))
        .route("/position", get(position).post(jump))
        .route("/angle", get(angle).post(set_angle))
        .route("/trigger", put(configure_trigger).post(fire_trigger))
        .route("/trigger/type", get(trigger_type))
        .route("/trigger/mode", get(trigger_mode))
        .route(
            "/rotator/voltage",
            get(rotator_voltage).put(set_rotator_voltage),
        )
        .with_state(state)
}

type Rejection = (StatusCode, Json<ApiError>);

fn reject(error: SlmError) -> Rejection {
    let status = match error.code() {
        ErrorCode::OutOfRange | ErrorCode::UnsupportedFeature => StatusCode::BAD_REQUEST,
        ErrorCode::NoSequenceAssigned => StatusCode::CONFLICT,
        ErrorCode::NoMatchingSequence => StatusCode::NOT_FOUND,
        ErrorCode::Provisioning => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiError::from(error)))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn set_sequence(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetSequenceRequest>,
) -> Result<Json<SetSequenceResponse>, Rejection> {
    // Provisioning copies pattern files; keep it off the runtime workers.
    let controller = Arc::clone(&state.controller);
    let len = tokio::task::spawn_blocking(move || controller.set_sequence(&req.entries))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(ErrorCode::Provisioning, e.to_string())),
            )
        })?
        .map_err(reject)?;
    Ok(Json(SetSequenceResponse { len }))
}

async fn position(State(state): State<Arc<AppState>>) -> Json<PositionResponse> {
    Json(PositionResponse {
        position: state.controller.position(),
    })
}

async fn jump(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JumpRequest>,
) -> Result<Json<PositionResponse>, Rejection> {
    state.controller.cycle_to(req.position).map_err(reject)?;
    Ok(Json(PositionResponse {
        position: req.position,
    }))
}

async fn angle(State(state): State<Arc<AppState>>) -> Result<Json<AngleResponse>, Rejection> {
    let angle = state.controller.diffraction_angle().map_err(reject)?;
    Ok(Json(AngleResponse { angle }))
}

async fn set_angle(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetAngleRequest>,
) -> Result<Json<SetAngleResponse>, Rejection> {
    let position = state
        .controller
        .set_diffraction_angle(req.angle)
        .map_err(reject)?;
    Ok(Json(SetAngleResponse {
        position,
        angle: req.angle,
    }))
}

async fn configure_trigger(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TriggerConfigRequest>,
) -> Result<StatusCode, Rejection> {
    state
        .controller
        .set_trigger(req.trigger_type, req.trigger_mode)
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fire_trigger(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PositionResponse>, Rejection> {
    let position = state.controller.trigger().map_err(reject)?;
    Ok(Json(PositionResponse { position }))
}

async fn trigger_type(State(state): State<Arc<AppState>>) -> Json<TriggerTypeResponse> {
    Json(TriggerTypeResponse {
        trigger_type: state.controller.trigger_type(),
    })
}

async fn trigger_mode(State(state): State<Arc<AppState>>) -> Json<TriggerModeResponse> {
    Json(TriggerModeResponse {
        trigger_mode: state.controller.trigger_mode(),
    })
}

async fn rotator_voltage(State(state): State<Arc<AppState>>) -> Json<RotatorVoltageResponse> {
    Json(RotatorVoltageResponse {
        voltage: state.rotator.voltage(),
    })
}

async fn set_rotator_voltage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RotatorVoltageRequest>,
) -> Json<RotatorVoltageResponse> {
    state.rotator.set_voltage(req.voltage);
    Json(RotatorVoltageResponse {
        voltage: req.voltage,
    })
}
