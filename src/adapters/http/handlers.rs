//! Route handlers and wire payloads.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::app::service::{PinStatus, ZoneStatus};
use crate::pins::PinId;
use crate::scheduler::TimerSnapshot;
use crate::state::PinState;

use super::AppState;
use super::error::ApiError;

// ── Payloads ──────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PinControlRequest {
    /// Minutes until auto-off; absent or `<= 0` means the default.
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PinControlResponse {
    pub pin: PinId,
    pub state: PinState,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub ok: bool,
    pub pins: Vec<PinId>,
    pub allow_mode: String,
    pub deny: Vec<PinId>,
    pub backend: String,
    pub driver_connected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmergencyStopResponse {
    pub success: bool,
    pub message: String,
    pub stopped_pins: Vec<PinId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub gpio_connected: bool,
}

// ── Read-only ─────────────────────────────────────────────────

pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let report = state.service.status();
    Json(SystemStatus {
        ok: true,
        pins: report.controllable,
        allow_mode: "whitelist".into(),
        deny: report.denied,
        backend: report.backend.into(),
        driver_connected: report.connected,
    })
}

pub async fn list_pins(State(state): State<AppState>) -> Json<Vec<ZoneStatus>> {
    Json(state.service.zones())
}

pub async fn pin_status(
    State(state): State<AppState>,
    Path(pin): Path<i64>,
) -> Result<Json<PinStatus>, ApiError> {
    let pin = pin_id(pin)?;
    state
        .service
        .pin_status(pin)
        .map(Json)
        .map_err(|_| ApiError::UnknownPin(pin.into()))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Json(HealthResponse {
        status: "ok".into(),
        timestamp,
        gpio_connected: state.service.is_connected(),
    })
}

pub async fn debug_timers(State(state): State<AppState>) -> Json<BTreeMap<PinId, TimerSnapshot>> {
    Json(state.service.timers())
}

// ── Mutating (behind the bearer gate) ─────────────────────────

pub async fn pin_on(
    State(state): State<AppState>,
    Path(pin): Path<i64>,
    body: Option<Json<PinControlRequest>>,
) -> Result<Json<PinControlResponse>, ApiError> {
    let pin = pin_id(pin)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let activation = state.service.activate(pin, request.duration)?;
    Ok(Json(PinControlResponse {
        pin,
        state: PinState::On,
        success: true,
        message: Some(format!(
            "Pin {} turned on for {} minutes",
            pin, activation.minutes
        )),
    }))
}

pub async fn pin_off(
    State(state): State<AppState>,
    Path(pin): Path<i64>,
) -> Result<Json<PinControlResponse>, ApiError> {
    let pin = pin_id(pin)?;
    state.service.deactivate(pin)?;
    Ok(Json(PinControlResponse {
        pin,
        state: PinState::Off,
        success: true,
        message: Some(format!("Pin {} turned off", pin)),
    }))
}

pub async fn emergency_stop(State(state): State<AppState>) -> Json<EmergencyStopResponse> {
    let report = state.service.emergency_stop();
    Json(EmergencyStopResponse {
        success: true,
        message: format!("Emergency stop: {} pins turned off", report.stopped.len()),
        stopped_pins: report.stopped,
    })
}

fn pin_id(raw: i64) -> Result<PinId, ApiError> {
    PinId::try_from(raw).map_err(|_| ApiError::UnknownPin(raw))
}
