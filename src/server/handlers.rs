//! Probe, delay, and configuration handlers
//!
//! - `GET /startup`, `/readiness`, `/liveness` - sleep the configured delay
//! - `GET /delay/{seconds}` - sleep unconditionally
//! - `GET /graceDelay/{seconds}` - sleep in one-second steps, stop on drain
//! - `POST /config` - replace all three probe delays

use super::app::ServerState;
use super::error::ApiError;
use super::shutdown::ShutdownSignal;
use crate::delays::ProbeKind;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Step size of the shutdown-aware delay
pub(crate) const GRACE_TICK: Duration = Duration::from_secs(1);

/// `{"message": ...}` response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message<T> {
    pub message: T,
}

/// Body of `POST /config`, echoed back verbatim on success
///
/// Missing and `null` fields decode as empty strings, which reset that
/// probe to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub startup: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub readiness: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub liveness: String,
}

impl ConfigRequest {
    /// Decode a config body regardless of its Content-Type
    ///
    /// A top-level `null` is an empty request; anything that is not JSON,
    /// or has a non-string field, is rejected.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Option<Self>>(body).map(Option::unwrap_or_default)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

pub(crate) async fn startup(State(state): State<ServerState>) -> Json<Message<&'static str>> {
    probe(&state, ProbeKind::Startup).await
}

pub(crate) async fn readiness(State(state): State<ServerState>) -> Json<Message<&'static str>> {
    probe(&state, ProbeKind::Readiness).await
}

pub(crate) async fn liveness(State(state): State<ServerState>) -> Json<Message<&'static str>> {
    probe(&state, ProbeKind::Liveness).await
}

/// Sleep for the delay captured at entry; a later config change or a
/// drain does not shorten it.
async fn probe(state: &ServerState, kind: ProbeKind) -> Json<Message<&'static str>> {
    let delay = state.delays().get(kind);
    debug!(probe = %kind, delay_secs = delay.as_secs(), "Probe sleeping");
    tokio::time::sleep(delay).await;
    Json(Message {
        message: kind.as_str(),
    })
}

pub(crate) async fn update_config(
    State(state): State<ServerState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ConfigRequest>), ApiError> {
    let request = ConfigRequest::from_json(&body).map_err(|e| {
        debug!(error = %e, "Rejected config body");
        ApiError::InvalidJson
    })?;

    let delays = state.delays();
    delays.set(ProbeKind::Startup, &request.startup);
    delays.set(ProbeKind::Readiness, &request.readiness);
    delays.set(ProbeKind::Liveness, &request.liveness);

    let snapshot = delays.snapshot();
    info!(
        startup_secs = snapshot.startup.delay.as_secs(),
        readiness_secs = snapshot.readiness.delay.as_secs(),
        liveness_secs = snapshot.liveness.delay.as_secs(),
        "Probe delays updated"
    );

    Ok((StatusCode::CREATED, Json(request)))
}

/// Negative values are echoed back but sleep zero.
pub(crate) async fn delay(Path(seconds): Path<String>) -> Result<Json<Message<i64>>, ApiError> {
    let seconds: i64 = seconds.parse().map_err(|_| ApiError::InvalidDelay)?;

    let sleep_secs = u64::try_from(seconds).unwrap_or(0);
    tokio::time::sleep(Duration::from_secs(sleep_secs)).await;

    Ok(Json(Message { message: seconds }))
}

pub(crate) async fn grace_delay(
    State(state): State<ServerState>,
    Path(seconds): Path<String>,
) -> Result<Json<Message<u64>>, ApiError> {
    // Unsigned: no sign prefix, not even `+`
    if !seconds.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(ApiError::InvalidDelay);
    }
    let seconds: u64 = seconds.parse().map_err(|_| ApiError::InvalidDelay)?;

    let elapsed = sleep_until_drained(seconds, state.shutdown(), GRACE_TICK).await;
    if elapsed < seconds {
        info!(
            requested_secs = seconds,
            elapsed_secs = elapsed,
            "Grace delay cut short by shutdown"
        );
    }

    Ok(Json(Message { message: elapsed }))
}

/// Sleep up to `steps` ticks, returning how many were slept
///
/// The drain is checked after each tick is slept and counted, never before
/// the first, so a call made while already draining still reports 1.
pub(crate) async fn sleep_until_drained(
    steps: u64,
    shutdown: &ShutdownSignal,
    tick: Duration,
) -> u64 {
    let mut elapsed = 0;
    while elapsed < steps {
        tokio::time::sleep(tick).await;
        elapsed += 1;
        if shutdown.is_draining() {
            break;
        }
    }
    elapsed
}
