//! HTTP gateway: axum router over the [`ControlService`].
//!
//! | Method | Path                       | Auth | Handler            |
//! |--------|----------------------------|------|--------------------|
//! | GET    | `/api/status`              |      | `system_status`    |
//! | GET    | `/api/pins`                |      | `list_pins`        |
//! | GET    | `/api/pin/{id}`            |      | `pin_status`       |
//! | POST   | `/api/pin/{id}/on`         | yes  | `pin_on`           |
//! | POST   | `/api/pin/{id}/off`        | yes  | `pin_off`          |
//! | POST   | `/api/emergency-stop`      | yes  | `emergency_stop`   |
//! | GET    | `/api/debug/timers`        |      | `debug_timers`     |
//! | GET    | `/health`                  |      | `health`           |
//!
//! The bearer gate is a route layer on the mutating routes only.  CORS is
//! applied to the whole router from the configured origin allow-list.

pub mod error;
pub mod handlers;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use log::warn;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::adapters::auth::BearerAuth;
use crate::app::service::ControlService;

use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: ControlService,
    pub auth: BearerAuth,
}

impl AppState {
    pub fn new(service: ControlService, auth: BearerAuth) -> Self {
        Self { service, auth }
    }
}

/// Build the full router.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let protected = Router::new()
        .route("/api/pin/:pin/on", post(handlers::pin_on))
        .route("/api/pin/:pin/off", post(handlers::pin_off))
        .route("/api/emergency-stop", post(handlers::emergency_stop))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/api/status", get(handlers::system_status))
        .route("/api/pins", get(handlers::list_pins))
        .route("/api/pin/:pin", get(handlers::pin_status))
        .route("/api/debug/timers", get(handlers::debug_timers))
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    state.auth.check(authorization)?;
    Ok(next.run(request).await)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            if origin == "*" {
                warn!("CORS: wildcard origin ignored (credentials are allowed)");
                return None;
            }
            HeaderValue::from_str(origin)
                .map_err(|_| warn!("CORS: ignoring invalid origin {:?}", origin))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}
