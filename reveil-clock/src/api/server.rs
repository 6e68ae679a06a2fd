//! HTTP server assembly.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use super::v0;
use crate::config::ClockConfig;
use crate::engine::Engine;
use crate::hw::{Clock, Display, Player};

/// Shared handle passed to every request handler.
///
/// The engine mutex is the single lock guarding alarm, override, and
/// session state; handlers hold it only for the duration of one
/// read-modify-write and never across a hardware call.
#[derive(Clone)]
pub struct SharedState {
    pub engine: Arc<Mutex<Engine>>,
    pub clock: Arc<dyn Clock>,
    pub player: Arc<dyn Player>,
    pub display: Arc<dyn Display>,
    pub config: Arc<Mutex<ClockConfig>>,
    pub config_path: Arc<PathBuf>,
}

#[derive(OpenApi)]
#[openapi(tags(
    (name = "health"),
    (name = "alarms", description = "Recurring alarm definitions"),
    (name = "overrides", description = "Single-date exceptions"),
    (name = "control", description = "Status, snooze, dismiss"),
    (name = "sounds", description = "Sound assets"),
    (name = "settings", description = "Runtime settings"),
))]
struct ApiDoc;

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/v0", v0::routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until the token is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    cancellation: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "API listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancellation.cancelled_owned())
        .await
}
