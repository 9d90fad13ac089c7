//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (capture, tracing, timeout)
//! - Bind server to listener with peer address info
//! - Drain gracefully on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Extension, Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::EchoConfig;
use crate::http::middleware::capture_requests;
use crate::http::request::RequestSnapshot;
use crate::http::response::{echo_response, status_code_response};
use crate::observability::RequestLogger;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub logger: RequestLogger,
    pub max_body_size: usize,
}

/// HTTP server for the echo service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EchoConfig) -> Self {
        let state = AppState {
            logger: RequestLogger::from_config(&config.observability),
            max_body_size: config.limits.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EchoConfig, state: AppState) -> Router {
        Router::new()
            .route(
                "/errorcode/{code}",
                get(error_code_handler).on(non_get_echo_methods(), echo_handler),
            )
            .route("/", on(echo_methods(), echo_handler))
            .route("/{*path}", on(echo_methods(), echo_handler))
            .layer(middleware::from_fn_with_state(state.clone(), capture_requests))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving on a custom transport.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Methods answered by the echo route.
fn echo_methods() -> MethodFilter {
    MethodFilter::GET
        .or(MethodFilter::HEAD)
        .or(non_get_echo_methods())
}

/// Echo methods left over once GET (and HEAD) belong to the status route.
fn non_get_echo_methods() -> MethodFilter {
    MethodFilter::POST
        .or(MethodFilter::PUT)
        .or(MethodFilter::DELETE)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::OPTIONS)
}

async fn echo_handler(Extension(snapshot): Extension<Arc<RequestSnapshot>>) -> Response {
    echo_response(&snapshot)
}

async fn error_code_handler(
    State(state): State<AppState>,
    Extension(snapshot): Extension<Arc<RequestSnapshot>>,
    code: Result<Path<i64>, PathRejection>,
) -> Response {
    match code {
        Ok(Path(code)) => status_code_response(code, &snapshot, &state.logger).into_response(),
        Err(rejection) => {
            tracing::debug!(
                path = %snapshot.path,
                reason = %rejection.body_text(),
                "Status code segment is not an integer"
            );
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response()
        }
    }
}
