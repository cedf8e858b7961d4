//! HTTP surface.
//!
//! Two equivalent route families are mounted on one router:
//!
//! ```text
//! /iiif/2/{filename}/info.json
//! /iiif/2/{filename}/{region}/{size}/{rotation}/{quality}.{format}
//! /{filename}/info.json
//! /{filename}/{region}/{size}/{rotation}/{quality}.{format}
//! /healthz
//! ```
//!
//! Each family carries an `Extension<RoutePrefix>` so handlers know which
//! prefix to put in `@id` and the canonical `Link` header. Handlers move the
//! blocking pipeline onto the [`WorkerPool`] and map [`ServiceError`] to a
//! status code with a JSON `{"detail": ...}` body.

use crate::config::{ServerConfig, effective_threads};
use crate::imaging::{ImageBackend, RustBackend};
use crate::info::{PROFILE_LEVEL2, RoutePrefix};
use crate::pool::{PoolError, WorkerPool};
use crate::resolver::{FsResolver, Resolver};
use crate::service::{ImageRequest, ImageService, ServiceError};
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const INTERNAL_ERROR_DETAIL: &str = "An error occurred serving this image";

#[derive(Error, Debug)]
pub enum ServeError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared, read-only state behind every handler.
pub struct AppState<R, B> {
    pub service: Arc<ImageService<R, B>>,
    pub pool: Arc<WorkerPool>,
}

impl<R, B> Clone for AppState<R, B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<R, B> AppState<R, B> {
    pub fn new(service: ImageService<R, B>, pool: WorkerPool) -> Self {
        Self {
            service: Arc::new(service),
            pool: Arc::new(pool),
        }
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Parse(_) | ServiceError::Geometry(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            ServiceError::Backend(_) | ServiceError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            error!(error = %self, "request failed");
            INTERNAL_ERROR_DETAIL.to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

fn profile_link() -> String {
    format!("<{}>;rel=\"profile\"", PROFILE_LEVEL2)
}

/// Build the router for a service. Both route families share one state.
pub fn router<R, B>(state: AppState<R, B>) -> Router
where
    R: Resolver + 'static,
    B: ImageBackend + 'static,
{
    let family = || {
        Router::new()
            .route("/:filename/info.json", get(info_handler::<R, B>))
            .route(
                "/:filename/:region/:size/:rotation/:quality_format",
                get(image_handler::<R, B>),
            )
    };

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/iiif/2", family().layer(Extension(RoutePrefix::Iiif2)))
        .merge(family().layer(Extension(RoutePrefix::Bare)))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn info_handler<R, B>(
    State(state): State<AppState<R, B>>,
    Extension(route): Extension<RoutePrefix>,
    Path(filename): Path<String>,
) -> Result<Response, ServiceError>
where
    R: Resolver + 'static,
    B: ImageBackend + 'static,
{
    let service = Arc::clone(&state.service);
    let info = state
        .pool
        .run(move || service.info(&filename, route))
        .await??;
    Ok((
        AppendHeaders([(header::LINK, profile_link())]),
        Json(info),
    )
        .into_response())
}

async fn image_handler<R, B>(
    State(state): State<AppState<R, B>>,
    Extension(route): Extension<RoutePrefix>,
    Path(req): Path<ImageRequest>,
) -> Result<Response, ServiceError>
where
    R: Resolver + 'static,
    B: ImageBackend + 'static,
{
    let service = Arc::clone(&state.service);
    let rendered = state
        .pool
        .run(move || service.image(&req, route))
        .await??;
    let canonical = format!("<{}>;rel=\"canonical\"", rendered.canonical_uri);
    Ok((
        [(header::CONTENT_TYPE, rendered.content_type)],
        AppendHeaders([(header::LINK, canonical), (header::LINK, profile_link())]),
        rendered.bytes,
    )
        .into_response())
}

/// Resolves when Ctrl-C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}

/// Serve `config` with the filesystem resolver and the pure Rust backend
/// until a shutdown signal arrives.
pub async fn serve(config: ServerConfig) -> Result<(), ServeError> {
    let pool = WorkerPool::new(effective_threads(&config.processing))?;
    let bind = config.server.bind;
    info!(
        roots = ?config.search_roots,
        base_uri = %config.base_uri,
        workers = pool.threads(),
        "starting image server"
    );

    let resolver = FsResolver::from_config(&config);
    let service = ImageService::new(config, resolver, RustBackend::new());
    let app = router(AppState::new(service, pool));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}
