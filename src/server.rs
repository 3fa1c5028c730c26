//! HTTP service exposing the annotated container list

use crate::{
    errors::{ImageError, RuntimeError},
    update::UpdateChecker,
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};

/// Application state shared with handlers
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<UpdateChecker>,
}

/// Router with the single `GET /containers` route
pub fn create_router(checker: Arc<UpdateChecker>) -> Router {
    Router::new()
        .route("/containers", get(list_containers))
        .with_state(AppState { checker })
}

async fn list_containers(State(state): State<AppState>) -> Result<Response, RuntimeError> {
    let containers = state.checker.check_all().await?;
    let body = serde_json::to_string_pretty(&containers).map_err(ImageError::from)?;
    Ok((
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response())
}

/// Serve the router on `addr` until the process ends
pub async fn serve(addr: SocketAddr, checker: Arc<UpdateChecker>) -> Result<(), RuntimeError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on http://{}/containers", listener.local_addr()?);
    axum::serve(listener, create_router(checker)).await?;
    Ok(())
}
