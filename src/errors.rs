//! Error types you might see while checking containers for updates

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors while resolving and comparing image digests
#[derive(Error, Debug)]
pub enum ImageError {
    /// invalid image reference format
    #[error("invalid image reference format: {0:?}")]
    InvalidReferenceFormat(String),

    /// image has recorded digests but no usable repository tag
    #[error("image {0} has content digests but no repository tag")]
    MissingRepoTag(String),

    /// network request error
    #[error("network request error: {0}")]
    NetworkRequest(#[from] reqwest::Error),

    /// registry token endpoint refused our request
    #[error("registry token endpoint returned {0}")]
    TokenStatus(reqwest::StatusCode),

    /// json error
    #[error("json error: {0}")]
    JSON(#[from] serde_json::Error),

    /// invalid registry endpoint url
    #[error("invalid registry endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// fallback digest lookup failed
    #[error("fallback digest lookup failed for {image}: {message}")]
    Lookup { image: String, message: String },
}

/// Errors while gathering the container inventory or serving results
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// container runtime error
    #[error("container runtime error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// container runtime returned an incomplete record
    #[error("container runtime returned a container without {0}")]
    IncompleteContainer(&'static str),

    /// container image error
    #[error("container image error: {0}")]
    ImageError(#[from] ImageError),

    /// task join error
    #[error("task join error: {0}")]
    TaskJoinError(#[from] tokio::task::JoinError),

    /// io error
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),
}

impl IntoResponse for RuntimeError {
    fn into_response(self) -> Response {
        log::error!("{}", self);
        let body = serde_json::json!({
            "message": self.to_string()
        });
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}
