use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::session::SessionError;
use crate::validators::AmountError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{stage} lookup failed: {source}")]
    Export {
        stage: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failures of the external collaborators: relational store, identity lookup
/// and the hosted auth provider's user endpoint.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Postgres database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("Auth provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Auth provider returned status {0}")]
    UnexpectedStatus(u16),
    #[error("Store error: {0}")]
    Msg(String),
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::InvalidInput(_) | AppError::InvalidAmount(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "ok": false, "error": self.to_string() }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "ok": false, "error": "Unauthorized" }),
            ),
            AppError::Provision(ProvisionError::Rejected(message)) => (
                StatusCode::BAD_REQUEST,
                json!({ "ok": false, "error": message }),
            ),
            AppError::Export { stage, .. } => {
                tracing::error!("Export failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "ok": false, "where": stage, "error": "Internal server error" }),
                )
            }
            _ => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "ok": false, "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
