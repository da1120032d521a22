use crate::backend::BackendError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_valid::ValidRejection;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized Access")]
    Unauthorized,

    #[error("Forbidden Access")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Internal(String),
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl<E: Into<AppError>> From<ValidRejection<E>> for AppError {
    fn from(rejection: ValidRejection<E>) -> Self {
        match rejection {
            ValidRejection::Valid(errors) => AppError::BadRequest(invalid_fields(&errors)),
            ValidRejection::Inner(inner) => inner.into(),
        }
    }
}

/// Names the offending fields without echoing the submitted values.
fn invalid_fields(errors: &ValidationErrors) -> String {
    debug!(?errors, "Request failed validation");
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    fields.sort();
    format!("Invalid value for: {}", fields.join(", "))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Backend(_) | AppError::Internal(_) => {
                // Details stay in the log, the client only gets the id.
                let error_id = Uuid::new_v4();
                error!(%error_id, err = %self, "Request failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal Server Error", "errorId": error_id })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
