use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

use crate::crypto::CsrfFailure;

pub type ApiResult<T> = Result<T, ApiError>;

/// Request-level error taxonomy.
///
/// Validation failures carry field-level detail back to the client; CSRF
/// and upstream failures collapse to generic messages so internal detail
/// never leaves the server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Security check failed: {0}")]
    Csrf(#[from] CsrfFailure),

    #[error("Upstream service call failed")]
    Upstream(#[source] anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }
}

/// One field-level validation problem, surfaced to the client as-is
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    result: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Csrf(_) => StatusCode::FORBIDDEN,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Specific failure reasons go to the log only; the client sees a
        // generic message for everything except validation detail
        let body = match self {
            Self::Validation(fields) => ErrorBody {
                result: "error",
                message: "Validation failed",
                fields: Some(fields.as_slice()),
            },
            Self::Unauthorized(reason) => {
                tracing::warn!("Rejected unauthorized request: {}", reason);
                ErrorBody {
                    result: "error",
                    message: "Unauthorized",
                    fields: None,
                }
            }
            Self::Csrf(failure) => {
                tracing::warn!("Rejected form submission: {}", failure);
                ErrorBody {
                    result: "error",
                    message: "Security check failed. Please refresh the page and try again.",
                    fields: None,
                }
            }
            Self::Upstream(error) => {
                tracing::error!(error.cause_chain = ?error, "Upstream service call failed");
                ErrorBody {
                    result: "error",
                    message: "Something went wrong. Please try again.",
                    fields: None,
                }
            }
            Self::Internal(error) => {
                tracing::error!(error.cause_chain = ?error, "Internal error");
                ErrorBody {
                    result: "error",
                    message: "Internal server error",
                    fields: None,
                }
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
