use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::access::{AccessCheckError, AccessDenied};
use crate::forward::ForwardError;

/// Terminal failures of an intercepted exchange.
///
/// Each variant maps to a fixed status and a short plain-text body; the
/// detailed cause goes to the log only.
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    #[error("failed to read request body: {0}")]
    ReadBody(#[source] axum::Error),
    #[error("access denied: {0}")]
    AccessDenied(#[source] AccessDenied),
    #[error("access check unavailable: {0}")]
    CheckUnavailable(#[source] AccessCheckError),
    #[error("failed to create forward request: {0}")]
    BuildForward(String),
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
    #[error("failed to read upstream response: {0}")]
    ReadResponse(#[source] reqwest::Error),
}

impl From<ForwardError> for InterceptError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Build(reason) => Self::BuildForward(reason),
            ForwardError::Send(e) => Self::Upstream(e),
            ForwardError::ReadBody(e) => Self::ReadResponse(e),
        }
    }
}

impl InterceptError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ReadBody(_) => StatusCode::BAD_REQUEST,
            Self::AccessDenied(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text written to the client.
    pub fn client_message(&self) -> String {
        match self {
            Self::ReadBody(_) => "Invalid request body".to_string(),
            Self::AccessDenied(_) => "Access Denied".to_string(),
            Self::CheckUnavailable(_) => "Checking service unavailable".to_string(),
            Self::BuildForward(_) => "Failed to create forward request".to_string(),
            Self::Upstream(e) => format!("Request failed: {}", error_chain(e)),
            Self::ReadResponse(_) => "Failed to read response".to_string(),
        }
    }
}

/// `err` followed by each of its causes, joined with `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl IntoResponse for InterceptError {
    fn into_response(self) -> Response {
        match &self {
            Self::ReadBody(_) | Self::AccessDenied(_) => {
                tracing::warn!(error = %self, "Request rejected")
            }
            _ => tracing::error!(error = %self, "Request failed"),
        }

        (self.status(), Body::from(self.client_message())).into_response()
    }
}
