//! Mapping of use case errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    domain::{AuthError, RepositoryError},
    usecase::{ChatError, NotifyError, SuggestError, TeamError, TodoError},
};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        }
        let body = Json(json!({
            "statusCode": self.status.as_u16(),
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, e.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            RepositoryError::Conflict(_) => Self::new(StatusCode::CONFLICT, e.to_string()),
            RepositoryError::Unavailable(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(e: TodoError) -> Self {
        match e {
            TodoError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            TodoError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            TodoError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            TodoError::Repository(e) => e.into(),
        }
    }
}

impl From<TeamError> for ApiError {
    fn from(e: TeamError) -> Self {
        match e {
            TeamError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            TeamError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, e.to_string()),
            TeamError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            TeamError::Repository(e) => e.into(),
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(e: NotifyError) -> Self {
        match e {
            NotifyError::Repository(e) => e.into(),
        }
    }
}

impl From<SuggestError> for ApiError {
    fn from(e: SuggestError) -> Self {
        match e {
            SuggestError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }
}
