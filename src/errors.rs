use axum::{http::StatusCode, response::IntoResponse, Json};

/// Request-level failure taxonomy.
///
/// `Validation` carries the field-level message shown inline by the frontend,
/// `NotFound` is a clean lookup miss, `Storage` wraps an adapter failure and
/// is surfaced as a generic 500 so storage internals never leak to clients.
#[derive(Debug)]
pub enum RequestError {
    Validation(String),
    NotFound,
    Storage(anyhow::Error),
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl RequestError {
    pub fn validation(message: impl Into<String>) -> Self {
        RequestError::Validation(message.into())
    }
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        Self::Storage(value.into())
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(value: reqwest::Error) -> Self {
        Self::Storage(value.into())
    }
}

impl From<std::io::Error> for RequestError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.into())
    }
}

impl From<serde_yaml::Error> for RequestError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Storage(value.into())
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(value: serde_json::Error) -> Self {
        Self::Storage(value.into())
    }
}

impl From<anyhow::Error> for RequestError {
    fn from(value: anyhow::Error) -> Self {
        Self::Storage(value)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            RequestError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            RequestError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            RequestError::Storage(cause) => {
                tracing::error!("storage failure: {cause:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}
