use crate::domain::model::VehicleInfo;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Registration data returned by `/check-rego`.
#[derive(Debug, Serialize)]
pub struct RegoData {
    pub state: String,
    pub plate: String,
    pub registration_status: String,
    pub make: String,
    pub model: String,
    pub colour: String,
    pub year: String,
    pub error: Option<String>,
}

impl RegoData {
    pub fn new(state: &str, plate: &str, info: VehicleInfo) -> Self {
        Self {
            state: state.to_string(),
            plate: plate.to_string(),
            registration_status: info.status.as_str().to_string(),
            make: info.make,
            model: info.model,
            colour: info.colour,
            year: info.year,
            error: info.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
    pub data: RegoData,
}

impl SuccessResponse {
    pub fn new(data: RegoData) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub states: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

/// JSON error with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
