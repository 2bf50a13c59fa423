use crate::api::page::{unsupported_state, PageView};
use crate::api::responses::{ApiError, HealthResponse, RegoData, SuccessResponse};
use crate::api::AppState;
use crate::domain::model::Plate;
use crate::utils::error::RegoError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub state: Option<String>,
    pub plate: Option<String>,
}

impl LookupParams {
    /// Trimmed, upper-cased `(state, plate)`, or `None` if either is blank.
    fn normalised(&self) -> Option<(String, String)> {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
        };
        Some((clean(&self.state)?, clean(&self.plate)?))
    }
}

/// GET /
pub async fn index_handler(State(state): State<AppState>) -> Response {
    render(&state, &PageView::form(&state.service.supported_states()))
}

/// POST /check
pub async fn check_form_handler(
    State(state): State<AppState>,
    Form(params): Form<LookupParams>,
) -> Response {
    let Some((code, plate)) = params.normalised() else {
        return Redirect::to("/").into_response();
    };
    let view = PageView::form(&state.service.supported_states());

    if state.service.resolve_state(&code).is_err() {
        return render(&state, &view.with_result(&plate, &code, &unsupported_state(&code)));
    }

    info!(state = %code, plate = %plate, "Form lookup");
    let result = state.service.get_vehicle_info(&code, &plate).await;
    info!(state = %code, plate = %plate, status = %result.status, "Form lookup finished");
    render(&state, &view.with_result(&plate, &code, &result))
}

/// GET /check-rego?state=&plate=
pub async fn check_rego_handler(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (code, raw_plate) = params
        .normalised()
        .ok_or_else(|| ApiError::bad_request("Both state and plate parameters are required"))?;

    let rego_state = state.service.resolve_state(&code).map_err(|_| {
        let codes: Vec<&str> = state
            .service
            .supported_states()
            .iter()
            .map(|s| s.code())
            .collect();
        ApiError::bad_request(format!("State must be one of {}", codes.join(", ")))
    })?;

    let plate = Plate::parse(&raw_plate).map_err(|e| match e {
        RegoError::ValidationError { message } => ApiError::bad_request(message),
        other => ApiError::bad_request(other.to_string()),
    })?;

    match state.service.check(rego_state, &plate).await {
        Ok(info) => Ok(Json(SuccessResponse::new(RegoData::new(
            rego_state.code(),
            plate.as_str(),
            info,
        )))),
        Err(RegoError::DriverStartError { message }) => {
            error!("WebDriver could not start: {}", message);
            Err(ApiError::internal("Failed to initialize the WebDriver."))
        }
        Err(e) => {
            error!("Lookup failed for {} {}: {}", rego_state, plate, e);
            Err(ApiError::internal(e.user_friendly_message()))
        }
    }
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        states: state
            .service
            .supported_states()
            .iter()
            .map(|s| s.code().to_string())
            .collect(),
    })
}

fn render(state: &AppState, view: &PageView) -> Response {
    match state.pages.render(view) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}
