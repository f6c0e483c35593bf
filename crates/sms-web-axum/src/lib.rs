use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use sms_core::{GatewayResponse, HttpStatus};
use sms_web_generic::{GatewayProcessor, ResponseConverter, SmsParams};

#[derive(Clone)]
pub struct AppState {
    pub processor: GatewayProcessor,
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = Response;

    fn from_gateway_response(response: GatewayResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// All middleware routes on one router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/sms", get(send_sms).post(send_sms))
        .route("/test", get(deployment_test))
        .with_state(state)
}

/// GET /
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    AxumResponseConverter::from_gateway_response(state.processor.home())
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    AxumResponseConverter::from_gateway_response(state.processor.health().await)
}

/// GET|POST /sms?to=..&message=..
pub async fn send_sms(
    State(state): State<AppState>,
    params: Result<Query<SmsParams>, QueryRejection>,
) -> impl IntoResponse {
    let response = match params {
        Ok(Query(params)) => state.processor.send_sms(&params).await,
        Err(rejection) => GatewayResponse::error(
            HttpStatus::BAD_REQUEST,
            &format!("malformed query: {}", rejection.body_text()),
        ),
    };
    AxumResponseConverter::from_gateway_response(response)
}

/// GET /test
pub async fn deployment_test(State(state): State<AppState>) -> impl IntoResponse {
    AxumResponseConverter::from_gateway_response(state.processor.deployment_test())
}
