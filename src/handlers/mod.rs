// HTTP request handlers for the magic link flow
pub mod magic_link;
pub mod payload;

use actix_web::{HttpResponse, Result};
use serde::Serialize;

pub use magic_link::{accept_token, authenticate, outcome_response, request_token};

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    message: String,
}

/// Health check
///
/// # Errors
///
/// Never fails; the `Result` matches actix handler conventions.
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Magic link authentication is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}
