//! Magic link endpoints
//!
//! Each handler builds an [`AuthRequest`] from the incoming request, runs the
//! strategy and maps the resulting [`AuthOutcome`] onto an HTTP response:
//!
//! | outcome   | status                    | body                    |
//! |-----------|---------------------------|-------------------------|
//! | `Success` | 200                       | `{"user": …}`           |
//! | `Fail`    | suggested status or 401   | `{"error": message}`    |
//! | `Pass`    | 202                       | `{"message": message}`  |
//! | `Error`   | 500                       | generic error, cause logged |

use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use log::{debug, error};
use serde_json::json;

use super::payload::{auth_request, query_param};
use crate::strategy::{Action, AuthOptions, AuthOutcome, AuthRequest, MagicLinkStrategy};

/// Start the flow: look the user up and deliver a magic link
pub async fn request_token(
    req: HttpRequest,
    body: web::Bytes,
    strategy: web::Data<MagicLinkStrategy>,
) -> HttpResponse {
    run(&req, &body, |request| async move {
        strategy
            .authenticate(&request, &AuthOptions::request_token())
            .await
    })
    .await
}

/// Magic link target: redeem the token carried by the link
pub async fn accept_token(
    req: HttpRequest,
    body: web::Bytes,
    strategy: web::Data<MagicLinkStrategy>,
) -> HttpResponse {
    run(&req, &body, |request| async move {
        strategy
            .authenticate(&request, &AuthOptions::accept_token())
            .await
    })
    .await
}

/// Single endpoint dispatching on the `action` query parameter
pub async fn authenticate(
    req: HttpRequest,
    body: web::Bytes,
    strategy: web::Data<MagicLinkStrategy>,
) -> HttpResponse {
    let action = query_param(&req, "action");
    debug!(
        "Dispatching magic link request with action {}",
        action.as_deref().unwrap_or(Action::default().as_str())
    );

    run(&req, &body, |request| async move {
        strategy
            .authenticate_with_action(&request, action.as_deref(), None)
            .await
    })
    .await
}

async fn run<F, Fut>(req: &HttpRequest, body: &[u8], handle: F) -> HttpResponse
where
    F: FnOnce(AuthRequest) -> Fut,
    Fut: std::future::Future<Output = AuthOutcome>,
{
    match auth_request(req, body) {
        Ok(request) => outcome_response(handle(request).await),
        Err(message) => {
            debug!("Rejecting unreadable request body: {message}");
            HttpResponse::BadRequest().json(json!({ "error": message }))
        }
    }
}

/// Map an outcome onto the response the client sees
#[must_use]
pub fn outcome_response(outcome: AuthOutcome) -> HttpResponse {
    match outcome {
        AuthOutcome::Success(user) => HttpResponse::Ok().json(json!({ "user": user })),
        AuthOutcome::Fail { message, status } => {
            let status = status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::UNAUTHORIZED);
            HttpResponse::build(status).json(json!({ "error": message }))
        }
        AuthOutcome::Pass { message } => {
            HttpResponse::Accepted().json(json!({ "message": message }))
        }
        AuthOutcome::Error(cause) => {
            error!("Magic link authentication error: {cause}");
            HttpResponse::InternalServerError()
                .json(json!({ "error": "authentication could not be completed" }))
        }
    }
}
