// Turns actix request parts into the strategy's body/query mappings
use actix_web::{http::header, HttpRequest};
use serde_json::{Map, Value};

use crate::strategy::AuthRequest;

/// Build an [`AuthRequest`] from the query string and raw body
///
/// JSON and urlencoded form bodies are understood; an empty body becomes an
/// empty mapping.
///
/// # Errors
///
/// Returns a message if a JSON body cannot be parsed.
pub fn auth_request(req: &HttpRequest, body: &[u8]) -> Result<AuthRequest, String> {
    let query = form_to_value(req.query_string().as_bytes());
    let body = body_to_value(content_type(req).as_deref(), body)?;
    Ok(AuthRequest::new(body, query))
}

/// Single query parameter, if present and non-empty
#[must_use]
pub fn query_param(req: &HttpRequest, name: &str) -> Option<String> {
    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn content_type(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
}

fn body_to_value(content_type: Option<&str>, body: &[u8]) -> Result<Value, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    match content_type {
        Some("application/x-www-form-urlencoded") => Ok(form_to_value(body)),
        Some(ct) if ct == "application/json" || ct.ends_with("+json") => {
            serde_json::from_slice(body).map_err(|e| format!("invalid JSON body: {e}"))
        }
        // Unknown or missing content type: accept JSON, ignore anything else
        _ => Ok(serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new()))),
    }
}

fn form_to_value(input: &[u8]) -> Value {
    let map: Map<String, Value> = url::form_urlencoded::parse(input)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();
    Value::Object(map)
}
