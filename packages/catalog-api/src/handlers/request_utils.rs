//! Request utilities for HTTP endpoints.

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time;

use super::response::success_response;
use crate::router::RouterError;
use catalog_core::CatalogError;

/// Header carrying the authenticated caller's username.
pub const CALLER_HEADER: &str = "x-caller-id";

/// Request bodies the router accepts: hyper's `Incoming` in the server,
/// `Full<Bytes>` in tests.
pub trait RequestBody: Body<Data = Bytes, Error: std::fmt::Display> + Send + 'static {}

impl<B> RequestBody for B where B: Body<Data = Bytes, Error: std::fmt::Display> + Send + 'static {}

/// Path parameters captured by the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    pub file_id: Option<String>,
    pub field_id: Option<String>,
    pub valid_data_id: Option<String>,
}

impl RouteParams {
    pub(crate) fn from_matched(params: &matchit::Params<'_, '_>) -> Self {
        Self {
            file_id: params.get("file_id").map(str::to_string),
            field_id: params.get("field_id").map(str::to_string),
            valid_data_id: params.get("valid_data_id").map(str::to_string),
        }
    }

    pub(crate) fn file_id(&self) -> Result<&str, RouterError> {
        required_param(&self.file_id, "file_id")
    }

    pub(crate) fn field_id(&self) -> Result<&str, RouterError> {
        required_param(&self.field_id, "field_id")
    }

    pub(crate) fn valid_data_id(&self) -> Result<&str, RouterError> {
        required_param(&self.valid_data_id, "valid_data_id")
    }
}

fn required_param<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, RouterError> {
    value
        .as_deref()
        .ok_or_else(|| RouterError::InternalError(format!("Route is missing parameter {}", name)))
}

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout<B>(
    req: Request<B>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError>
where
    B: RequestBody,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.into_body().collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::BadRequest(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Returns the caller identity, rejecting requests without one.
pub fn caller_id<B>(req: &Request<B>) -> Result<String, RouterError> {
    req.headers()
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RouterError::Unauthorized("Authentication required.".to_string()))
}

/// Parses a request body as a JSON object. An empty body is an empty object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, RouterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RouterError::BadRequest(
            "Request body must be a JSON object.".to_string(),
        )),
        Err(e) => Err(RouterError::BadRequest(format!(
            "Failed to parse request: {}",
            e
        ))),
    }
}

/// Reads an optional string attribute. `null` counts as absent.
pub fn text(body: &Map<String, Value>, attribute: &str) -> Result<Option<String>, RouterError> {
    match body.get(attribute) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RouterError::BadRequest(format!(
            "{} must be a string with at least 1 character(s).",
            attribute
        ))),
    }
}

/// Reads an optional integer attribute, accepting numeric strings.
pub fn number(body: &Map<String, Value>, attribute: &str) -> Result<Option<i64>, RouterError> {
    let invalid = || RouterError::BadRequest(format!("{} must be a valid number.", attribute));
    match body.get(attribute) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Reads an optional boolean attribute, accepting `"true"` and `"false"`.
pub fn flag(body: &Map<String, Value>, attribute: &str) -> Result<Option<bool>, RouterError> {
    match body.get(attribute) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(_) => Err(RouterError::BadRequest(format!(
            "{} must be a boolean value.",
            attribute
        ))),
    }
}

/// Map CatalogError to appropriate RouterError
pub fn map_catalog_error(e: CatalogError) -> RouterError {
    match e {
        CatalogError::InvalidInput(msg) => RouterError::BadRequest(msg),
        CatalogError::NotFound { entity, id } => RouterError::RecordNotFound { entity, id },
        CatalogError::Forbidden(msg) => RouterError::Forbidden(msg),
        CatalogError::TransactionFailure { .. } => RouterError::InternalError(e.to_string()),
    }
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Wraps `data` in the success envelope and builds the response.
pub fn json_response<T: Serialize>(status: u16, data: T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(&success_response(data))
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}
