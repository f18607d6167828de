use astra::{Body, Response, ResponseBuilder};
use serde::Serialize;
use serde_json::json;

use crate::errors::ServerError;

pub type ResultResp = Result<Response, ServerError>;

/// Serialize a value into a JSON response with the given status.
pub fn json_response<T: Serialize>(status: u16, value: &T) -> ResultResp {
    let body = serde_json::to_vec(value).map_err(|_| ServerError::InternalError)?;

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}

/// Convert a ServerError into a JSON error response.
pub fn error_to_response(err: ServerError) -> Response {
    let (status, message) = match err {
        ServerError::NotFound => (404, "Not Found".to_string()),
        ServerError::BadRequest(msg) => (400, msg),
        ServerError::Unauthorized(msg) => (401, msg),
        ServerError::DbError(msg) => (500, msg),
        ServerError::InternalError => (500, "Internal Server Error".to_string()),
    };

    let body = serde_json::to_vec(&json!({ "error": message }))
        .unwrap_or_else(|_| b"{\"error\":\"Internal Server Error\"}".to_vec());

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}
