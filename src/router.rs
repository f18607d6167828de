use std::io::Read;

use astra::{Body, Request};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::auth::require_admin;
use crate::domain::{InterestKind, ItemDraft, ItemStatus};
use crate::errors::ServerError;
use crate::responses::{json_response, ResultResp};
use crate::store::ItemStore;

#[derive(Deserialize)]
struct StatusPayload {
    status: ItemStatus,
    #[serde(default, rename = "markedFor")]
    marked_for: Option<String>,
}

#[derive(Deserialize)]
struct InterestPayload {
    name: String,
    #[serde(default, rename = "type")]
    kind: InterestKind,
    #[serde(default)]
    question: Option<String>,
}

#[derive(Deserialize)]
struct RemoveTakerPayload {
    index: usize,
}

/// Read and parse the JSON request body.
fn read_json<T: DeserializeOwned>(mut body: Body) -> Result<T, ServerError> {
    let mut buf = Vec::new();
    body.reader()
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("Failed to read body: {e}")))?;
    serde_json::from_slice(&buf).map_err(|e| ServerError::BadRequest(format!("Invalid JSON: {e}")))
}

pub fn handle(req: Request, store: &ItemStore) -> ResultResp {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => json_response(200, &json!({ "status": "ok" })),

        ("GET", ["items"]) => json_response(200, &store.list()?),

        ("POST", ["items"]) => {
            require_admin(&req)?;
            let draft: ItemDraft = read_json(req.into_body())?;
            json_response(201, &store.create(draft)?)
        }

        ("PUT", ["items", id]) => {
            require_admin(&req)?;
            let id = id.to_string();
            let draft: ItemDraft = read_json(req.into_body())?;
            json_response(200, &store.edit(&id, draft)?)
        }

        ("DELETE", ["items", id]) => {
            require_admin(&req)?;
            json_response(200, &store.delete(id)?)
        }

        ("POST", ["items", id, "status"]) => {
            require_admin(&req)?;
            let id = id.to_string();
            let payload: StatusPayload = read_json(req.into_body())?;
            json_response(200, &store.update_status(&id, payload.status, payload.marked_for)?)
        }

        ("POST", ["items", id, "interest"]) => {
            let id = id.to_string();
            let payload: InterestPayload = read_json(req.into_body())?;
            json_response(
                200,
                &store.express_interest(&id, payload.name, payload.kind, payload.question)?,
            )
        }

        ("POST", ["items", id, "takers", "remove"]) => {
            require_admin(&req)?;
            let id = id.to_string();
            let payload: RemoveTakerPayload = read_json(req.into_body())?;
            json_response(200, &store.remove_taker(&id, payload.index)?)
        }

        _ => Err(ServerError::NotFound),
    }
}
