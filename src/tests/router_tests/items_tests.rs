use std::io::Read;

use astra::Body;
use http::{Method, Request};
use serde_json::{json, Value};

use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{sample_item, test_store};

fn body_json(resp: astra::Response) -> Value {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    serde_json::from_str(&body).expect("response was not JSON")
}

#[test]
fn health_returns_ok() {
    let store = test_store(vec![]);

    let req = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let resp = handle(req, &store).expect("Handler failed");
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["status"], "ok");
}

#[test]
fn items_returns_json_array() {
    let store = test_store(vec![sample_item("row1", "Old lamp")]);

    let req = Request::builder()
        .method(Method::GET)
        .uri("/items")
        .body(Body::empty())
        .unwrap();

    let resp = handle(req, &store).expect("Handler failed");
    assert_eq!(resp.status(), 200);

    let items = body_json(resp);
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["title"], "Old lamp");
    assert_eq!(items[0]["status"], "AVAILABLE");
    assert!(items[0]["interestedParties"].as_array().unwrap().is_empty());
}

#[test]
fn interest_route_reserves_without_auth() {
    let store = test_store(vec![sample_item("row1", "Old lamp")]);

    let payload = json!({ "name": "Sarah", "question": "Still available?" });
    let req = Request::builder()
        .method(Method::POST)
        .uri("/items/row1/interest")
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let resp = handle(req, &store).expect("Handler failed");
    assert_eq!(resp.status(), 200);

    let outcome = body_json(resp);
    assert_eq!(outcome["synced"], false);
    assert_eq!(outcome["item"]["status"], "RESERVED");
    assert_eq!(outcome["item"]["interestedParties"][0]["name"], "Sarah");
    // No type sent, claims default to TAKE.
    assert_eq!(outcome["item"]["interestedParties"][0]["type"], "TAKE");
}

#[test]
fn interest_without_name_is_bad_request() {
    let store = test_store(vec![sample_item("row1", "Old lamp")]);

    let payload = json!({ "name": "" });
    let req = Request::builder()
        .method(Method::POST)
        .uri("/items/row1/interest")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let err = handle(req, &store).unwrap_err();
    assert!(matches!(err, ServerError::BadRequest(_)));
}

#[test]
fn unknown_route_is_not_found() {
    let store = test_store(vec![]);

    let req = Request::builder()
        .method(Method::GET)
        .uri("/nope")
        .body(Body::empty())
        .unwrap();

    let err = handle(req, &store).unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
}
