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

/// One test covers the whole gate so the ADMIN_PASSWORD env var is only
/// touched from a single place.
#[test]
fn admin_routes_check_the_password_header() {
    std::env::set_var("ADMIN_PASSWORD", "letmein");
    let store = test_store(vec![sample_item("row1", "Old lamp")]);

    // No header at all.
    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/items/row1")
        .body(Body::empty())
        .unwrap();
    let err = handle(req, &store).unwrap_err();
    assert!(matches!(err, ServerError::Unauthorized(_)));

    // Wrong password.
    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/items/row1")
        .header("X-Admin-Password", "guess")
        .body(Body::empty())
        .unwrap();
    let err = handle(req, &store).unwrap_err();
    assert!(matches!(err, ServerError::Unauthorized(_)));
    assert_eq!(store.list().unwrap().len(), 1);

    // Correct password creates an item.
    let draft = json!({
        "title": "Bookshelf",
        "price": 10.0,
        "condition": "Good as new"
    });
    let req = Request::builder()
        .method(Method::POST)
        .uri("/items")
        .header("X-Admin-Password", "letmein")
        .body(Body::from(serde_json::to_vec(&draft).unwrap()))
        .unwrap();
    let resp = handle(req, &store).expect("Handler failed");
    assert_eq!(resp.status(), 201);
    let outcome = body_json(resp);
    assert_eq!(outcome["item"]["title"], "Bookshelf");
    assert_eq!(outcome["synced"], false);

    // Correct password marks an item taken for someone.
    let payload = json!({ "status": "TAKEN", "markedFor": "Maya" });
    let req = Request::builder()
        .method(Method::POST)
        .uri("/items/row1/status")
        .header("X-Admin-Password", "letmein")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let resp = handle(req, &store).expect("Handler failed");
    assert_eq!(resp.status(), 200);
    let outcome = body_json(resp);
    assert_eq!(outcome["item"]["status"], "TAKEN");
    assert_eq!(
        outcome["item"]["interestedParties"][0]["name"],
        "Maya (Marked by Admin)"
    );
}
