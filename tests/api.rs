//! HTTP-level tests: the full router over an in-memory store.
//!
//! Run with: cargo test --test api

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use coin_dbutil::auth::Credentials;
use coin_dbutil::store::{MemoryStore, Operation};
use coin_dbutil::{router, AppState};

// ============================================================================
// Test Helpers
// ============================================================================

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let credentials = Credentials::new(1024, 1).expect("hash params");
    let state = AppState::new(store.clone(), credentials);
    (store, router(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str, password: &str, balance: f64) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/user/register",
        Some(json!({
            "username": "jdoe",
            "email": email,
            "hash": password,
            "firstName": "Jane",
            "lastName": "Doe",
            "accountStatus": "Active",
            "balance": balance,
        })),
    )
    .await
}

async fn get_user(app: &Router, email: &str) -> Value {
    let (status, user) = send(app, Method::GET, &format!("/user/{}", email), None).await;
    assert_eq!(status, StatusCode::OK);
    user
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn register_then_fetch() {
    let (_, app) = app();

    let (status, body) = register(&app, "jane@x.io", "secret", 100.0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["insertedId"].as_str().unwrap().len(), 24);

    let user = get_user(&app, "jane@x.io").await;
    assert_eq!(user["email"], "jane@x.io");
    assert_eq!(user["firstName"], "Jane");
    assert_eq!(user["emailConfirmed"], false);
    assert_eq!(user["balance"], 100.0);
    assert_eq!(user["shares"], json!([]));
    assert!(user.get("hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 100.0).await;

    let (status, body) = register(&app, "jane@x.io", "other", 5.0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Email already in use.");
    assert_eq!(get_user(&app, "jane@x.io").await["balance"], 100.0);
}

#[tokio::test]
async fn malformed_registration_is_bad_request() {
    let (_, app) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/user/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let (_, app) = app();
    let (status, _) = send(&app, Method::GET, "/user/ghost@x.io", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn authenticate_right_and_wrong_password() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 0.0).await;

    let (status, body) = send(&app, Method::GET, "/user/authenticate/jane@x.io/secret", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "User has been authenticated successfully.");

    let (wrong, wrong_body) =
        send(&app, Method::GET, "/user/authenticate/jane@x.io/nope", None).await;
    let (absent, absent_body) =
        send(&app, Method::GET, "/user/authenticate/ghost@x.io/secret", None).await;
    assert_eq!(wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(absent, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, absent_body);
}

#[tokio::test]
async fn delete_requires_the_password() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 0.0).await;

    let (status, _) = send(&app, Method::DELETE, "/user/delete/jane@x.io/nope", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::DELETE, "/user/delete/jane@x.io/secret", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);

    let (status, _) = send(&app, Method::DELETE, "/user/delete/jane@x.io/secret", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/user/jane@x.io", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_update() {
    let (store, app) = app();
    register(&app, "jane@x.io", "secret", 0.0).await;

    let (status, body) = send(&app, Method::PUT, "/user/update/jane@x.io/Suspended", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matchedCount"], 1);
    assert_eq!(get_user(&app, "jane@x.io").await["accountStatus"], "Suspended");

    let (status, _) = send(&app, Method::PUT, "/user/update/ghost@x.io/Active", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    store.fail_next(Operation::SetStatus).await;
    let (status, _) = send(&app, Method::PUT, "/user/update/jane@x.io/Active", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn email_confirmation_is_a_no_op() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 0.0).await;

    let (status, body) =
        send(&app, Method::PUT, "/user/update/emailconfirmation/jane@x.io", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    assert_eq!(get_user(&app, "jane@x.io").await["emailConfirmed"], false);
}

// ============================================================================
// Balance and shares
// ============================================================================

#[tokio::test]
async fn add_to_balance() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 10.0).await;

    let (status, body) =
        send(&app, Method::PUT, "/user/update/addbalance/jane@x.io/15.5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Amount has been added to the balance successfully.");
    assert_eq!(get_user(&app, "jane@x.io").await["balance"], 25.5);

    for bad in ["lots", "-5", "NaN"] {
        let uri = format!("/user/update/addbalance/jane@x.io/{}", bad);
        let (status, _) = send(&app, Method::PUT, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount {}", bad);
    }
    assert_eq!(get_user(&app, "jane@x.io").await["balance"], 25.5);
}

#[tokio::test]
async fn balance_overflow_is_bad_request() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 1e308).await;

    let (status, _) =
        send(&app, Method::PUT, "/user/update/addbalance/jane@x.io/1e308", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(get_user(&app, "jane@x.io").await["balance"], 1e308);
}

#[tokio::test]
async fn writes_on_absent_account_are_bad_request() {
    let (_, app) = app();

    let (status, _) =
        send(&app, Method::PUT, "/user/update/addbalance/ghost@x.io/5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/user/share/ghost@x.io/buy",
        Some(json!({"symbol": "X", "quantity": 1, "priceBaught": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/user/share/ghost@x.io/sell",
        Some(json!({"shareID": "nope", "priceSold": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn buy_and_sell_a_lot() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 100.0).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/user/share/jane@x.io/buy",
        Some(json!({"symbol": "X", "company": "X Corp", "quantity": 10, "priceBought": 5.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modifiedCount"], 1);

    let user = get_user(&app, "jane@x.io").await;
    assert_eq!(user["balance"], 50.0);
    let lot = &user["shares"][0];
    assert_eq!(lot["soldIndicator"], "N");
    assert_eq!(lot["ownedOrSold"], "Owned");
    assert_eq!(lot["priceBaught"], 5.0);
    let share_id = lot["shareID"].as_str().unwrap().to_string();

    let sale = json!({"shareID": share_id, "priceSold": 8.0});
    let (status, _) =
        send(&app, Method::PUT, "/user/share/jane@x.io/sell", Some(sale.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let user = get_user(&app, "jane@x.io").await;
    assert_eq!(user["balance"], 130.0);
    assert_eq!(user["shares"][0]["soldIndicator"], "Y");
    assert_eq!(user["shares"][0]["ownedOrSold"], "Sold");
    assert_eq!(user["shares"][0]["priceSold"], 8.0);

    let (status, _) = send(&app, Method::PUT, "/user/share/jane@x.io/sell", Some(sale)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(get_user(&app, "jane@x.io").await["balance"], 130.0);
}

#[tokio::test]
async fn buy_beyond_balance_is_refused() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 10.0).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/user/share/jane@x.io/buy",
        Some(json!({"symbol": "X", "quantity": 5, "priceBought": 5.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Insufficient balance to purchase the shares.");

    let user = get_user(&app, "jane@x.io").await;
    assert_eq!(user["balance"], 10.0);
    assert_eq!(user["shares"], json!([]));
}

#[tokio::test]
async fn sell_of_unknown_lot_is_bad_request() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 10.0).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/user/share/jane@x.io/sell",
        Some(json!({"shareID": "nope", "priceSold": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_transaction_type_is_bad_request() {
    let (_, app) = app();
    register(&app, "jane@x.io", "secret", 100.0).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/user/share/jane@x.io/hold",
        Some(json!({"symbol": "X", "quantity": 1, "priceBought": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(get_user(&app, "jane@x.io").await["balance"], 100.0);
}

#[tokio::test]
async fn failed_share_write_restores_balance() {
    let (store, app) = app();
    register(&app, "jane@x.io", "secret", 100.0).await;
    store.fail_next(Operation::SetShares).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/user/share/jane@x.io/buy",
        Some(json!({"symbol": "X", "quantity": 10, "priceBought": 5.0})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let user = get_user(&app, "jane@x.io").await;
    assert_eq!(user["balance"], 100.0);
    assert_eq!(user["shares"], json!([]));
}
