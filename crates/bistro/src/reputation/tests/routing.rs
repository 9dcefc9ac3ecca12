use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::reputation::domain::{AccountRecord, AccountRole};
use crate::reputation::memory::{InMemoryCatalog, InMemoryStore};
use crate::reputation::repository::AccountRepository;
use crate::reputation::router::{self, reputation_router};
use crate::reputation::{EnginePolicy, ReputationEngine};

struct Api {
    router: Router,
    engine: Arc<ReputationEngine<InMemoryStore, InMemoryCatalog>>,
    store: Arc<InMemoryStore>,
}

fn api() -> Api {
    let store = Arc::new(InMemoryStore::default());
    let engine = Arc::new(ReputationEngine::new(
        store.clone(),
        Arc::new(menu()),
        EnginePolicy::default(),
    ));
    Api {
        router: reputation_router(engine.clone()),
        engine,
        store,
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&payload).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

async fn open(api: &Api, id: &str) {
    let response = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts",
        Some(json!({ "account_id": id, "role": "customer" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn open_account_route_returns_created_status_view() {
    let api = api();
    let response = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts",
        Some(json!({ "account_id": "cust-1", "role": "customer" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["account_id"], json!("cust-1"));
    assert_eq!(payload["tier"], json!("registered"));
    assert_eq!(payload["warnings"], json!(0));
    assert_eq!(payload["blacklisted"], json!(false));

    let duplicate = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts",
        Some(json!({ "account_id": "cust-1", "role": "driver" })),
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_account() {
    let api = api();
    let response = send(&api.router, Method::GET, "/api/v1/accounts/ghost/status", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("ghost"));
}

#[tokio::test]
async fn deposit_route_validates_amount() {
    let api = api();
    open(&api, "cust-1").await;

    let accepted = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/deposits",
        Some(json!({ "amount": "25.50" })),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let payload = read_json_body(accepted).await;
    assert_eq!(json_money(&payload["balance"]), money("25.50"));

    let rejected = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/deposits",
        Some(json!({ "amount": "0" })),
    )
    .await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cart_routes_quote_and_decline_underfunded_checkout() {
    let api = api();
    open(&api, "cust-1").await;

    let added = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/cart/items",
        Some(json!({ "dish_id": RAMEN })),
    )
    .await;
    assert_eq!(added.status(), StatusCode::CREATED);

    let quote = send(&api.router, Method::GET, "/api/v1/accounts/cust-1/cart", None).await;
    assert_eq!(quote.status(), StatusCode::OK);
    let payload = read_json_body(quote).await;
    assert!(payload.get("order_id").is_some());
    assert_eq!(json_money(&payload["subtotal"]), money("20.00"));
    assert_eq!(json_money(&payload["total"]), money("25.00"));
    assert!(payload.get("removed").is_none());

    let declined = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/checkout",
        None,
    )
    .await;
    assert_eq!(declined.status(), StatusCode::PAYMENT_REQUIRED);
    let payload = read_json_body(declined).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("insufficient balance"));

    let status = api
        .engine
        .account_status(&account_id("cust-1"))
        .expect("status loads");
    assert_eq!(status.warnings, 1);
}

#[tokio::test]
async fn cart_item_routes_update_and_remove_lines() {
    let api = api();
    open(&api, "cust-1").await;
    send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/cart/items",
        Some(json!({ "dish_id": SALAD })),
    )
    .await;

    let uri = format!("/api/v1/accounts/cust-1/cart/items/{SALAD}");
    let updated = send(&api.router, Method::PUT, &uri, Some(json!({ "quantity": 3 }))).await;
    assert_eq!(updated.status(), StatusCode::OK);
    let payload = read_json_body(updated).await;
    assert_eq!(payload["lines"][0]["quantity"], json!(3));

    let zero = send(&api.router, Method::PUT, &uri, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(zero.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let removed = send(&api.router, Method::DELETE, &uri, None).await;
    assert_eq!(removed.status(), StatusCode::OK);
    let missing = send(&api.router, Method::DELETE, &uri, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checkout_route_forbids_blacklisted_accounts() {
    let api = api();
    let mut record = AccountRecord::registered(account_id("cust-banned"), AccountRole::Customer);
    record.blacklisted = true;
    api.store.insert_account(record).expect("seeded");

    let response = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-banned/checkout",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn feedback_routes_file_list_and_resolve() {
    let api = api();
    open(&api, "cust-1").await;
    open(&api, "cust-2").await;

    let filed = send(
        &api.router,
        Method::POST,
        "/api/v1/feedback",
        Some(json!({
            "filer_id": "cust-1",
            "target_kind": "customer",
            "target_id": "cust-2",
            "message": "Left a mess at pickup",
            "is_compliment": false
        })),
    )
    .await;
    assert_eq!(filed.status(), StatusCode::CREATED);
    let payload = read_json_body(filed).await;
    let feedback_id = payload["id"].as_str().expect("id present").to_string();
    assert_eq!(payload["status"], json!("pending"));
    assert_eq!(payload["weight"], json!(1));

    let pending = send(&api.router, Method::GET, "/api/v1/feedback/pending?limit=5", None).await;
    assert_eq!(pending.status(), StatusCode::OK);
    let queue = read_json_body(pending).await;
    assert_eq!(queue.as_array().map(Vec::len), Some(1));

    let resolution_uri = format!("/api/v1/feedback/{feedback_id}/resolution");
    let accepted = send(
        &api.router,
        Method::POST,
        &resolution_uri,
        Some(json!({ "decision": "accept" })),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(read_json_body(accepted).await["status"], json!("accepted"));

    let repeated = send(
        &api.router,
        Method::POST,
        &resolution_uri,
        Some(json!({ "decision": "dismiss" })),
    )
    .await;
    assert_eq!(repeated.status(), StatusCode::CONFLICT);

    let fetched = send(
        &api.router,
        Method::GET,
        &format!("/api/v1/feedback/{feedback_id}"),
        None,
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);

    let status = send(&api.router, Method::GET, "/api/v1/accounts/cust-2/status", None).await;
    assert_eq!(read_json_body(status).await["warnings"], json!(1));
}

#[tokio::test]
async fn dispute_route_rejects_non_targets() {
    let api = api();
    open(&api, "cust-1").await;
    open(&api, "cust-2").await;
    let item = api
        .engine
        .file_feedback(feedback(&account_id("cust-1"), &account_id("cust-2"), false))
        .expect("filed");

    let uri = format!("/api/v1/feedback/{}/dispute", item.id);
    let by_filer = send(
        &api.router,
        Method::POST,
        &uri,
        Some(json!({ "disputed_by": "cust-1", "reason": "n/a" })),
    )
    .await;
    assert_eq!(by_filer.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let by_target = send(
        &api.router,
        Method::POST,
        &uri,
        Some(json!({ "disputed_by": "cust-2", "reason": "Never met them" })),
    )
    .await;
    assert_eq!(by_target.status(), StatusCode::OK);
    let payload = read_json_body(by_target).await;
    assert_eq!(payload["dispute"]["reason"], json!("Never met them"));
}

#[tokio::test]
async fn status_handler_returns_internal_error_on_repository_failure() {
    let engine = Arc::new(ReputationEngine::new(
        Arc::new(UnavailableStore),
        Arc::new(EmptyMenu),
        EnginePolicy::default(),
    ));

    let response = router::status_handler::<UnavailableStore, EmptyMenu>(
        State(engine),
        Path("cust-1".to_string()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("database offline"));
}

#[tokio::test]
async fn add_item_route_returns_not_found_for_unlisted_dish() {
    let store = Arc::new(InMemoryStore::default());
    store
        .insert_account(AccountRecord::registered(
            account_id("cust-1"),
            AccountRole::Customer,
        ))
        .expect("seeded");
    let engine = Arc::new(ReputationEngine::new(
        store,
        Arc::new(EmptyMenu),
        EnginePolicy::default(),
    ));
    let router = reputation_router(engine);

    let response = send(
        &router,
        Method::POST,
        "/api/v1/accounts/cust-1/cart/items",
        Some(json!({ "dish_id": RAMEN })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn warning_and_closure_routes_report_history_and_refund() {
    let api = api();
    open(&api, "cust-1").await;
    send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/deposits",
        Some(json!({ "amount": "20" })),
    )
    .await;
    send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/cart/items",
        Some(json!({ "dish_id": RAMEN })),
    )
    .await;
    let declined = send(
        &api.router,
        Method::POST,
        "/api/v1/accounts/cust-1/checkout",
        None,
    )
    .await;
    assert_eq!(declined.status(), StatusCode::PAYMENT_REQUIRED);

    let warnings = send(&api.router, Method::GET, "/api/v1/accounts/cust-1/warnings", None).await;
    assert_eq!(warnings.status(), StatusCode::OK);
    let history = read_json_body(warnings).await;
    assert_eq!(history.as_array().map(Vec::len), Some(1));
    assert_eq!(history[0]["reason"], json!("insufficient_balance"));
    assert_eq!(history[0]["role"], json!("customer"));

    let closure_uri = "/api/v1/accounts/cust-1/closure";
    let closed = send(
        &api.router,
        Method::POST,
        closure_uri,
        Some(json!({ "reason": "quit" })),
    )
    .await;
    assert_eq!(closed.status(), StatusCode::OK);
    let receipt = read_json_body(closed).await;
    assert_eq!(receipt["closure"], json!("quit"));
    assert_eq!(json_money(&receipt["refunded"]), money("20"));
    assert_eq!(receipt["account"]["closed"], json!(true));

    let again = send(
        &api.router,
        Method::POST,
        closure_uri,
        Some(json!({ "reason": "kicked" })),
    )
    .await;
    assert_eq!(again.status(), StatusCode::FORBIDDEN);

    let missing = send(&api.router, Method::GET, "/api/v1/accounts/ghost/warnings", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feedback_route_rejects_self_and_mislabelled_targets() {
    let api = api();
    open(&api, "cust-1").await;
    open(&api, "cust-2").await;

    let about_self = send(
        &api.router,
        Method::POST,
        "/api/v1/feedback",
        Some(json!({
            "filer_id": "cust-1",
            "target_kind": "customer",
            "target_id": "cust-1",
            "message": "Best customer ever",
            "is_compliment": true
        })),
    )
    .await;
    assert_eq!(about_self.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let mislabelled = send(
        &api.router,
        Method::POST,
        "/api/v1/feedback",
        Some(json!({
            "filer_id": "cust-1",
            "target_kind": "chef",
            "target_id": "cust-2",
            "message": "Cold noodles",
            "is_compliment": false
        })),
    )
    .await;
    assert_eq!(mislabelled.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(mislabelled).await;
    assert_eq!(
        payload["error"],
        json!("target account is a customer, not a chef")
    );
}

#[tokio::test]
async fn resolution_route_stores_the_manager_note() {
    let api = api();
    open(&api, "cust-1").await;
    open(&api, "cust-2").await;
    let item = api
        .engine
        .file_feedback(feedback(&account_id("cust-1"), &account_id("cust-2"), false))
        .expect("filed");

    let resolved = send(
        &api.router,
        Method::POST,
        &format!("/api/v1/feedback/{}/resolution", item.id),
        Some(json!({ "decision": "dismiss", "note": "No order on record" })),
    )
    .await;
    assert_eq!(resolved.status(), StatusCode::OK);
    let payload = read_json_body(resolved).await;
    assert_eq!(payload["decision_note"], json!("No order on record"));

    let history = api
        .engine
        .warning_history(&account_id("cust-1"))
        .expect("history loads");
    assert_eq!(history[0].note.as_deref(), Some("No order on record"));
}
