//! Integration tests for the billing HTTP endpoints.
//!
//! These tests drive the full router with in-memory adapters:
//! 1. Webhook deliveries reach the ledger and the gateway schedule
//! 2. Response bodies keep the `{ success, message, payment }` shape
//! 3. Validation and gateway failures map to 400 / 500
//! 4. A slow gateway cannot strand a committed row past the server deadline

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use subscription_ledger::adapters::http::{billing_router, with_request_timeout, BillingAppState};
use subscription_ledger::adapters::{
    FixedClock, FixedRandom, InMemorySubscriptionLedger, MockPaymentGateway,
};
use subscription_ledger::domain::billing::LedgerStatus;
use subscription_ledger::domain::foundation::Timestamp;
use subscription_ledger::ports::{GatewayError, PaymentDetail};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    gateway: MockPaymentGateway,
    ledger: Arc<InMemorySubscriptionLedger>,
}

fn ts(s: &str) -> Timestamp {
    Timestamp::parse_rfc3339(s).unwrap()
}

fn recurring_payment(id: &str) -> PaymentDetail {
    PaymentDetail {
        id: format!("rec_{}", id),
        gateway_payment_id: Some(id.to_string()),
        amount_total: 9900,
        order_name: "Pro plan".to_string(),
        billing_key: Some("bk_123".to_string()),
        customer_id: Some("cust_1".to_string()),
    }
}

fn build_app(wrap: impl FnOnce(Router) -> Router) -> TestApp {
    let gateway = MockPaymentGateway::new();
    let ledger = Arc::new(InMemorySubscriptionLedger::new());

    let state = BillingAppState {
        gateway: Arc::new(gateway.clone()),
        ledger: ledger.clone(),
        clock: Arc::new(FixedClock(ts("2024-01-01T00:00:00Z"))),
        random: Arc::new(FixedRandom::new(15, "sched")),
    };

    TestApp {
        router: wrap(billing_router().with_state(state)),
        gateway,
        ledger,
    }
}

fn test_app() -> TestApp {
    build_app(|router| router)
}

fn test_app_with_deadline(deadline: Duration) -> TestApp {
    build_app(|router| with_request_timeout(router, deadline))
}

async fn post_webhook(app: &TestApp, body: Value) -> (StatusCode, Value) {
    post_raw(app, body.to_string()).await
}

async fn post_raw(app: &TestApp, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payments")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

async fn get(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Paid
// =============================================================================

#[tokio::test]
async fn paid_webhook_records_period_and_schedules_next_charge() {
    let app = test_app();
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));

    let (status, body) = post_webhook(&app, json!({"payment_id": "pay_1", "status": "Paid"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment recorded");
    let payment = &body["payment"];
    assert_eq!(payment["transaction_key"], "pay_1");
    assert_eq!(payment["amount"], 9900);
    assert_eq!(payment["status"], "Paid");
    assert_eq!(payment["start_at"], "2024-01-01T00:00:00Z");
    assert_eq!(payment["end_at"], "2024-01-31T00:00:00Z");
    assert_eq!(payment["end_grace_at"], "2024-02-01T00:00:00Z");
    assert_eq!(payment["next_schedule_at"], "2024-02-01T10:15:00Z");
    assert_eq!(payment["next_schedule_id"], "sched_1");

    let created = app.gateway.created_schedules();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].schedule_payment_id, "sched_1");
    assert_eq!(created[0].billing_key, "bk_123");
    assert_eq!(created[0].currency, "KRW");
    assert_eq!(created[0].time_to_pay, ts("2024-02-01T10:15:00Z"));
}

#[tokio::test]
async fn paid_replay_is_acknowledged_without_a_second_schedule() {
    let app = test_app();
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));
    let delivery = json!({"payment_id": "pay_1", "status": "Paid"});

    post_webhook(&app, delivery.clone()).await;
    let (status, body) = post_webhook(&app, delivery).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment recorded (already processed)");
    assert_eq!(app.ledger.rows().await.len(), 1);
    assert_eq!(app.gateway.call_count("create_schedule"), 1);
}

#[tokio::test]
async fn paid_webhook_survives_schedule_failure() {
    let app = test_app();
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));
    app.gateway
        .set_method_error("create_schedule", GatewayError::from_status(500, "boom"));

    let (status, body) = post_webhook(&app, json!({"payment_id": "pay_1", "status": "Paid"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.ledger.rows().await.len(), 1);
}

// =============================================================================
// Cancelled
// =============================================================================

#[tokio::test]
async fn cancelled_webhook_reverses_period_and_cancels_pending_schedule() {
    let app = test_app();
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));
    post_webhook(&app, json!({"payment_id": "pay_1", "status": "Paid"})).await;

    let (status, body) =
        post_webhook(&app, json!({"payment_id": "pay_1", "status": "Cancelled"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment cancelled");
    let payment = &body["payment"];
    assert_eq!(payment["status"], "Cancel");
    assert_eq!(payment["amount"], -9900);
    assert_eq!(payment["start_at"], "2024-01-01T00:00:00Z");
    assert_eq!(payment["end_grace_at"], "2024-02-01T00:00:00Z");

    assert_eq!(
        app.gateway.cancelled_schedules(),
        vec![vec!["schedule_1".to_string()]]
    );
    assert!(app.gateway.pending_schedules().is_empty());

    let statuses: Vec<LedgerStatus> = app.ledger.rows().await.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![LedgerStatus::Paid, LedgerStatus::Cancel]);
}

#[tokio::test]
async fn cancelled_webhook_without_matching_schedule_cancels_nothing() {
    let app = test_app();
    let mut one_time = recurring_payment("pay_1");
    one_time.billing_key = None;
    app.gateway.add_payment("pay_1", one_time);
    post_webhook(&app, json!({"payment_id": "pay_1", "status": "Paid"})).await;

    let (status, body) =
        post_webhook(&app, json!({"payment_id": "pay_1", "status": "Cancelled"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment"]["status"], "Cancel");
    assert_eq!(app.gateway.call_count("cancel_schedules"), 0);
}

#[tokio::test]
async fn cancelled_webhook_without_paid_row_is_server_error() {
    let app = test_app();
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));

    let (status, body) =
        post_webhook(&app, json!({"payment_id": "pay_1", "status": "Cancelled"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(app.ledger.rows().await.is_empty());
}

// =============================================================================
// Other deliveries
// =============================================================================

#[tokio::test]
async fn unknown_status_is_acknowledged_without_side_effects() {
    let app = test_app();

    let (status, body) = post_webhook(&app, json!({"payment_id": "pay_1", "status": "Ready"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert!(app.gateway.calls().is_empty());
    assert!(app.ledger.rows().await.is_empty());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = test_app();

    let (status, body) = post_raw(&app, "not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, _) = post_webhook(&app, json!({"status": "Paid"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.gateway.calls().is_empty());
}

#[tokio::test]
async fn gateway_lookup_failure_is_server_error() {
    let app = test_app();

    let (status, body) = post_webhook(&app, json!({"payment_id": "missing", "status": "Paid"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(app.ledger.rows().await.is_empty());
}

#[tokio::test]
async fn redelivery_after_gateway_outage_records_once() {
    let app = test_app();
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));
    app.gateway
        .set_method_error("get_payment", GatewayError::from_status(503, "unavailable"));
    let delivery = json!({"payment_id": "pay_1", "status": "Paid"});

    let (status, _) = post_webhook(&app, delivery.clone()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    app.gateway.clear_errors();
    let (status, body) = post_webhook(&app, delivery).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment recorded");
    assert_eq!(app.ledger.rows().await.len(), 1);
    assert_eq!(app.gateway.call_count("create_schedule"), 1);
}

// =============================================================================
// Server deadline
// =============================================================================

#[tokio::test]
async fn slow_gateway_cannot_strand_a_cancelled_schedule() {
    let app = test_app_with_deadline(Duration::from_millis(200));
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));
    let (status, _) = post_webhook(&app, json!({"payment_id": "pay_1", "status": "Paid"})).await;
    assert_eq!(status, StatusCode::OK);

    app.gateway
        .set_method_delay("query_payment_schedules", Duration::from_millis(400));
    let cancelled = json!({"payment_id": "pay_1", "status": "Cancelled"});
    let (status, body) = post_webhook(&app, cancelled.clone()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Request timed out"}));

    // The reversal and the schedule cancel finish after the response.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(app.ledger.rows().await.len(), 2);
    assert_eq!(app.gateway.call_count("cancel_schedules"), 1);
    assert!(app.gateway.pending_schedules().is_empty());

    app.gateway
        .set_method_delay("query_payment_schedules", Duration::ZERO);
    let (status, body) = post_webhook(&app, cancelled).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment cancelled (already processed)");
    assert_eq!(app.gateway.call_count("cancel_schedules"), 1);
}

#[tokio::test]
async fn paid_redelivery_restores_schedule_lost_to_timeout() {
    let app = test_app_with_deadline(Duration::from_millis(200));
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));
    app.gateway
        .set_method_error("create_schedule", GatewayError::timeout("elapsed"));
    let delivery = json!({"payment_id": "pay_1", "status": "Paid"});

    let (status, _) = post_webhook(&app, delivery.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.gateway.pending_schedules().is_empty());

    app.gateway.clear_errors();
    let (status, body) = post_webhook(&app, delivery).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment recorded (already processed)");
    let pending = app.gateway.pending_schedules();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].record.payment_id, "sched_1");
    assert_eq!(app.ledger.rows().await.len(), 1);
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn subscription_status_reflects_ledger() {
    let app = test_app();
    app.gateway.add_payment("pay_1", recurring_payment("pay_1"));

    let (status, body) = get(&app, "/api/subscriptions/pay_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);
    assert!(body["period"].is_null());

    post_webhook(&app, json!({"payment_id": "pay_1", "status": "Paid"})).await;
    let (_, body) = get(&app, "/api/subscriptions/pay_1").await;
    assert_eq!(body["transaction_key"], "pay_1");
    assert_eq!(body["active"], true);
    assert_eq!(body["period"]["status"], "Paid");

    post_webhook(&app, json!({"payment_id": "pay_1", "status": "Cancelled"})).await;
    let (_, body) = get(&app, "/api/subscriptions/pay_1").await;
    assert_eq!(body["active"], false);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();

    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
