//! API Integration Tests
//!
//! These tests require a running PostgreSQL instance and `DATABASE_URL`.
//! Telegram is replaced by a recording messenger.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_json, assert_status, check_test_env, fixtures::*, TestServer,
};
use reqwest::StatusCode;

async fn register(server: &TestServer, body: &RegistrationBody) -> OrderResponse {
    let response = server.post("/api/v1/registrations", body).await.unwrap();
    assert_json(response, StatusCode::CREATED).await.unwrap()
}

async fn settle(server: &TestServer, callback: &CallbackBody) -> SettlementResponse {
    let response = server.post("/api/v1/payments/callback", callback).await.unwrap();
    assert_json(response, StatusCode::OK).await.unwrap()
}

async fn statuses(server: &TestServer, handle: &str) -> Vec<StatusItem> {
    let response = server
        .get(&format!("/api/v1/members/{handle}/subscriptions"))
        .await
        .unwrap();
    let envelope: DataEnvelope<Vec<StatusItem>> = assert_json(response, StatusCode::OK).await.unwrap();
    envelope.data
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[tokio::test]
async fn test_list_communities() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/api/v1/communities").await.unwrap();
    let envelope: DataEnvelope<Vec<CommunityItem>> =
        assert_json(response, StatusCode::OK).await.unwrap();

    let names: Vec<&str> = envelope.data.iter().map(|c| c.community.as_str()).collect();
    assert_eq!(names, vec!["nikotin", "food", "social"]);
    assert!(envelope.data.iter().all(|c| c.price > 0 && c.duration_secs > 0));
    assert!(envelope.data.iter().all(|c| !c.display_name.is_empty()));
}

// ============================================================================
// Registration → Payment → Status
// ============================================================================

#[tokio::test]
async fn test_registration_payment_and_status() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let body = RegistrationBody::unique("food");
    let external_id = body.external_id().unwrap();

    let order = register(&server, &body).await;
    assert_eq!(order.community, "food");
    assert_eq!(order.payment_status, "pending");
    assert!(order.amount > 0);
    assert!(order.order_ref.starts_with("order_"));

    // Pending orders are visible but not active
    let before = statuses(&server, body.bare_handle()).await;
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].state, "pending");
    assert!(!before[0].active);

    let settled = settle(&server, &CallbackBody::success(&order.order_ref)).await;
    assert_eq!(settled.order_ref, order.order_ref);
    assert_eq!(settled.payment_status, "completed");
    assert!(!settled.already_settled);
    assert!(settled.expires_at.is_some());
    assert!(settled.invite_link.is_some());

    let after = statuses(&server, body.bare_handle()).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].community, "food");
    assert_eq!(after[0].state, "active");
    assert!(after[0].active);
    assert_eq!(after[0].latest_payment.as_deref(), Some("completed"));

    // The activation notice reached the member directly
    let notices = server.messenger.notices_to(external_id);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains(settled.invite_link.as_deref().unwrap()));
}

#[tokio::test]
async fn test_repeated_callback_is_idempotent() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let body = RegistrationBody::unique("social");
    let order = register(&server, &body).await;

    let first = settle(&server, &CallbackBody::success(&order.order_ref)).await;
    let invites_after_first = server.messenger.invites_created();

    let second = settle(&server, &CallbackBody::success(&order.order_ref)).await;
    assert!(second.already_settled);
    assert_eq!(second.payment_status, "completed");
    assert_eq!(second.expires_at, first.expires_at);
    assert_eq!(server.messenger.invites_created(), invites_after_first);

    // A late failure report cannot undo the settlement
    let late = settle(&server, &CallbackBody::failure(&order.order_ref)).await;
    assert!(late.already_settled);
    assert_eq!(late.payment_status, "completed");
}

#[tokio::test]
async fn test_failed_payment_never_activates() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let body = RegistrationBody::unique("nikotin");
    let order = register(&server, &body).await;

    let settled = settle(&server, &CallbackBody::failure(&order.order_ref)).await;
    assert_eq!(settled.payment_status, "failed");
    assert!(settled.invite_link.is_none());

    let after = statuses(&server, body.bare_handle()).await;
    assert!(!after[0].active);
    assert_eq!(after[0].latest_payment.as_deref(), Some("failed"));
    assert_eq!(server.messenger.invites_created(), 0);
}

#[tokio::test]
async fn test_second_registration_while_active_conflicts() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let body = RegistrationBody::unique("food");
    let order = register(&server, &body).await;
    settle(&server, &CallbackBody::success(&order.order_ref)).await;

    let response = server.post("/api/v1/registrations", &body).await.unwrap();
    let error: ErrorEnvelope = assert_json(response, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(error.error.code, "ACTIVE_SUBSCRIPTION_EXISTS");

    // Other communities stay open
    let other = RegistrationBody {
        community: "social".to_string(),
        ..body.clone()
    };
    register(&server, &other).await;
}

#[tokio::test]
async fn test_renewal_extends_expiry() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let body = RegistrationBody::unique("social");
    let order = register(&server, &body).await;
    let first = settle(&server, &CallbackBody::success(&order.order_ref)).await;

    let response = server
        .post(&format!("/api/v1/members/{}/renewals", order.member_id), &serde_json::json!({}))
        .await
        .unwrap();
    let renewal: OrderResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(renewal.member_id, order.member_id);
    assert_ne!(renewal.order_ref, order.order_ref);

    let second = settle(&server, &CallbackBody::success(&renewal.order_ref)).await;
    assert!(!second.already_settled);
    assert!(second.expires_at.unwrap() > first.expires_at.unwrap());

    let after = statuses(&server, body.bare_handle()).await;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].expires_at, second.expires_at);
}

// ============================================================================
// Error Responses
// ============================================================================

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server
        .post("/api/v1/payments/callback", &CallbackBody::success("order_does_not_exist"))
        .await
        .unwrap();
    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_unknown_community_is_rejected() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let body = RegistrationBody::unique("gaming");
    let response = server.post("/api/v1/registrations", &body).await.unwrap();
    let error: ErrorEnvelope = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error.error.code, "UNKNOWN_COMMUNITY");
    assert!(!error.error.message.is_empty());
}

#[tokio::test]
async fn test_status_for_unknown_person_is_empty() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let handle = format!("nobody_{}", unique_suffix());
    assert!(statuses(&server, &handle).await.is_empty());
}
