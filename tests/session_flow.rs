//! End-to-end session behavior against a scripted target

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{MockApiClient, Scripted};
use stampede::{
    Credential, FailureReason, LoadMetrics, Method, Outcome, OutcomeClassifier, TaskKind,
    VirtualUserSession,
};

fn credential() -> Credential {
    Credential {
        username: "user1".to_string(),
        password: "password".to_string(),
    }
}

fn session(client: Arc<MockApiClient>, metrics: Arc<LoadMetrics>) -> VirtualUserSession {
    VirtualUserSession::new(
        0,
        credential(),
        42,
        client,
        OutcomeClassifier::new(Duration::from_millis(1000)),
        metrics,
    )
}

#[tokio::test]
async fn test_login_populates_token() {
    let client = Arc::new(MockApiClient::healthy());
    let mut session = session(Arc::clone(&client), Arc::new(LoadMetrics::new()));

    session.start().await;

    assert_eq!(session.state().token.as_deref(), Some("mock-token"));
    assert!(!session.state().degraded);

    let calls = client.calls();
    assert_eq!(calls[0].method, Method::Post);
    assert_eq!(calls[0].path, "/login");
    assert_eq!(calls[0].body.as_ref().unwrap()["username"], "user1");
}

#[tokio::test]
async fn test_rejected_login_degrades_but_session_continues() {
    let client = Arc::new(MockApiClient::scripted(vec![Scripted::Respond {
        status: 401,
        body: r#"{"message": "bad credentials"}"#.to_string(),
        elapsed_ms: 20,
    }]));
    let metrics = Arc::new(LoadMetrics::new());
    let mut session = session(Arc::clone(&client), Arc::clone(&metrics));

    session.start().await;

    assert!(session.state().degraded);
    assert_eq!(session.state().token, None);
    assert_eq!(metrics.auth_failures.load(Ordering::Relaxed), 1);

    // The degraded session still generates load; the target's rejections
    // are classified, not fatal.
    let result = session.run_task(TaskKind::BrowseProducts).await.unwrap();
    assert!(result.is_success());
    // No Authorization header without a token
    assert!(client.calls()[1].headers.is_empty());
}

#[tokio::test]
async fn test_login_body_without_token_leaves_token_unset() {
    let client = Arc::new(MockApiClient::scripted(vec![Scripted::Respond {
        status: 200,
        body: "{}".to_string(),
        elapsed_ms: 20,
    }]));
    let metrics = Arc::new(LoadMetrics::new());
    let mut session = session(client, Arc::clone(&metrics));

    session.start().await;

    assert_eq!(session.state().token, None);
    assert!(session.state().degraded);
    assert_eq!(metrics.auth_failures.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_browse_populates_catalog() {
    let client = Arc::new(MockApiClient::healthy());
    let mut session = session(client, Arc::new(LoadMetrics::new()));
    session.start().await;

    let result = session.run_task(TaskKind::BrowseProducts).await.unwrap();

    assert!(result.is_success());
    assert_eq!(session.state().catalog.len(), 3);
}

#[tokio::test]
async fn test_authenticated_requests_carry_bearer_token() {
    let client = Arc::new(MockApiClient::healthy());
    let mut session = session(Arc::clone(&client), Arc::new(LoadMetrics::new()));
    session.start().await;
    session.run_task(TaskKind::BrowseProducts).await.unwrap();

    let calls = client.calls();
    let browse = &calls[1];
    assert_eq!(
        browse.headers,
        vec![("Authorization".to_string(), "Bearer mock-token".to_string())]
    );
}

#[tokio::test]
async fn test_view_product_targets_a_cataloged_product() {
    let client = Arc::new(MockApiClient::healthy());
    let mut session = session(Arc::clone(&client), Arc::new(LoadMetrics::new()));
    session.start().await;
    session.run_task(TaskKind::BrowseProducts).await.unwrap();

    let result = session.run_task(TaskKind::ViewProduct).await.unwrap();
    assert!(result.is_success());

    let calls = client.calls();
    let view = calls.last().unwrap();
    assert!(
        ["/products/1", "/products/2", "/products/3"].contains(&view.path.as_str()),
        "unexpected path {}",
        view.path
    );
}

#[tokio::test]
async fn test_add_to_cart_then_checkout_clears_cart() {
    let client = Arc::new(MockApiClient::healthy());
    let mut session = session(Arc::clone(&client), Arc::new(LoadMetrics::new()));
    session.start().await;
    session.run_task(TaskKind::BrowseProducts).await.unwrap();

    let added = session.run_task(TaskKind::AddToCart).await.unwrap();
    assert!(added.is_success());
    assert_eq!(session.state().cart_id, Some(1));

    let checked_out = session.run_task(TaskKind::FinalizeOrder).await.unwrap();
    assert!(checked_out.is_success());
    assert_eq!(session.state().cart_id, None);

    let calls = client.calls();
    let order = calls.last().unwrap();
    assert_eq!(order.path, "/order");
    assert_eq!(order.body.as_ref().unwrap()["cart_id"], 1);
}

#[tokio::test]
async fn test_unmet_precondition_skips_without_counting() {
    let client = Arc::new(MockApiClient::healthy());
    let metrics = Arc::new(LoadMetrics::new());
    let mut session = session(Arc::clone(&client), Arc::clone(&metrics));

    // Fresh session: no catalog, no cart
    assert!(session.run_task(TaskKind::FinalizeOrder).await.is_none());
    assert!(session.run_task(TaskKind::ViewProduct).await.is_none());

    // Skips issue no requests and record no statistics
    assert!(client.calls().is_empty());
    assert_eq!(metrics.tasks_completed.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_transport_failure_is_classified_and_survivable() {
    let client = Arc::new(MockApiClient::scripted(vec![
        Scripted::Respond {
            status: 200,
            body: r#"{"access_token": "mock-token"}"#.to_string(),
            elapsed_ms: 10,
        },
        Scripted::TransportFailure,
    ]));
    let mut session = session(client, Arc::new(LoadMetrics::new()));
    session.start().await;

    let failed = session.run_task(TaskKind::BrowseProducts).await.unwrap();
    assert_eq!(failed.outcome, Outcome::Failure(FailureReason::Transport));
    assert!(session.state().catalog.is_empty());

    // Script exhausted: the next attempt hits the healthy default
    let recovered = session.run_task(TaskKind::BrowseProducts).await.unwrap();
    assert!(recovered.is_success());
    assert_eq!(session.state().catalog.len(), 3);
}

#[tokio::test]
async fn test_slow_response_fails_but_state_is_untouched() {
    let slow_catalog = r#"[{"id": 1, "name": "product_1", "price": 9.99}]"#;
    let client = Arc::new(MockApiClient::scripted(vec![
        Scripted::Respond {
            status: 200,
            body: r#"{"access_token": "mock-token"}"#.to_string(),
            elapsed_ms: 10,
        },
        Scripted::Respond {
            status: 200,
            body: slow_catalog.to_string(),
            elapsed_ms: 1500,
        },
    ]));
    let metrics = Arc::new(LoadMetrics::new());
    let mut session = session(client, Arc::clone(&metrics));
    session.start().await;

    let result = session.run_task(TaskKind::BrowseProducts).await.unwrap();
    assert_eq!(
        result.outcome,
        Outcome::Failure(FailureReason::ResponseTimeExceeded)
    );
    // A failed browse must not install the catalog it carried
    assert!(session.state().catalog.is_empty());
}
