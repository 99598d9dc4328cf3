//! Integration tests for the shared resource cells.

use std::sync::atomic::Ordering;

use serde_json::json;

use middify_dashboard::middify::MiddifyClient;
use middify_dashboard::resource::{ResourceState, SharedResources};
use middify_integration_tests::MockBackend;

#[tokio::test]
async fn test_sync_without_token_settles_empty_with_no_network() {
    let backend = MockBackend::spawn().await;
    let client = MiddifyClient::new(backend.base_url.clone());
    let resources = SharedResources::default();

    resources.sync(None, &client);
    let (tenants, marketplaces, profile) = resources.settle().await;

    assert_eq!(tenants, ResourceState::Ready(Vec::new()));
    assert_eq!(marketplaces, ResourceState::Ready(Vec::new()));
    assert_eq!(profile, ResourceState::Ready(None));

    assert_eq!(backend.state().states_hits.load(Ordering::SeqCst), 0);
    assert_eq!(backend.state().marketplace_hits.load(Ordering::SeqCst), 0);
    assert_eq!(backend.state().users_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sync_fetches_once_per_token() {
    let backend = MockBackend::spawn().await;
    *backend.state().product_states.lock().unwrap() = json!({
        "tenants": [{ "tenantId": "a", "tenantName": "A", "total": 1 }]
    });

    let client = MiddifyClient::new(backend.base_url.clone());
    let resources = SharedResources::default();
    let token = MockBackend::token();

    resources.sync(Some(&token), &client);
    let (tenants, _, profile) = resources.settle().await;
    assert!(matches!(tenants, ResourceState::Ready(ref list) if list.len() == 1));
    assert!(matches!(profile, ResourceState::Ready(Some(_))));

    // Same token again: everything is already loaded, no new calls.
    resources.sync(Some(&token), &client);
    resources.settle().await;

    assert_eq!(backend.state().states_hits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state().users_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_resource_does_not_block_others() {
    let backend = MockBackend::spawn().await;
    // An object without a tenants array is a malformed states payload.
    *backend.state().product_states.lock().unwrap() = json!({ "oops": true });

    let client = MiddifyClient::new(backend.base_url.clone());
    let resources = SharedResources::default();

    resources.sync(Some(&MockBackend::token()), &client);
    let (tenants, marketplaces, profile) = resources.settle().await;

    assert!(tenants.failure().is_some());
    assert!(matches!(marketplaces, ResourceState::Ready(_)));
    assert!(matches!(profile, ResourceState::Ready(Some(_))));
}

#[tokio::test]
async fn test_token_change_reloads() {
    let backend = MockBackend::spawn().await;
    let client = MiddifyClient::new(backend.base_url.clone());
    let resources = SharedResources::default();

    resources.sync(Some(&MockBackend::token()), &client);
    resources.settle().await;

    // Losing the token resets to the empty value...
    resources.sync(None, &client);
    let (tenants, _, _) = resources.settle().await;
    assert_eq!(tenants, ResourceState::Ready(Vec::new()));

    // ...and a fresh token fetches again.
    resources.sync(Some(&MockBackend::token()), &client);
    resources.settle().await;
    assert_eq!(backend.state().states_hits.load(Ordering::SeqCst), 2);
}
