//! Integration tests for the Middify backend client over real HTTP.

use std::sync::atomic::Ordering;

use serde_json::json;

use middify_core::{BearerToken, OrderId};
use middify_dashboard::middify::{MiddifyClient, MiddifyError, OrdersByStateQuery};
use middify_integration_tests::MockBackend;

#[tokio::test]
async fn test_order_states_dedup_and_synthesized_ids() {
    let backend = MockBackend::spawn().await;
    *backend.state().product_states.lock().unwrap() = json!({
        "tenants": [
            { "tenantId": "falabella", "tenantName": "Falabella", "total": 12,
              "states": [{ "_id": "error", "count": 2 }] },
            { "tenantId": "falabella", "tenantName": "Duplicada", "total": 99 },
            { "states": [{ "_id": "pendiente", "count": 1 }] },
        ]
    });

    let client = MiddifyClient::new(backend.base_url.clone());
    let tenants = client
        .order_states(Some(&MockBackend::token()))
        .await
        .expect("tenants");

    assert_eq!(tenants.len(), 2);
    assert_eq!(tenants[0].tenant_id.as_str(), "falabella");
    assert_eq!(tenants[0].tenant_name, "Falabella");
    assert_eq!(tenants[0].total, 12);
    // Index-derived id and placeholder name for the anonymous entry.
    assert_eq!(tenants[1].tenant_id.as_str(), "tenant_2");
    assert_eq!(tenants[1].tenant_name, "Sin nombre");
    assert_eq!(tenants[1].states[0].id, "pendiente");
}

#[tokio::test]
async fn test_bare_array_tenants_accepted() {
    let backend = MockBackend::spawn().await;
    *backend.state().product_states.lock().unwrap() = json!([
        { "tenantId": "paris", "tenantName": "Paris" },
    ]);

    let client = MiddifyClient::new(backend.base_url.clone());
    let tenants = client
        .order_states(Some(&MockBackend::token()))
        .await
        .expect("tenants");
    assert_eq!(tenants.len(), 1);
    assert_eq!(tenants[0].tenant_id.as_str(), "paris");
}

#[tokio::test]
async fn test_missing_tenants_field_is_malformed() {
    let backend = MockBackend::spawn().await;
    *backend.state().product_states.lock().unwrap() = json!({ "stores": [] });

    let client = MiddifyClient::new(backend.base_url.clone());
    let err = client
        .order_states(Some(&MockBackend::token()))
        .await
        .expect_err("must reject");
    assert!(matches!(err, MiddifyError::Malformed(_)));
}

#[tokio::test]
async fn test_no_token_means_no_network_call() {
    let backend = MockBackend::spawn().await;
    let client = MiddifyClient::new(backend.base_url.clone());

    let err = client.order_states(None).await.expect_err("no token");
    assert!(matches!(err, MiddifyError::MissingCredential));

    let empty = BearerToken::new("");
    let err = client
        .marketplace_summary(Some(&empty))
        .await
        .expect_err("empty token");
    assert!(matches!(err, MiddifyError::MissingCredential));

    assert_eq!(backend.state().states_hits.load(Ordering::SeqCst), 0);
    assert_eq!(backend.state().marketplace_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_http_error_message_from_envelope() {
    let backend = MockBackend::spawn().await;
    let client = MiddifyClient::new(backend.base_url.clone());

    // The mock answers 401 with a structured envelope for a wrong token.
    let wrong = BearerToken::new("wrong-token");
    let err = client
        .orders_by_state(Some(&wrong), &OrdersByStateQuery::default())
        .await
        .expect_err("unauthorized");
    match err {
        MiddifyError::Http { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "No autorizado");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_marketplace_summary_normalization() {
    let backend = MockBackend::spawn().await;
    *backend.state().marketplace_summary.lock().unwrap() = json!({
        "tenants": [
            { "tenantId": "a", "tenantName": "A", "marketplaces": [
                { "name": "falabella", "count": 7, "creation": "2024-01-01T00:00:00Z" },
                { "count": 3 },
            ]},
        ]
    });

    let client = MiddifyClient::new(backend.base_url.clone());
    let tenants = client
        .marketplace_summary(Some(&MockBackend::token()))
        .await
        .expect("summary");
    assert_eq!(tenants[0].marketplaces.len(), 2);
    assert_eq!(tenants[0].marketplaces[0].name, "falabella");
    assert_eq!(tenants[0].marketplaces[1].id, "marketplace-a-1");
    assert_eq!(tenants[0].marketplaces[1].name, "Sin nombre");
    assert_eq!(tenants[0].marketplaces[1].count, 3);
}

#[tokio::test]
async fn test_user_profile_from_data_envelope() {
    let backend = MockBackend::spawn().await;
    let client = MiddifyClient::new(backend.base_url.clone());

    let profile = client
        .user_profile(Some(&MockBackend::token()))
        .await
        .expect("profile");
    assert_eq!(profile.full_name.as_deref(), Some("Operadora QA"));
    assert_eq!(profile.email.as_deref(), Some("qa@middify.cl"));
}

#[tokio::test]
async fn test_order_details_success_false_is_api_error() {
    let backend = MockBackend::spawn().await;
    *backend.state().details.lock().unwrap() = json!({
        "success": false,
        "message": "la orden no existe",
    });

    let client = MiddifyClient::new(backend.base_url.clone());
    let err = client
        .order_details(Some(&MockBackend::token()), &OrderId::new("o-404"))
        .await
        .expect_err("failure envelope");
    match err {
        MiddifyError::Api(message) => assert_eq!(message, "la orden no existe"),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_order_details_non_2xx_uses_envelope_message() {
    let backend = MockBackend::spawn().await;
    backend.state().details_status.store(502, Ordering::SeqCst);
    *backend.state().details.lock().unwrap() = json!({
        "success": false,
        "message": "marketplace caido",
    });

    let client = MiddifyClient::new(backend.base_url.clone());
    let err = client
        .order_details(Some(&MockBackend::token()), &OrderId::new("o-1"))
        .await
        .expect_err("bad gateway");
    match err {
        MiddifyError::Http { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "marketplace caido");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_order_details_null_data_is_none() {
    let backend = MockBackend::spawn().await;
    let client = MiddifyClient::new(backend.base_url.clone());

    let details = client
        .order_details(Some(&MockBackend::token()), &OrderId::new("o-1"))
        .await
        .expect("details");
    assert!(details.is_none());
}

#[tokio::test]
async fn test_orders_by_state_sends_space_separated_status() {
    let backend = MockBackend::spawn().await;
    backend.set_orders(vec![
        json!({ "_id": "o1", "status": "en proceso", "tennantId": "a" }),
        json!({ "_id": "o2", "status": "error", "tennantId": "a" }),
    ]);

    let client = MiddifyClient::new(backend.base_url.clone());
    let page = client
        .orders_by_state(
            Some(&MockBackend::token()),
            &OrdersByStateQuery {
                status: Some(middify_core::OrderState::EnProceso),
                ..OrdersByStateQuery::default()
            },
        )
        .await
        .expect("page");

    assert_eq!(page.orders.len(), 1);
    assert_eq!(page.total, Some(1));

    let recorded = backend.state().orders_requests.lock().unwrap().clone();
    assert_eq!(recorded[0].status.as_deref(), Some("en proceso"));
}
