//! HTTP client for the Middify backend.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::instrument;

use middify_core::{BearerToken, OrderId, OrderState, TenantId};

use super::conversions::{
    normalize_marketplace_tenants, normalize_tenant_states, tenants_payload, user_profile_payload,
};
use super::types::{
    DetailsEnvelope, ErrorEnvelope, MarketplaceTenant, OrderDetails, OrdersPage, TenantStates,
    UserProfile,
};
use super::MiddifyError;

/// Query for the paged `orders-by-state` endpoint.
///
/// `status` is sent in the backend's space-separated form; absent fields are
/// omitted from the query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersByStateQuery {
    pub tenant_id: Option<TenantId>,
    pub status: Option<OrderState>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Typed client for the Middify REST backend.
///
/// Cheaply cloneable; all requests carry the caller's bearer token. A call
/// with no token fails with `MissingCredential` before any network I/O.
#[derive(Debug, Clone)]
pub struct MiddifyClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl MiddifyClient {
    /// Create a new client for the given API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(ClientInner {
                client: reqwest::Client::new(),
                base_url,
            }),
        }
    }

    /// The configured API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// Issue one authenticated GET and return the response body.
    ///
    /// Non-2xx statuses become `Http` errors, with the message taken from a
    /// structured error envelope when the body carries one.
    async fn get_raw(
        &self,
        token: Option<&BearerToken>,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<(StatusCode, String), MiddifyError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(MiddifyError::MissingCredential)?;

        let response = self
            .inner
            .client
            .get(self.endpoint(path))
            .query(params)
            .bearer_auth(token.as_str())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// GET that fails on non-2xx and parses the body as JSON.
    async fn get_json(
        &self,
        token: Option<&BearerToken>,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, MiddifyError> {
        let (status, body) = self.get_raw(token, path, params).await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(ErrorEnvelope::into_message)
                .unwrap_or_else(|| format!("Error {}", status.as_u16()));
            return Err(MiddifyError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| MiddifyError::Malformed(e.to_string()))
    }

    /// Fetch per-tenant order-state counts.
    ///
    /// # Errors
    ///
    /// Fails on missing credentials, non-2xx responses, or a payload without
    /// a tenant array.
    #[instrument(skip(self, token))]
    pub async fn order_states(
        &self,
        token: Option<&BearerToken>,
    ) -> Result<Vec<TenantStates>, MiddifyError> {
        let body = self.get_json(token, "getProductStates", &[]).await?;
        Ok(normalize_tenant_states(tenants_payload(body)?))
    }

    /// Fetch per-tenant marketplace order counts.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::order_states`].
    #[instrument(skip(self, token))]
    pub async fn marketplace_summary(
        &self,
        token: Option<&BearerToken>,
    ) -> Result<Vec<MarketplaceTenant>, MiddifyError> {
        let body = self.get_json(token, "getMarketplaceSummary", &[]).await?;
        Ok(normalize_marketplace_tenants(tenants_payload(body)?))
    }

    /// Fetch the signed-in operator's profile.
    ///
    /// # Errors
    ///
    /// Fails on missing credentials, non-2xx responses, or a payload that is
    /// not an object.
    #[instrument(skip(self, token))]
    pub async fn user_profile(
        &self,
        token: Option<&BearerToken>,
    ) -> Result<UserProfile, MiddifyError> {
        let body = self.get_json(token, "getUsers", &[]).await?;
        user_profile_payload(body)
    }

    /// Fetch one page of orders filtered by tenant and/or state.
    ///
    /// Returns the raw page envelope unmodified; row shaping happens in the
    /// orders engine.
    ///
    /// # Errors
    ///
    /// Fails on missing credentials, non-2xx responses, or an envelope that
    /// does not deserialize.
    #[instrument(skip(self, token), fields(page = query.page, page_size = query.page_size))]
    pub async fn orders_by_state(
        &self,
        token: Option<&BearerToken>,
        query: &OrdersByStateQuery,
    ) -> Result<OrdersPage, MiddifyError> {
        let mut params: Vec<(&str, String)> = Vec::with_capacity(4);
        if let Some(tenant_id) = &query.tenant_id {
            params.push(("tenantId", tenant_id.as_str().to_string()));
        }
        if let Some(status) = query.status {
            params.push(("status", status.query_value().to_string()));
        }
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(page_size) = query.page_size {
            params.push(("pageSize", page_size.to_string()));
        }

        let body = self.get_json(token, "getOrdersByState", &params).await?;
        serde_json::from_value(body).map_err(|e| MiddifyError::Malformed(e.to_string()))
    }

    /// Fetch the detail panels for one order.
    ///
    /// The endpoint reports failures inside a `{success, message}` envelope,
    /// sometimes with a non-2xx status and sometimes with 200 — both are
    /// surfaced with the envelope's message.
    ///
    /// # Errors
    ///
    /// `Api` for `success:false`, `Http` for non-2xx, `Malformed` for an
    /// undecodable body.
    #[instrument(skip(self, token), fields(order_id = %order_id))]
    pub async fn order_details(
        &self,
        token: Option<&BearerToken>,
        order_id: &OrderId,
    ) -> Result<Option<OrderDetails>, MiddifyError> {
        let params = [("_id", order_id.as_str().to_string())];
        let (status, body) = self.get_raw(token, "getDetailsOrders", &params).await?;

        let envelope = serde_json::from_str::<DetailsEnvelope>(&body).ok();

        if !status.is_success() {
            let message = envelope
                .as_ref()
                .and_then(|e| e.message.clone())
                .unwrap_or_else(|| {
                    format!("Error {}: could not fetch order details", status.as_u16())
                });
            return Err(MiddifyError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = envelope
            .ok_or_else(|| MiddifyError::Malformed("order details body is not JSON".to_string()))?;

        if envelope.success == Some(false) {
            return Err(MiddifyError::Api(envelope.message.unwrap_or_else(|| {
                "backend reported an error state for the order details".to_string()
            })));
        }

        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        // Unroutable base URL: reaching the network would fail differently.
        let client = MiddifyClient::new("http://127.0.0.1:1");

        let err = client.order_states(None).await.expect_err("no token");
        assert!(matches!(err, MiddifyError::MissingCredential));

        let empty = BearerToken::new("");
        let err = client
            .orders_by_state(Some(&empty), &OrdersByStateQuery::default())
            .await
            .expect_err("empty token");
        assert!(matches!(err, MiddifyError::MissingCredential));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = MiddifyClient::new("https://api.middify.example/dev/");
        assert_eq!(client.base_url(), "https://api.middify.example/dev");
        assert_eq!(
            client.endpoint("getUsers"),
            "https://api.middify.example/dev/getUsers"
        );
    }
}
