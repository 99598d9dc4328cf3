//! Stores page: the union of the order-state and marketplace tenant lists.

use std::collections::HashMap;

use askama::Template;
use axum::{extract::State, response::Html};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use middify_core::format;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::middify::types::{MarketplaceTenant, TenantStates};
use crate::state::AppState;

use super::{build_shell, load_view, save_view, shared_data_error, Shell};

/// One store card: order totals, error counts, marketplace volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCard {
    pub id: String,
    pub name: String,
    pub total_orders: String,
    pub error_count: String,
    pub marketplace_orders: String,
}

/// Merge both tenant lists by tenant id.
///
/// A store appears when either source mentions it; totals come from the
/// order-state list, marketplace volume from the summary list, and the
/// error count sums the `error`/`errores` state buckets.
pub(crate) fn merge_store_cards(
    product_tenants: &[TenantStates],
    marketplace_tenants: &[MarketplaceTenant],
) -> Vec<StoreCard> {
    let products: HashMap<&str, &TenantStates> = product_tenants
        .iter()
        .map(|tenant| (tenant.tenant_id.as_str(), tenant))
        .collect();
    let marketplaces: HashMap<&str, &MarketplaceTenant> = marketplace_tenants
        .iter()
        .map(|tenant| (tenant.tenant_id.as_str(), tenant))
        .collect();

    // Union of ids, product-list order first, then marketplace-only stores.
    let mut ids: Vec<&str> = product_tenants
        .iter()
        .map(|tenant| tenant.tenant_id.as_str())
        .collect();
    for tenant in marketplace_tenants {
        if !products.contains_key(tenant.tenant_id.as_str()) {
            ids.push(tenant.tenant_id.as_str());
        }
    }

    ids.into_iter()
        .map(|id| {
            let product = products.get(id);
            let marketplace = marketplaces.get(id);

            let name = product
                .map(|tenant| tenant.tenant_name.clone())
                .or_else(|| marketplace.map(|tenant| tenant.tenant_name.clone()))
                .unwrap_or_default();

            let total_orders = product.map_or(0, |tenant| tenant.total);

            let error_count = product.map_or(0, |tenant| {
                tenant
                    .states
                    .iter()
                    .filter(|state| {
                        let normalized = state.id.trim().to_lowercase();
                        normalized == "error" || normalized == "errores"
                    })
                    .map(|state| state.count)
                    .sum()
            });

            let marketplace_orders = marketplace.map_or(0, |tenant| {
                tenant
                    .marketplaces
                    .iter()
                    .map(|marketplace| marketplace.count)
                    .sum()
            });

            StoreCard {
                id: id.to_string(),
                name,
                total_orders: format::format_number(Decimal::from(total_orders)),
                error_count: format::format_number(Decimal::from(error_count)),
                marketplace_orders: format::format_number(Decimal::from(marketplace_orders)),
            }
        })
        .collect()
}

/// Stores page template.
#[derive(Template)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub shell: Shell,
    pub error: Option<String>,
    pub stores: Vec<StoreCard>,
}

/// Stores page handler.
///
/// Unlike the dashboard, this page always shows every store regardless of
/// the sidebar tenant filter.
#[instrument(skip_all)]
pub async fn index(
    RequireAuth(token): RequireAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let mut view = load_view(&session).await;
    view.change_view("stores");

    let shell = build_shell(&state, &token, &view).await;
    let error = shared_data_error(&state).await;
    save_view(&session, &view).await?;

    let product_tenants = state
        .resources()
        .tenant_states
        .snapshot()
        .ready()
        .cloned()
        .unwrap_or_default();
    let marketplace_tenants = state
        .resources()
        .marketplace_summary
        .snapshot()
        .ready()
        .cloned()
        .unwrap_or_default();

    let stores = merge_store_cards(&product_tenants, &marketplace_tenants);

    let template = StoresTemplate {
        shell,
        error,
        stores,
    };

    Ok(Html(template.render()?))
}
