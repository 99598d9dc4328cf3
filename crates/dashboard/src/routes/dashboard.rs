//! Dashboard page: per-tenant (or aggregated) state and marketplace cards.

use std::collections::HashMap;

use askama::Template;
use axum::{extract::State, response::Html};
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use middify_core::{format, OrderState};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::middify::types::{MarketplaceTenant, TenantStates};
use crate::state::AppState;

use super::{build_shell, load_view, save_view, shared_data_error, Shell};

/// One state count chip on a tenant card.
#[derive(Debug, Clone)]
pub struct StateChip {
    pub name: String,
    pub count: String,
    /// Slug for the orders-view jump; absent for states outside the known set.
    pub slug: Option<String>,
}

/// One tenant card (or the aggregate card) on the dashboard.
#[derive(Debug, Clone)]
pub struct StateCard {
    pub id: String,
    pub name: String,
    pub total: String,
    pub states: Vec<StateChip>,
}

/// One marketplace line on the marketplace card.
#[derive(Debug, Clone)]
pub struct MarketplaceEntry {
    pub id: String,
    pub name: String,
    pub count: String,
}

/// The marketplace summary card.
#[derive(Debug, Clone)]
pub struct MarketplaceCard {
    pub title: String,
    pub entries: Vec<MarketplaceEntry>,
}

fn format_count(count: u64) -> String {
    format::format_number(Decimal::from(count))
}

fn chip(id: &str, count: u64) -> StateChip {
    StateChip {
        name: id.to_string(),
        count: format_count(count),
        slug: OrderState::from_slug(&OrderState::normalize_key(id)).map(|s| s.slug().to_string()),
    }
}

/// Collapse every tenant into one aggregate card, summing counts per state
/// while keeping each state's first-seen position.
pub(crate) fn aggregate_card(tenants: &[&TenantStates]) -> StateCard {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut total: u64 = 0;

    for tenant in tenants {
        total += tenant.total;
        for state in &tenant.states {
            if !counts.contains_key(&state.id) {
                order.push(state.id.clone());
            }
            *counts.entry(state.id.clone()).or_insert(0) += state.count;
        }
    }

    StateCard {
        id: "all-tenants".to_string(),
        name: "Todas las tiendas".to_string(),
        total: format_count(total),
        states: order
            .iter()
            .map(|id| chip(id, counts.get(id).copied().unwrap_or(0)))
            .collect(),
    }
}

/// One card per tenant.
pub(crate) fn tenant_card(tenant: &TenantStates) -> StateCard {
    StateCard {
        id: tenant.tenant_id.as_str().to_string(),
        name: tenant.tenant_name.clone(),
        total: format_count(tenant.total),
        states: tenant
            .states
            .iter()
            .map(|state| chip(&state.id, state.count))
            .collect(),
    }
}

/// The marketplace card: aggregated sums across tenants, or the first
/// selected tenant's own list.
pub(crate) fn marketplace_card(
    tenants: &[&MarketplaceTenant],
    aggregated: bool,
) -> Option<MarketplaceCard> {
    if tenants.is_empty() {
        return None;
    }

    if aggregated {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, u64> = HashMap::new();
        for tenant in tenants {
            for marketplace in &tenant.marketplaces {
                if !counts.contains_key(&marketplace.name) {
                    order.push(marketplace.name.clone());
                }
                *counts.entry(marketplace.name.clone()).or_insert(0) += marketplace.count;
            }
        }
        return Some(MarketplaceCard {
            title: "Todas las tiendas".to_string(),
            entries: order
                .iter()
                .map(|name| MarketplaceEntry {
                    id: name.clone(),
                    name: name.clone(),
                    count: format_count(counts.get(name).copied().unwrap_or(0)),
                })
                .collect(),
        });
    }

    let tenant = tenants[0];
    Some(MarketplaceCard {
        title: tenant.tenant_name.clone(),
        entries: tenant
            .marketplaces
            .iter()
            .map(|marketplace| MarketplaceEntry {
                id: marketplace.id.clone(),
                name: marketplace.name.clone(),
                count: format_count(marketplace.count),
            })
            .collect(),
    })
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: Shell,
    pub error: Option<String>,
    pub has_data: bool,
    pub cards: Vec<StateCard>,
    pub marketplace: Option<MarketplaceCard>,
}

/// Dashboard page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAuth(token): RequireAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let mut view = load_view(&session).await;
    view.change_view("dashboard");

    let shell = build_shell(&state, &token, &view).await;
    let error = shared_data_error(&state).await;
    save_view(&session, &view).await?;

    let tenants = state
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

    let visible = view.visible_tenants(&tenants);
    let visible_marketplaces = view.visible_marketplace_tenants(&marketplace_tenants);

    let has_data = !visible.is_empty();
    let cards = if view.is_aggregated() {
        vec![aggregate_card(&visible)]
    } else {
        visible.iter().map(|tenant| tenant_card(tenant)).collect()
    };
    let marketplace = marketplace_card(&visible_marketplaces, view.is_aggregated());

    let template = DashboardTemplate {
        shell,
        error,
        has_data,
        cards,
        marketplace,
    };

    Ok(Html(template.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use middify_core::TenantId;

    use crate::middify::types::{Marketplace, StateCount};

    fn tenant(id: &str, total: u64, states: &[(&str, u64)]) -> TenantStates {
        TenantStates {
            tenant_id: TenantId::new(id),
            tenant_name: format!("Tienda {id}"),
            states: states
                .iter()
                .map(|(state, count)| StateCount {
                    id: (*state).to_string(),
                    count: *count,
                })
                .collect(),
            total,
        }
    }

    #[test]
    fn test_aggregate_card_sums_and_preserves_order() {
        let a = tenant("a", 10, &[("error", 2), ("pendiente", 3)]);
        let b = tenant("b", 5, &[("pendiente", 1), ("procesada", 4)]);
        let card = aggregate_card(&[&a, &b]);

        assert_eq!(card.total, "15");
        let names: Vec<&str> = card.states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["error", "pendiente", "procesada"]);
        assert_eq!(card.states[1].count, "4");
    }

    #[test]
    fn test_chip_slug_only_for_known_states() {
        let card = aggregate_card(&[&tenant("a", 1, &[("en proceso", 1), ("limbo", 2)])]);
        assert_eq!(card.states[0].slug.as_deref(), Some("en_proceso"));
        assert_eq!(card.states[1].slug, None);
    }

    #[test]
    fn test_marketplace_card_aggregation() {
        let tenants = vec![
            MarketplaceTenant {
                tenant_id: TenantId::new("a"),
                tenant_name: "A".to_string(),
                marketplaces: vec![
                    Marketplace {
                        id: "falabella".to_string(),
                        name: "falabella".to_string(),
                        count: 4,
                        creation: None,
                        last_update: None,
                    },
                    Marketplace {
                        id: "paris".to_string(),
                        name: "paris".to_string(),
                        count: 1,
                        creation: None,
                        last_update: None,
                    },
                ],
            },
            MarketplaceTenant {
                tenant_id: TenantId::new("b"),
                tenant_name: "B".to_string(),
                marketplaces: vec![Marketplace {
                    id: "falabella".to_string(),
                    name: "falabella".to_string(),
                    count: 6,
                    creation: None,
                    last_update: None,
                }],
            },
        ];
        let refs: Vec<&MarketplaceTenant> = tenants.iter().collect();

        let card = marketplace_card(&refs, true).expect("card");
        assert_eq!(card.title, "Todas las tiendas");
        assert_eq!(card.entries.len(), 2);
        assert_eq!(card.entries[0].count, "10");

        let card = marketplace_card(&refs[..1], false).expect("card");
        assert_eq!(card.title, "A");
        assert_eq!(card.entries.len(), 2);

        assert!(marketplace_card(&[], true).is_none());
    }
}
