//! Top-level navigation state, persisted in the session.
//!
//! Transition rules are pure so they can be tested without a server: state
//! chips jump to the orders view, rows open the details view, closing details
//! returns to orders, and unrecognized view names change nothing.

use serde::{Deserialize, Serialize};

use middify_core::{OrderId, OrderState, TenantId};

use crate::middify::types::{MarketplaceTenant, TenantStates};
use crate::orders::{SelectionState, TableState};

/// The fixed set of top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    #[default]
    Dashboard,
    Stores,
    Orders,
    OrderDetails,
}

impl ActiveView {
    /// Parse a requested view name; unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dashboard" => Some(Self::Dashboard),
            "stores" => Some(Self::Stores),
            "orders" => Some(Self::Orders),
            _ => None,
        }
    }
}

/// Everything the shell remembers between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub active_view: ActiveView,
    pub selected_tenant: Option<TenantId>,
    pub selected_state: Option<OrderState>,
    pub selected_order: Option<OrderId>,
    pub sidebar_collapsed: bool,
    pub sidebar_open: bool,
    pub table: TableState,
    pub selection: SelectionState,
}

impl ViewState {
    /// Switch views by name. Unrecognized names leave the state unchanged.
    pub fn change_view(&mut self, name: &str) {
        if let Some(view) = ActiveView::from_name(name) {
            self.active_view = view;
        }
    }

    /// Select (or clear) the tenant filter; the server pager restarts.
    pub fn select_tenant(&mut self, tenant: Option<TenantId>) {
        if self.selected_tenant != tenant {
            self.selected_tenant = tenant;
            self.table.reset_server_page();
        }
    }

    /// A dashboard state chip was clicked: filter and jump to the orders view.
    pub fn select_order_state(&mut self, state: Option<OrderState>) {
        if self.selected_state != state {
            self.selected_state = state;
            self.table.reset_server_page();
        }
        self.active_view = ActiveView::Orders;
    }

    /// Change the state filter without leaving the current view (sidebar).
    pub fn set_order_state(&mut self, state: Option<OrderState>) {
        if self.selected_state != state {
            self.selected_state = state;
            self.table.reset_server_page();
        }
    }

    /// A table row was clicked: open the details view for that order.
    pub fn select_order(&mut self, order: OrderId) {
        self.selected_order = Some(order);
        self.active_view = ActiveView::OrderDetails;
    }

    /// Close the details view and return to the orders table.
    pub fn close_details(&mut self) {
        self.selected_order = None;
        self.active_view = ActiveView::Orders;
    }

    /// Tenant order-states visible to the dashboard: filtered to the selected
    /// tenant, or the full list in aggregate mode.
    #[must_use]
    pub fn visible_tenants<'a>(&self, tenants: &'a [TenantStates]) -> Vec<&'a TenantStates> {
        match &self.selected_tenant {
            Some(selected) => tenants
                .iter()
                .filter(|tenant| &tenant.tenant_id == selected)
                .collect(),
            None => tenants.iter().collect(),
        }
    }

    /// Marketplace tenants visible to the dashboard, same filtering rule.
    #[must_use]
    pub fn visible_marketplace_tenants<'a>(
        &self,
        tenants: &'a [MarketplaceTenant],
    ) -> Vec<&'a MarketplaceTenant> {
        match &self.selected_tenant {
            Some(selected) => tenants
                .iter()
                .filter(|tenant| &tenant.tenant_id == selected)
                .collect(),
            None => tenants.iter().collect(),
        }
    }

    /// Whether the dashboard shows the aggregate (all tenants) cards.
    #[must_use]
    pub const fn is_aggregated(&self) -> bool {
        self.selected_tenant.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_view_name_ignored() {
        let mut view = ViewState::default();
        view.change_view("orders");
        assert_eq!(view.active_view, ActiveView::Orders);

        view.change_view("billing");
        assert_eq!(view.active_view, ActiveView::Orders);

        view.change_view("");
        assert_eq!(view.active_view, ActiveView::Orders);
    }

    #[test]
    fn test_state_chip_jumps_to_orders_and_resets_pager() {
        let mut view = ViewState::default();
        view.table.server.page = 6;

        view.select_order_state(Some(OrderState::Error));
        assert_eq!(view.active_view, ActiveView::Orders);
        assert_eq!(view.selected_state, Some(OrderState::Error));
        assert_eq!(view.table.server.page, 1);
    }

    #[test]
    fn test_reselecting_same_state_keeps_page() {
        let mut view = ViewState::default();
        view.select_order_state(Some(OrderState::Error));
        view.table.server.page = 3;

        view.select_order_state(Some(OrderState::Error));
        assert_eq!(view.table.server.page, 3);
    }

    #[test]
    fn test_row_click_and_close_details() {
        let mut view = ViewState::default();
        view.change_view("orders");

        view.select_order(OrderId::new("o-55"));
        assert_eq!(view.active_view, ActiveView::OrderDetails);
        assert_eq!(view.selected_order, Some(OrderId::new("o-55")));

        view.close_details();
        assert_eq!(view.active_view, ActiveView::Orders);
        assert_eq!(view.selected_order, None);
    }

    #[test]
    fn test_tenant_change_resets_server_page() {
        let mut view = ViewState::default();
        view.table.server.page = 4;
        view.select_tenant(Some(TenantId::new("paris")));
        assert_eq!(view.table.server.page, 1);

        view.table.server.page = 2;
        view.select_tenant(Some(TenantId::new("paris")));
        assert_eq!(view.table.server.page, 2);
    }

    #[test]
    fn test_visible_tenants_filtering() {
        let tenants = vec![
            TenantStates {
                tenant_id: TenantId::new("a"),
                tenant_name: "A".to_string(),
                states: vec![],
                total: 1,
            },
            TenantStates {
                tenant_id: TenantId::new("b"),
                tenant_name: "B".to_string(),
                states: vec![],
                total: 2,
            },
        ];

        let mut view = ViewState::default();
        assert_eq!(view.visible_tenants(&tenants).len(), 2);
        assert!(view.is_aggregated());

        view.select_tenant(Some(TenantId::new("b")));
        let visible = view.visible_tenants(&tenants);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].tenant_name, "B");
        assert!(!view.is_aggregated());
    }
}
