//! Display-row derivation for the orders table.

use middify_core::format::{self, DASH};
use middify_core::{Money, OrderState};

use crate::middify::types::RawOrder;

/// One flattened, display-ready table row.
///
/// Every field is preformatted; templates render these verbatim. `row_id` is
/// synthesized to stay unique even when backend ids collide or are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub row_id: String,
    pub marketplace_order: String,
    pub internal_id: String,
    pub tenant_name: String,
    pub tenant_code: String,
    pub status_label: String,
    pub message: String,
    pub creation: String,
    pub last_update: String,
    pub total: String,
}

/// Table rendering of an optional money amount (always CLP in the table).
fn format_table_total(amount: Option<rust_decimal::Decimal>) -> String {
    amount.map_or_else(
        || DASH.to_string(),
        |value| Money::clp(value).display(),
    )
}

/// Flatten one raw order into its display row.
///
/// `index` is the order's position in the current row set; it backs the
/// synthesized fallbacks for missing ids.
#[must_use]
pub fn build_row(order: &RawOrder, index: usize) -> OrderRow {
    let order_id = order
        .internal_id()
        .map_or_else(|| format!("order-{index}"), str::to_string);
    let tenant_code = order.owning_tenant_id().unwrap_or_default().to_string();
    let row_id = if tenant_code.is_empty() {
        format!("{order_id}-{index}")
    } else {
        format!("{order_id}-{tenant_code}")
    };

    let marketplace = order.marketplace.as_ref();

    let status_label = order
        .status
        .as_deref()
        .map(|raw| {
            OrderState::label_for(raw).map_or_else(|| raw.to_string(), str::to_string)
        })
        .unwrap_or_else(|| DASH.to_string());

    let creation = marketplace
        .and_then(|m| m.creation.as_deref())
        .or(order.creation.as_deref());
    let last_update = marketplace
        .and_then(|m| m.last_update.as_deref())
        .or(order.last_update.as_deref());

    let total_amount = order
        .total
        .as_ref()
        .and_then(|money| money.amount)
        .or_else(|| {
            marketplace
                .and_then(|m| m.total.as_ref())
                .and_then(|money| money.amount)
        });

    OrderRow {
        row_id,
        marketplace_order: marketplace
            .and_then(|m| m.order_id.clone())
            .unwrap_or_else(|| DASH.to_string()),
        internal_id: order_id,
        tenant_name: order
            .owning_tenant_name()
            .unwrap_or(DASH)
            .to_string(),
        tenant_code: if tenant_code.is_empty() {
            DASH.to_string()
        } else {
            tenant_code
        },
        status_label,
        message: order.message.clone().unwrap_or_else(|| DASH.to_string()),
        creation: format::format_datetime_or_raw(creation),
        last_update: format::format_datetime_or_raw(last_update),
        total: format_table_total(total_amount),
    }
}

/// Flatten a slice of raw orders into display rows.
#[must_use]
pub fn build_rows(orders: &[RawOrder]) -> Vec<OrderRow> {
    orders
        .iter()
        .enumerate()
        .map(|(index, order)| build_row(order, index))
        .collect()
}

/// Case-insensitive substring match of an order's canonical JSON text.
///
/// `term` must already be trimmed and lowercased.
#[must_use]
pub fn matches_search(order: &RawOrder, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    order.canonical_text().to_lowercase().contains(term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(json: &str) -> RawOrder {
        serde_json::from_str(json).expect("order fixture")
    }

    #[test]
    fn test_row_ids_distinct_for_same_order_id_across_tenants() {
        let a = order(r#"{"_id":"o1","tennantId":"falabella"}"#);
        let b = order(r#"{"_id":"o1","tennantId":"paris"}"#);
        let row_a = build_row(&a, 0);
        let row_b = build_row(&b, 1);
        assert_ne!(row_a.row_id, row_b.row_id);
        assert_eq!(row_a.row_id, "o1-falabella");
        assert_eq!(row_b.row_id, "o1-paris");
    }

    #[test]
    fn test_missing_ids_fall_back_to_index() {
        let row = build_row(&order("{}"), 4);
        assert_eq!(row.internal_id, "order-4");
        assert_eq!(row.row_id, "order-4-4");
        assert_eq!(row.tenant_code, "—");
    }

    #[test]
    fn test_status_label_lookup_and_fallbacks() {
        let row = build_row(&order(r#"{"_id":"o1","status":"en proceso"}"#), 0);
        assert_eq!(row.status_label, "En proceso");

        let row = build_row(&order(r#"{"_id":"o1","status":"rarisimo"}"#), 0);
        assert_eq!(row.status_label, "rarisimo");

        let row = build_row(&order(r#"{"_id":"o1"}"#), 0);
        assert_eq!(row.status_label, "—");
    }

    #[test]
    fn test_marketplace_dates_preferred() {
        let row = build_row(
            &order(
                r#"{"_id":"o1",
                    "creation":"2024-01-01T00:00:00Z",
                    "marketPlace":{"creation":"2024-02-02T10:30:00Z"}}"#,
            ),
            0,
        );
        assert_eq!(row.creation, "02-02-2024 10:30");
    }

    #[test]
    fn test_order_total_preferred_over_marketplace_total() {
        let row = build_row(
            &order(
                r#"{"_id":"o1",
                    "total":{"amount":1000},
                    "marketPlace":{"total":{"amount":9}}}"#,
            ),
            0,
        );
        assert_eq!(row.total, "$1.000");

        let row = build_row(
            &order(r#"{"_id":"o1","marketPlace":{"total":{"amount":2500}}}"#),
            0,
        );
        assert_eq!(row.total, "$2.500");

        let row = build_row(&order(r#"{"_id":"o1"}"#), 0);
        assert_eq!(row.total, "—");
    }

    #[test]
    fn test_search_matches_any_field_including_unknown() {
        let fixture = order(r#"{"_id":"o1","message":"Factura rechazada","folio":"F-778"}"#);
        assert!(matches_search(&fixture, "factura"));
        assert!(matches_search(&fixture, "f-778"));
        assert!(!matches_search(&fixture, "boleta"));
        assert!(matches_search(&fixture, ""));
    }
}
