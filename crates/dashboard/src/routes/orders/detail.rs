//! Order detail page: the six backend-assembled panels.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use middify_core::{format, Money, OrderId};

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::middify::types::{
    Address, LineItemsPanel, OrderDetails, RawOrder, SummaryPanel,
};
use crate::state::AppState;

use super::super::{build_shell, load_view, save_view, Shell};

/// A label/value pair for the info grids.
#[derive(Debug, Clone)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

/// One line item, zipped out of the panel's parallel arrays.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub name: String,
    pub brand: String,
    pub quantity: String,
    pub unit_price: String,
    pub pay_price: String,
    pub delivery_price: String,
}

/// One address block in the shipping panel.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub title: String,
    pub lines: Vec<LabeledValue>,
}

/// The shipping panel.
#[derive(Debug, Clone)]
pub struct ShippingView {
    pub date: String,
    pub cost: String,
    pub addresses: Vec<AddressView>,
}

/// One issued document.
#[derive(Debug, Clone)]
pub struct DocumentView {
    pub name: String,
    pub doc_type: String,
    pub status: String,
    pub url: Option<String>,
    pub creation: String,
    pub last_update: String,
}

/// One processing stage.
#[derive(Debug, Clone)]
pub struct StageView {
    pub name: String,
    pub completed: bool,
}

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub shell: Shell,
    pub order_id: String,
    pub error: Option<String>,
    pub has_panels: bool,
    pub summary: Vec<LabeledValue>,
    pub items: Vec<ItemView>,
    pub shipping: Option<ShippingView>,
    pub customer: Vec<LabeledValue>,
    pub documents: Vec<DocumentView>,
    pub stages: Vec<StageView>,
}

/// Text rendering for loosely-typed wire values (strings or numbers).
fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => format::format_text(Some(text)),
        Some(Value::Number(number)) => number
            .to_string()
            .parse::<Decimal>()
            .map_or_else(|_| format::NO_DATA.to_string(), format::format_number),
        _ => format::NO_DATA.to_string(),
    }
}

fn money_text(money: Option<&Money>) -> String {
    money.map_or_else(|| format::NO_DATA.to_string(), Money::display)
}

fn labeled(label: &str, value: String) -> LabeledValue {
    LabeledValue {
        label: label.to_string(),
        value,
    }
}

/// The twelve summary fields, in display order.
fn summary_rows(panel: &SummaryPanel, order_id: &str) -> Vec<LabeledValue> {
    vec![
        labeled(
            "Orden marketplace",
            format::format_text(
                panel
                    .order_id
                    .as_deref()
                    .or(panel.market_order_id.as_deref()),
            ),
        ),
        labeled("ID interno", format::format_text(Some(order_id))),
        labeled(
            "Marketplace",
            format::format_text(panel.marketplace_name.as_deref()),
        ),
        labeled(
            "Estado (Middify)",
            format::format_text(panel.status_order.as_deref()),
        ),
        labeled(
            "Estado original",
            format::format_text(panel.status.as_deref()),
        ),
        labeled("Intentos", format::format_count(panel.attempts)),
        labeled("Mensaje", format::format_text(panel.message.as_deref())),
        labeled(
            "Creación",
            format::format_datetime_or_no_data(panel.creation.as_deref()),
        ),
        labeled(
            "Última actualización",
            format::format_datetime_or_no_data(panel.last_update.as_deref()),
        ),
        labeled(
            "Error reportado",
            format::format_text(
                panel
                    .error_detail
                    .as_ref()
                    .and_then(|detail| detail.message.as_deref()),
            ),
        ),
        labeled("Subtotal", money_text(panel.sub_total.as_ref())),
        labeled("Total", money_text(panel.total.as_ref())),
    ]
}

/// Zip the parallel item arrays by index.
///
/// The item count is the maximum of the name/brand/quantity/unit-price array
/// lengths (the backend's own convention); missing positions render as
/// "Sin datos".
fn item_views(panel: &LineItemsPanel) -> Vec<ItemView> {
    let count = panel
        .name
        .len()
        .max(panel.brand.len())
        .max(panel.quantity.len())
        .max(panel.unit_price.len());

    (0..count)
        .map(|index| ItemView {
            name: value_text(panel.name.get(index)),
            brand: value_text(panel.brand.get(index)),
            quantity: format::format_count(panel.quantity.get(index).copied().flatten()),
            unit_price: money_text(panel.unit_price.get(index).and_then(Option::as_ref)),
            pay_price: money_text(panel.pay_price.get(index).and_then(Option::as_ref)),
            delivery_price: money_text(
                panel.delivery_price.get(index).and_then(Option::as_ref),
            ),
        })
        .collect()
}

fn address_view(title: String, address: &Address) -> AddressView {
    AddressView {
        title,
        lines: vec![
            labeled(
                "Código postal",
                format::format_text(address.zip_code.as_deref()),
            ),
            labeled("País", format::format_text(address.country.as_deref())),
            labeled("Región", format::format_text(address.region.as_deref())),
            labeled(
                "Provincia",
                format::format_text(address.province.as_deref()),
            ),
            labeled(
                "Municipalidad",
                format::format_text(address.municipality.as_deref()),
            ),
            labeled("Ciudad", format::format_text(address.city.as_deref())),
            labeled("Dirección 1", format::format_text(address.line1.as_deref())),
            labeled("Dirección 2", format::format_text(address.line2.as_deref())),
            labeled(
                "Persona contacto",
                format::format_text(address.contact_person.as_deref()),
            ),
            labeled(
                "Teléfono contacto",
                format::format_text(address.contact_phone.as_deref()),
            ),
        ],
    }
}

fn block_title(base: &str, index: usize, count: usize) -> String {
    if count > 1 {
        format!("{base} {}", index + 1)
    } else {
        base.to_string()
    }
}

fn build_views(
    details: &OrderDetails,
    order_id: &str,
) -> (
    Vec<LabeledValue>,
    Vec<ItemView>,
    Option<ShippingView>,
    Vec<LabeledValue>,
    Vec<DocumentView>,
    Vec<StageView>,
) {
    let summary = details
        .summary
        .as_ref()
        .map(|panel| summary_rows(panel, order_id))
        .unwrap_or_default();

    let items = details.items.as_ref().map(item_views).unwrap_or_default();

    let shipping = details.shipping.as_ref().map(|panel| {
        let date = panel
            .cost
            .as_ref()
            .and_then(|cost| cost.date.as_deref())
            .or(panel.date.as_deref());
        let pickups = panel.pickup_addresses.len();
        let deliveries = panel.delivery_addresses.len();

        let mut addresses = Vec::with_capacity(pickups + deliveries);
        for (index, address) in panel.pickup_addresses.iter().enumerate() {
            addresses.push(address_view(
                block_title("Dirección de retiro", index, pickups),
                address,
            ));
        }
        for (index, address) in panel.delivery_addresses.iter().enumerate() {
            addresses.push(address_view(
                block_title("Dirección de entrega", index, deliveries),
                address,
            ));
        }

        ShippingView {
            date: format::format_datetime_or_no_data(date),
            cost: money_text(panel.cost.as_ref().map(|cost| &cost.money)),
            addresses,
        }
    });

    let customer = details
        .customer
        .as_ref()
        .map(|panel| {
            vec![
                labeled("Documento", value_text(panel.id_doc_no.as_ref())),
                labeled(
                    "Tipo documento",
                    format::format_text(panel.id_doc_type.as_deref()),
                ),
                labeled(
                    "Tipo persona",
                    format::format_text(panel.person_type.as_deref()),
                ),
                labeled(
                    "Razón social",
                    format::format_text(panel.business_name.as_deref()),
                ),
                labeled("Nombre", format::format_text(panel.name.as_deref())),
                labeled("Apellido", format::format_text(panel.last_name.as_deref())),
                labeled("Correo", format::format_text(panel.mail.as_deref())),
                labeled("Teléfono", value_text(panel.phone.as_ref())),
            ]
        })
        .unwrap_or_default();

    let documents = details
        .documents
        .as_ref()
        .map(|documents| {
            documents
                .iter()
                .map(|doc| DocumentView {
                    name: format::format_text(doc.name.as_deref()),
                    doc_type: format::format_text(doc.doc_type.as_deref()),
                    status: format::format_text(doc.status.as_deref()),
                    url: doc.url.clone(),
                    creation: format::format_datetime_or_no_data(doc.creation.as_deref()),
                    last_update: format::format_datetime_or_no_data(doc.last_update.as_deref()),
                })
                .collect()
        })
        .unwrap_or_default();

    let stages = details
        .stages
        .as_ref()
        .map(|panel| {
            panel
                .stages
                .iter()
                .map(|stage| StageView {
                    name: format::format_text(stage.name.as_deref()),
                    completed: stage.is_completed,
                })
                .collect()
        })
        .unwrap_or_default();

    (summary, items, shipping, customer, documents, stages)
}

/// Synthesize a summary panel from a cached raw order.
///
/// Shown when the details fetch fails: the raw order carries enough for the
/// summary; the remaining panels stay empty.
pub(crate) fn fallback_details(order: &RawOrder) -> OrderDetails {
    let marketplace = order.marketplace.as_ref();

    OrderDetails {
        summary: Some(SummaryPanel {
            order_id: marketplace.and_then(|m| m.order_id.clone()),
            market_order_id: marketplace.and_then(|m| m.market_order_id.clone()),
            marketplace_name: marketplace
                .and_then(|m| m.name.clone())
                .or_else(|| order.owning_tenant_name().map(str::to_string)),
            creation: marketplace
                .and_then(|m| m.creation.clone())
                .or_else(|| order.creation.clone()),
            last_update: marketplace
                .and_then(|m| m.last_update.clone())
                .or_else(|| order.last_update.clone()),
            status: marketplace
                .and_then(|m| m.status.clone())
                .or_else(|| order.status.clone()),
            status_order: order
                .status
                .clone()
                .or_else(|| marketplace.and_then(|m| m.status.clone())),
            attempts: marketplace.and_then(|m| m.attempts),
            message: order.message.clone(),
            error_detail: marketplace.and_then(|m| m.error_detail.clone()),
            sub_total: marketplace.and_then(|m| m.sub_total.clone()),
            total: marketplace
                .and_then(|m| m.total.clone())
                .or_else(|| order.total.clone()),
        }),
        ..OrderDetails::default()
    }
}

/// Order detail page handler.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn show(
    RequireAuth(token): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let order_id = OrderId::new(id);

    let mut view = load_view(&session).await;
    view.select_order(order_id.clone());

    let shell = build_shell(&state, &token, &view).await;
    save_view(&session, &view).await?;

    let (details, error) = match state.orders().details(Some(&token), &order_id).await {
        Ok(details) => ((*details).clone(), None),
        Err(engine_error) => {
            tracing::warn!(error = %engine_error, "order details fetch failed");
            (None, Some(engine_error.to_string()))
        }
    };

    // Fall back to whatever the table caches still know about the order.
    let resolved = details.or_else(|| {
        state
            .orders()
            .cached_order(order_id.as_str())
            .map(|order| fallback_details(&order))
    });

    let has_panels = resolved.is_some();
    let (summary, items, shipping, customer, documents, stages) = resolved
        .as_ref()
        .map(|details| build_views(details, order_id.as_str()))
        .unwrap_or_default();

    let template = OrderDetailTemplate {
        shell,
        order_id: order_id.into_inner(),
        error,
        has_panels,
        summary,
        items,
        shipping,
        customer,
        documents,
        stages,
    };

    Ok(Html(template.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_views_use_max_of_four_lengths() {
        let panel: LineItemsPanel = serde_json::from_str(
            r#"{
                "name": ["Polera", "Pantalón"],
                "brand": ["ACME"],
                "quantity": [1, 2, 3],
                "unitPrice": [{"amount": 9990}],
                "payPrice": [],
                "deliveryPrice": [{"amount": 0}, null, {"amount": 500}, {"amount": 1}]
            }"#,
        )
        .expect("panel");

        let items = item_views(&panel);
        // deliveryPrice's 4 entries do not extend the item count.
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Polera");
        assert_eq!(items[0].unit_price, "$9.990");
        assert_eq!(items[1].brand, "Sin datos");
        assert_eq!(items[2].quantity, "3");
        assert_eq!(items[1].pay_price, "Sin datos");
    }

    #[test]
    fn test_summary_rows_order_and_fallbacks() {
        let panel: SummaryPanel = serde_json::from_str(
            r#"{
                "idOrdenMarket": "MKT-55",
                "statusOrder": "error",
                "total": {"amount": 45000}
            }"#,
        )
        .expect("panel");

        let rows = summary_rows(&panel, "65fa0");
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].label, "Orden marketplace");
        assert_eq!(rows[0].value, "MKT-55");
        assert_eq!(rows[1].value, "65fa0");
        assert_eq!(rows[3].value, "error");
        assert_eq!(rows[11].value, "$45.000");
        assert_eq!(rows[6].value, "Sin datos");
    }

    #[test]
    fn test_fallback_details_prefers_marketplace_fields() {
        let order: RawOrder = serde_json::from_str(
            r#"{
                "_id": "o9",
                "status": "error",
                "message": "sin stock",
                "creation": "2024-05-01T10:00:00Z",
                "marketPlace": {
                    "orderId": "FAL-1",
                    "nombre": "falabella",
                    "status": "rejected",
                    "creation": "2024-05-02T11:00:00Z",
                    "total": {"amount": 1000}
                }
            }"#,
        )
        .expect("order");

        let details = fallback_details(&order);
        let summary = details.summary.expect("summary");
        assert_eq!(summary.order_id.as_deref(), Some("FAL-1"));
        assert_eq!(summary.status.as_deref(), Some("rejected"));
        assert_eq!(summary.status_order.as_deref(), Some("error"));
        assert_eq!(summary.creation.as_deref(), Some("2024-05-02T11:00:00Z"));
        assert_eq!(summary.message.as_deref(), Some("sin stock"));
        assert!(details.items.is_none());
    }

    #[test]
    fn test_value_text_handles_numbers_and_strings() {
        assert_eq!(value_text(Some(&Value::String("  RUT-9 ".into()))), "RUT-9");
        assert_eq!(
            value_text(Some(&serde_json::json!(56912345678_u64))),
            "56.912.345.678"
        );
        assert_eq!(value_text(Some(&Value::Null)), "Sin datos");
        assert_eq!(value_text(None), "Sin datos");
    }
}
