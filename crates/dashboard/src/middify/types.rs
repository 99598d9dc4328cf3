//! Typed schemas for Middify backend responses.
//!
//! Wire structs mirror the backend's JSON field names (including the
//! `tennantId`/`tenantId` spelling drift) and keep unknown fields in a
//! flattened map so an order's canonical JSON text survives the round trip —
//! the search mode matches against that text. Fields the contract allows to
//! be absent default; anything structurally wrong fails deserialization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use middify_core::{Money, TenantId};

// =============================================================================
// Tenant order-states
// =============================================================================

/// One tenant with its per-state order counts (normalized).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantStates {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub states: Vec<StateCount>,
    pub total: u64,
}

/// A `{state, count}` pair in the order the backend reported it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCount {
    /// Raw state id as reported (`en proceso`, `error`, ...).
    pub id: String,
    pub count: u64,
}

/// Wire form of a tenant order-states entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WireTenantStates {
    #[serde(rename = "tenantId", default)]
    pub tenant_id: Option<String>,
    #[serde(rename = "tenantName", default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub states: Vec<WireStateCount>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Wire form of one state bucket: `{_id, count}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireStateCount {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub count: Option<Decimal>,
}

// =============================================================================
// Marketplace summary
// =============================================================================

/// One tenant with its marketplace order counts (normalized).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketplaceTenant {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub marketplaces: Vec<Marketplace>,
}

/// One marketplace under a tenant (normalized).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marketplace {
    pub id: String,
    pub name: String,
    pub count: u64,
    pub creation: Option<String>,
    pub last_update: Option<String>,
}

/// Wire form of a marketplace-summary tenant entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMarketplaceTenant {
    #[serde(rename = "tenantId", default)]
    pub tenant_id: Option<String>,
    #[serde(rename = "tenantName", default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub marketplaces: Vec<WireMarketplace>,
}

/// Wire form of one marketplace bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMarketplace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub count: Option<Decimal>,
    #[serde(default)]
    pub creation: Option<String>,
    #[serde(rename = "lastUpdate", default)]
    pub last_update: Option<String>,
}

// =============================================================================
// User profile
// =============================================================================

/// The signed-in operator, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

// =============================================================================
// Paged orders
// =============================================================================

/// The raw `orders-by-state` page envelope, passed through unmodified.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersPage {
    #[serde(default)]
    pub orders: Vec<RawOrder>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(rename = "pageSize", default)]
    pub page_size: Option<u32>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub ok: Option<bool>,
}

/// One order as stored by the backend. Never mutated client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrder {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub fallback_id: Option<String>,
    #[serde(rename = "tennantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id_alt: Option<String>,
    #[serde(rename = "tennantName", default, skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(rename = "tenantName", default, skip_serializing_if = "Option::is_none")]
    pub tenant_name_alt: Option<String>,
    #[serde(rename = "marketPlace", default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<MarketplaceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<String>,
    #[serde(rename = "lastUpdate", default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
    /// Fields outside the typed contract, kept so canonical-text search sees
    /// the whole order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawOrder {
    /// The order's internal id: `_id`, then `id`.
    #[must_use]
    pub fn internal_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.fallback_id.as_deref())
    }

    /// The owning tenant id, tolerating both wire spellings.
    #[must_use]
    pub fn owning_tenant_id(&self) -> Option<&str> {
        self.tenant_id
            .as_deref()
            .or(self.tenant_id_alt.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// The owning tenant display name, tolerating both wire spellings.
    #[must_use]
    pub fn owning_tenant_name(&self) -> Option<&str> {
        self.tenant_name.as_deref().or(self.tenant_name_alt.as_deref())
    }

    /// Canonical JSON text used for client-side search matching.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The marketplace sub-object nested in an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceInfo {
    #[serde(rename = "orderId", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(rename = "idOrdenMarket", default, skip_serializing_if = "Option::is_none")]
    pub market_order_id: Option<String>,
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<String>,
    #[serde(rename = "lastUpdate", default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Decimal>,
    #[serde(rename = "errorDetail", default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,
    #[serde(rename = "subTotal", default, skip_serializing_if = "Option::is_none")]
    pub sub_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Money>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error detail reported by the marketplace integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Order details
// =============================================================================

/// Per-order detail payload: six backend-assembled panels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(rename = "panel_1", default)]
    pub summary: Option<SummaryPanel>,
    #[serde(rename = "panel_2", default)]
    pub items: Option<LineItemsPanel>,
    #[serde(rename = "panel_3", default)]
    pub shipping: Option<ShippingPanel>,
    #[serde(rename = "panel_4", default)]
    pub customer: Option<CustomerPanel>,
    #[serde(rename = "panel_5", default)]
    pub documents: Option<Vec<DocumentEntry>>,
    #[serde(rename = "panel_6", default)]
    pub stages: Option<StagesPanel>,
}

/// Order summary panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryPanel {
    #[serde(rename = "orderId", default)]
    pub order_id: Option<String>,
    #[serde(rename = "idOrdenMarket", default)]
    pub market_order_id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub marketplace_name: Option<String>,
    #[serde(default)]
    pub creation: Option<String>,
    #[serde(rename = "lastUpdate", default)]
    pub last_update: Option<String>,
    /// Status as the marketplace reports it.
    #[serde(default)]
    pub status: Option<String>,
    /// Status in Middify's own vocabulary.
    #[serde(rename = "statusOrder", default)]
    pub status_order: Option<String>,
    #[serde(default)]
    pub attempts: Option<Decimal>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "errorDetail", default)]
    pub error_detail: Option<ErrorDetail>,
    #[serde(rename = "subTotal", default)]
    pub sub_total: Option<Money>,
    #[serde(default)]
    pub total: Option<Money>,
}

/// Line items as parallel arrays keyed by index: item N's attributes live at
/// index N of each array. The arrays may have unequal lengths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemsPanel {
    #[serde(default)]
    pub name: Vec<Value>,
    #[serde(default)]
    pub brand: Vec<Value>,
    #[serde(default)]
    pub quantity: Vec<Option<Decimal>>,
    #[serde(rename = "unitPrice", default)]
    pub unit_price: Vec<Option<Money>>,
    #[serde(rename = "payPrice", default)]
    pub pay_price: Vec<Option<Money>>,
    #[serde(rename = "deliveryPrice", default)]
    pub delivery_price: Vec<Option<Money>>,
}

/// Shipping panel: cost, date, and address blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingPanel {
    #[serde(default)]
    pub cost: Option<ShippingCost>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "pickupAddress", default)]
    pub pickup_addresses: Vec<Address>,
    #[serde(rename = "address", default)]
    pub delivery_addresses: Vec<Address>,
}

/// Shipping cost: money plus the shipment date the backend tucks inside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingCost {
    #[serde(flatten)]
    pub money: Money,
    #[serde(default)]
    pub date: Option<String>,
}

/// A shipping address block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "zipCode", default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(rename = "contactPerson", default)]
    pub contact_person: Option<String>,
    #[serde(rename = "contactPhone", default)]
    pub contact_phone: Option<String>,
}

/// Customer identity panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerPanel {
    #[serde(rename = "idDocNo", default)]
    pub id_doc_no: Option<Value>,
    #[serde(rename = "idDocType", default)]
    pub id_doc_type: Option<String>,
    #[serde(rename = "personType", default)]
    pub person_type: Option<String>,
    #[serde(rename = "businessName", default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub phone: Option<Value>,
}

/// One issued document (invoice, shipping label, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub creation: Option<String>,
    #[serde(rename = "lastUpdate", default)]
    pub last_update: Option<String>,
}

/// Processing stages panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagesPanel {
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// One processing stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
}

/// The order-details response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<OrderDetails>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error envelope some endpoints return alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorEnvelope {
    /// Best available failure message: `message`, then `error`.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_order_tolerates_both_tenant_spellings() {
        let order: RawOrder = serde_json::from_str(
            r#"{"_id":"o1","tennantId":"falabella","tennantName":"Falabella"}"#,
        )
        .expect("order");
        assert_eq!(order.internal_id(), Some("o1"));
        assert_eq!(order.owning_tenant_id(), Some("falabella"));
        assert_eq!(order.owning_tenant_name(), Some("Falabella"));

        let order: RawOrder =
            serde_json::from_str(r#"{"id":"o2","tenantId":"paris","tenantName":"Paris"}"#)
                .expect("order");
        assert_eq!(order.internal_id(), Some("o2"));
        assert_eq!(order.owning_tenant_id(), Some("paris"));
        assert_eq!(order.owning_tenant_name(), Some("Paris"));
    }

    #[test]
    fn test_empty_tenant_id_counts_as_absent() {
        let order: RawOrder =
            serde_json::from_str(r#"{"_id":"o1","tennantId":""}"#).expect("order");
        assert_eq!(order.owning_tenant_id(), None);
    }

    #[test]
    fn test_canonical_text_keeps_unknown_fields() {
        let order: RawOrder =
            serde_json::from_str(r#"{"_id":"o1","folio":"F-998"}"#).expect("order");
        let text = order.canonical_text();
        assert!(text.contains("F-998"));
        assert!(text.contains("o1"));
    }

    #[test]
    fn test_orders_page_defaults() {
        let page: OrdersPage = serde_json::from_str(r#"{"ok":true}"#).expect("page");
        assert!(page.orders.is_empty());
        assert_eq!(page.total, None);
        assert_eq!(page.ok, Some(true));
    }

    #[test]
    fn test_details_envelope_failure() {
        let env: DetailsEnvelope =
            serde_json::from_str(r#"{"success":false,"message":"no existe"}"#).expect("envelope");
        assert_eq!(env.success, Some(false));
        assert_eq!(env.message.as_deref(), Some("no existe"));
        assert!(env.data.is_none());
    }

    #[test]
    fn test_line_items_unequal_arrays_parse() {
        let items: LineItemsPanel = serde_json::from_str(
            r#"{"name":["Polera"],"brand":["ACME","OTRA"],"quantity":[2],"unitPrice":[{"amount":9990}]}"#,
        )
        .expect("items");
        assert_eq!(items.name.len(), 1);
        assert_eq!(items.brand.len(), 2);
        assert_eq!(items.pay_price.len(), 0);
    }
}
