//! Boundary normalization for Middify responses.
//!
//! Tenant-bearing responses arrive either as `{tenants: [...]}` or as a bare
//! array, may repeat tenant ids, and may omit ids and names entirely. The
//! rules here are the contract: first occurrence wins, missing ids become
//! `tenant_<index>`, missing names become "Sin nombre".

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use middify_core::TenantId;

use super::types::{
    Marketplace, MarketplaceTenant, StateCount, TenantStates, UserProfile, WireMarketplaceTenant,
    WireTenantStates,
};
use super::MiddifyError;

/// Display name used when a tenant or marketplace has none.
pub const UNNAMED: &str = "Sin nombre";

/// Extract the tenant list from a response that is either `{tenants: [...]}`
/// or a bare array.
///
/// # Errors
///
/// `Malformed` when neither shape matches or the entries do not deserialize.
pub fn tenants_payload<T: serde::de::DeserializeOwned>(
    body: Value,
) -> Result<Vec<T>, MiddifyError> {
    let list = match body {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("tenants") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(MiddifyError::Malformed(
                    "response has no array-typed `tenants` field and is not itself an array"
                        .to_string(),
                ));
            }
        },
        _ => {
            return Err(MiddifyError::Malformed(
                "response has no array-typed `tenants` field and is not itself an array"
                    .to_string(),
            ));
        }
    };

    list.into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| MiddifyError::Malformed(e.to_string()))
        })
        .collect()
}

/// The dedup key for a tenant entry: its id when it carries a non-empty one,
/// otherwise a synthetic key derived from the entry's position.
fn tenant_key(tenant_id: Option<&str>, index: usize) -> TenantId {
    tenant_id
        .filter(|id| !id.is_empty())
        .map_or_else(|| TenantId::new(format!("tenant_{index}")), TenantId::new)
}

fn count_to_u64(count: Option<Decimal>) -> u64 {
    count.and_then(|c| c.to_u64()).unwrap_or(0)
}

/// Normalize a tenant order-states list: dedup by id (first wins), synthesize
/// ids for entries without one.
#[must_use]
pub fn normalize_tenant_states(wire: Vec<WireTenantStates>) -> Vec<TenantStates> {
    let mut seen = HashSet::new();
    let mut tenants = Vec::with_capacity(wire.len());

    for (index, entry) in wire.into_iter().enumerate() {
        let tenant_id = tenant_key(entry.tenant_id.as_deref(), index);
        if !seen.insert(tenant_id.clone()) {
            continue;
        }

        let states = entry
            .states
            .into_iter()
            .map(|state| StateCount {
                id: state.id.unwrap_or_else(|| "Sin estado".to_string()),
                count: count_to_u64(state.count),
            })
            .collect();

        tenants.push(TenantStates {
            tenant_id,
            tenant_name: entry.tenant_name.unwrap_or_else(|| UNNAMED.to_string()),
            states,
            total: count_to_u64(entry.total),
        });
    }

    tenants
}

/// Normalize a marketplace-summary tenant list: same dedup rules, plus
/// per-marketplace defaults (`Sin nombre`, count 0, synthetic ids).
#[must_use]
pub fn normalize_marketplace_tenants(wire: Vec<WireMarketplaceTenant>) -> Vec<MarketplaceTenant> {
    let mut seen = HashSet::new();
    let mut tenants = Vec::with_capacity(wire.len());

    for (index, entry) in wire.into_iter().enumerate() {
        let tenant_id = tenant_key(entry.tenant_id.as_deref(), index);
        if !seen.insert(tenant_id.clone()) {
            continue;
        }

        let marketplaces = entry
            .marketplaces
            .into_iter()
            .enumerate()
            .map(|(marketplace_index, marketplace)| {
                let name = marketplace.name;
                Marketplace {
                    id: name.clone().unwrap_or_else(|| {
                        format!("marketplace-{tenant_id}-{marketplace_index}")
                    }),
                    name: name.unwrap_or_else(|| UNNAMED.to_string()),
                    count: count_to_u64(marketplace.count),
                    creation: marketplace.creation,
                    last_update: marketplace.last_update,
                }
            })
            .collect();

        tenants.push(MarketplaceTenant {
            tenant_id,
            tenant_name: entry.tenant_name.unwrap_or_else(|| UNNAMED.to_string()),
            marketplaces,
        });
    }

    tenants
}

/// Extract the user profile from `{data: {...}}` or a bare object.
///
/// # Errors
///
/// `Malformed` when the response carries no usable object.
pub fn user_profile_payload(body: Value) -> Result<UserProfile, MiddifyError> {
    let object = match body {
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Object(data)) => data,
            Some(_) | None => object,
        },
        _ => {
            return Err(MiddifyError::Malformed(
                "response does not contain a user object".to_string(),
            ));
        }
    };

    serde_json::from_value(Value::Object(object))
        .map_err(|e| MiddifyError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_tenants(value: Value) -> Vec<WireTenantStates> {
        tenants_payload(value).expect("tenant list")
    }

    #[test]
    fn test_payload_accepts_wrapped_and_bare() {
        let wrapped = wire_tenants(json!({"tenants": [{"tenantId": "a"}]}));
        assert_eq!(wrapped.len(), 1);

        let bare = wire_tenants(json!([{"tenantId": "a"}, {"tenantId": "b"}]));
        assert_eq!(bare.len(), 2);
    }

    #[test]
    fn test_payload_rejects_missing_tenants() {
        let err = tenants_payload::<WireTenantStates>(json!({"stores": []}))
            .expect_err("must reject");
        assert!(matches!(err, MiddifyError::Malformed(_)));

        let err = tenants_payload::<WireTenantStates>(json!("no")).expect_err("must reject");
        assert!(matches!(err, MiddifyError::Malformed(_)));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let tenants = normalize_tenant_states(wire_tenants(json!([
            {"tenantId": "a", "tenantName": "Primera", "total": 3},
            {"tenantId": "a", "tenantName": "Segunda", "total": 9},
            {"tenantId": "b", "tenantName": "Otra", "total": 1},
        ])));
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].tenant_name, "Primera");
        assert_eq!(tenants[0].total, 3);
        assert_eq!(tenants[1].tenant_id.as_str(), "b");
    }

    #[test]
    fn test_missing_id_synthesized_from_index() {
        let tenants = normalize_tenant_states(wire_tenants(json!([
            {"tenantId": "a"},
            {"tenantId": "b"},
            {},
        ])));
        assert_eq!(tenants.len(), 3);
        assert_eq!(tenants[2].tenant_id.as_str(), "tenant_2");
        assert_eq!(tenants[2].tenant_name, "Sin nombre");
    }

    #[test]
    fn test_empty_string_id_treated_as_missing() {
        let tenants = normalize_tenant_states(wire_tenants(json!([{"tenantId": ""}])));
        assert_eq!(tenants[0].tenant_id.as_str(), "tenant_0");
    }

    #[test]
    fn test_output_length_equals_distinct_keys() {
        let tenants = normalize_tenant_states(wire_tenants(json!([
            {"tenantId": "x"}, {"tenantId": "y"}, {"tenantId": "x"},
            {}, {"tenantId": "y"}, {},
        ])));
        // x, y, tenant_3, tenant_5
        assert_eq!(tenants.len(), 4);
    }

    #[test]
    fn test_state_counts_normalized() {
        let tenants = normalize_tenant_states(wire_tenants(json!([{
            "tenantId": "a",
            "states": [{"_id": "error", "count": 4}, {"count": 1}],
        }])));
        assert_eq!(tenants[0].states.len(), 2);
        assert_eq!(tenants[0].states[0].id, "error");
        assert_eq!(tenants[0].states[0].count, 4);
        assert_eq!(tenants[0].states[1].id, "Sin estado");
    }

    #[test]
    fn test_marketplace_defaults() {
        let wire: Vec<WireMarketplaceTenant> = tenants_payload(json!([{
            "tenantId": "a",
            "marketplaces": [
                {"name": "falabella", "count": 10},
                {"count": 2},
            ],
        }]))
        .expect("list");
        let tenants = normalize_marketplace_tenants(wire);
        let marketplaces = &tenants[0].marketplaces;
        assert_eq!(marketplaces[0].id, "falabella");
        assert_eq!(marketplaces[1].id, "marketplace-a-1");
        assert_eq!(marketplaces[1].name, "Sin nombre");
        assert_eq!(marketplaces[1].count, 2);
    }

    #[test]
    fn test_user_profile_wrapped_and_bare() {
        let wrapped = user_profile_payload(json!({"data": {"fullName": "Ana", "role": "admin"}}))
            .expect("profile");
        assert_eq!(wrapped.full_name.as_deref(), Some("Ana"));

        let bare =
            user_profile_payload(json!({"fullName": "Ana", "email": "ana@middify.cl"}))
                .expect("profile");
        assert_eq!(bare.email.as_deref(), Some("ana@middify.cl"));

        let err = user_profile_payload(json!([1, 2])).expect_err("must reject");
        assert!(matches!(err, MiddifyError::Malformed(_)));
    }
}
