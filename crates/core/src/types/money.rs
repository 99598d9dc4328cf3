//! Money as it travels on the Middify wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::format;

/// Default currency when the backend omits the code.
pub const DEFAULT_CURRENCY: &str = "CLP";

/// A monetary value as returned by the backend: `{amount, currencyCode}`.
///
/// Both fields are optional on the wire; rendering treats an absent amount as
/// "Sin datos" rather than zero, so a missing total is never mistaken for a
/// free order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// ISO 4217 currency code (defaults to CLP when absent).
    #[serde(rename = "currencyCode", default)]
    pub currency_code: Option<String>,
}

impl Money {
    /// Build a money value with the default currency.
    #[must_use]
    pub const fn clp(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            currency_code: None,
        }
    }

    /// Render for display in es-CL conventions.
    ///
    /// CLP (and missing codes) render as `$1.000` — dot-grouped, no decimals.
    /// Other currencies render as `1.000 XXX` so the code stays visible.
    /// Missing amounts render as `Sin datos`.
    #[must_use]
    pub fn display(&self) -> String {
        let Some(amount) = self.amount else {
            return format::NO_DATA.to_string();
        };

        let code = self
            .currency_code
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CURRENCY);

        let grouped = format::format_integer_amount(amount);
        if code == DEFAULT_CURRENCY {
            format!("${grouped}")
        } else {
            format!("{grouped} {code}")
        }
    }
}
