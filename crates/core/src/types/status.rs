//! The Middify order-state vocabulary.
//!
//! States travel in three spellings that must never be confused:
//! - slug form used in URLs and selection state (`en_proceso`),
//! - the space-separated form the backend query expects (`en proceso`),
//! - the human label shown in views (`En proceso`).

use serde::{Deserialize, Serialize};

/// Lifecycle state of a Middify order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Ingresada,
    Pendiente,
    Procesada,
    Error,
    EnProceso,
    Descartada,
}

impl OrderState {
    /// All states in dashboard display order.
    pub const ALL: [Self; 6] = [
        Self::Ingresada,
        Self::Pendiente,
        Self::Procesada,
        Self::Error,
        Self::EnProceso,
        Self::Descartada,
    ];

    /// Slug form (`en_proceso`), used in URLs and session state.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Ingresada => "ingresada",
            Self::Pendiente => "pendiente",
            Self::Procesada => "procesada",
            Self::Error => "error",
            Self::EnProceso => "en_proceso",
            Self::Descartada => "descartada",
        }
    }

    /// The value the backend's `status` query parameter expects
    /// (slug with underscores replaced by spaces).
    #[must_use]
    pub const fn query_value(self) -> &'static str {
        match self {
            Self::EnProceso => "en proceso",
            other => other.slug(),
        }
    }

    /// Human label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ingresada => "Ingresada",
            Self::Pendiente => "Pendiente",
            Self::Procesada => "Procesada",
            Self::Error => "Error",
            Self::EnProceso => "En proceso",
            Self::Descartada => "Descartada",
        }
    }

    /// Parse the slug form. Unknown slugs are rejected, not defaulted.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.slug() == slug)
    }

    /// Collapse a raw backend status string into slug form:
    /// lowercased, whitespace runs folded to a single underscore.
    #[must_use]
    pub fn normalize_key(raw: &str) -> String {
        raw.trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Label for a raw backend status string, when it names a known state.
    #[must_use]
    pub fn label_for(raw: &str) -> Option<&'static str> {
        Self::from_slug(&Self::normalize_key(raw)).map(Self::label)
    }

    /// Label for a state filter selection (`None` = all states).
    #[must_use]
    pub fn selected_label(state: Option<Self>) -> &'static str {
        state.map_or("Todos los estados", Self::label)
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for state in OrderState::ALL {
            assert_eq!(OrderState::from_slug(state.slug()), Some(state));
        }
    }

    #[test]
    fn test_query_value_uses_spaces() {
        assert_eq!(OrderState::EnProceso.query_value(), "en proceso");
        assert_eq!(OrderState::Error.query_value(), "error");
    }

    #[test]
    fn test_label_for_raw_status() {
        assert_eq!(OrderState::label_for("en proceso"), Some("En proceso"));
        assert_eq!(OrderState::label_for("EN  PROCESO"), Some("En proceso"));
        assert_eq!(OrderState::label_for("pendiente"), Some("Pendiente"));
        assert_eq!(OrderState::label_for("desconocido"), None);
    }

    #[test]
    fn test_unknown_slug_rejected() {
        assert_eq!(OrderState::from_slug("enproceso"), None);
        assert_eq!(OrderState::from_slug(""), None);
    }

    #[test]
    fn test_selected_label() {
        assert_eq!(OrderState::selected_label(None), "Todos los estados");
        assert_eq!(
            OrderState::selected_label(Some(OrderState::Descartada)),
            "Descartada"
        );
    }
}
