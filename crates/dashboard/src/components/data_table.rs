//! Data table configuration types.

use serde::{Deserialize, Serialize};

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Whether cells in this column are right-aligned (numeric columns).
    pub numeric: bool,
}

impl TableColumn {
    /// Create a new column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            numeric: false,
        }
    }

    /// Mark the column as numeric (right-aligned).
    #[must_use]
    pub const fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }
}

/// Configuration for the orders table.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Data table ID.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
}

/// Column set for the orders table.
#[must_use]
pub fn orders_table_config() -> TableConfig {
    TableConfig {
        table_id: "orders".to_string(),
        columns: vec![
            TableColumn::new("marketplace_order", "Orden"),
            TableColumn::new("tenant", "Tienda"),
            TableColumn::new("status", "Estado"),
            TableColumn::new("message", "Mensaje"),
            TableColumn::new("creation", "Creación"),
            TableColumn::new("last_update", "Actualización"),
            TableColumn::new("total", "Total").numeric(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_table_columns() {
        let config = orders_table_config();
        assert_eq!(config.columns.len(), 7);
        assert_eq!(config.columns[0].label, "Orden");
        assert!(config.columns[6].numeric);
    }
}
