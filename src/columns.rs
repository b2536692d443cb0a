//! Canonical inventory columns and the mapping layer for localized headers.
//!
//! Internally every component talks about the four canonical columns (`name`, `category`,
//! `quantity`, `unit_price`). Source files may use other display names (the French fixtures
//! use `Nom du Produit`, `Catégorie`, ...); a [`ColumnMapping`] translates those headers into
//! canonical columns.

use std::fmt;

use crate::error::{StockError, StockResult};
use crate::types::{DataType, Field, Schema};

/// One of the four canonical inventory columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InventoryColumn {
    Name,
    Category,
    Quantity,
    UnitPrice,
}

impl InventoryColumn {
    /// All canonical columns, in canonical schema order.
    pub const ALL: [InventoryColumn; 4] = [
        InventoryColumn::Name,
        InventoryColumn::Category,
        InventoryColumn::Quantity,
        InventoryColumn::UnitPrice,
    ];

    /// Canonical (English) column name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Quantity => "quantity",
            Self::UnitPrice => "unit_price",
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            Self::Name | Self::Category => DataType::Utf8,
            Self::Quantity => DataType::Int64,
            Self::UnitPrice => DataType::Float64,
        }
    }
}

impl fmt::Display for InventoryColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The canonical inventory schema: `name, category, quantity, unit_price`.
pub fn inventory_schema() -> Schema {
    Schema::new(
        InventoryColumn::ALL
            .iter()
            .map(|c| Field::new(c.name(), c.data_type()))
            .collect(),
    )
}

/// Maps display names found in source headers to canonical columns.
///
/// Matching is exact on the trimmed header text. The default mapping accepts the canonical
/// English names plus the French display names used by the legacy fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    aliases: Vec<(String, InventoryColumn)>,
}

impl ColumnMapping {
    /// A mapping that only accepts the canonical column names.
    pub fn canonical() -> Self {
        Self {
            aliases: InventoryColumn::ALL
                .iter()
                .map(|c| (c.name().to_string(), *c))
                .collect(),
        }
    }

    /// Add an alias for `column`. Later aliases never shadow earlier ones.
    pub fn with_alias(mut self, display_name: impl Into<String>, column: InventoryColumn) -> Self {
        self.aliases.push((display_name.into(), column));
        self
    }

    /// Canonical names plus the French display names.
    pub fn localized() -> Self {
        Self::canonical()
            .with_alias("Nom du Produit", InventoryColumn::Name)
            .with_alias("Produit", InventoryColumn::Name)
            .with_alias("Catégorie", InventoryColumn::Category)
            .with_alias("Quantité", InventoryColumn::Quantity)
            .with_alias("Prix Unitaire", InventoryColumn::UnitPrice)
    }

    /// Resolve a header to a canonical column.
    pub fn resolve(&self, header: &str) -> Option<InventoryColumn> {
        let header = header.trim();
        self.aliases
            .iter()
            .find(|(alias, _)| alias == header)
            .map(|(_, column)| *column)
    }

    /// Locate every canonical column within `headers`.
    ///
    /// The first header resolving to a column wins. Fails with [`StockError::SchemaViolation`]
    /// listing the canonical names that could not be found.
    pub fn locate<'a, I>(&self, headers: I) -> StockResult<ColumnIndex>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found: [Option<usize>; 4] = [None; 4];
        for (idx, header) in headers.into_iter().enumerate() {
            if let Some(column) = self.resolve(header) {
                let slot = &mut found[slot_of(column)];
                if slot.is_none() {
                    *slot = Some(idx);
                }
            }
        }

        match found {
            [Some(name), Some(category), Some(quantity), Some(unit_price)] => Ok(ColumnIndex {
                name,
                category,
                quantity,
                unit_price,
            }),
            _ => Err(StockError::SchemaViolation {
                missing: InventoryColumn::ALL
                    .iter()
                    .zip(found.iter())
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(c, _)| c.name().to_string())
                    .collect(),
            }),
        }
    }

    /// Shorthand for [`Self::locate`] over a schema's field names.
    pub fn locate_in(&self, schema: &Schema) -> StockResult<ColumnIndex> {
        self.locate(schema.field_names())
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::localized()
    }
}

fn slot_of(column: InventoryColumn) -> usize {
    match column {
        InventoryColumn::Name => 0,
        InventoryColumn::Category => 1,
        InventoryColumn::Quantity => 2,
        InventoryColumn::UnitPrice => 3,
    }
}

/// Positions of the canonical columns within a particular schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub name: usize,
    pub category: usize,
    pub quantity: usize,
    pub unit_price: usize,
}

impl ColumnIndex {
    pub fn get(&self, column: InventoryColumn) -> usize {
        match column {
            InventoryColumn::Name => self.name,
            InventoryColumn::Category => self.category,
            InventoryColumn::Quantity => self.quantity,
            InventoryColumn::UnitPrice => self.unit_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnMapping, InventoryColumn, inventory_schema};
    use crate::error::StockError;

    #[test]
    fn inventory_schema_is_in_canonical_order() {
        let schema = inventory_schema();
        let names: Vec<&str> = schema.field_names().collect();
        assert_eq!(names, vec!["name", "category", "quantity", "unit_price"]);
    }

    #[test]
    fn localized_mapping_resolves_french_headers() {
        let mapping = ColumnMapping::localized();
        let idx = mapping
            .locate(["Nom du Produit", "Quantité", "Prix Unitaire", "Catégorie"])
            .unwrap();
        assert_eq!(idx.name, 0);
        assert_eq!(idx.quantity, 1);
        assert_eq!(idx.unit_price, 2);
        assert_eq!(idx.category, 3);
        assert_eq!(mapping.resolve(" Produit "), Some(InventoryColumn::Name));
    }

    #[test]
    fn canonical_mapping_reports_missing_columns() {
        let err = ColumnMapping::canonical()
            .locate(["name", "Catégorie", "quantity"])
            .unwrap_err();
        match err {
            StockError::SchemaViolation { missing } => {
                assert_eq!(missing, vec!["category".to_string(), "unit_price".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
