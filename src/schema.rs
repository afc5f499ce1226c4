//! Schema model: tables, columns and foreign keys as introspected from the
//! database. Pure data, no behavior beyond lookups.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Free-form declared type label, "TEXT" when the database reports none.
    pub col_type: String,
    pub not_null: bool,
    pub is_primary_key: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Columns in introspection order. Callers re-sort copies for display;
    /// the stored order is never mutated.
    pub columns: Vec<Column>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All primary-key columns in stored order. Composite keys keep every
    /// member; a table with no primary key returns an empty list.
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }
}

/// A declared or inferred relationship between two columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaDef {
    pub tables: Vec<Table>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl SchemaDef {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, pk: bool) -> Column {
        Column {
            name: name.to_string(),
            col_type: "INTEGER".to_string(),
            not_null: pk,
            is_primary_key: pk,
            default_value: None,
        }
    }

    #[test]
    fn test_composite_primary_key_preserved() {
        let table = Table {
            name: "IfcRelAssociates".to_string(),
            columns: vec![col("ifc_id", true), col("GlobalId", true), col("Name", false)],
        };
        let pks: Vec<&str> = table
            .primary_key_columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(pks, vec!["ifc_id", "GlobalId"]);
    }

    #[test]
    fn test_table_lookup() {
        let schema = SchemaDef {
            tables: vec![Table {
                name: "IfcWall".to_string(),
                columns: vec![col("ifc_id", true)],
            }],
            foreign_keys: vec![],
        };
        assert!(schema.has_table("IfcWall"));
        assert!(!schema.has_table("IfcDoor"));
        assert_eq!(schema.table("IfcWall").unwrap().columns.len(), 1);
    }
}
