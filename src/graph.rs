//! Graph mapping: a SchemaDef becomes generic nodes and edges with stable
//! identifiers and column-qualified anchor points.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::category::{categorize, Category};
use crate::schema::{SchemaDef, Table};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// The table name; globally unique.
    pub id: String,
    pub category: Category,
    pub table: Table,
    /// Owned by the layout engine and the layout store.
    pub position: Position,
}

impl GraphNode {
    pub fn new(table: Table) -> Self {
        Self {
            id: table.name.clone(),
            category: categorize(&table.name),
            table,
            position: Position::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    /// Deterministic id built from the four key fields plus an ordinal when
    /// the same tuple repeats.
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_anchor: String,
    pub target_anchor: String,
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Map a schema to nodes and edges. Exact duplicate key tuples collapse to
/// one edge; tuples differing in any column stay distinct.
pub fn to_graph(schema: &SchemaDef) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let nodes: Vec<GraphNode> = schema.tables.iter().cloned().map(GraphNode::new).collect();

    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut id_counts: HashMap<String, usize> = HashMap::new();
    let mut edges = Vec::new();

    for fk in &schema.foreign_keys {
        let tuple = (
            fk.from_table.clone(),
            fk.from_column.clone(),
            fk.to_table.clone(),
            fk.to_column.clone(),
        );
        if !seen.insert(tuple) {
            continue;
        }

        let base = format!(
            "{}-{}-{}-{}",
            sanitize(&fk.from_table),
            sanitize(&fk.from_column),
            sanitize(&fk.to_table),
            sanitize(&fk.to_column),
        );
        let ordinal = id_counts.entry(base.clone()).or_insert(0);
        let id = format!("{}-{}", base, ordinal);
        *ordinal += 1;

        edges.push(GraphEdge {
            id,
            source: fk.from_table.clone(),
            target: fk.to_table.clone(),
            source_anchor: format!("out-{}-{}", sanitize(&fk.from_table), sanitize(&fk.from_column)),
            target_anchor: format!("in-{}-{}", sanitize(&fk.to_table), sanitize(&fk.to_column)),
        });
    }

    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ForeignKey};

    fn table(name: &str, cols: &[&str]) -> Table {
        Table {
            name: name.to_string(),
            columns: cols
                .iter()
                .map(|c| Column {
                    name: c.to_string(),
                    col_type: "TEXT".to_string(),
                    not_null: false,
                    is_primary_key: false,
                    default_value: None,
                })
                .collect(),
        }
    }

    fn fk(from: &str, from_col: &str, to: &str, to_col: &str) -> ForeignKey {
        ForeignKey {
            from_table: from.to_string(),
            from_column: from_col.to_string(),
            to_table: to.to_string(),
            to_column: to_col.to_string(),
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("IfcWall"), "IfcWall");
        assert_eq!(sanitize("a.b c-d"), "a_b_c_d");
        assert_eq!(sanitize("ifc_id"), "ifc_id");
    }

    #[test]
    fn test_nodes_and_anchors() {
        let schema = SchemaDef {
            tables: vec![table("IfcWall", &["ifc_id", "OwnerHistory"]), table("IfcOwnerHistory", &["ifc_id"])],
            foreign_keys: vec![fk("IfcWall", "OwnerHistory", "IfcOwnerHistory", "ifc_id")],
        };
        let (nodes, edges) = to_graph(&schema);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "IfcWall");
        assert_eq!(nodes[0].position, Position::default());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_anchor, "out-IfcWall-OwnerHistory");
        assert_eq!(edges[0].target_anchor, "in-IfcOwnerHistory-ifc_id");
        assert_eq!(edges[0].id, "IfcWall-OwnerHistory-IfcOwnerHistory-ifc_id-0");
    }

    #[test]
    fn test_exact_duplicates_collapse() {
        let schema = SchemaDef {
            tables: vec![table("A", &[]), table("B", &[])],
            foreign_keys: vec![fk("A", "b_id", "B", "id"), fk("A", "b_id", "B", "id")],
        };
        let (_, edges) = to_graph(&schema);
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_distinct_columns_stay_distinct() {
        let schema = SchemaDef {
            tables: vec![table("A", &[]), table("B", &[])],
            foreign_keys: vec![fk("A", "first_id", "B", "id"), fk("A", "second_id", "B", "id")],
        };
        let (_, edges) = to_graph(&schema);
        assert_eq!(edges.len(), 2);
        assert_ne!(edges[0].id, edges[1].id);
    }
}
