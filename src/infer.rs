//! Relationship inference: IFC models converted to SQLite frequently carry
//! no declared foreign keys, but the naming convention is strong enough to
//! recover the structural relationships for visualization. Inferred edges
//! are never enforced at the data layer.

use tracing::debug;

use crate::category::{ENTITY_PREFIX, ID_COLUMN};
use crate::schema::{Column, ForeignKey, SchemaDef, Table};

/// Column names that conventionally reference a well-known entity table
/// named `Ifc{name}`.
pub const COMMON_REFERENCE_COLUMNS: [&str; 6] = [
    "OwnerHistory",
    "GlobalId",
    "SpatialStructure",
    "PropertyDefinition",
    "TypeDefinition",
    "Association",
];

/// Generic entity-reference column names, also resolved as `Ifc{name}`.
pub const ENTITY_REFERENCE_COLUMNS: [&str; 7] = [
    "ObjectPlacement",
    "Representation",
    "PredefinedType",
    "Material",
    "MaterialSelect",
    "Classification",
    "Position",
];

/// Spatial container tables tried in order by the spatial rule; the first
/// one present in the schema wins.
pub const SPATIAL_CONTAINERS: [&str; 5] = [
    "IfcBuildingStorey",
    "IfcBuilding",
    "IfcSite",
    "IfcSpace",
    "IfcProject",
];

const SPATIAL_HINTS: [&str; 3] = ["Spatial", "Structure", "Space"];

/// Infer foreign-key-like edges from column naming conventions. Pure and
/// deterministic: iterates tables and columns in stored order, applies
/// every rule independently, and never emits an edge whose target table is
/// absent from the schema.
pub fn infer(schema: &SchemaDef) -> Vec<ForeignKey> {
    let mut inferred = Vec::new();

    for table in &schema.tables {
        for column in &table.columns {
            if column.is_primary_key {
                continue;
            }
            infer_column(schema, table, column, &mut inferred);
        }
    }

    debug!(count = inferred.len(), "inferred relationships");
    inferred
}

fn infer_column(schema: &SchemaDef, table: &Table, column: &Column, out: &mut Vec<ForeignKey>) {
    // Suffix rule: wall_id / WallId -> IfcWall
    if let Some(stem) = column
        .name
        .strip_suffix("_id")
        .or_else(|| column.name.strip_suffix("Id"))
    {
        if !stem.is_empty() {
            let candidate = entity_name(stem);
            push_if_exists(schema, table, column, &candidate, out);
        }
    }

    // Common-relationship-name rule: OwnerHistory -> IfcOwnerHistory
    if COMMON_REFERENCE_COLUMNS.contains(&column.name.as_str()) {
        let candidate = format!("{}{}", ENTITY_PREFIX, column.name);
        push_if_exists(schema, table, column, &candidate, out);
    }

    // Relating/Related rule: RelatingObject -> IfcObject
    for marker in ["Relating", "Related"] {
        if column.name.contains(marker) {
            let stem = column.name.replacen(marker, "", 1);
            if !stem.is_empty() {
                let candidate = entity_name(&stem);
                push_if_exists(schema, table, column, &candidate, out);
            }
        }
    }

    // Entity-reference rule: Representation -> IfcRepresentation
    if ENTITY_REFERENCE_COLUMNS.contains(&column.name.as_str()) {
        let candidate = format!("{}{}", ENTITY_PREFIX, column.name);
        push_if_exists(schema, table, column, &candidate, out);
    }

    // Spatial rule: at most one edge, first existing container wins.
    if SPATIAL_HINTS.iter().any(|h| column.name.contains(h)) {
        for container in SPATIAL_CONTAINERS {
            if schema.has_table(container) {
                push_edge(schema, table, column, container, out);
                break;
            }
        }
    }
}

/// Normalize a column-name stem to the entity naming convention: capitalize
/// the first letter and add the `Ifc` prefix unless already present.
fn entity_name(stem: &str) -> String {
    let mut chars = stem.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    if capitalized.starts_with(ENTITY_PREFIX) {
        capitalized
    } else {
        format!("{}{}", ENTITY_PREFIX, capitalized)
    }
}

fn push_if_exists(
    schema: &SchemaDef,
    table: &Table,
    column: &Column,
    candidate: &str,
    out: &mut Vec<ForeignKey>,
) {
    if schema.has_table(candidate) {
        push_edge(schema, table, column, candidate, out);
    }
}

fn push_edge(
    schema: &SchemaDef,
    table: &Table,
    column: &Column,
    target: &str,
    out: &mut Vec<ForeignKey>,
) {
    // Target the table's own identifier column when it declares one.
    let to_column = schema
        .table(target)
        .and_then(|t| t.primary_key_columns().first().map(|c| c.name.clone()))
        .unwrap_or_else(|| ID_COLUMN.to_string());

    out.push(ForeignKey {
        from_table: table.name.clone(),
        from_column: column.name.clone(),
        to_table: target.to_string(),
        to_column,
    });
}

/// Build a new SchemaDef whose foreign keys are the explicit list followed
/// by the inferred list, in that order. The input is never mutated and no
/// de-duplication happens across the two sources.
pub fn enhance(schema: &SchemaDef) -> SchemaDef {
    let mut foreign_keys = schema.foreign_keys.clone();
    foreign_keys.extend(infer(schema));
    SchemaDef {
        tables: schema.tables.clone(),
        foreign_keys,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, pk: bool) -> Column {
        Column {
            name: name.to_string(),
            col_type: "TEXT".to_string(),
            not_null: false,
            is_primary_key: pk,
            default_value: None,
        }
    }

    fn table(name: &str, cols: Vec<Column>) -> Table {
        Table {
            name: name.to_string(),
            columns: cols,
        }
    }

    fn schema(tables: Vec<Table>) -> SchemaDef {
        SchemaDef {
            tables,
            foreign_keys: vec![],
        }
    }

    #[test]
    fn test_suffix_rule() {
        let s = schema(vec![
            table("IfcDoor", vec![col("wall_id", false)]),
            table("IfcWall", vec![col("ifc_id", true)]),
        ]);
        let edges = infer(&s);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_column, "wall_id");
        assert_eq!(edges[0].to_table, "IfcWall");
        assert_eq!(edges[0].to_column, "ifc_id");
    }

    #[test]
    fn test_camel_case_suffix() {
        let s = schema(vec![
            table("IfcDoor", vec![col("IfcWallId", false)]),
            table("IfcWall", vec![]),
        ]);
        let edges = infer(&s);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to_table, "IfcWall");
        // No primary key on the target, so the identifier fallback applies.
        assert_eq!(edges[0].to_column, "ifc_id");
    }

    #[test]
    fn test_owner_history_reference() {
        let s = schema(vec![
            table("IfcWall", vec![col("ifc_id", true), col("OwnerHistory", false)]),
            table("IfcOwnerHistory", vec![col("ifc_id", true)]),
        ]);
        let edges = infer(&s);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_table, "IfcWall");
        assert_eq!(edges[0].to_table, "IfcOwnerHistory");
        assert_eq!(edges[0].to_column, "ifc_id");
    }

    #[test]
    fn test_relating_related() {
        let s = schema(vec![
            table(
                "IfcRelVoidsElement",
                vec![col("RelatingBuildingElement", false), col("RelatedOpeningElement", false)],
            ),
            table("IfcBuildingElement", vec![]),
            table("IfcOpeningElement", vec![]),
        ]);
        let edges = infer(&s);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].to_table, "IfcBuildingElement");
        assert_eq!(edges[1].to_table, "IfcOpeningElement");
    }

    #[test]
    fn test_spatial_rule_first_container_wins() {
        let s = schema(vec![
            table("IfcWall", vec![col("ContainedInStructure", false)]),
            table("IfcBuilding", vec![]),
            table("IfcSite", vec![]),
        ]);
        let edges = infer(&s);
        // "Structure" hint, IfcBuildingStorey absent, IfcBuilding present.
        let spatial: Vec<_> = edges.iter().filter(|e| e.to_table == "IfcBuilding").collect();
        assert_eq!(spatial.len(), 1);
        assert!(!edges.iter().any(|e| e.to_table == "IfcSite"));
    }

    #[test]
    fn test_never_dangling() {
        let s = schema(vec![table(
            "IfcWall",
            vec![
                col("missing_id", false),
                col("OwnerHistory", false),
                col("RelatingNothing", false),
            ],
        )]);
        assert!(infer(&s).is_empty());
    }

    #[test]
    fn test_primary_key_columns_skipped() {
        let s = schema(vec![
            table("IfcDoor", vec![col("wall_id", true)]),
            table("IfcWall", vec![]),
        ]);
        assert!(infer(&s).is_empty());
    }

    #[test]
    fn test_rules_are_additive() {
        // "Material" matches the entity-reference rule once; a column named
        // after both a common reference and an entity reference may emit twice.
        let s = schema(vec![
            table("IfcWall", vec![col("Material", false)]),
            table("IfcMaterial", vec![]),
        ]);
        let edges = infer(&s);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to_table, "IfcMaterial");
    }

    #[test]
    fn test_enhance_is_exact_concatenation() {
        let explicit = ForeignKey {
            from_table: "IfcDoor".to_string(),
            from_column: "x".to_string(),
            to_table: "IfcWall".to_string(),
            to_column: "ifc_id".to_string(),
        };
        let s = SchemaDef {
            tables: vec![
                table("IfcWall", vec![col("ifc_id", true), col("OwnerHistory", false)]),
                table("IfcOwnerHistory", vec![col("ifc_id", true)]),
            ],
            foreign_keys: vec![explicit.clone()],
        };
        let enhanced = enhance(&s);
        let inferred = infer(&s);
        assert_eq!(enhanced.foreign_keys.len(), 1 + inferred.len());
        assert_eq!(enhanced.foreign_keys[0], explicit);
        assert_eq!(&enhanced.foreign_keys[1..], inferred.as_slice());
        // Original untouched.
        assert_eq!(s.foreign_keys.len(), 1);
    }

    #[test]
    fn test_deterministic() {
        let s = schema(vec![
            table("IfcWall", vec![col("OwnerHistory", false), col("storey_id", false)]),
            table("IfcOwnerHistory", vec![]),
            table("IfcStorey", vec![]),
        ]);
        assert_eq!(infer(&s), infer(&s));
    }
}
