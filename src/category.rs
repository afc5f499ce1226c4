//! Entity categorization: every table name maps to exactly one of six fixed
//! domain categories. The name lists form a small static ontology so tests
//! can assert exact membership.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::graph::GraphNode;

/// Table name prefix shared by all IFC entities.
pub const ENTITY_PREFIX: &str = "Ifc";
/// Prefix carried by objectified relationship tables.
pub const RELATIONSHIP_PREFIX: &str = "IfcRel";
/// Identifier column used when a target table declares no primary key.
pub const ID_COLUMN: &str = "ifc_id";

pub static SPATIAL_ENTITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "IfcProject",
        "IfcSite",
        "IfcBuilding",
        "IfcBuildingStorey",
        "IfcSpace",
        "IfcZone",
        "IfcSpatialZone",
        "IfcSpatialStructureElement",
    ]
    .into_iter()
    .collect()
});

pub static ELEMENT_ENTITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "IfcWall",
        "IfcWallStandardCase",
        "IfcSlab",
        "IfcBeam",
        "IfcColumn",
        "IfcDoor",
        "IfcWindow",
        "IfcRoof",
        "IfcStair",
        "IfcStairFlight",
        "IfcRamp",
        "IfcRampFlight",
        "IfcRailing",
        "IfcCurtainWall",
        "IfcPlate",
        "IfcMember",
        "IfcCovering",
        "IfcFooting",
        "IfcPile",
        "IfcBuildingElementProxy",
        "IfcFurnishingElement",
        "IfcFlowTerminal",
        "IfcFlowSegment",
        "IfcFlowFitting",
        "IfcDistributionElement",
        "IfcOpeningElement",
    ]
    .into_iter()
    .collect()
});

pub static PROPERTY_ENTITIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "IfcPropertySet",
        "IfcPropertySingleValue",
        "IfcComplexProperty",
        "IfcElementQuantity",
        "IfcQuantityLength",
        "IfcQuantityArea",
        "IfcQuantityVolume",
        "IfcMaterial",
        "IfcMaterialLayer",
        "IfcMaterialLayerSet",
        "IfcMaterialLayerSetUsage",
        "IfcClassification",
        "IfcClassificationReference",
    ]
    .into_iter()
    .collect()
});

const PROPERTY_SUBSTRINGS: [&str; 4] = ["Property", "Quantity", "Material", "Classification"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Spatial,
    Elements,
    Types,
    Relationships,
    Properties,
    Core,
}

impl Category {
    /// Fixed display order used by grouping and the grid layout.
    pub const ORDER: [Category; 6] = [
        Category::Spatial,
        Category::Elements,
        Category::Types,
        Category::Relationships,
        Category::Properties,
        Category::Core,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spatial => "spatial",
            Category::Elements => "elements",
            Category::Types => "types",
            Category::Relationships => "relationships",
            Category::Properties => "properties",
            Category::Core => "core",
        }
    }
}

/// Classify a table name. Total function: checks run in fixed precedence
/// order and the last branch always answers.
pub fn categorize(table_name: &str) -> Category {
    if SPATIAL_ENTITIES.contains(table_name) {
        return Category::Spatial;
    }
    if ELEMENT_ENTITIES.contains(table_name) {
        return Category::Elements;
    }
    if table_name.ends_with("Type") {
        return Category::Types;
    }
    if table_name.starts_with(RELATIONSHIP_PREFIX) {
        return Category::Relationships;
    }
    if PROPERTY_ENTITIES.contains(table_name)
        || PROPERTY_SUBSTRINGS.iter().any(|s| table_name.contains(s))
    {
        return Category::Properties;
    }
    Category::Core
}

/// Partition nodes by category in the fixed display order, ids sorted
/// alphabetically within each group. Empty categories are omitted.
pub fn group_by_category(nodes: &[GraphNode]) -> Vec<(Category, Vec<String>)> {
    let mut groups = Vec::new();
    for category in Category::ORDER {
        let mut ids: Vec<String> = nodes
            .iter()
            .filter(|n| n.category == category)
            .map(|n| n.id.clone())
            .collect();
        if ids.is_empty() {
            continue;
        }
        ids.sort();
        groups.push((category, ids));
    }
    groups
}
