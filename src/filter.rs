//! Relationship filtering: each edge is classified into a relationship
//! category by keyword inspection and suppressed when its category is
//! disabled. Filtering is independent of layout and may be re-applied
//! without recomputing positions.

use crate::graph::GraphEdge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipCategory {
    OwnerHistory,
    Spatial,
    Properties,
    Types,
    Materials,
    Classifications,
    Other,
}

// Checked in priority order; first match wins.
const OWNER_HISTORY_KEYWORDS: [&str; 1] = ["ownerhistory"];
const SPATIAL_KEYWORDS: [&str; 6] = ["spatial", "structure", "space", "site", "building", "storey"];
const PROPERTY_KEYWORDS: [&str; 2] = ["property", "quantity"];
const TYPE_KEYWORDS: [&str; 1] = ["type"];
const MATERIAL_KEYWORDS: [&str; 1] = ["material"];
const CLASSIFICATION_KEYWORDS: [&str; 1] = ["classification"];

/// Classify an edge by case-insensitive substring search over its id and
/// both anchors. Total: unmatched edges are `Other`.
pub fn classify(edge: &GraphEdge) -> RelationshipCategory {
    let haystack = format!("{} {} {}", edge.id, edge.source_anchor, edge.target_anchor)
        .to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| haystack.contains(k));

    if matches(&OWNER_HISTORY_KEYWORDS) {
        RelationshipCategory::OwnerHistory
    } else if matches(&SPATIAL_KEYWORDS) {
        RelationshipCategory::Spatial
    } else if matches(&PROPERTY_KEYWORDS) {
        RelationshipCategory::Properties
    } else if matches(&TYPE_KEYWORDS) {
        RelationshipCategory::Types
    } else if matches(&MATERIAL_KEYWORDS) {
        RelationshipCategory::Materials
    } else if matches(&CLASSIFICATION_KEYWORDS) {
        RelationshipCategory::Classifications
    } else {
        RelationshipCategory::Other
    }
}

/// Per-category visibility flags. `show_all` is an aggregate, recomputed on
/// every toggle as the AND of the six category flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    pub show_all: bool,
    pub owner_history: bool,
    pub spatial: bool,
    pub properties: bool,
    pub types: bool,
    pub materials: bool,
    pub classifications: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            show_all: true,
            owner_history: true,
            spatial: true,
            properties: true,
            types: true,
            materials: true,
            classifications: true,
        }
    }
}

impl FilterConfig {
    /// Enable or disable one category and recompute the aggregate flag.
    pub fn set(&mut self, category: RelationshipCategory, enabled: bool) {
        match category {
            RelationshipCategory::OwnerHistory => self.owner_history = enabled,
            RelationshipCategory::Spatial => self.spatial = enabled,
            RelationshipCategory::Properties => self.properties = enabled,
            RelationshipCategory::Types => self.types = enabled,
            RelationshipCategory::Materials => self.materials = enabled,
            RelationshipCategory::Classifications => self.classifications = enabled,
            RelationshipCategory::Other => {}
        }
        self.show_all = self.owner_history
            && self.spatial
            && self.properties
            && self.types
            && self.materials
            && self.classifications;
    }

    pub fn enabled(&self, category: RelationshipCategory) -> bool {
        match category {
            RelationshipCategory::OwnerHistory => self.owner_history,
            RelationshipCategory::Spatial => self.spatial,
            RelationshipCategory::Properties => self.properties,
            RelationshipCategory::Types => self.types,
            RelationshipCategory::Materials => self.materials,
            RelationshipCategory::Classifications => self.classifications,
            RelationshipCategory::Other => true,
        }
    }
}

/// Apply the filter. `show_all` short-circuits; otherwise only edges in
/// enabled categories survive, with `Other` edges always kept.
pub fn filter_edges(edges: &[GraphEdge], config: &FilterConfig) -> Vec<GraphEdge> {
    if config.show_all {
        return edges.to_vec();
    }
    edges
        .iter()
        .filter(|e| config.enabled(classify(e)))
        .cloned()
        .collect()
}
