//! Schema graph engine: turns a live relational schema into a categorized,
//! laid-out, filterable directed graph for interactive visualization.
//!
//! Pipeline: extract -> infer -> map -> layout, with relationship filtering
//! applied to edges independently of layout and saved coordinates restored
//! through the layout store.

pub mod category;
pub mod extract;
pub mod filter;
pub mod graph;
pub mod infer;
pub mod layout;
pub mod schema;
pub mod store;

use extract::{extract_schema, ExtractError, QueryExecutor};
use graph::{to_graph, GraphEdge, GraphNode};
use infer::enhance;

/// Introspect the database behind `executor`, enrich it with inferred
/// relationships and map it to graph nodes and edges. Layout and filtering
/// stay separate calls so filter changes never recompute positions.
pub async fn build_graph(
    executor: &dyn QueryExecutor,
) -> Result<(Vec<GraphNode>, Vec<GraphEdge>), ExtractError> {
    let schema = extract_schema(executor).await?;
    let enhanced = enhance(&schema);
    Ok(to_graph(&enhanced))
}
