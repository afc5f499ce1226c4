//! Layout engine: assigns 2D coordinates to graph nodes under one of four
//! algorithms. The layered and force algorithms run through an injected
//! `GraphLayouter` capability (defaulting to the builtin deterministic
//! implementation); circular and grid are computed locally.

use async_trait::async_trait;
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::debug;

use crate::category::Category;
use crate::graph::{GraphEdge, GraphNode, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutAlgorithm {
    Hierarchical,
    Force,
    Circular,
    Grid,
}

impl LayoutAlgorithm {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hierarchical" => Some(Self::Hierarchical),
            "force" => Some(Self::Force),
            "circular" => Some(Self::Circular),
            "grid" => Some(Self::Grid),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub v_spacing: f64,
    pub layer_spacing: f64,
    pub margin: f64,
    // Circular
    pub center: (f64, f64),
    pub min_radius: f64,
    pub max_radius: f64,
    pub per_node_radius: f64,
    // Grid
    pub grid_h: f64,
    pub grid_v: f64,
    pub category_gap: f64,
    // Force
    pub iterations: usize,
    pub spring_length: f64,
    pub spring_k: f64,
    pub repulsion: f64,
    pub cooling: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 240.0,
            header_height: 44.0,
            row_height: 28.0,
            v_spacing: 60.0,
            layer_spacing: 320.0,
            margin: 40.0,
            center: (600.0, 400.0),
            min_radius: 200.0,
            max_radius: 700.0,
            per_node_radius: 30.0,
            grid_h: 280.0,
            grid_v: 160.0,
            category_gap: 120.0,
            iterations: 300,
            spring_length: 320.0,
            spring_k: 0.02,
            repulsion: 1.6e5,
            cooling: 0.95,
        }
    }
}

impl LayoutConfig {
    /// Node height grows with column count; width is fixed.
    pub fn node_height(&self, column_count: usize) -> f64 {
        self.header_height + column_count as f64 * self.row_height
    }
}

/// Abstract sized node handed to a layout backend.
#[derive(Debug, Clone)]
pub struct SizedNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub category: Category,
}

/// Graph shape consumed by the layered and force backends.
#[derive(Debug, Clone)]
pub struct SizedGraph {
    pub nodes: Vec<SizedNode>,
    /// Directed (source, target) pairs by node id.
    pub edges: Vec<(String, String)>,
}

pub type PositionMap = HashMap<String, Position>;

/// External graph-layout computation capability. Both methods are
/// suspension points; results assign one position per node id.
#[async_trait]
pub trait GraphLayouter: Send + Sync {
    async fn layered(
        &self,
        graph: &SizedGraph,
        config: &LayoutConfig,
    ) -> Result<PositionMap, LayoutError>;
    async fn force(
        &self,
        graph: &SizedGraph,
        config: &LayoutConfig,
    ) -> Result<PositionMap, LayoutError>;
}

pub struct LayoutEngine {
    config: LayoutConfig,
    layouter: Box<dyn GraphLayouter>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            config: LayoutConfig::default(),
            layouter: Box::new(BuiltinLayouter),
        }
    }
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            layouter: Box::new(BuiltinLayouter),
        }
    }

    pub fn with_layouter(config: LayoutConfig, layouter: Box<dyn GraphLayouter>) -> Self {
        Self { config, layouter }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute positions for `nodes`. The input is untouched; on backend
    /// failure the error is surfaced and no partial positions escape.
    pub async fn layout(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        algorithm: LayoutAlgorithm,
    ) -> Result<Vec<GraphNode>, LayoutError> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }
        debug!(algorithm = ?algorithm, nodes = nodes.len(), "layout run");

        let mut out = nodes.to_vec();
        match algorithm {
            LayoutAlgorithm::Hierarchical => {
                let graph = self.sized_graph(nodes, edges);
                let positions = self.layouter.layered(&graph, &self.config).await?;
                apply_positions(&mut out, &positions);
            }
            LayoutAlgorithm::Force => {
                let graph = self.sized_graph(nodes, edges);
                let positions = self.layouter.force(&graph, &self.config).await?;
                apply_positions(&mut out, &positions);
            }
            LayoutAlgorithm::Circular => self.layout_circular(&mut out),
            LayoutAlgorithm::Grid => self.layout_grid(&mut out),
        }
        Ok(out)
    }

    fn sized_graph(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> SizedGraph {
        SizedGraph {
            nodes: nodes
                .iter()
                .map(|n| SizedNode {
                    id: n.id.clone(),
                    width: self.config.node_width,
                    height: self.config.node_height(n.table.columns.len()),
                    category: n.category,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|e| (e.source.clone(), e.target.clone()))
                .collect(),
        }
    }

    /// Evenly spaced on a circle, node centers exactly on the ring.
    fn layout_circular(&self, nodes: &mut [GraphNode]) {
        let c = &self.config;
        let n = nodes.len();
        let radius = (n as f64 * c.per_node_radius).clamp(c.min_radius, c.max_radius);
        let step = 2.0 * PI / n as f64;

        for (i, node) in nodes.iter_mut().enumerate() {
            let angle = -PI / 2.0 + i as f64 * step;
            let height = c.node_height(node.table.columns.len());
            node.position = Position {
                x: c.center.0 + radius * angle.cos() - c.node_width / 2.0,
                y: c.center.1 + radius * angle.sin() - height / 2.0,
            };
        }
    }

    /// Near-square grid per category, categories stacked in fixed order
    /// with a gap between bands.
    fn layout_grid(&self, nodes: &mut [GraphNode]) {
        let c = &self.config;
        let mut cursor_y = c.margin;

        for category in Category::ORDER {
            let mut members: Vec<usize> = (0..nodes.len())
                .filter(|&i| nodes[i].category == category)
                .collect();
            if members.is_empty() {
                continue;
            }
            members.sort_by(|&a, &b| nodes[a].id.cmp(&nodes[b].id));

            let cols = (members.len() as f64).sqrt().ceil() as usize;
            let mut rows = 0;
            for (slot, &idx) in members.iter().enumerate() {
                let row = slot / cols;
                let col = slot % cols;
                nodes[idx].position = Position {
                    x: c.margin + col as f64 * c.grid_h,
                    y: cursor_y + row as f64 * c.grid_v,
                };
                rows = rows.max(row + 1);
            }
            cursor_y += rows as f64 * c.grid_v + c.category_gap;
        }
    }
}

fn apply_positions(nodes: &mut [GraphNode], positions: &PositionMap) {
    for node in nodes.iter_mut() {
        if let Some(p) = positions.get(&node.id) {
            node.position = *p;
        }
    }
}

/// Deterministic in-process layout backend.
pub struct BuiltinLayouter;

#[async_trait]
impl GraphLayouter for BuiltinLayouter {
    /// Layered left-to-right drawing: longest-path layer assignment,
    /// category-biased ordering within layers, one barycenter pass.
    async fn layered(
        &self,
        graph: &SizedGraph,
        config: &LayoutConfig,
    ) -> Result<PositionMap, LayoutError> {
        let layer_of = assign_layers(graph);

        let mut layers: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, node) in graph.nodes.iter().enumerate() {
            layers.entry(layer_of[&node.id]).or_default().push(idx);
        }
        let mut layer_keys: Vec<usize> = layers.keys().copied().collect();
        layer_keys.sort();

        // Predecessors by node id for the barycenter pass.
        let mut preds: HashMap<&str, Vec<&str>> = HashMap::new();
        for (source, target) in &graph.edges {
            preds
                .entry(target.as_str())
                .or_default()
                .push(source.as_str());
        }

        let category_rank =
            |c: Category| Category::ORDER.iter().position(|&o| o == c).unwrap_or(5);

        let mut positions = PositionMap::new();
        let mut prev_slot: HashMap<String, usize> = HashMap::new();

        for &layer in &layer_keys {
            let members = layers.get_mut(&layer).unwrap();

            // Primary key: category order, so same-category nodes cluster.
            // Secondary: mean slot of predecessors in earlier layers, which
            // pulls connected nodes toward each other. Ties break on id.
            let sort_key = |idx: usize| {
                let node = &graph.nodes[idx];
                let bary = preds
                    .get(node.id.as_str())
                    .map(|ps| {
                        let known: Vec<usize> = ps
                            .iter()
                            .filter_map(|p| prev_slot.get(*p).copied())
                            .collect();
                        if known.is_empty() {
                            usize::MAX
                        } else {
                            known.iter().sum::<usize>() / known.len()
                        }
                    })
                    .unwrap_or(usize::MAX);
                (category_rank(node.category), bary, node.id.clone())
            };
            members.sort_by_key(|&idx| sort_key(idx));

            let x = config.margin + layer as f64 * config.layer_spacing;
            let mut y = config.margin;
            for (slot, &idx) in members.iter().enumerate() {
                let node = &graph.nodes[idx];
                positions.insert(node.id.clone(), Position { x, y });
                prev_slot.insert(node.id.clone(), slot);
                y += node.height + config.v_spacing;
            }
        }

        Ok(positions)
    }

    /// Spring/charge simulation with a fixed iteration cap. Seedless:
    /// initial positions come from a circle, so results are reproducible.
    async fn force(
        &self,
        graph: &SizedGraph,
        config: &LayoutConfig,
    ) -> Result<PositionMap, LayoutError> {
        let n = graph.nodes.len();
        let (cx, cy) = config.center;

        let index: HashMap<&str, usize> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, nd)| (nd.id.as_str(), i))
            .collect();
        let radii: Vec<f64> = graph
            .nodes
            .iter()
            .map(|nd| (nd.width + nd.height) / 4.0)
            .collect();

        // Node centers, seeded on a ring.
        let seed_radius = config.min_radius.max(n as f64 * config.per_node_radius);
        let mut xs: Vec<f64> = Vec::with_capacity(n);
        let mut ys: Vec<f64> = Vec::with_capacity(n);
        for i in 0..n {
            let angle = 2.0 * PI * i as f64 / n as f64;
            xs.push(cx + seed_radius * angle.cos());
            ys.push(cy + seed_radius * angle.sin());
        }

        let edge_pairs: Vec<(usize, usize)> = graph
            .edges
            .iter()
            .filter_map(|(s, t)| match (index.get(s.as_str()), index.get(t.as_str())) {
                (Some(&a), Some(&b)) if a != b => Some((a, b)),
                _ => None,
            })
            .collect();

        let mut temperature = seed_radius / 4.0;
        for _ in 0..config.iterations {
            let mut dx = vec![0.0f64; n];
            let mut dy = vec![0.0f64; n];

            // Pairwise repulsion, stronger for bigger nodes.
            for i in 0..n {
                for j in (i + 1)..n {
                    let (vx, vy) = (xs[i] - xs[j], ys[i] - ys[j]);
                    let dist_sq = (vx * vx + vy * vy).max(1.0);
                    let dist = dist_sq.sqrt();
                    let scale = (radii[i] + radii[j]) / config.node_width;
                    let force = config.repulsion * scale / dist_sq;
                    dx[i] += vx / dist * force;
                    dy[i] += vy / dist * force;
                    dx[j] -= vx / dist * force;
                    dy[j] -= vy / dist * force;
                }
            }

            // Spring attraction along edges.
            for &(a, b) in &edge_pairs {
                let (vx, vy) = (xs[b] - xs[a], ys[b] - ys[a]);
                let dist = (vx * vx + vy * vy).sqrt().max(1.0);
                let force = config.spring_k * (dist - config.spring_length);
                dx[a] += vx / dist * force;
                dy[a] += vy / dist * force;
                dx[b] -= vx / dist * force;
                dy[b] -= vy / dist * force;
            }

            for i in 0..n {
                let len = (dx[i] * dx[i] + dy[i] * dy[i]).sqrt();
                if len > 0.0 {
                    let capped = len.min(temperature);
                    xs[i] += dx[i] / len * capped;
                    ys[i] += dy[i] / len * capped;
                }
            }
            temperature *= config.cooling;
        }

        // Centers back to top-left corners.
        let positions = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, nd)| {
                (
                    nd.id.clone(),
                    Position {
                        x: xs[i] - nd.width / 2.0,
                        y: ys[i] - nd.height / 2.0,
                    },
                )
            })
            .collect();
        Ok(positions)
    }
}

/// Longest-path layer assignment from in-degree-0 sources, bounded so
/// cycles cannot loop forever.
fn assign_layers(graph: &SizedGraph) -> HashMap<String, usize> {
    let mut layer: HashMap<String, usize> =
        graph.nodes.iter().map(|n| (n.id.clone(), 0)).collect();

    let edges: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .filter(|(s, t)| s != t && layer.contains_key(s) && layer.contains_key(t))
        .map(|(s, t)| (s.as_str(), t.as_str()))
        .collect();

    // Relax at most n passes; a pass with no change means convergence.
    for _ in 0..graph.nodes.len() {
        let mut changed = false;
        for &(source, target) in &edges {
            let candidate = layer[source] + 1;
            if candidate > layer[target] && candidate <= graph.nodes.len() {
                layer.insert(target.to_string(), candidate);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    layer
}
