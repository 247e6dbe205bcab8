use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pixel coordinates of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

pub type PositionMap = BTreeMap<String, Position>;

/// Which fallback tier produced a node's final position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionSource {
    Saved,
    Computed,
    DefaultGrid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    /// BFS depth inside the node's component; `None` when no graph-derived
    /// level applies (grid fallback).
    pub level: Option<usize>,
    /// Index of the connected component, in order of first appearance.
    pub component: usize,
    pub source: PositionSource,
}

impl NodeLayout {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub tree_id: String,
    pub nodes: BTreeMap<String, NodeLayout>,
    pub node_width: f32,
    pub node_height: f32,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn empty(tree_id: &str) -> Self {
        Self {
            tree_id: tree_id.to_string(),
            nodes: BTreeMap::new(),
            node_width: 0.0,
            node_height: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn positions(&self) -> PositionMap {
        self.nodes
            .iter()
            .map(|(id, node)| (id.clone(), node.position()))
            .collect()
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.nodes.get(id).map(NodeLayout::position)
    }

    /// Recompute the canvas extent from the node boxes plus `padding` on the
    /// far sides.
    pub(crate) fn update_bounds(&mut self, padding: f32) {
        let mut max_x: f32 = 0.0;
        let mut max_y: f32 = 0.0;
        for node in self.nodes.values() {
            max_x = max_x.max(node.x + self.node_width);
            max_y = max_y.max(node.y + self.node_height);
        }
        if self.nodes.is_empty() {
            self.width = 0.0;
            self.height = 0.0;
        } else {
            self.width = max_x + padding;
            self.height = max_y + padding;
        }
    }
}
