use std::collections::{BTreeMap, HashMap};

use crate::config::LayoutConfig;
use crate::ir::Tree;
use crate::saved::{SavedPosition, SavedTreePositions};

use super::{Layout, NodeLayout, PositionSource, default_grid_position};

/// Combine saved overrides with a computed layout. Every perk of `tree` gets
/// exactly one node: its saved position if the document has one, else its
/// computed position, else its default grid slot.
pub fn merge_saved_positions(
    tree: &Tree,
    computed: &Layout,
    saved: Option<&SavedTreePositions>,
    config: &LayoutConfig,
) -> Layout {
    let mut overrides: HashMap<&str, &SavedPosition> = HashMap::new();
    if let Some(doc) = saved {
        if doc.tree_id == tree.tree_id {
            for entry in &doc.positions {
                overrides.entry(entry.perk_id.as_str()).or_insert(entry);
            }
        } else {
            tracing::warn!(
                tree = %tree.tree_id,
                document = %doc.tree_id,
                "ignoring saved positions recorded for another tree"
            );
        }
    }

    let mut nodes = BTreeMap::new();
    let mut used_overrides = 0usize;
    for (index, perk) in tree.perks.iter().enumerate() {
        if nodes.contains_key(&perk.edid) {
            continue;
        }
        let computed_node = computed.nodes.get(&perk.edid);
        let level = computed_node.and_then(|node| node.level);
        let component = computed_node.map_or(0, |node| node.component);
        let (x, y, source) = if let Some(entry) = overrides.get(perk.edid.as_str()) {
            used_overrides += 1;
            (entry.x, entry.y, PositionSource::Saved)
        } else if let Some(node) = computed_node {
            (node.x, node.y, node.source)
        } else {
            let fallback = default_grid_position(index, config);
            (fallback.x, fallback.y, PositionSource::DefaultGrid)
        };
        nodes.insert(
            perk.edid.clone(),
            NodeLayout {
                id: perk.edid.clone(),
                x,
                y,
                level,
                component,
                source,
            },
        );
    }

    if used_overrides < overrides.len() {
        tracing::debug!(
            tree = %tree.tree_id,
            unused = overrides.len() - used_overrides,
            "saved positions reference unknown perks"
        );
    }

    let mut layout = Layout {
        tree_id: tree.tree_id.clone(),
        nodes,
        node_width: config.node_width,
        node_height: config.node_height,
        width: 0.0,
        height: 0.0,
    };
    layout.update_bounds(config.padding);
    layout
}
