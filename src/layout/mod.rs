mod cache;
mod components;
mod grid;
mod merge;
mod placement;
mod ranking;
mod structure;
pub(crate) mod types;
pub use cache::LayoutCache;
pub use grid::{default_grid_position, grid_to_pixels};
pub use merge::merge_saved_positions;
pub use types::*;
use components::*;
use grid::*;
use placement::*;
use ranking::*;
use structure::*;

use std::collections::BTreeMap;

use crate::config::{LayoutConfig, LayoutVariant};
use crate::ir::Tree;
use crate::saved::{PositionStore, SavedTreePositions};

/// Compute pixel positions for every perk of `tree`.
///
/// Pure and deterministic: the same tree and configuration always give the
/// same layout. Malformed input degrades (dangling edges dropped, cycles
/// broken at first discovery) instead of failing.
pub fn compute_layout(tree: &Tree, config: &LayoutConfig) -> Layout {
    match config.variant {
        LayoutVariant::Hierarchy => compute_hierarchy_layout(tree, config),
        LayoutVariant::Grid => compute_grid_layout(tree, config),
    }
}

/// Computed layout with saved overrides applied.
pub fn layout_tree(tree: &Tree, config: &LayoutConfig, saved: Option<&SavedTreePositions>) -> Layout {
    let computed = compute_layout(tree, config);
    merge_saved_positions(tree, &computed, saved, config)
}

/// [`layout_tree`] with overrides looked up in `store`. A missing or
/// unreadable document just means no overrides.
pub fn layout_tree_from_store(tree: &Tree, config: &LayoutConfig, store: &dyn PositionStore) -> Layout {
    let saved = store.load_or_none(&tree.tree_id);
    layout_tree(tree, config, saved.as_ref())
}

pub(crate) fn compute_hierarchy_layout(tree: &Tree, config: &LayoutConfig) -> Layout {
    let mut layout = Layout {
        tree_id: tree.tree_id.clone(),
        nodes: BTreeMap::new(),
        node_width: config.node_width,
        node_height: config.node_height,
        width: 0.0,
        height: 0.0,
    };
    if tree.perks.is_empty() {
        return layout;
    }

    let mut structure = build_structure(&tree.perks);
    let components = connected_components(&structure);
    let max_depth = components
        .iter()
        .map(|component| assign_levels(&mut structure, component))
        .max()
        .unwrap_or(0);

    let step = config.column_step();
    let mut xs: Columns = vec![None; structure.len()];
    let mut cursor = config.padding;
    for component in &components {
        place_component(&structure, component, config, &mut xs);
        if let Some(right) = settle_band(component, cursor, &mut xs) {
            cursor = right + step;
        }
    }

    for (component_idx, component) in components.iter().enumerate() {
        for &idx in component {
            let node = &structure.nodes[idx];
            let entry = match xs[idx] {
                Some(x) => {
                    let level = node.level.unwrap_or(0);
                    NodeLayout {
                        id: node.id().to_string(),
                        x,
                        y: (max_depth - level.min(max_depth)) as f32 * config.vertical_spacing
                            + config.padding,
                        level: Some(level),
                        component: component_idx,
                        source: PositionSource::Computed,
                    }
                }
                None => {
                    let fallback = default_grid_position(node.order, config);
                    NodeLayout {
                        id: node.id().to_string(),
                        x: fallback.x,
                        y: fallback.y,
                        level: None,
                        component: component_idx,
                        source: PositionSource::DefaultGrid,
                    }
                }
            };
            layout.nodes.insert(entry.id.clone(), entry);
        }
    }

    tracing::debug!(
        tree = %tree.tree_id,
        nodes = layout.nodes.len(),
        components = components.len(),
        max_depth,
        "computed perk tree layout"
    );
    layout.update_bounds(config.padding);
    layout
}

/// Translate a placed component so its leftmost node starts at `cursor`.
/// Returns the rightmost x afterwards.
fn settle_band(component: &[usize], cursor: f32, xs: &mut Columns) -> Option<f32> {
    let min_x = component
        .iter()
        .filter_map(|&idx| xs[idx])
        .min_by(f32::total_cmp)?;
    let offset = cursor - min_x;
    let mut max_x = f32::NEG_INFINITY;
    for &idx in component {
        if let Some(x) = xs[idx].as_mut() {
            *x += offset;
            max_x = max_x.max(*x);
        }
    }
    Some(max_x)
}
