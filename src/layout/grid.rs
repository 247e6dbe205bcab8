use crate::config::LayoutConfig;
use crate::ir::Tree;

use super::{Layout, Position, compute_hierarchy_layout};

/// Row-major fallback slot for the perk at `index` in its tree.
pub fn default_grid_position(index: usize, config: &LayoutConfig) -> Position {
    let columns = config.grid_columns.max(1);
    let column = (index % columns) as f32;
    let row = (index / columns) as f32;
    Position::new(
        config.padding + column * config.column_step(),
        config.padding + row * config.vertical_spacing,
    )
}

/// Pixel position of a stored grid coordinate.
pub fn grid_to_pixels(grid_x: f32, grid_y: f32, config: &LayoutConfig) -> Position {
    Position::new(
        config.padding + grid_x * config.column_step(),
        config.padding + grid_y * config.vertical_spacing,
    )
}

/// Grid variant: perks carrying a stored grid position are drawn there, the
/// rest keep their hierarchy placement along with `level` and `component`.
/// Stored cells are trusted as authored, so two perks may share a spot; the
/// no-overlap guarantee only covers the hierarchy variant.
pub(super) fn compute_grid_layout(tree: &Tree, config: &LayoutConfig) -> Layout {
    let mut layout = compute_hierarchy_layout(tree, config);
    let mut moved = 0usize;
    for perk in &tree.perks {
        let Some(grid) = perk.position else {
            continue;
        };
        if let Some(node) = layout.nodes.get_mut(&perk.edid) {
            let position = grid_to_pixels(grid.x, grid.y, config);
            node.x = position.x;
            node.y = position.y;
            moved += 1;
        }
    }
    tracing::debug!(tree = %tree.tree_id, moved, "applied stored grid positions");
    layout.update_bounds(config.padding);
    layout
}
