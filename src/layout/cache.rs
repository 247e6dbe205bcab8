use std::collections::HashMap;
use std::collections::hash_map::{DefaultHasher, Entry};
use std::hash::{Hash, Hasher};

use crate::config::LayoutConfig;
use crate::ir::Tree;

use super::{Layout, compute_layout};

/// Memoizes computed layouts per tree. An entry is reused only while the
/// tree's contents and the layout configuration are unchanged.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: HashMap<String, (u64, Layout)>,
    hits: usize,
    misses: usize,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(&mut self, tree: &Tree, config: &LayoutConfig) -> &Layout {
        let fingerprint = fingerprint(tree, config);
        match self.entries.entry(tree.tree_id.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().0 == fingerprint {
                    self.hits += 1;
                    tracing::trace!(tree = %tree.tree_id, "layout cache hit");
                } else {
                    self.misses += 1;
                    tracing::trace!(tree = %tree.tree_id, "layout cache stale");
                    entry.insert((fingerprint, compute_layout(tree, config)));
                }
                &entry.into_mut().1
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                &entry.insert((fingerprint, compute_layout(tree, config))).1
            }
        }
    }

    pub fn invalidate(&mut self, tree_id: &str) -> bool {
        self.entries.remove(tree_id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

fn fingerprint(tree: &Tree, config: &LayoutConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    tree.tree_id.hash(&mut hasher);
    tree.perks.len().hash(&mut hasher);
    for perk in &tree.perks {
        perk.edid.hash(&mut hasher);
        perk.connections.parents.hash(&mut hasher);
        perk.connections.children.hash(&mut hasher);
        match perk.position {
            Some(grid) => {
                1u8.hash(&mut hasher);
                grid.x.to_bits().hash(&mut hasher);
                grid.y.to_bits().hash(&mut hasher);
            }
            None => 0u8.hash(&mut hasher),
        }
    }
    for value in [
        config.node_width,
        config.node_height,
        config.horizontal_spacing,
        config.vertical_spacing,
        config.padding,
    ] {
        value.to_bits().hash(&mut hasher);
    }
    config.grid_columns.hash(&mut hasher);
    config.center_sibling_blocks.hash(&mut hasher);
    config.variant.hash(&mut hasher);
    hasher.finish()
}
