#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod saved;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, LayoutVariant, StoreConfig, load_config};
pub use ir::{Connections, GridPosition, PerkNode, Tree, TreeLoadError, load_trees, parse_trees};
pub use layout::{
    Layout, LayoutCache, NodeLayout, Position, PositionMap, PositionSource, compute_layout,
    layout_tree, layout_tree_from_store, merge_saved_positions,
};
pub use layout_dump::LayoutDump;
pub use saved::{
    DirPositionStore, MemoryPositionStore, PositionStore, PositionStoreError, SavedPosition,
    SavedTreePositions,
};
#[cfg(feature = "http")]
pub use saved::HttpPositionStore;
