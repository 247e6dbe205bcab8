use std::collections::{BTreeSet, HashMap};

use perk_layout::{
    GridPosition, LayoutConfig, LayoutVariant, PerkNode, PositionSource, SavedPosition,
    SavedTreePositions, Tree, compute_layout, layout_tree,
};
use proptest::prelude::*;

/// Random perk graphs: `n` perks, edges drawn from arbitrary (parent, child)
/// index pairs, so cycles, self loops and duplicate edges all occur.
fn arb_tree() -> impl Strategy<Value = Tree> {
    (1usize..24).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n), 0..n * 2).prop_map(move |edges| {
            let mut tree = Tree::new("prop", "Prop");
            let mut perks: Vec<PerkNode> = (0..n)
                .map(|idx| PerkNode::new(&format!("p{idx}"), &format!("Perk {idx}")))
                .collect();
            for (parent, child) in edges {
                let child_id = format!("p{child}");
                perks[parent].connections.children.push(child_id);
            }
            for perk in perks {
                tree.push_perk(perk);
            }
            tree
        })
    })
}

/// Like `arb_tree` but edges only point to later perks, so the graph is a DAG.
fn arb_dag() -> impl Strategy<Value = Tree> {
    (2usize..24).prop_flat_map(|n| {
        proptest::collection::vec((0..n - 1, 1..n), 0..n * 2).prop_map(move |edges| {
            let mut tree = Tree::new("dag", "Dag");
            let mut perks: Vec<PerkNode> = (0..n)
                .map(|idx| PerkNode::new(&format!("p{idx}"), &format!("Perk {idx}")))
                .collect();
            for (a, b) in edges {
                let (parent, child) = if a < b { (a, b) } else { (b, a) };
                if parent != child {
                    perks[child].connections.parents.push(format!("p{parent}"));
                }
            }
            for perk in perks {
                tree.push_perk(perk);
            }
            tree
        })
    })
}

fn arb_config() -> impl Strategy<Value = LayoutConfig> {
    (10.0f32..200.0, 0.0f32..80.0, 20.0f32..200.0, 0.0f32..60.0, any::<bool>()).prop_map(
        |(node_width, horizontal_spacing, vertical_spacing, padding, center)| LayoutConfig {
            node_width,
            horizontal_spacing,
            vertical_spacing,
            padding,
            center_sibling_blocks: center,
            ..LayoutConfig::default()
        },
    )
}

proptest! {
    #[test]
    fn every_perk_gets_exactly_one_position(tree in arb_tree(), config in arb_config()) {
        let layout = compute_layout(&tree, &config);
        let expected: BTreeSet<&str> = tree.perks.iter().map(|perk| perk.edid.as_str()).collect();
        let actual: BTreeSet<&str> = layout.nodes.keys().map(String::as_str).collect();
        prop_assert_eq!(actual, expected);
        for node in layout.nodes.values() {
            prop_assert!(node.x.is_finite() && node.y.is_finite());
        }
    }

    #[test]
    fn layout_is_idempotent(tree in arb_tree(), config in arb_config()) {
        prop_assert_eq!(compute_layout(&tree, &config), compute_layout(&tree, &config));
    }

    #[test]
    fn same_level_nodes_never_overlap(tree in arb_tree(), config in arb_config()) {
        let layout = compute_layout(&tree, &config);
        let mut rows: HashMap<(usize, usize), Vec<f32>> = HashMap::new();
        for node in layout.nodes.values() {
            prop_assert_eq!(node.source, PositionSource::Computed);
            let level = node.level.unwrap_or(0);
            rows.entry((node.component, level)).or_default().push(node.x);
        }
        let min_gap = config.column_step();
        for xs in rows.values_mut() {
            xs.sort_by(f32::total_cmp);
            for pair in xs.windows(2) {
                prop_assert!(pair[1] - pair[0] >= min_gap - 1e-2, "{:?}", xs);
            }
        }
    }

    #[test]
    fn dag_children_sit_above_parents(tree in arb_dag(), config in arb_config()) {
        let layout = compute_layout(&tree, &config);
        for perk in &tree.perks {
            let child = &layout.nodes[&perk.edid];
            for parent_id in &perk.connections.parents {
                let parent = &layout.nodes[parent_id];
                prop_assert_eq!(parent.component, child.component);
                prop_assert!(child.level.unwrap_or(0) >= 1);
                if child.level > parent.level {
                    prop_assert!(child.y < parent.y);
                }
            }
        }
    }

    #[test]
    fn components_occupy_disjoint_bands(tree in arb_tree(), config in arb_config()) {
        let layout = compute_layout(&tree, &config);
        let mut bands: Vec<(f32, f32)> = Vec::new();
        for node in layout.nodes.values() {
            if bands.len() <= node.component {
                bands.resize(node.component + 1, (f32::MAX, f32::MIN));
            }
            let band = &mut bands[node.component];
            band.0 = band.0.min(node.x);
            band.1 = band.1.max(node.x);
        }
        for pair in bands.windows(2) {
            prop_assert!(pair[1].0 >= pair[0].1 + config.column_step() - 1e-2);
        }
    }

    #[test]
    fn saved_positions_take_precedence(
        tree in arb_tree(),
        pick in any::<prop::sample::Index>(),
        x in -500.0f32..500.0,
        y in -500.0f32..500.0,
    ) {
        let config = LayoutConfig::default();
        let perk = &tree.perks[pick.index(tree.perks.len())];
        let doc = SavedTreePositions {
            tree_id: tree.tree_id.clone(),
            tree_name: tree.tree_name.clone(),
            positions: vec![SavedPosition {
                perk_id: perk.edid.clone(),
                x,
                y,
                grid_x: 0,
                grid_y: 0,
                horizontal: 0.0,
                vertical: 0.0,
            }],
            version: "1.0".to_string(),
            created_at: None,
            updated_at: None,
        };
        let computed = compute_layout(&tree, &config);
        let merged = layout_tree(&tree, &config, Some(&doc));
        for (id, node) in &merged.nodes {
            if id == &perk.edid {
                prop_assert_eq!((node.x, node.y), (x, y));
                prop_assert_eq!(node.source, PositionSource::Saved);
            } else {
                prop_assert_eq!(node.position(), computed.nodes[id].position());
            }
        }
    }

    #[test]
    fn pushes_never_leave_a_perk_left_of_its_parents(tree in arb_dag(), config in arb_config()) {
        let config = LayoutConfig {
            center_sibling_blocks: false,
            ..config
        };
        let layout = compute_layout(&tree, &config);
        for perk in &tree.perks {
            let node = &layout.nodes[&perk.edid];
            let shallower: Vec<f32> = perk
                .connections
                .parents
                .iter()
                .map(|id| &layout.nodes[id])
                .filter(|parent| parent.level < node.level)
                .map(|parent| parent.x)
                .collect();
            if shallower.is_empty() {
                continue;
            }
            let lo = shallower.iter().copied().fold(f32::MAX, f32::min);
            let hi = shallower.iter().copied().fold(f32::MIN, f32::max);
            prop_assert!(
                node.x >= (lo + hi) / 2.0 - 0.05,
                "{} at {} under {:?}",
                perk.edid,
                node.x,
                shallower
            );
        }
    }

    #[test]
    fn grid_variant_is_total_and_deterministic(
        tree in arb_tree(),
        cells in proptest::collection::vec(proptest::option::of((0u8..8, 0u8..8)), 24),
    ) {
        let mut tree = tree;
        for (perk, cell) in tree.perks.iter_mut().zip(cells) {
            perk.position = cell.map(|(x, y)| GridPosition {
                x: f32::from(x),
                y: f32::from(y),
                horizontal: 0.0,
                vertical: 0.0,
            });
        }
        let config = LayoutConfig {
            variant: LayoutVariant::Grid,
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&tree, &config);
        prop_assert_eq!(layout.nodes.len(), tree.perks.len());
        prop_assert_eq!(&layout, &compute_layout(&tree, &config));
        for perk in &tree.perks {
            if let Some(cell) = perk.position {
                let expected = perk_layout::layout::grid_to_pixels(cell.x, cell.y, &config);
                prop_assert_eq!(layout.nodes[&perk.edid].position(), expected);
            }
        }
    }
}
