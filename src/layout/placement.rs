use std::collections::{BTreeSet, VecDeque};

use crate::config::LayoutConfig;

use super::structure::TreeStructure;

/// Horizontal coordinates (left edge) indexed like `TreeStructure::nodes`.
/// `None` means not yet placed.
pub(crate) type Columns = Vec<Option<f32>>;

/// Component members grouped by level, in component order.
type Rows = Vec<Vec<usize>>;

/// Place one component in local coordinates. Levels must already be
/// assigned. Level 0 nodes sit side by side from x = 0; deeper levels are
/// centered under their parents and pushed right until they clear their left
/// neighbour by `node_width + horizontal_spacing`.
pub(crate) fn place_component(
    structure: &TreeStructure<'_>,
    component: &[usize],
    config: &LayoutConfig,
    xs: &mut Columns,
) {
    let step = config.column_step();
    let depth = component
        .iter()
        .map(|&idx| level_of(structure, idx))
        .max()
        .unwrap_or(0);
    let mut rows: Rows = vec![Vec::new(); depth + 1];
    for &idx in component {
        rows[level_of(structure, idx)].push(idx);
    }

    for (slot, &idx) in rows[0].iter().enumerate() {
        xs[idx] = Some(slot as f32 * step);
    }

    for level in 1..rows.len() {
        place_level(structure, &rows, level, config, xs);
    }
}

fn level_of(structure: &TreeStructure<'_>, idx: usize) -> usize {
    structure.nodes[idx].level.unwrap_or(0)
}

fn place_level(structure: &TreeStructure<'_>, rows: &Rows, level: usize, config: &LayoutConfig, xs: &mut Columns) {
    let step = config.column_step();
    let mut pending: Vec<(usize, f32)> = Vec::with_capacity(rows[level].len());
    for &idx in &rows[level] {
        if xs[idx].is_some() {
            continue;
        }
        match ideal_x(structure, idx, xs) {
            Some(ideal) => pending.push((idx, ideal)),
            None => tracing::trace!(perk = %structure.nodes[idx].id(), "no placed parent, skipping"),
        }
    }
    // Stable: equal ideals keep input order.
    pending.sort_by(|a, b| a.1.total_cmp(&b.1));

    // Runs of nodes where every member after the first was pushed.
    let mut blocks: Vec<Vec<(usize, f32)>> = Vec::new();
    let mut previous: Option<usize> = None;
    for &(idx, sorted_ideal) in &pending {
        // A push earlier in this pass may have moved the parents since sorting.
        let ideal = ideal_x(structure, idx, xs).unwrap_or(sorted_ideal);
        xs[idx] = Some(ideal);
        let min_required = previous.and_then(|prev| xs[prev]).map(|prev_x| prev_x + step);
        match min_required {
            Some(min_x) if min_x > ideal => {
                let touched = shift_subtrees(structure, &[idx], min_x - ideal, xs);
                settle_rows(structure, rows, touched, step, xs);
                if let Some(block) = blocks.last_mut() {
                    block.push((idx, ideal));
                }
            }
            _ => blocks.push(vec![(idx, ideal)]),
        }
        previous = Some(idx);
    }
    settle_rows(structure, rows, BTreeSet::from([level]), step, xs);

    if config.center_sibling_blocks {
        recenter_blocks(structure, rows, &blocks, step, xs);
    }
}

/// Midpoint of the leftmost and rightmost placed parent on a shallower level.
pub(crate) fn ideal_x(structure: &TreeStructure<'_>, idx: usize, xs: &Columns) -> Option<f32> {
    let level = level_of(structure, idx);
    let mut bounds: Option<(f32, f32)> = None;
    for &parent in &structure.nodes[idx].parents {
        if level_of(structure, parent) >= level {
            continue;
        }
        let Some(x) = xs[parent] else {
            continue;
        };
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(x), hi.max(x)),
            None => (x, x),
        });
    }
    bounds.map(|(lo, hi)| (lo + hi) / 2.0)
}

/// Pull each pushed run back left by its mean displacement so the run is
/// centered on its ideals, without closing the gap to the run before it.
fn recenter_blocks(
    structure: &TreeStructure<'_>,
    rows: &Rows,
    blocks: &[Vec<(usize, f32)>],
    step: f32,
    xs: &mut Columns,
) {
    let mut previous_right: Option<f32> = None;
    for block in blocks {
        let members: Vec<usize> = block.iter().map(|&(idx, _)| idx).collect();
        if block.len() > 1 {
            let displacement = block
                .iter()
                .map(|&(idx, ideal)| xs[idx].unwrap_or(ideal) - ideal)
                .sum::<f32>()
                / block.len() as f32;
            let first_x = members
                .iter()
                .filter_map(|&idx| xs[idx])
                .min_by(f32::total_cmp)
                .unwrap_or(0.0);
            let room = previous_right.map_or(f32::INFINITY, |right| first_x - (right + step));
            let shift = displacement.min(room);
            if shift > 0.0 {
                let touched = shift_subtrees(structure, &members, -shift, xs);
                settle_rows(structure, rows, touched, step, xs);
            }
        }
        previous_right = members.iter().filter_map(|&idx| xs[idx]).max_by(f32::total_cmp);
    }
}

/// Restore the minimum gap on every row in `dirty`, shallowest first. A node
/// closer than `step` to its left neighbour moves right together with its
/// placed descendants on deeper rows, which dirties those rows in turn.
fn settle_rows(structure: &TreeStructure<'_>, rows: &Rows, mut dirty: BTreeSet<usize>, step: f32, xs: &mut Columns) {
    while let Some(level) = dirty.pop_first() {
        let Some(row) = rows.get(level) else {
            continue;
        };
        let mut placed: Vec<usize> = row.iter().copied().filter(|&idx| xs[idx].is_some()).collect();
        placed.sort_by(|&a, &b| {
            let (xa, xb) = (xs[a].unwrap_or(0.0), xs[b].unwrap_or(0.0));
            xa.total_cmp(&xb)
                .then(structure.nodes[a].order.cmp(&structure.nodes[b].order))
        });
        for pair in placed.windows(2) {
            let (Some(left), Some(x)) = (xs[pair[0]], xs[pair[1]]) else {
                continue;
            };
            let min_x = left + step;
            if x < min_x {
                dirty.extend(shift_below(structure, pair[1], level, min_x - x, xs));
            }
        }
    }
}

/// Translate every placed node in the subtrees rooted at `starts` by
/// `offset`, following `children` edges whatever level they lead to.
/// Returns the levels of the nodes that moved.
pub(crate) fn shift_subtrees(
    structure: &TreeStructure<'_>,
    starts: &[usize],
    offset: f32,
    xs: &mut Columns,
) -> BTreeSet<usize> {
    translate(structure, starts, offset, xs, |_| true)
}

/// Like [`shift_subtrees`] for one node on `level`, but only its descendants
/// on deeper levels come along. Returns the deeper levels that moved.
fn shift_below(
    structure: &TreeStructure<'_>,
    start: usize,
    level: usize,
    offset: f32,
    xs: &mut Columns,
) -> BTreeSet<usize> {
    let mut touched = translate(structure, &[start], offset, xs, |child| {
        level_of(structure, child) > level
    });
    touched.remove(&level);
    touched
}

fn translate(
    structure: &TreeStructure<'_>,
    starts: &[usize],
    offset: f32,
    xs: &mut Columns,
    follow: impl Fn(usize) -> bool,
) -> BTreeSet<usize> {
    let mut visited = vec![false; structure.len()];
    let mut queue = VecDeque::new();
    for &start in starts {
        if !visited[start] {
            visited[start] = true;
            queue.push_back(start);
        }
    }
    let mut touched = BTreeSet::new();
    while let Some(idx) = queue.pop_front() {
        if let Some(x) = xs[idx].as_mut() {
            *x += offset;
            touched.insert(level_of(structure, idx));
        }
        for &child in &structure.nodes[idx].children {
            if visited[child] || !follow(child) {
                continue;
            }
            visited[child] = true;
            queue.push_back(child);
        }
    }
    touched
}
