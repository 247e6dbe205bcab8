use std::collections::VecDeque;

use super::structure::TreeStructure;

/// Assign BFS levels to every node of one component and return the deepest
/// level.
///
/// All parentless nodes start at level 0 and are expanded together in input
/// order, children in declaration order. A node keeps the level of its first
/// discovery, which is what breaks cycles. A component with no parentless
/// node is seeded from its first member; anything still unreached gets 0.
pub(crate) fn assign_levels(structure: &mut TreeStructure<'_>, component: &[usize]) -> usize {
    let mut roots: Vec<usize> = component
        .iter()
        .copied()
        .filter(|&idx| structure.nodes[idx].parents.is_empty())
        .collect();
    if roots.is_empty() {
        if let Some(&first) = component.first() {
            tracing::debug!(
                perk = %structure.nodes[first].id(),
                "component has no root, seeding levels from its first perk"
            );
            roots.push(first);
        }
    }

    let mut visited = vec![false; structure.len()];
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    for &root in &roots {
        visited[root] = true;
        queue.push_back((root, 0));
    }

    let mut max_level = 0;
    while let Some((idx, level)) = queue.pop_front() {
        structure.nodes[idx].level = Some(level);
        max_level = max_level.max(level);
        for pos in 0..structure.nodes[idx].children.len() {
            let child = structure.nodes[idx].children[pos];
            if !visited[child] {
                visited[child] = true;
                queue.push_back((child, level + 1));
            }
        }
    }

    for &idx in component {
        if structure.nodes[idx].level.is_none() {
            tracing::trace!(perk = %structure.nodes[idx].id(), "unreached perk placed at level 0");
            structure.nodes[idx].level = Some(0);
        }
    }

    max_level
}
