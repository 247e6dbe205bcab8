use std::collections::VecDeque;

use super::structure::TreeStructure;

/// Partition the structure into connected components, ignoring edge
/// direction. Components are ordered by their first node and list their
/// members in input order.
pub(crate) fn connected_components(structure: &TreeStructure<'_>) -> Vec<Vec<usize>> {
    let mut visited = vec![false; structure.len()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..structure.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(idx) = queue.pop_front() {
            members.push(idx);
            let node = &structure.nodes[idx];
            for &next in node.children.iter().chain(node.parents.iter()) {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }

    tracing::trace!(count = components.len(), "partitioned components");
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PerkNode;
    use crate::layout::structure::build_structure;

    #[test]
    fn separates_disconnected_trees_and_isolated_nodes() {
        let perks = vec![
            PerkNode::new("A", "A").with_children(&["B"]),
            PerkNode::new("X", "X").with_children(&["Y"]),
            PerkNode::new("B", "B"),
            PerkNode::new("lonely", "lonely"),
            PerkNode::new("Y", "Y"),
        ];
        let structure = build_structure(&perks);
        let components = connected_components(&structure);
        assert_eq!(components, vec![vec![0, 2], vec![1, 4], vec![3]]);
    }

    #[test]
    fn joins_through_shared_children() {
        // Two roots that share a child form a single component.
        let perks = vec![
            PerkNode::new("P1", "P1").with_children(&["C"]),
            PerkNode::new("P2", "P2").with_children(&["C"]),
            PerkNode::new("C", "C"),
        ];
        let structure = build_structure(&perks);
        assert_eq!(connected_components(&structure), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn empty_structure_has_no_components() {
        let structure = build_structure(&[]);
        assert!(connected_components(&structure).is_empty());
    }
}
