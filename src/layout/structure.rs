use std::collections::HashMap;

use crate::ir::PerkNode;

/// Per-pass working node. Indices refer to positions in
/// [`TreeStructure::nodes`].
#[derive(Debug, Clone)]
pub(crate) struct TreeNode<'a> {
    pub perk: &'a PerkNode,
    /// Index of the perk in the tree's input list.
    pub order: usize,
    pub children: Vec<usize>,
    pub parents: Vec<usize>,
    pub level: Option<usize>,
}

impl TreeNode<'_> {
    pub fn id(&self) -> &str {
        &self.perk.edid
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TreeStructure<'a> {
    pub nodes: Vec<TreeNode<'a>>,
    pub index: HashMap<&'a str, usize>,
}

impl<'a> TreeStructure<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&TreeNode<'a>> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    fn link(&mut self, parent: usize, child: usize) {
        if parent == child {
            return;
        }
        if !self.nodes[parent].children.contains(&child) {
            self.nodes[parent].children.push(child);
        }
        if !self.nodes[child].parents.contains(&parent) {
            self.nodes[child].parents.push(parent);
        }
    }
}

/// Build the adjacency arena for one tree. Connections naming unknown perks
/// or the perk itself are dropped; an edge declared on either endpoint is
/// recorded on both.
pub(crate) fn build_structure(perks: &[PerkNode]) -> TreeStructure<'_> {
    let mut structure = TreeStructure {
        nodes: Vec::with_capacity(perks.len()),
        index: HashMap::with_capacity(perks.len()),
    };

    for (order, perk) in perks.iter().enumerate() {
        if structure.index.contains_key(perk.edid.as_str()) {
            tracing::warn!(perk = %perk.edid, "duplicate perk id, keeping first occurrence");
            continue;
        }
        structure
            .index
            .insert(perk.edid.as_str(), structure.nodes.len());
        structure.nodes.push(TreeNode {
            perk,
            order,
            children: Vec::new(),
            parents: Vec::new(),
            level: None,
        });
    }

    for idx in 0..structure.nodes.len() {
        let perk = structure.nodes[idx].perk;
        for child_id in &perk.connections.children {
            match structure.index.get(child_id.as_str()).copied() {
                Some(child) => structure.link(idx, child),
                None => tracing::trace!(perk = %perk.edid, child = %child_id, "dropping dangling child"),
            }
        }
        for parent_id in &perk.connections.parents {
            match structure.index.get(parent_id.as_str()).copied() {
                Some(parent) => structure.link(parent, idx),
                None => tracing::trace!(perk = %perk.edid, parent = %parent_id, "dropping dangling parent"),
            }
        }
    }

    for node in &structure.nodes {
        if let Some(declared) = node.perk.is_root {
            if declared != node.parents.is_empty() {
                tracing::debug!(
                    perk = %node.id(),
                    declared,
                    "isRoot flag disagrees with connections; using connections"
                );
            }
        }
    }

    structure
}
