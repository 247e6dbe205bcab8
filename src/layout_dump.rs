use crate::ir::Tree;
use crate::layout::{Layout, PositionSource};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub tree_id: String,
    pub tree_name: String,
    pub width: f32,
    pub height: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub level: Option<usize>,
    pub component: usize,
    pub source: PositionSource,
}

impl LayoutDump {
    /// Nodes are listed in the tree's perk order.
    pub fn from_layout(layout: &Layout, tree: &Tree) -> Self {
        let mut nodes: Vec<NodeDump> = Vec::with_capacity(layout.nodes.len());
        for perk in &tree.perks {
            let Some(node) = layout.nodes.get(&perk.edid) else {
                continue;
            };
            if nodes.iter().any(|dump| dump.id == node.id) {
                continue;
            }
            nodes.push(NodeDump {
                id: node.id.clone(),
                name: perk.name.clone(),
                x: node.x,
                y: node.y,
                level: node.level,
                component: node.component,
                source: node.source,
            });
        }

        LayoutDump {
            tree_id: layout.tree_id.clone(),
            tree_name: tree.tree_name.clone(),
            width: layout.width,
            height: layout.height,
            node_width: layout.node_width,
            node_height: layout.node_height,
            nodes,
        }
    }
}

/// Write the dumps as a JSON array to `path`, or to stdout when `None`.
pub fn write_layout_dump(path: Option<&Path>, dumps: &[LayoutDump]) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, dumps)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, dumps)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::PerkNode;
    use crate::layout::compute_layout;

    #[test]
    fn dump_follows_perk_order_and_serializes_camel_case() {
        let mut tree = Tree::new("T", "Tree");
        tree.push_perk(PerkNode::new("Z", "Zed").with_children(&["A"]))
            .push_perk(PerkNode::new("A", "Ay"));
        let layout = compute_layout(&tree, &LayoutConfig::default());
        let dump = LayoutDump::from_layout(&layout, &tree);
        let ids: Vec<&str> = dump.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, vec!["Z", "A"]);
        assert_eq!(dump.nodes[0].name, "Zed");

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["treeId"], "T");
        assert_eq!(json["nodes"][1]["source"], "computed");
        assert_eq!(json["nodes"][1]["level"], 1);
    }

    #[test]
    fn writes_json_array_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        let tree = Tree::new("empty", "Empty");
        let layout = compute_layout(&tree, &LayoutConfig::default());
        write_layout_dump(Some(&path), &[LayoutDump::from_layout(&layout, &tree)]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["treeId"], "empty");
        assert!(value[0]["nodes"].as_array().unwrap().is_empty());
    }
}
