use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Declared edges of a perk. Either side may be incomplete; the structure
/// builder treats an edge declared on one endpoint as present on both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Position in abstract grid units, only read by the grid layout variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub horizontal: f32,
    #[serde(default)]
    pub vertical: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerkNode {
    pub edid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ranks: Vec<serde_json::Value>,
    #[serde(default = "default_total_ranks")]
    pub total_ranks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_root: Option<bool>,
    #[serde(default)]
    pub connections: Connections,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
}

fn default_total_ranks() -> u32 {
    1
}

impl PerkNode {
    pub fn new(edid: &str, name: &str) -> Self {
        Self {
            edid: edid.to_string(),
            name: name.to_string(),
            ranks: Vec::new(),
            total_ranks: 1,
            is_root: None,
            connections: Connections::default(),
            position: None,
        }
    }

    pub fn with_children(mut self, children: &[&str]) -> Self {
        self.connections
            .children
            .extend(children.iter().map(|id| id.to_string()));
        self
    }

    pub fn with_parents(mut self, parents: &[&str]) -> Self {
        self.connections
            .parents
            .extend(parents.iter().map(|id| id.to_string()));
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(GridPosition {
            x,
            y,
            ..Default::default()
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub tree_id: String,
    #[serde(default)]
    pub tree_name: String,
    #[serde(default)]
    pub tree_description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub perks: Vec<PerkNode>,
}

impl Tree {
    pub fn new(tree_id: &str, tree_name: &str) -> Self {
        Self {
            tree_id: tree_id.to_string(),
            tree_name: tree_name.to_string(),
            tree_description: String::new(),
            category: String::new(),
            perks: Vec::new(),
        }
    }

    pub fn push_perk(&mut self, perk: PerkNode) -> &mut Self {
        self.perks.push(perk);
        self
    }

    pub fn perk(&self, edid: &str) -> Option<&PerkNode> {
        self.perks.iter().find(|perk| perk.edid == edid)
    }
}

/// A data file holds either one tree or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TreeSource {
    Many(Vec<Tree>),
    One(Tree),
}

#[derive(Debug, Error)]
pub enum TreeLoadError {
    #[error("failed to read tree data from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tree data: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn parse_trees(input: &str) -> Result<Vec<Tree>, TreeLoadError> {
    let trees = match serde_json::from_str::<TreeSource>(input)? {
        TreeSource::Many(trees) => trees,
        TreeSource::One(tree) => vec![tree],
    };
    tracing::debug!(count = trees.len(), "parsed perk trees");
    Ok(trees)
}

pub fn load_trees(path: &Path) -> Result<Vec<Tree>, TreeLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| TreeLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_trees(&contents)
}
