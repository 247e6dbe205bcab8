//! Saved per-tree position overrides and the stores they are read from.
//!
//! A missing or unreadable document is never an error for the layout: stores
//! report failures through [`PositionStoreError`], and [`PositionStore::load_or_none`]
//! turns them into "no overrides".

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::ir::Tree;
use crate::layout::Layout;

pub const SAVED_POSITIONS_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPosition {
    pub perk_id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub grid_x: i32,
    #[serde(default)]
    pub grid_y: i32,
    #[serde(default)]
    pub horizontal: f32,
    #[serde(default)]
    pub vertical: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTreePositions {
    pub tree_id: String,
    #[serde(default)]
    pub tree_name: String,
    #[serde(default)]
    pub positions: Vec<SavedPosition>,
    #[serde(default = "default_version", deserialize_with = "version_string")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_version() -> String {
    SAVED_POSITIONS_VERSION.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn version_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(value) => format!("{}", value),
        NumberOrString::String(value) => value,
    })
}

impl SavedTreePositions {
    /// Snapshot a layout as a saved document. Grid coordinates are the
    /// nearest cells; `horizontal`/`vertical` keep the remaining fraction.
    pub fn from_layout(tree: &Tree, layout: &Layout, config: &LayoutConfig, now: DateTime<Utc>) -> Self {
        let step_x = config.column_step();
        let step_y = config.vertical_spacing;
        let mut positions = Vec::with_capacity(layout.nodes.len());
        for perk in &tree.perks {
            let Some(node) = layout.nodes.get(&perk.edid) else {
                continue;
            };
            if positions.iter().any(|p: &SavedPosition| p.perk_id == perk.edid) {
                continue;
            }
            let cell_x = if step_x > 0.0 { (node.x - config.padding) / step_x } else { 0.0 };
            let cell_y = if step_y > 0.0 { (node.y - config.padding) / step_y } else { 0.0 };
            let grid_x = cell_x.round();
            let grid_y = cell_y.round();
            positions.push(SavedPosition {
                perk_id: perk.edid.clone(),
                x: node.x,
                y: node.y,
                grid_x: grid_x as i32,
                grid_y: grid_y as i32,
                horizontal: cell_x - grid_x,
                vertical: cell_y - grid_y,
            });
        }
        Self {
            tree_id: tree.tree_id.clone(),
            tree_name: tree.tree_name.clone(),
            positions,
            version: default_version(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }

    pub fn position(&self, perk_id: &str) -> Option<&SavedPosition> {
        self.positions.iter().find(|p| p.perk_id == perk_id)
    }
}

pub fn positions_file_name(tree_id: &str) -> String {
    format!("{tree_id}-positions.json")
}

#[derive(Debug, Error)]
pub enum PositionStoreError {
    #[error("invalid tree id {0:?}")]
    InvalidTreeId(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid saved positions document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid positions url {0:?}")]
    InvalidUrl(String),
    #[cfg(feature = "http")]
    #[error("saved positions request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Tree ids become file names and URL segments, so they must stay a single
/// path component.
fn validate_tree_id(tree_id: &str) -> Result<(), PositionStoreError> {
    let invalid = tree_id.is_empty()
        || tree_id == "."
        || tree_id == ".."
        || tree_id.contains(['/', '\\'])
        || tree_id.chars().any(char::is_control);
    if invalid {
        return Err(PositionStoreError::InvalidTreeId(tree_id.to_string()));
    }
    Ok(())
}

pub trait PositionStore {
    /// `Ok(None)` when no document exists for the tree.
    fn fetch(&self, tree_id: &str) -> Result<Option<SavedTreePositions>, PositionStoreError>;

    fn load_or_none(&self, tree_id: &str) -> Option<SavedTreePositions> {
        match self.fetch(tree_id) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::debug!(tree = %tree_id, error = %err, "saved positions unavailable");
                None
            }
        }
    }
}

/// One `{treeId}-positions.json` file per tree under a directory.
#[derive(Debug, Clone)]
pub struct DirPositionStore {
    root: PathBuf,
}

impl DirPositionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, tree_id: &str) -> Result<PathBuf, PositionStoreError> {
        validate_tree_id(tree_id)?;
        Ok(self.root.join(positions_file_name(tree_id)))
    }

    pub fn save(&self, doc: &SavedTreePositions) -> Result<PathBuf, PositionStoreError> {
        let path = self.path_for(&doc.tree_id)?;
        let io_err = |source| PositionStoreError::Io {
            path: path.display().to_string(),
            source,
        };
        std::fs::create_dir_all(&self.root).map_err(io_err)?;
        let contents = serde_json::to_string_pretty(doc)?;
        std::fs::write(&path, contents).map_err(io_err)?;
        tracing::debug!(tree = %doc.tree_id, path = %path.display(), "saved positions written");
        Ok(path)
    }
}

impl PositionStore for DirPositionStore {
    fn fetch(&self, tree_id: &str) -> Result<Option<SavedTreePositions>, PositionStoreError> {
        let path = self.path_for(tree_id)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PositionStoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPositionStore {
    docs: HashMap<String, SavedTreePositions>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc: SavedTreePositions) {
        self.docs.insert(doc.tree_id.clone(), doc);
    }
}

impl PositionStore for MemoryPositionStore {
    fn fetch(&self, tree_id: &str) -> Result<Option<SavedTreePositions>, PositionStoreError> {
        Ok(self.docs.get(tree_id).cloned())
    }
}

/// Reads documents from `{base}{treeId}-positions.json`. One request per
/// call, no retries; callers drop responses for superseded selections.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpPositionStore {
    client: reqwest::Client,
    base: reqwest::Url,
}

#[cfg(feature = "http")]
impl HttpPositionStore {
    pub fn new(base_url: &str) -> Result<Self, PositionStoreError> {
        let mut normalized = base_url.to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = reqwest::Url::parse(&normalized)
            .map_err(|_| PositionStoreError::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    pub fn url_for(&self, tree_id: &str) -> Result<reqwest::Url, PositionStoreError> {
        validate_tree_id(tree_id)?;
        let file = positions_file_name(tree_id);
        self.base
            .join(&file)
            .map_err(|_| PositionStoreError::InvalidUrl(file))
    }

    pub async fn fetch(&self, tree_id: &str) -> Result<Option<SavedTreePositions>, PositionStoreError> {
        let url = self.url_for(tree_id)?;
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc = response.error_for_status()?.json::<SavedTreePositions>().await?;
        Ok(Some(doc))
    }

    pub async fn load_or_none(&self, tree_id: &str) -> Option<SavedTreePositions> {
        match self.fetch(tree_id).await {
            Ok(doc) => doc,
            Err(err) => {
                tracing::debug!(tree = %tree_id, error = %err, "saved positions unavailable");
                None
            }
        }
    }
}
