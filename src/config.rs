use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Conventional location of saved-position documents.
pub const DEFAULT_POSITIONS_DIR: &str = "data/perk-positions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    /// Level assignment plus conflict-resolving horizontal placement.
    #[default]
    Hierarchy,
    /// Pixel positions derived from each perk's stored grid coordinates.
    Grid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
    pub padding: f32,
    pub grid_columns: usize,
    pub center_sibling_blocks: bool,
    pub variant: LayoutVariant,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 120.0,
            node_height: 60.0,
            horizontal_spacing: 40.0,
            vertical_spacing: 120.0,
            padding: 50.0,
            grid_columns: 6,
            center_sibling_blocks: true,
            variant: LayoutVariant::Hierarchy,
        }
    }
}

impl LayoutConfig {
    /// Distance between the left edges of two horizontally adjacent nodes.
    pub fn column_step(&self) -> f32 {
        self.node_width + self.horizontal_spacing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub positions_dir: Option<PathBuf>,
    pub positions_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            positions_dir: Some(PathBuf::from(DEFAULT_POSITIONS_DIR)),
            positions_url: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    horizontal_spacing: Option<f32>,
    vertical_spacing: Option<f32>,
    padding: Option<f32>,
    grid_columns: Option<usize>,
    center_sibling_blocks: Option<bool>,
    variant: Option<LayoutVariant>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StoreConfigFile {
    positions_dir: Option<PathBuf>,
    positions_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    store: Option<StoreConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_width {
            config.layout.node_width = v;
        }
        if let Some(v) = layout.node_height {
            config.layout.node_height = v;
        }
        if let Some(v) = layout.horizontal_spacing {
            config.layout.horizontal_spacing = v;
        }
        if let Some(v) = layout.vertical_spacing {
            config.layout.vertical_spacing = v;
        }
        if let Some(v) = layout.padding {
            config.layout.padding = v;
        }
        if let Some(v) = layout.grid_columns {
            config.layout.grid_columns = v;
        }
        if let Some(v) = layout.center_sibling_blocks {
            config.layout.center_sibling_blocks = v;
        }
        if let Some(v) = layout.variant {
            config.layout.variant = v;
        }
    }

    if let Some(store) = parsed.store {
        if let Some(v) = store.positions_dir {
            config.store.positions_dir = Some(v);
        }
        if let Some(v) = store.positions_url {
            config.store.positions_url = Some(v);
        }
    }

    validate_layout(&config.layout)?;
    Ok(config)
}

/// Reject dimensions the layout cannot work with.
pub fn validate_layout(layout: &LayoutConfig) -> anyhow::Result<()> {
    let finite = [
        ("nodeWidth", layout.node_width),
        ("nodeHeight", layout.node_height),
        ("horizontalSpacing", layout.horizontal_spacing),
        ("verticalSpacing", layout.vertical_spacing),
        ("padding", layout.padding),
    ];
    for (name, value) in finite {
        if !value.is_finite() || value < 0.0 {
            anyhow::bail!("layout.{name} must be a finite, non-negative number (got {value})");
        }
    }
    if layout.grid_columns == 0 {
        anyhow::bail!("layout.gridColumns must be at least 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.node_width, 120.0);
        assert_eq!(config.layout.variant, LayoutVariant::Hierarchy);
        assert_eq!(
            config.store.positions_dir.as_deref(),
            Some(Path::new(DEFAULT_POSITIONS_DIR))
        );
    }

    #[test]
    fn json5_overrides_apply_on_top_of_defaults() {
        let config = parse_config(
            r#"{
                // comments are allowed
                layout: { nodeWidth: 80, horizontalSpacing: 10, variant: "grid" },
                store: { positionsUrl: "https://example.org/data/perk-positions/" },
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.node_width, 80.0);
        assert_eq!(config.layout.horizontal_spacing, 10.0);
        assert_eq!(config.layout.column_step(), 90.0);
        assert_eq!(config.layout.vertical_spacing, 120.0);
        assert_eq!(config.layout.variant, LayoutVariant::Grid);
        assert!(config.store.positions_url.is_some());
    }

    #[test]
    fn rejects_zero_grid_columns() {
        let err = parse_config(r#"{ "layout": { "gridColumns": 0 } }"#).unwrap_err();
        assert!(err.to_string().contains("gridColumns"));
    }

    #[test]
    fn validator_rejects_non_finite_dimensions() {
        let layout = LayoutConfig {
            node_width: f32::NAN,
            ..LayoutConfig::default()
        };
        assert!(validate_layout(&layout).is_err());
        assert!(validate_layout(&LayoutConfig::default()).is_ok());
    }

    #[test]
    fn rejects_negative_spacing() {
        assert!(parse_config(r#"{ "layout": { "verticalSpacing": -1 } }"#).is_err());
    }
}
