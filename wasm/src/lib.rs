use perk_layout::config::validate_layout;
use perk_layout::{LayoutConfig, LayoutDump, LayoutVariant, SavedTreePositions, Tree, layout_tree};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerkLayoutOptions {
    node_width: Option<f32>,
    node_height: Option<f32>,
    horizontal_spacing: Option<f32>,
    vertical_spacing: Option<f32>,
    padding: Option<f32>,
    grid_columns: Option<usize>,
    center_sibling_blocks: Option<bool>,
    variant: Option<LayoutVariant>,
}

fn build_layout_config(options: PerkLayoutOptions) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(v) = options.node_width {
        config.node_width = v;
    }
    if let Some(v) = options.node_height {
        config.node_height = v;
    }
    if let Some(v) = options.horizontal_spacing {
        config.horizontal_spacing = v;
    }
    if let Some(v) = options.vertical_spacing {
        config.vertical_spacing = v;
    }
    if let Some(v) = options.padding {
        config.padding = v;
    }
    if let Some(v) = options.grid_columns {
        config.grid_columns = v.max(1);
    }
    if let Some(v) = options.center_sibling_blocks {
        config.center_sibling_blocks = v;
    }
    if let Some(v) = options.variant {
        config.variant = v;
    }
    config
}

fn layout_json(
    tree_json: &str,
    options_json: Option<String>,
    saved_json: Option<String>,
) -> Result<String, String> {
    let tree: Tree = serde_json::from_str(tree_json).map_err(|error| error.to_string())?;
    let options = match options_json {
        Some(raw) => serde_json::from_str::<PerkLayoutOptions>(&raw).map_err(|error| error.to_string())?,
        None => PerkLayoutOptions::default(),
    };
    // An unusable saved document means "no overrides", never a failure.
    let saved = saved_json.and_then(|raw| serde_json::from_str::<SavedTreePositions>(&raw).ok());

    let config = build_layout_config(options);
    validate_layout(&config).map_err(|error| error.to_string())?;
    let layout = layout_tree(&tree, &config, saved.as_ref());
    serde_json::to_string(&LayoutDump::from_layout(&layout, &tree)).map_err(|error| error.to_string())
}

/// Lay out one perk tree and return the layout dump as JSON.
#[wasm_bindgen]
pub fn layout_perk_tree(
    tree_json: &str,
    options_json: Option<String>,
    saved_json: Option<String>,
) -> Result<String, JsValue> {
    layout_json(tree_json, options_json, saved_json).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "treeId": "sneak",
        "treeName": "Sneak",
        "perks": [
            { "edid": "Stealth", "name": "Stealth", "totalRanks": 5,
              "connections": { "children": ["Muffled", "Backstab"] } },
            { "edid": "Muffled", "name": "Muffled Movement", "connections": { "parents": ["Stealth"] } },
            { "edid": "Backstab", "name": "Backstab", "connections": { "parents": ["Stealth"] } }
        ]
    }"#;

    #[test]
    fn lays_out_tree_with_options() {
        let json = layout_json(TREE, Some(r#"{ "nodeWidth": 80, "padding": 0 }"#.to_string()), None)
            .expect("layout should succeed");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["treeId"], "sneak");
        assert_eq!(value["nodeWidth"], 80.0);
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn applies_saved_positions_and_ignores_garbage() {
        let saved = r#"{ "treeId": "sneak", "positions": [ { "perkId": "Backstab", "x": 7, "y": 9 } ] }"#;
        let json = layout_json(TREE, None, Some(saved.to_string())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let backstab = &value["nodes"][2];
        assert_eq!(backstab["x"], 7.0);
        assert_eq!(backstab["source"], "saved");

        assert!(layout_json(TREE, None, Some("not json".to_string())).is_ok());
    }

    #[test]
    fn rejects_unusable_dimensions() {
        for options in [
            r#"{ "nodeWidth": -80 }"#,
            r#"{ "horizontalSpacing": -1 }"#,
            r#"{ "nodeHeight": -0.5 }"#,
        ] {
            let err = layout_json(TREE, Some(options.to_string()), None).unwrap_err();
            assert!(err.contains("finite, non-negative"), "{options}: {err}");
        }
        // Zero columns are clamped rather than rejected.
        assert!(layout_json(TREE, Some(r#"{ "gridColumns": 0 }"#.to_string()), None).is_ok());
    }

    #[test]
    fn rejects_invalid_tree() {
        assert!(layout_json("{}", None, None).is_err());
    }
}
