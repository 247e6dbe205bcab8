use crate::config::{LayoutVariant, StoreConfig, load_config};
use crate::ir::{Tree, load_trees, parse_trees};
use crate::layout::layout_tree;
use crate::layout_dump::{LayoutDump, write_layout_dump};
#[cfg(feature = "http")]
use crate::saved::HttpPositionStore;
use crate::saved::{DirPositionStore, PositionStore, SavedTreePositions};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "perkl", version, about = "Lay out perk skill trees as pixel coordinates")]
pub struct Args {
    /// Tree data (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Only lay out these tree ids
    #[arg(short = 't', long = "tree")]
    pub trees: Vec<String>,

    /// Directory holding {treeId}-positions.json overrides
    #[arg(long = "positions-dir")]
    pub positions_dir: Option<PathBuf>,

    /// Base URL serving {treeId}-positions.json overrides (needs the `http` feature)
    #[arg(long = "positions-url")]
    pub positions_url: Option<String>,

    /// Ignore saved position overrides
    #[arg(long = "no-saved")]
    pub no_saved: bool,

    /// Write the final positions of each tree as saved documents into DIR
    #[arg(long = "export-positions", value_name = "DIR")]
    pub export_positions: Option<PathBuf>,

    /// Layout variant
    #[arg(long = "variant", value_enum)]
    pub variant: Option<VariantArg>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum VariantArg {
    Hierarchy,
    Grid,
}

impl From<VariantArg> for LayoutVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Hierarchy => LayoutVariant::Hierarchy,
            VariantArg::Grid => LayoutVariant::Grid,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(variant) = args.variant {
        config.layout.variant = variant.into();
    }
    if let Some(dir) = args.positions_dir.clone() {
        config.store.positions_dir = Some(dir);
        config.store.positions_url = None;
    }
    if let Some(url) = args.positions_url.clone() {
        config.store.positions_url = Some(url);
    }

    let trees = select_trees(read_trees(args.input.as_deref())?, &args.trees)?;
    if trees.is_empty() {
        return Err(anyhow::anyhow!("No perk trees found in input"));
    }

    let saved_source = SavedSource::from_config(&config.store, args.no_saved)?;
    let export = args.export_positions.clone().map(DirPositionStore::new);

    let mut dumps = Vec::with_capacity(trees.len());
    for tree in &trees {
        let saved = saved_source.load(&tree.tree_id);
        let layout = layout_tree(tree, &config.layout, saved.as_ref());
        if let Some(export) = &export {
            let mut doc = SavedTreePositions::from_layout(tree, &layout, &config.layout, chrono::Utc::now());
            if let Some(previous) = saved.as_ref() {
                doc.created_at = previous.created_at.or(doc.created_at);
            }
            let path = export.save(&doc)?;
            tracing::info!(tree = %tree.tree_id, path = %path.display(), "exported positions");
        }
        dumps.push(LayoutDump::from_layout(&layout, tree));
    }

    write_layout_dump(args.output.as_deref(), &dumps)
}

/// Where saved overrides come from for this run. A configured URL wins over
/// the directory.
enum SavedSource {
    Off,
    Dir(DirPositionStore),
    #[cfg(feature = "http")]
    Remote {
        store: HttpPositionStore,
        runtime: tokio::runtime::Runtime,
    },
}

impl SavedSource {
    fn from_config(store: &StoreConfig, disabled: bool) -> Result<Self> {
        if disabled {
            return Ok(Self::Off);
        }
        if let Some(url) = store.positions_url.as_deref() {
            #[cfg(feature = "http")]
            {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                return Ok(Self::Remote {
                    store: HttpPositionStore::new(url)?,
                    runtime,
                });
            }
            #[cfg(not(feature = "http"))]
            tracing::warn!(url, "positionsUrl needs the http feature, reading positionsDir instead");
        }
        Ok(store
            .positions_dir
            .clone()
            .map_or(Self::Off, |dir| Self::Dir(DirPositionStore::new(dir))))
    }

    fn load(&self, tree_id: &str) -> Option<SavedTreePositions> {
        match self {
            Self::Off => None,
            Self::Dir(store) => store.load_or_none(tree_id),
            #[cfg(feature = "http")]
            Self::Remote { store, runtime } => runtime.block_on(store.load_or_none(tree_id)),
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_trees(path: Option<&Path>) -> Result<Vec<Tree>> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(load_trees(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(parse_trees(&buf)?)
}

fn select_trees(trees: Vec<Tree>, wanted: &[String]) -> Result<Vec<Tree>> {
    if wanted.is_empty() {
        return Ok(trees);
    }
    let mut selected = Vec::with_capacity(wanted.len());
    for id in wanted {
        let tree = trees
            .iter()
            .find(|tree| &tree.tree_id == id)
            .ok_or_else(|| anyhow::anyhow!("Tree {id:?} not found in input"))?;
        selected.push(tree.clone());
    }
    Ok(selected)
}
