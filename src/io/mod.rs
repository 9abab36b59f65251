use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use crate::metadata::{FeatureTable, SampleMetadata};
use crate::tree::TreeBundle;

mod tables;
mod trees;

pub use tables::{parse_feature_table, parse_sample_metadata};
pub use trees::parse_trees;

pub fn load_trees(path: &Path) -> Result<TreeBundle> {
    let raw = read(path, "tree file")?;
    let bundle = parse_trees(&raw)?;
    if bundle.trees.is_empty() {
        bail!("tree file did not contain any trees: {}", path.display());
    }

    info!(
        "loaded {} tree(s) from {} ({:?})",
        bundle.trees.len(),
        path.display(),
        bundle.format
    );
    Ok(bundle)
}

pub fn load_feature_table(path: &Path) -> Result<FeatureTable> {
    let raw = read(path, "feature table")?;
    parse_feature_table(&raw).with_context(|| format!("invalid feature table: {}", path.display()))
}

pub fn load_sample_metadata(path: &Path) -> Result<SampleMetadata> {
    let raw = read(path, "sample metadata")?;
    parse_sample_metadata(&raw)
        .with_context(|| format!("invalid sample metadata: {}", path.display()))
}

fn read(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {what}: {}", path.display()))
}
