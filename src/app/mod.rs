use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use log::{info, warn};

use crate::colorer::ColorMap;
use crate::metadata::{BiomTable, FeatureTable, MetadataTable, SampleMetadata};
use crate::panels::{NameResolution, NodeInspector, ViewController};
use crate::render::legend::LegendPanel;
use crate::render::shared;
use crate::render::svg_surface::SvgSurface;
use crate::tree::view::{PhyloView, ViewModel};
use crate::{io, ui};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "cladeview",
    about = "Inspect and color a phylogenetic tree by sample metadata."
)]
pub struct AppConfig {
    /// Tree file to load (Newick or Nexus). The first tree is shown.
    #[arg(value_name = "TREE_FILE")]
    pub tree_path: PathBuf,

    /// Feature table TSV (observations x samples).
    #[arg(long = "table", value_name = "TSV")]
    pub table_path: Option<PathBuf>,

    /// Sample metadata TSV.
    #[arg(long = "metadata", value_name = "TSV")]
    pub metadata_path: Option<PathBuf>,

    /// Metadata column to show in the node menu (repeatable).
    #[arg(long = "column", value_name = "NAME")]
    pub columns: Vec<String>,

    /// Node to inspect.
    #[arg(long, value_name = "NODE")]
    pub select: Option<String>,

    /// Color branches by this metadata column.
    #[arg(long, value_name = "COLUMN")]
    pub color_by: Option<String>,

    #[arg(long, value_name = "NAME", default_value_t = ColorMap::default().id().to_string())]
    pub color_map: String,

    /// Width of sample-colored branches.
    #[arg(long, default_value_t = 1.0)]
    pub line_width: f32,

    /// Hide branches no sample category claimed.
    #[arg(long)]
    pub hide_non_sample: bool,

    /// Rectangular, Circular or Unrooted.
    #[arg(long, value_name = "NAME")]
    pub layout: Option<String>,

    /// Fail on node names shared by several nodes instead of using the first.
    #[arg(long)]
    pub strict_names: bool,

    /// Print the selectable columns, color maps and layouts, then exit.
    #[arg(long)]
    pub list: bool,

    /// Write the final drawing to this SVG file.
    #[arg(short, long, value_name = "SVG")]
    pub output: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 1100)]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 760)]
    pub height: u32,
}

pub struct CladeView;

impl CladeView {
    pub fn run(config: &AppConfig) -> Result<()> {
        let bundle = io::load_trees(&config.tree_path)?;
        ui::render_summary(&bundle);
        let tree = bundle
            .trees
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no tree to show"))?;

        let table: Rc<dyn MetadataTable> = Rc::new(Self::load_table(config)?);
        let surface = shared(SvgSurface::new(config.width, config.height));
        let legend = shared(LegendPanel::new());
        let view = shared(PhyloView::new(tree, table.clone(), surface.clone()));

        let mut panel = ViewController::new(view.clone(), legend.clone());
        let resolution = if config.strict_names {
            NameResolution::Strict
        } else {
            NameResolution::FirstMatch
        };
        let mut menu =
            NodeInspector::new(view.clone(), table, surface.clone()).with_resolution(resolution);

        if config.list {
            ui::print_options(
                &menu.selectable_columns(),
                &panel.color_maps(),
                &panel.layout_options(),
            );
            return Ok(());
        }

        if let Some(layout) = &config.layout {
            panel.apply_layout(layout)?;
        }

        match &config.color_by {
            Some(column) => {
                Self::apply_coloring(&mut panel, column, config)?;
                ui::print_legend(&legend.borrow());
            }
            None => view.borrow_mut().draw_tree(),
        }

        for column in &config.columns {
            menu.add_sample_column(column)?;
        }
        if !config.columns.is_empty() && config.select.is_none() {
            warn!("--column given without --select; nothing to report");
        }

        if let Some(node) = &config.select {
            menu.select(node)?;
            if let Some(report) = menu.report() {
                ui::print_report(report, menu.anchor());
            }
        }

        if let Some(dest) = &config.output {
            surface.borrow().save(dest, Some(&*legend.borrow()))?;
            info!("wrote {}", dest.display());
        }

        Ok(())
    }

    /// Set every coloring control, then draw once through the update button.
    fn apply_coloring<M: ViewModel>(
        panel: &mut ViewController<M>,
        column: &str,
        config: &AppConfig,
    ) -> Result<()> {
        panel.set_sample_coloring_enabled(true);
        panel.select_column(column)?;
        panel.select_color_map(&config.color_map)?;
        panel.set_line_width(config.line_width);
        panel.set_hide_non_sample_branches(config.hide_non_sample);
        panel.update_sample()?;
        Ok(())
    }

    fn load_table(config: &AppConfig) -> Result<BiomTable> {
        let features = match &config.table_path {
            Some(path) => io::load_feature_table(path)?,
            None => FeatureTable::default(),
        };
        let metadata = match &config.metadata_path {
            Some(path) => io::load_sample_metadata(path)?,
            None => SampleMetadata::default(),
        };
        if config.table_path.is_some() != config.metadata_path.is_some() {
            warn!("--table and --metadata only work together; sample queries will be empty");
        }

        let table = BiomTable::new(&features, &metadata);
        if table.sample_count() == 0 && config.table_path.is_some() {
            bail!("no sample appears in both the feature table and the metadata");
        }
        info!(
            "sample table: {} samples, {} observations",
            table.sample_count(),
            table.observation_count()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::view::tests::sample_view;

    #[test]
    fn defaults_match_the_side_panel() {
        let config = AppConfig::parse_from(["cladeview", "tree.nwk"]);
        assert_eq!(config.color_map, "discrete-coloring-qiime");
        assert_eq!(config.line_width, 1.0);
        assert!(config.columns.is_empty());
        assert!(!config.strict_names);
        assert!(!config.list);
    }

    #[test]
    fn coloring_from_flags_draws_once() {
        let config = AppConfig::parse_from([
            "cladeview",
            "tree.nwk",
            "--color-by",
            "Site",
            "--line-width",
            "2.5",
            "--hide-non-sample",
        ]);
        let (view, surface) = sample_view();
        let legend = shared(LegendPanel::new());
        let mut panel = ViewController::new(view, legend.clone());

        CladeView::apply_coloring(&mut panel, "Site", &config).unwrap();

        assert_eq!(surface.borrow().redraw_count(), 1);
        assert!(!panel.controls().update_pending);
        assert_eq!(legend.borrow().keys()[0].title, "Site");
        let surface = surface.borrow();
        let frame = surface.last_frame().unwrap();
        assert_eq!(frame.visible_branches().count(), 4);
        assert!(frame.visible_branches().all(|branch| branch.width == 2.5));
    }

    #[test]
    fn columns_repeat() {
        let config = AppConfig::parse_from([
            "cladeview",
            "tree.nwk",
            "--column",
            "Site",
            "--column",
            "Host",
            "--select",
            "X",
            "--strict-names",
        ]);
        assert_eq!(config.columns, vec!["Site", "Host"]);
        assert_eq!(config.select.as_deref(), Some("X"));
        assert!(config.strict_names);
    }
}
