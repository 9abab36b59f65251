use std::rc::Rc;

use log::debug;

use crate::error::{PanelError, PanelResult};
use crate::metadata::MetadataTable;
use crate::render::{RenderSurface, Shared};
use crate::tree::traversal::{subtree_tip_names, TreeTraversal};
use crate::tree::view::ViewModel;
use crate::tree::NodeId;

/// Screen offset of the menu from the selected node, so it sits beside the node.
pub const MENU_OFFSET: (f32, f32) = (23.0, -43.0);

/// Highlight color of the selected node (green), as unit RGB.
const SELECTED_NODE_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

/// Where a menu column's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnOrigin {
    Tree,
    Sample,
    Feature,
}

impl ColumnOrigin {
    pub fn tag(self) -> char {
        match self {
            ColumnOrigin::Tree => 't',
            ColumnOrigin::Sample => 's',
            ColumnOrigin::Feature => 'f',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuColumn {
    pub name: String,
    pub origin: ColumnOrigin,
}

/// How a name shared by several nodes is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameResolution {
    /// Use the node with the lowest postorder key.
    #[default]
    FirstMatch,
    /// Refuse names that match more than one node.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub column: String,
    pub origin: ColumnOrigin,
    /// `(category, count)` in ascending category order.
    pub counts: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub id: String,
    pub kind: NodeKind,
    /// Named tips under an internal node; empty for leaves.
    pub tips: Vec<String>,
    pub rows: Vec<ReportRow>,
}

/// Context menu describing the selected node's metadata.
pub struct NodeInspector<M: ViewModel> {
    model: Shared<M>,
    table: Rc<dyn MetadataTable>,
    surface: Shared<dyn RenderSurface>,
    resolution: NameResolution,
    columns: Vec<MenuColumn>,
    node: Option<String>,
    report: Option<NodeReport>,
    anchor: Option<(i32, i32)>,
}

impl<M: ViewModel> NodeInspector<M> {
    pub fn new(
        model: Shared<M>,
        table: Rc<dyn MetadataTable>,
        surface: Shared<dyn RenderSurface>,
    ) -> Self {
        Self {
            model,
            table,
            surface,
            resolution: NameResolution::default(),
            columns: Vec::new(),
            node: None,
            report: None,
            anchor: None,
        }
    }

    pub fn with_resolution(mut self, resolution: NameResolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sample columns offered in the "add column" selector.
    pub fn selectable_columns(&self) -> Vec<String> {
        self.table.sample_categories()
    }

    pub fn columns(&self) -> &[MenuColumn] {
        &self.columns
    }

    /// Append a column to the menu. Columns are never removed.
    pub fn add_menu_column(&mut self, name: &str, origin: ColumnOrigin) -> PanelResult<()> {
        if !self.table.sample_categories().iter().any(|column| column == name) {
            return Err(PanelError::InvalidColumn(name.to_string()));
        }
        self.columns.push(MenuColumn {
            name: name.to_string(),
            origin,
        });
        Ok(())
    }

    /// The "add" button: register a sample column and re-render the open menu.
    pub fn add_sample_column(&mut self, name: &str) -> PanelResult<Option<&NodeReport>> {
        self.add_menu_column(name, ColumnOrigin::Sample)?;
        match self.node.clone() {
            Some(node) => self.show_node_menu(&node).map(Some),
            None => Ok(None),
        }
    }

    /// Select `name`: highlight it, build its report and open the menu beside it.
    ///
    /// A tree that was never drawn is drawn first, so the menu anchor goes
    /// through a fitted screen transform.
    pub fn select(&mut self, name: &str) -> PanelResult<&NodeReport> {
        let (pos, report) = self.build_report(name)?;
        let drawn = self.surface.borrow().is_drawn();
        if !drawn {
            self.model.borrow_mut().draw_tree();
        }
        let (x, y) = self.model.borrow().node_coords(pos).unwrap_or_default();

        let [r, g, b] = SELECTED_NODE_COLOR;
        self.surface
            .borrow_mut()
            .set_highlight_buffer(&[x, y, r, g, b]);
        self.node = Some(name.to_string());
        Ok(self.open(pos, report))
    }

    /// Close the menu and drop the highlight.
    pub fn clear(&mut self) {
        self.report = None;
        self.node = None;
        self.anchor = None;
        self.surface.borrow_mut().set_highlight_buffer(&[]);
    }

    pub fn selected(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn report(&self) -> Option<&NodeReport> {
        self.report.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.anchor.is_some()
    }

    /// Screen position of the menu's top-left corner while it is shown.
    pub fn anchor(&self) -> Option<(i32, i32)> {
        self.anchor
    }

    fn show_node_menu(&mut self, name: &str) -> PanelResult<&NodeReport> {
        let (pos, report) = self.build_report(name)?;
        Ok(self.open(pos, report))
    }

    fn build_report(&self, name: &str) -> PanelResult<(NodeId, NodeReport)> {
        let pos = self.resolve(name)?;
        let model = self.model.borrow();
        let tree = model.traversal();
        let report = if tree.is_leaf(pos) {
            self.leaf_report(name)?
        } else {
            self.internal_report(tree, name, pos)?
        };
        Ok((pos, report))
    }

    fn open(&mut self, pos: NodeId, report: NodeReport) -> &NodeReport {
        let (x, y) = self.model.borrow().node_coords(pos).unwrap_or_default();
        let (sx, sy) = self.surface.borrow().project_to_screen(x, y);
        self.anchor = Some((
            (sx + MENU_OFFSET.0).floor() as i32,
            (sy + MENU_OFFSET.1).floor() as i32,
        ));

        debug!(
            "node menu for {}: {:?} with {} rows",
            report.id,
            report.kind,
            report.rows.len()
        );
        self.report.insert(report)
    }

    fn resolve(&self, name: &str) -> PanelResult<NodeId> {
        let model = self.model.borrow();
        let tree = model.traversal();
        let keys = tree.name_to_keys(name);

        let key = match (keys, self.resolution) {
            ([], _) => return Err(PanelError::NodeNotFound(name.to_string())),
            ([key], _) | ([key, ..], NameResolution::FirstMatch) => *key,
            (keys, NameResolution::Strict) => {
                return Err(PanelError::AmbiguousNode {
                    name: name.to_string(),
                    count: keys.len(),
                })
            }
        };

        tree.postorder_select(key)
            .ok_or_else(|| PanelError::NodeNotFound(name.to_string()))
    }

    /// Leaf rows list only the categories observed for that tip.
    fn leaf_report(&self, name: &str) -> PanelResult<NodeReport> {
        let rows = self
            .columns
            .iter()
            .map(|column| {
                let counts = self.table.obs_counts_by(&column.name, name)?;
                Ok(ReportRow {
                    column: column.name.clone(),
                    origin: column.origin,
                    counts: counts.into_iter().collect(),
                })
            })
            .collect::<PanelResult<Vec<_>>>()?;

        Ok(NodeReport {
            id: name.to_string(),
            kind: NodeKind::Leaf,
            tips: Vec::new(),
            rows,
        })
    }

    /// Internal rows list every category of the column, zero-filled.
    fn internal_report(
        &self,
        tree: &dyn TreeTraversal,
        name: &str,
        pos: NodeId,
    ) -> PanelResult<NodeReport> {
        let tips = subtree_tip_names(tree, pos);
        let samples = self.table.samples_for_observations(&tips);

        let rows = self
            .columns
            .iter()
            .map(|column| {
                let observed = self.table.sample_value_counts(&samples, &column.name)?;
                let counts = self
                    .table
                    .unique_sample_values(&column.name)?
                    .into_iter()
                    .map(|category| {
                        let count = observed.get(&category).copied().unwrap_or(0);
                        (category, count)
                    })
                    .collect();
                Ok(ReportRow {
                    column: column.name.clone(),
                    origin: column.origin,
                    counts,
                })
            })
            .collect::<PanelResult<Vec<_>>>()?;

        Ok(NodeReport {
            id: name.to_string(),
            kind: NodeKind::Internal,
            tips,
            rows,
        })
    }
}
