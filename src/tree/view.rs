use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use log::{debug, info};

use super::layout::{LayoutKind, TreeLayout};
use super::traversal::{TraversalIndex, TreeTraversal};
use super::{NodeId, Tree};
use crate::colorer::{ColorMap, Rgb};
use crate::error::{PanelError, PanelResult};
use crate::metadata::MetadataTable;
use crate::render::{BranchSegment, RenderFrame, RenderSurface, Shared, TipLabel};

pub const DEFAULT_BRANCH_WIDTH: f32 = 1.0;
pub const DEFAULT_BRANCH_COLOR: Rgb = Rgb::BLACK;

/// What the panels need from the tree being shown.
pub trait ViewModel {
    fn traversal(&self) -> &dyn TreeTraversal;

    /// Layout-space coordinates of the node at `pos`.
    fn node_coords(&self, pos: NodeId) -> Option<(f32, f32)>;

    fn sample_categories(&self) -> Vec<String>;

    /// Color branches by the categories of `column`; returns the legend mapping.
    fn color_by_sample_category(
        &mut self,
        column: &str,
        map: ColorMap,
    ) -> PanelResult<BTreeMap<String, Rgb>>;

    /// Hide (or show) branches that no sample category claimed.
    fn set_non_sample_branch_visibility(&mut self, hide: bool);

    /// Widen sample-colored branches by `amount`.
    fn thicken_sample_branches(&mut self, amount: f32);

    fn reset_tree(&mut self);

    /// Switch layouts. `Ok(false)` when `name` is already active.
    fn update_layout(&mut self, name: &str) -> PanelResult<bool>;

    fn draw_tree(&mut self);

    fn available_layouts(&self) -> Vec<&'static str>;

    fn default_layout(&self) -> &'static str;

    fn current_layout(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchStyle {
    pub color: Rgb,
    pub width: f32,
    pub visible: bool,
}

impl Default for BranchStyle {
    fn default() -> Self {
        Self {
            color: DEFAULT_BRANCH_COLOR,
            width: DEFAULT_BRANCH_WIDTH,
            visible: true,
        }
    }
}

/// A tree plus its traversal index, layout, and per-branch styling.
pub struct PhyloView {
    tree: Tree,
    index: TraversalIndex,
    table: Rc<dyn MetadataTable>,
    surface: Shared<dyn RenderSurface>,
    layout_kind: LayoutKind,
    layout: Option<TreeLayout>,
    styles: Vec<BranchStyle>,
    sample_branches: HashSet<NodeId>,
}

impl PhyloView {
    pub const DEFAULT_LAYOUT: LayoutKind = LayoutKind::Rectangular;

    pub fn new(
        tree: Tree,
        table: Rc<dyn MetadataTable>,
        surface: Shared<dyn RenderSurface>,
    ) -> Self {
        let index = TraversalIndex::new(&tree);
        let layout = TreeLayout::from_tree(&tree, Self::DEFAULT_LAYOUT);
        let styles = vec![BranchStyle::default(); tree.nodes.len()];
        Self {
            tree,
            index,
            table,
            surface,
            layout_kind: Self::DEFAULT_LAYOUT,
            layout,
            styles,
            sample_branches: HashSet::new(),
        }
    }

    pub fn branch_style(&self, node_id: NodeId) -> Option<&BranchStyle> {
        self.styles.get(node_id)
    }

    pub fn sample_branches(&self) -> &HashSet<NodeId> {
        &self.sample_branches
    }

    /// Category each node belongs to, if any.
    ///
    /// A tip belongs to a category when every sample containing it shares that
    /// category; an internal node when all of its children share one.
    fn project_categories(
        &self,
        groups: &BTreeMap<String, BTreeSet<String>>,
    ) -> Vec<Option<String>> {
        let mut owner: HashMap<&str, Option<&String>> = HashMap::new();
        for (category, observations) in groups {
            for obs in observations {
                owner
                    .entry(obs.as_str())
                    .and_modify(|current| *current = None)
                    .or_insert(Some(category));
            }
        }

        let mut assigned: Vec<Option<String>> = vec![None; self.tree.nodes.len()];
        for &node_id in self.index.postorder_nodes() {
            let children = self.index.children(node_id);
            assigned[node_id] = if children.is_empty() {
                self.index
                    .name(node_id)
                    .and_then(|name| owner.get(name).copied().flatten())
                    .cloned()
            } else {
                let first = assigned[children[0]].clone();
                match first {
                    Some(category)
                        if children
                            .iter()
                            .all(|&child| assigned[child].as_ref() == Some(&category)) =>
                    {
                        Some(category)
                    }
                    _ => None,
                }
            };
        }

        assigned
    }

    fn build_frame(&self) -> RenderFrame {
        let Some(layout) = &self.layout else {
            return RenderFrame {
                kind: self.layout_kind,
                width: 1.0,
                height: 1.0,
                branches: Vec::new(),
                labels: Vec::new(),
            };
        };

        let branches = layout
            .edges
            .iter()
            .map(|&(parent, child)| {
                let style = self.styles[child];
                BranchSegment {
                    child,
                    from: layout.positions[parent],
                    to: layout.positions[child],
                    color: style.color,
                    width: style.width,
                    visible: style.visible,
                }
            })
            .collect();

        let labels = self
            .tree
            .external_nodes()
            .into_iter()
            .filter(|node| self.styles[node.id].visible)
            .filter_map(|node| {
                node.name.as_ref().map(|name| TipLabel {
                    node: node.id,
                    text: name.clone(),
                    at: layout.positions[node.id],
                })
            })
            .collect();

        RenderFrame {
            kind: layout.kind,
            width: layout.width,
            height: layout.height,
            branches,
            labels,
        }
    }
}

impl ViewModel for PhyloView {
    fn traversal(&self) -> &dyn TreeTraversal {
        &self.index
    }

    fn node_coords(&self, pos: NodeId) -> Option<(f32, f32)> {
        self.layout.as_ref()?.position(pos)
    }

    fn sample_categories(&self) -> Vec<String> {
        self.table.sample_categories()
    }

    fn color_by_sample_category(
        &mut self,
        column: &str,
        map: ColorMap,
    ) -> PanelResult<BTreeMap<String, Rgb>> {
        let groups = self.table.observations_by_category(column)?;
        let assigned = self.project_categories(&groups);

        let colors = map.assign(assigned.iter().flatten());
        for (node_id, category) in assigned.iter().enumerate() {
            if let Some(color) = category.as_ref().and_then(|category| colors.get(category)) {
                self.styles[node_id].color = *color;
                self.sample_branches.insert(node_id);
            }
        }

        info!(
            "colored {} branches by {column} ({} categories, {map})",
            self.sample_branches.len(),
            colors.len()
        );
        Ok(colors)
    }

    fn set_non_sample_branch_visibility(&mut self, hide: bool) {
        for (node_id, style) in self.styles.iter_mut().enumerate() {
            if !self.sample_branches.contains(&node_id) {
                style.visible = !hide;
            }
        }
    }

    fn thicken_sample_branches(&mut self, amount: f32) {
        for &node_id in &self.sample_branches {
            self.styles[node_id].width = DEFAULT_BRANCH_WIDTH + amount;
        }
    }

    fn reset_tree(&mut self) {
        self.styles.fill(BranchStyle::default());
        self.sample_branches.clear();
    }

    fn update_layout(&mut self, name: &str) -> PanelResult<bool> {
        let kind =
            LayoutKind::from_name(name).ok_or_else(|| PanelError::UnknownLayout(name.to_string()))?;
        if kind == self.layout_kind {
            debug!("layout {kind} already active");
            return Ok(false);
        }

        self.layout_kind = kind;
        self.layout = TreeLayout::from_tree(&self.tree, kind);
        info!("switched layout to {kind}");
        Ok(true)
    }

    fn draw_tree(&mut self) {
        let frame = self.build_frame();
        self.surface.borrow_mut().redraw(&frame);
    }

    fn available_layouts(&self) -> Vec<&'static str> {
        LayoutKind::ALL.iter().map(|kind| kind.name()).collect()
    }

    fn default_layout(&self) -> &'static str {
        Self::DEFAULT_LAYOUT.name()
    }

    fn current_layout(&self) -> &'static str {
        self.layout_kind.name()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metadata::sample_table;
    use crate::render::shared;
    use crate::render::svg_surface::SvgSurface;
    use crate::tree::{caterpillar, sample_tree};

    pub(crate) fn sample_view() -> (Shared<PhyloView>, Shared<SvgSurface>) {
        let surface = shared(SvgSurface::new(400, 300));
        let view = PhyloView::new(sample_tree(), Rc::new(sample_table()), surface.clone());
        (shared(view), surface)
    }

    #[test]
    fn categories_project_to_shared_ancestors() {
        let (view, _) = sample_view();
        let mut view = view.borrow_mut();
        let colors = view.color_by_sample_category("Site", ColorMap::DiscreteQiime).unwrap();

        // D occurs in skin and soil samples, so it is left uncolored and soil drops out.
        assert_eq!(colors.keys().cloned().collect::<Vec<_>>(), vec!["gut", "skin"]);
        let mut colored: Vec<_> = view.sample_branches().iter().copied().collect();
        colored.sort();
        assert_eq!(colored, vec![3, 4, 5, 6]);
        assert_eq!(view.branch_style(4).unwrap().color, colors["skin"]);
        assert_eq!(view.branch_style(1).unwrap().color, DEFAULT_BRANCH_COLOR);
    }

    #[test]
    fn hiding_and_thickening_touch_the_right_branches() {
        let (view, surface) = sample_view();
        {
            let mut view = view.borrow_mut();
            view.color_by_sample_category("Site", ColorMap::DiscreteQiime).unwrap();
            view.set_non_sample_branch_visibility(true);
            view.thicken_sample_branches(2.0);
            view.draw_tree();
        }

        let surface = surface.borrow();
        let frame = surface.last_frame().unwrap();
        let mut visible: Vec<_> = frame.visible_branches().map(|branch| branch.child).collect();
        visible.sort();
        assert_eq!(visible, vec![3, 4, 5, 6]);
        assert!(frame.visible_branches().all(|branch| branch.width == 3.0));
        assert!(frame.labels.iter().all(|label| label.text != "D"));
    }

    #[test]
    fn reset_restores_defaults() {
        let (view, _) = sample_view();
        let mut view = view.borrow_mut();
        view.color_by_sample_category("Site", ColorMap::Set1).unwrap();
        view.set_non_sample_branch_visibility(true);
        view.reset_tree();

        assert!(view.sample_branches().is_empty());
        assert!((0..7).all(|id| *view.branch_style(id).unwrap() == BranchStyle::default()));
    }

    #[test]
    fn unknown_column_leaves_styles_untouched() {
        let (view, _) = sample_view();
        let mut view = view.borrow_mut();
        let err = view
            .color_by_sample_category("Depth", ColorMap::DiscreteQiime)
            .unwrap_err();
        assert_eq!(err, PanelError::InvalidColumn("Depth".to_string()));
        assert!(view.sample_branches().is_empty());
    }

    #[test]
    fn update_layout_reports_changes_only() {
        let (view, _) = sample_view();
        let mut view = view.borrow_mut();
        assert_eq!(view.current_layout(), "Rectangular");
        assert_eq!(view.update_layout("Rectangular"), Ok(false));
        assert_eq!(view.update_layout("Circular"), Ok(true));
        assert_eq!(view.current_layout(), "Circular");
        assert_eq!(
            view.update_layout("Daylight"),
            Err(PanelError::UnknownLayout("Daylight".to_string()))
        );
        assert_eq!(view.current_layout(), "Circular");
    }

    #[test]
    fn deep_caterpillar_lays_out_in_every_layout() {
        let depth = 100_000;
        let surface = shared(SvgSurface::new(400, 300));
        let mut view = PhyloView::new(caterpillar(depth), Rc::new(sample_table()), surface.clone());
        assert_eq!(view.default_layout(), "Rectangular");
        assert_eq!(view.current_layout(), view.default_layout());

        for layout in ["Circular", "Unrooted", "Rectangular"] {
            assert_eq!(view.update_layout(layout), Ok(true));
            view.draw_tree();
        }

        assert_eq!(surface.borrow().redraw_count(), 3);
        assert_eq!(
            surface.borrow().last_frame().map(|frame| frame.labels.len()),
            Some(depth + 1)
        );
        // The deepest tip sits one unit per level from the root.
        assert_eq!(view.node_coords(2 * depth).map(|(x, _)| x), Some(depth as f32));
    }
}
