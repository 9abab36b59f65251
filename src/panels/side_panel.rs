use log::{debug, info};

use crate::colorer::ColorMap;
use crate::error::{PanelError, PanelResult};
use crate::render::legend::{Legend, LegendAxis};
use crate::render::Shared;
use crate::tree::view::{ViewModel, DEFAULT_BRANCH_WIDTH};

/// Current values of the sample coloring controls.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleControls {
    pub enabled: bool,
    pub column: Option<String>,
    pub color_map: ColorMap,
    pub line_width: f32,
    pub hide_non_sample: bool,
    /// Set when a control changed since the last update.
    pub update_pending: bool,
}

impl Default for SampleControls {
    fn default() -> Self {
        Self {
            enabled: false,
            column: None,
            color_map: ColorMap::default(),
            line_width: DEFAULT_BRANCH_WIDTH,
            hide_non_sample: false,
            update_pending: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOption {
    pub name: &'static str,
    pub checked: bool,
}

/// Side panel turning coloring and layout choices into redraws.
pub struct ViewController<M: ViewModel> {
    model: Shared<M>,
    legend: Shared<dyn Legend>,
    controls: SampleControls,
    /// Layout checked in the layout tab.
    layout: &'static str,
    panel_visible: bool,
}

impl<M: ViewModel> ViewController<M> {
    pub fn new(model: Shared<M>, legend: Shared<dyn Legend>) -> Self {
        let layout = model.borrow().default_layout();
        Self {
            model,
            legend,
            controls: SampleControls::default(),
            layout,
            panel_visible: true,
        }
    }

    pub fn controls(&self) -> &SampleControls {
        &self.controls
    }

    /// One entry per layout; the default one is checked until another is applied.
    pub fn layout_options(&self) -> Vec<LayoutOption> {
        self.model
            .borrow()
            .available_layouts()
            .into_iter()
            .map(|name| LayoutOption {
                name,
                checked: name == self.layout,
            })
            .collect()
    }

    pub fn sample_columns(&self) -> Vec<String> {
        self.model.borrow().sample_categories()
    }

    pub fn color_maps(&self) -> Vec<&'static str> {
        ColorMap::ALL.iter().map(|map| map.id()).collect()
    }

    /// The sample coloring checkbox. Unchecking closes the coloring entirely.
    pub fn set_sample_coloring_enabled(&mut self, enabled: bool) {
        if enabled {
            self.controls.enabled = true;
            self.controls.update_pending = true;
        } else {
            self.reset_sample_panel();
        }
    }

    pub fn select_column(&mut self, column: &str) -> PanelResult<()> {
        if !self.sample_columns().iter().any(|name| name == column) {
            return Err(PanelError::InvalidColumn(column.to_string()));
        }
        self.controls.column = Some(column.to_string());
        self.controls.update_pending = true;
        Ok(())
    }

    pub fn select_color_map(&mut self, id: &str) -> PanelResult<()> {
        self.controls.color_map = ColorMap::from_id(id)?;
        self.controls.update_pending = true;
        Ok(())
    }

    /// Widths below the default branch width are raised to it.
    pub fn set_line_width(&mut self, width: f32) {
        self.controls.line_width = width.max(DEFAULT_BRANCH_WIDTH);
        self.controls.update_pending = true;
    }

    /// Set the hide checkbox without redrawing; the next update applies it.
    pub fn set_hide_non_sample_branches(&mut self, hide: bool) {
        self.controls.hide_non_sample = hide;
        self.controls.update_pending = true;
    }

    /// The hide checkbox takes effect without pressing update.
    pub fn toggle_non_sample_branches(&mut self, hide: bool) {
        self.controls.hide_non_sample = hide;
        let mut model = self.model.borrow_mut();
        model.set_non_sample_branch_visibility(hide);
        model.draw_tree();
    }

    /// The update button: apply the current controls.
    pub fn update_sample(&mut self) -> PanelResult<()> {
        let column = self
            .controls
            .column
            .clone()
            .ok_or(PanelError::NoColumnSelected)?;
        let SampleControls {
            color_map,
            line_width,
            hide_non_sample,
            ..
        } = self.controls;

        self.apply_sample_coloring(&column, color_map, line_width, hide_non_sample)?;
        self.controls.update_pending = false;
        Ok(())
    }

    pub fn apply_sample_coloring(
        &mut self,
        column: &str,
        color_map: ColorMap,
        line_width: f32,
        hide_non_sample: bool,
    ) -> PanelResult<()> {
        if !self.sample_columns().iter().any(|name| name == column) {
            return Err(PanelError::InvalidColumn(column.to_string()));
        }

        let colors = {
            let mut model = self.model.borrow_mut();
            model.reset_tree();
            let colors = model.color_by_sample_category(column, color_map)?;
            model.set_non_sample_branch_visibility(hide_non_sample);
            let line_width = line_width.max(DEFAULT_BRANCH_WIDTH);
            if line_width != DEFAULT_BRANCH_WIDTH {
                model.thicken_sample_branches(line_width - DEFAULT_BRANCH_WIDTH);
            }
            model.draw_tree();
            colors
        };

        self.legend
            .borrow_mut()
            .add_color_key(column, &colors, LegendAxis::Node, color_map.is_sequential());
        info!("sample coloring applied: {column} with {color_map}");
        Ok(())
    }

    /// Switch layouts, dropping any coloring on the current drawing.
    pub fn apply_layout(&mut self, name: &str) -> PanelResult<()> {
        let known = self
            .model
            .borrow()
            .available_layouts()
            .iter()
            .any(|layout| layout.eq_ignore_ascii_case(name));
        if !known {
            return Err(PanelError::UnknownLayout(name.to_string()));
        }

        {
            let mut model = self.model.borrow_mut();
            model.reset_tree();
            let changed = model.update_layout(name)?;
            debug!("apply layout {name}: changed={changed}");
            model.draw_tree();
            self.layout = model.current_layout();
        }
        self.legend.borrow_mut().clear_all_legends();
        self.controls.update_pending = self.controls.enabled;
        Ok(())
    }

    /// Restore every control to its default and redraw the uncolored tree.
    pub fn reset_sample_panel(&mut self) {
        self.controls = SampleControls::default();
        {
            let mut model = self.model.borrow_mut();
            model.reset_tree();
            model.draw_tree();
        }
        self.legend.borrow_mut().clear_all_legends();
    }

    pub fn collapse(&mut self) {
        self.panel_visible = false;
    }

    pub fn show(&mut self) {
        self.panel_visible = true;
    }

    pub fn is_panel_visible(&self) -> bool {
        self.panel_visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::legend::LegendPanel;
    use crate::render::shared;
    use crate::render::svg_surface::SvgSurface;
    use crate::tree::view::tests::sample_view;
    use crate::tree::view::PhyloView;

    struct Fixture {
        panel: ViewController<PhyloView>,
        surface: Shared<SvgSurface>,
        legend: Shared<LegendPanel>,
    }

    fn fixture() -> Fixture {
        let (view, surface) = sample_view();
        let legend = shared(LegendPanel::new());
        let panel = ViewController::new(view, legend.clone());
        Fixture {
            panel,
            surface,
            legend,
        }
    }

    #[test]
    fn reapplying_a_layout_redraws_without_changing_it() {
        let mut fx = fixture();
        fx.panel.apply_layout("Circular").unwrap();
        fx.panel.apply_layout("Circular").unwrap();

        assert_eq!(fx.surface.borrow().redraw_count(), 2);
        assert_eq!(fx.panel.model.borrow().current_layout(), "Circular");
        let checked: Vec<_> = fx
            .panel
            .layout_options()
            .into_iter()
            .filter(|option| option.checked)
            .map(|option| option.name)
            .collect();
        assert_eq!(checked, vec!["Circular"]);
    }

    #[test]
    fn layout_tab_starts_on_the_default_layout() {
        let fx = fixture();
        let options = fx.panel.layout_options();
        assert_eq!(options.len(), 3);
        let checked: Vec<_> = options
            .iter()
            .filter(|option| option.checked)
            .map(|option| option.name)
            .collect();
        assert_eq!(checked, vec![fx.panel.model.borrow().default_layout()]);
        assert_eq!(fx.surface.borrow().redraw_count(), 0);
    }

    #[test]
    fn layout_names_match_case_insensitively() {
        let mut fx = fixture();
        fx.panel.apply_layout("unrooted").unwrap();
        let checked: Vec<_> = fx
            .panel
            .layout_options()
            .into_iter()
            .filter(|option| option.checked)
            .map(|option| option.name)
            .collect();
        assert_eq!(checked, vec!["Unrooted"]);
    }

    #[test]
    fn color_map_choices_start_with_the_default() {
        let fx = fixture();
        let maps = fx.panel.color_maps();
        assert_eq!(maps.len(), ColorMap::ALL.len());
        assert_eq!(maps[0], ColorMap::default().id());
        assert_eq!(maps[0], "discrete-coloring-qiime");
        assert!(maps.iter().all(|id| ColorMap::from_id(id).is_ok()));
    }

    #[test]
    fn unknown_layout_is_rejected_before_redraw() {
        let mut fx = fixture();
        assert_eq!(
            fx.panel.apply_layout("Daylight"),
            Err(PanelError::UnknownLayout("Daylight".to_string()))
        );
        assert_eq!(fx.surface.borrow().redraw_count(), 0);
    }

    #[test]
    fn coloring_updates_the_legend_for_the_node_axis() {
        let mut fx = fixture();
        fx.panel
            .apply_sample_coloring("Site", ColorMap::DiscreteQiime, 1.0, false)
            .unwrap();
        fx.panel
            .apply_sample_coloring("Host", ColorMap::Set1, 1.0, false)
            .unwrap();

        let legend = fx.legend.borrow();
        assert_eq!(legend.keys().len(), 1);
        assert_eq!(legend.keys()[0].title, "Host");
        assert_eq!(legend.keys()[0].axis, LegendAxis::Node);
    }

    #[test]
    fn coloring_is_idempotent() {
        let mut fx = fixture();
        fx.panel
            .apply_sample_coloring("Site", ColorMap::Dark2, 3.0, true)
            .unwrap();
        let first = fx.surface.borrow().last_frame().cloned();
        fx.panel
            .apply_sample_coloring("Site", ColorMap::Dark2, 3.0, true)
            .unwrap();

        assert_eq!(fx.surface.borrow().last_frame().cloned(), first);
        let frame = first.unwrap();
        assert!(frame.visible_branches().all(|branch| branch.width == 3.0));
    }

    #[test]
    fn invalid_column_leaves_the_drawing_alone() {
        let mut fx = fixture();
        assert_eq!(
            fx.panel
                .apply_sample_coloring("Depth", ColorMap::DiscreteQiime, 1.0, false),
            Err(PanelError::InvalidColumn("Depth".to_string()))
        );
        assert_eq!(fx.surface.borrow().redraw_count(), 0);
        assert!(fx.legend.borrow().is_empty());
    }

    #[test]
    fn control_changes_mark_an_update_pending() {
        let mut fx = fixture();
        assert_eq!(fx.panel.update_sample(), Err(PanelError::NoColumnSelected));

        fx.panel.set_sample_coloring_enabled(true);
        assert!(fx.panel.controls().update_pending);
        fx.panel.select_column("Site").unwrap();
        fx.panel.select_color_map("Viridis").unwrap();
        fx.panel.set_line_width(0.2);
        assert_eq!(fx.panel.controls().line_width, 1.0);

        fx.panel.update_sample().unwrap();
        assert!(!fx.panel.controls().update_pending);
        assert!(fx.legend.borrow().keys()[0].continuous);

        assert!(fx.panel.select_color_map("Rainbow").is_err());
        assert!(fx.panel.select_column("Depth").is_err());
        assert_eq!(fx.panel.controls().column.as_deref(), Some("Site"));
    }

    #[test]
    fn hide_toggle_redraws_immediately() {
        let mut fx = fixture();
        fx.panel
            .apply_sample_coloring("Site", ColorMap::DiscreteQiime, 1.0, false)
            .unwrap();
        fx.panel.toggle_non_sample_branches(true);

        assert_eq!(fx.surface.borrow().redraw_count(), 2);
        let surface = fx.surface.borrow();
        let frame = surface.last_frame().unwrap();
        assert_eq!(frame.visible_branches().count(), 4);
    }

    #[test]
    fn hide_setter_waits_for_update() {
        let mut fx = fixture();
        fx.panel.select_column("Site").unwrap();
        fx.panel.set_hide_non_sample_branches(true);
        assert!(fx.panel.controls().hide_non_sample);
        assert_eq!(fx.surface.borrow().redraw_count(), 0);

        fx.panel.update_sample().unwrap();
        assert_eq!(fx.surface.borrow().redraw_count(), 1);
        let surface = fx.surface.borrow();
        assert_eq!(surface.last_frame().unwrap().visible_branches().count(), 4);
    }

    #[test]
    fn reset_clears_controls_and_legend() {
        let mut fx = fixture();
        fx.panel.set_sample_coloring_enabled(true);
        fx.panel.select_column("Site").unwrap();
        fx.panel.update_sample().unwrap();

        fx.panel.set_sample_coloring_enabled(false);
        assert_eq!(fx.panel.controls(), &SampleControls::default());
        assert!(fx.legend.borrow().is_empty());
        assert!(fx.panel.model.borrow().sample_branches().is_empty());
    }

    #[test]
    fn panel_collapses_and_reopens() {
        let mut fx = fixture();
        fx.panel.collapse();
        assert!(!fx.panel.is_panel_visible());
        fx.panel.show();
        assert!(fx.panel.is_panel_visible());
    }
}
