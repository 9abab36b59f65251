use std::path::Path;

use anyhow::{Context, Result};
use svg::node::element::{Circle, Group, Line, Rectangle, Text};
use svg::Document;

use super::legend::LegendPanel;
use super::{RenderFrame, RenderSurface, ScreenTransform};

const MARGIN: f32 = 40.0;
const HIGHLIGHT_RADIUS: f32 = 6.0;

/// Render surface that keeps the last frame and serialises it as SVG.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f32,
    height: f32,
    transform: ScreenTransform,
    frame: Option<RenderFrame>,
    highlight: Vec<f32>,
    redraws: usize,
}

impl SvgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            transform: ScreenTransform::identity(),
            frame: None,
            highlight: Vec::new(),
            redraws: 0,
        }
    }

    pub fn redraw_count(&self) -> usize {
        self.redraws
    }

    pub fn highlight_buffer(&self) -> &[f32] {
        &self.highlight
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.frame.as_ref()
    }

    pub fn document(&self, legend: Option<&LegendPanel>) -> Document {
        let mut document = Document::new()
            .set("width", self.width)
            .set("height", self.height)
            .set("viewBox", (0, 0, self.width as i32, self.height as i32));

        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", "white");
        document = document.add(background);

        if let Some(frame) = &self.frame {
            document = document.add(self.tree_group(frame));
        }

        // Buffer layout is [x, y, r, g, b] in layout space.
        if let &[x, y, r, g, b, ..] = self.highlight.as_slice() {
            let (sx, sy) = self.transform.apply(x, y);
            let fill = format!(
                "rgb({},{},{})",
                (r * 255.0) as u8,
                (g * 255.0) as u8,
                (b * 255.0) as u8
            );
            document = document.add(
                Circle::new()
                    .set("id", "selected-node")
                    .set("cx", sx)
                    .set("cy", sy)
                    .set("r", HIGHLIGHT_RADIUS)
                    .set("fill", fill),
            );
        }

        if let Some(legend) = legend.filter(|legend| !legend.is_empty()) {
            document = document.add(legend_group(legend));
        }

        document
    }

    pub fn save(&self, path: &Path, legend: Option<&LegendPanel>) -> Result<()> {
        svg::save(path, &self.document(legend))
            .with_context(|| format!("failed to write SVG: {}", path.display()))
    }

    fn tree_group(&self, frame: &RenderFrame) -> Group {
        let mut group = Group::new().set("id", "tree");

        for branch in frame.visible_branches() {
            let (x1, y1) = self.transform.apply(branch.from.0, branch.from.1);
            let (x2, y2) = self.transform.apply(branch.to.0, branch.to.1);
            let line = Line::new()
                .set("x1", x1)
                .set("y1", y1)
                .set("x2", x2)
                .set("y2", y2)
                .set("stroke", branch.color.to_hex())
                .set("stroke-width", branch.width);
            group = group.add(line);
        }

        for label in &frame.labels {
            let (x, y) = self.transform.apply(label.at.0, label.at.1);
            let text = Text::new("")
                .set("x", x + 4.0)
                .set("y", y)
                .set("font-size", 10.0)
                .set("dominant-baseline", "middle")
                .add(svg::node::Text::new(label.text.clone()));
            group = group.add(text);
        }

        group
    }
}

impl RenderSurface for SvgSurface {
    fn project_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        self.transform.apply(x, y)
    }

    fn set_highlight_buffer(&mut self, data: &[f32]) {
        self.highlight = data.to_vec();
    }

    fn redraw(&mut self, frame: &RenderFrame) {
        self.transform = ScreenTransform::fit(
            frame.kind,
            frame.width,
            frame.height,
            (self.width, self.height),
            MARGIN,
        );
        self.frame = Some(frame.clone());
        self.redraws += 1;
    }

    fn is_drawn(&self) -> bool {
        self.frame.is_some()
    }
}

fn legend_group(legend: &LegendPanel) -> Group {
    let mut group = Group::new().set("id", "legend");
    let mut y = 16.0f32;

    for key in legend.keys() {
        let title = Text::new("")
            .set("x", 8.0)
            .set("y", y)
            .set("font-size", 11.0)
            .set("font-weight", "bold")
            .add(svg::node::Text::new(key.title.clone()));
        group = group.add(title);
        y += 14.0;

        for (category, color) in &key.entries {
            group = group.add(
                Rectangle::new()
                    .set("x", 8.0)
                    .set("y", y - 9.0)
                    .set("width", 10.0)
                    .set("height", 10.0)
                    .set("fill", color.to_hex()),
            );
            group = group.add(
                Text::new("")
                    .set("x", 22.0)
                    .set("y", y)
                    .set("font-size", 10.0)
                    .add(svg::node::Text::new(category.clone())),
            );
            y += 14.0;
        }
    }

    group
}
