use std::cell::RefCell;
use std::rc::Rc;

use crate::colorer::Rgb;
use crate::tree::layout::LayoutKind;
use crate::tree::NodeId;

pub mod legend;
pub mod svg_surface;

/// Handle shared between the panels and the model; everything runs on one thread.
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Surface the tree is drawn on.
pub trait RenderSurface {
    /// Map a layout-space point to screen pixels.
    fn project_to_screen(&self, x: f32, y: f32) -> (f32, f32);

    /// Replace the selected-node overlay. An empty slice clears it.
    fn set_highlight_buffer(&mut self, data: &[f32]);

    /// Draw a complete frame.
    fn redraw(&mut self, frame: &RenderFrame);

    /// Whether a frame has been drawn. Until then `project_to_screen` has no
    /// fitted transform to go through.
    fn is_drawn(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchSegment {
    pub child: NodeId,
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub color: Rgb,
    pub width: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TipLabel {
    pub node: NodeId,
    pub text: String,
    pub at: (f32, f32),
}

/// Everything needed to paint one frame, in layout coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub kind: LayoutKind,
    pub width: f32,
    pub height: f32,
    pub branches: Vec<BranchSegment>,
    pub labels: Vec<TipLabel>,
}

impl RenderFrame {
    pub fn visible_branches(&self) -> impl Iterator<Item = &BranchSegment> {
        self.branches.iter().filter(|branch| branch.visible)
    }
}

/// Layout-space to screen-space mapping for a viewport with a fixed margin.
///
/// Rectangular layouts stretch to fill the viewport; radial layouts use one
/// scale for both axes and are centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    scale_x: f32,
    scale_y: f32,
    offset_x: f32,
    offset_y: f32,
}

impl ScreenTransform {
    pub fn fit(kind: LayoutKind, width: f32, height: f32, viewport: (f32, f32), margin: f32) -> Self {
        let inner_w = (viewport.0 - 2.0 * margin).max(1.0);
        let inner_h = (viewport.1 - 2.0 * margin).max(1.0);

        let scale_x = if width <= f32::EPSILON { inner_w } else { inner_w / width };
        let scale_y = if height <= f32::EPSILON { inner_h } else { inner_h / height };

        if !kind.is_radial() {
            return Self {
                scale_x,
                scale_y,
                offset_x: margin,
                offset_y: margin,
            };
        }

        let scale = scale_x.min(scale_y);
        Self {
            scale_x: scale,
            scale_y: scale,
            offset_x: margin + (inner_w - width * scale) * 0.5,
            offset_y: margin + (inner_h - height * scale) * 0.5,
        }
    }

    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.offset_x + x * self.scale_x, self.offset_y + y * self.scale_y)
    }
}
