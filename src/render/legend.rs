use std::collections::BTreeMap;

use crate::colorer::Rgb;

/// Which part of the drawing a color key describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegendAxis {
    Node,
}

impl LegendAxis {
    pub fn name(self) -> &'static str {
        match self {
            LegendAxis::Node => "node",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorKey {
    pub title: String,
    pub axis: LegendAxis,
    pub continuous: bool,
    pub entries: Vec<(String, Rgb)>,
}

pub trait Legend {
    /// Show `colors` under `title`, replacing any key already shown for `axis`.
    fn add_color_key(
        &mut self,
        title: &str,
        colors: &BTreeMap<String, Rgb>,
        axis: LegendAxis,
        continuous: bool,
    );

    fn clear_all_legends(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct LegendPanel {
    keys: Vec<ColorKey>,
}

impl LegendPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[ColorKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Legend for LegendPanel {
    fn add_color_key(
        &mut self,
        title: &str,
        colors: &BTreeMap<String, Rgb>,
        axis: LegendAxis,
        continuous: bool,
    ) {
        self.keys.retain(|key| key.axis != axis);
        self.keys.push(ColorKey {
            title: title.to_string(),
            axis,
            continuous,
            entries: colors
                .iter()
                .map(|(category, color)| (category.clone(), *color))
                .collect(),
        });
    }

    fn clear_all_legends(&mut self) {
        self.keys.clear();
    }
}
