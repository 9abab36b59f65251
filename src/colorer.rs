//! Color maps used to color the tree by a metadata column.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PanelError, PanelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

const QIIME: [u32; 24] = [
    0xff0000, 0x0000ff, 0xf27304, 0x008000, 0x91278d, 0xffff00, 0x7cecf4, 0xf49ac2, 0x5da09e,
    0x6b440b, 0x808080, 0xf79679, 0x7da9d8, 0xfcc688, 0x80c99b, 0xa287bf, 0xfff899, 0xc49c6b,
    0xc0c0c0, 0xed008a, 0x00b6ff, 0xa54700, 0x808000, 0x008080,
];

const PAIRED: [u32; 12] = [
    0xa6cee3, 0x1f78b4, 0xb2df8a, 0x33a02c, 0xfb9a99, 0xe31a1c, 0xfdbf6f, 0xff7f00, 0xcab2d6,
    0x6a3d9a, 0xffff99, 0xb15928,
];

const DARK2: [u32; 8] = [
    0x1b9e77, 0xd95f02, 0x7570b3, 0xe7298a, 0x66a61e, 0xe6ab02, 0xa6761d, 0x666666,
];

const SET1: [u32; 9] = [
    0xe41a1c, 0x377eb8, 0x4daf4a, 0x984ea3, 0xff7f00, 0xffff33, 0xa65628, 0xf781bf, 0x999999,
];

const VIRIDIS: [u32; 5] = [0x440154, 0x3b528b, 0x21918c, 0x5ec962, 0xfde725];

const REDS: [u32; 5] = [0xfee5d9, 0xfcae91, 0xfb6a4a, 0xde2d26, 0xa50f15];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMap {
    #[default]
    DiscreteQiime,
    Paired,
    Dark2,
    Set1,
    Viridis,
    Reds,
}

impl ColorMap {
    pub const ALL: [ColorMap; 6] = [
        ColorMap::DiscreteQiime,
        ColorMap::Paired,
        ColorMap::Dark2,
        ColorMap::Set1,
        ColorMap::Viridis,
        ColorMap::Reds,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ColorMap::DiscreteQiime => "discrete-coloring-qiime",
            ColorMap::Paired => "Paired",
            ColorMap::Dark2 => "Dark2",
            ColorMap::Set1 => "Set1",
            ColorMap::Viridis => "Viridis",
            ColorMap::Reds => "Reds",
        }
    }

    pub fn from_id(id: &str) -> PanelResult<Self> {
        Self::ALL
            .into_iter()
            .find(|map| map.id().eq_ignore_ascii_case(id.trim()))
            .ok_or_else(|| PanelError::UnknownColorMap(id.to_string()))
    }

    /// Sequential maps interpolate across categories; discrete ones cycle.
    pub fn is_sequential(self) -> bool {
        matches!(self, ColorMap::Viridis | ColorMap::Reds)
    }

    fn stops(self) -> &'static [u32] {
        match self {
            ColorMap::DiscreteQiime => &QIIME,
            ColorMap::Paired => &PAIRED,
            ColorMap::Dark2 => &DARK2,
            ColorMap::Set1 => &SET1,
            ColorMap::Viridis => &VIRIDIS,
            ColorMap::Reds => &REDS,
        }
    }

    /// Color for the `index`-th of `count` sorted categories.
    pub fn color_at(self, index: usize, count: usize) -> Rgb {
        let stops = self.stops();
        if !self.is_sequential() {
            return Rgb::from_hex(stops[index % stops.len()]);
        }
        if count <= 1 {
            return Rgb::from_hex(stops[0]);
        }

        let t = index.min(count - 1) as f32 / (count - 1) as f32;
        let scaled = t * (stops.len() - 1) as f32;
        let lower = (scaled.floor() as usize).min(stops.len() - 2);
        Rgb::from_hex(stops[lower]).lerp(Rgb::from_hex(stops[lower + 1]), scaled - lower as f32)
    }

    /// Assign colors to `categories` after sorting them ascending.
    pub fn assign<'a, I>(self, categories: I) -> BTreeMap<String, Rgb>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut sorted: Vec<&String> = categories.into_iter().collect();
        sorted.sort();
        sorted.dedup();
        let count = sorted.len();
        sorted
            .into_iter()
            .enumerate()
            .map(|(index, category)| (category.clone(), self.color_at(index, count)))
            .collect()
    }
}

impl fmt::Display for ColorMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_maps_cycle() {
        let map = ColorMap::Dark2;
        assert_eq!(map.color_at(0, 20), map.color_at(8, 20));
        assert_eq!(ColorMap::DiscreteQiime.color_at(0, 3).to_hex(), "#ff0000");
        assert_eq!(ColorMap::DiscreteQiime.color_at(1, 3).to_hex(), "#0000ff");
    }

    #[test]
    fn sequential_maps_span_their_stops() {
        let map = ColorMap::Viridis;
        assert_eq!(map.color_at(0, 4), Rgb::from_hex(0x440154));
        assert_eq!(map.color_at(3, 4), Rgb::from_hex(0xfde725));
        assert_eq!(map.color_at(0, 1), Rgb::from_hex(0x440154));
        assert_eq!(map.color_at(2, 5), Rgb::from_hex(0x21918c));
    }

    #[test]
    fn assign_sorts_categories() {
        let categories = ["soil", "gut", "skin"].map(String::from);
        let colors = ColorMap::DiscreteQiime.assign(categories.iter());
        let order: Vec<_> = colors.keys().cloned().collect();
        assert_eq!(order, vec!["gut", "skin", "soil"]);
        assert_eq!(colors["gut"], Rgb::from_hex(0xff0000));
        assert_eq!(colors["soil"], Rgb::from_hex(0xf27304));
    }

    #[test]
    fn ids_resolve() {
        assert_eq!(ColorMap::from_id("viridis"), Ok(ColorMap::Viridis));
        assert_eq!(
            ColorMap::from_id("rainbow"),
            Err(PanelError::UnknownColorMap("rainbow".to_string()))
        );
    }
}
