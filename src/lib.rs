//! Phylogenetic tree inspection: a node menu reporting sample metadata per
//! clade and a side panel coloring branches by sample category.

pub mod app;
pub mod colorer;
pub mod error;
pub mod io;
pub mod metadata;
pub mod panels;
pub mod render;
pub mod tree;
pub mod ui;
