//! The two panels layered over the tree view: the node menu shown when a node
//! is selected, and the side panel holding the coloring and layout controls.

pub mod node_menu;
pub mod side_panel;

pub use node_menu::{ColumnOrigin, NameResolution, NodeInspector, NodeKind, NodeReport};
pub use side_panel::{LayoutOption, SampleControls, ViewController};
