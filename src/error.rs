use thiserror::Error;

/// Errors surfaced by the node menu and the side panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    #[error("node `{0}` is not in the tree")]
    NodeNotFound(String),

    #[error("node name `{name}` matches {count} nodes")]
    AmbiguousNode { name: String, count: usize },

    #[error("metadata column `{0}` does not exist")]
    InvalidColumn(String),

    #[error("unknown layout `{0}`")]
    UnknownLayout(String),

    #[error("unknown color map `{0}`")]
    UnknownColorMap(String),

    #[error("no sample column selected")]
    NoColumnSelected,
}

pub type PanelResult<T> = Result<T, PanelError>;
