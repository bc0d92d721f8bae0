//! Path mapper errors

use thiserror::Error;

/// Failures while building a traversal map for a shape
///
/// Unresolvable paths are not errors; they resolve to `None`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MappingError {
    #[error(
        "cannot create map for {shape}: field '{path}' recursively contains {}",
        chain.join(" -> ")
    )]
    Cycle {
        shape: String,
        path: String,
        chain: Vec<String>,
    },

    #[error("cannot create map for {root}: unknown shape '{shape}'")]
    UnknownShape { root: String, shape: String },
}

impl MappingError {
    pub fn cycle(shape: impl Into<String>, path: impl Into<String>, chain: Vec<String>) -> Self {
        Self::Cycle {
            shape: shape.into(),
            path: path.into(),
            chain,
        }
    }

    pub fn unknown_shape(root: impl Into<String>, shape: impl Into<String>) -> Self {
        Self::UnknownShape {
            root: root.into(),
            shape: shape.into(),
        }
    }
}
