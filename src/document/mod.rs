//! Host document seams.
//!
//! The pipeline never renders anything itself. It talks to the design tool
//! through `DesignDocument` (node tree operations) and `FontLoader` (font
//! resources), and `memory` provides a JSON-backed implementation used by
//! the CLI and the tests.

mod fonts;
mod memory;

pub use fonts::{FontCatalog, FontLoader};
pub use memory::{Frame, MemoryDocument, Node, TextNode};

use crate::error::{DocumentError, ExtractError};
use crate::model::ContentUnit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable node identifier assigned by the host document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A font face used by a text node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontDescriptor {
    pub family: String,
    pub style: String,
}

impl FontDescriptor {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

/// Position and size of a container on the page.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A text-bearing node as enumerated inside a container.
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub id: NodeId,
    pub characters: String,
    pub fonts: Vec<FontDescriptor>,
}

/// The user's current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub nodes: Vec<NodeId>,
}

impl Selection {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn single(node: impl Into<NodeId>) -> Self {
        Self {
            nodes: vec![node.into()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The selected container and its content units, captured at extraction.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub id: NodeId,
    pub name: String,
    pub geometry: Geometry,
    pub units: Vec<ContentUnit>,
}

/// Operations the pipeline needs from the host document.
///
/// Text units must always be enumerated in the same depth-first order, for
/// the original and for its clones; positional correlation depends on it.
pub trait DesignDocument {
    /// The current selection.
    fn selection(&self) -> Selection;

    /// Whether the node exists and can be cloned as a container.
    fn is_container(&self, node: &NodeId) -> bool;

    fn name(&self, container: &NodeId) -> Result<String, DocumentError>;

    fn geometry(&self, container: &NodeId) -> Result<Geometry, DocumentError>;

    /// Text units of a container in document order.
    fn text_units(&self, container: &NodeId) -> Result<Vec<TextUnit>, DocumentError>;

    /// Deep-clone a container. The clone is detached until `attach` is
    /// called, and its nodes get fresh ids.
    fn clone_container(&mut self, container: &NodeId) -> Result<NodeId, DocumentError>;

    fn set_name(&mut self, node: &NodeId, name: &str) -> Result<(), DocumentError>;

    fn set_position(&mut self, node: &NodeId, x: f64, y: f64) -> Result<(), DocumentError>;

    fn set_text(&mut self, unit: &NodeId, text: &str) -> Result<(), DocumentError>;

    /// Append a detached clone to the page.
    fn attach(&mut self, container: &NodeId) -> Result<(), DocumentError>;

    /// Drop a detached clone.
    fn discard(&mut self, container: &NodeId) -> Result<(), DocumentError>;

    /// Enumerate the content units of the selected container.
    ///
    /// Fails with `NoSelection` when nothing is selected, `InvalidSelection`
    /// unless exactly one container is selected, and `EmptySelection` when
    /// the container holds no text.
    fn extract(&self, selection: &Selection) -> Result<SourceFrame, ExtractError> {
        let container = match selection.nodes.as_slice() {
            [] => return Err(ExtractError::NoSelection),
            [node] if self.is_container(node) => node,
            [node] => {
                return Err(ExtractError::InvalidSelection(format!(
                    "node {} is not a frame",
                    node
                )))
            }
            nodes => {
                return Err(ExtractError::InvalidSelection(format!(
                    "{} nodes selected",
                    nodes.len()
                )))
            }
        };

        let invalid = |e: DocumentError| ExtractError::InvalidSelection(e.to_string());
        let units: Vec<ContentUnit> = self
            .text_units(container)
            .map_err(invalid)?
            .into_iter()
            .map(|unit| ContentUnit::new(unit.id, unit.characters))
            .collect();

        if units.is_empty() {
            return Err(ExtractError::EmptySelection);
        }

        Ok(SourceFrame {
            id: container.clone(),
            name: self.name(container).map_err(invalid)?,
            geometry: self.geometry(container).map_err(invalid)?,
            units,
        })
    }
}
