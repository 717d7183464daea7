//! JSON-backed in-memory document.
//!
//! The tree is a page of top-level frames; frames hold text nodes, shapes
//! and nested groups. Text nodes are enumerated depth-first in child order.
//!
//! ```json
//! {
//!   "selection": ["1:1"],
//!   "frames": [{
//!     "id": "1:1", "name": "Card", "x": 0, "y": 0, "width": 320, "height": 200,
//!     "children": [
//!       { "type": "text", "id": "1:2", "characters": "Hello",
//!         "fonts": [{ "family": "Inter", "style": "Regular" }] }
//!     ]
//!   }]
//! }
//! ```

use super::{DesignDocument, Geometry, NodeId, Selection, TextUnit};
use crate::document::FontDescriptor;
use crate::error::DocumentError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub id: NodeId,
    pub characters: String,
    #[serde(default)]
    pub fonts: Vec<FontDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Text(TextNode),
    Group(Frame),
    Shape { id: NodeId, name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: NodeId,
    pub name: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Frame {
    fn collect_text<'a>(&'a self, out: &mut Vec<&'a TextNode>) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push(text),
                Node::Group(group) => group.collect_text(out),
                Node::Shape { .. } => {}
            }
        }
    }

    fn find_frame(&self, id: &NodeId) -> Option<&Frame> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            Node::Group(group) => group.find_frame(id),
            _ => None,
        })
    }

    fn find_frame_mut(&mut self, id: &NodeId) -> Option<&mut Frame> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| match child {
            Node::Group(group) => group.find_frame_mut(id),
            _ => None,
        })
    }

    fn find_text_mut(&mut self, id: &NodeId) -> Option<&mut TextNode> {
        self.children.iter_mut().find_map(|child| match child {
            Node::Text(text) if &text.id == id => Some(text),
            Node::Group(group) => group.find_text_mut(id),
            _ => None,
        })
    }

    fn contains_node(&self, id: &NodeId) -> bool {
        &self.id == id
            || self.children.iter().any(|child| match child {
                Node::Text(text) => &text.id == id,
                Node::Shape { id: shape, .. } => shape == id,
                Node::Group(group) => group.contains_node(id),
            })
    }

    /// Give this frame and every descendant a fresh id.
    fn reassign_ids(&mut self, next_id: &mut u64) {
        self.id = fresh_id(next_id);
        for child in &mut self.children {
            match child {
                Node::Text(text) => text.id = fresh_id(next_id),
                Node::Shape { id, .. } => *id = fresh_id(next_id),
                Node::Group(group) => group.reassign_ids(next_id),
            }
        }
    }
}

fn fresh_id(next_id: &mut u64) -> NodeId {
    *next_id += 1;
    NodeId::new(format!("clone:{}", next_id))
}

/// An in-memory design document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub selection: Vec<NodeId>,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(skip)]
    detached: Vec<Frame>,
    #[serde(default)]
    next_id: u64,
}

impl MemoryDocument {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse document JSON")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize document")
    }

    pub fn select(&mut self, nodes: Vec<NodeId>) {
        self.selection = nodes;
    }

    /// Find a top-level frame by id or, failing that, by name.
    pub fn find_top_level(&self, id_or_name: &str) -> Option<&Frame> {
        self.frames
            .iter()
            .find(|f| f.id.as_str() == id_or_name)
            .or_else(|| self.frames.iter().find(|f| f.name == id_or_name))
    }

    /// Number of clones created but neither attached nor discarded.
    pub fn detached_count(&self) -> usize {
        self.detached.len()
    }

    fn frame(&self, id: &NodeId) -> Result<&Frame, DocumentError> {
        self.frames
            .iter()
            .chain(self.detached.iter())
            .find_map(|f| f.find_frame(id))
            .ok_or_else(|| self.missing_or_not_frame(id))
    }

    fn frame_mut(&mut self, id: &NodeId) -> Result<&mut Frame, DocumentError> {
        let error = self.missing_or_not_frame(id);
        self.frames
            .iter_mut()
            .chain(self.detached.iter_mut())
            .find_map(|f| f.find_frame_mut(id))
            .ok_or(error)
    }

    fn missing_or_not_frame(&self, id: &NodeId) -> DocumentError {
        let exists = self
            .frames
            .iter()
            .chain(self.detached.iter())
            .any(|f| f.contains_node(id));
        if exists {
            DocumentError::NotAFrame(id.clone())
        } else {
            DocumentError::NodeNotFound(id.clone())
        }
    }
}

impl DesignDocument for MemoryDocument {
    fn selection(&self) -> Selection {
        Selection::new(self.selection.clone())
    }

    fn is_container(&self, node: &NodeId) -> bool {
        self.frame(node).is_ok()
    }

    fn name(&self, container: &NodeId) -> Result<String, DocumentError> {
        Ok(self.frame(container)?.name.clone())
    }

    fn geometry(&self, container: &NodeId) -> Result<Geometry, DocumentError> {
        Ok(self.frame(container)?.geometry)
    }

    fn text_units(&self, container: &NodeId) -> Result<Vec<TextUnit>, DocumentError> {
        let frame = self.frame(container)?;
        let mut nodes = Vec::new();
        frame.collect_text(&mut nodes);

        Ok(nodes
            .into_iter()
            .map(|node| TextUnit {
                id: node.id.clone(),
                characters: node.characters.clone(),
                fonts: node.fonts.clone(),
            })
            .collect())
    }

    fn clone_container(&mut self, container: &NodeId) -> Result<NodeId, DocumentError> {
        let mut clone = self.frame(container)?.clone();
        clone.reassign_ids(&mut self.next_id);
        let id = clone.id.clone();
        self.detached.push(clone);
        Ok(id)
    }

    fn set_name(&mut self, node: &NodeId, name: &str) -> Result<(), DocumentError> {
        self.frame_mut(node)?.name = name.to_string();
        Ok(())
    }

    fn set_position(&mut self, node: &NodeId, x: f64, y: f64) -> Result<(), DocumentError> {
        let frame = self.frame_mut(node)?;
        frame.geometry.x = x;
        frame.geometry.y = y;
        Ok(())
    }

    fn set_text(&mut self, unit: &NodeId, text: &str) -> Result<(), DocumentError> {
        let node = self
            .frames
            .iter_mut()
            .chain(self.detached.iter_mut())
            .find_map(|f| f.find_text_mut(unit))
            .ok_or_else(|| DocumentError::NotAText(unit.clone()))?;
        node.characters = text.to_string();
        Ok(())
    }

    fn attach(&mut self, container: &NodeId) -> Result<(), DocumentError> {
        let index = self
            .detached
            .iter()
            .position(|f| &f.id == container)
            .ok_or_else(|| DocumentError::NodeNotFound(container.clone()))?;
        let frame = self.detached.remove(index);
        self.frames.push(frame);
        Ok(())
    }

    fn discard(&mut self, container: &NodeId) -> Result<(), DocumentError> {
        let index = self
            .detached
            .iter()
            .position(|f| &f.id == container)
            .ok_or_else(|| DocumentError::NodeNotFound(container.clone()))?;
        self.detached.remove(index);
        Ok(())
    }
}
