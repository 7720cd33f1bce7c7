//! # Stage Module
//!
//! The retained element tree the engine animates.
//!
//! The engine is headless: it never touches a real document. Instead the
//! embedder mirrors its markup into a `Stage` (one `StageNode` per
//! animatable element, plus the structural nodes the narrative sequence
//! needs), and renders the inline styles and classes the engine writes
//! back. Geometry stays on the embedder side behind `ViewportProvider`.

use crate::errors::StageError;
use crate::types::{InlineStyle, NodeId, RevealAttrs};
use serde::Deserialize;
use std::collections::HashMap;

/// An ordered, duplicate-free list of CSS class names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassList(Vec<String>);

impl ClassList {
    pub fn add(&mut self, class: &str) {
        if !self.contains(class) {
            self.0.push(class.to_string());
        }
    }

    pub fn remove(&mut self, class: &str) {
        self.0.retain(|c| c != class);
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// One element mirrored onto the stage.
#[derive(Clone, Debug, Default)]
pub struct StageNode {
    /// Stable element identifier (the markup `id`), if any.
    pub key: Option<String>,
    /// Reveal attributes, present only on tagged elements.
    pub reveal: Option<RevealAttrs>,
    /// Inline style state written by the engine.
    pub style: InlineStyle,
    /// Class state written by the engine.
    pub classes: ClassList,
    /// Indices of child nodes.
    pub children: Vec<NodeId>,
    /// Index of parent node.
    pub parent: Option<NodeId>,
}

impl StageNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_reveal(mut self, attrs: RevealAttrs) -> Self {
        self.reveal = Some(attrs);
        self
    }
}

/// The element arena.
///
/// Uses `Option` slots with a free list so removal (page swaps, dynamic
/// content) does not invalidate other node ids.
#[derive(Clone, Debug, Default)]
pub struct Stage {
    nodes: Vec<Option<StageNode>>,
    free_indices: Vec<usize>,
    keys: HashMap<String, NodeId>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to the stage and returns its ID.
    pub fn add_node(&mut self, node: StageNode) -> NodeId {
        let id = if let Some(id) = self.free_indices.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            let id = self.nodes.len();
            self.nodes.push(Some(node));
            id
        };
        if let Some(key) = self.nodes[id].as_ref().and_then(|n| n.key.clone()) {
            self.keys.insert(key, id);
        }
        id
    }

    /// Establishes a parent-child relationship between two nodes.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p_node) = self.nodes.get_mut(parent).and_then(|n| n.as_mut()) {
            p_node.children.push(child);
        }
        if let Some(c_node) = self.nodes.get_mut(child).and_then(|n| n.as_mut()) {
            c_node.parent = Some(parent);
        }
    }

    /// Recursively removes a node and its children, freeing their slots.
    pub fn destroy_node(&mut self, id: NodeId) {
        if id >= self.nodes.len() || self.nodes[id].is_none() {
            return;
        }

        let (parent_id, children_ids, key) = {
            let node = self.nodes[id].as_ref().unwrap();
            (node.parent, node.children.clone(), node.key.clone())
        };

        if let Some(pid) = parent_id {
            if let Some(p_node) = self.nodes.get_mut(pid).and_then(|n| n.as_mut()) {
                p_node.children.retain(|&c| c != id);
            }
        }

        for child_id in children_ids {
            self.destroy_node(child_id);
        }

        if let Some(key) = key {
            self.keys.remove(&key);
        }
        self.nodes[id] = None;
        self.free_indices.push(id);
    }

    /// Returns a shared reference to the node.
    pub fn node(&self, id: NodeId) -> Option<&StageNode> {
        self.nodes.get(id).and_then(|n| n.as_ref())
    }

    /// Returns a mutable reference to the node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut StageNode> {
        self.nodes.get_mut(id).and_then(|n| n.as_mut())
    }

    /// Like `node_mut` but with a typed error for programmatic callers.
    pub fn try_node_mut(&mut self, id: NodeId) -> Result<&mut StageNode, StageError> {
        self.node_mut(id).ok_or(StageError::NodeMissing(id))
    }

    /// Looks a node up by its element identifier.
    pub fn by_key(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    /// True when `node` is `ancestor` or sits anywhere inside its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    /// All reveal-tagged nodes, in insertion order.
    pub fn tagged(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.as_ref()
                    .filter(|node| node.reveal.is_some())
                    .map(|_| id)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over live nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &StageNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|n| (id, n)))
    }

    /// Builds a stage from a deserialized manifest.
    pub fn from_manifest(manifest: &StageManifest) -> Self {
        let mut stage = Stage::new();
        for entry in &manifest.nodes {
            Self::insert_manifest_node(&mut stage, entry, None);
        }
        stage
    }

    /// Parses a JSON manifest and builds the stage in one step.
    pub fn from_manifest_json(json: &str) -> Result<Self, StageError> {
        let manifest: StageManifest = serde_json::from_str(json)?;
        Ok(Self::from_manifest(&manifest))
    }

    fn insert_manifest_node(
        stage: &mut Stage,
        entry: &ManifestNode,
        parent: Option<NodeId>,
    ) -> NodeId {
        let mut node = StageNode::new();
        if let Some(key) = &entry.key {
            node.key = Some(key.clone());
        }
        if entry.animate.is_some() || entry.delay.is_some() {
            node.reveal = Some(RevealAttrs::from_markup(
                entry.animate.as_deref(),
                entry.delay.as_deref(),
            ));
        }
        let id = stage.add_node(node);
        if let Some(parent) = parent {
            stage.add_child(parent, id);
        }
        for child in &entry.children {
            Self::insert_manifest_node(stage, child, Some(id));
        }
        id
    }
}

/// JSON description of a stage, mirroring the markup attribute contract.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StageManifest {
    pub nodes: Vec<ManifestNode>,
}

/// One element entry in a stage manifest.
///
/// `animate` carries the reveal variant attribute value (empty string for
/// the default variant); `delay` is the raw delay attribute. Both are kept
/// as strings so the same coercion rules apply as for live markup.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ManifestNode {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub animate: Option<String>,
    #[serde(default)]
    pub delay: Option<String>,
    /// Document-space bounding box `[x, y, width, height]`, consumed by
    /// preview tooling to seed a `FixedViewport`.
    #[serde(default)]
    pub rect: Option<[f32; 4]>,
    #[serde(default)]
    pub children: Vec<ManifestNode>,
}

impl ManifestNode {
    /// Depth-first traversal over this entry and its children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a ManifestNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
