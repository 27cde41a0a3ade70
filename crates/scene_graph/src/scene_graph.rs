//! # Scene Graph
//!
//! The document model the bridge operates on: a tree of [`Node`]s rooted at
//! a `DOCUMENT` node whose children are pages.
//!
//! ## Ownership
//!
//! All nodes live in a single slot map owned by the [`SceneGraph`]. The tree
//! shape is expressed purely with ids: a parent owns the ordered list of its
//! children's ids, and a child records its parent's id as a non-owning back
//! reference. Traversals only ever follow `children`, so the back reference
//! can never introduce a cycle into a walk.
//!
//! Ids are generational. Once a node is removed its id never resolves again,
//! which lets callers hold an id across an await point and simply re-check it
//! on resume.

mod snapshot;

pub use snapshot::Snapshot;

use glam::Vec2;
use node::{Node, NodeId, NodeType};
use slotmap::SlotMap;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NotFound(String),
    #[error("Cannot append to node type: {0}")]
    InvalidParent(NodeType),
    #[error("Cannot move a node into its own subtree")]
    Cycle,
    #[error("Cannot remove node: {0}")]
    Protected(NodeId),
}

/// The document: every node plus the bookkeeping around them (current page,
/// per-page selection, component keys).
pub struct SceneGraph {
    /// The `DOCUMENT` node
    root: NodeId,

    /// The page new nodes land on when no parent is given
    current_page: NodeId,

    /// Storage for all nodes, attached or not
    nodes: SlotMap<NodeId, Node>,

    /// Component key -> component node
    components: HashMap<String, NodeId>,

    /// Page -> selected nodes on that page
    selections: HashMap<NodeId, Vec<NodeId>>,

    file_key: Option<String>,
}

impl SceneGraph {
    /// Creates a document with a single empty page.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(|id| Node::new(id, NodeType::Document, name));

        let mut graph = Self {
            root,
            current_page: root,
            nodes,
            components: HashMap::new(),
            selections: HashMap::new(),
            file_key: None,
        };
        graph.current_page = graph.add_page("Page 1");
        graph
    }

    /// Returns the id of the `DOCUMENT` node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The document's name
    pub fn name(&self) -> &str {
        self.nodes
            .get(self.root)
            .map(|node| node.name.as_str())
            .unwrap_or_default()
    }

    pub fn file_key(&self) -> Option<&str> {
        self.file_key.as_deref()
    }

    pub fn set_file_key(&mut self, key: impl Into<String>) {
        self.file_key = Some(key.into());
    }

    pub fn current_page(&self) -> NodeId {
        self.current_page
    }

    /// Appends a new page to the document.
    pub fn add_page(&mut self, name: impl Into<String>) -> NodeId {
        let page = self.insert_node(NodeType::Page, name.into());
        self.link(self.root, page);
        page
    }

    /// The document's pages, in order.
    pub fn pages(&self) -> &[NodeId] {
        self.children(self.root)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Resolves a wire id to a live node id.
    pub fn resolve(&self, id: &str) -> Option<NodeId> {
        NodeId::parse(id).filter(|id| self.nodes.contains_key(*id))
    }

    /// Looks a node up by its wire id.
    pub fn lookup(&self, id: &str) -> Option<&Node> {
        NodeId::parse(id).and_then(|id| self.nodes.get(id))
    }

    /// Gets the ordered children of a node. Empty for leaf types and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Checks that `parent` exists and may receive newly created nodes.
    pub fn check_attachable(&self, parent: NodeId) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get(parent)
            .ok_or_else(|| GraphError::NotFound(parent.to_string()))?;
        if node.node_type.accepts_appended_children() {
            Ok(())
        } else {
            Err(GraphError::InvalidParent(node.node_type))
        }
    }

    /// Creates a node with type defaults and appends it to `parent`.
    ///
    /// The parent is validated before anything is inserted, so a failure
    /// leaves the graph untouched.
    pub fn create(
        &mut self,
        parent: NodeId,
        node_type: NodeType,
        name: impl Into<String>,
    ) -> Result<NodeId, GraphError> {
        self.check_attachable(parent)?;
        let id = self.insert_node(node_type, name.into());
        self.link(parent, id);
        if node_type == NodeType::Component {
            self.register_component(id);
        }
        Ok(id)
    }

    /// Moves `child` to the end of `parent`'s children.
    ///
    /// Only `PAGE`, `FRAME` and `GROUP` nodes accept children this way.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.check_attachable(parent)?;
        self.append_child(parent, child)
    }

    /// Structural append used when building a document: accepts any node
    /// type that has children, including components and instances.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        let parent_type = self
            .nodes
            .get(parent)
            .ok_or_else(|| GraphError::NotFound(parent.to_string()))?
            .node_type;
        if !self.nodes.contains_key(child) {
            return Err(GraphError::NotFound(child.to_string()));
        }
        if !parent_type.has_children() {
            return Err(GraphError::InvalidParent(parent_type));
        }
        if self.is_ancestor(child, parent) {
            return Err(GraphError::Cycle);
        }

        self.detach(child);
        self.link(parent, child);
        Ok(())
    }

    /// Removes a node and its whole subtree.
    ///
    /// The document root and the last remaining page can't be removed.
    pub fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        let is_last_page = node.node_type == NodeType::Page && self.pages().len() <= 1;
        if id == self.root || is_last_page {
            return Err(GraphError::Protected(id));
        }

        self.detach(id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(removed) = self.nodes.remove(current) else {
                continue;
            };
            if let Some(key) = &removed.key {
                self.components.remove(key);
            }
            self.selections.remove(&current);
            stack.extend(removed.children);
        }

        for selection in self.selections.values_mut() {
            selection.retain(|selected| self.nodes.contains_key(*selected));
        }

        if !self.nodes.contains_key(self.current_page) {
            if let Some(first) = self.pages().first().copied() {
                self.current_page = first;
            }
        }

        Ok(())
    }

    /// The current page's selection, in selection order.
    pub fn selection(&self) -> Vec<NodeId> {
        self.selections
            .get(&self.current_page)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| self.nodes.contains_key(*id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replaces the current page's selection. Unknown ids are dropped.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        let ids: Vec<NodeId> = ids
            .into_iter()
            .filter(|id| self.nodes.contains_key(*id))
            .collect();
        self.selections.insert(self.current_page, ids);
    }

    /// Finds a component by its content-addressed key.
    pub fn component_by_key(&self, key: &str) -> Option<NodeId> {
        self.components
            .get(key)
            .copied()
            .filter(|id| self.nodes.contains_key(*id))
    }

    /// Creates a detached `INSTANCE` of a component by deep-copying its
    /// subtree. The caller is expected to attach it.
    pub fn instantiate(&mut self, component: NodeId) -> Result<NodeId, GraphError> {
        if !self.nodes.contains_key(component) {
            return Err(GraphError::NotFound(component.to_string()));
        }
        let instance = self
            .copy_subtree(component)
            .ok_or_else(|| GraphError::NotFound(component.to_string()))?;
        if let Some(node) = self.nodes.get_mut(instance) {
            node.node_type = NodeType::Instance;
            node.main_component = Some(component);
        }
        Ok(instance)
    }

    /// Scales a node and everything under it. Child offsets scale with the
    /// parent so the subtree keeps its proportions.
    pub fn rescale(&mut self, id: NodeId, factor: Vec2) -> Result<(), GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NotFound(id.to_string()));
        }

        let mut stack = vec![(id, true)];
        while let Some((current, is_root)) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                if !is_root {
                    node.position *= factor;
                }
                node.rescale(factor);
                stack.extend(node.children.iter().map(|child| (*child, false)));
            }
        }
        Ok(())
    }

    /// Takes an owned copy of a subtree, e.g. to hand to a renderer.
    pub fn snapshot(&self, id: NodeId) -> Option<Snapshot> {
        let node = self.nodes.get(id)?;
        let children = node
            .children
            .iter()
            .filter_map(|child| self.snapshot(*child))
            .collect();
        Some(Snapshot {
            node: node.clone(),
            children,
        })
    }

    fn insert_node(&mut self, node_type: NodeType, name: String) -> NodeId {
        self.nodes
            .insert_with_key(|id| Node::new(id, node_type, name))
    }

    /// Appends without validation. Both ids must exist.
    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Unlinks a node from its parent, leaving it in storage.
    fn detach(&mut self, child: NodeId) {
        let old_parent = self.nodes.get_mut(child).and_then(|node| node.parent.take());
        if let Some(parent) = old_parent.and_then(|id| self.nodes.get_mut(id)) {
            parent.children.retain(|id| *id != child);
        }
    }

    fn copy_subtree(&mut self, source: NodeId) -> Option<NodeId> {
        let mut copied = self.nodes.get(source)?.clone();
        let children = std::mem::take(&mut copied.children);

        let copy = self.nodes.insert_with_key(|id| Node {
            id,
            parent: None,
            key: None,
            ..copied
        });

        for child in children {
            if let Some(child_copy) = self.copy_subtree(child) {
                self.link(copy, child_copy);
            }
        }
        Some(copy)
    }

    fn register_component(&mut self, id: NodeId) {
        let scope = self.file_key.as_deref().unwrap_or("local");
        let key = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{scope}/{id}").as_bytes())
            .simple()
            .to_string();
        if let Some(node) = self.nodes.get_mut(id) {
            node.key = Some(key.clone());
        }
        self.components.insert(key, id);
    }

    /// Determines if `node_id` is `descendant_id` or one of its ancestors.
    ///
    /// Walks the parent chain upward iteratively. Used to refuse moves that
    /// would make a node its own ancestor.
    fn is_ancestor(&self, node_id: NodeId, descendant_id: NodeId) -> bool {
        let mut current = Some(descendant_id);
        while let Some(id) = current {
            if id == node_id {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        false
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
