use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use generational_arena::{Arena, Index};
use tracing::{instrument, trace, warn};

use crate::domain::builtin::Builtin;
use crate::domain::component::{find_member, MemberType};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::path::{segments, Segment};
use crate::domain::plugin::Plugin;
use crate::domain::property::PropertyCollection;
use crate::domain::value::Value;

/// Name of the root node.
pub const ROOT_NAME: &str = "/";

static ANONYMOUS_ID: AtomicU64 = AtomicU64::new(0);

/// Next process-wide anonymous id. The counter starts at zero, so the
/// first id handed out is 1.
pub fn next_anonymous_id() -> u64 {
    ANONYMOUS_ID.fetch_add(1, Ordering::Relaxed) + 1
}

/// Handle of a node inside its [`PluginTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Empty,
    Custom,
    Builtin,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Empty => "Empty",
            NodeType::Custom => "Custom",
            NodeType::Builtin => "Builtin",
        };
        f.write_str(name)
    }
}

/// Value slot of a node. The node type is derived from it, so the two
/// can never disagree.
#[derive(Debug, Clone, Default)]
pub enum NodeValue {
    #[default]
    Empty,
    Custom(Value),
    Builtin(Arc<Builtin>),
}

impl NodeValue {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeValue::Empty => NodeType::Empty,
            NodeValue::Custom(_) => NodeType::Custom,
            NodeValue::Builtin(_) => NodeType::Builtin,
        }
    }
}

impl From<Value> for NodeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => NodeValue::Empty,
            other => NodeValue::Custom(other),
        }
    }
}

impl From<Option<Value>> for NodeValue {
    fn from(value: Option<Value>) -> Self {
        value.map_or(NodeValue::Empty, NodeValue::from)
    }
}

impl From<Builtin> for NodeValue {
    fn from(builtin: Builtin) -> Self {
        NodeValue::Builtin(Arc::new(builtin))
    }
}

impl From<Arc<Builtin>> for NodeValue {
    fn from(builtin: Arc<Builtin>) -> Self {
        NodeValue::Builtin(builtin)
    }
}

/// Tree node in the arena-based plugin hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    value: NodeValue,
    plugin: Option<Arc<Plugin>>,
    properties: OnceLock<PropertyCollection>,
    path: OnceLock<String>,
    full_path: OnceLock<String>,
}

impl TreeNode {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            value: NodeValue::Empty,
            plugin: None,
            properties: OnceLock::new(),
            path: OnceLock::new(),
            full_path: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn node_type(&self) -> NodeType {
        self.value.node_type()
    }

    pub fn plugin(&self) -> Option<&Arc<Plugin>> {
        self.plugin.as_ref()
    }

    pub fn has_properties(&self) -> bool {
        self.properties.get().is_some_and(|p| !p.is_empty())
    }

    /// Extended properties, allocated on first access.
    pub fn properties(&self) -> &PropertyCollection {
        self.properties.get_or_init(PropertyCollection::new)
    }

    fn invalidate_paths(&mut self) {
        self.path = OnceLock::new();
        self.full_path = OnceLock::new();
    }
}

/// Arena-based plugin tree.
///
/// Uses a generational arena for memory-safe node references. The tree is
/// mutated while plugins load and read concurrently afterwards.
#[derive(Debug)]
pub struct PluginTree {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for PluginTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode::new(ROOT_NAME.to_string(), None)));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    fn node_or_err(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.node(id)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", id)))
    }

    fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut TreeNode> {
        self.arena
            .get_mut(id.0)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", id)))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Add a named child under `parent` and set its value.
    #[instrument(level = "trace", skip(self, value))]
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: &str,
        value: impl Into<NodeValue>,
    ) -> DomainResult<NodeId> {
        if name.trim().is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(DomainError::InvalidName(name.to_string()));
        }
        self.node_or_err(parent)?;
        if self.child(parent, name).is_some() {
            return Err(DomainError::DuplicateChild {
                parent: self.full_path(parent).unwrap_or_default().to_string(),
                name: name.to_string(),
            });
        }

        let id = NodeId(self.arena.insert(TreeNode::new(name.to_string(), Some(parent))));
        self.node_mut(parent)?.children.push(id);
        if let Err(e) = self.set_value(id, value) {
            self.unlink(id)?;
            self.arena.remove(id.0);
            return Err(e);
        }
        Ok(id)
    }

    /// Named child lookup among the direct children of `parent`.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).is_some_and(|n| n.name.eq_ignore_ascii_case(name)))
    }

    /// Navigate from `origin` along one path string.
    pub fn find(&self, origin: NodeId, path: &str) -> Option<NodeId> {
        self.find_all(origin, &[path])
    }

    /// Apply several path strings in order to a moving cursor.
    ///
    /// Blank strings are skipped. Any failing step aborts the whole walk.
    #[instrument(level = "trace", skip(self))]
    pub fn find_all(&self, origin: NodeId, paths: &[&str]) -> Option<NodeId> {
        if paths.is_empty() || !self.contains(origin) {
            return None;
        }

        let mut cursor = origin;
        for path in paths {
            for segment in segments(path) {
                cursor = match segment {
                    Segment::Root => self.root,
                    Segment::Current => cursor,
                    Segment::Parent => self.node(cursor)?.parent.unwrap_or(self.root),
                    Segment::Child(name) => self.child(cursor, name)?,
                };
            }
        }
        trace!("found {:?}", self.full_path(cursor));
        Some(cursor)
    }

    /// Path of the node including its own name, e.g. `/A/B`.
    pub fn full_path(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        let full = node.full_path.get_or_init(|| match node.parent {
            None => node.name.clone(),
            Some(parent) => {
                let parent_path = self.full_path(parent).unwrap_or_default();
                format!("{}/{}", parent_path.trim_end_matches('/'), node.name)
            }
        });
        Some(full.as_str())
    }

    /// Path of the node's parent; empty for the root.
    pub fn path(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id)?;
        let path = node.path.get_or_init(|| match node.parent {
            None => String::new(),
            Some(parent) => self.full_path(parent).unwrap_or_default().to_string(),
        });
        Some(path.as_str())
    }

    /// Replace the value slot of a node.
    ///
    /// Builtins are bound to the node; a builtin already bound elsewhere is
    /// rejected. Objects get the node's declared properties applied right
    /// away, tolerating per-property failures.
    #[instrument(level = "trace", skip(self, value))]
    pub fn set_value(&mut self, id: NodeId, value: impl Into<NodeValue>) -> DomainResult<()> {
        let value = value.into();
        let node = self.node_mut(id)?;

        match value {
            NodeValue::Empty => {
                node.value = NodeValue::Empty;
                node.plugin = None;
            }
            NodeValue::Builtin(builtin) => {
                if let NodeValue::Builtin(current) = &node.value {
                    if Arc::ptr_eq(current, &builtin) {
                        return Ok(());
                    }
                }
                builtin.bind(id)?;
                node.plugin = builtin.plugin().cloned();
                node.value = NodeValue::Builtin(builtin);
            }
            NodeValue::Custom(custom) => {
                if let Some(properties) = node.properties.get() {
                    apply_properties(properties, &custom, &node.name);
                }
                node.value = NodeValue::Custom(custom);
                node.plugin = None;
            }
        }
        Ok(())
    }

    /// Mutable extended properties, allocated on first access.
    pub fn properties_mut(&mut self, id: NodeId) -> DomainResult<&mut PropertyCollection> {
        let node = self.node_mut(id)?;
        node.properties.get_or_init(PropertyCollection::new);
        node.properties
            .get_mut()
            .ok_or_else(|| DomainError::NodeNotFound(node.name.clone()))
    }

    /// Associate a plugin with a node that holds no builtin.
    pub fn set_plugin(&mut self, id: NodeId, plugin: Option<Arc<Plugin>>) -> DomainResult<()> {
        self.node_mut(id)?.plugin = plugin;
        Ok(())
    }

    /// Move a node (and its subtree) under a new parent.
    #[instrument(level = "debug", skip(self))]
    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) -> DomainResult<()> {
        let node = self.node_or_err(id)?;
        if node.parent == Some(parent) {
            return Ok(());
        }
        if parent == id || self.ancestors(parent).any(|a| a == id) {
            return Err(DomainError::CyclicParent(node.name.clone()));
        }
        let name = node.name.clone();
        if self.child(parent, &name).is_some() {
            return Err(DomainError::DuplicateChild {
                parent: self.full_path(parent).unwrap_or_default().to_string(),
                name,
            });
        }

        self.unlink(id)?;
        self.node_mut(parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(parent);
        self.invalidate_subtree(id);
        Ok(())
    }

    /// Detach a node from its parent, severing both directions of the link.
    #[instrument(level = "debug", skip(self))]
    pub fn detach(&mut self, id: NodeId) -> DomainResult<()> {
        if self.node_or_err(id)?.parent.is_none() {
            return Ok(());
        }
        self.unlink(id)?;
        self.node_mut(id)?.parent = None;
        self.invalidate_subtree(id);
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) -> DomainResult<()> {
        if let Some(parent) = self.node_or_err(id)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != id);
        }
        Ok(())
    }

    fn invalidate_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.get_mut(current.0) {
                node.invalidate_paths();
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Strict ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.node(id).and_then(|n| n.parent),
        }
    }

    /// Nearest ancestor holding a value: the node owning `id`'s value.
    pub fn owner_node(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&a| self.node(a).is_some_and(|n| n.node_type() != NodeType::Empty))
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, id: NodeId) -> usize {
        if let Some(node) = self.node(id) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Display adapter: `[NodeType]/full/path@plugin`, or the bare path.
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { tree: self, id }
    }
}

fn apply_properties(properties: &PropertyCollection, value: &Value, node_name: &str) {
    let Value::Object(component) = value else {
        return;
    };

    for property in properties.iter() {
        let member = find_member(component.as_ref(), property.name(), false);
        let raw = Value::Text(property.raw().to_string());
        let converted = match member.map(|m| m.ty) {
            Some(MemberType::Value(kind, shape)) => raw.convert(kind, shape),
            _ => Ok(raw),
        };
        let name = member.map_or(property.name(), |m| m.name);

        match converted.and_then(|v| component.set_member(name, v)) {
            Ok(()) => trace!("applied property '{}' to node '{}'", name, node_name),
            Err(e) => warn!(
                "Property '{}' of node '{}' not applied: {}",
                property.name(),
                node_name,
                e
            ),
        }
    }
}

pub struct Ancestors<'a> {
    tree: &'a PluginTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.node(current).and_then(|n| n.parent);
        Some(current)
    }
}

/// Pre-order traversal from the root.
pub struct TreeIterator<'a> {
    tree: &'a PluginTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a PluginTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.node(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current, node));
            }
        }
        None
    }
}

pub struct NodeDisplay<'a> {
    tree: &'a PluginTree,
    id: NodeId,
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(node) = self.tree.node(self.id) else {
            return write!(f, "<detached {:?}>", self.id);
        };
        let path = self.tree.full_path(self.id).unwrap_or_default();
        match &node.plugin {
            Some(plugin) => write!(f, "[{}]{}@{}", node.node_type(), path, plugin),
            None => write!(f, "{}", path),
        }
    }
}
