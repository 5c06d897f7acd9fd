//! Boundary between the motion model and the rendering library.
//!
//! The core never owns GPU or window resources. It describes what should be
//! drawn as [`Node`]s and hands them to a [`SceneHost`], which is free to map
//! them onto meshes, lines or painter shapes.
//!
//! # Node lifecycle
//!
//! Nodes are acquired through a [`Retirer`], which returns a [`NodeHandle`].
//! Dropping the handle queues the node for removal; the next
//! [`Retirer::flush`] removes it from the host. Every exit path (manual
//! release, automatic link break, label removal, errors) therefore disposes
//! each node exactly once.
//!
//! ```ignore
//! let retirer = Retirer::new();
//! let handle = retirer.acquire(&mut host, Node::Link(link_node));
//! drop(handle);              // queued
//! retirer.flush(&mut host);  // removed from the host
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

use glam::{Quat, Vec3, Vec4};

use crate::color::Rgb;
use crate::error::SceneError;

/// Identifier of a node inside a [`SceneHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A text label mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelNode {
    pub text: String,
    pub color: Rgb,
    /// Glyph height in world units.
    pub size: f32,
    /// Extrusion depth in world units.
    pub depth: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub visible: bool,
}

/// A closed polyline drawn with per-segment colors.
///
/// `points` holds `segments + 1` vertices (the last repeats the first);
/// `colors[i]` is the RGBA of the segment from `points[i]` to `points[i + 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailNode {
    pub points: Vec<Vec3>,
    pub colors: Vec<Vec4>,
    pub visible: bool,
}

/// A dashed line between a pointer anchor and a label.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkNode {
    pub from: Vec3,
    pub to: Vec3,
    pub color: Rgb,
    pub dash_size: f32,
    pub gap_size: f32,
    pub opacity: f32,
}

/// Renderable scene content.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Label(LabelNode),
    Trail(TrailNode),
    Link(LinkNode),
}

impl Node {
    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Label(_) => "label",
            Node::Trail(_) => "trail",
            Node::Link(_) => "link",
        }
    }
}

/// The rendering side of the scene.
///
/// Implementations own whatever the rendering library needs (meshes, line
/// buffers, a painter) and keep it in sync with the [`Node`] descriptions.
pub trait SceneHost {
    /// Insert a node and return its id.
    fn add_node(&mut self, node: Node) -> NodeId;

    /// Remove a node, returning it if it existed.
    fn remove_node(&mut self, id: NodeId) -> Option<Node>;

    /// Mutable access to a node for per-frame updates.
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    /// Draw the current frame.
    fn render(&mut self);

    /// Typed access to a label node.
    fn label_mut(&mut self, id: NodeId) -> Result<&mut LabelNode, SceneError> {
        match self.node_mut(id) {
            Some(Node::Label(label)) => Ok(label),
            Some(_) => Err(SceneError::WrongNodeKind { id, expected: "label" }),
            None => Err(SceneError::MissingNode(id)),
        }
    }

    /// Typed access to a trail node.
    fn trail_mut(&mut self, id: NodeId) -> Result<&mut TrailNode, SceneError> {
        match self.node_mut(id) {
            Some(Node::Trail(trail)) => Ok(trail),
            Some(_) => Err(SceneError::WrongNodeKind { id, expected: "trail" }),
            None => Err(SceneError::MissingNode(id)),
        }
    }

    /// Typed access to a link node.
    fn link_mut(&mut self, id: NodeId) -> Result<&mut LinkNode, SceneError> {
        match self.node_mut(id) {
            Some(Node::Link(link)) => Ok(link),
            Some(_) => Err(SceneError::WrongNodeKind { id, expected: "link" }),
            None => Err(SceneError::MissingNode(id)),
        }
    }
}

/// Owning reference to a host node.
///
/// Not `Clone`: exactly one handle exists per acquired node, and dropping it
/// schedules the removal.
#[derive(Debug)]
pub struct NodeHandle {
    id: NodeId,
    retire: Sender<NodeId>,
}

impl NodeHandle {
    /// Id of the node in the host.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        // The receiver lives as long as the scene; a closed channel means the
        // whole host is going away with it.
        let _ = self.retire.send(self.id);
    }
}

/// Acquires nodes and removes them from the host once their handles drop.
#[derive(Debug)]
pub struct Retirer {
    tx: Sender<NodeId>,
    rx: Receiver<NodeId>,
}

impl Retirer {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    /// Add `node` to the host and return the handle that owns it.
    pub fn acquire<H: SceneHost + ?Sized>(&self, host: &mut H, node: Node) -> NodeHandle {
        let id = host.add_node(node);
        NodeHandle {
            id,
            retire: self.tx.clone(),
        }
    }

    /// Remove every node whose handle has been dropped since the last flush.
    ///
    /// Returns the number of nodes removed.
    pub fn flush<H: SceneHost + ?Sized>(&self, host: &mut H) -> usize {
        let mut removed = 0;
        while let Ok(id) = self.rx.try_recv() {
            if host.remove_node(id).is_some() {
                removed += 1;
            } else {
                tracing::debug!("node {} was already gone from the host", id);
            }
        }
        removed
    }
}

impl Default for Retirer {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of recent removals a [`HeadlessHost`] remembers.
pub const REMOVAL_LOG_LIMIT: usize = 1024;

/// In-memory host that keeps nodes in a map and records recent removals.
///
/// Used for tests, benches and as the node store behind the desktop viewer.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    removed: VecDeque<NodeId>,
    frames: u64,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// All live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of live nodes of the given kind.
    pub fn count_kind(&self, kind: &str) -> usize {
        self.nodes.values().filter(|n| n.kind() == kind).count()
    }

    /// How many times `id` appears among the last [`REMOVAL_LOG_LIMIT`] removals.
    pub fn removal_count(&self, id: NodeId) -> usize {
        self.removed.iter().filter(|r| **r == id).count()
    }

    /// Recent removals, oldest first.
    pub fn removed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.removed.iter().copied()
    }

    /// Number of `render` calls.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl SceneHost for HeadlessHost {
    fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id);
        if node.is_some() {
            if self.removed.len() == REMOVAL_LOG_LIMIT {
                self.removed.pop_front();
            }
            self.removed.push_back(id);
        }
        node
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn render(&mut self) {
        self.frames += 1;
    }
}
