//! Tree node types for the lookahead arena.
//!
//! Uses arena allocation with indices: the parent link is a plain handle
//! rather than an owning reference, which avoids reference cycles and makes
//! bulk deletion on re-rooting safe.

use olop_core::Action;

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// A node in the lookahead tree.
///
/// The cached `reward`, `value` and `value_upper_bound` are meaningless
/// until the node has been through an update (tracked by `updated`); every
/// consumer skips nodes that never received one.
#[derive(Clone, Debug)]
pub struct Node<S> {
    /// Parent handle (None for the root).
    pub parent: Option<NodeId>,

    /// Action that led to this node from its parent (None for the root).
    pub action: Option<Action>,

    /// Children as `(action, node)` pairs; empty until expansion.
    pub children: Vec<(Action, NodeId)>,

    /// State snapshot exclusively owned by this node. Unbound on a fresh
    /// root and on children whose replay was cut short by the budget.
    pub state: Option<S>,

    /// Distance from the root; the root sits at depth 0.
    pub depth: usize,

    /// Immediate reward observed on the transition into this node.
    pub reward: f32,

    /// Discounted-return lower bound of the path ending at this node.
    pub value: f32,

    /// Optimistic upper bound on the return achievable from here onward.
    pub value_upper_bound: f32,

    /// Whether the transition into this node terminated the episode.
    pub done: bool,

    /// Visit counter, incremented on each upward backup this node joins.
    pub count: u32,

    /// Whether this node has received its reward through an update.
    pub updated: bool,
}

impl<S> Node<S> {
    /// Create an unbound root node.
    pub fn root() -> Self {
        Self::unvisited(None, None, None, 0)
    }

    /// Create a child node awaiting its first update.
    pub fn child(parent: NodeId, action: Action, state: Option<S>, depth: usize) -> Self {
        Self::unvisited(Some(parent), Some(action), state, depth)
    }

    fn unvisited(
        parent: Option<NodeId>,
        action: Option<Action>,
        state: Option<S>,
        depth: usize,
    ) -> Self {
        Self {
            parent,
            action,
            children: Vec::new(),
            state,
            depth,
            reward: 0.0,
            value: 0.0,
            value_upper_bound: 0.0,
            done: false,
            count: 1,
            updated: false,
        }
    }

    /// Look up the child reached by `action`.
    pub fn child_id(&self, action: Action) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, id)| *id)
    }

    /// Whether this node has any children.
    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }
}
