//! Bidirectional adjacency between nodes.
//!
//! Edges are recorded symmetrically: the ancestor stores the descendant
//! in its descendant map, the descendant stores the ancestor in its
//! ancestor map, each entry annotated with the neighbour's completion
//! bit. The abort channel needs no per-edge subscriptions: the fan-out in
//! [`crate::scheduler::abort`] walks this adjacency in both directions.

use crate::node::{NeighborEntry, Node};
use crate::types::NodeId;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

/// Create the edge `ancestor → descendant`.
///
/// Both adjacency entries are recorded, each with a completion bit
/// reflecting whether the other side has already finished. Connecting an
/// already-connected pair refreshes the bits.
pub fn connect(ancestor: &Arc<Node>, descendant: &Arc<Node>) {
    let ancestor_finished = ancestor.is_finished();
    let descendant_finished = descendant.is_finished();

    upsert(
        &mut ancestor.state.lock().descendants,
        descendant,
        descendant_finished,
    );
    upsert(
        &mut descendant.state.lock().ancestors,
        ancestor,
        ancestor_finished,
    );
}

/// Remove the edge `ancestor → descendant`; the exact inverse of
/// [`connect`].
pub fn disconnect(ancestor: &Arc<Node>, descendant: &Arc<Node>) {
    ancestor
        .state
        .lock()
        .descendants
        .retain(|e| e.node.id() != descendant.id());
    descendant
        .state
        .lock()
        .ancestors
        .retain(|e| e.node.id() != ancestor.id());
}

/// Check whether both adjacency entries of `ancestor → descendant` exist.
#[must_use]
pub fn connected(ancestor: &Arc<Node>, descendant: &Arc<Node>) -> bool {
    let forward = ancestor
        .state
        .lock()
        .descendants
        .iter()
        .any(|e| e.node.id() == descendant.id());
    let backward = descendant
        .state
        .lock()
        .ancestors
        .iter()
        .any(|e| e.node.id() == ancestor.id());
    forward && backward
}

/// Check whether the edge between the two nodes (in either orientation)
/// is removable: the parent has exactly one descendant and the child
/// exactly one ancestor. Such edges are fusible by the optimiser.
#[must_use]
pub fn is_removable(a: &Arc<Node>, b: &Arc<Node>) -> bool {
    if connected(b, a) {
        b.descendant_count() == 1 && a.ancestor_count() == 1
    } else if connected(a, b) {
        a.descendant_count() == 1 && b.ancestor_count() == 1
    } else {
        false
    }
}

fn upsert(entries: &mut Vec<NeighborEntry>, node: &Arc<Node>, done: bool) {
    if let Some(entry) = entries.iter_mut().find(|e| e.node.id() == node.id()) {
        entry.done = done;
    } else {
        entries.push(NeighborEntry {
            node: Arc::clone(node),
            done,
        });
    }
}

/// Parent-to-direct-children snapshot of a weakly connected component.
///
/// Produced by [`flatten`]; used by the optimiser and for debug output.
pub struct FlatGraph {
    entries: Vec<FlatEntry>,
}

/// One node of a [`FlatGraph`] and the ids of its direct children.
pub struct FlatEntry {
    /// The node handle.
    pub node: Arc<Node>,
    /// Ids of the node's direct descendants at snapshot time.
    pub children: Vec<NodeId>,
}

impl FlatGraph {
    /// The entries, in discovery order.
    #[must_use]
    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    /// Number of nodes in the component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the component is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a node handle by id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.entries
            .iter()
            .find(|e| e.node.id() == id)
            .map(|e| &e.node)
    }

    /// Render the component as DOT graph-description text.
    ///
    /// The caller decides what to do with the text; this module does not
    /// shell out to any drawing tool.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph g{\n");
        for entry in &self.entries {
            let node = &entry.node;
            let mut label = format!("{}\\nID {}", node.class_tag(), node.id());
            if !node.nickname().is_empty() {
                let _ = write!(label, "\\nNick: {}", node.nickname());
            }
            let _ = writeln!(dot, "var{}[label=\"{}\"];", node.id().as_u64(), label);
        }
        for entry in &self.entries {
            for child in &entry.children {
                let _ = writeln!(
                    dot,
                    "var{} -> var{}",
                    entry.node.id().as_u64(),
                    child.as_u64()
                );
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Snapshot the parent-to-children adjacency of the whole weakly
/// connected component reachable from `node`.
///
/// The walk keeps a visited set; revisiting a node is logged as a
/// possible loop and that branch is cut. This is the engine's only cycle
/// guard.
#[must_use]
pub fn flatten(node: &Arc<Node>) -> FlatGraph {
    let mut graph = FlatGraph {
        entries: Vec::new(),
    };
    let mut visited = HashSet::new();
    flatten_into(node, &mut graph, &mut visited);
    graph
}

fn flatten_into(node: &Arc<Node>, graph: &mut FlatGraph, visited: &mut HashSet<NodeId>) {
    if !visited.insert(node.id()) {
        tracing::warn!(node = %node.print_name(), "flatten revisited a node, possible loop");
        return;
    }
    let descendants = node.descendants();
    graph.entries.push(FlatEntry {
        node: Arc::clone(node),
        children: descendants.iter().map(|d| d.id()).collect(),
    });
    for relative in descendants.into_iter().chain(node.ancestors()) {
        if !visited.contains(&relative.id()) {
            flatten_into(&relative, graph, visited);
        }
    }
}
