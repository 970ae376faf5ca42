//! Structural optimisation: fusing removable edges into serial chains.
//!
//! An edge is *removable* when its parent has exactly one descendant and
//! its child exactly one ancestor. A chain of removable edges gains
//! nothing from worker-thread dispatch: running it on a single thread
//! lets every transfer along the chain move its value instead of cloning
//! it.

use crate::graph::{self, flatten};
use crate::node::Node;
use crate::types::NodeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Fuse chains of removable edges in the component reachable from
/// `node`.
///
/// Every node of a coalesced chain except the last gets
/// `parallel_execution = false`, so the chain runs serially on whichever
/// thread dispatches its head. Output values are unchanged; only the
/// scheduling of the chain is.
pub fn improve(node: &Arc<Node>) {
    let flat = flatten(node);

    // Removable edges, parent -> child. A removable parent has exactly
    // one child, so there is at most one entry per parent.
    let mut removable: HashMap<NodeId, NodeId> = HashMap::new();
    for entry in flat.entries() {
        for child_id in &entry.children {
            let Some(child) = flat.get(*child_id) else {
                continue;
            };
            if graph::is_removable(&entry.node, child) {
                removable.insert(entry.node.id(), *child_id);
            }
        }
    }

    // Chain heads: removable parents that are nobody's removable child.
    let tails: HashSet<NodeId> = removable.values().copied().collect();
    for head in removable.keys().filter(|id| !tails.contains(id)) {
        let mut chain = vec![*head];
        let mut seen: HashSet<NodeId> = chain.iter().copied().collect();
        let mut current = *head;
        while let Some(&next) = removable.get(&current) {
            if !seen.insert(next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        // Every chain node except the last serialises its dispatch.
        for id in &chain[..chain.len() - 1] {
            if let Some(member) = flat.get(*id) {
                tracing::debug!(node = %member.print_name(), "fused into serial chain");
                member.set_parallel_execution(false);
            }
        }
    }
}
