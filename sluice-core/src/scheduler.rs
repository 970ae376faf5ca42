//! The two execution strategies, post-run propagation and the error
//! channel.
//!
//! Both entry points walk the ancestors of the given node and run
//! whatever is ready. [`parallel_execute`] dispatches `run` bodies to the
//! tokio worker pool (sized by the host, hardware parallelism by
//! default) and returns without blocking; [`serial_execute`] runs
//! everything inline on the calling thread and forces the serial
//! discipline forward. Completion is handled on whichever worker
//! finished: the finishing node transfers its outputs into each
//! descendant, updates completion bits and dispatches descendants that
//! became ready. A descendant's completion bit is written only *after*
//! the transfer into it, so readiness implies every input has arrived.

use crate::graph;
use crate::node::{Node, NodeEvent, StartOutcome};
use crate::rules::Resolution;
use crate::slot::SlotKind;
use crate::SluiceError;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Drive the component of `node` with worker-thread dispatch.
///
/// If the node is ready it is claimed and its `run` is spawned on the
/// worker pool; otherwise the readiness walk recurses into unstarted
/// ancestors. The caller does not block; observe completion through
/// [`Node::subscribe`] or [`Node::wait`].
pub fn parallel_execute(node: &Arc<Node>) {
    match node.try_start() {
        StartOutcome::Started => dispatch(node),
        StartOutcome::NotReady => {
            for ancestor in node.pending_ancestors() {
                if !ancestor.is_started() {
                    parallel_execute(&ancestor);
                }
            }
        }
        StartOutcome::Skip => {}
    }
}

/// Drive the component of `node` inline on the calling thread.
///
/// Same readiness walk as [`parallel_execute`], but `run` is invoked
/// synchronously and `just_finished` is emitted before return. The node's
/// `parallel_execution` flag is forced off so the synchronous discipline
/// propagates forward.
pub fn serial_execute(node: &Arc<Node>) {
    if node.is_aborted() {
        return;
    }
    for ancestor in node.pending_ancestors() {
        if !ancestor.is_started() {
            serial_execute(&ancestor);
        }
    }
    node.set_parallel_execution(false);
    if node.try_start() == StartOutcome::Started {
        node.emit(NodeEvent::JustStarted { node: node.id() });
        run_node(node);
    }
}

/// Broadcast `abort(message)` across the weakly connected component,
/// tearing it down.
///
/// Delivery is queued through a worklist, never reentrant: each node is
/// marked aborted, emits `raise`, and enqueues its neighbours in both
/// directions. Aborted nodes are never dispatched afterwards. Edges are
/// removed as the signal passes them, so the component is freed as soon
/// as the caller releases its own handles.
pub fn abort(node: &Arc<Node>, message: impl Into<String>) {
    let message = message.into();
    let mut queue: VecDeque<Arc<Node>> = VecDeque::new();
    let mut visited: HashSet<crate::NodeId> = HashSet::new();
    queue.push_back(Arc::clone(node));

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.id()) {
            continue;
        }
        if current.mark_aborted(&message) {
            tracing::debug!(node = %current.print_name(), message = %message, "node aborted");
            current.emit(NodeEvent::Raise {
                node: current.id(),
                message: message.clone(),
            });
            let ancestors = current.ancestors();
            let descendants = current.descendants();
            for ancestor in &ancestors {
                graph::disconnect(ancestor, &current);
            }
            for descendant in &descendants {
                graph::disconnect(&current, descendant);
            }
            for neighbour in ancestors.into_iter().chain(descendants) {
                queue.push_back(neighbour);
            }
        }
    }
}

/// Spawn a claimed node's `run` on the worker pool.
///
/// The spawned task holds the only engine-side strong handle for the
/// duration of `run`, so a node is never destroyed from within its own
/// run. A missing runtime is the dispatch error of the taxonomy and
/// aborts the node.
fn dispatch(node: &Arc<Node>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            node.emit(NodeEvent::JustStarted { node: node.id() });
            tracing::debug!(node = %node.print_name(), "node dispatched");
            let node = Arc::clone(node);
            handle.spawn(async move {
                run_node(&node);
            });
        }
        Err(e) => {
            let err = SluiceError::Dispatch {
                node: node.print_name(),
                cause: e.to_string(),
            };
            tracing::error!(node = %node.print_name(), error = %err, "dispatch failed");
            abort(node, err.abort_message());
        }
    }
}

/// Run a claimed node inline, then finish and propagate.
fn run_node(node: &Arc<Node>) {
    let result = {
        let mut behaviour = node.behaviour.lock();
        let mut slots = node.slots.lock();
        behaviour.run(&mut slots)
    };

    match result {
        Ok(()) => {
            node.mark_finished();
            tracing::debug!(node = %node.print_name(), "node finished");
            node.emit(NodeEvent::JustFinished { node: node.id() });
            propagate(node);
        }
        Err(e) => {
            tracing::error!(node = %node.print_name(), error = %e, "node run failed");
            abort(node, e.abort_message());
        }
    }
}

/// Post-run propagation: notify neighbours, transfer outputs forward,
/// release inputs per policy, dispatch descendants that became ready.
fn propagate(node: &Arc<Node>) {
    let id = node.id();

    for ancestor in node.ancestors() {
        ancestor.mark_descendant_done(id);
    }

    if node.is_aborted() {
        // The run completed while the component was tearing down; its
        // outputs are tainted and go nowhere.
        return;
    }

    let descendants = node.descendants();
    let keep_input = node.keep_input();
    let last = descendants.len().saturating_sub(1);

    for (i, descendant) in descendants.iter().enumerate() {
        if descendant.is_aborted() {
            descendant.mark_ancestor_done(id);
            continue;
        }

        // Inside a fused serial chain there is exactly one descendant, so
        // the output moves without copying.
        transfer(node, descendant, !keep_input && i == last);
        descendant.mark_ancestor_done(id);

        if !keep_input {
            graph::disconnect(node, descendant);
        }

        if !descendant.is_started() {
            if node.parallel_execution() {
                parallel_execute(descendant);
            } else {
                serial_execute(descendant);
            }
        }
    }

    if !keep_input {
        node.slots.lock().clear_inputs();
    }
}

/// Transfer the finished parent's output and parameter slots into one
/// descendant, renaming through the descendant's propagation rules.
///
/// Parameters cross only when a rule mentions them. A rule that resolves
/// to nothing, a missing target slot or a kind mismatch is logged and
/// that slot is skipped; the transfer itself never fails.
fn transfer(parent: &Arc<Node>, child: &Arc<Node>, move_allowed: bool) {
    let sources = parent.slots.lock().propagation_sources();
    let rules = child.rules();

    for (base, kind) in sources {
        let explicit = rules.mentions(&base);
        if kind == SlotKind::Parameter && !explicit {
            continue;
        }

        let target = match rules.resolve(&base, parent.nickname()) {
            Resolution::Identity => base.clone(),
            Resolution::Target(t) => t.to_string(),
            Resolution::Unresolved => {
                tracing::warn!(
                    parent = %parent.print_name(),
                    child = %child.print_name(),
                    slot = %base,
                    "no rule target selected by the parent nickname, transfer skipped"
                );
                continue;
            }
        };

        if !child.slots.lock().has_transfer_target(&target) {
            if explicit {
                tracing::warn!(
                    parent = %parent.print_name(),
                    child = %child.print_name(),
                    slot = %target,
                    "rule target is not an input or parameter of the child, transfer skipped"
                );
            }
            continue;
        }

        // Only outputs move; parameters keep their value on the parent.
        let take = move_allowed && kind == SlotKind::Output;
        let Some(value) = parent.slots.lock().read_for_transfer(kind, &base, take) else {
            continue;
        };

        if let Err(e) = child.slots.lock().write_named(&target, value) {
            tracing::warn!(
                parent = %parent.print_name(),
                child = %child.print_name(),
                slot = %target,
                error = %e,
                "transfer skipped"
            );
        }
    }
}
