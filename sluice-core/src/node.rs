//! Nodes: the units of computation, and the behaviour contract their
//! authors implement.
//!
//! A node owns a slot table, a user-supplied behaviour, its position in
//! the graph (ancestor and descendant completion maps) and a broadcast
//! channel for its observable events. Nodes are shared-ownership
//! entities: every neighbour holds a strong handle, the engine itself
//! holds none, so a node is released as soon as its last neighbour (or
//! the caller) lets go.

use crate::error::{Result, SluiceError};
use crate::rules::PropagationRules;
use crate::slot::{SlotSpec, SlotTable};
use crate::types::NodeId;
use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The contract a node author implements.
///
/// A behaviour declares its slots once, gets two configuration hooks
/// (`setup` before parameters are applied, `init` after) and supplies the
/// `run` procedure that reads inputs and parameters and writes outputs.
/// Returning an error from `run` aborts the node; use
/// [`SluiceError::aborted`] for an explicit message.
pub trait Behaviour: Send + 'static {
    /// Stable name identifying this behaviour in diagnostics.
    fn class_tag(&self) -> &'static str;

    /// The slot table this behaviour declares.
    fn slots(&self) -> Vec<SlotSpec>;

    /// Hook run before parameters are applied.
    fn setup(&mut self, _io: &mut SlotTable) -> Result<()> {
        Ok(())
    }

    /// Hook run after parameters are applied.
    fn init(&mut self, _io: &mut SlotTable) -> Result<()> {
        Ok(())
    }

    /// The computation. Runs at most once, after every ancestor has
    /// finished and its outputs have been transferred in.
    fn run(&mut self, io: &mut SlotTable) -> Result<()>;
}

/// Observable events a node publishes.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// The node's `run` is about to begin.
    JustStarted {
        /// The node that started.
        node: NodeId,
    },
    /// The node's `run` completed successfully.
    JustFinished {
        /// The node that finished.
        node: NodeId,
    },
    /// The node aborted.
    Raise {
        /// The node that raised.
        node: NodeId,
        /// The abort message.
        message: String,
    },
}

/// One neighbour and whether it has finished.
pub(crate) struct NeighborEntry {
    pub(crate) node: Arc<Node>,
    pub(crate) done: bool,
}

/// Mutable node state: lifecycle flags and the two completion maps.
///
/// Everything here is guarded by one mutex so that concurrent completion
/// events from several ancestors serialise their bookkeeping and the
/// readiness check + `started` flip form a single critical section.
pub(crate) struct NodeState {
    pub(crate) started: bool,
    pub(crate) finished: bool,
    pub(crate) aborted: bool,
    pub(crate) abort_message: Option<String>,
    pub(crate) ancestors: Vec<NeighborEntry>,
    pub(crate) descendants: Vec<NeighborEntry>,
}

/// Outcome of an attempt to claim a node for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartOutcome {
    /// The node was claimed; the caller must dispatch it.
    Started,
    /// Some ancestor has not finished yet.
    NotReady,
    /// Already started or aborted; nothing to do.
    Skip,
}

/// A unit of computation in a dataflow graph.
pub struct Node {
    id: NodeId,
    class_tag: &'static str,
    nickname: String,
    keep_input: AtomicBool,
    parallel_execution: AtomicBool,
    rules: PropagationRules,
    pub(crate) behaviour: Mutex<Box<dyn Behaviour>>,
    pub(crate) slots: Mutex<SlotTable>,
    pub(crate) state: Mutex<NodeState>,
    events: broadcast::Sender<NodeEvent>,
}

impl Node {
    /// Start building a node around a behaviour.
    pub fn builder(behaviour: impl Behaviour) -> NodeBuilder {
        NodeBuilder {
            behaviour: Box::new(behaviour),
            nickname: String::new(),
            params: Vec::new(),
            rules: PropagationRules::new(),
            keep_input: false,
            parallel_execution: true,
        }
    }

    /// The node's process-unique id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The behaviour's stable class tag.
    #[must_use]
    pub fn class_tag(&self) -> &'static str {
        self.class_tag
    }

    /// The user-given nickname, possibly empty.
    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Class tag, identity and nickname in one debug string.
    #[must_use]
    pub fn print_name(&self) -> String {
        if self.nickname.is_empty() {
            format!("{} {}", self.class_tag, self.id)
        } else {
            format!("{} {} {}", self.class_tag, self.id, self.nickname)
        }
    }

    /// The propagation rules governing values arriving at this node.
    #[must_use]
    pub fn rules(&self) -> &PropagationRules {
        &self.rules
    }

    /// Whether input slots survive past `run`.
    #[must_use]
    pub fn keep_input(&self) -> bool {
        self.keep_input.load(Ordering::Relaxed)
    }

    /// Set whether input slots survive past `run`.
    pub fn set_keep_input(&self, keep: bool) {
        self.keep_input.store(keep, Ordering::Relaxed);
    }

    /// Whether this node dispatches its descendants to worker threads.
    #[must_use]
    pub fn parallel_execution(&self) -> bool {
        self.parallel_execution.load(Ordering::Relaxed)
    }

    /// Set whether this node dispatches its descendants to worker
    /// threads.
    pub fn set_parallel_execution(&self, parallel: bool) {
        self.parallel_execution.store(parallel, Ordering::Relaxed);
    }

    /// Whether `run` has been dispatched.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Whether `run` has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Whether the node has aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    /// The message this node aborted with, if it has.
    #[must_use]
    pub fn abort_reason(&self) -> Option<String> {
        self.state.lock().abort_message.clone()
    }

    /// Whether every ancestor has finished.
    #[must_use]
    pub fn all_ancestors_finished(&self) -> bool {
        self.state.lock().ancestors.iter().all(|e| e.done)
    }

    /// Snapshot of the ancestor handles.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Arc<Node>> {
        self.state
            .lock()
            .ancestors
            .iter()
            .map(|e| Arc::clone(&e.node))
            .collect()
    }

    /// Snapshot of the descendant handles.
    #[must_use]
    pub fn descendants(&self) -> Vec<Arc<Node>> {
        self.state
            .lock()
            .descendants
            .iter()
            .map(|e| Arc::clone(&e.node))
            .collect()
    }

    /// Number of ancestors.
    #[must_use]
    pub fn ancestor_count(&self) -> usize {
        self.state.lock().ancestors.len()
    }

    /// Number of descendants.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.state.lock().descendants.len()
    }

    /// Subscribe to this node's events.
    ///
    /// Delivery is queued through the channel; observers never run inside
    /// the emitting call stack.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    /// Clone read of a scalar input slot.
    pub fn input(&self, name: &str) -> Result<Value> {
        self.slots.lock().input_value(name)
    }

    /// Clone read of an output slot.
    pub fn output(&self, name: &str) -> Result<Value> {
        self.slots.lock().output_value(name)
    }

    /// Read an output slot as f64.
    pub fn output_float(&self, name: &str) -> Result<f64> {
        self.slots.lock().output_float(name)
    }

    /// Clone an output float vector.
    pub fn output_floats(&self, name: &str) -> Result<Vec<f64>> {
        self.slots.lock().output_floats(name).map(<[f64]>::to_vec)
    }

    /// Move read of an output slot.
    pub fn take_output(&self, name: &str) -> Result<Value> {
        self.slots.lock().take_output(name)
    }

    /// Read a parameter as f64 (integers widen).
    pub fn param_float(&self, name: &str) -> Result<f64> {
        self.slots.lock().param_float(name)
    }

    /// Read a parameter as i64.
    pub fn param_int(&self, name: &str) -> Result<i64> {
        self.slots.lock().param_int(name)
    }

    /// Write an input slot from outside the graph, before execution.
    pub fn set_input(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.slots.lock().set_input(name, value)
    }

    /// Write a parameter from outside the graph, before execution.
    pub fn set_param(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.slots.lock().set_param(name, value)
    }

    /// Wait until this node finishes or its component aborts.
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.subscribe();
        loop {
            {
                let state = self.state.lock();
                if state.aborted {
                    return Err(SluiceError::Aborted {
                        message: state.abort_message.clone().unwrap_or_default(),
                    });
                }
                if state.finished {
                    return Ok(());
                }
            }
            match rx.recv().await {
                Ok(NodeEvent::JustFinished { .. }) => return Ok(()),
                Ok(NodeEvent::Raise { message, .. }) => {
                    return Err(SluiceError::Aborted { message })
                }
                Ok(NodeEvent::JustStarted { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SluiceError::aborted("event channel closed"));
                }
            }
        }
    }

    pub(crate) fn emit(&self, event: NodeEvent) {
        // No receivers is fine; events are fire-and-forget.
        let _ = self.events.send(event);
    }

    /// Claim the node for execution: readiness check and `started` flip
    /// in one critical section, so the node is dispatched at most once.
    pub(crate) fn try_start(&self) -> StartOutcome {
        let mut state = self.state.lock();
        if state.started || state.aborted {
            return StartOutcome::Skip;
        }
        if state.ancestors.iter().any(|e| !e.done) {
            return StartOutcome::NotReady;
        }
        state.started = true;
        StartOutcome::Started
    }

    pub(crate) fn mark_finished(&self) {
        self.state.lock().finished = true;
    }

    /// Mark aborted; returns false if the node already was.
    pub(crate) fn mark_aborted(&self, message: &str) -> bool {
        let mut state = self.state.lock();
        if state.aborted {
            return false;
        }
        state.aborted = true;
        state.abort_message = Some(message.to_string());
        true
    }

    /// Ancestors whose completion bit is still unset.
    pub(crate) fn pending_ancestors(&self) -> Vec<Arc<Node>> {
        self.state
            .lock()
            .ancestors
            .iter()
            .filter(|e| !e.done)
            .map(|e| Arc::clone(&e.node))
            .collect()
    }

    pub(crate) fn mark_ancestor_done(&self, id: NodeId) {
        let mut state = self.state.lock();
        if let Some(entry) = state.ancestors.iter_mut().find(|e| e.node.id() == id) {
            entry.done = true;
        }
    }

    pub(crate) fn mark_descendant_done(&self, id: NodeId) {
        let mut state = self.state.lock();
        if let Some(entry) = state.descendants.iter_mut().find(|e| e.node.id() == id) {
            entry.done = true;
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("name", &self.print_name());
        if let Some(state) = self.state.try_lock() {
            s.field("started", &state.started)
                .field("finished", &state.finished)
                .field("aborted", &state.aborted)
                .field("ancestors", &state.ancestors.len())
                .field("descendants", &state.descendants.len());
        }
        if let Some(slots) = self.slots.try_lock() {
            s.field("slots", &*slots);
        }
        s.finish()
    }
}

/// Factory for nodes: allocate, `setup`, apply the parameter map, `init`,
/// return a shared handle.
pub struct NodeBuilder {
    behaviour: Box<dyn Behaviour>,
    nickname: String,
    params: Vec<(String, Value)>,
    rules: PropagationRules,
    keep_input: bool,
    parallel_execution: bool,
}

impl NodeBuilder {
    /// Set the user nickname, used in diagnostics and rule
    /// disambiguation.
    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    /// Add a parameter (or pre-set an input). The reserved names
    /// `KeepInput` and `ParallelExecution` address the built-in policy
    /// flags.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Set the propagation rules for values arriving at this node.
    #[must_use]
    pub fn rules(mut self, rules: PropagationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Preserve input slots past `run` (default: false).
    #[must_use]
    pub fn keep_input(mut self, keep: bool) -> Self {
        self.keep_input = keep;
        self
    }

    /// Dispatch descendants to worker threads (default: true).
    #[must_use]
    pub fn parallel_execution(mut self, parallel: bool) -> Self {
        self.parallel_execution = parallel;
        self
    }

    /// Build the node and return its shared handle.
    pub fn build(self) -> Result<Arc<Node>> {
        let Self {
            mut behaviour,
            nickname,
            params,
            rules,
            mut keep_input,
            mut parallel_execution,
        } = self;

        let id = NodeId::next();
        let label = if nickname.is_empty() {
            format!("{} {}", behaviour.class_tag(), id)
        } else {
            format!("{} {} {}", behaviour.class_tag(), id, nickname)
        };

        let mut slots = SlotTable::new(label.clone(), behaviour.slots())?;
        behaviour.setup(&mut slots)?;

        for (name, value) in params {
            match name.as_str() {
                "KeepInput" => {
                    keep_input = value.as_bool().ok_or_else(|| SluiceError::SlotType {
                        node: label.clone(),
                        slot: name.clone(),
                        expected: crate::value::ValueKind::Bool,
                        actual: value.kind(),
                    })?;
                }
                "ParallelExecution" => {
                    parallel_execution =
                        value.as_bool().ok_or_else(|| SluiceError::SlotType {
                            node: label.clone(),
                            slot: name.clone(),
                            expected: crate::value::ValueKind::Bool,
                            actual: value.kind(),
                        })?;
                }
                _ => {
                    if !slots.write_named(&name, value)? {
                        tracing::warn!(
                            node = %label,
                            parameter = %name,
                            "trying to set a value that is not among the node's slots"
                        );
                    }
                }
            }
        }

        behaviour.init(&mut slots)?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Arc::new(Node {
            id,
            class_tag: behaviour.class_tag(),
            nickname,
            keep_input: AtomicBool::new(keep_input),
            parallel_execution: AtomicBool::new(parallel_execution),
            rules,
            behaviour: Mutex::new(behaviour),
            slots: Mutex::new(slots),
            state: Mutex::new(NodeState {
                started: false,
                finished: false,
                aborted: false,
                abort_message: None,
                ancestors: Vec::new(),
                descendants: Vec::new(),
            }),
            events,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    struct Doubler;

    impl Doubler {
        fn new() -> Self {
            Self
        }
    }

    impl Behaviour for Doubler {
        fn class_tag(&self) -> &'static str {
            "Doubler"
        }

        fn slots(&self) -> Vec<SlotSpec> {
            vec![
                SlotSpec::input("Value", ValueKind::Float),
                SlotSpec::parameter("Factor", 2.0),
                SlotSpec::output("Result", ValueKind::Float),
            ]
        }

        fn init(&mut self, io: &mut SlotTable) -> Result<()> {
            // Parameters must already be applied at this point.
            assert!(io.param_float("Factor").is_ok());
            Ok(())
        }

        fn run(&mut self, io: &mut SlotTable) -> Result<()> {
            let factor = io.param_float("Factor")?;
            let value = io.input_float("Value")?;
            io.set_output("Result", value * factor)
        }
    }

    #[test]
    fn builder_applies_parameters_then_init() {
        let node = Node::builder(Doubler::new())
            .nickname("dbl")
            .param("Factor", 3.0)
            .param("Value", 5.0)
            .build()
            .unwrap();

        assert_eq!(node.param_float("Factor").unwrap(), 3.0);
        assert_eq!(node.input("Value").unwrap().as_float(), Some(5.0));
        assert_eq!(node.class_tag(), "Doubler");
        assert!(node.print_name().contains("dbl"));
    }

    #[test]
    fn reserved_parameters_set_policy_flags() {
        let node = Node::builder(Doubler::new())
            .param("KeepInput", true)
            .param("ParallelExecution", false)
            .build()
            .unwrap();

        assert!(node.keep_input());
        assert!(!node.parallel_execution());
    }

    #[test]
    fn unknown_parameters_are_not_fatal() {
        let node = Node::builder(Doubler::new())
            .param("NoSuchThing", 1.0)
            .build();
        assert!(node.is_ok());
    }

    #[test]
    fn outputs_cannot_be_set_externally() {
        // "Result" only exists as an output; neither external writer
        // reaches it.
        let node = Node::builder(Doubler::new()).build().unwrap();
        assert_eq!(node.set_param("Result", 1.0).unwrap_err().code(), "E102");
        assert_eq!(node.set_input("Result", 1.0).unwrap_err().code(), "E102");
    }

    #[test]
    fn default_policy_flags() {
        let node = Node::builder(Doubler::new()).build().unwrap();
        assert!(!node.keep_input());
        assert!(node.parallel_execution());
    }

    #[test]
    fn node_with_no_ancestors_is_ready() {
        let node = Node::builder(Doubler::new()).build().unwrap();
        assert_eq!(node.try_start(), StartOutcome::Started);
        // Already claimed: at most once.
        assert_eq!(node.try_start(), StartOutcome::Skip);
    }
}
