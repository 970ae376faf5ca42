//! Sluice core library.
//!
//! A dataflow execution engine: a directed acyclic graph of compute
//! nodes whose edges carry named typed values. Outputs of a parent
//! become inputs of its descendants, renamed on the way through
//! propagation rules; two interchangeable schedulers drive the graph
//! (across worker threads, or serially on the caller thread); errors
//! abort the whole connected component; and inputs are released the
//! moment they have been consumed.
//!
//! # Key components
//!
//! - **Slots**: each node publishes named, typed cells partitioned into
//!   inputs, outputs and parameters ([`slot`], [`value`]).
//! - **Nodes**: a user behaviour plus slots, lifecycle flags and policy
//!   flags, shared through `Arc` ([`node`]).
//! - **Graph**: bidirectional adjacency with completion tracking
//!   ([`graph`]).
//! - **Scheduler**: parallel and serial execution, propagation, and the
//!   abort channel ([`scheduler`]).
//! - **Optimiser**: fuses single-parent/single-child edges into serial
//!   chains ([`optimiser`]).
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::prelude::*;
//!
//! let source = Node::builder(MySource::default())
//!     .param("Amount", 100)
//!     .build()?;
//! let sink = Node::builder(MySink::default())
//!     .rules(PropagationRules::from_pairs([("Numbers", "Array")]))
//!     .build()?;
//! connect(&source, &sink);
//!
//! parallel_execute(&sink);
//! sink.wait().await?;
//! let result = sink.output_float("Result")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod node;
pub mod optimiser;
pub mod prelude;
pub mod rules;
pub mod scheduler;
pub mod slot;
pub mod types;
pub mod value;

// Re-export key types at crate root for convenience
pub use error::{Result, SluiceError};
pub use graph::{connect, connected, disconnect, flatten, is_removable, FlatGraph};
pub use node::{Behaviour, Node, NodeBuilder, NodeEvent};
pub use optimiser::improve;
pub use rules::{PropagationRules, Resolution};
pub use scheduler::{abort, parallel_execute, serial_execute};
pub use slot::{SlotKind, SlotShape, SlotSpec, SlotTable};
pub use types::NodeId;
pub use value::{Value, ValueKind};
