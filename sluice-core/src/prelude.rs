//! Prelude for convenient imports.
//!
//! # Example
//!
//! ```ignore
//! use sluice_core::prelude::*;
//! ```

pub use crate::error::{Result, SluiceError};
pub use crate::graph::{connect, connected, disconnect, flatten, is_removable, FlatGraph};
pub use crate::node::{Behaviour, Node, NodeBuilder, NodeEvent};
pub use crate::optimiser::improve;
pub use crate::rules::{PropagationRules, Resolution};
pub use crate::scheduler::{abort, parallel_execute, serial_execute};
pub use crate::slot::{SlotKind, SlotShape, SlotSpec, SlotTable};
pub use crate::types::NodeId;
pub use crate::value::{Value, ValueKind};
