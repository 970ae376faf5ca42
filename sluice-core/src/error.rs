//! Error types for the sluice engine.
//!
//! Fatal errors abort the node that raised them and fan out across the
//! connected component; non-fatal conditions (rule-resolution misses,
//! possible loops during flattening) are logged and execution continues.

use crate::value::ValueKind;
use thiserror::Error;

/// The main error type for sluice operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SluiceError {
    /// A write carried a value whose kind does not match the slot's
    /// declared kind.
    #[error("E101: slot '{slot}' of {node} expects {expected}, got {actual}")]
    SlotType {
        /// The node owning the slot.
        node: String,
        /// The slot base name.
        slot: String,
        /// The declared kind.
        expected: ValueKind,
        /// The kind of the rejected value.
        actual: ValueKind,
    },

    /// A slot name does not exist on the node.
    #[error("E102: {node} has no slot named '{slot}'")]
    SlotNotFound {
        /// The node that was queried.
        node: String,
        /// The missing slot name.
        slot: String,
    },

    /// A scalar accessor was used on a list slot, or vice versa.
    #[error("E103: slot '{slot}' of {node}: {cause}")]
    SlotShape {
        /// The node owning the slot.
        node: String,
        /// The slot base name.
        slot: String,
        /// Description of the misuse.
        cause: String,
    },

    /// `run` read an input that is declared but empty.
    #[error("E201: input slot '{slot}' of {node} is empty")]
    MissingInput {
        /// The node whose input is empty.
        node: String,
        /// The empty input slot.
        slot: String,
    },

    /// A parameter failed a node's precondition.
    #[error("E202: parameter '{parameter}' out of range: {cause}")]
    ParameterOutOfRange {
        /// The offending parameter.
        parameter: String,
        /// Why the value was rejected.
        cause: String,
    },

    /// The worker pool refused a task.
    #[error("E301: dispatch failed for {node}: {cause}")]
    Dispatch {
        /// The node that could not be dispatched.
        node: String,
        /// Reason for the refusal.
        cause: String,
    },

    /// A node aborted, either from its own `run` or through the error
    /// channel of a neighbour.
    #[error("E302: {message}")]
    Aborted {
        /// The message carried by the abort signal.
        message: String,
    },
}

impl SluiceError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SlotType { .. } => "E101",
            Self::SlotNotFound { .. } => "E102",
            Self::SlotShape { .. } => "E103",
            Self::MissingInput { .. } => "E201",
            Self::ParameterOutOfRange { .. } => "E202",
            Self::Dispatch { .. } => "E301",
            Self::Aborted { .. } => "E302",
        }
    }

    /// Author-driven abort from inside a `run` body.
    #[must_use]
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }

    /// The message the error channel should carry for this error.
    ///
    /// An explicit abort travels verbatim; every other error travels as
    /// its display form, code included.
    #[must_use]
    pub fn abort_message(&self) -> String {
        match self {
            Self::Aborted { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using [`SluiceError`].
pub type Result<T> = std::result::Result<T, SluiceError>;
