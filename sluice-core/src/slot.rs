//! The property model: named, typed slots partitioned into inputs,
//! outputs and parameters.
//!
//! Each node declares a fixed slot table at construction time. Inputs are
//! written by propagation from ancestors (or by the caller before
//! execution), outputs only by `run`, and parameters carry a mandatory
//! default. Slots are addressed by base name within their kind, so a
//! node may have an input and an output sharing one base name (a filter
//! that consumes `Array` and produces `Array`). An input is either
//! *scalar* (one value, last writer wins) or a *list* (every incoming
//! write appends, in arrival order), the latter for fan-in nodes fed the
//! same logical input by many parents.

use crate::error::{Result, SluiceError};
use crate::value::{Value, ValueKind};

/// Which side of a node a slot sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Written by propagation from ancestors or by the caller.
    Input,
    /// Written only by `run`.
    Output,
    /// Configuration with a declared default.
    Parameter,
}

/// Storage discipline of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotShape {
    /// Holds one value; the last writer wins.
    Scalar,
    /// Holds an ordered sequence; each write appends.
    List,
}

/// Declaration of a single slot.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    /// Which side of the node the slot sits on.
    pub kind: SlotKind,
    /// Base name, unique within the slot's kind.
    pub name: String,
    /// The kind values written to this slot must carry. For list slots
    /// this is the element kind.
    pub value_kind: ValueKind,
    /// Storage discipline.
    pub shape: SlotShape,
    /// Declared default, mandatory for parameters.
    pub default: Option<Value>,
}

impl SlotSpec {
    /// Declare a scalar input.
    pub fn input(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            kind: SlotKind::Input,
            name: name.into(),
            value_kind,
            shape: SlotShape::Scalar,
            default: None,
        }
    }

    /// Declare a list input: every incoming write appends an element.
    pub fn list_input(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            kind: SlotKind::Input,
            name: name.into(),
            value_kind,
            shape: SlotShape::List,
            default: None,
        }
    }

    /// Declare an output.
    pub fn output(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            kind: SlotKind::Output,
            name: name.into(),
            value_kind,
            shape: SlotShape::Scalar,
            default: None,
        }
    }

    /// Declare a parameter; the kind is taken from the default.
    pub fn parameter(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            kind: SlotKind::Parameter,
            name: name.into(),
            value_kind: default.kind(),
            shape: SlotShape::Scalar,
            default: Some(default),
        }
    }
}

#[derive(Debug)]
enum SlotCell {
    Scalar(Value),
    List(Vec<Value>),
}

#[derive(Debug)]
struct Slot {
    spec: SlotSpec,
    cell: SlotCell,
}

/// The slot table of one node: declarations plus current values.
///
/// `run` receives a mutable reference to its node's table; everything a
/// behaviour reads or writes goes through the accessors here. Accessors
/// come in three forms per slot: clone read, borrow read, and the
/// destructive move read (`take_*`) that leaves the empty cell behind.
#[derive(Debug)]
pub struct SlotTable {
    owner: String,
    slots: Vec<Slot>,
}

impl SlotTable {
    pub(crate) fn new(owner: String, specs: Vec<SlotSpec>) -> Result<Self> {
        let mut slots: Vec<Slot> = Vec::with_capacity(specs.len());
        for spec in specs {
            if slots
                .iter()
                .any(|s| s.spec.kind == spec.kind && s.spec.name == spec.name)
            {
                return Err(SluiceError::SlotShape {
                    node: owner,
                    slot: spec.name,
                    cause: "duplicate slot name".to_string(),
                });
            }
            if spec.kind == SlotKind::Parameter && spec.default.is_none() {
                return Err(SluiceError::SlotShape {
                    node: owner,
                    slot: spec.name,
                    cause: "parameter without a default".to_string(),
                });
            }
            let cell = match spec.shape {
                SlotShape::Scalar => SlotCell::Scalar(spec.default.clone().unwrap_or(Value::Null)),
                SlotShape::List => SlotCell::List(Vec::new()),
            };
            slots.push(Slot { spec, cell });
        }
        Ok(Self { owner, slots })
    }

    /// The print name of the node owning this table.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the declaration of a slot, if any.
    #[must_use]
    pub fn spec(&self, kind: SlotKind, name: &str) -> Option<&SlotSpec> {
        self.slots
            .iter()
            .map(|s| &s.spec)
            .find(|s| s.kind == kind && s.name == name)
    }

    /// Check whether a slot of the given kind and base name exists.
    #[must_use]
    pub fn contains(&self, kind: SlotKind, name: &str) -> bool {
        self.spec(kind, name).is_some()
    }

    /// All slot declarations, in declaration order.
    pub fn specs(&self) -> impl Iterator<Item = &SlotSpec> {
        self.slots.iter().map(|s| &s.spec)
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Borrow read of a scalar input.
    pub fn input(&self, name: &str) -> Result<&Value> {
        self.borrow(SlotKind::Input, name)
    }

    /// Clone read of a scalar input.
    pub fn input_value(&self, name: &str) -> Result<Value> {
        self.input(name).cloned()
    }

    /// Move read of a scalar input: leaves the empty cell behind.
    pub fn take_input(&mut self, name: &str) -> Result<Value> {
        self.take(SlotKind::Input, name)
    }

    /// Read a scalar input as f64 (integers widen).
    pub fn input_float(&self, name: &str) -> Result<f64> {
        let value = self.input(name)?;
        value
            .as_float()
            .ok_or_else(|| self.read_error(SlotKind::Input, name, value))
    }

    /// Borrow a scalar float-vector input.
    pub fn input_floats(&self, name: &str) -> Result<&[f64]> {
        let value = self.input(name)?;
        match value {
            Value::FloatVec(v) => Ok(v),
            other => Err(self.read_error(SlotKind::Input, name, other)),
        }
    }

    /// Move a scalar float-vector input out.
    pub fn take_input_floats(&mut self, name: &str) -> Result<Vec<f64>> {
        let taken = self.take_input(name)?;
        match taken {
            Value::FloatVec(v) => Ok(v),
            other => {
                let err = self.read_error(SlotKind::Input, name, &other);
                // The read failed; nothing moved.
                let _ = self.write(SlotKind::Input, name, other);
                Err(err)
            }
        }
    }

    /// Collect a list input of numeric elements, in arrival order.
    pub fn input_float_list(&self, name: &str) -> Result<Vec<f64>> {
        let seq = self.input_list(name)?;
        seq.iter()
            .map(|v| {
                v.as_float()
                    .ok_or_else(|| self.read_error(SlotKind::Input, name, v))
            })
            .collect()
    }

    /// Borrow read of a list input, in arrival order.
    pub fn input_list(&self, name: &str) -> Result<&[Value]> {
        let slot = self.slot(SlotKind::Input, name)?;
        match &slot.cell {
            SlotCell::List(seq) => Ok(seq),
            SlotCell::Scalar(_) => Err(self.shape_error(name, "is a scalar input, use input()")),
        }
    }

    /// Move read of a list input.
    pub fn take_input_list(&mut self, name: &str) -> Result<Vec<Value>> {
        let owner = self.owner.clone();
        let slot = self.slot_mut(SlotKind::Input, name)?;
        match &mut slot.cell {
            SlotCell::List(seq) => Ok(std::mem::take(seq)),
            SlotCell::Scalar(_) => Err(SluiceError::SlotShape {
                node: owner,
                slot: name.to_string(),
                cause: "is a scalar input, use take_input()".to_string(),
            }),
        }
    }

    /// Write an input, checking the value kind. Scalar inputs are
    /// replaced, list inputs append.
    pub fn set_input(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.write(SlotKind::Input, name, value.into())
    }

    // ------------------------------------------------------------------
    // Outputs
    // ------------------------------------------------------------------

    /// Borrow read of an output.
    pub fn output(&self, name: &str) -> Result<&Value> {
        self.borrow(SlotKind::Output, name)
    }

    /// Clone read of an output.
    pub fn output_value(&self, name: &str) -> Result<Value> {
        self.output(name).cloned()
    }

    /// Move read of an output.
    pub fn take_output(&mut self, name: &str) -> Result<Value> {
        self.take(SlotKind::Output, name)
    }

    /// Read an output as f64.
    pub fn output_float(&self, name: &str) -> Result<f64> {
        let value = self.output(name)?;
        value
            .as_float()
            .ok_or_else(|| self.read_error(SlotKind::Output, name, value))
    }

    /// Borrow an output float vector.
    pub fn output_floats(&self, name: &str) -> Result<&[f64]> {
        let value = self.output(name)?;
        match value {
            Value::FloatVec(v) => Ok(v),
            other => Err(self.read_error(SlotKind::Output, name, other)),
        }
    }

    /// Write an output, checking the value kind.
    pub fn set_output(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.write(SlotKind::Output, name, value.into())
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    /// Borrow read of a parameter.
    pub fn param(&self, name: &str) -> Result<&Value> {
        self.borrow(SlotKind::Parameter, name)
    }

    /// Read a parameter as bool.
    pub fn param_bool(&self, name: &str) -> Result<bool> {
        let value = self.param(name)?;
        value
            .as_bool()
            .ok_or_else(|| self.read_error(SlotKind::Parameter, name, value))
    }

    /// Read a parameter as i64.
    pub fn param_int(&self, name: &str) -> Result<i64> {
        let value = self.param(name)?;
        value
            .as_int()
            .ok_or_else(|| self.read_error(SlotKind::Parameter, name, value))
    }

    /// Read a parameter as f64 (integers widen).
    pub fn param_float(&self, name: &str) -> Result<f64> {
        let value = self.param(name)?;
        value
            .as_float()
            .ok_or_else(|| self.read_error(SlotKind::Parameter, name, value))
    }

    /// Borrow a parameter float vector.
    pub fn param_floats(&self, name: &str) -> Result<&[f64]> {
        let value = self.param(name)?;
        match value {
            Value::FloatVec(v) => Ok(v),
            other => Err(self.read_error(SlotKind::Parameter, name, other)),
        }
    }

    /// Write a parameter, checking the value kind.
    pub fn set_param(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.write(SlotKind::Parameter, name, value.into())
    }

    // ------------------------------------------------------------------
    // Engine-facing operations
    // ------------------------------------------------------------------

    /// Reset every input slot to the empty state.
    pub fn clear_inputs(&mut self) {
        for slot in &mut self.slots {
            if slot.spec.kind == SlotKind::Input {
                match &mut slot.cell {
                    SlotCell::Scalar(cell) => *cell = Value::Null,
                    SlotCell::List(seq) => seq.clear(),
                }
            }
        }
    }

    /// Write a named value the way external writers do: to the parameter
    /// and/or input slot with that base name, whichever exist.
    ///
    /// Returns `Ok(false)` when neither exists; a kind mismatch on any
    /// matching slot is an error.
    pub(crate) fn write_named(&mut self, name: &str, value: Value) -> Result<bool> {
        let targets: Vec<SlotKind> = [SlotKind::Parameter, SlotKind::Input]
            .into_iter()
            .filter(|&kind| self.contains(kind, name))
            .collect();
        match targets.as_slice() {
            [] => Ok(false),
            [kind] => {
                self.write(*kind, name, value)?;
                Ok(true)
            }
            many => {
                for kind in many {
                    self.write(*kind, name, value.clone())?;
                }
                Ok(true)
            }
        }
    }

    /// Base names of the slots that cross edges on completion: outputs
    /// and parameters.
    pub(crate) fn propagation_sources(&self) -> Vec<(String, SlotKind)> {
        self.slots
            .iter()
            .filter(|s| matches!(s.spec.kind, SlotKind::Output | SlotKind::Parameter))
            .map(|s| (s.spec.name.clone(), s.spec.kind))
            .collect()
    }

    /// Read a slot for an edge transfer. `None` when the cell is empty.
    /// With `take`, the value moves out instead of being cloned.
    pub(crate) fn read_for_transfer(
        &mut self,
        kind: SlotKind,
        name: &str,
        take: bool,
    ) -> Option<Value> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.spec.kind == kind && s.spec.name == name)?;
        match &mut slot.cell {
            SlotCell::Scalar(cell) if !cell.is_null() => {
                if take {
                    Some(std::mem::take(cell))
                } else {
                    Some(cell.clone())
                }
            }
            _ => None,
        }
    }

    /// Check whether a transfer target (input or parameter) with the
    /// given base name exists.
    pub(crate) fn has_transfer_target(&self, name: &str) -> bool {
        self.contains(SlotKind::Input, name) || self.contains(SlotKind::Parameter, name)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn slot(&self, kind: SlotKind, name: &str) -> Result<&Slot> {
        self.slots
            .iter()
            .find(|s| s.spec.kind == kind && s.spec.name == name)
            .ok_or_else(|| SluiceError::SlotNotFound {
                node: self.owner.clone(),
                slot: name.to_string(),
            })
    }

    fn slot_mut(&mut self, kind: SlotKind, name: &str) -> Result<&mut Slot> {
        let owner = &self.owner;
        self.slots
            .iter_mut()
            .find(|s| s.spec.kind == kind && s.spec.name == name)
            .ok_or_else(|| SluiceError::SlotNotFound {
                node: owner.clone(),
                slot: name.to_string(),
            })
    }

    fn borrow(&self, kind: SlotKind, name: &str) -> Result<&Value> {
        let slot = self.slot(kind, name)?;
        match &slot.cell {
            SlotCell::Scalar(cell) => Ok(cell),
            SlotCell::List(_) => Err(self.shape_error(name, "is a list slot, use input_list()")),
        }
    }

    fn take(&mut self, kind: SlotKind, name: &str) -> Result<Value> {
        let owner = self.owner.clone();
        let slot = self.slot_mut(kind, name)?;
        match &mut slot.cell {
            SlotCell::Scalar(cell) => Ok(std::mem::take(cell)),
            SlotCell::List(_) => Err(SluiceError::SlotShape {
                node: owner,
                slot: name.to_string(),
                cause: "is a list slot, use take_input_list()".to_string(),
            }),
        }
    }

    fn write(&mut self, kind: SlotKind, name: &str, value: Value) -> Result<()> {
        let owner = self.owner.clone();
        let slot = self.slot_mut(kind, name)?;
        if !value.is_null() && value.kind() != slot.spec.value_kind {
            return Err(SluiceError::SlotType {
                node: owner,
                slot: name.to_string(),
                expected: slot.spec.value_kind,
                actual: value.kind(),
            });
        }
        match &mut slot.cell {
            SlotCell::Scalar(cell) => *cell = value,
            SlotCell::List(seq) => {
                if value.is_null() {
                    seq.clear();
                } else {
                    seq.push(value);
                }
            }
        }
        Ok(())
    }

    fn read_error(&self, kind: SlotKind, name: &str, value: &Value) -> SluiceError {
        if value.is_null() {
            SluiceError::MissingInput {
                node: self.owner.clone(),
                slot: name.to_string(),
            }
        } else {
            SluiceError::SlotType {
                node: self.owner.clone(),
                slot: name.to_string(),
                expected: self
                    .spec(kind, name)
                    .map(|s| s.value_kind)
                    .unwrap_or(ValueKind::Null),
                actual: value.kind(),
            }
        }
    }

    fn shape_error(&self, name: &str, cause: &str) -> SluiceError {
        SluiceError::SlotShape {
            node: self.owner.clone(),
            slot: name.to_string(),
            cause: cause.to_string(),
        }
    }
}
