//! Constant value source.

use sluice_core::prelude::*;

/// Emits a configured float array on its `Numbers` output.
///
/// The canonical way to feed a pipeline a known sequence, in tests and
/// wherever the data already exists.
///
/// # Slots
/// - Parameter `Numbers: float_vec` (default empty) - the sequence to emit
/// - Output `Numbers: float_vec`
#[derive(Debug, Default)]
pub struct ValueSource;

impl Behaviour for ValueSource {
    fn class_tag(&self) -> &'static str {
        "ValueSource"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::parameter("Numbers", Vec::<f64>::new()),
            SlotSpec::output("Numbers", ValueKind::FloatVec),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        let numbers = io.param_floats("Numbers")?.to_vec();
        if numbers.is_empty() {
            return Err(SluiceError::aborted("numbers must not be empty"));
        }
        io.set_output("Numbers", numbers)
    }
}
