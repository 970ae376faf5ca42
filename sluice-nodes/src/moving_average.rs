//! Moving average filter.

use sluice_core::prelude::*;

/// Smooths its input array with a sliding window mean.
///
/// Consumes `Array` (the input moves, it is not copied) and produces one
/// mean per window position, `len - size` values in total.
///
/// # Slots
/// - Input `Array: float_vec`
/// - Parameter `Size: int` (default 3) - window width
/// - Output `Array: float_vec`
#[derive(Debug, Default)]
pub struct MovingAverage;

impl Behaviour for MovingAverage {
    fn class_tag(&self) -> &'static str {
        "MovingAverage"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::input("Array", ValueKind::FloatVec),
            SlotSpec::parameter("Size", 3),
            SlotSpec::output("Array", ValueKind::FloatVec),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        let array = io.take_input_floats("Array").unwrap_or_default();
        if array.is_empty() {
            return Err(SluiceError::aborted("input is empty"));
        }
        let size = io.param_int("Size")?;
        if size < 1 {
            return Err(SluiceError::ParameterOutOfRange {
                parameter: "Size".to_string(),
                cause: "window size must be at least 1".to_string(),
            });
        }
        if (array.len() as i64) < size {
            return Err(SluiceError::aborted("moving average size is too low"));
        }

        let size = size as usize;
        let output: Vec<f64> = array
            .windows(size)
            .take(array.len() - size)
            .map(|window| window.iter().sum::<f64>() / size as f64)
            .collect();
        io.set_output("Array", output)
    }
}
