//! Percentile of an array.

use crate::picker::pick;
use sluice_core::prelude::*;

/// Computes the `Order`-th percentile of its input array.
///
/// Consumes and sorts `Array`, then picks the element at position
/// `order * len / 100` (integer truncation).
///
/// # Slots
/// - Input `Array: float_vec`
/// - Parameter `Order: int` (default 50)
/// - Output `Percentile: float`
#[derive(Debug, Default)]
pub struct Percentile;

impl Behaviour for Percentile {
    fn class_tag(&self) -> &'static str {
        "Percentile"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::input("Array", ValueKind::FloatVec),
            SlotSpec::parameter("Order", 50),
            SlotSpec::output("Percentile", ValueKind::Float),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        // The input moves out: sorting happens in place.
        let mut array = io.take_input_floats("Array").unwrap_or_default();
        if array.is_empty() {
            return Err(SluiceError::aborted("input is empty"));
        }
        array.sort_by(f64::total_cmp);

        let order = io.param_int("Order")?;
        let position = (order as f64 * array.len() as f64 / 100.0) as i64;
        let value = pick(&array, position)?;
        io.set_output("Percentile", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percentile(input: Vec<f64>, order: i64) -> std::sync::Arc<Node> {
        let node = Node::builder(Percentile)
            .param("Order", order)
            .param("Array", input)
            .build()
            .unwrap();
        serial_execute(&node);
        node
    }

    #[test]
    fn median_of_five() {
        let node = percentile(vec![1.0, 2.0, 3.0, 4.0, 5.0], 50);
        assert_eq!(node.output_float("Percentile").unwrap(), 3.0);
    }

    #[test]
    fn sorts_before_picking() {
        let node = percentile(vec![5.0, 1.0, 4.0, 2.0, 3.0], 50);
        assert_eq!(node.output_float("Percentile").unwrap(), 3.0);
    }

    #[test]
    fn zeroth_percentile_is_the_minimum() {
        let node = percentile(vec![9.0, 7.0, 8.0], 0);
        assert_eq!(node.output_float("Percentile").unwrap(), 7.0);
    }

    #[test]
    fn empty_input_aborts() {
        let node = Node::builder(Percentile).build().unwrap();
        serial_execute(&node);
        assert!(node.is_aborted());
        assert_eq!(node.abort_reason().unwrap(), "input is empty");
    }

    #[test]
    fn hundredth_percentile_is_out_of_range() {
        // order * len / 100 lands one past the end, like the picker it
        // delegates to.
        let node = percentile(vec![1.0, 2.0], 100);
        assert!(node.is_aborted());
    }
}
