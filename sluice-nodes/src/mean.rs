//! Fan-in arithmetic mean.

use sluice_core::prelude::*;

/// Averages every sample that arrived on its list input.
///
/// `Array` is a list input: each parent's completion appends one value,
/// so a single `Mean` can aggregate any number of upstream nodes.
///
/// # Slots
/// - List input `Array: float`
/// - Output `Mean: float`
#[derive(Debug, Default)]
pub struct Mean;

impl Behaviour for Mean {
    fn class_tag(&self) -> &'static str {
        "Mean"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::list_input("Array", ValueKind::Float),
            SlotSpec::output("Mean", ValueKind::Float),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        let samples = io.input_float_list("Array")?;
        if samples.is_empty() {
            return Err(SluiceError::aborted("input is empty"));
        }
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        io.set_output("Mean", mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_appended_samples() {
        let node = Node::builder(Mean).build().unwrap();
        node.set_input("Array", 7.0).unwrap();
        node.set_input("Array", 3.0).unwrap();

        serial_execute(&node);

        assert_eq!(node.output_float("Mean").unwrap(), 5.0);
    }

    #[test]
    fn empty_input_aborts() {
        let node = Node::builder(Mean).build().unwrap();
        serial_execute(&node);
        assert!(node.is_aborted());
        assert_eq!(node.abort_reason().unwrap(), "input is empty");
    }
}
