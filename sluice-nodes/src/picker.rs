//! Element picker.

use sluice_core::prelude::*;

/// Picks one element of its input array by position.
///
/// # Slots
/// - Input `Array: float_vec`
/// - Parameter `Position: int` (default 0)
/// - Output `PickedElement: float`
#[derive(Debug, Default)]
pub struct ElementPicker;

/// Bounds-checked element access shared with [`crate::Percentile`].
pub(crate) fn pick(array: &[f64], position: i64) -> Result<f64> {
    if position < 0 || position as usize >= array.len() {
        return Err(SluiceError::ParameterOutOfRange {
            parameter: "Position".to_string(),
            cause: "position out of range".to_string(),
        });
    }
    Ok(array[position as usize])
}

impl Behaviour for ElementPicker {
    fn class_tag(&self) -> &'static str {
        "ElementPicker"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::input("Array", ValueKind::FloatVec),
            SlotSpec::parameter("Position", 0),
            SlotSpec::output("PickedElement", ValueKind::Float),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        let position = io.param_int("Position")?;
        let picked = {
            let array = match io.input_floats("Array") {
                Ok(array) if !array.is_empty() => array,
                _ => return Err(SluiceError::aborted("input is empty")),
            };
            pick(array, position)?
        };
        io.set_output("PickedElement", picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picked(input: Vec<f64>, position: i64) -> std::sync::Arc<Node> {
        let node = Node::builder(ElementPicker)
            .param("Position", position)
            .param("Array", input)
            .build()
            .unwrap();
        serial_execute(&node);
        node
    }

    #[test]
    fn picks_by_position() {
        let node = picked(vec![0.15, 0.25, 0.35], 0);
        assert_eq!(node.output_float("PickedElement").unwrap(), 0.15);

        let node = picked(vec![0.15, 0.25, 0.35], 2);
        assert_eq!(node.output_float("PickedElement").unwrap(), 0.35);
    }

    #[test]
    fn empty_input_aborts() {
        let node = Node::builder(ElementPicker).build().unwrap();
        serial_execute(&node);
        assert!(node.is_aborted());
        assert_eq!(node.abort_reason().unwrap(), "input is empty");
    }

    #[test]
    fn out_of_range_position_aborts() {
        let node = picked(vec![1.0, 2.0], 7);
        assert!(node.is_aborted());
        assert!(node.abort_reason().unwrap().contains("position out of range"));

        let node = picked(vec![1.0, 2.0], -1);
        assert!(node.is_aborted());
    }
}
