//! Uniform random number source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sluice_core::prelude::*;

/// Emits `Amount` uniform random floats in `[0, 1)` on its `Numbers`
/// output.
///
/// With a non-zero `Seed` the sequence is deterministic, which is what
/// reproducible pipelines and tests want; seed zero draws from system
/// entropy.
///
/// # Slots
/// - Parameter `Amount: int` (default 10) - how many numbers to generate
/// - Parameter `Seed: int` (default 0) - fixed seed, 0 means entropy
/// - Output `Numbers: float_vec`
#[derive(Debug, Default)]
pub struct RandomSource;

impl Behaviour for RandomSource {
    fn class_tag(&self) -> &'static str {
        "RandomSource"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::parameter("Amount", 10),
            SlotSpec::parameter("Seed", 0),
            SlotSpec::output("Numbers", ValueKind::FloatVec),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        let amount = io.param_int("Amount")?;
        if amount <= 0 {
            return Err(SluiceError::aborted("amount must be positive"));
        }
        let seed = io.param_int("Seed")?;
        tracing::debug!(amount, seed, "generating random numbers");

        let mut rng = if seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(seed as u64)
        };
        let numbers: Vec<f64> = (0..amount).map(|_| rng.r#gen::<f64>()).collect();
        io.set_output("Numbers", numbers)
    }
}
