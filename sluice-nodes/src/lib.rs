//! Ready-made compute nodes for the sluice engine.
//!
//! Small numeric building blocks: sources that emit float arrays,
//! filters that transform them, and fan-in aggregates. Each module holds
//! one behaviour; wire them with `sluice_core::connect` and drive them
//! with either scheduler.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mean;
pub mod moving_average;
pub mod percentile;
pub mod picker;
pub mod random_source;
pub mod value_source;

pub use mean::Mean;
pub use moving_average::MovingAverage;
pub use percentile::Percentile;
pub use picker::ElementPicker;
pub use random_source::RandomSource;
pub use value_source::ValueSource;
