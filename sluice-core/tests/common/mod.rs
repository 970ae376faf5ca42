//! Shared test behaviours for the engine integration tests.
#![allow(dead_code)]

use parking_lot::Mutex;
use sluice_core::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared run log: which node ran, in completion order.
pub type RunLog = Arc<Mutex<Vec<&'static str>>>;

pub fn run_log() -> RunLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A chainable probe: reads its (optional) `Trigger` input, adds one and
/// emits it again. Records every run in a shared log and counter.
pub struct Probe {
    pub label: &'static str,
    pub log: RunLog,
    pub runs: Arc<AtomicUsize>,
    pub delay_ms: u64,
}

impl Probe {
    pub fn new(label: &'static str, log: &RunLog) -> Self {
        Self {
            label,
            log: Arc::clone(log),
            runs: Arc::new(AtomicUsize::new(0)),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn runs_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.runs)
    }
}

impl Behaviour for Probe {
    fn class_tag(&self) -> &'static str {
        "Probe"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::input("Trigger", ValueKind::Float),
            SlotSpec::output("Trigger", ValueKind::Float),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        if self.delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(self.delay_ms));
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(self.label);
        // The input is optional: source probes start from zero.
        let value = io.input_float("Trigger").unwrap_or(0.0);
        io.set_output("Trigger", value + 1.0)
    }
}

/// A fan-in joiner: sums every sample that arrived on its list input.
pub struct Gather {
    pub label: &'static str,
    pub log: RunLog,
}

impl Gather {
    pub fn new(label: &'static str, log: &RunLog) -> Self {
        Self {
            label,
            log: Arc::clone(log),
        }
    }
}

impl Behaviour for Gather {
    fn class_tag(&self) -> &'static str {
        "Gather"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::list_input("Sample", ValueKind::Float),
            SlotSpec::output("Total", ValueKind::Float),
        ]
    }

    fn run(&mut self, io: &mut SlotTable) -> Result<()> {
        self.log.lock().push(self.label);
        let samples = io.input_float_list("Sample")?;
        io.set_output("Total", samples.iter().sum::<f64>())
    }
}

/// A behaviour whose run always aborts with the given message.
pub struct Fail {
    pub message: &'static str,
}

impl Behaviour for Fail {
    fn class_tag(&self) -> &'static str {
        "Fail"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::output("Trigger", ValueKind::Float)]
    }

    fn run(&mut self, _io: &mut SlotTable) -> Result<()> {
        Err(SluiceError::aborted(self.message))
    }
}
