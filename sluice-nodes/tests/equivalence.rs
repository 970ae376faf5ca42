//! Scheduler and optimiser equivalence over a realistic pipeline.
//!
//! The pipeline mirrors a typical use of the ready-made nodes: one
//! seeded random source feeding a smoothing branch and a percentile
//! branch, both aggregated into a final mean.

use sluice_core::prelude::*;
use sluice_nodes::{ElementPicker, Mean, MovingAverage, Percentile, RandomSource};
use std::sync::Arc;

/// Build the two-branch pipeline and return its sink.
///
/// gen -> movavg -> picker -> mean_pos -\
/// gen -> percentile -----> mean_perc --+-> final mean
fn pipeline() -> Arc<Node> {
    let generator = Node::builder(RandomSource)
        .param("Amount", 100)
        .param("Seed", 7)
        .build()
        .unwrap();
    let average = Node::builder(MovingAverage)
        .param("Size", 5)
        .rules(PropagationRules::from_pairs([("Numbers", "Array")]))
        .build()
        .unwrap();
    let picker = Node::builder(ElementPicker)
        .param("Position", 30)
        .build()
        .unwrap();
    let percentile = Node::builder(Percentile)
        .param("Order", 70)
        .rules(PropagationRules::from_pairs([("Numbers", "Array")]))
        .build()
        .unwrap();
    let mean_pos = Node::builder(Mean)
        .rules(PropagationRules::from_pairs([("PickedElement", "Array")]))
        .build()
        .unwrap();
    let mean_perc = Node::builder(Mean)
        .rules(PropagationRules::from_pairs([("Percentile", "Array")]))
        .build()
        .unwrap();
    let sink = Node::builder(Mean)
        .rules(PropagationRules::from_pairs([("Mean", "Array")]))
        .build()
        .unwrap();

    connect(&generator, &average);
    connect(&average, &picker);
    connect(&picker, &mean_pos);
    connect(&generator, &percentile);
    connect(&percentile, &mean_perc);
    connect(&mean_pos, &sink);
    connect(&mean_perc, &sink);
    sink
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_and_serial_produce_identical_outputs() {
    let parallel_sink = pipeline();
    parallel_execute(&parallel_sink);
    parallel_sink.wait().await.unwrap();

    let serial_sink = pipeline();
    serial_execute(&serial_sink);
    assert!(serial_sink.is_finished());

    assert_eq!(
        parallel_sink.output_float("Mean").unwrap(),
        serial_sink.output_float("Mean").unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn improve_before_dispatch_is_output_neutral() {
    let plain_sink = pipeline();
    parallel_execute(&plain_sink);
    plain_sink.wait().await.unwrap();

    let fused_sink = pipeline();
    improve(&fused_sink);
    parallel_execute(&fused_sink);
    fused_sink.wait().await.unwrap();

    assert_eq!(
        plain_sink.output_float("Mean").unwrap(),
        fused_sink.output_float("Mean").unwrap()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn improve_serialises_the_linear_stretches() {
    let sink = pipeline();
    let flat = flatten(&sink);

    improve(&sink);

    // The generator fans out and the sink fans in; both stay parallel.
    // The two linear stretches in between were fused.
    let by_tag = |tag: &str| -> Vec<Arc<Node>> {
        flat.entries()
            .iter()
            .filter(|e| e.node.class_tag() == tag)
            .map(|e| Arc::clone(&e.node))
            .collect()
    };

    assert!(by_tag("RandomSource")[0].parallel_execution());
    assert!(!by_tag("MovingAverage")[0].parallel_execution());
    assert!(!by_tag("ElementPicker")[0].parallel_execution());
    assert!(!by_tag("Percentile")[0].parallel_execution());
    // The two intermediate means feed the fan-in sink: last of their
    // chains, so they keep worker dispatch.
    for mean in by_tag("Mean") {
        assert!(mean.parallel_execution());
    }

    parallel_execute(&sink);
    sink.wait().await.unwrap();
    assert!(sink.is_finished());
}
