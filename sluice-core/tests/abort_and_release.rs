//! Integration tests for the error channel and the memory policy.

mod common;

use common::{init_tracing, run_log, Fail, Probe};
use sluice_core::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn abort_reaches_every_node_of_the_component() {
    init_tracing();
    let log = run_log();
    let failing = Node::builder(Fail { message: "kaboom" }).build().unwrap();
    let middle = Node::builder(Probe::new("middle", &log)).build().unwrap();
    let sink = Node::builder(Probe::new("sink", &log)).build().unwrap();
    let side = Node::builder(Probe::new("side", &log)).build().unwrap();
    connect(&failing, &middle);
    connect(&middle, &sink);
    connect(&side, &middle);

    // The caller observes the pipeline through a terminal raise handler.
    let mut events = sink.subscribe();
    parallel_execute(&sink);

    let err = sink.wait().await.unwrap_err();
    assert_eq!(err, SluiceError::aborted("kaboom"));

    loop {
        match events.recv().await.unwrap() {
            NodeEvent::Raise { message, .. } => {
                assert_eq!(message, "kaboom");
                break;
            }
            _ => {}
        }
    }

    assert!(failing.is_aborted());
    assert!(middle.is_aborted());
    assert!(sink.is_aborted());
    // The abort also travelled upstream across the fan-in edge.
    assert!(side.is_aborted());
    assert!(!failing.is_finished());
    assert!(!sink.is_started());
}

#[tokio::test(flavor = "multi_thread")]
async fn aborted_component_is_never_redispatched() {
    let log = run_log();
    let failing = Node::builder(Fail { message: "stop" }).build().unwrap();
    let probe = Probe::new("sink", &log);
    let runs = probe.runs_handle();
    let sink = Node::builder(probe).build().unwrap();
    connect(&failing, &sink);

    parallel_execute(&sink);
    assert!(sink.wait().await.is_err());

    parallel_execute(&sink);
    serial_execute(&sink);

    assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(!sink.is_started());
}

#[tokio::test(flavor = "multi_thread")]
async fn running_nodes_complete_but_their_outputs_are_tainted() {
    let log = run_log();
    let slow = Node::builder(Probe::new("slow", &log).with_delay(80))
        .build()
        .unwrap();
    let failing = Node::builder(Fail { message: "late" }).build().unwrap();
    let sink = Node::builder(Probe::new("sink", &log)).build().unwrap();
    connect(&slow, &sink);
    connect(&failing, &sink);

    let mut slow_events = slow.subscribe();
    parallel_execute(&sink);

    // The failing parent aborts the component while the slow parent is
    // still running; the slow run completes normally.
    loop {
        match slow_events.recv().await.unwrap() {
            NodeEvent::JustFinished { .. } => break,
            _ => {}
        }
    }

    assert!(slow.is_finished());
    assert!(slow.is_aborted());
    assert!(sink.is_aborted());
    assert!(!sink.is_started());
}

#[tokio::test(flavor = "multi_thread")]
async fn quiescent_components_release_their_nodes() {
    let log = run_log();
    let a = Node::builder(Probe::new("a", &log)).build().unwrap();
    let b = Node::builder(Probe::new("b", &log)).build().unwrap();
    let c = Node::builder(Probe::new("c", &log)).build().unwrap();
    connect(&a, &b);
    connect(&b, &c);

    let weak_a = Arc::downgrade(&a);
    let weak_b = Arc::downgrade(&b);

    parallel_execute(&c);
    // The caller keeps only the sink handle.
    drop(a);
    drop(b);
    c.wait().await.unwrap();

    // Workers may still hold a handle for a moment after the finish
    // event; give them a bounded grace period.
    let mut released = false;
    for _ in 0..100 {
        if weak_a.upgrade().is_none() && weak_b.upgrade().is_none() {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(released, "upstream nodes were not released after quiescence");
    assert!(c.is_finished());
}

#[tokio::test(flavor = "multi_thread")]
async fn aborted_components_release_their_nodes() {
    let log = run_log();
    let failing = Node::builder(Fail { message: "gone" }).build().unwrap();
    let middle = Node::builder(Probe::new("middle", &log)).build().unwrap();
    let sink = Node::builder(Probe::new("sink", &log)).build().unwrap();
    connect(&failing, &middle);
    connect(&middle, &sink);

    let weak_failing = Arc::downgrade(&failing);
    let weak_middle = Arc::downgrade(&middle);

    parallel_execute(&sink);
    drop(failing);
    drop(middle);
    assert!(sink.wait().await.is_err());

    // The abort tore the edges down; only the caller's handles were
    // keeping the upstream nodes alive.
    let mut released = false;
    for _ in 0..100 {
        if weak_failing.upgrade().is_none() && weak_middle.upgrade().is_none() {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(released, "aborted nodes were not released");
}

#[test]
fn keep_input_retains_the_handles() {
    let log = run_log();
    let a = Node::builder(Probe::new("a", &log))
        .keep_input(true)
        .build()
        .unwrap();
    let b = Node::builder(Probe::new("b", &log)).build().unwrap();
    connect(&a, &b);

    let weak_a = Arc::downgrade(&a);
    serial_execute(&b);
    drop(a);

    // b still holds its ancestor: the edge survived.
    assert!(weak_a.upgrade().is_some());
    assert_eq!(b.ancestor_count(), 1);
}
