//! Async driver for the pipeline.
//! Steps run one at a time on tokio's blocking pool and report back over a
//! channel. A ticker animates the observer while a step is in flight.

use super::steps::{execute, StepContext};
use super::{Pipeline, PipelineResult, StepName, StepOutcome};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub const TICK_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Debug)]
pub enum StepEvent {
    Finished(StepName, StepOutcome),
    Failed(StepName, String),
}

/// Receives pipeline updates. Both callbacks are display only.
pub trait PipelineObserver {
    /// Called after each state change.
    fn on_update(&mut self, _pipeline: &Pipeline) {}

    /// Called periodically while a step is running.
    fn on_tick(&mut self, _pipeline: &Pipeline) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

fn spawn_step(step: StepName, ctx: Arc<StepContext>, tx: mpsc::UnboundedSender<StepEvent>) {
    tokio::spawn(async move {
        let result =
            tokio::task::spawn_blocking(move || execute(step, &ctx).map_err(|e| e.to_string()))
                .await;
        let event = match result {
            Ok(Ok(outcome)) => StepEvent::Finished(step, outcome),
            Ok(Err(e)) => StepEvent::Failed(step, e),
            Err(e) => StepEvent::Failed(step, format!("step aborted: {e}")),
        };
        // The receiver only goes away when the driver itself is dropped.
        let _ = tx.send(event);
    });
}

/// Runs the pipeline to completion.
///
/// `quit` is checked after each step's event has been handled; a step that
/// has already started always finishes.
pub async fn run(
    mut pipeline: Pipeline,
    ctx: Arc<StepContext>,
    observer: &mut dyn PipelineObserver,
    quit: Arc<AtomicBool>,
) -> PipelineResult {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut next = pipeline.start();
    observer.on_update(&pipeline);

    while let Some(step) = next.take() {
        spawn_step(step, Arc::clone(&ctx), tx.clone());

        let event = loop {
            tokio::select! {
                event = rx.recv() => break event,
                _ = ticker.tick() => observer.on_tick(&pipeline),
            }
        };

        next = match event {
            Some(StepEvent::Finished(_, outcome)) => pipeline.complete(outcome),
            Some(StepEvent::Failed(_, error)) => pipeline.fail(error),
            None => pipeline.fail("step ended without reporting a result"),
        };
        observer.on_update(&pipeline);

        if let Some(pending) = next {
            if quit.load(Ordering::SeqCst) {
                info!("Quit requested, stopping before {pending}");
                pipeline.cancel();
                observer.on_update(&pipeline);
                break;
            }
        }
    }

    pipeline.result()
}
