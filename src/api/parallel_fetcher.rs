// src/api/parallel_fetcher.rs
//! Bounded-concurrency orchestration.
//!
//! One discovery task walks the spaces in order and spawns a fetch task per
//! discovered id. Fetch tasks share a semaphore, so at most
//! `max_concurrency` detail requests are in flight; discovery itself never
//! waits on it. Outcomes reach the consumer in completion order.
//!
//! An authentication or transport failure on any object raises a shared
//! stop flag: discovery ends and queued fetches give up their turn, so
//! only requests already in flight still report.

use super::fetcher::{afetch_object, FetchTarget};
use super::pagination::object_id_stream;
use super::types::FetchOutcome;
use super::{ApiContext, AsyncTransport};
use crate::types::{ObjectId, SpaceId};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

type OutcomeSender = mpsc::UnboundedSender<FetchOutcome>;

/// Starts loading every space and returns the outcomes as they complete.
///
/// Must be called from within a tokio runtime. Dropping the stream stops
/// further fetches from starting; requests already in flight finish.
pub fn concurrent_outcomes(
    transport: Arc<dyn AsyncTransport>,
    ctx: ApiContext,
    spaces: Vec<(SpaceId, String)>,
    max_concurrency: usize,
) -> BoxStream<'static, FetchOutcome> {
    let (tx, rx) = mpsc::unbounded_channel();
    let gate = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let stop = Arc::new(AtomicBool::new(false));

    tokio::spawn(discover(transport, ctx, spaces, gate, stop, tx));

    stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|outcome| (outcome, rx))
    })
    .boxed()
}

/// Paginates each space in turn, spawning one fetch task per id.
async fn discover(
    transport: Arc<dyn AsyncTransport>,
    ctx: ApiContext,
    spaces: Vec<(SpaceId, String)>,
    gate: Arc<Semaphore>,
    stop: Arc<AtomicBool>,
    tx: OutcomeSender,
) {
    let mut spawned = 0usize;

    for (space_id, space_name) in spaces {
        let space_name: Arc<str> = Arc::from(space_name);
        let mut ids = object_id_stream(transport.clone(), ctx.clone(), space_id.clone());

        while let Some(next) = ids.next().await {
            if tx.is_closed() {
                log::debug!("Outcome stream dropped; stopping discovery");
                return;
            }
            if stop.load(Ordering::SeqCst) {
                log::debug!("Fatal fetch failure; stopping discovery");
                return;
            }
            match next {
                Ok(object_id) => {
                    spawned += 1;
                    tokio::spawn(fetch_gated(
                        transport.clone(),
                        ctx.clone(),
                        gate.clone(),
                        stop.clone(),
                        tx.clone(),
                        space_id.clone(),
                        space_name.clone(),
                        object_id,
                    ));
                }
                Err(error) => {
                    let _ = tx.send(FetchOutcome::Failed {
                        space_id,
                        object_id: None,
                        error,
                    });
                    return;
                }
            }
        }
    }

    log::debug!("Discovery finished; {} fetch task(s) spawned", spawned);
}

/// Waits for a gate slot, fetches one object, and reports the outcome.
async fn fetch_gated(
    transport: Arc<dyn AsyncTransport>,
    ctx: ApiContext,
    gate: Arc<Semaphore>,
    stop: Arc<AtomicBool>,
    tx: OutcomeSender,
    space_id: SpaceId,
    space_name: Arc<str>,
    object_id: ObjectId,
) {
    let Ok(_permit) = gate.acquire_owned().await else {
        return;
    };
    if tx.is_closed() || stop.load(Ordering::SeqCst) {
        return;
    }

    let target = FetchTarget {
        space_id: &space_id,
        space_name: &space_name,
        object_id: &object_id,
    };
    let outcome = afetch_object(transport.as_ref(), &ctx, target).await;
    // Raised while the permit is held, so the next task through the gate sees it.
    if outcome.ends_run() {
        stop.store(true, Ordering::SeqCst);
    }
    let _ = tx.send(outcome);
}
