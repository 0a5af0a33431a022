//! Stream combinators for the collection pipeline.
//!
//! Every stage exchanges items over bounded mpsc channels and observes one
//! shared [`CancellationToken`]. Four combinators compose the whole
//! collector DAG: [`tee`] duplicates a stream to its dependents, [`demux`]
//! fans a stream out to a bounded worker pool, [`mux`] merges subpipelines
//! into one output, and [`or_done`] makes any receive loop
//! cancellation-safe without open-coded selects.
//!
//! Invariants:
//! - every send selects against cancellation, never an unconditional send;
//! - when the token fires, every combinator closes all of its outputs and
//!   its tasks return promptly;
//! - a closed input always propagates to closed outputs.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Capacity of every pipeline channel. One keeps stages in lock step: a
/// producer can never run more than one item ahead of its slowest consumer.
pub const CHANNEL_CAPACITY: usize = 1;

/// Creates a pipeline channel.
pub fn channel<T>() -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Sends `item` unless cancellation fires or the receiver is gone first.
///
/// Returns `false` when the item was not delivered; callers treat that as
/// the signal to stop producing.
pub async fn send_guarded<T>(cancel: &CancellationToken, tx: &mpsc::Sender<T>, item: T) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        result = tx.send(item) => result.is_ok(),
    }
}

/// Wraps `input` so the consumer may ignore cancellation plumbing.
///
/// Forwards every item until `input` ends or the token fires, whichever
/// comes first, then closes the output. Items still buffered at
/// cancellation are dropped.
pub fn or_done<T: Send + 'static>(
    cancel: &CancellationToken,
    mut input: mpsc::Receiver<T>,
) -> mpsc::Receiver<T> {
    let (tx, rx) = channel();
    let cancel = cancel.clone();
    tokio::spawn(async move {
        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return,
                item = input.recv() => item,
            };
            match item {
                Some(item) => {
                    if !send_guarded(&cancel, &tx, item).await {
                        return;
                    }
                }
                None => return,
            }
        }
    });
    rx
}

/// Duplicates `input` into `N` output streams.
///
/// For each item, every output receives the item before the next item is
/// read from `input`; a slow consumer therefore throttles all of them.
/// The arity is const generic so wiring a tee to the wrong number of
/// consumers fails to compile. An output whose consumer went away is
/// detached so the remaining consumers keep receiving.
pub fn tee<T, const N: usize>(
    cancel: &CancellationToken,
    mut input: mpsc::Receiver<T>,
) -> [mpsc::Receiver<T>; N]
where
    T: Clone + Send + 'static,
{
    let mut senders: Vec<Option<mpsc::Sender<T>>> = Vec::with_capacity(N);
    let outputs: [mpsc::Receiver<T>; N] = std::array::from_fn(|_| {
        let (tx, rx) = channel();
        senders.push(Some(tx));
        rx
    });
    let cancel = cancel.clone();
    tokio::spawn(async move {
        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => return,
                item = input.recv() => item,
            };
            let Some(item) = item else { return };
            for slot in senders.iter_mut() {
                let Some(tx) = slot else { continue };
                let delivered = tokio::select! {
                    _ = cancel.cancelled() => return,
                    result = tx.send(item.clone()) => result.is_ok(),
                };
                if !delivered {
                    *slot = None;
                }
            }
            if senders.iter().all(Option::is_none) {
                return;
            }
        }
    });
    outputs
}

/// Fans `input` out into `n` output streams for parallel consumption.
///
/// Each item is delivered to exactly one output; whichever forwarder is
/// free pulls the next item, so distribution follows consumer readiness.
/// All outputs close when `input` ends or the token fires.
pub fn demux<T: Send + 'static>(
    cancel: &CancellationToken,
    input: mpsc::Receiver<T>,
    n: usize,
) -> Vec<mpsc::Receiver<T>> {
    let input = Arc::new(Mutex::new(input));
    (0..n)
        .map(|_| {
            let (tx, rx) = channel();
            let input = Arc::clone(&input);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    // Hold the input lock only for the receive itself so a
                    // forwarder blocked on its consumer never starves the rest.
                    let item = {
                        let mut input = tokio::select! {
                            _ = cancel.cancelled() => return,
                            guard = input.lock() => guard,
                        };
                        tokio::select! {
                            _ = cancel.cancelled() => return,
                            item = input.recv() => item,
                        }
                    };
                    match item {
                        Some(item) => {
                            if !send_guarded(&cancel, &tx, item).await {
                                return;
                            }
                        }
                        None => return,
                    }
                }
            });
            rx
        })
        .collect()
}

/// Merges `inputs` into one output stream in arrival order.
///
/// Each input is drained by its own task, so a slow producer never blocks
/// a fast one beyond the output's own back-pressure. The output closes
/// once every input has closed, or immediately on cancellation.
pub fn mux<T: Send + 'static>(
    cancel: &CancellationToken,
    inputs: Vec<mpsc::Receiver<T>>,
) -> mpsc::Receiver<T> {
    let (tx, rx) = channel();
    for mut input in inputs {
        let tx = tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    _ = cancel.cancelled() => return,
                    item = input.recv() => item,
                };
                match item {
                    Some(item) => {
                        if !send_guarded(&cancel, &tx, item).await {
                            return;
                        }
                    }
                    None => return,
                }
            }
        });
    }
    rx
}
