//! Shared collector scaffolding.
//!
//! Dependent collectors all follow the same shape: a feeder task drains
//! the upstream and extracts parent keys, the keys fan out across a
//! bounded worker pool, and each worker runs the per-parent enumeration.
//! The helpers here carry that shape so the per-type collectors only
//! supply the extraction and emission logic.

use std::future::Future;
use std::sync::Arc;

use aw_client::AzureClient;
use aw_core::azure;
use aw_core::pipeline::{self, send_guarded};
use aw_core::Record;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Stream of output records.
pub type RecordStream = mpsc::Receiver<Record>;

/// Fan-out bound for dependent collectors. A tuning constant: wide enough
/// to keep paginated calls saturated, small enough to stay under
/// per-endpoint throttling.
pub(crate) const FAN_OUT: usize = 25;

/// Cancellable handle for emitting into a collector's output.
pub(crate) struct Emitter<T> {
    cancel: CancellationToken,
    tx: mpsc::Sender<T>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            cancel: self.cancel.clone(),
            tx: self.tx.clone(),
        }
    }
}

impl<T> Emitter<T> {
    /// Sends one item. `false` means cancellation fired or the consumer
    /// went away; the caller stops producing.
    pub(crate) async fn emit(&self, item: T) -> bool {
        send_guarded(&self.cancel, &self.tx, item).await
    }

    /// The shared cancellation token, for client calls.
    pub(crate) fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Drains `upstream` and extracts one key per record.
///
/// A record the extractor does not recognize is a wiring bug, not a
/// transient failure: the feeder logs once and closes, ending this
/// collector cleanly while the rest of the pipeline keeps running.
pub(crate) fn parent_keys<K, F>(
    cancel: &CancellationToken,
    upstream: RecordStream,
    collector: &'static str,
    extract: F,
) -> mpsc::Receiver<K>
where
    K: Send + 'static,
    F: Fn(&Record) -> Option<K> + Send + 'static,
{
    let (tx, rx) = pipeline::channel();
    let mut upstream = pipeline::or_done(cancel, upstream);
    let cancel = cancel.clone();
    tokio::spawn(async move {
        while let Some(record) = upstream.recv().await {
            match extract(&record) {
                Some(key) => {
                    if !send_guarded(&cancel, &tx, key).await {
                        return;
                    }
                }
                None => {
                    error!(
                        collector,
                        kind = %record.kind(),
                        "unexpected record variant in upstream, unable to continue"
                    );
                    return;
                }
            }
        }
    });
    rx
}

/// Runs `work` for each key across [`FAN_OUT`] workers and closes the
/// output once every worker has finished.
pub(crate) fn fan_out<K, O, F, Fut>(
    cancel: &CancellationToken,
    keys: mpsc::Receiver<K>,
    done_message: &'static str,
    work: F,
) -> mpsc::Receiver<O>
where
    K: Send + 'static,
    O: Send + 'static,
    F: Fn(K, Emitter<O>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = pipeline::channel();
    let worker_inputs = pipeline::demux(cancel, keys, FAN_OUT);
    let cancel = cancel.clone();
    tokio::spawn(async move {
        let mut workers = JoinSet::new();
        for mut keys in worker_inputs {
            let emitter = Emitter {
                cancel: cancel.clone(),
                tx: tx.clone(),
            };
            let work = work.clone();
            workers.spawn(async move {
                while let Some(key) = keys.recv().await {
                    work(key, emitter.clone()).await;
                }
            });
        }
        drop(tx);
        while workers.join_next().await.is_some() {}
        info!("{}", done_message);
    });
    rx
}

/// Builds a filtered-aggregate collector over per-resource role
/// assignments: one enumeration per parent, filter by the role GUID,
/// aggregate the matches into a single record per parent.
///
/// `extract` yields the ARM resource id to enumerate and the key the
/// aggregate is recorded under (they differ only for subscriptions).
pub(crate) fn resource_role_edge<E, B>(
    cancel: &CancellationToken,
    client: &Arc<dyn AzureClient>,
    upstream: RecordStream,
    collector: &'static str,
    done_message: &'static str,
    role_id: &'static str,
    extract: E,
    build: B,
) -> RecordStream
where
    E: Fn(&Record) -> Option<(String, String)> + Send + 'static,
    B: Fn(&str, Vec<azure::RoleAssignment>) -> Record + Clone + Send + Sync + 'static,
{
    let keys = parent_keys(cancel, upstream, collector, extract);
    let client = Arc::clone(client);
    fan_out(
        cancel,
        keys,
        done_message,
        move |(resource_id, key): (String, String), emitter| {
            let client = Arc::clone(&client);
            let build = build.clone();
            async move {
                let mut matched = Vec::new();
                let mut items = client.list_role_assignments_for_resource(
                    emitter.cancellation(),
                    &resource_id,
                    "",
                );
                while let Some(item) = items.recv().await {
                    match item {
                        Ok(assignment) if assignment.matches_role(role_id) => {
                            matched.push(assignment);
                        }
                        Ok(_) => {}
                        Err(err) => {
                            error!(
                                error = %err,
                                resource = %resource_id,
                                collector,
                                "unable to continue processing role assignments for this resource"
                            );
                        }
                    }
                }
                let count = matched.len();
                if !emitter.emit(build(&key, matched)).await {
                    return;
                }
                debug!(resource = %resource_id, count, collector, "finished listing matching role assignments");
            }
        },
    )
}
