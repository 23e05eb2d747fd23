//! Single serialization point for graph mutations.
//!
//! Fetch workers run concurrently and hand their observations to one writer
//! task, which applies them (merge + derived-view rebuild) under the graph's
//! write lock and optionally persists a snapshot before acknowledging.

use handshake_graph::SocialGraph;
use handshake_types::{Adjacency, FollowingPage, ObservedUser, SnapshotStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Graph shared between the writer task and readers (scheduler, queries).
pub type SharedGraph = Arc<RwLock<SocialGraph>>;

/// One unit of crawl output.
#[derive(Debug, Clone)]
pub enum Observation {
    Users(Vec<ObservedUser>),
    Edges(Adjacency),
    Following(FollowingPage),
}

#[derive(Debug, thiserror::Error)]
#[error("observation writer is closed")]
pub struct WriterClosed;

/// Outcome of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// The observation changed the graph (malformed pages are dropped).
    pub applied: bool,
    /// A snapshot including the observation was written to the store.
    pub persisted: bool,
}

struct Submission {
    observation: Observation,
    ack: oneshot::Sender<Ack>,
}

/// Cloneable handle to the writer task.
#[derive(Clone)]
pub struct ObservationWriter {
    tx: mpsc::UnboundedSender<Submission>,
}

impl ObservationWriter {
    /// Spawn the writer task on the current tokio runtime. When `snapshots` is
    /// set, the graph is saved after every applied observation; save failures
    /// are logged and reported through [`Ack::persisted`].
    pub fn spawn(graph: SharedGraph, snapshots: Option<Arc<dyn SnapshotStore>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Submission>();

        tokio::spawn(async move {
            while let Some(Submission { observation, ack }) = rx.recv().await {
                let (applied, snapshot) = {
                    let mut guard = graph.write().await;
                    let applied = apply(&mut guard, observation);
                    let snapshot = match (&snapshots, applied) {
                        (Some(_), true) => Some(guard.snapshot()),
                        _ => None,
                    };
                    (applied, snapshot)
                };
                let mut persisted = false;
                if let (Some(store), Some(snapshot)) = (&snapshots, snapshot) {
                    let store = Arc::clone(store);
                    let saved =
                        tokio::task::spawn_blocking(move || store.save(&snapshot)).await;
                    match saved {
                        Ok(Ok(())) => persisted = true,
                        Ok(Err(e)) => tracing::warn!(error = %e, "snapshot save failed"),
                        Err(e) => tracing::warn!(error = %e, "snapshot task failed"),
                    }
                }
                let _ = ack.send(Ack { applied, persisted });
            }
            tracing::debug!("observation writer stopped");
        });

        Self { tx }
    }

    /// Queue an observation and wait until it is applied and, if a store is
    /// configured, saved.
    pub async fn submit(&self, observation: Observation) -> Result<Ack, WriterClosed> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Submission { observation, ack })
            .map_err(|_| WriterClosed)?;
        done.await.map_err(|_| WriterClosed)
    }

    pub async fn observe_following(&self, page: FollowingPage) -> Result<Ack, WriterClosed> {
        self.submit(Observation::Following(page)).await
    }

    pub async fn observe_users(&self, records: Vec<ObservedUser>) -> Result<Ack, WriterClosed> {
        self.submit(Observation::Users(records)).await
    }

    pub async fn observe_edges(&self, batch: Adjacency) -> Result<Ack, WriterClosed> {
        self.submit(Observation::Edges(batch)).await
    }
}

fn apply(graph: &mut SocialGraph, observation: Observation) -> bool {
    match observation {
        Observation::Users(records) => graph.observe_users(records) > 0,
        Observation::Edges(batch) => {
            let keys = batch.len();
            graph.observe_edges(batch);
            keys > 0
        }
        Observation::Following(page) => graph.observe_following(page),
    }
}
