//! Crawl loop: ask for the next target, fetch it, apply the pages, repeat
//! until the anchors are joined by a handshake path.

use crate::next_target::CrawlScheduler;
use crate::writer::{ObservationWriter, SharedGraph, WriterClosed};
use handshake_types::{CrawlFeed, CrawlFeedError};
use rand::rngs::StdRng;
use rand::Rng;
use uuid::Uuid;

const DEFAULT_MAX_STEPS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("crawl feed: {0}")]
    Feed(#[from] CrawlFeedError),
    #[error(transparent)]
    Writer(#[from] WriterClosed),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    PathFound,
    /// The scheduler has no target left.
    Exhausted,
    StepLimit,
    /// The feed returned nothing usable for this username.
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub session_id: String,
    pub reason: StopReason,
    /// Number of usernames fetched.
    pub steps: usize,
    pub path: Vec<String>,
    pub description: String,
}

/// Drives one crawl between two anchors. Reads go through the shared graph;
/// all writes go through the `ObservationWriter`.
pub struct CrawlSession<F, R = StdRng> {
    id: Uuid,
    graph: SharedGraph,
    writer: ObservationWriter,
    feed: F,
    scheduler: CrawlScheduler<R>,
    max_steps: usize,
}

impl<F: CrawlFeed> CrawlSession<F> {
    pub fn new(graph: SharedGraph, writer: ObservationWriter, feed: F) -> Self {
        Self::with_scheduler(graph, writer, feed, CrawlScheduler::new())
    }
}

impl<F: CrawlFeed, R: Rng + Send> CrawlSession<F, R> {
    pub fn with_scheduler(
        graph: SharedGraph,
        writer: ObservationWriter,
        feed: F,
        scheduler: CrawlScheduler<R>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            graph,
            writer,
            feed,
            scheduler,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub async fn run(&mut self, from: &str, to: &str) -> Result<CrawlReport, CrawlError> {
        let session_id = self.id.to_string();
        let mut steps = 0;
        loop {
            let target = {
                let graph = self.graph.read().await;
                let ids = graph.handshake_ids(from, to);
                if !ids.is_empty() {
                    let report = CrawlReport {
                        session_id,
                        reason: StopReason::PathFound,
                        steps,
                        path: graph.usernames(&ids),
                        description: graph.describe_path(&ids),
                    };
                    tracing::info!(session = %report.session_id, steps, path = %report.description, "handshake path found");
                    return Ok(report);
                }
                if steps >= self.max_steps {
                    return Ok(self.stopped(session_id, StopReason::StepLimit, steps));
                }
                self.scheduler.next_target(&graph, from, to)
            };
            let Some(target) = target else {
                return Ok(self.stopped(session_id, StopReason::Exhausted, steps));
            };

            steps += 1;
            tracing::info!(session = %session_id, step = steps, target = %target, "fetching");
            let pages = self.feed.fetch_following(&target).await?;
            let mut applied = false;
            for page in pages {
                applied |= self.writer.observe_following(page).await?.applied;
            }
            if !applied {
                return Ok(self.stopped(session_id, StopReason::Unavailable(target), steps));
            }
        }
    }

    fn stopped(&self, session_id: String, reason: StopReason, steps: usize) -> CrawlReport {
        tracing::info!(session = %session_id, steps, reason = ?reason, "crawl stopped without a path");
        CrawlReport {
            session_id,
            reason,
            steps,
            path: Vec::new(),
            description: String::new(),
        }
    }
}
