//! Crawl scheduling: which user to fetch next, how observations are applied,
//! and the loop that drives a crawl until a handshake path is found.

mod next_target;
mod session;
mod writer;

pub use next_target::CrawlScheduler;
pub use session::{CrawlError, CrawlReport, CrawlSession, StopReason};
pub use writer::{Ack, Observation, ObservationWriter, SharedGraph, WriterClosed};
