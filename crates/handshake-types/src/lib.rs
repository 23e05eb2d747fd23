//! Core types and traits for the social handshake crawler.
//!
//! Records and batches mirror what a crawl feed observes: user profiles plus
//! each crawled user's complete following list.

mod dto;
mod model;
mod traits;

pub use dto::*;
pub use model::*;
pub use traits::*;
