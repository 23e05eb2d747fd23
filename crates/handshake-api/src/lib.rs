//! HTTP host for the handshake crawler.

pub mod config;
pub mod server;
