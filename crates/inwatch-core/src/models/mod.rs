//! Data models shared across the watcher.

pub mod config;
pub mod invoice;
pub mod remote;
