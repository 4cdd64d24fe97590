//! Background pollers that infer worker progress from its output
//!
//! The worker never reports progress. Instead a poller counts the files
//! it has produced so far and compares that to the number the client
//! asked for.

pub mod poller;

pub use poller::{spawn_watch, OutputFilter, WatchConfig, WatchEvent, WatchHandle};
