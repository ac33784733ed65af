// src/watch/mod.rs

//! File watching and change coalescing.
//!
//! This module is responsible for:
//! - Opening `notify` watches over a directory (and the subdirectories that
//!   exist at construction time) or over a single file.
//! - Debouncing bursts of raw events per relative path.
//! - Handing each settled change to a [`SettledChangeHandler`].
//!
//! It does **not** know about pipelines or templates; see
//! [`crate::engine::session`] for the handler that re-plans builds.

pub mod coalescer;
pub mod debounce;
pub mod path_utils;
pub mod watcher;

pub use coalescer::{SettledChangeHandler, WatchCoalescer, WatchOptions};
pub use debounce::{DebounceState, Debouncer};
pub use watcher::RawEvent;
