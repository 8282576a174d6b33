//! File watching for dev-checker.
//!
//! This crate provides:
//! - [`IgnoreMatcher`]: decides which paths under the project root a checker
//!   cares about
//! - [`FileWatcher`]: bridges `notify` events into a tokio channel as
//!   [`WatchEvent`]s
//! - [`WatchController`]: runs the initial full check, then keeps a checker's
//!   [`DiagnosticStore`](checker_diagnostics::DiagnosticStore) current one
//!   file event at a time
//!
//! # Architecture
//!
//! ```text
//! notify thread ── blocking_send ──► mpsc::Receiver<WatchEvent>
//!                                          │
//!                                          ▼
//!                  WatchController: check_file / update_for_file / report
//! ```

mod controller;
mod error;
mod events;
mod ignore;
mod watcher;

pub use controller::{ControllerState, WatchController};
pub use error::WatchError;
pub use events::WatchEvent;
pub use ignore::IgnoreMatcher;
pub use watcher::FileWatcher;
