//! External checker invocation for dev-checker.
//!
//! Every checker is an opaque external process. This crate spawns it with
//! the right output format flags, parses what it prints into
//! [`NativeDiagnostic`](checker_diagnostics::NativeDiagnostic) records and
//! maps exit statuses to [`CheckerError`]s.
//!
//! # Example
//!
//! ```ignore
//! use camino::Utf8Path;
//! use checker_runner::{CheckRunner, CheckerKind, ProcessChecker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let checker = ProcessChecker::with_default_command(CheckerKind::LintRule).unwrap();
//!     let records = checker.check_project(Utf8Path::new("/path/to/project")).await.unwrap();
//!     println!("{} lint results", records.len());
//! }
//! ```

mod command;
mod parser;
mod runner;

pub use command::LintCommand;
pub use parser::parse_tsc_output;
pub use runner::{CheckRunner, CheckerError, CheckerKind, ProcessChecker};
