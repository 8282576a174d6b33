//! Source positions and code frames for dev-checker.
//!
//! Checkers report positions in different shapes: byte offsets plus a length,
//! 0-based line/character pairs, or 1-based line/column pairs. This crate turns
//! all of them into a [`Location`] and renders the fixed-height snippet of
//! source text shown under each diagnostic.

mod frame;
mod line_index;
mod location;

pub use frame::{render, CodeFrame, LINES_ABOVE, LINES_BELOW};
pub use line_index::{ByteOffset, LineCol, LineIndex};
pub use location::Location;
