//! Diff parsing for the review hook.
//!
//! Splits a unified diff into per-file chunks keyed on the `+++ b/` marker.

pub mod parser;
