//! Context merging and structured argument access.
//!
//! This crate folds the fragments of an arbitrary set of context
//! providers into one effective configuration for the model-calling
//! engine, and gives tool implementations path-addressed access to
//! (possibly still streaming) call arguments.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod arguments;
mod merge;
mod provider_set;

pub use merge::{MergeError, MergeOptions, merge, merge_with};
pub use provider_set::ProviderSet;
