//! Data model and contracts for the context composition layer.
//!
//! This crate establishes the shared vocabulary between context
//! providers, the merger, and the model-calling engine: configuration
//! fragments, tool handles, call settings, and the cancellation
//! primitives that scope one tool invocation.
//!
//! Types in this crate don't define any composition behavior, instead
//! they are the constraints that providers and engines should adhere
//! to. The merging and argument-access logic lives in the
//! `ctxflow-core` crate.

#![deny(missing_docs)]

mod call;
mod config;
mod error;
mod fragment;
mod provider;
mod settings;
mod tool;

pub use call::*;
pub use config::*;
pub use error::*;
pub use fragment::*;
pub use provider::*;
pub use settings::*;
pub use tool::*;
