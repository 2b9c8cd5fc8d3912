//! Data model for redis-tracing.
//!
//! This crate defines the finished span record and the W3C Trace Context
//! identifiers used to link spans into traces.

pub mod span;
pub mod trace_context;

pub use span::*;
pub use trace_context::*;
