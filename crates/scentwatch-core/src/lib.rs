//! Core types and pipeline steps for the scentwatch correlation job.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! relational store and the watermark property bag sit behind
//! [`store::PipelineStore`]; the external data sources sit behind
//! [`source::Source`]. Everything else is pure computation over those seams.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod correlate;
pub mod error;
pub mod loader;
pub mod record;
pub mod report;
pub mod source;
pub mod stats;
pub mod store;
pub mod transform;
pub mod watermark;

pub use error::{Error, Result};
