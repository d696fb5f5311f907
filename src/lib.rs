//! Feed mirroring library behind the `rss_mirror` binary.
//!
//! - [`feed`]: RSS/Atom normalization, the core of the crate
//! - [`pipeline`]: the sequential per-source run loop
//! - [`fetch`] and [`publish`]: the two I/O seams (bytes in, named content out)
//! - [`outputs`]: JSON, status report and raw mirror rendering
//! - [`sources`], [`config`], [`cli`]: run setup

pub mod cli;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod publish;
pub mod sources;
pub mod utils;
