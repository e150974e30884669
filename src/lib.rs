//! Core library for the `volley` CLI.
//!
//! `volley` fires a fixed number of HTTP requests at one endpoint while
//! keeping at most a configured number of them in flight. Every attempt is
//! recorded as an [`metrics::Outcome`] and the run is summarized into a JSON
//! report. The binary is a thin layer over [`run::execute_run`]; the
//! [`http::Transport`] seam lets callers drive the engine without a network.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod progress;
pub mod report;
pub mod run;
pub mod shutdown;
