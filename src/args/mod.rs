//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
mod mapper;
mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::LoadArgs;
pub use mapper::to_run_config;
pub use types::{HttpMethod, PositiveUsize};

pub(crate) use defaults::DEFAULT_USER_AGENT;
pub(crate) use parsers::{parse_duration_arg, parse_header};
