use clap::Parser;
use std::time::Duration;

use super::defaults::DEFAULT_OUTPUT_PATH;
use super::parsers::{
    parse_bool_env, parse_duration_arg, parse_header, parse_method, parse_positive_usize,
    parse_query,
};
use super::types::{HttpMethod, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Fire a fixed number of HTTP requests at one endpoint with a bounded worker budget and write a JSON performance report.",
    next_help_heading = "Advanced Options"
)]
pub struct LoadArgs {
    /// API endpoint to test (absolute http/https URL)
    #[arg(long, short = 'u', alias = "url", help_heading = "Common Options")]
    pub endpoint: Option<String>,

    /// HTTP request method (any token, case-insensitive)
    #[arg(
        long,
        short = 'X',
        default_value = "GET",
        value_parser = parse_method,
        help_heading = "Common Options"
    )]
    pub method: HttpMethod,

    /// Number of requests to send
    #[arg(
        long,
        short = 'n',
        default_value = "1",
        value_parser = parse_positive_usize,
        help_heading = "Common Options"
    )]
    pub amount: PositiveUsize,

    /// Maximum number of requests in flight at once
    #[arg(
        long,
        short = 'w',
        default_value = "10",
        value_parser = parse_positive_usize,
        help_heading = "Common Options"
    )]
    pub worker: PositiveUsize,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header, help_heading = "Common Options")]
    pub headers: Vec<(String, String)>,

    /// Query parameters in 'key=value' format (repeatable)
    #[arg(long = "query", short = 'q', value_parser = parse_query, help_heading = "Common Options")]
    pub query: Vec<(String, String)>,

    /// Output JSON file
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT_PATH, help_heading = "Common Options")]
    pub output: String,

    /// Per-request timeout (e.g. 500ms, 10s, 1m)
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub request_timeout: Option<Duration>,

    /// Path to a TOML or JSON config file (defaults to volley.toml/volley.json if present)
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Do not render the progress line
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Do not print the console summary
    #[arg(long = "no-summary")]
    pub no_summary: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
