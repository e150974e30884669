use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{LoadArgs, PositiveUsize, parse_header};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// Values given explicitly on the command line always win.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(args: &mut LoadArgs, matches: &ArgMatches, config: &ConfigFile) -> AppResult<()> {
    if !is_cli(matches, "endpoint")
        && let Some(endpoint) = config.endpoint.clone()
    {
        args.endpoint = Some(endpoint);
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method.clone()
    {
        args.method = method;
    }

    if !is_cli(matches, "amount")
        && let Some(amount) = config.amount
    {
        args.amount = ensure_positive_usize(amount, "amount")?;
    }

    if !is_cli(matches, "worker")
        && let Some(worker) = config.worker
    {
        args.worker = ensure_positive_usize(worker, "worker")?;
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(parse_header(header).map_err(|err| {
                AppError::config(ConfigError::InvalidHeader { source: err })
            })?);
        }
        args.headers = parsed;
    }

    if !is_cli(matches, "query")
        && let Some(query) = config.query.as_ref()
    {
        args.query = query
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
    }

    if !is_cli(matches, "output")
        && let Some(output) = config.output.clone()
    {
        args.output = output;
    }

    if !is_cli(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        let timeout = timeout.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidField {
                field: "timeout",
                source: err,
            })
        })?;
        args.request_timeout = Some(timeout);
    }

    if !is_cli(matches, "no_progress")
        && let Some(no_progress) = config.no_progress
    {
        args.no_progress = no_progress;
    }

    if !is_cli(matches, "no_summary")
        && let Some(no_summary) = config.no_summary
    {
        args.no_summary = no_summary;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_usize(value: usize, field: &'static str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value)
        .map_err(|err| AppError::config(ConfigError::InvalidField { field, source: err }))
}
