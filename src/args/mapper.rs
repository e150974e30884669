use std::collections::BTreeMap;

use url::Url;

use crate::error::{AppError, AppResult, ValidationError};
use crate::run::RunConfig;

use super::LoadArgs;

/// Resolves parsed CLI arguments into the immutable run configuration.
///
/// Repeated header or query keys keep the last value given.
///
/// # Errors
///
/// Returns an error when the endpoint is missing, is not an absolute URL, or
/// uses a scheme other than http/https.
pub fn to_run_config(args: &LoadArgs) -> AppResult<RunConfig> {
    let endpoint = match args.endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => endpoint,
        _ => return Err(AppError::validation(ValidationError::MissingEndpoint)),
    };
    let parsed = Url::parse(endpoint).map_err(|err| {
        AppError::validation(ValidationError::InvalidEndpoint {
            url: endpoint.to_owned(),
            source: err,
        })
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::validation(ValidationError::UnsupportedScheme {
                scheme: other.to_owned(),
            }));
        }
    }

    Ok(RunConfig {
        amount: args.amount,
        worker: args.worker,
        method: args.method.clone(),
        endpoint: endpoint.to_owned(),
        headers: collect_pairs(&args.headers),
        query: collect_pairs(&args.query),
        request_timeout: args.request_timeout,
    })
}

fn collect_pairs(pairs: &[(String, String)]) -> BTreeMap<String, String> {
    pairs.iter().cloned().collect()
}
