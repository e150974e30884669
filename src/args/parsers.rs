use std::time::Duration;

use super::types::{HttpMethod, PositiveUsize};
use crate::error::{AppError, AppResult, ValidationError};

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    let Some((key, value)) = s.split_once(':') else {
        return Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        });
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ValidationError::HeaderNameEmpty {
            value: s.to_owned(),
        });
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}

pub(crate) fn parse_query(s: &str) -> Result<(String, String), ValidationError> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(ValidationError::InvalidQueryFormat {
            value: s.to_owned(),
        });
    };
    if key.is_empty() {
        return Err(ValidationError::QueryNameEmpty {
            value: s.to_owned(),
        });
    }
    Ok((key.to_owned(), value.to_owned()))
}

pub(super) fn parse_method(s: &str) -> Result<HttpMethod, ValidationError> {
    s.parse()
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(crate) fn parse_bool_env(s: &str) -> AppResult<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(AppError::validation(ValidationError::InvalidBoolean {
            value: s.to_owned(),
        })),
    }
}

/// Parses `<number>[ms|s|m|h]`, defaulting to seconds.
pub(crate) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let digits_len = value.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 =
        num_part
            .parse()
            .map_err(|err| ValidationError::InvalidDurationNumber {
                value: value.to_owned(),
                source: err,
            })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => {
            let secs = number
                .checked_mul(60)
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        "h" => {
            let secs = number
                .checked_mul(60)
                .and_then(|seconds| seconds.checked_mul(60))
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };

    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }

    Ok(duration)
}
