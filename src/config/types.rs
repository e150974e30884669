use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::args::{HttpMethod, parse_duration_arg};
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub endpoint: Option<String>,
    pub method: Option<HttpMethod>,
    pub amount: Option<usize>,
    pub worker: Option<usize>,
    pub headers: Option<Vec<String>>,
    pub query: Option<BTreeMap<String, String>>,
    pub output: Option<String>,
    pub timeout: Option<DurationValue>,
    pub no_progress: Option<bool>,
    pub no_summary: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}
