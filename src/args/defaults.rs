pub(crate) const DEFAULT_USER_AGENT: &str = concat!("volley/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_OUTPUT_PATH: &str = "results.json";
