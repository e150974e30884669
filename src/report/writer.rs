use std::path::Path;

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::ReportError;

use super::TestOutput;

/// Writes the report as pretty-printed JSON, replacing any existing file.
///
/// # Errors
///
/// Returns an error when the report cannot be serialized or written.
pub async fn write_report(path: &Path, output: &TestOutput) -> Result<(), ReportError> {
    let json =
        serde_json::to_vec_pretty(output).map_err(|err| ReportError::Serialize { source: err })?;
    let write_err = |err: std::io::Error| ReportError::Write {
        path: path.to_path_buf(),
        source: err,
    };

    let file = tokio::fs::File::create(path).await.map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&json).await.map_err(write_err)?;
    writer.flush().await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{TestResult, TestSettings};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn sample_output() -> TestOutput {
        TestOutput {
            result: TestResult {
                succeeded_requests: 0,
                failed_requests: 0,
                total_requests: 0,
                start_time: "2024-01-01T00:00:00+00:00".to_owned(),
                end_time: "2024-01-01T00:00:01+00:00".to_owned(),
                total_time: "1.00 seconds".to_owned(),
                requests_per_second: 0.0,
                data_transferred_mb: 0.0,
            },
            settings: TestSettings {
                amount: 1,
                worker: 1,
                host: "http://localhost".to_owned(),
                query: BTreeMap::new(),
                headers: BTreeMap::new(),
            },
            requests: Vec::new(),
        }
    }

    #[test]
    fn write_report_round_trips_through_disk() -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let path = dir.path().join("results.json");
        let output = sample_output();

        runtime
            .block_on(write_report(&path, &output))
            .map_err(|err| err.to_string())?;

        let content =
            std::fs::read_to_string(&path).map_err(|err| format!("read failed: {}", err))?;
        if !content.contains("\n  \"result\": {") {
            return Err(format!("Expected two-space indentation, got {}", content));
        }
        let parsed: TestOutput =
            serde_json::from_str(&content).map_err(|err| format!("parse failed: {}", err))?;
        if parsed != output {
            return Err("Report changed on disk".to_owned());
        }
        Ok(())
    }

    #[test]
    fn write_report_fails_for_missing_directory() -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let path = dir.path().join("missing").join("results.json");
        match runtime.block_on(write_report(&path, &sample_output())) {
            Err(ReportError::Write { .. }) => Ok(()),
            other => Err(format!("Expected write error, got {:?}", other)),
        }
    }
}
