use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use super::ProfileSink;
use crate::error::{ProfilerError, Result};
use crate::log_data_op;
use crate::logging::LogConfig;
use crate::profiling::DatasetProfile;

/// Writes each profile as pretty JSON to `<base>/<job_id>/<dataset>.json`.
///
/// Job ids and dataset names are used as single path components; anything
/// outside `[A-Za-z0-9._-]` is replaced with `_`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    base_dir: PathBuf,
    log_config: LogConfig,
}

impl JsonFileSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The file a profile is stored in.
    pub fn profile_path(&self, job_id: &str, dataset_name: &str) -> Result<PathBuf> {
        Ok(self
            .base_dir
            .join(path_component(job_id)?)
            .join(format!("{}.json", path_component(dataset_name)?)))
    }
}

fn path_component(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(ProfilerError::configuration(format!(
            "'{raw}' cannot be used as a path component"
        )));
    }
    Ok(cleaned)
}

#[async_trait]
impl ProfileSink for JsonFileSink {
    #[instrument(skip(self, profile), fields(dataset = %profile.dataset_name))]
    async fn write(&self, job_id: &str, profile: &DatasetProfile) -> Result<()> {
        let path = self.profile_path(job_id, &profile.dataset_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = profile.to_json_pretty()?;
        tokio::fs::write(&path, json.as_bytes()).await?;

        log_data_op!(
            self.log_config,
            job_id,
            dataset = %profile.dataset_name,
            path = %path.display(),
            bytes = json.len(),
            "Profile written"
        );
        Ok(())
    }

    async fn read(&self, job_id: &str, dataset_name: &str) -> Result<Option<DatasetProfile>> {
        let path = self.profile_path(job_id, dataset_name)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_path_sanitizes_components() {
        let sink = JsonFileSink::new("/data/profiles");
        assert_eq!(
            sink.profile_path("job-1", "sales/orders").unwrap(),
            PathBuf::from("/data/profiles/job-1/sales_orders.json")
        );
        assert!(sink.profile_path("..", "orders").is_err());
        assert!(sink.profile_path("job", "").is_err());
    }
}
