use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use super::ProfileSink;
use crate::error::Result;
use crate::profiling::DatasetProfile;

/// Keeps profiles in memory, keyed by job and dataset name.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    storage: Arc<RwLock<HashMap<(String, String), DatasetProfile>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored profiles.
    pub async fn size(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Every profile stored for a job, ordered by dataset name.
    pub async fn job_profiles(&self, job_id: &str) -> Vec<DatasetProfile> {
        let storage = self.storage.read().await;
        let mut profiles: Vec<DatasetProfile> = storage
            .iter()
            .filter(|((job, _), _)| job == job_id)
            .map(|(_, profile)| profile.clone())
            .collect();
        profiles.sort_by(|a, b| a.dataset_name.cmp(&b.dataset_name));
        profiles
    }
}

#[async_trait]
impl ProfileSink for InMemorySink {
    #[instrument(skip(self, profile), fields(dataset = %profile.dataset_name))]
    async fn write(&self, job_id: &str, profile: &DatasetProfile) -> Result<()> {
        let key = (job_id.to_string(), profile.dataset_name.clone());
        self.storage.write().await.insert(key, profile.clone());
        Ok(())
    }

    async fn read(&self, job_id: &str, dataset_name: &str) -> Result<Option<DatasetProfile>> {
        let key = (job_id.to_string(), dataset_name.to_string());
        Ok(self.storage.read().await.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn profile(name: &str) -> DatasetProfile {
        DatasetProfile {
            dataset_name: name.to_string(),
            columns: Vec::new(),
            dataset_statistics: None,
            dataset_quality: None,
            candidate_keys: None,
            referential_integrity: None,
            rule_status: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_write_replaces_per_dataset() {
        let sink = InMemorySink::new();
        sink.write("job-1", &profile("orders")).await.unwrap();
        sink.write("job-1", &profile("orders")).await.unwrap();
        sink.write("job-1", &profile("customers")).await.unwrap();
        sink.write("job-2", &profile("orders")).await.unwrap();

        assert_eq!(sink.size().await, 3);
        let names: Vec<String> = sink
            .job_profiles("job-1")
            .await
            .into_iter()
            .map(|p| p.dataset_name)
            .collect();
        assert_eq!(names, vec!["customers", "orders"]);
        assert!(sink.read("job-2", "orders").await.unwrap().is_some());
        assert!(sink.read("job-3", "orders").await.unwrap().is_none());
    }
}
