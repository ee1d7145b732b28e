//! Where finished profiles go.
//!
//! Profiles are stored per job and dataset. Job scheduling and the HTTP
//! surface that reads them back live elsewhere.

use async_trait::async_trait;

use crate::error::Result;
use crate::profiling::DatasetProfile;

mod json_file;
mod memory;

pub use json_file::JsonFileSink;
pub use memory::InMemorySink;

#[async_trait]
pub trait ProfileSink: Send + Sync {
    /// Stores a profile under `job_id`, replacing any earlier profile of the
    /// same dataset for that job.
    async fn write(&self, job_id: &str, profile: &DatasetProfile) -> Result<()>;

    /// Reads back a stored profile.
    async fn read(&self, job_id: &str, dataset_name: &str) -> Result<Option<DatasetProfile>>;
}
