//! Descriptors returned by the storage service

use serde::{Deserialize, Serialize};
use sitegate_storage::{BucketDescriptor, ObjectDescriptor};

/// Buckets of one site
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContents {
    pub site: String,
    pub buckets: Vec<BucketDescriptor>,
}

/// Objects of one bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketContents {
    pub site: String,
    pub bucket: String,
    pub objects: Vec<ObjectDescriptor>,
}

impl BucketContents {
    /// Sum of the listed object sizes
    pub fn total_size(&self) -> u64 {
        self.objects.iter().map(|o| o.size).sum()
    }
}

/// Outcome of a successful bucket creation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketCreation {
    /// The bucket was created by this call
    Created,
    /// The bucket already existed and is owned by the caller
    AlreadyOwned,
}
