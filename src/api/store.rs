//! Caller-owned storage for processed uploads.
//!
//! The facility query endpoint needs the most recent upload. Instead of a
//! process-wide global, the surrounding service owns a `ReportStore` and
//! passes it to the handlers.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::domain::{Report, ValidatedDataset};

pub type UploadId = Uuid;

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub id: UploadId,
    pub report: Report,
    pub dataset: ValidatedDataset,
}

pub trait ReportStore {
    /// Keep a processed upload and return its id.
    fn insert(&mut self, report: Report, dataset: ValidatedDataset) -> UploadId;

    fn get(&self, id: &UploadId) -> Option<&StoredUpload>;

    /// The most recently inserted upload.
    fn latest(&self) -> Option<&StoredUpload>;
}

/// Bounded in-memory store; the oldest upload is evicted first.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    uploads: VecDeque<StoredUpload>,
    capacity: usize,
}

impl MemoryStore {
    pub const DEFAULT_CAPACITY: usize = 16;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uploads: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl ReportStore for MemoryStore {
    fn insert(&mut self, report: Report, dataset: ValidatedDataset) -> UploadId {
        let id = Uuid::new_v4();
        if self.uploads.len() == self.capacity {
            if let Some(evicted) = self.uploads.pop_front() {
                tracing::debug!(upload_id = %evicted.id, "evicted oldest upload");
            }
        }
        self.uploads.push_back(StoredUpload {
            id,
            report,
            dataset,
        });
        id
    }

    fn get(&self, id: &UploadId) -> Option<&StoredUpload> {
        self.uploads.iter().find(|u| &u.id == id)
    }

    fn latest(&self) -> Option<&StoredUpload> {
        self.uploads.back()
    }
}
