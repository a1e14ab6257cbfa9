use super::{BookmarkStore, StoreError};
use crate::bookmark::{Bookmark, BookmarkKey, ExamId};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::error::InternalServerError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Table stand-in ordered by (partition key, sort key) like a DynamoDB table.
#[derive(Default)]
pub(crate) struct MemoryStore {
    rows: Mutex<BTreeMap<(String, String), String>>,
    calls: AtomicUsize,
    failing: bool,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Every call waits `latency` before touching the rows.
    pub(crate) fn slow(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub(crate) fn created_at(&self, user_id: &str, sort_key: &str) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .get(&(user_id.to_string(), sort_key.to_string()))
            .cloned()
    }

    /// Inserts a row bypassing key encoding, for malformed-data cases.
    pub(crate) fn insert_raw(&self, user_id: &str, sort_key: &str) {
        self.rows.lock().unwrap().insert(
            (user_id.to_string(), sort_key.to_string()),
            "2024-01-01T00:00:00Z".to_string(),
        );
    }

    async fn record_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing {
            let err = InternalServerError::builder()
                .message("table unavailable")
                .build();
            return Err(aws_sdk_dynamodb::Error::InternalServerError(err).into());
        }
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for MemoryStore {
    async fn list_keys(
        &self,
        user_id: &str,
        exam_id: Option<&ExamId>,
    ) -> Result<Vec<String>, StoreError> {
        self.record_call().await?;
        let prefix = exam_id.map(ExamId::key_prefix).unwrap_or_default();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(pk, sk)| pk == user_id && sk.starts_with(&prefix))
            .map(|(_, sk)| sk.clone())
            .collect())
    }

    async fn put(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        self.record_call().await?;
        self.rows.lock().unwrap().insert(
            (bookmark.user_id.clone(), bookmark.key.sort_key()),
            bookmark.created_at_rfc3339(),
        );
        Ok(())
    }

    async fn delete(&self, user_id: &str, key: &BookmarkKey) -> Result<(), StoreError> {
        self.record_call().await?;
        self.rows
            .lock()
            .unwrap()
            .remove(&(user_id.to_string(), key.sort_key()));
        Ok(())
    }
}
