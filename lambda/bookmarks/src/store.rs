use crate::bookmark::{Bookmark, BookmarkKey, ExamId, CREATED_AT, PARTITION_KEY, SORT_KEY};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::{
    delete_item::builders::DeleteItemFluentBuilder, put_item::builders::PutItemFluentBuilder,
    query::builders::QueryFluentBuilder,
};
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
pub(crate) mod memory;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    /// Displays the whole cause chain; the SDK's own `Display` stops at
    /// "unhandled error" for dispatch and timeout failures.
    #[error("dynamodb call failed: {}", DisplayErrorContext(.0))]
    Dynamo(#[from] aws_sdk_dynamodb::Error),
    #[error("store call did not finish within the invocation deadline ({0:?})")]
    DeadlineExceeded(Duration),
}

/// Bookmark persistence. Every method is a single logical store operation.
#[async_trait]
pub(crate) trait BookmarkStore: Send + Sync {
    /// Sort keys of the user's rows in store order, restricted to one exam when given.
    async fn list_keys(
        &self,
        user_id: &str,
        exam_id: Option<&ExamId>,
    ) -> Result<Vec<String>, StoreError>;

    /// Unconditional upsert.
    async fn put(&self, bookmark: &Bookmark) -> Result<(), StoreError>;

    /// Removing a missing row is not an error.
    async fn delete(&self, user_id: &str, key: &BookmarkKey) -> Result<(), StoreError>;
}

pub(crate) struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    pub(crate) fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(user_id: &str, key: &BookmarkKey) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert(
            PARTITION_KEY.to_string(),
            AttributeValue::S(user_id.to_string()),
        );
        item.insert(SORT_KEY.to_string(), AttributeValue::S(key.sort_key()));
        item
    }

    fn query_request(&self, user_id: &str, exam_id: Option<&ExamId>) -> QueryFluentBuilder {
        let request = self
            .client
            .query()
            .table_name(&self.table_name)
            .expression_attribute_names("#pk", PARTITION_KEY)
            .expression_attribute_names("#sk", SORT_KEY)
            .expression_attribute_values(":pk", AttributeValue::S(user_id.to_string()))
            .projection_expression("#sk");

        match exam_id {
            Some(exam_id) => request
                .expression_attribute_values(":prefix", AttributeValue::S(exam_id.key_prefix()))
                .key_condition_expression("#pk = :pk AND begins_with(#sk, :prefix)"),
            None => request.key_condition_expression("#pk = :pk"),
        }
    }

    fn put_request(&self, bookmark: &Bookmark) -> PutItemFluentBuilder {
        let mut item = Self::key(&bookmark.user_id, &bookmark.key);
        item.insert(
            CREATED_AT.to_string(),
            AttributeValue::S(bookmark.created_at_rfc3339()),
        );

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
    }

    fn delete_request(&self, user_id: &str, key: &BookmarkKey) -> DeleteItemFluentBuilder {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(user_id, key)))
    }
}

#[async_trait]
impl BookmarkStore for DynamoStore {
    async fn list_keys(
        &self,
        user_id: &str,
        exam_id: Option<&ExamId>,
    ) -> Result<Vec<String>, StoreError> {
        let mut items = self
            .query_request(user_id, exam_id)
            .into_paginator()
            .items()
            .send();

        let mut keys = Vec::new();
        while let Some(item) = items.next().await {
            let item = item.map_err(aws_sdk_dynamodb::Error::from)?;
            if let Some(sort_key) = item.get(SORT_KEY).and_then(|v| v.as_s().ok()) {
                keys.push(sort_key.clone());
            }
        }
        Ok(keys)
    }

    async fn put(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        self.put_request(bookmark)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(())
    }

    async fn delete(&self, user_id: &str, key: &BookmarkKey) -> Result<(), StoreError> {
        self.delete_request(user_id, key)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(())
    }
}

/// Bounds a store call by the time left in the invocation, if known.
pub(crate) async fn within_deadline<T, F>(remaining: Option<Duration>, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match remaining {
        Some(remaining) => tokio::time::timeout(remaining, call)
            .await
            .map_err(|_| StoreError::DeadlineExceeded(remaining))?,
        None => call.await,
    }
}
