//! Bookmark key encoding.
//!
//! Each bookmark is one table row: partition key `user_id`, sort key
//! `exam_question_key` = `"{examId}#{questionIndex}"`, plus `created_at`.
//! Filtering by exam is a sort key prefix match on `"{examId}#"`, so the
//! separator is part of the prefix and `exam1` never matches `exam10#3`.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub(crate) const PARTITION_KEY: &str = "user_id";
pub(crate) const SORT_KEY: &str = "exam_question_key";
pub(crate) const CREATED_AT: &str = "created_at";

const SEPARATOR: char = '#';

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum KeyError {
    #[error("examId must not be empty")]
    EmptyExamId,
    #[error("examId must not contain '#'")]
    SeparatorInExamId,
    #[error("questionId must be a non-negative integer")]
    InvalidQuestionIndex,
}

/// Exam identifier that is safe to embed in a sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ExamId(String);

impl ExamId {
    pub(crate) fn parse(raw: &str) -> Result<Self, KeyError> {
        if raw.is_empty() {
            return Err(KeyError::EmptyExamId);
        }
        if raw.contains(SEPARATOR) {
            return Err(KeyError::SeparatorInExamId);
        }
        Ok(Self(raw.to_string()))
    }

    /// Sort key prefix selecting every question of this exam.
    pub(crate) fn key_prefix(&self) -> String {
        format!("{}{SEPARATOR}", self.0)
    }
}

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The sort key half of a bookmark's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BookmarkKey {
    pub exam_id: ExamId,
    pub question_index: u64,
}

impl BookmarkKey {
    pub(crate) fn new(exam_id: ExamId, question_index: u64) -> Self {
        Self {
            exam_id,
            question_index,
        }
    }

    /// Builds a key from path parameters, where the index arrives as text.
    ///
    /// Only the canonical decimal form is accepted, so `03` or `+3` never
    /// address the row stored as `#3`.
    pub(crate) fn parse(exam_id: &str, question_index: &str) -> Result<Self, KeyError> {
        let exam_id = ExamId::parse(exam_id)?;
        let parsed = question_index
            .parse::<u64>()
            .map_err(|_| KeyError::InvalidQuestionIndex)?;
        if parsed.to_string() != question_index {
            return Err(KeyError::InvalidQuestionIndex);
        }
        Ok(Self::new(exam_id, parsed))
    }

    pub(crate) fn sort_key(&self) -> String {
        format!("{}{SEPARATOR}{}", self.exam_id, self.question_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bookmark {
    pub user_id: String,
    pub key: BookmarkKey,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub(crate) fn new(user_id: &str, key: BookmarkKey, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            key,
            created_at,
        }
    }

    /// `2024-01-02T03:04:05Z`
    pub(crate) fn created_at_rfc3339(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Splits a stored sort key into exam id and question index.
///
/// Returns `None` for rows that do not follow the encoding, which callers skip.
pub(crate) fn decode_sort_key(sort_key: &str) -> Option<(&str, u64)> {
    let (exam_id, index) = sort_key.split_once(SEPARATOR)?;
    let index = index.parse::<u64>().ok()?;
    Some((exam_id, index))
}

/// Groups stored sort keys into `examId -> [questionIndex]`, keeping store order
/// within each exam.
pub(crate) fn group_by_exam<I, S>(sort_keys: I) -> BTreeMap<String, Vec<u64>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut grouped: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    for sort_key in sort_keys {
        let Some((exam_id, index)) = decode_sort_key(sort_key.as_ref()) else {
            continue;
        };
        grouped.entry(exam_id.to_string()).or_default().push(index);
    }
    grouped
}
