use crate::bookmark::{group_by_exam, Bookmark, BookmarkKey, ExamId, KeyError};
use crate::error::BookmarkError;
use crate::identity;
use crate::response::{empty_response, json_response};
use crate::router::{route_key, Route, RouteTable};
use crate::store::{within_deadline, BookmarkStore};
use chrono::Utc;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, warn};

/// Reserved at the end of the invocation for the 500 response and its log line.
const REPLY_MARGIN: Duration = Duration::from_millis(300);

/// Largest integer an IEEE double represents exactly.
const MAX_EXACT_FLOAT_INDEX: f64 = 9_007_199_254_740_992.0;

#[derive(Deserialize)]
struct CreateBookmarkRequest {
    #[serde(rename = "examId")]
    exam_id: String,
    #[serde(rename = "questionId")]
    question_id: serde_json::Number,
}

impl CreateBookmarkRequest {
    fn into_key(self) -> Result<BookmarkKey, KeyError> {
        let exam_id = ExamId::parse(&self.exam_id)?;
        let question_index = self
            .question_id
            .as_u64()
            .or_else(|| {
                self.question_id
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= MAX_EXACT_FLOAT_INDEX)
                    .map(|f| f as u64)
            })
            .ok_or(KeyError::InvalidQuestionIndex)?;
        Ok(BookmarkKey::new(exam_id, question_index))
    }
}

#[derive(Debug, Serialize)]
struct ListBookmarksResponse {
    bookmarks: BTreeMap<String, Vec<u64>>,
}

enum Outcome {
    Listed(ListBookmarksResponse),
    Created,
    Deleted,
}

impl Outcome {
    fn into_response(self) -> Result<Response<Body>, Error> {
        match self {
            Self::Listed(body) => json_response(StatusCode::OK, &body),
            Self::Created => empty_response(StatusCode::CREATED),
            Self::Deleted => empty_response(StatusCode::OK),
        }
    }
}

pub(crate) async fn function_handler(
    store: &dyn BookmarkStore,
    routes: &RouteTable,
    event: Request,
) -> Result<Response<Body>, Error> {
    let route_key = route_key(&event);

    let outcome = match routes.resolve(&route_key) {
        Some(route) => {
            debug!(route_key = %route_key, ?route, "dispatching request");
            dispatch(store, route, &event).await
        }
        None => Err(BookmarkError::RouteNotFound(route_key)),
    };

    match outcome {
        Ok(outcome) => outcome.into_response(),
        Err(err) => {
            match &err {
                // logged with the user id where the store call failed
                BookmarkError::Store { .. } => {}
                BookmarkError::RouteNotFound(key) => debug!(route_key = %key, "no matching route"),
                _ => warn!(error = %err, "request rejected"),
            }
            err.into_response()
        }
    }
}

async fn dispatch(
    store: &dyn BookmarkStore,
    route: Route,
    event: &Request,
) -> Result<Outcome, BookmarkError> {
    let user_id = identity::user_id(event).ok_or(BookmarkError::Unauthenticated)?;
    let remaining = remaining_time(event);

    match route {
        Route::List => list_bookmarks(store, user_id, event, remaining).await,
        Route::Create => create_bookmark(store, user_id, event, remaining).await,
        Route::Delete => delete_bookmark(store, user_id, event, remaining).await,
    }
}

async fn list_bookmarks(
    store: &dyn BookmarkStore,
    user_id: &str,
    event: &Request,
    remaining: Option<Duration>,
) -> Result<Outcome, BookmarkError> {
    let exam_id = event
        .query_string_parameters_ref()
        .and_then(|params| params.first("examId"))
        .filter(|exam_id| !exam_id.is_empty())
        .map(ExamId::parse)
        .transpose()?;

    let keys = within_deadline(remaining, store.list_keys(user_id, exam_id.as_ref()))
        .await
        .map_err(|source| {
            error!(user_id, error = %source, "failed to get bookmarks");
            BookmarkError::store("Error getting bookmarks", source)
        })?;

    Ok(Outcome::Listed(ListBookmarksResponse {
        bookmarks: group_by_exam(keys),
    }))
}

async fn create_bookmark(
    store: &dyn BookmarkStore,
    user_id: &str,
    event: &Request,
    remaining: Option<Duration>,
) -> Result<Outcome, BookmarkError> {
    let request: CreateBookmarkRequest =
        serde_json::from_slice(event.body().as_ref()).map_err(BookmarkError::MalformedBody)?;
    let bookmark = Bookmark::new(user_id, request.into_key()?, Utc::now());

    within_deadline(remaining, store.put(&bookmark))
        .await
        .map_err(|source| {
            error!(user_id, error = %source, "failed to create bookmark");
            BookmarkError::store("Error creating bookmark", source)
        })?;

    Ok(Outcome::Created)
}

async fn delete_bookmark(
    store: &dyn BookmarkStore,
    user_id: &str,
    event: &Request,
    remaining: Option<Duration>,
) -> Result<Outcome, BookmarkError> {
    let params = event.path_parameters_ref();
    let path_param = |name: &'static str| {
        params
            .and_then(|params| params.first(name))
            .ok_or_else(|| BookmarkError::InvalidInput(format!("Missing {name} path parameter")))
    };
    let key = BookmarkKey::parse(path_param("examId")?, path_param("questionId")?)?;

    within_deadline(remaining, store.delete(user_id, &key))
        .await
        .map_err(|source| {
            error!(user_id, error = %source, "failed to delete bookmark");
            BookmarkError::store("Error deleting bookmark", source)
        })?;

    Ok(Outcome::Deleted)
}

/// Time a store call may take and still leave room to reply before the
/// runtime's invocation deadline, when the runtime set one.
fn remaining_time(event: &Request) -> Option<Duration> {
    let context = event.lambda_context_ref()?;
    store_budget(context.deadline, SystemTime::now())
}

fn store_budget(deadline_ms: u64, now: SystemTime) -> Option<Duration> {
    if deadline_ms == 0 {
        return None;
    }
    let deadline = UNIX_EPOCH + Duration::from_millis(deadline_ms);
    let remaining = deadline.duration_since(now).unwrap_or(Duration::ZERO);
    Some(remaining.saturating_sub(REPLY_MARGIN))
}
