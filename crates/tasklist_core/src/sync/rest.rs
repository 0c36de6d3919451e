//! Pull adapter over a JSON REST collection (json-server layout).
//!
//! # Responsibility
//! - Map `TaskStore`/`PullSource` calls onto `GET|POST|PUT|DELETE /{collection}`.
//! - Translate HTTP outcomes into `StoreError` variants.
//!
//! # Invariants
//! - `404` on an item URL maps to not-found, never to a transport error.
//! - A malformed element in a list response is skipped, not fatal.
//! - Request and response bodies are never logged.

use crate::model::task::{Task, TaskDraft, TaskId};
use crate::sync::store::{PullSource, StoreError, StoreResult, TaskStore};
use log::{debug, error, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default collection path segment.
pub const DEFAULT_COLLECTION: &str = "toDos";

/// REST-backed task store.
#[derive(Debug, Clone)]
pub struct RestTaskStore {
    collection_url: Url,
    client: Client,
}

impl RestTaskStore {
    /// Creates a store for `{base_url}/{collection}` with the default timeout.
    pub fn new(base_url: &str, collection: &str) -> StoreResult<Self> {
        Self::with_timeout(base_url, collection, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, collection: &str, timeout: Duration) -> StoreResult<Self> {
        let collection_url = build_collection_url(base_url, collection)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self {
            collection_url,
            client,
        })
    }

    pub fn collection_url(&self) -> &str {
        self.collection_url.as_str()
    }

    fn item_url(&self, id: &TaskId) -> StoreResult<Url> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|()| cannot_be_base(&self.collection_url))?
            .push(id.as_str());
        Ok(url)
    }

    fn send(&self, method: &'static str, request: RequestBuilder) -> StoreResult<Response> {
        let started_at = Instant::now();
        match request.send() {
            Ok(response) => {
                debug!(
                    "event=rest_request module=sync status=ok method={method} http_status={} duration_ms={}",
                    response.status().as_u16(),
                    started_at.elapsed().as_millis()
                );
                Ok(response)
            }
            Err(err) => {
                error!(
                    "event=rest_request module=sync status=error method={method} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(StoreError::Transport(err.to_string()))
            }
        }
    }
}

impl TaskStore for RestTaskStore {
    fn backend_id(&self) -> &'static str {
        "rest"
    }

    fn fetch(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        let response = self.send("GET", self.client.get(self.item_url(id)?))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let mut task: Task = decode_body(expect_success("GET", response)?)?;
        task.id = id.clone();
        Ok(Some(task))
    }

    fn insert(&self, draft: &TaskDraft) -> StoreResult<TaskId> {
        let request = self.client.post(self.collection_url.clone()).json(draft);
        let created: Task = decode_body(expect_success("POST", self.send("POST", request)?)?)?;
        if created.id.is_blank() {
            return Err(StoreError::InvalidData(
                "store created a task without an id".to_string(),
            ));
        }
        Ok(created.id)
    }

    fn overwrite(&self, id: &TaskId, task: &Task) -> StoreResult<()> {
        let mut body = task.clone();
        body.id = id.clone();
        let response = self.send("PUT", self.client.put(self.item_url(id)?).json(&body))?;
        expect_found("PUT", id, response).map(drop)
    }

    fn remove(&self, id: &TaskId) -> StoreResult<()> {
        let response = self.send("DELETE", self.client.delete(self.item_url(id)?))?;
        expect_found("DELETE", id, response).map(drop)
    }
}

impl PullSource for RestTaskStore {
    fn fetch_all(&self) -> StoreResult<Vec<Task>> {
        let request = self.client.get(self.collection_url.clone());
        let records: Vec<serde_json::Value> =
            decode_body(expect_success("GET", self.send("GET", request)?)?)?;

        let received = records.len();
        let tasks: Vec<Task> = records
            .into_iter()
            .filter_map(|record| serde_json::from_value(record).ok())
            .collect();
        if tasks.len() < received {
            warn!(
                "event=rest_decode module=sync status=partial received={} skipped={}",
                received,
                received - tasks.len()
            );
        }
        Ok(tasks)
    }
}

fn build_collection_url(base_url: &str, collection: &str) -> StoreResult<Url> {
    let mut url = Url::parse(base_url.trim()).map_err(|err| {
        StoreError::InvalidData(format!("invalid base url `{base_url}`: {err}"))
    })?;
    url.path_segments_mut()
        .map_err(|()| StoreError::InvalidData(format!("base url `{base_url}` cannot hold paths")))?
        .pop_if_empty()
        .push(collection);
    Ok(url)
}

fn cannot_be_base(url: &Url) -> StoreError {
    StoreError::InvalidData(format!("collection url `{url}` cannot hold paths"))
}

fn expect_success(method: &'static str, response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(StoreError::Status {
        method,
        url: response.url().to_string(),
        status: status.as_u16(),
    })
}

fn expect_found(method: &'static str, id: &TaskId, response: Response) -> StoreResult<Response> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(id.clone()));
    }
    expect_success(method, response)
}

fn decode_body<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    let body = response
        .text()
        .map_err(|err| StoreError::Transport(err.to_string()))?;
    Ok(serde_json::from_str(&body)?)
}
