#![allow(dead_code)]

use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use blog_admin_lists::config::Resource;
use blog_admin_lists::store::{ListStore, SaveRequest, StoredList};

pub fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(o) => o,
        other => panic!("expected object, got {}", other),
    }
}

/// Replays queued responses and records every call.
#[derive(Clone, Default)]
pub struct RecordingStore {
    fetch_responses: Arc<Mutex<VecDeque<Result<Option<StoredList>>>>>,
    replace_responses: Arc<Mutex<VecDeque<Result<StoredList>>>>,
    fetch_calls: Arc<Mutex<Vec<(String, String)>>>,
    replace_calls: Arc<Mutex<Vec<(String, SaveRequest)>>>,
}

impl RecordingStore {
    pub async fn push_fetch(&self, response: Result<Option<StoredList>>) {
        self.fetch_responses.lock().await.push_back(response);
    }

    pub async fn push_replace(&self, response: Result<StoredList>) {
        self.replace_responses.lock().await.push_back(response);
    }

    pub async fn fetch_calls(&self) -> Vec<(String, String)> {
        self.fetch_calls.lock().await.clone()
    }

    pub async fn replace_calls(&self) -> Vec<(String, SaveRequest)> {
        self.replace_calls.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ListStore for RecordingStore {
    async fn fetch(&self, resource: &Resource, container_key: &str) -> Result<Option<StoredList>> {
        self.fetch_calls
            .lock()
            .await
            .push((resource.path.clone(), container_key.to_string()));
        let mut guard = self.fetch_responses.lock().await;
        guard.pop_front().unwrap_or(Ok(None))
    }

    async fn replace(&self, resource: &Resource, request: &SaveRequest) -> Result<StoredList> {
        self.replace_calls
            .lock()
            .await
            .push((resource.path.clone(), request.clone()));
        let mut guard = self.replace_responses.lock().await;
        guard
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no replace response queued")))
    }
}

/// A stable backend: stores whatever is saved and assigns object-id shaped
/// identifiers to items that arrive without one.
#[derive(Clone, Default)]
pub struct MemoryStore {
    lists: Arc<Mutex<HashMap<(String, String), StoredList>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryStore {
    fn allocate(&self) -> String {
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub async fn stored(&self, resource: &str, key: &str) -> Option<StoredList> {
        self.lists
            .lock()
            .await
            .get(&(resource.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait::async_trait]
impl ListStore for MemoryStore {
    async fn fetch(&self, resource: &Resource, container_key: &str) -> Result<Option<StoredList>> {
        Ok(self.stored(&resource.path, container_key).await)
    }

    async fn replace(&self, resource: &Resource, request: &SaveRequest) -> Result<StoredList> {
        let mut sequence = Vec::with_capacity(request.sequence.len());
        for value in &request.sequence {
            let mut item = obj(value.clone());
            if !item.contains_key(&resource.id_field) {
                item.insert(resource.id_field.clone(), Value::String(self.allocate()));
            }
            sequence.push(item);
        }
        let record_id = request.record_id.clone().unwrap_or_else(|| self.allocate());
        let stored = StoredList {
            record_id: Some(record_id),
            sequence,
        };
        self.lists.lock().await.insert(
            (resource.path.clone(), request.container_key.clone()),
            stored.clone(),
        );
        Ok(stored)
    }
}
