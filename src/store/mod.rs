//! Remote persistence for ordered lists.
//!
//! The editor only talks to [`ListStore`]; [`RestListStore`] is the HTTP
//! implementation against the admin API.
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use crate::config::Resource;
use crate::store::model::{Body, Envelope};

pub mod model;
pub mod rest;

pub use rest::RestListStore;

/// A container as persisted by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredList {
    /// Id of the container record itself, when the backend reports one.
    pub record_id: Option<String>,
    pub sequence: Vec<Map<String, Value>>,
}

/// A file to send as a multipart part named `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    pub name: String,
    pub path: PathBuf,
}

/// A wholesale replacement of one container's sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub container_key: String,
    /// Known record id: the request becomes a `PUT` to that record.
    pub record_id: Option<String>,
    pub sequence: Vec<Value>,
    pub uploads: Vec<UploadPart>,
}

impl SaveRequest {
    pub fn body(&self) -> Value {
        json!({
            "containerKey": self.container_key,
            "sequence": self.sequence,
        })
    }

    pub fn is_multipart(&self) -> bool {
        !self.uploads.is_empty()
    }
}

#[async_trait]
pub trait ListStore: Send + Sync {
    /// Fetch the stored sequence for `container_key`. `Ok(None)` means the
    /// backend has no record for it yet.
    async fn fetch(&self, resource: &Resource, container_key: &str) -> Result<Option<StoredList>>;

    /// Replace the stored sequence and return what the backend persisted.
    async fn replace(&self, resource: &Resource, request: &SaveRequest) -> Result<StoredList>;
}

/// Parse any of the response shapes the admin API uses for a container.
pub fn parse_stored_list(body: &str) -> Result<StoredList> {
    let envelope: Envelope =
        serde_json::from_str(body).context("unexpected list response shape")?;
    let body = match envelope {
        Envelope::Wrapped { data } | Envelope::Bare(data) => data,
    };
    Ok(match body {
        Body::Record { id, sequence } => StoredList {
            record_id: id,
            sequence,
        },
        Body::Items(sequence) => StoredList {
            record_id: None,
            sequence,
        },
    })
}
