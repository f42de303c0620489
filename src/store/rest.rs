use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, Resource};
use crate::store::{parse_stored_list, ListStore, SaveRequest, StoredList};

const USER_AGENT: &str = concat!("blog-admin-lists/", env!("CARGO_PKG_VERSION"));

/// Multipart part carrying the JSON body when files are attached.
pub const PAYLOAD_PART: &str = "payload";

#[derive(Clone)]
pub struct RestListStore {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl fmt::Debug for RestListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestListStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestListStore {
    pub fn new(base_url: Url, token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = cfg.base_url()?;
        Self::new(base_url, cfg.token().map(str::to_string))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Each part of the resource path and the tail (container key or record
    /// id) becomes exactly one percent-encoded path segment.
    fn endpoint(&self, resource: &Resource, tail: Option<&str>) -> Result<Url> {
        if let Some(tail) = tail {
            if matches!(tail, "" | "." | "..") {
                return Err(anyhow!("invalid path segment {:?} for resource {}", tail, resource.path));
            }
        }
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("base URL cannot hold a path: {}", self.base_url))?;
            segments
                .pop_if_empty()
                .extend(resource.path.split('/').filter(|s| !s.is_empty()));
            if let Some(tail) = tail {
                segments.push(tail);
            }
        }
        Ok(url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    pub fn build_fetch_request(&self, resource: &Resource, container_key: &str) -> Result<reqwest::Request> {
        let url = self.endpoint(resource, Some(container_key))?;
        self.authorize(self.http.get(url))
            .header("Accept", "application/json")
            .build()
            .context("failed to build fetch request")
    }

    /// `PUT <resource>/<record>` when the record is known, `POST <resource>`
    /// otherwise.
    fn save_builder(&self, resource: &Resource, request: &SaveRequest) -> Result<reqwest::RequestBuilder> {
        let builder = match request.record_id.as_deref() {
            Some(record_id) => self.http.put(self.endpoint(resource, Some(record_id))?),
            None => self.http.post(self.endpoint(resource, None)?),
        };
        Ok(self.authorize(builder))
    }

    pub fn build_json_save_request(&self, resource: &Resource, request: &SaveRequest) -> Result<reqwest::Request> {
        self.save_builder(resource, request)?
            .header("Content-Type", "application/json")
            .json(&request.body())
            .build()
            .context("failed to build save request")
    }

    async fn build_multipart_save_request(
        &self,
        resource: &Resource,
        request: &SaveRequest,
    ) -> Result<reqwest::Request> {
        let payload = serde_json::to_string(&request.body())?;
        let mut form = Form::new().part(
            PAYLOAD_PART,
            Part::text(payload).mime_str("application/json")?,
        );
        for upload in &request.uploads {
            let file_name = upload
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("invalid file name: {}", upload.path.display()))?
                .to_string();
            let content = fs::read(&upload.path)
                .await
                .with_context(|| format!("failed to read file: {}", upload.path.display()))?;
            let part = Part::bytes(content)
                .file_name(file_name)
                .mime_str(content_type(&upload.path))?;
            form = form.part(upload.name.clone(), part);
        }
        self.save_builder(resource, request)?
            .multipart(form)
            .build()
            .context("failed to build multipart save request")
    }

    async fn execute(&self, request: reqwest::Request) -> Result<(StatusCode, String)> {
        let method = request.method().clone();
        let url = request.url().clone();
        for (name, value) in request.headers() {
            if name.as_str().eq_ignore_ascii_case("authorization") {
                debug!("  {}: Bearer [REDACTED]", name);
            } else {
                debug!("  {}: {}", name, value.to_str().unwrap_or("[invalid]"));
            }
        }

        let res = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("failed to reach admin API at {}", url))?;
        let status = res.status();
        let body = res.text().await.context("failed to read admin API response")?;
        info!(%method, %url, %status, "admin API call");
        Ok((status, body))
    }
}

#[async_trait]
impl ListStore for RestListStore {
    #[instrument(skip(self, resource), fields(resource = %resource.path))]
    async fn fetch(&self, resource: &Resource, container_key: &str) -> Result<Option<StoredList>> {
        let request = self.build_fetch_request(resource, container_key)?;
        let (status, body) = self.execute(request).await?;
        if status == StatusCode::NOT_FOUND {
            info!(container_key, "no stored list yet");
            return Ok(None);
        }
        if !status.is_success() {
            warn!("admin API error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("admin API error {}: {}", status, body));
        }
        parse_stored_list(&body).map(Some)
    }

    #[instrument(skip(self, resource, request), fields(resource = %resource.path, key = %request.container_key))]
    async fn replace(&self, resource: &Resource, request: &SaveRequest) -> Result<StoredList> {
        let http_request = if request.is_multipart() {
            self.build_multipart_save_request(resource, request).await?
        } else {
            self.build_json_save_request(resource, request)?
        };
        debug!(
            "Request Payload: {}",
            serde_json::to_string_pretty(&request.body()).unwrap_or_default()
        );
        let (status, body) = self.execute(http_request).await?;
        if !status.is_success() {
            warn!("admin API error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("admin API error {}: {}", status, body));
        }
        let stored = parse_stored_list(&body)?;
        info!(items = stored.sequence.len(), "list saved");
        Ok(stored)
    }
}

fn content_type(file_path: &Path) -> &'static str {
    match file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "svg" => "image/svg+xml",
        Some(ext) if ext == "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
