//! HTTP upload session
//!
//! An explicitly constructed service: each session owns its HTTP client,
//! its storage settings and its own task list. Nothing is shared between
//! sessions.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tokio::sync::Notify;

use super::naming;
use super::{ImageUploader, UploadError, UploadFile, UploadedImage};
use crate::config::UploadConfig;

/// Lifecycle of a single upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Waiting,
    Uploading,
    Success,
    Error,
    Canceled,
}

impl UploadState {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            UploadState::Success | UploadState::Error | UploadState::Canceled
        )
    }
}

/// Snapshot of one upload tracked by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub id: u64,
    pub filename: String,
    pub key: String,
    pub state: UploadState,
    pub url: Option<String>,
    pub error: Option<String>,
}

/// Body entry for the upload report endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportEntry<'a> {
    image_name: &'a str,
    image_format: Option<&'a str>,
    image_url: &'a str,
    image_size: usize,
}

pub struct UploadSession {
    client: reqwest::Client,
    endpoint: String,
    public_base: String,
    upload_path: String,
    report_endpoint: Option<String>,
    tasks: Mutex<Vec<UploadTask>>,
    next_id: AtomicU64,
    /// Woken on every `cancel` so in-flight requests can check their task
    canceled: Notify,
}

impl UploadSession {
    pub fn new(endpoint: impl Into<String>, public_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("mask-canvas/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            public_base: public_base.into(),
            upload_path: "/user/".to_string(),
            report_endpoint: None,
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            canceled: Notify::new(),
        })
    }

    /// Build a session from the upload section of the config
    pub fn from_config(config: &UploadConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .context("No upload endpoint configured")?;
        let public_base = config
            .public_base
            .clone()
            .unwrap_or_else(|| endpoint.clone());
        let mut session = Self::new(endpoint, public_base)?;
        session.upload_path = config.upload_path.clone();
        session.report_endpoint = config.report_endpoint.clone();
        Ok(session)
    }

    pub fn with_upload_path(mut self, upload_path: impl Into<String>) -> Self {
        self.upload_path = upload_path.into();
        self
    }

    pub fn with_report_endpoint(mut self, report_endpoint: impl Into<String>) -> Self {
        self.report_endpoint = Some(report_endpoint.into());
        self
    }

    /// Snapshot of every task this session has started
    pub fn tasks(&self) -> Vec<UploadTask> {
        self.lock_tasks().clone()
    }

    /// Cancel a task that has not finished yet, aborting its request
    ///
    /// Returns false if the task is unknown or already finished.
    pub fn cancel(&self, id: u64) -> bool {
        let canceled = {
            let mut tasks = self.lock_tasks();
            match tasks.iter_mut().find(|t| t.id == id) {
                Some(task) if !task.state.is_finished() => {
                    task.state = UploadState::Canceled;
                    true
                }
                _ => false,
            }
        };
        if canceled {
            self.canceled.notify_waiters();
        }
        canceled
    }

    /// Forget finished tasks, returning how many were dropped
    pub fn prune_finished(&self) -> usize {
        let mut tasks = self.lock_tasks();
        let before = tasks.len();
        tasks.retain(|t| !t.state.is_finished());
        before - tasks.len()
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<UploadTask>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin_task(&self, filename: &str, key: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock_tasks().push(UploadTask {
            id,
            filename: filename.to_string(),
            key: key.to_string(),
            state: UploadState::Waiting,
            url: None,
            error: None,
        });
        id
    }

    /// Move a task to `state`; canceled tasks stay canceled
    ///
    /// Returns false if the task was canceled.
    fn update_task(
        &self,
        id: u64,
        state: UploadState,
        url: Option<&str>,
        error: Option<&str>,
    ) -> bool {
        let mut tasks = self.lock_tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return true;
        };
        if task.state == UploadState::Canceled {
            return false;
        }
        task.state = state;
        task.url = url.map(str::to_string);
        task.error = error.map(str::to_string);
        true
    }

    fn is_canceled(&self, id: u64) -> bool {
        self.lock_tasks()
            .iter()
            .any(|t| t.id == id && t.state == UploadState::Canceled)
    }

    /// Resolves once task `id` has been canceled
    async fn wait_canceled(&self, id: u64) {
        loop {
            let mut notified = std::pin::pin!(self.canceled.notified());
            // Register before checking so a cancel in between is not missed
            notified.as_mut().enable();
            if self.is_canceled(id) {
                return;
            }
            notified.await;
        }
    }

    fn object_url(&self, key: &str) -> String {
        join_url(&self.endpoint, key)
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base, key)
    }

    async fn upload_file(&self, file: UploadFile) -> Result<UploadedImage, UploadError> {
        let key = naming::object_key(&self.upload_path, &file.name, file.temp, naming::now_ms());
        let name = key.rsplit('/').next().unwrap_or(&key).to_string();
        let id = self.begin_task(&file.name, &key);

        if !self.update_task(id, UploadState::Uploading, None, None) {
            return Err(UploadError::Canceled);
        }

        let size = file.bytes.len();
        log::info!("Uploading {} ({} bytes) as {}", file.name, size, key);

        let request = self
            .client
            .put(self.object_url(&key))
            .header(CONTENT_TYPE, file.mime_type.as_str())
            .body(file.bytes)
            .send();

        let result = tokio::select! {
            result = request => result,
            () = self.wait_canceled(id) => {
                log::info!("Upload of {} canceled", key);
                return Err(UploadError::Canceled);
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let err = UploadError::Network(err.to_string());
                self.update_task(id, UploadState::Error, None, Some(err.reason()));
                return Err(err);
            }
        };

        if !response.status().is_success() {
            let err = UploadError::Rejected(format!("HTTP status: {}", response.status()));
            self.update_task(id, UploadState::Error, None, Some(err.reason()));
            return Err(err);
        }

        let uploaded = UploadedImage::new(self.public_url(&key), name, size);
        if !self.update_task(id, UploadState::Success, Some(&uploaded.url), None) {
            return Err(UploadError::Canceled);
        }

        if !file.temp {
            self.report(&uploaded).await;
        }
        Ok(uploaded)
    }

    /// Tell the backend about a permanent upload; failures are not fatal
    async fn report(&self, uploaded: &UploadedImage) {
        let Some(endpoint) = &self.report_endpoint else {
            return;
        };
        let body = [ReportEntry {
            image_name: &uploaded.name,
            image_format: uploaded.format.as_deref(),
            image_url: &uploaded.url,
            image_size: uploaded.size,
        }];
        let json = match serde_json::to_vec(&body) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Failed to serialize upload report: {}", err);
                return;
            }
        };
        let result = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(json)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        if let Err(err) = result {
            log::warn!("Failed to report upload of {}: {}", uploaded.name, err);
        }
    }
}

impl ImageUploader for UploadSession {
    async fn upload(&self, file: UploadFile) -> Result<UploadedImage, UploadError> {
        self.upload_file(file).await
    }
}

fn join_url(base: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}
