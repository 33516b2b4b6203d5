//! Remote collaborators of the task editor.
//!
//! All of these are asynchronous and run on a single thread, so their futures need not be `Send`.

use async_trait::async_trait;
use paramtree::descriptor::ProcessDescriptor;

use crate::{
    process::ProcessId,
    reference::ReferenceItem,
    task::Task,
    wps::{WpsInstance, WpsProcess},
};

/// Failure reported by a remote service, with its message when it gave one.
#[derive(Clone, Debug, Default, Eq, PartialEq, thiserror::Error)]
#[error("{}", self.message.as_deref().unwrap_or("service request failed"))]
pub struct ServiceError {
    pub message: Option<String>,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// The service's message, or `fallback` when it gave none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_owned())
    }
}

/// Serves process descriptions.
#[async_trait(?Send)]
pub trait ProcessClient {
    async fn describe_process(&self, id: &ProcessId) -> Result<ProcessDescriptor, ServiceError>;
}

/// Persists tasks.
#[async_trait(?Send)]
pub trait TaskService {
    async fn create(&self, task: &Task) -> Result<(), ServiceError>;
    async fn update(&self, task: &Task) -> Result<(), ServiceError>;
}

/// Serves the lists that reference editors choose from.
#[async_trait(?Send)]
pub trait ReferenceClient {
    async fn fetch_styles(&self) -> Result<Vec<ReferenceItem>, ServiceError>;
    async fn fetch_users(&self) -> Result<Vec<ReferenceItem>, ServiceError>;
    async fn fetch_services(&self) -> Result<Vec<ReferenceItem>, ServiceError>;
    async fn fetch_crs_codes(&self) -> Result<Vec<ReferenceItem>, ServiceError>;
    async fn fetch_datas(&self) -> Result<Vec<ReferenceItem>, ServiceError>;
    async fn fetch_map_contexts(&self) -> Result<Vec<ReferenceItem>, ServiceError>;
    async fn fetch_datasets(&self) -> Result<Vec<ReferenceItem>, ServiceError>;
}

/// Identifies an upload channel opened with [FileTransfer::create_channel].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ChannelId(pub String);

/// A file selected for upload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Transfers files to the server.
#[async_trait(?Send)]
pub trait FileTransfer {
    async fn create_channel(&self) -> Result<ChannelId, ServiceError>;

    /// Uploads `file` and returns the path it was stored at.
    async fn transfer(&self, channel: &ChannelId, file: &UploadFile) -> Result<String, ServiceError>;
}

/// Lists WPS services and their processes.
#[async_trait(?Send)]
pub trait WpsClient {
    /// The WPS instances hosted by this server.
    async fn list_instances(&self) -> Result<Vec<WpsInstance>, ServiceError>;

    /// The processes of the WPS service at `url`, from its capabilities.
    async fn list_external_processes(&self, url: &str) -> Result<Vec<WpsProcess>, ServiceError>;
}
