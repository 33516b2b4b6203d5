use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use async_trait::async_trait;
use paramtree::descriptor::ProcessDescriptor;
use serde_json::json;
use testutils::{CallLog, Gate, Gated, gate};

use crate::{
    editors::{self, Editors},
    process::ProcessId,
    reference::{ReferenceItem, ReferenceList},
    services::{
        ChannelId, FileTransfer, ProcessClient, ReferenceClient, ServiceError, TaskService,
        UploadFile, WpsClient,
    },
    task::Task,
    wps::{WpsInstance, WpsProcess},
};

pub type Response<T> = Result<T, ServiceError>;

/// Queue of responses, each released immediately or by its [Gate].
pub struct Responses<K, T> {
    queues: RefCell<hashbrown::HashMap<K, VecDeque<Gated<Response<T>>>>>,
}

impl<K, T> Default for Responses<K, T> {
    fn default() -> Self {
        Self {
            queues: Default::default(),
        }
    }
}

impl<K: Eq + std::hash::Hash, T> Responses<K, T> {
    pub fn push(&self, key: K, response: Response<T>) {
        self.push_gated(key, Gated::ready(response));
    }

    pub fn push_gate(&self, key: K) -> Gate<Response<T>> {
        let (gate, gated) = gate();
        self.push_gated(key, gated);
        gate
    }

    fn push_gated(&self, key: K, gated: Gated<Response<T>>) {
        self.queues
            .borrow_mut()
            .entry(key)
            .or_default()
            .push_back(gated);
    }

    /// Waits for the next response for `key`. Panics if none was queued.
    pub async fn next(&self, key: &K) -> Response<T> {
        let gated = self
            .queues
            .borrow_mut()
            .get_mut(key)
            .and_then(VecDeque::pop_front)
            .expect("unexpected call: no response queued");
        gated.wait().await
    }
}

#[derive(Default)]
pub struct FakeReferences {
    pub calls: CallLog<ReferenceList>,
    pub responses: Responses<ReferenceList, Vec<ReferenceItem>>,
}

impl FakeReferences {
    async fn serve(&self, list: ReferenceList) -> Response<Vec<ReferenceItem>> {
        self.calls.record(list);
        self.responses.next(&list).await
    }
}

#[async_trait(?Send)]
impl ReferenceClient for FakeReferences {
    async fn fetch_styles(&self) -> Response<Vec<ReferenceItem>> {
        self.serve(ReferenceList::Styles).await
    }
    async fn fetch_users(&self) -> Response<Vec<ReferenceItem>> {
        self.serve(ReferenceList::Users).await
    }
    async fn fetch_services(&self) -> Response<Vec<ReferenceItem>> {
        self.serve(ReferenceList::Services).await
    }
    async fn fetch_crs_codes(&self) -> Response<Vec<ReferenceItem>> {
        self.serve(ReferenceList::CrsCodes).await
    }
    async fn fetch_datas(&self) -> Response<Vec<ReferenceItem>> {
        self.serve(ReferenceList::Datas).await
    }
    async fn fetch_map_contexts(&self) -> Response<Vec<ReferenceItem>> {
        self.serve(ReferenceList::MapContexts).await
    }
    async fn fetch_datasets(&self) -> Response<Vec<ReferenceItem>> {
        self.serve(ReferenceList::Datasets).await
    }
}

#[derive(Default)]
pub struct FakeProcesses {
    pub calls: CallLog<ProcessId>,
    pub responses: Responses<ProcessId, ProcessDescriptor>,
}

#[async_trait(?Send)]
impl ProcessClient for FakeProcesses {
    async fn describe_process(&self, id: &ProcessId) -> Response<ProcessDescriptor> {
        self.calls.record(id.clone());
        self.responses.next(id).await
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SaveKind {
    Create,
    Update,
}

#[derive(Default)]
pub struct FakeTasks {
    pub calls: CallLog<(SaveKind, Task)>,
    pub responses: Responses<SaveKind, ()>,
}

#[async_trait(?Send)]
impl TaskService for FakeTasks {
    async fn create(&self, task: &Task) -> Response<()> {
        self.calls.record((SaveKind::Create, task.clone()));
        self.responses.next(&SaveKind::Create).await
    }
    async fn update(&self, task: &Task) -> Response<()> {
        self.calls.record((SaveKind::Update, task.clone()));
        self.responses.next(&SaveKind::Update).await
    }
}

#[derive(Default)]
pub struct FakeTransfer {
    pub files: CallLog<String>,
    pub responses: Responses<String, String>,
}

#[async_trait(?Send)]
impl FileTransfer for FakeTransfer {
    async fn create_channel(&self) -> Response<ChannelId> {
        Ok(ChannelId("channel-1".into()))
    }
    async fn transfer(&self, _channel: &ChannelId, file: &UploadFile) -> Response<String> {
        self.files.record(file.name.clone());
        self.responses.next(&file.name).await
    }
}

#[derive(Default)]
pub struct FakeWps {
    pub urls: CallLog<String>,
    pub instances: Responses<(), Vec<WpsInstance>>,
    pub processes: Responses<String, Vec<WpsProcess>>,
}

#[async_trait(?Send)]
impl WpsClient for FakeWps {
    async fn list_instances(&self) -> Response<Vec<WpsInstance>> {
        self.instances.next(&()).await
    }
    async fn list_external_processes(&self, url: &str) -> Response<Vec<WpsProcess>> {
        self.urls.record(url.to_owned());
        self.processes.next(&url.to_owned()).await
    }
}

pub fn wps_processes(ids: &[&str]) -> Vec<WpsProcess> {
    ids.iter()
        .map(|id| WpsProcess {
            id: (*id).into(),
            description: None,
        })
        .collect()
}

pub fn item(value: serde_json::Value) -> ReferenceItem {
    ReferenceItem(value)
}

pub fn items(values: &[serde_json::Value]) -> Vec<ReferenceItem> {
    values.iter().cloned().map(ReferenceItem).collect()
}

pub fn upload(name: &str) -> UploadFile {
    UploadFile {
        name: name.into(),
        content: b"content".to_vec(),
    }
}

pub fn standard_editors() -> Rc<Editors> {
    Rc::new(editors::standard_registry())
}

pub fn process() -> ProcessId {
    ProcessId::new("sis", "clip")
}

/// A process with a mandatory style, an optional CRS, an optional file and a group of counts.
pub fn clip_descriptor() -> ProcessDescriptor {
    serde_json::from_value(json!({
        "descriptors": [
            {"name": "style", "class": "org.constellation.dto.process.StyleProcessReference"},
            {
                "name": "crs",
                "class": "org.constellation.dto.process.CRSProcessReference",
                "minOccurs": 0,
            },
            {"name": "source", "class": "java.io.File"},
            {
                "name": "bands",
                "minOccurs": 1,
                "maxOccurs": "unbounded",
                "descriptors": [{"name": "index", "class": "java.lang.Integer", "defaultValue": "1"}],
            },
        ]
    }))
    .expect("valid descriptor")
}

/// A process with a single mandatory integer with a default.
pub fn count_descriptor() -> ProcessDescriptor {
    serde_json::from_value(json!({
        "descriptors": [{"name": "count", "class": "java.lang.Integer", "defaultValue": "5"}]
    }))
    .expect("valid descriptor")
}
