//! Processes offered by WPS services, as an alternative to the internal process catalogue.
//!
//! The WPS instances of this server are listed on the internal tab and list their processes on
//! demand. The external tab queries any WPS service by URL. A process chosen from the selected
//! service is identified by the service URL as authority and the WPS process id as code.


use std::cell::RefCell;

use serde::Deserialize;

use crate::{
    notification::Notification,
    process::ProcessId,
    services::{ServiceError, WpsClient},
};

/// A process advertised by a WPS service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct WpsProcess {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A WPS instance hosted by this server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct WpsInstance {
    pub identifier: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A WPS service and, once listed, its processes sorted by id.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WpsService {
    pub instance: Option<WpsInstance>,
    pub service_url: Option<String>,
    pub processes: Option<Vec<WpsProcess>>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WpsTab {
    #[default]
    Internal,
    External,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Selection {
    Internal(usize),
    External,
}

/// State of the WPS process source.
#[derive(Debug)]
pub struct WpsSource {
    base_url: String,
    tab: WpsTab,
    internal: Vec<WpsService>,
    external: WpsService,
    selection: Option<Selection>,
    process: Option<String>,
    notifications: Vec<Notification>,
}

impl WpsSource {
    /// `base_url` is the root of this server, under which its WPS instances are served.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tab: WpsTab::default(),
            internal: Vec::new(),
            external: WpsService::default(),
            selection: None,
            process: None,
            notifications: Vec::new(),
        }
    }

    pub fn tab(&self) -> WpsTab {
        self.tab
    }

    pub fn internal(&self) -> &[WpsService] {
        &self.internal
    }

    pub fn external(&self) -> &WpsService {
        &self.external
    }

    /// Lists the WPS instances of this server. The selection is cleared.
    pub async fn load_instances(
        source: &RefCell<WpsSource>,
        client: &dyn WpsClient,
    ) -> Result<(), ServiceError> {
        source.borrow_mut().clear_selection();
        let instances = client.list_instances().await.inspect_err(|err| {
            log::error!("Failed to list WPS instances: {err}");
        })?;
        log::debug!("Listed {} WPS instance(s).", instances.len());
        source.borrow_mut().internal = instances
            .into_iter()
            .map(|instance| WpsService {
                instance: Some(instance),
                ..Default::default()
            })
            .collect();
        Ok(())
    }

    /// Shows another tab. Switching tabs clears the selection.
    pub fn switch_tab(&mut self, tab: WpsTab) {
        if tab != self.tab {
            self.tab = tab;
            self.clear_selection();
        }
    }

    /// Selects the internal instance at `index`. Returns false if there is none.
    pub fn select_instance(&mut self, index: usize) -> bool {
        if index >= self.internal.len() {
            return false;
        }
        self.selection = Some(Selection::Internal(index));
        self.process = None;
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.process = None;
    }

    /// Lists the processes of the internal instance at `index`, unless already listed.
    ///
    /// A failure is reported as a notification and the list can be requested again.
    pub async fn load_process_list(
        source: &RefCell<WpsSource>,
        client: &dyn WpsClient,
        index: usize,
    ) -> Result<(), ServiceError> {
        let url = {
            let mut source = source.borrow_mut();
            let base_url = source.base_url.trim_end_matches('/').to_owned();
            let Some(service) = source.internal.get_mut(index) else {
                return Ok(());
            };
            if service.processes.is_some() {
                return Ok(());
            }
            let Some(instance) = &service.instance else {
                return Ok(());
            };
            let url = format!("{base_url}/WS/wps/{}", instance.identifier);
            service.service_url = Some(url.clone());
            url
        };

        let processes = Self::capabilities(source, client, &url).await?;
        if let Some(service) = source.borrow_mut().internal.get_mut(index) {
            service.processes = Some(processes);
        }
        Ok(())
    }

    /// Lists the processes of the external service at `url` and selects it. An empty URL is
    /// ignored.
    pub async fn search_external(
        source: &RefCell<WpsSource>,
        client: &dyn WpsClient,
        url: &str,
    ) -> Result<(), ServiceError> {
        if url.is_empty() {
            return Ok(());
        }
        source.borrow_mut().external.service_url = Some(url.to_owned());

        let processes = Self::capabilities(source, client, url).await?;
        let mut source = source.borrow_mut();
        source.external.processes = Some(processes);
        source.selection = Some(Selection::External);
        source.process = None;
        Ok(())
    }

    async fn capabilities(
        source: &RefCell<WpsSource>,
        client: &dyn WpsClient,
        url: &str,
    ) -> Result<Vec<WpsProcess>, ServiceError> {
        match client.list_external_processes(url).await {
            Ok(mut processes) => {
                log::debug!("WPS service {url} lists {} process(es).", processes.len());
                sort_by_id(&mut processes);
                Ok(processes)
            }
            Err(err) => {
                log::error!("Failed to get capabilities of {url}: {err}");
                source.borrow_mut().notifications.push(Notification::error(format!(
                    "Unable to get capabilities, cause: {err}"
                )));
                Err(err)
            }
        }
    }

    /// The selected service, internal or external.
    pub fn selected_service(&self) -> Option<&WpsService> {
        match self.selection? {
            Selection::Internal(index) => self.internal.get(index),
            Selection::External => Some(&self.external),
        }
    }

    /// Chooses a process of the selected service. Returns false if the service does not list it.
    pub fn choose_process(&mut self, id: &str) -> bool {
        let listed = self
            .selected_service()
            .and_then(|service| service.processes.as_ref())
            .is_some_and(|processes| processes.iter().any(|process| process.id == id));
        if listed {
            self.process = Some(id.to_owned());
        }
        listed
    }

    /// The chosen process, with the service URL as its authority.
    pub fn selected_process(&self) -> Option<ProcessId> {
        let url = self.selected_service()?.service_url.as_ref()?;
        let code = self.process.as_ref()?;
        Some(ProcessId::new(url, code))
    }

    /// Notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

fn sort_by_id(processes: &mut [WpsProcess]) {
    processes.sort_by(|a, b| {
        a.id.to_lowercase()
            .cmp(&b.id.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}
