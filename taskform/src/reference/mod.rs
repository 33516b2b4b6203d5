//! Reference lists (styles, users, services, ...) that editors offer as choices.
//!
//! Lists are fetched once and shared by every editor until they are refreshed.

pub mod filter;
mod singleflight;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::services::{ReferenceClient, ServiceError};

pub use singleflight::SingleFlight;

/// An entry of a reference list, as served.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReferenceItem(pub serde_json::Value);

impl ReferenceItem {
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(serde_json::Value::as_str)
    }

    /// The `type` of a data item, e.g. `COVERAGE` or `VECTOR`.
    pub fn data_type(&self) -> Option<&str> {
        self.field("type").and_then(serde_json::Value::as_str)
    }

    /// The item as a parameter value.
    pub fn to_value(&self) -> paramtree::Value {
        paramtree::Value::from(self.0.clone())
    }
}

impl From<serde_json::Value> for ReferenceItem {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A shared reference list.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display, strum_macros::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceList {
    Styles,
    Users,
    Services,
    CrsCodes,
    Datas,
    MapContexts,
    Datasets,
}

/// Process-wide caches of the reference lists.
pub struct ReferenceCaches {
    client: Rc<dyn ReferenceClient>,
    styles: SingleFlight<Vec<ReferenceItem>>,
    users: SingleFlight<Vec<ReferenceItem>>,
    services: SingleFlight<Vec<ReferenceItem>>,
    crs_codes: SingleFlight<Vec<ReferenceItem>>,
    datas: SingleFlight<Vec<ReferenceItem>>,
    map_contexts: SingleFlight<Vec<ReferenceItem>>,
    datasets: SingleFlight<Vec<ReferenceItem>>,
}

impl ReferenceCaches {
    pub fn new(client: Rc<dyn ReferenceClient>) -> Self {
        Self {
            client,
            styles: SingleFlight::new(),
            users: SingleFlight::new(),
            services: SingleFlight::new(),
            crs_codes: SingleFlight::new(),
            datas: SingleFlight::new(),
            map_contexts: SingleFlight::new(),
            datasets: SingleFlight::new(),
        }
    }

    fn cache(&self, list: ReferenceList) -> &SingleFlight<Vec<ReferenceItem>> {
        use ReferenceList::*;
        match list {
            Styles => &self.styles,
            Users => &self.users,
            Services => &self.services,
            CrsCodes => &self.crs_codes,
            Datas => &self.datas,
            MapContexts => &self.map_contexts,
            Datasets => &self.datasets,
        }
    }

    /// Returns the list, fetching it if it is not cached and no fetch is pending.
    pub async fn get(&self, list: ReferenceList) -> Result<Rc<Vec<ReferenceItem>>, ServiceError> {
        let client = self.client.clone();
        let result = self
            .cache(list)
            .get(move || async move {
                log::debug!("Fetching {list}.");
                fetch(client.as_ref(), list).await
            })
            .await;
        if let Err(err) = &result {
            log::error!("Failed to fetch {list}: {err}");
        }
        result
    }

    /// The list, if it has been fetched.
    pub fn cached(&self, list: ReferenceList) -> Option<Rc<Vec<ReferenceItem>>> {
        self.cache(list).peek()
    }

    /// Drops the cached list, so that the next reader fetches it again.
    pub fn invalidate(&self, list: ReferenceList) {
        log::debug!("Invalidating {list}.");
        self.cache(list).invalidate();
    }

    /// Invalidates every list.
    pub fn refresh_all(&self) {
        use strum::IntoEnumIterator;
        for list in ReferenceList::iter() {
            self.invalidate(list);
        }
    }
}

async fn fetch(
    client: &dyn ReferenceClient,
    list: ReferenceList,
) -> Result<Vec<ReferenceItem>, ServiceError> {
    use ReferenceList::*;
    match list {
        Styles => client.fetch_styles().await,
        Users => client.fetch_users().await,
        Services => client.fetch_services().await,
        CrsCodes => client.fetch_crs_codes().await,
        Datas => client.fetch_datas().await,
        MapContexts => client.fetch_map_contexts().await,
        Datasets => client.fetch_datasets().await,
    }
}
