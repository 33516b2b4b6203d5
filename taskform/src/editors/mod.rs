//! The standard editor catalogue: which template renders each binding type, and which
//! reference list, if any, its choices come from.

pub mod choices;
pub mod instance;

use paramtree::registry::EditorRegistry;

use crate::reference::ReferenceList;

pub use choices::{Choice, Choices};
pub use instance::EditorInstance;

/// Registry of the editors known to the task editor.
pub type Editors = EditorRegistry<EditorSpec>;

/// Rendering template of an editor.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum EditorTemplate {
    Boolean,
    Number,
    String,
    Url,
    File,
    Style,
    User,
    Service,
    Crs,
    Data,
    Mapcontext,
    Dataset,
}

/// Restriction of the data list to one kind of data.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DataKind {
    #[default]
    Any,
    Coverage,
    Vector,
}

impl DataKind {
    /// True if a data item of `data_type` belongs to this kind.
    pub fn accepts(self, data_type: Option<&str>) -> bool {
        match self {
            DataKind::Any => true,
            DataKind::Coverage => data_type == Some("COVERAGE"),
            DataKind::Vector => data_type == Some("VECTOR"),
        }
    }
}

/// How an `ext.filter` pattern applies to a reference list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterMode {
    /// The pattern is ignored.
    None,
    /// Items must match every property of the pattern.
    All,
    /// Items matching any property, or any member of a property's list, are kept.
    Any,
}

/// Where a reference editor's choices come from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReferenceSource {
    Styles,
    Users,
    Services,
    CrsCodes,
    Datas(DataKind),
    MapContexts,
    Datasets,
}

impl ReferenceSource {
    pub fn list(self) -> ReferenceList {
        match self {
            ReferenceSource::Styles => ReferenceList::Styles,
            ReferenceSource::Users => ReferenceList::Users,
            ReferenceSource::Services => ReferenceList::Services,
            ReferenceSource::CrsCodes => ReferenceList::CrsCodes,
            ReferenceSource::Datas(_) => ReferenceList::Datas,
            ReferenceSource::MapContexts => ReferenceList::MapContexts,
            ReferenceSource::Datasets => ReferenceList::Datasets,
        }
    }

    pub fn filter_mode(self) -> FilterMode {
        match self {
            ReferenceSource::Styles | ReferenceSource::Users | ReferenceSource::Datas(_) => {
                FilterMode::All
            }
            ReferenceSource::Services => FilterMode::Any,
            ReferenceSource::CrsCodes | ReferenceSource::MapContexts | ReferenceSource::Datasets => {
                FilterMode::None
            }
        }
    }

    /// Whether optional parameters are offered an "unset" choice.
    pub fn offers_unset(self) -> bool {
        !matches!(
            self,
            ReferenceSource::MapContexts | ReferenceSource::Datasets
        )
    }
}

/// What the editor of a binding type looks like.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EditorSpec {
    pub template: EditorTemplate,
    pub source: Option<ReferenceSource>,
}

impl EditorSpec {
    pub fn new(template: EditorTemplate, source: Option<ReferenceSource>) -> Self {
        Self { template, source }
    }
}

impl From<EditorTemplate> for EditorSpec {
    /// The editor for a template, choosing from its usual reference list.
    fn from(template: EditorTemplate) -> Self {
        use EditorTemplate::*;
        let source = match template {
            Boolean | Number | String | Url | File => None,
            Style => Some(ReferenceSource::Styles),
            User => Some(ReferenceSource::Users),
            Service => Some(ReferenceSource::Services),
            Crs => Some(ReferenceSource::CrsCodes),
            Data => Some(ReferenceSource::Datas(DataKind::Any)),
            Mapcontext => Some(ReferenceSource::MapContexts),
            Dataset => Some(ReferenceSource::Datasets),
        };
        Self { template, source }
    }
}

/// Type ids of the standard catalogue, grouped by shared editor.
const STANDARD_EDITORS: &[(&[&str], EditorTemplate, Option<ReferenceSource>)] = &[
    (&["java.lang.Boolean", "boolean"], EditorTemplate::Boolean, None),
    (
        &[
            "java.lang.Double",
            "double",
            "java.lang.Float",
            "float",
            "java.lang.Integer",
            "int",
            "java.lang.Long",
            "long",
        ],
        EditorTemplate::Number,
        None,
    ),
    (
        &["java.lang.Character", "char", "java.lang.String"],
        EditorTemplate::String,
        None,
    ),
    (&["java.net.URL"], EditorTemplate::Url, None),
    (&["java.io.File", "java.nio.file.Path"], EditorTemplate::File, None),
    (
        &[
            "org.constellation.dto.process.StyleProcessReference",
            "org.constellation.dto.StyleReference",
        ],
        EditorTemplate::Style,
        Some(ReferenceSource::Styles),
    ),
    (
        &["org.constellation.dto.process.UserProcessReference"],
        EditorTemplate::User,
        Some(ReferenceSource::Users),
    ),
    (
        &["org.constellation.dto.process.ServiceProcessReference"],
        EditorTemplate::Service,
        Some(ReferenceSource::Services),
    ),
    (
        &[
            "org.constellation.dto.process.CRSProcessReference",
            "org.opengis.referencing.crs.CoordinateReferenceSystem",
        ],
        EditorTemplate::Crs,
        Some(ReferenceSource::CrsCodes),
    ),
    (
        &["org.constellation.dto.process.DataProcessReference"],
        EditorTemplate::Data,
        Some(ReferenceSource::Datas(DataKind::Any)),
    ),
    (
        &["org.apache.sis.storage.GridCoverageResource"],
        EditorTemplate::Data,
        Some(ReferenceSource::Datas(DataKind::Coverage)),
    ),
    (
        &["org.apache.sis.storage.FeatureSet"],
        EditorTemplate::Data,
        Some(ReferenceSource::Datas(DataKind::Vector)),
    ),
    (
        &[
            "org.apache.sis.portrayal.MapLayers",
            "org.constellation.dto.MapContextLayersDTO",
            "org.constellation.dto.process.MapContextProcessReference",
        ],
        EditorTemplate::Mapcontext,
        Some(ReferenceSource::MapContexts),
    ),
    (
        &["org.constellation.dto.process.DatasetProcessReference"],
        EditorTemplate::Dataset,
        Some(ReferenceSource::Datasets),
    ),
];

/// Registry holding the standard catalogue of editors.
pub fn standard_registry() -> Editors {
    let mut registry = Editors::new();
    for (type_ids, template, source) in STANDARD_EDITORS {
        let spec = std::rc::Rc::new(EditorSpec::new(*template, *source));
        for type_id in *type_ids {
            registry.register_shared(*type_id, spec.clone());
        }
    }
    log::debug!("Registered {} standard editors.", registry.len());
    registry
}
