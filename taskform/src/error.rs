use paramtree::{
    ParamId, registry::EditorNotFound, tree::TreeError, validate::ValidationReport,
};

use crate::services::ServiceError;

/// Reason a task cannot be saved as it stands.
#[derive(Debug, thiserror::Error)]
pub enum SaveBlocked {
    #[error("no process selected")]
    NoProcessSelected,
    #[error("the process description has not been loaded")]
    NoForm,
    #[error("mandatory parameters without an editor: {}", join_ids(.0))]
    Unmanageable(Vec<ParamId>),
    #[error("{}", .0.first_invalid().map(ToString::to_string).unwrap_or_default())]
    Invalid(ValidationReport),
}

fn join_ids(ids: &[ParamId]) -> String {
    ids.iter()
        .map(ParamId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error of a task editor operation.
#[derive(Debug, thiserror::Error)]
pub enum TaskFormError {
    #[error(transparent)]
    Blocked(#[from] SaveBlocked),
    #[error("failed to describe process: {0}")]
    DescriptorFetchFailed(ServiceError),
    #[error("failed to fetch reference list: {0}")]
    ReferenceFetchFailed(ServiceError),
    #[error("failed to save task: {0}")]
    SubmissionFailed(ServiceError),
    #[error("failed to upload file: {0}")]
    UploadFailed(ServiceError),
    #[error(transparent)]
    NoEditor(#[from] EditorNotFound),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
