//! The task being created or edited.

use paramtree::Payload;
use serde::{Deserialize, Serialize};

use crate::process::ProcessId;

/// Saved task inputs that cannot be read as a payload.
#[derive(Debug, thiserror::Error)]
pub enum TaskInputsError {
    #[error("task inputs are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("task inputs are not a JSON object")]
    NotAnObject,
}

/// Persisted invocation of a process. Fields this editor does not use are kept as they are.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Absent until the task has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_code: Option<String>,
    /// The submission payload, encoded as a JSON string. A decoded object is accepted too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn process_id(&self) -> Option<ProcessId> {
        match (&self.process_authority, &self.process_code) {
            (Some(authority), Some(code)) => Some(ProcessId::new(authority, code)),
            _ => None,
        }
    }

    pub fn set_process(&mut self, id: &ProcessId) {
        self.process_authority = Some(id.authority.clone());
        self.process_code = Some(id.code.clone());
    }

    pub fn clear_process(&mut self) {
        self.process_authority = None;
        self.process_code = None;
    }

    /// Decodes the saved inputs, if there are any.
    pub fn input_payload(&self) -> Result<Option<Payload>, TaskInputsError> {
        match &self.inputs {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(encoded)) if encoded.trim().is_empty() => Ok(None),
            Some(serde_json::Value::String(encoded)) => {
                match serde_json::from_str::<serde_json::Value>(encoded)? {
                    serde_json::Value::Object(payload) => Ok(Some(payload)),
                    _ => Err(TaskInputsError::NotAnObject),
                }
            }
            Some(serde_json::Value::Object(payload)) => Ok(Some(payload.clone())),
            Some(_) => Err(TaskInputsError::NotAnObject),
        }
    }

    /// Stores `payload` as the JSON encoded inputs.
    pub fn set_input_payload(&mut self, payload: Payload) {
        let encoded = serde_json::Value::Object(payload).to_string();
        self.inputs = Some(serde_json::Value::String(encoded));
    }
}
