//! Task response models: the in-memory response held by the completion flow, the
//! persisted soft-data rows it is rebuilt from, and the save payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of a plain pass/fail check. The backend stores these as the string codes
/// `"1"`, `"2"` and `"3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
    NotApplicable,
}

impl Outcome {
    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Pass => "1",
            Outcome::Fail => "2",
            Outcome::NotApplicable => "3",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Outcome::Pass),
            "2" => Some(Outcome::Fail),
            "3" => Some(Outcome::NotApplicable),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass => "Pass",
            Outcome::Fail => "Fail",
            Outcome::NotApplicable => "N/A",
        }
    }
}

/// Answer portion of a response. Which variant applies is decided by the owning
/// task's [`TaskKind`](super::TaskKind), never chosen independently.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Outcome(Outcome),
    /// Entered text keyed by 1-based input slot.
    TextInputs(BTreeMap<u32, String>),
}

/// One task's in-memory response. Exists only in the completion session until
/// explicitly persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResponse {
    pub task_id: i64,
    pub value: Option<ResponseValue>,
    pub notes: Option<String>,
    pub photos: Vec<String>,
    pub signature: Option<String>,
}

impl TaskResponse {
    pub fn new(task_id: i64) -> Self {
        Self {
            task_id,
            value: None,
            notes: None,
            photos: Vec::new(),
            signature: None,
        }
    }

    /// True when nothing has been recorded: no value, notes, photos or
    /// signature. Empty responses are dropped rather than persisted.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.notes.is_none()
            && self.photos.is_empty()
            && self.signature.is_none()
    }

    /// Builds the wire payload for a save request.
    pub fn to_payload(&self) -> TaskResponsePayload {
        let (response, text_inputs) = match &self.value {
            Some(ResponseValue::Outcome(outcome)) => (Some(outcome.code().to_string()), None),
            Some(ResponseValue::TextInputs(inputs)) => (None, Some(inputs.clone())),
            None => (None, None),
        };
        TaskResponsePayload {
            task_id: self.task_id,
            response,
            text_inputs,
            notes: self.notes.clone(),
            photos: self.photos.clone(),
            signature: self.signature.clone(),
        }
    }
}

/// Persisted response row as stored by the backend. Plain outcomes use slot
/// `number == 0`; text inputs one row per 1-based slot.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SoftData {
    pub id: i64,
    pub sid: i64,
    pub uid: i64,
    pub checksheet_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub task_id: i64,
    pub number: u32,
    pub response: String,
}

/// Save-request body for one task's response.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponsePayload {
    pub task_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_inputs: Option<BTreeMap<u32, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}
