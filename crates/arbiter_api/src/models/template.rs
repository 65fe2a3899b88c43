//! Template and task models, including the task-shape classification used by the
//! completion flow.

use serde::{Deserialize, Serialize};

/// Inline marker embedded in task text where the inspector enters a value.
pub const BLANK_MARKER: &str = "__";

/// Reusable definition of a checksheet's task list.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Template {
    pub id: i64,
    pub template_number: String,
    pub name: String,
    pub descriptive_name: String,
    pub scope_id: i64,
    pub vendor_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub rev: i64,
    pub takes_input: bool,
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
}

/// One line item of a template: a section header or a response-requiring check.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Task {
    pub id: i64,
    pub template_id: i64,
    pub ordinal: i32,
    pub task: String,
    pub bol_subtitle: bool,
    pub bol_signature: bool,
    pub takes_input: bool,
}

/// Shape of a task, resolved once when the task list is loaded. Response handling
/// dispatches on this variant instead of re-matching the task text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Non-interactive section header; never requires a response.
    Header,
    /// Plain pass/fail/not-applicable check.
    PlainCheck,
    /// Check whose text embeds `slots` blank markers, each one a text input.
    TextInput { slots: usize },
}

impl Task {
    /// Classifies the task from its header flag and inline blank markers.
    pub fn kind(&self) -> TaskKind {
        if self.bol_subtitle {
            return TaskKind::Header;
        }
        let slots = self.task.matches(BLANK_MARKER).count();
        if slots > 0 {
            TaskKind::TextInput { slots }
        } else {
            TaskKind::PlainCheck
        }
    }
}
