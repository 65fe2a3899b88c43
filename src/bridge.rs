//! UI-facing DTOs and conversion helpers.
//!
//! This module defines the serialized payload shapes handed to the presentation
//! layer, flattened from the API models so screens never reach through optional
//! association chains.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use arbiter_api::{
    Checksheet, Project, Punchlist, ResponseValue, Task, TaskKind, TaskResponse,
};

/// Represents a checksheet row on the list screen, with association names
/// already resolved.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChecksheetSummary {
    pub id: i64,
    pub name: String,
    pub project: Option<String>,
    pub template: Option<String>,
    pub inspector: Option<String>,
    pub vendor: Option<String>,
    pub due_date: Option<String>,
    pub overdue: bool,
    pub completed: bool,
    pub status_date: Option<String>,
}

impl From<&Checksheet> for ChecksheetSummary {
    fn from(checksheet: &Checksheet) -> Self {
        Self {
            id: checksheet.id,
            name: checksheet.name.clone(),
            project: checksheet
                .project
                .as_ref()
                .and_then(|p| p.name.clone()),
            template: checksheet.template.as_ref().map(|t| t.name.clone()),
            inspector: checksheet.user.as_ref().map(|u| u.full_name()),
            vendor: checksheet.vendor.as_ref().map(|v| v.name.clone()),
            due_date: checksheet.duedate.map(|d| d.to_string()),
            overdue: checksheet.overdue,
            completed: checksheet.status,
            status_date: checksheet.status_date.clone(),
        }
    }
}

/// Represents a punchlist row on the list screen. `days_open` counts from the
/// open date to the close date, or to today while the item is still open.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PunchlistSummary {
    pub id: i64,
    pub reference: Option<String>,
    pub name: String,
    pub project: Option<String>,
    pub scope: Option<String>,
    pub discipline: Option<String>,
    pub level: String,
    pub status: String,
    pub originator: Option<String>,
    pub open_date: String,
    pub due_date: Option<String>,
    pub days_open: i64,
    pub cost: Option<f64>,
}

impl From<&Punchlist> for PunchlistSummary {
    fn from(punchlist: &Punchlist) -> Self {
        let end = punchlist
            .closed_date
            .unwrap_or_else(|| Utc::now().date_naive());
        Self {
            id: punchlist.id,
            reference: punchlist.pl_reference.clone(),
            name: punchlist.name.clone(),
            project: punchlist.project.as_ref().and_then(|p| p.name.clone()),
            scope: punchlist.scope.as_ref().map(|s| s.name.clone()),
            discipline: punchlist.department.as_ref().map(|d| d.name.clone()),
            level: punchlist.punch_level.clone(),
            status: punchlist.status.as_str().to_string(),
            originator: punchlist
                .originator_user
                .as_ref()
                .map(|u| u.full_name()),
            open_date: punchlist.open_date.to_string(),
            due_date: punchlist.due_date.map(|d| d.to_string()),
            days_open: (end - punchlist.open_date).num_days(),
            cost: punchlist.cost,
        }
    }
}

/// Represents a project row on the list screen.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: Option<String>,
    pub number: Option<i64>,
    pub client: Option<String>,
    pub active: bool,
    pub description: Option<String>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            number: project.number,
            client: project.client.as_ref().map(|c| c.name.clone()),
            active: project.is_active,
            description: project.description.clone(),
        }
    }
}

/// One row of the completion screen: the task plus whatever has been recorded
/// for it so far.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskRow {
    pub id: i64,
    pub text: String,
    pub kind: String,
    pub input_slots: usize,
    pub requires_signature: bool,
    pub outcome: Option<String>,
    pub inputs: Vec<String>,
    pub notes: Option<String>,
    pub photo_count: usize,
    pub signed: bool,
}

impl TaskRow {
    pub fn build(task: &Task, kind: TaskKind, response: Option<&TaskResponse>) -> Self {
        let (kind_label, input_slots) = match kind {
            TaskKind::Header => ("header", 0),
            TaskKind::PlainCheck => ("check", 0),
            TaskKind::TextInput { slots } => ("input", slots),
        };
        let outcome = response.and_then(|r| match &r.value {
            Some(ResponseValue::Outcome(outcome)) => Some(outcome.label().to_string()),
            _ => None,
        });
        let inputs = response
            .map(|r| match &r.value {
                // Slots render in order; unfilled slots show as empty strings.
                Some(ResponseValue::TextInputs(map)) => (1..=input_slots as u32)
                    .map(|slot| map.get(&slot).cloned().unwrap_or_default())
                    .collect(),
                _ => Vec::new(),
            })
            .unwrap_or_default();
        Self {
            id: task.id,
            text: task.task.clone(),
            kind: kind_label.to_string(),
            input_slots,
            requires_signature: task.bol_signature,
            outcome,
            inputs,
            notes: response.and_then(|r| r.notes.clone()),
            photo_count: response.map(|r| r.photos.len()).unwrap_or(0),
            signed: response.is_some_and(|r| r.signature.is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChecksheetSummary, PunchlistSummary, TaskRow};
    use arbiter_api::{DataSource, MockDataSource, Outcome, ResponseValue, TaskResponse};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn checksheet_summary_flattens_associations() {
        let source = MockDataSource::new();
        let checksheet = source.fetch_checksheet(1).await.unwrap();

        let summary = ChecksheetSummary::from(&checksheet);
        assert_eq!(summary.project.as_deref(), Some("Downtown Office Tower"));
        assert_eq!(summary.inspector.as_deref(), Some("Sarah Johnson"));
        assert_eq!(summary.due_date.as_deref(), Some("2024-01-25"));
        assert!(!summary.completed);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["template"], "Foundation Pour");
    }

    #[tokio::test]
    async fn closed_punchlist_days_open_uses_the_close_date() {
        let source = MockDataSource::new();
        let punchlist = source.fetch_punchlist(3).await.unwrap();

        let summary = PunchlistSummary::from(&punchlist);
        assert_eq!(summary.status, "Closed");
        // Opened 2024-01-05, closed 2024-01-15.
        assert_eq!(summary.days_open, 10);
    }

    #[tokio::test]
    async fn task_row_renders_text_inputs_in_slot_order() {
        let source = MockDataSource::new();
        let tasks = source.fetch_tasks(2).await.unwrap();
        let two_slot = &tasks[0];
        assert_eq!(two_slot.task.matches("__").count(), 2);

        let mut inputs = BTreeMap::new();
        inputs.insert(2, "B-3".to_string());
        let mut response = TaskResponse::new(two_slot.id);
        response.value = Some(ResponseValue::TextInputs(inputs));

        let row = TaskRow::build(two_slot, two_slot.kind(), Some(&response));
        assert_eq!(row.kind, "input");
        assert_eq!(row.inputs, vec!["".to_string(), "B-3".to_string()]);
    }

    #[tokio::test]
    async fn task_row_carries_outcome_label() {
        let source = MockDataSource::new();
        let tasks = source.fetch_tasks(1).await.unwrap();

        let mut response = TaskResponse::new(tasks[0].id);
        response.value = Some(ResponseValue::Outcome(Outcome::NotApplicable));

        let row = TaskRow::build(&tasks[0], tasks[0].kind(), Some(&response));
        assert_eq!(row.outcome.as_deref(), Some("N/A"));

        let header = &tasks[2];
        let row = TaskRow::build(header, header.kind(), None);
        assert_eq!(row.kind, "header");
        assert!(row.outcome.is_none());
    }
}
