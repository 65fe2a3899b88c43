//! Punchlist (defect/remediation) record and its status vocabulary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Project, Record, User};

/// Fixed punchlist status vocabulary used by the backend.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PunchStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl PunchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PunchStatus::Open => "Open",
            PunchStatus::InProgress => "In Progress",
            PunchStatus::Resolved => "Resolved",
            PunchStatus::Closed => "Closed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Punchlist {
    pub id: i64,
    #[serde(default)]
    pub sequence: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub tag_id: Option<i64>,
    pub scope_id: i64,
    pub discipline_code_id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub originator_user_id: i64,
    pub punch_level: String,
    pub status: PunchStatus,
    #[serde(default)]
    pub close_user_id: Option<i64>,
    pub open_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub closed_date: Option<NaiveDate>,
    pub project_id: i64,
    #[serde(default)]
    pub pl_reference: Option<String>,
    pub hours_exp: f64,
    #[serde(default)]
    pub cost: Option<f64>,
    pub vendor_id: i64,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default, rename = "department")]
    pub department: Option<DisciplineCode>,
    #[serde(default, rename = "originatorUser")]
    pub originator_user: Option<User>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Scope {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DisciplineCode {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for Punchlist {
    fn record_id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::PunchStatus;

    #[test]
    fn status_serializes_with_backend_spelling() {
        let json = serde_json::to_string(&PunchStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");

        let parsed: PunchStatus = serde_json::from_str("\"Closed\"").unwrap();
        assert_eq!(parsed, PunchStatus::Closed);
    }
}
