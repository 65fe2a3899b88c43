//! Checksheet record returned by the Arbiter backend.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Project, Record, Template, User};

/// Represents an inspection checksheet tied to a project, template and responsible
/// inspector. The `status` flag is the completion state; associations are present only
/// when the backend expands them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Checksheet {
    pub id: i64,
    #[serde(default)]
    pub created_by: Option<i64>,
    pub name: String,
    pub template_id: i64,
    pub tag_id: i64,
    pub project_id: i64,
    pub status: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub status_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub vendor_id: i64,
    #[serde(default)]
    pub duedate: Option<NaiveDate>,
    pub overdue: bool,
    #[serde(default)]
    pub project: Option<Project>,
    #[serde(default)]
    pub template: Option<Template>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub vendor: Option<Vendor>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Record for Checksheet {
    fn record_id(&self) -> i64 {
        self.id
    }
}
