//! Data-source boundary consumed by the application layer.
//!
//! Implementations are injected explicitly (constructed once per process, or per
//! test) rather than reached through a process-wide singleton.

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::{ChecksheetCriteria, ProjectCriteria, PunchlistCriteria};
use crate::models::{
    Checksheet, DashboardStats, FilterOptions, Project, PunchStatus, Punchlist, RecordPage,
    SoftData, Task, TaskResponsePayload, Template,
};

/// Operations the Arbiter client core needs from a backend. Records and tasks are
/// owned by the source; the client only reads them and submits responses.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_checksheet(&self, id: i64) -> Result<Checksheet>;

    /// Returns the checksheet's task list in ordinal order.
    async fn fetch_tasks(&self, checksheet_id: i64) -> Result<Vec<Task>>;

    /// Returns previously persisted responses; empty when none exist.
    async fn fetch_responses(&self, checksheet_id: i64) -> Result<Vec<SoftData>>;

    async fn save_task_response(
        &self,
        checksheet_id: i64,
        payload: &TaskResponsePayload,
    ) -> Result<SoftData>;

    async fn mark_checksheet_complete(&self, checksheet_id: i64, actor_id: i64)
        -> Result<Checksheet>;

    async fn fetch_checksheets(
        &self,
        page: u32,
        criteria: &ChecksheetCriteria,
    ) -> Result<RecordPage<Checksheet>>;

    async fn fetch_punchlists(
        &self,
        page: u32,
        criteria: &PunchlistCriteria,
    ) -> Result<RecordPage<Punchlist>>;

    async fn fetch_projects(
        &self,
        page: u32,
        criteria: &ProjectCriteria,
    ) -> Result<RecordPage<Project>>;

    async fn fetch_punchlist(&self, id: i64) -> Result<Punchlist>;

    async fn fetch_project(&self, id: i64) -> Result<Project>;

    async fn fetch_templates(&self) -> Result<Vec<Template>>;

    async fn update_punchlist_status(
        &self,
        id: i64,
        status: PunchStatus,
        actor_id: i64,
    ) -> Result<Punchlist>;

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats>;

    async fn fetch_filter_options(&self) -> Result<FilterOptions>;
}
