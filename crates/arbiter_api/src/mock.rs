//! In-memory stand-in for the Arbiter backend.
//!
//! Serves a fixed fixture dataset through the [`DataSource`] trait so the
//! application layer runs unchanged without a reachable backend. Tests can inject
//! save/fetch failures to exercise the error paths.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::error::{ArbiterError, Result};
use crate::filter::{apply_filters, ChecksheetCriteria, ProjectCriteria, PunchlistCriteria};
use crate::models::{
    Checksheet, Client, DashboardStats, DisciplineCode, FilterOptions, OptionItem, Project,
    PunchStatus, Punchlist, RecordPage, Scope, SoftData, Task, TaskResponsePayload, Template,
    User, Vendor,
};
use crate::source::DataSource;

pub struct MockDataSource {
    data: Mutex<MockData>,
    saves_before_failure: Mutex<Option<u32>>,
    fail_next_fetch: Mutex<bool>,
}

struct MockData {
    users: Vec<User>,
    projects: Vec<Project>,
    templates: Vec<Template>,
    checksheets: Vec<Checksheet>,
    punchlists: Vec<Punchlist>,
    vendors: Vec<Vendor>,
    scopes: Vec<Scope>,
    disciplines: Vec<DisciplineCode>,
    responses: Vec<SoftData>,
    next_soft_id: i64,
}

impl Default for MockDataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataSource {
    /// Creates a source seeded with the demo dataset.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(seed()),
            saves_before_failure: Mutex::new(None),
            fail_next_fetch: Mutex::new(false),
        }
    }

    /// After `n` more successful saves, every subsequent save fails with a
    /// transient network error. Test hook.
    pub fn fail_saves_after(&self, n: u32) {
        *self.saves_before_failure.lock().unwrap() = Some(n);
    }

    /// Makes the next fetch operation fail once with a transient network error.
    /// Test hook.
    pub fn fail_next_fetch(&self) {
        *self.fail_next_fetch.lock().unwrap() = true;
    }

    fn check_fetch(&self) -> Result<()> {
        let mut flag = self.fail_next_fetch.lock().unwrap();
        if *flag {
            *flag = false;
            return Err(ArbiterError::Network("simulated fetch failure".to_string()));
        }
        Ok(())
    }

    fn check_save(&self) -> Result<()> {
        let mut remaining = self.saves_before_failure.lock().unwrap();
        match remaining.as_mut() {
            Some(0) => Err(ArbiterError::Network("simulated save failure".to_string())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_checksheet(&self, id: i64) -> Result<Checksheet> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        data.checksheets
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ArbiterError::NotFound(format!("checksheet {id}")))
    }

    async fn fetch_tasks(&self, checksheet_id: i64) -> Result<Vec<Task>> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        let checksheet = data
            .checksheets
            .iter()
            .find(|c| c.id == checksheet_id)
            .ok_or_else(|| ArbiterError::NotFound(format!("checksheet {checksheet_id}")))?;
        let mut tasks: Vec<Task> = data
            .templates
            .iter()
            .find(|t| t.id == checksheet.template_id)
            .and_then(|t| t.tasks.clone())
            .unwrap_or_default();
        tasks.sort_by_key(|t| t.ordinal);
        Ok(tasks)
    }

    async fn fetch_responses(&self, checksheet_id: i64) -> Result<Vec<SoftData>> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        Ok(data
            .responses
            .iter()
            .filter(|r| r.checksheet_id == checksheet_id)
            .cloned()
            .collect())
    }

    async fn save_task_response(
        &self,
        checksheet_id: i64,
        payload: &TaskResponsePayload,
    ) -> Result<SoftData> {
        self.check_save()?;
        let mut data = self.data.lock().unwrap();

        // One row per outcome (slot 0) or per text-input slot; re-saving a task
        // replaces its rows for the slots being written.
        let mut rows = Vec::new();
        if let Some(code) = &payload.response {
            rows.push((0u32, code.clone()));
        }
        if let Some(inputs) = &payload.text_inputs {
            for (slot, value) in inputs {
                rows.push((*slot, value.clone()));
            }
        }
        if rows.is_empty() {
            if payload.notes.is_none() && payload.signature.is_none() && payload.photos.is_empty() {
                return Err(ArbiterError::Validation(format!(
                    "response for task {} carries nothing to save",
                    payload.task_id
                )));
            }
            // Notes-only responses keep an empty slot-0 row so the task still
            // reads as addressed after a reload.
            rows.push((0, String::new()));
        }

        let written: Vec<u32> = rows.iter().map(|(slot, _)| *slot).collect();
        data.responses.retain(|r| {
            r.checksheet_id != checksheet_id
                || r.task_id != payload.task_id
                || !written.contains(&r.number)
        });

        let mut first = None;
        for (slot, value) in rows {
            let row = SoftData {
                id: data.next_soft_id,
                sid: checksheet_id,
                uid: 1,
                checksheet_id,
                kind: "S".to_string(),
                task_id: payload.task_id,
                number: slot,
                response: value,
            };
            data.next_soft_id += 1;
            if first.is_none() {
                first = Some(row.clone());
            }
            data.responses.push(row);
        }

        debug!(checksheet_id, task_id = payload.task_id, "saved task response");
        first.ok_or_else(|| {
            ArbiterError::Validation(format!(
                "response for task {} carries no outcome or text inputs",
                payload.task_id
            ))
        })
    }

    async fn mark_checksheet_complete(
        &self,
        checksheet_id: i64,
        _actor_id: i64,
    ) -> Result<Checksheet> {
        self.check_save()?;
        let mut data = self.data.lock().unwrap();
        let checksheet = data
            .checksheets
            .iter_mut()
            .find(|c| c.id == checksheet_id)
            .ok_or_else(|| ArbiterError::NotFound(format!("checksheet {checksheet_id}")))?;
        checksheet.status = true;
        checksheet.status_date = Some(Utc::now().to_rfc3339());
        Ok(checksheet.clone())
    }

    async fn fetch_checksheets(
        &self,
        _page: u32,
        criteria: &ChecksheetCriteria,
    ) -> Result<RecordPage<Checksheet>> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        let matching = apply_filters(&data.checksheets, criteria);
        Ok(RecordPage {
            total: matching.len() as u64,
            data: matching,
        })
    }

    async fn fetch_punchlists(
        &self,
        _page: u32,
        criteria: &PunchlistCriteria,
    ) -> Result<RecordPage<Punchlist>> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        let matching = apply_filters(&data.punchlists, criteria);
        Ok(RecordPage {
            total: matching.len() as u64,
            data: matching,
        })
    }

    async fn fetch_projects(
        &self,
        _page: u32,
        criteria: &ProjectCriteria,
    ) -> Result<RecordPage<Project>> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        let matching = apply_filters(&data.projects, criteria);
        Ok(RecordPage {
            total: matching.len() as u64,
            data: matching,
        })
    }

    async fn fetch_punchlist(&self, id: i64) -> Result<Punchlist> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        data.punchlists
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ArbiterError::NotFound(format!("punchlist {id}")))
    }

    async fn fetch_project(&self, id: i64) -> Result<Project> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        data.projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ArbiterError::NotFound(format!("project {id}")))
    }

    async fn fetch_templates(&self) -> Result<Vec<Template>> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        Ok(data.templates.clone())
    }

    async fn update_punchlist_status(
        &self,
        id: i64,
        status: PunchStatus,
        actor_id: i64,
    ) -> Result<Punchlist> {
        self.check_save()?;
        let mut data = self.data.lock().unwrap();
        let punchlist = data
            .punchlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ArbiterError::NotFound(format!("punchlist {id}")))?;
        punchlist.status = status;
        if status == PunchStatus::Closed {
            punchlist.close_user_id = Some(actor_id);
            punchlist.closed_date = Some(Utc::now().date_naive());
        }
        Ok(punchlist.clone())
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        Ok(DashboardStats {
            total_projects: data.projects.len() as u64,
            active_projects: data.projects.iter().filter(|p| p.is_active).count() as u64,
            pending_checksheets: data.checksheets.iter().filter(|c| !c.status).count() as u64,
            open_punchlists: data
                .punchlists
                .iter()
                .filter(|p| p.status != PunchStatus::Closed)
                .count() as u64,
        })
    }

    async fn fetch_filter_options(&self) -> Result<FilterOptions> {
        self.check_fetch()?;
        let data = self.data.lock().unwrap();
        Ok(FilterOptions {
            projects: data
                .projects
                .iter()
                .map(|p| OptionItem {
                    id: p.id,
                    name: p.name.clone().unwrap_or_default(),
                })
                .collect(),
            templates: data
                .templates
                .iter()
                .map(|t| OptionItem {
                    id: t.id,
                    name: t.name.clone(),
                })
                .collect(),
            inspectors: data
                .users
                .iter()
                .map(|u| OptionItem {
                    id: u.id,
                    name: u.full_name(),
                })
                .collect(),
            vendors: data
                .vendors
                .iter()
                .map(|v| OptionItem {
                    id: v.id,
                    name: v.name.clone(),
                })
                .collect(),
            scopes: data
                .scopes
                .iter()
                .map(|s| OptionItem {
                    id: s.id,
                    name: s.name.clone(),
                })
                .collect(),
            disciplines: data
                .disciplines
                .iter()
                .map(|d| OptionItem {
                    id: d.id,
                    name: d.name.clone(),
                })
                .collect(),
        })
    }
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("fixture date")
}

fn user(id: i64, first: &str, last: &str, role_id: i64) -> User {
    User {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        name: format!("{first} {last}"),
        email: format!("{}.{}@arbiter.com", first.to_lowercase(), last.to_lowercase()),
        role_id,
        picture: None,
        is_active: true,
    }
}

fn task(id: i64, template_id: i64, ordinal: i32, text: &str, subtitle: bool, signature: bool) -> Task {
    Task {
        id,
        template_id,
        ordinal,
        task: text.to_string(),
        bol_subtitle: subtitle,
        bol_signature: signature,
        takes_input: text.contains("__"),
    }
}

fn seed() -> MockData {
    let users = vec![
        user(1, "John", "Smith", 1),
        user(2, "Sarah", "Johnson", 2),
    ];

    let clients = [
        Client {
            id: 1,
            name: "Metro Construction Co.".to_string(),
            logo: None,
        },
        Client {
            id: 2,
            name: "Urban Development LLC".to_string(),
            logo: None,
        },
    ];

    let projects = vec![
        Project {
            id: 1,
            client_id: 1,
            name: Some("Downtown Office Tower".to_string()),
            number: Some(2024001),
            description: Some("32-storey office tower, core and shell".to_string()),
            is_active: true,
            completion_date: None,
            client: Some(clients[0].clone()),
        },
        Project {
            id: 2,
            client_id: 2,
            name: Some("Riverside Apartments".to_string()),
            number: Some(2024002),
            description: Some("Six-building residential complex".to_string()),
            is_active: true,
            completion_date: None,
            client: Some(clients[1].clone()),
        },
        Project {
            id: 3,
            client_id: 1,
            name: Some("Harbor Bridge Retrofit".to_string()),
            number: Some(2023017),
            description: None,
            is_active: false,
            completion_date: Some(date("2023-11-30")),
            client: Some(clients[0].clone()),
        },
    ];

    let vendors = vec![
        Vendor {
            id: 1,
            name: "ABC Construction".to_string(),
            contact_person: Some("Mike Wilson".to_string()),
            email: Some("mike@abcconstruction.com".to_string()),
            phone: None,
        },
        Vendor {
            id: 2,
            name: "XYZ Contractors".to_string(),
            contact_person: Some("Lisa Brown".to_string()),
            email: Some("lisa@xyzcontractors.com".to_string()),
            phone: None,
        },
    ];

    let scopes = vec![
        Scope {
            id: 1,
            name: "Foundation".to_string(),
            description: Some("Foundation and structural work".to_string()),
        },
        Scope {
            id: 2,
            name: "Framing".to_string(),
            description: Some("Structural framing and walls".to_string()),
        },
    ];

    let disciplines = vec![
        DisciplineCode {
            id: 1,
            code: "CIV".to_string(),
            name: "Civil".to_string(),
            description: None,
        },
        DisciplineCode {
            id: 2,
            code: "STR".to_string(),
            name: "Structural".to_string(),
            description: None,
        },
    ];

    let templates = vec![
        Template {
            id: 1,
            template_number: "T-001".to_string(),
            name: "Foundation Pour".to_string(),
            descriptive_name: "Foundation concrete pour checklist".to_string(),
            scope_id: 1,
            vendor_id: 1,
            description: None,
            rev: 2,
            takes_input: true,
            tasks: Some(vec![
                task(1, 1, 1, "Excavation depth meets drawing D-102", false, false),
                task(
                    2,
                    1,
                    2,
                    "Concrete strength test result: __ MPa (minimum 25 MPa)",
                    false,
                    false,
                ),
                task(3, 1, 3, "Foundation Inspection", true, false),
                task(
                    4,
                    1,
                    4,
                    "Waterproofing membrane installed and sealed",
                    false,
                    true,
                ),
            ]),
        },
        Template {
            id: 2,
            template_number: "T-002".to_string(),
            name: "Steel Erection".to_string(),
            descriptive_name: "Structural steel erection checklist".to_string(),
            scope_id: 2,
            vendor_id: 2,
            description: None,
            rev: 1,
            takes_input: true,
            tasks: Some(vec![
                task(
                    5,
                    2,
                    1,
                    "Anchor bolt torque: __ Nm at column line __",
                    false,
                    false,
                ),
                task(6, 2, 2, "Weld visual inspection complete", false, false),
            ]),
        },
    ];

    let checksheets = vec![
        Checksheet {
            id: 1,
            created_by: Some(1),
            name: "Foundation pour - Zone A".to_string(),
            template_id: 1,
            tag_id: 101,
            project_id: 1,
            status: false,
            user_id: Some(2),
            status_date: None,
            description: None,
            notes: Some("Pour scheduled after rebar sign-off".to_string()),
            vendor_id: 1,
            duedate: Some(date("2024-01-25")),
            overdue: false,
            project: Some(projects[0].clone()),
            template: Some(templates[0].clone()),
            user: Some(users[1].clone()),
            vendor: Some(vendors[0].clone()),
        },
        Checksheet {
            id: 2,
            created_by: Some(1),
            name: "Steel erection - Level 3".to_string(),
            template_id: 2,
            tag_id: 102,
            project_id: 2,
            status: false,
            user_id: Some(2),
            status_date: None,
            description: None,
            notes: None,
            vendor_id: 2,
            duedate: Some(date("2024-01-18")),
            overdue: true,
            project: Some(projects[1].clone()),
            template: Some(templates[1].clone()),
            user: Some(users[1].clone()),
            vendor: Some(vendors[1].clone()),
        },
        Checksheet {
            id: 3,
            created_by: Some(1),
            name: "Foundation pour - Zone B".to_string(),
            template_id: 1,
            tag_id: 103,
            project_id: 1,
            status: true,
            user_id: Some(2),
            status_date: Some("2024-01-12T16:20:00Z".to_string()),
            description: None,
            notes: None,
            vendor_id: 1,
            duedate: Some(date("2024-01-10")),
            overdue: false,
            project: Some(projects[0].clone()),
            template: Some(templates[0].clone()),
            user: Some(users[1].clone()),
            vendor: Some(vendors[0].clone()),
        },
    ];

    let punchlists = vec![
        Punchlist {
            id: 1,
            sequence: Some(1),
            name: "Exposed rebar at grid B-4".to_string(),
            tag_id: Some(101),
            scope_id: 1,
            discipline_code_id: 2,
            description: Some("Cover below specified minimum".to_string()),
            notes: None,
            originator_user_id: 2,
            punch_level: "High".to_string(),
            status: PunchStatus::Open,
            close_user_id: None,
            open_date: date("2024-01-10"),
            due_date: Some(date("2024-01-27")),
            closed_date: None,
            project_id: 1,
            pl_reference: Some("PL-0001".to_string()),
            hours_exp: 6.0,
            cost: Some(500.0),
            vendor_id: 1,
            project: Some(projects[0].clone()),
            scope: Some(scopes[0].clone()),
            department: Some(disciplines[1].clone()),
            originator_user: Some(users[1].clone()),
        },
        Punchlist {
            id: 2,
            sequence: Some(2),
            name: "Door frame out of plumb".to_string(),
            tag_id: None,
            scope_id: 2,
            discipline_code_id: 1,
            description: None,
            notes: None,
            originator_user_id: 1,
            punch_level: "Medium".to_string(),
            status: PunchStatus::InProgress,
            close_user_id: None,
            open_date: date("2024-01-12"),
            due_date: Some(date("2024-01-29")),
            closed_date: None,
            project_id: 2,
            pl_reference: Some("PL-0002".to_string()),
            hours_exp: 2.0,
            cost: Some(300.0),
            vendor_id: 2,
            project: Some(projects[1].clone()),
            scope: Some(scopes[1].clone()),
            department: Some(disciplines[0].clone()),
            originator_user: Some(users[0].clone()),
        },
        Punchlist {
            id: 3,
            sequence: Some(3),
            name: "Paint touch-up, lobby ceiling".to_string(),
            tag_id: None,
            scope_id: 2,
            discipline_code_id: 1,
            description: None,
            notes: None,
            originator_user_id: 2,
            punch_level: "Low".to_string(),
            status: PunchStatus::Closed,
            close_user_id: Some(1),
            open_date: date("2024-01-05"),
            due_date: None,
            closed_date: Some(date("2024-01-15")),
            project_id: 1,
            pl_reference: None,
            hours_exp: 1.0,
            cost: None,
            vendor_id: 1,
            project: Some(projects[0].clone()),
            scope: Some(scopes[1].clone()),
            department: Some(disciplines[0].clone()),
            originator_user: Some(users[1].clone()),
        },
    ];

    // Checksheet 1 already has the plain check passed and the strength figure
    // entered; the signature task is still open.
    let responses = vec![
        SoftData {
            id: 1,
            sid: 1,
            uid: 2,
            checksheet_id: 1,
            kind: "S".to_string(),
            task_id: 1,
            number: 0,
            response: "1".to_string(),
        },
        SoftData {
            id: 2,
            sid: 1,
            uid: 2,
            checksheet_id: 1,
            kind: "S".to_string(),
            task_id: 2,
            number: 1,
            response: "28.5".to_string(),
        },
    ];

    MockData {
        users,
        projects,
        templates,
        checksheets,
        punchlists,
        vendors,
        scopes,
        disciplines,
        responses,
        next_soft_id: 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CompletionStatus;

    #[tokio::test]
    async fn seeded_listing_and_status_filter() {
        let source = MockDataSource::new();

        let all = source
            .fetch_checksheets(1, &ChecksheetCriteria::default())
            .await
            .unwrap();
        assert_eq!(all.total, 3);

        let pending = source
            .fetch_checksheets(
                1,
                &ChecksheetCriteria {
                    status: Some(CompletionStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.total, 2);
        assert!(pending.data.iter().all(|c| !c.status));
    }

    #[tokio::test]
    async fn unknown_checksheet_is_not_found() {
        let source = MockDataSource::new();
        let err = source.fetch_checksheet(99).await.unwrap_err();
        assert!(matches!(err, ArbiterError::NotFound(_)));
    }

    #[tokio::test]
    async fn tasks_come_back_in_ordinal_order() {
        let source = MockDataSource::new();
        let tasks = source.fetch_tasks(1).await.unwrap();
        let ordinals: Vec<i32> = tasks.iter().map(|t| t.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn resaving_an_outcome_replaces_the_existing_row() {
        let source = MockDataSource::new();
        let payload = TaskResponsePayload {
            task_id: 1,
            response: Some("2".to_string()),
            text_inputs: None,
            notes: None,
            photos: Vec::new(),
            signature: None,
        };

        source.save_task_response(1, &payload).await.unwrap();
        source.save_task_response(1, &payload).await.unwrap();

        let rows = source.fetch_responses(1).await.unwrap();
        let task_rows: Vec<_> = rows.iter().filter(|r| r.task_id == 1).collect();
        assert_eq!(task_rows.len(), 1);
        assert_eq!(task_rows[0].response, "2");
    }

    #[tokio::test]
    async fn save_failure_injection_counts_down() {
        let source = MockDataSource::new();
        source.fail_saves_after(1);
        let payload = TaskResponsePayload {
            task_id: 1,
            response: Some("1".to_string()),
            text_inputs: None,
            notes: None,
            photos: Vec::new(),
            signature: None,
        };

        assert!(source.save_task_response(1, &payload).await.is_ok());
        let err = source.save_task_response(1, &payload).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn closing_a_punchlist_stamps_user_and_date() {
        let source = MockDataSource::new();
        let updated = source
            .update_punchlist_status(1, PunchStatus::Closed, 1)
            .await
            .unwrap();
        assert_eq!(updated.status, PunchStatus::Closed);
        assert_eq!(updated.close_user_id, Some(1));
        assert!(updated.closed_date.is_some());
    }

    #[tokio::test]
    async fn dashboard_counts_reflect_dataset() {
        let source = MockDataSource::new();
        let stats = source.fetch_dashboard_stats().await.unwrap();
        assert_eq!(stats.total_projects, 3);
        assert_eq!(stats.active_projects, 2);
        assert_eq!(stats.pending_checksheets, 2);
        assert_eq!(stats.open_punchlists, 2);
    }
}
