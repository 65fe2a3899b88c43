//! Client-side filter engine for the list screens.
//!
//! Criteria compose by logical AND; an unset criterion matches everything. Filtering
//! is re-derived from the full in-memory page on every change rather than maintained
//! incrementally, since the client only ever holds a page of records at a time.

use chrono::NaiveDate;

use crate::models::{Checksheet, Project, PunchStatus, Punchlist};

/// Predicate a record list can be narrowed by.
pub trait Criteria<R> {
    /// Returns true when the record satisfies every criterion that is set.
    fn matches(&self, record: &R) -> bool;
}

/// Narrows `records` to the matching subset, preserving input order. Pure function of
/// its inputs.
pub fn apply_filters<R, C>(records: &[R], criteria: &C) -> Vec<R>
where
    R: Clone,
    C: Criteria<R>,
{
    records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect()
}

/// Completion-state selection for checksheet listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Completed,
    Pending,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecksheetCriteria {
    pub search: Option<String>,
    pub status: Option<CompletionStatus>,
    pub project_id: Option<i64>,
    pub template_id: Option<i64>,
    pub inspector_id: Option<i64>,
    pub vendor_id: Option<i64>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub overdue: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PunchlistCriteria {
    pub search: Option<String>,
    pub status: Option<PunchStatus>,
    pub punch_level: Option<String>,
    pub project_id: Option<i64>,
    pub scope_id: Option<i64>,
    pub discipline_id: Option<i64>,
    pub originator_id: Option<i64>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub cost_from: Option<f64>,
    pub cost_to: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectCriteria {
    pub search: Option<String>,
    pub active: Option<bool>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn opt_contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|value| contains_ci(value, needle))
}

/// Inclusive range test. A record with no date never matches an active range.
fn in_date_range(date: Option<NaiveDate>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(date) = date else {
        return false;
    };
    from.is_none_or(|lower| date >= lower) && to.is_none_or(|upper| date <= upper)
}

/// Inclusive range test. A record with no cost never matches an active range.
fn in_cost_range(cost: Option<f64>, from: Option<f64>, to: Option<f64>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(cost) = cost else {
        return false;
    };
    from.is_none_or(|lower| cost >= lower) && to.is_none_or(|upper| cost <= upper)
}

impl ChecksheetCriteria {
    fn search_matches(&self, record: &Checksheet, query: &str) -> bool {
        contains_ci(&record.name, query)
            || opt_contains_ci(record.notes.as_deref(), query)
            || opt_contains_ci(
                record.project.as_ref().and_then(|p| p.name.as_deref()),
                query,
            )
            || opt_contains_ci(record.template.as_ref().map(|t| t.name.as_str()), query)
            || record.user.as_ref().is_some_and(|u| {
                contains_ci(&u.first_name, query) || contains_ci(&u.last_name, query)
            })
    }

    /// Query parameters for the server-side variant of this filter.
    pub fn to_query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string())];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(id) = self.project_id {
            params.push(("project_id", id.to_string()));
        }
        if let Some(id) = self.template_id {
            params.push(("template_id", id.to_string()));
        }
        if let Some(id) = self.inspector_id {
            params.push(("user_id", id.to_string()));
        }
        if let Some(id) = self.vendor_id {
            params.push(("vendor_id", id.to_string()));
        }
        if let Some(date) = self.due_from {
            params.push(("due_from", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.due_to {
            params.push(("due_to", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(overdue) = self.overdue {
            params.push(("overdue", overdue.to_string()));
        }
        params
    }
}

impl Criteria<Checksheet> for ChecksheetCriteria {
    fn matches(&self, record: &Checksheet) -> bool {
        if let Some(query) = self.search.as_deref().filter(|q| !q.is_empty()) {
            if !self.search_matches(record, query) {
                return false;
            }
        }
        if let Some(status) = self.status {
            let completed = matches!(status, CompletionStatus::Completed);
            if record.status != completed {
                return false;
            }
        }
        if self.project_id.is_some_and(|id| record.project_id != id) {
            return false;
        }
        if self.template_id.is_some_and(|id| record.template_id != id) {
            return false;
        }
        if self.inspector_id.is_some_and(|id| record.user_id != Some(id)) {
            return false;
        }
        if self.vendor_id.is_some_and(|id| record.vendor_id != id) {
            return false;
        }
        if !in_date_range(record.duedate, self.due_from, self.due_to) {
            return false;
        }
        if self.overdue.is_some_and(|flag| record.overdue != flag) {
            return false;
        }
        true
    }
}

impl PunchlistCriteria {
    fn search_matches(&self, record: &Punchlist, query: &str) -> bool {
        contains_ci(&record.name, query)
            || opt_contains_ci(record.description.as_deref(), query)
            || opt_contains_ci(record.pl_reference.as_deref(), query)
            || opt_contains_ci(
                record.project.as_ref().and_then(|p| p.name.as_deref()),
                query,
            )
            || record.originator_user.as_ref().is_some_and(|u| {
                contains_ci(&u.first_name, query) || contains_ci(&u.last_name, query)
            })
    }

    /// Query parameters for the server-side variant of this filter.
    pub fn to_query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string())];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(level) = &self.punch_level {
            params.push(("punch_level", level.clone()));
        }
        if let Some(id) = self.project_id {
            params.push(("project_id", id.to_string()));
        }
        if let Some(id) = self.scope_id {
            params.push(("scope_id", id.to_string()));
        }
        if let Some(id) = self.discipline_id {
            params.push(("discipline_code_id", id.to_string()));
        }
        if let Some(id) = self.originator_id {
            params.push(("originator_user_id", id.to_string()));
        }
        if let Some(date) = self.due_from {
            params.push(("due_from", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.due_to {
            params.push(("due_to", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(cost) = self.cost_from {
            params.push(("cost_from", cost.to_string()));
        }
        if let Some(cost) = self.cost_to {
            params.push(("cost_to", cost.to_string()));
        }
        params
    }
}

impl Criteria<Punchlist> for PunchlistCriteria {
    fn matches(&self, record: &Punchlist) -> bool {
        if let Some(query) = self.search.as_deref().filter(|q| !q.is_empty()) {
            if !self.search_matches(record, query) {
                return false;
            }
        }
        if self.status.is_some_and(|status| record.status != status) {
            return false;
        }
        if self
            .punch_level
            .as_deref()
            .is_some_and(|level| record.punch_level != level)
        {
            return false;
        }
        if self.project_id.is_some_and(|id| record.project_id != id) {
            return false;
        }
        if self.scope_id.is_some_and(|id| record.scope_id != id) {
            return false;
        }
        if self
            .discipline_id
            .is_some_and(|id| record.discipline_code_id != id)
        {
            return false;
        }
        if self
            .originator_id
            .is_some_and(|id| record.originator_user_id != id)
        {
            return false;
        }
        if !in_date_range(record.due_date, self.due_from, self.due_to) {
            return false;
        }
        if !in_cost_range(record.cost, self.cost_from, self.cost_to) {
            return false;
        }
        true
    }
}

impl ProjectCriteria {
    fn search_matches(&self, record: &Project, query: &str) -> bool {
        opt_contains_ci(record.name.as_deref(), query)
            || record
                .number
                .is_some_and(|number| number.to_string().contains(query))
            || opt_contains_ci(record.client.as_ref().map(|c| c.name.as_str()), query)
    }

    /// Query parameters for the server-side variant of this filter.
    pub fn to_query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", page.to_string())];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(active) = self.active {
            let status = if active { "active" } else { "inactive" };
            params.push(("status", status.to_string()));
        }
        params
    }
}

impl Criteria<Project> for ProjectCriteria {
    fn matches(&self, record: &Project) -> bool {
        if let Some(query) = self.search.as_deref().filter(|q| !q.is_empty()) {
            if !self.search_matches(record, query) {
                return false;
            }
        }
        if self.active.is_some_and(|flag| record.is_active != flag) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, Project, PunchStatus, Punchlist, Template, User};
    use chrono::NaiveDate;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn project(id: i64, name: &str, client_name: &str, active: bool) -> Project {
        Project {
            id,
            client_id: id,
            name: Some(name.to_string()),
            number: Some(1000 + id),
            description: None,
            is_active: active,
            completion_date: None,
            client: Some(Client {
                id,
                name: client_name.to_string(),
                logo: None,
            }),
        }
    }

    fn inspector(id: i64, first: &str, last: &str) -> User {
        User {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            name: format!("{first} {last}"),
            email: format!("{first}@arbiter.test").to_lowercase(),
            role_id: 2,
            picture: None,
            is_active: true,
        }
    }

    fn checksheet(id: i64, name: &str, due: Option<&str>) -> Checksheet {
        Checksheet {
            id,
            created_by: None,
            name: name.to_string(),
            template_id: 1,
            tag_id: 1,
            project_id: 1,
            status: false,
            user_id: Some(2),
            status_date: None,
            description: None,
            notes: None,
            vendor_id: 1,
            duedate: due.map(date),
            overdue: false,
            project: Some(project(1, "Foundation Tower", "Metro Construction", true)),
            template: Some(Template {
                id: 1,
                template_number: "T-001".to_string(),
                name: "Foundation Pour".to_string(),
                descriptive_name: "Foundation concrete pour checklist".to_string(),
                scope_id: 1,
                vendor_id: 1,
                description: None,
                rev: 1,
                takes_input: true,
                tasks: None,
            }),
            user: Some(inspector(2, "Sarah", "Johnson")),
            vendor: None,
        }
    }

    fn punchlist(id: i64, name: &str, cost: Option<f64>) -> Punchlist {
        Punchlist {
            id,
            sequence: Some(id),
            name: name.to_string(),
            tag_id: None,
            scope_id: 1,
            discipline_code_id: 1,
            description: None,
            notes: None,
            originator_user_id: 2,
            punch_level: "Medium".to_string(),
            status: PunchStatus::Open,
            close_user_id: None,
            open_date: date("2024-01-10"),
            due_date: Some(date("2024-01-27")),
            closed_date: None,
            project_id: 1,
            pl_reference: Some(format!("PL-{id:04}")),
            hours_exp: 4.0,
            cost,
            vendor_id: 1,
            project: None,
            scope: None,
            department: None,
            originator_user: Some(inspector(2, "Sarah", "Johnson")),
        }
    }

    #[test]
    fn empty_criteria_is_identity() {
        let records = vec![
            checksheet(1, "Slab pour", Some("2024-01-25")),
            checksheet(2, "Steel frame", None),
        ];
        let out = apply_filters(&records, &ChecksheetCriteria::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, 1);
        assert_eq!(out[1].id, 2);
    }

    #[test]
    fn conjunction_equals_intersection_of_single_criteria() {
        let mut completed = checksheet(1, "Slab pour", None);
        completed.status = true;
        let mut other_project = checksheet(2, "Steel frame", None);
        other_project.project_id = 9;
        other_project.status = true;
        let records = vec![
            completed,
            other_project,
            checksheet(3, "Roof membrane", None),
        ];

        let both = ChecksheetCriteria {
            status: Some(CompletionStatus::Completed),
            project_id: Some(1),
            ..Default::default()
        };
        let by_status = ChecksheetCriteria {
            status: Some(CompletionStatus::Completed),
            ..Default::default()
        };
        let by_project = ChecksheetCriteria {
            project_id: Some(1),
            ..Default::default()
        };

        let conjoined: Vec<i64> = apply_filters(&records, &both).iter().map(|c| c.id).collect();
        let status_ids: Vec<i64> = apply_filters(&records, &by_status)
            .iter()
            .map(|c| c.id)
            .collect();
        let project_ids: Vec<i64> = apply_filters(&records, &by_project)
            .iter()
            .map(|c| c.id)
            .collect();
        let intersection: Vec<i64> = status_ids
            .into_iter()
            .filter(|id| project_ids.contains(id))
            .collect();

        assert_eq!(conjoined, intersection);
        assert_eq!(conjoined, vec![1]);
    }

    #[test]
    fn output_is_an_order_preserving_subsequence() {
        let records = vec![
            checksheet(3, "c", Some("2024-01-10")),
            checksheet(1, "a", Some("2024-02-10")),
            checksheet(2, "b", Some("2024-01-20")),
        ];
        let criteria = ChecksheetCriteria {
            due_to: Some(date("2024-01-31")),
            ..Default::default()
        };
        let ids: Vec<i64> = apply_filters(&records, &criteria)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn missing_due_date_never_matches_an_active_range() {
        let records = vec![
            checksheet(1, "dated", Some("2024-01-25")),
            checksheet(2, "undated", None),
        ];
        let criteria = ChecksheetCriteria {
            due_from: Some(date("2000-01-01")),
            due_to: Some(date("2099-12-31")),
            ..Default::default()
        };
        let out = apply_filters(&records, &criteria);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 1);
    }

    #[test]
    fn due_range_bounds_are_inclusive() {
        let records = vec![checksheet(1, "edge", Some("2024-01-25"))];
        let criteria = ChecksheetCriteria {
            due_from: Some(date("2024-01-25")),
            due_to: Some(date("2024-01-25")),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria).len(), 1);
    }

    #[test]
    fn search_matches_through_the_project_name() {
        let records = vec![checksheet(1, "Slab pour", None)];
        let criteria = ChecksheetCriteria {
            search: Some("foundation".to_string()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria).len(), 1);

        let criteria = ChecksheetCriteria {
            search: Some("no such thing".to_string()),
            ..Default::default()
        };
        assert!(apply_filters(&records, &criteria).is_empty());
    }

    #[test]
    fn search_matches_inspector_name_case_insensitively() {
        let records = vec![checksheet(1, "Slab pour", None)];
        let criteria = ChecksheetCriteria {
            search: Some("JOHNSON".to_string()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria).len(), 1);
    }

    #[test]
    fn overdue_flag_filters_both_ways() {
        let mut late = checksheet(1, "late", None);
        late.overdue = true;
        let records = vec![late, checksheet(2, "on time", None)];

        let criteria = ChecksheetCriteria {
            overdue: Some(true),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria)[0].id, 1);

        let criteria = ChecksheetCriteria {
            overdue: Some(false),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria)[0].id, 2);
    }

    #[test]
    fn punchlist_status_and_level_filter() {
        let mut closed = punchlist(1, "Paint touch-up", None);
        closed.status = PunchStatus::Closed;
        let mut high = punchlist(2, "Exposed rebar", None);
        high.punch_level = "High".to_string();
        let records = vec![closed, high, punchlist(3, "Door alignment", None)];

        let criteria = PunchlistCriteria {
            status: Some(PunchStatus::Open),
            punch_level: Some("High".to_string()),
            ..Default::default()
        };
        let out = apply_filters(&records, &criteria);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
    }

    #[test]
    fn missing_cost_never_matches_an_active_cost_range() {
        let records = vec![
            punchlist(1, "a", Some(500.0)),
            punchlist(2, "b", None),
            punchlist(3, "c", Some(50.0)),
        ];
        let criteria = PunchlistCriteria {
            cost_from: Some(100.0),
            ..Default::default()
        };
        let ids: Vec<i64> = apply_filters(&records, &criteria)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn punchlist_search_matches_reference_code() {
        let records = vec![punchlist(12, "Grout voids", None)];
        let criteria = PunchlistCriteria {
            search: Some("pl-0012".to_string()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria).len(), 1);
    }

    #[test]
    fn project_search_matches_number_and_client() {
        let records = vec![
            project(1, "Downtown Office Tower", "Metro Construction", true),
            project(2, "Riverside Apartments", "Urban Development", false),
        ];

        let criteria = ProjectCriteria {
            search: Some("1002".to_string()),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria)[0].id, 2);

        let criteria = ProjectCriteria {
            search: Some("metro".to_string()),
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria)[0].id, 1);

        let criteria = ProjectCriteria {
            active: Some(false),
            ..Default::default()
        };
        assert_eq!(apply_filters(&records, &criteria)[0].id, 2);
    }

    #[test]
    fn checksheet_query_params_include_only_set_criteria() {
        let criteria = ChecksheetCriteria {
            search: Some("pour".to_string()),
            overdue: Some(true),
            ..Default::default()
        };
        let params = criteria.to_query(2);
        assert!(params.contains(&("page", "2".to_string())));
        assert!(params.contains(&("search", "pour".to_string())));
        assert!(params.contains(&("overdue", "true".to_string())));
        assert!(!params.iter().any(|(key, _)| *key == "project_id"));
    }
}
