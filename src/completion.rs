//! Checksheet completion flow: collects task responses in memory, tracks
//! progress, and persists everything when the inspector signs off.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};

use arbiter_api::{
    ArbiterError, Checksheet, DataSource, Outcome, ResponseValue, Result, SoftData, Task,
    TaskKind, TaskResponse,
};

/// Lifecycle of one completion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not loaded yet.
    Loading,
    /// Loaded; responses may be recorded and persisted.
    Ready,
    /// A sign-off is in flight.
    Completing,
    /// Signed off; the session is read-only.
    Completed,
    /// The initial load failed; retry with [`CompletionSession::load`].
    LoadFailed,
}

/// Completion progress over the checksheet's answerable tasks. Section headers
/// never count toward either figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// One inspector's working state for a single checksheet. Responses live in
/// memory until persisted; nothing here writes to the backend implicitly.
pub struct CompletionSession {
    source: Arc<dyn DataSource>,
    checksheet_id: i64,
    actor_id: i64,
    state: SessionState,
    checksheet: Option<Checksheet>,
    tasks: Vec<(Task, TaskKind)>,
    responses: BTreeMap<i64, TaskResponse>,
}

impl CompletionSession {
    pub fn new(source: Arc<dyn DataSource>, checksheet_id: i64, actor_id: i64) -> Self {
        Self {
            source,
            checksheet_id,
            actor_id,
            state: SessionState::Loading,
            checksheet: None,
            tasks: Vec::new(),
            responses: BTreeMap::new(),
        }
    }

    /// Fetches the checksheet, its task list and any previously persisted
    /// responses, then rebuilds the in-memory response map. Each task's shape is
    /// resolved here, once; response handling dispatches on the stored kind.
    pub async fn load(&mut self) -> Result<()> {
        self.state = SessionState::Loading;
        let loaded = self.try_load().await;
        match &loaded {
            Ok(()) => self.state = SessionState::Ready,
            Err(err) => {
                warn!("checksheet {} load failed: {err}", self.checksheet_id);
                self.state = SessionState::LoadFailed;
            }
        }
        loaded
    }

    async fn try_load(&mut self) -> Result<()> {
        let checksheet = self.source.fetch_checksheet(self.checksheet_id).await?;
        let tasks = self.source.fetch_tasks(self.checksheet_id).await?;
        let rows = self.source.fetch_responses(self.checksheet_id).await?;

        self.tasks = tasks
            .into_iter()
            .map(|task| {
                let kind = task.kind();
                (task, kind)
            })
            .collect();
        self.responses = self.rebuild_responses(rows);
        debug!(
            "checksheet {} loaded: {} tasks, {} prior responses",
            self.checksheet_id,
            self.tasks.len(),
            self.responses.len()
        );
        self.checksheet = Some(checksheet);
        Ok(())
    }

    fn rebuild_responses(&self, rows: Vec<SoftData>) -> BTreeMap<i64, TaskResponse> {
        let mut responses: BTreeMap<i64, TaskResponse> = BTreeMap::new();
        for row in rows {
            let Some(kind) = self.kind_of(row.task_id) else {
                warn!(
                    "dropping persisted response for unknown task {}",
                    row.task_id
                );
                continue;
            };
            if kind == TaskKind::Header {
                warn!("dropping persisted response for header task {}", row.task_id);
                continue;
            }
            let entry = responses
                .entry(row.task_id)
                .or_insert_with(|| TaskResponse::new(row.task_id));
            if row.number == 0 {
                // An empty slot-0 row marks a notes-only response; the entry
                // itself is what counts the task as addressed.
                if !row.response.is_empty() {
                    match Outcome::from_code(&row.response) {
                        Some(outcome) => entry.value = Some(ResponseValue::Outcome(outcome)),
                        None => warn!(
                            "task {}: unrecognized outcome code {:?}",
                            row.task_id, row.response
                        ),
                    }
                }
            } else {
                text_inputs_mut(entry).insert(row.number, row.response);
            }
        }
        responses
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn checksheet(&self) -> Option<&Checksheet> {
        self.checksheet.as_ref()
    }

    /// Tasks in presentation order, paired with their resolved shape.
    pub fn tasks(&self) -> &[(Task, TaskKind)] {
        &self.tasks
    }

    pub fn response(&self, task_id: i64) -> Option<&TaskResponse> {
        self.responses.get(&task_id)
    }

    fn kind_of(&self, task_id: i64) -> Option<TaskKind> {
        self.tasks
            .iter()
            .find(|(task, _)| task.id == task_id)
            .map(|(_, kind)| *kind)
    }

    fn require_ready(&self) -> Result<()> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            Err(ArbiterError::Validation(
                "checksheet session is not accepting responses".to_string(),
            ))
        }
    }

    fn require_task(&self, task_id: i64) -> Result<TaskKind> {
        self.kind_of(task_id)
            .ok_or_else(|| ArbiterError::NotFound(format!("task {task_id}")))
    }

    fn entry(&mut self, task_id: i64) -> &mut TaskResponse {
        self.responses
            .entry(task_id)
            .or_insert_with(|| TaskResponse::new(task_id))
    }

    /// Records a pass/fail/not-applicable outcome for a plain check. Re-recording
    /// overwrites the outcome and leaves notes, photos and signature untouched.
    pub fn record_outcome(&mut self, task_id: i64, outcome: Outcome) -> Result<()> {
        self.require_ready()?;
        match self.require_task(task_id)? {
            TaskKind::PlainCheck => {
                self.entry(task_id).value = Some(ResponseValue::Outcome(outcome));
                Ok(())
            }
            TaskKind::Header => Err(ArbiterError::Validation(format!(
                "task {task_id} is a section header and takes no response"
            ))),
            TaskKind::TextInput { .. } => Err(ArbiterError::Validation(format!(
                "task {task_id} expects text input, not a pass/fail outcome"
            ))),
        }
    }

    /// Records the text entered for one blank of a text-input task. Slots are
    /// 1-based; an empty value clears the slot.
    pub fn record_text_input(&mut self, task_id: i64, slot: u32, value: &str) -> Result<()> {
        self.require_ready()?;
        let slots = match self.require_task(task_id)? {
            TaskKind::TextInput { slots } => slots,
            TaskKind::Header => {
                return Err(ArbiterError::Validation(format!(
                    "task {task_id} is a section header and takes no response"
                )))
            }
            TaskKind::PlainCheck => {
                return Err(ArbiterError::Validation(format!(
                    "task {task_id} is a plain check and takes no text input"
                )))
            }
        };
        if slot == 0 || slot as usize > slots {
            return Err(ArbiterError::Validation(format!(
                "task {task_id} has {slots} input slot(s); slot {slot} is out of range"
            )));
        }

        let entry = self.entry(task_id);
        let inputs = text_inputs_mut(entry);
        let trimmed = value.trim();
        if trimmed.is_empty() {
            inputs.remove(&slot);
            if inputs.is_empty() {
                entry.value = None;
            }
        } else {
            inputs.insert(slot, trimmed.to_string());
        }
        self.drop_if_empty(task_id);
        Ok(())
    }

    /// A response with nothing left in it no longer counts as addressing the
    /// task.
    fn drop_if_empty(&mut self, task_id: i64) {
        if self
            .responses
            .get(&task_id)
            .is_some_and(|response| response.is_empty())
        {
            self.responses.remove(&task_id);
        }
    }

    /// Attaches free-form notes to any non-header task, creating the response
    /// entry if needed. Empty notes clear the field.
    pub fn record_notes(&mut self, task_id: i64, notes: &str) -> Result<()> {
        self.require_ready()?;
        if self.require_task(task_id)? == TaskKind::Header {
            return Err(ArbiterError::Validation(format!(
                "task {task_id} is a section header and takes no response"
            )));
        }
        let trimmed = notes.trim();
        self.entry(task_id).notes = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.drop_if_empty(task_id);
        Ok(())
    }

    /// Stores captured signature data for a task flagged as requiring one.
    pub fn record_signature(&mut self, task_id: i64, data: String) -> Result<()> {
        self.require_ready()?;
        self.require_task(task_id)?;
        let requires_signature = self
            .tasks
            .iter()
            .find(|(task, _)| task.id == task_id)
            .is_some_and(|(task, _)| task.bol_signature);
        if !requires_signature {
            return Err(ArbiterError::Validation(format!(
                "task {task_id} does not take a signature"
            )));
        }
        self.entry(task_id).signature = Some(data);
        Ok(())
    }

    /// Attaches a photo reference to any non-header task.
    pub fn attach_photo(&mut self, task_id: i64, reference: String) -> Result<()> {
        self.require_ready()?;
        if self.require_task(task_id)? == TaskKind::Header {
            return Err(ArbiterError::Validation(format!(
                "task {task_id} is a section header and takes no response"
            )));
        }
        self.entry(task_id).photos.push(reference);
        Ok(())
    }

    /// Current progress over the answerable (non-header) tasks. A task counts as
    /// addressed once it has any response entry, even a notes-only one.
    pub fn progress(&self) -> Progress {
        let total = self
            .tasks
            .iter()
            .filter(|(_, kind)| *kind != TaskKind::Header)
            .count();
        let completed = self
            .tasks
            .iter()
            .filter(|(task, kind)| *kind != TaskKind::Header && self.responses.contains_key(&task.id))
            .count();
        let percent = if total == 0 {
            0
        } else {
            (completed * 100 / total) as u8
        };
        Progress {
            completed,
            total,
            percent,
        }
    }

    /// True once every answerable task has a response and the session can accept
    /// a sign-off. Always false for a checksheet with no answerable tasks.
    pub fn can_complete(&self) -> bool {
        if self.state != SessionState::Ready {
            return false;
        }
        let progress = self.progress();
        progress.total > 0 && progress.completed == progress.total
    }

    /// Persists one task's response immediately. No-op when the task has no
    /// in-memory entry.
    pub async fn persist_response(&mut self, task_id: i64) -> Result<Option<SoftData>> {
        self.require_ready()?;
        let Some(response) = self.responses.get(&task_id) else {
            return Ok(None);
        };
        let saved = self
            .source
            .save_task_response(self.checksheet_id, &response.to_payload())
            .await?;
        Ok(Some(saved))
    }

    /// Persists every in-memory response in task order, stopping at the first
    /// failure. Local edits are kept either way. Returns the number of
    /// responses saved.
    pub async fn persist_all(&mut self) -> Result<usize> {
        self.require_ready()?;
        let mut saved = 0;
        for (task, kind) in &self.tasks {
            if *kind == TaskKind::Header {
                continue;
            }
            let Some(response) = self.responses.get(&task.id) else {
                continue;
            };
            self.source
                .save_task_response(self.checksheet_id, &response.to_payload())
                .await?;
            saved += 1;
        }
        Ok(saved)
    }

    /// Signs the checksheet off: persists every response in task order, then
    /// marks the checksheet complete. A failed save aborts the sequence and
    /// returns the session to [`SessionState::Ready`]; responses saved before
    /// the failure stay persisted.
    pub async fn complete(&mut self) -> Result<Checksheet> {
        self.require_ready()?;
        if !self.can_complete() {
            return Err(ArbiterError::Validation(
                "checksheet has unanswered tasks".to_string(),
            ));
        }

        self.state = SessionState::Completing;
        for (task, kind) in &self.tasks {
            if *kind == TaskKind::Header {
                continue;
            }
            let Some(response) = self.responses.get(&task.id) else {
                continue;
            };
            if let Err(err) = self
                .source
                .save_task_response(self.checksheet_id, &response.to_payload())
                .await
            {
                warn!(
                    "checksheet {} sign-off aborted at task {}: {err}",
                    self.checksheet_id, task.id
                );
                self.state = SessionState::Ready;
                return Err(err);
            }
        }

        match self
            .source
            .mark_checksheet_complete(self.checksheet_id, self.actor_id)
            .await
        {
            Ok(checksheet) => {
                debug!("checksheet {} completed", self.checksheet_id);
                self.checksheet = Some(checksheet.clone());
                self.state = SessionState::Completed;
                Ok(checksheet)
            }
            Err(err) => {
                self.state = SessionState::Ready;
                Err(err)
            }
        }
    }
}

/// Returns the response's text-input map, converting the value to that shape
/// first when necessary.
fn text_inputs_mut(entry: &mut TaskResponse) -> &mut BTreeMap<u32, String> {
    if !matches!(entry.value, Some(ResponseValue::TextInputs(_))) {
        entry.value = Some(ResponseValue::TextInputs(BTreeMap::new()));
    }
    match &mut entry.value {
        Some(ResponseValue::TextInputs(inputs)) => inputs,
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::{CompletionSession, SessionState};
    use arbiter_api::{ArbiterError, DataSource, MockDataSource, Outcome, ResponseValue, Task};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    async fn loaded_session(source: Arc<MockDataSource>) -> CompletionSession {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut session = CompletionSession::new(source, 1, 2);
        session.load().await.expect("fixture checksheet loads");
        session
    }

    fn task(id: i64, ordinal: i32, text: &str, subtitle: bool) -> Task {
        Task {
            id,
            template_id: 9,
            ordinal,
            task: text.to_string(),
            bol_subtitle: subtitle,
            bol_signature: false,
            takes_input: text.contains("__"),
        }
    }

    /// Builds an unloaded session with a hand-rolled task list, for progress
    /// arithmetic tests that need exact task shapes.
    fn session_with_tasks(tasks: Vec<Task>) -> CompletionSession {
        let mut session = CompletionSession::new(Arc::new(MockDataSource::new()), 99, 2);
        session.tasks = tasks
            .into_iter()
            .map(|t| {
                let kind = t.kind();
                (t, kind)
            })
            .collect();
        session.state = SessionState::Ready;
        session
    }

    #[tokio::test]
    async fn load_rebuilds_prior_responses_by_task_shape() {
        let session = loaded_session(Arc::new(MockDataSource::new())).await;

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.tasks().len(), 4);

        let plain = session.response(1).expect("seeded outcome");
        assert_eq!(plain.value, Some(ResponseValue::Outcome(Outcome::Pass)));

        let strength = session.response(2).expect("seeded text input");
        let mut expected = BTreeMap::new();
        expected.insert(1, "28.5".to_string());
        assert_eq!(strength.value, Some(ResponseValue::TextInputs(expected)));
    }

    #[tokio::test]
    async fn headers_are_excluded_from_progress() {
        let session = loaded_session(Arc::new(MockDataSource::new())).await;

        // 4 tasks, 1 header, 2 seeded responses.
        let progress = session.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.percent, 66);
        assert!(!session.can_complete());
    }

    #[test]
    fn one_of_two_answerable_tasks_is_half_done() {
        let mut session = session_with_tasks(vec![
            task(10, 1, "Anchor bolts torqued", false),
            task(11, 2, "Structural Steel", true),
            task(12, 3, "Deflection reading: __ mm", false),
        ]);

        session.record_outcome(10, Outcome::Pass).unwrap();
        let progress = session.progress();
        assert_eq!((progress.completed, progress.total), (1, 2));
        assert_eq!(progress.percent, 50);
    }

    #[test]
    fn all_header_checksheet_can_never_complete() {
        let session = session_with_tasks(vec![task(10, 1, "General", true)]);
        let progress = session.progress();
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percent, 0);
        assert!(!session.can_complete());
    }

    #[tokio::test]
    async fn shape_mismatches_are_rejected() {
        let mut session = loaded_session(Arc::new(MockDataSource::new())).await;

        // Task 3 is the header, task 1 a plain check, task 2 a one-slot input.
        let err = session.record_outcome(3, Outcome::Pass).unwrap_err();
        assert!(matches!(err, ArbiterError::Validation(_)));

        let err = session.record_text_input(1, 1, "28.5").unwrap_err();
        assert!(matches!(err, ArbiterError::Validation(_)));

        let err = session.record_outcome(2, Outcome::Pass).unwrap_err();
        assert!(matches!(err, ArbiterError::Validation(_)));

        let err = session.record_text_input(2, 2, "30.0").unwrap_err();
        assert!(matches!(err, ArbiterError::Validation(_)));
    }

    #[tokio::test]
    async fn re_recording_an_outcome_preserves_notes() {
        let mut session = loaded_session(Arc::new(MockDataSource::new())).await;

        session.record_notes(1, "minor honeycombing, patched").unwrap();
        session.record_outcome(1, Outcome::Fail).unwrap();
        session.record_outcome(1, Outcome::Pass).unwrap();

        let response = session.response(1).unwrap();
        assert_eq!(response.value, Some(ResponseValue::Outcome(Outcome::Pass)));
        assert_eq!(response.notes.as_deref(), Some("minor honeycombing, patched"));

        let progress = session.progress();
        assert_eq!(progress.completed, 2);
    }

    #[tokio::test]
    async fn notes_only_entry_counts_toward_progress() {
        let mut session = loaded_session(Arc::new(MockDataSource::new())).await;

        session.record_notes(4, "membrane lapped 150mm").unwrap();
        let progress = session.progress();
        assert_eq!(progress.completed, 3);
        assert!(session.can_complete());
    }

    #[tokio::test]
    async fn signature_is_limited_to_signature_tasks() {
        let mut session = loaded_session(Arc::new(MockDataSource::new())).await;

        session.record_signature(4, "sig-png-bytes".to_string()).unwrap();
        let err = session
            .record_signature(1, "sig-png-bytes".to_string())
            .unwrap_err();
        assert!(matches!(err, ArbiterError::Validation(_)));
    }

    #[tokio::test]
    async fn complete_persists_and_marks_the_checksheet() {
        let source = Arc::new(MockDataSource::new());
        let mut session = loaded_session(Arc::clone(&source)).await;

        session.record_outcome(4, Outcome::Pass).unwrap();
        session.record_signature(4, "sig".to_string()).unwrap();
        assert!(session.can_complete());

        let checksheet = session.complete().await.unwrap();
        assert!(checksheet.status);
        assert_eq!(session.state(), SessionState::Completed);

        let persisted = source.fetch_responses(1).await.unwrap();
        assert!(persisted.iter().any(|r| r.task_id == 4));

        let err = session.record_outcome(1, Outcome::Fail).unwrap_err();
        assert!(matches!(err, ArbiterError::Validation(_)));
    }

    #[tokio::test]
    async fn complete_refuses_while_tasks_are_unanswered() {
        let mut session = loaded_session(Arc::new(MockDataSource::new())).await;
        let err = session.complete().await.unwrap_err();
        assert!(matches!(err, ArbiterError::Validation(_)));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn failed_save_aborts_the_sign_off_without_rollback() {
        let source = Arc::new(MockDataSource::new());
        let mut session = loaded_session(Arc::clone(&source)).await;
        session.record_outcome(4, Outcome::Pass).unwrap();

        // First save succeeds, second fails, so the sequence stops before the
        // checksheet is marked complete.
        source.fail_saves_after(1);
        let err = session.complete().await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(session.state(), SessionState::Ready);

        let checksheet = source.fetch_checksheet(1).await.unwrap();
        assert!(!checksheet.status);
    }

    #[tokio::test]
    async fn load_failure_parks_the_session() {
        let source = Arc::new(MockDataSource::new());
        source.fail_next_fetch();

        let mut session = CompletionSession::new(source.clone(), 1, 2);
        assert!(session.load().await.is_err());
        assert_eq!(session.state(), SessionState::LoadFailed);
        assert!(!session.can_complete());

        // Retry succeeds once the backend is reachable again.
        session.load().await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn persist_all_saves_every_entry_and_keeps_local_state_on_failure() {
        let source = Arc::new(MockDataSource::new());
        let mut session = loaded_session(Arc::clone(&source)).await;
        session.record_outcome(4, Outcome::Pass).unwrap();

        assert_eq!(session.persist_all().await.unwrap(), 3);

        source.fail_saves_after(0);
        assert!(session.persist_all().await.is_err());
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.response(4).is_some());
    }

    #[tokio::test]
    async fn persist_response_is_a_no_op_without_an_entry() {
        let mut session = loaded_session(Arc::new(MockDataSource::new())).await;
        assert!(session.persist_response(4).await.unwrap().is_none());

        session.record_outcome(4, Outcome::Pass).unwrap();
        let saved = session.persist_response(4).await.unwrap().unwrap();
        assert_eq!(saved.task_id, 4);
    }

    #[test]
    fn clearing_the_last_input_makes_the_task_unanswered_again() {
        let mut session = session_with_tasks(vec![task(12, 1, "Torque: __ Nm", false)]);

        session.record_text_input(12, 1, "85").unwrap();
        assert_eq!(session.progress().completed, 1);

        session.record_text_input(12, 1, "  ").unwrap();
        assert!(session.response(12).is_none());
        assert_eq!(session.progress().completed, 0);
    }
}
