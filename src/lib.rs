//! Arbiter client core: record stores for the list screens, the checksheet
//! completion flow, and the DTOs handed to the presentation layer.

pub use arbiter_api;

pub mod bridge;
mod completion;
mod store;

pub use completion::{CompletionSession, Progress, SessionState};
pub use store::RecordStore;

use arbiter_api::{
    Checksheet, ChecksheetCriteria, Project, ProjectCriteria, Punchlist, PunchlistCriteria,
};

pub type ChecksheetStore = RecordStore<Checksheet, ChecksheetCriteria>;
pub type PunchlistStore = RecordStore<Punchlist, PunchlistCriteria>;
pub type ProjectStore = RecordStore<Project, ProjectCriteria>;
