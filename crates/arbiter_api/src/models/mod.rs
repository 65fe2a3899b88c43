mod checksheet;
mod dashboard;
mod project;
mod punchlist;
mod response;
mod template;
mod user;

pub use checksheet::{Checksheet, Vendor};
pub use dashboard::{DashboardStats, FilterOptions, OptionItem, RecordPage};
pub use project::{Client, Project};
pub use punchlist::{DisciplineCode, PunchStatus, Punchlist, Scope};
pub use response::{Outcome, ResponseValue, SoftData, TaskResponse, TaskResponsePayload};
pub use template::{Task, TaskKind, Template};
pub use user::User;

/// Identifies a record inside an in-memory list so a confirmed update can
/// replace the stale snapshot.
pub trait Record {
    fn record_id(&self) -> i64;
}
