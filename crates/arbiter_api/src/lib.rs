//! Typed Arbiter construction-management API client crate used by the app layer.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod mock;
pub mod models;
pub mod source;

pub use client::ArbiterClient;
pub use config::ArbiterConfig;
pub use error::{ArbiterError, Result};
pub use filter::{
    apply_filters, ChecksheetCriteria, CompletionStatus, Criteria, ProjectCriteria,
    PunchlistCriteria,
};
pub use mock::MockDataSource;
pub use models::{
    Checksheet, Client, DashboardStats, DisciplineCode, FilterOptions, OptionItem, Outcome,
    Project, PunchStatus, Punchlist, Record, RecordPage, ResponseValue, Scope, SoftData, Task,
    TaskKind, TaskResponse, TaskResponsePayload, Template, User, Vendor,
};
pub use source::DataSource;
