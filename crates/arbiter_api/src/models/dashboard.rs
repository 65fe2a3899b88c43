use serde::{Deserialize, Serialize};

/// One page of a server-side listing together with the total match count.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordPage<T> {
    pub data: Vec<T>,
    pub total: u64,
}

/// Aggregate counters shown on the dashboard screen.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashboardStats {
    pub total_projects: u64,
    pub active_projects: u64,
    pub pending_checksheets: u64,
    pub open_punchlists: u64,
}

/// An id/name pair used to populate filter dropdowns.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OptionItem {
    pub id: i64,
    pub name: String,
}

/// Dropdown option lists for the list-screen filter panels.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterOptions {
    pub projects: Vec<OptionItem>,
    pub templates: Vec<OptionItem>,
    pub inspectors: Vec<OptionItem>,
    pub vendors: Vec<OptionItem>,
    pub scopes: Vec<OptionItem>,
    pub disciplines: Vec<OptionItem>,
}
