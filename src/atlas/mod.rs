//! Task Atlas: wage-bill exposure explorer
//!
//! One JSON payload is normalized into activities, occupations and the
//! allocations linking them, then summarized once. Tables, details and page
//! text are all computed from the loaded `Atlas`; nothing is written back.

pub mod data;
pub mod derived;
pub mod format;
pub mod query;
pub mod render;

use std::collections::HashMap;
use std::fmt;

pub use data::{Activity, Allocation, Dataset, Exposure, Occupation, TaskTypeSummary};
pub use derived::Derived;
pub use query::{ActivityQuery, ActivitySort, OccupationQuery, OccupationSort, PageInfo};

/// Default payload location relative to the page
pub const DATA_URL: &str = "data/task_tam_data.json";

#[derive(Debug, Clone, PartialEq)]
pub enum AtlasError {
    /// Non-success HTTP response
    Fetch { url: String, status: u16 },
    /// Body was not valid JSON
    Parse(String),
    /// Network or browser API failure
    Unavailable(String),
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::Fetch { url, status } => write!(f, "Failed to load {} (HTTP {})", url, status),
            AtlasError::Parse(msg) => write!(f, "Invalid data file: {}", msg),
            AtlasError::Unavailable(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for AtlasError {}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Error(String),
}

impl LoadStatus {
    pub fn failed(err: &AtlasError) -> Self {
        LoadStatus::Error(err.to_string())
    }

    /// Text for the status banner; empty once loaded
    pub fn message(&self) -> String {
        match self {
            LoadStatus::Loading => "Loading Task Atlas data...".to_string(),
            LoadStatus::Ready => String::new(),
            LoadStatus::Error(msg) if msg.is_empty() => "Task Atlas failed to load.".to_string(),
            LoadStatus::Error(msg) => format!("Task Atlas failed to load: {}", msg),
        }
    }
}

/// Loaded dataset with its summaries and lookup indices
#[derive(Debug, Clone, Default)]
pub struct Atlas {
    pub data: Dataset,
    pub derived: Derived,
    activity_index: HashMap<String, usize>,
    occupation_index: HashMap<String, usize>,
    /// Allocation indices per occupation code
    by_soc: HashMap<String, Vec<usize>>,
    /// Allocation indices per activity id
    by_dwa: HashMap<String, Vec<usize>>,
}

impl Atlas {
    pub fn from_json(text: &str) -> Result<Self, AtlasError> {
        let payload: serde_json::Value =
            serde_json::from_str(text).map_err(|e| AtlasError::Parse(e.to_string()))?;
        Ok(Self::from_value(&payload))
    }

    pub fn from_value(payload: &serde_json::Value) -> Self {
        Self::from_dataset(Dataset::normalize(payload))
    }

    pub fn from_dataset(data: Dataset) -> Self {
        let derived = Derived::compute(&data.activities);

        // Last row wins on duplicate keys
        let activity_index: HashMap<String, usize> =
            data.activities.iter().enumerate().map(|(i, a)| (a.id.clone(), i)).collect();
        let occupation_index: HashMap<String, usize> =
            data.occupations.iter().enumerate().map(|(i, o)| (o.soc.clone(), i)).collect();

        let mut by_soc: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_dwa: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, alloc) in data.allocations.iter().enumerate() {
            by_soc.entry(alloc.soc.clone()).or_default().push(i);
            by_dwa.entry(alloc.dwa_id.clone()).or_default().push(i);
        }

        log::info!(
            "Task Atlas loaded: {} activities, {} occupations, {} allocations",
            data.activities.len(),
            data.occupations.len(),
            data.allocations.len()
        );

        Self {
            data,
            derived,
            activity_index,
            occupation_index,
            by_soc,
            by_dwa,
        }
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activity_index.get(id).map(|&i| &self.data.activities[i])
    }

    pub fn occupation(&self, soc: &str) -> Option<&Occupation> {
        self.occupation_index.get(soc).map(|&i| &self.data.occupations[i])
    }

    pub fn allocations_for_activity(&self, id: &str) -> impl Iterator<Item = &Allocation> {
        self.indexed(self.by_dwa.get(id))
    }

    pub fn allocations_for_occupation(&self, soc: &str) -> impl Iterator<Item = &Allocation> {
        self.indexed(self.by_soc.get(soc))
    }

    fn indexed<'a>(&'a self, idx: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a Allocation> {
        idx.into_iter()
            .flatten()
            .filter_map(|&i| self.data.allocations.get(i))
    }

    /// Distinct task types, largest first
    pub fn task_type_keys(&self) -> Vec<&str> {
        self.data.task_types.iter().map(|t| t.task_type.as_str()).collect()
    }
}
