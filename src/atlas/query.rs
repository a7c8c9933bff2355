//! Table filtering, sorting, pagination and the detail drill-downs

use std::cmp::Ordering;

use super::Atlas;
use super::data::{Activity, Exposure, Occupation};

/// Rows per table page
pub const PAGE_SIZE: usize = 25;
/// Occupations listed in an activity's detail view
pub const ACTIVITY_DETAIL_LIMIT: usize = 30;
/// Activities listed in an occupation's detail view
pub const OCCUPATION_DETAIL_LIMIT: usize = 40;

/// A sortable table column
pub trait SortColumn: Copy + PartialEq {
    /// Text columns sort A-Z first, numeric ones largest first
    fn is_text(self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySort {
    Rank,
    Title,
    Gwa,
    Value,
    Share,
    AiScore,
    TaskType,
}

impl ActivitySort {
    /// Column key as used in `data-sort` attributes
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "rank" => Some(Self::Rank),
            "title" => Some(Self::Title),
            "gwa" => Some(Self::Gwa),
            "value" => Some(Self::Value),
            "share" => Some(Self::Share),
            "ai_score" => Some(Self::AiScore),
            "task_type" => Some(Self::TaskType),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Title => "title",
            Self::Gwa => "gwa",
            Self::Value => "value",
            Self::Share => "share",
            Self::AiScore => "ai_score",
            Self::TaskType => "task_type",
        }
    }

    fn cell(self, a: &Activity) -> Cell<'_> {
        match self {
            Self::Rank => Cell::Num(a.rank as f64),
            Self::Title => Cell::Text(&a.title),
            Self::Gwa => Cell::Text(&a.gwa),
            Self::Value => Cell::Num(a.value),
            Self::Share => Cell::Num(a.share),
            Self::AiScore => Cell::Num(a.ai_score),
            Self::TaskType => Cell::Text(&a.task_type),
        }
    }
}

impl SortColumn for ActivitySort {
    fn is_text(self) -> bool {
        matches!(self, Self::Title | Self::Gwa | Self::TaskType)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupationSort {
    Title,
    Soc,
    Emp,
    MeanWage,
    WageBill,
    AiScore,
    HighPct,
    TopDwa,
}

impl OccupationSort {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "title" => Some(Self::Title),
            "soc" => Some(Self::Soc),
            "emp" => Some(Self::Emp),
            "mean_wage" => Some(Self::MeanWage),
            "wage_bill" => Some(Self::WageBill),
            "ai_score" => Some(Self::AiScore),
            "high_pct" => Some(Self::HighPct),
            "top_dwa" => Some(Self::TopDwa),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Soc => "soc",
            Self::Emp => "emp",
            Self::MeanWage => "mean_wage",
            Self::WageBill => "wage_bill",
            Self::AiScore => "ai_score",
            Self::HighPct => "high_pct",
            Self::TopDwa => "top_dwa",
        }
    }

    fn cell(self, o: &Occupation) -> Cell<'_> {
        match self {
            Self::Title => Cell::Text(&o.title),
            Self::Soc => Cell::Text(&o.soc),
            Self::Emp => Cell::Num(o.emp),
            Self::MeanWage => Cell::Num(o.mean_wage),
            Self::WageBill => Cell::Num(o.wage_bill),
            Self::AiScore => Cell::Num(o.ai_score),
            Self::HighPct => Cell::Num(o.high_pct),
            Self::TopDwa => Cell::Text(&o.top_dwa),
        }
    }
}

impl SortColumn for OccupationSort {
    fn is_text(self) -> bool {
        matches!(self, Self::Title | Self::Soc | Self::TopDwa)
    }
}

enum Cell<'a> {
    Text(&'a str),
    Num(f64),
}

fn compare_cells(a: Cell<'_>, b: Cell<'_>) -> Ordering {
    match (a, b) {
        (Cell::Text(x), Cell::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Cell::Num(x), Cell::Num(y)) => x.total_cmp(&y),
        _ => Ordering::Equal,
    }
}

/// Filter and sort state of one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery<K: SortColumn> {
    /// Trimmed and lowercased
    search: String,
    pub exposure: Option<Exposure>,
    /// Activities only
    pub task_type: Option<String>,
    pub sort: K,
    pub ascending: bool,
    /// 1-based; clamped by `paginate`
    pub page: usize,
    pub per_page: usize,
}

impl<K: SortColumn> TableQuery<K> {
    pub fn new(sort: K, ascending: bool) -> Self {
        Self {
            search: String::new(),
            exposure: None,
            task_type: None,
            sort,
            ascending,
            page: 1,
            per_page: PAGE_SIZE,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, raw: &str) {
        self.search = raw.trim().to_lowercase();
        self.page = 1;
    }

    pub fn set_exposure(&mut self, exposure: Option<Exposure>) {
        self.exposure = exposure;
        self.page = 1;
    }

    pub fn set_task_type(&mut self, task_type: Option<String>) {
        self.task_type = task_type.filter(|t| !t.is_empty());
        self.page = 1;
    }

    /// Header click: same column flips, a new column starts at its default
    pub fn click_sort(&mut self, key: K) {
        if self.sort == key {
            self.ascending = !self.ascending;
        } else {
            self.sort = key;
            self.ascending = key.is_text();
        }
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    fn matches_search(&self, haystack: &[&str]) -> bool {
        self.search.is_empty() || haystack.join(" ").to_lowercase().contains(&self.search)
    }

    fn order(&self, ord: Ordering) -> Ordering {
        if self.ascending { ord } else { ord.reverse() }
    }
}

impl Default for TableQuery<ActivitySort> {
    fn default() -> Self {
        Self::new(ActivitySort::Value, false)
    }
}

impl Default for TableQuery<OccupationSort> {
    fn default() -> Self {
        Self::new(OccupationSort::WageBill, false)
    }
}

pub type ActivityQuery = TableQuery<ActivitySort>;
pub type OccupationQuery = TableQuery<OccupationSort>;

/// Matching activities in display order
pub fn filter_activities<'a>(rows: &'a [Activity], query: &ActivityQuery) -> Vec<&'a Activity> {
    let mut out: Vec<&Activity> = rows
        .iter()
        .filter(|a| query.exposure.is_none_or(|e| a.ai_cat == e))
        .filter(|a| query.task_type.as_deref().is_none_or(|t| a.task_type == t))
        .filter(|a| query.matches_search(&[a.title.as_str(), a.gwa.as_str(), a.id.as_str()]))
        .collect();
    out.sort_by(|a, b| query.order(compare_cells(query.sort.cell(a), query.sort.cell(b))));
    out
}

pub fn filter_occupations<'a>(rows: &'a [Occupation], query: &OccupationQuery) -> Vec<&'a Occupation> {
    let mut out: Vec<&Occupation> = rows
        .iter()
        .filter(|o| query.exposure.is_none_or(|e| o.ai_cat == e))
        .filter(|o| query.matches_search(&[o.title.as_str(), o.soc.as_str(), o.top_dwa.as_str()]))
        .collect();
    out.sort_by(|a, b| query.order(compare_cells(query.sort.cell(a), query.sort.cell(b))));
    out
}

/// One page of a filtered table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: usize,
    pub page_count: usize,
    /// 1-based first row shown, 0 when empty
    pub start: usize,
    /// 1-based last row shown, 0 when empty
    pub end: usize,
    pub total: usize,
}

impl PageInfo {
    /// Slice range into the filtered rows
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start.saturating_sub(1)..self.end
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

pub fn paginate(total: usize, page: usize, per_page: usize) -> PageInfo {
    let per_page = per_page.max(1);
    let page_count = total.div_ceil(per_page).max(1);
    let page = page.clamp(1, page_count);
    if total == 0 {
        return PageInfo {
            page,
            page_count,
            start: 0,
            end: 0,
            total,
        };
    }
    PageInfo {
        page,
        page_count,
        start: (page - 1) * per_page + 1,
        end: (page * per_page).min(total),
        total,
    }
}

// === Detail views ===

/// An occupation's slice of one activity
#[derive(Debug, Clone, PartialEq)]
pub struct Contributor {
    pub soc: String,
    pub title: String,
    pub dwa_share: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityDetail {
    pub activity: Activity,
    pub contributors: Vec<Contributor>,
    /// Sum over every mapped occupation, not just the listed ones
    pub total_mapped: f64,
    pub mapped_count: usize,
}

/// One activity inside an occupation
#[derive(Debug, Clone, PartialEq)]
pub struct OccupationActivity {
    pub dwa_id: String,
    pub title: String,
    pub dwa_share: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupationDetail {
    pub occupation: Occupation,
    pub activities: Vec<OccupationActivity>,
    pub total_mapped: f64,
    pub mapped_count: usize,
}

impl Atlas {
    pub fn activity_detail(&self, id: &str) -> Option<ActivityDetail> {
        let activity = self.activity(id)?.clone();
        let mut contributors: Vec<Contributor> = self
            .allocations_for_activity(id)
            .map(|alloc| Contributor {
                title: self
                    .occupation(&alloc.soc)
                    .map(|o| o.title.clone())
                    .unwrap_or_else(|| alloc.soc.clone()),
                soc: alloc.soc.clone(),
                dwa_share: alloc.dwa_share,
                value: alloc.value,
            })
            .collect();
        contributors.sort_by(|a, b| b.value.total_cmp(&a.value));

        let total_mapped = contributors.iter().map(|c| c.value).sum();
        let mapped_count = contributors.len();
        contributors.truncate(ACTIVITY_DETAIL_LIMIT);
        Some(ActivityDetail {
            activity,
            contributors,
            total_mapped,
            mapped_count,
        })
    }

    pub fn occupation_detail(&self, soc: &str) -> Option<OccupationDetail> {
        let occupation = self.occupation(soc)?.clone();
        let mut activities: Vec<OccupationActivity> = self
            .allocations_for_occupation(soc)
            .map(|alloc| OccupationActivity {
                title: self
                    .activity(&alloc.dwa_id)
                    .map(|a| a.title.clone())
                    .unwrap_or_else(|| alloc.dwa_id.clone()),
                dwa_id: alloc.dwa_id.clone(),
                dwa_share: alloc.dwa_share,
                value: alloc.value,
            })
            .collect();
        activities.sort_by(|a, b| b.value.total_cmp(&a.value));

        let total_mapped = activities.iter().map(|a| a.value).sum();
        let mapped_count = activities.len();
        activities.truncate(OCCUPATION_DETAIL_LIMIT);
        Some(OccupationDetail {
            occupation,
            activities,
            total_mapped,
            mapped_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn atlas() -> Atlas {
        Atlas::from_value(&json!({
            "dwas": [
                {"id": "d1", "title": "Analyze data", "gwa": "Processing", "value": 500, "ai_score": 75, "task_type": "core"},
                {"id": "d2", "title": "assist customers", "gwa": "Interacting", "value": 300, "ai_score": 40, "task_type": "support"},
                {"id": "d3", "title": "Build models", "gwa": "Processing", "value": 200, "ai_score": 10, "task_type": "core"}
            ],
            "occs": [
                {"soc": "15-2051", "title": "Data Scientists", "wage_bill": 900, "ai_score": 72, "top_dwa": "Analyze data"},
                {"soc": "43-4051", "title": "Customer Service Reps", "wage_bill": 400, "ai_score": 30}
            ],
            "soc_dwa": [
                ["15-2051", "d1", 0.6, 400],
                ["43-4051", "d1", 0.1, 100],
                ["15-2051", "d3", 0.4, 200],
                ["99-9999", "d2", 1.0, 300]
            ]
        }))
    }

    #[test]
    fn test_click_sort_toggles_and_defaults() {
        let mut q = ActivityQuery::default();
        assert_eq!(q.sort, ActivitySort::Value);
        assert!(!q.ascending);
        q.click_sort(ActivitySort::Value);
        assert!(q.ascending);
        q.click_sort(ActivitySort::Rank);
        assert_eq!(q.sort, ActivitySort::Rank);
        assert!(!q.ascending);
        q.click_sort(ActivitySort::Title);
        assert!(q.ascending);
        q.click_sort(ActivitySort::Title);
        assert!(!q.ascending);

        let mut occ = OccupationQuery::default();
        occ.click_sort(OccupationSort::Soc);
        assert!(occ.ascending);
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let atlas = atlas();
        let mut q = ActivityQuery::default();
        q.click_sort(ActivitySort::Title);
        let titles: Vec<&str> = filter_activities(&atlas.data.activities, &q)
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Analyze data", "assist customers", "Build models"]);
    }

    #[test]
    fn test_search_and_filters() {
        let atlas = atlas();
        let mut q = ActivityQuery::default();
        q.set_search("  PROCESSING ");
        assert_eq!(q.search(), "processing");
        let ids: Vec<&str> = filter_activities(&atlas.data.activities, &q)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["d1", "d3"]);

        q.set_exposure(Some(Exposure::Low));
        assert_eq!(filter_activities(&atlas.data.activities, &q).len(), 1);

        let mut q = ActivityQuery::default();
        q.set_task_type(Some("support".to_string()));
        assert_eq!(filter_activities(&atlas.data.activities, &q)[0].id, "d2");

        let mut occ = OccupationQuery::default();
        occ.set_search("analyze");
        let rows = filter_occupations(&atlas.data.occupations, &occ);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].soc, "15-2051");
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut q = ActivityQuery::default();
        q.set_page(4);
        q.set_search("x");
        assert_eq!(q.page, 1);
    }

    #[test]
    fn test_paginate() {
        let p = paginate(0, 3, 25);
        assert_eq!((p.page, p.page_count, p.start, p.end), (1, 1, 0, 0));
        assert!(p.range().is_empty());

        let p = paginate(60, 3, 25);
        assert_eq!((p.page, p.page_count, p.start, p.end), (3, 3, 51, 60));
        assert_eq!(p.range(), 50..60);
        assert!(p.has_prev() && !p.has_next());

        let p = paginate(60, 9, 25);
        assert_eq!(p.page, 3);
        let p = paginate(60, 0, 25);
        assert_eq!((p.page, p.start, p.end), (1, 1, 25));
    }

    #[test]
    fn test_activity_detail() {
        let atlas = atlas();
        let detail = atlas.activity_detail("d1").unwrap();
        assert_eq!(detail.mapped_count, 2);
        assert_eq!(detail.total_mapped, 500.0);
        assert_eq!(detail.contributors[0].title, "Data Scientists");
        assert_eq!(detail.contributors[1].soc, "43-4051");

        // Unknown occupation falls back to its code
        let detail = atlas.activity_detail("d2").unwrap();
        assert_eq!(detail.contributors[0].title, "99-9999");
        assert!(atlas.activity_detail("nope").is_none());
    }

    #[test]
    fn test_occupation_detail() {
        let atlas = atlas();
        let detail = atlas.occupation_detail("15-2051").unwrap();
        let ids: Vec<&str> = detail.activities.iter().map(|a| a.dwa_id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d3"]);
        assert_eq!(detail.activities[1].title, "Build models");
        assert_eq!(detail.total_mapped, 600.0);
    }
}
