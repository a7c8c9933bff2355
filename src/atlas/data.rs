//! Dataset rows and their normalization from the raw payload
//!
//! The payload is loosely typed: numbers arrive as strings, fields go
//! missing, and several columns have legacy aliases. Everything is coerced
//! here so the rest of the module works on clean rows.

use serde::Serialize;
use serde_json::Value;

/// Exposure band, most exposed first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Exposure {
    High,
    MediumHigh,
    Medium,
    LowMedium,
    Low,
}

impl Exposure {
    pub const ORDER: [Exposure; 5] = [
        Exposure::High,
        Exposure::MediumHigh,
        Exposure::Medium,
        Exposure::LowMedium,
        Exposure::Low,
    ];

    /// Band for a 0-100 score
    pub fn classify(score: f64) -> Self {
        if score >= 70.0 {
            Exposure::High
        } else if score >= 50.0 {
            Exposure::MediumHigh
        } else if score >= 35.0 {
            Exposure::Medium
        } else if score >= 20.0 {
            Exposure::LowMedium
        } else {
            Exposure::Low
        }
    }

    /// Accepts the canonical labels plus a few legacy spellings
    pub fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if let Some(cat) = Self::ORDER.into_iter().find(|c| c.label() == text) {
            return Some(cat);
        }
        match text.to_lowercase().as_str() {
            "mediumhigh" | "medium_high" => Some(Exposure::MediumHigh),
            "lowmedium" | "low_medium" => Some(Exposure::LowMedium),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Exposure::High => "High",
            Exposure::MediumHigh => "Medium-High",
            Exposure::Medium => "Medium",
            Exposure::LowMedium => "Low-Medium",
            Exposure::Low => "Low",
        }
    }

    pub fn legend_label(self) -> &'static str {
        match self {
            Exposure::High => "High (70-100)",
            Exposure::MediumHigh => "Medium-High (50-69)",
            Exposure::Medium => "Medium (35-49)",
            Exposure::LowMedium => "Low-Medium (20-34)",
            Exposure::Low => "Low (0-19)",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Exposure::High => "#111111",
            Exposure::MediumHigh => "#2f3640",
            Exposure::Medium => "#596273",
            Exposure::LowMedium => "#8791a1",
            Exposure::Low => "#b8c0cd",
        }
    }

    /// Position in `ORDER`
    pub fn index(self) -> usize {
        match self {
            Exposure::High => 0,
            Exposure::MediumHigh => 1,
            Exposure::Medium => 2,
            Exposure::LowMedium => 3,
            Exposure::Low => 4,
        }
    }
}

/// Detailed work activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    /// 1-based, by value descending
    pub rank: usize,
    pub id: String,
    pub title: String,
    pub gwa: String,
    pub value: f64,
    /// Percent of total value
    pub share: f64,
    pub ai_score: f64,
    pub ai_cat: Exposure,
    pub task_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occupation {
    pub soc: String,
    pub title: String,
    pub emp: f64,
    pub mean_wage: f64,
    pub wage_bill: f64,
    pub ai_score: f64,
    pub ai_cat: Exposure,
    pub high_pct: f64,
    pub top_dwa: String,
}

/// Slice of one occupation's wage bill attributed to one activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub soc: String,
    pub dwa_id: String,
    /// Fraction (0-1) of the occupation's work
    pub dwa_share: f64,
    pub value: f64,
}

/// Value-weighted summary of one task type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTypeSummary {
    pub task_type: String,
    pub value: f64,
    pub count: usize,
    pub share: f64,
    pub avg_ai_score: f64,
}

/// Normalized payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub activities: Vec<Activity>,
    pub occupations: Vec<Occupation>,
    pub allocations: Vec<Allocation>,
    pub task_types: Vec<TaskTypeSummary>,
}

// === Loose value coercion ===

/// Numeric view of a raw field; anything unusable is 0
pub fn to_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { 0.0 } else { s.parse().unwrap_or(0.0) }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// First truthy field among `keys`
fn pick<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| row.get(*k)).find(|v| truthy(v))
}

fn pick_text(row: &Value, keys: &[&str]) -> String {
    pick(row, keys).map(to_text).unwrap_or_default()
}

fn pick_number(row: &Value, keys: &[&str]) -> f64 {
    pick(row, keys).map(to_number).unwrap_or(0.0)
}

fn rows<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Round half up, matching how the source figures were rounded
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn by_value_desc(a: f64, b: f64) -> std::cmp::Ordering {
    b.total_cmp(&a)
}

// === Normalization ===

impl Dataset {
    pub fn normalize(payload: &Value) -> Self {
        let activities = normalize_activities(rows(payload, "dwas"));
        let occupations = normalize_occupations(rows(payload, "occs"));
        let allocations = normalize_allocations(rows(payload, "soc_dwa"));
        let task_types = task_type_summaries(&activities);
        Self {
            activities,
            occupations,
            allocations,
            task_types,
        }
    }
}

fn normalize_activities(raw: &[Value]) -> Vec<Activity> {
    // Shares fall back against the raw total, dropped rows included
    let total: f64 = raw.iter().map(|r| pick_number(r, &["value"])).sum();
    let fallback_share = |value: f64| if total > 0.0 { value / total * 100.0 } else { 0.0 };

    let mut activities: Vec<Activity> = raw
        .iter()
        .map(|row| {
            let value = pick_number(row, &["value"]);
            let ai_score = pick_number(row, &["ai_score"]);
            let gwa = pick_text(row, &["gwa"]);
            let task_type = pick_text(row, &["task_type"]);
            Activity {
                rank: 0,
                id: pick_text(row, &["id"]),
                title: pick_text(row, &["title"]),
                gwa: if gwa.is_empty() { "Unspecified".to_string() } else { gwa },
                value,
                share: pick_number(row, &["share"]),
                ai_score,
                // Source labels can drift; the score decides
                ai_cat: Exposure::classify(ai_score),
                task_type: if task_type.is_empty() {
                    "unspecified".to_string()
                } else {
                    task_type
                },
            }
        })
        .filter(|a| !a.id.is_empty() && !a.title.is_empty())
        .collect();

    activities.sort_by(|a, b| by_value_desc(a.value, b.value));
    for (i, a) in activities.iter_mut().enumerate() {
        a.rank = i + 1;
        if a.share <= 0.0 {
            a.share = fallback_share(a.value);
        }
    }
    activities
}

fn normalize_occupations(raw: &[Value]) -> Vec<Occupation> {
    let mut occupations: Vec<Occupation> = raw
        .iter()
        .map(|row| {
            let soc = pick_text(row, &["soc", "code"]);
            let ai_score = pick_number(row, &["ai_score"]);
            let title = pick_text(row, &["title"]);
            Occupation {
                title: if !title.is_empty() {
                    title
                } else if !soc.is_empty() {
                    soc.clone()
                } else {
                    "Unknown Occupation".to_string()
                },
                soc,
                emp: round_half_up(pick_number(row, &["emp", "TOT_EMP"])),
                mean_wage: pick_number(row, &["mean_wage", "A_MEAN"]),
                wage_bill: pick_number(row, &["wage_bill", "wb"]),
                ai_score,
                ai_cat: Exposure::classify(ai_score),
                high_pct: pick_number(row, &["high_pct"]),
                top_dwa: pick_text(row, &["top_dwa"]),
            }
        })
        .filter(|o| !o.soc.is_empty())
        .collect();

    occupations.sort_by(|a, b| by_value_desc(a.wage_bill, b.wage_bill));
    occupations
}

fn normalize_allocations(raw: &[Value]) -> Vec<Allocation> {
    raw.iter()
        .map(|row| match row {
            Value::Array(cells) => {
                let cell = |i: usize| cells.get(i).unwrap_or(&Value::Null);
                Allocation {
                    soc: if truthy(cell(0)) { to_text(cell(0)) } else { String::new() },
                    dwa_id: if truthy(cell(1)) { to_text(cell(1)) } else { String::new() },
                    dwa_share: to_number(cell(2)),
                    value: to_number(cell(3)),
                }
            }
            _ => Allocation {
                soc: pick_text(row, &["soc", "SOC", "SOC Code"]),
                dwa_id: pick_text(row, &["dwa_id", "dwa", "DWA ID"]),
                dwa_share: pick_number(row, &["dwa_share", "share"]),
                value: pick_number(row, &["value"]),
            },
        })
        .filter(|a| !a.soc.is_empty() && !a.dwa_id.is_empty())
        .collect()
}

/// Value, count, share and value-weighted score per task type
pub fn task_type_summaries(activities: &[Activity]) -> Vec<TaskTypeSummary> {
    let total: f64 = activities.iter().map(|a| a.value).sum();
    let mut groups: Vec<(String, f64, usize, f64)> = Vec::new();

    for a in activities {
        let key = if a.task_type.is_empty() { "unspecified" } else { a.task_type.as_str() };
        match groups.iter_mut().find(|g| g.0 == key) {
            Some(g) => {
                g.1 += a.value;
                g.2 += 1;
                g.3 += a.ai_score * a.value;
            }
            None => groups.push((key.to_string(), a.value, 1, a.ai_score * a.value)),
        }
    }

    let mut summaries: Vec<TaskTypeSummary> = groups
        .into_iter()
        .map(|(task_type, value, count, weighted)| TaskTypeSummary {
            task_type,
            value,
            count,
            share: if total > 0.0 { value / total * 100.0 } else { 0.0 },
            avg_ai_score: if value > 0.0 { weighted / value } else { 0.0 },
        })
        .collect();
    summaries.sort_by(|a, b| by_value_desc(a.value, b.value));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_breakpoints() {
        assert_eq!(Exposure::classify(70.0), Exposure::High);
        assert_eq!(Exposure::classify(69.9), Exposure::MediumHigh);
        assert_eq!(Exposure::classify(50.0), Exposure::MediumHigh);
        assert_eq!(Exposure::classify(35.0), Exposure::Medium);
        assert_eq!(Exposure::classify(20.0), Exposure::LowMedium);
        assert_eq!(Exposure::classify(19.99), Exposure::Low);
        assert_eq!(Exposure::classify(-5.0), Exposure::Low);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(Exposure::parse("Medium-High"), Some(Exposure::MediumHigh));
        assert_eq!(Exposure::parse(" medium_high "), Some(Exposure::MediumHigh));
        assert_eq!(Exposure::parse("LowMedium"), Some(Exposure::LowMedium));
        assert_eq!(Exposure::parse("high"), None);
        assert_eq!(Exposure::parse(""), None);
    }

    #[test]
    fn test_to_number_coerces() {
        assert_eq!(to_number(&json!(12.5)), 12.5);
        assert_eq!(to_number(&json!(" 40 ")), 40.0);
        assert_eq!(to_number(&json!("n/a")), 0.0);
        assert_eq!(to_number(&json!(null)), 0.0);
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!([1])), 0.0);
    }

    #[test]
    fn test_activities_sorted_ranked_and_recategorized() {
        let payload = json!({
            "dwas": [
                {"id": "a", "title": "Small", "value": 100, "ai_score": 80, "ai_cat": "Low"},
                {"id": "b", "title": "Big", "value": "300", "ai_score": 10, "share": 60},
                {"id": "", "title": "No id", "value": 600},
                {"id": "c", "value": 50}
            ]
        });
        let data = Dataset::normalize(&payload);
        assert_eq!(data.activities.len(), 2);

        let big = &data.activities[0];
        assert_eq!((big.rank, big.id.as_str()), (1, "b"));
        assert_eq!(big.share, 60.0);
        assert_eq!(big.gwa, "Unspecified");
        assert_eq!(big.task_type, "unspecified");

        let small = &data.activities[1];
        assert_eq!(small.rank, 2);
        assert_eq!(small.ai_cat, Exposure::High);
        // Fallback share uses the raw total of 1050
        assert!((small.share - 100.0 / 1050.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_occupation_aliases() {
        let payload = json!({
            "occs": [
                {"code": "11-1011", "TOT_EMP": "1200.5", "A_MEAN": 99000, "wb": 5.0e9, "ai_score": 55},
                {"soc": "13-2011", "title": "Accountants", "emp": 0, "TOT_EMP": 40, "wage_bill": 9.0e9},
                {"title": "No code"}
            ]
        });
        let data = Dataset::normalize(&payload);
        assert_eq!(data.occupations.len(), 2);
        assert_eq!(data.occupations[0].title, "Accountants");
        // Zero primary falls through to the alias
        assert_eq!(data.occupations[0].emp, 40.0);

        let chief = &data.occupations[1];
        assert_eq!(chief.title, "11-1011");
        assert_eq!(chief.emp, 1201.0);
        assert_eq!(chief.mean_wage, 99000.0);
        assert_eq!(chief.ai_cat, Exposure::MediumHigh);
    }

    #[test]
    fn test_allocations_arrays_and_objects() {
        let payload = json!({
            "soc_dwa": [
                ["11-1011", "4.A.1", 0.25, 1000],
                {"SOC Code": "13-2011", "DWA ID": "4.A.2", "share": "0.5", "value": 20},
                ["", "4.A.3", 0.1, 5],
                {"soc": "15-1252"}
            ]
        });
        let data = Dataset::normalize(&payload);
        assert_eq!(data.allocations.len(), 2);
        assert_eq!(data.allocations[0].dwa_share, 0.25);
        assert_eq!(data.allocations[1].soc, "13-2011");
        assert_eq!(data.allocations[1].dwa_share, 0.5);
    }

    #[test]
    fn test_missing_arrays_are_empty() {
        let data = Dataset::normalize(&json!({"dwas": "nope"}));
        assert_eq!(data, Dataset::default());
    }

    #[test]
    fn test_task_type_summary_weighting() {
        let payload = json!({
            "dwas": [
                {"id": "a", "title": "A", "value": 100, "ai_score": 80, "task_type": "core"},
                {"id": "b", "title": "B", "value": 300, "ai_score": 40, "task_type": "core"},
                {"id": "c", "title": "C", "value": 100, "ai_score": 0}
            ]
        });
        let data = Dataset::normalize(&payload);
        assert_eq!(data.task_types.len(), 2);
        let core = &data.task_types[0];
        assert_eq!(core.task_type, "core");
        assert_eq!(core.count, 2);
        assert!((core.avg_ai_score - 50.0).abs() < 1e-9);
        assert!((core.share - 80.0).abs() < 1e-9);
        assert_eq!(data.task_types[1].task_type, "unspecified");
    }
}
