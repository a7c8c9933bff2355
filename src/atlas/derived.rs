//! Aggregate statistics over the normalized activities

use serde::Serialize;

use super::data::{Activity, Exposure};

/// Score at or above which an activity counts as exposed
pub const EXPOSED_SCORE: f64 = 50.0;
/// Score below which an activity counts as sheltered
pub const SHELTERED_SCORE: f64 = 20.0;

const RANK_BUCKETS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub value: f64,
    pub count: usize,
}

/// Named slice of the total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub value: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GwaSummary {
    pub gwa: String,
    pub value: f64,
    pub count: usize,
    pub share: f64,
    pub avg_ai: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParetoPoint {
    pub rank: usize,
    pub cumulative_share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Derived {
    pub total_value: f64,
    pub median_value: f64,
    pub top10_share: f64,
    pub top100_share: f64,
    pub top500_share: f64,
    /// Value-weighted mean exposure score
    pub weighted_ai: f64,
    /// Indexed by `Exposure::index`
    pub exposure: [CategoryTotal; 5],
    pub medium_high_high_share: f64,
    pub gwas: Vec<GwaSummary>,
    pub pareto: Vec<ParetoPoint>,
    pub rank_buckets: Vec<Bucket>,
    pub tiers: Vec<Bucket>,
    /// Indices into the activity list, value descending
    pub high_value_exposed: Vec<usize>,
    pub low_value_exposed: Vec<usize>,
}

fn percent(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total * 100.0 } else { 0.0 }
}

fn sum_values(rows: &[Activity]) -> f64 {
    rows.iter().map(|r| r.value).sum()
}

/// `rows[start..end]`, clamped to the slice
fn window(rows: &[Activity], start: usize, end: usize) -> &[Activity] {
    let end = end.min(rows.len());
    let start = start.min(end);
    &rows[start..end]
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

impl Derived {
    /// `activities` must already be sorted by value descending
    pub fn compute(activities: &[Activity]) -> Self {
        let total = sum_values(activities);
        let mut values: Vec<f64> = activities.iter().map(|a| a.value).collect();

        let mut exposure = [CategoryTotal::default(); 5];
        for a in activities {
            let slot = &mut exposure[a.ai_cat.index()];
            slot.value += a.value;
            slot.count += 1;
        }
        let med_high_high =
            exposure[Exposure::MediumHigh.index()].value + exposure[Exposure::High.index()].value;

        let weighted_ai = if total > 0.0 {
            activities.iter().map(|a| a.ai_score * a.value).sum::<f64>() / total
        } else {
            0.0
        };

        let mut cumulative = 0.0;
        let pareto = activities
            .iter()
            .enumerate()
            .map(|(i, a)| {
                cumulative += a.value;
                ParetoPoint {
                    rank: i + 1,
                    cumulative_share: percent(cumulative, total),
                }
            })
            .collect();

        let exposed_by_value = |keep: &dyn Fn(&Activity) -> bool| -> Vec<usize> {
            let mut idx: Vec<usize> = (0..activities.len()).filter(|&i| keep(&activities[i])).collect();
            idx.sort_by(|&a, &b| activities[b].value.total_cmp(&activities[a].value));
            idx
        };

        Self {
            total_value: total,
            median_value: median(&mut values),
            top10_share: percent(sum_values(window(activities, 0, 10)), total),
            top100_share: percent(sum_values(window(activities, 0, 100)), total),
            top500_share: percent(sum_values(window(activities, 0, 500)), total),
            weighted_ai,
            exposure,
            medium_high_high_share: percent(med_high_high, total),
            gwas: gwa_summaries(activities, total),
            pareto,
            rank_buckets: rank_buckets(activities, total),
            tiers: tiers(activities, total),
            high_value_exposed: exposed_by_value(&|a: &Activity| a.ai_score >= EXPOSED_SCORE),
            low_value_exposed: exposed_by_value(&|a: &Activity| a.ai_score < SHELTERED_SCORE),
        }
    }

    pub fn category(&self, cat: Exposure) -> CategoryTotal {
        self.exposure[cat.index()]
    }

    /// Percent of total value in `cat`
    pub fn category_share(&self, cat: Exposure) -> f64 {
        percent(self.category(cat).value, self.total_value)
    }
}

fn gwa_summaries(activities: &[Activity], total: f64) -> Vec<GwaSummary> {
    let mut groups: Vec<(String, f64, usize, f64)> = Vec::new();
    for a in activities {
        match groups.iter_mut().find(|g| g.0 == a.gwa) {
            Some(g) => {
                g.1 += a.value;
                g.2 += 1;
                g.3 += a.ai_score * a.value;
            }
            None => groups.push((a.gwa.clone(), a.value, 1, a.ai_score * a.value)),
        }
    }

    let mut gwas: Vec<GwaSummary> = groups
        .into_iter()
        .map(|(gwa, value, count, weighted)| GwaSummary {
            gwa,
            value,
            count,
            share: percent(value, total),
            avg_ai: if value > 0.0 { weighted / value } else { 0.0 },
        })
        .collect();
    gwas.sort_by(|a, b| b.value.total_cmp(&a.value));
    gwas
}

/// Ten equal-count rank buckets; empty trailing buckets are skipped
fn rank_buckets(activities: &[Activity], total: f64) -> Vec<Bucket> {
    let size = activities.len().div_ceil(RANK_BUCKETS);
    (0..RANK_BUCKETS)
        .filter_map(|i| {
            let start = i * size;
            let end = ((i + 1) * size).min(activities.len());
            if start >= end {
                return None;
            }
            let value = sum_values(&activities[start..end]);
            Some(Bucket {
                label: format!("{}-{}", start + 1, end),
                value,
                share: percent(value, total),
            })
        })
        .collect()
}

fn tiers(activities: &[Activity], total: f64) -> Vec<Bucket> {
    let n = activities.len();
    let tail_label = if n > 500 { format!("501-{}", n) } else { "501+".to_string() };
    [
        ("Top 10".to_string(), window(activities, 0, 10)),
        ("11-50".to_string(), window(activities, 10, 50)),
        ("51-100".to_string(), window(activities, 50, 100)),
        ("101-500".to_string(), window(activities, 100, 500)),
        (tail_label, window(activities, 500, n)),
    ]
    .into_iter()
    .map(|(label, rows)| {
        let value = sum_values(rows);
        Bucket {
            label,
            value,
            share: percent(value, total),
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::data::Dataset;
    use serde_json::json;

    fn activities(rows: serde_json::Value) -> Vec<Activity> {
        Dataset::normalize(&json!({ "dwas": rows })).activities
    }

    #[test]
    fn test_two_row_exposure_share() {
        let rows = activities(json!([
            {"id": "a", "title": "A", "value": 100, "ai_score": 80},
            {"id": "b", "title": "B", "value": 300, "ai_score": 10}
        ]));
        let derived = Derived::compute(&rows);

        let a = rows.iter().find(|r| r.id == "a").unwrap();
        let b = rows.iter().find(|r| r.id == "b").unwrap();
        assert_eq!(a.ai_cat, Exposure::High);
        assert_eq!(b.ai_cat, Exposure::Low);
        assert!((derived.category_share(Exposure::High) - 25.0).abs() < 1e-9);
        assert!((derived.medium_high_high_share - 25.0).abs() < 1e-9);
        assert!((derived.weighted_ai - 27.5).abs() < 1e-9);
        assert_eq!(derived.median_value, 200.0);
        assert_eq!(derived.high_value_exposed, vec![1]);
        assert_eq!(derived.low_value_exposed, vec![0]);
    }

    #[test]
    fn test_empty_dataset_is_all_zero() {
        let derived = Derived::compute(&[]);
        assert_eq!(derived.total_value, 0.0);
        assert_eq!(derived.median_value, 0.0);
        assert!(derived.pareto.is_empty());
        assert!(derived.rank_buckets.is_empty());
        assert_eq!(derived.tiers.len(), 5);
        assert!(derived.tiers.iter().all(|t| t.share == 0.0));
    }

    #[test]
    fn test_pareto_and_buckets() {
        let rows: Vec<serde_json::Value> = (1..=25)
            .map(|i| json!({"id": format!("d{}", i), "title": "t", "value": i, "gwa": if i % 2 == 0 { "Even" } else { "Odd" }}))
            .collect();
        let rows = activities(json!(rows));
        let derived = Derived::compute(&rows);

        let last = derived.pareto.last().unwrap();
        assert_eq!(last.rank, 25);
        assert!((last.cumulative_share - 100.0).abs() < 1e-9);
        assert!(derived.pareto.windows(2).all(|w| w[0].cumulative_share <= w[1].cumulative_share));

        // 25 rows in buckets of 3: nine buckets, last one short
        assert_eq!(derived.rank_buckets.len(), 9);
        assert_eq!(derived.rank_buckets[0].label, "1-3");
        assert_eq!(derived.rank_buckets[8].label, "25-25");

        assert_eq!(derived.gwas[0].gwa, "Odd");
        assert_eq!(derived.gwas[0].count, 13);
        assert_eq!(derived.tiers[4].label, "501+");
        // 25+24+...+16 over 325
        assert!((derived.top10_share - 205.0 / 325.0 * 100.0).abs() < 1e-9);
    }
}
