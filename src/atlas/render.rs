//! HTML fragments and text for the atlas page
//!
//! Everything here returns strings; the web layer decides where they go.
//! Interpolated data is always passed through `escape_html`.

use super::Atlas;
use super::data::{Activity, Exposure, Occupation};
use super::format::{
    escape_html, fmt_currency, fmt_currency_compact, fmt_int, fmt_pct, task_type_label,
};
use super::query::{ActivityDetail, OccupationDetail, PageInfo};

/// Rows shown in the high/low exposure lists
pub const LIST_LIMIT: usize = 12;

/// Element id and its text content
pub type TextSlot = (&'static str, String);

pub fn header_stats(atlas: &Atlas) -> Vec<TextSlot> {
    let d = &atlas.derived;
    vec![
        ("atlas-stat-total", fmt_currency_compact(d.total_value)),
        ("atlas-stat-dwas", fmt_int(atlas.data.activities.len() as f64)),
        ("atlas-stat-occs", fmt_int(atlas.data.occupations.len() as f64)),
        ("atlas-stat-top100", format!("{}%", fmt_pct(d.top100_share, 1))),
        (
            "atlas-stat-total-sub",
            format!("{} SOC x DWA allocations", fmt_int(atlas.data.allocations.len() as f64)),
        ),
        (
            "atlas-stat-dwas-sub",
            format!("{} median activity value", fmt_currency_compact(d.median_value)),
        ),
        (
            "atlas-stat-occs-sub",
            format!("{} weighted exposure score", fmt_pct(d.weighted_ai, 1)),
        ),
        (
            "atlas-stat-top100-sub",
            "share of wage bill in the top 100 activities".to_string(),
        ),
    ]
}

pub fn narrative(atlas: &Atlas) -> Vec<TextSlot> {
    let d = &atlas.derived;
    vec![
        ("atlas-insight-total", fmt_currency_compact(d.total_value)),
        ("atlas-insight-mhhigh", format!("{}%", fmt_pct(d.medium_high_high_share, 2))),
        ("atlas-insight-low", format!("{}%", fmt_pct(d.category_share(Exposure::Low), 2))),
        ("atlas-insight-top10", format!("{}%", fmt_pct(d.top10_share, 1))),
        ("atlas-insight-top100", format!("{}%", fmt_pct(d.top100_share, 1))),
    ]
}

// === Filter pills ===

fn pill(attr: &str, value: &str, label: &str, active: bool) -> String {
    format!(
        r#"<button class="atlas-pill{}" data-{}="{}">{}</button>"#,
        if active { " active" } else { "" },
        attr,
        escape_html(value),
        escape_html(label)
    )
}

/// "All" plus one pill per exposure band; `attr` is the data attribute name
pub fn exposure_pills(attr: &str) -> String {
    std::iter::once(pill(attr, "all", "All Exposure", true))
        .chain(Exposure::ORDER.iter().map(|e| pill(attr, e.label(), e.label(), false)))
        .collect()
}

pub fn task_type_pills(atlas: &Atlas) -> String {
    let types: Vec<&str> = atlas
        .task_type_keys()
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect();
    if types.len() <= 1 {
        return r#"<button class="atlas-pill active" disabled>Single task type in current dataset</button>"#
            .to_string();
    }
    std::iter::once(pill("dwa-tasktype", "all", "All Types", true))
        .chain(types.iter().map(|t| pill("dwa-tasktype", t, &task_type_label(t), false)))
        .collect()
}

// === Tables ===

fn exposure_cell(score: f64, cat: Exposure) -> String {
    format!(
        r#"<td><span class="atlas-exposure-dot" style="background:{}"></span>{} <span class="atlas-muted">({})</span></td>"#,
        cat.color(),
        fmt_pct(score, 1),
        escape_html(cat.label())
    )
}

pub fn activity_count_text(rows: &[&Activity]) -> String {
    let value: f64 = rows.iter().map(|a| a.value).sum();
    format!(
        "Showing {} activities ({})",
        fmt_int(rows.len() as f64),
        fmt_currency_compact(value)
    )
}

pub fn occupation_count_text(count: usize) -> String {
    format!("Showing {} occupations", fmt_int(count as f64))
}

pub fn activity_rows(rows: &[&Activity]) -> String {
    rows.iter()
        .map(|a| {
            format!(
                concat!(
                    "<tr>",
                    r#"<td class="num">{rank}</td>"#,
                    r#"<td><span class="clickable" data-open-dwa="{id}">{title}</span><div class="atlas-sub">{id}</div></td>"#,
                    "<td>{gwa}</td>",
                    r#"<td class="num">{value}</td>"#,
                    r#"<td class="num">{share}%</td>"#,
                    "{exposure}",
                    r#"<td><span class="atlas-badge">{task_type}</span></td>"#,
                    "</tr>"
                ),
                rank = fmt_int(a.rank as f64),
                id = escape_html(&a.id),
                title = escape_html(&a.title),
                gwa = escape_html(&a.gwa),
                value = fmt_currency_compact(a.value),
                share = fmt_pct(a.share, 3),
                exposure = exposure_cell(a.ai_score, a.ai_cat),
                task_type = escape_html(&task_type_label(&a.task_type)),
            )
        })
        .collect()
}

pub fn occupation_rows(rows: &[&Occupation]) -> String {
    rows.iter()
        .map(|o| {
            let top = if o.top_dwa.is_empty() { "—" } else { o.top_dwa.as_str() };
            format!(
                concat!(
                    "<tr>",
                    r#"<td><span class="clickable" data-open-occ="{soc}">{title}</span><div class="atlas-sub">{soc}</div></td>"#,
                    r#"<td class="num">{emp}</td>"#,
                    r#"<td class="num">{wage}</td>"#,
                    r#"<td class="num">{bill}</td>"#,
                    "{exposure}",
                    r#"<td class="num">{high}%</td>"#,
                    "<td>{top}</td>",
                    "</tr>"
                ),
                soc = escape_html(&o.soc),
                title = escape_html(&o.title),
                emp = fmt_int(o.emp),
                wage = fmt_currency(o.mean_wage),
                bill = fmt_currency_compact(o.wage_bill),
                exposure = exposure_cell(o.ai_score, o.ai_cat),
                high = fmt_pct(o.high_pct, 2),
                top = escape_html(top),
            )
        })
        .collect()
}

pub fn pager_text(info: &PageInfo) -> String {
    format!(
        "Page {} of {} ({}-{} of {})",
        info.page,
        info.page_count,
        fmt_int(info.start as f64),
        fmt_int(info.end as f64),
        fmt_int(info.total as f64)
    )
}

/// Arrow for the active sort header, empty for the rest
pub fn sort_indicator(active: bool, ascending: bool) -> &'static str {
    match (active, ascending) {
        (false, _) => "",
        (true, true) => "↑",
        (true, false) => "↓",
    }
}

// === Lists ===

/// Top of the high-value exposed (`high`) or sheltered list
pub fn exposed_list(atlas: &Atlas, high: bool) -> String {
    let idx = if high {
        &atlas.derived.high_value_exposed
    } else {
        &atlas.derived.low_value_exposed
    };
    let rows: Vec<&Activity> = idx
        .iter()
        .take(LIST_LIMIT)
        .filter_map(|&i| atlas.data.activities.get(i))
        .collect();

    if rows.is_empty() {
        return format!(
            r#"<p class="atlas-muted">No {} activities in the current data slice.</p>"#,
            if high { "high-exposure" } else { "low-exposure" }
        );
    }

    let items: String = rows
        .iter()
        .map(|a| {
            format!(
                r#"<li><div class="label">{}</div><div class="value"><strong>{}</strong><br>{} exposure</div></li>"#,
                escape_html(&a.title),
                fmt_currency_compact(a.value),
                fmt_pct(a.ai_score, 1)
            )
        })
        .collect();
    format!(r#"<ul class="atlas-list">{}</ul>"#, items)
}

// === Details ===

fn mini(key: &str, value: &str) -> String {
    format!(
        r#"<div class="atlas-mini"><div class="k">{}</div><div class="v">{}</div></div>"#,
        key, value
    )
}

/// Modal title and body
pub fn activity_detail(atlas: &Atlas, detail: &ActivityDetail) -> (String, String) {
    let a = &detail.activity;
    let title = format!("{} ({})", a.title, a.id);

    let rows: String = detail
        .contributors
        .iter()
        .map(|c| {
            let exposure = atlas.occupation(&c.soc).map_or(0.0, |o| o.ai_score);
            format!(
                r#"<tr><td><span class="clickable" data-open-occ="{soc}">{title}</span><div class="atlas-sub">{soc}</div></td><td class="num">{value}</td><td class="num">{share}%</td><td class="num">{exposure}</td></tr>"#,
                soc = escape_html(&c.soc),
                title = escape_html(&c.title),
                value = fmt_currency_compact(c.value),
                share = fmt_pct(c.dwa_share * 100.0, 2),
                exposure = fmt_pct(exposure, 1),
            )
        })
        .collect();

    let body = format!(
        concat!(
            r#"<div class="atlas-mini-grid">{m1}{m2}{m3}</div>"#,
            r#"<p class="atlas-muted">Category: <strong>{gwa}</strong> | Task type: <strong>{task_type}</strong></p>"#,
            r#"<div class="atlas-card"><h2>Top Occupation Contributors</h2>"#,
            "<p>{count} occupations map to this activity ({mapped} allocated across mapped rows).</p>",
            r#"<div class="atlas-table-wrap"><table class="atlas-table"><thead><tr>"#,
            r#"<th>Occupation</th><th class="num">Allocation</th><th class="num">Within Occupation Share</th><th class="num">Occupation Exposure</th>"#,
            "</tr></thead><tbody>{rows}</tbody></table></div></div>"
        ),
        m1 = mini("Economy value", &fmt_currency_compact(a.value)),
        m2 = mini("Share of wage bill", &format!("{}%", fmt_pct(a.share, 3))),
        m3 = mini("Exposure", &format!("{} ({})", fmt_pct(a.ai_score, 1), a.ai_cat.label())),
        gwa = escape_html(&a.gwa),
        task_type = escape_html(&task_type_label(&a.task_type)),
        count = fmt_int(detail.mapped_count as f64),
        mapped = fmt_currency_compact(detail.total_mapped),
        rows = rows,
    );
    (title, body)
}

pub fn occupation_detail(atlas: &Atlas, detail: &OccupationDetail) -> (String, String) {
    let o = &detail.occupation;
    let title = format!("{} ({})", o.title, o.soc);

    let rows: String = detail
        .activities
        .iter()
        .map(|row| {
            let activity = atlas.activity(&row.dwa_id);
            format!(
                r#"<tr><td>{title}<div class="atlas-sub">{id}</div></td><td>{gwa}</td><td class="num">{value}</td><td class="num">{share}%</td><td class="num">{exposure}</td></tr>"#,
                title = escape_html(&row.title),
                id = escape_html(&row.dwa_id),
                gwa = escape_html(activity.map_or("—", |a| a.gwa.as_str())),
                value = fmt_currency_compact(row.value),
                share = fmt_pct(row.dwa_share * 100.0, 2),
                exposure = fmt_pct(activity.map_or(0.0, |a| a.ai_score), 1),
            )
        })
        .collect();

    let body = format!(
        concat!(
            r#"<div class="atlas-mini-grid">{m1}{m2}{m3}</div>"#,
            r#"<p class="atlas-muted">Exposure: <strong>{score} ({cat})</strong> | High-exposure share: <strong>{high}%</strong></p>"#,
            r#"<div class="atlas-card"><h2>Top Activities In Occupation</h2>"#,
            "<p>{count} activities mapped for this occupation.</p>",
            r#"<div class="atlas-table-wrap"><table class="atlas-table"><thead><tr>"#,
            r#"<th>Activity</th><th>GWA</th><th class="num">Allocation</th><th class="num">Within Occupation Share</th><th class="num">Exposure</th>"#,
            "</tr></thead><tbody>{rows}</tbody></table></div></div>"
        ),
        m1 = mini("Employment", &fmt_int(o.emp)),
        m2 = mini("Mean wage", &fmt_currency(o.mean_wage)),
        m3 = mini("Wage bill", &fmt_currency_compact(o.wage_bill)),
        score = fmt_pct(o.ai_score, 1),
        cat = o.ai_cat.label(),
        high = fmt_pct(o.high_pct, 2),
        count = fmt_int(detail.mapped_count as f64),
        rows = rows,
    );
    (title, body)
}

// === Methods ===

pub fn data_notes(atlas: &Atlas) -> String {
    let notes = [
        "Task Atlas activity-level dataset (DWA economy values, SOC x DWA allocations, SOC x DWA exposure, and SOC wage/employment aggregates)".to_string(),
        "Source data: O*NET v30.1 Detailed Work Activities and task ratings/crosswalk data".to_string(),
        "BLS OEWS May 2024 national wage and employment estimates".to_string(),
        "GPTs-are-GPTs task-level LLM exposure label set".to_string(),
        format!(
            "{} activities, {} occupations, and {} SOC x DWA allocation rows",
            fmt_int(atlas.data.activities.len() as f64),
            fmt_int(atlas.data.occupations.len() as f64),
            fmt_int(atlas.data.allocations.len() as f64)
        ),
        format!(
            "Total mapped wage bill: {} | Top 100 activity share: {}%",
            fmt_currency_compact(atlas.derived.total_value),
            fmt_pct(atlas.derived.top100_share, 2)
        ),
    ];
    let items: String = notes
        .iter()
        .map(|line| format!(r#"<li><div class="label">{}</div></li>"#, escape_html(line)))
        .collect();
    format!(r#"<ul class="atlas-list">{}</ul>"#, items)
}
