//! Task Atlas page

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlInputElement, Response};

use super::{by_id, closest, html_by_id, js_reason, listen, query_all, set_html, set_style, set_text, toggle_class};
use crate::atlas::query::{filter_activities, filter_occupations, paginate};
use crate::atlas::{
    ActivityQuery, ActivitySort, Atlas, AtlasError, DATA_URL, Exposure, LoadStatus, OccupationQuery,
    OccupationSort, PageInfo, render,
};

struct AtlasPage {
    atlas: Atlas,
    dwa: ActivityQuery,
    occ: OccupationQuery,
}

type Shared = Rc<RefCell<AtlasPage>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Table {
    Activities,
    Occupations,
}

impl Table {
    /// Prefix used in element ids and `data-table`
    fn kind(self) -> &'static str {
        match self {
            Table::Activities => "dwa",
            Table::Occupations => "occ",
        }
    }
}

fn set_status(status: &LoadStatus) {
    if let Some(loading) = html_by_id("atlas-loading") {
        let shown = *status == LoadStatus::Loading;
        set_style(&loading, "display", if shown { "block" } else { "none" });
    }
    if let Some(error) = html_by_id("atlas-error") {
        let failed = matches!(status, LoadStatus::Error(_));
        set_style(&error, "display", if failed { "block" } else { "none" });
        if failed {
            error.set_text_content(Some(&status.message()));
        }
    }
}

async fn fetch_text(url: &str) -> Result<String, AtlasError> {
    let window = web_sys::window().ok_or_else(|| AtlasError::Unavailable("no window".to_string()))?;
    let value = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| AtlasError::Unavailable(js_reason(&e)))?;
    let response: Response = value
        .dyn_into()
        .map_err(|e| AtlasError::Unavailable(js_reason(&e)))?;
    if !response.ok() {
        return Err(AtlasError::Fetch {
            url: url.to_string(),
            status: response.status(),
        });
    }
    let body = response.text().map_err(|e| AtlasError::Unavailable(js_reason(&e)))?;
    let text = JsFuture::from(body)
        .await
        .map_err(|e| AtlasError::Unavailable(js_reason(&e)))?;
    text.as_string()
        .ok_or_else(|| AtlasError::Parse("response body is not text".to_string()))
}

async fn load(url: &str) -> Result<Atlas, AtlasError> {
    let text = fetch_text(url).await?;
    Atlas::from_json(&text)
}

pub async fn mount(document: &Document) {
    set_status(&LoadStatus::Loading);
    bind_tabs(document);
    bind_modals(document);

    let url = document
        .body()
        .and_then(|b| b.get_attribute("data-atlas-src"))
        .unwrap_or_else(|| DATA_URL.to_string());

    let atlas = match load(&url).await {
        Ok(atlas) => atlas,
        Err(err) => {
            log::error!("Task Atlas initialization failed: {}", err);
            set_status(&LoadStatus::failed(&err));
            return;
        }
    };

    let page = Rc::new(RefCell::new(AtlasPage {
        atlas,
        dwa: ActivityQuery::default(),
        occ: OccupationQuery::default(),
    }));

    {
        let p = page.borrow();
        for (id, text) in render::header_stats(&p.atlas)
            .into_iter()
            .chain(render::narrative(&p.atlas))
        {
            set_text(id, &text);
        }
        set_html("atlas-dwa-exposure-filters", &render::exposure_pills("dwa-exposure"));
        set_html("atlas-occ-exposure-filters", &render::exposure_pills("occ-exposure"));
        set_html("atlas-dwa-tasktype-filters", &render::task_type_pills(&p.atlas));
        set_html("atlas-high-exposed-list", &render::exposed_list(&p.atlas, true));
        set_html("atlas-low-exposed-list", &render::exposed_list(&p.atlas, false));
        set_html("atlas-methods-data-notes", &render::data_notes(&p.atlas));
    }

    bind_filters(&page);
    bind_table_controls(document, &page);
    render_table(&page, Table::Activities);
    render_table(&page, Table::Occupations);
    set_status(&LoadStatus::Ready);
}

// === Controls ===

/// Mark `active` among the pills sharing its data attribute
fn activate_pill(wrap: &Element, attr: &str, active: &Element) {
    let Ok(list) = wrap.query_selector_all(&format!("[data-{}]", attr)) else {
        return;
    };
    for i in 0..list.length() {
        if let Some(el) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
            toggle_class(&el, "active", el == *active);
        }
    }
}

/// Delegated click handler on a pill group
fn bind_pills(wrap_id: &str, attr: &'static str, page: &Shared, apply: fn(&mut AtlasPage, &str) -> Table) {
    let Some(wrap) = by_id(wrap_id) else { return };
    let page = page.clone();
    let group = wrap.clone();
    listen(&wrap, "click", move |event| {
        let Some(pill) = closest(&event, &format!("[data-{}]", attr)) else {
            return;
        };
        let value = pill.get_attribute(&format!("data-{}", attr)).unwrap_or_default();
        activate_pill(&group, attr, &pill);
        let table = apply(&mut page.borrow_mut(), &value);
        render_table(&page, table);
    });
}

fn bind_filters(page: &Shared) {
    bind_pills("atlas-dwa-exposure-filters", "dwa-exposure", page, |p, value| {
        p.dwa.set_exposure(Exposure::parse(value));
        Table::Activities
    });
    bind_pills("atlas-occ-exposure-filters", "occ-exposure", page, |p, value| {
        p.occ.set_exposure(Exposure::parse(value));
        Table::Occupations
    });
    bind_pills("atlas-dwa-tasktype-filters", "dwa-tasktype", page, |p, value| {
        let task_type = (value != "all").then(|| value.to_string());
        p.dwa.set_task_type(task_type);
        Table::Activities
    });
}

fn bind_table_controls(document: &Document, page: &Shared) {
    for table in [Table::Activities, Table::Occupations] {
        let kind = table.kind();

        if let Some(input) = by_id(&format!("atlas-{}-search", kind))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            let page = page.clone();
            let field = input.clone();
            listen(&input, "input", move |_| {
                {
                    let mut p = page.borrow_mut();
                    match table {
                        Table::Activities => p.dwa.set_search(&field.value()),
                        Table::Occupations => p.occ.set_search(&field.value()),
                    }
                }
                render_table(&page, table);
            });
        }

        for header in query_all(document, &format!(r#"th[data-table="{}"][data-sort]"#, kind)) {
            let Some(key) = header.get_attribute("data-sort") else {
                continue;
            };
            let page = page.clone();
            listen(&header, "click", move |_| {
                {
                    let mut p = page.borrow_mut();
                    match table {
                        Table::Activities => {
                            if let Some(sort) = ActivitySort::from_key(&key) {
                                p.dwa.click_sort(sort);
                            }
                        }
                        Table::Occupations => {
                            if let Some(sort) = OccupationSort::from_key(&key) {
                                p.occ.click_sort(sort);
                            }
                        }
                    }
                }
                render_table(&page, table);
            });
        }

        for (suffix, step) in [("prev", -1i64), ("next", 1)] {
            let Some(button) = by_id(&format!("atlas-{}-{}", kind, suffix)) else {
                continue;
            };
            let page = page.clone();
            listen(&button, "click", move |_| {
                {
                    let mut p = page.borrow_mut();
                    let query_page = match table {
                        Table::Activities => &mut p.dwa.page,
                        Table::Occupations => &mut p.occ.page,
                    };
                    *query_page = (*query_page as i64 + step).max(1) as usize;
                }
                render_table(&page, table);
            });
        }

        // Row links open the detail modal
        if let Some(tbody) = by_id(&format!("atlas-{}-tbody", kind)) {
            let page = page.clone();
            listen(&tbody, "click", move |event| open_from_event(&page, &event));
        }
    }
}

fn open_from_event(page: &Shared, event: &web_sys::Event) {
    if let Some(id) = closest(event, "[data-open-dwa]").and_then(|el| el.get_attribute("data-open-dwa")) {
        open_activity(page, &id);
    } else if let Some(soc) = closest(event, "[data-open-occ]").and_then(|el| el.get_attribute("data-open-occ")) {
        close_modal("atlas-dwa-modal");
        open_occupation(page, &soc);
    }
}

// === Tables ===

fn update_pager(kind: &str, info: &PageInfo) {
    set_text(&format!("atlas-{}-page", kind), &render::pager_text(info));
    for (suffix, disabled) in [("prev", !info.has_prev()), ("next", !info.has_next())] {
        if let Some(button) = by_id(&format!("atlas-{}-{}", kind, suffix)) {
            if disabled {
                let _ = button.set_attribute("disabled", "");
            } else {
                let _ = button.remove_attribute("disabled");
            }
        }
    }
}

fn update_sort_header(kind: &str, sort_key: &str, ascending: bool) {
    let Some(document) = super::document() else { return };
    for header in query_all(&document, &format!(r#"th[data-table="{}"][data-sort]"#, kind)) {
        let active = header.get_attribute("data-sort").as_deref() == Some(sort_key);
        toggle_class(&header, "active-sort", active);
        if let Ok(Some(indicator)) = header.query_selector(".sort-indicator") {
            indicator.set_text_content(Some(render::sort_indicator(active, ascending)));
        }
    }
}

fn render_table(page: &Shared, table: Table) {
    let mut p = page.borrow_mut();
    let p = &mut *p;
    let kind = table.kind();

    let (rows_html, info) = match table {
        Table::Activities => {
            let rows = filter_activities(&p.atlas.data.activities, &p.dwa);
            set_text("atlas-dwa-count", &render::activity_count_text(&rows));
            update_sort_header(kind, p.dwa.sort.key(), p.dwa.ascending);
            let info = paginate(rows.len(), p.dwa.page, p.dwa.per_page);
            p.dwa.page = info.page;
            (render::activity_rows(&rows[info.range()]), info)
        }
        Table::Occupations => {
            let rows = filter_occupations(&p.atlas.data.occupations, &p.occ);
            set_text("atlas-occ-count", &render::occupation_count_text(rows.len()));
            update_sort_header(kind, p.occ.sort.key(), p.occ.ascending);
            let info = paginate(rows.len(), p.occ.page, p.occ.per_page);
            p.occ.page = info.page;
            (render::occupation_rows(&rows[info.range()]), info)
        }
    };

    set_html(&format!("atlas-{}-tbody", kind), &rows_html);
    update_pager(kind, &info);
}

// === Tabs and modals ===

fn bind_tabs(document: &Document) {
    let tabs = query_all(document, ".atlas-tab");
    for tab in &tabs {
        let Some(target) = tab.get_attribute("data-panel") else {
            continue;
        };
        let tabs = tabs.clone();
        let this = tab.clone();
        listen(tab, "click", move |_| {
            for item in &tabs {
                toggle_class(item, "active", false);
                let _ = item.set_attribute("aria-selected", "false");
            }
            if let Some(document) = super::document() {
                for panel in query_all(&document, ".atlas-panel") {
                    toggle_class(&panel, "active", false);
                }
            }
            toggle_class(&this, "active", true);
            let _ = this.set_attribute("aria-selected", "true");
            if let Some(panel) = by_id(&target) {
                toggle_class(&panel, "active", true);
            }
        });
    }
}

fn open_modal(id: &str) {
    if let Some(modal) = by_id(id) {
        toggle_class(&modal, "show", true);
        let _ = modal.set_attribute("aria-hidden", "false");
    }
}

fn close_modal(id: &str) {
    if let Some(modal) = by_id(id) {
        toggle_class(&modal, "show", false);
        let _ = modal.set_attribute("aria-hidden", "true");
    }
}

fn bind_modals(document: &Document) {
    for overlay in query_all(document, ".atlas-modal-overlay") {
        let this = overlay.clone();
        listen(&overlay, "click", move |event| {
            if super::event_element(&event).is_some_and(|el| el == this) {
                close_modal(&this.id());
            }
        });
    }
    for button in query_all(document, "[data-close-modal]") {
        let target = button.get_attribute("data-close-modal").unwrap_or_default();
        listen(&button, "click", move |_| close_modal(&target));
    }
    listen(document, "keydown", |event| {
        let escape = event
            .dyn_ref::<web_sys::KeyboardEvent>()
            .is_some_and(|e| e.key() == "Escape");
        if escape {
            close_modal("atlas-dwa-modal");
            close_modal("atlas-occ-modal");
        }
    });
}

fn open_activity(page: &Shared, id: &str) {
    let html = {
        let p = page.borrow();
        p.atlas
            .activity_detail(id)
            .map(|detail| render::activity_detail(&p.atlas, &detail))
    };
    let Some((title, body)) = html else { return };
    set_text("atlas-dwa-modal-title", &title);
    let Some(container) = by_id("atlas-dwa-modal-body") else { return };
    container.set_inner_html(&body);

    // Contributors link through to their occupation
    if container.get_attribute("data-bound").is_none() {
        let _ = container.set_attribute("data-bound", "");
        let page = page.clone();
        listen(&container, "click", move |event| open_from_event(&page, &event));
    }
    open_modal("atlas-dwa-modal");
}

fn open_occupation(page: &Shared, soc: &str) {
    let html = {
        let p = page.borrow();
        p.atlas
            .occupation_detail(soc)
            .map(|detail| render::occupation_detail(&p.atlas, &detail))
    };
    let Some((title, body)) = html else { return };
    set_text("atlas-occ-modal-title", &title);
    set_html("atlas-occ-modal-body", &body);
    open_modal("atlas-occ-modal");
}

