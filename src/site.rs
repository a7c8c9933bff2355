//! Page chrome shared by every page: link fade, gallery lightbox, essay
//! table of contents and the footer clock.

/// Fade-out time before following an internal link
pub const NAVIGATION_DELAY_MS: i32 = 300;
/// A section counts as current once its top passes this line
pub const TOC_ACTIVE_OFFSET_PX: f64 = 120.0;
/// Distance from the page bottom that selects the last section
pub const TOC_BOTTOM_SLACK_PX: f64 = 50.0;

/// `scheme:` prefix per RFC 3986 (letter, then letters/digits/`+.-`)
fn has_scheme(href: &str) -> bool {
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
        }
        _ => false,
    }
}

/// Links that stay on this site and get the fade transition
pub fn is_internal_link(href: &str) -> bool {
    !(href.is_empty()
        || has_scheme(href)
        || href.starts_with("//")
        || href.starts_with('#')
        || href.starts_with("javascript"))
}

/// What the browser reported about a link click
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkClick {
    pub default_prevented: bool,
    pub button: i16,
    pub modifier: bool,
    pub download: bool,
    pub target: Option<String>,
}

impl LinkClick {
    /// Plain left clicks into the same tab only
    pub fn is_plain(&self) -> bool {
        !self.default_prevented
            && self.button == 0
            && !self.modifier
            && !self.download
            && self.target.as_deref().is_none_or(|t| t.is_empty() || t == "_self")
    }
}

pub fn should_intercept(href: &str, click: &LinkClick) -> bool {
    is_internal_link(href) && click.is_plain()
}

/// Gallery lightbox position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lightbox {
    len: usize,
    current: Option<usize>,
}

impl Lightbox {
    pub fn new(len: usize) -> Self {
        Self { len, current: None }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn open(&mut self, index: usize) -> Option<usize> {
        self.current = (index < self.len).then_some(index);
        self.current
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    /// Move by `direction` images, wrapping at both ends
    pub fn step(&mut self, direction: i32) -> Option<usize> {
        let index = self.current?;
        let len = self.len as i64;
        let next = (index as i64 + i64::from(direction)).rem_euclid(len);
        self.current = Some(next as usize);
        self.current
    }
}

/// Index of the table-of-contents entry to highlight
///
/// `tops` are the sections' viewport-relative tops in document order.
pub fn active_section(tops: &[f64], viewport_height: f64, scroll_y: f64, scroll_height: f64) -> Option<usize> {
    if tops.is_empty() {
        return None;
    }
    if viewport_height + scroll_y >= scroll_height - TOC_BOTTOM_SLACK_PX {
        return Some(tops.len() - 1);
    }
    Some(
        tops.iter()
            .rposition(|&top| top <= TOC_ACTIVE_OFFSET_PX)
            .unwrap_or(0),
    )
}

/// `aria-*` boolean attribute value
pub fn aria_flag(on: bool) -> &'static str {
    if on { "true" } else { "false" }
}

/// 12-hour `h:MM:SS AM` text
pub fn clock_text(hours: u32, minutes: u32, seconds: u32) -> String {
    let hours = hours % 24;
    let suffix = if hours < 12 { "AM" } else { "PM" };
    let display = match hours % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02}:{:02} {}", display, minutes % 60, seconds % 60, suffix)
}
