//! Number and text formatting for the atlas tables

/// Digits of `n` grouped by thousands: `1234567` -> `1,234,567`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Whole number with thousands separators
pub fn fmt_int(value: f64) -> String {
    let rounded = (finite(value) + 0.5).floor();
    let grouped = group_thousands(rounded.abs() as u64);
    if rounded < 0.0 { format!("-{}", grouped) } else { grouped }
}

/// US dollars, no cents: `$1,234`
pub fn fmt_currency(value: f64) -> String {
    let rounded = finite(value).round();
    let grouped = group_thousands(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Short dollars: `$1.25T`, `$3.4B`, `$12M`, else full currency
pub fn fmt_currency_compact(value: f64) -> String {
    let v = finite(value);
    if v >= 1e12 {
        format!("${:.2}T", v / 1e12)
    } else if v >= 1e9 {
        format!("${:.1}B", v / 1e9)
    } else if v >= 1e6 {
        format!("${:.0}M", v / 1e6)
    } else {
        fmt_currency(v)
    }
}

/// Fixed-digit number, used for percents and scores
pub fn fmt_pct(value: f64, digits: usize) -> String {
    format!("{:.*}", digits, finite(value))
}

/// `snake_case` key to a title: `core_tasks` -> `Core Tasks`
pub fn task_type_label(raw: &str) -> String {
    let label = raw
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    if label.is_empty() { "Unspecified".to_string() } else { label }
}

/// Cut to `max` characters, ending with an ellipsis when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_int() {
        assert_eq!(fmt_int(0.0), "0");
        assert_eq!(fmt_int(999.0), "999");
        assert_eq!(fmt_int(1234567.4), "1,234,567");
        assert_eq!(fmt_int(2.5), "3");
        assert_eq!(fmt_int(-1500.0), "-1,500");
        assert_eq!(fmt_int(f64::NAN), "0");
    }

    #[test]
    fn test_fmt_currency() {
        assert_eq!(fmt_currency(98765.4), "$98,765");
        assert_eq!(fmt_currency(-1200.0), "-$1,200");
        assert_eq!(fmt_currency(0.0), "$0");
    }

    #[test]
    fn test_fmt_currency_compact() {
        assert_eq!(fmt_currency_compact(1.256e12), "$1.26T");
        assert_eq!(fmt_currency_compact(3.44e9), "$3.4B");
        assert_eq!(fmt_currency_compact(12.2e6), "$12M");
        assert_eq!(fmt_currency_compact(950_000.0), "$950,000");
    }

    #[test]
    fn test_fmt_pct() {
        assert_eq!(fmt_pct(25.0, 1), "25.0");
        assert_eq!(fmt_pct(3.14159, 3), "3.142");
        assert_eq!(fmt_pct(f64::INFINITY, 2), "0.00");
    }

    #[test]
    fn test_task_type_label() {
        assert_eq!(task_type_label("core_tasks"), "Core Tasks");
        assert_eq!(task_type_label("__x__y"), "X Y");
        assert_eq!(task_type_label(""), "Unspecified");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }
}
