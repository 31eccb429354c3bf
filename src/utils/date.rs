use chrono::{NaiveDate, NaiveDateTime};

/// `2026-10-16 (Fri)`
pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d (%a)").to_string()
}

/// `2026-10-16 14:05`
pub fn format_instant(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_optional_instant(t: Option<NaiveDateTime>) -> String {
    t.map(format_instant).unwrap_or_else(|| "-".to_string())
}
