//! Cell rendering helpers shared by the source resolvers

use chrono::NaiveDate;

/// `MM/dd/yyyy`, used by every date column except the medical lists
pub fn display_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// `M/d/yyyy` without padding, used inside medical list entries
pub fn short_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

pub fn opt_date(date: Option<NaiveDate>) -> String {
    date.map(display_date).unwrap_or_default()
}

/// Whole numbers render without a fractional part
pub fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub fn opt_number(value: Option<f64>) -> String {
    value.map(display_number).unwrap_or_default()
}

pub fn opt_text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// Reads a date back from a rendered cell (`MM/dd/yyyy`) or an ISO date
pub fn parse_display_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
}

/// Comma-joined `"label (date)"` list, `"None"` when empty
pub fn dated_list<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<NaiveDate>)>,
{
    let rendered: Vec<String> = entries
        .into_iter()
        .map(|(label, date)| {
            let date = date.map(short_date).unwrap_or_else(|| "No Date".to_string());
            format!("{} ({})", label, date)
        })
        .collect();

    if rendered.is_empty() {
        "None".to_string()
    } else {
        rendered.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dates_render_padded_and_unpadded() {
        assert_eq!(display_date(day(2024, 3, 5)), "03/05/2024");
        assert_eq!(short_date(day(2024, 3, 5)), "3/5/2024");
        assert_eq!(opt_date(None), "");
    }

    #[test]
    fn whole_weights_have_no_fraction() {
        assert_eq!(display_number(950.0), "950");
        assert_eq!(display_number(950.5), "950.5");
    }

    #[test]
    fn parses_display_and_iso_dates() {
        assert_eq!(parse_display_date("03/05/2024"), Some(day(2024, 3, 5)));
        assert_eq!(parse_display_date("2024-03-05"), Some(day(2024, 3, 5)));
        assert_eq!(parse_display_date("soon"), None);
        assert_eq!(parse_display_date(""), None);
    }

    #[test]
    fn dated_list_marks_missing_dates_and_empty_lists() {
        let entries = vec![("Ivomec", Some(day(2024, 4, 2))), ("Draxxin", None)];
        assert_eq!(dated_list(entries), "Ivomec (4/2/2024), Draxxin (No Date)");
        assert_eq!(dated_list(Vec::new()), "None");
    }
}
