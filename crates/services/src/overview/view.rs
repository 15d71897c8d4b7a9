use chrono::{DateTime, NaiveDate, Utc};

/// Render a minute total the way every view must: `"45 min"`, `"1 h"`,
/// `"1 h 30 min"`. This rule is a contract shared across the application.
#[must_use]
pub fn format_minutes(minutes: u64) -> String {
    if minutes < 60 {
        return format!("{minutes} min");
    }
    let h = minutes / 60;
    let m = minutes % 60;
    if m > 0 {
        format!("{h} h {m} min")
    } else {
        format!("{h} h")
    }
}

/// Clock-time rendering (`HH:MM`) for session start and end columns.
#[must_use]
pub fn format_time(value: DateTime<Utc>) -> String {
    value.format("%H:%M").to_string()
}

/// Day-first date rendering without zero padding, e.g. `5.3.2024`.
#[must_use]
pub fn format_date(value: NaiveDate) -> String {
    value.format("%-d.%-m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_under_an_hour() {
        assert_eq!(format_minutes(0), "0 min");
        assert_eq!(format_minutes(45), "45 min");
        assert_eq!(format_minutes(59), "59 min");
    }

    #[test]
    fn whole_hours_drop_the_minute_part() {
        assert_eq!(format_minutes(60), "1 h");
        assert_eq!(format_minutes(120), "2 h");
    }

    #[test]
    fn mixed_hours_and_minutes() {
        assert_eq!(format_minutes(90), "1 h 30 min");
        assert_eq!(format_minutes(61), "1 h 1 min");
    }

    #[test]
    fn time_renders_as_hours_and_minutes() {
        let t = DateTime::parse_from_rfc3339("2024-05-10T07:05:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_time(t), "07:05");
    }

    #[test]
    fn date_renders_day_first_without_padding() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(d), "5.3.2024");
    }
}
