use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Parse a point in time. Accepts "now", "YYYY-MM-DD HH:MM",
/// "YYYY-MM-DDTHH:MM:SS", or any date form `parse_date` takes (noon of
/// that day).
pub(crate) fn parse_datetime(value: Option<String>) -> Result<NaiveDateTime> {
    let Some(s) = value else {
        return Ok(Local::now().naive_local());
    };
    if s == "now" {
        return Ok(Local::now().naive_local());
    }
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, format) {
            return Ok(dt);
        }
    }
    let date = parse_date(Some(s))?;
    Ok(date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()))
}

/// Destructive commands refuse to run without `--yes`.
pub(crate) fn require_confirmation(yes: bool, what: &str) -> Result<()> {
    if !yes {
        bail!("This will permanently delete {what}. Re-run with --yes to confirm");
    }
    Ok(())
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        assert_eq!(
            parse_datetime(Some("2024-01-15 18:30".to_string())).unwrap(),
            expected
        );
        assert_eq!(
            parse_datetime(Some("2024-01-15T18:30:00".to_string())).unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_datetime_date_only_is_noon() {
        let dt = parse_datetime(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
        assert!(parse_datetime(Some("2024-13-40 10:00".to_string())).is_err());
    }

    #[test]
    fn test_require_confirmation() {
        assert!(require_confirmation(false, "everything").is_err());
        assert!(require_confirmation(true, "everything").is_ok());
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Bulgarian split squat", 10), "Bulgari...");
        assert_eq!(truncate("Développé couché", 10), "Dévelop...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert!((no_neg_zero(5.0) - 5.0).abs() < f64::EPSILON);
    }
}
