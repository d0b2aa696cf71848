use chrono::NaiveDate;

fn digits(s: &str) -> Option<&str> {
    s.bytes().all(|b| b.is_ascii_digit()).then_some(s)
}

/// Fast parse of `"YYYY-MM"` (or `"YYYY-MM-DD"`, `/` separators allowed)
/// into the first day of that month.
pub fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if !s.is_ascii() || (s.len() != 7 && s.len() != 10) {
        return None;
    }
    let sep = &s[4..5];
    if sep != "-" && sep != "/" {
        return None;
    }
    let year: i32 = digits(&s[0..4])?.parse().ok()?;
    let month: u32 = digits(&s[5..7])?.parse().ok()?;

    if s.len() == 10 {
        if &s[7..8] != sep {
            return None;
        }
        let day: u32 = digits(&s[8..10])?.parse().ok()?;
        // reject impossible days even though only the month is kept
        NaiveDate::from_ymd_opt(year, month, day)?;
    }

    NaiveDate::from_ymd_opt(year, month, 1)
}
