//! Date helper functions

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};

use crate::i18n::I18n;

/// Month names used by `MMM` and `MMMM`
#[derive(Debug, Clone)]
pub struct MonthNames {
    short: Vec<String>,
    long: Vec<String>,
}

impl MonthNames {
    pub fn from_i18n(i18n: &I18n) -> Self {
        let short = i18n
            .get_list("months.short")
            .filter(|m| m.len() == 12)
            .unwrap_or_else(|| english(3));
        let long = i18n
            .get_list("months.long")
            .filter(|m| m.len() == 12)
            .unwrap_or_else(|| english(usize::MAX));
        Self { short, long }
    }
}

impl Default for MonthNames {
    fn default() -> Self {
        Self {
            short: english(3),
            long: english(usize::MAX),
        }
    }
}

fn english(max_len: usize) -> Vec<String> {
    [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ]
    .iter()
    .map(|m| m.chars().take(max_len).collect())
    .collect()
}

/// Format a date using a date-fns compatible pattern
///
/// Supported tokens: `yyyy`, `yy`, `MMMM`, `MMM`, `MM`, `M`, `dd`, `d`,
/// `HH`, `H`, `mm`, `m`, `ss`, `s`. Text inside single quotes is copied.
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", &months) // -> "25 mar 2021"
/// ```
pub fn format_date<Tz: TimeZone>(
    date: &DateTime<Tz>,
    pattern: &str,
    months: &MonthNames,
) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            let end = chars[i + 1..]
                .iter()
                .position(|&ch| ch == '\'')
                .map(|p| i + 1 + p)
                .unwrap_or(chars.len());
            out.extend(&chars[i + 1..end]);
            i = end + 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&ch| ch == c).count();
        let month = date.month0() as usize;

        match (c, run) {
            ('y', 2) => out.push_str(&format!("{:02}", date.year().rem_euclid(100))),
            ('y', _) => out.push_str(&format!("{:04}", date.year())),
            ('M', 1) => out.push_str(&date.month().to_string()),
            ('M', 2) => out.push_str(&format!("{:02}", date.month())),
            ('M', 3) => out.push_str(&months.short[month]),
            ('M', _) => out.push_str(&months.long[month]),
            ('d', 1) => out.push_str(&date.day().to_string()),
            ('d', _) => out.push_str(&format!("{:02}", date.day())),
            ('H', 1) => out.push_str(&date.hour().to_string()),
            ('H', _) => out.push_str(&format!("{:02}", date.hour())),
            ('m', 1) => out.push_str(&date.minute().to_string()),
            ('m', _) => out.push_str(&format!("{:02}", date.minute())),
            ('s', 1) => out.push_str(&date.second().to_string()),
            ('s', _) => out.push_str(&format!("{:02}", date.second())),
            _ => out.extend(std::iter::repeat(c).take(run)),
        }

        i += run;
    }

    out
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Display formatting for publication dates in the site timezone
#[derive(Debug, Clone)]
pub struct DateFormatter {
    pattern: String,
    tz: chrono_tz::Tz,
    months: MonthNames,
}

impl DateFormatter {
    pub fn new(pattern: &str, tz: chrono_tz::Tz, i18n: &I18n) -> Self {
        Self {
            pattern: pattern.to_string(),
            tz,
            months: MonthNames::from_i18n(i18n),
        }
    }

    pub fn format(&self, date: &DateTime<FixedOffset>) -> String {
        format_date(&date.with_timezone(&self.tz), &self.pattern, &self.months)
    }

    /// `None` for posts without a publication date
    pub fn format_opt(&self, date: Option<&DateTime<FixedOffset>>) -> Option<String> {
        date.map(|d| self.format(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::timestamp;

    fn publication() -> DateTime<FixedOffset> {
        timestamp::parse("2021-03-25T19:25:28+0000").unwrap()
    }

    #[test]
    fn test_portuguese_short_date() {
        let formatter = DateFormatter::new("dd MMM yyyy", chrono_tz::UTC, &I18n::new("pt-BR"));
        assert_eq!(formatter.format(&publication()), "25 mar 2021");
    }

    #[test]
    fn test_english_dates() {
        let months = MonthNames::default();
        let date = publication();
        assert_eq!(format_date(&date, "dd MMM yyyy", &months), "25 Mar 2021");
        assert_eq!(format_date(&date, "MMMM d, yyyy", &months), "March 25, 2021");
        assert_eq!(format_date(&date, "yyyy-MM-dd HH:mm:ss", &months), "2021-03-25 19:25:28");
        assert_eq!(format_date(&date, "d/M/yy", &months), "25/3/21");
    }

    #[test]
    fn test_quoted_literal() {
        let months = MonthNames::from_i18n(&I18n::new("pt-BR"));
        assert_eq!(
            format_date(&publication(), "d 'de' MMMM 'de' yyyy", &months),
            "25 de março de 2021"
        );
    }

    #[test]
    fn test_timezone_conversion_changes_day() {
        let formatter = DateFormatter::new(
            "dd MMM yyyy",
            chrono_tz::Asia::Tokyo,
            &I18n::new("pt-BR"),
        );
        // 19:25 UTC is 04:25 the next day in Tokyo
        assert_eq!(formatter.format(&publication()), "26 mar 2021");
    }

    #[test]
    fn test_missing_date() {
        let formatter = DateFormatter::new("dd MMM yyyy", chrono_tz::UTC, &I18n::new("pt-BR"));
        assert_eq!(formatter.format_opt(None), None);
    }

    #[test]
    fn test_date_xml() {
        assert_eq!(date_xml(&publication()), "2021-03-25T19:25:28+00:00");
    }
}
