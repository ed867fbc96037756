// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Locale-independent value formatting for rendered documents.

use std::borrow::Cow;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

/// Formats `value` with ASCII digits grouped in threes by `,`.
///
/// # Example
///
/// ```
/// use profile_card::format::group_thousands;
///
/// assert_eq!(group_thousands(1_234_567), "1,234,567");
/// assert_eq!(group_thousands(-1_000), "-1,000");
/// ```
pub fn group_thousands(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Elapsed time between `birthday` and `today` as
/// `"N years, M months, D days"`.
///
/// Zero parts are left out and a fully zero span reads `"0 days"`. A cake is
/// appended on the birthday itself. Dates in the future render as `"0 days"`.
pub fn format_age(birthday: NaiveDate, today: NaiveDate) -> String {
    if birthday > today {
        return "0 days".to_owned();
    }

    let mut months = (today.year() - birthday.year()) * 12 + today.month() as i32
        - birthday.month() as i32;
    let mut anchor = birthday;
    while months > 0 {
        match birthday.checked_add_months(Months::new(months.unsigned_abs())) {
            Some(candidate) if candidate <= today => {
                anchor = candidate;
                break;
            }
            _ => months -= 1
        }
    }

    let months = months.max(0);
    let days = (today - anchor).num_days();
    let years = months / 12;
    let months = months % 12;

    let parts: Vec<String> = [
        (i64::from(years), "year"),
        (i64::from(months), "month"),
        (days, "day")
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, unit)| format!("{count} {}", plural(count, unit)))
    .collect();

    let mut age = if parts.is_empty() {
        "0 days".to_owned()
    } else {
        parts.join(", ")
    };
    if months == 0 && days == 0 {
        age.push_str(" \u{1F382}");
    }
    age
}

fn plural(count: i64, unit: &str) -> Cow<'_, str> {
    if count == 1 {
        Cow::Borrowed(unit)
    } else {
        Cow::Owned(format!("{unit}s"))
    }
}

/// Renders a timestamp as `Mon Jun 3 04:00:00` (UTC).
pub fn build_timestamp(at: DateTime<Utc>) -> String {
    at.format("%a %b %-d %H:%M:%S").to_string()
}

/// Escapes the five XML special characters.
pub fn escape_xml(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .any(|character| matches!(character, '&' | '<' | '>' | '\"' | '\''))
    {
        let mut escaped = String::with_capacity(value.len());
        for character in value.chars() {
            match character {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '\"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                other => escaped.push(other)
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(value)
    }
}
