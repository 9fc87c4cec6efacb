use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::CoreError;

const DAYS_PER_MONTH: i64 = 30;
const DAYS_PER_YEAR: i64 = 365;

/// Lower bound on a discussion's last update, resolved to an absolute instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Since {
    threshold: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Since {
    /// Accepts `YYYY-MM-DD`, compact offsets (`12h`, `7d`, `2w`, `1m`, `1y`)
    /// and long offsets (`7 days ago`, `1 month`). Offsets are taken back from `now`.
    pub fn parse(input: &str, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidSince(trimmed.to_string()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }
        let (value, unit) = parse_offset(trimmed)
            .ok_or_else(|| CoreError::InvalidSince(trimmed.to_string()))?;
        let offset = unit
            .duration(value)
            .ok_or_else(|| CoreError::InvalidSince(trimmed.to_string()))?;
        let threshold = now
            .checked_sub_signed(offset)
            .ok_or_else(|| CoreError::InvalidSince(trimmed.to_string()))?;
        Ok(Self { threshold })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            threshold: date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    pub fn threshold(&self) -> DateTime<Utc> {
        self.threshold
    }

    /// Day-granular form used in search qualifiers; never later than the threshold.
    pub fn date_floor(&self) -> NaiveDate {
        self.threshold.date_naive()
    }
}

impl Unit {
    fn parse(token: &str) -> Option<Self> {
        let unit = match token.to_ascii_lowercase().as_str() {
            "h" | "hour" | "hours" => Unit::Hour,
            "d" | "day" | "days" => Unit::Day,
            "w" | "week" | "weeks" => Unit::Week,
            "m" | "month" | "months" => Unit::Month,
            "y" | "year" | "years" => Unit::Year,
            _ => return None,
        };
        Some(unit)
    }

    fn duration(self, value: i64) -> Option<Duration> {
        match self {
            Unit::Hour => Duration::try_hours(value),
            Unit::Day => Duration::try_days(value),
            Unit::Week => Duration::try_weeks(value),
            Unit::Month => Duration::try_days(value.checked_mul(DAYS_PER_MONTH)?),
            Unit::Year => Duration::try_days(value.checked_mul(DAYS_PER_YEAR)?),
        }
    }
}

fn parse_offset(input: &str) -> Option<(i64, Unit)> {
    let digits_end = input
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| idx)?;
    if digits_end == 0 {
        return None;
    }
    let value: i64 = input[..digits_end].parse().ok()?;
    let rest = input[digits_end..].trim();
    let mut words = rest.split_whitespace();
    let unit = Unit::parse(words.next()?)?;
    match words.next() {
        None => {}
        Some(word) if word.eq_ignore_ascii_case("ago") => {}
        Some(_) => return None,
    }
    if words.next().is_some() {
        return None;
    }
    Some((value, unit))
}
