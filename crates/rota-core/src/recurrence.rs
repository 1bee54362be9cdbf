//! Recurrence rules for rota tasks and the date arithmetic that expands them.
//!
//! Everything in here is pure: the same rule and reference date always yield
//! the same next date and the same description.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of the interval spinbox offered to users.
pub const MAX_INTERVAL: u32 = 365;

/// Most dates a caller should ask `upcoming` for in one go.
pub const MAX_UPCOMING: usize = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    #[default]
    Manual,
    Daily,
    Weekly,
    Monthly,
    CustomInterval,
    NthWeekdayOfMonth,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Manual => "manual",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::CustomInterval => "custom_interval",
            RecurrenceKind::NthWeekdayOfMonth => "nth_weekday_of_month",
        }
    }

    pub fn variants() -> &'static [RecurrenceKind] {
        &[
            RecurrenceKind::Manual,
            RecurrenceKind::Daily,
            RecurrenceKind::Weekly,
            RecurrenceKind::Monthly,
            RecurrenceKind::CustomInterval,
            RecurrenceKind::NthWeekdayOfMonth,
        ]
    }

    fn uses_interval(&self) -> bool {
        matches!(
            self,
            RecurrenceKind::Weekly | RecurrenceKind::Monthly | RecurrenceKind::CustomInterval
        )
    }
}

impl FromStr for RecurrenceKind {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        RecurrenceKind::variants()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| RuleParseError::UnknownKind(s.to_string()))
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which matching weekday of a month an `NthWeekdayOfMonth` rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Occurrence {
    #[default]
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Occurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Occurrence::First => "first",
            Occurrence::Second => "second",
            Occurrence::Third => "third",
            Occurrence::Fourth => "fourth",
            Occurrence::Last => "last",
        }
    }

    /// 1-based position within the month, `None` for `Last`.
    pub fn position(&self) -> Option<usize> {
        match self {
            Occurrence::First => Some(1),
            Occurrence::Second => Some(2),
            Occurrence::Third => Some(3),
            Occurrence::Fourth => Some(4),
            Occurrence::Last => None,
        }
    }
}

impl FromStr for Occurrence {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "1" | "1st" => Ok(Occurrence::First),
            "second" | "2" | "2nd" => Ok(Occurrence::Second),
            "third" | "3" | "3rd" => Ok(Occurrence::Third),
            "fourth" | "4" | "4th" => Ok(Occurrence::Fourth),
            "last" => Ok(Occurrence::Last),
            _ => Err(RuleParseError::UnknownOccurrence(s.to_string())),
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("unknown schedule kind '{0}'")]
    UnknownKind(String),
    #[error("unknown occurrence '{0}' (expected first, second, third, fourth or last)")]
    UnknownOccurrence(String),
    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("malformed rule '{input}': expected {expected}")]
    Malformed {
        input: String,
        expected: &'static str,
    },
}

/// Recurrence definition for one assignable task.
///
/// Fields a given `kind` does not read are kept as-is and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub kind: RecurrenceKind,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default = "default_weekday")]
    pub weekday: Weekday,
    #[serde(default = "default_day_of_month")]
    pub day_of_month: u32,
    #[serde(default)]
    pub occurrence: Occurrence,
}

fn default_interval() -> u32 {
    1
}

fn default_weekday() -> Weekday {
    Weekday::Mon
}

fn default_day_of_month() -> u32 {
    1
}

impl Default for ScheduleRule {
    fn default() -> Self {
        Self {
            kind: RecurrenceKind::Manual,
            interval: default_interval(),
            weekday: default_weekday(),
            day_of_month: default_day_of_month(),
            occurrence: Occurrence::First,
        }
    }
}

impl ScheduleRule {
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn daily() -> Self {
        Self {
            kind: RecurrenceKind::Daily,
            ..Self::default()
        }
    }

    pub fn weekly(interval: u32, weekday: Weekday) -> Self {
        Self {
            kind: RecurrenceKind::Weekly,
            interval,
            weekday,
            ..Self::default()
        }
    }

    pub fn monthly(interval: u32, day_of_month: u32) -> Self {
        Self {
            kind: RecurrenceKind::Monthly,
            interval,
            day_of_month,
            ..Self::default()
        }
    }

    pub fn every_n_days(interval: u32) -> Self {
        Self {
            kind: RecurrenceKind::CustomInterval,
            interval,
            ..Self::default()
        }
    }

    pub fn nth_weekday(occurrence: Occurrence, weekday: Weekday) -> Self {
        Self {
            kind: RecurrenceKind::NthWeekdayOfMonth,
            weekday,
            occurrence,
            ..Self::default()
        }
    }

    /// Interval actually used for date arithmetic; zero counts as one.
    pub fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }

    pub fn next_occurrence(&self, from: NaiveDate) -> Option<NaiveDate> {
        next_occurrence(self, from)
    }

    pub fn describe(&self) -> String {
        describe(self)
    }

    /// Compact token form accepted by `FromStr`, e.g. `weekly:2:fri`.
    pub fn to_token(&self) -> String {
        match self.kind {
            RecurrenceKind::Manual => "manual".to_string(),
            RecurrenceKind::Daily => "daily".to_string(),
            RecurrenceKind::Weekly => format!(
                "weekly:{}:{}",
                self.interval,
                weekday_name(self.weekday).to_ascii_lowercase()
            ),
            RecurrenceKind::Monthly => format!("monthly:{}:{}", self.interval, self.day_of_month),
            RecurrenceKind::CustomInterval => format!("every:{}", self.interval),
            RecurrenceKind::NthWeekdayOfMonth => format!(
                "nth:{}:{}",
                self.occurrence,
                weekday_name(self.weekday).to_ascii_lowercase()
            ),
        }
    }
}

impl FromStr for ScheduleRule {
    type Err = RuleParseError;

    /// Parses `manual`, `daily`, `weekly:<n>:<weekday>`, `monthly:<n>:<day>`,
    /// `every:<n>` and `nth:<occurrence>:<weekday>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parts: Vec<&str> = input.split(':').map(str::trim).collect();
        let head = parts.first().copied().unwrap_or_default().to_ascii_lowercase();
        let malformed = |expected: &'static str| RuleParseError::Malformed {
            input: input.to_string(),
            expected,
        };
        match (head.as_str(), parts.len()) {
            ("manual", 1) => Ok(ScheduleRule::manual()),
            ("daily", 1) => Ok(ScheduleRule::daily()),
            ("weekly", 2) => Ok(ScheduleRule::weekly(1, parse_weekday(parts[1])?)),
            ("weekly", 3) => Ok(ScheduleRule::weekly(
                parse_number(parts[1])?,
                parse_weekday(parts[2])?,
            )),
            ("weekly", _) => Err(malformed("weekly:<interval>:<weekday>")),
            ("monthly", 2) => Ok(ScheduleRule::monthly(1, parse_number(parts[1])?)),
            ("monthly", 3) => Ok(ScheduleRule::monthly(
                parse_number(parts[1])?,
                parse_number(parts[2])?,
            )),
            ("monthly", _) => Err(malformed("monthly:<interval>:<day_of_month>")),
            ("every", 2) => Ok(ScheduleRule::every_n_days(parse_number(parts[1])?)),
            ("every", _) => Err(malformed("every:<days>")),
            ("nth", 3) => Ok(ScheduleRule::nth_weekday(
                parts[1].parse()?,
                parse_weekday(parts[2])?,
            )),
            ("nth", _) => Err(malformed("nth:<occurrence>:<weekday>")),
            ("manual" | "daily", _) => Err(malformed("no arguments")),
            _ => Err(RuleParseError::UnknownKind(parts[0].to_string())),
        }
    }
}

pub fn parse_weekday(input: &str) -> Result<Weekday, RuleParseError> {
    input
        .trim()
        .parse::<Weekday>()
        .map_err(|_| RuleParseError::UnknownWeekday(input.to_string()))
}

fn parse_number(input: &str) -> Result<u32, RuleParseError> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| RuleParseError::InvalidNumber(input.to_string()))
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// English ordinal for a day number: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
pub fn ordinal(n: u32) -> String {
    let suffix = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{n}{suffix}")
}

/// Next due date strictly after `from`, or `None` for manual rules.
///
/// `None` is also returned if the result would leave chrono's date range.
pub fn next_occurrence(rule: &ScheduleRule, from: NaiveDate) -> Option<NaiveDate> {
    let interval = rule.effective_interval();
    match rule.kind {
        RecurrenceKind::Manual => None,
        RecurrenceKind::Daily => from.checked_add_days(Days::new(1)),
        RecurrenceKind::CustomInterval => from.checked_add_days(Days::new(u64::from(interval))),
        RecurrenceKind::Weekly => {
            let candidate = next_weekday_after(from, rule.weekday)?;
            if from.weekday() == rule.weekday {
                // `from` is itself an occurrence; skip the remaining weeks of the cycle
                candidate.checked_add_days(Days::new(u64::from(interval - 1) * 7))
            } else {
                Some(candidate)
            }
        }
        RecurrenceKind::Monthly => {
            let (year, month) = shift_month(from.year(), from.month(), interval)?;
            let day = rule.day_of_month.clamp(1, days_in_month(year, month)?);
            NaiveDate::from_ymd_opt(year, month, day)
        }
        RecurrenceKind::NthWeekdayOfMonth => {
            let this_month =
                nth_weekday_in_month(from.year(), from.month(), rule.weekday, rule.occurrence)?;
            if this_month > from {
                return Some(this_month);
            }
            let (year, month) = shift_month(from.year(), from.month(), 1)?;
            nth_weekday_in_month(year, month, rule.weekday, rule.occurrence)
        }
    }
}

/// Up to `count` consecutive occurrences after `from`.
pub fn upcoming(rule: &ScheduleRule, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count.min(MAX_UPCOMING));
    let mut cursor = from;
    while dates.len() < count {
        match next_occurrence(rule, cursor) {
            Some(next) => {
                dates.push(next);
                cursor = next;
            }
            None => break,
        }
    }
    dates
}

/// Occurrences in `(start, end]`, chained from `start`.
pub fn occurrences_between(rule: &ScheduleRule, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut cursor = start;
    while let Some(next) = next_occurrence(rule, cursor) {
        if next > end {
            break;
        }
        dates.push(next);
        cursor = next;
    }
    dates
}

pub fn describe(rule: &ScheduleRule) -> String {
    let interval = rule.effective_interval();
    match rule.kind {
        RecurrenceKind::Manual => "Manual (no automatic schedule)".to_string(),
        RecurrenceKind::Daily => "Every day".to_string(),
        RecurrenceKind::Weekly if interval == 1 => {
            format!("Every week on {}", weekday_name(rule.weekday))
        }
        RecurrenceKind::Weekly => {
            format!("Every {interval} weeks on {}", weekday_name(rule.weekday))
        }
        RecurrenceKind::Monthly if interval == 1 => {
            format!("On the {} of every month", ordinal(rule.day_of_month))
        }
        RecurrenceKind::Monthly => format!(
            "On the {} of every {interval} months",
            ordinal(rule.day_of_month)
        ),
        RecurrenceKind::CustomInterval if interval == 1 => "Every day".to_string(),
        RecurrenceKind::CustomInterval => format!("Every {interval} days"),
        RecurrenceKind::NthWeekdayOfMonth => match rule.occurrence.position() {
            Some(n) => format!(
                "Every {} {} of each month",
                ordinal(n as u32),
                weekday_name(rule.weekday)
            ),
            None => format!(
                "On the Last {} of every month",
                weekday_name(rule.weekday)
            ),
        },
    }
}

/// Input the core accepts but silently clamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum RuleWarning {
    Interval { value: u32, applied: u32 },
    /// The day actually used depends on the target month.
    DayOfMonth { value: u32 },
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleWarning::Interval { value, applied } => write!(
                f,
                "interval {value} is outside 1..={MAX_INTERVAL}; {applied} will be used"
            ),
            RuleWarning::DayOfMonth { value: 0 } => {
                write!(f, "day of month 0 is outside 1..=31; the 1st will be used")
            }
            RuleWarning::DayOfMonth { value } => write!(
                f,
                "day of month {value} is outside 1..=31; the last day of the month will be used"
            ),
        }
    }
}

/// Reports interval and day-of-month values a UI should flag to the user.
pub fn rule_warnings(rule: &ScheduleRule) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();
    if rule.kind.uses_interval() && !(1..=MAX_INTERVAL).contains(&rule.interval) {
        warnings.push(RuleWarning::Interval {
            value: rule.interval,
            applied: rule.effective_interval(),
        });
    }
    if rule.kind == RecurrenceKind::Monthly && !(1..=31).contains(&rule.day_of_month) {
        warnings.push(RuleWarning::DayOfMonth {
            value: rule.day_of_month,
        });
    }
    warnings
}

fn next_weekday_after(from: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let mut date = from.succ_opt()?;
    while date.weekday() != weekday {
        date = date.succ_opt()?;
    }
    Some(date)
}

fn shift_month(year: i32, month: u32, months: u32) -> Option<(i32, u32)> {
    let zero_based = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(months);
    let year = i32::try_from(zero_based.div_euclid(12)).ok()?;
    let month = u32::try_from(zero_based.rem_euclid(12)).ok()? + 1;
    Some((year, month))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = shift_month(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some(last.day())
}

/// Nth matching weekday of a month, falling back to the last one when the
/// month has fewer matches than requested.
fn nth_weekday_in_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    occurrence: Occurrence,
) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let matches: Vec<NaiveDate> = first
        .iter_days()
        .take_while(|date| date.month() == month)
        .filter(|date| date.weekday() == weekday)
        .collect();
    match occurrence.position() {
        Some(n) => matches.get(n - 1).or_else(|| matches.last()).copied(),
        None => matches.last().copied(),
    }
}
