//! Calendar-window bucketing of sale records.
//!
//! Every window is half-open, `[from, to)`, and its boundaries are local
//! midnights in a single configured timezone. Functions here are pure and
//! operate on whatever snapshot of records the caller fetched.

use std::fmt;

use chrono::{DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::models::SaleRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Day,
    Month,
    TrailingMonths(u32),
}

/// A calendar month, independent of day-of-month. Rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn months_before(&self, count: u32) -> Self {
        Self(self.0 - Months::new(count))
    }

    pub fn next(&self) -> Self {
        Self(self.0 + Months::new(1))
    }

    pub fn window(&self, tz: &Tz) -> TimeWindow {
        TimeWindow::new(local_start(self.0, tz), local_start(self.next().0, tz))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub window: TimeWindow,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    pub key: MonthKey,
    pub window: TimeWindow,
    pub total: Decimal,
}

// First instant of `date` in `tz`. A day that starts inside a DST gap
// begins at the first local time that exists.
fn local_start(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let mut probe = date.and_time(NaiveTime::MIN);
    loop {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(start) | LocalResult::Ambiguous(start, _) => {
                return start.with_timezone(&Utc)
            }
            LocalResult::None => probe += Duration::minutes(15),
        }
    }
}

pub fn local_date(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

/// Window of the given kind containing `now`.
///
/// For `TrailingMonths(n)` this is the span covering all `n` month windows
/// returned by [`trailing_month_windows`]; `n == 0` gives an empty window.
pub fn window_for(kind: WindowKind, now: DateTime<Utc>, tz: &Tz) -> TimeWindow {
    let today = local_date(now, tz);
    match kind {
        WindowKind::Day => TimeWindow::new(local_start(today, tz), local_start(today + Days::new(1), tz)),
        WindowKind::Month => MonthKey::of(today).window(tz),
        WindowKind::TrailingMonths(count) => {
            let current = MonthKey::of(today).window(tz);
            if count == 0 {
                return TimeWindow::new(current.to, current.to);
            }
            let oldest = MonthKey::of(today).months_before(count - 1).window(tz);
            TimeWindow::new(oldest.from, current.to)
        }
    }
}

/// The `count` month windows ending with the month containing `now`, oldest first.
pub fn trailing_month_windows(now: DateTime<Utc>, count: u32, tz: &Tz) -> Vec<(MonthKey, TimeWindow)> {
    let current = MonthKey::of(local_date(now, tz));
    (0..count)
        .rev()
        .map(|offset| {
            let key = current.months_before(offset);
            (key, key.window(tz))
        })
        .collect()
}

/// Total of the amounts inside `window`. Saturates at `Decimal::MAX` rather
/// than overflowing, so stored data can never make it fail.
pub fn sum(records: &[SaleRecord], window: &TimeWindow) -> Decimal {
    records
        .iter()
        .filter(|record| window.contains(record.created_at))
        .fold(Decimal::ZERO, |total, record| total.saturating_add(record.amount))
}

pub fn aggregate(records: &[SaleRecord], window: TimeWindow) -> AggregateResult {
    AggregateResult {
        window,
        total: sum(records, &window),
    }
}

/// Zero-filled per-month totals for the trailing `count` months, oldest first.
pub fn monthly_series(records: &[SaleRecord], now: DateTime<Utc>, count: u32, tz: &Tz) -> Vec<MonthlyTotal> {
    trailing_month_windows(now, count, tz)
        .into_iter()
        .map(|(key, window)| MonthlyTotal {
            key,
            window,
            total: sum(records, &window),
        })
        .collect()
}

/// Most recent records inside `window`, newest first. Equal timestamps are
/// ordered by descending id so the output is reproducible.
pub fn recent(records: &[SaleRecord], window: &TimeWindow, limit: usize) -> Vec<SaleRecord> {
    let mut matching: Vec<SaleRecord> = records
        .iter()
        .filter(|record| window.contains(record.created_at))
        .cloned()
        .collect();

    matching.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    matching.truncate(limit);
    matching
}
