//! Portfolio views over classified records: counts, rankings and review windows.

use chrono::NaiveDate;

/// Where a record's next review sits relative to the reporting date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewStatus {
    /// Days from the reporting date to the review date (negative once passed)
    pub days_until: i64,
    pub overdue: bool,
    pub due_soon: bool,
}

pub fn review_status(review_date: NaiveDate, as_of: NaiveDate, due_soon_days: i64) -> ReviewStatus {
    let days_until = (review_date - as_of).num_days();
    ReviewStatus {
        days_until,
        overdue: days_until < 0,
        due_soon: (0..=due_soon_days).contains(&days_until),
    }
}

/// Count records per label, in the caller's display order (zero counts included).
pub fn count_by<T, K, F>(items: &[T], order: &[K], key: F) -> Vec<(K, usize)>
where
    K: Copy + PartialEq,
    F: Fn(&T) -> K,
{
    order
        .iter()
        .map(|label| (*label, items.iter().filter(|item| key(item) == *label).count()))
        .collect()
}

/// All records by score descending; equal scores fall back to identifier ascending.
pub fn ranked<'a, T, S, I>(items: &'a [T], score: S, id: I) -> Vec<&'a T>
where
    S: Fn(&T) -> u32,
    I: Fn(&T) -> &str,
{
    let mut out: Vec<&T> = items.iter().collect();
    out.sort_by(|a, b| score(b).cmp(&score(a)).then_with(|| id(a).cmp(id(b))));
    out
}

pub fn top_n<'a, T, S, I>(items: &'a [T], n: usize, score: S, id: I) -> Vec<&'a T>
where
    S: Fn(&T) -> u32,
    I: Fn(&T) -> &str,
{
    let mut out = ranked(items, score, id);
    out.truncate(n);
    out
}

/// Records whose review has passed, paired with days overdue, most overdue first.
pub fn overdue<'a, T, D>(items: &'a [T], as_of: NaiveDate, review_date: D) -> Vec<(&'a T, i64)>
where
    D: Fn(&T) -> Option<NaiveDate>,
{
    let mut out: Vec<(&T, i64)> = items
        .iter()
        .filter_map(|item| {
            let days = (as_of - review_date(item)?).num_days();
            (days > 0).then_some((item, days))
        })
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Records due for review within `window` days, paired with days remaining, soonest first.
pub fn due_soon<'a, T, D>(
    items: &'a [T],
    as_of: NaiveDate,
    window: i64,
    review_date: D,
) -> Vec<(&'a T, i64)>
where
    D: Fn(&T) -> Option<NaiveDate>,
{
    let mut out: Vec<(&T, i64)> = items
        .iter()
        .filter_map(|item| {
            let status = review_status(review_date(item)?, as_of, window);
            status.due_soon.then_some((item, status.days_until))
        })
        .collect();
    out.sort_by_key(|(_, days)| *days);
    out
}
