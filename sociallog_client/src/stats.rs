use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::PostEntry;

/// Posts submitted without a type are grouped under this column.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// How many months back the month selector offers.
pub const MONTH_OPTION_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub day: u32,
    pub posts: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeCount {
    pub name: String,
    pub posts: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub total: usize,
    pub month_total: usize,
    pub avg_per_day: f64,
    pub max_per_day: usize,
}

/// Per-day, per-type counts of one user's posts within a month.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeBreakdown {
    /// One row per day of the month, ascending `1..=D`; days without posts
    /// have an empty count map.
    pub days: Vec<DayTypeCounts>,
    /// Every type seen that month, ascibetically sorted.
    pub unique_post_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayTypeCounts {
    pub day: u32,
    pub counts: BTreeMap<String, usize>,
}

/// All bucketing uses local calendar boundaries, matching what the viewer's
/// wall clock calls "today".
fn local_date(timestamp_ms: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.date_naive())
}

fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(0)
}

/// The viewer's own posts dated today.
pub fn posts_today(posts: &[PostEntry], viewer_email: &str, today: NaiveDate) -> usize {
    posts
        .iter()
        .filter(|post| post.created_by_email == viewer_email)
        .filter(|post| local_date(post.timestamp) == Some(today))
        .count()
}

/// Zero-filled per-day counts for one month, days strictly ascending.
pub fn daily_series(posts: &[PostEntry], year: i32, month: u32) -> Vec<DailyCount> {
    let days = days_in_month(year, month);
    let mut counts = vec![0usize; days as usize];
    for post in posts {
        if let Some(date) = local_date(post.timestamp) {
            if in_month(date, year, month) {
                counts[(date.day() - 1) as usize] += 1;
            }
        }
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(index, posts)| DailyCount {
            day: index as u32 + 1,
            posts,
        })
        .collect()
}

/// Headline numbers for the summary cards.
pub fn month_summary(posts: &[PostEntry], year: i32, month: u32) -> MonthSummary {
    let series = daily_series(posts, year, month);
    let month_total: usize = series.iter().map(|day| day.posts).sum();
    let avg_per_day = if month_total > 0 {
        round_one_decimal(month_total as f64 / series.len().max(1) as f64)
    } else {
        0.0
    };
    let max_per_day = series.iter().map(|day| day.posts).max().unwrap_or(0);
    MonthSummary {
        total: posts.len(),
        month_total,
        avg_per_day,
        max_per_day,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// All-time per-employee totals, nickname-relabeled, descending by count.
pub fn employee_totals(
    posts: &[PostEntry],
    directory: &HashMap<String, String>,
) -> Vec<EmployeeCount> {
    tally_by_employee(posts.iter(), directory)
}

pub fn employee_totals_in_month(
    posts: &[PostEntry],
    year: i32,
    month: u32,
    directory: &HashMap<String, String>,
) -> Vec<EmployeeCount> {
    let filtered = posts.iter().filter(|post| {
        local_date(post.timestamp).is_some_and(|date| in_month(date, year, month))
    });
    tally_by_employee(filtered, directory)
}

pub fn employee_totals_on_day(
    posts: &[PostEntry],
    day: NaiveDate,
    directory: &HashMap<String, String>,
) -> Vec<EmployeeCount> {
    let filtered = posts
        .iter()
        .filter(|post| local_date(post.timestamp) == Some(day));
    tally_by_employee(filtered, directory)
}

fn tally_by_employee<'a>(
    posts: impl Iterator<Item = &'a PostEntry>,
    directory: &HashMap<String, String>,
) -> Vec<EmployeeCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        let code = post
            .created_by
            .as_deref()
            .filter(|code| !code.is_empty())
            .unwrap_or("Unknown");
        *counts.entry(code).or_insert(0) += 1;
    }
    let mut rows: Vec<EmployeeCount> = counts
        .into_iter()
        .map(|(code, posts)| EmployeeCount {
            name: display_name(directory, code),
            posts,
        })
        .collect();
    rows.sort_by(|a, b| b.posts.cmp(&a.posts));
    rows
}

/// Directory misses fall back to the raw employee code.
fn display_name(directory: &HashMap<String, String>, code: &str) -> String {
    directory
        .get(code)
        .cloned()
        .unwrap_or_else(|| code.to_string())
}

/// The viewer's own posts in one month, bucketed per day and per type.
/// Type columns are discovered from the data actually present that month.
pub fn user_type_breakdown(
    posts: &[PostEntry],
    viewer_email: &str,
    year: i32,
    month: u32,
) -> TypeBreakdown {
    let day_count = days_in_month(year, month);
    let mut days: Vec<DayTypeCounts> = (1..=day_count)
        .map(|day| DayTypeCounts {
            day,
            counts: BTreeMap::new(),
        })
        .collect();
    let mut seen_types = BTreeSet::new();

    for post in posts {
        if post.created_by_email != viewer_email {
            continue;
        }
        let date = match local_date(post.timestamp) {
            Some(date) if in_month(date, year, month) => date,
            _ => continue,
        };
        let post_type = post
            .post_type
            .as_deref()
            .filter(|ty| !ty.is_empty())
            .unwrap_or(UNCATEGORIZED);
        seen_types.insert(post_type.to_string());
        let row = &mut days[(date.day() - 1) as usize];
        *row.counts.entry(post_type.to_string()).or_insert(0) += 1;
    }

    TypeBreakdown {
        days,
        unique_post_types: seen_types.into_iter().collect(),
    }
}

/// Month selector values: the latest `count` months, newest first.
pub fn month_options(today: NaiveDate, count: usize) -> Vec<(i32, u32)> {
    let mut options = Vec::with_capacity(count);
    let (mut year, mut month) = (today.year(), today.month());
    for _ in 0..count {
        options.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    options
}

/// Day selector values for one month, newest first.
pub fn day_options(year: i32, month: u32) -> Vec<NaiveDate> {
    (1..=days_in_month(year, month))
        .rev()
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // Timestamps built through Local map back to the same local date no
    // matter which zone the test host runs in.
    fn ts(year: i32, month: u32, day: u32, hour: u32) -> i64 {
        Local
            .with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .expect("valid local time")
            .timestamp_millis()
    }

    fn post(email: &str, code: Option<&str>, post_type: Option<&str>, timestamp: i64) -> PostEntry {
        PostEntry {
            id: timestamp.to_string(),
            image_data: None,
            image_file_id: None,
            description: "caption".to_string(),
            tags: String::new(),
            post_type: post_type.map(str::to_string),
            post_url: None,
            timestamp,
            created_by: code.map(str::to_string),
            created_by_email: email.to_string(),
        }
    }

    fn may_2024_posts() -> Vec<PostEntry> {
        vec![
            post("a@x.com", Some("E01"), Some("Blog"), ts(2024, 5, 1, 10)),
            post("a@x.com", Some("E01"), Some("Blog"), ts(2024, 5, 2, 9)),
            post("a@x.com", Some("E01"), Some("FB"), ts(2024, 5, 2, 18)),
        ]
    }

    #[test]
    fn days_in_month_handles_lengths_and_leap_years() {
        assert_eq!(days_in_month(2024, 5), 31);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn daily_series_is_zero_filled_and_sums_to_month_count() {
        let mut posts = may_2024_posts();
        posts.push(post("b@x.com", Some("E02"), None, ts(2024, 5, 31, 23)));
        posts.push(post("b@x.com", Some("E02"), None, ts(2024, 6, 1, 6)));

        let series = daily_series(&posts, 2024, 5);
        assert_eq!(series.len(), 31);
        for (index, entry) in series.iter().enumerate() {
            assert_eq!(entry.day, index as u32 + 1);
        }
        let total: usize = series.iter().map(|d| d.posts).sum();
        assert_eq!(total, 4);
        assert_eq!(series[0].posts, 1);
        assert_eq!(series[1].posts, 2);
        assert_eq!(series[2].posts, 0);
        assert_eq!(series[30].posts, 1);
    }

    #[test]
    fn month_summary_matches_series() {
        let posts = may_2024_posts();
        let summary = month_summary(&posts, 2024, 5);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.month_total, 3);
        assert_eq!(summary.max_per_day, 2);
        assert_eq!(summary.avg_per_day, 0.1);

        let empty = month_summary(&posts, 2024, 7);
        assert_eq!(empty.month_total, 0);
        assert_eq!(empty.avg_per_day, 0.0);
        assert_eq!(empty.max_per_day, 0);
    }

    #[test]
    fn posts_today_counts_only_the_viewer() {
        let posts = vec![
            post("a@x.com", None, None, ts(2024, 5, 2, 8)),
            post("a@x.com", None, None, ts(2024, 5, 2, 20)),
            post("b@x.com", None, None, ts(2024, 5, 2, 12)),
            post("a@x.com", None, None, ts(2024, 5, 1, 12)),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(posts_today(&posts, "a@x.com", today), 2);
        assert_eq!(posts_today(&posts, "b@x.com", today), 1);
        assert_eq!(posts_today(&posts, "c@x.com", today), 0);
    }

    #[test]
    fn employee_totals_relabel_and_sort_descending() {
        let posts = vec![
            post("a@x.com", Some("E01"), None, ts(2024, 5, 1, 9)),
            post("a@x.com", Some("E01"), None, ts(2024, 5, 2, 9)),
            post("b@x.com", Some("E02"), None, ts(2024, 5, 2, 10)),
            post("c@x.com", None, None, ts(2024, 5, 3, 10)),
        ];
        let directory = HashMap::from([("E01".to_string(), "Som".to_string())]);

        let totals = employee_totals(&posts, &directory);
        assert_eq!(totals[0], EmployeeCount { name: "Som".to_string(), posts: 2 });
        // No directory entry: the raw code shows through; no code at all
        // buckets under "Unknown".
        let names: Vec<&str> = totals.iter().map(|row| row.name.as_str()).collect();
        assert!(names.contains(&"E02"));
        assert!(names.contains(&"Unknown"));

        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let on_day = employee_totals_on_day(&posts, day, &directory);
        assert_eq!(on_day.len(), 2);
        let in_month = employee_totals_in_month(&posts, 2024, 5, &directory);
        assert_eq!(in_month.iter().map(|r| r.posts).sum::<usize>(), 4);
    }

    #[test]
    fn type_breakdown_matches_reference_scenario() {
        // a@x.com: 3 posts on 2024-05-01, 2024-05-02, 2024-05-02 of types
        // Blog, Blog, FB.
        let posts = may_2024_posts();
        let breakdown = user_type_breakdown(&posts, "a@x.com", 2024, 5);

        assert_eq!(breakdown.unique_post_types, vec!["Blog", "FB"]);
        assert_eq!(breakdown.days.len(), 31);
        assert_eq!(
            breakdown.days[0].counts,
            BTreeMap::from([("Blog".to_string(), 1)])
        );
        assert_eq!(
            breakdown.days[1].counts,
            BTreeMap::from([("Blog".to_string(), 1), ("FB".to_string(), 1)])
        );
        for row in &breakdown.days[2..] {
            assert!(row.counts.is_empty());
        }
    }

    #[test]
    fn type_breakdown_ignores_other_users_and_buckets_untyped() {
        let mut posts = may_2024_posts();
        posts.push(post("b@x.com", None, Some("IG"), ts(2024, 5, 1, 12)));
        posts.push(post("a@x.com", None, None, ts(2024, 5, 3, 12)));

        let breakdown = user_type_breakdown(&posts, "a@x.com", 2024, 5);
        assert_eq!(
            breakdown.unique_post_types,
            vec!["Blog", "FB", UNCATEGORIZED]
        );
        assert_eq!(
            breakdown.days[2].counts,
            BTreeMap::from([(UNCATEGORIZED.to_string(), 1)])
        );
        assert!(!breakdown.unique_post_types.contains(&"IG".to_string()));
    }

    #[test]
    fn month_options_walk_backwards_across_years() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(
            month_options(today, 4),
            vec![(2024, 2), (2024, 1), (2023, 12), (2023, 11)]
        );
    }

    #[test]
    fn day_options_are_newest_first() {
        let days = day_options(2024, 2);
        assert_eq!(days.len(), 29);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(days[28], NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
