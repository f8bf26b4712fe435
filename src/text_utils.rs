use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Parses the stem of a post file name, e.g. `2020-01-01-10-00`.
pub fn parse_post_stamp(stem: &str) -> Result<NaiveDateTime, String> {
    lazy_static! {
        static ref STAMP_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{2}-\d{2}$").unwrap();
    }

    if !STAMP_REGEX.is_match(stem) {
        return Err(format!("Unable to parse post date {}", stem));
    }

    NaiveDateTime::parse_from_str(stem, "%Y-%m-%d-%H-%M")
        .map_err(|e| format!("Invalid post date {}: {}", stem, e))
}

pub fn time_from_nanos(nanos: i64) -> Option<DateTime<Utc>> {
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let nsecs = nanos.rem_euclid(NANOS_PER_SEC) as u32;
    DateTime::from_timestamp(secs, nsecs)
}

pub fn nanos_from(date_time: &DateTime<Utc>) -> Option<i64> {
    date_time.timestamp_nanos_opt()
}

/// `01/02/2006 at 3:04pm`
pub fn format_time(date_time: &NaiveDateTime) -> String {
    date_time.format("%m/%d/%Y at %-I:%M%P").to_string()
}

pub fn pluralize(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Stable sort, newest first. Items with equal timestamps keep their order.
pub fn sort_newest_first<T, K, F>(items: &mut [T], created: F)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| newer_first(&created(a), &created(b)));
}

fn newer_first<K: Ord>(a: &K, b: &K) -> Ordering {
    if a > b {
        Ordering::Less
    } else if a < b {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}
