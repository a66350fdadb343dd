use std::future::Future;

use chrono::{Local, NaiveTime, TimeZone};

use crate::error::{EnumError, Result};

/// Parses `--start-time`'s `HH:MM` into a wall-clock time, failing fast on
/// startup if the format is wrong.
pub fn parse_start_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| EnumError::InvalidStartTime(value.to_string()))
}

fn next_occurrence(target: NaiveTime) -> chrono::DateTime<Local> {
    let now = Local::now();
    let today = Local
        .from_local_datetime(&now.date_naive().and_time(target))
        .single()
        .unwrap_or(now);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// A one-line wall-clock polling loop: sleeps until the next occurrence of
/// `target`, then runs `callback`, forever. This is a thin external
/// collaborator around the enumeration engine, not part of it — the engine
/// has no notion of schedules.
pub async fn run_scheduled<F, Fut>(target: NaiveTime, mut callback: F) -> !
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let next = next_occurrence(target);
        let wait = (next - Local::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        tokio::time::sleep(wait).await;
        callback().await;
    }
}
