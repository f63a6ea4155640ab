//! # Riddle Scheduling
//!
//! Fills upcoming days with riddles from the bank.
//!
//! ## Rules
//! - A day that already has a riddle is never overwritten, so the riddle players are solving
//!   right now cannot change under them
//! - A riddle already on the calendar (past or future) is not scheduled again
//! - Bank order is schedule order
//! - Running out of riddles leaves the remaining days empty; the server answers 404 for them
//!
//! ## Run
//! ```sh
//! cargo run -p process -- ../bank.json --start-offset 0 --days 14
//! ```
use std::collections::HashSet;

use anyhow::Error;
use bank::{Bank, get_bank, remote::get_remote_bank};
use chrono::{Duration, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use riddle_server::{
    database::{RedisStore, init_redis},
    store::Store,
};

pub mod models;
pub mod utils;

use models::ScheduleReport;
use utils::{sanitize_bank, today};

pub async fn load_riddles(
    source: &str,
    redis_url: &str,
    start_offset: i64,
    days: u32,
) -> Result<(), Error> {
    let mut bank = if source.starts_with("http://") || source.starts_with("https://") {
        get_remote_bank(source).await?
    } else {
        get_bank(source)?
    };

    println!("Loaded Riddles: {}", bank.riddles.len());

    let dropped = sanitize_bank(&mut bank);
    if dropped > 0 {
        println!("Dropped incomplete or duplicate riddles: {dropped}");
    }

    let store = RedisStore::new(init_redis(redis_url).await?);
    let start = today() + Duration::days(start_offset);

    let report = schedule_riddles(&store, &bank, start, days).await?;

    if report.scheduled.is_empty() {
        println!("No new days scheduled. Exiting.");
    } else {
        println!("\nScheduled:");
        for (date, id) in &report.scheduled {
            println!("  {date} {id}");
        }
    }

    println!("\nAlready Scheduled Days: {}", report.occupied_days);
    println!("Empty Days: {}", report.unfilled_days);
    println!("Unused Riddles: {}", report.unused);

    Ok(())
}

pub async fn schedule_riddles(
    store: &dyn Store,
    bank: &Bank,
    start: NaiveDate,
    days: u32,
) -> Result<ScheduleReport, Error> {
    let existing = store.schedule().await?;
    let used: HashSet<&str> = existing.values().map(|riddle| riddle.id.as_str()).collect();
    let mut queue = bank
        .riddles
        .iter()
        .filter(|riddle| !used.contains(riddle.id.as_str()));

    let pb = ProgressBar::new(days as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut report = ScheduleReport::default();

    for offset in 0..days {
        let date = start + Duration::days(offset as i64);
        pb.set_message(format!("Scheduling {date}"));

        if existing.contains_key(&date) {
            report.occupied_days += 1;
        } else if let Some(riddle) = queue.next() {
            store.put_riddle(date, riddle).await?;

            #[cfg(feature = "verbose")]
            println!("{date}: {}", riddle.id);

            report.scheduled.push((date, riddle.id.clone()));
        } else {
            report.unfilled_days += 1;
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    report.unused = queue.count();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use bank::Riddle;
    use riddle_server::store::MemoryStore;

    use super::*;

    fn riddle(id: &str) -> Riddle {
        Riddle {
            id: id.to_string(),
            question: format!("Question {id}?"),
            answer: id.to_string(),
            alternates: vec![],
            hints: vec![],
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    #[tokio::test]
    async fn test_fills_consecutive_days() {
        let store = MemoryStore::new();
        let bank = Bank {
            riddles: vec![riddle("a"), riddle("b")],
        };

        let report = schedule_riddles(&store, &bank, day(1), 3).await.unwrap();

        assert_eq!(
            report.scheduled,
            vec![(day(1), "a".to_string()), (day(2), "b".to_string())]
        );
        assert_eq!(report.unfilled_days, 1);
        assert_eq!(report.unused, 0);
        assert_eq!(store.riddle(day(2)).await.unwrap().unwrap().id, "b");
        assert!(store.riddle(day(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keeps_existing_days_and_skips_used_riddles() {
        let store = MemoryStore::new();
        store.put_riddle(day(2), &riddle("a")).await.unwrap();
        let bank = Bank {
            riddles: vec![riddle("a"), riddle("b"), riddle("c"), riddle("d")],
        };

        let report = schedule_riddles(&store, &bank, day(1), 3).await.unwrap();

        assert_eq!(
            report.scheduled,
            vec![(day(1), "b".to_string()), (day(3), "c".to_string())]
        );
        assert_eq!(report.occupied_days, 1);
        assert_eq!(report.unused, 1);
        assert_eq!(store.riddle(day(2)).await.unwrap().unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_rerun_is_noop() {
        let store = MemoryStore::new();
        let bank = Bank {
            riddles: vec![riddle("a"), riddle("b")],
        };

        schedule_riddles(&store, &bank, day(1), 2).await.unwrap();
        let report = schedule_riddles(&store, &bank, day(1), 2).await.unwrap();

        assert!(report.scheduled.is_empty());
        assert_eq!(report.occupied_days, 2);
        assert_eq!(report.unused, 0);
    }
}
