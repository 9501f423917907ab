//! "How long have we been together" text shown on the public page.

use std::time::Duration;

use amor_shared::constants::ANNIVERSARY_REFRESH_SECS;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

pub const UNSET_TEXT: &str = "Por favor, defina a data do aniversário no dashboard.";
pub const INVALID_TEXT: &str = "Data do aniversário inválida.";
pub const FUTURE_TEXT: &str = "Nosso tempo especial ainda vai começar!";
pub const JUST_STARTED_TEXT: &str = "Eu te amo há alguns segundos!";

/// Calendar distance between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl Elapsed {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Parse a stored anniversary date as local wall-clock time.
///
/// Accepts an RFC 3339 timestamp (converted to local time), a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp, or a bare `YYYY-MM-DD` date.
pub fn parse_anniversary(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Years, months and days from `start` to `now`; `None` if `start` is in
/// the future.
///
/// Only the calendar dates are compared. A negative day count borrows the
/// length of the month before `now`'s month.
pub fn elapsed_between(start: NaiveDateTime, now: NaiveDateTime) -> Option<Elapsed> {
    if now < start {
        return None;
    }

    let mut years = now.year() - start.year();
    let mut months = now.month() as i32 - start.month() as i32;
    let mut days = now.day() as i32 - start.day() as i32;

    if days < 0 {
        days += days_in_previous_month(now.date()) as i32;
        months -= 1;
    }
    if months < 0 {
        months += 12;
        years -= 1;
    }

    Some(Elapsed {
        years: u32::try_from(years).ok()?,
        months: u32::try_from(months).ok()?,
        // Still negative when the start day does not exist in the
        // borrowed month (Jan 31 → Mar 1).
        days: u32::try_from(days).unwrap_or(0),
    })
}

fn days_in_previous_month(date: NaiveDate) -> u32 {
    date.with_day(1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Text for the public page given the stored date and the current time.
pub fn anniversary_text(anniversary: Option<&str>, now: NaiveDateTime) -> String {
    let Some(raw) = anniversary.filter(|s| !s.trim().is_empty()) else {
        return UNSET_TEXT.to_string();
    };
    let Some(start) = parse_anniversary(raw) else {
        return INVALID_TEXT.to_string();
    };
    let Some(elapsed) = elapsed_between(start, now) else {
        return FUTURE_TEXT.to_string();
    };
    if elapsed.is_zero() {
        return JUST_STARTED_TEXT.to_string();
    }

    let mut parts = Vec::with_capacity(3);
    match elapsed.years {
        0 => {}
        1 => parts.push("1 ano".to_string()),
        n => parts.push(format!("{n} anos")),
    }
    match elapsed.months {
        0 => {}
        1 => parts.push("1 mês".to_string()),
        n => parts.push(format!("{n} meses")),
    }
    match elapsed.days {
        0 => {}
        1 => parts.push("1 dia".to_string()),
        n => parts.push(format!("{n} dias")),
    }
    format!("Eu te amo há {}.", parts.join(", "))
}

/// Publish the anniversary text now and every minute after, using the
/// local wall clock. The task ends once every receiver is dropped.
pub fn spawn_ticker(anniversary: Option<String>) -> watch::Receiver<String> {
    spawn_ticker_with(anniversary, || Local::now().naive_local())
}

pub fn spawn_ticker_with<F>(anniversary: Option<String>, clock: F) -> watch::Receiver<String>
where
    F: Fn() -> NaiveDateTime + Send + 'static,
{
    let (tx, rx) = watch::channel(anniversary_text(anniversary.as_deref(), clock()));

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(ANNIVERSARY_REFRESH_SECS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the initial text is already sent.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let text = anniversary_text(anniversary.as_deref(), clock());
            if tx.send(text).is_err() {
                tracing::debug!("Anniversary ticker stopped, no receivers left");
                break;
            }
        }
    });

    rx
}
