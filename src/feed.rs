//! Calendar feed fetching and parsing.
//!
//! The feed is plain ICS. Events come out as a neutral [`CalendarEvent`]
//! with each timestamp kept in the form the feed gave it ([`EventStamp`]);
//! coercion to a calendar date in the run's timezone happens in one place.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use ical::IcalParser;
use log::{debug, warn};
use std::io::BufReader;
use std::time::Duration;

use crate::geocode::USER_AGENT;

const FEED_TIMEOUT: Duration = Duration::from_secs(30);

/// A start or end instant as the feed encoded it: a whole-day date, a
/// date-time with no zone (floating), or a zoned date-time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventStamp {
    Date(NaiveDate),
    Floating(NaiveDateTime),
    Zoned(DateTime<Utc>),
}

impl EventStamp {
    /// The calendar date of this instant in `tz`. Floating values are taken
    /// to already be in the configured timezone.
    pub fn local_date(self, tz: Tz) -> NaiveDate {
        match self {
            EventStamp::Date(d) => d,
            EventStamp::Floating(dt) => dt.date(),
            EventStamp::Zoned(dt) => dt.with_timezone(&tz).date_naive(),
        }
    }
}

/// One VEVENT, reduced to the fields trip extraction needs.
#[derive(Debug, Clone, Default)]
pub struct CalendarEvent {
    pub summary: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventStamp>,
    pub end: Option<EventStamp>,
}

/// Download and parse the feed. Any fetch or parse failure is fatal for the
/// run; no trips can be derived without the feed.
pub async fn fetch_feed(url: &str) -> Result<Vec<CalendarEvent>> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FEED_TIMEOUT)
        .build()?;
    let body = client
        .get(url)
        .send()
        .await
        .context("Failed to fetch calendar feed")?
        .error_for_status()
        .context("Calendar feed returned an error status")?
        .text()
        .await
        .context("Failed to read calendar feed body")?;
    parse_feed(&body)
}

/// Parse ICS text into events.
pub fn parse_feed(text: &str) -> Result<Vec<CalendarEvent>> {
    let mut events = Vec::new();
    for calendar in IcalParser::new(BufReader::new(text.as_bytes())) {
        let calendar = calendar.map_err(|e| anyhow!("Failed to parse calendar feed: {e}"))?;
        for event in calendar.events {
            events.push(convert_event(&event));
        }
    }
    debug!("Parsed {} event(s) from feed", events.len());
    Ok(events)
}

fn convert_event(event: &IcalEvent) -> CalendarEvent {
    let mut out = CalendarEvent::default();
    for prop in &event.properties {
        match prop.name.as_str() {
            "SUMMARY" => out.summary = text_value(prop),
            "LOCATION" => out.location = text_value(prop),
            "DTSTART" => out.start = parse_stamp(prop),
            "DTEND" => out.end = parse_stamp(prop),
            _ => {}
        }
    }
    out
}

/// Non-empty, unescaped text of a property.
fn text_value(prop: &Property) -> Option<String> {
    let raw = prop.value.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(unescape_text(raw))
}

/// Undo RFC 5545 text escaping (`\,` `\;` `\\` `\n`).
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(next) => out.push(next),
            None => out.push('\\'),
        }
    }
    out
}

fn param_value<'a>(prop: &'a Property, name: &str) -> Option<&'a str> {
    prop.params
        .as_ref()?
        .iter()
        .find(|(key, _)| key == name)
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

/// Decode a DTSTART/DTEND value: `YYYYMMDD`, `YYYYMMDDTHHMMSS` (floating or
/// with a TZID parameter), or `YYYYMMDDTHHMMSSZ` (UTC). Anything else is
/// treated as absent.
fn parse_stamp(prop: &Property) -> Option<EventStamp> {
    let raw = prop.value.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y%m%d") {
        return Some(EventStamp::Date(date));
    }
    if let Some(stripped) = raw.strip_suffix('Z') {
        let dt = NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S").ok()?;
        return Some(EventStamp::Zoned(Utc.from_utc_datetime(&dt)));
    }
    let dt = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S").ok()?;
    if let Some(tzid) = param_value(prop, "TZID") {
        match tzid.parse::<Tz>() {
            Ok(tz) => {
                let zoned = tz.from_local_datetime(&dt).earliest()?;
                return Some(EventStamp::Zoned(zoned.with_timezone(&Utc)));
            }
            Err(_) => {
                warn!("Unknown TZID '{}' in feed; treating time as floating", tzid);
            }
        }
    }
    Some(EventStamp::Floating(dt))
}
