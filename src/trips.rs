//! Trip extraction: window filtering, city grouping and date-range merging.

use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use log::debug;
use std::collections::BTreeMap;

use crate::feed::CalendarEvent;
use crate::normalize::normalize_city;

/// One upcoming trip, grouped from every feed event sharing a normalized
/// city. `id` is the normalized city key and the trip's identity across
/// runs; `city` keeps the first raw spelling for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: String,
    pub city: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Derive trips from the event stream.
///
/// An event is kept iff its date span overlaps
/// `[now, now + lookahead_days]` (inclusive, at date granularity in `tz`),
/// it has a resolvable start, and it names a city (location, else summary).
/// Events sharing a normalized city merge into one trip whose span is the
/// union of the contributing spans.
pub fn extract_trips(
    events: &[CalendarEvent],
    now: DateTime<Tz>,
    lookahead_days: i64,
    tz: Tz,
) -> Vec<Trip> {
    let window_start = now.date_naive();
    let window_end = (now + Duration::days(lookahead_days)).date_naive();

    let mut grouped: BTreeMap<String, Trip> = BTreeMap::new();
    for event in events {
        let Some(start) = event.start.map(|s| s.local_date(tz)) else {
            continue;
        };
        let end = event.end.map(|e| e.local_date(tz));
        // A missing end means a single-day event for windowing purposes.
        let effective_end = end.unwrap_or(start);
        if start > window_end || effective_end < window_start {
            continue;
        }

        let Some(city) = event_city(event) else {
            debug!("Skipping event with no location or summary");
            continue;
        };
        let key = normalize_city(&city);
        if key.is_empty() {
            continue;
        }

        match grouped.get_mut(&key) {
            None => {
                grouped.insert(
                    key.clone(),
                    Trip { id: key, city, start_date: Some(start), end_date: end },
                );
            }
            Some(trip) => {
                if trip.start_date.map_or(true, |existing| start < existing) {
                    trip.start_date = Some(start);
                }
                if let Some(end) = end {
                    if trip.end_date.map_or(true, |existing| end > existing) {
                        trip.end_date = Some(end);
                    }
                }
            }
        }
    }

    grouped.into_values().collect()
}

/// Display city for an event: non-empty location wins, then summary.
fn event_city(event: &CalendarEvent) -> Option<String> {
    for field in [&event.location, &event.summary] {
        if let Some(value) = field {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
