//! Run orchestration: wire the feed, matcher, task sink and persisted state
//! together for one sequential pass.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::path::Path;

use crate::config::Config;
use crate::contacts::ContactDirectory;
use crate::feed;
use crate::geo::GeoCache;
use crate::geocode::{GeocodeResolver, Geocoder, NominatimGeocoder};
use crate::matcher::match_city;
use crate::state::OutreachState;
use crate::tasks::{build_description, build_title, TaskSink, TodoistSink};
use crate::trips::{extract_trips, Trip};

const STATE_FILE: &str = "state.json";
const GEO_CACHE_FILE: &str = "geo_cache.json";

/// What one run did, for the closing summary.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub trips_processed: usize,
    pub tasks_created: usize,
}

/// One complete run against the live collaborators.
pub async fn run(config_path: &Path, ignore_state: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    config.validate()?;
    let api_token = config
        .api_token()
        .ok_or_else(|| anyhow!("Missing Todoist API token"))?;

    let contacts_path = config.contacts_path();
    let contacts = ContactDirectory::load(&contacts_path)?;
    if contacts.is_empty() {
        return Err(anyhow!("No contacts found in {}", contacts_path.display()));
    }
    info!("Loaded {} contact file(s) from {}", contacts.len(), contacts_path.display());

    let state_dir = config.state_dir()?;
    let state_path = state_dir.join(STATE_FILE);
    let cache_path = state_dir.join(GEO_CACHE_FILE);
    let mut state = OutreachState::load(&state_path)?;
    let mut cache = GeoCache::load(&cache_path)?;
    if ignore_state {
        warn!("Ignoring processed-trip state for this run");
    }

    let tz = config.tz();
    let events = feed::fetch_feed(&config.ics_url).await?;
    let now = Utc::now().with_timezone(&tz);
    let trips = extract_trips(&events, now, config.lookahead_days, tz);
    if trips.is_empty() {
        println!("No upcoming trips found.");
        return Ok(());
    }

    let new_trips: Vec<Trip> = trips
        .into_iter()
        .filter(|t| ignore_state || !state.is_processed(&t.id))
        .collect();
    if new_trips.is_empty() {
        println!("No new trips to process.");
        return Ok(());
    }
    info!("{} new trip(s) to process", new_trips.len());

    let geocoder = NominatimGeocoder::new()?;
    let sink = TodoistSink::new(api_token)?;
    let outcome = process_trips(
        &new_trips,
        &contacts,
        &geocoder,
        &mut cache,
        &sink,
        &mut state,
        config.radius_km,
        &config.timezone,
    )
    .await?;

    // Persist exactly once, after the whole run succeeded.
    state.save(&state_path)?;
    cache.save(&cache_path)?;

    println!("Created {} Todoist task(s).", outcome.tasks_created);
    Ok(())
}

/// Match each trip and emit one task per contact. Every trip ends up in the
/// processed set, matched or not; a trip with no local contacts is handled
/// and must not be retried on the next run.
#[allow(clippy::too_many_arguments)]
pub async fn process_trips(
    trips: &[Trip],
    contacts: &ContactDirectory,
    geocoder: &dyn Geocoder,
    cache: &mut GeoCache,
    sink: &dyn TaskSink,
    state: &mut OutreachState,
    radius_km: f64,
    timezone: &str,
) -> Result<RunOutcome> {
    let mut outcome = RunOutcome::default();
    let mut resolver = GeocodeResolver::new(geocoder, cache);

    for trip in trips {
        let matched = match_city(&trip.city, contacts, &mut resolver, radius_km).await?;
        match matched {
            None => {
                info!("No local contacts for trip to {}", trip.city);
            }
            Some(matched) => {
                let contact_list = matched.file.read_contacts().with_context(|| {
                    format!("Failed to read contacts for {}", matched.file.city)
                })?;
                for contact in &contact_list {
                    let title = build_title(contact, trip);
                    let description = build_description(trip, contact, &matched, timezone);
                    sink.create_task(&title, &description).await?;
                    outcome.tasks_created += 1;
                }
                info!(
                    "Trip to {}: {} task(s) via {} contact file",
                    trip.city,
                    contact_list.len(),
                    matched.file.city
                );
            }
        }
        state.mark_processed(&trip.id);
        outcome.trips_processed += 1;
    }

    Ok(outcome)
}
