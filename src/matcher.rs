//! Two-phase trip-to-contact matching: exact city name first, then nearest
//! geocoded contact city within a radius.

use anyhow::Result;
use log::{debug, warn};

use crate::contacts::{ContactDirectory, ContactFile};
use crate::geo::haversine_km;
use crate::geocode::GeocodeResolver;
use crate::normalize::normalize_city;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Radius,
}

/// A resolved (trip city → contact file) pairing. `distance_km` is only
/// present for radius matches.
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub file: &'a ContactFile,
    pub kind: MatchKind,
    pub distance_km: Option<f64>,
}

/// Find the contact file for a trip city, or `None` when the trip has no
/// local contacts (a normal outcome, not an error).
///
/// The exact phase always runs to completion before the radius phase is
/// attempted; a name match is never overridden by a nearer but
/// differently-named contact file.
pub async fn match_city<'a>(
    trip_city: &str,
    contacts: &'a ContactDirectory,
    resolver: &mut GeocodeResolver<'_>,
    radius_km: f64,
) -> Result<Option<MatchResult<'a>>> {
    let normalized_trip = normalize_city(trip_city);

    if let Some(file) = contacts.get(&normalized_trip) {
        debug!("Exact key match for '{}'", normalized_trip);
        return Ok(Some(MatchResult { file, kind: MatchKind::Exact, distance_km: None }));
    }

    // Substring pass: a contact key embedded in the trip city (e.g. the trip
    // string carries a venue or neighborhood alongside the city). Longest
    // key wins as the most specific identification.
    let mut best_substring: Option<(&str, &ContactFile)> = None;
    for (key, file) in contacts.iter() {
        if normalized_trip.contains(key.as_str())
            && best_substring.map_or(true, |(best, _)| key.len() > best.len())
        {
            best_substring = Some((key, file));
        }
    }
    if let Some((key, file)) = best_substring {
        debug!("Substring match '{}' within '{}'", key, normalized_trip);
        return Ok(Some(MatchResult { file, kind: MatchKind::Exact, distance_km: None }));
    }

    // Radius phase. An unresolvable trip city means no match; there is
    // nothing to measure distances from.
    let Some(trip_coord) = resolver.resolve(trip_city).await? else {
        debug!("Trip city '{}' did not geocode; no match", trip_city);
        return Ok(None);
    };

    let mut best: Option<(f64, &ContactFile)> = None;
    let mut skipped = 0usize;
    for (_, file) in contacts.iter() {
        // Contact cities that do not geocode are skipped, not fatal.
        let Some(coord) = resolver.resolve(&file.city).await? else {
            skipped += 1;
            continue;
        };
        let distance = haversine_km(trip_coord, coord);
        if distance <= radius_km && best.map_or(true, |(best_d, _)| distance < best_d) {
            best = Some((distance, file));
        }
    }
    if best.is_none() && skipped == contacts.len() && skipped > 0 {
        warn!(
            "No contact city could be geocoded while radius-matching '{}'",
            trip_city
        );
    }

    Ok(best.map(|(distance, file)| MatchResult {
        file,
        kind: MatchKind::Radius,
        distance_km: Some(distance),
    }))
}
