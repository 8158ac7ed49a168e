//! Candidate selection and field extraction for multi-result reverse lookups.
//!
//! A reverse query near a city edge can come back with a dozen candidates,
//! several of which name the wrong municipality. Selection runs in two passes:
//!
//! 1. If the query falls inside a [`LocalityRule`]'s box, the first candidate
//!    mentioning the rule's name or an alias wins, regardless of distance.
//! 2. Otherwise the candidate nearest the query in raw degrees wins.

use civic_common::{Coordinates, LocalityRule, Provenance, ResolvedLocation};
use geocoding_client::{Candidate, Components};

/// A chosen candidate and the rule that chose it, if any.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub candidate: &'a Candidate,
    pub rule: Option<&'a LocalityRule>,
}

pub fn select<'a>(
    candidates: &'a [Candidate],
    coords: &Coordinates,
    rules: &'a [LocalityRule],
) -> Option<Selection<'a>> {
    for rule in rules.iter().filter(|r| r.covers(coords)) {
        let matched = candidates.iter().find(|c| {
            rule.mentions(&c.formatted)
                || c.components.city.as_deref().is_some_and(|city| rule.mentions(city))
        });
        if let Some(candidate) = matched {
            return Some(Selection {
                candidate,
                rule: Some(rule),
            });
        }
    }

    nearest(candidates, coords).map(|candidate| Selection {
        candidate,
        rule: None,
    })
}

/// Earliest candidate with the smallest degree distance. Candidates without
/// geometry only win when nothing else has any.
fn nearest<'a>(candidates: &'a [Candidate], coords: &Coordinates) -> Option<&'a Candidate> {
    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in candidates {
        let distance = candidate
            .geometry
            .as_ref()
            .map(|g| coords.degree_distance(g.lat, g.lng))
            .unwrap_or(f64::INFINITY);
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(c, _)| c)
}

fn first_of(fields: &[&Option<String>]) -> String {
    fields
        .iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn or_default(value: String, fallback: Option<&String>) -> String {
    match fallback {
        Some(f) if value.is_empty() => f.clone(),
        _ => value,
    }
}

/// Project a selected candidate onto the common location shape. Fields the
/// provider left out become `""`; a matching rule fills in its defaults.
pub fn extract(selection: Selection<'_>) -> ResolvedLocation {
    let c: &Components = &selection.candidate.components;

    let mut location = ResolvedLocation {
        formatted_address: selection.candidate.formatted.trim().to_string(),
        place_name: first_of(&[
            &c.attraction,
            &c.building,
            &c.road,
            &c.neighbourhood,
            &c.suburb,
            &c.city_district,
        ]),
        neighborhood: first_of(&[&c.neighbourhood, &c.suburb, &c.city_district]),
        ward: first_of(&[&c.city_district, &c.municipality, &c.county]),
        city: first_of(&[&c.city, &c.town, &c.village]),
        district: first_of(&[&c.county, &c.state_district]),
        state: first_of(&[&c.state]),
        country: first_of(&[&c.country]),
        provenance: Provenance::Live,
    };

    if let Some(rule) = selection.rule {
        if !rule.mentions(&location.city) {
            location.city = rule.name.clone();
        }
        location.district = or_default(location.district, rule.district.as_ref());
        location.state = or_default(location.state, rule.state.as_ref());
        location.country = or_default(location.country, rule.country.as_ref());
    }

    location
}
