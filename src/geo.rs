//! Great-circle distances and the event orderings built on them.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::data::Event;

const EARTH_RADIUS_KM: f64 = 6371.0;

static MAPS_SEARCH: Lazy<Url> = Lazy::new(|| Url::parse("https://www.google.com/maps/search/").expect("valid maps url"));

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Haversine distance in kilometres, rounded to one decimal.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let a = a.min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    (EARTH_RADIUS_KM * c * 10.0).round() / 10.0
}

pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    calculate_distance(a.lat, a.lng, b.lat, b.lng)
}

/// Parses `"lat,lng"`. Anything else, including non-finite numbers, is `None`.
pub fn parse_coordinates(text: &str) -> Option<Coordinate> {
    let mut parts = text.split(',');
    let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let lat = lat.trim().parse::<f64>().ok().filter(|x| x.is_finite())?;
    let lng = lng.trim().parse::<f64>().ok().filter(|x| x.is_finite())?;
    Some(Coordinate { lat, lng })
}

pub fn format_coordinates(lat: f64, lng: f64) -> String {
    format!("{:.6}, {:.6}", lat, lng)
}

/// Link to the event on Google Maps, by position when known and by the
/// free-text location otherwise.
pub fn maps_url(location: &str, coordinate: Option<Coordinate>) -> String {
    match coordinate {
        Some(c) => format!("https://www.google.com/maps?q={},{}", c.lat, c.lng),
        None => {
            let mut url = MAPS_SEARCH.clone();
            url.query_pairs_mut()
                .append_pair("api", "1")
                .append_pair("query", location);
            url.into()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SortMode {
    #[default]
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "distance-home")]
    DistanceHome,
    #[serde(rename = "distance-office")]
    DistanceOffice,
}

/// The viewer's own places, taken from their profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct References {
    pub home: Option<Coordinate>,
    pub office: Option<Coordinate>,
}

impl References {
    fn for_mode(&self, mode: SortMode) -> Option<Coordinate> {
        match mode {
            SortMode::Time => None,
            SortMode::DistanceHome => self.home,
            SortMode::DistanceOffice => self.office,
        }
    }
}

/// `None` when either side has no position.
pub fn distance_to(reference: Option<Coordinate>, event: &Event) -> Option<f64> {
    Some(distance_between(reference?, event.coordinate()?))
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Orders `items` by start time or by distance from one of the viewer's
/// places. Stable: ties, and events without a distance, keep their input
/// order, and the latter always end up last.
pub fn sort_events<T, F>(items: &mut [T], mode: SortMode, references: &References, event: F)
    where F: Fn(&T) -> &Event {
    match mode {
        SortMode::Time => items.sort_by(|a, b| event(a).start.cmp(&event(b).start)),
        SortMode::DistanceHome | SortMode::DistanceOffice => {
            let reference = references.for_mode(mode);
            items.sort_by(|a, b| compare_distance(
                distance_to(reference, event(a)),
                distance_to(reference, event(b)),
            ))
        }
    }
}
