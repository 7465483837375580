use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::geo::Coordinate;

use super::{ActivityID, UserID};

#[derive(Debug, Clone)]
pub struct Participant {
    pub user: UserID,
    pub joined: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub host: UserID,
    pub activity: ActivityID,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_participants: u32,
    pub description: String,
    pub banner_url: Option<String>,
    pub attachments: Vec<String>,
    /// In join order.
    pub participants: Vec<Participant>,
    pub created: DateTime<Utc>,
}

impl Event {
    /// Both halves must be present and finite, otherwise the event has no
    /// usable position.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(Coordinate { lat, lng }),
            _ => None,
        }
    }

    pub fn has_participant(&self, user: &UserID) -> bool {
        self.participants.iter().any(|p| &p.user == user)
    }

    pub fn is_full(&self) -> bool {
        self.max_participants > 0 && self.participants.len() >= self.max_participants as usize
    }
}

/// What a host fills in when creating or editing an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    pub activity_id: ActivityID,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub max_participants: u32,
    #[serde(default)]
    pub description: String,
    pub banner_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}
