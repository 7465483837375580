//! JSON views handed back by the API. Everything about another person goes
//! through the privacy filter here, so no handler can leak a hidden field.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db::DB, data::{ActivityID, ActivityType, Comment, CommentID, Event, EventID, PublicProfile, Role, User, UserID, filter_profile, Profile}, geo::{distance_to, maps_url, References}};

use self::format::{format_distance, format_duration, format_time_range};

mod format;

#[derive(Serialize)]
pub struct ActivityView<'a> {
    pub id: &'a ActivityID,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub created: DateTime<Utc>,
    pub favorite: bool,
}

#[derive(Serialize)]
pub struct ParticipantView {
    pub user: PublicProfile,
    pub joined: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct EventView<'a> {
    pub id: &'a EventID,
    pub activity: Option<ActivityView<'a>>,
    pub host: Option<PublicProfile>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_range: String,
    pub duration: String,
    pub location: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub maps_url: String,
    pub max_participants: u32,
    pub description: &'a str,
    pub banner_url: Option<&'a str>,
    pub attachments: &'a [String],
    pub participants: Vec<ParticipantView>,
    pub created: DateTime<Utc>,
    pub distance_from_home: Option<f64>,
    pub distance_from_office: Option<f64>,
    pub distance_from_home_text: Option<String>,
    pub distance_from_office_text: Option<String>,
}

#[derive(Serialize)]
pub struct CommentView<'a> {
    pub id: &'a CommentID,
    pub content: &'a str,
    pub created: DateTime<Utc>,
    pub user: Option<PublicProfile>,
}

/// Everything about the logged-in user, for their own settings page.
#[derive(Serialize)]
pub struct OwnProfileView<'a> {
    pub id: &'a UserID,
    pub user_name: &'a str,
    pub email: Option<&'a str>,
    pub role: Role,
    pub avatar_url: Option<&'a str>,
    #[serde(flatten)]
    pub profile: &'a Profile,
}

pub fn render_profile(db: &DB, id: &UserID) -> Option<PublicProfile> {
    db.get_user(id).map(|user| filter_profile(id, user, db.privacy_policy()))
}

pub fn render_own_profile<'a>(id: &'a UserID, user: &'a User) -> OwnProfileView<'a> {
    OwnProfileView {
        id,
        user_name: user.user_name.as_str(),
        email: user.email.as_deref(),
        role: user.role,
        avatar_url: user.avatar_url.as_deref(),
        profile: &user.profile,
    }
}

pub fn render_activity<'a>(db: &DB, viewer: Option<&UserID>, id: &'a ActivityID, activity: &'a ActivityType) -> ActivityView<'a> {
    ActivityView {
        id,
        name: activity.name.as_str(),
        description: activity.description.as_deref(),
        image_url: activity.image_url.as_deref(),
        created: activity.created,
        favorite: viewer.map_or(false, |v| db.is_favorite(v, id)),
    }
}

pub fn render_event<'a>(db: &'a DB, viewer: Option<&UserID>, references: &References, id: &'a EventID, event: &'a Event) -> EventView<'a> {
    let activity = db.get_activity(&event.activity)
        .map(|a| render_activity(db, viewer, &event.activity, a));
    let participants = event.participants.iter()
        .filter_map(|p| render_profile(db, &p.user).map(|user| ParticipantView { user, joined: p.joined }))
        .collect();
    let distance_from_home = distance_to(references.home, event);
    let distance_from_office = distance_to(references.office, event);
    EventView {
        id,
        activity,
        host: render_profile(db, &event.host),
        start: event.start,
        end: event.end,
        time_range: format_time_range(&event.start, &event.end),
        duration: format_duration(&event.start, &event.end),
        location: event.location.as_str(),
        latitude: event.latitude,
        longitude: event.longitude,
        maps_url: maps_url(&event.location, event.coordinate()),
        max_participants: event.max_participants,
        description: event.description.as_str(),
        banner_url: event.banner_url.as_deref(),
        attachments: &event.attachments,
        participants,
        created: event.created,
        distance_from_home,
        distance_from_office,
        distance_from_home_text: distance_from_home.map(format_distance),
        distance_from_office_text: distance_from_office.map(format_distance),
    }
}

pub fn render_comment<'a>(db: &DB, id: &'a CommentID, comment: &'a Comment) -> CommentView<'a> {
    CommentView {
        id,
        content: comment.content.as_str(),
        created: comment.created,
        user: render_profile(db, &comment.user),
    }
}
