use std::{collections::HashMap, fs::{read_dir, read_to_string, create_dir_all}, io, path::{Path, PathBuf}};

use chrono::{DateTime, Utc};
use json::{JsonValue, object};
use log::warn;
use rand::distributions::{Alphanumeric, DistString};

use crate::{data::{ActivityID, ActivityType, Comment, CommentID, Event, EventID, Participant, PrivacyPolicy, PrivacyRecord, Profile, Role, User, UserID}, auth::PasswordStore};

const USERS: &str = "users";
const ACTIVITIES: &str = "activities";
const EVENTS: &str = "events";
const COMMENTS: &str = "comments";
const AUTH: &str = "auth";
const PRIVACY_FILE: &str = "privacy.json";

/// One JSON file per record, grouped in a directory per kind.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Default for Store {
    fn default() -> Self {
        Self::new("store")
    }
}

fn opt_string(json: &JsonValue) -> Option<String> {
    json.as_str().map(|x| x.to_string())
}

fn parse_time(json: &JsonValue) -> Option<DateTime<Utc>> {
    json.as_str()
        .and_then(|x| DateTime::parse_from_rfc3339(x).ok())
        .map(|x| x.with_timezone(&Utc))
}

fn time(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339()
}

fn strings(json: &JsonValue) -> Vec<String> {
    json.members().filter_map(|x| x.as_str()).map(|x| x.to_string()).collect()
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().and_then(|x| x.to_str()).map(|x| x.to_string())
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, kind: &str) -> PathBuf {
        self.root.join(kind)
    }

    fn file(&self, kind: &str, id: &str) -> PathBuf {
        self.dir(kind).join(id.to_string() + ".json")
    }

    fn write(&self, kind: &str, id: &str, json: JsonValue) -> io::Result<()> {
        create_dir_all(self.dir(kind))?;
        std::fs::write(self.file(kind, id), json.to_string())
    }

    /// Every readable record of one kind, keyed by file name. Broken files
    /// are skipped with a warning so one bad record can't keep the site down.
    fn load_all<K, V, F>(&self, kind: &str, parse: F) -> HashMap<K, V>
        where F: Fn(&JsonValue) -> Option<V>, K: From<String> + std::hash::Hash + Eq {
        let Ok(dir) = read_dir(self.dir(kind)) else {
            return HashMap::new();
        };
        dir.filter_map(|entry| {
            let path = entry.ok()?.path();
            let id = file_stem(&path)?;
            let value = read_to_string(&path).ok()
                .and_then(|x| json::parse(&x).ok())
                .and_then(|x| parse(&x));
            if value.is_none() {
                warn!("skipping unreadable record {}", path.display());
            }
            value.map(|v| (K::from(id), v))
        }).collect()
    }

    pub fn gen_id() -> String {
        Alphanumeric.sample_string(&mut rand::thread_rng(), 24)
    }
}

impl Store {
    pub(super) fn load_users(&self) -> HashMap<UserID, User> {
        self.load_all(USERS, |json| {
            let profile = &json["profile"];
            Some(User {
                user_name: json["user_name"].as_str()?.to_string(),
                email: opt_string(&json["email"]),
                role: Role::parse(json["role"].as_str().unwrap_or("user")),
                avatar_url: opt_string(&json["avatar_url"]),
                profile: Profile {
                    full_name: opt_string(&profile["full_name"]),
                    gender: opt_string(&profile["gender"]),
                    birth_year: profile["birth_year"].as_i32(),
                    marital_status: opt_string(&profile["marital_status"]),
                    work_unit: opt_string(&profile["work_unit"]),
                    home_address: opt_string(&profile["home_address"]),
                    office_address: opt_string(&profile["office_address"]),
                    home_coordinates: opt_string(&profile["home_coordinates"]),
                    office_coordinates: opt_string(&profile["office_coordinates"]),
                },
                favorites: strings(&json["favorites"]).into_iter().map(ActivityID).collect(),
                created: parse_time(&json["created"])?,
            })
        })
    }

    pub(super) fn load_activities(&self) -> HashMap<ActivityID, ActivityType> {
        self.load_all(ACTIVITIES, |json| Some(ActivityType {
            name: json["name"].as_str()?.to_string(),
            description: opt_string(&json["description"]),
            image_url: opt_string(&json["image_url"]),
            created: parse_time(&json["created"])?,
        }))
    }

    pub(super) fn load_events(&self) -> HashMap<EventID, Event> {
        self.load_all(EVENTS, |json| {
            let participants = json["participants"].members()
                .filter_map(|p| Some(Participant {
                    user: UserID(p["user"].as_str()?.to_string()),
                    joined: parse_time(&p["joined"])?,
                }))
                .collect();
            Some(Event {
                host: UserID(json["host"].as_str()?.to_string()),
                activity: ActivityID(json["activity"].as_str()?.to_string()),
                start: parse_time(&json["start"])?,
                end: parse_time(&json["end"])?,
                location: json["location"].as_str().unwrap_or_default().to_string(),
                latitude: json["latitude"].as_f64(),
                longitude: json["longitude"].as_f64(),
                max_participants: json["max_participants"].as_u32().unwrap_or(0),
                description: json["description"].as_str().unwrap_or_default().to_string(),
                banner_url: opt_string(&json["banner_url"]),
                attachments: strings(&json["attachments"]),
                participants,
                created: parse_time(&json["created"])?,
            })
        })
    }

    pub(super) fn load_comments(&self) -> HashMap<CommentID, Comment> {
        self.load_all(COMMENTS, |json| Some(Comment {
            created: parse_time(&json["created"])?,
            event: EventID(json["event"].as_str()?.to_string()),
            user: UserID(json["user"].as_str()?.to_string()),
            content: json["content"].as_str()?.to_string(),
        }))
    }

    pub(super) fn load_privacy(&self) -> Option<PrivacyRecord> {
        let json = read_to_string(self.root.join(PRIVACY_FILE))
            .ok().and_then(|j| json::parse(&j).ok())?;
        let flag = |key: &str| json[key].as_bool().unwrap_or(false);
        Some(PrivacyRecord {
            policy: PrivacyPolicy {
                show_full_name: flag("show_full_name"),
                show_gender: flag("show_gender"),
                show_age: flag("show_age"),
                show_work_unit: flag("show_work_unit"),
                show_marital_status: flag("show_marital_status"),
                show_home_address: flag("show_home_address"),
                show_office_address: flag("show_office_address"),
            },
            updated_by: opt_string(&json["updated_by"]).map(UserID),
            updated: parse_time(&json["updated"]).unwrap_or_else(Utc::now),
        })
    }
}

impl Store {
    pub(super) fn store_user(&self, id: &UserID, user: &User) -> io::Result<()> {
        let p = &user.profile;
        let profile = object! {
            full_name: p.full_name.as_deref(),
            gender: p.gender.as_deref(),
            birth_year: p.birth_year,
            marital_status: p.marital_status.as_deref(),
            work_unit: p.work_unit.as_deref(),
            home_address: p.home_address.as_deref(),
            office_address: p.office_address.as_deref(),
            home_coordinates: p.home_coordinates.as_deref(),
            office_coordinates: p.office_coordinates.as_deref(),
        };
        let favorites = user.favorites.iter().map(|x| x.0.as_str()).collect::<Vec<_>>();
        let json = object! {
            user_name: user.user_name.as_str(),
            email: user.email.as_deref(),
            role: user.role.as_str(),
            avatar_url: user.avatar_url.as_deref(),
            profile: profile,
            favorites: favorites,
            created: time(&user.created),
        };
        self.write(USERS, &id.0, json)
    }

    pub(super) fn store_activity(&self, id: &ActivityID, activity: &ActivityType) -> io::Result<()> {
        let json = object! {
            name: activity.name.as_str(),
            description: activity.description.as_deref(),
            image_url: activity.image_url.as_deref(),
            created: time(&activity.created),
        };
        self.write(ACTIVITIES, &id.0, json)
    }

    pub(super) fn store_event(&self, id: &EventID, event: &Event) -> io::Result<()> {
        let participants = event.participants.iter()
            .map(|p| object! { user: p.user.0.as_str(), joined: time(&p.joined) })
            .collect::<Vec<_>>();
        let attachments = event.attachments.iter().map(|x| x.as_str()).collect::<Vec<_>>();
        let json = object! {
            host: event.host.0.as_str(),
            activity: event.activity.0.as_str(),
            start: time(&event.start),
            end: time(&event.end),
            location: event.location.as_str(),
            latitude: event.latitude,
            longitude: event.longitude,
            max_participants: event.max_participants,
            description: event.description.as_str(),
            banner_url: event.banner_url.as_deref(),
            attachments: attachments,
            participants: participants,
            created: time(&event.created),
        };
        self.write(EVENTS, &id.0, json)
    }

    pub(super) fn store_comment(&self, id: &CommentID, comment: &Comment) -> io::Result<()> {
        let json = object! {
            created: time(&comment.created),
            event: comment.event.0.as_str(),
            user: comment.user.0.as_str(),
            content: comment.content.as_str(),
        };
        self.write(COMMENTS, &id.0, json)
    }

    pub(super) fn store_privacy(&self, record: &PrivacyRecord) -> io::Result<()> {
        let p = &record.policy;
        let json = object! {
            show_full_name: p.show_full_name,
            show_gender: p.show_gender,
            show_age: p.show_age,
            show_work_unit: p.show_work_unit,
            show_marital_status: p.show_marital_status,
            show_home_address: p.show_home_address,
            show_office_address: p.show_office_address,
            updated_by: record.updated_by.as_ref().map(|x| x.0.as_str()),
            updated: time(&record.updated),
        };
        create_dir_all(&self.root)?;
        std::fs::write(self.root.join(PRIVACY_FILE), json.to_string())
    }
}

impl Store {
    pub fn store_user_auth(&self, id: &UserID, password_store: &PasswordStore) -> io::Result<()> {
        let json = object! {
            salt: password_store.salt.as_str(),
            hashed: password_store.hashed.as_str(),
        };
        self.write(AUTH, &id.0, json)
    }

    pub fn load_user_auth(&self, id: &UserID) -> Option<PasswordStore> {
        let json = read_to_string(self.file(AUTH, &id.0)).ok()?;
        let json = json::parse(&json).ok()?;
        Some(PasswordStore {
            salt: json["salt"].as_str()?.to_string(),
            hashed: json["hashed"].as_str()?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut user = User::new("minh", None);
        user.role = Role::Admin;
        user.profile = Profile {
            birth_year: Some(1990),
            home_coordinates: Some("21.0285,105.8542".to_string()),
            ..Default::default()
        };
        user.favorites.push(ActivityID("tennis".to_string()));
        let id = UserID("u1".to_string());
        store.store_user(&id, &user).unwrap();

        let users = store.load_users();
        let loaded = &users[&id];
        assert_eq!(loaded.user_name, "minh");
        assert_eq!(loaded.role, Role::Admin);
        assert_eq!(loaded.profile, user.profile);
        assert_eq!(loaded.favorites, user.favorites);
        assert_eq!(loaded.created.timestamp(), user.created.timestamp());
    }

    #[test]
    fn broken_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        std::fs::create_dir_all(dir.path().join(COMMENTS)).unwrap();
        std::fs::write(dir.path().join(COMMENTS).join("bad.json"), "{not json").unwrap();
        assert!(store.load_comments().is_empty());
    }

    #[test]
    fn missing_privacy_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Store::new(dir.path()).load_privacy().is_none());
    }

    #[test]
    fn auth_is_kept_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let id = UserID("u1".to_string());
        assert!(store.load_user_auth(&id).is_none());
        store.store_user_auth(&id, &PasswordStore { salt: "s".to_string(), hashed: "h".to_string() }).unwrap();
        let auth = store.load_user_auth(&id).unwrap();
        assert_eq!((auth.salt.as_str(), auth.hashed.as_str()), ("s", "h"));
    }
}
