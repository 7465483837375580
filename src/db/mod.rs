use std::{collections::HashMap, io};

use chrono::Utc;
use log::info;
use thiserror::Error;

use crate::{data::{ActivityID, ActivityType, Comment, CommentID, Event, EventDraft, EventID, Participant, PrivacyRecord, ProfileUpdate, User, UserID}, auth::PasswordStore};

pub use store::Store;

pub mod favorite;
pub mod participation;
pub mod permissions;
pub mod search;
pub mod sequence;
pub mod store;

#[derive(Default)]
pub struct DB {
    store: Store,

    users: HashMap<UserID, User>,
    activities: HashMap<ActivityID, ActivityType>,
    events: HashMap<EventID, Event>,
    comments: HashMap<CommentID, Comment>,

    privacy: Option<PrivacyRecord>,
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event not found")]
    NotFound,
    #[error("Not authorized to edit this event")]
    NotHost,
    #[error("End time must be after start time")]
    EndBeforeStart,
    #[error("Unknown activity")]
    UnknownActivity,
    #[error(transparent)]
    Storage(#[from] io::Error),
}

impl DB {
    pub fn load(store: Store) -> Self {
        let mut l = Self { store, ..Self::default() };
        l.reload();
        l
    }

    pub fn reload(&mut self) {
        self.users = self.store.load_users();
        self.activities = self.store.load_activities();
        self.events = self.store.load_events();
        self.comments = self.store.load_comments();
        self.privacy = self.store.load_privacy();
        info!(
            "loaded {} users, {} activities, {} events, {} comments",
            self.users.len(), self.activities.len(), self.events.len(), self.comments.len()
        );
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn get_user(&self, id: &UserID) -> Option<&User> {
        self.users.get(id)
    }

    pub fn find_user_by_name(&self, user_name: &str) -> Option<&UserID> {
        self.users.iter()
            .find(|(_, user)| user.user_name == user_name)
            .map(|(id, _)| id)
    }

    pub fn get_activity(&self, id: &ActivityID) -> Option<&ActivityType> {
        self.activities.get(id)
    }

    pub fn get_event(&self, id: &EventID) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn get_comment(&self, id: &CommentID) -> Option<&Comment> {
        self.comments.get(id)
    }
}

impl DB {
    fn gen_id<F>(taken: F) -> String where F: Fn(&str) -> bool {
        let id = Store::gen_id();
        if taken(&id) {
            Self::gen_id(taken)
        } else {
            id
        }
    }

    pub fn create_new_user(&mut self, name: &str, avatar_url: Option<String>, password_store: &PasswordStore) -> io::Result<UserID> {
        let id = UserID(Self::gen_id(|x| self.users.contains_key(&UserID(x.to_string()))));
        let user = User::new(name, avatar_url);
        self.store.store_user(&id, &user)?;
        self.store.store_user_auth(&id, password_store)?;
        self.users.insert(id.clone(), user);
        Ok(id)
    }

    /// `Ok(false)` when there is no such user.
    pub fn update_user(&mut self, id: &UserID, update: &ProfileUpdate) -> io::Result<bool> {
        let Some(mut user) = self.users.get(id).cloned() else {
            return Ok(false);
        };
        update.apply(&mut user);
        self.store.store_user(id, &user)?;
        self.users.insert(id.clone(), user);
        Ok(true)
    }

    pub fn create_activity(&mut self, name: &str, description: Option<String>, image_url: Option<String>) -> io::Result<ActivityID> {
        let id = ActivityID(Self::gen_id(|x| self.activities.contains_key(&ActivityID(x.to_string()))));
        let activity = ActivityType {
            name: name.to_string(),
            description,
            image_url,
            created: Utc::now(),
        };
        self.store.store_activity(&id, &activity)?;
        self.activities.insert(id.clone(), activity);
        Ok(id)
    }

    fn check_draft(&self, draft: &EventDraft) -> Result<(), EventError> {
        if draft.end <= draft.start {
            Err(EventError::EndBeforeStart)
        } else if !self.activities.contains_key(&draft.activity_id) {
            Err(EventError::UnknownActivity)
        } else {
            Ok(())
        }
    }

    /// The host joins their own event right away.
    pub fn create_event(&mut self, host: &UserID, draft: EventDraft) -> Result<EventID, EventError> {
        self.check_draft(&draft)?;
        let id = EventID(Self::gen_id(|x| self.events.contains_key(&EventID(x.to_string()))));
        let now = Utc::now();
        let event = Event {
            host: host.clone(),
            activity: draft.activity_id,
            start: draft.start,
            end: draft.end,
            location: draft.location,
            latitude: draft.latitude,
            longitude: draft.longitude,
            max_participants: draft.max_participants,
            description: draft.description,
            banner_url: draft.banner_url,
            attachments: draft.attachments,
            participants: vec![Participant { user: host.clone(), joined: now }],
            created: now,
        };
        self.store.store_event(&id, &event)?;
        self.events.insert(id.clone(), event);
        Ok(id)
    }

    /// Only the host may edit. Participants and the activity type are kept.
    pub fn update_event(&mut self, editor: &UserID, id: &EventID, draft: EventDraft) -> Result<(), EventError> {
        let host = &self.events.get(id).ok_or(EventError::NotFound)?.host;
        if host != editor {
            return Err(EventError::NotHost);
        }
        if draft.end <= draft.start {
            return Err(EventError::EndBeforeStart);
        }
        let Some(mut event) = self.events.get(id).cloned() else {
            return Err(EventError::NotFound);
        };
        event.start = draft.start;
        event.end = draft.end;
        event.location = draft.location;
        event.latitude = draft.latitude;
        event.longitude = draft.longitude;
        event.max_participants = draft.max_participants;
        event.description = draft.description;
        event.banner_url = draft.banner_url;
        event.attachments = draft.attachments;
        self.store.store_event(id, &event)?;
        self.events.insert(id.clone(), event);
        Ok(())
    }

    /// `Ok(None)` when the event or the user doesn't exist.
    pub fn try_comment(&mut self, content: &str, event_id: &EventID, user: &UserID) -> io::Result<Option<CommentID>> {
        if !self.events.contains_key(event_id) || !self.users.contains_key(user) {
            return Ok(None);
        }
        let id = CommentID(Self::gen_id(|x| self.comments.contains_key(&CommentID(x.to_string()))));
        let comment = Comment {
            created: Utc::now(),
            event: event_id.clone(),
            user: user.clone(),
            content: content.to_string(),
        };
        self.store.store_comment(&id, &comment)?;
        self.comments.insert(id.clone(), comment);
        Ok(Some(id))
    }
}
