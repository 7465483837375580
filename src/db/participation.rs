use std::io;

use chrono::Utc;
use thiserror::Error;

use super::DB;

use crate::data::{Event, EventID, Participant, UserID};

#[derive(Error, Debug)]
pub enum JoinError {
    #[error("Event not found")]
    NotFound,
    #[error("Already joined")]
    AlreadyJoined,
    #[error("Event is full")]
    Full,
    #[error(transparent)]
    Storage(#[from] io::Error),
}

impl DB {
    pub fn join_event(&mut self, event_id: &EventID, user: &UserID) -> Result<(), JoinError> {
        let event = self.events.get(event_id).ok_or(JoinError::NotFound)?;
        if event.has_participant(user) {
            return Err(JoinError::AlreadyJoined);
        }
        if event.is_full() {
            return Err(JoinError::Full);
        }
        let mut event = event.clone();
        event.participants.push(Participant { user: user.clone(), joined: Utc::now() });
        self.store.store_event(event_id, &event)?;
        self.events.insert(event_id.clone(), event);
        Ok(())
    }

    /// Leaving an event you're not in, or one that doesn't exist, is a no-op.
    pub fn leave_event(&mut self, event_id: &EventID, user: &UserID) -> io::Result<()> {
        let Some(event) = self.events.get(event_id) else {
            return Ok(());
        };
        let Some(pos) = event.participants.iter().position(|p| &p.user == user) else {
            return Ok(());
        };
        let mut event = event.clone();
        event.participants.remove(pos);
        self.store.store_event(event_id, &event)?;
        self.events.insert(event_id.clone(), event);
        Ok(())
    }

    /// Events the user takes part in, soonest first.
    pub fn events_for_user(&self, user: &UserID) -> Vec<(&EventID, &Event)> {
        let mut events = self.events.iter()
            .filter(|(_, e)| e.has_participant(user))
            .collect::<Vec<_>>();
        events.sort_by(|(a_id, a), (b_id, b)| a.start.cmp(&b.start).then_with(|| a_id.0.cmp(&b_id.0)));
        events
    }
}
