use super::DB;

use crate::data::{ActivityID, ActivityType, Comment, CommentID, Event, EventID, User, UserID};

impl DB {
    /// Newest first.
    pub fn comments_for_event(&self, event: &EventID) -> Vec<(&CommentID, &Comment)> {
        let mut comments = self.comments.iter()
            .filter(|(_, c)| &c.event == event)
            .collect::<Vec<_>>();
        comments.sort_by(|(_, a), (_, b)| b.created.cmp(&a.created));
        comments
    }

    /// Newest first.
    pub fn get_sorted_activities(&self) -> Vec<(&ActivityID, &ActivityType)> {
        let mut activities = self.activities.iter().collect::<Vec<_>>();
        activities.sort_by(|(_, a), (_, b)| b.created.cmp(&a.created));
        activities
    }

    /// Every user, newest first, with how many events each one hosts.
    pub fn users_with_hosted_counts(&self) -> Vec<(&UserID, &User, usize)> {
        let mut users = self.users.iter()
            .map(|(id, user)| (id, user, self.events.values().filter(|e| &e.host == id).count()))
            .collect::<Vec<_>>();
        users.sort_by(|(_, a, _), (_, b, _)| b.created.cmp(&a.created));
        users
    }

    pub fn recent_events(&self, limit: usize) -> Vec<(&EventID, &Event)> {
        let mut events = self.events.iter().collect::<Vec<_>>();
        events.sort_by(|(_, a), (_, b)| b.created.cmp(&a.created));
        events.truncate(limit);
        events
    }
}
