use std::collections::HashSet;

use crate::data::{ActivityID, Event, EventID, UserID};

use super::DB;

const SUGGESTION_LIMIT: usize = 10;

impl DB {
    /// All events, or those of one activity type, ordered by start time.
    pub fn search_events(&self, activity: Option<&ActivityID>) -> Vec<(&EventID, &Event)> {
        let mut events = self.events.iter()
            .filter(|(_, e)| activity.map_or(true, |a| &e.activity == a))
            .collect::<Vec<_>>();
        events.sort_by(|(a_id, a), (b_id, b)| a.start.cmp(&b.start).then_with(|| a_id.0.cmp(&b_id.0)));
        events
    }

    /// Locations used before that contain `query`: the viewer's own most
    /// recent ones first, then everybody else's, without duplicates.
    pub fn suggest_locations(&self, viewer: Option<&UserID>, query: &str) -> Vec<String> {
        let mut recent = self.events.values()
            .filter(|e| e.location.contains(query))
            .collect::<Vec<_>>();
        recent.sort_by(|a, b| b.created.cmp(&a.created));
        let (own, others): (Vec<&Event>, Vec<&Event>) = recent.into_iter()
            .partition(|e| Some(&e.host) == viewer);

        let mut seen = HashSet::new();
        own.into_iter().take(SUGGESTION_LIMIT)
            .chain(others.into_iter().take(SUGGESTION_LIMIT))
            .map(|e| e.location.as_str())
            .filter(|l| seen.insert(*l))
            .take(SUGGESTION_LIMIT)
            .map(|l| l.to_string())
            .collect()
    }
}
