use chrono::{DateTime, Utc};

use super::{EventID, UserID};

pub struct Comment {
    pub created: DateTime<Utc>,
    pub event: EventID,
    pub user: UserID,
    pub content: String,
}
