use chrono::{DateTime, Utc};

pub struct ActivityType {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created: DateTime<Utc>,
}
