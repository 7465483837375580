use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{format_coordinates, parse_coordinates, Coordinate};

use super::ActivityID;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Personal attributes a user may fill in. Which of them other people get to
/// see is decided by the [`super::PrivacyPolicy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub marital_status: Option<String>,
    pub work_unit: Option<String>,
    pub home_address: Option<String>,
    pub office_address: Option<String>,
    /// `"lat,lng"`, as picked on the profile page map.
    pub home_coordinates: Option<String>,
    pub office_coordinates: Option<String>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub user_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub profile: Profile,
    pub favorites: Vec<ActivityID>,
    pub created: DateTime<Utc>,
}

impl User {
    pub fn new(user_name: &str, avatar_url: Option<String>) -> Self {
        Self {
            user_name: user_name.to_string(),
            email: None,
            role: Role::User,
            avatar_url,
            profile: Profile::default(),
            favorites: vec![],
            created: Utc::now(),
        }
    }

    pub fn home(&self) -> Option<Coordinate> {
        self.profile.home_coordinates.as_deref().and_then(parse_coordinates)
    }

    pub fn office(&self) -> Option<Coordinate> {
        self.profile.office_coordinates.as_deref().and_then(parse_coordinates)
    }
}

/// Partial profile edit. Absent fields are left alone, empty strings clear
/// the field, and a birth year of 0 is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub marital_status: Option<String>,
    pub work_unit: Option<String>,
    pub home_address: Option<String>,
    pub office_address: Option<String>,
    pub home_coordinates: Option<String>,
    pub office_coordinates: Option<String>,
}

fn set(field: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = value {
        let value = value.trim();
        *field = if value.is_empty() { None } else { Some(value.to_string()) };
    }
}

/// Like [`set`], but well-formed positions are stored in one canonical form.
fn set_coordinates(field: &mut Option<String>, value: &Option<String>) {
    set(field, value);
    if let Some(c) = field.as_deref().and_then(parse_coordinates) {
        *field = Some(format_coordinates(c.lat, c.lng));
    }
}

impl ProfileUpdate {
    pub fn apply(&self, user: &mut User) {
        set(&mut user.avatar_url, &self.avatar_url);
        set(&mut user.email, &self.email);
        let p = &mut user.profile;
        set(&mut p.full_name, &self.full_name);
        set(&mut p.gender, &self.gender);
        if let Some(year) = self.birth_year.filter(|x| *x != 0) {
            p.birth_year = Some(year);
        }
        set(&mut p.marital_status, &self.marital_status);
        set(&mut p.work_unit, &self.work_unit);
        set(&mut p.home_address, &self.home_address);
        set(&mut p.office_address, &self.office_address);
        set_coordinates(&mut p.home_coordinates, &self.home_coordinates);
        set_coordinates(&mut p.office_coordinates, &self.office_coordinates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_touches_only_given_fields() {
        let mut user = User::new("an", None);
        user.profile.gender = Some("male".to_string());
        user.profile.birth_year = Some(1988);
        ProfileUpdate {
            work_unit: Some(" Sales ".to_string()),
            birth_year: Some(0),
            ..Default::default()
        }.apply(&mut user);
        assert_eq!(user.profile.work_unit.as_deref(), Some("Sales"));
        assert_eq!(user.profile.gender.as_deref(), Some("male"));
        assert_eq!(user.profile.birth_year, Some(1988));
    }

    #[test]
    fn empty_string_clears() {
        let mut user = User::new("an", Some("/a.png".to_string()));
        user.profile.home_coordinates = Some("21,105".to_string());
        ProfileUpdate {
            avatar_url: Some(String::new()),
            home_coordinates: Some("  ".to_string()),
            ..Default::default()
        }.apply(&mut user);
        assert_eq!(user.avatar_url, None);
        assert_eq!(user.home(), None);
    }

    #[test]
    fn coordinates_are_normalized() {
        let mut user = User::new("an", None);
        ProfileUpdate {
            home_coordinates: Some("21.0285,105.8542".to_string()),
            office_coordinates: Some("near the lake".to_string()),
            ..Default::default()
        }.apply(&mut user);
        assert_eq!(user.profile.home_coordinates.as_deref(), Some("21.028500, 105.854200"));
        assert_eq!(user.profile.office_coordinates.as_deref(), Some("near the lake"));
        assert_eq!(user.office(), None);
    }

    #[test]
    fn reference_points_come_from_profile() {
        let mut user = User::new("an", None);
        user.profile.office_coordinates = Some("10.7769, 106.7009".to_string());
        user.profile.home_coordinates = Some("garbage".to_string());
        assert_eq!(user.home(), None);
        assert_eq!(user.office().map(|c| c.lat), Some(10.7769));
    }
}
