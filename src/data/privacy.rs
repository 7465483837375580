use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::{User, UserID};

/// Which personal attributes are visible on other people's profile pages.
/// There is one policy for the whole site, edited by administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrivacyPolicy {
    pub show_full_name: bool,
    pub show_gender: bool,
    pub show_age: bool,
    pub show_work_unit: bool,
    pub show_marital_status: bool,
    pub show_home_address: bool,
    pub show_office_address: bool,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            show_full_name: true,
            show_gender: true,
            show_age: true,
            show_work_unit: true,
            show_marital_status: false,
            show_home_address: false,
            show_office_address: false,
        }
    }
}

impl PrivacyPolicy {
    pub const fn hidden() -> Self {
        Self {
            show_full_name: false,
            show_gender: false,
            show_age: false,
            show_work_unit: false,
            show_marital_status: false,
            show_home_address: false,
            show_office_address: false,
        }
    }

    pub const fn visible() -> Self {
        Self {
            show_full_name: true,
            show_gender: true,
            show_age: true,
            show_work_unit: true,
            show_marital_status: true,
            show_home_address: true,
            show_office_address: true,
        }
    }
}

/// The stored policy together with who last touched it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivacyRecord {
    #[serde(flatten)]
    pub policy: PrivacyPolicy,
    pub updated_by: Option<UserID>,
    pub updated: DateTime<Utc>,
}

/// Admin edit of the policy; flags left out keep their current value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PrivacyPatch {
    pub show_full_name: Option<bool>,
    pub show_gender: Option<bool>,
    pub show_age: Option<bool>,
    pub show_work_unit: Option<bool>,
    pub show_marital_status: Option<bool>,
    pub show_home_address: Option<bool>,
    pub show_office_address: Option<bool>,
}

impl PrivacyPatch {
    pub fn apply(&self, base: PrivacyPolicy) -> PrivacyPolicy {
        PrivacyPolicy {
            show_full_name: self.show_full_name.unwrap_or(base.show_full_name),
            show_gender: self.show_gender.unwrap_or(base.show_gender),
            show_age: self.show_age.unwrap_or(base.show_age),
            show_work_unit: self.show_work_unit.unwrap_or(base.show_work_unit),
            show_marital_status: self.show_marital_status.unwrap_or(base.show_marital_status),
            show_home_address: self.show_home_address.unwrap_or(base.show_home_address),
            show_office_address: self.show_office_address.unwrap_or(base.show_office_address),
        }
    }
}

/// A personal attribute as seen by someone else.
///
/// `Hidden` and `Unset` both disappear from the JSON output but stay apart
/// here, so a caller can tell the policy's decision from missing user data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Shown(T),
    Hidden,
    Unset,
}

impl<T: Clone> Field<T> {
    fn reveal(show: bool, value: &Option<T>) -> Self {
        match (show, value) {
            (false, _) => Field::Hidden,
            (true, Some(value)) => Field::Shown(value.clone()),
            (true, None) => Field::Unset,
        }
    }
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Shown(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_omitted(&self) -> bool {
        !matches!(self, Field::Shown(_))
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Shown(value) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicProfile {
    pub id: UserID,
    pub user_name: String,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Field::is_omitted")]
    pub full_name: Field<String>,
    #[serde(skip_serializing_if = "Field::is_omitted")]
    pub gender: Field<String>,
    #[serde(skip_serializing_if = "Field::is_omitted")]
    pub birth_year: Field<i32>,
    #[serde(skip_serializing_if = "Field::is_omitted")]
    pub work_unit: Field<String>,
    #[serde(skip_serializing_if = "Field::is_omitted")]
    pub marital_status: Field<String>,
    #[serde(skip_serializing_if = "Field::is_omitted")]
    pub home_address: Field<String>,
    #[serde(skip_serializing_if = "Field::is_omitted")]
    pub office_address: Field<String>,
}

/// Redacts `user` down to what `policy` allows. Without a stored policy every
/// personal attribute is hidden; identity fields are always kept.
pub fn filter_profile(id: &UserID, user: &User, policy: Option<&PrivacyPolicy>) -> PublicProfile {
    let policy = policy.copied().unwrap_or(PrivacyPolicy::hidden());
    let profile = &user.profile;
    PublicProfile {
        id: id.clone(),
        user_name: user.user_name.clone(),
        avatar_url: user.avatar_url.clone(),
        full_name: Field::reveal(policy.show_full_name, &profile.full_name),
        gender: Field::reveal(policy.show_gender, &profile.gender),
        birth_year: Field::reveal(policy.show_age, &profile.birth_year),
        work_unit: Field::reveal(policy.show_work_unit, &profile.work_unit),
        marital_status: Field::reveal(policy.show_marital_status, &profile.marital_status),
        home_address: Field::reveal(policy.show_home_address, &profile.home_address),
        office_address: Field::reveal(policy.show_office_address, &profile.office_address),
    }
}
