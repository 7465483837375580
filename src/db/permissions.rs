use std::io;

use chrono::Utc;
use log::info;

use crate::data::{PrivacyPatch, PrivacyPolicy, PrivacyRecord, Role, UserID};

use super::DB;

impl DB {
    pub fn is_admin(&self, user: &UserID) -> bool {
        self.users.get(user).map_or(false, |u| u.role == Role::Admin)
    }

    pub fn grant_admin(&mut self, user_id: &UserID) -> io::Result<bool> {
        let Some(mut user) = self.users.get(user_id).cloned() else {
            return Ok(false);
        };
        user.role = Role::Admin;
        self.store.store_user(user_id, &user)?;
        self.users.insert(user_id.clone(), user);
        Ok(true)
    }

    /// The policy exactly as stored; `None` if nobody has ever read or set it.
    pub fn privacy_policy(&self) -> Option<&PrivacyPolicy> {
        self.privacy.as_ref().map(|x| &x.policy)
    }

    /// The policy for the settings page. Creates and stores the default one
    /// on first use.
    pub fn privacy_settings(&mut self) -> io::Result<&PrivacyRecord> {
        let record = match self.privacy.take() {
            Some(record) => record,
            None => {
                let record = PrivacyRecord {
                    policy: PrivacyPolicy::default(),
                    updated_by: None,
                    updated: Utc::now(),
                };
                self.store.store_privacy(&record)?;
                info!("created default privacy policy");
                record
            }
        };
        Ok(&*self.privacy.insert(record))
    }

    pub fn update_privacy(&mut self, patch: &PrivacyPatch, by: &UserID) -> io::Result<&PrivacyRecord> {
        let base = self.privacy.as_ref().map(|x| x.policy).unwrap_or_default();
        let record = PrivacyRecord {
            policy: patch.apply(base),
            updated_by: Some(by.clone()),
            updated: Utc::now(),
        };
        self.store.store_privacy(&record)?;
        info!("privacy policy changed by {}: {:?}", by.0, record.policy);
        Ok(&*self.privacy.insert(record))
    }
}

#[cfg(test)]
mod tests {
    use crate::data::{PrivacyPatch, PrivacyPolicy};
    use crate::db::{tests::{password, temp_db}, DB, Store};

    #[test]
    fn reading_settings_materializes_default() {
        let (dir, mut db) = temp_db();
        assert!(db.privacy_policy().is_none());
        assert_eq!(db.privacy_settings().unwrap().policy, PrivacyPolicy::default());
        assert_eq!(db.privacy_policy(), Some(&PrivacyPolicy::default()));
        let reloaded = DB::load(Store::new(dir.path()));
        assert_eq!(reloaded.privacy_policy(), Some(&PrivacyPolicy::default()));
    }

    #[test]
    fn first_update_starts_from_default() {
        let (_dir, mut db) = temp_db();
        let admin = db.create_new_user("admin", None, &password()).unwrap();
        let patch = PrivacyPatch { show_marital_status: Some(true), ..Default::default() };
        let record = db.update_privacy(&patch, &admin).unwrap();
        assert!(record.policy.show_marital_status);
        assert!(record.policy.show_full_name);
        assert!(!record.policy.show_home_address);
        assert_eq!(record.updated_by.as_ref(), Some(&admin));
    }

    #[test]
    fn admin_role() {
        let (_dir, mut db) = temp_db();
        let user = db.create_new_user("boss", None, &password()).unwrap();
        assert!(!db.is_admin(&user));
        assert!(db.grant_admin(&user).unwrap());
        assert!(db.is_admin(&user));
    }
}
