use std::io;

use super::DB;

use crate::data::{ActivityID, ActivityType, UserID};

impl DB {
    /// Flips the favourite mark and returns the new state, or `None` when
    /// the user or activity doesn't exist.
    pub fn toggle_favorite(&mut self, user_id: &UserID, activity: &ActivityID) -> io::Result<Option<bool>> {
        if !self.activities.contains_key(activity) {
            return Ok(None);
        }
        let Some(mut user) = self.users.get(user_id).cloned() else {
            return Ok(None);
        };
        let i = user.favorites.iter().rposition(|x| x == activity);
        let favorite = match i {
            Some(i) => {
                user.favorites.remove(i);
                false
            }
            None => {
                user.favorites.push(activity.clone());
                true
            }
        };
        self.store.store_user(user_id, &user)?;
        self.users.insert(user_id.clone(), user);
        Ok(Some(favorite))
    }

    pub fn is_favorite(&self, user: &UserID, activity: &ActivityID) -> bool {
        self.users.get(user).map_or(false, |u| u.favorites.contains(activity))
    }

    /// Favourites in the order they were marked; deleted activities are skipped.
    pub fn favorites(&self, user: &UserID) -> Vec<(&ActivityID, &ActivityType)> {
        let Some(user) = self.users.get(user) else {
            return vec![];
        };
        user.favorites.iter()
            .filter_map(|id| self.activities.get_key_value(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::db::tests::{password, temp_db};
    use crate::data::{ActivityID, UserID};

    #[test]
    fn toggling_twice_restores() {
        let (_dir, mut db) = temp_db();
        let user = db.create_new_user("u", None, &password()).unwrap();
        let yoga = db.create_activity("Yoga", None, None).unwrap();

        assert_eq!(db.toggle_favorite(&user, &yoga).unwrap(), Some(true));
        assert!(db.is_favorite(&user, &yoga));
        assert_eq!(db.favorites(&user).len(), 1);
        assert_eq!(db.toggle_favorite(&user, &yoga).unwrap(), Some(false));
        assert!(db.favorites(&user).is_empty());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let (_dir, mut db) = temp_db();
        let user = db.create_new_user("u", None, &password()).unwrap();
        let yoga = db.create_activity("Yoga", None, None).unwrap();
        assert_eq!(db.toggle_favorite(&user, &ActivityID("x".to_string())).unwrap(), None);
        assert_eq!(db.toggle_favorite(&UserID("x".to_string()), &yoga).unwrap(), None);
    }
}
