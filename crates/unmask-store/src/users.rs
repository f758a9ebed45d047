//! The single current-user record.

use unmask_shared::constants::NS_USER;
use unmask_shared::defaults::default_user;
use unmask_shared::{User, UserPatch};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// The stored user record, if one was ever written.
    pub fn user(&self) -> Result<Option<User>> {
        self.read_namespace(NS_USER)
    }

    /// The stored user record, or the default profile when absent.
    pub fn user_or_default(&self) -> Result<User> {
        Ok(self.user()?.unwrap_or_else(default_user))
    }

    pub fn set_user(&self, user: &User) -> Result<()> {
        self.write_namespace(NS_USER, user)
    }

    /// Merge `patch` into the current record (or the default profile) and
    /// store the result.
    pub fn merge_user(&self, patch: &UserPatch) -> Result<User> {
        let mut user = self.user_or_default()?;
        patch.apply_to(&mut user);
        self.set_user(&user)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_user_falls_back_to_default() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.user().unwrap().is_none());
        assert_eq!(db.user_or_default().unwrap(), default_user());
    }

    #[test]
    fn merge_changes_only_patched_fields() {
        let db = Database::open_in_memory().unwrap();
        db.merge_user(&UserPatch::bio("x")).unwrap();

        let stored = db.user().unwrap().expect("merge persists the record");
        assert_eq!(stored.bio, "x");
        assert_eq!(stored.real_name, default_user().real_name);
        assert_eq!(stored.details, default_user().details);
    }

    #[test]
    fn corrupt_user_reads_as_absent() {
        let db = Database::open_in_memory().unwrap();
        db.write_raw(NS_USER, "42").unwrap();
        assert!(db.user().unwrap().is_none());
    }
}
