//! User repository

use crate::db::{Db, StoreError, USERS_KEY};
use crate::models::User;

pub async fn find_by_username(db: &Db, username: &str) -> Result<Option<User>, StoreError> {
    let users: Vec<User> = db.read_list(USERS_KEY).await?;
    Ok(users.into_iter().find(|u| u.username == username))
}

pub async fn find_by_id(db: &Db, id: &str) -> Result<Option<User>, StoreError> {
    let users: Vec<User> = db.read_list(USERS_KEY).await?;
    Ok(users.into_iter().find(|u| u.id == id))
}

/// Insert a user unless the username is taken. Returns whether it was inserted.
pub async fn create(db: &Db, user: User) -> Result<bool, StoreError> {
    let inserted = db
        .update_list(USERS_KEY, |users: &mut Vec<User>| {
            if users.iter().any(|u| u.username == user.username) {
                return None;
            }
            users.push(user);
            Some(())
        })
        .await?;

    Ok(inserted.is_some())
}
