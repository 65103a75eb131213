//! XStream connection repository

use crate::db::{Db, StoreError, CONNECTIONS_KEY};
use crate::models::XStreamConnection;
use subtle::ConstantTimeEq;

pub async fn list_for_owner(db: &Db, owner_id: &str) -> Result<Vec<XStreamConnection>, StoreError> {
    let connections: Vec<XStreamConnection> = db.read_list(CONNECTIONS_KEY).await?;
    Ok(connections
        .into_iter()
        .filter(|c| c.owner_id == owner_id)
        .collect())
}

pub async fn find_by_id(db: &Db, id: &str) -> Result<Option<XStreamConnection>, StoreError> {
    let connections: Vec<XStreamConnection> = db.read_list(CONNECTIONS_KEY).await?;
    Ok(connections.into_iter().find(|c| c.id == id))
}

/// Constant-time equality for stored secrets
fn secret_matches(stored: &str, given: &str) -> bool {
    stored.as_bytes().ct_eq(given.as_bytes()).into()
}

/// Connection whose generated username and password both match
pub async fn find_by_credentials(
    db: &Db,
    username: &str,
    password: &str,
) -> Result<Option<XStreamConnection>, StoreError> {
    let connections: Vec<XStreamConnection> = db.read_list(CONNECTIONS_KEY).await?;
    Ok(connections
        .into_iter()
        .find(|c| c.username == username && secret_matches(&c.password, password)))
}

pub async fn create(db: &Db, connection: XStreamConnection) -> Result<XStreamConnection, StoreError> {
    let stored = connection.clone();
    db.update_list(CONNECTIONS_KEY, move |connections: &mut Vec<XStreamConnection>| {
        connections.push(stored);
        Some(())
    })
    .await?;

    Ok(connection)
}

/// Returns whether the connection existed
pub async fn delete(db: &Db, id: &str) -> Result<bool, StoreError> {
    let removed = db
        .update_list(CONNECTIONS_KEY, |connections: &mut Vec<XStreamConnection>| {
            let position = connections.iter().position(|c| c.id == id)?;
            Some(connections.remove(position))
        })
        .await?;

    Ok(removed.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn connection(id: &str, owner: &str, password: &str) -> XStreamConnection {
        XStreamConnection {
            id: id.to_string(),
            owner_id: owner.to_string(),
            playlist_id: "p1".to_string(),
            name: "Mine".to_string(),
            server_address: "http://localhost:3000".to_string(),
            username: format!("user_{}", owner),
            password: password.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_credentials_requires_both() {
        let db = Db::in_memory();
        create(&db, connection("c1", "u1", "secret01")).await.unwrap();
        create(&db, connection("c2", "u1", "secret02")).await.unwrap();

        let found = find_by_credentials(&db, "user_u1", "secret02").await.unwrap().unwrap();
        assert_eq!(found.id, "c2");
        assert!(find_by_credentials(&db, "user_u1", "wrong").await.unwrap().is_none());
        assert!(find_by_credentials(&db, "user_u2", "secret01").await.unwrap().is_none());
    }

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("Pw123456", "Pw123456"));
        assert!(!secret_matches("Pw123456", "Pw123457"));
        assert!(!secret_matches("Pw123456", "Pw12345"));
        assert!(!secret_matches("Pw123456", ""));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let db = Db::in_memory();
        create(&db, connection("c1", "u1", "a")).await.unwrap();
        create(&db, connection("c2", "u2", "b")).await.unwrap();

        assert_eq!(list_for_owner(&db, "u1").await.unwrap().len(), 1);
        assert!(delete(&db, "c1").await.unwrap());
        assert!(!delete(&db, "c1").await.unwrap());
        assert!(find_by_id(&db, "c1").await.unwrap().is_none());
        assert!(find_by_id(&db, "c2").await.unwrap().is_some());
    }
}
