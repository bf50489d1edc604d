//! User domain model and the external user record it is projected from.

use serde::{Deserialize, Serialize};

use crate::error::{PawlistError, Result};

/// Snapshot of the signed-in user.
///
/// Has no identity of its own: every auth state change replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
}

/// User record as reported by the authentication backend.
///
/// Every field is optional on the wire; [`User::try_from`] decides what is
/// required. Fields this crate does not consume are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserRecord {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            username: Some(username.into()),
            name: Some(name.into()),
            extra: serde_json::Map::new(),
        }
    }
}

impl TryFrom<&UserRecord> for User {
    type Error = PawlistError;

    fn try_from(record: &UserRecord) -> Result<Self> {
        let id = record
            .id
            .clone()
            .ok_or_else(|| PawlistError::missing_field("user", "_id"))?;
        let username = record
            .username
            .clone()
            .ok_or_else(|| PawlistError::missing_field("user", "username"))?;
        let name = record
            .name
            .clone()
            .ok_or_else(|| PawlistError::missing_field("user", "name"))?;

        Ok(User { id, username, name })
    }
}

/// Projects an optional backend record into the domain user.
///
/// An absent record means "nobody is signed in" and maps to `Ok(None)`.
pub fn parse_user(record: Option<&UserRecord>) -> Result<Option<User>> {
    record.map(User::try_from).transpose()
}

/// Payload for creating a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub name: String,
}
