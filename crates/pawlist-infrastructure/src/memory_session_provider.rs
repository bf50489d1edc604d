//! In-memory authentication backend.
//!
//! Stands in for the hosted auth service during local development and tests:
//! accounts live in a map, the active session in a single slot.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawlist_core::PawlistError;
use pawlist_core::error::Result;
use pawlist_core::user::{SessionProvider, SignupRequest, UserRecord};
use uuid::Uuid;

struct Account {
    password: String,
    record: UserRecord,
}

/// Session provider keeping accounts and the active session in memory.
///
/// Passwords are compared as plain strings; never point this at real
/// credentials.
///
/// # Example
///
/// ```
/// use pawlist_infrastructure::InMemorySessionProvider;
/// use pawlist_core::user::SessionProvider;
///
/// let provider = InMemorySessionProvider::new()
///     .with_account("alice", "secret", "Alice")
///     .with_active("alice");
/// assert_eq!(provider.active_user().unwrap().name.as_deref(), Some("Alice"));
/// ```
#[derive(Default)]
pub struct InMemorySessionProvider {
    accounts: RwLock<HashMap<String, Account>>,
    active: RwLock<Option<UserRecord>>,
    reset_requests: AtomicU64,
}

impl InMemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account. An existing account with the same username is replaced.
    pub fn with_account(self, username: &str, password: &str, name: &str) -> Self {
        let record = Self::new_record(username, name, Utc::now());
        self.write_accounts().insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                record,
            },
        );
        self
    }

    /// Marks a seeded account as signed in. Unknown usernames are ignored.
    pub fn with_active(self, username: &str) -> Self {
        let record = self
            .accounts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(username)
            .map(|account| account.record.clone());
        if record.is_some() {
            *self.write_active() = record;
        }
        self
    }

    /// Number of password resets requested so far.
    pub fn reset_requests(&self) -> u64 {
        self.reset_requests.load(Ordering::SeqCst)
    }

    fn new_record(username: &str, name: &str, created_at: DateTime<Utc>) -> UserRecord {
        let mut record = UserRecord::new(Uuid::new_v4().to_string(), username, name);
        record.extra.insert(
            "created_at".to_string(),
            serde_json::Value::String(created_at.to_rfc3339()),
        );
        record
    }

    fn write_accounts(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Account>> {
        self.accounts.write().unwrap_or_else(|e| e.into_inner())
    }

    fn write_active(&self) -> std::sync::RwLockWriteGuard<'_, Option<UserRecord>> {
        self.active.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionProvider for InMemorySessionProvider {
    fn active_user(&self) -> Option<UserRecord> {
        self.active.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn login(&self, username: &str, password: &str) -> Result<UserRecord> {
        let record = {
            let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
            match accounts.get(username) {
                Some(account) if account.password == password => account.record.clone(),
                _ => {
                    tracing::debug!(username, "login rejected");
                    return Err(PawlistError::authentication("invalid credentials"));
                }
            }
        };

        *self.write_active() = Some(record.clone());
        Ok(record)
    }

    async fn signup(&self, request: SignupRequest) -> Result<UserRecord> {
        if request.username.trim().is_empty() {
            return Err(PawlistError::Validation("username must not be empty".to_string()));
        }
        if request.password.is_empty() {
            return Err(PawlistError::Validation("password must not be empty".to_string()));
        }

        let record = {
            let mut accounts = self.write_accounts();
            if accounts.contains_key(&request.username) {
                return Err(PawlistError::authentication("username already exists"));
            }
            let record = Self::new_record(&request.username, &request.name, Utc::now());
            accounts.insert(
                request.username.clone(),
                Account {
                    password: request.password,
                    record: record.clone(),
                },
            );
            record
        };

        tracing::debug!(username = %request.username, "account created");
        *self.write_active() = Some(record.clone());
        Ok(record)
    }

    async fn logout(&self) -> Result<()> {
        self.write_active().take();
        Ok(())
    }

    async fn reset_password(&self, username: &str) -> Result<serde_json::Value> {
        let known = self
            .accounts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(username);
        if !known {
            return Err(PawlistError::not_found("user", username));
        }

        self.reset_requests.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::json!({
            "username": username,
            "requested_at": Utc::now().to_rfc3339(),
        }))
    }
}
