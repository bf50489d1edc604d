//! User service: authentication state and the favourites lists.
//!
//! The service keeps the current user in a watch channel, so every consumer
//! sees the latest value as soon as it subscribes, and derives the favourites
//! streams from it. Sign-in, registration and logout are serialised by a
//! FIFO lock: transitions apply in the order their calls reached the lock,
//! and the last one decides the visible user.

use std::sync::Arc;

use futures::stream::BoxStream;
use tokio::sync::{Mutex, watch};

use super::model::{SignupRequest, User, UserRecord, parse_user};
use super::provider::SessionProvider;
use crate::config::PawlistConfig;
use crate::error::{PawlistError, Result};
use crate::favourite::{
    Collection, DataStore, FavouritePet, FavouriteShelter, FavouritesStream, Pet, Shelter,
    user_changes,
};

/// Result of [`UserService::sign_in`] and [`UserService::register`].
///
/// Failures are values rather than `Err`, so a UI can show the reason
/// without treating a rejected password as a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    SignedIn(User),
    Failed(PawlistError),
}

impl AuthOutcome {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthOutcome::SignedIn(user) => Some(user),
            AuthOutcome::Failed(_) => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthOutcome::SignedIn(_))
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<String> {
        match self {
            AuthOutcome::SignedIn(_) => None,
            AuthOutcome::Failed(err) => Some(err.message()),
        }
    }
}

/// Authentication state plus the pet and shelter favourites of the
/// signed-in user.
///
/// # Example
///
/// ```ignore
/// let service = UserService::new(session, &store, &config)?;
/// let mut pets = service.favourite_pets();
/// if service.sign_in("alice", "secret").await.is_signed_in() {
///     let first = pets.next().await;
/// }
/// ```
pub struct UserService {
    session: Arc<dyn SessionProvider>,
    user_tx: watch::Sender<Option<User>>,
    pets: Arc<dyn Collection<FavouritePet>>,
    shelters: Arc<dyn Collection<FavouriteShelter>>,
    image_size: u8,
    placeholder_image: String,
    /// Serialises auth transitions.
    transition: Mutex<()>,
}

impl UserService {
    /// Creates the service and seeds the current user from the session
    /// provider's active session.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the active session's record is malformed.
    pub fn new<S: DataStore>(
        session: Arc<dyn SessionProvider>,
        store: &S,
        config: &PawlistConfig,
    ) -> Result<Self> {
        let active = session.active_user();
        let user = parse_user(active.as_ref())?;
        match &user {
            Some(user) => tracing::info!(user_id = %user.id, "restored active session"),
            None => tracing::debug!("no active session"),
        }

        let (user_tx, _) = watch::channel(user);

        Ok(Self {
            session,
            user_tx,
            pets: store.collection(&config.collections.pets),
            shelters: store.collection(&config.collections.shelters),
            image_size: config.assets.image_size,
            placeholder_image: config.assets.placeholder_image(),
            transition: Mutex::new(()),
        })
    }

    // ============================================================================
    // Current user
    // ============================================================================

    /// Snapshot of the current user.
    pub fn current_user(&self) -> Option<User> {
        self.user_tx.borrow().clone()
    }

    /// Receiver of the current user; starts at the latest value.
    pub fn subscribe_user(&self) -> watch::Receiver<Option<User>> {
        self.user_tx.subscribe()
    }

    /// Stream of the current user, starting with the latest value.
    pub fn user_stream(&self) -> BoxStream<'static, Option<User>> {
        user_changes(self.subscribe_user())
    }

    /// Favourite pets of whoever is signed in, re-queried on every user change.
    pub fn favourite_pets(&self) -> FavouritesStream<FavouritePet> {
        FavouritesStream::new(self.user_stream(), self.pets.clone())
    }

    /// Favourite shelters of whoever is signed in, re-queried on every user change.
    pub fn favourite_shelters(&self) -> FavouritesStream<FavouriteShelter> {
        FavouritesStream::new(self.user_stream(), self.shelters.clone())
    }

    // ============================================================================
    // Authentication
    // ============================================================================

    /// Replaces any existing session with one for `username`.
    ///
    /// On failure the current user is left unchanged.
    pub async fn sign_in(&self, username: &str, password: &str) -> AuthOutcome {
        let _guard = self.transition.lock().await;
        let result = async {
            self.session.logout().await?;
            self.session.login(username, password).await
        }
        .await;
        self.finish_authentication("sign in", result)
    }

    /// Creates an account and signs in as it.
    ///
    /// On failure the current user is left unchanged.
    pub async fn register(&self, username: &str, password: &str, name: &str) -> AuthOutcome {
        let _guard = self.transition.lock().await;
        let request = SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        let result = async {
            self.session.logout().await?;
            self.session.signup(request).await
        }
        .await;
        self.finish_authentication("register", result)
    }

    /// Ends the session and clears the current user.
    ///
    /// If the backend refuses, the error is returned and the user is kept.
    pub async fn logout(&self) -> Result<()> {
        let _guard = self.transition.lock().await;
        self.session.logout().await?;
        self.user_tx.send_replace(None);
        tracing::info!("logged out");
        Ok(())
    }

    /// Asks the backend to start a password reset. Errors are passed through.
    pub async fn reset_password(&self, username: &str) -> Result<serde_json::Value> {
        self.session.reset_password(username).await
    }

    fn finish_authentication(&self, action: &str, result: Result<UserRecord>) -> AuthOutcome {
        let user = result.and_then(|record| User::try_from(&record));
        match user {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "{} succeeded", action);
                self.user_tx.send_replace(Some(user.clone()));
                AuthOutcome::SignedIn(user)
            }
            Err(err) => AuthOutcome::Failed(Self::handle_error(action, err)),
        }
    }

    /// Shared handler for authentication failures: logs and hands the error back.
    fn handle_error(action: &str, err: PawlistError) -> PawlistError {
        tracing::error!(error = %err.message(), "{} failed", action);
        err
    }

    // ============================================================================
    // Favourites
    // ============================================================================

    /// Saves `pet` to the favourites. Skipped while nobody is signed in.
    pub async fn add_pet_to_favourites(&self, pet: &Pet) -> Result<()> {
        if !self.is_logged_in() {
            tracing::debug!(pet_id = %pet.id, "not signed in, pet not saved");
            return Ok(());
        }

        let record = FavouritePet::from_pet(pet, self.image_size, &self.placeholder_image);
        self.pets.save(record).await?;
        Ok(())
    }

    /// Removes a pet from the favourites. Skipped while nobody is signed in.
    pub async fn remove_pet_from_favourites(&self, id: &str) -> Result<()> {
        if !self.is_logged_in() {
            tracing::debug!(pet_id = %id, "not signed in, pet not removed");
            return Ok(());
        }

        self.pets.remove_by_id(id).await?;
        Ok(())
    }

    /// Saves `shelter` to the favourites. Skipped while nobody is signed in.
    pub async fn add_shelter_to_favourites(&self, shelter: &Shelter) -> Result<()> {
        if !self.is_logged_in() {
            tracing::debug!(shelter_id = %shelter.id, "not signed in, shelter not saved");
            return Ok(());
        }

        self.shelters.save(FavouriteShelter::from(shelter)).await?;
        Ok(())
    }

    /// Removes a shelter from the favourites. Skipped while nobody is signed in.
    pub async fn remove_shelter_from_favourites(&self, id: &str) -> Result<()> {
        if !self.is_logged_in() {
            tracing::debug!(shelter_id = %id, "not signed in, shelter not removed");
            return Ok(());
        }

        self.shelters.remove_by_id(id).await?;
        Ok(())
    }

    fn is_logged_in(&self) -> bool {
        self.user_tx.borrow().is_some()
    }
}
