#[cfg(test)]
mod tests {
    use crate::config::PawlistConfig;
    use crate::error::{PawlistError, Result};
    use crate::favourite::{
        Collection, DataStore, FavouritePet, FavouriteShelter, Pet, PetMedia, PetPhoto, Record,
        Shelter,
    };
    use crate::user::{AuthOutcome, SessionProvider, SignupRequest, User, UserRecord, UserService};
    use futures::FutureExt;
    use futures::future;
    use futures::stream::{self, BoxStream, StreamExt};
    use std::any::Any;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    // Mock SessionProvider for testing
    #[derive(Default)]
    struct MockSessionProvider {
        accounts: Mutex<HashMap<String, (String, UserRecord)>>,
        active: Mutex<Option<UserRecord>>,
        calls: Mutex<Vec<String>>,
        fail_logout: AtomicBool,
    }

    impl MockSessionProvider {
        fn with_account(self, username: &str, password: &str, name: &str) -> Self {
            let record = UserRecord::new(format!("id-{}", username), username, name);
            self.accounts
                .lock()
                .unwrap()
                .insert(username.to_string(), (password.to_string(), record));
            self
        }

        fn with_active(self, record: UserRecord) -> Self {
            *self.active.lock().unwrap() = Some(record);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl SessionProvider for MockSessionProvider {
        fn active_user(&self) -> Option<UserRecord> {
            self.active.lock().unwrap().clone()
        }

        async fn login(&self, username: &str, password: &str) -> Result<UserRecord> {
            self.calls.lock().unwrap().push(format!("login:{}", username));
            // Lets concurrent callers interleave here.
            tokio::task::yield_now().await;

            let found = self.accounts.lock().unwrap().get(username).cloned();
            match found {
                Some((expected, record)) if expected == password => {
                    *self.active.lock().unwrap() = Some(record.clone());
                    Ok(record)
                }
                _ => Err(PawlistError::authentication("invalid credentials")),
            }
        }

        async fn signup(&self, request: SignupRequest) -> Result<UserRecord> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("signup:{}", request.username));

            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(&request.username) {
                return Err(PawlistError::authentication("username already exists"));
            }
            let record = UserRecord::new(
                format!("id-{}", request.username),
                request.username.clone(),
                request.name,
            );
            accounts.insert(request.username, (request.password, record.clone()));
            *self.active.lock().unwrap() = Some(record.clone());
            Ok(record)
        }

        async fn logout(&self) -> Result<()> {
            self.calls.lock().unwrap().push("logout".to_string());
            if self.fail_logout.load(Ordering::SeqCst) {
                return Err(PawlistError::data_access("network unreachable"));
            }
            *self.active.lock().unwrap() = None;
            Ok(())
        }

        async fn reset_password(&self, username: &str) -> Result<serde_json::Value> {
            if self.accounts.lock().unwrap().contains_key(username) {
                Ok(serde_json::json!({ "username": username }))
            } else {
                Err(PawlistError::not_found("user", username))
            }
        }
    }

    // Mock Collection for testing
    struct MockCollection<T> {
        name: String,
        records: Mutex<Vec<T>>,
        saved: Mutex<Vec<T>>,
        removed: Mutex<Vec<String>>,
        finds: AtomicUsize,
        deferred: AtomicBool,
        failing: AtomicBool,
        queries: Mutex<Vec<Option<oneshot::Sender<Result<Vec<T>>>>>>,
    }

    impl<T: Record> MockCollection<T> {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                records: Mutex::new(Vec::new()),
                saved: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
                finds: AtomicUsize::new(0),
                deferred: AtomicBool::new(false),
                failing: AtomicBool::new(false),
                queries: Mutex::new(Vec::new()),
            }
        }

        /// Queries stay open until `resolve_query` is called.
        fn defer_queries(&self) {
            self.deferred.store(true, Ordering::SeqCst);
        }

        fn fail_queries(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        /// Completes the `index`-th query. Returns false if it was dropped.
        fn resolve_query(&self, index: usize, records: Vec<T>) -> bool {
            let sender = self.queries.lock().unwrap()[index].take();
            match sender {
                Some(sender) => sender.send(Ok(records)).is_ok(),
                None => false,
            }
        }

        fn find_count(&self) -> usize {
            self.finds.load(Ordering::SeqCst)
        }

        fn saved(&self) -> Vec<T> {
            self.saved.lock().unwrap().clone()
        }

        fn removed(&self) -> Vec<String> {
            self.removed.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl<T: Record> Collection<T> for MockCollection<T> {
        fn name(&self) -> &str {
            &self.name
        }

        fn find(&self) -> BoxStream<'static, Result<Vec<T>>> {
            self.finds.fetch_add(1, Ordering::SeqCst);

            if self.failing.load(Ordering::SeqCst) {
                return stream::once(future::ready(Err(PawlistError::data_access("sync failed"))))
                    .boxed();
            }

            if self.deferred.load(Ordering::SeqCst) {
                let (tx, rx) = oneshot::channel();
                self.queries.lock().unwrap().push(Some(tx));
                return stream::once(rx)
                    .filter_map(|received| future::ready(received.ok()))
                    .boxed();
            }

            let snapshot = self.records.lock().unwrap().clone();
            stream::once(future::ready(Ok(snapshot))).boxed()
        }

        async fn save(&self, record: T) -> Result<T> {
            self.saved.lock().unwrap().push(record.clone());
            let mut records = self.records.lock().unwrap();
            records.retain(|existing| existing.id() != record.id());
            records.push(record.clone());
            Ok(record)
        }

        async fn remove_by_id(&self, id: &str) -> Result<u64> {
            self.removed.lock().unwrap().push(id.to_string());
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|existing| existing.id() != id);
            Ok((before - records.len()) as u64)
        }
    }

    // Mock DataStore handing out one MockCollection per name
    #[derive(Default)]
    struct MockStore {
        collections: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    }

    impl MockStore {
        fn typed<T: Record>(&self, name: &str) -> Arc<MockCollection<T>> {
            let entry = self
                .collections
                .lock()
                .unwrap()
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MockCollection::<T>::new(name)) as Arc<dyn Any + Send + Sync>)
                .clone();
            entry
                .downcast::<MockCollection<T>>()
                .expect("collection requested with another record type")
        }
    }

    impl DataStore for MockStore {
        fn collection<T: Record>(&self, name: &str) -> Arc<dyn Collection<T>> {
            self.typed::<T>(name)
        }
    }

    fn setup(provider: MockSessionProvider) -> (Arc<MockSessionProvider>, MockStore, UserService) {
        let provider = Arc::new(provider);
        let store = MockStore::default();
        let service = UserService::new(provider.clone(), &store, &PawlistConfig::default())
            .expect("service should build");
        (provider, store, service)
    }

    fn alice() -> User {
        User {
            id: "id-alice".to_string(),
            username: "alice".to_string(),
            name: "Alice".to_string(),
        }
    }

    fn pet(id: &str, photos: Vec<PetPhoto>) -> Pet {
        Pet {
            id: id.to_string(),
            name: format!("Pet {}", id),
            media: PetMedia { photos },
        }
    }

    fn favourite_pet(id: &str) -> FavouritePet {
        FavouritePet {
            id: id.to_string(),
            name: format!("Pet {}", id),
            image_url: "assets/images/generic-pet.jpg".to_string(),
        }
    }

    // =============================================================================
    // Construction
    // =============================================================================

    #[tokio::test]
    async fn test_new_seeds_user_from_active_session() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, _store, service) = setup(provider);

        let first = service.user_stream().next().await.unwrap();
        assert_eq!(first, Some(alice()));
        assert_eq!(service.current_user(), Some(alice()));
    }

    #[tokio::test]
    async fn test_new_without_session_starts_anonymous() {
        let (_provider, _store, service) = setup(MockSessionProvider::default());

        let first = service.user_stream().next().await.unwrap();
        assert_eq!(first, None);
    }

    #[test]
    fn test_new_rejects_malformed_active_record() {
        let record = UserRecord {
            username: None,
            ..UserRecord::new("id-alice", "alice", "Alice")
        };
        let provider = Arc::new(MockSessionProvider::default().with_active(record));
        let store = MockStore::default();

        let err = UserService::new(provider, &store, &PawlistConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, PawlistError::missing_field("user", "username"));
    }

    // =============================================================================
    // sign_in / register / logout
    // =============================================================================

    #[tokio::test]
    async fn test_sign_in_publishes_user() {
        let (provider, _store, service) =
            setup(MockSessionProvider::default().with_account("alice", "secret", "Alice"));
        let mut users = service.subscribe_user();

        let outcome = service.sign_in("alice", "secret").await;

        assert_eq!(outcome, AuthOutcome::SignedIn(alice()));
        assert!(users.has_changed().unwrap());
        assert_eq!(*users.borrow_and_update(), Some(alice()));
        // Any previous session is ended before logging in.
        assert_eq!(provider.calls(), vec!["logout", "login:alice"]);
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_user() {
        let provider = MockSessionProvider::default()
            .with_account("alice", "secret", "Alice")
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, _store, service) = setup(provider);

        let outcome = service.sign_in("alice", "wrong").await;

        assert!(!outcome.is_signed_in());
        assert_eq!(outcome.user(), None);
        assert_eq!(outcome.reason().as_deref(), Some("invalid credentials"));
        assert_eq!(service.current_user(), Some(alice()));
    }

    #[tokio::test]
    async fn test_sign_in_fails_when_logout_fails() {
        let provider = MockSessionProvider::default().with_account("alice", "secret", "Alice");
        provider.fail_logout.store(true, Ordering::SeqCst);
        let (provider, _store, service) = setup(provider);

        let outcome = service.sign_in("alice", "secret").await;

        assert_eq!(
            outcome,
            AuthOutcome::Failed(PawlistError::data_access("network unreachable"))
        );
        assert_eq!(provider.calls(), vec!["logout"]);
        assert_eq!(service.current_user(), None);
    }

    #[tokio::test]
    async fn test_register_publishes_new_user() {
        let (provider, _store, service) = setup(MockSessionProvider::default());

        let outcome = service.register("alice", "secret", "Alice").await;

        assert_eq!(outcome, AuthOutcome::SignedIn(alice()));
        assert_eq!(service.current_user(), Some(alice()));
        assert_eq!(provider.calls(), vec!["logout", "signup:alice"]);
    }

    #[tokio::test]
    async fn test_register_conflict_is_reported() {
        let (_provider, _store, service) =
            setup(MockSessionProvider::default().with_account("alice", "secret", "Alice"));

        let outcome = service.register("alice", "other", "Another Alice").await;

        match outcome {
            AuthOutcome::Failed(err) => assert!(err.is_authentication()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(service.current_user(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_user() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, _store, service) = setup(provider);

        service.logout().await.unwrap();

        assert_eq!(service.current_user(), None);

        // Logging out while anonymous still publishes None.
        let mut users = service.subscribe_user();
        service.logout().await.unwrap();
        assert!(users.has_changed().unwrap());
        assert_eq!(*users.borrow_and_update(), None);
    }

    #[tokio::test]
    async fn test_logout_error_keeps_user() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        provider.fail_logout.store(true, Ordering::SeqCst);
        let (_provider, _store, service) = setup(provider);

        let err = service.logout().await.unwrap_err();

        assert_eq!(err, PawlistError::data_access("network unreachable"));
        assert_eq!(service.current_user(), Some(alice()));
    }

    #[tokio::test]
    async fn test_reset_password_passes_through() {
        let (_provider, _store, service) =
            setup(MockSessionProvider::default().with_account("alice", "secret", "Alice"));

        let value = service.reset_password("alice").await.unwrap();
        assert_eq!(value["username"], "alice");

        let err = service.reset_password("nobody").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_transitions_apply_in_call_order() {
        let (_provider, _store, service) =
            setup(MockSessionProvider::default().with_account("alice", "secret", "Alice"));

        let (outcome, logout) = tokio::join!(service.sign_in("alice", "secret"), service.logout());
        assert!(outcome.is_signed_in());
        logout.unwrap();
        assert_eq!(service.current_user(), None);

        let (logout, outcome) = tokio::join!(service.logout(), service.sign_in("alice", "secret"));
        logout.unwrap();
        assert!(outcome.is_signed_in());
        assert_eq!(service.current_user(), Some(alice()));
    }

    // =============================================================================
    // Favourites streams
    // =============================================================================

    #[tokio::test]
    async fn test_anonymous_favourites_are_empty_without_query() {
        let (_provider, store, service) = setup(MockSessionProvider::default());

        let pets = service.favourite_pets().next().await.unwrap().unwrap();
        let shelters = service.favourite_shelters().next().await.unwrap().unwrap();

        assert!(pets.is_empty());
        assert!(shelters.is_empty());
        assert_eq!(store.typed::<FavouritePet>("pets").find_count(), 0);
        assert_eq!(store.typed::<FavouriteShelter>("shelters").find_count(), 0);
    }

    #[tokio::test]
    async fn test_favourites_follow_signed_in_user() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, store, service) = setup(provider);
        let collection = store.typed::<FavouritePet>("pets");
        collection.records.lock().unwrap().push(favourite_pet("1"));

        let mut stream = service.favourite_pets();
        assert_eq!(stream.next().await.unwrap().unwrap(), vec![favourite_pet("1")]);

        service.logout().await.unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_empty());
        assert_eq!(collection.find_count(), 1);
    }

    #[tokio::test]
    async fn test_switching_user_drops_previous_query() {
        let provider = MockSessionProvider::default()
            .with_account("alice", "pw-a", "Alice")
            .with_account("bob", "pw-b", "Bob");
        let (_provider, store, service) = setup(provider);
        let collection = store.typed::<FavouritePet>("pets");
        collection.defer_queries();

        let mut stream = service.favourite_pets();
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        assert!(service.sign_in("alice", "pw-a").await.is_signed_in());
        assert!(stream.next().now_or_never().is_none());
        assert_eq!(collection.find_count(), 1);

        assert!(service.sign_in("bob", "pw-b").await.is_signed_in());
        assert!(stream.next().now_or_never().is_none());
        assert_eq!(collection.find_count(), 2);

        // Alice's query was torn down when Bob signed in.
        assert!(!collection.resolve_query(0, vec![favourite_pet("alice-pet")]));
        assert!(collection.resolve_query(1, vec![favourite_pet("bob-pet")]));

        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            vec![favourite_pet("bob-pet")]
        );
    }

    #[tokio::test]
    async fn test_dropping_stream_drops_query() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, store, service) = setup(provider);
        let collection = store.typed::<FavouriteShelter>("shelters");
        collection.defer_queries();

        let mut stream = service.favourite_shelters();
        assert!(stream.next().now_or_never().is_none());
        drop(stream);

        assert!(!collection.resolve_query(0, Vec::new()));
    }

    #[tokio::test]
    async fn test_query_error_ends_stream() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, store, service) = setup(provider);
        store.typed::<FavouritePet>("pets").fail_queries();

        let mut stream = service.favourite_pets();
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err, PawlistError::data_access("sync failed"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_ends_with_service() {
        let (_provider, _store, service) = setup(MockSessionProvider::default());
        let mut stream = service.favourite_pets();
        drop(service);

        assert!(stream.next().await.unwrap().unwrap().is_empty());
        assert!(stream.next().await.is_none());
    }

    // =============================================================================
    // Favourites mutations
    // =============================================================================

    #[tokio::test]
    async fn test_add_pet_while_anonymous_is_skipped() {
        let (_provider, store, service) = setup(MockSessionProvider::default());

        service.add_pet_to_favourites(&pet("1", Vec::new())).await.unwrap();
        service.remove_pet_from_favourites("1").await.unwrap();

        let collection = store.typed::<FavouritePet>("pets");
        assert!(collection.saved().is_empty());
        assert!(collection.removed().is_empty());
    }

    #[tokio::test]
    async fn test_add_pet_applies_image_rule() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, store, service) = setup(provider);

        let photos = vec![
            PetPhoto {
                size: 1,
                url: "thumb.jpg".to_string(),
            },
            PetPhoto {
                size: 3,
                url: "large.jpg".to_string(),
            },
        ];
        service.add_pet_to_favourites(&pet("1", photos)).await.unwrap();
        service.add_pet_to_favourites(&pet("2", Vec::new())).await.unwrap();

        let saved = store.typed::<FavouritePet>("pets").saved();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].id, "1");
        assert_eq!(saved[0].image_url, "large.jpg");
        assert_eq!(saved[1], favourite_pet("2"));
    }

    #[tokio::test]
    async fn test_remove_pet_when_signed_in() {
        let provider = MockSessionProvider::default()
            .with_active(UserRecord::new("id-alice", "alice", "Alice"));
        let (_provider, store, service) = setup(provider);

        service.remove_pet_from_favourites("7").await.unwrap();

        assert_eq!(store.typed::<FavouritePet>("pets").removed(), vec!["7"]);
    }

    #[tokio::test]
    async fn test_shelter_mutations_require_user() {
        let (_provider, store, service) =
            setup(MockSessionProvider::default().with_account("alice", "secret", "Alice"));
        let shelter = Shelter {
            id: "CA01".to_string(),
            name: None,
            phone: Some("555-0100".to_string()),
            email: None,
        };

        service.add_shelter_to_favourites(&shelter).await.unwrap();
        service.remove_shelter_from_favourites("CA01").await.unwrap();
        let collection = store.typed::<FavouriteShelter>("shelters");
        assert!(collection.saved().is_empty());
        assert!(collection.removed().is_empty());

        assert!(service.sign_in("alice", "secret").await.is_signed_in());
        service.add_shelter_to_favourites(&shelter).await.unwrap();
        service.remove_shelter_from_favourites("CA01").await.unwrap();

        assert_eq!(
            collection.saved(),
            vec![FavouriteShelter {
                id: "CA01".to_string(),
                name: String::new(),
                phone: "555-0100".to_string(),
                email: String::new(),
            }]
        );
        assert_eq!(collection.removed(), vec!["CA01"]);
    }

    #[tokio::test]
    async fn test_custom_collection_names() {
        let provider = Arc::new(
            MockSessionProvider::default().with_active(UserRecord::new("id-alice", "alice", "Alice")),
        );
        let store = MockStore::default();
        let config = PawlistConfig::from_toml_str("[collections]\npets = \"fav-pets\"").unwrap();
        let service = UserService::new(provider, &store, &config).unwrap();

        service.add_pet_to_favourites(&pet("1", Vec::new())).await.unwrap();

        assert_eq!(store.typed::<FavouritePet>("fav-pets").saved().len(), 1);
        assert!(store.typed::<FavouritePet>("pets").saved().is_empty());
    }
}
