//! User administration service
//!
//! Owns a broadcast-observable cache of the `/users` collection. The cache
//! cold-loads at most once, triggered by the auth profile gaining the admin
//! scope; every successful write is followed by one full reload so the
//! cache always mirrors the server after a write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::UsersApi;
use crate::feed::Feed;
use crate::model::User;
use crate::report::ErrorReporter;

/// Cached, lazily-populated proxy over the user administration resources
pub struct UsersService {
    api: UsersApi,
    reporter: Arc<dyn ErrorReporter>,
    users: RwLock<Vec<User>>,
    feed: Feed<Vec<User>>,
    /// Cold-load guard; set before the first load, reset on load failure
    retrieved: AtomicBool,
}

impl UsersService {
    /// Create a new service around an API client and an error reporter
    pub fn new(api: UsersApi, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            api,
            reporter,
            users: RwLock::new(Vec::new()),
            feed: Feed::new(Vec::new()),
            retrieved: AtomicBool::new(false),
        }
    }

    /// Subscribe to the user collection; the receiver starts out holding
    /// the current snapshot
    pub fn subscribe(&self) -> watch::Receiver<Vec<User>> {
        self.feed.subscribe()
    }

    /// Snapshot of the cached collection
    pub async fn users(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    /// React to an auth profile change
    ///
    /// Only a profile holding the admin scope triggers the cold load;
    /// anything else is ignored.
    pub async fn handle_profile_change(&self, profile: Option<&User>) {
        let Some(profile) = profile else {
            return;
        };
        if !profile.is_admin() {
            return;
        }

        self.retrieve().await;
    }

    /// Drive profile-gated retrieval from an auth feed
    ///
    /// The current profile is evaluated immediately, then on every change,
    /// until the feed's sender is dropped.
    pub fn spawn_profile_watcher(
        self: &Arc<Self>,
        mut profiles: watch::Receiver<Option<User>>,
    ) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let profile = profiles.borrow_and_update().clone();
                service.handle_profile_change(profile.as_ref()).await;

                if profiles.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Cold load, at most once before the first success
    ///
    /// The guard flips before the load so duplicate or concurrent triggers
    /// are no-ops; a failed load flips it back to allow a later retry.
    async fn retrieve(&self) {
        if self.retrieved.swap(true, Ordering::SeqCst) {
            return;
        }
        self.load_users().await;
    }

    /// Fetch the full collection, replace the cache, broadcast
    ///
    /// Failures never propagate: a 401/403 is an authorization gate and
    /// stays silent, anything else goes to the reporter. Either way the
    /// cache and feed are left untouched and the guard is reset.
    async fn load_users(&self) {
        match self.api.list_users().await {
            Ok(users) => {
                *self.users.write().await = users.clone();
                self.feed.publish(users);
            }
            Err(error) => {
                self.retrieved.store(false, Ordering::SeqCst);

                if error.is_auth_denied() {
                    debug!("user collection load denied, awaiting authorization");
                    return;
                }
                self.reporter.on_http_error(&error);
            }
        }
    }

    /// Create a user, then reload the collection
    pub async fn create_user(&self, user: &User) {
        match self.api.create_user(user).await {
            Ok(()) => self.load_users().await,
            Err(error) => self.reporter.on_http_error(&error),
        }
    }

    /// Update a user (keyed by email), then reload the collection
    pub async fn edit_user(&self, user: &User) {
        match self.api.edit_user(user).await {
            Ok(()) => self.load_users().await,
            Err(error) => self.reporter.on_http_error(&error),
        }
    }

    /// Delete a user by email, then reload the collection
    pub async fn delete_user(&self, email: &str) {
        match self.api.delete_user(email).await {
            Ok(()) => self.load_users().await,
            Err(error) => self.reporter.on_http_error(&error),
        }
    }

    /// Revoke every active session for a user
    pub async fn revoke_sessions(&self, email: &str) {
        if let Err(error) = self.api.revoke_sessions(email).await {
            self.reporter.on_http_error(&error);
        }
    }

    /// Request a registration code for the remote directory
    pub async fn request_registration_code(&self, email: &str) {
        if let Err(error) = self.api.request_registration_code(email).await {
            self.reporter.on_http_error(&error);
        }
    }

    /// Remove a user's registration from the remote directory
    pub async fn remove_remote_registration(&self, email: &str) {
        if let Err(error) = self.api.remove_remote_registration(email).await {
            self.reporter.on_http_error(&error);
        }
    }

    /// Submit a registration code for a user
    pub async fn submit_registration_code(&self, email: &str, code: &str) {
        if let Err(error) = self.api.submit_registration_code(email, code).await {
            self.reporter.on_http_error(&error);
        }
    }

    /// List identifiers registered in the remote directory
    ///
    /// Failures are reported and collapse to an empty list.
    pub async fn list_remote_registered(&self) -> Vec<String> {
        match self.api.list_remote_registered().await {
            Ok(identifiers) => identifiers,
            Err(error) => {
                self.reporter.on_http_error(&error);
                Vec::new()
            }
        }
    }

    /// Unconditional reload of the collection
    pub async fn refresh(&self) {
        self.load_users().await;
    }

    /// Reset on logout: clear the guard and empty the cache
    ///
    /// Deliberately does not publish the now-empty state; subscribers keep
    /// the pre-logout snapshot until the next successful load.
    pub async fn cleanup(&self) {
        self.retrieved.store(false, Ordering::SeqCst);
        self.users.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::model::ADMIN_SCOPE;

    #[derive(Default)]
    struct CountingReporter {
        reported: AtomicUsize,
    }

    impl ErrorReporter for CountingReporter {
        fn on_http_error(&self, _error: &ClientError) {
            self.reported.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn service_for(server: &mockito::ServerGuard) -> (Arc<UsersService>, Arc<CountingReporter>) {
        let reporter = Arc::new(CountingReporter::default());
        let api = UsersApi::new(ClientConfig {
            base_url: server.url(),
            timeout_secs: 5,
        });
        (
            Arc::new(UsersService::new(api, reporter.clone())),
            reporter,
        )
    }

    fn admin() -> User {
        User {
            email: "admin@example.com".to_string(),
            scope: Some(ADMIN_SCOPE.to_string()),
            extra: serde_json::Map::new(),
        }
    }

    fn member(email: &str) -> User {
        User {
            email: email.to_string(),
            scope: None,
            extra: serde_json::Map::new(),
        }
    }

    fn users_body(emails: &[&str]) -> String {
        let users: Vec<User> = emails.iter().map(|e| member(e)).collect();
        serde_json::to_string(&users).unwrap()
    }

    #[tokio::test]
    async fn forbidden_cold_load_is_silent_and_retryable() {
        let mut server = mockito::Server::new_async().await;
        let denied = server
            .mock("GET", "/users")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let (service, reporter) = service_for(&server);
        service.handle_profile_change(Some(&admin())).await;

        denied.assert_async().await;
        assert_eq!(reporter.reported.load(Ordering::SeqCst), 0);
        assert!(service.users().await.is_empty());

        // Guard was reset, so a later authorized trigger loads for real
        let allowed = server
            .mock("GET", "/users")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(users_body(&["a@example.com"]))
            .expect(1)
            .create_async()
            .await;

        service.handle_profile_change(Some(&admin())).await;

        allowed.assert_async().await;
        assert_eq!(service.users().await.len(), 1);
        assert_eq!(reporter.reported.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_triggers_load_once() {
        let mut server = mockito::Server::new_async().await;
        let listing = server
            .mock("GET", "/users")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(users_body(&["a@example.com"]))
            .expect(1)
            .create_async()
            .await;

        let (service, _) = service_for(&server);
        service.handle_profile_change(Some(&admin())).await;
        service.handle_profile_change(Some(&admin())).await;

        listing.assert_async().await;
    }

    #[tokio::test]
    async fn non_admin_profile_never_loads() {
        let mut server = mockito::Server::new_async().await;
        let listing = server
            .mock("GET", "/users")
            .expect(0)
            .create_async()
            .await;

        let (service, reporter) = service_for(&server);
        service.handle_profile_change(None).await;
        service
            .handle_profile_change(Some(&member("user@example.com")))
            .await;

        listing.assert_async().await;
        assert_eq!(reporter.reported.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn profile_watcher_drives_cold_load() {
        let mut server = mockito::Server::new_async().await;
        let listing = server
            .mock("GET", "/users")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(users_body(&["a@example.com"]))
            .expect(1)
            .create_async()
            .await;

        let (service, _) = service_for(&server);
        let (profile_tx, profile_rx) = watch::channel(None);
        let watcher = service.spawn_profile_watcher(profile_rx);

        profile_tx.send_replace(Some(admin()));
        drop(profile_tx);
        watcher.await.unwrap();

        listing.assert_async().await;
        assert_eq!(service.users().await.len(), 1);
    }

    #[tokio::test]
    async fn successful_create_reloads_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        let created = server
            .mock("POST", "/users")
            .with_status(201)
            .expect(1)
            .create_async()
            .await;
        let reloaded = server
            .mock("GET", "/users")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(users_body(&["a@example.com", "b@example.com"]))
            .expect(1)
            .create_async()
            .await;

        let (service, reporter) = service_for(&server);
        service.create_user(&member("b@example.com")).await;

        created.assert_async().await;
        reloaded.assert_async().await;
        assert_eq!(service.users().await.len(), 2);
        assert_eq!(service.feed.latest().len(), 2);
        assert_eq!(reporter.reported.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_delete_reports_and_leaves_cache_alone() {
        let mut server = mockito::Server::new_async().await;
        let deleted = server
            .mock("DELETE", "/users/b%40example.com")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let reloaded = server
            .mock("GET", "/users")
            .expect(0)
            .create_async()
            .await;

        let (service, reporter) = service_for(&server);
        service.delete_user("b@example.com").await;

        deleted.assert_async().await;
        reloaded.assert_async().await;
        assert_eq!(reporter.reported.load(Ordering::SeqCst), 1);
        assert!(service.users().await.is_empty());
    }

    #[tokio::test]
    async fn edit_targets_email_keyed_resource() {
        let mut server = mockito::Server::new_async().await;
        let edited = server
            .mock("PUT", "/users/b%40example.com")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let reloaded = server
            .mock("GET", "/users")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(users_body(&["b@example.com"]))
            .expect(1)
            .create_async()
            .await;

        let (service, _) = service_for(&server);
        service.edit_user(&member("b@example.com")).await;

        edited.assert_async().await;
        reloaded.assert_async().await;
    }

    #[tokio::test]
    async fn registration_code_is_posted_as_body() {
        let mut server = mockito::Server::new_async().await;
        let submitted = server
            .mock("POST", "/users/forward/b%40example.com")
            .match_body(mockito::Matcher::Json(serde_json::json!({ "code": "1234" })))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let (service, reporter) = service_for(&server);
        service
            .submit_registration_code("b@example.com", "1234")
            .await;

        submitted.assert_async().await;
        assert_eq!(reporter.reported.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_listing_failure_collapses_to_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/forward")
            .with_status(500)
            .create_async()
            .await;

        let (service, reporter) = service_for(&server);
        let identifiers = service.list_remote_registered().await;

        assert!(identifiers.is_empty());
        assert_eq!(reporter.reported.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn session_side_operations_do_not_touch_the_cache() {
        let mut server = mockito::Server::new_async().await;
        let revoked = server
            .mock("POST", "/auth/logout-sessions/b%40example.com")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let reloaded = server
            .mock("GET", "/users")
            .expect(0)
            .create_async()
            .await;

        let (service, _) = service_for(&server);
        service.revoke_sessions("b@example.com").await;

        revoked.assert_async().await;
        reloaded.assert_async().await;
    }

    #[tokio::test]
    async fn cleanup_keeps_last_published_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let listing = server
            .mock("GET", "/users")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(users_body(&["a@example.com"]))
            .expect(2)
            .create_async()
            .await;

        let (service, _) = service_for(&server);
        service.handle_profile_change(Some(&admin())).await;
        assert_eq!(service.users().await.len(), 1);

        service.cleanup().await;

        // Cache is empty, but subscribers still observe the stale snapshot
        assert!(service.users().await.is_empty());
        assert_eq!(service.feed.latest().len(), 1);

        // Guard is cleared, so the next admin trigger cold-loads again
        service.handle_profile_change(Some(&admin())).await;
        listing.assert_async().await;
        assert_eq!(service.users().await.len(), 1);
    }
}
