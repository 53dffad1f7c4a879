//! Session store: the current identity and its persisted copy.
//!
//! The store is the only writer of the persisted identity slot. The slot is
//! read once, by [`SessionStore::restore`], at startup.

use std::sync::{Arc, PoisonError, RwLock};

use protocol::{AuthRequest, Identity, UserType};

use crate::error::ClientResult;
use crate::gateway::Gateway;
use crate::storage::IdentityBackend;

/// Holds the authenticated identity, if any.
pub struct SessionStore {
    gateway: Arc<dyn Gateway>,
    backend: Arc<dyn IdentityBackend>,
    current: RwLock<Option<Identity>>,
}

impl SessionStore {
    pub fn new(gateway: Arc<dyn Gateway>, backend: Arc<dyn IdentityBackend>) -> Self {
        Self {
            gateway,
            backend,
            current: RwLock::new(None),
        }
    }

    /// The identity of the current session.
    pub fn current(&self) -> Option<Identity> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Load the persisted identity into memory. No network call.
    ///
    /// A value that no longer decodes is cleared and treated as absent.
    pub fn restore(&self) -> Option<Identity> {
        let raw = match self.backend.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No persisted session");
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => {
                tracing::info!("Restored session for {}", identity.email);
                self.set_current(Some(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                tracing::warn!("Discarding undecodable persisted session: {}", e);
                if let Err(e) = self.backend.clear() {
                    tracing::warn!("Failed to clear persisted session: {}", e);
                }
                None
            }
        }
    }

    /// Log in through the gateway and start a session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Identity> {
        tracing::debug!("Logging in as {}", email);
        let identity = self
            .gateway
            .authenticate(AuthRequest::login(email, password))
            .await?;
        self.establish(identity.clone());
        Ok(identity)
    }

    /// Register through the gateway and start a session.
    ///
    /// `special_code` is only sent for special accounts and is checked by
    /// the service.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        user_type: UserType,
        special_code: Option<String>,
    ) -> ClientResult<Identity> {
        tracing::debug!("Registering {} as {}", email, user_type);
        let identity = self
            .gateway
            .authenticate(AuthRequest::register(
                email,
                password,
                user_type,
                special_code,
            ))
            .await?;
        self.establish(identity.clone());
        Ok(identity)
    }

    /// End the session. Storage failures are logged, never returned.
    pub fn logout(&self) -> Option<Identity> {
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Err(e) = self.backend.clear() {
            tracing::warn!("Failed to clear persisted session: {}", e);
        }
        if let Some(identity) = &previous {
            tracing::info!("Logged out {}", identity.email);
        }
        previous
    }

    fn establish(&self, identity: Identity) {
        tracing::info!("Session started for {} ({})", identity.email, identity.user_type);
        match serde_json::to_string(&identity) {
            Ok(raw) => {
                if let Err(e) = self.backend.store(&raw) {
                    tracing::warn!("Session will not survive restart: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to encode session: {}", e),
        }
        self.set_current(Some(identity));
    }

    fn set_current(&self, identity: Option<Identity>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = identity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::gateway::{InMemoryGateway, DEFAULT_SPECIAL_CODE};
    use crate::storage::{BackendError, BackendResult, MemoryBackend};

    fn store_with(backend: Arc<dyn IdentityBackend>) -> (Arc<InMemoryGateway>, SessionStore) {
        let gateway = Arc::new(InMemoryGateway::new());
        let store = SessionStore::new(gateway.clone(), backend);
        (gateway, store)
    }

    struct BrokenBackend;

    impl IdentityBackend for BrokenBackend {
        fn load(&self) -> BackendResult<Option<String>> {
            Err(BackendError::Unavailable("disk gone".into()))
        }
        fn store(&self, _value: &str) -> BackendResult<()> {
            Err(BackendError::Unavailable("disk gone".into()))
        }
        fn clear(&self) -> BackendResult<()> {
            Err(BackendError::Unavailable("disk gone".into()))
        }
    }

    #[test]
    fn test_restore_empty_backend() {
        let (_, store) = store_with(Arc::new(MemoryBackend::new()));
        assert!(store.restore().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_restore_persisted_identity() {
        let raw = r#"{"user_id":7,"email":"a@x.com","user_type":"special","is_verified":true}"#;
        let (gateway, store) = store_with(Arc::new(MemoryBackend::with_value(raw)));

        let identity = store.restore().expect("identity should restore");
        assert_eq!(identity.user_id, 7);
        assert_eq!(store.current(), Some(identity));
        assert_eq!(gateway.calls().authenticate, 0);
    }

    #[test]
    fn test_restore_discards_undecodable_value() {
        let backend = Arc::new(MemoryBackend::with_value("{not json"));
        let (_, store) = store_with(backend.clone());

        assert!(store.restore().is_none());
        assert_eq!(backend.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_register_persists_identity() {
        let backend = Arc::new(MemoryBackend::new());
        let (_, store) = store_with(backend.clone());

        let identity = store
            .register("a@x.com", "p1", UserType::Special, Some(DEFAULT_SPECIAL_CODE.into()))
            .await
            .expect("register should succeed");

        let raw = backend.load().unwrap().expect("identity should be persisted");
        let persisted: Identity = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, identity);
        assert_eq!(store.current(), Some(identity));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_session_empty() {
        let (_, store) = store_with(Arc::new(MemoryBackend::new()));

        let err = store.login("nobody@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected(ref m) if m == "Invalid email or password"));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_memory_and_storage() {
        let backend = Arc::new(MemoryBackend::new());
        let (_, store) = store_with(backend.clone());
        store
            .register("r@x.com", "pw", UserType::Regular, None)
            .await
            .unwrap();

        let previous = store.logout();
        assert_eq!(previous.map(|i| i.email), Some("r@x.com".to_string()));
        assert!(store.current().is_none());
        assert_eq!(backend.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_in_memory_session() {
        let (_, store) = store_with(Arc::new(BrokenBackend));

        let identity = store
            .register("r@x.com", "pw", UserType::Regular, None)
            .await
            .expect("register should succeed despite storage failure");
        assert_eq!(store.current(), Some(identity));

        assert!(store.logout().is_some());
        assert!(store.current().is_none());
    }
}
