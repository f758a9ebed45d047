//! Startup decision between the hosted store and local-only mode.

use std::sync::Arc;

use tracing::{info, warn};

use unmask_remote::{DocumentStore, FirestoreOptions, FirestoreStore, RemoteConfig, RemoteError};

/// Builds a remote store handle from usable credentials.
pub trait RemoteConnector {
    fn connect(&self, config: &RemoteConfig) -> Result<Arc<dyn DocumentStore>, RemoteError>;
}

impl<F> RemoteConnector for F
where
    F: Fn(&RemoteConfig) -> Result<Arc<dyn DocumentStore>, RemoteError>,
{
    fn connect(&self, config: &RemoteConfig) -> Result<Arc<dyn DocumentStore>, RemoteError> {
        self(config)
    }
}

/// Connects to the hosted Firestore REST API.
#[derive(Debug, Clone, Default)]
pub struct FirestoreConnector {
    pub options: FirestoreOptions,
}

impl RemoteConnector for FirestoreConnector {
    fn connect(&self, config: &RemoteConfig) -> Result<Arc<dyn DocumentStore>, RemoteError> {
        let store = FirestoreStore::connect(config, self.options.clone())?;
        Ok(Arc::new(store))
    }
}

/// Decide once whether the remote store is usable.
///
/// Unusable credentials never reach the connector. A connector failure is
/// logged and yields local-only mode; this function never fails.
pub fn select_backend(
    config: &RemoteConfig,
    connector: &dyn RemoteConnector,
) -> Option<Arc<dyn DocumentStore>> {
    if let Err(issue) = config.validate() {
        info!(%issue, "remote store not configured, running in local persistence mode");
        return None;
    }

    match connector.connect(config) {
        Ok(store) => {
            info!(project = %config.project_id, "remote store initialized");
            Some(store)
        }
        Err(e) => {
            warn!(error = %e, "remote store initialization failed, falling back to local storage");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use unmask_remote::MemoryDocumentStore;

    use super::*;

    fn usable() -> RemoteConfig {
        RemoteConfig {
            api_key: "key".into(),
            auth_domain: "unmask.firebaseapp.com".into(),
            project_id: "unmask".into(),
            storage_bucket: "unmask.appspot.com".into(),
            messaging_sender_id: "42".into(),
            app_id: "1:42:web:1".into(),
        }
    }

    #[test]
    fn placeholder_config_never_calls_connector() {
        let calls = AtomicUsize::new(0);
        let connector = |_: &RemoteConfig| -> Result<Arc<dyn DocumentStore>, RemoteError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MemoryDocumentStore::new()))
        };

        assert!(select_backend(&RemoteConfig::default(), &connector).is_none());
        let partial = RemoteConfig {
            app_id: String::new(),
            ..usable()
        };
        assert!(select_backend(&partial, &connector).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn usable_config_connects() {
        let connector = |_: &RemoteConfig| -> Result<Arc<dyn DocumentStore>, RemoteError> {
            Ok(Arc::new(MemoryDocumentStore::new()))
        };
        assert!(select_backend(&usable(), &connector).is_some());
    }

    #[test]
    fn connector_failure_degrades_to_local() {
        let connector = |_: &RemoteConfig| -> Result<Arc<dyn DocumentStore>, RemoteError> {
            Err(RemoteError::Unavailable("auth rejected".into()))
        };
        assert!(select_backend(&usable(), &connector).is_none());
    }

    #[test]
    fn firestore_connector_builds_without_network() {
        let store = select_backend(&usable(), &FirestoreConnector::default());
        assert!(store.is_some());
    }
}
