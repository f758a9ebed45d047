//! Data-access layer of the Unmask client.
//!
//! [`DataService`] is the only surface the UI talks to. It prefers the
//! hosted document store when valid credentials are configured and
//! degrades to the on-device store otherwise, per call.

pub mod backend;
pub mod config;
pub mod error;
pub mod oracle;
pub mod selector;
pub mod service;
pub mod subscription;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use error::{BackendError, OracleError, PostError};
pub use oracle::{AllowAll, ContentOracle};
pub use service::{Dashboard, DataService};
pub use subscription::{Delivery, MessageCallback, Subscription};

const DEFAULT_LOG_FILTER: &str = "unmask_client=debug,unmask_store=info,unmask_remote=info,warn";

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter. Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Load configuration from the environment, open the data layer and run its
/// startup bootstrap.
pub async fn start() -> Result<DataService, unmask_store::StoreError> {
    let config = ClientConfig::from_env();
    let service = DataService::open(&config)?;
    service.initialize().await;

    tracing::info!(
        cloud = service.is_cloud_connected(),
        "Unmask data layer ready"
    );
    Ok(service)
}
