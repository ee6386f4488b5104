//! Concrete backends and their construction from a run configuration.

pub mod api;
pub mod datastore;
pub mod pool;

pub use api::{ApiBackend, ApiConfig};
pub use datastore::DatastoreBackend;

use crate::auth::AuthToken;
use crate::config::{Config, ConnectionTarget};
use crate::error::CliResult;
use blacklist_engine::Backend;

/// Build the backend the configuration points at.
///
/// The token is only used by the API backend.
pub async fn connect(config: &Config, token: AuthToken) -> CliResult<Box<dyn Backend>> {
    match &config.target {
        ConnectionTarget::Api(target) => {
            let api = ApiConfig::new(target.base_url(), token)
                .with_page_size(config.page_size)
                .with_timeout(config.timeout);
            Ok(Box::new(ApiBackend::new(api)?))
        }
        ConnectionTarget::Datastore(target) => {
            let backend =
                DatastoreBackend::connect(target, config.concurrency, config.timeout).await?;
            Ok(Box::new(backend))
        }
    }
}
