use std::sync::Arc;

use crate::config::Config;
use crate::remote::{Remote, RemoteConnector};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Builds per-request remotes bound to the caller's access token.
    /// Default: SupabaseConnector. Tests swap in the in-memory fake.
    pub connector: Arc<dyn RemoteConnector>,
}

impl AppState {
    pub fn remote(&self, access_token: Option<&str>) -> Remote {
        self.connector.connect(access_token)
    }
}
