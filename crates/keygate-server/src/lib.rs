pub mod client_ip;
pub mod dirs;
pub mod error;
pub mod handlers;
pub mod keygen;
pub mod page;
pub mod policy;
pub mod repeats;
pub mod server;
pub mod store;

use std::sync::Arc;

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Log of every issued key (`generated_keys.json`).
    pub keys: store::KeyStore,
    /// Permanent ban list (`banned_ips.json`).
    pub bans: store::BanList,
    /// Redundant same-day request counts, in memory only.
    pub repeats: repeats::RepeatTracker,
    /// Allowlist and issuance constants, fixed at startup.
    pub policy: Arc<policy::PolicyConfig>,
    pub pages: page::Pages,
    pub clock: policy::Clock,
}

impl AppState {
    /// State backed by the JSON files in `data_dir`.
    pub fn open(
        data_dir: &std::path::Path,
        policy: policy::PolicyConfig,
        clock: policy::Clock,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            keys: store::KeyStore::open_keys(data_dir),
            bans: store::BanList::open_bans(data_dir),
            repeats: repeats::RepeatTracker::new(),
            policy: Arc::new(policy),
            pages: page::Pages::new()?,
            clock,
        })
    }
}

pub use server::{build_router, resolve_data_dir, run, ServerConfig};
