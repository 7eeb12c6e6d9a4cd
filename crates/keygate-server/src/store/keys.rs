use std::path::Path;

use super::{JsonListFile, KeyRecord};

/// File name of the issued-key log inside the data directory.
pub const KEYS_FILE: &str = "generated_keys.json";

/// Append-only log of every issued key.
pub type KeyStore = JsonListFile<KeyRecord>;

impl JsonListFile<KeyRecord> {
    pub fn open_keys(data_dir: &Path) -> Self {
        Self::new(data_dir.join(KEYS_FILE))
    }
}
