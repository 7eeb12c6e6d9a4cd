pub mod bans;
pub mod json_file;
pub mod keys;
pub mod model;

pub use bans::BanList;
pub use json_file::{JsonListFile, JsonListGuard};
pub use keys::KeyStore;
pub use model::{KeyRecord, DEVELOPER_KEY_PREFIX};
