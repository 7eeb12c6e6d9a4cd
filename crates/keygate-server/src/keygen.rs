use rand::Rng;

use crate::store::DEVELOPER_KEY_PREFIX;

/// Generate a regular daily key: 32 random hex chars.
pub fn generate_client_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Generate a developer key: "dev_" + 48 random hex chars.
pub fn generate_developer_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 24] = rng.gen();
    format!("{DEVELOPER_KEY_PREFIX}{}", hex::encode(bytes))
}
