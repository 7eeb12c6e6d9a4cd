use std::path::Path;

use super::JsonListFile;

/// File name of the ban list inside the data directory.
pub const BANS_FILE: &str = "banned_ips.json";

/// Permanent list of banned IP strings. There is no removal path.
pub type BanList = JsonListFile<String>;

impl JsonListFile<String> {
    pub fn open_bans(data_dir: &Path) -> Self {
        Self::new(data_dir.join(BANS_FILE))
    }
}

pub fn contains(banned: &[String], ip: &str) -> bool {
    banned.iter().any(|b| b == ip)
}

/// Append `ip` unless already present. Returns true if the list changed.
pub fn insert(banned: &mut Vec<String>, ip: &str) -> bool {
    if contains(banned, ip) {
        return false;
    }
    banned.push(ip.to_owned());
    true
}
