use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Prefix carried by every developer key.
pub const DEVELOPER_KEY_PREFIX: &str = "dev_";

/// One issued key, as persisted in `generated_keys.json`.
///
/// `expires_on` is computed once at issuance and never checked again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key: String,
    pub generated_by_ip: String,
    pub generated_on: NaiveDate,
    pub valid_for_days: u32,
    pub expires_on: NaiveDate,
}

impl KeyRecord {
    pub fn new(key: String, ip: &str, generated_on: NaiveDate, valid_for_days: u32) -> Self {
        let expires_on = generated_on + chrono::Days::new(u64::from(valid_for_days));
        Self {
            key,
            generated_by_ip: ip.to_owned(),
            generated_on,
            valid_for_days,
            expires_on,
        }
    }

    /// Returns true for keys issued through the developer path.
    pub fn is_developer(&self) -> bool {
        self.key.starts_with(DEVELOPER_KEY_PREFIX)
    }

    /// Returns true if this record was issued to `ip` on `day`.
    pub fn issued_to(&self, ip: &str, day: NaiveDate) -> bool {
        self.generated_by_ip == ip && self.generated_on == day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expires_on_adds_validity_days() {
        let r = KeyRecord::new("abc".into(), "1.2.3.4", day(2024, 2, 28), 1);
        assert_eq!(r.expires_on, day(2024, 2, 29));

        let r = KeyRecord::new("dev_abc".into(), "1.2.3.4", day(2024, 12, 20), 14);
        assert_eq!(r.expires_on, day(2025, 1, 3));
    }

    #[test]
    fn developer_prefix_detected() {
        let r = KeyRecord::new("dev_00ff".into(), "127.0.0.1", day(2024, 1, 1), 7);
        assert!(r.is_developer());
        let r2 = KeyRecord::new("00ff".into(), "127.0.0.1", day(2024, 1, 1), 1);
        assert!(!r2.is_developer());
    }

    #[test]
    fn issued_to_matches_ip_and_day() {
        let r = KeyRecord::new("k".into(), "10.0.0.1", day(2024, 5, 1), 1);
        assert!(r.issued_to("10.0.0.1", day(2024, 5, 1)));
        assert!(!r.issued_to("10.0.0.2", day(2024, 5, 1)));
        assert!(!r.issued_to("10.0.0.1", day(2024, 5, 2)));
    }

    #[test]
    fn dates_serialize_as_iso_strings() {
        let r = KeyRecord::new("k".into(), "10.0.0.1", day(2024, 5, 1), 1);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["generated_on"], "2024-05-01");
        assert_eq!(v["expires_on"], "2024-05-02");
        assert_eq!(v["valid_for_days"], 1);
    }
}
