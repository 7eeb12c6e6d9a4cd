//! Key issuance rules.
//!
//! Everything here is pure: callers load the stores, pass the lists in, and
//! persist whatever the decision says. Locking happens in the HTTP layer.

use chrono::NaiveDate;

use crate::keygen::{generate_client_key, generate_developer_key};
use crate::store::KeyRecord;

/// Redundant same-day requests (counting stored duplicates) that trigger a ban.
pub const BAN_THRESHOLD: u32 = 10;

/// Validity windows a developer may request, in days.
pub const DEVELOPER_DAYS: &[u32] = &[3, 7, 14, 30, 60, 90];

/// Validity of a regular client key.
pub const CLIENT_KEY_DAYS: u32 = 1;

/// Immutable issuance settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// IP strings allowed to mint developer keys. Compared verbatim.
    pub allowlist: Vec<String>,
    pub ban_threshold: u32,
    pub developer_days: &'static [u32],
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowlist: vec!["127.0.0.1".to_owned()],
            ban_threshold: BAN_THRESHOLD,
            developer_days: DEVELOPER_DAYS,
        }
    }
}

impl PolicyConfig {
    pub fn with_allowlist(allowlist: Vec<String>) -> Self {
        Self {
            allowlist,
            ..Default::default()
        }
    }

    pub fn is_allowlisted(&self, ip: &str) -> bool {
        self.allowlist.iter().any(|a| a == ip)
    }
}

/// Source of "today". Dates are server-local.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => chrono::Local::now().date_naive(),
            Clock::Fixed(d) => *d,
        }
    }
}

// ── Regular client path ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientDecision {
    /// No key yet today: append this record.
    Issue(KeyRecord),
    /// Key already issued today: hand it back.
    Existing(String),
    /// Too many redundant requests: ban the IP.
    Ban,
}

/// Decide what a (not yet banned) client gets.
///
/// `prior_repeats` is how many redundant requests `ip` already made today.
/// Every stored record for (ip, today) beyond the first also counts as a
/// redundant request, so the tally is `matching + prior_repeats` and the
/// request that brings it to the threshold is refused with a ban.
pub fn decide_client(
    ip: &str,
    today: NaiveDate,
    records: &[KeyRecord],
    prior_repeats: u32,
    cfg: &PolicyConfig,
) -> ClientDecision {
    let mut matches = records.iter().filter(|r| r.issued_to(ip, today));

    let Some(first) = matches.next() else {
        return ClientDecision::Issue(KeyRecord::new(
            generate_client_key(),
            ip,
            today,
            CLIENT_KEY_DAYS,
        ));
    };

    if tally(1 + matches.count(), prior_repeats) >= cfg.ban_threshold {
        ClientDecision::Ban
    } else {
        ClientDecision::Existing(first.key.clone())
    }
}

/// Stored same-day records plus earlier redundant requests, saturating.
fn tally(matching: usize, prior_repeats: u32) -> u32 {
    u32::try_from(matching)
        .unwrap_or(u32::MAX)
        .saturating_add(prior_repeats)
}

// ── Developer path ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeveloperRejection {
    Unauthorized,
    InvalidDays,
}

/// Parse the `days` query value. No default: missing is invalid.
pub fn parse_days(raw: Option<&str>, cfg: &PolicyConfig) -> Result<u32, DeveloperRejection> {
    let days: u32 = raw
        .and_then(|s| s.trim().parse().ok())
        .ok_or(DeveloperRejection::InvalidDays)?;
    if cfg.developer_days.contains(&days) {
        Ok(days)
    } else {
        Err(DeveloperRejection::InvalidDays)
    }
}

/// Mint a developer key for an allowlisted IP. No daily limit or dedup.
pub fn decide_developer(
    ip: &str,
    days: Option<&str>,
    today: NaiveDate,
    cfg: &PolicyConfig,
) -> Result<KeyRecord, DeveloperRejection> {
    if !cfg.is_allowlisted(ip) {
        return Err(DeveloperRejection::Unauthorized);
    }
    let days = parse_days(days, cfg)?;
    Ok(KeyRecord::new(generate_developer_key(), ip, today, days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn record(ip: &str, day: NaiveDate, key: &str) -> KeyRecord {
        KeyRecord::new(key.into(), ip, day, 1)
    }

    #[test]
    fn first_request_issues_one_day_key() {
        let cfg = PolicyConfig::default();
        let ClientDecision::Issue(r) = decide_client("1.2.3.4", today(), &[], 0, &cfg) else {
            panic!("expected a new key");
        };
        assert_eq!(r.key.len(), 32);
        assert_eq!(r.generated_by_ip, "1.2.3.4");
        assert_eq!(r.generated_on, today());
        assert_eq!(r.valid_for_days, 1);
        assert_eq!(r.expires_on, today().succ_opt().unwrap());
    }

    #[test]
    fn yesterdays_key_does_not_count() {
        let cfg = PolicyConfig::default();
        let yesterday = today().pred_opt().unwrap();
        let records = vec![record("1.2.3.4", yesterday, "old")];
        assert!(matches!(
            decide_client("1.2.3.4", today(), &records, 0, &cfg),
            ClientDecision::Issue(_)
        ));
    }

    #[test]
    fn other_ips_do_not_count() {
        let cfg = PolicyConfig::default();
        let records = vec![record("5.6.7.8", today(), "theirs")];
        assert!(matches!(
            decide_client("1.2.3.4", today(), &records, 0, &cfg),
            ClientDecision::Issue(_)
        ));
    }

    #[test]
    fn repeat_returns_first_matching_key() {
        let cfg = PolicyConfig::default();
        let records = vec![
            record("9.9.9.9", today(), "other"),
            record("1.2.3.4", today(), "mine"),
            record("1.2.3.4", today(), "dupe"),
        ];
        assert_eq!(
            decide_client("1.2.3.4", today(), &records, 0, &cfg),
            ClientDecision::Existing("mine".into())
        );
    }

    #[test]
    fn ban_when_tally_reaches_threshold() {
        let cfg = PolicyConfig::default();
        let records = vec![record("1.2.3.4", today(), "mine")];
        assert_eq!(
            decide_client("1.2.3.4", today(), &records, 8, &cfg),
            ClientDecision::Existing("mine".into())
        );
        assert_eq!(
            decide_client("1.2.3.4", today(), &records, 9, &cfg),
            ClientDecision::Ban
        );
    }

    #[test]
    fn stored_duplicates_alone_can_ban() {
        let cfg = PolicyConfig::default();
        let records: Vec<_> = (0..10)
            .map(|i| record("1.2.3.4", today(), &format!("k{i}")))
            .collect();
        assert_eq!(
            decide_client("1.2.3.4", today(), &records, 0, &cfg),
            ClientDecision::Ban
        );
    }

    #[test]
    fn tally_saturates_instead_of_wrapping() {
        assert_eq!(tally(3, 4), 7);
        assert_eq!(tally(usize::MAX, 0), u32::MAX);
        assert_eq!(tally(1, u32::MAX), u32::MAX);
    }

    #[test]
    fn parse_days_accepts_only_permitted_values() {
        let cfg = PolicyConfig::default();
        for d in DEVELOPER_DAYS {
            assert_eq!(parse_days(Some(d.to_string().as_str()), &cfg), Ok(*d));
        }
        for bad in [None, Some(""), Some("5"), Some("seven"), Some("-7"), Some("7.0")] {
            assert_eq!(
                parse_days(bad, &cfg),
                Err(DeveloperRejection::InvalidDays),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn developer_requires_allowlist_before_days() {
        let cfg = PolicyConfig::with_allowlist(vec!["10.1.1.1".into()]);
        assert_eq!(
            decide_developer("1.2.3.4", Some("7"), today(), &cfg),
            Err(DeveloperRejection::Unauthorized)
        );
        assert_eq!(
            decide_developer("1.2.3.4", Some("5"), today(), &cfg),
            Err(DeveloperRejection::Unauthorized)
        );
        assert_eq!(
            decide_developer("10.1.1.1", Some("5"), today(), &cfg),
            Err(DeveloperRejection::InvalidDays)
        );
    }

    #[test]
    fn developer_key_has_requested_validity() {
        let cfg = PolicyConfig::default();
        let r = decide_developer("127.0.0.1", Some("7"), today(), &cfg).unwrap();
        assert!(r.is_developer());
        assert_eq!(r.valid_for_days, 7);
        assert_eq!(r.expires_on, NaiveDate::from_ymd_opt(2024, 6, 22).unwrap());
    }

    #[test]
    fn fixed_clock_is_stable() {
        assert_eq!(Clock::Fixed(today()).today(), today());
    }
}
