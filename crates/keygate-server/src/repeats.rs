use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

/// In-memory count of redundant same-day client-key requests per IP.
///
/// Counts reset on restart. Entries from earlier days are dropped whenever
/// a new day's request is recorded, but within one day there is no cap: keys
/// come from the client-supplied `X-Forwarded-For`, so a client rotating that
/// header adds one entry per spoofed value until the day rolls over.
#[derive(Clone, Default)]
pub struct RepeatTracker {
    inner: Arc<Mutex<HashMap<(String, NaiveDate), u32>>>,
}

impl RepeatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redundant requests already recorded for (ip, day).
    pub fn count(&self, ip: &str, day: NaiveDate) -> Result<u32> {
        let map = self.inner.lock().map_err(|_| anyhow!("repeat tracker poisoned"))?;
        Ok(map.get(&(ip.to_owned(), day)).copied().unwrap_or(0))
    }

    /// Record one more redundant request and return the new count.
    pub fn record(&self, ip: &str, day: NaiveDate) -> Result<u32> {
        let mut map = self.inner.lock().map_err(|_| anyhow!("repeat tracker poisoned"))?;
        map.retain(|(_, d), _| *d >= day);
        let n = map.entry((ip.to_owned(), day)).or_insert(0);
        *n += 1;
        Ok(*n)
    }

    /// Forget an IP's count for `day`.
    pub fn clear(&self, ip: &str, day: NaiveDate) -> Result<()> {
        let mut map = self.inner.lock().map_err(|_| anyhow!("repeat tracker poisoned"))?;
        map.remove(&(ip.to_owned(), day));
        Ok(())
    }
}
