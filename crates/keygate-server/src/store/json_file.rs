use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::ser::PrettyFormatter;

/// A JSON array persisted as a whole file.
///
/// Every `load` reads the full file, every `save` overwrites it. The write is
/// not atomic: a crash mid-write can leave a truncated file, which then fails
/// to parse on the next load.
pub struct JsonListFile<T> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonListFile<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> JsonListFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take exclusive access for a full read-modify-write cycle.
    pub fn lock(&self) -> Result<JsonListGuard<'_, T>> {
        let guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("lock poisoned for {}", self.path.display()))?;
        Ok(JsonListGuard {
            file: self,
            _guard: guard,
        })
    }

    /// Load under the lock. Missing or empty file yields an empty list.
    pub fn load(&self) -> Result<Vec<T>> {
        self.lock()?.load()
    }

    /// Overwrite under the lock.
    pub fn save(&self, items: &[T]) -> Result<()> {
        self.lock()?.save(items)
    }

    fn read_unlocked(&self) -> Result<Vec<T>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", self.path.display()));
            }
        };
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", self.path.display()))
    }

    fn write_unlocked(&self, items: &[T]) -> Result<()> {
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        items
            .serialize(&mut ser)
            .with_context(|| format!("serialize {}", self.path.display()))?;
        std::fs::write(&self.path, buf).with_context(|| format!("write {}", self.path.display()))
    }
}

/// Exclusive handle on a [`JsonListFile`]; released on drop.
pub struct JsonListGuard<'a, T> {
    file: &'a JsonListFile<T>,
    _guard: MutexGuard<'a, ()>,
}

impl<T: Serialize + DeserializeOwned> JsonListGuard<'_, T> {
    pub fn load(&self) -> Result<Vec<T>> {
        self.file.read_unlocked()
    }

    pub fn save(&self, items: &[T]) -> Result<()> {
        self.file.write_unlocked(items)
    }
}
