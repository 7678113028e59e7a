//! Batch key validation: a CRVD round trip for every key of a source.
//!
//! A failing key is recorded and the batch moves on. Only an error building
//! the object for a key (an infrastructure problem) aborts the batch.

mod sources;

use crate::crvd::{Crvd, CrvdSettings};
use crate::error::{Error, Result};
use crate::target::Target;
use serde::{Serialize, Serializer};
use std::fs;
use std::path::Path;

/// Ordered, named list of keys to validate.
pub trait KeySource: Send + Sync {
    fn name(&self) -> &str;

    fn count(&self) -> usize {
        self.keys().len()
    }

    fn keys(&self) -> Vec<String>;
}

/// One of the compiled-in key lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKeys {
    Naughty,
    Unicode,
}

impl BuiltinKeys {
    pub const ALL: [BuiltinKeys; 2] = [BuiltinKeys::Naughty, BuiltinKeys::Unicode];

    fn list(self) -> &'static [&'static str] {
        match self {
            BuiltinKeys::Naughty => sources::NAUGHTY,
            BuiltinKeys::Unicode => sources::UNICODE,
        }
    }
}

impl KeySource for BuiltinKeys {
    fn name(&self) -> &str {
        match self {
            BuiltinKeys::Naughty => "naughty strings",
            BuiltinKeys::Unicode => "unicode",
        }
    }

    fn count(&self) -> usize {
        self.list().len()
    }

    fn keys(&self) -> Vec<String> {
        self.list().iter().map(|k| k.to_string()).collect()
    }
}

/// Keys read from a text file: one per line, blank lines and `#` comments skipped.
#[derive(Debug, Clone)]
pub struct FileKeys {
    name: String,
    keys: Vec<String>,
}

impl FileKeys {
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("unable to read key file {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&path.display().to_string(), &data))
    }

    pub fn parse(name: &str, data: &str) -> Self {
        let keys = data
            .lines()
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self {
            name: name.to_string(),
            keys,
        }
    }
}

impl KeySource for FileKeys {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys(&self) -> Vec<String> {
        self.keys.clone()
    }
}

/// Resolves `naughty`, `unicode`, or a path to a key file.
pub fn source_by_name(name: &str) -> Result<Box<dyn KeySource>> {
    match name {
        "naughty" => Ok(Box::new(BuiltinKeys::Naughty)),
        "unicode" => Ok(Box::new(BuiltinKeys::Unicode)),
        path => Ok(Box::new(FileKeys::open(Path::new(path))?)),
    }
}

/// A key whose round trip failed.
#[derive(Debug, Serialize)]
pub struct KeyFailure {
    pub source: String,
    pub index: usize,
    pub key: String,
    #[serde(serialize_with = "error_as_string")]
    pub error: Error,
}

fn error_as_string<S: Serializer>(error: &Error, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

pub struct Keys {
    target: Target,
    settings: CrvdSettings,
}

impl Keys {
    pub fn new(target: Target, settings: CrvdSettings) -> Self {
        Self { target, settings }
    }

    /// Validates every key of `source`, returning failures in index order.
    pub fn check_all(&self, source: &dyn KeySource) -> Result<Vec<KeyFailure>> {
        let keys = source.keys();
        let count = keys.len();
        let mut failures = Vec::new();
        for (index, key) in keys.into_iter().enumerate() {
            if let Some(failure) = self.check(source.name(), index, count, key)? {
                failures.push(failure);
            }
        }
        Ok(failures)
    }

    /// Validates one key. `Ok(None)` on success, `Ok(Some(..))` on a failed round trip.
    pub fn check(
        &self,
        source_name: &str,
        index: usize,
        count: usize,
        key: String,
    ) -> Result<Option<KeyFailure>> {
        let mut crvd = Crvd::for_key(&self.target, &key, &self.settings)?;
        tracing::info!("{} of {} from {}", index + 1, count, source_name);
        match crvd.create_retrieve_verify_delete() {
            Ok(_) => Ok(None),
            Err(error) => {
                tracing::info!(
                    "{:?} ({} of {} from {}) failed: {}",
                    key,
                    index + 1,
                    count,
                    source_name,
                    error
                );
                Ok(Some(KeyFailure {
                    source: source_name.to_string(),
                    index,
                    key,
                    error,
                }))
            }
        }
    }
}
