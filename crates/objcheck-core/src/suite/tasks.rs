//! The fixed task list: object sizes, object counts, awkward keys.

use super::{SuiteTask, TaskOutcome};
use crate::crvd::{Crvd, CrvdSettings};
use crate::error::Result;
use crate::keys::{BuiltinKeys, KeySource, Keys};
use crate::target::Target;
use crate::units::{format_bytes, KIBIBYTE};
use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

/// Object counts exercised by count tasks, smallest first.
pub const OBJECT_COUNTS: [u64; 5] = [1, 16, 256, 4096, 65536];

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// 0, then powers of 1024 up to `size_max`, then `size_max` itself if it
/// is not already in the list.
pub fn suite_sizes(size_max: u64) -> Vec<u64> {
    let mut sizes = vec![0u64];
    let mut size = 1u64;
    while size <= size_max {
        sizes.push(size);
        match size.checked_mul(KIBIBYTE) {
            Some(next) => size = next,
            None => break,
        }
    }
    if sizes.last() != Some(&size_max) {
        sizes.push(size_max);
    }
    sizes
}

/// Entries of [`OBJECT_COUNTS`] not above `count_max`; all of them when unbounded.
pub fn suite_counts(count_max: Option<u64>) -> Vec<u64> {
    OBJECT_COUNTS
        .iter()
        .copied()
        .filter(|n| count_max.map_or(true, |max| *n <= max))
        .collect()
}

/// One CRVD round trip of a given size.
pub struct SizeTask {
    size: u64,
    settings: CrvdSettings,
}

impl SizeTask {
    pub fn new(size: u64, settings: &CrvdSettings) -> Self {
        let mut settings = settings.clone();
        settings.content_length = size;
        Self { size, settings }
    }
}

impl SuiteTask for SizeTask {
    fn title(&self) -> String {
        format!("create/retrieve/verify/delete {} object", format_bytes(self.size))
    }

    fn invoke(&self, target: &Target) -> TaskOutcome {
        let key = format!("objcheck-suite-{}-{}.bin", self.size, unix_secs());
        let run = || -> Result<()> {
            Crvd::for_key(target, &key, &self.settings)?.create_retrieve_verify_delete()?;
            Ok(())
        };
        match run() {
            Ok(()) => TaskOutcome::success(),
            Err(e) => TaskOutcome::failure(format!("{}: {}", key, e)),
        }
    }
}

/// `count` objects created together, then verified, then deleted.
pub struct CountTask {
    count: u64,
    settings: CrvdSettings,
}

impl CountTask {
    pub fn new(count: u64, settings: &CrvdSettings) -> Self {
        Self {
            count,
            settings: settings.clone(),
        }
    }
}

impl SuiteTask for CountTask {
    fn title(&self) -> String {
        let noun = if self.count == 1 { "object" } else { "objects" };
        format!("create, verify and delete {} {}", self.count, noun)
    }

    fn invoke(&self, target: &Target) -> TaskOutcome {
        let stamp = unix_secs();
        let mut created: Vec<Crvd> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for i in 0..self.count {
            let key = format!("objcheck-suite-count-{}-{}-{}.bin", self.count, stamp, i);
            match Crvd::for_key(target, &key, &self.settings) {
                Ok(mut crvd) => match crvd.create() {
                    Ok(_) => {
                        crvd.release();
                        created.push(crvd);
                    }
                    Err(e) => errors.push(format!("create {}: {}", key, e)),
                },
                Err(e) => {
                    errors.push(format!("{}: {}", key, e));
                    break;
                }
            }
        }

        for crvd in created.iter_mut() {
            let expected = crvd.expected_digest().cloned();
            let verified = crvd.verify_length().and_then(|_| match expected {
                Some(expected) => crvd.verify_digest(expected).map(|_| ()),
                None => Ok(()),
            });
            if let Err(e) = verified {
                errors.push(format!("verify {}: {}", crvd.uri(), e));
            }
        }

        for crvd in created.iter_mut() {
            if let Err(e) = crvd.delete() {
                errors.push(e.to_string());
            }
        }

        if errors.is_empty() {
            return TaskOutcome::success();
        }
        let mut detail = format!("{} errors across {} objects", errors.len(), self.count);
        for e in &errors {
            let _ = write!(detail, "\n  {}", e);
        }
        TaskOutcome::failure(detail)
    }
}

/// Batch key validation over one built-in key list.
pub struct KeysTask {
    source: BuiltinKeys,
    settings: CrvdSettings,
}

impl KeysTask {
    pub fn new(source: BuiltinKeys, settings: &CrvdSettings) -> Self {
        Self {
            source,
            settings: settings.clone(),
        }
    }
}

impl SuiteTask for KeysTask {
    fn title(&self) -> String {
        format!("keys: {} ({} keys)", self.source.name(), self.source.count())
    }

    fn invoke(&self, target: &Target) -> TaskOutcome {
        let keys = Keys::new(target.clone(), self.settings.clone());
        match keys.check_all(&self.source) {
            Ok(failures) if failures.is_empty() => TaskOutcome::success(),
            Ok(failures) => {
                let mut detail = format!(
                    "{} of {} keys failed",
                    failures.len(),
                    self.source.count()
                );
                for f in &failures {
                    let _ = write!(detail, "\n  {}. {:?}: {}", f.index + 1, f.key, f.error);
                }
                TaskOutcome::failure(detail)
            }
            Err(e) => TaskOutcome::failure(e.to_string()),
        }
    }
}
