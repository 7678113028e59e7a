//! Create-retrieve-verify-delete round trip for a single object.
//!
//! The body is uploaded through a digest tee, the stored length is
//! re-resolved, the object is downloaded in ranges and digested again, and
//! finally the object is deleted. A verification error always takes
//! precedence over a delete error.

use crate::check::Check;
use crate::digest::{Algorithm, Digest, HashingReader};
use crate::error::{Error, Result};
use crate::objects::{protocol_uri, StorageObject};
use crate::progress::{ProgressReader, ProgressReporter, ProgressSettings};
use crate::streaming::DEFAULT_RANGE_SIZE;
use crate::target::Target;
use crate::units::format_bytes;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt;
use std::io::{self, Read};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_CONTENT_LENGTH: u64 = 8;
pub const DEFAULT_RANDOM_SEED: u64 = 1;

/// Where a round trip currently stands. `Failed` is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrvdState {
    Created,
    ContentVerified,
    DigestVerified,
    Deleted,
    Failed,
}

/// Produces a fresh body stream on each call.
pub type BodyProvider = Box<dyn FnMut() -> Box<dyn Read + Send> + Send>;

/// Content of the object under test.
pub enum BodySource {
    /// Deterministic pseudo-random bytes from this seed.
    Seeded(u64),
    Provider(BodyProvider),
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodySource::Seeded(seed) => f.debug_tuple("Seeded").field(seed).finish(),
            BodySource::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Settings shared by every round trip of a run.
#[derive(Debug, Clone)]
pub struct CrvdSettings {
    pub content_length: u64,
    pub random_seed: u64,
    pub algorithm: Algorithm,
    pub range_size: u64,
    pub progress: Option<ProgressSettings>,
}

impl Default for CrvdSettings {
    fn default() -> Self {
        Self {
            content_length: DEFAULT_CONTENT_LENGTH,
            random_seed: DEFAULT_RANDOM_SEED,
            algorithm: Algorithm::default(),
            range_size: DEFAULT_RANGE_SIZE,
            progress: None,
        }
    }
}

/// Infinite stream of seeded pseudo-random bytes.
pub struct SeededReader(StdRng);

impl SeededReader {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Read for SeededReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.fill_bytes(buf);
        Ok(buf.len())
    }
}

/// Key used when none is given: `objcheck-crvd-<unix-seconds>.bin`.
pub fn generated_key() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("objcheck-crvd-{}.bin", secs)
}

pub struct Crvd {
    object: Box<dyn StorageObject>,
    content_length: u64,
    body: BodySource,
    algorithm: Algorithm,
    range_size: u64,
    progress: Option<ProgressSettings>,
    expected: Option<Digest>,
    state: Option<CrvdState>,
}

impl Crvd {
    pub fn new(object: Box<dyn StorageObject>, content_length: u64, body: BodySource) -> Self {
        Self {
            object,
            content_length,
            body,
            algorithm: Algorithm::default(),
            range_size: DEFAULT_RANGE_SIZE,
            progress: None,
            expected: None,
            state: None,
        }
    }

    /// Round trip for `key` in `target` (a generated key when empty) using a seeded body.
    pub fn for_key(target: &Target, key: &str, settings: &CrvdSettings) -> Result<Self> {
        let key = if key.is_empty() {
            generated_key()
        } else {
            key.to_string()
        };
        let object = target.object(&key)?;
        Ok(Self::new(
            object,
            settings.content_length,
            BodySource::Seeded(settings.random_seed),
        )
        .with_settings(settings))
    }

    /// Defaults: 8-byte body from seed 1, SHA-256, default range size.
    pub fn with_defaults(target: &Target, key: &str) -> Result<Self> {
        Self::for_key(target, key, &CrvdSettings::default())
    }

    pub fn with_settings(mut self, settings: &CrvdSettings) -> Self {
        self.algorithm = settings.algorithm;
        self.range_size = settings.range_size;
        self.progress = settings.progress.clone();
        self
    }

    pub fn object(&self) -> &dyn StorageObject {
        self.object.as_ref()
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn state(&self) -> Option<CrvdState> {
        self.state
    }

    /// Digest computed while uploading, once `create` has succeeded.
    pub fn expected_digest(&self) -> Option<&Digest> {
        self.expected.as_ref()
    }

    pub fn uri(&self) -> String {
        protocol_uri(self.object.as_ref())
    }

    fn new_body(&mut self) -> Box<dyn Read + Send> {
        match &mut self.body {
            BodySource::Seeded(seed) => Box::new(SeededReader::new(*seed)),
            BodySource::Provider(provider) => provider(),
        }
    }

    fn track<T>(&mut self, next: CrvdState, result: Result<T>) -> Result<T> {
        self.state = Some(if result.is_ok() { next } else { CrvdState::Failed });
        result
    }

    /// Uploads the body, returning the digest of the bytes sent.
    pub fn create(&mut self) -> Result<Digest> {
        let uri = self.uri();
        let length = self.content_length;
        tracing::debug!("creating object ({}) at {}", format_bytes(length), uri);

        let body = self.new_body().take(length);
        let mut hashing = HashingReader::new(body, self.algorithm);
        let uploaded = match &self.progress {
            Some(settings) if length > self.range_size => {
                let reporter = ProgressReporter::start(format!("upload {}", uri), length, settings);
                let mut counted = ProgressReader::new(&mut hashing, reporter);
                self.object.stream_upload(&mut counted, length)
            }
            _ => self.object.stream_upload(&mut hashing, length),
        };
        let sent = hashing.total_bytes();
        let digest = hashing.finalize();
        self.track(CrvdState::Created, uploaded)?;

        tracing::debug!(
            "created {} ({} bytes, {} on upload: {})",
            uri,
            sent,
            self.algorithm,
            digest
        );
        self.expected = Some(digest.clone());
        Ok(digest)
    }

    /// Drops the backend session and cached metadata until the next request.
    /// Callers holding many created objects release each one after `create`.
    pub fn release(&mut self) {
        self.object.reset();
    }

    /// Re-resolves the stored length and compares it with the bytes uploaded.
    pub fn verify_length(&mut self) -> Result<u64> {
        let uri = self.uri();
        self.object.reset();
        let resolved = self.object.content_length().map_err(|e| match e {
            Error::Metadata { .. } => e,
            other => Error::Metadata {
                uri,
                reason: other.to_string(),
            },
        });
        let result = resolved.and_then(|actual| {
            if actual == self.content_length {
                Ok(actual)
            } else {
                Err(Error::LengthMismatch {
                    expected: self.content_length,
                    actual,
                })
            }
        });
        self.track(CrvdState::ContentVerified, result)
    }

    /// Downloads the object in ranges and compares its digest with `expected`.
    pub fn verify_digest(&mut self, expected: Digest) -> Result<Digest> {
        tracing::debug!("verifying {} (expected digest: {})", self.uri(), expected);
        let check = Check {
            object: self.object.as_mut(),
            expected,
            algorithm: self.algorithm,
            range_size: self.range_size,
            progress: self.progress.clone(),
        };
        let result = check.verify_digest();
        self.track(CrvdState::DigestVerified, result)
    }

    pub fn delete(&mut self) -> Result<()> {
        let uri = self.uri();
        let result = self.object.delete().map_err(|e| Error::Delete {
            uri,
            source: Box::new(e),
        });
        self.track(CrvdState::Deleted, result)
    }

    /// Create, verify length, verify digest.
    pub fn create_retrieve_verify(&mut self) -> Result<Digest> {
        let expected = self.create()?;
        self.verify_length()?;
        let actual = self.verify_digest(expected)?;
        tracing::debug!(
            "verified {} ({} bytes, {} digest {})",
            self.uri(),
            self.content_length,
            self.algorithm,
            actual
        );
        Ok(actual)
    }

    /// Full round trip. Delete is attempted even when verification failed;
    /// the verification error wins over a delete error.
    pub fn create_retrieve_verify_delete(&mut self) -> Result<Digest> {
        let verified = self.create_retrieve_verify();
        let deleted = self.delete();
        match (verified, deleted) {
            (Ok(digest), Ok(())) => Ok(digest),
            (Ok(_), Err(delete_err)) => Err(delete_err),
            (Err(verify_err), deleted) => {
                if let Err(delete_err) = deleted {
                    tracing::debug!("ignoring cleanup failure after failed verify: {}", delete_err);
                }
                self.state = Some(CrvdState::Failed);
                Err(verify_err)
            }
        }
    }
}

impl fmt::Debug for Crvd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crvd")
            .field("object", &self.uri())
            .field("content_length", &self.content_length)
            .field("body", &self.body)
            .field("algorithm", &self.algorithm)
            .field("state", &self.state)
            .finish()
    }
}
