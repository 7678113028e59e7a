//! Digest verification of a stored object.

use crate::digest::{Algorithm, Digest};
use crate::error::{Error, Result};
use crate::objects::{calc_digest, protocol_uri, StorageObject};
use crate::progress::ProgressSettings;
use crate::streaming::DEFAULT_RANGE_SIZE;

/// Compares an object's content against an expected digest.
pub struct Check<'a> {
    pub object: &'a mut dyn StorageObject,
    pub expected: Digest,
    pub algorithm: Algorithm,
    pub range_size: u64,
    pub progress: Option<ProgressSettings>,
}

impl<'a> Check<'a> {
    pub fn new(object: &'a mut dyn StorageObject, expected: Digest, algorithm: Algorithm) -> Self {
        Self {
            object,
            expected,
            algorithm,
            range_size: DEFAULT_RANGE_SIZE,
            progress: None,
        }
    }

    /// Downloads the full object and returns its digest, or `DigestMismatch`
    /// if it differs from the expected value.
    pub fn verify_digest(self) -> Result<Digest> {
        let uri = protocol_uri(self.object);
        let actual = calc_digest(self.object, self.range_size, self.algorithm, self.progress.as_ref())?;
        if actual != self.expected {
            tracing::warn!(
                "{}: {} digest mismatch (expected {}, actual {})",
                uri,
                self.algorithm,
                self.expected,
                actual
            );
            return Err(Error::DigestMismatch {
                expected: self.expected,
                actual,
            });
        }
        tracing::debug!("{}: verified {} digest {}", uri, self.algorithm, actual);
        Ok(actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::MemoryStore;

    #[test]
    fn matching_digest_is_returned() {
        let store = MemoryStore::new("b");
        store.put("k", b"hello\n".to_vec());
        let mut obj = store.object("k");
        let expected = Algorithm::Md5.digest_bytes(b"hello\n");
        let mut check = Check::new(&mut obj, expected.clone(), Algorithm::Md5);
        check.range_size = 4;
        assert_eq!(check.verify_digest().unwrap(), expected);
    }

    #[test]
    fn mismatch_reports_both_digests() {
        let store = MemoryStore::new("b");
        store.put("k", b"hello\n".to_vec());
        let mut obj = store.object("k");
        let expected = Algorithm::Sha256.digest_bytes(b"goodbye\n");
        match Check::new(&mut obj, expected.clone(), Algorithm::Sha256).verify_digest() {
            Err(Error::DigestMismatch { expected: e, actual }) => {
                assert_eq!(e, expected);
                assert_eq!(actual, Algorithm::Sha256.digest_bytes(b"hello\n"));
            }
            other => panic!("expected DigestMismatch, got {:?}", other),
        }
    }

    #[test]
    fn missing_object_is_not_a_mismatch() {
        let store = MemoryStore::new("b");
        let mut obj = store.object("nope");
        let err = Check::new(&mut obj, Algorithm::Sha256.empty_digest(), Algorithm::Sha256)
            .verify_digest()
            .unwrap_err();
        assert!(matches!(err, Error::Metadata { .. }));
    }
}
