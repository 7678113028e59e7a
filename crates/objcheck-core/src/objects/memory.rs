//! In-process object store (`mem://bucket`).
//!
//! Useful for self-tests of the pipeline and for exercising validation logic
//! without a network.

use super::StorageObject;
use crate::error::{Error, Result};
use crate::streaming::read_exactly;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Shared bucket contents. Objects created from the same store see each other's writes.
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    endpoint: Url,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Arc<Self> {
        let endpoint = Url::parse(&format!("mem://{}/", bucket))
            .unwrap_or_else(|_| Url::parse("mem://localhost/").expect("static URL is valid"));
        Arc::new(Self {
            bucket: bucket.to_string(),
            endpoint,
            objects: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn object(self: &Arc<Self>, key: &str) -> MemoryObject {
        MemoryObject {
            store: Arc::clone(self),
            key: key.to_string(),
            content_length: None,
        }
    }

    /// Current content of `key`, if stored.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    /// Replaces the content of `key` directly, bypassing any object instance.
    pub fn put(&self, key: &str, data: Vec<u8>) {
        self.lock().insert(key.to_string(), data);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned map is still structurally valid.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One key in a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryObject {
    store: Arc<MemoryStore>,
    key: String,
    content_length: Option<u64>,
}

impl MemoryObject {
    fn uri(&self) -> String {
        format!("mem://{}/{}", self.store.bucket, self.key)
    }
}

impl StorageObject for MemoryObject {
    fn protocol(&self) -> &str {
        "mem"
    }

    fn endpoint(&self) -> &Url {
        &self.store.endpoint
    }

    fn bucket(&self) -> Option<&str> {
        Some(&self.store.bucket).filter(|b| !b.is_empty()).map(String::as_str)
    }

    fn key(&self) -> Option<&str> {
        Some(self.key.as_str()).filter(|k| !k.is_empty())
    }

    fn content_length(&mut self) -> Result<u64> {
        if let Some(n) = self.content_length {
            return Ok(n);
        }
        let n = self
            .store
            .lock()
            .get(&self.key)
            .map(|data| data.len() as u64)
            .ok_or_else(|| Error::Metadata {
                uri: self.uri(),
                reason: "no such key".to_string(),
            })?;
        self.content_length = Some(n);
        Ok(n)
    }

    fn supports_ranges(&mut self) -> bool {
        true
    }

    fn read_range(&mut self, start: u64, end_inclusive: u64, buffer: &mut [u8]) -> Result<u64> {
        let objects = self.store.lock();
        let data = objects.get(&self.key).ok_or_else(|| Error::Backend(format!("{}: no such key", self.uri())))?;
        let len = data.len() as u64;
        if start > end_inclusive || start >= len {
            return Err(Error::Backend(format!(
                "{}: range {}-{} not satisfiable for {} bytes",
                self.uri(),
                start,
                end_inclusive,
                len
            )));
        }
        let end_excl = (end_inclusive + 1).min(len) as usize;
        let slice = &data[start as usize..end_excl];
        let n = slice.len().min(buffer.len());
        buffer[..n].copy_from_slice(&slice[..n]);
        Ok(n as u64)
    }

    fn stream_upload(&mut self, body: &mut dyn Read, length: u64) -> Result<()> {
        let mut data = vec![0u8; length as usize];
        read_exactly(body, &mut data)?;
        self.store.put(&self.key, data);
        self.content_length = None;
        tracing::debug!("stored {} bytes at {}", length, self.uri());
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        let removed = self.store.lock().remove(&self.key);
        self.content_length = None;
        match removed {
            Some(_) => Ok(()),
            None => Err(Error::Backend(format!("{}: no such key", self.uri()))),
        }
    }

    fn reset(&mut self) {
        self.content_length = None;
    }
}
