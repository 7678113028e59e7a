//! Local directory backend (`file:///path/to/bucket`).
//!
//! Keys map to paths under the bucket directory; `/` in a key creates
//! subdirectories. Keys that would escape the directory are rejected at
//! upload time.

use super::StorageObject;
use crate::error::{Error, Result};
use crate::streaming::{read_exactly, write_exactly};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use url::Url;

const COPY_BUF_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct FileObject {
    endpoint: Url,
    root: PathBuf,
    bucket: String,
    key: String,
    content_length: Option<u64>,
}

impl FileObject {
    pub fn new(endpoint: Url, root: PathBuf, bucket: String, key: &str) -> Self {
        Self {
            endpoint,
            root,
            bucket,
            key: key.to_string(),
            content_length: None,
        }
    }

    /// Path of the object inside the bucket directory, or an error for keys
    /// that are empty, absolute, or contain `..`.
    pub fn path(&self) -> Result<PathBuf> {
        let rel = Path::new(&self.key);
        let safe = !self.key.is_empty()
            && !self.key.contains('\0')
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(Error::Backend(format!(
                "key {:?} cannot be stored under {}",
                self.key,
                self.root.display()
            )));
        }
        Ok(self.root.join(rel))
    }

    fn uri(&self) -> String {
        format!("file://{}/{}", self.bucket, self.key)
    }
}

impl StorageObject for FileObject {
    fn protocol(&self) -> &str {
        "file"
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn bucket(&self) -> Option<&str> {
        Some(self.bucket.as_str()).filter(|b| !b.is_empty())
    }

    fn key(&self) -> Option<&str> {
        Some(self.key.as_str()).filter(|k| !k.is_empty())
    }

    fn content_length(&mut self) -> Result<u64> {
        if let Some(n) = self.content_length {
            return Ok(n);
        }
        let meta = self
            .path()
            .and_then(|p| fs::metadata(&p).map_err(Error::Io))
            .map_err(|e| Error::Metadata {
                uri: self.uri(),
                reason: e.to_string(),
            })?;
        if !meta.is_file() {
            return Err(Error::Metadata {
                uri: self.uri(),
                reason: "not a regular file".to_string(),
            });
        }
        self.content_length = Some(meta.len());
        Ok(meta.len())
    }

    fn supports_ranges(&mut self) -> bool {
        true
    }

    fn read_range(&mut self, start: u64, end_inclusive: u64, buffer: &mut [u8]) -> Result<u64> {
        if start > end_inclusive {
            return Err(Error::Backend(format!(
                "invalid range {}-{}",
                start, end_inclusive
            )));
        }
        let want = ((end_inclusive - start + 1) as usize).min(buffer.len());
        let mut f = File::open(self.path()?)?;
        f.seek(SeekFrom::Start(start))?;
        let mut filled = 0usize;
        while filled < want {
            match f.read(&mut buffer[filled..want]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(filled as u64)
    }

    fn stream_upload(&mut self, body: &mut dyn Read, length: u64) -> Result<()> {
        let path = self.path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = File::create(&path)?;
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut remaining = length;
        while remaining > 0 {
            let n = remaining.min(COPY_BUF_SIZE as u64) as usize;
            if let Err(e) = read_exactly(body, &mut buf[..n]) {
                drop(f);
                let _ = fs::remove_file(&path);
                return Err(e);
            }
            write_exactly(&mut f, &buf[..n])?;
            remaining -= n as u64;
        }
        f.flush()?;
        f.sync_all()?;
        self.content_length = None;
        tracing::debug!("wrote {} bytes to {}", length, path.display());
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        let path = self.path()?;
        fs::remove_file(&path)?;
        self.content_length = None;
        Ok(())
    }

    fn reset(&mut self) {
        self.content_length = None;
    }
}
