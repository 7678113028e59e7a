//! Storage object capability and ranged download.
//!
//! Each backend implements [`StorageObject`] independently; the download
//! loop only talks to the trait.

mod file;
mod http;
mod memory;

pub use file::FileObject;
pub use http::{HttpObject, HttpSettings};
pub use memory::{MemoryObject, MemoryStore};

use crate::digest::{Algorithm, Digest, HashingWriter};
use crate::error::{Error, Result};
use crate::progress::{ProgressReporter, ProgressSettings};
use crate::streaming::{plan_ranges, write_exactly};
use std::fmt;
use std::io::{Read, Write};
use url::Url;

/// One object location in a storage backend.
///
/// Metadata (content length, range support, backend session) is resolved
/// lazily and cached by the instance until [`StorageObject::reset`] or a
/// successful upload.
pub trait StorageObject: fmt::Debug + Send {
    /// Backend protocol name, e.g. `"http"`, `"file"`, `"mem"`.
    fn protocol(&self) -> &str;

    fn endpoint(&self) -> &Url;

    fn bucket(&self) -> Option<&str>;

    fn key(&self) -> Option<&str>;

    /// Size of the stored object. Fails if the object does not exist.
    fn content_length(&mut self) -> Result<u64>;

    /// True if the backend advertises ranged reads for this object.
    fn supports_ranges(&mut self) -> bool;

    /// Reads bytes `[start, end_inclusive]` into `buffer`, returning the count read.
    fn read_range(&mut self, start: u64, end_inclusive: u64, buffer: &mut [u8]) -> Result<u64>;

    /// Uploads exactly `length` bytes from `body`, replacing any existing content.
    fn stream_upload(&mut self, body: &mut dyn Read, length: u64) -> Result<()>;

    fn delete(&mut self) -> Result<()>;

    /// Drops cached metadata and backend session state.
    fn reset(&mut self);
}

/// `protocol://bucket/key` string for log and error messages.
pub fn protocol_uri(obj: &dyn StorageObject) -> String {
    format!(
        "{}://{}/{}",
        obj.protocol(),
        obj.bucket().unwrap_or("<nil>"),
        obj.key().unwrap_or("<nil>")
    )
}

/// Downloads the whole object into `out` in windows of at most `range_size`
/// bytes. Returns the number of bytes written.
///
/// Errors after the first range has been requested are wrapped in
/// [`Error::Transfer`] with the byte count reached so far.
pub fn download(
    obj: &mut dyn StorageObject,
    range_size: u64,
    out: &mut dyn Write,
    progress: Option<&ProgressSettings>,
) -> Result<u64> {
    let uri = protocol_uri(obj);
    let content_length = obj.content_length().map_err(|e| match e {
        Error::Metadata { .. } => e,
        other => Error::Metadata {
            uri: uri.clone(),
            reason: other.to_string(),
        },
    })?;
    if !obj.supports_ranges() {
        tracing::debug!("{} may not support ranged downloads; trying anyway", uri);
    }
    tracing::debug!(
        "downloading {} ({} bytes, range size {})",
        uri,
        content_length,
        range_size
    );

    // Single-range transfers finish before the first sample would be taken.
    let reporter = progress
        .filter(|_| content_length > range_size)
        .map(|p| ProgressReporter::start(format!("download {}", uri), content_length, p));

    let mut transferred = 0u64;
    for range in plan_ranges(content_length, range_size) {
        let abort = move |e: Error| Error::Transfer {
            transferred,
            source: Box::new(e),
        };
        let mut buffer = vec![0u8; range.size as usize];
        let read = obj
            .read_range(range.start, range.end, &mut buffer)
            .map_err(abort)?;
        if read != range.size {
            return Err(abort(Error::ShortRead {
                expected: range.size,
                actual: read,
            }));
        }
        write_exactly(out, &buffer).map_err(abort)?;
        transferred += range.size;
        if let Some(r) = &reporter {
            r.update(transferred);
        }
    }
    out.flush()?;
    Ok(transferred)
}

/// Calculates the object's digest with ranged downloads of `range_size` bytes.
pub fn calc_digest(
    obj: &mut dyn StorageObject,
    range_size: u64,
    algorithm: Algorithm,
    progress: Option<&ProgressSettings>,
) -> Result<Digest> {
    let mut sink = HashingWriter::sink(algorithm);
    download(obj, range_size, &mut sink, progress)?;
    let (digest, _) = sink.finalize();
    Ok(digest)
}
