//! Exact-length reads and writes.

use crate::error::{Error, Result};
use std::io::{self, Read, Write};

/// Fills `buffer` completely from `reader`, or fails with `ShortRead` if the
/// source is exhausted first.
pub fn read_exactly<R: Read + ?Sized>(reader: &mut R, buffer: &mut [u8]) -> Result<()> {
    let expected = buffer.len();
    let mut filled = 0usize;
    while filled < expected {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    if filled != expected {
        return Err(Error::ShortRead {
            expected: expected as u64,
            actual: filled as u64,
        });
    }
    Ok(())
}

/// Writes all of `data` to `writer`, or fails with `ShortWrite` if the sink
/// stops accepting bytes.
pub fn write_exactly<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> Result<()> {
    let expected = data.len();
    let mut written = 0usize;
    while written < expected {
        match writer.write(&data[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WriteZero => break,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    if written != expected {
        return Err(Error::ShortWrite {
            expected: expected as u64,
            actual: written as u64,
        });
    }
    Ok(())
}
