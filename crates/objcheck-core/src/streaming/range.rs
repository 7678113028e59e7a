//! Transfer range type and chunk planning.

/// Default chunk size for ranged downloads (5 MiB).
pub const DEFAULT_RANGE_SIZE: u64 = 5 * 1024 * 1024;

/// A contiguous byte window `[start, end]` (inclusive end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRange {
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
    /// Number of bytes in the window; always `end - start + 1`.
    pub size: u64,
}

impl TransferRange {
    /// HTTP Range header value: `bytes=start-end`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// Range string in the form libcurl expects (no `bytes=` prefix).
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Computes the next window of at most `max_chunk` bytes starting at `consumed`.
///
/// Callers must stop looping once `consumed >= total`; `max_chunk` must be non-zero.
pub fn next_range(consumed: u64, max_chunk: u64, total: u64) -> TransferRange {
    debug_assert!(max_chunk > 0, "max_chunk must be positive");
    debug_assert!(consumed < total, "no bytes left to plan");
    let start = consumed;
    let end = consumed.saturating_add(max_chunk).min(total) - 1;
    TransferRange {
        start,
        end,
        size: end - start + 1,
    }
}

/// Iterator over the full sequence of windows covering `[0, total)`.
#[derive(Debug, Clone)]
pub struct RangePlan {
    consumed: u64,
    max_chunk: u64,
    total: u64,
}

impl Iterator for RangePlan {
    type Item = TransferRange;

    fn next(&mut self) -> Option<TransferRange> {
        if self.consumed >= self.total {
            return None;
        }
        let range = next_range(self.consumed, self.max_chunk, self.total);
        self.consumed += range.size;
        Some(range)
    }
}

/// Plans every window for an object of `total` bytes. Empty when `total` is 0.
/// A `max_chunk` of 0 is treated as 1.
pub fn plan_ranges(total: u64, max_chunk: u64) -> RangePlan {
    RangePlan {
        consumed: 0,
        max_chunk: max_chunk.max(1),
        total,
    }
}
