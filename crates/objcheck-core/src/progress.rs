//! Transfer progress reporting.
//!
//! The transfer loop publishes its cumulative byte count into a latest-value
//! channel and never waits on the observer. A background thread samples the
//! latest value at a fixed cadence and hands it to a [`ProgressObserver`].
//! A last sample is taken when the reporter is dropped, so the final count
//! is always observed.

use crate::units::{format_bytes, format_duration};
use std::io::{self, Read};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Default emission cadence.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Snapshot handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub label: String,
    pub transferred: u64,
    pub total: u64,
    pub elapsed: Duration,
}

impl ProgressUpdate {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.transferred as f64 / self.total as f64).min(1.0)
    }

    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.transferred as f64 / secs
    }
}

/// Receives periodic progress snapshots. Runs on the reporter thread.
pub trait ProgressObserver: Send + Sync {
    fn observe(&self, update: &ProgressUpdate);
}

/// Observer that emits a tracing event per snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn observe(&self, update: &ProgressUpdate) {
        tracing::info!(
            "{}: {} of {} ({:.0}%) in {}",
            update.label,
            format_bytes(update.transferred),
            format_bytes(update.total),
            update.fraction() * 100.0,
            format_duration(update.elapsed)
        );
    }
}

/// How and where to report progress for one transfer.
#[derive(Clone)]
pub struct ProgressSettings {
    pub interval: Duration,
    pub observer: Arc<dyn ProgressObserver>,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PROGRESS_INTERVAL,
            observer: Arc::new(LogObserver),
        }
    }
}

impl std::fmt::Debug for ProgressSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSettings")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Handle owned by the transfer loop. Dropping it stops the observer thread.
pub struct ProgressReporter {
    tx: watch::Sender<u64>,
    stop: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Starts a reporter thread for a transfer of `total` bytes.
    pub fn start(label: impl Into<String>, total: u64, settings: &ProgressSettings) -> Self {
        let (tx, rx) = watch::channel(0u64);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let label = label.into();
        let observer = Arc::clone(&settings.observer);
        let interval = settings.interval;
        let started = Instant::now();

        let worker = std::thread::Builder::new()
            .name("objcheck-progress".to_string())
            .spawn(move || {
                let mut last_seen = 0u64;
                loop {
                    let stopping = !matches!(
                        stop_rx.recv_timeout(interval),
                        Err(mpsc::RecvTimeoutError::Timeout)
                    );
                    let transferred = *rx.borrow();
                    if transferred != last_seen {
                        last_seen = transferred;
                        observer.observe(&ProgressUpdate {
                            label: label.clone(),
                            transferred,
                            total,
                            elapsed: started.elapsed(),
                        });
                    }
                    if stopping {
                        break;
                    }
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("progress reporter unavailable: {}", e);
                None
            }
        };

        Self {
            tx,
            stop: Some(stop_tx),
            worker,
        }
    }

    /// Publishes the cumulative byte count. Never blocks.
    pub fn update(&self, transferred: u64) {
        self.tx.send_replace(transferred);
    }

    /// Latest published count.
    pub fn latest(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("progress observer panicked");
            }
        }
    }
}

/// Reader that publishes its cumulative byte count to a reporter.
pub struct ProgressReader<R> {
    inner: R,
    reporter: ProgressReporter,
    total: u64,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, reporter: ProgressReporter) -> Self {
        Self {
            inner,
            reporter,
            total: 0,
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.total
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.total += n as u64;
        self.reporter.update(self.total);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressUpdate>>);

    impl ProgressObserver for Recorder {
        fn observe(&self, update: &ProgressUpdate) {
            self.0.lock().unwrap().push(update.clone());
        }
    }

    struct Panicker;

    impl ProgressObserver for Panicker {
        fn observe(&self, _update: &ProgressUpdate) {
            panic!("observer failure");
        }
    }

    #[test]
    fn update_fraction_and_rate() {
        let u = ProgressUpdate {
            label: "x".into(),
            transferred: 50,
            total: 200,
            elapsed: Duration::from_secs(2),
        };
        assert!((u.fraction() - 0.25).abs() < 1e-9);
        assert!((u.bytes_per_sec() - 25.0).abs() < 1e-9);
        let empty = ProgressUpdate { total: 0, transferred: 0, ..u };
        assert_eq!(empty.fraction(), 1.0);
    }

    #[test]
    fn observer_sees_latest_value() {
        let recorder = Arc::new(Recorder::default());
        let settings = ProgressSettings {
            interval: Duration::from_millis(10),
            observer: recorder.clone(),
        };
        let reporter = ProgressReporter::start("upload", 100, &settings);
        for i in 1..=100 {
            reporter.update(i);
        }
        assert_eq!(reporter.latest(), 100);
        std::thread::sleep(Duration::from_millis(100));
        drop(reporter);

        let seen = recorder.0.lock().unwrap();
        assert!(!seen.is_empty());
        let last = seen.last().unwrap();
        assert_eq!(last.transferred, 100);
        assert_eq!(last.total, 100);
        assert_eq!(last.label, "upload");
    }

    #[test]
    fn final_count_is_observed_on_drop() {
        let recorder = Arc::new(Recorder::default());
        let settings = ProgressSettings {
            interval: Duration::from_secs(60),
            observer: recorder.clone(),
        };
        let reporter = ProgressReporter::start("upload", 42, &settings);
        reporter.update(42);
        drop(reporter);

        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].transferred, 42);
    }

    #[test]
    fn panicking_observer_does_not_affect_updates() {
        let settings = ProgressSettings {
            interval: Duration::from_millis(5),
            observer: Arc::new(Panicker),
        };
        let reporter = ProgressReporter::start("download", 10, &settings);
        reporter.update(5);
        std::thread::sleep(Duration::from_millis(50));
        reporter.update(10);
        assert_eq!(reporter.latest(), 10);
    }

    #[test]
    fn progress_reader_counts_bytes() {
        let settings = ProgressSettings {
            interval: Duration::from_secs(60),
            observer: Arc::new(LogObserver),
        };
        let reporter = ProgressReporter::start("read", 6, &settings);
        let mut r = ProgressReader::new(Cursor::new(b"abcdef".to_vec()), reporter);
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(r.total_bytes(), 6);
        assert_eq!(out, b"abcdef");
    }
}
