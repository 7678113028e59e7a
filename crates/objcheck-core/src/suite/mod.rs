//! Test suite runner: a fixed, ordered list of named tasks, each timed.
//!
//! A failed task is reported and the suite moves on to the next one.
//! Presentation is left to a [`SuiteReporter`].

mod tasks;

pub use tasks::{suite_counts, suite_sizes, CountTask, KeysTask, SizeTask, OBJECT_COUNTS};

use crate::crvd::CrvdSettings;
use crate::keys::BuiltinKeys;
use crate::target::Target;
use crate::units::format_duration;
use std::time::{Duration, Instant};

/// Result of one task invocation; `detail` explains a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub ok: bool,
    pub detail: Option<String>,
}

impl TaskOutcome {
    pub fn success() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

pub trait SuiteTask: Send + Sync {
    fn title(&self) -> String;

    fn invoke(&self, target: &Target) -> TaskOutcome;
}

#[derive(Debug, Clone)]
pub struct TaskReport {
    /// 1-based position in the suite.
    pub index: usize,
    pub title: String,
    pub outcome: TaskOutcome,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct SuiteSummary {
    pub reports: Vec<TaskReport>,
    pub elapsed: Duration,
}

impl SuiteSummary {
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.ok).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }
}

/// Receives suite lifecycle events.
pub trait SuiteReporter {
    fn suite_started(&mut self, _task_count: usize) {}

    fn task_started(&mut self, _index: usize, _title: &str) {}

    fn task_finished(&mut self, report: &TaskReport);

    fn suite_finished(&mut self, _summary: &SuiteSummary) {}
}

/// Reporter that only emits tracing events.
#[derive(Debug, Default)]
pub struct LogReporter;

impl SuiteReporter for LogReporter {
    fn task_finished(&mut self, report: &TaskReport) {
        if report.outcome.ok {
            tracing::info!(
                "{}. {}: successful ({})",
                report.index,
                report.title,
                format_duration(report.elapsed)
            );
        } else {
            tracing::warn!(
                "{}. {}: FAILED ({}): {}",
                report.index,
                report.title,
                format_duration(report.elapsed),
                report.outcome.detail.as_deref().unwrap_or("")
            );
        }
    }
}

/// The standard suite: sizes, then counts, then key lists.
pub fn all_tasks(size_max: u64, count_max: Option<u64>, settings: &CrvdSettings) -> Vec<Box<dyn SuiteTask>> {
    let mut tasks: Vec<Box<dyn SuiteTask>> = Vec::new();
    for size in suite_sizes(size_max) {
        tasks.push(Box::new(SizeTask::new(size, settings)));
    }
    for count in suite_counts(count_max) {
        tasks.push(Box::new(CountTask::new(count, settings)));
    }
    for source in BuiltinKeys::ALL {
        tasks.push(Box::new(KeysTask::new(source, settings)));
    }
    tasks
}

/// Runs every task in order. In a dry run nothing is invoked and every task
/// counts as successful.
pub fn run_suite(
    tasks: &[Box<dyn SuiteTask>],
    target: &Target,
    dry_run: bool,
    reporter: &mut dyn SuiteReporter,
) -> SuiteSummary {
    let started_all = Instant::now();
    reporter.suite_started(tasks.len());
    tracing::info!("starting suite of {} tasks against {}", tasks.len(), target);

    let mut summary = SuiteSummary::default();
    for (i, task) in tasks.iter().enumerate() {
        let index = i + 1;
        let title = task.title();
        reporter.task_started(index, &title);

        let started = Instant::now();
        let outcome = if dry_run {
            TaskOutcome::success()
        } else {
            task.invoke(target)
        };
        let report = TaskReport {
            index,
            title,
            outcome,
            elapsed: started.elapsed(),
        };
        reporter.task_finished(&report);
        summary.reports.push(report);
    }

    summary.elapsed = started_all.elapsed();
    tracing::info!(
        "suite complete: {} passed, {} failed in {}",
        summary.passed(),
        summary.failed(),
        format_duration(summary.elapsed)
    );
    reporter.suite_finished(&summary);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        title: &'static str,
        ok: bool,
        calls: Arc<AtomicUsize>,
    }

    impl SuiteTask for Scripted {
        fn title(&self) -> String {
            self.title.to_string()
        }

        fn invoke(&self, _target: &Target) -> TaskOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.ok {
                TaskOutcome::success()
            } else {
                TaskOutcome::failure("boom")
            }
        }
    }

    #[derive(Default)]
    struct Collect {
        started: Vec<(usize, String)>,
        finished: Vec<(usize, bool)>,
        total: Option<usize>,
    }

    impl SuiteReporter for Collect {
        fn task_started(&mut self, index: usize, title: &str) {
            self.started.push((index, title.to_string()));
        }

        fn task_finished(&mut self, report: &TaskReport) {
            self.finished.push((report.index, report.outcome.ok));
        }

        fn suite_finished(&mut self, summary: &SuiteSummary) {
            self.total = Some(summary.reports.len());
        }
    }

    fn scripted(calls: &Arc<AtomicUsize>) -> Vec<Box<dyn SuiteTask>> {
        vec![
            Box::new(Scripted { title: "first", ok: false, calls: calls.clone() }),
            Box::new(Scripted { title: "second", ok: true, calls: calls.clone() }),
        ]
    }

    #[test]
    fn failed_task_does_not_stop_the_suite() {
        let calls = Arc::new(AtomicUsize::new(0));
        let target = Target::memory(MemoryStore::new("b"));
        let mut reporter = Collect::default();
        let summary = run_suite(&scripted(&calls), &target, false, &mut reporter);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(reporter.started, vec![(1, "first".to_string()), (2, "second".to_string())]);
        assert_eq!(reporter.finished, vec![(1, false), (2, true)]);
        assert_eq!(reporter.total, Some(2));
        assert_eq!((summary.passed(), summary.failed()), (1, 1));
        assert_eq!(summary.reports[0].outcome.detail.as_deref(), Some("boom"));
    }

    #[test]
    fn dry_run_invokes_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let target = Target::memory(MemoryStore::new("b"));
        let summary = run_suite(&scripted(&calls), &target, true, &mut LogReporter);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(summary.failed(), 0);
    }

    #[test]
    fn standard_suite_layout() {
        let tasks = all_tasks(1024, Some(16), &CrvdSettings::default());
        let titles: Vec<String> = tasks.iter().map(|t| t.title()).collect();
        assert_eq!(titles.len(), 3 + 2 + 2);
        assert!(titles[0].contains("0B"));
        assert!(titles[2].contains("1K"));
        assert!(titles[3].contains("1 object"));
        assert!(titles[4].contains("16 objects"));
        assert!(titles[5].starts_with("keys: naughty"));
        assert!(titles[6].starts_with("keys: unicode"));
    }

    #[test]
    fn small_suite_passes_in_memory() {
        let store = MemoryStore::new("b");
        let target = Target::memory(store.clone());
        let tasks = all_tasks(4096, Some(16), &CrvdSettings::default());
        let summary = run_suite(&tasks, &target, false, &mut LogReporter);
        assert_eq!(summary.failed(), 0, "{:?}", summary.reports);
        assert!(store.is_empty());
    }
}
