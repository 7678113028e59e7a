//! `objcheck suite <bucket-url>`: run the standard task list.

use crate::cli::RunContext;
use anyhow::{Context, Result};
use objcheck_core::suite::{self, SuiteReporter, SuiteSummary, TaskReport};
use objcheck_core::target::Target;
use objcheck_core::units::{self, format_duration};

/// Prints one line per task; failure detail only when verbose.
struct ConsoleReporter {
    verbose: bool,
}

impl SuiteReporter for ConsoleReporter {
    fn suite_started(&mut self, _task_count: usize) {
        println!("Starting test suite…\n");
    }

    fn task_finished(&mut self, report: &TaskReport) {
        let title = format!("{}. {}", report.index, report.title);
        let elapsed = format_duration(report.elapsed);
        if report.outcome.ok {
            println!("\u{2705} {}: successful ({})", title, elapsed);
        } else {
            println!("\u{274C} {}: FAILED ({})", title, elapsed);
        }
        if self.verbose {
            if let Some(detail) = &report.outcome.detail {
                println!("{}", detail);
            }
        }
    }

    fn suite_finished(&mut self, summary: &SuiteSummary) {
        println!("\n…test complete ({}).", format_duration(summary.elapsed));
    }
}

/// `count_max < 0` means no limit.
pub(crate) fn count_limit(count_max: i64) -> Option<u64> {
    u64::try_from(count_max).ok()
}

pub async fn run_suite(
    ctx: RunContext,
    bucket_url: String,
    size_max: &str,
    count_max: i64,
    dry_run: bool,
) -> Result<()> {
    let size_max = units::parse_size(size_max)?;
    let settings = ctx.cfg.crvd_settings()?;
    let target = Target::parse(&bucket_url, &ctx.cfg.target_options())?;
    let tasks = suite::all_tasks(size_max, count_limit(count_max), &settings);
    let verbose = ctx.verbose > 0;

    let summary = tokio::task::spawn_blocking(move || {
        let mut reporter = ConsoleReporter { verbose };
        suite::run_suite(&tasks, &target, dry_run, &mut reporter)
    })
    .await
    .context("suite task join")?;

    tracing::info!(
        "suite against {}: {} passed, {} failed",
        bucket_url,
        summary.passed(),
        summary.failed()
    );
    Ok(())
}
