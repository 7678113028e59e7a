//! `objcheck keys <bucket-url>`: batch key validation.

use crate::cli::RunContext;
use anyhow::{Context, Result};
use objcheck_core::keys::{self, Keys};
use objcheck_core::target::Target;

pub async fn run_keys(ctx: RunContext, bucket_url: String, source: String, json: bool) -> Result<()> {
    let settings = ctx.cfg.crvd_settings()?;
    let target = Target::parse(&bucket_url, &ctx.cfg.target_options())?;
    let source = keys::source_by_name(&source)?;
    let count = source.count();
    let name = source.name().to_string();

    let failures = tokio::task::spawn_blocking(move || Keys::new(target, settings).check_all(source.as_ref()))
        .await
        .context("keys task join")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&failures)?);
        return Ok(());
    }
    if failures.is_empty() {
        println!("{} of {} keys from {} passed", count, count, name);
        return Ok(());
    }
    println!("{} of {} keys from {} failed:", failures.len(), count, name);
    for f in &failures {
        if ctx.verbose > 0 {
            println!("  {}. {:?}: {}", f.index + 1, f.key, f.error);
        } else {
            println!("  {}. {:?}", f.index + 1, f.key);
        }
    }
    Ok(())
}
