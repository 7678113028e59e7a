//! `objcheck crvd <bucket-url>`: one create/retrieve/verify/delete round trip.

use crate::cli::RunContext;
use anyhow::{Context, Result};
use objcheck_core::crvd::Crvd;
use objcheck_core::target::Target;
use objcheck_core::units::{self, format_bytes, format_duration};
use std::time::Instant;

pub async fn run_crvd(
    ctx: RunContext,
    bucket_url: String,
    key: Option<String>,
    size: Option<&str>,
    seed: Option<u64>,
) -> Result<()> {
    let mut settings = ctx.cfg.crvd_settings()?;
    if let Some(size) = size {
        settings.content_length = units::parse_size(size)?;
    }
    if let Some(seed) = seed {
        settings.random_seed = seed;
    }
    let target = Target::parse(&bucket_url, &ctx.cfg.target_options())?;
    let key = key.unwrap_or_default();
    let algorithm = settings.algorithm;
    let content_length = settings.content_length;

    let started = Instant::now();
    let (uri, result) = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut crvd = Crvd::for_key(&target, &key, &settings)?;
        let result = crvd.create_retrieve_verify_delete();
        Ok((crvd.uri(), result))
    })
    .await
    .context("crvd task join")??;

    let digest = result.with_context(|| format!("create/retrieve/verify/delete {}", uri))?;
    println!(
        "{}: {} verified and deleted ({} {}, {})",
        uri,
        format_bytes(content_length),
        algorithm,
        digest,
        format_duration(started.elapsed())
    );
    Ok(())
}
