//! `objcheck check <bucket-url> <key>`: ranged-download digest of one object.

use crate::cli::RunContext;
use anyhow::{Context, Result};
use objcheck_core::check::Check;
use objcheck_core::digest::Digest;
use objcheck_core::objects::{calc_digest, protocol_uri};
use objcheck_core::target::Target;

/// Print the object's digest; with `expected`, fail unless it matches.
pub async fn run_check(
    ctx: RunContext,
    bucket_url: String,
    key: String,
    expected: Option<&str>,
) -> Result<()> {
    let algorithm = ctx.cfg.algorithm()?;
    let expected = expected.map(Digest::from_hex).transpose()?;
    let target = Target::parse(&bucket_url, &ctx.cfg.target_options())?;
    let range_size = ctx.cfg.range_size;
    let progress = ctx.cfg.progress();

    let (uri, digest) = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut obj = target.object(&key)?;
        let uri = protocol_uri(obj.as_ref());
        let digest = match expected {
            Some(expected) => Check {
                object: obj.as_mut(),
                expected,
                algorithm,
                range_size,
                progress,
            }
            .verify_digest(),
            None => calc_digest(obj.as_mut(), range_size, algorithm, progress.as_ref()),
        }
        .with_context(|| format!("checking {}", uri))?;
        Ok((uri, digest))
    })
    .await
    .context("check task join")??;

    println!("{}  {}", digest, uri);
    Ok(())
}
