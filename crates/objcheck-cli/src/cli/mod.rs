//! CLI for objcheck.

mod commands;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use objcheck_core::config::{self, ObjcheckConfig};

use commands::{run_check, run_completions, run_crvd, run_keys, run_man, run_suite};

/// Top-level CLI for objcheck.
#[derive(Debug, Parser)]
#[command(name = "objcheck", version)]
#[command(about = "objcheck: cloud object storage validation", long_about = None)]
pub struct Cli {
    /// More output: -v shows failure details and debug logs, -vv trace logs.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Service endpoint for s3:// bucket URLs (overrides config).
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Signing region (overrides config; derived from the endpoint when possible).
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Digest algorithm: sha256 or md5 (overrides config).
    #[arg(long, global = true)]
    pub algorithm: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the test suite: object sizes, object counts and awkward keys.
    Suite {
        /// Bucket URL, e.g. http://127.0.0.1:9000/bucket, s3://bucket, file:///tmp/bucket.
        bucket_url: String,

        /// Largest object to create (bytes, or with a unit: 64K, 5M, 1G).
        #[arg(short, long, default_value = "1G", value_name = "SIZE")]
        size_max: String,

        /// Most objects to create at once, or -1 for no limit.
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true, value_name = "N")]
        count_max: i64,

        /// List the tasks without running them.
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Create, retrieve, verify and delete one object.
    Crvd {
        /// Bucket URL.
        bucket_url: String,

        /// Object key (default: objcheck-crvd-<unix-seconds>.bin).
        #[arg(short, long)]
        key: Option<String>,

        /// Object size (default from config).
        #[arg(short, long, value_name = "SIZE")]
        size: Option<String>,

        /// Seed for the pseudo-random body (default from config).
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Compute an object's digest with ranged downloads, optionally verifying it.
    Check {
        /// Bucket URL.
        bucket_url: String,

        /// Object key.
        key: String,

        /// Expected digest in hex; mismatch is an error.
        #[arg(short = 'x', long, value_name = "HEX")]
        expected: Option<String>,
    },

    /// Round-trip every key of a key list and report failures.
    Keys {
        /// Bucket URL.
        bucket_url: String,

        /// Key list: naughty, unicode, or a file with one key per line.
        #[arg(long, default_value = "naughty")]
        source: String,

        /// Print failures as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print shell completions.
    Completions {
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

/// Config plus command-line overrides, validated before any network use.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub cfg: ObjcheckConfig,
    pub verbose: u8,
}

impl Cli {
    fn context(&self) -> Result<RunContext> {
        let mut cfg = config::load_or_init().context("loading config")?;
        if let Some(endpoint) = &self.endpoint {
            cfg.endpoint = Some(endpoint.clone());
        }
        if let Some(region) = &self.region {
            cfg.region = Some(region.clone());
        }
        if let Some(algorithm) = &self.algorithm {
            cfg.algorithm = algorithm.clone();
        }
        cfg.validate()?;
        tracing::debug!("effective config: {:?}", cfg);
        Ok(RunContext {
            cfg,
            verbose: self.verbose,
        })
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            CliCommand::Completions { shell } => return run_completions(*shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let ctx = self.context()?;
        match self.command {
            CliCommand::Suite {
                bucket_url,
                size_max,
                count_max,
                dry_run,
            } => run_suite(ctx, bucket_url, &size_max, count_max, dry_run).await?,
            CliCommand::Crvd {
                bucket_url,
                key,
                size,
                seed,
            } => run_crvd(ctx, bucket_url, key, size.as_deref(), seed).await?,
            CliCommand::Check {
                bucket_url,
                key,
                expected,
            } => run_check(ctx, bucket_url, key, expected.as_deref()).await?,
            CliCommand::Keys {
                bucket_url,
                source,
                json,
            } => run_keys(ctx, bucket_url, source, json).await?,
            CliCommand::Completions { .. } | CliCommand::Man => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
