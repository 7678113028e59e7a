use super::*;
use clap::CommandFactory;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn cli_parse_suite_defaults() {
    let cli = parse(&["objcheck", "suite", "http://127.0.0.1:9000/bucket"]);
    match cli.command {
        CliCommand::Suite {
            bucket_url,
            size_max,
            count_max,
            dry_run,
        } => {
            assert_eq!(bucket_url, "http://127.0.0.1:9000/bucket");
            assert_eq!(size_max, "1G");
            assert_eq!(count_max, -1);
            assert!(!dry_run);
        }
        _ => panic!("expected Suite"),
    }
}

#[test]
fn cli_parse_suite_options() {
    let cli = parse(&["objcheck", "suite", "s3://b", "-s", "64K", "-c", "256", "-n"]);
    match cli.command {
        CliCommand::Suite {
            size_max,
            count_max,
            dry_run,
            ..
        } => {
            assert_eq!(size_max, "64K");
            assert_eq!(count_max, 256);
            assert!(dry_run);
        }
        _ => panic!("expected Suite"),
    }
}

#[test]
fn cli_parse_suite_negative_count() {
    let cli = parse(&["objcheck", "suite", "s3://b", "--count-max", "-1"]);
    match cli.command {
        CliCommand::Suite { count_max, .. } => assert_eq!(count_max, -1),
        _ => panic!("expected Suite"),
    }
}

#[test]
fn count_limit_maps_negative_to_unbounded() {
    assert_eq!(commands::count_limit(-1), None);
    assert_eq!(commands::count_limit(0), Some(0));
    assert_eq!(commands::count_limit(4096), Some(4096));
}

#[test]
fn cli_parse_crvd() {
    let cli = parse(&["objcheck", "crvd", "mem://scratch", "-k", "a b", "-s", "1M", "--seed", "7"]);
    match cli.command {
        CliCommand::Crvd {
            bucket_url,
            key,
            size,
            seed,
        } => {
            assert_eq!(bucket_url, "mem://scratch");
            assert_eq!(key.as_deref(), Some("a b"));
            assert_eq!(size.as_deref(), Some("1M"));
            assert_eq!(seed, Some(7));
        }
        _ => panic!("expected Crvd"),
    }
}

#[test]
fn cli_parse_check_with_expected() {
    let cli = parse(&["objcheck", "check", "s3://b", "dir/key.bin", "-x", "abcd"]);
    match cli.command {
        CliCommand::Check {
            key, expected, ..
        } => {
            assert_eq!(key, "dir/key.bin");
            assert_eq!(expected.as_deref(), Some("abcd"));
        }
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_keys() {
    let cli = parse(&["objcheck", "keys", "s3://b", "--source", "unicode", "--json"]);
    match cli.command {
        CliCommand::Keys { source, json, .. } => {
            assert_eq!(source, "unicode");
            assert!(json);
        }
        _ => panic!("expected Keys"),
    }
}

#[test]
fn cli_parse_global_options_after_subcommand() {
    let cli = parse(&[
        "objcheck",
        "check",
        "s3://b",
        "k",
        "-vv",
        "--algorithm",
        "md5",
        "--endpoint",
        "http://127.0.0.1:9000/",
        "--region",
        "us-east-1",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.algorithm.as_deref(), Some("md5"));
    assert_eq!(cli.endpoint.as_deref(), Some("http://127.0.0.1:9000/"));
    assert_eq!(cli.region.as_deref(), Some("us-east-1"));
}

#[test]
fn cli_parse_completions_and_man() {
    match parse(&["objcheck", "completions", "bash"]).command {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
    assert!(matches!(parse(&["objcheck", "man"]).command, CliCommand::Man));
}

#[test]
fn cli_rejects_missing_bucket() {
    assert!(Cli::try_parse_from(["objcheck", "suite"]).is_err());
    assert!(Cli::try_parse_from(["objcheck", "check", "s3://b"]).is_err());
}
