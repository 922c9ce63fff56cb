//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use workshop_core::resolver::{DEFAULT_COMMUNITY_BASE_URL, DEFAULT_PAGE_TIMEOUT_SECS};
use workshop_core::{DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, WorkshopId};

use crate::app_config::is_app_id;

/// Default destination directory for downloaded items.
pub const DEFAULT_OUTPUT_DIR: &str = "mods";

/// Default per-attempt download limit in seconds.
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 1800;

/// Download Steam Workshop items and whole collections with steamcmd.
///
/// Accepts item links, collection links and bare item ids, as arguments or
/// piped on stdin. Collections are expanded to their members, duplicates are
/// downloaded once, and each item lands in `<output-dir>/<id>`.
///
/// Exit codes: 0 all succeeded, 1 partial success, 2 nothing succeeded or fatal error.
#[derive(Parser, Debug, Clone)]
#[command(name = "workshop-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Workshop item links, collection links, or bare item ids
    #[arg(value_name = "LINK")]
    pub inputs: Vec<String>,

    /// Directory receiving one folder per downloaded item
    #[arg(short = 'o', long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Steam app id of the game (detected from the Workshop page when omitted)
    #[arg(short = 'a', long, value_name = "APPID", value_parser = parse_app_id)]
    pub app_id: Option<String>,

    /// Path to steamcmd, or a directory containing it
    #[arg(long, value_name = "PATH")]
    pub steamcmd: Option<PathBuf>,

    /// Items downloaded at once (1-16)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: u8,

    /// Extra attempts per item after the first (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// Limit for a single download attempt in seconds (1-86400)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_ATTEMPT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub attempt_timeout: u64,

    /// Limit for a single Workshop page request in seconds (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_PAGE_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub page_timeout: u64,

    /// Ask steamcmd to validate downloaded files
    #[arg(long)]
    pub validate: bool,

    /// Item id never to download (repeatable)
    #[arg(long, value_name = "ID", value_parser = parse_workshop_id)]
    pub exclude: Vec<WorkshopId>,

    /// Resolve and print the download plan without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Write the download plan as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub plan_json: Option<PathBuf>,

    /// Also append logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Base URL of the Steam Community site
    #[arg(long, hide = true, value_name = "URL", default_value = DEFAULT_COMMUNITY_BASE_URL)]
    pub community_url: String,
}

fn parse_app_id(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if is_app_id(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(format!("'{raw}' is not a numeric Steam app id"))
    }
}

fn parse_workshop_id(raw: &str) -> Result<WorkshopId, String> {
    WorkshopId::parse(raw.trim()).ok_or_else(|| format!("'{raw}' is not a Workshop item id"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["workshop-dl"]).unwrap();
        assert!(args.inputs.is_empty());
        assert_eq!(args.output_dir, PathBuf::from("mods"));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.concurrency, 1); // DEFAULT_CONCURRENCY
        assert_eq!(args.max_retries, 2); // DEFAULT_MAX_RETRIES
        assert_eq!(args.attempt_timeout, 1800);
        assert_eq!(args.page_timeout, 30);
        assert!(args.app_id.is_none());
        assert!(!args.dry_run);
        assert_eq!(args.community_url, "https://steamcommunity.com");
    }

    #[test]
    fn test_cli_positional_inputs_collected_in_order() {
        let args = Args::try_parse_from([
            "workshop-dl",
            "https://steamcommunity.com/workshop/filedetails/?id=999",
            "123",
        ])
        .unwrap();
        assert_eq!(
            args.inputs,
            vec![
                "https://steamcommunity.com/workshop/filedetails/?id=999".to_string(),
                "123".to_string()
            ]
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["workshop-dl", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["workshop-dl", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Args::try_parse_from(["workshop-dl", "-q", "-v"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["workshop-dl", "--help"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["workshop-dl", "--version"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn test_cli_concurrency_range() {
        let args = Args::try_parse_from(["workshop-dl", "-c", "16"]).unwrap();
        assert_eq!(args.concurrency, 16);

        for bad in ["0", "17"] {
            let err = Args::try_parse_from(["workshop-dl", "-c", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_max_retries_range() {
        let args = Args::try_parse_from(["workshop-dl", "-r", "0"]).unwrap();
        assert_eq!(args.max_retries, 0);
        let args = Args::try_parse_from(["workshop-dl", "--max-retries", "10"]).unwrap();
        assert_eq!(args.max_retries, 10);

        let err = Args::try_parse_from(["workshop-dl", "-r", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_app_id_must_be_numeric() {
        let args = Args::try_parse_from(["workshop-dl", "-a", "108600"]).unwrap();
        assert_eq!(args.app_id.as_deref(), Some("108600"));

        let err = Args::try_parse_from(["workshop-dl", "--app-id", "zomboid"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_exclude_repeatable() {
        let args =
            Args::try_parse_from(["workshop-dl", "--exclude", "1", "--exclude", "22"]).unwrap();
        let ids: Vec<_> = args.exclude.iter().map(WorkshopId::as_str).collect();
        assert_eq!(ids, vec!["1", "22"]);

        let err = Args::try_parse_from(["workshop-dl", "--exclude", "abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_timeouts_reject_zero() {
        for flag in ["--attempt-timeout", "--page-timeout"] {
            let err = Args::try_parse_from(["workshop-dl", flag, "0"]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["workshop-dl", "--rate-limit", "5"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
