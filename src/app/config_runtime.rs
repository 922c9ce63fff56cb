//! Merging of CLI arguments with file configuration.

use anyhow::Result;
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which values were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) app_id: bool,
    pub(crate) steamcmd: bool,
    pub(crate) concurrency: bool,
    pub(crate) max_retries: bool,
    pub(crate) attempt_timeout: bool,
    pub(crate) page_timeout: bool,
    pub(crate) validate: bool,
    pub(crate) exclude: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let command = Args::command();
    let matches = command.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let sources = sources_from_matches(&matches);
    (args, sources)
}

fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        app_id: is_commandline_value(matches, "app_id"),
        steamcmd: is_commandline_value(matches, "steamcmd"),
        concurrency: is_commandline_value(matches, "concurrency"),
        max_retries: is_commandline_value(matches, "max_retries"),
        attempt_timeout: is_commandline_value(matches, "attempt_timeout"),
        page_timeout: is_commandline_value(matches, "page_timeout"),
        validate: is_commandline_value(matches, "validate"),
        exclude: is_commandline_value(matches, "exclude"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills every value not given on the command line from `file_config`.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    let Some(file_config) = file_config else {
        return Ok(args);
    };
    file_config.validate()?;

    if !cli_sources.output_dir
        && let Some(output_dir) = &file_config.output_dir
    {
        args.output_dir = output_dir.clone();
    }

    if !cli_sources.app_id
        && let Some(app_id) = &file_config.app_id
    {
        args.app_id = Some(app_id.clone());
    }

    if !cli_sources.steamcmd
        && let Some(steamcmd) = &file_config.steamcmd
    {
        args.steamcmd = Some(steamcmd.clone());
    }

    if !cli_sources.concurrency
        && let Some(concurrency) = file_config.concurrency
    {
        args.concurrency = concurrency;
    }

    if !cli_sources.max_retries
        && let Some(max_retries) = file_config.max_retries
    {
        args.max_retries = max_retries;
    }

    if !cli_sources.attempt_timeout
        && let Some(secs) = file_config.attempt_timeout_secs
    {
        args.attempt_timeout = secs;
    }

    if !cli_sources.page_timeout
        && let Some(secs) = file_config.page_timeout_secs
    {
        args.page_timeout = secs;
    }

    if !cli_sources.validate
        && let Some(validate) = file_config.validate
    {
        args.validate = validate;
    }

    if !cli_sources.exclude
        && let Some(exclude) = &file_config.exclude
    {
        args.exclude = exclude.clone();
    }

    if !cli_sources.verbose
        && !cli_sources.quiet
        && let Some(verbosity) = file_config.verbosity
    {
        apply_config_verbosity(&mut args, verbosity);
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    let (quiet, verbose) = match verbosity {
        VerbositySetting::Default => (false, 0),
        VerbositySetting::Verbose => (false, 1),
        VerbositySetting::Quiet => (true, 0),
        VerbositySetting::Debug => (false, 2),
    };
    args.quiet = quiet;
    args.verbose = verbose;
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}
