//! Top-level run flow: config, input, planning, downloading, reporting.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use workshop_core::download::{
    DownloadOrchestrator, OrchestratorConfig, PreconditionError, RetryPolicy, RunObserver,
    SteamCmd,
};
use workshop_core::parser::{ParseError, ParseResult, parse_input};
use workshop_core::plan::{DownloadPlanner, PlanOutcome};
use workshop_core::resolver::{HttpPageFetcher, WorkshopResolver};

use crate::app::{config_runtime, exit_handler, input_processor, progress_manager, terminal};
use crate::app_config::load_default_file_config;
use crate::cli::Args;
use crate::{ProcessExit, output};

pub(crate) async fn run_workshop_dl() -> Result<ProcessExit> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();
    let loaded_config = load_default_file_config()?;
    let args =
        config_runtime::apply_config_defaults(args, &cli_sources, loaded_config.config.as_ref())?;

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let no_color = terminal::is_no_color_requested(&args);
    terminal::init_tracing(
        default_level,
        force_cli_log_level,
        no_color,
        args.log_file.as_deref(),
    )?;

    debug!(?args, "CLI arguments parsed");
    if let Some(path) = &loaded_config.path
        && loaded_config.config.is_some()
    {
        debug!(path = %path.display(), "Loaded config file");
    }
    info!("workshop-dl starting");

    let Some(input_text) = input_processor::process_input(&args)? else {
        output::print_quick_start_guidance();
        return Err(ParseError::NoValidIdentifiers { skipped: 0 }.into());
    };

    let parsed = parse_input(&input_text)?;
    for skipped in &parsed.skipped {
        warn!(token = %skipped, "Skipped unrecognized input");
    }

    let page_fetcher = HttpPageFetcher::with_timeout(Duration::from_secs(args.page_timeout))
        .context("Failed to build HTTP client")?;
    let resolver = WorkshopResolver::with_fetcher(Arc::new(page_fetcher), &args.community_url);

    let planner = DownloadPlanner::with_exclusions(args.exclude.iter().cloned());
    let plan = planner.plan(&parsed.refs, &resolver).await;

    let app_id = resolve_app_id(&args, &plan, &parsed, &resolver).await;

    if let Some(path) = &args.plan_json {
        output::write_plan_json(path, &plan, app_id.as_deref())?;
        info!(path = %path.display(), "Wrote download plan");
    }

    if args.dry_run {
        output::print_plan(&plan, app_id.as_deref());
        return Ok(exit_handler::determine_exit_outcome(
            plan.work_list.len(),
            plan.failures.len(),
        ));
    }

    if plan.work_list.is_empty() {
        info!("Nothing to download");
        output::print_plan(&plan, app_id.as_deref());
        return Ok(exit_handler::determine_exit_outcome(0, plan.failures.len()));
    }

    run_downloads(&args, &plan, app_id).await
}

/// Configured app id, else the first resolved collection's, else the first
/// direct item page's. Dry runs skip the item page request.
async fn resolve_app_id(
    args: &Args,
    plan: &PlanOutcome,
    parsed: &ParseResult,
    resolver: &WorkshopResolver,
) -> Option<String> {
    if let Some(app_id) = &args.app_id {
        return Some(app_id.clone());
    }
    if let Some(app_id) = plan.detected_app_id() {
        info!(app_id, "Detected app id from collection page");
        return Some(app_id.to_string());
    }
    if args.dry_run {
        return None;
    }

    let first_item = parsed.items().next()?;
    match resolver.inspect_item(first_item).await {
        Ok(page) => {
            if let Some(app_id) = &page.app_id {
                info!(app_id = %app_id, item_id = %page.id, "Detected app id from item page");
            }
            page.app_id
        }
        Err(e) => {
            warn!(item_id = %first_item.id, error = %e, "Could not inspect item page for app id");
            None
        }
    }
}

async fn run_downloads(
    args: &Args,
    plan: &PlanOutcome,
    app_id: Option<String>,
) -> Result<ProcessExit> {
    let app_id = app_id.ok_or(PreconditionError::MissingAppId)?;
    let binary = SteamCmd::locate(args.steamcmd.as_deref())?;
    info!(steamcmd = %binary.display(), app_id = %app_id, "Using steamcmd");

    let fetcher = Arc::new(SteamCmd::new(binary, app_id).with_validate(args.validate));
    let orchestrator = DownloadOrchestrator::new(
        fetcher,
        OrchestratorConfig {
            concurrency: usize::from(args.concurrency),
            retry_policy: RetryPolicy::with_max_retries(u32::from(args.max_retries)),
            attempt_timeout: Duration::from_secs(args.attempt_timeout),
        },
    )
    .context("invalid download configuration")?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let show_progress = terminal::should_show_progress(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let progress = Arc::new(progress_manager::ProgressReporter::new(
        show_progress,
        plan.work_list.len(),
    ));
    let observer: Arc<dyn RunObserver> = progress.clone();

    let outcomes = orchestrator
        .run_with(
            &plan.work_list,
            &args.output_dir,
            Arc::clone(&interrupted),
            observer,
        )
        .await?;
    progress.finish();

    output::print_run_summary(&outcomes, &plan.failures, &args.output_dir);

    if interrupted.load(Ordering::SeqCst) {
        warn!(
            succeeded = outcomes.succeeded(),
            total = outcomes.len(),
            "Interrupted. Run again to download the remaining items."
        );
    }

    log_output_location(&args.output_dir);

    Ok(exit_handler::determine_exit_outcome(
        outcomes.succeeded(),
        outcomes.failed() + plan.failures.len(),
    ))
}

fn log_output_location(output_dir: &Path) {
    let shown = std::path::absolute(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
    debug!(output_dir = %shown.display(), "Run finished");
}
