//! CLI output formatting: plan preview, plan export, and the run summary.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use workshop_core::download::{OutcomeList, OutcomeStatus};
use workshop_core::plan::{PlanOutcome, PlanningFailure, SourceKind};

/// Message when no input was provided at all.
pub const NO_INPUT_GUIDANCE: &str =
    "No input provided. Pass Workshop links or item ids as arguments, or pipe them via stdin.";

/// Example for passing links as arguments.
pub const INPUT_ARG_EXAMPLE: &str =
    "Example: workshop-dl https://steamcommunity.com/sharedfiles/filedetails/?id=2169435993";

/// Example for piping input.
pub const INPUT_PIPE_EXAMPLE: &str = "Example: cat mods.txt | workshop-dl --app-id 108600";

/// Prints quick-start guidance to stderr.
pub fn print_quick_start_guidance() {
    for line in [NO_INPUT_GUIDANCE, INPUT_ARG_EXAMPLE, INPUT_PIPE_EXAMPLE] {
        eprintln!("{line}");
    }
}

fn source_label(source: &SourceKind) -> String {
    match source {
        SourceKind::Direct => "direct".to_string(),
        SourceKind::FromCollection { collection_id } => format!("from collection {collection_id}"),
    }
}

fn failure_line(failure: &PlanningFailure) -> String {
    format!("  collection {}: {}", failure.collection_id, failure.error)
}

/// Lines describing the plan, in download order.
pub fn plan_lines(plan: &PlanOutcome, app_id: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Download plan: {} item(s), app id {}",
        plan.work_list.len(),
        app_id.unwrap_or("unknown")
    ));
    for collection in &plan.collections {
        let title = collection.title.as_deref().unwrap_or("untitled");
        lines.push(format!(
            "  collection {} \"{}\": {} member(s)",
            collection.id,
            title,
            collection.members.len()
        ));
    }
    for (index, unit) in plan.work_list.iter().enumerate() {
        lines.push(format!(
            "  {:>3}. {} ({})",
            index + 1,
            unit.id,
            source_label(&unit.source)
        ));
    }
    if !plan.excluded.is_empty() {
        let excluded: Vec<String> = plan.excluded.iter().map(ToString::to_string).collect();
        lines.push(format!("Excluded: {}", excluded.join(", ")));
    }
    if !plan.failures.is_empty() {
        lines.push("Collections that could not be resolved:".to_string());
        lines.extend(plan.failures.iter().map(failure_line));
    }
    lines
}

/// Prints the plan to stdout.
pub fn print_plan(plan: &PlanOutcome, app_id: Option<&str>) {
    for line in plan_lines(plan, app_id) {
        println!("{line}");
    }
}

/// JSON document for `--plan-json`.
pub fn plan_json(plan: &PlanOutcome, app_id: Option<&str>) -> Value {
    let collections: Vec<Value> = plan
        .collections
        .iter()
        .map(|collection| {
            json!({
                "id": collection.id,
                "title": collection.title,
                "members": collection.members.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();
    let failures: Vec<Value> = plan
        .failures
        .iter()
        .map(|failure| {
            json!({
                "collection_id": failure.collection_id,
                "error": failure.error.to_string(),
            })
        })
        .collect();

    json!({
        "app_id": app_id,
        "units": plan.work_list,
        "collections": collections,
        "failures": failures,
        "excluded": plan.excluded,
    })
}

/// Writes [`plan_json`] to `path`.
pub fn write_plan_json(path: &Path, plan: &PlanOutcome, app_id: Option<&str>) -> Result<()> {
    let body = serde_json::to_string_pretty(&plan_json(plan, app_id))
        .context("Failed to serialize download plan")?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write plan file '{}'", path.display()))
}

/// Lines of the final run report: one per outcome, then planning failures.
pub fn summary_lines(
    outcomes: &OutcomeList,
    failures: &[PlanningFailure],
    output_dir: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Downloaded {} of {} item(s) to {}",
        outcomes.succeeded(),
        outcomes.len(),
        output_dir.display()
    ));
    for outcome in outcomes {
        let mut line = format!(
            "  {:<7} {} (attempts: {})",
            outcome.status.to_string(),
            outcome.id,
            outcome.attempts
        );
        if outcome.status == OutcomeStatus::Failed
            && let Some(error) = &outcome.last_error
        {
            line.push_str(": ");
            line.push_str(error);
        }
        lines.push(line);
    }
    if !failures.is_empty() {
        lines.push("Collections that could not be resolved:".to_string());
        lines.extend(failures.iter().map(failure_line));
    }
    lines
}

/// Prints the run report to stdout.
pub fn print_run_summary(outcomes: &OutcomeList, failures: &[PlanningFailure], output_dir: &Path) {
    for line in summary_lines(outcomes, failures, output_dir) {
        println!("{line}");
    }
}
