use super::scan::print_actions_table;
use super::{run_scan, RootArgs};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use dialoguer::{Confirm, MultiSelect};
use sweep_lib::progress::{progress_channel, ProgressEvent};
use sweep_lib::util::create_progress_bar;
use sweep_lib::{
    ActionKind, ActionOutcome, CleanupAction, Config, ExecutionSummary, Executor, Planner,
    PlannerOptions, Result, SweepError,
};
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    #[command(flatten)]
    pub roots: RootArgs,

    #[arg(long, help = "Also propose moving every file into category folders")]
    pub organize: bool,

    #[arg(long, value_delimiter = ',', help = "Only these action kinds (move, archive, delete, compress)")]
    pub only: Vec<String>,

    #[arg(long, short = 'y', help = "Run every proposed action without prompting")]
    pub yes: bool,

    #[arg(long, help = "Show what would run without touching any file")]
    pub dry_run: bool,
}

pub async fn handle_clean_command(
    config: &Config,
    args: CleanArgs,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let settings = &config.settings;
    let roots = args.roots.resolve()?;
    let report = run_scan(config, &roots, !quiet, cancel.clone()).await?;

    let mut actions = report.suggested_actions.clone();
    if args.organize {
        let planner = Planner::new(PlannerOptions::from_settings(settings));
        actions.extend(planner.organize(&report, &settings.organize_root));
    }

    if !args.only.is_empty() {
        let kinds = args
            .only
            .iter()
            .map(|s| ActionKind::from_str(s.trim()))
            .collect::<Result<Vec<_>>>()?;
        actions.retain(|a| kinds.contains(&a.kind));
    }

    if actions.is_empty() {
        println!("{} Nothing to clean up", style("✓").green());
        return Ok(());
    }

    let selected = if args.yes {
        actions
    } else {
        select_actions(actions)?
    };

    if selected.is_empty() {
        println!("{}", style("No actions selected").yellow());
        return Ok(());
    }

    if args.dry_run {
        println!("{} DRY RUN: would run {} actions", style("!").yellow(), selected.len());
        print_actions_table(&selected);
        return Ok(());
    }

    let (tx, mut rx) = progress_channel();
    let mut executor = Executor::from_settings(settings)
        .with_progress(tx)
        .with_cancellation(cancel);

    let pb = (!quiet).then(|| create_progress_bar(100, "Cleaning up..."));
    let render = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let (Some(pb), ProgressEvent::Executing { operation, fraction }) = (&pb, event) {
                pb.set_message(operation);
                pb.set_position((fraction * 100.0) as u64);
            }
        }
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
    });

    let summary = executor.execute(&selected).await;
    executor.clear_progress();
    render.await?;

    print_execution_summary(&summary);

    if !args.yes {
        offer_undo(&mut executor).await?;
    }

    Ok(())
}

fn select_actions(actions: Vec<CleanupAction>) -> Result<Vec<CleanupAction>> {
    let items: Vec<String> = actions
        .iter()
        .map(|a| format!("{:>4} {:<8} {}  ({})", a.id.0, a.kind.as_str(), a.file.name, a.description))
        .collect();
    let defaults = vec![true; items.len()];

    let chosen = MultiSelect::new()
        .with_prompt("Select actions to run (space toggles, enter confirms)")
        .items(&items)
        .defaults(&defaults)
        .interact()
        .map_err(prompt_failed)?;

    Ok(actions
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| chosen.contains(idx))
        .map(|(_, action)| action)
        .collect())
}

fn print_execution_summary(summary: &ExecutionSummary) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Action").fg(Color::Cyan),
        Cell::new("File").fg(Color::Cyan),
        Cell::new("Result").fg(Color::Cyan),
    ]);

    for result in &summary.results {
        let outcome = match &result.outcome {
            ActionOutcome::Completed { location } => {
                Cell::new(format!("ok: {}", location.display())).fg(Color::Green)
            }
            ActionOutcome::Failed { kind, message } => {
                Cell::new(format!("{}: {}", kind.as_str(), message)).fg(Color::Red)
            }
            ActionOutcome::Skipped { reason } => {
                Cell::new(format!("skipped: {}", reason)).fg(Color::Yellow)
            }
        };
        table.add_row(vec![
            Cell::new(result.id.0),
            Cell::new(result.kind.as_str()),
            Cell::new(result.file.display().to_string()),
            outcome,
        ]);
    }

    println!("{}\n", table);

    if summary.all_succeeded() {
        println!("{} All {} actions completed", style("✓").green(), summary.success_count());
    } else {
        println!(
            "{} {} succeeded, {} failed, {} skipped",
            style("!").yellow(),
            style(summary.success_count()).green(),
            style(summary.failure_count()).red(),
            style(summary.skipped_count()).yellow()
        );
    }
}

/// Terminal prompts only fail on terminal I/O.
fn prompt_failed(err: dialoguer::Error) -> SweepError {
    let dialoguer::Error::IO(err) = err;
    SweepError::Io(err)
}

async fn offer_undo(executor: &mut Executor) -> Result<()> {
    while let Some(last) = executor.undo_stack().last().cloned() {
        let prompt = format!(
            "Undo {} of {}? ({} left)",
            last.kind,
            last.original_location.display(),
            executor.undo_count()
        );
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(prompt_failed)?;
        if !confirmed {
            break;
        }

        match executor.try_undo_last().await {
            Ok(entry) => {
                println!("{} Restored {}", style("✓").green(), entry.original_location.display());
            }
            Err(e) => {
                println!("{} Undo failed: {}", style("✗").red(), e);
                let discard = Confirm::new()
                    .with_prompt("Drop this entry and continue with older ones?")
                    .default(false)
                    .interact()
                    .map_err(prompt_failed)?;
                if !discard {
                    break;
                }
                executor.discard_last();
            }
        }
    }
    Ok(())
}
