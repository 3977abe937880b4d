use super::{run_scan, RootArgs};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use std::path::PathBuf;
use std::time::Instant;
use sweep_lib::util::{format_bytes, format_duration, format_timestamp};
use sweep_lib::{ActionKind, Category, CleanupAction, Config, Result, ScanReport};
use tokio_util::sync::CancellationToken;

pub async fn handle_scan_command(
    config: &Config,
    roots: RootArgs,
    json: bool,
    output: Option<PathBuf>,
    quiet: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let roots = roots.resolve()?;
    let started = Instant::now();
    let report = run_scan(config, &roots, !quiet && !json, cancel).await?;
    let elapsed = started.elapsed();

    if json || output.is_some() {
        let rendered = serde_json::to_string_pretty(&report)?;
        match &output {
            Some(path) => {
                std::fs::write(path, rendered)?;
                if !quiet {
                    println!("{} Report written to {}", style("✓").green(), path.display());
                }
            }
            None => println!("{}", rendered),
        }
    }

    if !json && !quiet {
        print_report(&report);
        println!("Scanned in {}", format_duration(elapsed));
    }

    Ok(())
}

pub fn print_report(report: &ScanReport) {
    println!("\n{}", style("Scan Report").bold().cyan());
    println!("{}\n", style("═".repeat(80)).dim());

    println!("  Scanned at:   {}", format_timestamp(&report.scanned_at));
    println!("  Files:        {}", style(report.total_files).cyan());
    println!("  Total size:   {}", format_bytes(report.total_size()));
    if report.skipped_entries > 0 {
        println!("  Skipped:      {}", style(report.skipped_entries).yellow());
    }
    println!(
        "  Duplicates:   {} files in {} groups, {} reclaimable",
        report.duplicate_file_count(),
        report.duplicates.len(),
        format_bytes(report.duplicate_waste_bytes())
    );
    println!("  Old files:    {}", report.old_files.len());
    println!("  Large files:  {}\n", report.large_files.len());

    print_category_table(report);

    if !report.duplicates.is_empty() {
        print_duplicate_table(report);
    }

    if report.suggested_actions.is_empty() {
        println!("{}", style("No suggested actions").green());
    } else {
        println!("{}", style("Suggested Actions").bold());
        println!("{}", style("─".repeat(80)).dim());
        print_actions_table(&report.suggested_actions);
        let counts: Vec<String> = ActionKind::ALL
            .iter()
            .map(|kind| format!("{} {}", report.actions_of(*kind).count(), kind))
            .collect();
        println!("  {}\n", counts.join(", "));
    }
}

fn print_category_table(report: &ScanReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Files").fg(Color::Cyan),
        Cell::new("Size").fg(Color::Cyan),
    ]);

    for category in Category::ALL {
        let files = report.files_in(category);
        if files.is_empty() {
            continue;
        }
        let size: u64 = files.iter().map(|f| f.size).sum();
        table.add_row(vec![
            Cell::new(category.display_name()),
            Cell::new(files.len()),
            Cell::new(format_bytes(size)),
        ]);
    }

    println!("{}\n", table);
}

fn print_duplicate_table(report: &ScanReport) {
    println!("{}", style("Duplicates").bold());
    println!("{}", style("─".repeat(80)).dim());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Group").fg(Color::Cyan),
        Cell::new("Copies").fg(Color::Cyan),
        Cell::new("Size").fg(Color::Cyan),
        Cell::new("Files").fg(Color::Cyan),
    ]);

    for (key, group) in &report.duplicates {
        let short_key: String = key.chars().take(12).collect();
        let names: Vec<String> = group.iter().map(|f| f.path.display().to_string()).collect();
        table.add_row(vec![
            Cell::new(short_key),
            Cell::new(group.len()),
            Cell::new(group.first().map(|f| f.formatted_size()).unwrap_or_default()),
            Cell::new(names.join("\n")),
        ]);
    }

    println!("{}\n", table);
}

pub fn print_actions_table(actions: &[CleanupAction]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Action").fg(Color::Cyan),
        Cell::new("File").fg(Color::Cyan),
        Cell::new("Destination").fg(Color::Cyan),
        Cell::new("Reason").fg(Color::Cyan),
    ]);

    for action in actions {
        table.add_row(vec![
            Cell::new(action.id.0),
            Cell::new(action.kind.as_str()),
            Cell::new(action.file.path.display().to_string()),
            Cell::new(&action.destination),
            Cell::new(&action.description),
        ]);
    }

    println!("{}\n", table);
}
