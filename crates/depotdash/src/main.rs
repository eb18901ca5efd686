mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use depotdash_core::{
    apply_filters, detect_anomalies, dynamics_frame, export_anomalies_csv, kpi_summary,
    load_dataset_path, shift_cards, shift_means, shift_totals, trend_for_metric,
    DashboardConfig, DashboardError, Dataset, DateSelection, FilterSet,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Warehouse cargo-turnover analytics", long_about = None)]
struct Cli {
    /// TOML file overriding sheet labels, metric labels and anomaly defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show how the workbook was read: row counts, columns, shift options, date tree
    Inspect(InspectArgs),
    /// KPI summary and per-shift aggregates for the selection
    Shifts(SelectionArgs),
    /// Metric dynamics over time with a linear trend
    Trend(TrendArgs),
    /// Records outside mean ± k·σ of a metric
    Anomalies(AnomalyArgs),
}

#[derive(Args, Debug)]
struct InspectArgs {
    workbook: PathBuf,
    /// Print the date hierarchy as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SelectionArgs {
    workbook: PathBuf,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long, requires = "year")]
    month: Option<u32>,
    /// ISO week number within the chosen month
    #[arg(long, requires = "month")]
    week: Option<u32>,
    /// Individual days (YYYY-MM-DD); repeatable
    #[arg(long = "day")]
    days: Vec<NaiveDate>,
    /// Shift windows to keep, e.g. "6:00-18:00"; repeatable
    #[arg(long = "shift-time")]
    shift_times: Vec<String>,
    /// Shift numbers to keep (1-4); repeatable
    #[arg(long = "shift-number")]
    shift_numbers: Vec<String>,
}

#[derive(Args, Debug)]
struct TrendArgs {
    #[command(flatten)]
    selection: SelectionArgs,
    /// Metric column; defaults to turnover
    #[arg(long)]
    metric: Option<String>,
    /// Print the long-format series as a table instead of the trend summary
    #[arg(long)]
    long: bool,
}

#[derive(Args, Debug)]
struct AnomalyArgs {
    #[command(flatten)]
    selection: SelectionArgs,
    #[arg(long)]
    metric: Option<String>,
    /// Sigma multiple; usually between 1.0 and 3.0
    #[arg(long)]
    threshold: Option<f64>,
    /// Write the anomaly table to this CSV file
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    let outcome = match cli.command {
        Command::Inspect(args) => handle_inspect(args, &config),
        Command::Shifts(args) => handle_shifts(args, &config),
        Command::Trend(args) => handle_trend(args, &config),
        Command::Anomalies(args) => handle_anomalies(args, &config),
    };

    match outcome {
        Err(DashboardError::EmptySelection(message)) => {
            println!("Nothing to show: {message}. Adjust the date or shift selection.");
            Ok(())
        }
        other => other.context("depotdash failed"),
    }
}

fn load(path: &Path, config: &DashboardConfig) -> depotdash_core::Result<Dataset> {
    let dataset = load_dataset_path(path, config)?;
    info!(path = %path.display(), rows = dataset.table.height(), "workbook loaded");
    Ok(dataset)
}

fn filters_for(dataset: &Dataset, args: &SelectionArgs) -> FilterSet {
    let mut selection = DateSelection {
        year: args.year,
        month: args.month,
        week: args.week,
        days: None,
    };
    if !args.days.is_empty() {
        selection = selection.with_days(args.days.iter().copied());
    }

    let mut filters = FilterSet::from_selection(&dataset.hierarchy, &selection);
    if !args.shift_times.is_empty() {
        filters = filters.with_shift_times(args.shift_times.iter().cloned());
    }
    if !args.shift_numbers.is_empty() {
        filters = filters.with_shift_numbers(args.shift_numbers.iter().cloned());
    }
    filters
}

fn handle_inspect(args: InspectArgs, config: &DashboardConfig) -> depotdash_core::Result<()> {
    let dataset = load(&args.workbook, config)?;

    println!("{}", render::normalization(&dataset.report));
    println!("Metric columns: {}", dataset.table.numeric_columns().join(", "));
    println!("Shift times: {}", dataset.table.shift_time_options()?.join(", "));
    println!("Shift numbers: {}", dataset.table.shift_number_options()?.join(", "));

    if args.json {
        match serde_json::to_string_pretty(&dataset.hierarchy) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("could not render date hierarchy: {err}"),
        }
    } else {
        for year in dataset.hierarchy.years() {
            for month in dataset.hierarchy.months(year) {
                let weeks: Vec<String> = dataset
                    .hierarchy
                    .weeks(year, month)
                    .into_iter()
                    .map(|week| format!("W{week}"))
                    .collect();
                println!("{year}-{month:02}: {}", weeks.join(" "));
            }
        }
    }
    Ok(())
}

fn handle_shifts(args: SelectionArgs, config: &DashboardConfig) -> depotdash_core::Result<()> {
    let dataset = load(&args.workbook, config)?;
    let view = apply_filters(&dataset.table, &filters_for(&dataset, &args))?;

    println!("{}", render::kpis(&kpi_summary(&view, &dataset.groups)?));
    println!("{}", render::shift_cards(&shift_cards(&view, &dataset.groups)?));
    println!("Totals per shift:\n{}", shift_totals(&view, &dataset.groups)?);
    println!("Means per shift:\n{}", shift_means(&view, &dataset.groups)?);
    Ok(())
}

fn handle_trend(args: TrendArgs, config: &DashboardConfig) -> depotdash_core::Result<()> {
    let dataset = load(&args.selection.workbook, config)?;
    let view = apply_filters(&dataset.table, &filters_for(&dataset, &args.selection))?;
    let metric = args
        .metric
        .unwrap_or_else(|| config.metrics.turnover.clone());

    if args.long {
        println!("{}", dynamics_frame(&view, &[metric.as_str()])?);
        return Ok(());
    }

    let series = trend_for_metric(&view, &metric)?;
    println!("{}", render::trend(&series));
    match &series.fit {
        Some(fit) => println!(
            "slope {:.2}, intercept {:.2}, R² {:.3} over {} points",
            fit.slope, fit.intercept, fit.r_squared, fit.points
        ),
        None => println!("Not enough points for a trend line."),
    }
    Ok(())
}

fn handle_anomalies(args: AnomalyArgs, config: &DashboardConfig) -> depotdash_core::Result<()> {
    let dataset = load(&args.selection.workbook, config)?;
    let view = apply_filters(&dataset.table, &filters_for(&dataset, &args.selection))?;
    let metric = args
        .metric
        .unwrap_or_else(|| config.anomaly_metric().to_string());
    let threshold = args.threshold.unwrap_or(config.anomaly.threshold);

    let report = detect_anomalies(&view, &metric, threshold)?;
    if let Some(stats) = &report.stats {
        println!(
            "mean {:.2}, σ {:.2}, bounds [{:.2}, {:.2}]",
            stats.mean, stats.std_dev, stats.lower_bound, stats.upper_bound
        );
    }
    if report.is_empty() {
        println!("No anomalies in '{metric}' at {threshold}σ.");
    } else {
        println!("{}", render::anomalies(&report));
    }

    if let Some(out) = &args.out {
        export_anomalies_csv(&report, out)?;
        info!(path = %out.display(), rows = report.len(), "anomaly table exported");
    }
    Ok(())
}
