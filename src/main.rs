use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use radialtop::chart::Chart;
use radialtop::config::{Config, load_config, load_config_from_path};
use radialtop::format::{fit_unicode, truncate_unicode};
use radialtop::logging;
use radialtop::sunburst::color::Colormap;
use radialtop::sunburst::node::Point;
use radialtop::system::aggregate::Metric;
use radialtop::system::collector::SysinfoSource;
use radialtop::worker::{ChartRequest, ChartWorker};

#[derive(Parser)]
#[command(
    name = "radialtop",
    about = "Sunburst view of RAM or CPU usage across the process tree"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Metric to chart: ram or cpu
    #[arg(long)]
    metric: Option<String>,

    /// Color theme (see --list-themes); append `_r` to reverse
    #[arg(long)]
    theme: Option<String>,

    /// CPU measurement interval in milliseconds
    #[arg(long)]
    cpu_interval_ms: Option<u64>,

    /// Print the wedge list as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Describe the process under this chart point, given as `x,y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    at: Option<Point>,

    /// Number of charts to produce, one per refresh interval
    #[arg(long, default_value_t = 1)]
    refreshes: usize,

    /// List available color themes and exit
    #[arg(long, default_value_t = false)]
    list_themes: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y: {e}"))?;
    Ok(Point::new(x, y))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.log_json)?;

    if cli.list_themes {
        for name in Colormap::names() {
            println!("{name}");
        }
        return Ok(());
    }
    if cli.refreshes == 0 {
        return Err(eyre!("--refreshes must be greater than 0"));
    }

    let config = load_config_for_cli(&cli);
    let metric: Metric = config
        .general
        .default_metric
        .parse()
        .wrap_err("invalid metric")?;

    let request = ChartRequest {
        metric,
        options: config.chart_options(),
        cpu_interval: config.cpu_interval(),
    };

    let mut worker = ChartWorker::new(SysinfoSource::new);
    let mut ticker = tokio::time::interval(Duration::from_millis(
        config.general.refresh_rate_ms.max(1),
    ));

    for _ in 0..cli.refreshes {
        ticker.tick().await;
        worker.request(request.clone());
        let chart = worker
            .next()
            .await
            .ok_or_else(|| eyre!("chart computation did not complete"))?;
        print_chart(&chart, &cli, &config)?;
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref metric) = cli.metric {
        config.general.default_metric = metric.clone();
    }
    if let Some(ref theme) = cli.theme {
        config.chart.theme = theme.clone();
    }
    if let Some(ms) = cli.cpu_interval_ms {
        config.general.cpu_interval_ms = ms;
    }

    config
}

fn print_chart(chart: &Chart, cli: &Cli, config: &Config) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chart.dump())?);
    } else {
        print_table(chart, config.display.max_name_width);
    }

    if let Some(point) = cli.at {
        println!();
        match chart.find_wedge_at(point).and_then(|pid| chart.describe(pid)) {
            Some(text) => println!("{text}"),
            None => println!("No process at ({}, {})", point.x, point.y),
        }
    }
    Ok(())
}

fn print_table(chart: &Chart, name_width: usize) {
    println!(
        "{}: {:.1} of 360 degrees, {} processes, theme {}",
        chart.title(),
        chart.total_span(),
        chart.wedges().len(),
        chart.theme()
    );
    println!(
        "{:>7}  {}  {:>7}  {:>8}  {:>8}",
        "PID",
        fit_unicode("NAME", name_width),
        "USAGE%",
        "START",
        "END"
    );
    for wedge in chart.wedges() {
        let name = chart
            .process(wedge.pid)
            .map_or("", |p| p.name.as_str());
        let indented = format!("{}{}", "  ".repeat(wedge.depth), truncate_unicode(name, name_width));
        println!(
            "{:>7}  {}  {:>7.2}  {:>8.2}  {:>8.2}",
            wedge.pid,
            fit_unicode(&indented, name_width),
            chart.usage(wedge.pid),
            wedge.start_angle,
            wedge.end_angle
        );
    }
}
