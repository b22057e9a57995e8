use std::path::PathBuf;

use clap::Parser;

mod platform;

use platform::logging::LogDestination;

/// Terminal front end for a YouTube subscription manager site.
#[derive(Debug, Parser)]
#[command(name = "ytsm_app", version)]
struct Args {
    /// Root URL of the site, e.g. http://localhost:8000/
    #[arg(long)]
    base_url: Option<String>,

    /// RON file with connection and polling settings.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    poll_interval_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    log: LogDestination,

    /// Poll jobs and load the tree once, print the page and exit.
    #[arg(long)]
    once: bool,

    /// Do not read commands from stdin.
    #[arg(long)]
    no_input: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    platform::logging::initialize(args.log);

    let mut config = match &args.config {
        Some(path) => platform::config::load(path)?,
        None => platform::config::AppConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(interval) = args.poll_interval_ms {
        config.poll_interval_ms = interval;
    }

    platform::run_app(config, args.once, !args.no_input)
}
