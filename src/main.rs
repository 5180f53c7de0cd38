//! markwatch: watch a window for known markers and alert on changes.
//!
//! Live capture is behind the `window-capture` feature
//! (`cargo build --features window-capture`); default builds replay PNG
//! frame directories with `--replay <dir>`.

use clap::Parser;
use markwatch_cv::{MarkerDetector, MarkerLoader};
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

mod archive;
mod cli;
mod driver;
mod notify;
mod source;
#[cfg(feature = "window-capture")]
mod window;

use archive::HitArchive;
use cli::Cli;
use driver::Pipeline;
use notify::ConsoleNotifier;
use source::ReplaySource;

/// Initialize logging to stderr; `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.list_windows {
        return list_windows();
    }

    let markers = MarkerLoader::new().load(&cli.marker_source()?)?;
    let detector = MarkerDetector::new(markers, cli.detection_config())?;
    let archive = HitArchive::new(&cli.hits)?;
    let pipeline = Pipeline::new(
        detector,
        archive,
        Box::new(ConsoleNotifier::default()),
        cli.period(),
    );

    let stats = match &cli.replay {
        Some(dir) => driver::run(&pipeline, &mut ReplaySource::new(dir)?),
        None => capture_window(cli, &pipeline)?,
    };

    info!(
        processed = stats.processed,
        failed = stats.failed,
        throttled = stats.throttled,
        busy = stats.busy,
        "session finished"
    );
    Ok(())
}

#[cfg(feature = "window-capture")]
fn capture_window(cli: &Cli, pipeline: &Pipeline) -> anyhow::Result<driver::SessionStats> {
    let mut source = window::WindowSource::find(cli.title.as_deref(), cli.process.as_deref())?;
    Ok(driver::run(pipeline, &mut source))
}

#[cfg(not(feature = "window-capture"))]
fn capture_window(_cli: &Cli, _pipeline: &Pipeline) -> anyhow::Result<driver::SessionStats> {
    anyhow::bail!("built without window capture; rebuild with --features window-capture or use --replay <dir>")
}

#[cfg(feature = "window-capture")]
fn list_windows() -> anyhow::Result<()> {
    for info in window::list_windows()? {
        println!(
            "{:>10}  {:>5}x{:<5}  {:<24}  {}",
            info.id, info.width, info.height, info.app_name, info.title
        );
    }
    Ok(())
}

#[cfg(not(feature = "window-capture"))]
fn list_windows() -> anyhow::Result<()> {
    anyhow::bail!("built without window capture; rebuild with --features window-capture")
}
