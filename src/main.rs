use anyhow::{Context, Result};
use clap::Parser;
use tui_starfield::config::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    tui_starfield::app::run(cli)
}

/// Logs go to `--log-file` only; stderr would tear the alternate screen.
fn init_logging(cli: &Cli) -> Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("create log file {}", path.display()))?;
    let level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
