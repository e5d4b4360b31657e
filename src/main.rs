//! ghd - Terminal Deployment Dashboard
//!
//! Browse deployments, promote them between environments and deploy commits.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use ghd::dashboard::{MainWindow, SampleProvider};
use ghd::input::InputThread;
use ghd::render::{Console, CrosstermTerminal, ThemeName};
use ghd::{Application, Config};
use std::rc::Rc;
use tokio::task::LocalSet;

fn command() -> Command {
    Command::new("ghd")
        .version(ghd::VERSION)
        .about("A terminal dashboard for deployments")
        .long_about(
            "ghd lists deployments per environment, shows their status history, \
             promotes deployments to the next environment and deploys commits.",
        )
        .arg(
            Arg::new("watch-interval")
                .long("watch-interval")
                .value_name("SECS")
                .help("Seconds between status refreshes while watching")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("poll-ms")
                .long("poll-ms")
                .value_name("MS")
                .help("Input poll timeout in milliseconds")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("theme")
                .long("theme")
                .value_name("NAME")
                .help("Color theme: default, monochrome or high-contrast"),
        )
}

fn load_config() -> Result<Config> {
    #[cfg(feature = "config")]
    {
        Ok(Config::load()?)
    }
    #[cfg(not(feature = "config"))]
    {
        Ok(Config::default())
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; the dashboard owns the alternate screen
    env_logger::init();

    let matches = command().get_matches();

    let mut config = load_config()?;
    if let Some(secs) = matches.get_one::<u64>("watch-interval") {
        config.watch_interval_secs = *secs;
    }
    if let Some(ms) = matches.get_one::<u64>("poll-ms") {
        config.input_poll_ms = *ms;
    }
    if let Some(name) = matches.get_one::<String>("theme") {
        config.theme = name.parse::<ThemeName>()?;
    }
    log::debug!("starting with {config:?}");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build the async runtime")?;
    let local = LocalSet::new();
    local.block_on(&runtime, run(config))?;
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let (_input, events) = InputThread::spawn(config.input_poll());
    let console = Console::new(Box::new(CrosstermTerminal::new()), events, config.theme);

    let provider = Rc::new(SampleProvider::demo(&config));
    let window = MainWindow::new(provider, &config)?;
    let mut app = Application::new(Rc::clone(&console), window.root());

    // Runs once the loop has drawn the first frame
    let main_view = window.main_view();
    let faults = Rc::clone(&console);
    tokio::task::spawn_local(async move {
        if let Err(err) = main_view.init().await {
            log::error!("loading deployments failed: {err}");
            faults.report(err);
        }
    });

    app.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!ghd::VERSION.is_empty());
    }

    #[test]
    fn test_flags_parse() {
        let matches = command()
            .try_get_matches_from(["ghd", "--watch-interval", "10", "--theme", "mono"])
            .unwrap();
        assert_eq!(matches.get_one::<u64>("watch-interval"), Some(&10));
        assert_eq!(matches.get_one::<String>("theme").unwrap(), "mono");

        assert!(command()
            .try_get_matches_from(["ghd", "--poll-ms", "soon"])
            .is_err());
    }
}
