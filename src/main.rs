mod cli;
mod input;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, LaunchArgs};
use input::{parse_input, Input};
use pw_core::config::{BackendKind, Config};
use pw_core::events::PlayerEvent;
use pw_core::{ExitReason, Locator, Time};
use pw_process::{PlayerDriver, PlayerHandle, SessionReport};
use pw_proto::{dialect, LaunchOptions};
use std::path::Path;
use tokio::io::AsyncBufReadExt;
use tokio::sync::broadcast::error::RecvError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    // Logs go to stderr; stdout carries notifications.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "playwire=debug,pw_process=trace,pw_proto=trace,pw_core=debug".to_string()
        } else {
            "playwire=info,pw_process=info,pw_proto=warn,pw_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Play { launch } => {
            let rt = tokio::runtime::Runtime::new()?;
            let result = rt.block_on(play(launch, cli.config.as_deref()));
            // The stdin reader may still be parked in a blocking read.
            rt.shutdown_background();
            let code = result?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Args { launch } => print_args(&launch, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("playwire {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn launch_options(launch: &LaunchArgs, config: &Config) -> (BackendKind, LaunchOptions) {
    let backend = launch.backend.unwrap_or(config.player.backend);
    let mut opts = LaunchOptions::from_config(Locator::parse(launch.locator.as_str()), &config.player);
    opts.start = launch.start.map(Time::from_secs_f64);
    opts.volume = launch.volume;
    opts.mute = launch.mute;
    opts.speed = launch.speed;
    if let Some(level) = launch.osd_level {
        opts.osd_level = level;
    }
    opts.audio_track = launch.aid;
    opts.subtitle_files = launch.sub_files.clone();
    opts.screenshot_dir = launch.screenshot_dir.clone();
    opts.capture_file = launch.capture_file.clone();
    opts.extra_args.extend(launch.extra.iter().cloned());
    (backend, opts)
}

async fn play(launch: LaunchArgs, config_path: Option<&Path>) -> Result<i32> {
    let config = Config::load_or_default(config_path);
    let (backend, mut opts) = launch_options(&launch, &config);

    let mut driver = PlayerDriver::new(config).with_backend(backend);
    if let Some(program) = launch.player.clone() {
        driver = driver.with_program(program);
    }

    loop {
        let locator = opts.locator.clone();
        let played = play_once(&mut driver, opts.clone()).await?;
        if played.next_requested {
            if let Some(next) = next_title(&locator, played.titles) {
                tracing::info!(%next, "Advancing to the next title");
                opts.locator = next;
                continue;
            }
            tracing::info!(%locator, "No further title to play");
        }
        let report = played.report;
        return Ok(if report.normal { 0 } else { report.reason.code() });
    }
}

struct Played {
    report: SessionReport,
    next_requested: bool,
    titles: usize,
}

async fn play_once(driver: &mut PlayerDriver, opts: LaunchOptions) -> Result<Played> {
    let backend = driver.backend();
    let mut events = driver.events().subscribe();
    let session = driver
        .start_player(opts)
        .await
        .with_context(|| format!("failed to start {backend}"))?;

    let printer = tokio::spawn(async move {
        let mut next_requested = false;
        loop {
            match events.recv().await {
                Ok(event) => {
                    match serde_json::to_string(&event) {
                        Ok(json) => println!("{json}"),
                        Err(e) => tracing::warn!("Failed to encode event: {e}"),
                    }
                    match event.payload {
                        PlayerEvent::PlayNextRequested => next_requested = true,
                        PlayerEvent::ProcessExited { .. } => break,
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(n)) => tracing::warn!("Skipped {n} notifications"),
                Err(RecvError::Closed) => break,
            }
        }
        next_requested
    });
    let handle = session.handle();
    let reader = tokio::spawn(forward_stdin(handle.clone()));

    let report = session.wait().await?;
    reader.abort();
    let next_requested = printer.await.unwrap_or(false);

    tracing::debug!(?report, "Session finished");
    Ok(Played {
        report,
        next_requested,
        titles: handle.media().titles.len(),
    })
}

/// The title after the one `locator` asked for, when the disc has it.
fn next_title(locator: &Locator, titles: usize) -> Option<Locator> {
    if !locator.media_type().is_disc() {
        return None;
    }
    let next = locator.title().unwrap_or(1) + 1;
    (next as usize <= titles).then(|| locator.with_title(next))
}

async fn forward_stdin(handle: PlayerHandle) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let result = match parse_input(&line) {
            Ok(Input::Quit) => handle.quit(ExitReason::Clean).await.map(usize::from),
            Ok(Input::Raw(text)) => handle.send_raw(text).await,
            Ok(Input::Command(command)) => handle.send(command).await,
            Err(e) => {
                tracing::warn!("Ignoring input: {e:#}");
                continue;
            }
        };
        match result {
            Ok(0) => tracing::debug!("Nothing written for '{}'", line.trim()),
            Ok(_) => {}
            Err(pw_core::Error::State(_)) => break,
            Err(e) => tracing::warn!("Command failed: {e}"),
        }
    }
}

fn print_args(launch: &LaunchArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_or_default(config_path);
    let (backend, opts) = launch_options(launch, &config);
    for arg in dialect(backend).launch_args(&opts) {
        println!("{arg}");
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking playback backends...\n");

    let config = Config::load_or_default(config_path);
    let backends = pw_process::check_all(&config.tools);
    let mut any_ok = false;

    for info in &backends {
        let status = if info.available {
            any_ok = true;
            "✓"
        } else {
            "✗"
        };

        print!("{} {}", status, info.backend);

        if let Some(ref version) = info.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = info.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if any_ok {
        println!("At least one backend is available.");
    } else {
        println!("No backend found. Install mpv or mplayer, or set tools paths in the config.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let player = &config.player;
    println!("  Backend: {}", player.backend);
    println!("  Start timeout: {} ms", player.start_timeout_ms);
    println!("  OSD level: {}", player.osd_level);
    println!("  Pending answer guard: {} lines", player.pending_answer_guard);
    println!("  Aspect presets: {}", player.aspect_presets.len());

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}
