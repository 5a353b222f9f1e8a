mod config;
mod dump;
mod gesture;
mod input;
mod pointer;
mod run;

use std::thread;
use std::time::Duration;

use clap::Parser;

use config::{Cli, Command, Config};
use gesture::Tuning;
use pointer::{Emitter, LogSink, UinputSink};

fn main() {
    let cli = Cli::parse();
    let default_filter = match cli.command {
        Some(Command::Dump) => "warn",
        None => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = Config::load(&cli);
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    let result = match cli.command {
        Some(Command::Dump) => dump::run_dump(&config),
        None => run_pointer(&config),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run_pointer(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let tuning = Tuning::default();

    log::info!(
        "screenpad starting (device={}, grab={}, sink={})",
        config
            .replay
            .as_ref()
            .or(config.device_path.as_ref())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("\"{}\"", config.device_name)),
        config.grab_input && config.replay.is_none(),
        if config.dry_run { "log" } else { "uinput" }
    );

    let mut source = run::open_source(config, config.grab_input)?;
    let shutdown = run::shutdown_flag()?;

    if config.dry_run {
        let emitter = Emitter::new(LogSink::default(), tuning.sensitivity);
        return run::serve(source.as_mut(), emitter, tuning, &shutdown, config.idle_poll);
    }

    let sink = match UinputSink::create(&config.virtual_device_name) {
        Ok(sink) => sink,
        Err(e) => {
            if let Err(release_err) = source.release() {
                log::warn!("Failed to release touch device: {}", release_err);
            }
            return Err(e);
        }
    };
    if let Some(name) = sink.sysname() {
        log::info!("Pointer device ready: /sys/devices/virtual/input/{}", name);
    }

    // Give udev/libinput time to attach before sending events.
    thread::sleep(Duration::from_secs(1));

    let emitter = Emitter::new(sink, tuning.sensitivity);
    run::serve(source.as_mut(), emitter, tuning, &shutdown, config.idle_poll)
}
