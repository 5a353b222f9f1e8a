use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "screenpad")]
#[command(about = "Turn a bare multi-touch screen into a tap-to-click pointer")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Touch device name to look for (as listed in /proc/bus/input/devices)
    #[arg(long, env = "SCREENPAD_DEVICE")]
    pub device_name: Option<String>,

    /// Event node to open directly instead of searching by name
    #[arg(long)]
    pub device_path: Option<PathBuf>,

    /// Do not grab the touch device exclusively
    #[arg(long)]
    pub no_grab: bool,

    /// Sleep between polls when no events are pending, in milliseconds
    #[arg(long)]
    pub idle_poll_ms: Option<u64>,

    /// Name of the virtual pointer device
    #[arg(long)]
    pub virtual_device_name: Option<String>,

    /// Replay a raw input_event capture instead of reading a live device
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Size of one record in the replay capture (16 on 32-bit, 24 on 64-bit)
    #[arg(long, default_value_t = 24)]
    pub record_size: usize,

    /// Log pointer output instead of creating a uinput device
    #[arg(long)]
    pub dry_run: bool,

    /// Path to config file
    #[arg(long, env = "SCREENPAD_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print raw events from the touch device for debugging
    Dump,
}
