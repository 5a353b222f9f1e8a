use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use signal_hook::consts::{SIGINT, SIGTERM};

use crate::config::Config;
use crate::gesture::{FrameAssembler, Tuning};
use crate::input::{find_device_by_name, EventSource, EvdevSource, Poll, Record, ReplaySource};
use crate::pointer::{Emitter, PointerSink};

/// Flag that flips to true on SIGINT or SIGTERM.
pub fn shutdown_flag() -> io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&flag))?;
    }
    Ok(flag)
}

/// Open whichever event source the configuration asks for.
pub fn open_source(
    config: &Config,
    grab: bool,
) -> Result<Box<dyn EventSource>, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(path) = &config.replay {
        return Ok(Box::new(ReplaySource::open(path, config.record_size)?));
    }

    let path = match &config.device_path {
        Some(path) => path.clone(),
        None => find_device_by_name(&config.device_name)?,
    };
    Ok(Box::new(EvdevSource::open(&path, grab)?))
}

/// Run the gesture pipeline until the source closes, a read fails or
/// `shutdown` is set, then tear down in a fixed order: release any held
/// button, destroy the pointer sink, release the source.
pub fn serve<S: PointerSink>(
    source: &mut dyn EventSource,
    mut emitter: Emitter<S>,
    tuning: Tuning,
    shutdown: &AtomicBool,
    idle_poll: Duration,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut assembler = FrameAssembler::new(tuning);
    log::info!("Ready. 1F tap = left click, 1F swipe = move, double tap + swipe = drag, 2F tap = right click");

    let result = event_loop(source, &mut assembler, &mut emitter, shutdown, idle_poll);

    assembler.shutdown(&mut emitter);
    log::info!("Destroying virtual pointer device");
    drop(emitter.into_sink());
    if let Err(e) = source.release() {
        log::warn!("Failed to release touch device: {}", e);
    }
    log::info!("Processed {} touch frames", assembler.frames());

    result.map_err(|e| format!("Error reading touch events: {}", e).into())
}

fn event_loop<S: PointerSink>(
    source: &mut dyn EventSource,
    assembler: &mut FrameAssembler,
    emitter: &mut Emitter<S>,
    shutdown: &AtomicBool,
    idle_poll: Duration,
) -> io::Result<()> {
    while !shutdown.load(Ordering::Relaxed) {
        match source.poll()? {
            Poll::Ready { event, at } => {
                if let Some(record) = Record::decode(&event) {
                    assembler.feed(record, at, emitter);
                }
            }
            Poll::Idle => {
                emitter.flush();
                thread::sleep(idle_poll);
            }
            Poll::Malformed(len) => {
                log::warn!("Discarding short event record ({} bytes)", len);
            }
            Poll::Closed => {
                log::info!("Touch event source closed");
                return Ok(());
            }
        }
    }

    log::info!("Shutdown requested");
    Ok(())
}
