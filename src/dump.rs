//! Print raw touch events for debugging.
//! Run: screenpad dump  (or screenpad --replay capture.bin dump)

use std::thread;

use crate::config::Config;
use crate::input::{code_name, Poll};
use crate::run;

pub fn run_dump(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut source = run::open_source(config, false)?;
    eprintln!("Dumping touch events (Ctrl+C to stop):\n");

    let mut n = 0u64;
    loop {
        match source.poll()? {
            Poll::Ready { event, .. } => {
                n += 1;
                let ty = event.event_type().raw();
                let code = event.raw_code();
                let value = event.raw_value();
                println!("{:6}  {}  value={}", n, code_name(ty, code), value);
            }
            Poll::Idle => thread::sleep(config.idle_poll),
            Poll::Malformed(len) => eprintln!("short record ({} bytes), skipped", len),
            Poll::Closed => return Ok(()),
        }
    }
}
