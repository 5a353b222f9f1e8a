//! Where raw touch events come from: a grabbed evdev node or a raw capture file.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use evdevil::event::InputEvent;
use evdevil::Evdev;

use super::event::{parse_input_event, parse_timestamp, INPUT_EVENT_SIZE_64};

/// Outcome of one non-blocking read.
#[derive(Debug)]
pub enum Poll {
    Ready { event: InputEvent, at: Instant },
    /// Nothing to read right now; not an error.
    Idle,
    /// A short record was read and discarded (byte count).
    Malformed(usize),
    Closed,
}

pub trait EventSource {
    fn poll(&mut self) -> io::Result<Poll>;

    /// Give the device back to the rest of the system.
    fn release(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Resolve a device name (as reported by EVIOCGNAME) to its event node.
pub fn find_device_by_name(name: &str) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
    for res in evdevil::enumerate()? {
        let (path, evdev) = match res {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable input device: {}", e);
                continue;
            }
        };

        match evdev.name() {
            Ok(dev_name) if dev_name == name => {
                log::info!("Found device \"{}\" at {}", name, path.display());
                return Ok(path);
            }
            Ok(dev_name) => log::trace!("{}: {}", path.display(), dev_name),
            Err(e) => log::debug!("{}: cannot read name: {}", path.display(), e),
        }
    }

    Err(format!("Device \"{}\" not found", name).into())
}

/// Live touch device opened non-blocking, optionally with an exclusive grab.
pub struct EvdevSource {
    evdev: Evdev,
    path: PathBuf,
    grabbed: bool,
}

impl EvdevSource {
    pub fn open(path: &Path, grab: bool) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let evdev = Evdev::open(path)
            .map_err(|e| format!("Cannot open evdev device {}: {}", path.display(), e))?;

        if grab {
            evdev
                .grab()
                .map_err(|e| format!("Cannot grab evdev device {}: {}", path.display(), e))?;
            log::info!("Grabbed {}", path.display());
        }
        evdev.set_nonblocking(true)?;

        Ok(Self {
            evdev,
            path: path.to_path_buf(),
            grabbed: grab,
        })
    }
}

impl EventSource for EvdevSource {
    fn poll(&mut self) -> io::Result<Poll> {
        match self.evdev.raw_events().next() {
            Some(Ok(event)) => Ok(Poll::Ready {
                event,
                at: Instant::now(),
            }),
            Some(Err(e)) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(Poll::Idle)
            }
            Some(Err(e)) => Err(e),
            None => Ok(Poll::Closed),
        }
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.grabbed {
            return Ok(());
        }
        self.evdev.ungrab()?;
        self.grabbed = false;
        log::info!("Released {}", self.path.display());
        Ok(())
    }
}

/// Replays a raw `input_event` capture (e.g. `cat /dev/input/eventN > file`).
///
/// Record timestamps are mapped onto a monotonic clock anchored at the first
/// record, so tap and double-tap timing behaves as it did when captured.
pub struct ReplaySource<R> {
    reader: R,
    record_size: usize,
    anchor: Option<(Duration, Instant)>,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path, record_size: usize) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let file = File::open(path)
            .map_err(|e| format!("Cannot open capture {}: {}", path.display(), e))?;
        log::info!("Replaying {} ({} byte records)", path.display(), record_size);
        Ok(Self::new(BufReader::new(file), record_size))
    }
}

impl<R: Read> ReplaySource<R> {
    pub fn new(reader: R, record_size: usize) -> Self {
        Self {
            reader,
            record_size,
            anchor: None,
        }
    }

    fn clock(&mut self, stamp: Duration) -> Instant {
        let (first_stamp, first_instant) = *self.anchor.get_or_insert((stamp, Instant::now()));
        first_instant + stamp.saturating_sub(first_stamp)
    }
}

impl<R: Read> EventSource for ReplaySource<R> {
    fn poll(&mut self) -> io::Result<Poll> {
        let mut buf = [0u8; INPUT_EVENT_SIZE_64];
        let buf = &mut buf[..self.record_size];

        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if filled == 0 {
            return Ok(Poll::Closed);
        }
        if filled < buf.len() {
            return Ok(Poll::Malformed(filled));
        }

        let (Some(event), Some(stamp)) = (parse_input_event(buf), parse_timestamp(buf)) else {
            return Ok(Poll::Malformed(filled));
        };
        let at = self.clock(stamp);
        Ok(Poll::Ready { event, at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{Record, ABS_MT_POSITION_X, EV_ABS, EV_SYN, SYN_REPORT};

    fn raw(sec: u64, usec: u64, ty: u16, code: u16, value: i32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(INPUT_EVENT_SIZE_64);
        buf.extend_from_slice(&sec.to_le_bytes());
        buf.extend_from_slice(&usec.to_le_bytes());
        buf.extend_from_slice(&ty.to_le_bytes());
        buf.extend_from_slice(&code.to_le_bytes());
        buf.extend_from_slice(&value.to_le_bytes());
        buf
    }

    #[test]
    fn test_replay_preserves_relative_timing() {
        let mut bytes = raw(100, 0, EV_ABS, ABS_MT_POSITION_X, 5);
        bytes.extend(raw(100, 250_000, EV_SYN, SYN_REPORT, 0));
        let mut source = ReplaySource::new(bytes.as_slice(), INPUT_EVENT_SIZE_64);

        let Poll::Ready { event, at: first } = source.poll().unwrap() else {
            panic!("expected first record");
        };
        assert_eq!(Record::decode(&event), Some(Record::PositionX(5)));

        let Poll::Ready { event, at: second } = source.poll().unwrap() else {
            panic!("expected second record");
        };
        assert_eq!(Record::decode(&event), Some(Record::FrameBoundary));
        assert_eq!(second - first, Duration::from_millis(250));

        assert!(matches!(source.poll().unwrap(), Poll::Closed));
    }

    #[test]
    fn test_replay_reports_truncated_tail() {
        let mut bytes = raw(1, 0, EV_SYN, SYN_REPORT, 0);
        bytes.extend_from_slice(&[0u8; 7]);
        let mut source = ReplaySource::new(bytes.as_slice(), INPUT_EVENT_SIZE_64);

        assert!(matches!(source.poll().unwrap(), Poll::Ready { .. }));
        assert!(matches!(source.poll().unwrap(), Poll::Malformed(7)));
        assert!(matches!(source.poll().unwrap(), Poll::Closed));
    }
}
