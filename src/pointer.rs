//! Relative pointer output: coordinate mapping, sync coalescing and the
//! uinput device that makes it visible to the desktop.

use std::io;

use evdevil::event::{EventType, InputEvent, Key, KeyEvent, KeyState, Rel};
use evdevil::uinput::UinputDevice;
use evdevil::{Bus, InputId};

use crate::input::event::{EV_REL, EV_SYN, REL_X, REL_Y, SYN_REPORT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Motion { axis: Axis, value: i32 },
    Button { button: Button, pressed: bool },
    Sync,
}

pub trait PointerSink {
    fn emit(&mut self, primitive: Primitive) -> io::Result<()>;
}

/// The touch sensor is mounted sideways: device +Y is pointer +X and device
/// +X is pointer -Y.
pub fn map_delta(dx: i32, dy: i32, sensitivity: f64) -> (i32, i32) {
    let out_x = (f64::from(dy) * sensitivity).round() as i32;
    let out_y = -(f64::from(dx) * sensitivity).round() as i32;
    (out_x, out_y)
}

/// Device-space axes of a delta that reached the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub x: bool,
    pub y: bool,
}

/// Turns gesture decisions into sink primitives.
///
/// Motion is coalesced into one report per touch frame; button changes are
/// reported immediately. A sync that the sink rejected stays pending until
/// [`Emitter::flush`] gets it through.
pub struct Emitter<S> {
    sink: S,
    sensitivity: f64,
    pending_sync: bool,
    held: Option<Button>,
}

impl<S: PointerSink> Emitter<S> {
    pub fn new(sink: S, sensitivity: f64) -> Self {
        Self {
            sink,
            sensitivity,
            pending_sync: false,
            held: None,
        }
    }

    fn send(&mut self, primitive: Primitive) -> bool {
        match self.sink.emit(primitive) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to emit {:?}: {}", primitive, e);
                false
            }
        }
    }

    fn send_motion(&mut self, axis: Axis, value: i32) -> bool {
        if value == 0 {
            return true;
        }
        self.pending_sync = true;
        self.send(Primitive::Motion { axis, value })
    }

    /// Emit the mapped form of a device-space delta and report which device
    /// axes made it to the sink. An axis that rounds to zero counts as sent.
    pub fn motion(&mut self, dx: i32, dy: i32) -> Delivered {
        let (out_x, out_y) = map_delta(dx, dy, self.sensitivity);
        // Pointer X carries device Y and pointer Y carries device X.
        let y = self.send_motion(Axis::X, out_x);
        let x = self.send_motion(Axis::Y, out_y);

        if out_x != 0 || out_y != 0 {
            log::trace!("Motion ({}, {}) -> ({}, {})", dx, dy, out_x, out_y);
        }
        Delivered { x, y }
    }

    pub fn press(&mut self, button: Button) {
        self.send(Primitive::Button { button, pressed: true });
        self.held = Some(button);
        self.pending_sync = true;
        self.flush();
    }

    pub fn release(&mut self, button: Button) {
        self.send(Primitive::Button { button, pressed: false });
        if self.held == Some(button) {
            self.held = None;
        }
        self.pending_sync = true;
        self.flush();
    }

    pub fn click(&mut self, button: Button) {
        self.press(button);
        self.release(button);
    }

    /// Send the pending sync, if any. Returns true when nothing is left pending.
    pub fn flush(&mut self) -> bool {
        if self.pending_sync && self.send(Primitive::Sync) {
            self.pending_sync = false;
        }
        !self.pending_sync
    }

    #[cfg(test)]
    pub fn sync_pending(&self) -> bool {
        self.pending_sync
    }

    pub fn held(&self) -> Option<Button> {
        self.held
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

fn button_key(button: Button) -> Key {
    match button {
        Button::Primary => Key::BTN_LEFT,
        Button::Secondary => Key::BTN_RIGHT,
    }
}

/// Relative pointer with left/right buttons backed by `/dev/uinput`.
/// Dropping it destroys the virtual device.
pub struct UinputSink {
    device: UinputDevice,
}

impl UinputSink {
    pub fn create(name: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // BUS_VIRTUAL
        let device = UinputDevice::builder()?
            .with_input_id(InputId::new(Bus::from_raw(0x06), 0xabcd, 0xabcd, 1))?
            .with_keys([Key::BTN_LEFT, Key::BTN_RIGHT])?
            .with_rel_axes([Rel::X, Rel::Y])?
            .build(name)
            .map_err(|e| format!("Cannot create uinput device (is the uinput module loaded?): {}", e))?;

        Ok(Self { device })
    }

    pub fn sysname(&self) -> Option<String> {
        self.device
            .sysname()
            .ok()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

impl PointerSink for UinputSink {
    fn emit(&mut self, primitive: Primitive) -> io::Result<()> {
        let event: InputEvent = match primitive {
            Primitive::Motion { axis, value } => {
                let code = match axis {
                    Axis::X => REL_X,
                    Axis::Y => REL_Y,
                };
                InputEvent::new(EventType::from_raw(EV_REL), code, value)
            }
            Primitive::Button { button, pressed } => {
                let state = if pressed { KeyState::PRESSED } else { KeyState::RELEASED };
                KeyEvent::new(button_key(button), state).into()
            }
            Primitive::Sync => InputEvent::new(EventType::from_raw(EV_SYN), SYN_REPORT, 0),
        };
        self.device.write(&[event])
    }
}

/// Logs primitives instead of creating a device. Used for `--dry-run`.
#[derive(Debug, Default)]
pub struct LogSink {
    emitted: u64,
}

impl PointerSink for LogSink {
    fn emit(&mut self, primitive: Primitive) -> io::Result<()> {
        self.emitted += 1;
        match primitive {
            Primitive::Sync => log::debug!("{:?}", primitive),
            _ => log::info!("{:?}", primitive),
        }
        Ok(())
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        log::info!("Dry run finished, {} primitives emitted", self.emitted);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_map_delta_rotates_and_scales() {
        assert_eq!(map_delta(5, 0, 1.2), (0, -6));
        assert_eq!(map_delta(0, 5, 1.2), (6, 0));
        assert_eq!(map_delta(-10, 3, 1.0), (3, 10));
        // Half-way values round away from zero on both axes.
        assert_eq!(map_delta(5, -5, 0.5), (-3, -3));
    }

    #[test]
    fn test_motion_skips_zero_axes_and_syncs_once() {
        let sink = RecordingSink::default();
        let mut emitter = Emitter::new(sink.clone(), 1.2);

        assert_eq!(emitter.motion(5, 0), Delivered { x: true, y: true });
        assert!(emitter.flush());
        assert_eq!(
            sink.take(),
            vec![
                Primitive::Motion { axis: Axis::Y, value: -6 },
                Primitive::Sync,
            ]
        );

        // Nothing pending: flushing again emits nothing.
        assert!(emitter.flush());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_sub_unit_motion_emits_nothing() {
        let sink = RecordingSink::default();
        let mut emitter = Emitter::new(sink.clone(), 0.1);
        emitter.motion(2, 2);
        assert!(!emitter.sync_pending());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_click_syncs_after_each_button_change() {
        let sink = RecordingSink::default();
        let mut emitter = Emitter::new(sink.clone(), 1.0);

        emitter.click(Button::Secondary);
        assert_eq!(
            sink.take(),
            vec![
                Primitive::Button { button: Button::Secondary, pressed: true },
                Primitive::Sync,
                Primitive::Button { button: Button::Secondary, pressed: false },
                Primitive::Sync,
            ]
        );
        assert_eq!(emitter.held(), None);
    }

    #[test]
    fn test_rejected_sync_stays_pending_until_flushed() {
        let sink = RecordingSink::default();
        let mut emitter = Emitter::new(sink.clone(), 1.0);

        emitter.motion(0, 4);
        sink.fail_next.set(1);
        assert!(!emitter.flush());
        assert!(emitter.sync_pending());

        assert!(emitter.flush());
        assert_eq!(
            sink.take(),
            vec![Primitive::Motion { axis: Axis::X, value: 4 }, Primitive::Sync]
        );
    }

    #[test]
    fn test_motion_reports_rejected_axis_in_device_space() {
        let sink = RecordingSink::default();
        let mut emitter = Emitter::new(sink.clone(), 1.0);

        sink.reject_axis.set(Some(Axis::Y));
        // Pointer Y carries device X, so device X is the one that failed.
        assert_eq!(emitter.motion(7, 3), Delivered { x: false, y: true });
        assert!(emitter.flush());
        assert_eq!(
            sink.take(),
            vec![Primitive::Motion { axis: Axis::X, value: 3 }, Primitive::Sync]
        );
    }

    #[test]
    fn test_press_tracks_held_button() {
        let sink = RecordingSink::default();
        let mut emitter = Emitter::new(sink, 1.0);
        emitter.press(Button::Primary);
        assert_eq!(emitter.held(), Some(Button::Primary));
        emitter.release(Button::Primary);
        assert_eq!(emitter.held(), None);
    }
}
