//! Raw evdev records and their decoding into multi-touch field updates.

use std::time::Duration;

use evdevil::event::{EventType, InputEvent};

pub const INPUT_EVENT_SIZE_32: usize = 16;
pub const INPUT_EVENT_SIZE_64: usize = 24;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;
pub const SYN_REPORT: u16 = 0;
pub const SYN_DROPPED: u16 = 3;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;

pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
pub const ABS_MT_PRESSURE: u16 = 0x3a;

const BTN_LEFT: u16 = 0x110;
const BTN_RIGHT: u16 = 0x111;
const BTN_TOOL_FINGER: u16 = 0x145;
const BTN_TOUCH: u16 = 0x14a;
const BTN_TOOL_DOUBLETAP: u16 = 0x14d;
const BTN_TOOL_TRIPLETAP: u16 = 0x14e;
const BTN_TOOL_QUADTAP: u16 = 0x14f;

/// One multi-touch field update, or the frame boundary that closes a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    SelectSlot(i32),
    /// `None` is the kernel's `-1`, i.e. the contact in this slot lifted.
    TrackingId(Option<i32>),
    PositionX(i32),
    PositionY(i32),
    ContactKey { code: u16, pressed: bool },
    FrameBoundary,
}

impl Record {
    /// Map a raw event to a record. Events the gesture engine has no use for
    /// (pressure, MSC_SCAN, SYN_DROPPED...) yield `None`.
    pub fn decode(ev: &InputEvent) -> Option<Record> {
        let ty = ev.event_type().raw();
        let code = ev.raw_code();
        let value = ev.raw_value();

        match (ty, code) {
            (EV_SYN, SYN_REPORT) => Some(Record::FrameBoundary),
            (EV_KEY, _) => Some(Record::ContactKey {
                code,
                pressed: value != 0,
            }),
            (EV_ABS, ABS_MT_SLOT) => Some(Record::SelectSlot(value)),
            (EV_ABS, ABS_MT_TRACKING_ID) => Some(Record::TrackingId((value >= 0).then_some(value))),
            (EV_ABS, ABS_MT_POSITION_X) => Some(Record::PositionX(value)),
            (EV_ABS, ABS_MT_POSITION_Y) => Some(Record::PositionY(value)),
            _ => None,
        }
    }
}

/// Parse a Linux input_event from raw bytes (32-bit or 64-bit format).
pub fn parse_input_event(buf: &[u8]) -> Option<InputEvent> {
    match buf.len() {
        INPUT_EVENT_SIZE_32 => parse_input_event_32(buf),
        INPUT_EVENT_SIZE_64 => parse_input_event_64(buf),
        _ => None,
    }
}

/// Kernel timestamp of a raw input_event, as time since the epoch.
pub fn parse_timestamp(buf: &[u8]) -> Option<Duration> {
    match buf.len() {
        INPUT_EVENT_SIZE_32 => {
            let sec = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
            let usec = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
            Some(Duration::from_secs(sec.into()) + Duration::from_micros(usec.into()))
        }
        INPUT_EVENT_SIZE_64 => {
            let sec = u64::from_le_bytes(buf[0..8].try_into().ok()?);
            let usec = u64::from_le_bytes(buf[8..16].try_into().ok()?);
            Some(Duration::from_secs(sec) + Duration::from_micros(usec))
        }
        _ => None,
    }
}

fn parse_input_event_32(buf: &[u8]) -> Option<InputEvent> {
    let ty = u16::from_le_bytes([buf[8], buf[9]]);
    let code = u16::from_le_bytes([buf[10], buf[11]]);
    let value = i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);

    Some(InputEvent::new(EventType::from_raw(ty), code, value))
}

fn parse_input_event_64(buf: &[u8]) -> Option<InputEvent> {
    let ty = u16::from_le_bytes([buf[16], buf[17]]);
    let code = u16::from_le_bytes([buf[18], buf[19]]);
    let value = i32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);

    Some(InputEvent::new(EventType::from_raw(ty), code, value))
}

/// Human-readable name for an event type/code pair, for `dump`.
pub fn code_name(ty: u16, code: u16) -> String {
    match ty {
        EV_SYN => match code {
            SYN_REPORT => "SYN_REPORT".into(),
            SYN_DROPPED => "SYN_DROPPED".into(),
            _ => format!("SYN/{}", code),
        },
        EV_KEY => match code {
            BTN_LEFT => "BTN_LEFT".into(),
            BTN_RIGHT => "BTN_RIGHT".into(),
            BTN_TOUCH => "BTN_TOUCH".into(),
            BTN_TOOL_FINGER => "BTN_TOOL_FINGER".into(),
            BTN_TOOL_DOUBLETAP => "BTN_TOOL_DOUBLETAP".into(),
            BTN_TOOL_TRIPLETAP => "BTN_TOOL_TRIPLETAP".into(),
            BTN_TOOL_QUADTAP => "BTN_TOOL_QUADTAP".into(),
            _ => format!("KEY/{}", code),
        },
        EV_REL => match code {
            REL_X => "REL_X".into(),
            REL_Y => "REL_Y".into(),
            _ => format!("REL/{}", code),
        },
        EV_ABS => {
            let abs = match code {
                0x00 => "X",
                0x01 => "Y",
                ABS_MT_SLOT => "MT_SLOT",
                0x30 => "MT_TOUCH_MAJOR",
                0x31 => "MT_TOUCH_MINOR",
                ABS_MT_POSITION_X => "MT_POSITION_X",
                ABS_MT_POSITION_Y => "MT_POSITION_Y",
                ABS_MT_TRACKING_ID => "MT_TRACKING_ID",
                ABS_MT_PRESSURE => "MT_PRESSURE",
                _ => "?",
            };
            format!("ABS_{}({})", abs, code)
        }
        0x04 => format!("MSC/{}", code),
        _ => format!("type{} code{}", ty, code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_64(sec: u64, usec: u64, ty: u16, code: u16, value: i32) -> [u8; INPUT_EVENT_SIZE_64] {
        let mut buf = [0u8; INPUT_EVENT_SIZE_64];
        buf[0..8].copy_from_slice(&sec.to_le_bytes());
        buf[8..16].copy_from_slice(&usec.to_le_bytes());
        buf[16..18].copy_from_slice(&ty.to_le_bytes());
        buf[18..20].copy_from_slice(&code.to_le_bytes());
        buf[20..24].copy_from_slice(&value.to_le_bytes());
        buf
    }

    #[test]
    fn test_parse_64_bit_event() {
        let buf = raw_64(12, 500, EV_ABS, ABS_MT_POSITION_X, 731);
        let ev = parse_input_event(&buf).unwrap();
        assert_eq!(ev.event_type().raw(), EV_ABS);
        assert_eq!(ev.raw_code(), ABS_MT_POSITION_X);
        assert_eq!(ev.raw_value(), 731);
        assert_eq!(
            parse_timestamp(&buf),
            Some(Duration::from_secs(12) + Duration::from_micros(500))
        );
    }

    #[test]
    fn test_parse_32_bit_event() {
        let mut buf = [0u8; INPUT_EVENT_SIZE_32];
        buf[0..4].copy_from_slice(&3u32.to_le_bytes());
        buf[8..10].copy_from_slice(&EV_ABS.to_le_bytes());
        buf[10..12].copy_from_slice(&ABS_MT_TRACKING_ID.to_le_bytes());
        buf[12..16].copy_from_slice(&(-1i32).to_le_bytes());
        let ev = parse_input_event(&buf).unwrap();
        assert_eq!(Record::decode(&ev), Some(Record::TrackingId(None)));
        assert_eq!(parse_timestamp(&buf), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        assert!(parse_input_event(&[0u8; 10]).is_none());
        assert!(parse_timestamp(&[0u8; 10]).is_none());
    }

    #[test]
    fn test_decode_records() {
        let ev = |ty, code, value| InputEvent::new(EventType::from_raw(ty), code, value);
        assert_eq!(Record::decode(&ev(EV_SYN, SYN_REPORT, 0)), Some(Record::FrameBoundary));
        assert_eq!(Record::decode(&ev(EV_ABS, ABS_MT_SLOT, 2)), Some(Record::SelectSlot(2)));
        assert_eq!(
            Record::decode(&ev(EV_ABS, ABS_MT_TRACKING_ID, 41)),
            Some(Record::TrackingId(Some(41)))
        );
        assert_eq!(Record::decode(&ev(EV_ABS, ABS_MT_POSITION_Y, -3)), Some(Record::PositionY(-3)));
        assert_eq!(
            Record::decode(&ev(EV_KEY, BTN_TOUCH, 1)),
            Some(Record::ContactKey { code: BTN_TOUCH, pressed: true })
        );
        assert_eq!(Record::decode(&ev(EV_ABS, ABS_MT_PRESSURE, 40)), None);
        assert_eq!(Record::decode(&ev(EV_SYN, SYN_DROPPED, 0)), None);
    }

    #[test]
    fn test_code_names() {
        assert_eq!(code_name(EV_SYN, SYN_REPORT), "SYN_REPORT");
        assert_eq!(code_name(EV_ABS, ABS_MT_TRACKING_ID), "ABS_MT_TRACKING_ID(57)");
        assert_eq!(code_name(EV_KEY, BTN_TOUCH), "BTN_TOUCH");
        assert_eq!(code_name(9, 1), "type9 code1");
    }
}
