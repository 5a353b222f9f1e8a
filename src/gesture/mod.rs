//! One-finger and two-finger gesture recognition on top of MT slot tracking.

mod classifier;
mod frame;
mod slots;

use std::time::Duration;

pub use frame::FrameAssembler;

/// Number of concurrent contacts tracked. Slot indices outside `0..MAX_SLOTS`
/// are ignored.
pub const MAX_SLOTS: usize = 10;

pub const SENSITIVITY: f64 = 1.2;
/// Squared distance a lone contact must travel before the cursor follows it.
pub const MOVE_DEAD_ZONE_SQ: i64 = 10 * 10;
/// Larger threshold used when the contact is armed for a drag.
pub const DRAG_START_DEAD_ZONE_SQ: i64 = 30 * 30;
pub const SINGLE_TAP_DEAD_ZONE_SQ: i64 = 20 * 20;
pub const TWO_FINGER_TAP_DEAD_ZONE_SQ: i64 = 20 * 20;
pub const SINGLE_TAP_TIMEOUT: Duration = Duration::from_millis(180);
/// A contact landing this soon after the previous lift is armed for a drag.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
pub const TWO_FINGER_TAP_TIMEOUT: Duration = Duration::from_millis(200);

/// Gesture thresholds, in device units squared and wall-clock durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub sensitivity: f64,
    pub move_dead_zone_sq: i64,
    pub drag_start_dead_zone_sq: i64,
    pub single_tap_dead_zone_sq: i64,
    pub two_finger_tap_dead_zone_sq: i64,
    pub single_tap_timeout: Duration,
    pub double_tap_window: Duration,
    pub two_finger_tap_timeout: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            sensitivity: SENSITIVITY,
            move_dead_zone_sq: MOVE_DEAD_ZONE_SQ,
            drag_start_dead_zone_sq: DRAG_START_DEAD_ZONE_SQ,
            single_tap_dead_zone_sq: SINGLE_TAP_DEAD_ZONE_SQ,
            two_finger_tap_dead_zone_sq: TWO_FINGER_TAP_DEAD_ZONE_SQ,
            single_tap_timeout: SINGLE_TAP_TIMEOUT,
            double_tap_window: DOUBLE_TAP_WINDOW,
            two_finger_tap_timeout: TWO_FINGER_TAP_TIMEOUT,
        }
    }
}
