use std::time::Instant;

use crate::pointer::{Button, Emitter, PointerSink};

use super::slots::SlotTable;
use super::Tuning;

/// Everything the recognizer remembers between frames. Rebuilt from the live
/// contact stream; nothing here outlives the process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct GestureState {
    single_tap_pending: bool,
    /// Armed at contact-down when the previous lift was recent enough.
    drag_pending: bool,
    two_finger_tap_pending: bool,
    dragging: bool,
    moving: bool,
    touch_down_time: Option<Instant>,
    last_up_time: Option<Instant>,
    two_finger_down_time: Option<Instant>,
    start_coords_recorded: bool,
}

pub struct Classifier {
    tuning: Tuning,
    state: GestureState,
}

impl Classifier {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            state: GestureState::default(),
        }
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    #[cfg(test)]
    pub fn is_moving(&self) -> bool {
        self.state.moving
    }

    /// A contact went down; `active_count` already includes it.
    pub fn contact_down<S: PointerSink>(
        &mut self,
        active_count: usize,
        now: Instant,
        emitter: &mut Emitter<S>,
    ) {
        let window = self.tuning.double_tap_window;
        let state = &mut self.state;

        match active_count {
            1 => {
                state.touch_down_time = Some(now);
                state.single_tap_pending = true;
                state.moving = false;
                state.dragging = false;
                state.drag_pending = state
                    .last_up_time
                    .is_some_and(|up| now.saturating_duration_since(up) < window);
                state.two_finger_tap_pending = false;
                state.start_coords_recorded = false;
                if state.drag_pending {
                    log::debug!("Drag armed");
                }
            }
            2 => {
                if state.dragging {
                    log::info!("Drag cancelled by second finger, releasing left button");
                    emitter.release(Button::Primary);
                }
                state.two_finger_tap_pending = true;
                state.two_finger_down_time = Some(now);
                state.start_coords_recorded = false;
                state.single_tap_pending = false;
                state.drag_pending = false;
                state.dragging = false;
                state.moving = false;
            }
            n => {
                log::debug!("{} contacts down, cancelling gestures", n);
                self.reset();
            }
        }
    }

    /// The contact in `lifted` is going up. Must run while the slot is still
    /// active so the pre-lift count and coordinates are visible.
    pub fn contact_up<S: PointerSink>(
        &mut self,
        slots: &SlotTable,
        lifted: usize,
        now: Instant,
        emitter: &mut Emitter<S>,
    ) {
        let Some(contact) = slots.contact(lifted) else {
            return;
        };
        let count = slots.active_count();

        if self.state.two_finger_tap_pending && count == 2 {
            let dead_zone = self.tuning.two_finger_tap_dead_zone_sq;
            let quick = self
                .state
                .two_finger_down_time
                .is_some_and(|down| now.saturating_duration_since(down) < self.tuning.two_finger_tap_timeout);
            let moved = contact.travel_sq() > dead_zone
                || slots
                    .active()
                    .any(|(slot, other)| slot != lifted && other.travel_sq() > dead_zone);

            if quick && !moved {
                log::info!("Two-finger tap, sending right click");
                emitter.click(Button::Secondary);
            } else {
                log::debug!("Two-finger contact lifted without tap (quick={}, moved={})", quick, moved);
            }
            self.state.two_finger_tap_pending = false;
            self.state.start_coords_recorded = false;
        }

        if count == 1 {
            let quick = self
                .state
                .touch_down_time
                .is_some_and(|down| now.saturating_duration_since(down) < self.tuning.single_tap_timeout);
            let still = contact.displacement_sq() <= self.tuning.single_tap_dead_zone_sq;

            if self.state.single_tap_pending && still && !self.state.dragging && quick {
                log::info!("Single tap, sending left click");
                emitter.click(Button::Primary);
            } else if self.state.dragging {
                log::info!("Drag end, releasing left button");
                emitter.release(Button::Primary);
            }

            self.state.single_tap_pending = false;
            self.state.drag_pending = false;
            self.state.dragging = false;
            self.state.moving = false;
            self.state.last_up_time = Some(now);
        }
    }

    /// Evaluate a complete frame.
    pub fn frame<S: PointerSink>(&mut self, slots: &mut SlotTable, emitter: &mut Emitter<S>) {
        let count = slots.active_count();

        if self.state.two_finger_tap_pending && count == 2 && !self.state.start_coords_recorded {
            for contact in slots.active_mut() {
                contact.start = Some(contact.position);
            }
            self.state.start_coords_recorded = true;
        }

        if count == 1 {
            self.track_single(slots, emitter);
        }
    }

    fn track_single<S: PointerSink>(&mut self, slots: &mut SlotTable, emitter: &mut Emitter<S>) {
        let Some(contact) = slots.primary_mut() else {
            return;
        };
        let state = &mut self.state;

        if !state.moving && !state.dragging {
            if contact.last_emitted.is_none() {
                contact.set_baseline();
            }

            let dead_zone = if state.drag_pending {
                self.tuning.drag_start_dead_zone_sq
            } else {
                self.tuning.move_dead_zone_sq
            };

            if contact.displacement_sq() > dead_zone {
                state.moving = true;
                if state.drag_pending {
                    log::info!("Drag start, holding left button");
                    emitter.press(Button::Primary);
                    state.dragging = true;
                    state.drag_pending = false;
                    state.single_tap_pending = false;
                }
                contact.last_emitted = Some(contact.position);
            }
        }

        if state.moving || state.dragging {
            let (dx, dy) = contact.pending_delta();
            if (dx, dy) != (0, 0) {
                let sent = emitter.motion(dx, dy);
                let position = contact.position;
                let last = contact.last_emitted.get_or_insert(position);
                if sent.x {
                    last.x = position.x;
                }
                if sent.y {
                    last.y = position.y;
                }
            }
        }
    }

    /// Drop pending gestures that no longer match the number of contacts.
    /// Runs after each frame has been evaluated and flushed.
    pub fn settle(&mut self, active_count: usize) {
        if active_count != 2 && self.state.two_finger_tap_pending {
            self.state.two_finger_tap_pending = false;
            self.state.start_coords_recorded = false;
        }
        if active_count != 1 {
            self.state.single_tap_pending = false;
        }
    }

    /// Forget every in-flight gesture. Timers are kept so double-tap timing
    /// still works across the reset.
    pub fn reset(&mut self) {
        let state = &mut self.state;
        state.single_tap_pending = false;
        state.drag_pending = false;
        state.two_finger_tap_pending = false;
        state.dragging = false;
        state.moving = false;
        state.start_coords_recorded = false;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pointer::testing::RecordingSink;
    use crate::pointer::Primitive;

    fn emitter() -> (Emitter<RecordingSink>, RecordingSink) {
        let sink = RecordingSink::default();
        (Emitter::new(sink.clone(), 1.2), sink)
    }

    #[test]
    fn test_drag_armed_only_inside_double_tap_window() {
        let (mut emitter, _) = emitter();
        let mut classifier = Classifier::new(Tuning::default());
        let t0 = Instant::now();

        classifier.state.last_up_time = Some(t0);
        classifier.contact_down(1, t0 + Duration::from_millis(299), &mut emitter);
        assert!(classifier.state.drag_pending);

        classifier.contact_down(1, t0 + Duration::from_millis(300), &mut emitter);
        assert!(!classifier.state.drag_pending);
        assert!(classifier.state.single_tap_pending);
    }

    #[test]
    fn test_first_contact_ever_is_not_armed() {
        let (mut emitter, _) = emitter();
        let mut classifier = Classifier::new(Tuning::default());
        classifier.contact_down(1, Instant::now(), &mut emitter);
        assert!(!classifier.state.drag_pending);
    }

    #[test]
    fn test_third_contact_cancels_everything_silently() {
        let (mut emitter, sink) = emitter();
        let mut classifier = Classifier::new(Tuning::default());
        let t0 = Instant::now();

        classifier.contact_down(1, t0, &mut emitter);
        classifier.contact_down(2, t0, &mut emitter);
        assert!(classifier.state.two_finger_tap_pending);

        classifier.contact_down(3, t0, &mut emitter);
        assert!(!classifier.state.two_finger_tap_pending);
        assert!(!classifier.state.single_tap_pending);
        assert!(!classifier.is_dragging());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_second_finger_releases_held_drag() {
        let (mut emitter, sink) = emitter();
        let mut classifier = Classifier::new(Tuning::default());
        classifier.state.dragging = true;
        emitter.press(Button::Primary);
        sink.take();

        classifier.contact_down(2, Instant::now(), &mut emitter);
        assert!(!classifier.is_dragging());
        assert_eq!(emitter.held(), None);
        assert_eq!(
            sink.take(),
            vec![
                Primitive::Button { button: Button::Primary, pressed: false },
                Primitive::Sync,
            ]
        );
    }

    #[test]
    fn test_settle_clears_mismatched_pending_flags() {
        let mut classifier = Classifier::new(Tuning::default());
        classifier.state.single_tap_pending = true;
        classifier.state.two_finger_tap_pending = true;
        classifier.state.start_coords_recorded = true;

        classifier.settle(2);
        assert!(!classifier.state.single_tap_pending);
        assert!(classifier.state.two_finger_tap_pending);

        classifier.settle(0);
        assert!(!classifier.state.two_finger_tap_pending);
        assert!(!classifier.state.start_coords_recorded);
    }
}
