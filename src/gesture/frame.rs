use std::time::Instant;

use crate::input::Record;
use crate::pointer::{Emitter, PointerSink};

use super::classifier::Classifier;
use super::slots::{SlotTable, Transition};
use super::Tuning;

/// Owns the slot table and recognizer for one touch device.
///
/// Field updates are applied to the slots as they arrive; the recognizer
/// only looks at coordinates once a frame boundary closes the batch.
/// Contact-down and contact-up are the exception: they are classified the
/// moment the tracking id changes, before the slot is freed.
pub struct FrameAssembler {
    slots: SlotTable,
    classifier: Classifier,
    frames: u64,
}

impl FrameAssembler {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            slots: SlotTable::new(),
            classifier: Classifier::new(tuning),
            frames: 0,
        }
    }

    pub fn feed<S: PointerSink>(&mut self, record: Record, now: Instant, emitter: &mut Emitter<S>) {
        match record {
            Record::SelectSlot(index) => {
                self.slots.select(index);
            }
            Record::TrackingId(id) => match self.slots.set_tracking_id(id) {
                Transition::Down { slot } => {
                    log::debug!(
                        "Contact down in slot {} (id {:?}, {} active)",
                        slot,
                        self.slots.contact(slot).map(|c| c.tracking_id),
                        self.slots.active_count()
                    );
                    self.classifier.contact_down(self.slots.active_count(), now, emitter);
                }
                Transition::Up { slot } => {
                    log::debug!("Contact up in slot {} ({} active)", slot, self.slots.active_count());
                    self.classifier.contact_up(&self.slots, slot, now, emitter);
                    self.slots.release(slot);
                }
                Transition::Unchanged => {}
            },
            Record::PositionX(x) => self.slots.set_x(x),
            Record::PositionY(y) => self.slots.set_y(y),
            Record::ContactKey { code, pressed } => {
                log::trace!("Ignoring contact key {} (pressed={})", code, pressed);
            }
            Record::FrameBoundary => self.end_frame(emitter),
        }
    }

    fn end_frame<S: PointerSink>(&mut self, emitter: &mut Emitter<S>) {
        self.classifier.frame(&mut self.slots, emitter);
        emitter.flush();

        let count = self.slots.active_count();
        self.classifier.settle(count);
        log_frame_progress(&mut self.frames, count);
    }

    /// Release a held button so the pointer is not left stuck after exit.
    pub fn shutdown<S: PointerSink>(&mut self, emitter: &mut Emitter<S>) {
        if let Some(button) = emitter.held() {
            log::info!("Releasing held {:?} button", button);
            emitter.release(button);
        }
        emitter.flush();
        self.classifier.reset();
    }

    #[cfg(test)]
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    #[cfg(test)]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn log_frame_progress(frame_count: &mut u64, contact_count: usize) {
    if *frame_count == 0 {
        log::info!("Touch events flowing");
    }
    *frame_count += 1;

    if (*frame_count).is_multiple_of(500) {
        log::debug!("Touch frames: {}, contacts: {}", frame_count, contact_count);
    }
}
