use super::MAX_SLOTS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn dist_sq(self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

/// A touch that is currently down.
///
/// Coordinates reported at contact-down are not trustworthy until the frame
/// closes, so the reference points start out empty and are filled in by the
/// classifier on frame boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub tracking_id: i32,
    pub position: Point,
    pub start: Option<Point>,
    pub last_emitted: Option<Point>,
}

impl Contact {
    fn new(tracking_id: i32) -> Self {
        Self {
            tracking_id,
            position: Point::default(),
            start: None,
            last_emitted: None,
        }
    }

    /// Record the current position as both origin and emission baseline.
    pub fn set_baseline(&mut self) {
        self.start = Some(self.position);
        self.last_emitted = Some(self.position);
    }

    /// Squared travel since `start`; zero if no start has been recorded.
    pub fn displacement_sq(&self) -> i64 {
        self.start.map_or(0, |start| self.position.dist_sq(start))
    }

    /// Squared travel since `start`, counted from the origin when no start
    /// has been captured yet.
    pub fn travel_sq(&self) -> i64 {
        self.position.dist_sq(self.start.unwrap_or_default())
    }

    /// Movement not yet turned into pointer motion.
    pub fn pending_delta(&self) -> (i32, i32) {
        let last = self.last_emitted.unwrap_or(self.position);
        (self.position.x - last.x, self.position.y - last.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    #[default]
    Empty,
    Active(Contact),
}

/// What a tracking-id update did to the selected slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Down { slot: usize },
    /// The slot is still active; call [`SlotTable::release`] once the lift
    /// has been classified.
    Up { slot: usize },
}

/// Fixed arena of MT slots, addressed the way the kernel addresses them.
#[derive(Debug)]
pub struct SlotTable {
    slots: [Slot; MAX_SLOTS],
    selected: usize,
    active_count: usize,
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotTable {
    pub fn new() -> Self {
        Self {
            slots: [Slot::Empty; MAX_SLOTS],
            selected: 0,
            active_count: 0,
        }
    }

    /// Returns false (and keeps the previous selection) for out-of-range slots.
    pub fn select(&mut self, index: i32) -> bool {
        match usize::try_from(index) {
            Ok(slot) if slot < MAX_SLOTS => {
                self.selected = slot;
                true
            }
            _ => {
                log::debug!("Ignoring out-of-range slot {}", index);
                false
            }
        }
    }

    pub fn set_tracking_id(&mut self, id: Option<i32>) -> Transition {
        let slot = self.selected;
        match (self.slots[slot], id) {
            (Slot::Empty, Some(id)) => {
                self.slots[slot] = Slot::Active(Contact::new(id));
                self.active_count += 1;
                Transition::Down { slot }
            }
            (Slot::Active(_), None) => Transition::Up { slot },
            _ => Transition::Unchanged,
        }
    }

    pub fn release(&mut self, slot: usize) {
        if let Some(Slot::Active(_)) = self.slots.get(slot) {
            self.slots[slot] = Slot::Empty;
            self.active_count -= 1;
        }
    }

    pub fn set_x(&mut self, x: i32) {
        if let Slot::Active(contact) = &mut self.slots[self.selected] {
            contact.position.x = x;
        }
    }

    pub fn set_y(&mut self, y: i32) {
        if let Slot::Active(contact) = &mut self.slots[self.selected] {
            contact.position.y = y;
        }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn contact(&self, slot: usize) -> Option<&Contact> {
        match self.slots.get(slot) {
            Some(Slot::Active(contact)) => Some(contact),
            _ => None,
        }
    }

    pub fn active(&self) -> impl Iterator<Item = (usize, &Contact)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| match s {
            Slot::Active(contact) => Some((i, contact)),
            Slot::Empty => None,
        })
    }

    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut Contact> {
        self.slots.iter_mut().filter_map(|s| match s {
            Slot::Active(contact) => Some(contact),
            Slot::Empty => None,
        })
    }

    /// The lowest-numbered active contact, used when exactly one is down.
    pub fn primary_mut(&mut self) -> Option<&mut Contact> {
        self.active_mut().next()
    }
}
