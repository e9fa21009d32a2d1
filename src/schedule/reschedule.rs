//! Drag-to-reschedule state machine.
//!
//! The coordinator owns only the transient state of a single in-flight drag.
//! It never performs I/O: a drop produces a [`RescheduleCommit`] and the app
//! dispatches the store mutation. State is cleared before the mutation is
//! issued, so a failing write can never leave a stale drag behind.

use chrono::NaiveDate;
use uuid::Uuid;

use super::instant::Instant;

/// Grid slot coordinates (hour and minute of the slot's start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub hour: u8,
    pub minute: u8,
}

/// The minimal view of the item being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragItem {
    pub id: Uuid,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragItem),
    HoveringSlot(DragItem, SlotRef),
}

/// The single mutation a completed drag produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescheduleCommit {
    pub item_id: Uuid,
    pub new_start: Instant,
}

#[derive(Debug, Default)]
pub struct RescheduleCoordinator {
    state: DragState,
}

impl RescheduleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn dragged_item(&self) -> Option<DragItem> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging(item) | DragState::HoveringSlot(item, _) => Some(item),
        }
    }

    pub fn hovered_slot(&self) -> Option<SlotRef> {
        match self.state {
            DragState::HoveringSlot(_, slot) => Some(slot),
            _ => None,
        }
    }

    /// Begin a drag. Ignored while another drag is in flight; the UI event
    /// source guarantees a single outstanding drag, this just makes the
    /// guarantee cheap to keep.
    pub fn grab(&mut self, id: Uuid, duration_minutes: u32) {
        if matches!(self.state, DragState::Idle) {
            self.state = DragState::Dragging(DragItem {
                id,
                duration_minutes,
            });
        }
    }

    /// Track the slot currently under the pointer. Only the last hovered
    /// slot is kept. Ignored when no drag is in flight.
    pub fn hover(&mut self, slot: SlotRef) {
        if let Some(item) = self.dragged_item() {
            self.state = DragState::HoveringSlot(item, slot);
        }
    }

    /// The pointer left all slots: fall back to plain dragging so a drop
    /// outside the grid cannot commit to a stale slot.
    pub fn leave_slots(&mut self) {
        if let DragState::HoveringSlot(item, _) = self.state {
            self.state = DragState::Dragging(item);
        }
    }

    /// Complete the drag over the viewed day. Emits a commit only when a
    /// slot is hovered; always resets to idle. Dropping an item onto its
    /// current slot still emits the commit — a no-op write, not an error.
    pub fn drop_on(&mut self, day: NaiveDate) -> Option<RescheduleCommit> {
        let commit = match self.state {
            DragState::HoveringSlot(item, slot) => Some(RescheduleCommit {
                item_id: item.id,
                new_start: Instant::at(day, slot.hour as u32, slot.minute as u32),
            }),
            _ => None,
        };
        self.state = DragState::Idle;
        commit
    }

    /// Abandon the drag with no side effects.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn grab_hover_drop_emits_one_commit() {
        let mut coordinator = RescheduleCoordinator::new();
        let id = Uuid::new_v4();

        coordinator.grab(id, 60);
        assert!(matches!(coordinator.state(), DragState::Dragging(_)));

        coordinator.hover(SlotRef { hour: 9, minute: 0 });
        coordinator.hover(SlotRef { hour: 10, minute: 30 });
        assert_eq!(
            coordinator.hovered_slot(),
            Some(SlotRef {
                hour: 10,
                minute: 30
            })
        );

        let commit = coordinator.drop_on(date(2025, 3, 12)).unwrap();
        assert_eq!(commit.item_id, id);
        assert_eq!(commit.new_start, Instant::at(date(2025, 3, 12), 10, 30));
        assert!(matches!(coordinator.state(), DragState::Idle));
    }

    #[test]
    fn drop_without_hovered_slot_commits_nothing() {
        let mut coordinator = RescheduleCoordinator::new();
        coordinator.grab(Uuid::new_v4(), 30);
        assert!(coordinator.drop_on(date(2025, 3, 12)).is_none());
        assert!(matches!(coordinator.state(), DragState::Idle));
    }

    #[test]
    fn leaving_all_slots_clears_stale_hover() {
        let mut coordinator = RescheduleCoordinator::new();
        coordinator.grab(Uuid::new_v4(), 30);
        coordinator.hover(SlotRef { hour: 9, minute: 0 });
        coordinator.leave_slots();
        assert!(matches!(coordinator.state(), DragState::Dragging(_)));
        assert!(coordinator.drop_on(date(2025, 3, 12)).is_none());
    }

    #[test]
    fn cancel_resets_without_commit() {
        let mut coordinator = RescheduleCoordinator::new();
        coordinator.grab(Uuid::new_v4(), 30);
        coordinator.hover(SlotRef { hour: 14, minute: 0 });
        coordinator.cancel();
        assert!(matches!(coordinator.state(), DragState::Idle));
    }

    #[test]
    fn hover_without_grab_is_ignored() {
        let mut coordinator = RescheduleCoordinator::new();
        coordinator.hover(SlotRef { hour: 9, minute: 0 });
        assert!(matches!(coordinator.state(), DragState::Idle));
    }

    #[test]
    fn second_grab_during_drag_is_ignored() {
        let mut coordinator = RescheduleCoordinator::new();
        let first = Uuid::new_v4();
        coordinator.grab(first, 30);
        coordinator.grab(Uuid::new_v4(), 45);
        assert_eq!(coordinator.dragged_item().unwrap().id, first);
    }

    #[test]
    fn dropping_on_current_slot_is_a_noop_commit() {
        let day = date(2025, 3, 12);
        let prior = Instant::at(day, 9, 30);

        let mut coordinator = RescheduleCoordinator::new();
        coordinator.grab(Uuid::new_v4(), 30);
        coordinator.hover(SlotRef { hour: 9, minute: 30 });
        let commit = coordinator.drop_on(day).unwrap();
        assert_eq!(commit.new_start, prior);
    }
}
