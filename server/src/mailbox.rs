//! Per-connection movement intent mailboxes.

use shared::sanitize_intent;
use std::collections::HashMap;

/// Latest movement intent per connection id.
///
/// Each connection has exactly one slot and a later write overwrites an
/// earlier unconsumed one. This lossy last-write-wins behavior is
/// intentional: only the newest intent matters to the next tick, so there
/// is nothing to gain from queueing stale ones. Slots are not cleared
/// between ticks; a held key keeps its intent until the next change.
#[derive(Debug, Default)]
pub struct InputChannel {
    slots: HashMap<u32, (f32, f32)>,
}

impl InputChannel {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Stores the latest intent for a connection, sanitized first.
    pub fn set(&mut self, id: u32, dx: f32, dy: f32) {
        self.slots.insert(id, sanitize_intent(dx, dy));
    }

    /// Current intent for a connection; connections that never sent input
    /// stand still.
    pub fn get(&self, id: u32) -> (f32, f32) {
        self.slots.get(&id).copied().unwrap_or((0.0, 0.0))
    }

    /// Drops the slot for a disconnected id.
    pub fn remove(&mut self, id: u32) {
        self.slots.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_slot_reads_as_standstill() {
        let channel = InputChannel::new();
        assert_eq!(channel.get(99), (0.0, 0.0));
    }

    #[test]
    fn later_write_overwrites_earlier_one() {
        let mut channel = InputChannel::new();
        channel.set(1, 1.0, 0.0);
        channel.set(1, 0.0, -1.0);
        assert_eq!(channel.get(1), (0.0, -1.0));
    }

    #[test]
    fn non_finite_input_is_coerced_to_zero() {
        let mut channel = InputChannel::new();
        channel.set(1, f32::NAN, f32::INFINITY);
        assert_eq!(channel.get(1), (0.0, 0.0));
    }

    #[test]
    fn oversized_input_is_rescaled() {
        let mut channel = InputChannel::new();
        channel.set(1, 2.0, 0.0);
        assert_eq!(channel.get(1), (1.0, 0.0));
    }

    #[test]
    fn slot_survives_reads() {
        let mut channel = InputChannel::new();
        channel.set(1, 1.0, 0.0);
        assert_eq!(channel.get(1), (1.0, 0.0));
        // Reading once per tick must not clear the slot.
        assert_eq!(channel.get(1), (1.0, 0.0));
    }

    #[test]
    fn remove_clears_slot() {
        let mut channel = InputChannel::new();
        channel.set(1, 1.0, 0.0);
        channel.remove(1);
        assert_eq!(channel.get(1), (0.0, 0.0));
    }
}
