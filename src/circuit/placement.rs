use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::check_arg;
use super::CircuitError;

/// How many downstream loads of each state hang on one wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_new::new)]
pub struct LoadCounts {
    pub on: usize,
    pub partial: usize,
    pub off: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementSlot {
    On,
    Partial,
    Off,
}

impl LoadCounts {
    pub fn total(&self) -> usize {
        self.on + self.partial + self.off
    }

    pub fn validate(&self) -> Result<(), CircuitError> {
        check_arg!(self.on > 0, "on load count is 0 ({:?}), partial interval undefined", self);
        check_arg!(self.partial > 0, "partial load count is 0 ({:?}), off interval undefined", self);
        Ok(())
    }

    /// `partial / on`
    pub fn interval_partial(&self) -> Result<usize, CircuitError> {
        check_arg!(self.on > 0, "on load count is 0 ({:?}), partial interval undefined", self);
        Ok(self.partial / self.on)
    }

    /// `off / partial`
    pub fn interval_off(&self) -> Result<usize, CircuitError> {
        check_arg!(self.partial > 0, "partial load count is 0 ({:?}), off interval undefined", self);
        Ok(self.off / self.partial)
    }
}

/// Ordered load states along one wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub counts: LoadCounts,
    pub slots: Vec<PlacementSlot>,
    /// Position of the last `On` slot, the one that carries the signal onward.
    pub distinguished: usize,
}

impl LoadPlan {
    /// Interleaves `on`, `partial` and `off` loads.
    ///
    /// An `On` is placed once `interval_partial` partials have gone by since
    /// the previous one, a `Partial` once `interval_off` offs have gone by,
    /// and everything else is `Off`.
    pub fn plan(counts: LoadCounts) -> Result<Self, CircuitError> {
        counts.validate()?;
        let interval_partial = counts.interval_partial()?;
        let interval_off = counts.interval_off()?;

        let mut on_placed = 0;
        let mut partial_placed = 0;
        let mut off_placed = 0;
        let mut since_partial = 0;
        let mut since_off = 0;
        let mut distinguished = 0;

        let mut slots = Vec::with_capacity(counts.total());
        for position in 0..counts.total() {
            if since_partial == interval_partial && on_placed < counts.on {
                slots.push(PlacementSlot::On);
                on_placed += 1;
                since_partial = 0;
                distinguished = position;
            } else if since_off == interval_off && partial_placed < counts.partial {
                slots.push(PlacementSlot::Partial);
                partial_placed += 1;
                since_off = 0;
                since_partial += 1;
            } else {
                slots.push(PlacementSlot::Off);
                off_placed += 1;
                since_off += 1;
            }
        }

        debug!(
            "placed {} on, {} partial, {} off (intervals {}/{})",
            on_placed, partial_placed, off_placed, interval_partial, interval_off
        );
        if on_placed != counts.on || partial_placed != counts.partial || off_placed != counts.off {
            return Err(CircuitError::config(format!(
                "load counts {:?} cannot be interleaved, got {}/{}/{}",
                counts, on_placed, partial_placed, off_placed
            )));
        }

        Ok(Self { counts, slots, distinguished })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn count(&self, slot: PlacementSlot) -> usize {
        self.slots.iter().filter(|s| **s == slot).count()
    }

    pub fn is_distinguished(&self, position: usize) -> bool {
        position == self.distinguished
    }

    /// `(position, slot)` pairs in placement order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, PlacementSlot)> + '_ {
        self.slots.iter().copied().enumerate()
    }

    /// Positions of `slot`, 0-indexed.
    pub fn positions(&self, slot: PlacementSlot) -> Vec<usize> {
        self.iter().filter(|(_, s)| *s == slot).map(|(i, _)| i).collect()
    }
}
