//! Per-parse accumulator of pending field changes.
//!
//! A [`Delta`] holds exactly one [`Field`] per [`PeriodKind`]. Matched rules
//! write into it (see `accumulate.rs`) and the resolver reads it back in a
//! fixed precedence order (see `resolve.rs`).
//!
//! The two flags of a field are independent:
//!
//! ```text
//!              set=false              set=true
//! relative   never mentioned        "in 3 days", "0 days from now"
//! absolute   (not reachable)        "on the 15th", "at 14h"
//! ```

use std::ops::{Index, IndexMut};

use crate::grammar::{OpKind, PeriodKind};

bitflags::bitflags! {
    /// A set of period kinds, used to report which fields a parse wrote.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PeriodMask: u8 {
        const SECOND = 1 << 0;
        const MINUTE = 1 << 1;
        const HOUR   = 1 << 2;
        const DAY    = 1 << 3;
        const WEEK   = 1 << 4;
        const MONTH  = 1 << 5;
        const YEAR   = 1 << 6;
    }
}

impl From<PeriodKind> for PeriodMask {
    fn from(kind: PeriodKind) -> Self {
        PeriodMask::from_bits_truncate(1 << kind.index())
    }
}

/// Pending change to one period of the resolved date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub value: i64,
    /// A rule wrote this field (distinguishes "never mentioned" from "added zero").
    pub set: bool,
    /// Additive delta rather than absolute assignment.
    pub relative: bool,
}

impl Default for Field {
    fn default() -> Self {
        Field { value: 0, set: false, relative: true }
    }
}

impl Field {
    /// Field was written with an absolute value.
    pub fn is_absolute(&self) -> bool {
        self.set && !self.relative
    }

    pub fn apply(&mut self, kind: OpKind, value: i64) {
        match kind {
            OpKind::Add => {
                self.value = self.value.saturating_add(value);
                self.relative = true;
            }
            OpKind::Subtract => {
                self.value = self.value.saturating_sub(value);
                self.relative = true;
            }
            OpKind::Set => {
                self.value = value;
                self.relative = false;
            }
        }
        self.set = true;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    fields: [Field; PeriodKind::COUNT],
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds whose field was written by at least one operation.
    pub fn set_mask(&self) -> PeriodMask {
        PeriodKind::ALL
            .into_iter()
            .filter(|kind| self[*kind].set)
            .fold(PeriodMask::empty(), |mask, kind| mask | PeriodMask::from(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.set_mask().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PeriodKind, &Field)> + '_ {
        PeriodKind::ALL.into_iter().map(move |kind| (kind, &self[kind]))
    }
}

impl Index<PeriodKind> for Delta {
    type Output = Field;

    fn index(&self, kind: PeriodKind) -> &Field {
        &self.fields[kind.index()]
    }
}

impl IndexMut<PeriodKind> for Delta {
    fn index_mut(&mut self, kind: PeriodKind) -> &mut Field {
        &mut self.fields[kind.index()]
    }
}
