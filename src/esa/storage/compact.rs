//! Byte-per-slot table encoding with an overflow list.
//!
//! Each slot stores `value - origin` as a signed byte when the difference
//! lies in `-127..=127`. Anything else is written as the reserved byte
//! [`OVERFLOW_MARKER`] and the full value goes to an index-sorted
//! [`OverflowMap`]. LCP values use the fixed origin 127, so every LCP up to
//! 254 fits in its byte; child-table links use the slot index as origin
//! since most links point close to their slot.

use super::{BuildTable, TableKind, TableStorage};
use crate::esa::{BuildConfig, EsaError};

/// Reserved cell value meaning "look the slot up in the overflow list".
pub const OVERFLOW_MARKER: i8 = i8::MIN;

/// Fixed origin used by the LCP table.
pub const LCP_ORIGIN: i64 = 127;

/// Sorted `(slot, value)` pairs for cells that did not fit a byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverflowMap {
    entries: Vec<(u32, u32)>,
}

impl OverflowMap {
    /// Build from entries, which must be sorted by slot with no duplicates.
    pub fn from_sorted(entries: Vec<(u32, u32)>) -> Result<Self, EsaError> {
        if entries.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
            return Err(EsaError::Format(
                "overflow entries are not strictly sorted by slot".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    /// Value recorded for `slot`, found by binary halving.
    pub fn lookup(&self, slot: usize) -> Option<u32> {
        let slot = u32::try_from(slot).ok()?;
        let mut lo = 0usize;
        let mut hi = self.entries.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (key, value) = self.entries[mid];
            if key == slot {
                return Some(value);
            }
            if key < slot {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        None
    }

    /// Number of overflowed slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slot overflowed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in slot order.
    pub fn entries(&self) -> &[(u32, u32)] {
        &self.entries
    }

    fn push(&mut self, slot: u32, value: u32) {
        self.entries.push((slot, value));
    }
}

/// Compactly encoded integer table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactTable {
    kind: TableKind,
    cells: Vec<i8>,
    overflow: OverflowMap,
}

impl CompactTable {
    /// Encode `values` as table `kind`.
    pub fn encode(kind: TableKind, values: &[u32]) -> Self {
        let mut cells = Vec::with_capacity(values.len());
        let mut overflow = OverflowMap::default();
        for (slot, &value) in values.iter().enumerate() {
            let delta = i64::from(value) - origin_for(kind, slot);
            match i8::try_from(delta) {
                Ok(cell) if cell != OVERFLOW_MARKER => cells.push(cell),
                _ => {
                    cells.push(OVERFLOW_MARKER);
                    overflow.push(slot as u32, value);
                }
            }
        }
        Self {
            kind,
            cells,
            overflow,
        }
    }

    /// Reassemble a table from its persisted parts.
    pub fn from_parts(kind: TableKind, cells: Vec<i8>, overflow: OverflowMap) -> Result<Self, EsaError> {
        let markers = cells.iter().filter(|&&cell| cell == OVERFLOW_MARKER).count();
        if markers != overflow.len() {
            return Err(EsaError::Format(format!(
                "{kind}: {markers} overflow markers but {} overflow entries",
                overflow.len()
            )));
        }
        Ok(Self {
            kind,
            cells,
            overflow,
        })
    }

    /// Table this encoding holds.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Byte cells, one per slot.
    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    /// Overflow list.
    pub fn overflow(&self) -> &OverflowMap {
        &self.overflow
    }

    /// Fraction of slots that needed the overflow list.
    pub fn overflow_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            0.0
        } else {
            self.overflow.len() as f64 / self.cells.len() as f64
        }
    }
}

impl TableStorage for CompactTable {
    fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn get(&self, index: usize) -> Result<usize, EsaError> {
        let corrupt = || EsaError::corrupt(self.kind, index);
        let cell = *self.cells.get(index).ok_or_else(corrupt)?;
        if cell == OVERFLOW_MARKER {
            return self
                .overflow
                .lookup(index)
                .map(|value| value as usize)
                .ok_or_else(corrupt);
        }
        let value = origin_for(self.kind, index) + i64::from(cell);
        usize::try_from(value).map_err(|_| corrupt())
    }
}

impl BuildTable for CompactTable {
    fn from_values(kind: TableKind, values: Vec<u32>, _config: &BuildConfig) -> Result<Self, EsaError> {
        Ok(Self::encode(kind, &values))
    }
}

fn origin_for(kind: TableKind, slot: usize) -> i64 {
    match kind {
        TableKind::Lcp => LCP_ORIGIN,
        TableKind::Suffix | TableKind::Child => slot as i64,
    }
}
