// ============================================================================
// DP cell types shared by fill and traceback
// ============================================================================
//
// The tie-break helpers at the bottom of this file are the only place where
// predecessor choices are made. Fill (both encodings) and the full-score
// traceback call the same functions, so the edge a traceback recomputes from
// stored scores is always the edge the packed encoding recorded.

/// Scores of the three Gotoh states at one cell.
///
/// `r`: last column is a substitution. `d`: last column is a deletion
/// (consumes sequence 1, vertical move). `i`: last column is an insertion
/// (consumes sequence 2, horizontal move).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreTriple {
    pub r: i32,
    pub d: i32,
    pub i: i32,
}

impl ScoreTriple {
    #[inline]
    pub const fn new(r: i32, d: i32, i: i32) -> Self {
        Self { r, d, i }
    }

    /// All three states set to `value`.
    #[inline]
    pub const fn splat(value: i32) -> Self {
        Self {
            r: value,
            d: value,
            i: value,
        }
    }

    /// Best state of this cell, ties resolved R before D before I.
    #[inline]
    pub fn best(&self) -> (i32, Edge) {
        let mut value = self.r;
        let mut edge = Edge::R;
        if value < self.d {
            value = self.d;
            edge = Edge::D;
        }
        if value < self.i {
            value = self.i;
            edge = Edge::I;
        }
        (value, edge)
    }
}

/// Predecessor state of a DP transition.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Field never written. Reaching it during traceback means the stored
    /// matrix does not describe a path.
    #[default]
    Unknown = 0,
    R = 1,
    D = 2,
    I = 3,
}

impl Edge {
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Edge::R,
            2 => Edge::D,
            3 => Edge::I,
            _ => Edge::Unknown,
        }
    }

    /// Bit offset of this state's field inside a [`TraceBits`] byte.
    #[inline]
    const fn shift(self) -> Option<u8> {
        match self {
            Edge::R => Some(0),
            Edge::D => Some(2),
            Edge::I => Some(4),
            Edge::Unknown => None,
        }
    }
}

/// Packed predecessor byte: three 2-bit fields, one per state of the cell.
///
/// Bits 0-1 hold the predecessor of R, bits 2-3 of D, bits 4-5 of I.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceBits(u8);

impl TraceBits {
    #[inline]
    pub const fn new(r: Edge, d: Edge, i: Edge) -> Self {
        Self((r as u8) | ((d as u8) << 2) | ((i as u8) << 4))
    }

    /// Byte with only `state`'s field set to `pred`.
    #[inline]
    pub const fn only(state: Edge, pred: Edge) -> Self {
        match state.shift() {
            Some(shift) => Self((pred as u8) << shift),
            None => Self(0),
        }
    }

    /// Predecessor recorded for `state`.
    #[inline]
    pub fn get(self, state: Edge) -> Edge {
        match state.shift() {
            Some(shift) => Edge::from_bits(self.0 >> shift),
            None => Edge::Unknown,
        }
    }

    #[inline]
    pub fn set(&mut self, state: Edge, pred: Edge) {
        if let Some(shift) = state.shift() {
            self.0 = (self.0 & !(0b11 << shift)) | ((pred as u8) << shift);
        }
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

/// Predecessor of R from the diagonal cell: R, then D only if strictly
/// greater, then I only if strictly greater.
#[inline]
pub(crate) fn diagonal_choice(nw: &ScoreTriple) -> (i32, Edge) {
    nw.best()
}

/// Predecessor of a gap state: opening from R wins ties over extending.
///
/// `from_r` is the neighbour's R plus the open+extend cost, `from_gap` the
/// neighbour's same-gap state plus the extension cost.
#[inline]
pub(crate) fn gap_choice(from_r: i32, from_gap: i32, gap_edge: Edge) -> (i32, Edge) {
    if from_r >= from_gap {
        (from_r, Edge::R)
    } else {
        (from_gap, gap_edge)
    }
}
