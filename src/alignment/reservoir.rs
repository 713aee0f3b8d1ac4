//! Reusable DP storage.
//!
//! A `Reservoir` owns every buffer the band fill needs so that aligning many
//! pairs in sequence allocates only when a pair is larger than anything seen
//! before. Buffers grow by `max(requested, capacity * 1.2 + slack)` and never
//! shrink. A reservoir is single-threaded; parallel callers keep one per
//! worker (see `alignment::batch`).

use crate::alignment::band::Band;
use crate::alignment::types::{ScoreTriple, TraceBits};
use crate::defaults::{BULK_SLACK, COLUMN_SLACK, GROWTH_FACTOR, POINTER_SLACK};

/// How the kept traceback matrix stores each cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TraceEncoding {
    /// One byte per cell holding three 2-bit predecessor fields.
    #[default]
    PackedBits,
    /// Full `(R, D, I)` scores per cell; traceback recomputes predecessors.
    FullScores,
}

/// Bulk band storage in the encoding chosen at construction.
#[derive(Debug)]
pub(crate) enum TraceMatrix {
    Scores(Vec<ScoreTriple>),
    Bits(Vec<TraceBits>),
}

impl TraceMatrix {
    fn new(encoding: TraceEncoding) -> Self {
        match encoding {
            TraceEncoding::FullScores => TraceMatrix::Scores(Vec::new()),
            TraceEncoding::PackedBits => TraceMatrix::Bits(Vec::new()),
        }
    }

    fn len(&self) -> usize {
        match self {
            TraceMatrix::Scores(cells) => cells.len(),
            TraceMatrix::Bits(cells) => cells.len(),
        }
    }

    fn resize(&mut self, cells: usize) {
        match self {
            TraceMatrix::Scores(v) => v.resize(cells, ScoreTriple::default()),
            TraceMatrix::Bits(v) => v.resize(cells, TraceBits::default()),
        }
    }
}

/// Number of times each buffer has been reallocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservoirStats {
    pub column_grows: usize,
    pub pointer_grows: usize,
    pub bulk_grows: usize,
}

/// Growable DP buffers reused across alignments.
#[derive(Debug)]
pub struct Reservoir {
    encoding: TraceEncoding,
    /// Working column, `ulen + 1` entries.
    column: Vec<ScoreTriple>,
    /// Start offset of each stored column inside `matrix`, `vlen + 1` entries.
    col_offsets: Vec<usize>,
    matrix: TraceMatrix,
    /// Band whose traceback data `matrix` currently holds.
    filled: Option<Band>,
    stats: ReservoirStats,
}

/// `max(requested, current * 1.2 + slack)`
#[inline]
fn grown_capacity(current: usize, requested: usize, slack: usize) -> usize {
    requested.max((current as f64 * GROWTH_FACTOR) as usize + slack)
}

impl Reservoir {
    /// Empty reservoir. Nothing is allocated until the first fill.
    pub fn new(encoding: TraceEncoding) -> Self {
        Self {
            encoding,
            column: Vec::new(),
            col_offsets: Vec::new(),
            matrix: TraceMatrix::new(encoding),
            filled: None,
            stats: ReservoirStats::default(),
        }
    }

    /// Reservoir pre-sized for sequences up to `max_ulen` by `max_vlen`.
    /// The bulk buffer still grows lazily since its size depends on the band.
    pub fn with_capacity(encoding: TraceEncoding, max_ulen: usize, max_vlen: usize) -> Self {
        let mut reservoir = Self::new(encoding);
        reservoir.ensure_column_capacity(max_ulen);
        reservoir.ensure_pointer_capacity(max_vlen);
        reservoir.stats = ReservoirStats::default();
        reservoir
    }

    #[inline]
    pub fn encoding(&self) -> TraceEncoding {
        self.encoding
    }

    /// Make room for a working column over a sequence 1 of length `ulen`.
    pub fn ensure_column_capacity(&mut self, ulen: usize) {
        let needed = ulen + 1;
        if needed > self.column.len() {
            let cap = grown_capacity(self.column.len(), needed, COLUMN_SLACK);
            log::trace!("reservoir: column {} -> {}", self.column.len(), cap);
            self.column.resize(cap, ScoreTriple::default());
            self.stats.column_grows += 1;
        }
    }

    /// Make room for the per-column offsets of a sequence 2 of length `vlen`.
    pub fn ensure_pointer_capacity(&mut self, vlen: usize) {
        let needed = vlen + 1;
        if needed > self.col_offsets.len() {
            let cap = grown_capacity(self.col_offsets.len(), needed, POINTER_SLACK);
            log::trace!("reservoir: pointers {} -> {}", self.col_offsets.len(), cap);
            self.col_offsets.resize(cap, 0);
            self.stats.pointer_grows += 1;
        }
    }

    /// Make room for `band_width * (vlen + 1)` stored cells.
    pub fn ensure_bulk_capacity(&mut self, band_width: usize, vlen: usize) {
        let needed = band_width * (vlen + 1);
        let current = self.matrix.len();
        if needed > current {
            let cap = grown_capacity(current, needed, BULK_SLACK);
            log::trace!("reservoir: bulk {} -> {} cells", current, cap);
            self.matrix.resize(cap);
            self.stats.bulk_grows += 1;
        }
    }

    /// Working column length (`ulen + 1` entries fit when `ulen < capacity`).
    #[inline]
    pub fn column_capacity(&self) -> usize {
        self.column.len()
    }

    #[inline]
    pub fn pointer_capacity(&self) -> usize {
        self.col_offsets.len()
    }

    /// Stored cells available for a kept matrix.
    #[inline]
    pub fn bulk_capacity(&self) -> usize {
        self.matrix.len()
    }

    #[inline]
    pub fn stats(&self) -> ReservoirStats {
        self.stats
    }

    /// Band of the last fill that kept its matrix, if that matrix is still
    /// intact.
    #[inline]
    pub fn filled_band(&self) -> Option<Band> {
        self.filled
    }

    #[inline]
    pub(crate) fn column_mut(&mut self) -> &mut [ScoreTriple] {
        self.filled = None;
        &mut self.column
    }

    /// Buffers for a fill that keeps its matrix. Invalidates the previous
    /// fill until [`Reservoir::mark_filled`] is called.
    #[inline]
    pub(crate) fn trace_parts_mut(&mut self) -> (&mut [ScoreTriple], &mut [usize], &mut TraceMatrix) {
        self.filled = None;
        (&mut self.column, &mut self.col_offsets, &mut self.matrix)
    }

    #[inline]
    pub(crate) fn mark_filled(&mut self, band: Band) {
        self.filled = Some(band);
    }

    #[inline]
    pub(crate) fn trace_parts(&self) -> (&[usize], &TraceMatrix) {
        (&self.col_offsets, &self.matrix)
    }
}

impl Default for Reservoir {
    fn default() -> Self {
        Self::new(TraceEncoding::default())
    }
}
