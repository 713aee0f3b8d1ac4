//! Banded Gotoh fill.
//!
//! One column sweep computes the three-state recurrence inside a diagonal
//! band using a single working column of `ulen + 1` score triples. The cell
//! `(i-1, j-1)` needed for the diagonal move is carried in `nw` before the
//! column entry it lives in is overwritten. What the sweep records for
//! traceback is delegated to a [`TraceSink`], so score-only, full-score and
//! packed-bit fills share the exact same arithmetic and tie-breaks.
//!
//! Recurrence (`start = -(open+ext)`, `ext = -gap_extension`):
//! ```text
//! R(i,j) = max(R, D, I)(i-1,j-1) + sub(u[i-1], v[j-1])
//! D(i,j) = max(R(i-1,j) + start, D(i-1,j) + ext)
//! I(i,j) = max(R(i,j-1) + start, I(i,j-1) + ext)
//! ```
//! with `R(0,0) = 0`, `D(0,0) = I(0,0) = -gap_opening`. Cells outside the band
//! hold the sentinel.

use crate::alignment::band::Band;
use crate::alignment::reservoir::{Reservoir, TraceMatrix};
use crate::alignment::scoring::{check_sentinel, sentinel_for, GapCosts, ScoreModel};
use crate::alignment::types::{diagonal_choice, gap_choice, Edge, ScoreTriple, TraceBits};
use crate::error::{DbandError, Result};

/// Receives every in-band cell in column-major, row-ascending order.
pub(crate) trait TraceSink {
    fn begin_column(&mut self, j: usize, low_row: usize, high_row: usize);
    fn record(&mut self, i: usize, cell: &ScoreTriple, bits: TraceBits);
}

/// Score-only fill.
struct NoTrace;

impl TraceSink for NoTrace {
    #[inline(always)]
    fn begin_column(&mut self, _j: usize, _low_row: usize, _high_row: usize) {}
    #[inline(always)]
    fn record(&mut self, _i: usize, _cell: &ScoreTriple, _bits: TraceBits) {}
}

/// Stores each band column contiguously; `offsets[j]` is where column `j`'s
/// `low_row` cell lands.
struct BandStore<'a, T> {
    cells: &'a mut [T],
    offsets: &'a mut [usize],
    cursor: usize,
    #[cfg(debug_assertions)]
    next_row: usize,
}

impl<'a, T> BandStore<'a, T> {
    fn new(cells: &'a mut [T], offsets: &'a mut [usize]) -> Self {
        Self {
            cells,
            offsets,
            cursor: 0,
            #[cfg(debug_assertions)]
            next_row: 0,
        }
    }

    #[inline(always)]
    fn start(&mut self, j: usize, low_row: usize) {
        self.offsets[j] = self.cursor;
        #[cfg(debug_assertions)]
        {
            self.next_row = low_row;
        }
        #[cfg(not(debug_assertions))]
        let _ = low_row;
    }

    #[inline(always)]
    fn push(&mut self, i: usize, value: T) {
        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(i, self.next_row);
            self.next_row += 1;
        }
        #[cfg(not(debug_assertions))]
        let _ = i;
        self.cells[self.cursor] = value;
        self.cursor += 1;
    }
}

impl TraceSink for BandStore<'_, ScoreTriple> {
    #[inline(always)]
    fn begin_column(&mut self, j: usize, low_row: usize, _high_row: usize) {
        self.start(j, low_row);
    }
    #[inline(always)]
    fn record(&mut self, i: usize, cell: &ScoreTriple, _bits: TraceBits) {
        self.push(i, *cell);
    }
}

impl TraceSink for BandStore<'_, TraceBits> {
    #[inline(always)]
    fn begin_column(&mut self, j: usize, low_row: usize, _high_row: usize) {
        self.start(j, low_row);
    }
    #[inline(always)]
    fn record(&mut self, i: usize, _cell: &ScoreTriple, bits: TraceBits) {
        self.push(i, bits);
    }
}

/// Check the arguments every fill entry point shares.
fn check_inputs<M: ScoreModel + ?Sized>(
    model: &M,
    costs: &GapCosts,
    useq: &[u8],
    vseq: &[u8],
    band: &Band,
    sentinel: i32,
) -> Result<()> {
    if band.ulen() != useq.len() || band.vlen() != vseq.len() {
        return Err(DbandError::InvalidBand {
            left_dist: band.left_dist(),
            right_dist: band.right_dist(),
            ulen: useq.len(),
            vlen: vseq.len(),
        });
    }
    check_sentinel(sentinel as i64)?;
    let required = sentinel_for(useq.len(), vseq.len(), model, costs)?;
    if sentinel > required {
        return Err(DbandError::WeakSentinel { sentinel, required });
    }
    match (useq.is_empty(), vseq.is_empty()) {
        (true, false) => Err(DbandError::EmptySequence {
            other_len: vseq.len(),
        }),
        (false, true) => Err(DbandError::EmptySequence {
            other_len: useq.len(),
        }),
        _ => Ok(()),
    }
}

/// The column sweep. `column` must hold at least `ulen + 1` triples.
/// Returns `R(ulen, vlen)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn sweep<M, S>(
    column: &mut [ScoreTriple],
    sink: &mut S,
    model: &M,
    costs: &GapCosts,
    sentinel: i32,
    useq: &[u8],
    vseq: &[u8],
    band: &Band,
) -> i32
where
    M: ScoreModel + ?Sized,
    S: TraceSink,
{
    let ulen = useq.len();
    let vlen = vseq.len();
    let right_dist = band.right_dist() as usize;
    let start = costs.start_penalty();
    let ext = costs.extend_penalty();

    if ulen == 0 && vlen == 0 {
        return 0;
    }

    // Column 0: only deletions reach (i, 0)
    let mut low_row = 0usize;
    let mut high_row = band.high_row(0);
    column[0] = ScoreTriple::new(0, -costs.gap_opening(), -costs.gap_opening());
    sink.begin_column(0, 0, high_row);
    sink.record(0, &column[0], TraceBits::default());
    for i in 1..=high_row {
        column[i] = ScoreTriple::new(sentinel, column[i - 1].d + ext, sentinel);
        sink.record(i, &column[i], TraceBits::only(Edge::D, Edge::D));
    }
    trace_column(0, &column[..=high_row]);

    for (j, &cb) in (1..=vlen).zip(vseq) {
        let prev_high = high_row;
        let in_first_row = j <= right_dist;

        // Row low_row is either row 0 (insertions only) or drops out of the
        // band after this column.
        let first_i = if in_first_row {
            column[low_row].i + ext
        } else {
            sentinel
        };
        let mut nw = column[low_row];
        column[low_row] = ScoreTriple::new(sentinel, sentinel, first_i);

        if high_row < ulen {
            high_row += 1;
        }
        let col_low = if in_first_row { low_row } else { low_row + 1 };
        debug_assert_eq!(col_low, band.low_row(j));
        debug_assert_eq!(high_row, band.high_row(j));

        sink.begin_column(j, col_low, high_row);
        if in_first_row {
            sink.record(low_row, &column[low_row], TraceBits::only(Edge::I, Edge::I));
        }

        for i in (low_row + 1)..=high_row {
            let ca = useq[i - 1];
            let (diag, r_edge) = diagonal_choice(&nw);
            let r = diag + model.substitution(ca, cb);

            let north = column[i - 1];
            let (d, d_edge) = gap_choice(north.r + start, north.d + ext, Edge::D);

            // Row i was in the previous column only up to prev_high
            let (ins, i_edge) = if i <= prev_high {
                let west = column[i];
                gap_choice(west.r + start, west.i + ext, Edge::I)
            } else {
                (sentinel, Edge::Unknown)
            };

            nw = column[i];
            column[i] = ScoreTriple::new(r, d, ins);
            sink.record(i, &column[i], TraceBits::new(r_edge, d_edge, i_edge));
        }

        trace_column(j, &column[col_low..=high_row]);
        if !in_first_row {
            low_row += 1;
        }
    }

    column[ulen].r
}

#[inline]
fn trace_column(j: usize, cells: &[ScoreTriple]) {
    if log::log_enabled!(log::Level::Trace) {
        let rendered: Vec<String> = cells
            .iter()
            .map(|c| format!("({},{},{})", c.r, c.d, c.i))
            .collect();
        log::trace!("column {}: {}", j, rendered.join(" "));
    }
}

/// Optimal global score inside `band`, keeping only the working column.
///
/// `sentinel` must be at most [`sentinel_for`] of the same inputs.
pub fn fill_score_only<M: ScoreModel + ?Sized>(
    reservoir: &mut Reservoir,
    model: &M,
    costs: &GapCosts,
    sentinel: i32,
    useq: &[u8],
    vseq: &[u8],
    band: &Band,
) -> Result<i32> {
    check_inputs(model, costs, useq, vseq, band, sentinel)?;
    reservoir.ensure_column_capacity(useq.len());
    let column = reservoir.column_mut();
    Ok(sweep(column, &mut NoTrace, model, costs, sentinel, useq, vseq, band))
}

/// Optimal global score inside `band`, storing the band in the reservoir's
/// encoding so that [`traceback`](crate::alignment::traceback::traceback)
/// can reconstruct an optimal alignment.
pub fn fill_with_trace<M: ScoreModel + ?Sized>(
    reservoir: &mut Reservoir,
    model: &M,
    costs: &GapCosts,
    sentinel: i32,
    useq: &[u8],
    vseq: &[u8],
    band: &Band,
) -> Result<i32> {
    check_inputs(model, costs, useq, vseq, band, sentinel)?;
    reservoir.ensure_column_capacity(useq.len());
    reservoir.ensure_pointer_capacity(vseq.len());
    reservoir.ensure_bulk_capacity(band.width(), vseq.len());

    let (column, offsets, matrix) = reservoir.trace_parts_mut();
    let score = match matrix {
        TraceMatrix::Scores(cells) => {
            let mut store = BandStore::new(cells.as_mut_slice(), offsets);
            sweep(column, &mut store, model, costs, sentinel, useq, vseq, band)
        }
        TraceMatrix::Bits(cells) => {
            let mut store = BandStore::new(cells.as_mut_slice(), offsets);
            sweep(column, &mut store, model, costs, sentinel, useq, vseq, band)
        }
    };
    reservoir.mark_filled(*band);
    log::trace!(
        "filled {} cells for band [{},{}]",
        band.cell_count(),
        band.left_dist(),
        band.right_dist()
    );
    Ok(score)
}

/// Dispatch on `keep_matrix`.
#[allow(clippy::too_many_arguments)]
pub fn fill<M: ScoreModel + ?Sized>(
    reservoir: &mut Reservoir,
    model: &M,
    costs: &GapCosts,
    sentinel: i32,
    useq: &[u8],
    vseq: &[u8],
    band: &Band,
    keep_matrix: bool,
) -> Result<i32> {
    if keep_matrix {
        fill_with_trace(reservoir, model, costs, sentinel, useq, vseq, band)
    } else {
        fill_score_only(reservoir, model, costs, sentinel, useq, vseq, band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::reservoir::TraceEncoding;
    use crate::alignment::scoring::{sentinel_for, SubstitutionMatrix};
    use crate::alignment::utils::encode_sequence;

    fn setup() -> (SubstitutionMatrix, GapCosts) {
        (
            SubstitutionMatrix::nucleotide(1, 1, -1).unwrap(),
            GapCosts::new(2, 1).unwrap(),
        )
    }

    #[test]
    fn test_deletion_example_scores_zero() {
        let (m, g) = setup();
        let u = encode_sequence(b"ACGT");
        let v = encode_sequence(b"AGT");
        let band = Band::new(-1, 1, 4, 3).unwrap();
        let sentinel = sentinel_for(4, 3, &m, &g).unwrap();
        let mut r = Reservoir::new(TraceEncoding::PackedBits);
        for keep in [false, true] {
            let score = fill(&mut r, &m, &g, sentinel, &u, &v, &band, keep).unwrap();
            assert_eq!(score, 0);
        }
    }

    #[test]
    fn test_identity_on_main_diagonal() {
        let (m, g) = setup();
        let u = encode_sequence(b"ACGTACGT");
        let band = Band::new(0, 0, 8, 8).unwrap();
        let sentinel = sentinel_for(8, 8, &m, &g).unwrap();
        let mut r = Reservoir::new(TraceEncoding::FullScores);
        assert_eq!(fill_score_only(&mut r, &m, &g, sentinel, &u, &u, &band).unwrap(), 8);
    }

    #[test]
    fn test_pure_gap_boundary() {
        // u = A, v = AAAA: one match plus a gap of 3 costs 1 - (2 + 3)
        let (m, g) = setup();
        let u = encode_sequence(b"A");
        let v = encode_sequence(b"AAAA");
        let band = Band::full(1, 4);
        let sentinel = sentinel_for(1, 4, &m, &g).unwrap();
        let mut r = Reservoir::default();
        assert_eq!(fill_with_trace(&mut r, &m, &g, sentinel, &u, &v, &band).unwrap(), -4);
        assert_eq!(r.filled_band(), Some(band));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let (m, g) = setup();
        let u = encode_sequence(b"ACGT");
        let band = Band::full(4, 4);
        let mut r = Reservoir::default();
        assert!(matches!(
            fill_score_only(&mut r, &m, &g, 0, &u, &u, &band),
            Err(DbandError::SentinelOverflow { .. })
        ));
        assert!(matches!(
            fill_score_only(&mut r, &m, &g, -100, &u, &u[..3], &band),
            Err(DbandError::InvalidBand { .. })
        ));
        let empty_band = Band::full(4, 0);
        assert!(matches!(
            fill_score_only(&mut r, &m, &g, -100, &u, &[], &empty_band),
            Err(DbandError::EmptySequence { other_len: 4 })
        ));
        assert_eq!(
            fill_score_only(&mut r, &m, &g, -100, &[], &[], &Band::full(0, 0)).unwrap(),
            0
        );
    }

    #[test]
    fn test_rejects_sentinel_above_real_scores() {
        let (m, g) = setup();
        let u = encode_sequence(b"A");
        let v = encode_sequence(b"CCCA");
        let band = Band::full(1, 4);
        let required = sentinel_for(1, 4, &m, &g).unwrap();
        let mut r = Reservoir::default();
        for keep in [false, true] {
            assert!(matches!(
                fill(&mut r, &m, &g, -1, &u, &v, &band, keep),
                Err(DbandError::WeakSentinel { sentinel: -1, required: req }) if req == required
            ));
        }
        assert_eq!(r.filled_band(), None);
        // Anything at or below the computed bound is accepted
        assert_eq!(fill_with_trace(&mut r, &m, &g, required - 7, &u, &v, &band).unwrap(), -4);
    }
}
