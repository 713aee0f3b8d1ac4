//! Reconstruct an optimal alignment from a kept band matrix.
//!
//! Both variants walk from `(ulen, vlen)` in state R back to `(0, 0)`,
//! emitting edit operations in reverse and flipping them once at the end.
//! The full-score variant re-derives every predecessor with the same
//! tie-break helpers the fill used; the packed variant reads the 2-bit field
//! the fill recorded.

use crate::alignment::band::Band;
use crate::alignment::eoplist::Eoplist;
use crate::alignment::reservoir::{Reservoir, TraceMatrix};
use crate::alignment::scoring::{GapCosts, ScoreModel};
use crate::alignment::types::{diagonal_choice, gap_choice, Edge, ScoreTriple, TraceBits};
use crate::error::{DbandError, Result};

/// Stored cell `(i, j)`, or `CorruptTraceback` when it is outside the band.
#[inline]
fn cell<T: Copy>(cells: &[T], offsets: &[usize], band: &Band, i: usize, j: usize) -> Result<T> {
    if !band.contains(i, j) {
        return Err(DbandError::CorruptTraceback { i, j });
    }
    cells
        .get(offsets[j] + i - band.low_row(j))
        .copied()
        .ok_or(DbandError::CorruptTraceback { i, j })
}

#[inline]
fn emit_substitution<M: ScoreModel + ?Sized>(
    eoplist: &mut Eoplist,
    model: &M,
    a: u8,
    b: u8,
) {
    if model.is_match(a, b) {
        eoplist.add_match(1);
    } else {
        eoplist.add_mismatch();
    }
}

#[allow(clippy::too_many_arguments)]
fn traceback_scores<M: ScoreModel + ?Sized>(
    eoplist: &mut Eoplist,
    cells: &[ScoreTriple],
    offsets: &[usize],
    band: &Band,
    model: &M,
    costs: &GapCosts,
    useq: &[u8],
    vseq: &[u8],
) -> Result<()> {
    let start = costs.start_penalty();
    let ext = costs.extend_penalty();
    let (mut i, mut j) = (useq.len(), vseq.len());
    let mut edge = Edge::R;

    while i > 0 || j > 0 {
        match edge {
            Edge::R if i > 0 && j > 0 => {
                emit_substitution(eoplist, model, useq[i - 1], vseq[j - 1]);
                i -= 1;
                j -= 1;
                edge = diagonal_choice(&cell(cells, offsets, band, i, j)?).1;
            }
            Edge::D if i > 0 => {
                eoplist.add_deletion();
                i -= 1;
                let prev = cell(cells, offsets, band, i, j)?;
                edge = gap_choice(prev.r + start, prev.d + ext, Edge::D).1;
            }
            Edge::I if j > 0 => {
                eoplist.add_insertion();
                j -= 1;
                let prev = cell(cells, offsets, band, i, j)?;
                edge = gap_choice(prev.r + start, prev.i + ext, Edge::I).1;
            }
            _ => return Err(DbandError::CorruptTraceback { i, j }),
        }
    }
    Ok(())
}

fn traceback_bits<M: ScoreModel + ?Sized>(
    eoplist: &mut Eoplist,
    cells: &[TraceBits],
    offsets: &[usize],
    band: &Band,
    model: &M,
    useq: &[u8],
    vseq: &[u8],
) -> Result<()> {
    let (mut i, mut j) = (useq.len(), vseq.len());
    let mut edge = Edge::R;

    while i > 0 || j > 0 {
        let next = cell(cells, offsets, band, i, j)?.get(edge);
        match edge {
            Edge::R if i > 0 && j > 0 => {
                emit_substitution(eoplist, model, useq[i - 1], vseq[j - 1]);
                i -= 1;
                j -= 1;
            }
            Edge::D if i > 0 => {
                eoplist.add_deletion();
                i -= 1;
            }
            Edge::I if j > 0 => {
                eoplist.add_insertion();
                j -= 1;
            }
            _ => return Err(DbandError::CorruptTraceback { i, j }),
        }
        edge = next;
    }
    Ok(())
}

/// Append an optimal alignment of the last filled band to `eoplist`.
///
/// `reservoir` must hold the matrix of a [`fill_with_trace`] over the same
/// `useq`, `vseq`, `model` and `costs`. The operations are appended after any
/// existing content, in forward order. On error `eoplist` is left as it
/// was.
///
/// [`fill_with_trace`]: crate::alignment::fill::fill_with_trace
pub fn traceback<M: ScoreModel + ?Sized>(
    reservoir: &Reservoir,
    eoplist: &mut Eoplist,
    model: &M,
    costs: &GapCosts,
    useq: &[u8],
    vseq: &[u8],
) -> Result<()> {
    let band = match reservoir.filled_band() {
        Some(band) if band.ulen() == useq.len() && band.vlen() == vseq.len() => band,
        _ => {
            return Err(DbandError::CorruptTraceback {
                i: useq.len(),
                j: vseq.len(),
            })
        }
    };

    let previous_segment = eoplist.segment_start();
    let first = eoplist.begin_segment();
    let (offsets, matrix) = reservoir.trace_parts();
    let walked = match matrix {
        TraceMatrix::Scores(cells) => {
            traceback_scores(eoplist, cells, offsets, &band, model, costs, useq, vseq)
        }
        TraceMatrix::Bits(cells) => traceback_bits(eoplist, cells, offsets, &band, model, useq, vseq),
    };
    if let Err(e) = walked {
        eoplist.truncate(first);
        eoplist.restore_segment(previous_segment);
        return Err(e);
    }
    eoplist.reverse_suffix(first);
    Ok(())
}
