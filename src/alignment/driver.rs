//! Fixed-band and adaptive-band alignment entry points.
//!
//! The adaptive driver starts from the narrowest band that still contains an
//! end-to-end path and widens it until the score reaches a caller-supplied
//! target, stops improving, or the band covers the whole matrix.

use crate::alignment::band::Band;
use crate::alignment::eoplist::Eoplist;
use crate::alignment::fill::fill;
use crate::alignment::reservoir::{Reservoir, TraceEncoding};
use crate::alignment::scoring::{sentinel_for, GapCosts, ScoreModel};
use crate::alignment::traceback::traceback;
use crate::defaults::{DOUBLING_LIMIT, THREE_HALVES_LIMIT};
use crate::error::{DbandError, Result};

/// When the adaptive driver may stop widening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptiveTarget {
    /// Stop as soon as the score reaches this value. `None` accepts the
    /// first band.
    pub expected_score: Option<i32>,
    /// Also stop when widening leaves the score unchanged.
    pub converge: bool,
}

/// Outcome of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub score: i32,
    /// Band the returned score was computed in
    pub left_dist: i64,
    pub right_dist: i64,
    /// Number of fills performed
    pub iterations: usize,
}

impl AlignmentSummary {
    fn new(score: i32, band: &Band, iterations: usize) -> Self {
        Self {
            score,
            left_dist: band.left_dist(),
            right_dist: band.right_dist(),
            iterations,
        }
    }
}

/// Next band half-width: doubles while small, then grows by 3/2 and 5/4.
#[inline]
pub fn next_band_width(band_width: usize) -> usize {
    if band_width < DOUBLING_LIMIT {
        band_width * 2
    } else if band_width < THREE_HALVES_LIMIT {
        band_width * 3 / 2
    } else {
        band_width * 5 / 4
    }
}

/// Both empty aligns trivially; exactly one empty cannot end on a
/// substitution edge.
fn check_empty(useq: &[u8], vseq: &[u8]) -> Result<bool> {
    match (useq.is_empty(), vseq.is_empty()) {
        (true, true) => Ok(true),
        (true, false) => Err(DbandError::EmptySequence {
            other_len: vseq.len(),
        }),
        (false, true) => Err(DbandError::EmptySequence {
            other_len: useq.len(),
        }),
        (false, false) => Ok(false),
    }
}

fn run_traceback<M: ScoreModel + ?Sized>(
    reservoir: &Reservoir,
    eoplist: Option<&mut Eoplist>,
    model: &M,
    costs: &GapCosts,
    useq: &[u8],
    vseq: &[u8],
) -> Result<()> {
    if let Some(list) = eoplist {
        list.reset();
        traceback(reservoir, list, model, costs, useq, vseq)?;
    }
    Ok(())
}

/// Align `useq` against `vseq` inside one fixed band.
///
/// When `eoplist` is given it is reset and receives an optimal alignment
/// inside the band.
pub fn align_in_band<M: ScoreModel + ?Sized>(
    reservoir: &mut Reservoir,
    eoplist: Option<&mut Eoplist>,
    model: &M,
    costs: &GapCosts,
    useq: &[u8],
    vseq: &[u8],
    band: &Band,
) -> Result<i32> {
    if check_empty(useq, vseq)? {
        if let Some(list) = eoplist {
            list.reset();
        }
        return Ok(0);
    }
    let sentinel = sentinel_for(useq.len(), vseq.len(), model, costs)?;
    let score = fill(reservoir, model, costs, sentinel, useq, vseq, band, eoplist.is_some())?;
    run_traceback(reservoir, eoplist, model, costs, useq, vseq)?;
    Ok(score)
}

/// Align with band widening.
///
/// Each attempt uses `left_dist = -min(w, ulen)` and `right_dist = min(w,
/// vlen)`, starting at `w = 1 + |vlen - ulen|`. An attempt is final when no
/// expected score is set, when its score reaches the expected score, or (with
/// `converge`) when it equals the previous attempt's score. A non-final
/// attempt over the full matrix fails with `BandExhausted`.
pub fn align_adaptive<M: ScoreModel + ?Sized>(
    reservoir: &mut Reservoir,
    eoplist: Option<&mut Eoplist>,
    model: &M,
    costs: &GapCosts,
    useq: &[u8],
    vseq: &[u8],
    target: &AdaptiveTarget,
) -> Result<AlignmentSummary> {
    let (ulen, vlen) = (useq.len(), vseq.len());
    if check_empty(useq, vseq)? {
        if let Some(list) = eoplist {
            list.reset();
        }
        return Ok(AlignmentSummary::new(0, &Band::full(0, 0), 0));
    }

    let sentinel = sentinel_for(ulen, vlen, model, costs)?;
    let keep_matrix = eoplist.is_some();
    let mut band_width = 1 + ulen.abs_diff(vlen);
    let mut previous: Option<i32> = None;
    let mut iterations = 0usize;

    loop {
        let band = Band::clamped(band_width, ulen, vlen)?;
        let score = fill(reservoir, model, costs, sentinel, useq, vseq, &band, keep_matrix)?;
        iterations += 1;
        log::debug!(
            "dband: attempt {} band [{},{}] width {} score {}",
            iterations,
            band.left_dist(),
            band.right_dist(),
            band.width(),
            score
        );

        let reached = target.expected_score.map_or(true, |expected| score >= expected);
        let converged = target.converge && previous == Some(score);
        if reached || converged {
            run_traceback(reservoir, eoplist, model, costs, useq, vseq)?;
            return Ok(AlignmentSummary::new(score, &band, iterations));
        }

        if band.is_full() {
            log::warn!(
                "dband: full matrix ({}x{}) scored {} below expected {:?}",
                ulen,
                vlen,
                score,
                target.expected_score
            );
            return Err(DbandError::BandExhausted {
                score,
                expected: target.expected_score,
            });
        }

        previous = Some(score);
        band_width = next_band_width(band_width);
    }
}

/// Reusable aligner: a reservoir plus fixed scoring parameters.
///
/// ```
/// use ferrous_dband::alignment::{
///     utils::encode_sequence, AdaptiveTarget, DiagonalBandAligner, Eoplist, GapCosts,
///     SubstitutionMatrix, TraceEncoding,
/// };
///
/// let model = SubstitutionMatrix::nucleotide(1, 1, -1).unwrap();
/// let costs = GapCosts::new(2, 1).unwrap();
/// let mut aligner = DiagonalBandAligner::new(&model, costs, TraceEncoding::PackedBits);
/// let mut ops = Eoplist::new();
/// let u = encode_sequence(b"ACGTACGT");
/// let summary = aligner
///     .align(&u, &u, &AdaptiveTarget::default(), Some(&mut ops))
///     .unwrap();
/// assert_eq!(summary.score, 8);
/// assert_eq!(ops.to_cigar_string(true), "8=");
/// ```
pub struct DiagonalBandAligner<'m, M: ScoreModel + ?Sized> {
    reservoir: Reservoir,
    model: &'m M,
    costs: GapCosts,
}

impl<'m, M: ScoreModel + ?Sized> DiagonalBandAligner<'m, M> {
    pub fn new(model: &'m M, costs: GapCosts, encoding: TraceEncoding) -> Self {
        Self::with_reservoir(model, costs, Reservoir::new(encoding))
    }

    pub fn with_reservoir(model: &'m M, costs: GapCosts, reservoir: Reservoir) -> Self {
        Self {
            reservoir,
            model,
            costs,
        }
    }

    /// Adaptive alignment of `useq` against `vseq`.
    pub fn align(
        &mut self,
        useq: &[u8],
        vseq: &[u8],
        target: &AdaptiveTarget,
        eoplist: Option<&mut Eoplist>,
    ) -> Result<AlignmentSummary> {
        align_adaptive(
            &mut self.reservoir,
            eoplist,
            self.model,
            &self.costs,
            useq,
            vseq,
            target,
        )
    }

    /// Alignment restricted to `band`.
    pub fn align_in_band(
        &mut self,
        useq: &[u8],
        vseq: &[u8],
        band: &Band,
        eoplist: Option<&mut Eoplist>,
    ) -> Result<i32> {
        align_in_band(
            &mut self.reservoir,
            eoplist,
            self.model,
            &self.costs,
            useq,
            vseq,
            band,
        )
    }

    #[inline]
    pub fn costs(&self) -> &GapCosts {
        &self.costs
    }

    #[inline]
    pub fn reservoir(&self) -> &Reservoir {
        &self.reservoir
    }

    pub fn into_reservoir(self) -> Reservoir {
        self.reservoir
    }
}
