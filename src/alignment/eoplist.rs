//! Edit operation list and its CIGAR view.
//!
//! An [`Eoplist`] records an alignment as a sequence of edit operations.
//! Consecutive matches are stored as one run; mismatches, deletions and
//! insertions are stored one per column. A deletion consumes one symbol of
//! sequence 1 (`u`), an insertion one symbol of sequence 2 (`v`).

use std::fmt::{self, Write};

use crate::alignment::scoring::{GapCosts, ScoreModel};
use crate::alignment::utils::code_to_base;
use crate::error::{DbandError, Result};

/// One edit operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Eop {
    /// `n >= 1` consecutive identity columns
    Match(usize),
    Mismatch,
    /// Gap in `v`: consumes one symbol of `u`
    Deletion,
    /// Gap in `u`: consumes one symbol of `v`
    Insertion,
}

impl Eop {
    /// Symbols of `u` and `v` this operation consumes.
    #[inline]
    pub const fn consumed(self) -> (usize, usize) {
        match self {
            Eop::Match(n) => (n, n),
            Eop::Mismatch => (1, 1),
            Eop::Deletion => (1, 0),
            Eop::Insertion => (0, 1),
        }
    }
}

/// CIGAR operation type with zero-cost conversion to/from bytes
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CigarOp {
    M = b'M',  // Match or mismatch
    I = b'I',  // Consumes v only
    D = b'D',  // Consumes u only
    X = b'X',  // Mismatch
    Eq = b'=', // Match
}

impl CigarOp {
    #[inline(always)]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'M' => Some(Self::M),
            b'I' => Some(Self::I),
            b'D' => Some(Self::D),
            b'X' => Some(Self::X),
            b'=' => Some(Self::Eq),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Growable list of edit operations with per-kind counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eoplist {
    ops: Vec<Eop>,
    matches: usize,
    mismatches: usize,
    deletions: usize,
    insertions: usize,
    /// `add_match` never merges into a run before this index
    segment_start: usize,
}

impl Eoplist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `n` matches, extending a trailing match run when there is one.
    pub fn add_match(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.matches += n;
        if self.ops.len() > self.segment_start {
            if let Some(Eop::Match(run)) = self.ops.last_mut() {
                *run += n;
                return;
            }
        }
        self.ops.push(Eop::Match(n));
    }

    pub fn add_mismatch(&mut self) {
        self.mismatches += 1;
        self.ops.push(Eop::Mismatch);
    }

    pub fn add_deletion(&mut self) {
        self.deletions += 1;
        self.ops.push(Eop::Deletion);
    }

    pub fn add_insertion(&mut self) {
        self.insertions += 1;
        self.ops.push(Eop::Insertion);
    }

    /// Start a segment at the current end and return its index. Match runs
    /// added from here on do not merge into earlier operations, so the
    /// segment can be reversed on its own.
    pub fn begin_segment(&mut self) -> usize {
        self.segment_start = self.ops.len();
        self.segment_start
    }

    /// Reverse the operations from index `from` to the end.
    pub fn reverse_suffix(&mut self, from: usize) {
        if from < self.ops.len() {
            self.ops[from..].reverse();
        }
    }

    /// Drop every operation from index `len` on and take them out of the
    /// counters. A segment starting past `len` moves back to `len`.
    pub fn truncate(&mut self, len: usize) {
        while self.ops.len() > len {
            match self.ops.pop() {
                Some(Eop::Match(n)) => self.matches -= n,
                Some(Eop::Mismatch) => self.mismatches -= 1,
                Some(Eop::Deletion) => self.deletions -= 1,
                Some(Eop::Insertion) => self.insertions -= 1,
                None => break,
            }
        }
        self.segment_start = self.segment_start.min(len);
    }

    #[inline]
    pub(crate) fn segment_start(&self) -> usize {
        self.segment_start
    }

    #[inline]
    pub(crate) fn restore_segment(&mut self, start: usize) {
        self.segment_start = start.min(self.ops.len());
    }

    /// Remove all operations, keeping the allocation.
    pub fn reset(&mut self) {
        self.ops.clear();
        self.matches = 0;
        self.mismatches = 0;
        self.deletions = 0;
        self.insertions = 0;
        self.segment_start = 0;
    }

    /// Number of stored operations (a match run counts once).
    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Eop] {
        &self.ops
    }

    #[inline]
    pub fn matches(&self) -> usize {
        self.matches
    }

    #[inline]
    pub fn mismatches(&self) -> usize {
        self.mismatches
    }

    #[inline]
    pub fn deletions(&self) -> usize {
        self.deletions
    }

    #[inline]
    pub fn insertions(&self) -> usize {
        self.insertions
    }

    /// Edit distance of the alignment: mismatches plus gap columns.
    #[inline]
    pub fn unit_cost(&self) -> usize {
        self.mismatches + self.deletions + self.insertions
    }

    /// Symbols of `u` and `v` the operations consume.
    pub fn aligned_lengths(&self) -> (usize, usize) {
        (
            self.matches + self.mismatches + self.deletions,
            self.matches + self.mismatches + self.insertions,
        )
    }

    /// Run-length CIGAR view, merging adjacent operations of equal kind.
    ///
    /// With `distinguish_mismatch_match`, matches are `=` and mismatches
    /// `X`; otherwise both are `M`.
    pub fn cigar_ops(&self, distinguish_mismatch_match: bool) -> Vec<(CigarOp, usize)> {
        let mut cigar: Vec<(CigarOp, usize)> = Vec::new();
        for &eop in &self.ops {
            let (op, n) = match eop {
                Eop::Match(n) if distinguish_mismatch_match => (CigarOp::Eq, n),
                Eop::Mismatch if distinguish_mismatch_match => (CigarOp::X, 1),
                Eop::Match(n) => (CigarOp::M, n),
                Eop::Mismatch => (CigarOp::M, 1),
                Eop::Deletion => (CigarOp::D, 1),
                Eop::Insertion => (CigarOp::I, 1),
            };
            match cigar.last_mut() {
                Some((last, len)) if *last == op => *len += n,
                _ => cigar.push((op, n)),
            }
        }
        cigar
    }

    /// CIGAR string, `*` for an empty alignment.
    pub fn to_cigar_string(&self, distinguish_mismatch_match: bool) -> String {
        let cigar = self.cigar_ops(distinguish_mismatch_match);
        if cigar.is_empty() {
            return "*".to_string();
        }
        let mut s = String::with_capacity(cigar.len() * 4);
        for (op, len) in cigar {
            let _ = write!(s, "{}{}", len, op.to_byte() as char);
        }
        s
    }

    /// Parse a CIGAR string. `M` and `=` become match runs and `X`
    /// mismatches, so an `M` run loses any mismatch information it had.
    pub fn from_cigar(cigar: &str) -> Result<Self> {
        let mut list = Self::new();
        if cigar == "*" {
            return Ok(list);
        }
        let mut count: Option<usize> = None;
        for (pos, b) in cigar.bytes().enumerate() {
            if b.is_ascii_digit() {
                let digit = (b - b'0') as usize;
                count = Some(
                    count
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|c| c.checked_add(digit))
                        .ok_or_else(|| {
                            DbandError::InvalidCigar(format!("count overflow at position {pos}"))
                        })?,
                );
                continue;
            }
            let op = CigarOp::from_byte(b).ok_or_else(|| {
                DbandError::InvalidCigar(format!("unknown operation {:?} at position {}", b as char, pos))
            })?;
            let n = match count.take() {
                Some(n) if n > 0 => n,
                _ => {
                    return Err(DbandError::InvalidCigar(format!(
                        "operation {:?} at position {} has no positive count",
                        b as char, pos
                    )))
                }
            };
            match op {
                CigarOp::M | CigarOp::Eq => list.add_match(n),
                CigarOp::X => (0..n).for_each(|_| list.add_mismatch()),
                CigarOp::D => (0..n).for_each(|_| list.add_deletion()),
                CigarOp::I => (0..n).for_each(|_| list.add_insertion()),
            }
        }
        if count.is_some() {
            return Err(DbandError::InvalidCigar(format!(
                "trailing count without operation in {cigar:?}"
            )));
        }
        Ok(list)
    }

    fn check_lengths(&self, useq: &[u8], vseq: &[u8]) -> Result<()> {
        let (aligned_u, aligned_v) = self.aligned_lengths();
        if aligned_u != useq.len() || aligned_v != vseq.len() {
            return Err(DbandError::LengthMismatch {
                aligned_u,
                aligned_v,
                ulen: useq.len(),
                vlen: vseq.len(),
            });
        }
        Ok(())
    }

    /// Check that the operations consume both sequences exactly and that
    /// every match is a non-special identity and every mismatch is not.
    pub fn verify<M: ScoreModel + ?Sized>(&self, useq: &[u8], vseq: &[u8], model: &M) -> Result<()> {
        self.check_lengths(useq, vseq)?;
        let (mut upos, mut vpos) = (0usize, 0usize);
        for &eop in &self.ops {
            match eop {
                Eop::Match(n) => {
                    for _ in 0..n {
                        if !model.is_match(useq[upos], vseq[vpos]) {
                            return Err(DbandError::InconsistentOperation { upos, vpos });
                        }
                        upos += 1;
                        vpos += 1;
                    }
                }
                Eop::Mismatch => {
                    if model.is_match(useq[upos], vseq[vpos]) {
                        return Err(DbandError::InconsistentOperation { upos, vpos });
                    }
                    upos += 1;
                    vpos += 1;
                }
                Eop::Deletion => upos += 1,
                Eop::Insertion => vpos += 1,
            }
        }
        Ok(())
    }

    /// Affine score of the alignment: substitution scores plus
    /// `-(open + ext * len)` per maximal run of deletions or insertions.
    pub fn evaluate_score<M: ScoreModel + ?Sized>(
        &self,
        useq: &[u8],
        vseq: &[u8],
        model: &M,
        costs: &GapCosts,
    ) -> Result<i64> {
        self.check_lengths(useq, vseq)?;
        let (mut upos, mut vpos) = (0usize, 0usize);
        let mut score = 0i64;
        let mut previous: Option<Eop> = None;
        for &eop in &self.ops {
            match eop {
                Eop::Match(n) => {
                    for _ in 0..n {
                        score += model.substitution(useq[upos], vseq[vpos]) as i64;
                        upos += 1;
                        vpos += 1;
                    }
                }
                Eop::Mismatch => {
                    score += model.substitution(useq[upos], vseq[vpos]) as i64;
                    upos += 1;
                    vpos += 1;
                }
                Eop::Deletion | Eop::Insertion => {
                    score += if previous == Some(eop) {
                        costs.extend_penalty() as i64
                    } else {
                        costs.start_penalty() as i64
                    };
                    if eop == Eop::Deletion {
                        upos += 1;
                    } else {
                        vpos += 1;
                    }
                }
            }
            previous = Some(eop);
        }
        Ok(score)
    }

    /// Three-line rendering of the alignment wrapped at `width` columns:
    /// `u` with gaps, a `|` under every match, `v` with gaps. Symbols are
    /// decoded as nucleotide codes.
    pub fn format_alignment(&self, useq: &[u8], vseq: &[u8], width: usize) -> Result<String> {
        self.check_lengths(useq, vseq)?;
        let columns = self.matches + self.mismatches + self.deletions + self.insertions;
        let mut top = Vec::with_capacity(columns);
        let mut mid = Vec::with_capacity(columns);
        let mut bottom = Vec::with_capacity(columns);
        let (mut upos, mut vpos) = (0usize, 0usize);
        for &eop in &self.ops {
            let (du, dv) = eop.consumed();
            let run = du.max(dv);
            for _ in 0..run {
                let a = if du > 0 { code_to_base(useq[upos]) } else { b'-' };
                let b = if dv > 0 { code_to_base(vseq[vpos]) } else { b'-' };
                top.push(a);
                mid.push(if matches!(eop, Eop::Match(_)) { b'|' } else { b' ' });
                bottom.push(b);
                upos += usize::from(du > 0);
                vpos += usize::from(dv > 0);
            }
        }

        let width = width.max(1);
        let mut out = String::new();
        for (k, start) in (0..columns).step_by(width).enumerate() {
            let end = (start + width).min(columns);
            if k > 0 {
                out.push('\n');
            }
            for line in [&top, &mid, &bottom] {
                out.push_str(&String::from_utf8_lossy(&line[start..end]));
                out.push('\n');
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Eoplist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cigar_string(true))
    }
}
