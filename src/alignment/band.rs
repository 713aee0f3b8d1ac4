//! Diagonal band geometry.
//!
//! A band is the set of cells `(i,j)` of the `(ulen+1) x (vlen+1)` matrix with
//! `left_dist <= j - i <= right_dist`. Row `i` indexes sequence 1 (`u`),
//! column `j` indexes sequence 2 (`v`). The DP sweeps columns, so the band is
//! described per column by the row interval `[low_row(j), high_row(j)]`.

use crate::error::{DbandError, Result};

/// Band offsets from the main diagonal, bound to the sequence lengths they were
/// validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    left_dist: i64,
    right_dist: i64,
    ulen: usize,
    vlen: usize,
}

impl Band {
    /// Validate a band for sequences of length `ulen` and `vlen`.
    ///
    /// The band must contain an end-to-end path, i.e.
    /// `-ulen <= left_dist <= min(0, vlen-ulen)` and
    /// `max(0, vlen-ulen) <= right_dist <= vlen`.
    pub fn new(left_dist: i64, right_dist: i64, ulen: usize, vlen: usize) -> Result<Self> {
        let lendiff = vlen as i64 - ulen as i64;
        let valid = left_dist <= lendiff.min(0)
            && left_dist >= -(ulen as i64)
            && right_dist >= lendiff.max(0)
            && right_dist <= vlen as i64;
        if !valid {
            return Err(DbandError::InvalidBand {
                left_dist,
                right_dist,
                ulen,
                vlen,
            });
        }
        Ok(Self {
            left_dist,
            right_dist,
            ulen,
            vlen,
        })
    }

    /// The band covering the whole matrix.
    pub fn full(ulen: usize, vlen: usize) -> Self {
        Self {
            left_dist: -(ulen as i64),
            right_dist: vlen as i64,
            ulen,
            vlen,
        }
    }

    /// Symmetric band of half-width `band_width`, clamped to the matrix.
    ///
    /// Fails when `band_width` is smaller than `|vlen - ulen|`.
    pub fn clamped(band_width: usize, ulen: usize, vlen: usize) -> Result<Self> {
        let left_dist = -(band_width.min(ulen) as i64);
        let right_dist = band_width.min(vlen) as i64;
        Self::new(left_dist, right_dist, ulen, vlen)
    }

    #[inline]
    pub fn left_dist(&self) -> i64 {
        self.left_dist
    }

    #[inline]
    pub fn right_dist(&self) -> i64 {
        self.right_dist
    }

    #[inline]
    pub fn ulen(&self) -> usize {
        self.ulen
    }

    #[inline]
    pub fn vlen(&self) -> usize {
        self.vlen
    }

    /// Number of diagonals in the band: `right_dist - left_dist + 1`.
    #[inline]
    pub fn width(&self) -> usize {
        (self.right_dist - self.left_dist + 1) as usize
    }

    /// True when no wider band exists for these lengths.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.left_dist == -(self.ulen as i64) && self.right_dist == self.vlen as i64
    }

    /// `max(0, j - right_dist)`
    #[inline]
    pub fn low_row(&self, j: usize) -> usize {
        j.saturating_sub(self.right_dist as usize)
    }

    /// `min(ulen, j - left_dist)`
    #[inline]
    pub fn high_row(&self, j: usize) -> usize {
        self.ulen.min(j + (-self.left_dist) as usize)
    }

    /// Number of band cells in column `j`.
    #[inline]
    pub fn column_height(&self, j: usize) -> usize {
        self.high_row(j) - self.low_row(j) + 1
    }

    #[inline]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        j <= self.vlen && i >= self.low_row(j) && i <= self.high_row(j)
    }

    /// Upper bound on the cells a kept matrix needs: `width * (vlen + 1)`.
    #[inline]
    pub fn cell_bound(&self) -> usize {
        self.width() * (self.vlen + 1)
    }

    /// Exact number of cells inside the band.
    pub fn cell_count(&self) -> usize {
        (0..=self.vlen).map(|j| self.column_height(j)).sum()
    }
}
