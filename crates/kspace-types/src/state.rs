// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{KspaceError, KspaceResult};
use ndarray::{s, Array3};
use num_complex::Complex64;

/// Fold an FFT storage index into a signed wavenumber in [-n/2+1, n/2].
#[inline]
pub fn kval(i: usize, n: usize) -> i64 {
    if i <= n / 2 {
        i as i64
    } else {
        i as i64 - n as i64
    }
}

/// One worker's share of a real-to-complex transformed density grid.
///
/// The global grid is `grid_dim × grid_dim × (grid_dim/2 + 1)` complex values;
/// this worker owns rows `[slab_start, slab_start + slab_count)` of the first
/// (slab) axis. `data` has shape `[slab_count, grid_dim, grid_dim/2 + 1]` in
/// row-major order, so the flat index of global `(y, x, z)` is
/// `grid_dim·(grid_dim/2+1)·(y − slab_start) + (grid_dim/2+1)·x + z`.
#[derive(Debug, Clone)]
pub struct FourierSlab {
    pub grid_dim: usize,
    pub slab_start: usize,
    pub data: Array3<Complex64>,
}

impl FourierSlab {
    /// Zero-filled slab.
    pub fn zeros(grid_dim: usize, slab_start: usize, slab_count: usize) -> Self {
        FourierSlab {
            grid_dim,
            slab_start,
            data: Array3::zeros((slab_count, grid_dim, grid_dim / 2 + 1)),
        }
    }

    /// Wrap a flat buffer laid out as the host FFT delivers it.
    ///
    /// Entry point for a host that owns the transform output; the slab is
    /// handed back with `into_raw_vec` after the correction.
    pub fn from_flat(
        grid_dim: usize,
        slab_start: usize,
        slab_count: usize,
        flat: Vec<Complex64>,
    ) -> KspaceResult<Self> {
        if grid_dim < 2 {
            return Err(KspaceError::InvalidInput(format!(
                "grid_dim must be >= 2, got {grid_dim}"
            )));
        }
        if slab_start + slab_count > grid_dim {
            return Err(KspaceError::InvalidInput(format!(
                "Slab [{slab_start}, {}) exceeds grid_dim={grid_dim}",
                slab_start + slab_count
            )));
        }
        let shape = (slab_count, grid_dim, grid_dim / 2 + 1);
        let data = Array3::from_shape_vec(shape, flat).map_err(|e| {
            KspaceError::InvalidInput(format!("Flat slab buffer has wrong length: {e}"))
        })?;
        Ok(FourierSlab {
            grid_dim,
            slab_start,
            data,
        })
    }

    pub fn slab_count(&self) -> usize {
        self.data.dim().0
    }

    /// Length of the last (halved) axis.
    pub fn nz(&self) -> usize {
        self.grid_dim / 2 + 1
    }

    pub fn owns(&self, y: usize) -> bool {
        y >= self.slab_start && y < self.slab_start + self.slab_count()
    }

    /// Flat index of global element `(y, x, z)` in the host layout, for
    /// hosts that address the transform buffer directly.
    pub fn linear_index(&self, y: usize, x: usize, z: usize) -> usize {
        self.grid_dim * self.nz() * (y - self.slab_start) + self.nz() * x + z
    }

    pub fn get(&self, y: usize, x: usize, z: usize) -> Complex64 {
        self.data[[y - self.slab_start, x, z]]
    }

    /// Set a mode if this slab owns row `y`; returns whether it did.
    pub fn set(&mut self, y: usize, x: usize, z: usize, value: Complex64) -> bool {
        if !self.owns(y) {
            return false;
        }
        self.data[[y - self.slab_start, x, z]] = value;
        true
    }

    /// Copy of rows `[start, start + count)`, which must lie inside this slab.
    pub fn sub_slab(&self, start: usize, count: usize) -> KspaceResult<FourierSlab> {
        if start < self.slab_start || start + count > self.slab_start + self.slab_count() {
            return Err(KspaceError::InvalidInput(format!(
                "Rows [{start}, {}) not owned by slab [{}, {})",
                start + count,
                self.slab_start,
                self.slab_start + self.slab_count()
            )));
        }
        let lo = start - self.slab_start;
        Ok(FourierSlab {
            grid_dim: self.grid_dim,
            slab_start: start,
            data: self.data.slice(s![lo..lo + count, .., ..]).to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kval_folding() {
        assert_eq!(kval(0, 16), 0);
        assert_eq!(kval(8, 16), 8);
        assert_eq!(kval(9, 16), -7);
        assert_eq!(kval(15, 16), -1);
    }

    #[test]
    fn test_linear_index_matches_array_layout() {
        let n = 6;
        let flat: Vec<Complex64> = (0..2 * n * (n / 2 + 1))
            .map(|i| Complex64::new(i as f64, 0.0))
            .collect();
        let slab = FourierSlab::from_flat(n, 3, 2, flat).unwrap();
        for y in 3..5 {
            for x in 0..n {
                for z in 0..slab.nz() {
                    let idx = slab.linear_index(y, x, z);
                    assert_eq!(slab.get(y, x, z).re, idx as f64);
                }
            }
        }
    }

    #[test]
    fn test_from_flat_rejects_bad_length() {
        let err = FourierSlab::from_flat(4, 0, 4, vec![Complex64::new(0.0, 0.0); 10])
            .expect_err("wrong length must error");
        match err {
            KspaceError::InvalidInput(msg) => assert!(msg.contains("wrong length")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_set_outside_slab_is_ignored() {
        let mut slab = FourierSlab::zeros(8, 2, 3);
        assert!(!slab.set(0, 0, 0, Complex64::new(1.0, 0.0)));
        assert!(slab.set(4, 1, 2, Complex64::new(1.0, 2.0)));
        assert_eq!(slab.get(4, 1, 2), Complex64::new(1.0, 2.0));
    }

    #[test]
    fn test_sub_slab_keeps_global_rows() {
        let mut full = FourierSlab::zeros(8, 0, 8);
        full.set(5, 3, 1, Complex64::new(2.0, -1.0));
        let part = full.sub_slab(4, 3).unwrap();
        assert_eq!(part.slab_start, 4);
        assert_eq!(part.slab_count(), 3);
        assert_eq!(part.get(5, 3, 1), Complex64::new(2.0, -1.0));
        assert!(full.sub_slab(6, 3).is_err());
    }
}
