// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Power Spectrum Estimator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Radially log-binned power spectrum of a slab-distributed,
//! real-to-complex transformed density grid, deconvolved for the
//! cloud-in-cell window.

use crate::comm::Communicator;
use kspace_types::error::{KspaceError, KspaceResult};
use kspace_types::state::{kval, FourierSlab};
use ndarray::Axis;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Per-bin mean power, mode count and mean wavenumber (grid units).
///
/// Bins with `count == 0` hold unnormalised, meaningless values.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    pub power: Vec<f64>,
    pub count: Vec<u64>,
    pub keff: Vec<f64>,
}

impl PowerSpectrum {
    fn zeros(nbins: usize) -> Self {
        PowerSpectrum {
            power: vec![0.0; nbins],
            count: vec![0; nbins],
            keff: vec![0.0; nbins],
        }
    }

    pub fn nbins(&self) -> usize {
        self.power.len()
    }

    /// Total number of modes over all bins.
    pub fn total_count(&self) -> u64 {
        self.count.iter().sum()
    }

    /// Only the bins that contain at least one mode, in order.
    pub fn nonempty(&self) -> PowerSpectrum {
        let mut out = PowerSpectrum::zeros(0);
        for i in (0..self.nbins()).filter(|&i| self.count[i] > 0) {
            out.power.push(self.power[i]);
            out.count.push(self.count[i]);
            out.keff.push(self.keff[i]);
        }
        out
    }

    fn accumulate(&mut self, other: &PowerSpectrum) {
        for i in 0..self.nbins() {
            self.power[i] += other.power[i];
            self.count[i] += other.count[i];
            self.keff[i] += other.keff[i];
        }
    }
}

/// `πk/(n sin(πk/n))`, or 1 for `k = 0`.
#[inline]
pub fn onedinvwindow(k: i64, n: usize) -> f64 {
    if k == 0 {
        return 1.0;
    }
    let arg = PI * k as f64 / n as f64;
    arg / arg.sin()
}

/// Inverse CIC window of mode `(kx, ky, kz)`: the squared product of the
/// per-axis factors. The power needs this squared once more.
pub fn invwindow(kx: i64, ky: i64, kz: i64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let iw = onedinvwindow(kx, n) * onedinvwindow(ky, n) * onedinvwindow(kz, n);
    iw * iw
}

/// Estimate the power spectrum over all workers.
///
/// Bins are spaced in `ln |k|` from the fundamental mode to the Nyquist
/// corner `√3·n/2`. Interior `z` planes stand for a mode and its conjugate
/// and count twice. The returned spectrum is identical on every worker.
pub fn compute_power_spectrum<C: Communicator + ?Sized>(
    comm: &C,
    slab: &FourierSlab,
    nbins: usize,
    total_mass: f64,
) -> KspaceResult<PowerSpectrum> {
    let n = slab.grid_dim;
    if nbins < 1 {
        return Err(KspaceError::InvalidInput(
            "Power spectrum needs nbins >= 1".to_string(),
        ));
    }
    if n < 2 {
        return Err(KspaceError::InvalidInput(format!(
            "Power spectrum needs grid_dim >= 2, got {n}"
        )));
    }
    if !total_mass.is_finite() || total_mass == 0.0 {
        return Err(KspaceError::InvalidInput(format!(
            "Power spectrum normalisation must be finite and non-zero, got {total_mass}"
        )));
    }

    let binsperunit = (nbins - 1) as f64 / (3f64.sqrt() * n as f64 / 2.0).ln();
    let half = n / 2;

    // One partial per slab row, summed in row order below.
    let partials: Vec<PowerSpectrum> = (0..slab.slab_count())
        .into_par_iter()
        .map(|iy| {
            let mut ps = PowerSpectrum::zeros(nbins);
            let plane = slab.data.index_axis(Axis(0), iy);
            let ky = kval(slab.slab_start + iy, n);
            for x in 0..n {
                let kx = kval(x, n);
                for z in 0..slab.nz() {
                    let kz = z as i64;
                    let k2 = kx * kx + ky * ky + kz * kz;
                    if k2 == 0 {
                        continue;
                    }
                    let kk = (k2 as f64).sqrt();
                    let bin = ((binsperunit * kk.ln()).floor() as usize).min(nbins - 1);
                    let mult: u64 = if z == 0 || z == half { 1 } else { 2 };
                    let iw = invwindow(kx, ky, kz, n);
                    let pk = plane[[x, z]].norm_sqr() * iw * iw;
                    ps.power[bin] += mult as f64 * pk;
                    ps.count[bin] += mult;
                    ps.keff[bin] += mult as f64 * kk;
                }
            }
            ps
        })
        .collect();

    let mut ps = PowerSpectrum::zeros(nbins);
    for p in &partials {
        ps.accumulate(p);
    }

    comm.all_reduce_sum_u64(&mut ps.count)?;
    comm.all_reduce_sum_f64(&mut ps.power)?;
    comm.all_reduce_sum_f64(&mut ps.keff)?;

    let norm = total_mass * total_mass;
    for i in 0..nbins {
        ps.power[i] /= norm;
        if ps.count[i] > 0 {
            let c = ps.count[i] as f64;
            ps.power[i] /= c;
            ps.keff[i] /= c;
        }
    }
    Ok(ps)
}
