// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Neutrino/CDM Ratio Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! δ_ν(k)/δ_cdm(k) interpolated in `ln k`.

use crate::output::{nu_power_path, write_nu_power};
use kspace_math::interp::{CubicSpline, SplineCursor};
use kspace_types::error::{KspaceError, KspaceResult};
use std::f64::consts::LN_2;
use std::path::{Path, PathBuf};

/// Two splines over the same `ln k` knots, one per amplitude.
///
/// Each spline carries its own cursor; the model can be shared across
/// threads evaluating the grid.
#[derive(Debug, Clone)]
pub struct RatioModel {
    spline_nu: CubicSpline,
    spline_cdm: CubicSpline,
    acc_nu: SplineCursor,
    acc_cdm: SplineCursor,
}

impl RatioModel {
    /// `logk` must be strictly increasing with at least three entries and
    /// all arrays must have the same length.
    pub fn build(logk: &[f64], delta_nu: &[f64], delta_cdm: &[f64]) -> KspaceResult<Self> {
        if delta_nu.len() != logk.len() || delta_cdm.len() != logk.len() {
            return Err(KspaceError::InvalidInput(format!(
                "Ratio model arrays differ in length: logk={}, delta_nu={}, delta_cdm={}",
                logk.len(),
                delta_nu.len(),
                delta_cdm.len()
            )));
        }
        let spline_nu = CubicSpline::new(logk.to_vec(), delta_nu.to_vec())?;
        let spline_cdm = CubicSpline::new(logk.to_vec(), delta_cdm.to_vec())?;
        Ok(RatioModel {
            spline_nu,
            spline_cdm,
            acc_nu: SplineCursor::new(),
            acc_cdm: SplineCursor::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.spline_nu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spline_nu.is_empty()
    }

    pub fn logk(&self) -> &[f64] {
        self.spline_nu.x()
    }

    pub fn delta_nu(&self) -> &[f64] {
        self.spline_nu.y()
    }

    pub fn delta_cdm(&self) -> &[f64] {
        self.spline_cdm.y()
    }

    /// δ_ν/δ_cdm at `logk`.
    ///
    /// Queries up to a factor of two below the first knot are clamped to
    /// it; further below is an error. Queries above the last knot are
    /// clamped to it.
    pub fn evaluate_ratio(&self, logk: f64) -> KspaceResult<f64> {
        if logk.is_nan() {
            return Err(KspaceError::NanAmplitude { logk });
        }
        let lo = self.spline_nu.x_min();
        let hi = self.spline_nu.x_max();
        if logk < lo - LN_2 {
            return Err(KspaceError::WavenumberBelowTable {
                logk,
                min_logk: lo,
            });
        }
        let kk = logk.clamp(lo, hi);
        let delta_cdm = self.spline_cdm.eval(kk, &self.acc_cdm).unwrap_or(f64::NAN);
        let delta_nu = self.spline_nu.eval(kk, &self.acc_nu).unwrap_or(f64::NAN);
        if delta_cdm.is_nan() || delta_nu.is_nan() {
            return Err(KspaceError::NanAmplitude { logk });
        }
        Ok(delta_nu / delta_cdm)
    }

    /// Write `<output_dir>/powerspec_nu_<snapshot>` and return its path.
    pub fn persist(&self, a: f64, snapshot: u32, output_dir: &Path) -> KspaceResult<PathBuf> {
        let path = nu_power_path(output_dir, snapshot);
        write_nu_power(&path, a, self.logk(), self.delta_nu())?;
        Ok(path)
    }
}
