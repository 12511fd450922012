// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Neutrino Perturbation Solver Interface
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The linear-response solver that turns the CDM amplitude into a
//! neutrino amplitude, and the resumable scale-factor history it keeps.

use kspace_math::interp::{CubicSpline, SplineCursor};
use kspace_types::error::{KspaceError, KspaceResult};

/// Produces √P_ν(k) on the bins of the measured CDM spectrum.
///
/// `keff` is in physical wavenumber units; `delta_cdm` is √P_cdm(k) on the
/// same bins. The result must have the same length.
pub trait NeutrinoPerturbationSolver {
    fn is_initialised(&self) -> bool;
    fn history_mut(&mut self) -> &mut ScaleFactorHistory;
    /// Scale factor of the initial transfer functions.
    fn time_transfer(&self) -> f64;
    fn initialise(&mut self, keff: &[f64], delta_cdm: &[f64]) -> KspaceResult<()>;
    fn delta_nu(&mut self, a: f64, keff: &[f64], delta_cdm: &[f64]) -> KspaceResult<Vec<f64>>;
}

/// `ln a` of every step the solver has integrated, strictly increasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleFactorHistory {
    loga: Vec<f64>,
}

impl ScaleFactorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History restored from a resume file, given as `ln a` values.
    ///
    /// Hosts that checkpoint the solver call this on restart before the
    /// first correction step.
    pub fn from_loga(loga: Vec<f64>) -> KspaceResult<Self> {
        if let Some(i) = (1..loga.len()).find(|&i| loga[i] <= loga[i - 1]) {
            return Err(KspaceError::InvalidInput(format!(
                "Scale factor history not increasing at row {i}"
            )));
        }
        Ok(ScaleFactorHistory { loga })
    }

    pub fn len(&self) -> usize {
        self.loga.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loga.is_empty()
    }

    pub fn loga(&self) -> &[f64] {
        &self.loga
    }

    pub fn last_loga(&self) -> Option<f64> {
        self.loga.last().copied()
    }

    /// Append step `a`; ignored unless later than the last stored step.
    pub fn record(&mut self, a: f64) {
        let la = a.ln();
        if self.last_loga().map_or(true, |last| la > last) {
            self.loga.push(la);
        }
    }

    /// Drop every row at or after `a`. Returns `(rows_before, rows_after)`
    /// when something was dropped.
    pub fn truncate_from(&mut self, a: f64) -> Option<(usize, usize)> {
        let la = a.ln();
        let cut = self.loga.iter().position(|&row| la <= row)?;
        let before = self.loga.len();
        self.loga.truncate(cut);
        Some((before, cut))
    }

    /// A run well past the transfer time must have resumed a history that
    /// reaches close to `a`.
    pub fn check_resume(&self, a: f64, time_transfer: f64) -> KspaceResult<()> {
        if a > time_transfer + 0.01 {
            let stale = match self.last_loga() {
                None => true,
                Some(last) => last < (a - 0.04).ln(),
            };
            if stale {
                return Err(KspaceError::MissingResume { a, time_transfer });
            }
        }
        Ok(())
    }
}

/// Neutrino amplitude from a fixed initial transfer ratio
/// `T_ν/T_cdm(k)`, splined in `ln k`: `δ_ν(k) = T(k)·δ_cdm(k)`.
///
/// Wavenumbers outside the table take the ratio at the nearest end.
#[derive(Debug, Clone)]
pub struct TransferRatioSolver {
    ratio: CubicSpline,
    cursor: SplineCursor,
    time_transfer: f64,
    history: ScaleFactorHistory,
    initialised: bool,
}

impl TransferRatioSolver {
    pub fn new(logk: Vec<f64>, t_nu: Vec<f64>, time_transfer: f64) -> KspaceResult<Self> {
        if !time_transfer.is_finite() || time_transfer <= 0.0 {
            return Err(KspaceError::ConfigError(format!(
                "TimeTransfer must be finite > 0, got {time_transfer}"
            )));
        }
        if t_nu.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(KspaceError::InvalidInput(
                "Transfer ratio must be finite and >= 0".to_string(),
            ));
        }
        Ok(TransferRatioSolver {
            ratio: CubicSpline::new(logk, t_nu)?,
            cursor: SplineCursor::new(),
            time_transfer,
            history: ScaleFactorHistory::new(),
            initialised: false,
        })
    }

    /// Start from a history restored from disk.
    pub fn with_history(mut self, history: ScaleFactorHistory) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &ScaleFactorHistory {
        &self.history
    }

    fn ratio_at(&self, k: f64) -> f64 {
        let lk = k.ln().clamp(self.ratio.x_min(), self.ratio.x_max());
        self.ratio.eval(lk, &self.cursor).unwrap_or(f64::NAN)
    }
}

fn check_lengths(keff: &[f64], delta_cdm: &[f64]) -> KspaceResult<()> {
    if keff.len() != delta_cdm.len() {
        return Err(KspaceError::InvalidInput(format!(
            "keff and delta_cdm differ in length: {} vs {}",
            keff.len(),
            delta_cdm.len()
        )));
    }
    Ok(())
}

impl NeutrinoPerturbationSolver for TransferRatioSolver {
    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn history_mut(&mut self) -> &mut ScaleFactorHistory {
        &mut self.history
    }

    fn time_transfer(&self) -> f64 {
        self.time_transfer
    }

    fn initialise(&mut self, keff: &[f64], delta_cdm: &[f64]) -> KspaceResult<()> {
        check_lengths(keff, delta_cdm)?;
        if self.history.is_empty() {
            self.history.record(self.time_transfer);
        }
        self.initialised = true;
        Ok(())
    }

    fn delta_nu(&mut self, a: f64, keff: &[f64], delta_cdm: &[f64]) -> KspaceResult<Vec<f64>> {
        if !self.initialised {
            return Err(KspaceError::InvalidInput(
                "Neutrino solver used before initialise".to_string(),
            ));
        }
        check_lengths(keff, delta_cdm)?;
        let out = keff
            .iter()
            .zip(delta_cdm.iter())
            .map(|(&k, &dc)| self.ratio_at(k) * dc)
            .collect();
        self.history.record(a);
        Ok(out)
    }
}
