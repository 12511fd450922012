// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Hybrid Neutrinos
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Split of the neutrino population into a slow part followed by
//! simulation particles and a fast part followed analytically.

use kspace_math::quad::{integrate, QuadConfig};
use kspace_types::constants::{kt_nu, NUSPECIES, ZETA3};
use kspace_types::error::{KspaceError, KspaceResult};

/// Fraction of the Fermi-Dirac number density with momentum below `qc`
/// (in units of k_B T_ν).
pub fn nufrac_low(qc: f64) -> f64 {
    // Smooth integrand: a coarse tolerance and few subintervals suffice.
    let cfg = QuadConfig {
        epsabs: 0.0,
        epsrel: 1e-6,
        limit: 100,
    };
    let r = integrate(|x| x * x / (x.exp() + 1.0), 0.0, qc, &cfg);
    r.value / (1.5 * ZETA3)
}

#[derive(Debug, Clone)]
pub struct HybridState {
    /// Scale factor at which particle neutrinos switch on.
    pub nu_crit_time: f64,
    /// Critical velocity as a fraction of c.
    pub vcrit: f64,
    /// Per-species fraction carried by particles once switched on.
    pub nufrac_low: [f64; NUSPECIES],
}

impl HybridState {
    /// `vcrit` and `light` share the host's internal velocity unit.
    pub fn new(
        masses: &[f64; NUSPECIES],
        vcrit: f64,
        light: f64,
        nu_crit_time: f64,
    ) -> KspaceResult<Self> {
        if !(vcrit > 0.0) || !(light > 0.0) {
            return Err(KspaceError::ConfigError(format!(
                "Hybrid neutrinos need vcrit > 0 and light > 0, got {vcrit} and {light}"
            )));
        }
        let mut frac = [0.0; NUSPECIES];
        for (f, m) in frac.iter_mut().zip(masses.iter()) {
            let qc = m * vcrit / light / kt_nu();
            *f = nufrac_low(qc);
        }
        Ok(HybridState {
            nu_crit_time,
            vcrit: vcrit / light,
            nufrac_low: frac,
        })
    }

    /// Fraction of species `i` currently in particles; 0 while the
    /// neutrinos are still fully analytic.
    pub fn particle_fraction(&self, a: f64, i: usize) -> f64 {
        if a > self.nu_crit_time {
            self.nufrac_low[i]
        } else {
            0.0
        }
    }
}
