// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Single-Species Neutrino Density
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Physical density (g/cm³) of one neutrino species (plus antineutrino)
//! as a function of scale factor.
//!
//! Three regimes in `x = k_B T_ν / (a m)`:
//! - `x < 1/NU_SW`: Riemann-zeta series in x², non-relativistic.
//! - `a m < 1e-6 k_B T_ν`: massless Fermi-Dirac closed form.
//! - otherwise: cubic spline in `ln a` over a table of exact integrals.

use kspace_math::interp::{CubicSpline, SplineCursor};
use kspace_math::quad::{integrate, QuadConfig};
use kspace_types::constants::{
    kt_nu, EV_IN_GRAMS, HBAR_EV_S, LIGHTCGS, ZETA3, ZETA5, ZETA7, ZETA9,
};
use kspace_types::error::{KspaceError, KspaceResult};
use rayon::prelude::*;
use std::f64::consts::PI;

/// Size of the density table.
pub const NRHOTAB: usize = 200;

/// Value of `a m / k_B T_ν` above which the analytic series is used.
/// The next series term is 141682 x⁸; below x ≈ 1/8 the series diverges,
/// so this must stay above ~50.
pub const NU_SW: f64 = 100.0;

/// Upper momentum cutoff of the phase-space integral, in units of k_B T_ν.
const Q_MAX_KT: f64 = 500.0;

/// `a m` below this fraction of k_B T_ν is treated as massless.
const MASSLESS_FRACTION: f64 = 1e-6;

/// Table window padding factor on both ends.
const WINDOW_PAD: f64 = 1.2;

/// Energy integrand `q² ε(q) f₀(q)`, q and `amnu` in eV.
pub fn rho_nu_integrand(q: f64, amnu: f64) -> f64 {
    let epsilon = (q * q + amnu * amnu).sqrt();
    let f0 = 1.0 / ((q / kt_nu()).exp() + 1.0);
    q * q * epsilon * f0
}

/// Conversion from (eV/c)⁴ to g/cm³ for one species, antineutrinos included.
pub fn rho_nu_conversion() -> f64 {
    // 4π from the angular integral, 2 for antineutrinos.
    let mut convert = 4.0 * PI * 2.0;
    let chbar = 1.0 / (2.0 * PI * LIGHTCGS * HBAR_EV_S);
    convert *= chbar * chbar * chbar;
    convert * EV_IN_GRAMS
}

/// Density by direct quadrature; reference for the table.
pub fn rho_nu_exact(a: f64, mnu: f64) -> f64 {
    let amnu = a * mnu;
    let result = integrate(
        |q| rho_nu_integrand(q, amnu),
        0.0,
        Q_MAX_KT * kt_nu(),
        &QuadConfig::default(),
    );
    if !result.converged {
        log::warn!(
            "rho_nu quadrature at a={a} m={mnu} stopped at abserr={:.3e}",
            result.abserr
        );
    }
    result.value / a.powi(4) * rho_nu_conversion()
}

/// Precomputed density table for one neutrino mass.
#[derive(Debug, Clone)]
pub struct RhoNuTable {
    mnu: f64,
    table: Option<CubicSpline>,
    cursor: SplineCursor,
}

impl RhoNuTable {
    /// Tabulate over `[a0/1.2, 1.2·NU_SW·k_B T_ν / m]` in `ln a`.
    ///
    /// Massless species, and species already non-relativistic at `a0/1.2`,
    /// get no table.
    pub fn new(a0: f64, mnu: f64) -> KspaceResult<Self> {
        if !mnu.is_finite() || mnu < 0.0 {
            return Err(KspaceError::InvalidInput(format!(
                "Neutrino mass must be finite and >= 0, got {mnu}"
            )));
        }
        if !a0.is_finite() || a0 <= 0.0 {
            return Err(KspaceError::InvalidInput(format!(
                "Table start scale factor must be > 0, got {a0}"
            )));
        }
        let kt = kt_nu();
        let mut tab = RhoNuTable {
            mnu,
            table: None,
            cursor: SplineCursor::new(),
        };
        if mnu < MASSLESS_FRACTION * kt {
            return Ok(tab);
        }
        let loga0 = a0.ln() - WINDOW_PAD.ln();
        let logaf = (NU_SW * kt / mnu).ln() + WINDOW_PAD.ln();
        if logaf < loga0 {
            return Ok(tab);
        }

        let loga: Vec<f64> = (0..NRHOTAB)
            .map(|i| loga0 + i as f64 * (logaf - loga0) / (NRHOTAB - 1) as f64)
            .collect();
        let rhonu: Vec<f64> = loga.par_iter().map(|&la| rho_nu_exact(la.exp(), mnu)).collect();
        log::debug!(
            "rho_nu table for m={mnu} eV: a in [{:.4e}, {:.4e}], {NRHOTAB} entries",
            loga0.exp(),
            logaf.exp()
        );
        tab.table = Some(CubicSpline::new(loga, rhonu)?);
        Ok(tab)
    }

    pub fn mass(&self) -> f64 {
        self.mnu
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Tabulated `ln a` values, if a table was built.
    pub fn loga(&self) -> Option<&[f64]> {
        self.table.as_ref().map(|t| t.x())
    }

    /// Physical density in g/cm³ at scale factor `a`.
    pub fn rho(&self, a: f64) -> f64 {
        let kt = kt_nu();
        let amnu = a * self.mnu;
        let kt_amnu2 = kt * kt / amnu / amnu;
        if NU_SW * NU_SW * kt_amnu2 < 1.0 {
            let series = 1.5 * ZETA3
                + kt_amnu2 * 45.0 / 4.0 * ZETA5
                + 2835.0 / 32.0 * kt_amnu2 * kt_amnu2 * ZETA7
                + 80325.0 / 32.0 * kt_amnu2 * kt_amnu2 * kt_amnu2 * ZETA9;
            amnu * (kt * kt * kt) / a.powi(4) * series * rho_nu_conversion()
        } else if amnu < MASSLESS_FRACTION * kt {
            7.0 * (PI * kt / a).powi(4) / 120.0 * rho_nu_conversion()
        } else {
            self.table
                .as_ref()
                .and_then(|t| t.eval(a.ln(), &self.cursor))
                .unwrap_or_else(|| rho_nu_exact(a, self.mnu))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rho_nu_init() {
        let tab = RhoNuTable::new(0.01, 0.06).unwrap();
        assert_eq!(tab.mass(), 0.06);
        assert!(tab.has_table());
        let loga = tab.loga().unwrap();
        assert_eq!(loga.len(), NRHOTAB);
        for i in 1..NRHOTAB {
            assert!(loga[i] > loga[i - 1], "loga not increasing at {i}");
        }
        assert!((loga[0] - (0.01f64 / 1.2).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_massless_has_no_table() {
        let tab = RhoNuTable::new(0.01, 0.0).unwrap();
        assert!(!tab.has_table());
        let r1 = tab.rho(1.0);
        assert!(r1 > 0.0 && r1.is_finite());
    }

    #[test]
    fn test_heavy_species_skips_table() {
        // NU_SW kT / m is below a0 / 1.2 for a 100 eV mass at a0 = 0.5.
        let tab = RhoNuTable::new(0.5, 100.0).unwrap();
        assert!(!tab.has_table());
        let r = tab.rho(0.6);
        assert!(r > 0.0 && r.is_finite());
    }

    #[test]
    fn test_intermediate_outside_table_uses_quadrature() {
        let tab = RhoNuTable::new(0.1, 0.1).unwrap();
        // Below the table window but still in the intermediate regime.
        let a = 0.01;
        let r = tab.rho(a);
        let exact = rho_nu_exact(a, 0.1);
        assert!((r / exact - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_mass() {
        assert!(RhoNuTable::new(0.01, -0.1).is_err());
        assert!(RhoNuTable::new(0.01, f64::NAN).is_err());
        assert!(RhoNuTable::new(0.0, 0.1).is_err());
    }

    #[test]
    fn test_conversion_constant() {
        // 8π / (2π ħ c)³ · eV/c² in g
        let c = rho_nu_conversion();
        assert!(c > 0.0 && c.is_finite());
        let chbar = 2.0 * PI * LIGHTCGS * HBAR_EV_S;
        let expected = 8.0 * PI / chbar.powi(3) * EV_IN_GRAMS;
        assert!((c / expected - 1.0).abs() < 1e-12);
    }
}
