// ─────────────────────────────────────────────────────────────────────
// SCPN KSpace Neutrinos — Neutrino Density Parameters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ω_ν(a) summed over up to three (possibly degenerate) species, and the
//! photon background Ω_γ(a).

use crate::hybrid::HybridState;
use crate::rho_nu::RhoNuTable;
use kspace_types::constants::{
    GRAVITY, HUBBLE, LIGHTCGS, MASS_DEGENERACY_TOL, NUSPECIES, STEFAN_BOLTZMANN, T_CMB0,
};
use kspace_types::error::KspaceResult;
use std::f64::consts::PI;

/// Critical density today in g/cm³.
pub fn critical_density(hubble_param: f64) -> f64 {
    let h0 = HUBBLE * hubble_param;
    3.0 * h0 * h0 / (8.0 * PI * GRAVITY)
}

#[derive(Debug, Clone)]
pub struct OmegaNuModel {
    /// One table per distinct mass, stored at the first species with that mass.
    tables: [Option<RhoNuTable>; NUSPECIES],
    /// Species sharing each table; zero for species that point elsewhere.
    degeneracies: [usize; NUSPECIES],
    /// Index of the table each species reads from.
    owner: [usize; NUSPECIES],
    rhocrit: f64,
    omega0: f64,
    hybrid: Option<HybridState>,
}

impl OmegaNuModel {
    /// `masses` in eV; tables start at `a0`.
    pub fn new(
        masses: &[f64; NUSPECIES],
        omega0: f64,
        a0: f64,
        hubble_param: f64,
    ) -> KspaceResult<Self> {
        let mut degeneracies = [0usize; NUSPECIES];
        let mut owner = [0usize; NUSPECIES];
        for mi in 0..NUSPECIES {
            match (0..mi).find(|&mmi| (masses[mi] - masses[mmi]).abs() < MASS_DEGENERACY_TOL) {
                Some(mmi) => {
                    let first = owner[mmi];
                    degeneracies[first] += 1;
                    owner[mi] = first;
                }
                None => {
                    degeneracies[mi] = 1;
                    owner[mi] = mi;
                }
            }
        }

        let mut tables: [Option<RhoNuTable>; NUSPECIES] = Default::default();
        for mi in 0..NUSPECIES {
            if degeneracies[mi] > 0 {
                tables[mi] = Some(RhoNuTable::new(a0, masses[mi])?);
            }
        }
        log::debug!("Neutrino masses {masses:?} eV, degeneracies {degeneracies:?}");

        Ok(OmegaNuModel {
            tables,
            degeneracies,
            owner,
            rhocrit: critical_density(hubble_param),
            omega0,
            hybrid: None,
        })
    }

    /// Enable the particle/analytic split.
    pub fn with_hybrid(mut self, hybrid: HybridState) -> Self {
        self.hybrid = Some(hybrid);
        self
    }

    pub fn hybrid(&self) -> Option<&HybridState> {
        self.hybrid.as_ref()
    }

    pub fn degeneracies(&self) -> &[usize; NUSPECIES] {
        &self.degeneracies
    }

    /// Table slot `i`; `None` for species degenerate with an earlier one.
    pub fn table(&self, i: usize) -> Option<&RhoNuTable> {
        self.tables[i].as_ref()
    }

    pub fn rhocrit(&self) -> f64 {
        self.rhocrit
    }

    pub fn omega0(&self) -> f64 {
        self.omega0
    }

    fn slots(&self) -> impl Iterator<Item = (usize, usize, &RhoNuTable)> + '_ {
        self.tables
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (i, self.degeneracies[i], t)))
    }

    /// Fraction of species `i` in simulation particles; 0 without hybrid mode.
    pub fn particle_nu_fraction(&self, a: f64, i: usize) -> f64 {
        self.hybrid
            .as_ref()
            .map_or(0.0, |h| h.particle_fraction(a, i))
    }

    /// Total neutrino density parameter at `a`.
    pub fn omega_nu(&self, a: f64) -> f64 {
        let rhonu: f64 = self
            .slots()
            .map(|(_, deg, t)| deg as f64 * t.rho(a))
            .sum();
        rhonu / self.rhocrit
    }

    /// Neutrino density parameter excluding the part carried by particles.
    pub fn omega_nu_nopart(&self, a: f64) -> f64 {
        let rhonu: f64 = self
            .slots()
            .map(|(i, deg, t)| deg as f64 * t.rho(a) * (1.0 - self.particle_nu_fraction(a, i)))
            .sum();
        rhonu / self.rhocrit
    }

    /// Density parameter of species `i`, resolving degenerate species to
    /// the table they share.
    pub fn omega_nu_single(&self, a: f64, i: usize) -> f64 {
        let slot = self.owner[i];
        let rho = self.tables[slot].as_ref().map_or(0.0, |t| t.rho(a));
        rho / self.rhocrit * (1.0 - self.particle_nu_fraction(a, slot))
    }

    /// Photon density parameter at `a`.
    pub fn omega_gamma(&self, a: f64) -> f64 {
        let omegag = 4.0 * STEFAN_BOLTZMANN / (LIGHTCGS * LIGHTCGS * LIGHTCGS) * T_CMB0.powi(4)
            / self.rhocrit;
        omegag / a.powi(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rho_nu::rho_nu_exact;

    /// Ω_r h² from the Stefan-Boltzmann law.
    fn omega_r(hubble_param: f64) -> f64 {
        4.0 * STEFAN_BOLTZMANN * 8.0 * PI * GRAVITY
            / (3.0 * LIGHTCGS.powi(3) * HUBBLE * HUBBLE * hubble_param * hubble_param)
            * T_CMB0.powi(4)
    }

    #[test]
    fn test_critical_density() {
        let h = 0.7;
        let rc = critical_density(h);
        assert!((rc - 1.8784e-29 * h * h).abs() < 5e-5 * rc, "rhocrit = {rc}");
    }

    #[test]
    fn test_omega_nu_single_calibration() {
        let (mnu, h) = (0.5, 0.7);
        let om = OmegaNuModel::new(&[mnu, 0.0, 0.0], 0.3, 0.01, h).unwrap();
        let z0 = om.omega_nu_single(1.0, 0);
        // Redshift scaling is a⁻³ once non-relativistic.
        assert!((z0 / 0.5f64.powi(3) - om.omega_nu_single(0.5, 0)).abs() < 5e-5 * z0);
        // Not pure matter scaling at early times.
        assert!(z0 / 0.01f64.powi(3) < om.omega_nu_single(0.01, 0));
        assert!((z0 - mnu / 93.14 / h / h).abs() < 1e-4 * z0, "omega_nu = {z0}");
    }

    #[test]
    fn test_omega_nu_single_exact() {
        let (mnu, h) = (0.05, 0.7);
        let om = OmegaNuModel::new(&[mnu, 0.0, 0.0], 0.3, 0.01, h).unwrap();
        let rc = om.rhocrit();
        let z0 = om.omega_nu_single(1.0, 0);
        assert!((1.0 - rho_nu_exact(1.0, mnu) / rc / z0).abs() < 1e-6);
        for i in 1..123 {
            let a = 0.01 + i as f64 / 123.0;
            let tab = om.omega_nu_single(a, 0);
            let exact = rho_nu_exact(a, mnu) / rc;
            assert!(
                (1.0 - exact / tab).abs() < 1e-6,
                "a={a}: table {tab} exact {exact}"
            );
        }
    }

    #[test]
    fn test_continuity_across_regimes() {
        let mnu = 0.1;
        let om = OmegaNuModel::new(&[mnu, 0.0, 0.0], 0.3, 0.001, 0.7).unwrap();
        let kt = kspace_types::constants::kt_nu();
        // Non-relativistic switch at a m = NU_SW k_B T_ν.
        let a_sw = crate::rho_nu::NU_SW * kt / mnu;
        let below = om.omega_nu_single(a_sw * (1.0 - 1e-9), 0);
        let above = om.omega_nu_single(a_sw * (1.0 + 1e-9), 0);
        assert!((below / above - 1.0).abs() < 1e-6, "{below} vs {above}");
        // Massless switch at a m = 1e-6 k_B T_ν is crossed by a 1e-5 eV
        // species near a = 1.7e-5, below its table window.
        let tiny = 1e-5;
        let om_tiny = OmegaNuModel::new(&[tiny, 0.0, 0.0], 0.3, 1e-3, 0.7).unwrap();
        let a_rel = 1e-6 * kt / tiny;
        let (a_lo, a_hi) = (a_rel * (1.0 - 1e-6), a_rel * (1.0 + 1e-6));
        // Scale out a⁻⁴ so only the jump between regimes is left.
        let lo = om_tiny.omega_nu_single(a_lo, 0) * a_lo.powi(4);
        let hi = om_tiny.omega_nu_single(a_hi, 0) * a_hi.powi(4);
        assert!((lo / hi - 1.0).abs() < 1e-6, "{lo} vs {hi}");
    }

    #[test]
    fn test_massless_scaling_is_exact() {
        let h = 0.7;
        let om = OmegaNuModel::new(&[0.0, 0.0, 0.0], 0.3, 0.01, h).unwrap();
        let z0 = om.omega_nu_single(1.0, 0);
        assert_eq!(z0 / 0.5f64.powi(4), om.omega_nu_single(0.5, 0));
        assert_eq!(z0 / 0.25f64.powi(4), om.omega_nu_single(0.25, 0));
        let expected = omega_r(h) * 7.0 / 8.0 * ((4.0f64 / 11.0).cbrt() * 1.00328).powi(4);
        // Both sides are only as good as the six-digit k_B and σ_SB.
        assert!((z0 / expected - 1.0).abs() < 1e-5, "{z0} vs {expected}");
    }

    #[test]
    fn test_degenerate_init() {
        let om = OmegaNuModel::new(&[0.2, 0.2, 0.2], 0.3, 0.01, 0.7).unwrap();
        assert_eq!(om.degeneracies(), &[3, 0, 0]);
        assert!(om.table(0).is_some());
        assert!(om.table(1).is_none());
        assert!(om.table(2).is_none());
        assert_eq!(om.omega0(), 0.3);
    }

    #[test]
    fn test_nondegenerate_init() {
        let om = OmegaNuModel::new(&[0.2, 0.1, 0.3], 0.3, 0.01, 0.7).unwrap();
        assert_eq!(om.degeneracies(), &[1, 1, 1]);
        for i in 0..3 {
            assert!(om.table(i).is_some());
        }
    }

    #[test]
    fn test_partial_degeneracy_resolves_to_matching_mass() {
        let om = OmegaNuModel::new(&[0.1, 0.2, 0.1], 0.3, 0.01, 0.7).unwrap();
        assert_eq!(om.degeneracies(), &[2, 1, 0]);
        assert_eq!(om.omega_nu_single(0.5, 2), om.omega_nu_single(0.5, 0));
        assert_ne!(om.omega_nu_single(0.5, 2), om.omega_nu_single(0.5, 1));
    }

    #[test]
    fn test_total_is_sum_of_species() {
        for masses in [[0.2, 0.1, 0.3], [0.15, 0.15, 0.15], [0.0, 0.05, 0.05]] {
            let om = OmegaNuModel::new(&masses, 0.3, 0.01, 0.7).unwrap();
            for a in [0.02, 0.5, 1.0] {
                let total: f64 = (0..3).map(|i| om.omega_nu_single(a, i)).sum();
                let got = om.omega_nu(a);
                assert!((got - total).abs() < 1e-6 * total, "{masses:?} a={a}");
            }
        }
    }

    #[test]
    fn test_omega_gamma() {
        let h = 0.7;
        let om = OmegaNuModel::new(&[0.2, 0.1, 0.3], 0.3, 0.01, h).unwrap();
        let expected = omega_r(h) / 0.5f64.powi(4);
        assert!((om.omega_gamma(0.5) / expected - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hybrid_nopart_reduces_density() {
        let masses = [0.1, 0.1, 0.1];
        let hybrid = HybridState::new(&masses, 3000.0, 299_792.458, 0.5).unwrap();
        let om = OmegaNuModel::new(&masses, 0.3, 0.01, 0.7)
            .unwrap()
            .with_hybrid(hybrid);
        // Fully analytic before the switch.
        assert_eq!(om.omega_nu_nopart(0.4), om.omega_nu(0.4));
        let frac = om.hybrid().unwrap().nufrac_low[0];
        let expected = om.omega_nu(0.8) * (1.0 - frac);
        assert!((om.omega_nu_nopart(0.8) - expected).abs() < 1e-12 * expected);
        let single = om.omega_nu_single(0.8, 1);
        assert!((3.0 * single - expected).abs() < 1e-12 * expected);
    }
}
